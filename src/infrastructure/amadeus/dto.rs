use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOffersResponse {
    #[serde(default)]
    pub data: Vec<FlightOffer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOffer {
    pub price: FlightOfferPrice,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOfferPrice {
    pub currency: String,
    #[serde(rename = "grandTotal")]
    pub grand_total: String,
}
