//! Domain layer - core business logic and entities

pub mod deal;
pub mod price;
pub mod route;
