//! Infrastructure layer - stores and the external price source

pub mod amadeus;
pub mod store;

pub use amadeus::{AmadeusClient, AmadeusConfig, TokenProvider};
pub use store::InMemoryStore;
