pub mod client;
pub mod errors;

pub use client::CollectorClient;
pub use errors::NetworkError;
