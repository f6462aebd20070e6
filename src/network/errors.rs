use thiserror::Error;

// * Unified Error type for outbound collector calls.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Collector returned HTTP {0}")]
    Status(u16),

    #[error("Cannot read upload payload: {0}")]
    Payload(#[from] std::io::Error),
}
