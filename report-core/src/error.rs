use reqwest::StatusCode;
use thiserror::Error;

/// Low-level failure of a single forecast request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to the forecast service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("forecast service returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed forecast payload: {0}")]
    Payload(String),
}

/// User-facing outcome of one run of the fetch pipeline.
///
/// The `Display` strings are shown verbatim in the UI; the underlying
/// detail stays available through `source()` for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("City not found")]
    CityNotFound,

    #[error("Failed to fetch weather data")]
    Network(#[source] ClientError),
}
