use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("A request is already in flight")]
    Busy,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response stream failed: {0}")]
    Stream(String),
}
