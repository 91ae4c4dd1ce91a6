use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing API key for hosted model")]
    MissingApiKey,
    #[error("API key is not a valid header value: {0}")]
    InvalidApiKey(String),
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}
