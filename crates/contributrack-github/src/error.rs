use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    /// Key parsing, JWT signing or the installation token exchange failed.
    #[error("GitHub App authentication failed: {0}")]
    Authentication(String),
    #[error("failed to build GitHub HTTP client: {0}")]
    HttpClient(String),
    #[error(transparent)]
    RemoteFetch(#[from] RemoteFetchError),
}

#[derive(Debug, Error)]
pub enum RemoteFetchError {
    #[error("GitHub request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GitHub returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("unexpected GitHub payload from {url}: {reason}")]
    Decode { url: String, reason: String },
}
