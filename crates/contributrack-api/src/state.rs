use std::sync::Arc;

use contributrack_github::GithubAnalytics;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// Value every `x-api-key` header is compared against.
    pub api_key: String,
    pub analytics: GithubAnalytics,
}
