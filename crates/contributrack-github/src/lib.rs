pub mod analytics;
pub mod app_auth;
pub mod client;
pub mod config;
pub mod contributions;
pub mod error;

pub use analytics::{AnalyticsError, GithubAnalytics};
pub use app_auth::AppTokenProvider;
pub use client::GithubClient;
pub use config::GithubAppConfig;
pub use error::{GithubError, RemoteFetchError};
