pub mod client;
pub mod config;
pub mod error;
pub mod payload;

pub use client::JiraClient;
pub use config::JiraConfig;
pub use error::JiraError;
