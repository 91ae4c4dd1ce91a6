use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::GithubAppConfig;
use crate::error::GithubError;

/// How far `iat` is backdated to absorb clock drift against GitHub.
const CLOCK_DRIFT_SECS: i64 = 60;
/// Total JWT lifetime; GitHub rejects anything above ten minutes.
const JWT_LIFETIME_SECS: i64 = 10 * 60;
/// A cached installation token is refreshed this long before it expires.
const REFRESH_MARGIN_SECS: i64 = 60;

pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: Option<String>,
}

/// Exchanges the App's signed assertion for installation tokens and keeps the
/// latest one until shortly before it expires.
pub struct AppTokenProvider {
    http: reqwest::Client,
    config: GithubAppConfig,
    cached: Mutex<Option<InstallationToken>>,
}

impl AppTokenProvider {
    pub fn new(http: reqwest::Client, config: GithubAppConfig) -> Self {
        Self {
            http,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Sign the short-lived App JWT.
    pub fn mint_jwt(&self, now: DateTime<Utc>) -> Result<String, GithubError> {
        let iat = now.timestamp() - CLOCK_DRIFT_SECS;
        let claims = AppClaims {
            iat,
            exp: iat + JWT_LIFETIME_SECS,
            iss: self.config.app_id.clone(),
        };

        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())
            .map_err(|e| GithubError::Authentication(format!("invalid App private key: {e}")))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GithubError::Authentication(format!("failed to sign App JWT: {e}")))
    }

    /// Current installation token, exchanging a fresh JWT when the cached one
    /// is missing or about to expire. A failed exchange is not retried.
    pub async fn installation_token(&self) -> Result<String, GithubError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.token.clone());
            }
            debug!("Installation token near expiry, refreshing");
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<InstallationToken, GithubError> {
        let jwt = self.mint_jwt(now)?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.config.api_base_url, self.config.installation_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(jwt)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| GithubError::Authentication(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let message = response
                .json::<ErrorMessage>()
                .await
                .ok()
                .and_then(|m| m.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(GithubError::Authentication(format!(
                "failed to obtain access token ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let token: InstallationToken = response
            .json()
            .await
            .map_err(|e| GithubError::Authentication(format!("unexpected token payload: {e}")))?;

        info!(
            installation_id = %self.config.installation_id,
            expires_at = %token.expires_at,
            "Obtained GitHub installation token"
        );
        Ok(token)
    }
}
