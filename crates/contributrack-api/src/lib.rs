pub mod error;
pub mod github;
pub mod health;
pub mod middleware;
pub mod state;

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Public health routes plus the key-gated GitHub routes. Transport layers (CORS,
/// tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::hello))
        .route("/health", get(health::health));

    let protected_routes = Router::new()
        .route("/github_repos_users", get(github::repos_users))
        .route("/github_repo_contributions", get(github::repo_contributions))
        .route("/github_summary_repo", get(github::summary_repo))
        .route("/github_codepatches", get(github::code_patches))
        .route("/github_user_activity", get(github::user_activity))
        .layer(from_fn_with_state(state.clone(), middleware::require_api_key))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
