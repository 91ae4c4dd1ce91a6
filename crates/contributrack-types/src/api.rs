use serde::{Deserialize, Serialize};

// -- Queries --

#[derive(Debug, Deserialize)]
pub struct RepoRangeQuery {
    pub repo_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepoUserRangeQuery {
    pub repo_name: String,
    pub username: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserRangeQuery {
    pub username: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -- Responses --

/// Error body shape shared by every failing route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
