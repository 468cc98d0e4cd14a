//! HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use repolens_analytics::run_full_analysis;
use repolens_core::{
    CommitTrends, FullAnalysis, IssueMetrics, LanguageAnalysis, RepolensError,
    RepositoryOverview,
};

/// Error response serialized as `{"error": <message>}`
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

/// Log a failed analytics call and surface it as a 404
fn lookup_failed(error: RepolensError) -> ApiError {
    error.log();
    ApiError::not_found(error.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    message: String,
}

/// Query parameters for the commit-trends endpoint
#[derive(Deserialize)]
pub struct CommitsQuery {
    pub days: Option<u32>,
}

/// Request body for the combined analysis endpoint
#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub repo_name: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "API is running".to_string(),
    })
}

/// Repository overview
pub async fn get_repository_overview(
    State(state): State<crate::AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<RepositoryOverview>, ApiError> {
    let repo_name = format!("{owner}/{repo}");

    state
        .insights
        .overview(&repo_name)
        .await
        .map(Json)
        .map_err(lookup_failed)
}

/// Commit trend analysis
pub async fn get_commit_analysis(
    State(state): State<crate::AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<CommitTrends>, ApiError> {
    let repo_name = format!("{owner}/{repo}");
    let days = query.days.unwrap_or(30);

    state
        .insights
        .commit_trends(&repo_name, days)
        .await
        .map(Json)
        .map_err(lookup_failed)
}

/// Issue metrics
pub async fn get_issue_analysis(
    State(state): State<crate::AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<IssueMetrics>, ApiError> {
    let repo_name = format!("{owner}/{repo}");

    state
        .insights
        .issue_metrics(&repo_name)
        .await
        .map(Json)
        .map_err(lookup_failed)
}

/// Language distribution
pub async fn get_language_analysis(
    State(state): State<crate::AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<LanguageAnalysis>, ApiError> {
    let repo_name = format!("{owner}/{repo}");

    state
        .insights
        .language_analysis(&repo_name)
        .await
        .map(Json)
        .map_err(lookup_failed)
}

/// Combined analysis: all four operations fanned out concurrently
pub async fn analyze_repository(
    State(state): State<crate::AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<FullAnalysis>, ApiError> {
    let repo_name = body
        .ok()
        .and_then(|Json(request)| request.repo_name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Repository name is required"))?;

    run_full_analysis(state.insights.clone(), &repo_name)
        .await
        .map(Json)
        .map_err(|e| {
            e.log();
            ApiError::internal(e.to_string())
        })
}
