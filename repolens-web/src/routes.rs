//! Route definitions

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Per-repository analytics
        .route(
            "/repository/{owner}/{repo}",
            get(handlers::get_repository_overview),
        )
        .route(
            "/repository/{owner}/{repo}/commits",
            get(handlers::get_commit_analysis),
        )
        .route(
            "/repository/{owner}/{repo}/issues",
            get(handlers::get_issue_analysis),
        )
        .route(
            "/repository/{owner}/{repo}/languages",
            get(handlers::get_language_analysis),
        )
        // Combined analysis
        .route("/analyze", post(handlers::analyze_repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_app, AppState};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use repolens_analytics::{
        GitHubClient, HostConfig, MemoryCache, RepoAnalyzer, RepositoryInsights,
    };

    /// State wired to an unreachable upstream: cache misses fall through to
    /// a connection error, which the handlers must map to JSON errors.
    fn unreachable_state() -> AppState {
        let config = HostConfig::github("test_token".to_string())
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(1);
        let client = GitHubClient::new(config).unwrap();
        let analyzer = RepoAnalyzer::new(Arc::new(client), Arc::new(MemoryCache::new()), 60);
        AppState::with_insights(Arc::new(RepositoryInsights::new(analyzer)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_route() {
        let app = create_app(unreachable_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_without_repo_name_is_bad_request() {
        let app = create_app(unreachable_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Repository name is required");
    }

    #[tokio::test]
    async fn test_analyze_without_body_is_bad_request() {
        let app = create_app(unreachable_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overview_failure_maps_to_not_found() {
        let app = create_app(unreachable_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/repository/acme/widgets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("GitHub API"));
    }

    #[tokio::test]
    async fn test_analyze_failure_maps_to_internal_error() {
        let app = create_app(unreachable_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"repo_name": "acme/widgets"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json.get("error").is_some());
    }
}
