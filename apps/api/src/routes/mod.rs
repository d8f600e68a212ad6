pub mod candidates;
pub mod health;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/candidates", get(candidates::handle_list))
        .route(
            "/api/candidates/:id",
            get(candidates::handle_get).patch(candidates::handle_update),
        )
        .route(
            "/api/candidates/:id/resume",
            get(candidates::handle_resume),
        )
        .route("/api/search", get(candidates::handle_search))
        .route("/api/stats", get(candidates::handle_stats))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::test_pool;
    use crate::loader;

    async fn test_app(applicants_dir: &std::path::Path) -> Router {
        let pool = test_pool().await;
        loader::load_candidates(&pool, applicants_dir).await.unwrap();
        build_router(AppState {
            db: pool,
            config: Config {
                applicants_dir: applicants_dir.to_path_buf(),
                database_url: "sqlite::memory:".to_string(),
                port: 0,
                rust_log: "info".to_string(),
            },
        })
    }

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let jane = dir.path().join("Jane-Doe");
        std::fs::create_dir_all(&jane).unwrap();
        std::fs::write(
            jane.join("basic_info.json"),
            r#"{"data": {"fullName": "Jane Doe", "title": "Software Engineer",
                "experience": [{"title": "Engineer", "work": "Acme"}],
                "education": [{"degree": "MS", "major": "CS", "school": "Stanford"}]}}"#,
        )
        .unwrap();
        std::fs::write(jane.join("cv.pdf"), b"%PDF-1.4 stub").unwrap();
        dir
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_returns_summary_projection() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let (status, body) = get_json(&app, "/api/candidates").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], true);

        let candidates = body["data"]["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate["full_name"], "Jane Doe");
        assert_eq!(candidate["starred"], false);
        assert_eq!(candidate["has_notes"], false);
        // Summary rows never carry the heavy fields.
        assert!(candidate.get("experience").is_none());
        assert!(candidate.get("education").is_none());
    }

    #[tokio::test]
    async fn test_get_marks_viewed_and_404s_on_unknown_id() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let (status, body) = get_json(&app, "/api/candidates/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["viewed"], true);
        assert!(!body["data"]["viewed_at"].is_null());
        assert_eq!(body["data"]["experience"][0]["organization"], "Acme");

        let (status, body) = get_json(&app, "/api/candidates/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], false);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_patch_updates_subset_of_fields() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/candidates/1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"starred": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["starred"], true);
        // Untouched fields keep their values.
        assert_eq!(body["data"]["viewed"], false);
        assert!(body["data"]["notes"].is_null());
    }

    #[tokio::test]
    async fn test_resume_serves_pdf_inline() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/candidates/1/resume")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 stub");
    }

    #[tokio::test]
    async fn test_search_echoes_query_and_handles_blank() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let (status, body) = get_json(&app, "/api/search?q=acme").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["query"], "acme");
        assert_eq!(body["data"]["candidates"].as_array().unwrap().len(), 1);

        let (status, body) = get_json(&app, "/api/search?q=").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["candidates"].as_array().unwrap().is_empty());

        // Missing q behaves like blank.
        let (status, body) = get_json(&app, "/api/search").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["candidates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_reflect_review_progress() {
        let dir = fixture_dir();
        let app = test_app(dir.path()).await;

        let (_, before) = get_json(&app, "/api/stats").await;
        assert_eq!(before["data"]["total"], 1);
        assert_eq!(before["data"]["unviewed"], 1);

        get_json(&app, "/api/candidates/1").await;

        let (_, after) = get_json(&app, "/api/stats").await;
        assert_eq!(after["data"]["viewed"], 1);
        assert_eq!(after["data"]["unviewed"], 0);
    }
}
