pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::applications::handlers;
use crate::applications::storage::UPLOADS_PREFIX;
use crate::applications::validation::MAX_RESUME_BYTES;
use crate::config::StorageBackend;
use crate::state::AppState;

/// Room for multipart framing and the `applicationId` field on top of the file.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let applications = Router::new()
        .route("/", get(handlers::handle_list_applications))
        .route("/candidate-details", post(handlers::handle_candidate_details))
        .route(
            "/resume-upload",
            post(handlers::handle_resume_upload)
                .layer(DefaultBodyLimit::max(MAX_RESUME_BYTES + UPLOAD_BODY_SLACK)),
        )
        .route(
            "/behavioral-responses",
            post(handlers::handle_behavioral_responses),
        )
        .route("/:id", get(handlers::handle_get_application));

    let mut router = Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest(&state.config.base_path, applications);

    if let StorageBackend::Local { upload_dir } = &state.config.storage {
        router = router.nest_service(&format!("/{UPLOADS_PREFIX}"), ServeDir::new(upload_dir));
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::applications::storage::LocalDiskStorage;
    use crate::applications::store::MemoryApplicationStore;
    use crate::config::{Config, DEFAULT_BASE_PATH};

    const BOUNDARY: &str = "X-JOBAPPLY-BOUNDARY";

    async fn test_app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let files = LocalDiskStorage::new(dir.path()).await.unwrap();
        let config = Config {
            database_url: None,
            storage: StorageBackend::Local {
                upload_dir: dir.path().to_string_lossy().into_owned(),
            },
            base_path: DEFAULT_BASE_PATH.to_string(),
            port: 0,
            rust_log: "info".to_string(),
        };
        let state = AppState {
            store: Arc::new(MemoryApplicationStore::new()),
            files: Arc::new(files),
            config,
        };
        (build_router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(path: &str, body: Value) -> Request<Body> {
        Request::post(format!("{DEFAULT_BASE_PATH}{path}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_path(path: &str) -> Request<Body> {
        Request::get(format!("{DEFAULT_BASE_PATH}{path}"))
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_upload(file: Option<(&str, &[u8])>, application_id: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(id) = application_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"applicationId\"\r\n\r\n{id}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post(format!("{DEFAULT_BASE_PATH}/resume-upload"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn file_count(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    async fn create(app: &Router) -> String {
        let (status, body) = send(
            app,
            post_json(
                "/candidate-details",
                json!({"name": "Ada Lovelace", "email": "ada@example.com", "phone": "+44 20 7946 0000"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (app, _dir) = test_app().await;
        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_candidate_details_creates_draft() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/candidate-details",
                json!({"name": "Ada", "email": "ADA@Example.com", "phone": "0123456789"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert_eq!(body["data"]["behavioralResponses"].as_array().unwrap().len(), 1);

        let (_, list) = send(&app, get_path("")).await;
        assert_eq!(list["count"], 1);
    }

    #[tokio::test]
    async fn test_candidate_details_missing_field() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            post_json("/candidate-details", json!({"name": "Ada", "email": "ada@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Please provide all required fields");
    }

    #[tokio::test]
    async fn test_candidate_details_unknown_id() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/candidate-details",
                json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "phone": "0123456789",
                    "applicationId": uuid::Uuid::new_v4().to_string()
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Application not found");
    }

    #[tokio::test]
    async fn test_candidate_details_update_in_place() {
        let (app, _dir) = test_app().await;
        let id = create(&app).await;
        let (status, body) = send(
            &app,
            post_json(
                "/candidate-details",
                json!({"name": "Grace", "email": "grace@example.com", "phone": "0123456789", "applicationId": id}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());
        assert_eq!(body["data"]["name"], "Grace");

        let (_, list) = send(&app, get_path("")).await;
        assert_eq!(list["count"], 1);
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let (app, _dir) = test_app().await;
        let request = Request::post(format!("{DEFAULT_BASE_PATH}/candidate-details"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_resume_upload_attaches_file() {
        let (app, dir) = test_app().await;
        let id = create(&app).await;

        let (status, body) = send(&app, multipart_upload(Some(("cv.pdf", &b"%PDF-1.4"[..])), Some(&id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["resume"]["filename"], "cv.pdf");
        assert_eq!(body["data"]["resume"]["mimeType"], "application/pdf");
        let path = body["data"]["resume"]["storagePath"].as_str().unwrap();
        assert!(path.starts_with("uploads/resume-"));
        assert_eq!(file_count(&dir), 1);

        let served = app
            .clone()
            .oneshot(Request::get(format!("/{path}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(served.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resume_upload_without_file() {
        let (app, _dir) = test_app().await;
        let id = create(&app).await;
        let (status, body) = send(&app, multipart_upload(None, Some(&id))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please upload a resume file");
    }

    #[tokio::test]
    async fn test_resume_upload_rejects_extension() {
        let (app, dir) = test_app().await;
        let id = create(&app).await;
        let (status, _) = send(&app, multipart_upload(Some(("cv.exe", &b"MZ"[..])), Some(&id))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(file_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_resume_upload_missing_id_removes_file() {
        let (app, dir) = test_app().await;
        let (status, body) = send(&app, multipart_upload(Some(("cv.pdf", &b"%PDF"[..])), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(file_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_resume_upload_twice_keeps_only_second() {
        let (app, dir) = test_app().await;
        let id = create(&app).await;

        send(&app, multipart_upload(Some(("first.pdf", &b"one"[..])), Some(&id))).await;
        let (status, body) = send(&app, multipart_upload(Some(("second.pdf", &b"two"[..])), Some(&id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["resume"]["filename"], "second.pdf");
        assert_eq!(file_count(&dir), 1);

        let stored = body["data"]["resume"]["storagePath"].as_str().unwrap();
        let file_name = stored.trim_start_matches("uploads/");
        assert_eq!(std::fs::read(dir.path().join(file_name)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_behavioral_whitespace_rejected() {
        let (app, _dir) = test_app().await;
        let id = create(&app).await;
        let (status, body) = send(
            &app,
            post_json(
                "/behavioral-responses",
                json!({"applicationId": id, "responses": [{"question": "Q", "textResponse": "  "}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please provide at least one response");

        let (_, fetched) = send(&app, get_path(&format!("/{id}"))).await;
        assert_eq!(fetched["data"]["status"], "draft");
    }

    #[tokio::test]
    async fn test_behavioral_responses_not_array() {
        let (app, _dir) = test_app().await;
        let id = create(&app).await;
        let (status, body) = send(
            &app,
            post_json("/behavioral-responses", json!({"applicationId": id, "responses": "yes"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request data");
    }

    #[tokio::test]
    async fn test_behavioral_submit_then_get() {
        let (app, _dir) = test_app().await;
        let id = create(&app).await;
        let (status, body) = send(
            &app,
            post_json(
                "/behavioral-responses",
                json!({
                    "applicationId": id,
                    "responses": [{"question": "Why us?", "textResponse": "Great team"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "submitted");
        assert!(body["data"]["submittedAt"].is_string());

        let (status, fetched) = send(&app, get_path(&format!("/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["status"], "submitted");
        assert_eq!(fetched["data"]["submittedAt"], body["data"]["submittedAt"]);
        assert_eq!(fetched["data"]["behavioralResponses"][0]["textResponse"], "Great team");
    }

    #[tokio::test]
    async fn test_behavioral_unknown_id() {
        let (app, _dir) = test_app().await;
        let (status, _) = send(
            &app,
            post_json(
                "/behavioral-responses",
                json!({
                    "applicationId": uuid::Uuid::new_v4().to_string(),
                    "responses": [{"question": "Q", "textResponse": "A"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed_id() {
        let (app, _dir) = test_app().await;
        let (status, _) = send(&app, get_path(&format!("/{}", uuid::Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get_path("/not-a-uuid")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_projection_and_order() {
        let (app, _dir) = test_app().await;
        let draft_id = create(&app).await;
        let submitted_id = create(&app).await;
        send(
            &app,
            post_json(
                "/behavioral-responses",
                json!({
                    "applicationId": submitted_id,
                    "responses": [{"question": "Q", "textResponse": "A"}]
                }),
            ),
        )
        .await;

        let (status, body) = send(&app, get_path("")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data[0]["id"], submitted_id.as_str());
        assert_eq!(data[1]["id"], draft_id.as_str());
        assert!(data[0].get("phone").is_none());
        assert!(data[0].get("behavioralResponses").is_none());
    }
}
