//! API routes configuration module

use crate::api::handlers::{get_task_status, info, login, read_users_me, train};
use crate::api::state::AppState;
use axum::{
    routing::{get, post},
    Extension, Router,
};

/// Creates and configures the API router with all routes
///
/// # Arguments
/// * `state` - Registry, broker and token provider shared across handlers
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/login", post(login))
        .route("/users/me/", get(read_users_me).post(read_users_me))
        .route("/train/", post(train))
        .route("/tasks/:id", get(get_task_status))
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::{TaskStatusResponse, TrainResponse};
    use crate::auth::{hash_password, CredentialsProvider, TokenProvider};
    use crate::config::{BrokerConfig, ResultBackendConfig, TrainerEntry, TrainingConfig, UserRecord};
    use crate::core::{Broker, InMemoryBackend, TaskStatus};
    use crate::models::Token;
    use crate::tasks::default_registry;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        _datasets: TempDir,
    }

    fn test_app() -> TestApp {
        let datasets = tempfile::tempdir().unwrap();
        std::fs::create_dir(datasets.path().join("johndoe")).unwrap();
        std::fs::write(
            datasets.path().join("johndoe").join("sales.csv"),
            "store,date,units\n1,2024-01-01,3\n",
        )
        .unwrap();

        let mut trainers = HashMap::new();
        trainers.insert(
            "seq2seq".to_string(),
            TrainerEntry {
                command: vec!["sh".into(), "-c".into(), "echo trained".into()],
                working_dir: None,
            },
        );
        let registry = default_registry(&TrainingConfig {
            datasets_dir: datasets.path().to_path_buf(),
            trainers,
        })
        .unwrap();

        let users = [
            UserRecord {
                username: "johndoe".into(),
                full_name: Some("John Doe".into()),
                email: None,
                hashed_password: hash_password("secret"),
                disabled: false,
            },
            UserRecord {
                username: "alice".into(),
                full_name: None,
                email: None,
                hashed_password: hash_password("wonderland"),
                disabled: true,
            },
        ];
        let tokens = TokenProvider::new(
            "test-secret",
            Duration::from_secs(600),
            CredentialsProvider::new(&users),
        );

        let broker = Broker::start(
            Arc::new(InMemoryBackend::new()),
            &BrokerConfig {
                workers: 2,
                result_expires: None,
                cleanup_interval: Duration::from_secs(60),
                result_backend: ResultBackendConfig::Memory,
            },
        );

        TestApp {
            router: app(AppState {
                registry: Arc::new(registry),
                broker,
                tokens,
            }),
            _datasets: datasets,
        }
    }

    async fn body<T: DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn login(router: &Router, username: &str, password: &str) -> Response {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "grant_type=password&username={}&password={}",
                username, password
            )))
            .unwrap();
        send(router, request).await
    }

    async fn token(router: &Router, username: &str, password: &str) -> String {
        let response = login(router, username, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        body::<Token>(response).await.access_token
    }

    fn authed(method: &str, uri: &str, token: &str, payload: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match payload {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn train_payload() -> Value {
        json!({
            "trainer": {
                "name": "seq2seq",
                "max_prediction_length": 6,
                "max_encoder_length": 24
            },
            "dataset": {
                "name": "sales",
                "group_ids": ["store"],
                "timestamp": "date",
                "target": "units"
            }
        })
    }

    #[tokio::test]
    async fn info_lists_registered_tasks() {
        let app = test_app();
        let response = send(&app.router, Request::get("/info").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let info: Value = body(response).await;
        assert_eq!(info["tasks"], json!(["LoadDatasetTask", "TrainTask"]));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_app();
        let response = login(&app.router, "johndoe", "nope").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn users_me_returns_token_owner() {
        let app = test_app();
        let token = token(&app.router, "johndoe", "secret").await;
        let response = send(&app.router, authed("POST", "/users/me/", &token, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let user: Value = body(response).await;
        assert_eq!(user["username"], "johndoe");
        assert_eq!(user["full_name"], "John Doe");
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() {
        let app = test_app();
        let token = token(&app.router, "alice", "wonderland").await;
        let response = send(&app.router, authed("GET", "/users/me/", &token, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn train_requires_a_token() {
        let app = test_app();
        let request = Request::post("/train/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(train_payload().to_string()))
            .unwrap();
        let response = send(&app.router, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn train_queues_chain_and_reports_success() {
        let app = test_app();
        let token = token(&app.router, "johndoe", "secret").await;

        let response = send(
            &app.router,
            authed("POST", "/train/", &token, Some(train_payload())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let queued: TrainResponse = body(response).await;

        let uri = format!("/tasks/{}", queued.async_task_id);
        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let response = send(&app.router, authed("GET", &uri, &token, None)).await;
                assert_eq!(response.status(), StatusCode::OK);
                let status: TaskStatusResponse = body(response).await;
                if status.status.is_finished() {
                    return status;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(finished.status, TaskStatus::Success);
        let result = finished.result.unwrap();
        assert_eq!(result["trainer"], "seq2seq");
        assert_eq!(result["stdout"], "trained");
    }

    #[tokio::test]
    async fn failed_chain_reports_failing_task() {
        let app = test_app();
        let token = token(&app.router, "johndoe", "secret").await;
        let mut payload = train_payload();
        payload["dataset"]["name"] = json!("missing");

        let response = send(&app.router, authed("POST", "/train/", &token, Some(payload))).await;
        let queued: TrainResponse = body(response).await;

        let uri = format!("/tasks/{}", queued.async_task_id);
        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let response = send(&app.router, authed("GET", &uri, &token, None)).await;
                let status: TaskStatusResponse = body(response).await;
                if status.status.is_finished() {
                    return status;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(finished.status, TaskStatus::Failure);
        let error = finished.error.unwrap();
        assert_eq!(error.task, "LoadDatasetTask");
        assert_eq!(error.reason, "dataset 'missing' not found for user 'johndoe'");
    }

    #[tokio::test]
    async fn unknown_task_id_is_not_found() {
        let app = test_app();
        let token = token(&app.router, "johndoe", "secret").await;
        let response = send(&app.router, authed("GET", "/tasks/nope", &token, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
