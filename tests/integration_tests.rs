use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use diesel::{PgConnection, r2d2};
use project_assistant::{
    AppState,
    chat::{ChatClient, ChatError},
    config::Config,
    db::DbPool,
    routes,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod unit;

/// Builds a config from `pairs`; a pair replaces the default of the same key.
fn test_config(pairs: &[(&str, &str)]) -> Config {
    let mut vars: Vec<(String, String)> = vec![(
        "DATABASE_URL".to_string(),
        "postgres://nobody@127.0.0.1:1/none".to_string(),
    )];
    for (key, value) in pairs {
        vars.retain(|(k, _)| k != key);
        vars.push((key.to_string(), value.to_string()));
    }
    envy::from_iter(vars).unwrap()
}

/// Pool that never connects up front; handlers that touch it fail after a short timeout.
fn lazy_pool(url: &str) -> DbPool {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(url);
    r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_millis(300))
        .build_unchecked(manager)
}

struct EchoChat;

#[async_trait]
impl ChatClient for EchoChat {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        Ok(format!("echo: {}", prompt))
    }
}

fn app(chat: Option<Arc<dyn ChatClient>>) -> Router {
    let config = test_config(&[]);
    let db = lazy_pool(&config.database_url);
    let state = AppState::with_integrations(db, config, chat, None);
    routes::create_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[test]
fn test_config_overrides_the_default_database_url() {
    let config = test_config(&[
        ("DATABASE_URL", "postgres://app@db/projects"),
        ("BCRYPT_COST", "4"),
    ]);
    assert_eq!(config.database_url, "postgres://app@db/projects");
    assert_eq!(config.bcrypt_cost, 4);

    let config = test_config(&[]);
    assert_eq!(config.database_url, "postgres://nobody@127.0.0.1:1/none");
}

mod router_tests {
    use super::*;

    #[tokio::test]
    async fn options_do_not_need_the_database() {
        let request = Request::get("/api/Options/status").body(Body::empty()).unwrap();
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["key"], "not_started");
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        let request = Request::get("/api/Options/convert-status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["key"], "pending");
    }

    fn multipart_upload(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "upload-boundary";
        let mut body = String::new();
        for (name, file_name, value) in parts {
            body.push_str(&format!("--{}\r\n", boundary));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/wav\r\n\r\n",
                    name, file_name
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        Request::post("/api/RecordedMediaFile/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn failed_upload_leaves_no_file_behind() {
        let dir = std::env::temp_dir().join(format!("upload-check-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let upload_dir = dir.to_string_lossy().to_string();
        let config = test_config(&[("UPLOAD_DIR", upload_dir.as_str())]);
        let db = lazy_pool(&config.database_url);
        let state = Arc::new(AppState::with_integrations(db, config, None, None));

        // meetingId 在前: 写盘前就失败
        let request = multipart_upload(&[
            ("meetingId", None, "7"),
            ("file", Some("standup.wav"), "RIFF0000WAVE"),
        ]);
        let (status, body) = send(routes::create_router(state.clone()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        // 文件在前: 写盘后失败, 文件被删除
        let request = multipart_upload(&[
            ("file", Some("standup.wav"), "RIFF0000WAVE"),
            ("meetingId", None, "7"),
        ]);
        let (status, _) = send(routes::create_router(state), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn chat_is_unavailable_without_credentials() {
        let request = json_request("POST", "/api/ChatAI", json!({"prompt": "hello"}));
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn chat_forwards_prompt() {
        let request = json_request("POST", "/api/ChatAI", json!("summarise the meeting"));
        let (status, body) = send(app(Some(Arc::new(EchoChat))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "echo: summarise the meeting");
    }

    #[tokio::test]
    async fn blank_chat_prompt_is_rejected() {
        let request = json_request("POST", "/api/ChatAI", json!({"prompt": "   "}));
        let (status, body) = send(app(Some(Arc::new(EchoChat))), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_project_is_rejected_before_the_database() {
        let request = json_request(
            "POST",
            "/api/Project",
            json!({
                "name": "Rollout",
                "startDate": "2024-05-10",
                "endDate": "2024-05-01"
            }),
        );
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn malformed_search_body_is_a_validation_error() {
        let request = Request::post("/api/MyTask/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn transcription_is_unavailable_without_speech() {
        let request = Request::post("/api/RecordedMediaFile/1/transcribe")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(None), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_unreachable_database() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], false);
        assert_eq!(body["chatConfigured"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::get("/api/Nope").body(Body::empty()).unwrap();
        let (status, _) = send(app(None), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

// Runs against a migrated database named by TEST_DATABASE_URL
mod database_tests {
    use super::*;

    fn db_app() -> Router {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let config = test_config(&[("DATABASE_URL", url.as_str()), ("BCRYPT_COST", "4")]);
        let db = r2d2::Pool::builder()
            .max_size(2)
            .build(r2d2::ConnectionManager::<PgConnection>::new(url))
            .unwrap();
        routes::create_router(Arc::new(AppState::with_integrations(db, config, None, None)))
    }

    fn unique(prefix: &str) -> String {
        format!("{} {}", prefix, uuid::Uuid::new_v4())
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn project_lifecycle() {
        let app = db_app();
        let name = unique("Rollout");
        let create = json_request(
            "POST",
            "/api/Project",
            json!({"name": name, "startDate": "2024-05-01", "endDate": "2024-06-30"}),
        );
        let (status, body) = send(app.clone(), create).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        let duplicate = json_request(
            "POST",
            "/api/Project",
            json!({"name": name, "startDate": "2024-05-01", "endDate": "2024-06-30"}),
        );
        let (status, _) = send(app.clone(), duplicate).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let completion = json_request(
            "PATCH",
            &format!("/api/Project/{}/completion", id),
            json!({"completionPercentage": 40}),
        );
        let (status, body) = send(app.clone(), completion).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["completionPercentage"], 40);

        let search = json_request("POST", "/api/Project/search", json!({"keyword": name}));
        let (status, body) = send(app.clone(), search).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalCount"], 1);

        let delete = Request::delete(format!("/api/Project/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), delete).await;
        assert_eq!(status, StatusCode::OK);

        let get = Request::get(format!("/api/Project/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, get).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn task_requires_existing_project() {
        let request = json_request(
            "POST",
            "/api/MyTask",
            json!({
                "projectId": i32::MAX,
                "name": unique("Orphan"),
                "startDate": "2024-05-01",
                "endDate": "2024-05-02"
            }),
        );
        let (status, _) = send(db_app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn user_password_is_never_returned() {
        let request = json_request(
            "POST",
            "/api/MyUser",
            json!({
                "account": unique("acct"),
                "password": "s3cret-pass",
                "name": "Lin"
            }),
        );
        let (status, body) = send(db_app(), request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"].get("password").is_none());
    }
}
