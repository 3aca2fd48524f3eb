//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use inkwell::blob::LocalBlobStore;
use inkwell::config::{Cli, Config};
use inkwell::db;
use inkwell::error::AppResult;
use inkwell::mailer::Mailer;
use inkwell::state::{AppState, DbPool};

/// Mailer that keeps every reset token it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_email(&self, to: &str, token: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub mailer: Arc<RecordingMailer>,
    _dir: TempDir,
}

/// A signed-up user with a profile and a live session.
#[derive(Debug, Clone)]
pub struct Member {
    pub token: String,
    pub user_id: i64,
    pub profile_id: i64,
}

pub fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let cli = Cli {
        config: None,
        host: None,
        port: None,
        data_dir: Some(dir.path().to_path_buf()),
    };
    let config = Config::load(&cli).unwrap();

    let pool = db::create_pool(&config.db_path()).unwrap();
    db::run_migrations(&pool).unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        db: pool.clone(),
        blobs: Arc::new(LocalBlobStore::new(
            config.uploads_path(),
            config.storage.public_prefix.clone(),
        )),
        mailer: mailer.clone(),
        config,
    };

    TestApp {
        router: inkwell::app(state),
        pool,
        mailer,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    /// Register, log in, and create a profile.
    pub async fn signup(&self, username: &str) -> Member {
        let email = format!("{}@example.com", username);
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/users",
                None,
                Some(json!({"username": username, "email": email, "password": "secret123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let user_id = body["response"]["id"].as_i64().unwrap();

        let token = self.login(&email, "secret123").await;

        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/profiles",
                Some(&token),
                Some(json!({"name": username, "title": "Writer", "bio": "Writes about Rust"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        Member {
            token,
            user_id,
            profile_id: body["response"]["id"].as_i64().unwrap(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["response"]["token"].as_str().unwrap().to_string()
    }

    pub async fn publish(&self, member: &Member, title: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/posts",
                Some(&member.token),
                Some(json!({"title": title, "content": "Some words about Rust", "tags": "rust,web"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["response"]["id"].as_i64().unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}

/// Multipart body with a single `file` part.
pub fn multipart_file(file_name: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "inkwell-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
