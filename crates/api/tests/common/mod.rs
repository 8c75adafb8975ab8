#![allow(dead_code)]

use airport_api::{build_app, AppState};
use airport_control::TokenType;
use airport_models::{Config, User};
use airport_testsupport::{sample_user, MemoryStore};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const SECRET: &str = "test-secret-key";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.auth.secret_key = SECRET.to_string();
        config.storage.media_root = dir.path().join("media").display().to_string();
        config.storage.static_root = dir.path().join("static").display().to_string();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone()).unwrap();
        Self {
            app: build_app(state.clone()),
            state,
            store,
            dir,
        }
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state
            .accounts
            .tokens()
            .issue(user, TokenType::Access)
            .unwrap()
    }

    /// A stored user and an access token for them.
    pub async fn login(&self, email: &str, is_staff: bool) -> (User, String) {
        let user = sample_user(self.store.as_ref(), email, is_staff).await;
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn raw(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.raw(request).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, token, body).await
    }
}
