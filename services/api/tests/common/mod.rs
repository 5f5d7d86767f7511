//! Shared helpers for the HTTP integration tests.
//!
//! The router is the one production uses. Storage is either the in-memory
//! `DatabaseService` or, for the `postgres_*` suites, a `DbAdapter` over the
//! pool handed out by `#[sqlx::test]`. Argon2 runs with cheap work factors.

#![allow(dead_code)]

use std::sync::Arc;

use api_lib::adapters::{Argon2PasswordAdapter, DbAdapter, JwtTokenAdapter};
use api_lib::config::{Config, PasswordHashConfig};
use api_lib::web::{self, state::AppState};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use study_tracker_core::ports::DatabaseService;
use study_tracker_core::testing::InMemoryDatabase;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Build a test `Config` with safe defaults.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        log_level: tracing::Level::INFO,
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_days: 7,
        password_hash: PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
        },
        cors_allowed_origin: "http://localhost:5173".to_string(),
    }
}

pub struct TestApp<D = InMemoryDatabase> {
    pub router: Router,
    pub db: Arc<D>,
}

pub fn build_test_app() -> TestApp {
    build_app_over(Arc::new(InMemoryDatabase::new()))
}

/// The same app backed by Postgres; migrations are applied by `#[sqlx::test]`.
pub fn build_pg_test_app(pool: PgPool) -> TestApp<DbAdapter> {
    build_app_over(Arc::new(DbAdapter::new(pool)))
}

fn build_app_over<D: DatabaseService + 'static>(db: Arc<D>) -> TestApp<D> {
    let config = Arc::new(test_config());
    let passwords =
        Arc::new(Argon2PasswordAdapter::new(&config.password_hash).expect("valid argon2 params"));
    let tokens = Arc::new(JwtTokenAdapter::new(
        &config.jwt_secret,
        chrono::Duration::days(config.token_ttl_days),
    ));

    let state = Arc::new(AppState::new(config, db.clone(), passwords, tokens));
    TestApp {
        router: web::router(state),
        db,
    }
}

impl<D> TestApp<D> {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Sends `body` verbatim as a JSON request, for payloads `json!` cannot express.
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user and returns the bearer token.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["token"]
            .as_str()
            .expect("token should be a string")
            .to_string()
    }

    /// Creates a language for the token's user and returns its id.
    pub async fn create_language(&self, token: &str, name: &str) -> String {
        let response = self.post("/api/languages", token, json!({ "name": name })).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    /// Logs a session and returns its id.
    pub async fn log_session(
        &self,
        token: &str,
        language_id: &str,
        category: &str,
        minutes: i64,
        date: &str,
    ) -> String {
        let response = self
            .post(
                "/api/sessions",
                token,
                json!({
                    "language_id": language_id,
                    "category": category,
                    "duration_minutes": minutes,
                    "date": date,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid json")
}
