//! Test helpers: application state over in-memory stores plus seed and
//! request utilities.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

use companion_auth::{
    build_router,
    config::{Config, DatabaseConfig, Environment, JwtConfig, OtcConfig},
    models::{App, User},
    services::{AuthService, JwtService, OtcService},
    store::{MemoryCodeStore, MemoryCredentialStore},
    utils::{hash_password, Password},
    AppState,
};

pub const TEST_PASSWORD: &str = "test_password_123";

/// Application wired against in-memory stores.
pub struct TestApp {
    pub state: AppState,
    pub creds: MemoryCredentialStore,
    pub codes: MemoryCodeStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_code_expiry(30)
    }

    pub fn with_code_expiry(code_expiry_seconds: i64) -> Self {
        let config = test_config(code_expiry_seconds);

        let creds = MemoryCredentialStore::new();
        let codes = MemoryCodeStore::new();

        let jwt = JwtService::new(&config.jwt);
        let auth = AuthService::new(Arc::new(creds.clone()), jwt.clone());
        let otc = OtcService::new(
            Arc::new(codes.clone()),
            Arc::new(creds.clone()),
            auth.clone(),
            code_expiry_seconds,
        );

        let state = AppState {
            config,
            jwt,
            auth,
            otc,
        };

        Self { state, creds, codes }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Seed a user with the shared test password.
    pub async fn seed_user(&self, email: &str) -> User {
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("failed to hash test password");
        let user = User::new(email.to_string(), hash.into_string());
        self.creds.add_user(user.clone()).await;
        user
    }

    pub async fn seed_app(&self, name: &str, package_id: &str) -> App {
        let app = App::new(
            name.to_string(),
            package_id.to_string(),
            format!("{}://", name),
        );
        self.creds.add_app(app.clone()).await;
        app
    }

    pub async fn grant(&self, user: &User, app: &App) {
        self.creds.grant_permission(user.user_id, app.app_id).await;
    }

    /// Login over HTTP and return the access token.
    pub async fn login(&self, email: &str) -> String {
        let res = post_json(
            self.router(),
            "/auth/login",
            serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        body["access_token"].as_str().expect("no access token").to_string()
    }
}

pub async fn post_json(
    router: Router,
    path: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    router.oneshot(request).await.unwrap()
}

pub async fn get(router: Router, path: &str, bearer: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();

    router.oneshot(request).await.unwrap()
}

pub async fn read_json(res: Response<Body>) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body was not json")
}

fn test_config(code_expiry_seconds: i64) -> Config {
    Config {
        environment: Environment::Dev,
        service_name: "companion-auth".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            issuer: "companion-auth".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        otc: OtcConfig {
            code_expiry_seconds,
            sweep_interval_seconds: 300,
        },
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}
