pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::services::{AuthService, JwtService, OtcService};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub otc: OtcService,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.config.service_name,
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build the application router.
///
/// `/auth/login`, `/auth/refresh`, and `/auth/claim-token` are public:
/// the first two carry their own credentials and the claim endpoint is
/// authenticated by the code itself. `/auth/verify` and
/// `/auth/exchange-code` require a valid access token.
pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let protected = Router::new()
        .route("/auth/verify", get(handlers::auth::verify))
        .route("/auth/exchange-code", post(handlers::otc::exchange_code))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/claim-token", post(handlers::otc::claim_token))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
