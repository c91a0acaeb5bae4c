use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::{LoginRequest, RefreshRequest, TokenResponse},
    error::AppError,
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// POST /auth/login
///
/// Validates credentials and returns an access + refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.login(&req.email, &req.password).await?;
    let res = TokenResponse::new(pair, state.jwt.access_token_expiry_seconds());
    Ok((StatusCode::OK, Json(res)))
}

/// POST /auth/refresh
///
/// Accepts a refresh token and returns a new token pair.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth.refresh(&req.refresh_token).await?;
    let res = TokenResponse::new(pair, state.jwt.access_token_expiry_seconds());
    Ok((StatusCode::OK, Json(res)))
}

/// GET /auth/verify
///
/// Requires a valid access token. Returns the authenticated user's
/// profile and authorized app ids.
pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth.profile(user.0.sub).await?;
    Ok((StatusCode::OK, Json(profile)))
}
