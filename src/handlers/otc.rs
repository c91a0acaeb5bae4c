use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::{ClaimTokenRequest, ExchangeCodeRequest, TokenResponse},
    error::AppError,
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// POST /auth/exchange-code
///
/// Requires a valid access token. Mints a short-lived one-time code
/// for the requested slave app.
pub async fn exchange_code(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ExchangeCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.otc.exchange_code(user.0.sub, req.app_id).await?;
    Ok((StatusCode::OK, Json(result)))
}

/// POST /auth/claim-token
///
/// Does NOT require authentication: the code is the credential. A slave
/// app presents the code and its own package id and receives a token
/// pair for the code's owning user.
pub async fn claim_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ClaimTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.otc.claim_token(&req.code, &req.package_id).await?;
    let res = TokenResponse::new(pair, state.jwt.access_token_expiry_seconds());
    Ok((StatusCode::OK, Json(res)))
}
