// ============================
// crates/backend-lib/src/auth_router.rs
// ============================
//! HTTP surface of the auth service.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use warden_common::{CredentialsPayload, HealthResponse, MessageResponse, TokenResponse};

use crate::error::{panic_response, AppError};
use crate::validation::{validate_credentials, ValidationError};
use crate::AppState;

/// Create the auth service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let credentials = validate_credentials(body(payload)?)?;
    state.auth.signup(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let credentials = validate_credentials(body(payload)?)?;
    let token = state.auth.login(credentials).await?;
    Ok(Json(TokenResponse { token }))
}

/// Bodies that are not JSON, or not the right shape, are validation errors
fn body(
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> Result<CredentialsPayload, ValidationError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))
}
