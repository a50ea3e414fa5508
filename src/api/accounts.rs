use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header::SET_COOKIE};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::auth::{clear_token_cookie, token_cookie};
use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest};
use crate::services::{AccountService, LoginOutcome};
use crate::state::AppState;

pub(super) async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let service = AccountService::new(state.db.clone(), state.auth.clone());
    let (_, token) = service.register(req).await?;
    Ok((StatusCode::CREATED, [(SET_COOKIE, token_cookie(&token))]).into_response())
}

pub(super) async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let service = AccountService::new(state.db.clone(), state.auth.clone());
    match service.login(req).await {
        Ok(LoginOutcome::Success { token, .. }) => {
            (StatusCode::OK, [(SET_COOKIE, token_cookie(&token))]).into_response()
        }
        Ok(LoginOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "response": "Cannot find user" })),
        )
            .into_response(),
        Ok(LoginOutcome::InvalidCredentials) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "response": "Invalid credentials" })),
        )
            .into_response(),
        Err(e) => {
            error!("login failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(super) async fn logout() -> Response {
    (StatusCode::NO_CONTENT, [(SET_COOKIE, clear_token_cookie())]).into_response()
}
