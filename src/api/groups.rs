use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{CreatedGroup, Group, NewGroupRequest, UserGroups};
use crate::services::MembershipService;
use crate::state::AppState;

pub(super) async fn list_groups(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserGroups>, AppError> {
    let service = MembershipService::new(state.db.clone());
    Ok(Json(service.user_groups(&user.user_id).await?))
}

pub(super) async fn create_group(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewGroupRequest>,
) -> Result<(StatusCode, Json<CreatedGroup>), AppError> {
    let service = MembershipService::new(state.db.clone());
    let group = service.create_group(&user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(CreatedGroup { data: group })))
}

pub(super) async fn join_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let service = MembershipService::new(state.db.clone());
    Ok(Json(service.join_group(&user.user_id, &id).await?))
}

pub(super) async fn leave_group(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let service = MembershipService::new(state.db.clone());
    Ok(Json(service.leave_group(&user.user_id, &id).await?))
}
