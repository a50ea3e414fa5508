use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    CommentEnvelope, EditCommentRequest, NewCommentRequest, NewPostRequest, Post, PostWithComments,
};
use crate::services::CommentService;
use crate::state::AppState;

pub(super) async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewPostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::invalid("text", "Text is required"));
    }
    let post = repository::insert_post(&state.db, &user.user_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(super) async fn get_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<PostWithComments>, AppError> {
    let post = repository::find_post_by_id(&state.db, &post_id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    let comments = repository::fetch_visible_comments(&state.db, &post_id).await?;
    Ok(Json(PostWithComments { post, comments }))
}

pub(super) async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
    Json(req): Json<NewCommentRequest>,
) -> Result<(StatusCode, Json<CommentEnvelope>), AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.add_comment(&user.user_id, &post_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(CommentEnvelope { comment })))
}

pub(super) async fn hide_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentEnvelope>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.hide_comment(&user.user_id, &post_id, &comment_id).await?;
    Ok(Json(CommentEnvelope { comment }))
}

pub(super) async fn edit_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<String>,
    Json(req): Json<EditCommentRequest>,
) -> Result<Json<CommentEnvelope>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.edit_comment(&user.user_id, &comment_id, req.text).await?;
    Ok(Json(CommentEnvelope { comment }))
}
