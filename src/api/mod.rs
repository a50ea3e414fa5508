mod accounts;
mod groups;
mod posts;

use axum::Json;
use axum::extract::Path;
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, NewCourseRequest, Profile, UpdateProfileRequest, UserCoursesResponse};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/courses", get(list_courses).post(create_course))
        .route("/user/courses", get(user_courses))
        .route("/user/courses/{id}", post(enroll))
        .route("/user/groups", get(groups::list_groups).post(groups::create_group))
        .route("/user/groups/{id}", post(groups::join_group).delete(groups::leave_group))
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/posts/{post_id}/comments", post(posts::add_comment))
        .route("/posts/{post_id}/comments/{comment_id}/hide", patch(posts::hide_comment))
        .route("/comments/{comment_id}", patch(posts::edit_comment))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Profile>, AppError> {
    let profile = repository::find_profile(&state.db, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("profile"))?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let profile = repository::update_profile(&state.db, &user.user_id, req)
        .await?
        .ok_or_else(|| AppError::not_found("profile"))?;
    Ok(Json(profile))
}

async fn list_courses(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::invalid("name", "Course name is required"));
    }
    let course = repository::insert_course(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = repository::find_course_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::not_found("course"))?;
    repository::enroll(&state.db, &user.user_id, &course.id).await?;
    Ok(Json(course))
}

async fn user_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserCoursesResponse>, AppError> {
    let profile = repository::find_profile(&state.db, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("profile"))?;
    let user_courses = repository::fetch_user_courses(&state.db, &user.user_id).await?;
    Ok(Json(UserCoursesResponse { profile, user_courses }))
}
