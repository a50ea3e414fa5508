use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::models::Comment;

pub struct CommentService {
    db: SqlitePool,
}

impl CommentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Adds a comment by `user_id`, stamped with the author's current name and avatar.
    pub async fn add_comment(&self, user_id: &str, post_id: &str, text: &str) -> Result<Comment, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::invalid("text", "Text is required"));
        }

        repository::find_post_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("post"))?;
        let profile = repository::find_profile(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("profile"))?;

        let now = Utc::now().to_rfc3339();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author_id: user_id.to_string(),
            text: text.to_string(),
            name: profile.display_name(),
            avatar: profile.image_url,
            is_deleted: false,
            created_at: now.clone(),
            updated_at: now,
        };
        repository::insert_comment(&self.db, &comment).await?;

        info!("comment {} added to post {}", comment.id, post_id);
        Ok(comment)
    }

    pub async fn hide_comment(&self, user_id: &str, post_id: &str, comment_id: &str) -> Result<Comment, AppError> {
        repository::find_post_by_id(&self.db, post_id)
            .await?
            .ok_or_else(|| AppError::not_found("post"))?;
        let mut comment = self.find_comment(comment_id).await?;
        if comment.post_id != post_id {
            return Err(AppError::not_found("comment in post"));
        }
        if comment.author_id != user_id {
            return Err(AppError::Unauthorized("Cannot delete comment".to_string()));
        }

        comment.is_deleted = true;
        self.save(&mut comment).await?;
        info!("comment {} hidden", comment.id);
        Ok(comment)
    }

    /// Replaces the text when a non-empty one is given; otherwise only touches `updated_at`.
    pub async fn edit_comment(&self, user_id: &str, comment_id: &str, text: Option<String>) -> Result<Comment, AppError> {
        let mut comment = self.find_comment(comment_id).await?;
        if comment.author_id != user_id {
            return Err(AppError::Unauthorized("Cannot edit comment".to_string()));
        }

        if let Some(text) = text.filter(|t| !t.is_empty()) {
            comment.text = text;
        }
        self.save(&mut comment).await?;
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: &str) -> Result<Comment, AppError> {
        repository::find_comment_by_id(&self.db, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("comment"))
    }

    async fn save(&self, comment: &mut Comment) -> Result<(), AppError> {
        comment.updated_at = Utc::now().to_rfc3339();
        if repository::save_comment(&self.db, comment).await? {
            Ok(())
        } else {
            Err(AppError::not_found("comment"))
        }
    }
}
