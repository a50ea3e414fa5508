use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A comment on a post. Hidden comments keep their row with `is_deleted` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditCommentRequest {
    pub text: Option<String>,
}

/// `{ "comment": ... }` envelope used by every comment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEnvelope {
    pub comment: Comment,
}
