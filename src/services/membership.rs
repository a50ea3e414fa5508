use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Group, NewGroupRequest, UserGroups};

pub struct MembershipService {
    db: SqlitePool,
}

impl MembershipService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn user_groups(&self, user_id: &str) -> Result<UserGroups, AppError> {
        let groups = repository::fetch_member_groups(&self.db, user_id).await?;
        let course_groups = repository::fetch_course_groups(&self.db, user_id).await?;
        Ok(UserGroups { groups, course_groups })
    }

    /// Creates a group in one of the caller's courses; the caller becomes its first member.
    pub async fn create_group(&self, user_id: &str, req: NewGroupRequest) -> Result<Group, AppError> {
        if req.group_name.trim().is_empty() {
            return Err(AppError::invalid("groupName", "Please enter a group name"));
        }
        if req.course_id.trim().is_empty() {
            return Err(AppError::invalid("courseId", "Please select a course"));
        }

        repository::find_course_by_id(&self.db, &req.course_id)
            .await?
            .ok_or_else(|| AppError::not_found("course"))?;

        let enrolled = repository::fetch_user_courses(&self.db, user_id)
            .await?
            .iter()
            .any(|c| c.id == req.course_id);
        if !enrolled {
            return Err(AppError::BadRequest("Not enrolled in this course".to_string()));
        }

        let group = repository::insert_group(&self.db, req, user_id).await?;
        info!("group {} ({}) created by {}", group.id, group.name, user_id);
        Ok(group)
    }

    pub async fn join_group(&self, user_id: &str, group_id: &str) -> Result<Group, AppError> {
        self.find_group(group_id).await?;

        if repository::add_member(&self.db, group_id, user_id).await? {
            info!("user {} joined group {}", user_id, group_id);
        } else {
            warn!("user {} already in group {}", user_id, group_id);
        }
        self.find_group(group_id).await
    }

    /// Returns the group as it looks after the caller left it.
    pub async fn leave_group(&self, user_id: &str, group_id: &str) -> Result<Group, AppError> {
        self.find_group(group_id).await?;

        if repository::remove_member(&self.db, group_id, user_id).await? {
            info!("user {} left group {}", user_id, group_id);
        } else {
            warn!("user {} was not in group {}", user_id, group_id);
        }
        self.find_group(group_id).await
    }

    async fn find_group(&self, group_id: &str) -> Result<Group, AppError> {
        repository::find_group_by_id(&self.db, group_id)
            .await?
            .ok_or_else(|| AppError::not_found("group"))
    }
}
