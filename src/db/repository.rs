use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Comment, Course, Group, NewCourseRequest, NewGroupRequest, Post, Profile,
    UpdateProfileRequest, User,
};

/// Creates the user together with an empty-avatar profile. A taken email is a
/// conflict, including when a concurrent registration wins the race.
pub async fn insert_user(
    db: &SqlitePool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User, AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    let mut tx = db.begin().await?;
    sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            other => AppError::Database(other),
        })?;

    sqlx::query(
        "INSERT INTO profiles (user_id, first_name, last_name, image_url, updated_at) VALUES (?, ?, ?, '', ?)",
    )
    .bind(&user.id)
    .bind(first_name)
    .bind(last_name)
    .bind(&user.created_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(user)
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_profile(db: &SqlitePool, user_id: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT user_id, first_name, last_name, image_url FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn update_profile(
    db: &SqlitePool,
    user_id: &str,
    req: UpdateProfileRequest,
) -> Result<Option<Profile>, sqlx::Error> {
    let affected = sqlx::query(
        r#"
        UPDATE profiles
        SET first_name = ?1,
            last_name = ?2,
            image_url = ?3,
            updated_at = ?4
        WHERE user_id = ?5
        "#,
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.image_url)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(db)
    .await?
    .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    find_profile(db, user_id).await
}

pub async fn insert_course(db: &SqlitePool, req: NewCourseRequest) -> Result<Course, sqlx::Error> {
    let course = Course {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query("INSERT INTO courses (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&course.id)
        .bind(&course.name)
        .bind(&course.created_at)
        .execute(db)
        .await?;

    Ok(course)
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT id, name, created_at FROM courses ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_course_by_id(db: &SqlitePool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT id, name, created_at FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn enroll(db: &SqlitePool, user_id: &str, course_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO enrollments (user_id, course_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(course_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn fetch_user_courses(db: &SqlitePool, user_id: &str) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT c.id, c.name, c.created_at
        FROM courses c
        JOIN enrollments e ON e.course_id = c.id
        WHERE e.user_id = ?
        ORDER BY c.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

#[derive(FromRow)]
struct GroupRow {
    id: String,
    name: String,
    image_url: String,
    course_id: String,
}

async fn with_members(db: &SqlitePool, row: GroupRow) -> Result<Group, sqlx::Error> {
    let members = fetch_members(db, &row.id).await?;
    Ok(Group {
        id: row.id,
        name: row.name,
        image_url: row.image_url,
        course_id: row.course_id,
        members,
    })
}

async fn with_members_all(db: &SqlitePool, rows: Vec<GroupRow>) -> Result<Vec<Group>, sqlx::Error> {
    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        groups.push(with_members(db, row).await?);
    }
    Ok(groups)
}

pub async fn fetch_members(db: &SqlitePool, group_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM group_members WHERE group_id = ? ORDER BY joined_at, rowid",
    )
    .bind(group_id)
    .fetch_all(db)
    .await
}

/// Inserts the group and makes `created_by` its first member.
pub async fn insert_group(
    db: &SqlitePool,
    req: NewGroupRequest,
    created_by: &str,
) -> Result<Group, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO study_groups (id, name, image_url, course_id, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&id)
    .bind(req.group_name.trim())
    .bind(&req.image_url)
    .bind(&req.course_id)
    .bind(created_by)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(created_by)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Group {
        id,
        name: req.group_name.trim().to_string(),
        image_url: req.image_url,
        course_id: req.course_id,
        members: vec![created_by.to_string()],
    })
}

pub async fn find_group_by_id(db: &SqlitePool, id: &str) -> Result<Option<Group>, sqlx::Error> {
    let row = sqlx::query_as::<_, GroupRow>(
        "SELECT id, name, image_url, course_id FROM study_groups WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => Ok(Some(with_members(db, row).await?)),
        None => Ok(None),
    }
}

/// Returns false when the user already was a member.
pub async fn add_member(db: &SqlitePool, group_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?, ?, ?)",
    )
    .bind(group_id)
    .bind(user_id)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// Returns false when the user was not a member.
pub async fn remove_member(db: &SqlitePool, group_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
        .bind(group_id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_member_groups(db: &SqlitePool, user_id: &str) -> Result<Vec<Group>, sqlx::Error> {
    let rows = sqlx::query_as::<_, GroupRow>(
        r#"
        SELECT g.id, g.name, g.image_url, g.course_id
        FROM study_groups g
        JOIN group_members m ON m.group_id = g.id
        WHERE m.user_id = ?
        ORDER BY m.joined_at, m.rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    with_members_all(db, rows).await
}

/// Every group of every course the user is enrolled in, joined or not.
pub async fn fetch_course_groups(db: &SqlitePool, user_id: &str) -> Result<Vec<Group>, sqlx::Error> {
    let rows = sqlx::query_as::<_, GroupRow>(
        r#"
        SELECT g.id, g.name, g.image_url, g.course_id
        FROM study_groups g
        JOIN enrollments e ON e.course_id = g.course_id
        WHERE e.user_id = ?
        ORDER BY g.created_at, g.rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    with_members_all(db, rows).await
}

pub async fn insert_post(db: &SqlitePool, author_id: &str, text: &str) -> Result<Post, sqlx::Error> {
    let post = Post {
        id: Uuid::new_v4().to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query("INSERT INTO posts (id, author_id, text, created_at) VALUES (?, ?, ?, ?)")
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.text)
        .bind(&post.created_at)
        .execute(db)
        .await?;

    Ok(post)
}

pub async fn find_post_by_id(db: &SqlitePool, id: &str) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>("SELECT id, author_id, text, created_at FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

const COMMENT_COLUMNS: &str =
    "id, post_id, author_id, text, name, avatar, is_deleted, created_at, updated_at";

pub async fn insert_comment(db: &SqlitePool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comments
            (id, post_id, author_id, text, name, avatar, is_deleted, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.post_id)
    .bind(&comment.author_id)
    .bind(&comment.text)
    .bind(&comment.name)
    .bind(&comment.avatar)
    .bind(comment.is_deleted)
    .bind(&comment.created_at)
    .bind(&comment.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn find_comment_by_id(db: &SqlitePool, id: &str) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Comments of a post that have not been hidden, oldest first.
pub async fn fetch_visible_comments(db: &SqlitePool, post_id: &str) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ? AND is_deleted = 0 ORDER BY created_at, rowid"
    ))
    .bind(post_id)
    .fetch_all(db)
    .await
}

/// Writes back the mutable fields of a comment. The author is never updated.
pub async fn save_comment(db: &SqlitePool, comment: &Comment) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET text = ?1,
            is_deleted = ?2,
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(&comment.text)
    .bind(comment.is_deleted)
    .bind(&comment.updated_at)
    .bind(&comment.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    async fn setup_test_db() -> SqlitePool {
        connect_in_memory().await.expect("Failed to create test db")
    }

    async fn user(pool: &SqlitePool, email: &str) -> User {
        insert_user(pool, email, "salt$hash", "Ada", "Lovelace")
            .await
            .expect("Failed to insert user")
    }

    fn group_req(name: &str, course_id: &str) -> NewGroupRequest {
        NewGroupRequest {
            group_name: name.to_string(),
            image_url: String::new(),
            course_id: course_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let pool = setup_test_db().await;
        let created = user(&pool, "ada@example.com").await;

        let found = find_user_by_email(&pool, "ada@example.com")
            .await
            .expect("Failed to query user")
            .expect("User not found");
        assert_eq!(found.id, created.id);

        let missing = find_user_by_email(&pool, "nobody@example.com").await.expect("query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let pool = setup_test_db().await;
        user(&pool, "ada@example.com").await;

        let err = insert_user(&pool, "ada@example.com", "x$y", "Eve", "Intruder")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_insert_user_creates_profile() {
        let pool = setup_test_db().await;
        let u = user(&pool, "ada@example.com").await;

        let profile = find_profile(&pool, &u.id)
            .await
            .expect("Failed to query profile")
            .expect("Profile not found");
        assert_eq!(profile.display_name(), "Ada Lovelace");
        assert_eq!(profile.image_url, "");
    }

    #[tokio::test]
    async fn test_update_profile_replaces_fields() {
        let pool = setup_test_db().await;
        let u = user(&pool, "ada@example.com").await;

        let updated = update_profile(
            &pool,
            &u.id,
            UpdateProfileRequest {
                first_name: "Augusta".to_string(),
                last_name: "King".to_string(),
                image_url: "https://img/ada.png".to_string(),
            },
        )
        .await
        .expect("Failed to update profile")
        .expect("Profile not found");

        assert_eq!(updated.display_name(), "Augusta King");
        assert_eq!(updated.image_url, "https://img/ada.png");
    }

    #[tokio::test]
    async fn test_membership_and_course_groups() {
        let pool = setup_test_db().await;
        let ada = user(&pool, "ada@example.com").await;
        let bob = user(&pool, "bob@example.com").await;

        let algo = insert_course(&pool, NewCourseRequest { name: "Algorithms".to_string() })
            .await
            .expect("Failed to insert course");
        enroll(&pool, &ada.id, &algo.id).await.expect("enroll");
        enroll(&pool, &ada.id, &algo.id).await.expect("enroll twice");
        enroll(&pool, &bob.id, &algo.id).await.expect("enroll");

        let group = insert_group(&pool, group_req("  Graph Nerds ", &algo.id), &bob.id)
            .await
            .expect("Failed to insert group");
        assert_eq!(group.name, "Graph Nerds");
        assert_eq!(group.members, vec![bob.id.clone()]);

        assert_eq!(fetch_user_courses(&pool, &ada.id).await.expect("courses").len(), 1);
        assert!(fetch_member_groups(&pool, &ada.id).await.expect("mine").is_empty());
        assert_eq!(fetch_course_groups(&pool, &ada.id).await.expect("course").len(), 1);

        assert!(add_member(&pool, &group.id, &ada.id).await.expect("join"));
        assert!(!add_member(&pool, &group.id, &ada.id).await.expect("join again"));

        let reloaded = find_group_by_id(&pool, &group.id)
            .await
            .expect("query")
            .expect("Group not found");
        assert_eq!(reloaded.members, vec![bob.id.clone(), ada.id.clone()]);
        assert_eq!(fetch_member_groups(&pool, &ada.id).await.expect("mine").len(), 1);

        assert!(remove_member(&pool, &group.id, &ada.id).await.expect("leave"));
        assert!(!remove_member(&pool, &group.id, &ada.id).await.expect("leave again"));
        assert!(fetch_member_groups(&pool, &ada.id).await.expect("mine").is_empty());
    }

    #[tokio::test]
    async fn test_hidden_comments_are_not_listed() {
        let pool = setup_test_db().await;
        let u = user(&pool, "ada@example.com").await;
        let post = insert_post(&pool, &u.id, "Exam tips?").await.expect("post");

        let now = Utc::now().to_rfc3339();
        let mut comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post.id.clone(),
            author_id: u.id.clone(),
            text: "Sleep well".to_string(),
            name: "Ada Lovelace".to_string(),
            avatar: String::new(),
            is_deleted: false,
            created_at: now.clone(),
            updated_at: now,
        };
        insert_comment(&pool, &comment).await.expect("comment");
        assert_eq!(fetch_visible_comments(&pool, &post.id).await.expect("list").len(), 1);

        comment.is_deleted = true;
        assert!(save_comment(&pool, &comment).await.expect("save"));

        assert!(fetch_visible_comments(&pool, &post.id).await.expect("list").is_empty());
        let stored = find_comment_by_id(&pool, &comment.id)
            .await
            .expect("query")
            .expect("Comment was physically removed");
        assert!(stored.is_deleted);
    }
}
