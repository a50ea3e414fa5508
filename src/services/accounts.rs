use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest};

/// Result of a credential check. Server failures travel as `Err` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success { user_id: String, token: String },
    NotFound,
    InvalidCredentials,
}

pub struct AccountService {
    db: SqlitePool,
    auth: Arc<Authenticator>,
}

impl AccountService {
    pub fn new(db: SqlitePool, auth: Arc<Authenticator>) -> Self {
        Self { db, auth }
    }

    /// Creates the user and its profile, returning `(user_id, token)`.
    pub async fn register(&self, req: RegisterRequest) -> Result<(String, String), AppError> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::invalid("email", "Email is required"));
        }
        if req.password.is_empty() {
            return Err(AppError::invalid("password", "Password is required"));
        }

        let hash = self.auth.hash_password(&req.password);
        let user =
            repository::insert_user(&self.db, &email, &hash, &req.first_name, &req.last_name).await?;

        let token = self.auth.issue_token(&user.id)?;
        info!("registered user {}", user.id);
        Ok((user.id, token))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, AppError> {
        let email = req.email.trim().to_lowercase();
        let Some(user) = repository::find_user_by_email(&self.db, &email).await? else {
            return Ok(LoginOutcome::NotFound);
        };

        if !self.auth.verify_password(&req.password, &user.password_hash) {
            warn!("invalid credentials for user {}", user.id);
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let token = self.auth.issue_token(&user.id)?;
        Ok(LoginOutcome::Success { user_id: user.id, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    async fn service() -> AccountService {
        let db = connect_in_memory().await.expect("Failed to create test db");
        AccountService::new(db, Arc::new(Authenticator::new("test-secret", 180)))
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "pa55word".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let service = service().await;
        let (user_id, _) = service.register(register_req("Ada@Example.com")).await.expect("register");

        match service.login(login_req("ada@example.com", "pa55word")).await.expect("login") {
            LoginOutcome::Success { user_id: logged_in, token } => {
                assert_eq!(logged_in, user_id);
                assert_eq!(service.auth.verify_token(&token).expect("token").sub, user_id);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(
            service.login(login_req("ada@example.com", "wrong")).await.expect("login"),
            LoginOutcome::InvalidCredentials
        );
        assert_eq!(
            service.login(login_req("who@example.com", "pa55word")).await.expect("login"),
            LoginOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_blanks() {
        let service = service().await;
        service.register(register_req("ada@example.com")).await.expect("register");

        let err = service.register(register_req("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service.register(register_req("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_conflict() {
        let service = service().await;

        let (a, b) = tokio::join!(
            service.register(register_req("ada@example.com")),
            service.register(register_req("ada@example.com"))
        );

        let (winner, loser) = if a.is_ok() { (a, b) } else { (b, a) };
        let (user_id, _) = winner.expect("one registration succeeds");
        assert!(matches!(loser, Err(AppError::Conflict(_))));

        let profile = repository::find_profile(&service.db, &user_id)
            .await
            .expect("query")
            .expect("profile created with the user");
        assert_eq!(profile.first_name, "Ada");
    }
}
