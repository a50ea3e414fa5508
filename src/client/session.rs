use std::sync::Arc;

use tracing::{info, warn};

use crate::client::api::{ApiError, LoginResult, SessionApi};
use crate::client::state::{Action, StateStore, UserCoursesPayload};
use crate::models::{Profile, RegisterRequest, UpdateProfileRequest};

/// Turns authentication results into session actions.
pub struct SessionFlow {
    api: Arc<dyn SessionApi>,
    store: StateStore,
}

impl SessionFlow {
    pub fn new(api: Arc<dyn SessionApi>, store: StateStore) -> Self {
        Self { api, store }
    }

    /// Logs in and, on success, loads the profile and enrolled courses.
    pub async fn login(&self, email: &str, password: &str) -> LoginResult {
        let result = self.api.login(email, password).await.unwrap_or_else(|e| {
            warn!("login request failed: {}", e);
            LoginResult::ServerError
        });

        if result == LoginResult::Success {
            self.store.dispatch(Action::LoginSuccess);
            if let Err(e) = self.load_user().await {
                warn!("loading user after login failed: {}", e);
            }
        } else {
            info!("login rejected: {:?}", result);
            self.store.dispatch(Action::LoginFail);
        }
        result
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        match self.api.register(req).await {
            Ok(()) => {
                self.store.dispatch(Action::RegisterSuccess);
                self.load_user().await
            }
            Err(e) => {
                warn!("registration failed: {}", e);
                self.store.dispatch(Action::RegisterFail);
                Err(e)
            }
        }
    }

    pub async fn load_user(&self) -> Result<(), ApiError> {
        let response = self.api.fetch_user_courses().await?;
        self.store.dispatch(Action::FetchUserCourses(UserCoursesPayload {
            profile: response.profile,
            courses: response.user_courses,
        }));
        Ok(())
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<Profile, ApiError> {
        let profile = self.api.update_profile(req).await?;
        self.store.dispatch(Action::UpdateProfile(profile.clone()));
        Ok(profile)
    }

    /// The local session ends even when the server cannot be reached.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("logout request failed: {}", e);
        }
        self.store.dispatch(Action::Logout);
    }
}
