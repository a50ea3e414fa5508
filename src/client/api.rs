//! Calls against the study-group HTTP API.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::auth::TOKEN_COOKIE;
use crate::models::{
    CreatedGroup, Group, LoginRequest, NewGroupRequest, Profile, RegisterRequest,
    UpdateProfileRequest, UserCoursesResponse, UserGroups,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not logged in")]
    NoSession,
}

/// The four ways a login attempt can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    NotFound,
    InvalidCredentials,
    ServerError,
}

#[async_trait]
pub trait GroupApi: Send + Sync {
    async fn fetch_groups(&self) -> Result<UserGroups, ApiError>;
    async fn create_group(&self, req: &NewGroupRequest) -> Result<Group, ApiError>;
    async fn join_group(&self, group_id: &str) -> Result<Group, ApiError>;
    async fn leave_group(&self, group_id: &str) -> Result<Group, ApiError>;
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError>;
    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn fetch_user_courses(&self) -> Result<UserCoursesResponse, ApiError>;
    async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<Profile, ApiError>;
}

/// HTTP client holding the session cookie handed out at login.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn has_session(&self) -> bool {
        self.current_token().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    fn remember_token(&self, response: &Response) {
        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string());
        if token.is_some() {
            self.set_token(token);
        }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.current_token().ok_or(ApiError::NoSession)?;
        Ok(request.header(COOKIE, format!("{TOKEN_COOKIE}={token}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorized(request)?.send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

#[async_trait]
impl GroupApi for ApiClient {
    async fn fetch_groups(&self) -> Result<UserGroups, ApiError> {
        self.send_json(self.client.get(self.url("/user/groups"))).await
    }

    async fn create_group(&self, req: &NewGroupRequest) -> Result<Group, ApiError> {
        let created: CreatedGroup = self
            .send_json(self.client.post(self.url("/user/groups")).json(req))
            .await?;
        Ok(created.data)
    }

    async fn join_group(&self, group_id: &str) -> Result<Group, ApiError> {
        let url = self.url(&format!("/user/groups/{group_id}"));
        self.send_json(self.client.post(url).json(&json!({ "groupId": group_id })))
            .await
    }

    async fn leave_group(&self, group_id: &str) -> Result<Group, ApiError> {
        let url = self.url(&format!("/user/groups/{group_id}"));
        self.send_json(self.client.delete(url)).await
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post(self.url("/login")).json(&body).send().await?;

        let result = match response.status() {
            StatusCode::OK => {
                self.remember_token(&response);
                LoginResult::Success
            }
            StatusCode::NOT_FOUND => LoginResult::NotFound,
            StatusCode::FORBIDDEN => LoginResult::InvalidCredentials,
            _ => LoginResult::ServerError,
        };
        Ok(result)
    }

    async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        let response = self.client.post(self.url("/register")).json(req).send().await?;
        let response = ensure_success(response).await?;
        self.remember_token(&response);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.url("/logout")).send().await;
        self.set_token(None);
        ensure_success(response?).await?;
        Ok(())
    }

    async fn fetch_user_courses(&self) -> Result<UserCoursesResponse, ApiError> {
        self.send_json(self.client.get(self.url("/user/courses"))).await
    }

    async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<Profile, ApiError> {
        self.send_json(self.client.put(self.url("/user/profile")).json(req))
            .await
    }
}
