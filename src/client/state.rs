//! Client application state and the reducer that owns every transition of it.
//!
//! Nothing outside [`reduce`] changes a [`ClientState`]: callers describe a
//! change as an [`Action`] and hand it to a [`StateStore`], which applies the
//! reducer and publishes the result to subscribers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::client::groups::suggested_groups;
use crate::models::{Course, Group, Profile, UserGroups};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("No action type found: {0}")]
    UnrecognizedAction(String),

    #[error("action is missing its type")]
    MissingKind,

    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
        }
    }
}

/// Payload of `FETCH_USER_COURSES`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCoursesPayload {
    pub profile: Profile,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "LOGIN_SUCCESS")]
    LoginSuccess,
    #[serde(rename = "REGISTER_SUCCESS")]
    RegisterSuccess,
    #[serde(rename = "LOGIN_FAIL")]
    LoginFail,
    #[serde(rename = "REGISTER_FAIL")]
    RegisterFail,
    #[serde(rename = "FETCH_USER_COURSES")]
    FetchUserCourses(UserCoursesPayload),
    #[serde(rename = "updateProfile")]
    UpdateProfile(Profile),
    #[serde(rename = "updateUserGroups")]
    UpdateUserGroups(UserGroups),
    #[serde(rename = "LOGOUT")]
    Logout,
}

impl Action {
    pub const KINDS: [&'static str; 8] = [
        "LOGIN_SUCCESS",
        "REGISTER_SUCCESS",
        "LOGIN_FAIL",
        "REGISTER_FAIL",
        "FETCH_USER_COURSES",
        "updateProfile",
        "updateUserGroups",
        "LOGOUT",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Action::LoginSuccess => "LOGIN_SUCCESS",
            Action::RegisterSuccess => "REGISTER_SUCCESS",
            Action::LoginFail => "LOGIN_FAIL",
            Action::RegisterFail => "REGISTER_FAIL",
            Action::FetchUserCourses(_) => "FETCH_USER_COURSES",
            Action::UpdateProfile(_) => "updateProfile",
            Action::UpdateUserGroups(_) => "updateUserGroups",
            Action::Logout => "LOGOUT",
        }
    }

    /// Decodes a `{ "type": ..., "payload": ... }` action. Unknown kinds are an
    /// error, never a silent no-op.
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(StateError::MissingKind)?
            .to_string();

        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(StateError::UnrecognizedAction(kind));
        }
        serde_json::from_value(value).map_err(|source| StateError::MalformedPayload { kind, source })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub session: Session,
    pub profile: Arc<Profile>,
    pub user_courses: Arc<Vec<Course>>,
    pub user_groups: Arc<UserGroups>,
}

impl ClientState {
    /// Groups of the user's courses they have not joined. Derived on every call.
    pub fn suggested_groups(&self) -> Vec<Group> {
        suggested_groups(&self.user_groups.course_groups, &self.user_groups.groups)
    }
}

/// Computes the state that follows `action`. The input is left untouched and
/// untouched parts are shared with it.
pub fn reduce(state: &ClientState, action: Action) -> ClientState {
    let mut next = state.clone();
    match action {
        Action::LoginSuccess | Action::RegisterSuccess => {
            next.session = Session {
                is_authenticated: true,
                is_loading: false,
            };
        }
        // the loading flag doubles as the error-display gate; auth is left as is
        Action::LoginFail | Action::RegisterFail => {
            next.session.is_loading = true;
        }
        Action::FetchUserCourses(payload) => {
            next.profile = Arc::new(payload.profile);
            next.user_courses = Arc::new(payload.courses);
            next.session.is_loading = false;
        }
        Action::UpdateProfile(profile) => {
            next.profile = Arc::new(profile);
        }
        Action::UpdateUserGroups(groups) => {
            next.user_groups = Arc::new(groups);
        }
        Action::Logout => {
            next.session = Session {
                is_authenticated: false,
                is_loading: true,
            };
        }
    }
    next
}

/// Single owner of the client state. Dispatches are applied one at a time
/// and every subscriber sees each resulting state.
#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<ClientState>>,
}

impl StateStore {
    pub fn new(initial: ClientState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, action: Action) {
        debug!(kind = action.kind(), "dispatch");
        self.tx.send_modify(|state| *state = reduce(state, action));
    }

    /// Dispatches an action in its JSON form.
    pub fn dispatch_value(&self, value: Value) -> Result<(), StateError> {
        let action = Action::from_value(value)?;
        self.dispatch(action);
        Ok(())
    }

    pub fn snapshot(&self) -> ClientState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.tx.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(ClientState::default())
    }
}
