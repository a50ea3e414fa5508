//! Client-side core: application state, its reducer, and the workflows that
//! fold server responses back into it.

pub mod api;
pub mod collaborators;
pub mod groups;
pub mod session;
pub mod state;

pub use api::{ApiClient, ApiError, GroupApi, LoginResult, SessionApi};
pub use collaborators::{LogNotifier, LogPresence, Notifier, NotifyOptions, RoomPresence, Severity};
pub use groups::{CreateGroupForm, GroupWorkflow, NameCheck, WorkflowError};
pub use session::SessionFlow;
pub use state::{Action, ClientState, Session, StateError, StateStore, reduce};
