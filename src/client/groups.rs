//! Create, join and leave study groups, keeping "my groups", "course groups"
//! and the derived suggestions consistent.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::client::api::{ApiError, GroupApi};
use crate::client::collaborators::{Notifier, NotifyOptions, RoomPresence};
use crate::client::state::{Action, StateStore};
use crate::models::{Group, NewGroupRequest, UserGroups};

pub const GROUP_CREATED: &str = "Group Created Successfully.";
pub const GROUP_CREATE_FAILED: &str = "Error Creating Group.";

/// The one comparison form for group names.
pub fn normalize_group_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCheck {
    Valid,
    Empty,
    AlreadyExists,
}

impl NameCheck {
    pub fn is_valid(self) -> bool {
        self == NameCheck::Valid
    }

    pub fn message(self) -> &'static str {
        match self {
            NameCheck::Valid => "",
            NameCheck::Empty => "Please enter a group name",
            NameCheck::AlreadyExists => "A group with this name already exists!",
        }
    }
}

/// Checks `name` against every group the user can see. Best effort only: the
/// server does not enforce unique names.
pub fn check_group_name(name: &str, groups: &[Group], course_groups: &[Group]) -> NameCheck {
    let wanted = normalize_group_name(name);
    if wanted.is_empty() {
        return NameCheck::Empty;
    }

    let taken = groups
        .iter()
        .chain(course_groups)
        .any(|g| normalize_group_name(&g.name) == wanted);
    if taken {
        NameCheck::AlreadyExists
    } else {
        NameCheck::Valid
    }
}

/// Course groups whose id is not among `my_groups`, in course-group order.
pub fn suggested_groups(course_groups: &[Group], my_groups: &[Group]) -> Vec<Group> {
    let joined: HashSet<&str> = my_groups.iter().map(|g| g.id.as_str()).collect();
    course_groups
        .iter()
        .filter(|g| !joined.contains(g.id.as_str()))
        .cloned()
        .collect()
}

pub fn apply_created(current: &UserGroups, created: Group) -> UserGroups {
    let mut groups = current.groups.clone();
    groups.push(created);
    UserGroups {
        groups,
        course_groups: current.course_groups.clone(),
    }
}

/// Adds the joined group to my groups; a group already there is replaced, not duplicated.
pub fn apply_joined(current: &UserGroups, joined: Group) -> UserGroups {
    let mut groups = current.groups.clone();
    match groups.iter_mut().find(|g| g.id == joined.id) {
        Some(existing) => *existing = joined,
        None => groups.push(joined),
    }
    UserGroups {
        groups,
        course_groups: current.course_groups.clone(),
    }
}

/// Drops the group from my groups and swaps in the server's copy among the
/// course groups. A group missing from the course groups is left missing.
pub fn apply_left(current: &UserGroups, left: Group) -> UserGroups {
    let groups = current
        .groups
        .iter()
        .filter(|g| g.id != left.id)
        .cloned()
        .collect();

    let mut course_groups = current.course_groups.clone();
    if let Some(slot) = course_groups.iter_mut().find(|g| g.id == left.id) {
        *slot = left;
    }
    UserGroups { groups, course_groups }
}

#[derive(Debug, Clone, Default)]
pub struct CreateGroupForm {
    pub name: String,
    pub image_url: String,
    pub course_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{}", .0.message())]
    InvalidName(NameCheck),

    #[error("Please select a course")]
    MissingCourse,

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct GroupWorkflow {
    api: Arc<dyn GroupApi>,
    presence: Arc<dyn RoomPresence>,
    notifier: Arc<dyn Notifier>,
    store: StateStore,
}

impl GroupWorkflow {
    pub fn new(
        api: Arc<dyn GroupApi>,
        presence: Arc<dyn RoomPresence>,
        notifier: Arc<dyn Notifier>,
        store: StateStore,
    ) -> Self {
        Self {
            api,
            presence,
            notifier,
            store,
        }
    }

    pub fn check_name(&self, name: &str) -> NameCheck {
        let state = self.store.snapshot();
        check_group_name(name, &state.user_groups.groups, &state.user_groups.course_groups)
    }

    pub fn suggested_groups(&self) -> Vec<Group> {
        self.store.snapshot().suggested_groups()
    }

    /// Loads both group lists from the server.
    pub async fn refresh(&self) -> Result<UserGroups, WorkflowError> {
        let user_groups = self.api.fetch_groups().await.map_err(|e| {
            warn!("fetching groups failed: {}", e);
            e
        })?;
        self.commit(user_groups.clone());
        Ok(user_groups)
    }

    pub async fn create_group(&self, form: CreateGroupForm) -> Result<Group, WorkflowError> {
        let check = self.check_name(&form.name);
        if !check.is_valid() {
            self.notifier.notify(GROUP_CREATE_FAILED, NotifyOptions::error());
            return Err(WorkflowError::InvalidName(check));
        }
        let Some(course_id) = form.course_id.filter(|id| !id.trim().is_empty()) else {
            self.notifier.notify(GROUP_CREATE_FAILED, NotifyOptions::error());
            return Err(WorkflowError::MissingCourse);
        };

        let req = NewGroupRequest {
            group_name: form.name.trim().to_string(),
            image_url: form.image_url,
            course_id,
        };
        let group = match self.api.create_group(&req).await {
            Ok(group) => group,
            Err(e) => {
                warn!("creating group {} failed: {}", req.group_name, e);
                self.notifier.notify(GROUP_CREATE_FAILED, NotifyOptions::error());
                return Err(e.into());
            }
        };

        let current = self.store.snapshot().user_groups;
        self.commit(apply_created(&current, group.clone()));
        self.notifier.notify(GROUP_CREATED, NotifyOptions::success());
        info!("created group {}", group.id);
        Ok(group)
    }

    /// Failures are logged and returned; no notification is shown.
    pub async fn join_group(&self, group_id: &str) -> Result<Group, WorkflowError> {
        let group = self.api.join_group(group_id).await.map_err(|e| {
            warn!("joining group {} failed: {}", group_id, e);
            e
        })?;

        let current = self.store.snapshot().user_groups;
        self.commit(apply_joined(&current, group.clone()));
        Ok(group)
    }

    /// Failures are logged and returned; no notification is shown.
    pub async fn leave_group(&self, group_id: &str) -> Result<Group, WorkflowError> {
        let group = self.api.leave_group(group_id).await.map_err(|e| {
            warn!("leaving group {} failed: {}", group_id, e);
            e
        })?;

        let current = self.store.snapshot().user_groups;
        self.commit(apply_left(&current, group.clone()));
        Ok(group)
    }

    /// Publishes both lists as one action, then tells presence about the new rooms.
    fn commit(&self, user_groups: UserGroups) {
        let rooms = user_groups.groups.clone();
        self.store.dispatch(Action::UpdateUserGroups(user_groups));
        self.presence.update_rooms(&rooms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, name: &str) -> Group {
        Group {
            id: id.to_string(),
            name: name.to_string(),
            image_url: String::new(),
            course_id: "c1".to_string(),
            members: Vec::new(),
        }
    }

    #[test]
    fn test_duplicate_name_is_case_insensitive() {
        let mine = [group("1", "Algo")];
        let course = [group("2", "Bio")];

        for name in ["algo", "ALGO", "Algo", " aLgO "] {
            let check = check_group_name(name, &mine, &course);
            assert_eq!(check, NameCheck::AlreadyExists);
            assert_eq!(check.message(), "A group with this name already exists!");
            assert!(!check.is_valid());
        }
        assert_eq!(check_group_name("bio", &mine, &course), NameCheck::AlreadyExists);
        assert_eq!(check_group_name("chem", &mine, &course), NameCheck::Valid);
        assert_eq!(check_group_name("   ", &mine, &course), NameCheck::Empty);
    }

    #[test]
    fn test_suggestions_exclude_joined_groups_by_id() {
        let course = [group("1", "A"), group("2", "B"), group("3", "C")];
        let mine = [group("2", "renamed B"), group("9", "elsewhere")];

        let suggested = suggested_groups(&course, &mine);
        let ids: Vec<&str> = suggested.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);

        assert_eq!(suggested_groups(&course, &mine), suggested);
        assert_eq!(suggested_groups(&course, &[]).len(), 3);
        assert!(suggested_groups(&[], &mine).is_empty());
    }

    #[test]
    fn test_leave_replaces_course_entry_with_server_copy() {
        let current = UserGroups {
            groups: vec![group("1", "One"), group("2", "Two")],
            course_groups: vec![group("1", "One"), group("2", "Two")],
        };
        let mut updated = group("1", "One");
        updated.members = vec!["someone-else".to_string()];

        let next = apply_left(&current, updated.clone());

        assert_eq!(next.groups, vec![group("2", "Two")]);
        assert_eq!(next.course_groups.len(), 2);
        assert_eq!(next.course_groups[0], updated);
        assert_eq!(current.groups.len(), 2);
    }

    #[test]
    fn test_leave_of_group_outside_course_groups_is_harmless() {
        let current = UserGroups {
            groups: vec![group("1", "One")],
            course_groups: vec![group("2", "Two")],
        };

        let next = apply_left(&current, group("1", "One"));

        assert!(next.groups.is_empty());
        assert_eq!(next.course_groups, vec![group("2", "Two")]);
    }

    #[test]
    fn test_join_never_duplicates() {
        let current = UserGroups {
            groups: vec![group("1", "One")],
            course_groups: vec![group("1", "One"), group("2", "Two")],
        };

        let next = apply_joined(&current, group("2", "Two"));
        assert_eq!(next.groups.len(), 2);
        assert!(suggested_groups(&next.course_groups, &next.groups).is_empty());

        let again = apply_joined(&next, group("2", "Two v2"));
        assert_eq!(again.groups.len(), 2);
        assert_eq!(again.groups[1].name, "Two v2");
    }

    #[test]
    fn test_created_group_is_appended() {
        let current = UserGroups::default();
        let next = apply_created(&current, group("7", "Calc Study"));
        assert_eq!(next.groups, vec![group("7", "Calc Study")]);
        assert!(next.course_groups.is_empty());
    }
}
