use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub course_id: String,
    /// User ids, in join order.
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupRequest {
    pub group_name: String,
    #[serde(default)]
    pub image_url: String,
    pub course_id: String,
}

/// Envelope returned by `POST /user/groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedGroup {
    pub data: Group,
}

/// The caller's groups next to every group of the courses they are enrolled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroups {
    pub groups: Vec<Group>,
    pub course_groups: Vec<Group>,
}
