pub mod comment;
pub mod course;
pub mod group;
pub mod post;
pub mod profile;
pub mod user;

pub use comment::{Comment, CommentEnvelope, EditCommentRequest, NewCommentRequest};
pub use course::{Course, NewCourseRequest, UserCoursesResponse};
pub use group::{CreatedGroup, Group, NewGroupRequest, UserGroups};
pub use post::{NewPostRequest, Post, PostWithComments};
pub use profile::{Profile, UpdateProfileRequest};
pub use user::{LoginRequest, RegisterRequest, User};
