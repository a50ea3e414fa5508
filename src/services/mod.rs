pub mod accounts;
pub mod comments;
pub mod membership;

pub use accounts::{AccountService, LoginOutcome};
pub use comments::CommentService;
pub use membership::MembershipService;
