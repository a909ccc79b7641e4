pub mod comment;
pub mod goal;
pub mod notification;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use goal::{Goal, GoalStatus};
pub use notification::Notification;
pub use post::Post;
pub use user::User;
