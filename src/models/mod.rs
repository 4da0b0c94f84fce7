pub mod task;
pub mod user;

pub use task::{CommentDto, Priority, Status, Task, TaskCommentsDto, TaskDto, TaskFilter, TaskQuery};
pub use user::{Role, User, UserDto};
