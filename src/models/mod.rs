pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskPriority, TaskQuery, TaskStatus, TaskUpdate};
pub use user::{PublicUser, TaskRole, UpdateUserRequest, User, UserSummary, UserTasksQuery};
