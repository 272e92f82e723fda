pub mod task;
pub mod user;

pub use task::{
    CreateTaskRequest, NewTask, Pagination, StatusFilter, Task, TaskFilter, TaskListQuery,
    TaskPage, TaskStats, TaskStatus, TaskUpdate, UpdateTaskRequest,
};
pub use user::{NewUser, PublicUser, User};
