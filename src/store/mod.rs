//! Persistence seams.
//!
//! Handlers and services only see the [`UserStore`] and [`TaskStore`] traits.
//! [`postgres`] backs them with `sqlx` in production; [`memory`] keeps
//! everything in-process for tests and database-less development runs.
//!
//! Every `TaskStore` operation takes the acting user's id. Tasks owned by
//! somebody else behave exactly like tasks that do not exist.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskFilter, TaskPage, TaskStats, TaskUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new account. Fails with `AppError::Conflict` when the email
    /// is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task, AppError>;

    /// Filters, sorts newest first, then paginates. `TaskPage::total` counts
    /// every match before pagination.
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<TaskPage, AppError>;

    async fn find_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, AppError>;

    /// Returns the updated task, or `None` when no owned task matches.
    async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, AppError>;

    /// `true` iff exactly one owned task was removed.
    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    async fn task_stats(&self, user_id: Uuid) -> Result<TaskStats, AppError>;
}

/// Message used for duplicate registrations by every backend.
pub(crate) const DUPLICATE_EMAIL: &str = "User already exists with this email";
