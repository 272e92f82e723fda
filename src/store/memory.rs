use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, Task, TaskFilter, TaskPage, TaskStats, TaskStatus, TaskUpdate, User,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Insertion order; newer tasks sit at the end.
    tasks: Vec<Task>,
}

/// In-process implementation of both stores. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }
}

/// Case-insensitive literal matcher for a search term.
fn search_matcher(search: &str) -> Result<Regex, AppError> {
    RegexBuilder::new(&regex::escape(search))
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::InternalServerError(format!("Invalid search pattern: {}", e)))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.write()?;
        if inner.users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.read()?;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task, AppError> {
        let task = Task::new(task, user_id);
        self.write()?.tasks.push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<TaskPage, AppError> {
        let matcher = filter.search.as_deref().map(search_matcher).transpose()?;
        let inner = self.read()?;

        // Walk newest-inserted first so equal timestamps keep that order after
        // the stable sort.
        let mut matching: Vec<&Task> = inner
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filter.status.map_or(true, |status| t.status == status))
            .filter(|t| {
                matcher
                    .as_ref()
                    .map_or(true, |m| m.is_match(&t.title) || m.is_match(&t.description))
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let tasks = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok(TaskPage { tasks, total })
    }

    async fn find_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, AppError> {
        let inner = self.read()?;
        Ok(inner
            .tasks
            .iter()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .cloned())
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let mut inner = self.write()?;
        Ok(inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .map(|task| {
                task.apply(update);
                task.clone()
            }))
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.write()?;
        let before = inner.tasks.len();
        inner
            .tasks
            .retain(|t| !(t.id == task_id && t.user_id == user_id));
        Ok(before - inner.tasks.len() == 1)
    }

    async fn task_stats(&self, user_id: Uuid) -> Result<TaskStats, AppError> {
        let inner = self.read()?;
        let (pending, done) = inner
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .fold((0, 0), |(pending, done), t| match t.status {
                TaskStatus::Pending => (pending + 1, done),
                TaskStatus::Done => (pending, done + 1),
            });
        Ok(TaskStats::new(pending, done))
    }
}
