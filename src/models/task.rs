use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Default page size for task listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is still open.
    Pending,
    /// Task is completed.
    Done,
}

/// Status filter accepted by the listing endpoint.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Done,
}

impl StatusFilter {
    /// The status to match exactly, or `None` when every status is wanted.
    pub fn status(self) -> Option<TaskStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(TaskStatus::Pending),
            StatusFilter::Done => Some(TaskStatus::Done),
        }
    }
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Owner of the task. Every store query is scoped by this id.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh task owned by `user_id`, stamped with the current time.
    pub fn new(input: NewTask, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or(TaskStatus::Pending),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields of `update` and bumps `updated_at`.
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Payload of `POST /api/tasks`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,
    pub status: Option<TaskStatus>,
}

impl CreateTaskRequest {
    pub fn into_new_task(self) -> Result<NewTask, AppError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Title and description are required".into(),
            ));
        }
        self.validate()?;

        Ok(NewTask {
            title: self.title,
            description: self.description,
            status: self.status,
        })
    }
}

/// Payload of `PUT /api/tasks/{id}`. Any subset of the fields may be sent.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl UpdateTaskRequest {
    /// Blank strings count as "not supplied". At least one field must remain.
    pub fn into_update(self) -> Result<TaskUpdate, AppError> {
        self.validate()?;

        let update = TaskUpdate {
            title: self.title.filter(|title| !title.trim().is_empty()),
            description: self
                .description
                .filter(|description| !description.trim().is_empty()),
            status: self.status,
        };

        if update.is_empty() {
            return Err(AppError::BadRequest(
                "At least one field is required for update".into(),
            ));
        }
        Ok(update)
    }
}

/// Raw query string of `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Bounded, normalized listing parameters handed to a `TaskStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Literal text matched case-insensitively against title or description.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl TaskFilter {
    /// Number of matching tasks to skip before the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl TryFrom<TaskListQuery> for TaskFilter {
    type Error = AppError;

    fn try_from(query: TaskListQuery) -> Result<Self, Self::Error> {
        let page = match query.page {
            None => 1,
            Some(page) if page >= 1 && page <= i64::from(u32::MAX) => page as u32,
            Some(_) => return Err(AppError::BadRequest("page must be at least 1".into())),
        };
        let limit = match query.limit {
            None => DEFAULT_PAGE_LIMIT,
            Some(limit) if limit >= 1 && limit <= i64::from(MAX_PAGE_LIMIT) => limit as u32,
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "limit must be between 1 and {}",
                    MAX_PAGE_LIMIT
                )))
            }
        };
        let search = query
            .search
            .map(|search| search.trim().to_string())
            .filter(|search| !search.is_empty());

        Ok(Self {
            search,
            status: query.status.status(),
            page,
            limit,
        })
    }
}

/// One page of a listing together with the pre-pagination match count.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(filter: &TaskFilter, total: u64) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            total,
            total_pages: total.div_ceil(u64::from(filter.limit)),
        }
    }
}

/// Per-status task counts for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub pending: u64,
    pub done: u64,
    /// Share of done tasks, rounded to a whole percent.
    pub completion_rate: u64,
}

impl TaskStats {
    pub fn new(pending: u64, done: u64) -> Self {
        let total = pending + done;
        let completion_rate = if total == 0 {
            0
        } else {
            (done * 100 + total / 2) / total
        };
        Self {
            total,
            pending,
            done,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: "Test Description".to_string(),
            status: None,
        }
    }

    #[test]
    fn test_task_creation_defaults_to_pending() {
        let owner = Uuid::new_v4();
        let task = Task::new(new_task("Test Task"), owner);

        assert_eq!(task.title, "Test Task");
        assert_eq!(task.user_id, owner);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_task_serializes_in_camel_case() {
        let task = Task::new(new_task("Test Task"), Uuid::new_v4());
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["status"], "pending");
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_apply_touches_only_supplied_fields() {
        let mut task = Task::new(new_task("Original"), Uuid::new_v4());
        let before = task.updated_at;

        task.apply(&TaskUpdate {
            status: Some(TaskStatus::Done),
            ..TaskUpdate::default()
        });

        assert_eq!(task.title, "Original");
        assert_eq!(task.description, "Test Description");
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.updated_at >= before);
    }

    #[test]
    fn test_create_request_requires_title_and_description() {
        let missing_description = CreateTaskRequest {
            title: "T1".to_string(),
            description: "   ".to_string(),
            status: None,
        };
        assert!(matches!(
            missing_description.into_new_task(),
            Err(AppError::BadRequest(_))
        ));

        let too_long = CreateTaskRequest {
            title: "a".repeat(201),
            description: "D1".to_string(),
            status: None,
        };
        assert!(matches!(
            too_long.into_new_task(),
            Err(AppError::ValidationError(_))
        ));

        let valid = CreateTaskRequest {
            title: "T1".to_string(),
            description: "D1".to_string(),
            status: Some(TaskStatus::Done),
        };
        let task = valid.into_new_task().unwrap();
        assert_eq!(task.status, Some(TaskStatus::Done));
    }

    #[test]
    fn test_update_request_needs_at_least_one_field() {
        assert!(matches!(
            UpdateTaskRequest::default().into_update(),
            Err(AppError::BadRequest(_))
        ));

        let blank_title = UpdateTaskRequest {
            title: Some(String::new()),
            ..UpdateTaskRequest::default()
        };
        assert!(blank_title.into_update().is_err());

        let status_only = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            ..UpdateTaskRequest::default()
        };
        assert_eq!(
            status_only.into_update().unwrap(),
            TaskUpdate {
                status: Some(TaskStatus::Done),
                ..TaskUpdate::default()
            }
        );
    }

    #[test]
    fn test_list_query_bounds() {
        let filter = TaskFilter::try_from(TaskListQuery::default()).unwrap();
        assert_eq!(filter, TaskFilter::default());

        let filter = TaskFilter::try_from(TaskListQuery {
            search: Some("  milk ".to_string()),
            status: StatusFilter::Done,
            page: Some(3),
            limit: Some(20),
        })
        .unwrap();
        assert_eq!(filter.search.as_deref(), Some("milk"));
        assert_eq!(filter.status, Some(TaskStatus::Done));
        assert_eq!(filter.offset(), 40);

        let blank_search = TaskFilter::try_from(TaskListQuery {
            search: Some("   ".to_string()),
            ..TaskListQuery::default()
        })
        .unwrap();
        assert_eq!(blank_search.search, None);

        for (page, limit) in [(Some(0), None), (Some(-1), None), (None, Some(0)), (None, Some(101))] {
            let query = TaskListQuery {
                page,
                limit,
                ..TaskListQuery::default()
            };
            assert!(TaskFilter::try_from(query).is_err());
        }
    }

    #[test]
    fn test_pagination_rounds_pages_up() {
        let filter = TaskFilter {
            limit: 4,
            ..TaskFilter::default()
        };
        assert_eq!(Pagination::new(&filter, 0).total_pages, 0);
        assert_eq!(Pagination::new(&filter, 4).total_pages, 1);
        assert_eq!(Pagination::new(&filter, 9).total_pages, 3);
    }

    #[test]
    fn test_stats_completion_rate() {
        assert_eq!(TaskStats::new(0, 0).completion_rate, 0);
        assert_eq!(TaskStats::new(1, 2).completion_rate, 67);
        assert_eq!(TaskStats::new(2, 1).completion_rate, 33);
        assert_eq!(TaskStats::new(0, 3).total, 3);
    }
}
