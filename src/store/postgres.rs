use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskFilter, TaskPage, TaskStats, TaskUpdate, User};

const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";

/// Postgres-backed user and task store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// `WHERE` clause for a listing. `$1` is always the owner; status and search
/// take the following placeholders when present. Returns the clause and the
/// next free placeholder index.
fn list_conditions(filter: &TaskFilter) -> (String, usize) {
    let mut sql = String::from("WHERE user_id = $1");
    let mut param_count = 2;

    if filter.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if filter.search.is_some() {
        sql.push_str(&format!(
            " AND (title ~* ${0} OR description ~* ${0})",
            param_count
        ));
        param_count += 1;
    }

    (sql, param_count)
}

/// Search terms are matched literally; metacharacters are escaped before the
/// term reaches the `~*` operator.
fn search_pattern(filter: &TaskFilter) -> Option<String> {
    filter.search.as_deref().map(regex::escape)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict(DUPLICATE_EMAIL.into()),
                other => other,
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task, AppError> {
        let task = Task::new(task, user_id);
        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TASK_COLUMNS
        );

        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.user_id)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<TaskPage, AppError> {
        let (conditions, param_count) = list_conditions(filter);
        let pattern = search_pattern(filter);

        let count_sql = format!("SELECT COUNT(*) FROM tasks {}", conditions);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT {} FROM tasks {} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            conditions,
            param_count,
            param_count + 1
        );
        let mut page_query = sqlx::query_as::<_, Task>(&page_sql).bind(user_id);
        if let Some(status) = filter.status {
            page_query = page_query.bind(status);
        }
        if let Some(pattern) = &pattern {
            page_query = page_query.bind(pattern);
        }
        let offset = i64::try_from(filter.offset()).unwrap_or(i64::MAX);
        let tasks = page_query
            .bind(i64::from(filter.limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(TaskPage {
            tasks,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_task(&self, task_id: Uuid, user_id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        // One statement, so concurrent updates resolve as last-write-wins.
        let sql = format!(
            "UPDATE tasks \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 status = COALESCE($5, status), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(user_id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.status)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_task(&self, task_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn task_stats(&self, user_id: Uuid) -> Result<TaskStats, AppError> {
        let (pending, done) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*) FILTER (WHERE status = 'pending'), \
                    COUNT(*) FILTER (WHERE status = 'done') \
             FROM tasks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaskStats::new(
            u64::try_from(pending).unwrap_or_default(),
            u64::try_from(done).unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn test_list_conditions_without_filters() {
        let (sql, next) = list_conditions(&TaskFilter::default());
        assert_eq!(sql, "WHERE user_id = $1");
        assert_eq!(next, 2);
    }

    #[test]
    fn test_list_conditions_with_all_filters() {
        let filter = TaskFilter {
            search: Some("milk".to_string()),
            status: Some(TaskStatus::Done),
            ..TaskFilter::default()
        };
        let (sql, next) = list_conditions(&filter);
        assert_eq!(
            sql,
            "WHERE user_id = $1 AND status = $2 AND (title ~* $3 OR description ~* $3)"
        );
        assert_eq!(next, 4);
    }

    #[test]
    fn test_search_only_uses_second_placeholder() {
        let filter = TaskFilter {
            search: Some("a.b".to_string()),
            ..TaskFilter::default()
        };
        let (sql, next) = list_conditions(&filter);
        assert_eq!(sql, "WHERE user_id = $1 AND (title ~* $2 OR description ~* $2)");
        assert_eq!(next, 3);
        assert_eq!(search_pattern(&filter).as_deref(), Some("a\\.b"));
    }
}
