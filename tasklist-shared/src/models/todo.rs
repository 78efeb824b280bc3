//! Todo model and database operations.
//!
//! Every operation here takes the owning user's id and scopes the query
//! with it. An ownership mismatch therefore looks exactly like a missing
//! row, which is what the API reports; existence of other users' todos
//! is never observable.
//!
//! # Example
//!
//! ```no_run
//! use tasklist_shared::models::todo::{CreateTodo, Todo, TodoPriority};
//! # use sqlx::PgPool;
//! # use uuid::Uuid;
//! # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
//! let todo = Todo::create(
//!     &pool,
//!     CreateTodo {
//!         user_id,
//!         title: "Write the report".to_string(),
//!         description: None,
//!         priority: Some(TodoPriority::High),
//!         due_date: None,
//!     },
//! )
//! .await?;
//! println!("Created todo: {}", todo.id);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TODO_COLUMNS: &str =
    "id, user_id, title, description, status, priority, due_date, created_at, updated_at";

/// Completion state of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "todo_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    /// Not yet done (the initial state)
    Pending,

    /// Done
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::Completed => "completed",
        }
    }
}

/// Priority of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "todo_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
        }
    }
}

/// Todo row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique todo ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Short title (required, non-empty)
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Completion state
    pub status: TodoStatus,

    /// Priority level
    pub priority: TodoPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the todo was created
    pub created_at: DateTime<Utc>,

    /// When the todo was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a todo. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to medium when None
    pub priority: Option<TodoPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for a partial update. Only non-None fields are written; the
/// inner Option of `description` and `due_date` distinguishes "clear the
/// value" (Some(None)) from "leave it alone" (None).
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTodo {
    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// Optional list filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoFilter {
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
}

/// Sortable columns for the list endpoint.
///
/// A closed set: the variant maps to a column name, so user input never
/// reaches the ORDER BY clause as a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Priority => "priority",
            SortField::Title => "title",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Complete sort specification. Defaults to newest created first.
#[derive(Debug, Clone, Copy)]
pub struct TodoSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for TodoSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Per-user aggregate counts.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total_todos: i64,
    pub completed_todos: i64,
    pub pending_todos: i64,
    pub high_priority_todos: i64,
    pub medium_priority_todos: i64,
    pub low_priority_todos: i64,
}

impl TodoStats {
    /// Completed share as a rounded integer percentage; 0 when the user
    /// owns no todos.
    pub fn completion_rate(&self) -> i64 {
        if self.total_todos == 0 {
            return 0;
        }
        (self.completed_todos as f64 / self.total_todos as f64 * 100.0).round() as i64
    }
}

impl Todo {
    /// Creates a todo owned by `data.user_id`, in pending state.
    pub async fn create(pool: &PgPool, data: CreateTodo) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO todos (user_id, title, description, priority, due_date)
             VALUES ($1, $2, $3, COALESCE($4, 'medium'::todo_priority), $5)
             RETURNING {TODO_COLUMNS}"
        );

        sqlx::query_as::<_, Todo>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a todo by id, scoped to its owner.
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, Todo>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's todos with filters, sorting, and pagination.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: TodoFilter,
        sort: TodoSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1");
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }

        query.push_str(&format!(
            " ORDER BY {} {} LIMIT ${} OFFSET ${}",
            sort.field.column(),
            sort.order.as_sql(),
            bind_count + 1,
            bind_count + 2,
        ));

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(user_id);

        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Counts a user's todos under the same filters as [`Self::list_by_user`].
    pub async fn count_by_user(
        pool: &PgPool,
        user_id: Uuid,
        filter: TodoFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut query = String::from("SELECT COUNT(*) FROM todos WHERE user_id = $1");
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(user_id);

        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }

        q.fetch_one(pool).await
    }

    /// Applies a partial update, scoped to the owner.
    ///
    /// Returns None when the todo is absent or owned by someone else.
    /// An update with no fields set degrades to a timestamp touch.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE todos SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TODO_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(pool).await
    }

    /// Writes the status directly. Idempotent: re-marking a completed
    /// todo as completed succeeds and returns the unchanged row.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: TodoStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE todos SET status = $3, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {TODO_COLUMNS}"
        );

        sqlx::query_as::<_, Todo>(&query)
            .bind(id)
            .bind(user_id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a todo, scoped to the owner. Returns whether a row went away.
    pub async fn delete_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every todo owned by a user. Returns the number removed.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Aggregate counts for a user. A user with no todos gets an
    /// all-zero row, not an error.
    pub async fn stats_for_user(pool: &PgPool, user_id: Uuid) -> Result<TodoStats, sqlx::Error> {
        sqlx::query_as::<_, TodoStats>(
            "SELECT
                COUNT(*) AS total_todos,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_todos,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_todos,
                COUNT(*) FILTER (WHERE priority = 'high') AS high_priority_todos,
                COUNT(*) FILTER (WHERE priority = 'medium') AS medium_priority_todos,
                COUNT(*) FILTER (WHERE priority = 'low') AS low_priority_todos
             FROM todos
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TodoStatus::Pending.as_str(), "pending");
        assert_eq!(TodoStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TodoPriority::Low.as_str(), "low");
        assert_eq!(TodoPriority::Medium.as_str(), "medium");
        assert_eq!(TodoPriority::High.as_str(), "high");
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TodoStatus::Completed).unwrap(),
            "\"completed\""
        );
        let parsed: TodoStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, TodoStatus::Pending);
    }

    #[test]
    fn test_sort_field_deserializes_camel_case() {
        let field: SortField = serde_json::from_str("\"dueDate\"").unwrap();
        assert_eq!(field, SortField::DueDate);

        let field: SortField = serde_json::from_str("\"createdAt\"").unwrap();
        assert_eq!(field, SortField::CreatedAt);

        assert!(serde_json::from_str::<SortField>("\"due_date; DROP TABLE\"").is_err());
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let sort = TodoSort::default();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn test_update_todo_is_empty() {
        assert!(UpdateTodo::default().is_empty());

        let update = UpdateTodo {
            status: Some(TodoStatus::Completed),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_completion_rate() {
        let mut stats = TodoStats {
            total_todos: 5,
            completed_todos: 3,
            pending_todos: 2,
            high_priority_todos: 1,
            medium_priority_todos: 2,
            low_priority_todos: 2,
        };
        assert_eq!(stats.completion_rate(), 60);

        stats.total_todos = 0;
        stats.completed_todos = 0;
        assert_eq!(stats.completion_rate(), 0);

        // Rounds to nearest: 1 of 3 completed is 33%.
        stats.total_todos = 3;
        stats.completed_todos = 1;
        assert_eq!(stats.completion_rate(), 33);

        // 2 of 3 completed is 67%, not 66%.
        stats.completed_todos = 2;
        assert_eq!(stats.completion_rate(), 67);
    }
}
