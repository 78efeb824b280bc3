//! Todo endpoints.
//!
//! Every handler is scoped to the authenticated caller; a todo owned by
//! another user is indistinguishable from one that does not exist, and
//! both answer 404. "Todo not found" is therefore the only negative
//! outcome for id-addressed operations.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tasklist_shared::models::todo::{
    CreateTodo, SortField, SortOrder, Todo, TodoFilter, TodoPriority, TodoSort, TodoStats,
    TodoStatus, UpdateTodo,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::CurrentUser,
    response::{ApiResponse, ListResponse},
};

/// Largest accepted page size.
const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for the list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTodosQuery {
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListTodosQuery {
    /// Page number clamped to at least 1.
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to 1..=[`MAX_PAGE_SIZE`], default 10.
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE)
    }

    fn filter(&self) -> TodoFilter {
        TodoFilter {
            status: self.status,
            priority: self.priority,
        }
    }

    /// An explicit `sortBy` defaults to ascending; without one the list
    /// is newest-created first.
    fn sort(&self) -> TodoSort {
        match self.sort_by {
            Some(field) => TodoSort {
                field,
                order: self.sort_order.unwrap_or(SortOrder::Asc),
            },
            None => TodoSort::default(),
        }
    }
}

/// Create request. Status always starts as pending.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update request. `description` and `dueDate` distinguish an
/// explicit null (clear the value) from an absent field (leave it).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,

    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<TodoStatus>,

    pub priority: Option<TodoPriority>,

    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Wraps a present-but-possibly-null field as Some(inner), so absent and
/// null stay distinguishable after deserialization.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// `GET /api/todos`
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppQuery(query): AppQuery<ListTodosQuery>,
) -> ApiResult<Json<ListResponse<Todo>>> {
    let page = query.page();
    let limit = query.limit();
    let offset = (page - 1) * limit;

    let todos = Todo::list_by_user(
        &state.db,
        user.id,
        query.filter(),
        query.sort(),
        limit,
        offset,
    )
    .await?;

    let total_count = Todo::count_by_user(&state.db, user.id, query.filter()).await?;

    Ok(ListResponse::new(todos, total_count, page, limit))
}

/// `POST /api/todos`
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<CreateTodoRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }

    let todo = Todo::create(
        &state.db,
        CreateTodo {
            user_id: user.id,
            title: body.title,
            description: body.description,
            priority: body.priority,
            due_date: body.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, ApiResponse::data(todo)))
}

/// `GET /api/todos/stats`
pub async fn todo_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<TodoStats>>> {
    let stats = Todo::stats_for_user(&state.db, user.id).await?;
    Ok(ApiResponse::data(stats))
}

/// `GET /api/todos/:id`
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Todo>>> {
    let todo = Todo::find_by_id_and_user(&state.db, id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(ApiResponse::data(todo))
}

/// `PUT /api/todos/:id`
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateTodoRequest>,
) -> ApiResult<Json<ApiResponse<Todo>>> {
    if let Some(title) = &body.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title cannot be empty".to_string()));
        }
    }

    let todo = Todo::update(
        &state.db,
        id,
        user.id,
        UpdateTodo {
            title: body.title,
            description: body.description,
            status: body.status,
            priority: body.priority,
            due_date: body.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(ApiResponse::data(todo))
}

/// `DELETE /api/todos/:id`
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = Todo::delete_by_id_and_user(&state.db, id, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Todo not found".to_string()));
    }

    Ok(ApiResponse::message("Todo deleted successfully"))
}

/// `PATCH /api/todos/:id/complete`: idempotent.
pub async fn mark_completed(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Todo>>> {
    set_status(&state, user.id, id, TodoStatus::Completed).await
}

/// `PATCH /api/todos/:id/pending`: idempotent.
pub async fn mark_pending(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Todo>>> {
    set_status(&state, user.id, id, TodoStatus::Pending).await
}

async fn set_status(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    status: TodoStatus,
) -> ApiResult<Json<ApiResponse<Todo>>> {
    let todo = Todo::set_status(&state.db, id, user_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Todo not found".to_string()))?;

    Ok(ApiResponse::data(todo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_and_limit_clamping() {
        let query = ListTodosQuery {
            page: Some(0),
            limit: Some(-5),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 1);

        let query = ListTodosQuery {
            page: None,
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);

        let query = ListTodosQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_sort_defaults() {
        // No sortBy: newest created first.
        let query = ListTodosQuery::default();
        let sort = query.sort();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);

        // Explicit sortBy without an order: ascending.
        let query = ListTodosQuery {
            sort_by: Some(SortField::DueDate),
            ..Default::default()
        };
        assert_eq!(query.sort().order, SortOrder::Asc);
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let body: UpdateTodoRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(body.due_date, Some(None));
        assert!(body.description.is_none());

        let body: UpdateTodoRequest =
            serde_json::from_str(r#"{"description": "groceries"}"#).unwrap();
        assert_eq!(body.description, Some(Some("groceries".to_string())));
        assert!(body.due_date.is_none());
    }

    #[test]
    fn test_list_query_uses_camel_case_keys() {
        let query: ListTodosQuery = serde_json::from_value(serde_json::json!({
            "status": "completed",
            "priority": "high",
            "sortBy": "dueDate",
            "sortOrder": "desc",
            "page": 2,
            "limit": 5,
        }))
        .unwrap();

        assert_eq!(query.status, Some(TodoStatus::Completed));
        assert_eq!(query.priority, Some(TodoPriority::High));
        assert_eq!(query.sort_by, Some(SortField::DueDate));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_list_query_rejects_unknown_enum_values() {
        let result =
            serde_json::from_value::<ListTodosQuery>(serde_json::json!({"status": "done"}));
        assert!(result.is_err());
    }
}
