use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves a list of tasks visible to the authenticated user.
///
/// A task is visible when the caller authored it or is assigned to it. Supports
/// filtering by `status`, `priority`, `assigned_to` (user ID), and a `search`
/// term matched against title and description, plus `page`/`limit` pagination.
/// Tasks are ordered by creation date in descending order.
///
/// ## Query Parameters:
/// - `status` (optional): Filters tasks by their status (e.g., "pending", "in_progress", "completed").
/// - `priority` (optional): Filters tasks by their priority (e.g., "low", "medium", "high").
/// - `assigned_to` (optional): Filters tasks by the ID of the user they are assigned to.
/// - `search` (optional): A string to search for in task titles and descriptions (case-insensitive).
/// - `page` (optional): 1-based page number, default 1.
/// - `limit` (optional): Page size, default 20, capped at 100.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let authenticated_user_id = user.0.sub;

    // Base query selects tasks the caller authored or is assigned to.
    // Conditions for status, priority, assigned_to, and search terms are dynamically appended.
    let mut sql = String::from(
        "SELECT id, title, description, priority, status, due_date, created_at, updated_at, author_id, assigned_to \
         FROM tasks WHERE (author_id = $1 OR assigned_to = $1)"
    );
    let mut param_count = 2;

    let mut conditions: Vec<String> = Vec::new();

    if query_params.status.is_some() {
        conditions.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        conditions.push(format!("priority = ${}", param_count));
        param_count += 1;
    }
    if query_params.assigned_to.is_some() {
        conditions.push(format!("assigned_to = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        conditions.push(format!(
            "(title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
        param_count += 2;
    }

    if !conditions.is_empty() {
        sql.push_str(" AND ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(&format!(
        " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        param_count,
        param_count + 1
    ));

    let mut query_builder = sqlx::query_as::<_, Task>(&sql);

    query_builder = query_builder.bind(authenticated_user_id);

    if let Some(status) = &query_params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = &query_params.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(assigned_to) = query_params.assigned_to {
        query_builder = query_builder.bind(assigned_to);
    }
    if let Some(search) = &query_params.search {
        let search_pattern = format!("%{}%", search);
        query_builder = query_builder.bind(search_pattern.clone());
        query_builder = query_builder.bind(search_pattern);
    }

    query_builder = query_builder
        .bind(query_params.limit())
        .bind(query_params.offset());

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task authored by the authenticated user.
///
/// It expects a JSON payload conforming to `TaskInput`. The `author_id` is
/// always the authenticated user; an `assigned_to` value, when provided, must
/// reference an existing user (checked inside the insert transaction).
///
/// ## Request Body:
/// A JSON object matching the `TaskInput` struct, including:
/// - `title`: The title of the task (required).
/// - `description` (optional): A description of the task.
/// - `priority` (optional): The priority of the task (e.g., "low", "medium", "high").
/// - `status` (optional): The status of the task. Defaults to "pending".
/// - `due_date` (optional): The due date for the task.
/// - `assigned_to` (optional): User ID of the assignee.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the assignee does not exist.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.0.sub);

    let mut tx = pool.begin().await?;

    if let Some(assignee_id) = task.assigned_to {
        let assignee = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
            .bind(assignee_id)
            .fetch_optional(&mut *tx)
            .await?;

        if assignee.is_none() {
            return Err(AppError::NotFound("Assignee not found".into()));
        }
    }

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, title, description, priority, status, due_date, author_id, assigned_to)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at, author_id, assigned_to"
    )
    .bind(task.id)
    .bind(task.title)
    .bind(task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .bind(task.author_id)
    .bind(task.assigned_to)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a specific task by its ID.
///
/// The authenticated user must be the author of the task or its assignee.
///
/// ## Path Parameters:
/// - `id`: The UUID of the task to retrieve.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON if found and visible to the user.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist or is not visible to the authenticated user.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let authenticated_user_id = user.0.sub;
    let task_uuid = task_id.into_inner();

    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, priority, status, due_date, created_at, updated_at, author_id, assigned_to \
         FROM tasks WHERE id = $1"
    )
    .bind(task_uuid)
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => {
            if task.author_id != authenticated_user_id
                && task.assigned_to != Some(authenticated_user_id)
            {
                Err(AppError::NotFound("Task not found".into()))
            } else {
                Ok(HttpResponse::Ok().json(task))
            }
        }
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates an existing task.
///
/// Only the author of a task can update it. The payload is an explicit
/// optional-field `TaskUpdate`: omitted fields keep their stored values.
///
/// ## Path Parameters:
/// - `id`: The UUID of the task to update.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist, is not authored by the user, or the assignee does not exist.
/// - `422 Unprocessable Entity`: If input validation on `TaskUpdate` fails.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let authenticated_user_id = user.0.sub;
    let task_uuid = task_id.into_inner();

    let mut tx = pool.begin().await?;

    // First, verify ownership
    let ownership_check = sqlx::query_as::<_, (Uuid,)>("SELECT author_id FROM tasks WHERE id = $1")
        .bind(task_uuid)
        .fetch_optional(&mut *tx)
        .await?;

    match ownership_check {
        Some((author_id,)) => {
            if author_id != authenticated_user_id {
                return Err(AppError::NotFound(
                    "Task not found or not authored by user".into(),
                ));
            }
        }
        None => return Err(AppError::NotFound("Task not found".into())),
    }

    if let Some(assignee_id) = task_data.assigned_to {
        let assignee = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
            .bind(assignee_id)
            .fetch_optional(&mut *tx)
            .await?;

        if assignee.is_none() {
            return Err(AppError::NotFound("Assignee not found".into()));
        }
    }

    // Omitted fields fall through to the stored values.
    let result = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             priority = COALESCE($3, priority),
             status = COALESCE($4, status),
             due_date = COALESCE($5, due_date),
             assigned_to = COALESCE($6, assigned_to),
             updated_at = NOW()
         WHERE id = $7 AND author_id = $8
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at, author_id, assigned_to"
    )
    .bind(&task_data.title)
    .bind(&task_data.description)
    .bind(&task_data.priority)
    .bind(&task_data.status)
    .bind(task_data.due_date)
    .bind(task_data.assigned_to)
    .bind(task_uuid)
    .bind(authenticated_user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a task by its ID.
///
/// Only the author of a task can delete it.
///
/// ## Path Parameters:
/// - `id`: The UUID of the task to delete.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist or is not authored by the authenticated user.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let authenticated_user_id = user.0.sub;
    let task_uuid = task_id.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND author_id = $2")
        .bind(task_uuid)
        .bind(authenticated_user_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Task not found or not authored by user".into(),
        ));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::models::{TaskInput, TaskPriority, TaskQuery, TaskStatus, TaskUpdate};
    use validator::Validate; // For .validate() method

    #[test]
    fn test_task_input_validation() {
        // Test empty title
        let invalid_input_empty_title = TaskInput {
            title: "".to_string(),
            description: Some("Test Description".to_string()),
            priority: Some(TaskPriority::High),
            status: Some(TaskStatus::Pending),
            due_date: None,
            assigned_to: None,
        };
        assert!(
            invalid_input_empty_title.validate().is_err(),
            "Validation should fail for empty title."
        );

        // Test title too long (max 255 according to TaskInput struct)
        let long_title = "a".repeat(256);
        let invalid_input_long_title = TaskInput {
            title: long_title,
            description: Some("Test Description".to_string()),
            priority: Some(TaskPriority::Medium),
            status: Some(TaskStatus::InProgress),
            due_date: None,
            assigned_to: None,
        };
        assert!(
            invalid_input_long_title.validate().is_err(),
            "Validation should fail for overly long title."
        );

        // Test valid input
        let valid_input = TaskInput {
            title: "Valid Title".to_string(),
            description: Some("Test Description".to_string()),
            priority: Some(TaskPriority::Low),
            status: Some(TaskStatus::Completed),
            due_date: None,
            assigned_to: None,
        };
        assert!(
            valid_input.validate().is_ok(),
            "Validation should pass for valid input."
        );
    }

    #[test]
    fn test_task_update_partial_payloads() {
        // A title-only update is valid
        let title_only = TaskUpdate {
            title: Some("Renamed".to_string()),
            description: None,
            priority: None,
            due_date: None,
            status: None,
            assigned_to: None,
        };
        assert!(title_only.validate().is_ok());

        // Description length is still enforced on updates
        let long_description = "b".repeat(1001);
        let invalid_desc = TaskUpdate {
            title: None,
            description: Some(long_description),
            priority: None,
            due_date: None,
            status: None,
            assigned_to: None,
        };
        assert!(invalid_desc.validate().is_err());
    }

    #[test]
    fn test_task_query_defaults_apply_without_params() {
        let query = TaskQuery {
            status: None,
            priority: None,
            assigned_to: None,
            search: None,
            page: None,
            limit: None,
        };
        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 0);
    }
}
