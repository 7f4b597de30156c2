use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{PublicUser, Task, TaskRole, UpdateUserRequest, UserSummary, UserTasksQuery},
};
use actix_web::{delete, get, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const USER_SUMMARY_SELECT: &str =
    "SELECT u.id, u.email, u.name, u.created_at, \
     (SELECT COUNT(*) FROM tasks t WHERE t.author_id = u.id) AS authored_tasks, \
     (SELECT COUNT(*) FROM tasks t WHERE t.assigned_to = u.id) AS assigned_tasks \
     FROM users u";

/// Lists all users with their public fields and task counts, newest first.
#[get("")]
pub async fn list_users(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let sql = format!("{} ORDER BY u.created_at DESC", USER_SUMMARY_SELECT);
    let users = sqlx::query_as::<_, UserSummary>(&sql)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Returns the authenticated user's own profile.
///
/// Responds `404 Not Found` when the account behind a still-valid access token
/// has been deleted.
#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let sql = format!("{} WHERE u.id = $1", USER_SUMMARY_SELECT);
    let profile = sqlx::query_as::<_, UserSummary>(&sql)
        .bind(user.0.sub)
        .fetch_optional(&**pool)
        .await?;

    match profile {
        Some(profile) => Ok(HttpResponse::Ok().json(profile)),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Retrieves a single user by ID with public fields and task counts.
#[get("/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let sql = format!("{} WHERE u.id = $1", USER_SUMMARY_SELECT);
    let user = sqlx::query_as::<_, UserSummary>(&sql)
        .bind(user_id.into_inner())
        .fetch_optional(&**pool)
        .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(AppError::NotFound("Cannot find user with this id".into())),
    }
}

/// Lists a user's tasks, filterable to the authored or assigned side via
/// `?type=authored|assigned`. Omitting `type` lists both.
#[get("/{id}/tasks")]
pub async fn get_user_tasks(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
    query: web::Query<UserTasksQuery>,
) -> Result<impl Responder, AppError> {
    let user_uuid = user_id.into_inner();

    let exists = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
        .bind(user_uuid)
        .fetch_optional(&**pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Cannot find user with this id".into()));
    }

    let condition = match query.role {
        Some(TaskRole::Authored) => "author_id = $1",
        Some(TaskRole::Assigned) => "assigned_to = $1",
        None => "(author_id = $1 OR assigned_to = $1)",
    };

    let sql = format!(
        "SELECT id, title, description, priority, status, due_date, created_at, updated_at, author_id, assigned_to \
         FROM tasks WHERE {} ORDER BY created_at DESC",
        condition
    );

    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(user_uuid)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Updates a user's name and/or email. Users can only update their own account.
///
/// Omitted fields keep their stored values; changing the email to one already
/// registered yields `409 Conflict`.
#[put("/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
    update_data: web::Json<UpdateUserRequest>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;

    let user_uuid = user_id.into_inner();
    if user_uuid != user.0.sub {
        return Err(AppError::Unauthorized(
            "You can only update your own account".into(),
        ));
    }

    let updated = sqlx::query_as::<_, PublicUser>(
        "UPDATE users \
         SET name = COALESCE($1, name), email = COALESCE($2, email), updated_at = NOW() \
         WHERE id = $3 \
         RETURNING id, email, name",
    )
    .bind(&update_data.name)
    .bind(&update_data.email)
    .bind(user_uuid)
    .fetch_optional(&**pool)
    .await?;

    match updated {
        Some(updated) => Ok(HttpResponse::Ok().json(updated)),
        None => Err(AppError::NotFound("Cannot find this user".into())),
    }
}

/// Deletes a user's account. Users can only delete their own account.
///
/// Runs in a transaction: the user's refresh tokens and authored tasks are
/// removed, tasks assigned to them are unassigned, then the user row goes.
#[delete("/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user_uuid = user_id.into_inner();
    if user_uuid != user.0.sub {
        return Err(AppError::Unauthorized(
            "You can only delete your own account".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_uuid)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE tasks SET assigned_to = NULL WHERE assigned_to = $1")
        .bind(user_uuid)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tasks WHERE author_id = $1")
        .bind(user_uuid)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_uuid)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Cannot find this user".into()));
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted successfully"
    })))
}
