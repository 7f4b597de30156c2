use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A full user row as stored in the database, including the password hash.
/// Never serialized to clients; use [`PublicUser`] for responses.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of user fields that is safe to expose in responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// A user as returned by the directory endpoints, with task counts.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub authored_tasks: i64,
    pub assigned_tasks: i64,
}

/// Explicit optional-field payload for profile updates.
/// A `None` field leaves the stored value unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// Which side of the task relation to list for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRole {
    Authored,
    Assigned,
}

/// Query parameters for `/users/{id}/tasks`. Omitting `type` lists both sides.
#[derive(Debug, Deserialize)]
pub struct UserTasksQuery {
    #[serde(rename = "type")]
    pub role: Option<TaskRole>,
}
