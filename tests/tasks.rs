use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::Duration;
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;
use taskhub::auth::TokenKeys;
use taskhub::models::Task;
use taskhub::routes;
use uuid::Uuid;

// Database-backed end-to-end coverage for the task endpoints. Requires
// DATABASE_URL to point at a migrated Postgres instance, so these are
// ignored by default: `cargo test -- --ignored` runs them.

// Helper struct to hold auth details
struct TestUser {
    id: Uuid,
    token: String,
}

fn test_keys() -> TokenKeys {
    TokenKeys::new(
        "integration-access-secret",
        "integration-refresh-secret",
        Duration::hours(1),
        Duration::days(7),
    )
}

async fn test_pool() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req_register = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "email": email,
            "password": password
        }))
        .to_request();
    let resp_register = test::call_service(app, req_register).await;
    let resp_status = resp_register.status();
    let auth_response_bytes = test::read_body(resp_register).await;

    if !resp_status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            resp_status,
            String::from_utf8_lossy(&auth_response_bytes)
        ));
    }
    let auth_response: taskhub::auth::AuthResponse = serde_json::from_slice(&auth_response_bytes)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    Ok(TestUser {
        id: auth_response.user.id,
        token: auth_response.access_token,
    })
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query(
        "DELETE FROM refresh_tokens WHERE user_id IN (SELECT id FROM users WHERE email = $1)",
    )
    .bind(email)
    .execute(pool)
    .await;
    let _ =
        sqlx::query("DELETE FROM tasks WHERE author_id IN (SELECT id FROM users WHERE email = $1)")
            .bind(email)
            .execute(pool)
            .await;
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

#[ignore]
#[actix_rt::test]
async fn test_task_crud_flow() {
    let pool = test_pool().await;
    let email = "task_crud@example.com";
    cleanup_user(&pool, email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let user = register_user(&app, email, "Password123!").await.unwrap();

    // Create
    let req_create = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .set_json(json!({
            "title": "Write integration tests",
            "description": "Cover the full CRUD path",
            "priority": "high"
        }))
        .to_request();
    let resp_create = test::call_service(&app, req_create).await;
    assert_eq!(resp_create.status(), actix_web::http::StatusCode::CREATED);
    let created: Task = serde_json::from_slice(&test::read_body(resp_create).await).unwrap();
    assert_eq!(created.title, "Write integration tests");
    assert_eq!(created.author_id, user.id);
    // Status defaults to pending when omitted
    assert_eq!(
        serde_json::to_value(&created.status).unwrap(),
        json!("pending")
    );

    // List contains it
    let req_list = test::TestRequest::get()
        .uri("/api/tasks")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp_list = test::call_service(&app, req_list).await;
    assert_eq!(resp_list.status(), actix_web::http::StatusCode::OK);
    let tasks: Vec<Task> = serde_json::from_slice(&test::read_body(resp_list).await).unwrap();
    assert!(tasks.iter().any(|t| t.id == created.id));

    // Partial update: only the status changes
    let req_update = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", created.id))
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .set_json(json!({ "status": "completed" }))
        .to_request();
    let resp_update = test::call_service(&app, req_update).await;
    assert_eq!(resp_update.status(), actix_web::http::StatusCode::OK);
    let updated: Task = serde_json::from_slice(&test::read_body(resp_update).await).unwrap();
    assert_eq!(updated.title, "Write integration tests");
    assert_eq!(
        serde_json::to_value(&updated.status).unwrap(),
        json!("completed")
    );

    // Delete
    let req_delete = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", created.id))
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp_delete = test::call_service(&app, req_delete).await;
    assert_eq!(
        resp_delete.status(),
        actix_web::http::StatusCode::NO_CONTENT
    );

    // Gone
    let req_get = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp_get = test::call_service(&app, req_get).await;
    assert_eq!(resp_get.status(), actix_web::http::StatusCode::NOT_FOUND);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_task_visibility_and_ownership() {
    let pool = test_pool().await;
    let author_email = "task_author@example.com";
    let other_email = "task_other@example.com";
    cleanup_user(&pool, author_email).await;
    cleanup_user(&pool, other_email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let author = register_user(&app, author_email, "Password123!")
        .await
        .unwrap();
    let other = register_user(&app, other_email, "Password123!")
        .await
        .unwrap();

    let req_create = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(("Authorization", format!("Bearer {}", author.token)))
        .set_json(json!({ "title": "Private task" }))
        .to_request();
    let resp_create = test::call_service(&app, req_create).await;
    assert_eq!(resp_create.status(), actix_web::http::StatusCode::CREATED);
    let task: Task = serde_json::from_slice(&test::read_body(resp_create).await).unwrap();

    // A stranger sees nothing
    let req_get = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .append_header(("Authorization", format!("Bearer {}", other.token)))
        .to_request();
    let resp_get = test::call_service(&app, req_get).await;
    assert_eq!(resp_get.status(), actix_web::http::StatusCode::NOT_FOUND);

    // Assign the task to the other user; they can now read it
    let req_assign = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .append_header(("Authorization", format!("Bearer {}", author.token)))
        .set_json(json!({ "assigned_to": other.id }))
        .to_request();
    let resp_assign = test::call_service(&app, req_assign).await;
    assert_eq!(resp_assign.status(), actix_web::http::StatusCode::OK);

    let req_get = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .append_header(("Authorization", format!("Bearer {}", other.token)))
        .to_request();
    let resp_get = test::call_service(&app, req_get).await;
    assert_eq!(resp_get.status(), actix_web::http::StatusCode::OK);

    // But assignees cannot update or delete
    let req_update = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .append_header(("Authorization", format!("Bearer {}", other.token)))
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    let resp_update = test::call_service(&app, req_update).await;
    assert_eq!(resp_update.status(), actix_web::http::StatusCode::NOT_FOUND);

    let req_delete = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task.id))
        .append_header(("Authorization", format!("Bearer {}", other.token)))
        .to_request();
    let resp_delete = test::call_service(&app, req_delete).await;
    assert_eq!(resp_delete.status(), actix_web::http::StatusCode::NOT_FOUND);

    cleanup_user(&pool, author_email).await;
    cleanup_user(&pool, other_email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_task_filters_and_pagination() {
    let pool = test_pool().await;
    let email = "task_filters@example.com";
    cleanup_user(&pool, email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let user = register_user(&app, email, "Password123!").await.unwrap();

    for (title, status, priority) in [
        ("Ship the release", "completed", "high"),
        ("Draft the announcement", "pending", "medium"),
        ("Retro notes", "pending", "low"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .append_header(("Authorization", format!("Bearer {}", user.token)))
            .set_json(json!({ "title": title, "status": status, "priority": priority }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    }

    // Status filter
    let req = test::TestRequest::get()
        .uri("/api/tasks?status=pending")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let tasks: Vec<Task> = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(tasks.len(), 2);

    // Search filter
    let req = test::TestRequest::get()
        .uri("/api/tasks?search=announcement")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let tasks: Vec<Task> = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Draft the announcement");

    // Pagination: one per page, three pages' worth of tasks
    let req = test::TestRequest::get()
        .uri("/api/tasks?limit=1&page=2")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let tasks: Vec<Task> = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(tasks.len(), 1);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_create_task_with_unknown_assignee_fails() {
    let pool = test_pool().await;
    let email = "task_assignee@example.com";
    cleanup_user(&pool, email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    let user = register_user(&app, email, "Password123!").await.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(("Authorization", format!("Bearer {}", user.token)))
        .set_json(json!({
            "title": "Task for nobody",
            "assigned_to": Uuid::new_v4()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_task_routes_require_token() {
    let pool = test_pool().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(test_keys()))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    // No Authorization header
    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Garbage bearer token
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .append_header(("Authorization", "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::FORBIDDEN);
}
