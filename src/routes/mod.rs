pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::refresh)
            .service(auth::logout)
            .service(auth::logout_all),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        // /profile must be registered before /{id} so it is not captured as an id.
        web::scope("/users")
            .service(users::list_users)
            .service(users::get_profile)
            .service(users::get_user)
            .service(users::get_user_tasks)
            .service(users::update_user)
            .service(users::delete_user),
    );
}
