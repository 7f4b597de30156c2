use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::time::Duration;

use taskhub::auth::{store, AuthMiddleware, TokenKeys};
use taskhub::config::Config;
use taskhub::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let keys = TokenKeys::from_config(&config);

    // Periodic sweep of expired refresh tokens; requests never trigger this.
    let sweep_pool = pool.clone();
    let sweep_interval = Duration::from_secs(config.token_sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            match store::sweep_expired(&sweep_pool).await {
                Ok(0) => {}
                Ok(n) => log::info!("Swept {} expired refresh token(s)", n),
                Err(e) => log::warn!("Refresh token sweep failed: {}", e),
            }
        }
    });

    log::info!("Starting TaskHub server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(keys.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
