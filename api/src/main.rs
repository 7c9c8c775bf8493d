use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

use pf_api::app;
use pf_api::middleware::auth::AccessTokenVerifier;
use pf_api::middleware::cors::create_cors;
use pf_api::routes::AppState;
use pf_core::services::token::{
    CleanupConfig, SessionCleanupService, TokenCodec, TokenService, TokenServiceConfig,
};
use pf_infra::database::{create_pool, MySqlIdentityRepository, MySqlSessionRepository};
use pf_shared::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Plateful session service");

    let config = AppConfig::from_env();
    let bind_address = config.server.bind_address();

    let pool = create_pool(&config.database)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let token_config = TokenServiceConfig::from_auth_config(&config.auth);

    // The verification middleware shares the codec; the hot path never
    // touches the session store
    let verifier: Arc<dyn AccessTokenVerifier> = Arc::new(TokenCodec::new(&token_config));

    let tokens = Arc::new(TokenService::new(
        MySqlSessionRepository::new(pool.clone()),
        MySqlIdentityRepository::new(pool.clone()),
        token_config,
    ));

    // Background sweeper reclaiming dead session rows
    let sweeper = Arc::new(SessionCleanupService::new(
        Arc::new(MySqlSessionRepository::new(pool.clone())),
        CleanupConfig {
            interval_seconds: config.auth.sweep_interval,
            grace_period_hours: config.auth.sweep_grace_hours,
            enabled: true,
        },
    ));
    sweeper.start_background_task();

    let state = web::Data::new(AppState {
        tokens: Arc::clone(&tokens),
    });

    info!("Server will bind to: {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(state.clone())
            .route("/health", web::get().to(app::health_check))
            .service(web::scope("/api/v1").service(app::session_scope::<
                MySqlSessionRepository,
                MySqlIdentityRepository,
            >(Arc::clone(&verifier))))
    })
    .bind(&bind_address)?
    .run()
    .await
}
