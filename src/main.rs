mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::services::{FirebaseVerifier, IdentityVerifier, StripeGateway};
use crate::state::AppState;

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
            actix_web::http::header::HeaderName::from_static("idempotency-key"),
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting Clinic Portal Service...");
    log::info!("📊 Database: {} / {}", config.redacted_mongodb_uri(), config.database_name);
    log::info!(
        "🔐 Identity project: {} ({})",
        config.service_account.project_id,
        config.service_account.client_email.as_deref().unwrap_or("no client email")
    );

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.mongodb_uri, &config.database_name)
        .await
        .map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            io::Error::new(io::ErrorKind::ConnectionRefused, e)
        })?;
    log::info!("✅ MongoDB connected successfully");

    let http = services::http_client(config.http_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(FirebaseVerifier::new(
        http.clone(),
        &config.service_account.project_id,
        config.jwks_url.clone(),
        config.identity_keys_ttl,
    ));

    let state = web::Data::new(AppState {
        users: Arc::new(db.users()),
        appointments: Arc::new(db.appointments()),
        payments: Arc::new(StripeGateway::new(
            http,
            config.stripe_secret_key.clone(),
            config.stripe_api_base.clone(),
        )),
        payment_limits: config.payment_limits,
    });

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);

    let allowed_origins = config.cors_allowed_origins.clone();

    // Start HTTP server; actix drains in-flight requests on SIGINT/SIGTERM
    HttpServer::new(move || {
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .app_data(api::json_config())
            .app_data(api::query_config())
            .wrap(middleware::IdentityMiddleware::new(verifier.clone()))
            .wrap(cors(&allowed_origins))
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::routes)
    })
    .shutdown_timeout(config.shutdown_timeout_secs)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    log::info!("🛑 HTTP server stopped");
    db.shutdown().await;

    Ok(())
}
