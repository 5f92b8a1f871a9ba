pub mod appointments;
pub mod health;
pub mod payments;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::utils::error::AppError;

/// Registers every endpoint.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::liveness))
        // Users
        .route("/users", web::post().to(users::create_user))
        .route("/users", web::put().to(users::upsert_user))
        .route("/users/admin", web::put().to(users::make_admin))
        .route("/users/{email}", web::get().to(users::get_admin_status))
        // Appointments
        .route("/appointments", web::post().to(appointments::create_appointment))
        .route("/appointments", web::get().to(appointments::list_appointments))
        .route("/appointments/{id}", web::get().to(appointments::get_appointment))
        .route("/appointments/{id}", web::put().to(appointments::attach_payment))
        // Payments
        .route(
            "/create-payment-intent",
            web::post().to(payments::create_payment_intent),
        );
}

/// Body extraction failures answer like every other validation error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}
