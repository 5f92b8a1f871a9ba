use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Portal API",
        version = "1.0.0",
        description = "Appointment booking backend for the clinic portal.\n\n**Authentication:** booking an appointment and granting the admin role require a Firebase ID token as a Bearer token.\n\n**Features:**\n- User sync and admin roles\n- Appointment booking and lookup\n- Card payment intents"
    ),
    paths(
        // Health
        crate::api::health::liveness,

        // Users
        crate::api::users::create_user,
        crate::api::users::upsert_user,
        crate::api::users::get_admin_status,
        crate::api::users::make_admin,

        // Appointments
        crate::api::appointments::create_appointment,
        crate::api::appointments::list_appointments,
        crate::api::appointments::get_appointment,
        crate::api::appointments::attach_payment,

        // Payments
        crate::api::payments::create_payment_intent,
    ),
    components(
        schemas(
            crate::database::InsertOutcome,
            crate::database::UpdateOutcome,
            crate::models::AdminStatus,
            crate::models::ElevateAdminRequest,
            crate::models::Role,
            crate::models::CreatePaymentIntentRequest,
            crate::models::PaymentIntentResponse,
            crate::utils::error::ErrorBody,
        )
    ),
    tags(
        (name = "Health", description = "Liveness check."),
        (name = "Users", description = "User sync on sign-in and admin role management."),
        (name = "Appointments", description = "Booking, lookup and payment attachment."),
        (name = "Payments", description = "Payment intents through the card processor."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Firebase ID token"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/users",
            "/users/admin",
            "/users/{email}",
            "/appointments",
            "/appointments/{id}",
            "/create-payment-intent",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{}", path);
        }
    }
}
