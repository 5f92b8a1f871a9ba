use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::database::{InsertOutcome, UpdateOutcome};
use crate::middleware::Identity;
use crate::models::{parse_appointment_id, AppointmentQuery, NewAppointment, PaymentRecord};
use crate::state::AppState;
use crate::utils::{
    error::{AppError, ErrorBody},
    json::document_to_json,
};

/// POST /appointments - Books an appointment for a signed-in caller
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "Appointments",
    responses(
        (status = 200, description = "Appointment inserted", body = InsertOutcome),
        (status = 400, description = "Missing email or date", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_appointment(
    identity: Identity,
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let appointment = NewAppointment::from_json(payload.into_inner())?;
    log::info!(
        "📅 POST /appointments - {} on {} (by {})",
        appointment.email,
        appointment.date,
        identity.email()
    );

    let result = state.appointments.insert(appointment.document).await?;

    log::info!("✅ Appointment booked: {}", result.inserted_id);
    Ok(HttpResponse::Ok().json(result))
}

/// GET /appointments?email=&date= - Appointments matching both fields
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "Appointments",
    params(AppointmentQuery),
    responses(
        (status = 200, description = "Matching appointments, possibly none"),
        (status = 400, description = "email or date missing", body = ErrorBody)
    )
)]
pub async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<AppointmentQuery>,
) -> Result<HttpResponse, AppError> {
    let (email, date) = query.criteria()?;
    log::info!("📋 GET /appointments - {} on {}", email, date);

    let appointments: Vec<Value> = state
        .appointments
        .find_by_email_and_date(email, date)
        .await?
        .into_iter()
        .map(document_to_json)
        .collect();

    log::info!("✅ Found {} appointments", appointments.len());
    Ok(HttpResponse::Ok().json(appointments))
}

/// GET /appointments/{id}
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "Appointment id (24 hex characters)")),
    responses(
        (status = 200, description = "The appointment"),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No such appointment", body = ErrorBody)
    )
)]
pub async fn get_appointment(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔍 GET /appointments/{}", id);
    let object_id = parse_appointment_id(&id)?;

    let appointment = state
        .appointments
        .find_by_id(object_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {} does not exist", id)))?;

    Ok(HttpResponse::Ok().json(document_to_json(appointment)))
}

/// PUT /appointments/{id} - Records payment details; overwrites earlier ones
#[utoipa::path(
    put,
    path = "/appointments/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "Appointment id (24 hex characters)")),
    responses(
        (status = 200, description = "Payment attached", body = UpdateOutcome),
        (status = 400, description = "Malformed id or empty payment", body = ErrorBody),
        (status = 404, description = "No such appointment", body = ErrorBody)
    )
)]
pub async fn attach_payment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    log::info!("💳 PUT /appointments/{} - attaching payment", id);
    let object_id = parse_appointment_id(&id)?;
    let payment = PaymentRecord::from_json(payload.into_inner())?;

    let result = state.appointments.attach_payment(object_id, payment.0).await?;
    if result.matched_count == 0 {
        log::warn!("⚠️  Payment for unknown appointment {}", id);
        return Err(AppError::NotFound(format!("appointment {} does not exist", id)));
    }

    log::info!("✅ Payment attached to {}", id);
    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{FakeVerifier, TestBackends};
    use actix_web::http::{header::AUTHORIZATION, StatusCode};
    use actix_web::test::{call_and_read_body_json, call_service, init_service, TestRequest};
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::{json, Value};

    fn backends() -> TestBackends {
        TestBackends::new(FakeVerifier::new().with_token("pat-token", "pat@clinic.test"))
    }

    #[actix_web::test]
    async fn test_create_requires_identity() {
        let backends = backends();
        let app = init_service(backends.app()).await;
        let booking = json!({
            "email": "pat@clinic.test",
            "date": "11/2/2021",
            "serviceName": "Cavity Protection",
            "time": "08.00 AM - 09.00 AM"
        });

        let req = TestRequest::post()
            .uri("/appointments")
            .set_json(&booking)
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        assert!(backends.appointments.all().is_empty());

        let req = TestRequest::post()
            .uri("/appointments")
            .insert_header((AUTHORIZATION, "Bearer pat-token"))
            .set_json(&booking)
            .to_request();
        let body: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(body["acknowledged"], true);

        let stored = backends.appointments.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            stored[0].get_object_id("_id").unwrap().to_hex(),
            body["insertedId"].as_str().unwrap()
        );
    }

    #[actix_web::test]
    async fn test_list_matches_email_and_date_exactly() {
        let backends = backends();
        backends.appointments.seed(doc! { "email": "pat@clinic.test", "date": "11/2/2021", "slot": 1 });
        backends.appointments.seed(doc! { "email": "pat@clinic.test", "date": "11/3/2021", "slot": 2 });
        backends.appointments.seed(doc! { "email": "sam@clinic.test", "date": "11/2/2021", "slot": 3 });
        let app = init_service(backends.app()).await;

        let req = TestRequest::get()
            .uri("/appointments?email=pat%40clinic.test&date=11%2F2%2F2021")
            .to_request();
        let body: Vec<Value> = call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["slot"], 1);

        let req = TestRequest::get()
            .uri("/appointments?email=pat%40clinic.test&date=11%2F4%2F2021")
            .to_request();
        let body: Vec<Value> = call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());

        for uri in [
            "/appointments?email=pat%40clinic.test",
            "/appointments?email=&date=",
            "/appointments?email=pat%40clinic.test&date=%20",
        ] {
            let req = TestRequest::get().uri(uri).to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_operator_keys_in_booking_are_validation_errors() {
        let backends = backends();
        let app = init_service(backends.app()).await;

        for booking in [
            json!({ "email": "pat@clinic.test", "date": "11/2/2021", "$set": { "paid": true } }),
            json!({ "email": "pat@clinic.test", "date": "11/2/2021", "payment.amount": 0 }),
        ] {
            let req = TestRequest::post()
                .uri("/appointments")
                .insert_header((AUTHORIZATION, "Bearer pat-token"))
                .set_json(&booking)
                .to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = actix_web::test::read_body_json(resp).await;
            assert_eq!(body["error"], "validation");
        }

        assert!(backends.appointments.all().is_empty());
    }

    #[actix_web::test]
    async fn test_get_by_id() {
        let backends = backends();
        let id = backends.appointments.seed(doc! { "email": "pat@clinic.test", "date": "11/2/2021" });
        let app = init_service(backends.app()).await;

        let req = TestRequest::get().uri(&format!("/appointments/{}", id.to_hex())).to_request();
        let body: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(body["_id"], json!(id.to_hex()));
        assert_eq!(body["email"], "pat@clinic.test");

        let req = TestRequest::get()
            .uri(&format!("/appointments/{}", ObjectId::new().to_hex()))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = TestRequest::get().uri("/appointments/not-an-id").to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_attach_payment_overwrites() {
        let backends = backends();
        let id = backends.appointments.seed(doc! { "email": "pat@clinic.test", "date": "11/2/2021" });
        let app = init_service(backends.app()).await;

        for transaction in ["pi_1", "pi_2"] {
            let req = TestRequest::put()
                .uri(&format!("/appointments/{}", id.to_hex()))
                .set_json(json!({ "amount": 50, "transaction": transaction }))
                .to_request();
            let body: Value = call_and_read_body_json(&app, req).await;
            assert_eq!(body["matchedCount"], 1);
        }

        let stored = backends.appointments.all();
        let payment = stored[0].get_document("payment").unwrap();
        assert_eq!(payment.get_str("transaction").unwrap(), "pi_2");
    }

    #[actix_web::test]
    async fn test_attach_payment_to_missing_appointment_is_not_found() {
        let backends = backends();
        backends.appointments.seed(doc! { "email": "pat@clinic.test", "date": "11/2/2021" });
        let app = init_service(backends.app()).await;

        let req = TestRequest::put()
            .uri(&format!("/appointments/{}", ObjectId::new().to_hex()))
            .set_json(json!({ "amount": 50, "transaction": "pi_1" }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        assert!(backends
            .appointments
            .all()
            .iter()
            .all(|a| !a.contains_key("payment")));
    }
}
