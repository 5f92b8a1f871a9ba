use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::{
    resolve_idempotency_key, CreatePaymentIntentRequest, PaymentIntentParams,
    PaymentIntentResponse, CURRENCY,
};
use crate::state::AppState;
use crate::utils::error::{AppError, ErrorBody};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// POST /create-payment-intent - Card intent in USD for the given price
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "Payments",
    request_body = CreatePaymentIntentRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Replays with the same key return the same intent")
    ),
    responses(
        (status = 200, description = "Intent created", body = PaymentIntentResponse),
        (status = 400, description = "Price out of bounds or bad idempotency key", body = ErrorBody),
        (status = 502, description = "Payment processor unavailable", body = ErrorBody)
    )
)]
pub async fn create_payment_intent(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<CreatePaymentIntentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💰 POST /create-payment-intent - price: {}", request.price);

    let amount = state.payment_limits.to_minor_units(request.price)?;

    let header = match req.headers().get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| {
            AppError::Validation("Idempotency-Key must be visible ASCII".to_string())
        })?),
        None => None,
    };
    let params = PaymentIntentParams {
        amount,
        currency: CURRENCY,
        idempotency_key: resolve_idempotency_key(header)?,
    };

    let intent = state.payments.create_intent(&params).await?;
    log::info!("✅ Payment intent ready: {}", intent.id);

    Ok(HttpResponse::Ok().json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
