use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Processor currency; the portal only charges in US dollars.
pub const CURRENCY: &str = "usd";

/// Stripe caps idempotency keys at 255 characters.
const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreatePaymentIntentRequest {
    /// Price in major currency units (dollars)
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Inclusive bounds on a single charge, in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountLimits {
    pub min_cents: i64,
    pub max_cents: i64,
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self {
            min_cents: 50,
            max_cents: 1_000_000,
        }
    }
}

impl AmountLimits {
    /// Converts a dollar price to cents and checks it against the limits.
    pub fn to_minor_units(&self, price: f64) -> Result<i64, AppError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::Validation(
                "price must be a positive number".to_string(),
            ));
        }

        let cents = (price * 100.0).round();
        if cents < self.min_cents as f64 || cents > self.max_cents as f64 {
            return Err(AppError::Validation(format!(
                "price must be between {:.2} and {:.2} {}",
                self.min_cents as f64 / 100.0,
                self.max_cents as f64 / 100.0,
                CURRENCY
            )));
        }

        Ok(cents as i64)
    }
}

/// What the adapter asks the processor for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: &'static str,
    pub idempotency_key: String,
}

/// Accepts a caller-supplied idempotency key or generates a fresh one.
pub fn resolve_idempotency_key(header: Option<&str>) -> Result<String, AppError> {
    match header {
        None => Ok(uuid::Uuid::new_v4().to_string()),
        Some(key) => {
            let valid = !key.is_empty()
                && key.len() <= MAX_IDEMPOTENCY_KEY_LEN
                && key.bytes().all(|b| b.is_ascii_graphic());
            if valid {
                Ok(key.to_string())
            } else {
                Err(AppError::Validation(
                    "Idempotency-Key must be 1-255 visible ASCII characters".to_string(),
                ))
            }
        }
    }
}
