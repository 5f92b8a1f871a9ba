// ==================== PAYMENT PROCESSOR ====================
// Creates card PaymentIntents through Stripe's REST API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::PaymentIntentParams;
use crate::utils::error::AppError;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// A payment intent as far as the portal cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, params: &PaymentIntentParams) -> Result<CreatedIntent, AppError>;
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(http: reqwest::Client, secret_key: String, api_base: impl Into<String>) -> Self {
        Self {
            http,
            secret_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Form fields for `POST /v1/payment_intents`.
    fn form(params: &PaymentIntentParams) -> Vec<(&'static str, String)> {
        vec![
            ("amount", params.amount.to_string()),
            ("currency", params.currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ]
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, params: &PaymentIntentParams) -> Result<CreatedIntent, AppError> {
        log::info!(
            "💳 Creating payment intent: {} {} (key {})",
            params.amount,
            params.currency,
            params.idempotency_key
        );

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", &params.idempotency_key)
            .form(&Self::form(params))
            .send()
            .await
            .map_err(|e| AppError::upstream("payment processor", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<StripeErrorEnvelope>().await {
                Ok(envelope) => format!(
                    "{} {}: {}",
                    status,
                    envelope.error.kind.unwrap_or_default(),
                    envelope.error.message.unwrap_or_default()
                ),
                Err(_) => format!("{}", status),
            };
            return Err(AppError::upstream("payment processor", detail));
        }

        let intent: StripeIntent = response
            .json()
            .await
            .map_err(|e| AppError::upstream("payment processor", e))?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            AppError::upstream(
                "payment processor",
                format!("intent {} returned without client secret", intent.id),
            )
        })?;

        log::info!("✅ Payment intent created: {}", intent.id);
        Ok(CreatedIntent {
            id: intent.id,
            client_secret,
        })
    }
}
