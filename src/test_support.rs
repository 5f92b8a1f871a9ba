//! Fakes and an app builder shared by handler tests.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api;
use crate::database::memory::{MemoryAppointments, MemoryUsers};
use crate::middleware::IdentityMiddleware;
use crate::models::{AmountLimits, PaymentIntentParams};
use crate::services::{CreatedIntent, IdentityVerifier, PaymentGateway, VerifiedIdentity};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Accepts only the tokens it was given.
#[derive(Default)]
pub struct FakeVerifier {
    tokens: HashMap<String, String>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, email: &str) -> Self {
        self.tokens.insert(token.to_string(), email.to_string());
        self
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        self.tokens
            .get(token)
            .map(|email| VerifiedIdentity {
                uid: format!("uid-{}", email),
                email: email.clone(),
            })
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))
    }
}

/// Records every intent request and answers with a deterministic secret.
#[derive(Default)]
pub struct FakePayments {
    pub requests: Mutex<Vec<PaymentIntentParams>>,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_intent(&self, params: &PaymentIntentParams) -> Result<CreatedIntent, AppError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(params.clone());
        let id = format!("pi_test_{}", requests.len());
        Ok(CreatedIntent {
            client_secret: format!("{}_secret", id),
            id,
        })
    }
}

pub struct TestBackends {
    pub users: Arc<MemoryUsers>,
    pub appointments: Arc<MemoryAppointments>,
    pub payments: Arc<FakePayments>,
    pub verifier: Arc<FakeVerifier>,
}

impl TestBackends {
    pub fn new(verifier: FakeVerifier) -> Self {
        Self {
            users: Arc::new(MemoryUsers::default()),
            appointments: Arc::new(MemoryAppointments::default()),
            payments: Arc::new(FakePayments::default()),
            verifier: Arc::new(verifier),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        let state = AppState {
            users: self.users.clone(),
            appointments: self.appointments.clone(),
            payments: self.payments.clone(),
            payment_limits: AmountLimits::default(),
        };

        App::new()
            .app_data(web::Data::new(state))
            .app_data(api::json_config())
            .app_data(api::query_config())
            .wrap(IdentityMiddleware::new(self.verifier.clone()))
            .configure(api::routes)
    }
}
