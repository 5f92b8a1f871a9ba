use std::sync::Arc;

use crate::database::{AppointmentRepository, UserRepository};
use crate::models::AmountLimits;
use crate::services::PaymentGateway;

/// Process-wide resources handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub payments: Arc<dyn PaymentGateway>,
    pub payment_limits: AmountLimits,
}
