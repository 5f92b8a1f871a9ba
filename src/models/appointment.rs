use mongodb::bson::{oid::ObjectId, Document};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::utils::{
    error::AppError,
    json::{expect_object, object_to_document, required_str},
};

/// Keys set by the server, never by the booking payload.
const SERVER_FIELDS: [&str; 2] = ["_id", "payment"];

/// A validated booking request: email and date plus opaque booking fields.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub email: String,
    pub date: String,
    pub document: Document,
}

impl NewAppointment {
    pub fn from_json(payload: Value) -> Result<Self, AppError> {
        let mut object = expect_object(payload, "appointment")?;
        let email = required_str(&mut object, "email")?;
        let date = required_str(&mut object, "date")?;

        for field in SERVER_FIELDS {
            object.remove(field);
        }

        Ok(Self {
            email,
            date,
            document: object_to_document(object)?,
        })
    }
}

/// Payment details attached to an appointment after checkout.
#[derive(Debug, Clone)]
pub struct PaymentRecord(pub Document);

impl PaymentRecord {
    pub fn from_json(payload: Value) -> Result<Self, AppError> {
        let object = expect_object(payload, "payment")?;
        if object.is_empty() {
            return Err(AppError::Validation("payment must not be empty".to_string()));
        }
        Ok(Self(object_to_document(object)?))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    /// Patient email
    pub email: String,
    /// Appointment date, matched exactly as stored
    pub date: String,
}

impl AppointmentQuery {
    /// Trimmed `(email, date)`; both must be non-blank.
    pub fn criteria(&self) -> Result<(&str, &str), AppError> {
        let email = self.email.trim();
        let date = self.date.trim();
        if email.is_empty() || date.is_empty() {
            return Err(AppError::Validation(
                "email and date query parameters are required".to_string(),
            ));
        }
        Ok((email, date))
    }
}

pub fn parse_appointment_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("Invalid appointment id: {}", raw)))
}
