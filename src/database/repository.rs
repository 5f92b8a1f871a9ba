use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use serde::Serialize;

use crate::models::Role;
use crate::utils::error::AppError;

/// Result of an insert, shaped like the driver's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Result of an update or upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: Document) -> Result<InsertOutcome, AppError>;

    /// `$set` the document on the user with this email, inserting when absent.
    async fn upsert_by_email(&self, email: &str, user: Document)
        -> Result<UpdateOutcome, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Document>, AppError>;

    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome, AppError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert(&self, appointment: Document) -> Result<InsertOutcome, AppError>;

    /// Exact match on both fields.
    async fn find_by_email_and_date(
        &self,
        email: &str,
        date: &str,
    ) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError>;

    /// Overwrites the `payment` field. `matched_count` is 0 when the id is unknown.
    async fn attach_payment(
        &self,
        id: ObjectId,
        payment: Document,
    ) -> Result<UpdateOutcome, AppError>;
}
