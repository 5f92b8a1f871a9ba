use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection,
};

use super::repository::{AppointmentRepository, InsertOutcome, UpdateOutcome};
use super::users::update_outcome;
use crate::utils::{error::AppError, json::id_to_string};

pub const APPOINTMENTS_COLLECTION: &str = "appointments";

#[derive(Clone)]
pub struct MongoAppointments {
    collection: Collection<Document>,
}

impl MongoAppointments {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl AppointmentRepository for MongoAppointments {
    async fn insert(&self, appointment: Document) -> Result<InsertOutcome, AppError> {
        let result = self.collection.insert_one(appointment).await?;
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id_to_string(&result.inserted_id),
        })
    }

    async fn find_by_email_and_date(
        &self,
        email: &str,
        date: &str,
    ) -> Result<Vec<Document>, AppError> {
        let cursor = self
            .collection
            .find(doc! { "email": email, "date": date })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn attach_payment(
        &self,
        id: ObjectId,
        payment: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "payment": payment } })
            .await?;
        Ok(update_outcome(result))
    }
}
