use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    results::UpdateResult,
    Collection,
};

use super::repository::{InsertOutcome, UpdateOutcome, UserRepository};
use crate::models::Role;
use crate::utils::{error::AppError, json::id_to_string};

pub const USERS_COLLECTION: &str = "users";

#[derive(Clone)]
pub struct MongoUsers {
    collection: Collection<Document>,
}

impl MongoUsers {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

pub(crate) fn update_outcome(result: UpdateResult) -> UpdateOutcome {
    let upserted_id = result.upserted_id.as_ref().map(id_to_string);
    UpdateOutcome {
        acknowledged: true,
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_count: u64::from(upserted_id.is_some()),
        upserted_id,
    }
}

#[async_trait]
impl UserRepository for MongoUsers {
    async fn insert(&self, user: Document) -> Result<InsertOutcome, AppError> {
        let result = self.collection.insert_one(user).await?;
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id_to_string(&result.inserted_id),
        })
    }

    async fn upsert_by_email(
        &self,
        email: &str,
        user: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .collection
            .update_one(doc! { "email": email }, doc! { "$set": user })
            .upsert(true)
            .await?;
        Ok(update_outcome(result))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Document>, AppError> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "role": role.as_str() } },
            )
            .await?;
        Ok(update_outcome(result))
    }
}
