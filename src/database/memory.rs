//! In-memory repositories used by handler tests.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::sync::Mutex;

use super::repository::{AppointmentRepository, InsertOutcome, UpdateOutcome, UserRepository};
use crate::models::Role;
use crate::utils::error::AppError;

#[derive(Default)]
pub struct MemoryUsers {
    docs: Mutex<Vec<Document>>,
}

#[derive(Default)]
pub struct MemoryAppointments {
    docs: Mutex<Vec<Document>>,
}

impl MemoryUsers {
    pub fn all(&self) -> Vec<Document> {
        self.docs.lock().unwrap().clone()
    }

    pub fn seed(&self, doc: Document) {
        self.docs.lock().unwrap().push(with_id(doc).0);
    }
}

impl MemoryAppointments {
    pub fn all(&self) -> Vec<Document> {
        self.docs.lock().unwrap().clone()
    }

    pub fn seed(&self, doc: Document) -> ObjectId {
        let (doc, id) = with_id(doc);
        self.docs.lock().unwrap().push(doc);
        id
    }
}

fn with_id(mut doc: Document) -> (Document, ObjectId) {
    let id = match doc.get_object_id("_id") {
        Ok(id) => id,
        Err(_) => {
            let id = ObjectId::new();
            doc.insert("_id", id);
            id
        }
    };
    (doc, id)
}

/// Applies `$set` semantics and reports whether anything changed.
fn set_fields(target: &mut Document, fields: Document) -> bool {
    let mut changed = false;
    for (key, value) in fields {
        if target.get(&key) != Some(&value) {
            target.insert(key, value);
            changed = true;
        }
    }
    changed
}

fn matched(changed: bool) -> UpdateOutcome {
    UpdateOutcome {
        acknowledged: true,
        matched_count: 1,
        modified_count: u64::from(changed),
        upserted_count: 0,
        upserted_id: None,
    }
}

fn unmatched() -> UpdateOutcome {
    UpdateOutcome {
        acknowledged: true,
        matched_count: 0,
        modified_count: 0,
        upserted_count: 0,
        upserted_id: None,
    }
}

fn str_eq(doc: &Document, key: &str, expected: &str) -> bool {
    matches!(doc.get(key), Some(Bson::String(s)) if s == expected)
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, user: Document) -> Result<InsertOutcome, AppError> {
        let (doc, id) = with_id(user);
        self.docs.lock().unwrap().push(doc);
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id.to_hex(),
        })
    }

    async fn upsert_by_email(
        &self,
        email: &str,
        user: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(existing) = docs.iter_mut().find(|d| str_eq(d, "email", email)) {
            return Ok(matched(set_fields(existing, user)));
        }

        let (mut doc, id) = with_id(Document::new());
        doc.insert("email", email);
        set_fields(&mut doc, user);
        docs.push(doc);
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id.to_hex()),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Document>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| str_eq(d, "email", email)).cloned())
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<UpdateOutcome, AppError> {
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| str_eq(d, "email", email)) {
            Some(user) => {
                let mut fields = Document::new();
                fields.insert("role", role.as_str());
                Ok(matched(set_fields(user, fields)))
            }
            None => Ok(unmatched()),
        }
    }
}

#[async_trait]
impl AppointmentRepository for MemoryAppointments {
    async fn insert(&self, appointment: Document) -> Result<InsertOutcome, AppError> {
        let id = self.seed(appointment);
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id.to_hex(),
        })
    }

    async fn find_by_email_and_date(
        &self,
        email: &str,
        date: &str,
    ) -> Result<Vec<Document>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|d| str_eq(d, "email", email) && str_eq(d, "date", date))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .find(|d| d.get_object_id("_id").ok() == Some(id))
            .cloned())
    }

    async fn attach_payment(
        &self,
        id: ObjectId,
        payment: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let mut docs = self.docs.lock().unwrap();
        match docs
            .iter_mut()
            .find(|d| d.get_object_id("_id").ok() == Some(id))
        {
            Some(appointment) => {
                let mut fields = Document::new();
                fields.insert("payment", payment);
                Ok(matched(set_fields(appointment, fields)))
            }
            None => Ok(unmatched()),
        }
    }
}
