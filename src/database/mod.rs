pub mod appointments;
pub mod repository;
pub mod users;

#[cfg(test)]
pub mod memory;

pub use appointments::{MongoAppointments, APPOINTMENTS_COLLECTION};
pub use repository::*;
pub use users::{MongoUsers, USERS_COLLECTION};

use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> mongodb::error::Result<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Pool shared by every request for the process lifetime
        client_options.app_name = Some("clinic-portal-service".to_string());
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Lookup indexes for the two query shapes the API uses. Not unique:
    /// duplicate user inserts are allowed.
    async fn ensure_indexes(&self) {
        log::info!("🔧 Creating database indexes...");

        let users_index = IndexModel::builder().keys(doc! { "email": 1 }).build();
        match self.collection::<Document>(USERS_COLLECTION).create_index(users_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email)"),
            Err(e) => log::debug!("   ℹ️  Index not created: {}", e),
        }

        let appointments_index = IndexModel::builder()
            .keys(doc! { "email": 1, "date": 1 })
            .build();
        match self
            .collection::<Document>(APPOINTMENTS_COLLECTION)
            .create_index(appointments_index)
            .await
        {
            Ok(_) => log::info!("   ✅ Index created: appointments(email, date)"),
            Err(e) => log::debug!("   ℹ️  Index not created: {}", e),
        }

        log::info!("✅ Database indexes ready");
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn users(&self) -> MongoUsers {
        MongoUsers::new(self.collection(USERS_COLLECTION))
    }

    pub fn appointments(&self) -> MongoAppointments {
        MongoAppointments::new(self.collection(APPOINTMENTS_COLLECTION))
    }

    /// Closes pooled connections once the HTTP server has drained.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        log::info!("👋 MongoDB connections closed");
    }
}
