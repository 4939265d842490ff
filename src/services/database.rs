use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};

use crate::error::AppError;
use crate::models::{Account, AuditRecord, Building, HashRecord};

/// Unredeemed hash records expire server-side after the longest link-token
/// lifetime (account setup, 24h).
const HASH_RECORD_TTL_SECONDS: u64 = 86_400;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.accounts().create_index(email_index, None).await?;
        tracing::info!("Created unique index on accounts.email");

        let hash_index = IndexModel::builder()
            .keys(doc! { "hash": 1 })
            .options(
                IndexOptions::builder()
                    .name("hash_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.hash_records().create_index(hash_index, None).await?;

        let hash_ttl_index = IndexModel::builder()
            .keys(doc! { "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("hash_ttl".to_string())
                    .expire_after(std::time::Duration::from_secs(HASH_RECORD_TTL_SECONDS))
                    .build(),
            )
            .build();
        self.hash_records().create_index(hash_ttl_index, None).await?;
        tracing::info!("Created unique and TTL indexes on hash_records");

        let address_index = IndexModel::builder()
            .keys(doc! { "address": 1 })
            .options(
                IndexOptions::builder()
                    .name("address_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.buildings().create_index(address_index, None).await?;
        tracing::info!("Created unique index on buildings.address");

        let audit_index = IndexModel::builder()
            .keys(doc! { "timestamp": 1 })
            .options(
                IndexOptions::builder()
                    .name("audit_timestamp".to_string())
                    .build(),
            )
            .build();
        self.audits().create_index(audit_index, None).await?;
        tracing::info!("Created index on audits.timestamp");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn accounts(&self) -> Collection<Account> {
        self.db.collection("accounts")
    }

    pub fn buildings(&self) -> Collection<Building> {
        self.db.collection("buildings")
    }

    pub fn hash_records(&self) -> Collection<HashRecord> {
        self.db.collection("hash_records")
    }

    pub fn audits(&self) -> Collection<AuditRecord> {
        self.db.collection("audits")
    }
}
