//! Persistence seams for accounts, buildings, hash records and the audit
//! trail. Each trait has a MongoDB implementation and an in-memory one used
//! by the integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Bson};

use crate::error::AppError;
use crate::models::{
    Account, ActorStamp, Amenity, AssignedBuilding, AuditRecord, Building, HashRecord,
};
use crate::services::database::MongoDb;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: &Account) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    /// Replace the stored document with this snapshot.
    async fn update(&self, account: &Account) -> Result<(), AppError>;
    /// Swap the stored password hash; optionally flip `is_verified` in the
    /// same write (account setup doubles as first verification).
    async fn set_password(
        &self,
        id: &str,
        password_hash: &str,
        mark_verified: bool,
    ) -> Result<(), AppError>;
    async fn mark_verified(&self, id: &str) -> Result<(), AppError>;
    async fn add_building(
        &self,
        id: &str,
        building: &AssignedBuilding,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait HashRecordStore: Send + Sync {
    /// Persist a fresh record for the account and return its hash value.
    async fn create(&self, account_id: &str) -> Result<String, AppError>;
    /// Look up the owning account without consuming the record.
    async fn resolve(&self, hash: &str) -> Result<Option<String>, AppError>;
    /// Delete the record and every other record owned by the same account.
    /// A hash with no record is a no-op. Resolve-then-consume is two steps;
    /// concurrent redemptions of the same link can both pass `resolve`.
    async fn consume(&self, hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditRecord) -> Result<(), AppError>;
}

#[async_trait]
pub trait BuildingStore: Send + Sync {
    async fn insert(&self, building: &Building) -> Result<(), AppError>;
    async fn list(&self) -> Result<Vec<Building>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Building>, AppError>;
    async fn update(&self, building: &Building) -> Result<(), AppError>;
    async fn add_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError>;
    async fn update_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError>;
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we))
            if we.code == 11000
    )
}

fn bson_of<T: serde::Serialize>(value: &T) -> Result<Bson, AppError> {
    to_bson(value).map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))
}

// ---------------------------------------------------------------------------
// MongoDB implementations
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoAccountStore {
    db: MongoDb,
}

impl MongoAccountStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        self.db.accounts().insert_one(account, None).await.map_err(|e| {
            // Backstop behind the find-then-insert race on the unique index.
            if is_duplicate_key(&e) {
                AppError::Conflict(anyhow::anyhow!("Email is already registered"))
            } else {
                AppError::from(e)
            }
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.db.accounts().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .db
            .accounts()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn update(&self, account: &Account) -> Result<(), AppError> {
        let result = self
            .db
            .accounts()
            .replace_one(doc! { "_id": &account.id }, account, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        }
        Ok(())
    }

    async fn set_password(
        &self,
        id: &str,
        password_hash: &str,
        mark_verified: bool,
    ) -> Result<(), AppError> {
        let mut set = doc! { "password": password_hash };
        if mark_verified {
            set.insert("is_verified", true);
        }
        let result = self
            .db
            .accounts()
            .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        }
        Ok(())
    }

    async fn mark_verified(&self, id: &str) -> Result<(), AppError> {
        let result = self
            .db
            .accounts()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "is_verified": true } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        }
        Ok(())
    }

    async fn add_building(
        &self,
        id: &str,
        building: &AssignedBuilding,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let result = self
            .db
            .accounts()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$push": { "buildings": bson_of(building)? },
                    "$set": { "last_updated_by": bson_of(updated_by)? },
                },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoHashStore {
    db: MongoDb,
}

impl MongoHashStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HashRecordStore for MongoHashStore {
    async fn create(&self, account_id: &str) -> Result<String, AppError> {
        let record = HashRecord::new(account_id);
        self.db.hash_records().insert_one(&record, None).await?;
        Ok(record.hash)
    }

    async fn resolve(&self, hash: &str) -> Result<Option<String>, AppError> {
        let record = self
            .db
            .hash_records()
            .find_one(doc! { "hash": hash }, None)
            .await?;
        Ok(record.map(|r| r.account_id))
    }

    async fn consume(&self, hash: &str) -> Result<(), AppError> {
        let record = self
            .db
            .hash_records()
            .find_one(doc! { "hash": hash }, None)
            .await?;
        let Some(record) = record else {
            return Ok(());
        };
        // One redeemed link invalidates every outstanding link for the
        // same account.
        self.db
            .hash_records()
            .delete_many(doc! { "account_id": &record.account_id }, None)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoAuditSink {
    db: MongoDb,
}

impl MongoAuditSink {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for MongoAuditSink {
    async fn record(&self, entry: &AuditRecord) -> Result<(), AppError> {
        self.db.audits().insert_one(entry, None).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoBuildingStore {
    db: MongoDb,
}

impl MongoBuildingStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BuildingStore for MongoBuildingStore {
    async fn insert(&self, building: &Building) -> Result<(), AppError> {
        self.db
            .buildings()
            .insert_one(building, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Conflict(anyhow::anyhow!("Building address already exists"))
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Building>, AppError> {
        let cursor = self.db.buildings().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Building>, AppError> {
        Ok(self
            .db
            .buildings()
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn update(&self, building: &Building) -> Result<(), AppError> {
        let result = self
            .db
            .buildings()
            .replace_one(doc! { "_id": &building.id }, building, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Building not found")));
        }
        Ok(())
    }

    async fn add_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let result = self
            .db
            .buildings()
            .update_one(
                doc! { "_id": building_id },
                doc! {
                    "$push": { "amenities": bson_of(amenity)? },
                    "$set": { "last_updated_by": bson_of(updated_by)? },
                },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Building not found")));
        }
        Ok(())
    }

    async fn update_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let result = self
            .db
            .buildings()
            .update_one(
                doc! { "_id": building_id, "amenities.id": &amenity.id },
                doc! {
                    "$set": {
                        "amenities.$": bson_of(amenity)?,
                        "last_updated_by": bson_of(updated_by)?,
                    },
                },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Amenity not found")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementations for tests
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Email is already registered"
            )));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if !accounts.contains_key(&account.id) {
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn set_password(
        &self,
        id: &str,
        password_hash: &str,
        mark_verified: bool,
    ) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;
        account.password = password_hash.to_string();
        if mark_verified {
            account.is_verified = true;
        }
        Ok(())
    }

    async fn mark_verified(&self, id: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;
        account.is_verified = true;
        Ok(())
    }

    async fn add_building(
        &self,
        id: &str,
        building: &AssignedBuilding,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;
        account.buildings.push(building.clone());
        account.last_updated_by = Some(updated_by.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHashStore {
    records: Mutex<HashMap<String, HashRecord>>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl HashRecordStore for MemoryHashStore {
    async fn create(&self, account_id: &str) -> Result<String, AppError> {
        let record = HashRecord::new(account_id);
        let hash = record.hash.clone();
        self.records.lock().unwrap().insert(hash.clone(), record);
        Ok(hash)
    }

    async fn resolve(&self, hash: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(hash)
            .map(|r| r.account_id.clone()))
    }

    async fn consume(&self, hash: &str) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.remove(hash) else {
            return Ok(());
        };
        records.retain(|_, r| r.account_id != record.account_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditRecord> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditRecord) -> Result<(), AppError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBuildingStore {
    buildings: Mutex<HashMap<String, Building>>,
}

impl MemoryBuildingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BuildingStore for MemoryBuildingStore {
    async fn insert(&self, building: &Building) -> Result<(), AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        if buildings.values().any(|b| b.address == building.address) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Building address already exists"
            )));
        }
        buildings.insert(building.id.clone(), building.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Building>, AppError> {
        Ok(self.buildings.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Building>, AppError> {
        Ok(self.buildings.lock().unwrap().get(id).cloned())
    }

    async fn update(&self, building: &Building) -> Result<(), AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        if !buildings.contains_key(&building.id) {
            return Err(AppError::NotFound(anyhow::anyhow!("Building not found")));
        }
        buildings.insert(building.id.clone(), building.clone());
        Ok(())
    }

    async fn add_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        let building = buildings
            .get_mut(building_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Building not found")))?;
        building.amenities.push(amenity.clone());
        building.last_updated_by = Some(updated_by.clone());
        Ok(())
    }

    async fn update_amenity(
        &self,
        building_id: &str,
        amenity: &Amenity,
        updated_by: &ActorStamp,
    ) -> Result<(), AppError> {
        let mut buildings = self.buildings.lock().unwrap();
        let building = buildings
            .get_mut(building_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Building not found")))?;
        let slot = building
            .amenities
            .iter_mut()
            .find(|a| a.id == amenity.id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Amenity not found")))?;
        *slot = amenity.clone();
        building.last_updated_by = Some(updated_by.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{AccountType, RoleFlags};

    fn account(email: &str) -> Account {
        Account::new(
            "Test".to_string(),
            "Account".to_string(),
            email.to_string(),
            "$argon2id$stub".to_string(),
            AccountType::User,
            RoleFlags::resident(),
            None,
        )
    }

    #[tokio::test]
    async fn test_memory_account_store_rejects_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.insert(&account("dup@example.com")).await.unwrap();

        let err = store.insert(&account("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_consume_removes_all_records_for_account() {
        let store = MemoryHashStore::new();
        let first = store.create("account-1").await.unwrap();
        let second = store.create("account-1").await.unwrap();
        let other = store.create("account-2").await.unwrap();

        store.consume(&first).await.unwrap();

        // Redeeming one link invalidates the account's other link too.
        assert!(store.resolve(&second).await.unwrap().is_none());
        assert_eq!(store.resolve(&other).await.unwrap().unwrap(), "account-2");
    }

    #[tokio::test]
    async fn test_consume_unknown_hash_is_noop() {
        let store = MemoryHashStore::new();
        store.create("account-1").await.unwrap();

        store.consume("deadbeef").await.unwrap();
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_update_amenity_missing_is_not_found() {
        let store = MemoryBuildingStore::new();
        let building = Building::new("Maple".to_string(), "12 Elm".to_string(), 10, None);
        store.insert(&building).await.unwrap();

        let amenity = Amenity::new("Gym".to_string(), "Ground floor".to_string());
        let stamp = ActorStamp {
            account_id: "actor".to_string(),
            name: "Actor".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let err = store
            .update_amenity(&building.id, &amenity, &stamp)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
