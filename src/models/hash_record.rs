use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single-use opaque credential backing an emailed link, collection
/// `hash_records`.
///
/// The hash value is what link tokens carry as their subject; redeeming one
/// deletes every record owned by the same account. A TTL index on
/// `created_at` expires records that are never redeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub hash: String,
    pub account_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl HashRecord {
    pub fn new(account_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            hash: generate_hash_value(),
            account_id: account_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 256 bits of CSPRNG output, hex encoded.
pub fn generate_hash_value() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
