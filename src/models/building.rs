use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::account::ActorStamp;

/// Amenity nested on a building document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Amenity {
    pub id: String,
    #[schema(example = "Swimming Pool")]
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

impl Amenity {
    pub fn new(name: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            is_active: true,
        }
    }
}

/// Building document, collection `buildings`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Building {
    #[serde(rename = "_id")]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    #[schema(example = "Maple Residency")]
    pub name: String,
    pub address: String,
    pub number_of_units: u32,
    pub is_active: bool,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<ActorStamp>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Building {
    pub fn new(
        name: String,
        address: String,
        number_of_units: u32,
        created_by: Option<ActorStamp>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            address,
            number_of_units,
            is_active: true,
            amenities: Vec::new(),
            created_by,
            last_updated_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn amenity(&self, amenity_id: &str) -> Option<&Amenity> {
        self.amenities.iter().find(|a| a.id == amenity_id)
    }
}
