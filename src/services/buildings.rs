//! Building and amenity records, plus building-to-account assignment.

use std::sync::Arc;

use crate::dtos::buildings::{
    CreateAmenityRequest, CreateBuildingRequest, UpdateAmenityRequest, UpdateBuildingRequest,
};
use crate::error::AppError;
use crate::models::{
    Account, AccountType, ActorStamp, Amenity, AssignedBuilding, Building,
};
use crate::services::store::{AccountStore, BuildingStore};

#[derive(Clone)]
pub struct BuildingService {
    buildings: Arc<dyn BuildingStore>,
    accounts: Arc<dyn AccountStore>,
}

impl BuildingService {
    pub fn new(buildings: Arc<dyn BuildingStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            buildings,
            accounts,
        }
    }

    pub async fn list(&self) -> Result<Vec<Building>, AppError> {
        self.buildings.list().await
    }

    pub async fn find(&self, id: &str) -> Result<Building, AppError> {
        self.buildings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Building not found")))
    }

    pub async fn create(
        &self,
        actor: &Account,
        req: CreateBuildingRequest,
    ) -> Result<Building, AppError> {
        let building = Building::new(
            req.name,
            req.address,
            req.number_of_units,
            Some(ActorStamp::of(actor)),
        );

        self.buildings.insert(&building).await?;

        tracing::info!(building_id = %building.id, "Building created");
        Ok(building)
    }

    /// Overwrite the building's fields. Deactivation is reserved to
    /// superadmins; admins may make any other change.
    pub async fn update(
        &self,
        actor: &Account,
        id: &str,
        req: UpdateBuildingRequest,
    ) -> Result<Building, AppError> {
        let current = self.find(id).await?;

        if !req.is_active && actor.account_type != AccountType::Superadmin {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Superadmin access required to deactivate a building"
            )));
        }

        let mut updated = current;
        updated.name = req.name;
        updated.address = req.address;
        updated.number_of_units = req.number_of_units;
        updated.is_active = req.is_active;
        updated.last_updated_by = Some(ActorStamp::of(actor));

        self.buildings.update(&updated).await?;

        tracing::info!(building_id = %updated.id, "Building updated");
        Ok(updated)
    }

    /// Attach a building reference to an account. Both sides must exist;
    /// assigning the same building twice is a conflict.
    pub async fn assign(
        &self,
        actor: &Account,
        account_id: &str,
        building_id: &str,
    ) -> Result<(), AppError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;

        let building = self.find(building_id).await?;

        if account.buildings.iter().any(|b| b.building_id == building.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Building is already assigned to this account"
            )));
        }

        let assigned = AssignedBuilding {
            building_id: building.id.clone(),
            name: building.name.clone(),
        };
        self.accounts
            .add_building(&account.id, &assigned, &ActorStamp::of(actor))
            .await?;

        tracing::info!(
            account_id = %account.id,
            building_id = %building.id,
            "Building assigned to account"
        );
        Ok(())
    }

    pub async fn amenities(&self, building_id: &str) -> Result<Vec<Amenity>, AppError> {
        Ok(self.find(building_id).await?.amenities)
    }

    pub async fn find_amenity(
        &self,
        building_id: &str,
        amenity_id: &str,
    ) -> Result<Amenity, AppError> {
        let building = self.find(building_id).await?;
        building
            .amenity(amenity_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Amenity not found")))
    }

    pub async fn add_amenity(
        &self,
        actor: &Account,
        building_id: &str,
        req: CreateAmenityRequest,
    ) -> Result<Amenity, AppError> {
        // Existence check first so a miss reads as 404, not a silent no-op.
        let building = self.find(building_id).await?;

        let amenity = Amenity::new(req.name, req.description);
        self.buildings
            .add_amenity(&building.id, &amenity, &ActorStamp::of(actor))
            .await?;

        tracing::info!(
            building_id = %building.id,
            amenity_id = %amenity.id,
            "Amenity added"
        );
        Ok(amenity)
    }

    pub async fn update_amenity(
        &self,
        actor: &Account,
        building_id: &str,
        amenity_id: &str,
        req: UpdateAmenityRequest,
    ) -> Result<Amenity, AppError> {
        let building = self.find(building_id).await?;
        let mut amenity = building
            .amenity(amenity_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Amenity not found")))?;

        amenity.name = req.name;
        amenity.description = req.description;
        amenity.is_active = req.is_active;

        self.buildings
            .update_amenity(&building.id, &amenity, &ActorStamp::of(actor))
            .await?;

        tracing::info!(
            building_id = %building.id,
            amenity_id = %amenity.id,
            "Amenity updated"
        );
        Ok(amenity)
    }
}
