use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateBuildingRequest {
    #[validate(length(min = 1, message = "Building name is required"))]
    #[schema(example = "Maple Residency")]
    pub name: String,

    #[validate(length(min = 1, message = "Address is required"))]
    #[schema(example = "12 Elm Street, Pune")]
    pub address: String,

    #[validate(range(min = 1, message = "A building needs at least one unit"))]
    #[schema(example = 120)]
    pub number_of_units: u32,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateBuildingRequest {
    #[validate(length(min = 1, message = "Building name is required"))]
    #[schema(example = "Maple Residency")]
    pub name: String,

    #[validate(length(min = 1, message = "Address is required"))]
    #[schema(example = "12 Elm Street, Pune")]
    pub address: String,

    #[validate(range(min = 1, message = "A building needs at least one unit"))]
    #[schema(example = 120)]
    pub number_of_units: u32,

    #[schema(example = true)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateAmenityRequest {
    #[validate(length(min = 1, message = "Amenity name is required"))]
    #[schema(example = "Swimming Pool")]
    pub name: String,

    #[schema(example = "Open 6am to 10pm")]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateAmenityRequest {
    #[validate(length(min = 1, message = "Amenity name is required"))]
    #[schema(example = "Swimming Pool")]
    pub name: String,

    #[schema(example = "Closed for maintenance")]
    pub description: String,

    #[schema(example = false)]
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignBuildingResponse {
    pub account_id: String,
    pub building_id: String,
    #[schema(example = "Building assigned")]
    pub message: String,
}
