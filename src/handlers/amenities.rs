use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::buildings::{CreateAmenityRequest, UpdateAmenityRequest};
use crate::error::AppError;
use crate::middleware::CurrentAccount;
use crate::models::Amenity;
use crate::utils::ValidatedJson;
use crate::AppState;

/// List a building's amenities
#[utoipa::path(
    get,
    path = "/building/{building_id}/amenities/search",
    params(("building_id" = String, Path, description = "Building id")),
    responses(
        (status = 200, description = "Amenities of the building", body = [Amenity]),
        (status = 404, description = "No such building", body = ErrorResponse)
    ),
    tag = "Amenities",
    security(("bearer_auth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
) -> Result<Json<Vec<Amenity>>, AppError> {
    Ok(Json(state.buildings.amenities(&building_id).await?))
}

/// Look up one amenity
#[utoipa::path(
    get,
    path = "/building/{building_id}/amenities/search/{amenity_id}",
    params(
        ("building_id" = String, Path, description = "Building id"),
        ("amenity_id" = String, Path, description = "Amenity id")
    ),
    responses(
        (status = 200, description = "Amenity found", body = Amenity),
        (status = 404, description = "Building or amenity missing", body = ErrorResponse)
    ),
    tag = "Amenities",
    security(("bearer_auth" = []))
)]
pub async fn find(
    State(state): State<AppState>,
    Path((building_id, amenity_id)): Path<(String, String)>,
) -> Result<Json<Amenity>, AppError> {
    Ok(Json(
        state.buildings.find_amenity(&building_id, &amenity_id).await?,
    ))
}

/// Add an amenity to a building
#[utoipa::path(
    put,
    path = "/building/{building_id}/amenities/create",
    params(("building_id" = String, Path, description = "Building id")),
    request_body = CreateAmenityRequest,
    responses(
        (status = 201, description = "Amenity added", body = Amenity),
        (status = 404, description = "No such building", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Amenities",
    security(("bearer_auth" = []))
)]
pub async fn create(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Path(building_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateAmenityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let amenity = state.buildings.add_amenity(&actor, &building_id, req).await?;
    Ok((StatusCode::CREATED, Json(amenity)))
}

/// Update an amenity
#[utoipa::path(
    put,
    path = "/building/{building_id}/amenities/update/{amenity_id}",
    params(
        ("building_id" = String, Path, description = "Building id"),
        ("amenity_id" = String, Path, description = "Amenity id")
    ),
    request_body = UpdateAmenityRequest,
    responses(
        (status = 200, description = "Amenity updated", body = Amenity),
        (status = 404, description = "Building or amenity missing", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Amenities",
    security(("bearer_auth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Path((building_id, amenity_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateAmenityRequest>,
) -> Result<Json<Amenity>, AppError> {
    Ok(Json(
        state
            .buildings
            .update_amenity(&actor, &building_id, &amenity_id, req)
            .await?,
    ))
}
