use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::buildings::{
    AssignBuildingResponse, CreateBuildingRequest, UpdateBuildingRequest,
};
use crate::error::AppError;
use crate::middleware::CurrentAccount;
use crate::models::Building;
use crate::utils::ValidatedJson;
use crate::AppState;

/// List every building
#[utoipa::path(
    get,
    path = "/admin/building/list",
    responses(
        (status = 200, description = "All buildings", body = [Building])
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Building>>, AppError> {
    Ok(Json(state.buildings.list().await?))
}

/// Look up a building by id
#[utoipa::path(
    get,
    path = "/admin/building/search/{id}",
    params(("id" = String, Path, description = "Building id")),
    responses(
        (status = 200, description = "Building found", body = Building),
        (status = 404, description = "No such building", body = ErrorResponse)
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Building>, AppError> {
    Ok(Json(state.buildings.find(&id).await?))
}

/// Create a building
#[utoipa::path(
    post,
    path = "/admin/building/create",
    request_body = CreateBuildingRequest,
    responses(
        (status = 201, description = "Building created", body = Building),
        (status = 409, description = "Address already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
pub async fn create(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    ValidatedJson(req): ValidatedJson<CreateBuildingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let building = state.buildings.create(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

/// Update a building
#[utoipa::path(
    put,
    path = "/admin/building/update/{id}",
    params(("id" = String, Path, description = "Building id")),
    request_body = UpdateBuildingRequest,
    responses(
        (status = 200, description = "Building updated", body = Building),
        (status = 403, description = "Deactivation requires superadmin", body = ErrorResponse),
        (status = 404, description = "No such building", body = ErrorResponse)
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBuildingRequest>,
) -> Result<Json<Building>, AppError> {
    Ok(Json(state.buildings.update(&actor, &id, req).await?))
}

/// Assign a building to an account
#[utoipa::path(
    put,
    path = "/admin/building/assign/{account_id}/{building_id}",
    params(
        ("account_id" = String, Path, description = "Account id"),
        ("building_id" = String, Path, description = "Building id")
    ),
    responses(
        (status = 200, description = "Building assigned", body = AssignBuildingResponse),
        (status = 404, description = "Account or building missing", body = ErrorResponse),
        (status = 409, description = "Already assigned", body = ErrorResponse)
    ),
    tag = "Buildings",
    security(("bearer_auth" = []))
)]
pub async fn assign(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Path((account_id, building_id)): Path<(String, String)>,
) -> Result<Json<AssignBuildingResponse>, AppError> {
    state
        .buildings
        .assign(&actor, &account_id, &building_id)
        .await?;
    Ok(Json(AssignBuildingResponse {
        account_id,
        building_id,
        message: "Building assigned".to_string(),
    }))
}
