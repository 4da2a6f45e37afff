use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use std::sync::Arc;

use crate::api::Created;
use crate::app::AppState;
use crate::domain::{Building, BuildingWithProperty, CreateBuildingRequest, RecordId};
use crate::error::{ApiError, ApiResult};
use crate::repository::PropertyRepository;

/// Create a building under an existing property
pub async fn create_building<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<CreateBuildingRequest>, JsonRejection>,
) -> ApiResult<Created<Building>> {
    let Json(req) = payload?;
    let input = req.validate().map_err(|e| ApiError::Validation(e.0))?;

    let building = state.repo.create_building(input).await?;

    tracing::info!(
        building_id = %building.id,
        property_id = %building.property_id,
        "Created building"
    );

    Ok(Created(building))
}

/// Get a building with its property
pub async fn get_building<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<BuildingWithProperty>> {
    let Path(RecordId(building_id)) = path?;

    state
        .repo
        .get_building(building_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Building not found"))
}

/// Buildings of a property, oldest first
pub async fn list_buildings_by_property<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<Vec<Building>>> {
    let Path(RecordId(property_id)) = path?;
    Ok(Json(state.repo.list_buildings_by_property(property_id).await?))
}
