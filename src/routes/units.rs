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
use crate::domain::{
    BulkCreateUnitsRequest, BulkCreateUnitsResponse, RecordId, Unit, UnitWithBuilding,
};
use crate::error::{ApiError, ApiResult};
use crate::repository::PropertyRepository;

/// Insert a batch of units into one building, all or nothing
pub async fn create_units_bulk<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<BulkCreateUnitsRequest>, JsonRejection>,
) -> ApiResult<Created<BulkCreateUnitsResponse>> {
    let Json(req) = payload?;
    let batch = req.validate().map_err(|e| ApiError::Validation(e.0))?;
    let building_id = batch.building_id;

    let units = state.repo.create_units_bulk(batch).await?;

    tracing::info!(
        building_id = %building_id,
        count = units.len(),
        "Created units"
    );

    Ok(Created(units.into()))
}

/// Units of a building, ordered by unit number
pub async fn list_units_by_building<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<Vec<Unit>>> {
    let Path(RecordId(building_id)) = path?;
    Ok(Json(state.repo.list_units_by_building(building_id).await?))
}

/// Get a unit with its building and property
pub async fn get_unit<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<UnitWithBuilding>> {
    let Path(RecordId(unit_id)) = path?;

    state
        .repo
        .get_unit(unit_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Unit not found"))
}
