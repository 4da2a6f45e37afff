use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use std::sync::Arc;

use crate::api::{Created, NoContent};
use crate::app::AppState;
use crate::domain::{
    CreatePropertyRequest, Property, PropertyDetail, PropertySummary, RecordId,
};
use crate::error::{ApiError, ApiResult};
use crate::repository::PropertyRepository;

/// List all properties, ordered by name
pub async fn list_properties<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> ApiResult<Json<Vec<PropertySummary>>> {
    let properties = state.repo.list_properties().await?;
    tracing::debug!(count = properties.len(), "Listing properties");
    Ok(Json(properties))
}

/// Get a property with its buildings and units
pub async fn get_property<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<Json<PropertyDetail>> {
    let Path(RecordId(property_id)) = path?;

    state
        .repo
        .get_property(property_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Property not found"))
}

/// Create a property; the unique number is allocated by the store
pub async fn create_property<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> ApiResult<Created<Property>> {
    let Json(req) = payload?;
    let input = req.validate().map_err(|e| ApiError::Validation(e.0))?;

    let property = state.repo.create_property(input).await?;

    tracing::info!(
        property_id = %property.id,
        unique_number = %property.unique_number,
        "Created property"
    );

    Ok(Created(property))
}

/// Delete a property together with its buildings and units
pub async fn delete_property<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    path: Result<Path<RecordId>, PathRejection>,
) -> ApiResult<NoContent> {
    let Path(RecordId(property_id)) = path?;

    if !state.repo.delete_property(property_id).await? {
        return Err(ApiError::not_found("Property not found"));
    }

    tracing::info!(property_id = %property_id, "Deleted property");
    Ok(NoContent)
}
