pub mod ai;
pub mod buildings;
pub mod health;
pub mod properties;
pub mod units;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::repository::PropertyRepository;

/// Headroom for multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the API router with all routes
pub fn api_router<R: PropertyRepository>(max_upload_bytes: usize) -> Router<Arc<AppState<R>>> {
    Router::new()
        .route("/health", get(health::health_check::<R>))
        // Properties
        .route(
            "/properties",
            get(properties::list_properties::<R>).post(properties::create_property::<R>),
        )
        .route(
            "/properties/:id",
            get(properties::get_property::<R>).delete(properties::delete_property::<R>),
        )
        // Buildings
        .route("/buildings", post(buildings::create_building::<R>))
        .route("/buildings/:id", get(buildings::get_building::<R>))
        .route(
            "/buildings/property/:property_id",
            get(buildings::list_buildings_by_property::<R>),
        )
        // Units
        .route("/units/bulk", post(units::create_units_bulk::<R>))
        .route(
            "/units/building/:building_id",
            get(units::list_units_by_building::<R>),
        )
        .route("/units/:id", get(units::get_unit::<R>))
        // AI document parsing
        .route(
            "/ai/parse-file",
            post(ai::parse_file::<R>)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
}
