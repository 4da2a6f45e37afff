//! Persistence for properties, buildings and units
//!
//! [`PropertyRepository`] is the seam between the HTTP layer and storage.
//! [`PgRepository`] backs production; [`MemoryRepository`] serves local runs
//! without a database and the test suite.

pub mod memory;
pub mod postgres;

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Building, BuildingWithProperty, NewBuilding, NewProperty, NewUnitBatch, Property,
    PropertyDetail, PropertySummary, Unit, UnitWithBuilding,
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A referenced parent entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Actions on the property tree (Property 1:N Building 1:N Unit)
pub trait PropertyRepository: Clone + Send + Sync + 'static {
    /// All properties, ordered by name
    fn list_properties(&self) -> impl Future<Output = RepositoryResult<Vec<PropertySummary>>> + Send;

    /// Property with buildings (by creation time) and units (by unit number)
    fn get_property(
        &self,
        id: Uuid,
    ) -> impl Future<Output = RepositoryResult<Option<PropertyDetail>>> + Send;

    /// Allocates the next unique number for the management type and inserts
    /// the property. Allocation is serialized per prefix.
    fn create_property(
        &self,
        input: NewProperty,
    ) -> impl Future<Output = RepositoryResult<Property>> + Send;

    /// Deletes a property together with its buildings and units.
    /// Returns false when nothing was deleted.
    fn delete_property(&self, id: Uuid) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Fails with `NotFound("Property")` when the owning property is absent
    fn create_building(
        &self,
        input: NewBuilding,
    ) -> impl Future<Output = RepositoryResult<Building>> + Send;

    fn get_building(
        &self,
        id: Uuid,
    ) -> impl Future<Output = RepositoryResult<Option<BuildingWithProperty>>> + Send;

    fn list_buildings_by_property(
        &self,
        property_id: Uuid,
    ) -> impl Future<Output = RepositoryResult<Vec<Building>>> + Send;

    /// Inserts the whole batch or nothing. Returns exactly the inserted rows,
    /// sorted by unit number. Fails with `NotFound("Building")` before any
    /// write when the building is absent.
    fn create_units_bulk(
        &self,
        batch: NewUnitBatch,
    ) -> impl Future<Output = RepositoryResult<Vec<Unit>>> + Send;

    fn list_units_by_building(
        &self,
        building_id: Uuid,
    ) -> impl Future<Output = RepositoryResult<Vec<Unit>>> + Send;

    fn get_unit(
        &self,
        id: Uuid,
    ) -> impl Future<Output = RepositoryResult<Option<UnitWithBuilding>>> + Send;

    /// Lightweight connectivity check
    fn health_check(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}
