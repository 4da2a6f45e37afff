//! In-memory implementation of [`PropertyRepository`]
//!
//! Used when no `DATABASE_URL` is configured and by the test suite. A single
//! mutex guards the whole tree, so every operation is atomic.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use super::{PropertyRepository, RepositoryError, RepositoryResult};
use crate::domain::{
    numbering, Building, BuildingWithProperty, BuildingWithUnits, NewBuilding, NewProperty,
    NewUnitBatch, Property, PropertyDetail, PropertySummary, Unit, UnitWithBuilding,
};

#[derive(Default)]
struct Tables {
    properties: Vec<Property>,
    buildings: Vec<Building>,
    units: Vec<Unit>,
}

impl Tables {
    fn property(&self, id: Uuid) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    fn building(&self, id: Uuid) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    fn building_with_property(&self, id: Uuid) -> Option<BuildingWithProperty> {
        let building = self.building(id)?.clone();
        let property = self.property(building.property_id)?.clone();
        Some(BuildingWithProperty { building, property })
    }

    fn units_of(&self, building_id: Uuid) -> Vec<Unit> {
        let mut units: Vec<Unit> = self
            .units
            .iter()
            .filter(|u| u.building_id == building_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));
        units
    }

    // Buildings are appended in creation order
    fn buildings_of(&self, property_id: Uuid) -> Vec<Building> {
        self.buildings
            .iter()
            .filter(|b| b.property_id == property_id)
            .cloned()
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyRepository for MemoryRepository {
    async fn list_properties(&self) -> RepositoryResult<Vec<PropertySummary>> {
        let tables = self.tables.lock();
        let mut properties: Vec<PropertySummary> = tables
            .properties
            .iter()
            .cloned()
            .map(PropertySummary::from)
            .collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(properties)
    }

    async fn get_property(&self, id: Uuid) -> RepositoryResult<Option<PropertyDetail>> {
        let tables = self.tables.lock();
        let Some(property) = tables.property(id).cloned() else {
            return Ok(None);
        };

        let buildings = tables
            .buildings_of(id)
            .into_iter()
            .map(|building| BuildingWithUnits {
                units: tables.units_of(building.id),
                building,
            })
            .collect();

        Ok(Some(PropertyDetail {
            property,
            buildings,
        }))
    }

    async fn create_property(&self, input: NewProperty) -> RepositoryResult<Property> {
        let mut tables = self.tables.lock();
        let prefix = input.management_type.prefix();

        let last = tables
            .properties
            .iter()
            .filter(|p| p.management_type == input.management_type)
            .map(|p| p.unique_number.as_str())
            .filter(|n| n.starts_with(prefix))
            .max_by(|a, b| numbering::compare_unique_numbers(a, b));
        let unique_number = numbering::next_unique_number(prefix, last);

        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            unique_number,
            name: input.name,
            management_type: input.management_type,
            property_manager_id: input.property_manager_id,
            accountant_id: input.accountant_id,
            declaration_of_division: input.declaration_of_division,
            created_at: now,
            updated_at: now,
        };
        tables.properties.push(property.clone());

        Ok(property)
    }

    async fn delete_property(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut tables = self.tables.lock();
        let before = tables.properties.len();
        tables.properties.retain(|p| p.id != id);
        if tables.properties.len() == before {
            return Ok(false);
        }

        let building_ids: Vec<Uuid> = tables
            .buildings
            .iter()
            .filter(|b| b.property_id == id)
            .map(|b| b.id)
            .collect();
        tables.buildings.retain(|b| b.property_id != id);
        tables.units.retain(|u| !building_ids.contains(&u.building_id));

        Ok(true)
    }

    async fn create_building(&self, input: NewBuilding) -> RepositoryResult<Building> {
        let mut tables = self.tables.lock();
        if tables.property(input.property_id).is_none() {
            return Err(RepositoryError::NotFound("Property"));
        }

        let now = Utc::now();
        let building = Building {
            id: Uuid::new_v4(),
            property_id: input.property_id,
            address: input.address,
            additional_details: input.additional_details,
            created_at: now,
            updated_at: now,
        };
        tables.buildings.push(building.clone());

        Ok(building)
    }

    async fn get_building(&self, id: Uuid) -> RepositoryResult<Option<BuildingWithProperty>> {
        Ok(self.tables.lock().building_with_property(id))
    }

    async fn list_buildings_by_property(&self, property_id: Uuid) -> RepositoryResult<Vec<Building>> {
        Ok(self.tables.lock().buildings_of(property_id))
    }

    async fn create_units_bulk(&self, batch: NewUnitBatch) -> RepositoryResult<Vec<Unit>> {
        let mut tables = self.tables.lock();
        if tables.building(batch.building_id).is_none() {
            return Err(RepositoryError::NotFound("Building"));
        }

        let taken = tables.units.iter().any(|existing| {
            existing.building_id == batch.building_id
                && batch
                    .units
                    .iter()
                    .any(|u| u.unit_number == existing.unit_number)
        });
        if taken {
            return Err(RepositoryError::Conflict(
                "A unit with one of these unit numbers already exists in the building".to_string(),
            ));
        }

        let now = Utc::now();
        let mut inserted: Vec<Unit> = batch
            .units
            .into_iter()
            .map(|u| Unit {
                id: Uuid::new_v4(),
                building_id: batch.building_id,
                unit_number: u.unit_number,
                unit_type: u.unit_type,
                floor: u.floor,
                entrance: u.entrance,
                size_sqm: u.size_sqm,
                co_ownership_share: u.co_ownership_share,
                construction_year: u.construction_year,
                rooms: u.rooms,
                created_at: now,
                updated_at: now,
            })
            .collect();
        tables.units.extend(inserted.iter().cloned());

        inserted.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));
        Ok(inserted)
    }

    async fn list_units_by_building(&self, building_id: Uuid) -> RepositoryResult<Vec<Unit>> {
        Ok(self.tables.lock().units_of(building_id))
    }

    async fn get_unit(&self, id: Uuid) -> RepositoryResult<Option<UnitWithBuilding>> {
        let tables = self.tables.lock();
        let Some(unit) = tables.units.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };

        Ok(tables
            .building_with_property(unit.building_id)
            .map(|building| UnitWithBuilding { unit, building }))
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
