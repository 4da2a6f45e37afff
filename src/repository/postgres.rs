//! PostgreSQL implementation of [`PropertyRepository`]


use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{PropertyRepository, RepositoryError, RepositoryResult};
use crate::domain::{
    numbering, Address, Building, BuildingWithProperty, BuildingWithUnits, DeclarationOfDivision,
    ManagementType, NewBuilding, NewProperty, NewUnitBatch, Property, PropertyDetail,
    PropertySummary, Unit, UnitType, UnitWithBuilding,
};

/// Rows per INSERT statement; keeps bind parameters far below the protocol limit
const UNIT_INSERT_CHUNK: usize = 1000;

const PROPERTY_COLUMNS: &str = "id, unique_number, name, management_type, property_manager_id, \
     accountant_id, declaration_of_division, created_at, updated_at";

const BUILDING_COLUMNS: &str = "id, property_id, address, additional_details, created_at, updated_at";

const UNIT_COLUMNS: &str = "id, building_id, unit_number, unit_type, floor, entrance, size_sqm, \
     co_ownership_share, construction_year, rooms, created_at, updated_at";

// ============================================================================
// Database Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    unique_number: String,
    name: String,
    management_type: String,
    property_manager_id: String,
    accountant_id: String,
    declaration_of_division: Option<Json<DeclarationOfDivision>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Self {
            id: row.id,
            unique_number: row.unique_number,
            name: row.name,
            management_type: ManagementType::parse(&row.management_type).unwrap_or_default(),
            property_manager_id: row.property_manager_id,
            accountant_id: row.accountant_id,
            declaration_of_division: row.declaration_of_division.map(|d| d.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PropertySummaryRow {
    id: Uuid,
    unique_number: String,
    name: String,
    management_type: String,
}

impl From<PropertySummaryRow> for PropertySummary {
    fn from(row: PropertySummaryRow) -> Self {
        Self {
            id: row.id,
            unique_number: row.unique_number,
            name: row.name,
            management_type: ManagementType::parse(&row.management_type).unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BuildingRow {
    id: Uuid,
    property_id: Uuid,
    address: Json<Address>,
    additional_details: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        Self {
            id: row.id,
            property_id: row.property_id,
            address: row.address.0,
            additional_details: row.additional_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UnitRow {
    id: Uuid,
    building_id: Uuid,
    unit_number: String,
    unit_type: String,
    floor: Option<String>,
    entrance: Option<String>,
    size_sqm: f64,
    co_ownership_share: f64,
    construction_year: Option<i32>,
    rooms: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Self {
            id: row.id,
            building_id: row.building_id,
            unit_number: row.unit_number,
            unit_type: UnitType::parse(&row.unit_type).unwrap_or_default(),
            floor: row.floor,
            entrance: row.entrance,
            size_sqm: row.size_sqm,
            co_ownership_share: row.co_ownership_share,
            construction_year: row.construction_year,
            rooms: row.rooms,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Wrapper around a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_property(&self, id: Uuid) -> RepositoryResult<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    async fn fetch_building(&self, id: Uuid) -> RepositoryResult<Option<BuildingWithProperty>> {
        let Some(row) = sqlx::query_as::<_, BuildingRow>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let building = Building::from(row);
        let Some(property) = self.fetch_property(building.property_id).await? else {
            return Ok(None);
        };

        Ok(Some(BuildingWithProperty { building, property }))
    }

    /// Greatest allocated number for a prefix; caller holds the prefix lock
    async fn last_unique_number(
        tx: &mut Transaction<'_, Postgres>,
        management_type: ManagementType,
    ) -> RepositoryResult<Option<String>> {
        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT unique_number FROM properties
            WHERE management_type = $1 AND unique_number LIKE $2
            ORDER BY length(unique_number) DESC, unique_number COLLATE "C" DESC
            LIMIT 1
            "#,
        )
        .bind(management_type.as_str())
        .bind(format!("{}%", management_type.prefix()))
        .fetch_optional(&mut **tx)
        .await?;

        Ok(last)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl PropertyRepository for PgRepository {
    async fn list_properties(&self) -> RepositoryResult<Vec<PropertySummary>> {
        let rows = sqlx::query_as::<_, PropertySummaryRow>(
            "SELECT id, unique_number, name, management_type FROM properties ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PropertySummary::from).collect())
    }

    async fn get_property(&self, id: Uuid) -> RepositoryResult<Option<PropertyDetail>> {
        let Some(property) = self.fetch_property(id).await? else {
            return Ok(None);
        };

        let buildings = self.list_buildings_by_property(id).await?;
        let building_ids: Vec<Uuid> = buildings.iter().map(|b| b.id).collect();

        let unit_rows = sqlx::query_as::<_, UnitRow>(&format!(
            r#"SELECT {UNIT_COLUMNS} FROM units
            WHERE building_id = ANY($1)
            ORDER BY unit_number COLLATE "C" ASC"#
        ))
        .bind(&building_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut units_by_building: HashMap<Uuid, Vec<Unit>> = HashMap::new();
        for row in unit_rows {
            let unit = Unit::from(row);
            units_by_building.entry(unit.building_id).or_default().push(unit);
        }

        let buildings = buildings
            .into_iter()
            .map(|building| BuildingWithUnits {
                units: units_by_building.remove(&building.id).unwrap_or_default(),
                building,
            })
            .collect();

        Ok(Some(PropertyDetail {
            property,
            buildings,
        }))
    }

    async fn create_property(&self, input: NewProperty) -> RepositoryResult<Property> {
        let prefix = input.management_type.prefix();
        let mut tx = self.pool.begin().await?;

        // Serializes number allocation per prefix until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(prefix)
            .execute(&mut *tx)
            .await?;

        let last = Self::last_unique_number(&mut tx, input.management_type).await?;
        let unique_number = numbering::next_unique_number(prefix, last.as_deref());

        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            r#"
            INSERT INTO properties (id, unique_number, name, management_type,
                                    property_manager_id, accountant_id, declaration_of_division)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&unique_number)
        .bind(&input.name)
        .bind(input.management_type.as_str())
        .bind(&input.property_manager_id)
        .bind(&input.accountant_id)
        .bind(input.declaration_of_division.map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("Unique number {unique_number} already exists"))
            } else {
                RepositoryError::Database(e)
            }
        })?;

        tx.commit().await?;

        tracing::debug!(unique_number = %row.unique_number, "Allocated property number");
        Ok(row.into())
    }

    async fn delete_property(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_building(&self, input: NewBuilding) -> RepositoryResult<Building> {
        let row = sqlx::query_as::<_, BuildingRow>(&format!(
            r#"
            INSERT INTO buildings (id, property_id, address, additional_details)
            VALUES ($1, $2, $3, $4)
            RETURNING {BUILDING_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.property_id)
        .bind(Json(&input.address))
        .bind(&input.additional_details)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RepositoryError::NotFound("Property")
            } else {
                RepositoryError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    async fn get_building(&self, id: Uuid) -> RepositoryResult<Option<BuildingWithProperty>> {
        self.fetch_building(id).await
    }

    async fn list_buildings_by_property(&self, property_id: Uuid) -> RepositoryResult<Vec<Building>> {
        let rows = sqlx::query_as::<_, BuildingRow>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE property_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn create_units_bulk(&self, batch: NewUnitBatch) -> RepositoryResult<Vec<Unit>> {
        let mut tx = self.pool.begin().await?;

        let building: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM buildings WHERE id = $1 FOR KEY SHARE")
                .bind(batch.building_id)
                .fetch_optional(&mut *tx)
                .await?;
        if building.is_none() {
            return Err(RepositoryError::NotFound("Building"));
        }

        let mut inserted = Vec::with_capacity(batch.units.len());
        for chunk in batch.units.chunks(UNIT_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO units (id, building_id, unit_number, unit_type, floor, entrance, \
                 size_sqm, co_ownership_share, construction_year, rooms) ",
            );
            builder.push_values(chunk, |mut row, unit| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(batch.building_id)
                    .push_bind(unit.unit_number.clone())
                    .push_bind(unit.unit_type.as_str())
                    .push_bind(unit.floor.clone())
                    .push_bind(unit.entrance.clone())
                    .push_bind(unit.size_sqm)
                    .push_bind(unit.co_ownership_share)
                    .push_bind(unit.construction_year)
                    .push_bind(unit.rooms);
            });
            builder.push(format!(" RETURNING {UNIT_COLUMNS}"));

            let rows = builder
                .build_query_as::<UnitRow>()
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        RepositoryError::Conflict(
                            "A unit with one of these unit numbers already exists in the building"
                                .to_string(),
                        )
                    } else {
                        RepositoryError::Database(e)
                    }
                })?;
            inserted.extend(rows.into_iter().map(Unit::from));
        }

        tx.commit().await?;

        inserted.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));
        Ok(inserted)
    }

    async fn list_units_by_building(&self, building_id: Uuid) -> RepositoryResult<Vec<Unit>> {
        let rows = sqlx::query_as::<_, UnitRow>(&format!(
            r#"SELECT {UNIT_COLUMNS} FROM units WHERE building_id = $1 ORDER BY unit_number COLLATE "C" ASC"#
        ))
        .bind(building_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Unit::from).collect())
    }

    async fn get_unit(&self, id: Uuid) -> RepositoryResult<Option<UnitWithBuilding>> {
        let Some(row) = sqlx::query_as::<_, UnitRow>(&format!(
            "SELECT {UNIT_COLUMNS} FROM units WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let unit = Unit::from(row);
        let Some(building) = self.fetch_building(unit.building_id).await? else {
            return Ok(None);
        };

        Ok(Some(UnitWithBuilding { unit, building }))
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
