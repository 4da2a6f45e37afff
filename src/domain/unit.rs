use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::{non_blank, BuildingWithProperty, RecordId, ValidationError};

/// Unit type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnitType {
    Apartment,
    Office,
    Garden,
    Parking,
}

impl Default for UnitType {
    fn default() -> Self {
        Self::Apartment
    }
}

impl UnitType {
    pub const ALL: [UnitType; 4] = [Self::Apartment, Self::Office, Self::Garden, Self::Parking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "Apartment",
            Self::Office => "Office",
            Self::Garden => "Garden",
            Self::Parking => "Parking",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Unit entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    pub building_id: Uuid,
    pub unit_number: String,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance: Option<String>,
    pub size_sqm: f64,
    pub co_ownership_share: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unit with its building and that building's property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnitWithBuilding {
    #[serde(flatten)]
    pub unit: Unit,
    pub building: BuildingWithProperty,
}

/// Unit descriptor as submitted in a bulk request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitInput {
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default, rename = "type")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub entrance: Option<String>,
    #[serde(default)]
    pub size_sqm: Option<f64>,
    #[serde(default)]
    pub co_ownership_share: Option<f64>,
    #[serde(default)]
    pub construction_year: Option<i32>,
    #[serde(default)]
    pub rooms: Option<f64>,
}

/// Raw request body for bulk unit creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateUnitsRequest {
    #[serde(default)]
    pub building_id: Option<RecordId>,
    #[serde(default)]
    pub units: Option<Vec<UnitInput>>,
}

/// Validated unit descriptor, ready to insert
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
    pub unit_number: String,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrance: Option<String>,
    pub size_sqm: f64,
    pub co_ownership_share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<f64>,
}

/// Validated bulk request
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUnitBatch {
    pub building_id: Uuid,
    pub units: Vec<NewUnit>,
}

/// Response of a bulk insert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateUnitsResponse {
    pub count: usize,
    pub units: Vec<Unit>,
}

impl From<Vec<Unit>> for BulkCreateUnitsResponse {
    fn from(units: Vec<Unit>) -> Self {
        Self {
            count: units.len(),
            units,
        }
    }
}

pub fn is_valid_size(size_sqm: f64) -> bool {
    size_sqm.is_finite() && size_sqm > 0.0
}

pub fn is_valid_share(share: f64) -> bool {
    (0.0..=1.0).contains(&share)
}

impl UnitInput {
    fn validate(self, index: usize) -> Result<NewUnit, ValidationError> {
        let (Some(unit_number), Some(unit_type), Some(size_sqm), Some(co_ownership_share)) = (
            non_blank(self.unit_number),
            non_blank(self.unit_type),
            self.size_sqm,
            self.co_ownership_share,
        ) else {
            return Err(ValidationError(format!(
                "Unit at index {index} is missing required fields: unitNumber, type, sizeSqm, coOwnershipShare"
            )));
        };

        let unit_type = UnitType::parse(&unit_type).ok_or_else(|| {
            let allowed: Vec<&str> = UnitType::ALL.iter().map(UnitType::as_str).collect();
            ValidationError(format!(
                "Unit at index {index} has invalid type. Must be one of: {}",
                allowed.join(", ")
            ))
        })?;

        if !is_valid_size(size_sqm) {
            return Err(ValidationError(format!(
                "Unit at index {index} has invalid sizeSqm. Must be a positive number"
            )));
        }

        if !is_valid_share(co_ownership_share) {
            return Err(ValidationError(format!(
                "Unit at index {index} has invalid coOwnershipShare. Must be a number between 0 and 1 (inclusive)"
            )));
        }

        Ok(NewUnit {
            unit_number,
            unit_type,
            floor: non_blank(self.floor),
            entrance: non_blank(self.entrance),
            size_sqm,
            co_ownership_share,
            construction_year: self.construction_year,
            rooms: self.rooms,
        })
    }
}

impl BulkCreateUnitsRequest {
    /// Validate every unit before anything touches the store. The first
    /// violation is reported with the offending unit's index.
    pub fn validate(self) -> Result<NewUnitBatch, ValidationError> {
        let (Some(building_id), Some(units)) = (self.building_id, self.units) else {
            return Err(ValidationError::new(
                "Missing required fields: buildingId, units (array)",
            ));
        };

        if units.is_empty() {
            return Err(ValidationError::new("Units array cannot be empty"));
        }

        let mut seen = HashSet::with_capacity(units.len());
        let mut validated = Vec::with_capacity(units.len());
        for (index, input) in units.into_iter().enumerate() {
            let unit = input.validate(index)?;
            if !seen.insert(unit.unit_number.clone()) {
                return Err(ValidationError(format!(
                    "Unit at index {index} repeats unitNumber {}",
                    unit.unit_number
                )));
            }
            validated.push(unit);
        }

        Ok(NewUnitBatch {
            building_id: building_id.0,
            units: validated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(number: &str, share: f64) -> UnitInput {
        UnitInput {
            unit_number: Some(number.into()),
            unit_type: Some("Apartment".into()),
            size_sqm: Some(45.5),
            co_ownership_share: Some(share),
            ..Default::default()
        }
    }

    fn batch(units: Vec<UnitInput>) -> BulkCreateUnitsRequest {
        BulkCreateUnitsRequest {
            building_id: Some(Uuid::new_v4().into()),
            units: Some(units),
        }
    }

    #[test]
    fn share_bounds_are_inclusive() {
        assert!(batch(vec![unit("1", 0.0)]).validate().is_ok());
        assert!(batch(vec![unit("1", 1.0)]).validate().is_ok());

        let below = batch(vec![unit("1", -0.0001)]).validate().unwrap_err();
        assert!(below.0.contains("invalid coOwnershipShare"));
        let above = batch(vec![unit("1", 1.0001)]).validate().unwrap_err();
        assert!(above.0.contains("invalid coOwnershipShare"));
    }

    #[test]
    fn size_must_be_positive() {
        let mut input = unit("1", 0.5);
        input.size_sqm = Some(0.0);
        let err = batch(vec![input]).validate().unwrap_err();
        assert_eq!(
            err.0,
            "Unit at index 0 has invalid sizeSqm. Must be a positive number"
        );
    }

    #[test]
    fn unknown_type_reports_index() {
        let mut bad = unit("2", 0.5);
        bad.unit_type = Some("Castle".into());
        let err = batch(vec![unit("1", 0.5), bad]).validate().unwrap_err();
        assert_eq!(
            err.0,
            "Unit at index 1 has invalid type. Must be one of: Apartment, Office, Garden, Parking"
        );
    }

    #[test]
    fn missing_fields_and_empty_batches_are_rejected() {
        let err = BulkCreateUnitsRequest::default().validate().unwrap_err();
        assert_eq!(err.0, "Missing required fields: buildingId, units (array)");

        let err = batch(vec![]).validate().unwrap_err();
        assert_eq!(err.0, "Units array cannot be empty");

        let mut incomplete = unit("1", 0.5);
        incomplete.co_ownership_share = None;
        let err = batch(vec![incomplete]).validate().unwrap_err();
        assert!(err.0.starts_with("Unit at index 0 is missing required fields"));
    }

    #[test]
    fn duplicate_unit_numbers_are_rejected() {
        let err = batch(vec![unit("101", 0.5), unit("101", 0.5)])
            .validate()
            .unwrap_err();
        assert_eq!(err.0, "Unit at index 1 repeats unitNumber 101");
    }

    #[test]
    fn wire_format_uses_type_key() {
        let input: UnitInput = serde_json::from_value(serde_json::json!({
            "unitNumber": "101",
            "type": "Office",
            "sizeSqm": 45.5,
            "coOwnershipShare": 0.345
        }))
        .unwrap();
        let validated = batch(vec![input]).validate().unwrap();
        assert_eq!(validated.units[0].unit_type, UnitType::Office);
        assert_eq!(validated.units[0].co_ownership_share, 0.345);
    }
}
