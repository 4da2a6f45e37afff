//! Extraction domain types
//!
//! Structure the LLM is asked to produce from a Declaration of Division. The
//! reply is untrusted: `buildings` and `units` must be present as arrays and
//! each unit must point at an existing building.

use serde::{Deserialize, Deserializer, Serialize};

use super::{is_valid_share, is_valid_size, UnitType, ValidationError};

/// Address fields as extracted; any of them may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAddress {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub street: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub house_number: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub postal_code: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub city: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ExtractedAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedBuilding {
    #[serde(default)]
    pub address: ExtractedAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedUnit {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub unit_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub unit_type: Option<UnitType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub floor: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub entrance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_sqm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_ownership_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<f64>,
    /// Position of the owning building in `buildings`
    pub building_index: usize,
}

/// Structured content of a Declaration of Division
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<ExtractedProperty>,
    pub buildings: Vec<ExtractedBuilding>,
    pub units: Vec<ExtractedUnit>,
}

impl ExtractedDocument {
    /// Cross-field checks serde cannot express
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, unit) in self.units.iter().enumerate() {
            if unit.building_index >= self.buildings.len() {
                return Err(ValidationError(format!(
                    "Extracted unit {index} references building {} but only {} were found",
                    unit.building_index,
                    self.buildings.len()
                )));
            }
            if unit.size_sqm.is_some_and(|s| !is_valid_size(s)) {
                return Err(ValidationError(format!(
                    "Extracted unit {index} has a non-positive size"
                )));
            }
            if unit.co_ownership_share.is_some_and(|s| !is_valid_share(s)) {
                return Err(ValidationError(format!(
                    "Extracted unit {index} has a co-ownership share outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Body of a successful document parse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseFileResponse {
    pub parsed: ExtractedDocument,
}

/// Accepts strings, numbers and null; models often emit `"floor": 2`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
