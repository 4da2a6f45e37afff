use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_blank, Property, RecordId, Unit, ValidationError};

/// Postal address (stored as JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub house_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Street and house number are both present
    pub fn is_complete(&self) -> bool {
        !self.street.trim().is_empty() && !self.house_number.trim().is_empty()
    }
}

/// Building entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub property_id: Uuid,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Building with its owning property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildingWithProperty {
    #[serde(flatten)]
    pub building: Building,
    pub property: Property,
}

/// Building with its units, ordered by unit number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildingWithUnits {
    #[serde(flatten)]
    pub building: Building,
    pub units: Vec<Unit>,
}

/// Address as submitted; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Raw request body for creating a building
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingRequest {
    #[serde(default)]
    pub property_id: Option<RecordId>,
    #[serde(default)]
    pub address: Option<AddressInput>,
    #[serde(default)]
    pub additional_details: Option<String>,
}

/// Validated input for building creation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBuilding {
    pub property_id: Uuid,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_details: Option<String>,
}

impl CreateBuildingRequest {
    pub fn validate(self) -> Result<NewBuilding, ValidationError> {
        let (Some(property_id), Some(address)) = (self.property_id, self.address) else {
            return Err(ValidationError::new(
                "Missing required fields: propertyId, address",
            ));
        };

        let (Some(street), Some(house_number)) =
            (non_blank(address.street), non_blank(address.house_number))
        else {
            return Err(ValidationError::new(
                "Address must include street and houseNumber",
            ));
        };

        Ok(NewBuilding {
            property_id: property_id.0,
            address: Address {
                street,
                house_number,
                postal_code: non_blank(address.postal_code),
                city: non_blank(address.city),
                country: non_blank(address.country),
            },
            additional_details: non_blank(self.additional_details),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_address_is_rejected() {
        let req = CreateBuildingRequest {
            property_id: Some(Uuid::new_v4().into()),
            ..Default::default()
        };
        assert_eq!(
            req.validate().unwrap_err().0,
            "Missing required fields: propertyId, address"
        );
    }

    #[test]
    fn address_needs_street_and_house_number() {
        let req = CreateBuildingRequest {
            property_id: Some(Uuid::new_v4().into()),
            address: Some(AddressInput {
                street: Some("Main St".into()),
                ..Default::default()
            }),
            additional_details: None,
        };
        assert_eq!(
            req.validate().unwrap_err().0,
            "Address must include street and houseNumber"
        );
    }

    #[test]
    fn optional_address_parts_are_trimmed() {
        let property_id = Uuid::new_v4();
        let req = CreateBuildingRequest {
            property_id: Some(property_id.into()),
            address: Some(AddressInput {
                street: Some(" Main St ".into()),
                house_number: Some("10".into()),
                postal_code: Some("".into()),
                city: Some("Berlin".into()),
                country: None,
            }),
            additional_details: Some("Rear building".into()),
        };

        let building = req.validate().unwrap();
        assert_eq!(building.property_id, property_id);
        assert_eq!(building.address.street, "Main St");
        assert_eq!(building.address.postal_code, None);
        assert_eq!(building.address.city.as_deref(), Some("Berlin"));
    }
}
