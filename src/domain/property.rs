use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_blank, BuildingWithUnits, ValidationError};

/// Management type; doubles as the unique number prefix
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ManagementType {
    /// Owners' association (Wohnungseigentümergemeinschaft)
    #[serde(rename = "WEG")]
    Weg,
    /// Rental management (Mietverwaltung)
    #[serde(rename = "MV")]
    Mv,
}

impl Default for ManagementType {
    fn default() -> Self {
        Self::Weg
    }
}

impl ManagementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weg => "WEG",
            Self::Mv => "MV",
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.as_str()
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WEG" => Some(Self::Weg),
            "MV" => Some(Self::Mv),
            _ => None,
        }
    }
}

/// Metadata for an attached Declaration of Division
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationOfDivision {
    pub file_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub ai_extracted: bool,
}

/// Property entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub unique_number: String,
    pub name: String,
    pub management_type: ManagementType,
    pub property_manager_id: String,
    pub accountant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration_of_division: Option<DeclarationOfDivision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the property list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: Uuid,
    pub unique_number: String,
    pub name: String,
    pub management_type: ManagementType,
}

impl From<Property> for PropertySummary {
    fn from(p: Property) -> Self {
        Self {
            id: p.id,
            unique_number: p.unique_number,
            name: p.name,
            management_type: p.management_type,
        }
    }
}

/// Property with its buildings and their units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub buildings: Vec<BuildingWithUnits>,
}

/// Raw request body for creating a property
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub management_type: Option<String>,
    #[serde(default)]
    pub property_manager_id: Option<String>,
    #[serde(default)]
    pub accountant_id: Option<String>,
    #[serde(default)]
    pub declaration_of_division: Option<DeclarationOfDivision>,
}

/// Validated input for property creation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub name: String,
    pub management_type: ManagementType,
    pub property_manager_id: String,
    pub accountant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_of_division: Option<DeclarationOfDivision>,
}

impl CreatePropertyRequest {
    pub fn validate(self) -> Result<NewProperty, ValidationError> {
        let (Some(name), Some(management_type), Some(property_manager_id), Some(accountant_id)) = (
            non_blank(self.name),
            non_blank(self.management_type),
            non_blank(self.property_manager_id),
            non_blank(self.accountant_id),
        ) else {
            return Err(ValidationError::new(
                "Missing required fields: name, managementType, propertyManagerId, accountantId",
            ));
        };

        let management_type = ManagementType::parse(&management_type).ok_or_else(|| {
            ValidationError::new("managementType must be either \"WEG\" or \"MV\"")
        })?;

        Ok(NewProperty {
            name,
            management_type,
            property_manager_id,
            accountant_id,
            declaration_of_division: self.declaration_of_division,
        })
    }
}
