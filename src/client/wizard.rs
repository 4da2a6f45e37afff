//! Three-step property creation wizard.
//!
//! [`Wizard`] is a plain value: every update consumes it and returns the next
//! one, so a rejected update leaves the caller holding nothing half-applied.

use thiserror::Error;

use crate::domain::extraction::{ExtractedAddress, ExtractedBuilding, ExtractedDocument, ExtractedUnit};
use crate::domain::{Address, ManagementType, NewUnit, UnitType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    GeneralInfo,
    Buildings,
    Units,
}

impl WizardStep {
    /// 1-based position shown in the step indicator
    pub fn number(&self) -> u8 {
        match self {
            Self::GeneralInfo => 1,
            Self::Buildings => 2,
            Self::Units => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralInfo => "General Info",
            Self::Buildings => "Buildings",
            Self::Units => "Units",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::GeneralInfo => Some(Self::Buildings),
            Self::Buildings => Some(Self::Units),
            Self::Units => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::GeneralInfo => None,
            Self::Buildings => Some(Self::GeneralInfo),
            Self::Units => Some(Self::Buildings),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Name, property manager and accountant are required")]
    GeneralInfoIncomplete,

    #[error("Add at least one building")]
    NoBuildings,

    #[error("Add at least one unit")]
    NoUnits,

    #[error("Building {0} does not exist")]
    NoSuchBuilding(usize),

    #[error("Unit {0} does not exist")]
    NoSuchUnit(usize),

    #[error("Submission is only possible from the units step")]
    NotAtLastStep,
}

/// Step 1 fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralInfo {
    pub management_type: ManagementType,
    pub name: String,
    pub property_manager_id: String,
    pub accountant_id: String,
}

/// Attached Declaration of Division
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationFile {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    /// Buildings and units were filled in from this document
    pub ai_extracted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftBuilding {
    pub address: Address,
    pub additional_details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftUnit {
    /// Position of the owning building in the draft
    pub building_index: usize,
    pub unit_number: String,
    pub unit_type: UnitType,
    pub floor: Option<String>,
    pub entrance: Option<String>,
    pub size_sqm: f64,
    pub co_ownership_share: f64,
    pub construction_year: Option<i32>,
    pub rooms: Option<f64>,
}

impl DraftUnit {
    pub fn to_new_unit(&self) -> NewUnit {
        NewUnit {
            unit_number: self.unit_number.clone(),
            unit_type: self.unit_type,
            floor: self.floor.clone(),
            entrance: self.entrance.clone(),
            size_sqm: self.size_sqm,
            co_ownership_share: self.co_ownership_share,
            construction_year: self.construction_year,
            rooms: self.rooms,
        }
    }
}

/// Everything collected so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardDraft {
    pub general: GeneralInfo,
    pub declaration_file: Option<DeclarationFile>,
    pub buildings: Vec<DraftBuilding>,
    pub units: Vec<DraftUnit>,
}

impl WizardDraft {
    fn general_info_complete(&self) -> bool {
        let g = &self.general;
        !g.name.trim().is_empty()
            && !g.property_manager_id.trim().is_empty()
            && !g.accountant_id.trim().is_empty()
    }

    /// Units of one building, in draft order
    pub fn units_for_building(&self, building_index: usize) -> impl Iterator<Item = &DraftUnit> {
        self.units
            .iter()
            .filter(move |u| u.building_index == building_index)
    }
}

/// Completed draft handed to the submission saga
/// A draft that passed every step guard; only [`Wizard::submit`] builds one
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSubmission {
    draft: WizardDraft,
}

impl WizardSubmission {
    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    pub fn into_draft(self) -> WizardDraft {
        self.draft
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wizard {
    step: WizardStep,
    draft: WizardDraft,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    /// Guard of the current step
    pub fn check_step(&self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::GeneralInfo if !self.draft.general_info_complete() => {
                Err(WizardError::GeneralInfoIncomplete)
            }
            WizardStep::Buildings if self.draft.buildings.is_empty() => {
                Err(WizardError::NoBuildings)
            }
            WizardStep::Units if self.draft.units.is_empty() => Err(WizardError::NoUnits),
            _ => Ok(()),
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.check_step().is_ok()
    }

    /// Advance one step. No-op at the last step.
    pub fn next(self) -> Result<Self, WizardError> {
        let Some(step) = self.step.next() else {
            return Ok(self);
        };
        self.check_step()?;
        Ok(Self { step, ..self })
    }

    /// Go back one step. Never guarded; no-op at the first step.
    pub fn previous(self) -> Self {
        let step = self.step.previous().unwrap_or(self.step);
        Self { step, ..self }
    }

    pub fn with_general_info(mut self, general: GeneralInfo) -> Self {
        self.draft.general = general;
        self
    }

    pub fn with_declaration_file(mut self, file: DeclarationFile) -> Self {
        self.draft.declaration_file = Some(file);
        self
    }

    pub fn without_declaration_file(mut self) -> Self {
        self.draft.declaration_file = None;
        self
    }

    pub fn add_building(mut self, building: DraftBuilding) -> Self {
        self.draft.buildings.push(building);
        self
    }

    pub fn update_building(
        mut self,
        index: usize,
        building: DraftBuilding,
    ) -> Result<Self, WizardError> {
        let slot = self
            .draft
            .buildings
            .get_mut(index)
            .ok_or(WizardError::NoSuchBuilding(index))?;
        *slot = building;
        Ok(self)
    }

    /// Removes the building and its units; later units shift down one index
    pub fn remove_building(mut self, index: usize) -> Result<Self, WizardError> {
        if index >= self.draft.buildings.len() {
            return Err(WizardError::NoSuchBuilding(index));
        }
        self.draft.buildings.remove(index);
        self.draft.units.retain(|u| u.building_index != index);
        for unit in &mut self.draft.units {
            if unit.building_index > index {
                unit.building_index -= 1;
            }
        }
        Ok(self)
    }

    pub fn add_unit(mut self, unit: DraftUnit) -> Result<Self, WizardError> {
        if unit.building_index >= self.draft.buildings.len() {
            return Err(WizardError::NoSuchBuilding(unit.building_index));
        }
        self.draft.units.push(unit);
        Ok(self)
    }

    pub fn update_unit(mut self, index: usize, unit: DraftUnit) -> Result<Self, WizardError> {
        if unit.building_index >= self.draft.buildings.len() {
            return Err(WizardError::NoSuchBuilding(unit.building_index));
        }
        let slot = self
            .draft
            .units
            .get_mut(index)
            .ok_or(WizardError::NoSuchUnit(index))?;
        *slot = unit;
        Ok(self)
    }

    pub fn remove_unit(mut self, index: usize) -> Result<Self, WizardError> {
        if index >= self.draft.units.len() {
            return Err(WizardError::NoSuchUnit(index));
        }
        self.draft.units.remove(index);
        Ok(self)
    }

    /// Replace buildings and units with the extracted ones. Anything entered
    /// by hand in steps 2 and 3 is discarded.
    pub fn merge_extraction(mut self, document: ExtractedDocument) -> Self {
        self.draft.buildings = document.buildings.into_iter().map(DraftBuilding::from).collect();
        self.draft.units = document.units.into_iter().map(DraftUnit::from).collect();
        if let Some(file) = self.draft.declaration_file.as_mut() {
            file.ai_extracted = true;
        }
        self
    }

    /// Finish the wizard. Only valid from the units step with at least one unit.
    pub fn submit(self) -> Result<WizardSubmission, WizardError> {
        if self.step != WizardStep::Units {
            return Err(WizardError::NotAtLastStep);
        }
        self.check_step()?;
        Ok(WizardSubmission { draft: self.draft })
    }
}

impl From<ExtractedAddress> for Address {
    fn from(a: ExtractedAddress) -> Self {
        Self {
            street: a.street.unwrap_or_default(),
            house_number: a.house_number.unwrap_or_default(),
            postal_code: a.postal_code,
            city: a.city,
            country: a.country,
        }
    }
}

impl From<ExtractedBuilding> for DraftBuilding {
    fn from(b: ExtractedBuilding) -> Self {
        Self {
            address: b.address.into(),
            additional_details: b.additional_details,
        }
    }
}

impl From<ExtractedUnit> for DraftUnit {
    fn from(u: ExtractedUnit) -> Self {
        Self {
            building_index: u.building_index,
            unit_number: u.unit_number.unwrap_or_default(),
            unit_type: u.unit_type.unwrap_or_default(),
            floor: u.floor,
            entrance: u.entrance,
            size_sqm: u.size_sqm.unwrap_or_default(),
            co_ownership_share: u.co_ownership_share.unwrap_or_default(),
            construction_year: u.construction_year,
            rooms: u.rooms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general() -> GeneralInfo {
        GeneralInfo {
            management_type: ManagementType::Weg,
            name: "Sonnenhof".to_string(),
            property_manager_id: "pm-1".to_string(),
            accountant_id: "acc-1".to_string(),
        }
    }

    fn building(street: &str) -> DraftBuilding {
        DraftBuilding {
            address: Address {
                street: street.to_string(),
                house_number: "1".to_string(),
                ..Default::default()
            },
            additional_details: None,
        }
    }

    fn unit(building_index: usize, number: &str) -> DraftUnit {
        DraftUnit {
            building_index,
            unit_number: number.to_string(),
            size_sqm: 50.0,
            co_ownership_share: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn starts_at_general_info() {
        let wizard = Wizard::new();
        assert_eq!(wizard.step(), WizardStep::GeneralInfo);
        assert_eq!(wizard.step().number(), 1);
        assert_eq!(wizard.draft().general.management_type, ManagementType::Weg);
    }

    #[test]
    fn blank_general_info_blocks_next() {
        let wizard = Wizard::new().with_general_info(GeneralInfo {
            accountant_id: "   ".to_string(),
            ..general()
        });
        assert_eq!(wizard.next(), Err(WizardError::GeneralInfoIncomplete));
    }

    #[test]
    fn buildings_step_requires_a_building() {
        let wizard = Wizard::new().with_general_info(general()).next().unwrap();
        assert_eq!(wizard.step(), WizardStep::Buildings);
        assert!(!wizard.can_proceed());
        assert_eq!(wizard.clone().next(), Err(WizardError::NoBuildings));

        let wizard = wizard.add_building(building("Main")).next().unwrap();
        assert_eq!(wizard.step(), WizardStep::Units);
    }

    #[test]
    fn previous_is_unguarded_and_stops_at_first_step() {
        let wizard = Wizard::new().with_general_info(general()).next().unwrap();
        let wizard = wizard.previous();
        assert_eq!(wizard.step(), WizardStep::GeneralInfo);
        assert_eq!(wizard.previous().step(), WizardStep::GeneralInfo);
    }

    #[test]
    fn draft_survives_navigation() {
        let wizard = Wizard::new()
            .with_general_info(general())
            .next()
            .unwrap()
            .add_building(building("Main"))
            .previous();
        assert_eq!(wizard.draft().buildings.len(), 1);
        assert_eq!(wizard.draft().general.name, "Sonnenhof");
    }

    #[test]
    fn submit_needs_units_step_and_a_unit() {
        let wizard = Wizard::new()
            .with_general_info(general())
            .add_building(building("Main"));
        assert_eq!(wizard.clone().submit(), Err(WizardError::NotAtLastStep));

        let wizard = wizard.next().unwrap().next().unwrap();
        assert_eq!(wizard.clone().submit(), Err(WizardError::NoUnits));

        let submission = wizard.add_unit(unit(0, "101")).unwrap().submit().unwrap();
        assert_eq!(submission.draft.units.len(), 1);
    }

    #[test]
    fn removing_a_building_drops_and_reindexes_units() {
        let wizard = Wizard::new()
            .add_building(building("A"))
            .add_building(building("B"))
            .add_building(building("C"))
            .add_unit(unit(0, "A1"))
            .unwrap()
            .add_unit(unit(1, "B1"))
            .unwrap()
            .add_unit(unit(2, "C1"))
            .unwrap();

        let wizard = wizard.remove_building(1).unwrap();
        let draft = wizard.draft();
        assert_eq!(draft.buildings.len(), 2);
        assert_eq!(draft.buildings[1].address.street, "C");
        let units: Vec<(usize, &str)> = draft
            .units
            .iter()
            .map(|u| (u.building_index, u.unit_number.as_str()))
            .collect();
        assert_eq!(units, vec![(0, "A1"), (1, "C1")]);
    }

    #[test]
    fn units_must_point_at_a_building() {
        let err = Wizard::new().add_unit(unit(0, "101")).unwrap_err();
        assert_eq!(err, WizardError::NoSuchBuilding(0));
    }

    #[test]
    fn merge_extraction_overwrites_and_marks_file() {
        let document: ExtractedDocument = serde_json::from_value(serde_json::json!({
            "buildings": [{ "address": { "street": "Main", "houseNumber": 1 } }],
            "units": [{ "buildingIndex": 0, "unitNumber": "101", "type": "Office",
                        "sizeSqm": 50, "coOwnershipShare": 0.5 }]
        }))
        .unwrap();

        let wizard = Wizard::new()
            .with_declaration_file(DeclarationFile {
                file_name: "doc.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size: 1024,
                ai_extracted: false,
            })
            .add_building(building("Manual"))
            .merge_extraction(document);

        let draft = wizard.draft();
        assert_eq!(draft.buildings.len(), 1);
        assert_eq!(draft.buildings[0].address.street, "Main");
        assert_eq!(draft.buildings[0].address.house_number, "1");
        assert_eq!(draft.units[0].unit_type, UnitType::Office);
        assert!(draft.declaration_file.as_ref().unwrap().ai_extracted);
    }
}
