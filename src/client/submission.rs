//! Submission saga for a finished wizard.
//!
//! Steps: create the property, create every building concurrently, then
//! bulk-create each building's units concurrently. When a step fails after
//! the property exists, the property is deleted (cascading to whatever was
//! created under it).

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::api::{ClientError, PropertyApi};
use super::wizard::WizardSubmission;
use crate::domain::{
    Building, DeclarationOfDivision, NewBuilding, NewProperty, NewUnitBatch, Property, Unit,
};

/// A write the backend has acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommittedStep {
    Property { id: Uuid, unique_number: String },
    Building { index: usize, id: Uuid },
    Units { building_id: Uuid, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Nothing was written before the failure
    NotNeeded,
    /// The property and everything under it were deleted
    Succeeded,
    /// The delete failed; committed rows are left behind
    Failed(String),
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubmissionError {
    /// Single user-visible message
    pub message: String,
    pub committed: Vec<CommittedStep>,
    pub compensation: Compensation,
}

/// Everything the backend created for one submission
#[derive(Debug, Clone)]
pub struct SubmittedProperty {
    pub property: Property,
    pub buildings: Vec<Building>,
    pub units: Vec<Unit>,
    pub committed: Vec<CommittedStep>,
}

/// Replay a finished wizard against the backend.
#[instrument(skip_all, fields(name = %submission.draft().general.name))]
pub async fn submit_property<A: PropertyApi>(
    api: &A,
    submission: WizardSubmission,
) -> Result<SubmittedProperty, SubmissionError> {
    let draft = submission.into_draft();

    // Validate building addresses before the first write
    for (index, building) in draft.buildings.iter().enumerate() {
        if !building.address.is_complete() {
            return Err(SubmissionError {
                message: format!(
                    "Building {} address must include street and houseNumber",
                    index + 1
                ),
                committed: Vec::new(),
                compensation: Compensation::NotNeeded,
            });
        }
    }

    let declaration_of_division = draft.declaration_file.as_ref().map(|file| {
        let now = Utc::now();
        DeclarationOfDivision {
            file_id: format!("file-{}", now.timestamp_millis()),
            uploaded_at: now,
            ai_extracted: file.ai_extracted,
        }
    });

    let new_property = NewProperty {
        name: draft.general.name.clone(),
        management_type: draft.general.management_type,
        property_manager_id: draft.general.property_manager_id.clone(),
        accountant_id: draft.general.accountant_id.clone(),
        declaration_of_division,
    };

    // Step 1: property
    let property = api
        .create_property(&new_property)
        .await
        .map_err(|e| SubmissionError {
            message: e.to_string(),
            committed: Vec::new(),
            compensation: Compensation::NotNeeded,
        })?;

    let mut saga = Saga {
        api,
        property_id: property.id,
        committed: vec![CommittedStep::Property {
            id: property.id,
            unique_number: property.unique_number.clone(),
        }],
    };

    // Step 2: buildings, all at once
    let building_requests: Vec<NewBuilding> = draft
        .buildings
        .iter()
        .map(|b| NewBuilding {
            property_id: property.id,
            address: b.address.clone(),
            additional_details: b.additional_details.clone(),
        })
        .collect();

    let results = join_all(building_requests.iter().map(|b| api.create_building(b))).await;

    let mut buildings = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(building) => {
                saga.committed.push(CommittedStep::Building {
                    index,
                    id: building.id,
                });
                buildings.push(building);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(saga.compensate(e).await);
    }

    // Step 3: units, one bulk call per building that has any
    let batches: Vec<NewUnitBatch> = buildings
        .iter()
        .enumerate()
        .filter_map(|(index, building)| {
            let units: Vec<_> = draft
                .units_for_building(index)
                .map(|u| u.to_new_unit())
                .collect();
            (!units.is_empty()).then(|| NewUnitBatch {
                building_id: building.id,
                units,
            })
        })
        .collect();

    let results = join_all(batches.iter().map(|batch| api.create_units_bulk(batch))).await;

    let mut units = Vec::new();
    let mut first_error = None;
    for (batch, result) in batches.iter().zip(results) {
        match result {
            Ok(created) => {
                saga.committed.push(CommittedStep::Units {
                    building_id: batch.building_id,
                    count: created.count,
                });
                units.extend(created.units);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(saga.compensate(e).await);
    }

    info!(
        property_id = %property.id,
        unique_number = %property.unique_number,
        buildings = buildings.len(),
        units = units.len(),
        "Property submitted"
    );

    Ok(SubmittedProperty {
        property,
        buildings,
        units,
        committed: saga.committed,
    })
}

struct Saga<'a, A> {
    api: &'a A,
    property_id: Uuid,
    committed: Vec<CommittedStep>,
}

impl<A: PropertyApi> Saga<'_, A> {
    async fn compensate(self, cause: ClientError) -> SubmissionError {
        warn!(
            property_id = %self.property_id,
            error = %cause,
            committed = self.committed.len(),
            "Submission failed, deleting property"
        );

        let compensation = match self.api.delete_property(self.property_id).await {
            Ok(()) => Compensation::Succeeded,
            Err(e) => {
                error!(property_id = %self.property_id, error = %e, "Compensation failed");
                Compensation::Failed(e.to_string())
            }
        };

        SubmissionError {
            message: cause.to_string(),
            committed: self.committed,
            compensation,
        }
    }
}
