//! Wizard-side client for the REST backend.
//!
//! The wizard collects a property, its buildings and their units as an
//! immutable draft, then the submission saga replays it against the API and
//! undoes the property when a later step fails.

pub mod api;
#[cfg(test)]
pub(crate) mod fake;
pub mod submission;
pub mod upload;
pub mod wizard;

pub use api::{ApiClient, ClientError, PropertyApi};
pub use submission::{
    submit_property, CommittedStep, Compensation, SubmissionError, SubmittedProperty,
};
pub use upload::{attach_declaration, AttachOutcome, SelectedFile, UploadRejection};
pub use wizard::{
    DeclarationFile, DraftBuilding, DraftUnit, GeneralInfo, Wizard, WizardDraft, WizardError,
    WizardStep, WizardSubmission,
};
