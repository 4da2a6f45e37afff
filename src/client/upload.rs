//! Declaration of Division upload guard.

use thiserror::Error;

use super::api::PropertyApi;
use super::wizard::{DeclarationFile, Wizard};
use crate::services::pdf::PDF_MIME_TYPE;

pub const ACCEPTED_MIME_TYPES: [&str; 4] = [PDF_MIME_TYPE, "image/jpeg", "image/png", "image/jpg"];

pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Please upload a PDF or image file (PDF, JPG, PNG)")]
    UnsupportedType,

    #[error("File size must be less than 10MB")]
    TooLarge,
}

/// A file picked by the user
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn check_file(content_type: &str, size: u64) -> Result<(), UploadRejection> {
    if !ACCEPTED_MIME_TYPES.contains(&content_type) {
        return Err(UploadRejection::UnsupportedType);
    }
    if size > MAX_FILE_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    Ok(())
}

/// Result of attaching a file; `error` is shown inline next to the picker
#[derive(Debug)]
pub struct AttachOutcome {
    pub wizard: Wizard,
    pub error: Option<String>,
}

/// Attach a declaration to the draft. Rejected files leave the wizard
/// untouched. PDFs are sent for parsing and a successful parse replaces the
/// draft's buildings and units; a failed parse keeps the file attached.
pub async fn attach_declaration<A: PropertyApi>(
    api: &A,
    wizard: Wizard,
    file: SelectedFile,
) -> AttachOutcome {
    if let Err(rejection) = check_file(&file.content_type, file.size()) {
        return AttachOutcome {
            wizard,
            error: Some(rejection.to_string()),
        };
    }

    let wizard = wizard.with_declaration_file(DeclarationFile {
        file_name: file.file_name.clone(),
        content_type: file.content_type.clone(),
        size: file.size(),
        ai_extracted: false,
    });

    if file.content_type != PDF_MIME_TYPE {
        return AttachOutcome {
            wizard,
            error: None,
        };
    }

    match api
        .parse_file(&file.file_name, &file.content_type, file.bytes)
        .await
    {
        Ok(document) => AttachOutcome {
            wizard: wizard.merge_extraction(document),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Document parsing failed");
            AttachOutcome {
                wizard,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeApi;
    use crate::domain::extraction::ExtractedDocument;

    #[test]
    fn text_files_are_rejected() {
        assert_eq!(
            check_file("text/plain", 1024),
            Err(UploadRejection::UnsupportedType)
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_file("image/png", MAX_FILE_BYTES).is_ok());
        assert_eq!(
            check_file(PDF_MIME_TYPE, MAX_FILE_BYTES + 1),
            Err(UploadRejection::TooLarge)
        );
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(
            UploadRejection::TooLarge.to_string(),
            "File size must be less than 10MB"
        );
    }

    fn file(content_type: &str) -> SelectedFile {
        SelectedFile {
            file_name: "upload".to_string(),
            content_type: content_type.to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn rejected_file_leaves_wizard_untouched() {
        let api = FakeApi::default();
        let outcome = attach_declaration(&api, Wizard::new(), file("text/plain")).await;

        assert_eq!(
            outcome.error.as_deref(),
            Some("Please upload a PDF or image file (PDF, JPG, PNG)")
        );
        assert_eq!(outcome.wizard, Wizard::new());
        assert_eq!(api.parse_calls(), 0);
    }

    #[tokio::test]
    async fn images_are_attached_without_parsing() {
        let api = FakeApi::default();
        let outcome = attach_declaration(&api, Wizard::new(), file("image/png")).await;

        assert!(outcome.error.is_none());
        assert!(outcome.wizard.draft().declaration_file.is_some());
        assert_eq!(api.parse_calls(), 0);
    }

    #[tokio::test]
    async fn parsed_pdf_fills_the_draft() {
        let document: ExtractedDocument = serde_json::from_value(serde_json::json!({
            "buildings": [{ "address": { "street": "Main", "houseNumber": "1" } }],
            "units": [{ "buildingIndex": 0, "unitNumber": "101", "type": "Apartment",
                        "sizeSqm": 50, "coOwnershipShare": 0.5 }]
        }))
        .unwrap();
        let api = FakeApi::parsing(Ok(document));

        let outcome = attach_declaration(&api, Wizard::new(), file(PDF_MIME_TYPE)).await;

        let draft = outcome.wizard.draft();
        assert!(outcome.error.is_none());
        assert_eq!(draft.buildings.len(), 1);
        assert_eq!(draft.units[0].unit_number, "101");
        assert!(draft.declaration_file.as_ref().unwrap().ai_extracted);
    }

    #[tokio::test]
    async fn failed_parse_keeps_the_file() {
        let api = FakeApi::parsing(Err(
            "Failed to extract property information from document".to_string(),
        ));

        let outcome = attach_declaration(&api, Wizard::new(), file(PDF_MIME_TYPE)).await;

        assert_eq!(
            outcome.error.as_deref(),
            Some("Failed to extract property information from document")
        );
        let file = outcome.wizard.draft().declaration_file.as_ref().unwrap();
        assert!(!file.ai_extracted);
        assert!(outcome.wizard.draft().buildings.is_empty());
    }
}
