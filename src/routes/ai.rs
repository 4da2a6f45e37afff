//! Declaration of Division parsing endpoint.
//!
//! Accepts a multipart upload, pulls the PDF text layer and hands it to the
//! extraction bridge. Nothing is persisted.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::extraction::ParseFileResponse;
use crate::error::{ApiError, ApiResult};
use crate::repository::PropertyRepository;
use crate::services::{extraction, pdf};

/// Multipart field carrying the document
pub const FILE_FIELD: &str = "file";

struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Parse an uploaded Declaration of Division into buildings and units.
///
/// POST /ai/parse-file
pub async fn parse_file<R: PropertyRepository>(
    State(state): State<Arc<AppState<R>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ParseFileResponse>> {
    let mut multipart = multipart.map_err(|_| ApiError::validation("No file uploaded"))?;

    let upload = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::validation("No file uploaded"))?;

    if upload.content_type.as_deref() != Some(pdf::PDF_MIME_TYPE) {
        return Err(ApiError::validation(
            "Only PDF files are supported for server-side parsing at the moment",
        ));
    }

    let max = state.settings.max_upload_bytes;
    if upload.bytes.len() > max {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds the maximum size of {} MB",
            max / (1024 * 1024)
        )));
    }

    tracing::info!(
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        size = upload.bytes.len(),
        "Parsing uploaded document"
    );

    let text = pdf::extract_text(upload.bytes).await?;
    let parsed = extraction::extract_property_info(&state.llm, &text).await?;

    tracing::info!(
        buildings = parsed.buildings.len(),
        units = parsed.units.len(),
        "Document parsed"
    );

    Ok(Json(ParseFileResponse { parsed }))
}

/// First part named [`FILE_FIELD`]; other parts are drained and ignored
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;

        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}
