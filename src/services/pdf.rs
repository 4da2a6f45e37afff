//! PDF text extraction

use thiserror::Error;

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF contains no extractable text (maybe scanned image). Server-side OCR not configured.")]
    NoText,

    #[error("PDF could not be read: {0}")]
    Unreadable(String),

    #[error("PDF extraction task failed")]
    Task(#[source] tokio::task::JoinError),
}

/// Extract the text layer of a PDF. Parsing is CPU-bound and runs on the
/// blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, PdfError> {
    let text = match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
    {
        Ok(result) => result.map_err(|e| PdfError::Unreadable(format!("{e:?}")))?,
        // The parser panics on some malformed documents
        Err(e) if e.is_panic() => {
            return Err(PdfError::Unreadable("malformed document".to_string()))
        }
        Err(e) => return Err(PdfError::Task(e)),
    };

    if text.trim().is_empty() {
        return Err(PdfError::NoText);
    }

    Ok(text)
}
