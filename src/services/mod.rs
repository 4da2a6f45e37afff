//! Service layer modules for external integrations.
//!
//! Contains the LLM API client, the document extraction bridge built on it,
//! and PDF text extraction.

pub mod extraction;
pub mod llm;
pub mod pdf;

pub use llm::{LlmClient, LlmError, PromptOptions};
pub use pdf::PdfError;
