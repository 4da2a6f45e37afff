//! Domain types and DTOs
//!
//! Value records exchanged between the wizard and the REST backend, plus the
//! boundary validation that turns raw request bodies into typed inputs.

pub mod building;
pub mod extraction;
pub mod numbering;
pub mod property;
pub mod unit;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use uuid::Uuid;

// Re-export commonly used types
pub use building::*;
pub use property::*;
pub use unit::*;

// Extraction types are accessed via crate::domain::extraction:: to keep the
// wizard-facing names apart from the persisted ones

/// Id of a referenced record as sent by a client, in a path or a body.
///
/// Text that is not a UUID resolves to the nil id. No stored record carries
/// it, so the lookup misses and the caller answers 404 like any unknown id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn parse(raw: &str) -> Self {
        Self(Uuid::parse_str(raw.trim()).unwrap_or(Uuid::nil()))
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A request body failed boundary validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Trimmed, non-empty value of an optional string field
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
