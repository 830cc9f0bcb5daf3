//! Backend-assigned record identifiers.

use serde::{Deserialize, Serialize};

/// Primary key returned by the backend when a record is created.
///
/// Backends differ on whether keys are integers or strings (UUIDs, slugs), so
/// both are accepted and serialized back in their original form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordId::Int(v) => core::fmt::Display::fmt(v, f),
            RecordId::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
