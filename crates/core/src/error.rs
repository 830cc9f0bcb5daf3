//! Error model shared by every seeding crate.

use thiserror::Error;

use crate::entity::EntityKind;

/// Result type used across the seeding crates.
pub type SeedResult<T> = Result<T, SeedError>;

/// Seeding error.
///
/// None of these are recovered locally: any error aborts the run in place and
/// the operator inspects backend state to see how far seeding progressed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// Credentials were rejected during login.
    #[error("authentication failed for `{username}`: {message}")]
    Authentication { username: String, message: String },

    /// The backend rejected a creation payload (schema or business rule).
    #[error("{kind} rejected by backend: {message}")]
    Validation { kind: EntityKind, message: String },

    /// The backend refused an authenticated call (missing or insufficient rights).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A sampling operation ran against an empty reference set or token pool.
    ///
    /// This indicates a stage-ordering bug, not a data problem.
    #[error("nothing to sample from: {pool} is empty")]
    EmptyCatalog { pool: String },

    /// A stage needed the token of an actor that never authenticated.
    #[error("no session for actor `{0}`")]
    MissingSession(String),

    /// A stage was requested out of pipeline order.
    #[error("stage order violated: {0}")]
    StageOrder(String),

    /// Network failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other non-success response.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SeedError {
    pub fn authentication(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn validation(kind: EntityKind, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn empty_catalog(pool: impl Into<String>) -> Self {
        Self::EmptyCatalog { pool: pool.into() }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors caused by the pipeline sampling before its parents exist.
    pub fn is_empty_catalog(&self) -> bool {
        matches!(self, Self::EmptyCatalog { .. })
    }
}
