//! `stockseed-factory` — plausible field values for every record the seeder
//! creates.
//!
//! The pipeline decides *which* records exist and how they reference each
//! other; a [`PayloadFactory`] only fills in the remaining fields.

pub mod fake;

pub use fake::FakeDataFactory;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockseed_core::{Brand, Catalogue, Credentials, Product, Provider, RecordId};

/// Role an actor is registered with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Admin,
    Employee,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Employee => "employee",
        }
    }
}

/// Produces creation payloads with valid field values.
///
/// Reference fields are always taken from the arguments, never invented.
pub trait PayloadFactory: Send {
    /// A fresh username for a new employee.
    fn username(&mut self) -> String;

    /// Registration payload for a new actor.
    fn actor(&mut self, credentials: &Credentials, role: ActorRole) -> JsonValue;

    /// Profile fields for `PUT /profile`.
    fn profile(&mut self) -> JsonValue;

    fn brand(&mut self) -> JsonValue;

    fn catalogue(&mut self) -> JsonValue;

    fn product(&mut self, brand: &Brand, catalogue: &Catalogue) -> JsonValue;

    fn provider(&mut self) -> JsonValue;

    fn entry(&mut self, provider: &Provider) -> JsonValue;

    fn purchase(&mut self, entry: &RecordId, product: &Product) -> JsonValue;

    fn exit(&mut self) -> JsonValue;

    fn sale(&mut self, exit: &RecordId, product: &Product) -> JsonValue;
}
