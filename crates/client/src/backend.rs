use async_trait::async_trait;
use serde_json::Value as JsonValue;

use stockseed_core::{Credentials, EntityKind, SeedResult, Token};

/// Remote retail API as seen by the seeder.
///
/// Payloads and responses are structured JSON records; the backend owns their
/// exact schema. Every call is one round trip and nothing is cached.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange credentials for a token.
    ///
    /// Fails with `SeedError::Authentication` when the backend rejects them.
    async fn login(&self, credentials: &Credentials) -> SeedResult<Token>;

    /// Create one record of `kind` on behalf of the token's actor and return
    /// the created record as the backend reports it.
    ///
    /// `EntityKind::Actor` registers a new actor.
    async fn create(
        &self,
        token: &Token,
        kind: EntityKind,
        payload: JsonValue,
    ) -> SeedResult<JsonValue>;

    /// Replace the profile fields of the token's actor.
    async fn update_profile(&self, token: &Token, profile: JsonValue) -> SeedResult<JsonValue>;

    /// Every record of `kind` currently stored by the backend.
    async fn list(&self, token: Option<&Token>, kind: EntityKind) -> SeedResult<Vec<JsonValue>>;
}
