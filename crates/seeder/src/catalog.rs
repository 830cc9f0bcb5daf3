//! Reference resolution against live backend state.

use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use stockseed_client::Backend;
use stockseed_core::{CatalogEntity, RandomSampler, SeedError, SeedResult, Token};

/// Reads existing records from the backend so new records can point at them.
///
/// Nothing is cached: every call is a fresh read, so records created by other
/// actors (or earlier runs) are visible too.
pub struct EntityCatalog {
    backend: Arc<dyn Backend>,
    token: Option<Token>,
}

impl EntityCatalog {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            token: None,
        }
    }

    /// Token used for subsequent reads.
    pub fn authorize(&mut self, token: Token) {
        self.token = Some(token);
    }

    /// Every record of type `T` the backend currently holds.
    pub async fn list_existing<T: CatalogEntity>(&self) -> SeedResult<Vec<T>> {
        let raw = self.backend.list(self.token.as_ref(), T::KIND).await?;
        raw.into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| SeedError::decode(format!("{}: {e}", T::KIND)))
            })
            .collect()
    }

    /// One uniformly chosen existing record of type `T`.
    ///
    /// Fails with `EmptyCatalog` when the backend holds none. Draws are
    /// independent across calls.
    pub async fn sample_reference<T: CatalogEntity, R: Rng>(
        &self,
        sampler: &mut RandomSampler<R>,
    ) -> SeedResult<T> {
        let kind = T::KIND;
        let existing = self.list_existing::<T>().await?;
        let picked = sampler.choose(kind.as_str(), &existing)?;
        debug!(%kind, key = picked.natural_key(), of = existing.len(), "sampled reference");
        Ok(picked.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockseed_client::InMemoryBackend;
    use stockseed_core::{Brand, Credentials, EntityKind, Provider};

    async fn catalog_over(backend: Arc<InMemoryBackend>) -> EntityCatalog {
        let token = backend
            .login(&Credentials::new("admin_dp", "admin1234admin"))
            .await
            .unwrap();
        let mut catalog = EntityCatalog::new(backend);
        catalog.authorize(token);
        catalog
    }

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(InMemoryBackend::new().with_user("admin_dp", "admin1234admin", true))
    }

    #[tokio::test]
    async fn sampling_an_empty_kind_fails() {
        let catalog = catalog_over(backend()).await;
        let err = catalog
            .sample_reference::<Brand, _>(&mut RandomSampler::new())
            .await
            .unwrap_err();
        assert_eq!(err, SeedError::empty_catalog("brand"));
    }

    #[tokio::test]
    async fn reads_see_records_created_elsewhere() {
        let backend = backend();
        let catalog = catalog_over(backend.clone()).await;
        assert!(catalog.list_existing::<Provider>().await.unwrap().is_empty());

        backend
            .preload(EntityKind::Provider, json!({ "name": "Northwind" }))
            .unwrap();

        let providers = catalog.list_existing::<Provider>().await.unwrap();
        assert_eq!(providers, vec![Provider { name: "Northwind".into() }]);

        let picked: Provider = catalog
            .sample_reference(&mut RandomSampler::new())
            .await
            .unwrap();
        assert_eq!(picked.name, "Northwind");
    }

    #[tokio::test]
    async fn reads_without_a_token_are_refused_by_the_backend() {
        let catalog = EntityCatalog::new(backend());
        assert!(matches!(
            catalog.list_existing::<Brand>().await,
            Err(SeedError::Unauthorized(_))
        ));
    }
}
