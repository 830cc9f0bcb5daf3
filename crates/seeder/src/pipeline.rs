//! The generation pipeline: ordered stages that populate the backend.
//!
//! ## Stage order
//!
//! ```text
//! INIT → PROVISION_ACTORS → AUTHENTICATE_ACTORS → SEED_ORGANIZATION → SEED_PRODUCTS
//!      → SEED_PROVIDERS → SEED_STOCK_IN → SEED_STOCK_OUT → DONE
//! ```
//!
//! A [`PipelineMode`] selects which of these stages a run executes; the order
//! between the selected stages never changes. There is no backward transition,
//! no retry and no rollback: the first rejected call aborts the run and whatever
//! was created so far stays in the backend. An aborted pipeline refuses every
//! further stage; start a new one to seed again.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use stockseed_client::Backend;
use stockseed_core::{
    Actor, Brand, Catalogue, CreatedRecord, Credentials, EntityKind, Product, Provider,
    RandomSampler, RecordId, SeedError, SeedResult, Token,
};
use stockseed_factory::{ActorRole, FakeDataFactory, PayloadFactory};

use crate::catalog::EntityCatalog;
use crate::config::SeedConfig;
use crate::session::{ActorSession, SessionManager};

/// Pipeline states, in the only order they may be visited.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    ProvisionActors,
    AuthenticateActors,
    SeedOrganization,
    SeedProducts,
    SeedProviders,
    SeedStockIn,
    SeedStockOut,
    Done,
}

/// Which populator a run performs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Register the administrator and employees and fill in their profiles.
    Actors,
    /// Brands, catalogues, products and providers.
    Catalog,
    /// Entries with purchases, exits with sales.
    Stock,
    /// Everything, in dependency order.
    Full,
}

impl PipelineMode {
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            PipelineMode::Actors => &[Stage::ProvisionActors],
            PipelineMode::Catalog => &[
                Stage::AuthenticateActors,
                Stage::SeedOrganization,
                Stage::SeedProducts,
                Stage::SeedProviders,
            ],
            PipelineMode::Stock => &[
                Stage::AuthenticateActors,
                Stage::SeedStockIn,
                Stage::SeedStockOut,
            ],
            PipelineMode::Full => &[
                Stage::ProvisionActors,
                Stage::AuthenticateActors,
                Stage::SeedOrganization,
                Stage::SeedProducts,
                Stage::SeedProviders,
                Stage::SeedStockIn,
                Stage::SeedStockOut,
            ],
        }
    }

    /// Stock stages issue calls as random actors, so every actor must log in.
    fn needs_actor_pool(&self) -> bool {
        self.stages()
            .iter()
            .any(|s| matches!(s, Stage::SeedStockIn | Stage::SeedStockOut))
    }
}

/// A stock event and the data its line items need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Movement {
    /// An entry from `provider`, followed by purchases.
    StockIn { provider: Provider },
    /// An exit, followed by sales.
    StockOut,
}

impl Movement {
    fn kinds(&self) -> (EntityKind, EntityKind) {
        match self {
            Movement::StockIn { .. } => (EntityKind::Entry, EntityKind::Purchase),
            Movement::StockOut => (EntityKind::Exit, EntityKind::Sale),
        }
    }
}

/// Outcome of one [`GenerationPipeline::record_movement`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementSummary {
    pub kind: EntityKind,
    pub pk: RecordId,
    pub actor: String,
    pub lines: usize,
}

/// What a successful run created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub mode: PipelineMode,
    pub stages: Vec<Stage>,
    pub created: BTreeMap<EntityKind, usize>,
}

impl SeedReport {
    pub fn created(&self, kind: EntityKind) -> usize {
        self.created.get(&kind).copied().unwrap_or(0)
    }
}

/// Sequential seeding state machine.
pub struct GenerationPipeline {
    config: SeedConfig,
    mode: PipelineMode,
    backend: Arc<dyn Backend>,
    sessions: SessionManager,
    catalog: EntityCatalog,
    factory: Box<dyn PayloadFactory>,
    sampler: RandomSampler<StdRng>,
    state: Stage,
    /// Stage whose failure ended the run, if any.
    aborted: Option<Stage>,
    completed: Vec<Stage>,
    created: BTreeMap<EntityKind, usize>,
}

impl GenerationPipeline {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: SeedConfig,
        mode: PipelineMode,
    ) -> SeedResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mode,
            sessions: SessionManager::new(backend.clone()),
            catalog: EntityCatalog::new(backend.clone()),
            backend,
            factory: Box::new(FakeDataFactory::new()),
            sampler: RandomSampler::new(),
            state: Stage::Init,
            aborted: None,
            completed: Vec::new(),
            created: BTreeMap::new(),
        })
    }

    pub fn with_factory(mut self, factory: Box<dyn PayloadFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_sampler(mut self, sampler: RandomSampler<StdRng>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn state(&self) -> Stage {
        self.state
    }

    pub fn aborted(&self) -> Option<Stage> {
        self.aborted
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Execute every stage of the selected mode, in order.
    pub async fn run(&mut self) -> SeedResult<SeedReport> {
        info!(mode = ?self.mode, "seeding started");
        for &stage in self.mode.stages() {
            self.run_stage(stage).await?;
        }
        self.state = Stage::Done;

        let report = SeedReport {
            mode: self.mode,
            stages: self.completed.clone(),
            created: self.created.clone(),
        };
        info!(created = ?report.created, "seeding finished");
        Ok(report)
    }

    /// Execute a single stage.
    ///
    /// The stage must belong to the pipeline's mode and come strictly after the
    /// last one executed. Once a stage fails, nothing runs again.
    pub async fn run_stage(&mut self, stage: Stage) -> SeedResult<()> {
        if let Some(failed) = self.aborted {
            return Err(SeedError::StageOrder(format!(
                "cannot enter {stage:?}: run aborted during {failed:?}"
            )));
        }
        if !self.mode.stages().contains(&stage) {
            return Err(SeedError::StageOrder(format!(
                "{stage:?} is not part of {:?} mode",
                self.mode
            )));
        }
        if stage <= self.state {
            return Err(SeedError::StageOrder(format!(
                "cannot enter {stage:?} after {:?}",
                self.state
            )));
        }

        info!(?stage, "stage started");
        let result = match stage {
            Stage::ProvisionActors => self.provision_actors().await,
            Stage::AuthenticateActors => self.authenticate_actors().await,
            Stage::SeedOrganization => self.seed_organization().await,
            Stage::SeedProducts => self.seed_products().await,
            Stage::SeedProviders => self.seed_providers().await,
            Stage::SeedStockIn => self.seed_stock_in().await,
            Stage::SeedStockOut => self.seed_stock_out().await,
            Stage::Init | Stage::Done => Ok(()),
        };

        if let Err(e) = &result {
            self.aborted = Some(stage);
            error!(?stage, error = %e, "stage aborted; records created so far are kept");
            return result;
        }
        self.state = stage;
        self.completed.push(stage);
        info!(?stage, "stage completed");
        Ok(())
    }

    /// Create a stock event, capture its key, then create `lines` line items
    /// against it, all as `session`'s actor.
    ///
    /// Every line item samples its product from the backend afresh.
    pub async fn record_movement(
        &mut self,
        session: &ActorSession,
        movement: Movement,
        lines: usize,
    ) -> SeedResult<MovementSummary> {
        let (parent_kind, line_kind) = movement.kinds();
        let payload = match &movement {
            Movement::StockIn { provider } => self.factory.entry(provider),
            Movement::StockOut => self.factory.exit(),
        };

        let created = self.create(&session.token, parent_kind, payload).await?;
        let pk = serde_json::from_value::<CreatedRecord>(created)
            .map_err(|e| SeedError::decode(format!("{parent_kind} response has no key: {e}")))?
            .pk;

        for _ in 0..lines {
            let product: Product = self.catalog.sample_reference(&mut self.sampler).await?;
            let payload = match &movement {
                Movement::StockIn { .. } => self.factory.purchase(&pk, &product),
                Movement::StockOut => self.factory.sale(&pk, &product),
            };
            self.create(&session.token, line_kind, payload).await?;
        }

        Ok(MovementSummary {
            kind: parent_kind,
            pk,
            actor: session.username.clone(),
            lines,
        })
    }

    async fn create(
        &mut self,
        token: &Token,
        kind: EntityKind,
        payload: JsonValue,
    ) -> SeedResult<JsonValue> {
        let created = self.backend.create(token, kind, payload).await?;
        *self.created.entry(kind).or_default() += 1;
        debug!(%kind, "created");
        Ok(created)
    }

    fn admin_session(&self) -> SeedResult<ActorSession> {
        self.sessions.session_for(&self.config.admin.username)
    }

    async fn provision_actors(&mut self) -> SeedResult<()> {
        let superuser = self.config.superuser.clone();
        let root = self.sessions.acquire_token(&superuser).await?;

        let admin = self.config.admin.clone();
        let payload = self.factory.actor(&admin, ActorRole::Admin);
        self.create(&root, EntityKind::Actor, payload).await?;

        let mut provisioned = vec![admin];
        for _ in 0..self.config.employees {
            let username = self.factory.username();
            let employee = Credentials::new(username, self.config.actor_password.clone());
            let payload = self.factory.actor(&employee, ActorRole::Employee);
            self.create(&root, EntityKind::Actor, payload).await?;
            provisioned.push(employee);
        }

        // The superuser only registers; it never issues stock movements.
        self.sessions.release(&superuser.username);

        for credentials in &provisioned {
            let token = self.sessions.acquire_token(credentials).await?;
            let profile = self.factory.profile();
            self.backend.update_profile(&token, profile).await?;
            info!(username = %credentials.username, "profile filled in");
        }
        Ok(())
    }

    async fn authenticate_actors(&mut self) -> SeedResult<()> {
        let admin = self.config.admin.clone();
        let token = self.sessions.acquire_token(&admin).await?;
        self.catalog.authorize(token);

        if !self.mode.needs_actor_pool() {
            return Ok(());
        }

        let actors: Vec<Actor> = self.catalog.list_existing().await?;
        for actor in actors {
            if actor.username == admin.username || !self.config.pools_actor(&actor.username) {
                continue;
            }
            let credentials = Credentials::new(actor.username, self.config.actor_password.clone());
            self.sessions.acquire_token(&credentials).await?;
        }
        info!(pool = self.sessions.len(), "actor token pool ready");
        Ok(())
    }

    async fn seed_organization(&mut self) -> SeedResult<()> {
        let admin = self.admin_session()?;
        for _ in 0..self.config.brands_catalogues {
            let brand = self.factory.brand();
            self.create(&admin.token, EntityKind::Brand, brand).await?;
            let catalogue = self.factory.catalogue();
            self.create(&admin.token, EntityKind::Catalogue, catalogue).await?;
        }
        Ok(())
    }

    async fn seed_products(&mut self) -> SeedResult<()> {
        let admin = self.admin_session()?;
        for _ in 0..self.config.products {
            let brand: Brand = self.catalog.sample_reference(&mut self.sampler).await?;
            let catalogue: Catalogue = self.catalog.sample_reference(&mut self.sampler).await?;
            let payload = self.factory.product(&brand, &catalogue);
            self.create(&admin.token, EntityKind::Product, payload).await?;
        }
        Ok(())
    }

    async fn seed_providers(&mut self) -> SeedResult<()> {
        let admin = self.admin_session()?;
        for _ in 0..self.config.providers {
            let payload = self.factory.provider();
            self.create(&admin.token, EntityKind::Provider, payload).await?;
        }
        Ok(())
    }

    async fn seed_stock_in(&mut self) -> SeedResult<()> {
        let entries = self.config.entries;
        for n in 1..=entries {
            let provider: Provider = self.catalog.sample_reference(&mut self.sampler).await?;
            let session = self.sessions.random_token(&mut self.sampler)?;
            info!(entry = n, of = entries, actor = %session.username, "creating new entry");

            let lines = self.config.purchases_per_entry;
            self.record_movement(&session, Movement::StockIn { provider }, lines).await?;
        }
        Ok(())
    }

    async fn seed_stock_out(&mut self) -> SeedResult<()> {
        let exits = self.config.exits;
        let range = self.config.sales_per_exit;
        for n in 1..=exits {
            let session = self.sessions.random_token(&mut self.sampler)?;
            let lines = self.sampler.count_in(range.min, range.max)?;
            info!(
                exit = n,
                of = exits,
                sales = lines,
                actor = %session.username,
                "creating new exit"
            );

            self.record_movement(&session, Movement::StockOut, lines).await?;
        }
        Ok(())
    }
}
