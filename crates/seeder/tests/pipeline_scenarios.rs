use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

use stockseed_client::{Backend, InMemoryBackend, JournalEntry};
use stockseed_core::{Credentials, EntityKind, RandomSampler, SeedError, SeedResult, Token};
use stockseed_seeder::{GenerationPipeline, LineRange, PipelineMode, SeedConfig, Stage};

fn config() -> SeedConfig {
    SeedConfig {
        employees: 2,
        brands_catalogues: 3,
        products: 8,
        providers: 3,
        entries: 4,
        purchases_per_entry: 6,
        exits: 10,
        sales_per_exit: LineRange { min: 1, max: 5 },
        ..SeedConfig::default()
    }
}

fn pipeline(
    backend: Arc<dyn Backend>,
    config: SeedConfig,
    mode: PipelineMode,
) -> GenerationPipeline {
    GenerationPipeline::new(backend, config, mode)
        .unwrap()
        .with_sampler(RandomSampler::from_rng(StdRng::seed_from_u64(2024)))
}

fn fresh_backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::new().with_user("root", "root1234", true))
}

fn of_kind(journal: &[JournalEntry], kind: EntityKind) -> Vec<&JournalEntry> {
    journal.iter().filter(|j| j.kind == kind).collect()
}

/// Sequence number of the first `parent` record whose `field` equals `value`.
fn created_at(
    journal: &[JournalEntry],
    parent: EntityKind,
    field: &str,
    value: &Value,
) -> Option<u64> {
    journal
        .iter()
        .find(|j| j.kind == parent && j.record.get(field) == Some(value))
        .map(|j| j.sequence)
}

#[tokio::test]
async fn full_run_creates_configured_volumes_in_dependency_order() {
    let backend = fresh_backend();
    let cfg = config();
    let mut p = pipeline(backend.clone(), cfg.clone(), PipelineMode::Full);

    let report = p.run().await.unwrap();
    assert_eq!(p.state(), Stage::Done);
    assert_eq!(report.stages, PipelineMode::Full.stages().to_vec());

    let journal = backend.journal();

    // Actors: administrator plus employees.
    assert_eq!(of_kind(&journal, EntityKind::Actor).len(), 1 + cfg.employees);

    // Organization: exactly N brands and N catalogues.
    assert_eq!(of_kind(&journal, EntityKind::Brand).len(), cfg.brands_catalogues);
    assert_eq!(of_kind(&journal, EntityKind::Catalogue).len(), cfg.brands_catalogues);
    assert_eq!(report.created(EntityKind::Brand), cfg.brands_catalogues);

    // Products reference brands/catalogues created before them.
    let products = of_kind(&journal, EntityKind::Product);
    assert_eq!(products.len(), cfg.products);
    for product in &products {
        let brand = created_at(&journal, EntityKind::Brand, "name", &product.record["brand_name"]);
        let catalogue = created_at(
            &journal,
            EntityKind::Catalogue,
            "name",
            &product.record["catalogue_name"],
        );
        assert!(brand.is_some_and(|s| s < product.sequence));
        assert!(catalogue.is_some_and(|s| s < product.sequence));
    }

    // Each entry is followed by exactly P purchases pointing at it.
    let entries = of_kind(&journal, EntityKind::Entry);
    assert_eq!(entries.len(), cfg.entries);
    let purchases = of_kind(&journal, EntityKind::Purchase);
    assert_eq!(purchases.len(), cfg.entries * cfg.purchases_per_entry);
    for entry in &entries {
        let lines: Vec<_> = purchases
            .iter()
            .filter(|p| p.record["entry_id"] == json!(entry.pk))
            .collect();
        assert_eq!(lines.len(), cfg.purchases_per_entry);
        assert!(lines.iter().all(|l| l.sequence > entry.sequence));
        assert!(lines.iter().all(|l| l.actor == entry.actor));
    }

    // Each exit has 1..=5 sales pointing at it, created after it.
    let exits = of_kind(&journal, EntityKind::Exit);
    assert_eq!(exits.len(), cfg.exits);
    let sales = of_kind(&journal, EntityKind::Sale);
    for exit in &exits {
        let lines: Vec<_> = sales
            .iter()
            .filter(|s| s.record["exit_id"] == json!(exit.pk))
            .collect();
        assert!((1..=5).contains(&lines.len()), "exit {} has {} sales", exit.pk, lines.len());
        assert!(lines.iter().all(|l| l.sequence > exit.sequence));
    }
    assert_eq!(report.created(EntityKind::Sale), sales.len());

    // The superuser registers actors but never moves stock.
    assert!(journal
        .iter()
        .filter(|j| matches!(j.kind, EntityKind::Entry | EntityKind::Exit))
        .all(|j| j.actor != "root"));
}

#[tokio::test]
async fn products_on_an_empty_backend_fail_instead_of_dangling() {
    let backend = Arc::new(InMemoryBackend::new().with_user("admin_dp", "admin1234admin", true));
    let mut p = pipeline(backend.clone(), config(), PipelineMode::Catalog);

    p.run_stage(Stage::AuthenticateActors).await.unwrap();
    let err = p.run_stage(Stage::SeedProducts).await.unwrap_err();

    assert_eq!(err, SeedError::empty_catalog("brand"));
    assert_eq!(backend.count(EntityKind::Product), 0);
    assert_eq!(p.state(), Stage::AuthenticateActors);
}

#[tokio::test]
async fn rejected_login_stops_before_any_stage_creates_data() {
    let backend = Arc::new(InMemoryBackend::new().with_user("admin_dp", "admin1234admin", true));
    let mut cfg = config();
    cfg.admin = Credentials::new("admin_dp", "wrong-password");
    let mut p = pipeline(backend.clone(), cfg, PipelineMode::Catalog);

    let err = p.run().await.unwrap_err();
    assert!(matches!(err, SeedError::Authentication { ref username, .. } if username == "admin_dp"));
    assert!(backend.journal().is_empty());
    assert_eq!(p.state(), Stage::Init);
}

#[tokio::test]
async fn stock_movements_eventually_cover_every_provider_and_actor() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_user("root", "root1234", true)
            .with_user("admin_dp", "admin1234admin", true)
            .with_user("clerk", "admin1234admin", false),
    );
    backend.preload(EntityKind::Brand, json!({ "name": "Acme" })).unwrap();
    backend.preload(EntityKind::Catalogue, json!({ "name": "Tools" })).unwrap();
    backend
        .preload(
            EntityKind::Product,
            json!({ "code": "P1", "brand_name": "Acme", "catalogue_name": "Tools" }),
        )
        .unwrap();
    for name in ["Northwind", "Contoso", "Globex"] {
        backend.preload(EntityKind::Provider, json!({ "name": name })).unwrap();
    }

    let cfg = SeedConfig {
        entries: 60,
        purchases_per_entry: 1,
        exits: 0,
        ..config()
    };
    let mut p = pipeline(backend.clone(), cfg, PipelineMode::Stock);
    p.run().await.unwrap();

    // root is the superuser and stays out of the pool.
    let pool: BTreeSet<_> = p.sessions().usernames().map(str::to_string).collect();
    assert_eq!(pool, BTreeSet::from(["admin_dp".to_string(), "clerk".to_string()]));

    let entries = backend.records(EntityKind::Entry);
    let providers: BTreeSet<String> = entries.iter().map(|e| e["provider_name"].to_string()).collect();
    let actors: BTreeSet<String> = entries.iter().map(|e| e["created_by"].to_string()).collect();
    assert_eq!(providers.len(), 3);
    assert_eq!(actors.len(), 2);
}

#[tokio::test]
async fn actors_mode_registers_and_profiles_everyone() {
    let backend = fresh_backend();
    let cfg = config();
    let mut p = pipeline(backend.clone(), cfg.clone(), PipelineMode::Actors);
    let report = p.run().await.unwrap();

    assert_eq!(report.created(EntityKind::Actor), 1 + cfg.employees);
    assert!(backend.is_admin("admin_dp"));
    assert!(backend.profile("admin_dp").is_some());

    let employees: Vec<_> = backend
        .usernames()
        .into_iter()
        .filter(|u| u != "root" && u != "admin_dp")
        .collect();
    assert_eq!(employees.len(), cfg.employees);
    for employee in &employees {
        assert!(!backend.is_admin(employee));
        assert!(backend.profile(employee).is_some());
    }
    assert!(p.sessions().token_for("root").is_none());
}

#[tokio::test]
async fn rerunning_actor_provisioning_fails_fast() {
    let backend = fresh_backend();
    pipeline(backend.clone(), config(), PipelineMode::Actors)
        .run()
        .await
        .unwrap();

    let err = pipeline(backend.clone(), config(), PipelineMode::Actors)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Validation { kind: EntityKind::Actor, .. }));
    assert_eq!(backend.count(EntityKind::Actor), 1 + 1 + config().employees);
}

/// Delegates to an in-memory backend but rejects one creation of `kind`.
struct RejectNth {
    inner: Arc<InMemoryBackend>,
    kind: EntityKind,
    reject_at: usize,
    seen: AtomicUsize,
    rejected: AtomicBool,
    calls_after_rejection: AtomicUsize,
}

#[async_trait]
impl Backend for RejectNth {
    async fn login(&self, credentials: &Credentials) -> SeedResult<Token> {
        self.inner.login(credentials).await
    }

    async fn create(&self, token: &Token, kind: EntityKind, payload: Value) -> SeedResult<Value> {
        if self.rejected.load(Ordering::SeqCst) {
            self.calls_after_rejection.fetch_add(1, Ordering::SeqCst);
        }
        if kind == self.kind {
            let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.reject_at {
                self.rejected.store(true, Ordering::SeqCst);
                return Err(SeedError::validation(kind, "name: this field is invalid"));
            }
        }
        self.inner.create(token, kind, payload).await
    }

    async fn update_profile(&self, token: &Token, profile: Value) -> SeedResult<Value> {
        self.inner.update_profile(token, profile).await
    }

    async fn list(&self, token: Option<&Token>, kind: EntityKind) -> SeedResult<Vec<Value>> {
        self.inner.list(token, kind).await
    }
}

#[tokio::test]
async fn first_rejection_aborts_without_rollback() {
    let inner = Arc::new(InMemoryBackend::new().with_user("admin_dp", "admin1234admin", true));
    let backend = Arc::new(RejectNth {
        inner: inner.clone(),
        kind: EntityKind::Brand,
        reject_at: 2,
        seen: AtomicUsize::new(0),
        rejected: AtomicBool::new(false),
        calls_after_rejection: AtomicUsize::new(0),
    });

    let mut p = pipeline(backend.clone(), config(), PipelineMode::Catalog);
    let err = p.run().await.unwrap_err();

    assert!(matches!(err, SeedError::Validation { kind: EntityKind::Brand, .. }));
    assert_eq!(p.state(), Stage::AuthenticateActors);

    // Nothing after the rejected call; nothing before it undone.
    let counts: BTreeMap<_, _> = [EntityKind::Brand, EntityKind::Catalogue, EntityKind::Product]
        .into_iter()
        .map(|k| (k, inner.count(k)))
        .collect();
    assert_eq!(counts[&EntityKind::Brand], 1);
    assert_eq!(counts[&EntityKind::Catalogue], 1);
    assert_eq!(counts[&EntityKind::Product], 0);
    assert_eq!(backend.calls_after_rejection.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_stage_is_not_repeated_on_top_of_partial_data() {
    let inner = Arc::new(InMemoryBackend::new().with_user("admin_dp", "admin1234admin", true));
    let backend = Arc::new(RejectNth {
        inner: inner.clone(),
        kind: EntityKind::Brand,
        reject_at: 2,
        seen: AtomicUsize::new(0),
        rejected: AtomicBool::new(false),
        calls_after_rejection: AtomicUsize::new(0),
    });

    let mut p = pipeline(backend.clone(), config(), PipelineMode::Catalog);
    p.run_stage(Stage::AuthenticateActors).await.unwrap();
    let first = p.run_stage(Stage::SeedOrganization).await.unwrap_err();
    assert!(matches!(first, SeedError::Validation { kind: EntityKind::Brand, .. }));

    let again = p.run_stage(Stage::SeedOrganization).await.unwrap_err();
    assert!(matches!(again, SeedError::StageOrder(_)));
    assert_eq!(p.aborted(), Some(Stage::SeedOrganization));

    assert_eq!(inner.count(EntityKind::Brand), 1);
    assert_eq!(inner.count(EntityKind::Catalogue), 1);
    assert_eq!(backend.calls_after_rejection.load(Ordering::SeqCst), 0);
}
