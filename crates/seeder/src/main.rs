use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use stockseed_client::{AuthScheme, Backend, HttpBackend, InMemoryBackend};
use stockseed_core::EntityKind;
use stockseed_observability::LogFormat;
use stockseed_seeder::{FileConfig, GenerationPipeline, PipelineMode, SeedConfig, Stage};

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "stockseed")]
#[command(about = "Populate a retail-inventory backend with synthetic, referentially consistent data")]
struct Cli {
    #[command(subcommand)]
    mode: ModeCommand,

    /// Base URL of the backend API
    #[arg(long, env = "STOCKSEED_API_URL", global = true)]
    api_url: Option<String>,

    /// JSON file with `seed` and `api` sections
    #[arg(long, env = "STOCKSEED_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Authorization header scheme: bearer or token
    #[arg(long, global = true)]
    auth_scheme: Option<AuthScheme>,

    /// Log output: json or pretty
    #[arg(long, default_value = "json", global = true)]
    log_format: LogFormat,

    /// Run against an in-memory backend instead of the API
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand, Clone, Copy)]
enum ModeCommand {
    /// Register the administrator and employees, then fill in their profiles
    Actors,
    /// Create brands, catalogues, products and providers
    Catalog,
    /// Create entries with purchases and exits with sales
    Stock,
    /// Run every stage in dependency order
    All,
}

impl From<ModeCommand> for PipelineMode {
    fn from(value: ModeCommand) -> Self {
        match value {
            ModeCommand::Actors => PipelineMode::Actors,
            ModeCommand::Catalog => PipelineMode::Catalog,
            ModeCommand::Stock => PipelineMode::Stock,
            ModeCommand::All => PipelineMode::Full,
        }
    }
}

/// Command-line overrides, applied on top of the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Brand/catalogue pairs to create
    #[arg(long, global = true)]
    brands: Option<usize>,
    #[arg(long, global = true)]
    products: Option<usize>,
    #[arg(long, global = true)]
    providers: Option<usize>,
    #[arg(long, global = true)]
    entries: Option<usize>,
    #[arg(long, global = true)]
    purchases_per_entry: Option<usize>,
    #[arg(long, global = true)]
    exits: Option<usize>,
    /// Fewest sales per exit
    #[arg(long, global = true)]
    sales_min: Option<usize>,
    /// Most sales per exit
    #[arg(long, global = true)]
    sales_max: Option<usize>,
    #[arg(long, global = true)]
    employees: Option<usize>,
    #[arg(long, env = "STOCKSEED_ADMIN_USERNAME", global = true)]
    admin_username: Option<String>,
    #[arg(long, env = "STOCKSEED_ADMIN_PASSWORD", hide_env_values = true, global = true)]
    admin_password: Option<String>,
    #[arg(long, env = "STOCKSEED_SUPERUSER_USERNAME", global = true)]
    superuser_username: Option<String>,
    #[arg(long, env = "STOCKSEED_SUPERUSER_PASSWORD", hide_env_values = true, global = true)]
    superuser_password: Option<String>,
    /// Password every pooled actor logs in with
    #[arg(long, env = "STOCKSEED_ACTOR_PASSWORD", hide_env_values = true, global = true)]
    actor_password: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut SeedConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut config.brands_catalogues, self.brands);
        set(&mut config.products, self.products);
        set(&mut config.providers, self.providers);
        set(&mut config.entries, self.entries);
        set(&mut config.purchases_per_entry, self.purchases_per_entry);
        set(&mut config.exits, self.exits);
        set(&mut config.sales_per_exit.min, self.sales_min);
        set(&mut config.sales_per_exit.max, self.sales_max);
        set(&mut config.employees, self.employees);
        set(&mut config.admin.username, self.admin_username);
        set(&mut config.admin.password, self.admin_password);
        set(&mut config.superuser.username, self.superuser_username);
        set(&mut config.superuser.password, self.superuser_password);
        set(&mut config.actor_password, self.actor_password);
    }
}

/// In-memory backend holding the accounts the selected mode expects to exist.
///
/// Stock-only runs get one brand, catalogue, product and provider so movements
/// have something to reference.
fn dry_run_backend(config: &SeedConfig, mode: PipelineMode) -> Result<InMemoryBackend> {
    let stages = mode.stages();
    let superuser = &config.superuser;
    let mut backend =
        InMemoryBackend::new().with_user(&superuser.username, &superuser.password, true);
    if !stages.contains(&Stage::ProvisionActors) {
        backend = backend.with_user(&config.admin.username, &config.admin.password, true);
    }

    if stages.contains(&Stage::SeedStockIn) && !stages.contains(&Stage::SeedProducts) {
        backend.preload(EntityKind::Brand, json!({ "name": "Dry Run Brand" }))?;
        backend.preload(EntityKind::Catalogue, json!({ "name": "Dry Run Catalogue" }))?;
        backend.preload(
            EntityKind::Product,
            json!({
                "code": "PRD-DRYRUN",
                "brand_name": "Dry Run Brand",
                "catalogue_name": "Dry Run Catalogue",
            }),
        )?;
        backend.preload(EntityKind::Provider, json!({ "name": "Dry Run Supply" }))?;
    }
    Ok(backend)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    stockseed_observability::init(cli.log_format);

    let mut file = match &cli.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FileConfig::default(),
    };
    cli.overrides.apply(&mut file.seed);
    let mode = PipelineMode::from(cli.mode);

    let backend: Arc<dyn Backend> = if cli.dry_run {
        tracing::warn!("dry run: records are created in memory only");
        Arc::new(dry_run_backend(&file.seed, mode)?)
    } else {
        let base_url = cli
            .api_url
            .or(file.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let scheme = cli.auth_scheme.unwrap_or(file.api.auth_scheme);
        tracing::info!(%base_url, scheme = scheme.as_str(), "using HTTP backend");
        Arc::new(
            HttpBackend::new(base_url)
                .with_endpoints(file.api.endpoints)
                .with_auth_scheme(scheme),
        )
    };

    let mut pipeline = GenerationPipeline::new(backend, file.seed, mode)?;
    let report = pipeline.run().await.context("seeding aborted")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
