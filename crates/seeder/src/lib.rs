//! `stockseed-seeder` — drives the retail API to populate it with synthetic,
//! referentially consistent data.
//!
//! - [`SessionManager`]: one token per actor, random token selection
//! - [`EntityCatalog`]: reads existing records back and samples parents
//! - [`GenerationPipeline`]: the ordered stages that create everything

pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod session;

pub use catalog::EntityCatalog;
pub use config::{ApiSettings, FileConfig, LineRange, SeedConfig};
pub use pipeline::{GenerationPipeline, Movement, MovementSummary, PipelineMode, SeedReport, Stage};
pub use session::{ActorSession, SessionManager};
