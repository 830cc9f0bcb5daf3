//! `stockseed-core` — records, identifiers and the randomness primitive shared by
//! every seeding crate.
//!
//! This crate is **pure** (no IO, no HTTP). Everything that talks to the backend
//! lives in `stockseed-client`.

pub mod credentials;
pub mod entity;
pub mod error;
pub mod id;
pub mod sampler;

pub use credentials::{Credentials, Token};
pub use entity::{
    Actor, Brand, Catalogue, CatalogEntity, CreatedRecord, EntityKind, Product, Provider,
};
pub use error::{SeedError, SeedResult};
pub use id::RecordId;
pub use sampler::RandomSampler;
