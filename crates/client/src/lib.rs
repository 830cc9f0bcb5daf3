//! `stockseed-client` — the seeder's only window onto the retail backend.
//!
//! The pipeline talks to a [`Backend`]; production runs use [`HttpBackend`],
//! tests and dry runs use [`InMemoryBackend`].

pub mod backend;
pub mod http;
pub mod in_memory;

pub use backend::Backend;
pub use http::{AuthScheme, Endpoints, HttpBackend};
pub use in_memory::{InMemoryBackend, JournalEntry};
