//! Run parameters.
//!
//! Defaults reproduce the volumes the populator has always used; every value
//! can be overridden from a JSON file or the command line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use stockseed_client::{AuthScheme, Endpoints};
use stockseed_core::{Credentials, SeedError, SeedResult};

/// Inclusive bounds of a random line-item count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub min: usize,
    pub max: usize,
}

/// Everything the pipeline needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Account allowed to register new actors.
    pub superuser: Credentials,
    /// Administrator that creates catalog records.
    pub admin: Credentials,
    /// Password shared by every actor in the stock-movement token pool.
    pub actor_password: String,
    /// Actors never logged into the token pool (the superuser always is skipped).
    pub excluded_actors: Vec<String>,
    /// Employees registered next to the administrator.
    pub employees: usize,
    /// Brand/catalogue pairs.
    pub brands_catalogues: usize,
    pub products: usize,
    pub providers: usize,
    pub entries: usize,
    pub purchases_per_entry: usize,
    pub exits: usize,
    pub sales_per_exit: LineRange,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            superuser: Credentials::new("root", "root1234"),
            admin: Credentials::new("admin_dp", "admin1234admin"),
            actor_password: "admin1234admin".to_string(),
            excluded_actors: Vec::new(),
            employees: 2,
            brands_catalogues: 10,
            products: 50,
            providers: 5,
            entries: 5,
            purchases_per_entry: 100,
            exits: 80,
            sales_per_exit: LineRange { min: 1, max: 5 },
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> SeedResult<()> {
        let range = self.sales_per_exit;
        if range.min == 0 {
            return Err(SeedError::config("every exit needs at least one sale"));
        }
        if range.min > range.max {
            return Err(SeedError::config(format!(
                "sales_per_exit min ({}) exceeds max ({})",
                range.min, range.max
            )));
        }
        if self.admin.username.is_empty() || self.superuser.username.is_empty() {
            return Err(SeedError::config("admin and superuser usernames are required"));
        }
        if self.admin.username == self.superuser.username {
            return Err(SeedError::config("admin and superuser must be different accounts"));
        }
        Ok(())
    }

    /// Whether `username` may join the random token pool.
    pub fn pools_actor(&self, username: &str) -> bool {
        username != self.superuser.username && !self.excluded_actors.iter().any(|u| u == username)
    }
}

/// How to reach the backend over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: Option<String>,
    pub endpoints: Endpoints,
    pub auth_scheme: AuthScheme,
}

/// Shape of the `--config` JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub seed: SeedConfig,
    pub api: ApiSettings,
}

impl FileConfig {
    pub fn from_json_str(raw: &str) -> SeedResult<Self> {
        serde_json::from_str(raw).map_err(|e| SeedError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> SeedResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SeedError::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }
}
