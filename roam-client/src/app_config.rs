use roam_core::{SearchPolicy, TypeAheadConfig};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub search_policy: SearchPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Defaults, then `{dir}/default`, `{dir}/{RUN_MODE}`, `{dir}/local`, then
    /// `ROAM__SECTION__KEY` environment variables.
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("api.base_url", "http://localhost:8080")?
            .set_default("api.timeout_secs", 15)?
            .set_default("search.debounce_ms", 300)?
            .set_default("search.min_query_len", 3)?
            .set_default("search.search_policy", "selected_only")?
            .set_default("session.path", ".roam/session.json")?
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(&run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::from(dir.join("local")).required(false))
            .add_source(
                config::Environment::with_prefix("ROAM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn type_ahead(&self) -> TypeAheadConfig {
        TypeAheadConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            min_query_len: self.search.min_query_len,
            policy: self.search.search_policy,
        }
    }
}
