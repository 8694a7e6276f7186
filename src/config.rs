//! Layered application configuration.
//!
//! Defaults, then an optional config file, then `WATCHDECK_*` environment
//! overrides. The enabled flag mirrors the persisted controller setting
//! and defaults to true when unset.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use watchdeck_bridge::AgentConfig;
use watchdeck_suppressor::SuppressorConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Master switch; the agent comes up only when true.
    pub enabled: bool,
    /// Navigation target for the `goHome` action.
    pub home_url: String,
    /// Mutation debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Proactive re-sweep cadence in seconds.
    pub resweep_secs: u64,
    /// Control-surface status poll cadence in milliseconds.
    pub status_poll_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            home_url: "https://www.netflix.com/browse".to_string(),
            debounce_ms: 100,
            resweep_secs: 30,
            status_poll_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Load configuration, optionally from an explicit file path. Without
    /// one, `watchdeck/config.toml` under the user config directory is
    /// used when present.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .set_default("enabled", defaults.enabled)?
            .set_default("home_url", defaults.home_url.clone())?
            .set_default("debounce_ms", defaults.debounce_ms)?
            .set_default("resweep_secs", defaults.resweep_secs)?
            .set_default("status_poll_ms", defaults.status_poll_ms)?;

        match path {
            Some(explicit) => {
                builder = builder.add_source(File::from(explicit.clone()));
            }
            None => {
                if let Some(dir) = dirs::config_dir() {
                    let default_file = dir.join("watchdeck").join("config.toml");
                    if default_file.exists() {
                        builder = builder.add_source(File::from(default_file));
                    }
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("WATCHDECK"));

        let config = builder.build().context("building configuration")?;
        config
            .try_deserialize::<AppConfig>()
            .context("deserializing configuration")
    }

    pub fn agent_config(&self) -> Result<AgentConfig> {
        let home_url = Url::parse(&self.home_url)
            .with_context(|| format!("invalid home_url `{}`", self.home_url))?;
        Ok(AgentConfig {
            home_url,
            suppressor: SuppressorConfig {
                debounce: Duration::from_millis(self.debounce_ms),
                resweep: Duration::from_secs(self.resweep_secs.max(1)),
            },
            status_poll: Duration::from_millis(self.status_poll_ms.max(1)),
        })
    }
}
