//! # Runtime Configuration
//!
//! Merges the three configuration layers into one [`RuntimeConfig`]:
//!
//! 1. the TOML file named by `--config` (optional)
//! 2. `HARVEST_<SOURCE>_KEY` environment variables
//! 3. command line flags
//!
//! Later layers win.

use crate::cli::Cli;
use shared_types::{ConfigError, ScanConfig};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Domains, validators, credentials and request timeout.
    pub scan: ScanConfig,
    /// Overall scan deadline. `None` waits for every source.
    pub deadline: Option<Duration>,
    /// Data sources to run. Empty means all of them.
    pub sources: Vec<String>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error(transparent)]
    Scan(#[from] ConfigError),

    #[error("No domains to scan: pass -d <DOMAIN> or list domains in the config file")]
    NoDomains,
}

impl RuntimeConfig {
    /// Resolve the configuration from the command line and the process
    /// environment.
    pub fn from_cli(cli: &Cli) -> Result<Self, RuntimeConfigError> {
        Self::resolve(cli, std::env::vars())
    }

    /// Resolve the configuration from the command line and an explicit
    /// variable set.
    pub fn resolve<I>(cli: &Cli, vars: I) -> Result<Self, RuntimeConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut scan = match &cli.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::new(),
        };

        scan.apply_overrides(vars);

        for domain in &cli.domains {
            scan.add_domain(domain)?;
        }

        if let Some(secs) = cli.request_timeout {
            scan.request_timeout = Duration::from_secs(secs);
        }

        if scan.domains().is_empty() {
            return Err(RuntimeConfigError::NoDomains);
        }

        info!(
            domains = scan.domains().len(),
            request_timeout_secs = scan.request_timeout.as_secs(),
            deadline_secs = cli.timeout,
            "Runtime configuration resolved"
        );

        Ok(Self {
            scan,
            deadline: cli.timeout.map(Duration::from_secs),
            sources: cli.sources.clone(),
        })
    }
}
