//! # Scan Configuration
//!
//! Per-run configuration consumed by the data source services:
//!
//! - the root domains in scope, each with a compiled name validator
//! - the API credentials for each source, looked up by service name
//! - the HTTP request timeout
//!
//! ## File Format
//!
//! ```toml
//! domains = ["example.com"]
//! timeout_secs = 30
//!
//! [data_sources.BinaryEdge]
//! key = "..."
//! ```
//!
//! `HARVEST_<SOURCE>_KEY` environment variables override file credentials.

use crate::entities::{normalize_name, ApiKey};
use crate::errors::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of credential override environment variables.
pub const ENV_PREFIX: &str = "HARVEST_";

/// Suffix of credential override environment variables.
pub const ENV_KEY_SUFFIX: &str = "_KEY";

/// One or more DNS labels, each followed by a dot.
const SUBDOMAIN_LABELS: &str = r"(?:(?:[a-z0-9_]|[a-z0-9_][a-z0-9_-]{0,61}[a-z0-9])\.)+";

/// Compile the validator for names under `domain`.
///
/// The pattern is anchored and case-insensitive: it accepts one or more
/// labels followed by the root domain, and nothing else.
pub fn subdomain_regex(domain: &str) -> Result<Regex, regex::Error> {
    let root = regex::escape(&normalize_name(domain));
    Regex::new(&format!("(?i)^{SUBDOMAIN_LABELS}{root}$"))
}

/// On-disk representation.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    data_sources: HashMap<String, ApiKey>,
}

/// Complete scan configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root domains, normalized, in insertion order.
    domains: Vec<String>,
    /// Compiled validator per root domain.
    validators: HashMap<String, Regex>,
    /// Credentials keyed by lowercase service name.
    api_keys: HashMap<String, ApiKey>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            validators: HashMap::new(),
            api_keys: HashMap::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ScanConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;

        let mut config = Self::new();
        if let Some(secs) = file.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        for domain in &file.domains {
            config.add_domain(domain)?;
        }
        for (service, key) in file.data_sources {
            config.set_api_key(&service, key);
        }

        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml_str(&input)?;
        info!(
            path = %path.display(),
            domains = config.domains.len(),
            credentials = config.api_keys.len(),
            "Loaded scan configuration"
        );
        Ok(config)
    }

    /// Add a root domain to the scope and compile its validator.
    ///
    /// Adding a domain twice is a no-op.
    pub fn add_domain(&mut self, domain: &str) -> Result<(), ConfigError> {
        let domain = normalize_name(domain);
        if !is_valid_domain(&domain) {
            return Err(ConfigError::InvalidDomain(domain));
        }
        if self.validators.contains_key(&domain) {
            return Ok(());
        }

        let validator = subdomain_regex(&domain).map_err(|source| ConfigError::Validator {
            domain: domain.clone(),
            source,
        })?;

        debug!(domain = %domain, "Domain added to scope");
        self.validators.insert(domain.clone(), validator);
        self.domains.push(domain);
        Ok(())
    }

    /// Root domains in scope.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Validator for a root domain, or `None` if the domain is not in scope.
    pub fn domain_regex(&self, domain: &str) -> Option<&Regex> {
        self.validators.get(&normalize_name(domain))
    }

    /// The in-scope root domain that `name` belongs to.
    pub fn which_domain(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.domains
            .iter()
            .find(|d| name == **d || name.ends_with(&format!(".{d}")))
            .map(String::as_str)
    }

    /// Store credentials for a service (case-insensitive name).
    pub fn set_api_key(&mut self, service: &str, key: ApiKey) {
        self.api_keys.insert(service.to_ascii_lowercase(), key);
    }

    /// Credentials for a service, if any were supplied.
    pub fn api_key(&self, service: &str) -> Option<&ApiKey> {
        self.api_keys.get(&service.to_ascii_lowercase())
    }

    /// Apply `HARVEST_<SOURCE>_KEY` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `HARVEST_<SOURCE>_KEY` overrides from an arbitrary variable set.
    ///
    /// An override replaces only the primary key of an existing credential.
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(service) = name
                .strip_prefix(ENV_PREFIX)
                .and_then(|rest| rest.strip_suffix(ENV_KEY_SUFFIX))
            else {
                continue;
            };
            if service.is_empty() || value.trim().is_empty() {
                continue;
            }

            let entry = self
                .api_keys
                .entry(service.to_ascii_lowercase())
                .or_default();
            entry.key = value.trim().to_string();
            debug!(service = %service, "API key overridden from environment");
        }
    }
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.len() > 253 || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}
