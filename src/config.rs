//! Service configuration: optional YAML file, then environment overrides.
//!
//! Environment variables:
//!   BPA_CONFIG_PATH           YAML file loaded before env overrides (optional)
//!   BPA_BIND_ADDR             listen address (default: 0.0.0.0:8080)
//!   BPA_BASE_URL              BPA engine base URL (default: http://localhost:9090)
//!   BPA_MODULE_NAME           module name sent with every perform request
//!   BPA_SERVICE_TOKEN         token for calls made without a caller token
//!   BPA_REQUEST_TIMEOUT_SECS  engine HTTP timeout (default: 30)
//!   BPA_EVENT_BUFFER          undelivered event capacity (default: 1024)
//!   BPA_EVENT_WORKERS         concurrent event handlers (default: 4)

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_MODULE_NAME: &str = "bpa_backend_starter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub bpa_base_url: String,
    pub module_name: String,
    pub service_token: String,
    pub request_timeout_secs: u64,
    pub event_buffer: usize,
    pub event_workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            bpa_base_url: "http://localhost:9090".to_string(),
            module_name: DEFAULT_MODULE_NAME.to_string(),
            service_token: String::new(),
            request_timeout_secs: 30,
            event_buffer: 1024,
            event_workers: 4,
        }
    }
}

impl ServiceConfig {
    /// Load `.env`, the optional YAML file named by `BPA_CONFIG_PATH`, then
    /// apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();

        let base = match std::env::var("BPA_CONFIG_PATH") {
            Ok(path) => Self::load_from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BPA_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("BPA_BASE_URL") {
            self.bpa_base_url = v;
        }
        if let Some(v) = lookup("BPA_MODULE_NAME") {
            self.module_name = v;
        }
        if let Some(v) = lookup("BPA_SERVICE_TOKEN") {
            self.service_token = v;
        }
        if let Some(v) = lookup("BPA_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("BPA_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("BPA_EVENT_BUFFER") {
            self.event_buffer = parse_number("BPA_EVENT_BUFFER", &v)?;
        }
        if let Some(v) = lookup("BPA_EVENT_WORKERS") {
            self.event_workers = parse_number("BPA_EVENT_WORKERS", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_buffer == 0 {
            bail!("event_buffer must be at least 1");
        }
        if self.event_workers == 0 {
            bail!("event_workers must be at least 1");
        }
        if self.module_name.trim().is_empty() {
            bail!("module_name must not be empty");
        }
        self.base_url()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.bpa_base_url)
            .with_context(|| format!("Invalid BPA base URL '{}'", self.bpa_base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number, got '{}'", name, value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
