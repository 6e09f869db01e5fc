//! Configuration management for DomainWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `domainwatch.toml` file and merge it
//! with environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// The number of concurrent update workers (the worker-pool size).
    pub concurrency: usize,
    /// Timeouts and comparison tolerances for the update pipeline.
    pub updater: UpdaterConfig,
    /// Storage backend selection and credentials.
    pub storage: StorageConfig,
    /// The domain-intelligence service endpoint.
    pub intel: IntelConfig,
    /// Outbound webhook notification settings.
    pub notifications: NotificationConfig,
}

/// Timeouts and tolerances for the update pipeline.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct UpdaterConfig {
    /// Hard timeout for one snapshot fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Hard timeout for one domain's whole differencer stage, in
    /// milliseconds.
    pub update_timeout_ms: u64,
    /// Expiry-date differences at or under this many days are jitter, not
    /// changes.
    pub expiry_threshold_days: i64,
    /// SSL validity-date jitter guard, in days.
    pub ssl_date_tolerance_days: i64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            update_timeout_ms: 7_000,
            expiry_threshold_days: 7,
            ssl_date_tolerance_days: 1,
        }
    }
}

/// Which storage adapter backs the pipeline.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process store; embedded mode and tests.
    Memory,
    /// PostgREST-compatible HTTP backend (managed or self-hosted).
    Rest,
}

/// Storage backend selection and credentials.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Base URL of the REST backend. Required for the `rest` backend.
    pub base_url: Option<String>,
    /// API key for the REST backend, if it requires one.
    pub api_key: Option<String>,
    /// The acting user in single-tenant deployments; the batch is scoped
    /// to this user's domains.
    pub default_user_id: String,
}

/// The domain-intelligence service endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IntelConfig {
    pub base_url: String,
    /// Transport-level request timeout, in milliseconds.
    pub request_timeout_ms: u64,
}

/// Outbound webhook notification settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Base URL of the push-webhook service.
    pub webhook_base_url: Option<String>,
    /// Topic appended to the base URL.
    pub topic: String,
    /// Delivery timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// the TOML file, `DOMAINWATCH_`-prefixed environment variables, and
    /// command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "domainwatch.toml".to_string());
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            // Allow overriding with environment variables, e.g.
            // DOMAINWATCH_CONCURRENCY=10
            .merge(Env::prefixed("DOMAINWATCH_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            concurrency: 5,
            updater: UpdaterConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                base_url: None,
                api_key: None,
                default_user_id: "00000000-0000-0000-0000-000000000000".to_string(),
            },
            intel: IntelConfig {
                base_url: "http://localhost:3000/api".to_string(),
                request_timeout_ms: 10_000,
            },
            notifications: NotificationConfig {
                enabled: false,
                webhook_base_url: None,
                topic: "domain-changes".to_string(),
                timeout_ms: 10_000,
            },
        }
    }
}
