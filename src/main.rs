//! DomainWatch - Domain portfolio updater
//!
//! Scheduled batch entry point: loads the configuration, wires the
//! configured storage/intel/notification adapters together, runs one
//! update batch, and prints the JSON report to stdout.

use anyhow::{bail, Context, Result};
use clap::Parser;
use domainwatch::{
    cli::Cli,
    config::{Config, StorageBackend},
    core::{DomainIntel, NotificationSender},
    intel::HttpDomainIntel,
    notification::WebhookClient,
    orchestrator::Orchestrator,
    store::{DomainStore, MemoryStore, RestStore},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("DomainWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Concurrency: {}", config.concurrency);
    info!("Fetch Timeout: {}ms", config.updater.fetch_timeout_ms);
    info!("Update Timeout: {}ms", config.updater.update_timeout_ms);
    info!(
        "Expiry Threshold: {} days",
        config.updater.expiry_threshold_days
    );
    info!("Storage Backend: {:?}", config.storage.backend);
    info!("Acting User: {}", config.storage.default_user_id);
    info!("Intel Endpoint: {}", config.intel.base_url);
    info!(
        "Notifications: {}",
        if config.notifications.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("-------------------------------------------------------");

    let store: Arc<dyn DomainStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Rest => {
            let Some(base_url) = &config.storage.base_url else {
                bail!("storage.base_url is required for the rest backend");
            };
            Arc::new(RestStore::new(base_url, config.storage.api_key.clone())?)
        }
    };

    let intel: Arc<dyn DomainIntel> = Arc::new(HttpDomainIntel::new(
        &config.intel.base_url,
        Duration::from_millis(config.intel.request_timeout_ms),
    )?);

    let notifier: Option<Arc<dyn NotificationSender>> = if config.notifications.enabled {
        let Some(base_url) = &config.notifications.webhook_base_url else {
            bail!("notifications.webhook_base_url is required when notifications are enabled");
        };
        Some(Arc::new(WebhookClient::new(
            base_url,
            &config.notifications.topic,
            Duration::from_millis(config.notifications.timeout_ms),
        )?))
    } else {
        None
    };

    let orchestrator = Orchestrator::new(
        store,
        intel,
        notifier,
        config.updater,
        config.concurrency,
        config.storage.default_user_id.clone(),
    );

    match orchestrator.run().await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Batch run failed");
            Err(e)
        }
    }
}
