//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `domainwatch.toml` file and environment
//! variables.

use clap::Parser;
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};
use serde::Serialize;
use std::path::PathBuf;

/// Batch updater for a tracked domain portfolio: refreshes WHOIS/DNS/SSL/
/// host data, records change history, and dispatches notifications.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of concurrent update workers.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Acting user id the batch is scoped to.
    #[arg(long, value_name = "USER_ID")]
    pub user: Option<String>,

    /// Hard timeout for one snapshot fetch, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub fetch_timeout_ms: Option<u64>,

    /// Hard timeout for one domain's differencer stage, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub update_timeout_ms: Option<u64>,
}

/// The subset of config keys the CLI can override, shaped like the config
/// tree so figment merges it at the right depth. Absent flags serialize to
/// nothing and leave the lower layers untouched.
#[derive(Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updater: Option<UpdaterOverrides>,
}

#[derive(Serialize)]
struct StorageOverrides {
    default_user_id: String,
}

#[derive(Serialize)]
struct UpdaterOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_timeout_ms: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let updater = if self.fetch_timeout_ms.is_some() || self.update_timeout_ms.is_some() {
            Some(UpdaterOverrides {
                fetch_timeout_ms: self.fetch_timeout_ms,
                update_timeout_ms: self.update_timeout_ms,
            })
        } else {
            None
        };

        let overrides = CliOverrides {
            concurrency: self.concurrency,
            storage: self.user.clone().map(|default_user_id| StorageOverrides {
                default_user_id,
            }),
            updater,
        };

        Serialized::defaults(overrides).data()
    }
}
