//! The batch orchestrator.
//!
//! One run: load every tracked domain for the acting user, fan the rows
//! out over a fixed-size worker pool, and aggregate per-domain outcomes.
//! Workers drain a shared queue, so a slow domain never stalls the batch
//! and at most `concurrency` fetches are in flight at once. Failures are
//! data: a domain that times out or blows up becomes an error entry in
//! the report, and the run continues.

use crate::config::UpdaterConfig;
use crate::core::{
    BatchReport, DomainIntel, DomainResult, DomainSnapshot, NotificationSender, TrackedDomain,
};
use crate::diff::{all_differencers, DiffContext, Differencer};
use crate::recorder::Recorder;
use crate::store::DomainStore;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, instrument, warn};

pub struct Orchestrator {
    store: Arc<dyn DomainStore>,
    worker: Worker,
    concurrency: usize,
    acting_user: String,
}

/// The per-worker slice of the pipeline: fetch one snapshot, run the
/// differencer chain against it, convert failures into result entries.
#[derive(Clone)]
struct Worker {
    intel: Arc<dyn DomainIntel>,
    ctx: DiffContext,
    diffs: Arc<Vec<Box<dyn Differencer>>>,
    fetch_timeout: Duration,
    update_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DomainStore>,
        intel: Arc<dyn DomainIntel>,
        notifier: Option<Arc<dyn NotificationSender>>,
        config: UpdaterConfig,
        concurrency: usize,
        acting_user: String,
    ) -> Self {
        let recorder = Recorder::new(store.clone(), notifier);
        let ctx = DiffContext {
            store: store.clone(),
            recorder,
            expiry_threshold_days: config.expiry_threshold_days,
            ssl_date_tolerance_days: config.ssl_date_tolerance_days,
        };
        Self {
            store,
            worker: Worker {
                intel,
                ctx,
                diffs: Arc::new(all_differencers()),
                fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
                update_timeout: Duration::from_millis(config.update_timeout_ms),
            },
            concurrency: concurrency.max(1),
            acting_user,
        }
    }

    /// Runs one batch. The only fatal error is failing to load the domain
    /// list; everything downstream is captured per domain in the report.
    #[instrument(skip_all, fields(user = %self.acting_user))]
    pub async fn run(&self) -> Result<BatchReport> {
        let domains = self
            .store
            .load_domains(&self.acting_user)
            .await
            .context("failed to load tracked domains")?;
        info!(count = domains.len(), "Loaded tracked domains");

        if domains.is_empty() {
            return Ok(BatchReport {
                results: Vec::new(),
                note: "no domains to update".to_string(),
            });
        }

        // Fill the queue up front, then close the sending side so workers
        // drain it and exit.
        let (tx, rx) = async_channel::unbounded::<TrackedDomain>();
        for domain in domains {
            if tx.send(domain).await.is_err() {
                error!("Work queue closed before the batch started");
                break;
            }
        }
        drop(tx);

        let results: Arc<Mutex<Vec<DomainResult>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::with_capacity(self.concurrency);
        for i in 0..self.concurrency {
            let rx = rx.clone();
            let worker = self.worker.clone();
            let results = results.clone();
            handles.push(tokio::spawn(async move {
                debug!(worker = i, "Update worker started");
                while let Ok(domain) = rx.recv().await {
                    let start = Instant::now();
                    let result = worker.process(domain).await;
                    metrics::histogram!("domain_update_duration_seconds")
                        .record(start.elapsed().as_secs_f64());
                    results.lock().unwrap().push(result);
                }
                debug!(worker = i, "Update worker finished");
            }));
        }

        for outcome in join_all(handles).await {
            if let Err(e) = outcome {
                error!(error = %e, "Update worker panicked");
            }
        }

        let results = std::mem::take(&mut *results.lock().unwrap());
        info!(count = results.len(), "Batch complete");
        Ok(BatchReport {
            results,
            note: "domain update batch complete".to_string(),
        })
    }
}

impl Worker {
    async fn process(&self, domain: TrackedDomain) -> DomainResult {
        let name = domain.domain_name.clone();
        debug!(domain = %name, "Processing domain");
        metrics::counter!("domains_processed_total").increment(1);

        let snapshot = match timeout(self.fetch_timeout, self.intel.fetch(&name)).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(domain = %name, error = %e, "Snapshot fetch failed");
                metrics::counter!("domains_failed_total").increment(1);
                return DomainResult::Failed {
                    domain: name,
                    error: format!("fetch failed: {e:#}"),
                };
            }
            Err(_) => {
                warn!(domain = %name, "Snapshot fetch timed out");
                metrics::counter!("domains_failed_total").increment(1);
                return DomainResult::Failed {
                    domain: name,
                    error: format!("fetch timed out after {}ms", self.fetch_timeout.as_millis()),
                };
            }
        };

        let mut changes = Vec::new();
        match timeout(
            self.update_timeout,
            self.apply_differencers(&domain, &snapshot, &mut changes),
        )
        .await
        {
            Ok(()) => DomainResult::Updated {
                domain: name,
                changes,
            },
            Err(_) => {
                // Writes that already landed are idempotent; the next run
                // converges.
                warn!(domain = %name, "Update stage timed out");
                metrics::counter!("domains_failed_total").increment(1);
                DomainResult::Failed {
                    domain: name,
                    error: format!(
                        "update stage timed out after {}ms",
                        self.update_timeout.as_millis()
                    ),
                }
            }
        }
    }

    /// Runs the differencer chain in its fixed order. Each step is fenced:
    /// a failure becomes an inline note and its siblings still run.
    async fn apply_differencers(
        &self,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) {
        for differencer in self.diffs.iter() {
            if let Err(e) = differencer.apply(&self.ctx, domain, snapshot, changes).await {
                warn!(
                    domain = %domain.domain_name,
                    differencer = differencer.name(),
                    error = %e,
                    "Differencer failed, continuing with siblings"
                );
                changes.push(format!("(error in {}: {e:#})", differencer.name()));
            }
        }
    }
}
