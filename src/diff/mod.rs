//! Field differencers.
//!
//! Each differencer owns one field category: it reads its slice of the
//! stored row and the fresh snapshot, applies the minimal persistence
//! update, records one audit entry per logical change, and appends a short
//! human tag to the shared accumulator. Differencers are independent; the
//! orchestrator runs them in a fixed order and fences each one so a
//! failure in one category never blocks its siblings.

mod dns;
mod expiry;
mod host;
mod registrar;
mod ssl;
mod statuses;
mod whois;

pub use dns::DnsDiff;
pub use expiry::ExpiryDiff;
pub use host::HostDiff;
pub use registrar::RegistrarDiff;
pub use ssl::SslDiff;
pub use statuses::StatusDiff;
pub use whois::WhoisDiff;

use crate::core::{DomainSnapshot, TrackedDomain};
use crate::recorder::Recorder;
use crate::store::DomainStore;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared collaborators and tolerances for one pipeline run.
#[derive(Clone)]
pub struct DiffContext {
    pub store: Arc<dyn DomainStore>,
    pub recorder: Recorder,
    /// Expiry-date jitter guard: differences at or under this many days
    /// are not changes.
    pub expiry_threshold_days: i64,
    /// SSL validity-date jitter guard, same rule at a tighter bound.
    pub ssl_date_tolerance_days: i64,
}

/// One field-category comparison step.
#[async_trait]
pub trait Differencer: Send + Sync {
    /// Short category name, used in error notes (e.g. `ssl`, `dns`).
    fn name(&self) -> &'static str;

    /// Compares the stored row against the fresh snapshot for this
    /// category, persisting minimal updates and recording audit entries.
    /// Appends one human-readable tag per detected change to `changes`.
    ///
    /// Skips silently when the snapshot has no data for the category.
    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()>;
}

/// The fixed differencer sequence: expiry → registrar → statuses → SSL →
/// WHOIS → DNS → host. Audit records for one domain are written in this
/// order.
pub fn all_differencers() -> Vec<Box<dyn Differencer>> {
    vec![
        Box::new(ExpiryDiff),
        Box::new(RegistrarDiff),
        Box::new(StatusDiff),
        Box::new(SslDiff),
        Box::new(WhoisDiff),
        Box::new(DnsDiff),
        Box::new(HostDiff),
    ]
}
