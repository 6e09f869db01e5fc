use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, TrackedDomain};
use crate::util::{date_changed, fmt_day};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Diffs the domain expiry date.
///
/// WHOIS servers round and shift expiry timestamps between reads, so a
/// difference only counts once it exceeds the configured threshold
/// (default 7 days). An absent stored date always counts.
pub struct ExpiryDiff;

#[async_trait]
impl Differencer for ExpiryDiff {
    fn name(&self) -> &'static str {
        "expiry"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = snapshot.dates.as_ref().and_then(|d| d.expiry_date) else {
            return Ok(());
        };

        if !date_changed(domain.expiry_date, fresh, ctx.expiry_threshold_days) {
            return Ok(());
        }

        debug!(domain = %domain.domain_name, new = %fmt_day(fresh), "Expiry date changed");
        ctx.store.set_expiry_date(&domain.id, fresh).await?;
        ctx.recorder
            .record(
                domain,
                "Expiry date changed",
                "expiry_domain",
                domain.expiry_date.map(fmt_day),
                Some(fmt_day(fresh)),
            )
            .await?;
        changes.push("Expiry Date".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SnapshotDates;
    use crate::recorder::Recorder;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn context(store: Arc<MemoryStore>) -> DiffContext {
        DiffContext {
            recorder: Recorder::new(store.clone(), None),
            store,
            expiry_threshold_days: 7,
            ssl_date_tolerance_days: 1,
        }
    }

    fn snapshot_with_expiry(y: i32, m: u32, d: u32) -> DomainSnapshot {
        DomainSnapshot {
            dates: Some(SnapshotDates {
                expiry_date: Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn change_beyond_threshold_is_recorded() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            expiry_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        ExpiryDiff
            .apply(&ctx, &domain, &snapshot_with_expiry(2024, 1, 10), &mut changes)
            .await
            .unwrap();

        assert_eq!(changes, vec!["Expiry Date".to_string()]);
        let updates = store.updates_for(&domain.id);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].change_type, "expiry_domain");
        assert_eq!(updates[0].old_value.as_deref(), Some("2024-01-01"));
        assert_eq!(updates[0].new_value.as_deref(), Some("2024-01-10"));
        assert_eq!(
            store.get_domain(&domain.id).unwrap().expiry_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn jitter_within_threshold_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            expiry_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        ExpiryDiff
            .apply(&ctx, &domain, &snapshot_with_expiry(2024, 1, 6), &mut changes)
            .await
            .unwrap();

        assert!(changes.is_empty());
        assert!(store.updates_for(&domain.id).is_empty());
    }

    #[tokio::test]
    async fn missing_snapshot_dates_are_not_a_change() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        ExpiryDiff
            .apply(&ctx, &domain, &DomainSnapshot::default(), &mut changes)
            .await
            .unwrap();
        assert!(changes.is_empty());
    }
}
