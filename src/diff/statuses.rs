use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, TrackedDomain};
use crate::util::norm;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// Set-diffs the EPP status codes.
///
/// Entries in fresh-but-not-stored are inserted, entries in
/// stored-but-not-fresh are deleted; each element gets its own audit
/// record. An empty fresh list is treated as missing data rather than a
/// mass removal, the same rule the DNS differencer applies; a failed
/// WHOIS parse must not wipe a status set.
pub struct StatusDiff;

#[async_trait]
impl Differencer for StatusDiff {
    fn name(&self) -> &'static str {
        "statuses"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = &snapshot.status else {
            return Ok(());
        };
        if fresh.is_empty() {
            return Ok(());
        }

        let stored = ctx.store.get_statuses(&domain.id).await?;
        let stored_keys: HashSet<String> = stored.iter().map(|s| norm(s)).collect();
        let fresh_keys: HashSet<String> = fresh.iter().map(|s| norm(s)).collect();

        // Noisy WHOIS reads repeat status codes; one audit entry per
        // distinct value.
        let mut added: HashSet<String> = HashSet::new();
        for status in fresh {
            let key = norm(status);
            if !stored_keys.contains(&key) && added.insert(key) {
                let status = status.trim();
                debug!(domain = %domain.domain_name, status, "Status added");
                ctx.store.add_status(&domain.id, status).await?;
                ctx.recorder
                    .record(
                        domain,
                        &format!("Status added: {status}"),
                        "status_added",
                        None,
                        Some(status.to_string()),
                    )
                    .await?;
                changes.push("Status+".to_string());
            }
        }

        for status in &stored {
            if !fresh_keys.contains(&norm(status)) {
                debug!(domain = %domain.domain_name, status, "Status removed");
                ctx.store.remove_status(&domain.id, status).await?;
                ctx.recorder
                    .record(
                        domain,
                        &format!("Status removed: {status}"),
                        "status_removed",
                        Some(status.clone()),
                        None,
                    )
                    .await?;
                changes.push("Status-".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recorder;
    use crate::store::{DomainStore, MemoryStore};
    use std::sync::Arc;

    fn context(store: Arc<MemoryStore>) -> DiffContext {
        DiffContext {
            recorder: Recorder::new(store.clone(), None),
            store,
            expiry_threshold_days: 7,
            ssl_date_tolerance_days: 1,
        }
    }

    #[tokio::test]
    async fn set_diff_adds_and_removes() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());
        store.set_statuses(
            &domain.id,
            ["clientTransferProhibited".to_string(), "clientHold".to_string()],
        );

        let snapshot = DomainSnapshot {
            status: Some(vec![
                "clientTransferProhibited".to_string(),
                "serverDeleteProhibited".to_string(),
            ]),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        StatusDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();

        assert_eq!(
            changes,
            vec!["Status+".to_string(), "Status-".to_string()]
        );
        let updates = store.updates_for(&domain.id);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].change_type, "status_added");
        assert_eq!(updates[0].new_value.as_deref(), Some("serverDeleteProhibited"));
        assert_eq!(updates[1].change_type, "status_removed");
        assert_eq!(updates[1].old_value.as_deref(), Some("clientHold"));

        let stored = store.get_statuses(&domain.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.contains(&"serverDeleteProhibited".to_string()));
        assert!(!stored.contains(&"clientHold".to_string()));
    }

    #[tokio::test]
    async fn duplicate_fresh_statuses_are_recorded_once() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            status: Some(vec![
                "clientHold".to_string(),
                "clientHold".to_string(),
            ]),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        StatusDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();

        assert_eq!(changes, vec!["Status+".to_string()]);
        let updates = store.updates_for(&domain.id);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].change_type, "status_added");
        assert_eq!(store.get_statuses(&domain.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_fresh_list_does_not_wipe_stored_statuses() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());
        store.set_statuses(&domain.id, ["clientTransferProhibited".to_string()]);

        let snapshot = DomainSnapshot {
            status: Some(Vec::new()),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        StatusDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();

        assert!(changes.is_empty());
        assert_eq!(store.get_statuses(&domain.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identical_sets_produce_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());
        store.set_statuses(&domain.id, ["ok".to_string()]);

        let snapshot = DomainSnapshot {
            status: Some(vec!["OK".to_string()]),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        StatusDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();
        assert!(changes.is_empty());
        assert!(store.updates_for(&domain.id).is_empty());
    }
}
