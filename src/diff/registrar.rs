use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, TrackedDomain};
use crate::util::{norm, norm_opt};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Diffs the registrar by normalized name.
///
/// On change the registrar entity is upserted first (insert-or-update by
/// name, scoped to the user), then the domain's reference is repointed.
pub struct RegistrarDiff;

#[async_trait]
impl Differencer for RegistrarDiff {
    fn name(&self) -> &'static str {
        "registrar"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = &snapshot.registrar else {
            return Ok(());
        };
        let fresh_name = fresh.name.trim();
        if fresh_name.is_empty() {
            return Ok(());
        }

        let stored_name = domain.registrar.as_ref().map(|r| r.name.as_str());
        if norm_opt(stored_name).as_deref() == Some(norm(fresh_name).as_str()) {
            return Ok(());
        }

        debug!(domain = %domain.domain_name, registrar = fresh_name, "Registrar changed");
        let registrar_id = ctx
            .store
            .upsert_registrar(&domain.user_id, fresh_name, fresh.url.as_deref())
            .await?;
        ctx.store
            .set_domain_registrar(&domain.id, &registrar_id)
            .await?;
        ctx.recorder
            .record(
                domain,
                "Registrar changed",
                "registrar",
                stored_name.map(str::to_string),
                Some(fresh_name.to_string()),
            )
            .await?;
        changes.push("Registrar".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RegistrarInfo, SnapshotRegistrar};
    use crate::recorder::Recorder;
    use crate::store::MemoryStore;
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
    async fn new_registrar_is_upserted_and_repointed() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            registrar: Some(RegistrarInfo {
                id: Some("r-old".into()),
                name: "GoDaddy".into(),
                url: None,
            }),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            registrar: Some(SnapshotRegistrar {
                name: "Namecheap".into(),
                url: Some("https://namecheap.com".into()),
            }),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        RegistrarDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();

        assert_eq!(changes, vec!["Registrar".to_string()]);
        let updates = store.updates_for(&domain.id);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].change_type, "registrar");
        assert_eq!(updates[0].old_value.as_deref(), Some("GoDaddy"));
        assert_eq!(updates[0].new_value.as_deref(), Some("Namecheap"));
        assert_eq!(
            store.get_domain(&domain.id).unwrap().registrar.unwrap().name,
            "Namecheap"
        );
    }

    #[tokio::test]
    async fn name_differing_only_in_case_is_not_a_change() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            registrar: Some(RegistrarInfo {
                id: None,
                name: "GoDaddy".into(),
                url: None,
            }),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            registrar: Some(SnapshotRegistrar {
                name: "  GODADDY ".into(),
                url: None,
            }),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        RegistrarDiff
            .apply(&ctx, &domain, &snapshot, &mut changes)
            .await
            .unwrap();
        assert!(changes.is_empty());
        assert!(store.updates_for(&domain.id).is_empty());
    }
}
