use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, HostInfo, SnapshotHost, TrackedDomain};
use crate::util::{field_changed, float_changed};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Diffs the host/geo record.
///
/// Compared field by field (coordinates numerically); any difference
/// repoints the domain to a host upserted by IP (deduplicated per user)
/// and writes a single combined `host` audit record, old IP vs new IP.
pub struct HostDiff;

fn host_changed(stored: Option<&HostInfo>, fresh: &SnapshotHost, fresh_ip: &str) -> bool {
    let Some(stored) = stored else {
        return true;
    };
    field_changed(Some(stored.ip.as_str()), Some(fresh_ip))
        || float_changed(stored.lat, fresh.lat)
        || float_changed(stored.lon, fresh.lon)
        || field_changed(stored.isp.as_deref(), fresh.isp.as_deref())
        || field_changed(stored.org.as_deref(), fresh.org.as_deref())
        || field_changed(stored.asn.as_deref(), fresh.asn.as_deref())
        || field_changed(stored.city.as_deref(), fresh.city.as_deref())
        || field_changed(stored.region.as_deref(), fresh.region.as_deref())
        || field_changed(stored.country.as_deref(), fresh.country.as_deref())
}

#[async_trait]
impl Differencer for HostDiff {
    fn name(&self) -> &'static str {
        "host"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = &snapshot.host else {
            return Ok(());
        };
        let Some(fresh_ip) = fresh.query.as_deref().map(str::trim).filter(|s| !s.is_empty())
        else {
            return Ok(());
        };

        if !host_changed(domain.host.as_ref(), fresh, fresh_ip) {
            return Ok(());
        }

        let old_ip = domain.host.as_ref().map(|h| h.ip.clone());
        debug!(
            domain = %domain.domain_name,
            old_ip = old_ip.as_deref().unwrap_or("-"),
            new_ip = fresh_ip,
            "Host changed"
        );

        let host = HostInfo {
            id: None,
            ip: fresh_ip.to_string(),
            lat: fresh.lat,
            lon: fresh.lon,
            isp: fresh.isp.clone(),
            org: fresh.org.clone(),
            asn: fresh.asn.clone(),
            city: fresh.city.clone(),
            region: fresh.region.clone(),
            country: fresh.country.clone(),
        };
        let host_id = ctx.store.upsert_host(&domain.user_id, &host).await?;
        ctx.store.set_domain_host(&domain.id, &host_id).await?;
        ctx.recorder
            .record(
                domain,
                "Host changed",
                "host",
                old_ip,
                Some(fresh_ip.to_string()),
            )
            .await?;
        changes.push("Host".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn fresh_host(ip: &str) -> SnapshotHost {
        SnapshotHost {
            query: Some(ip.into()),
            lat: Some(50.11),
            lon: Some(8.68),
            isp: Some("Hetzner".into()),
            country: Some("DE".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ip_change_writes_one_combined_record() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            host: Some(HostInfo {
                ip: "203.0.113.7".into(),
                lat: Some(50.11),
                lon: Some(8.68),
                isp: Some("Hetzner".into()),
                country: Some("DE".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            host: Some(fresh_host("198.51.100.9")),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        HostDiff.apply(&ctx, &domain, &snapshot, &mut changes).await.unwrap();

        assert_eq!(changes, vec!["Host".to_string()]);
        let updates = store.updates_for(&domain.id);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].change_type, "host");
        assert_eq!(updates[0].old_value.as_deref(), Some("203.0.113.7"));
        assert_eq!(updates[0].new_value.as_deref(), Some("198.51.100.9"));
        assert_eq!(
            store.get_domain(&domain.id).unwrap().host.unwrap().ip,
            "198.51.100.9"
        );
    }

    #[tokio::test]
    async fn identical_host_is_no_change() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            host: Some(HostInfo {
                ip: "203.0.113.7".into(),
                lat: Some(50.11),
                lon: Some(8.68),
                isp: Some("Hetzner".into()),
                country: Some("DE".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            host: Some(fresh_host("203.0.113.7")),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        HostDiff.apply(&ctx, &domain, &snapshot, &mut changes).await.unwrap();
        assert!(changes.is_empty());
        assert!(store.updates_for(&domain.id).is_empty());
    }

    #[tokio::test]
    async fn missing_ip_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let mut domain = TrackedDomain {
            user_id: "u1".into(),
            domain_name: "example.com".into(),
            ..Default::default()
        };
        domain.id = store.add_domain(domain.clone());

        let snapshot = DomainSnapshot {
            host: Some(SnapshotHost {
                query: None,
                isp: Some("Hetzner".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let ctx = context(store.clone());
        let mut changes = Vec::new();
        HostDiff.apply(&ctx, &domain, &snapshot, &mut changes).await.unwrap();
        assert!(changes.is_empty());
    }
}
