//! Shared test fakes for the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domainwatch::core::{
    DnsRecordType, DomainIntel, DomainSnapshot, DomainUpdate, HostInfo, NotificationPreference,
    SslCertificate, TrackedDomain, WhoisContact,
};
use domainwatch::store::{DomainStore, MemoryStore, StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A fixture intelligence source: serves canned snapshots per domain and
/// can be told to fail for specific domains.
#[derive(Default)]
pub struct FixtureIntel {
    snapshots: Mutex<HashMap<String, DomainSnapshot>>,
    failing: Mutex<HashSet<String>>,
}

impl FixtureIntel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(self, domain: &str, snapshot: DomainSnapshot) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .insert(domain.to_string(), snapshot);
        self
    }

    pub fn fail_for(self, domain: &str) -> Self {
        self.failing.lock().unwrap().insert(domain.to_string());
        self
    }
}

#[async_trait]
impl DomainIntel for FixtureIntel {
    async fn fetch(&self, domain: &str) -> anyhow::Result<DomainSnapshot> {
        if self.failing.lock().unwrap().contains(domain) {
            anyhow::bail!("upstream lookup failed for {domain}");
        }
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default())
    }
}

/// An instrumented intelligence source that tracks how many fetches are in
/// flight at once.
pub struct CountingIntel {
    snapshot: DomainSnapshot,
    delay: Duration,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub total: AtomicUsize,
}

impl CountingIntel {
    pub fn new(snapshot: DomainSnapshot, delay: Duration) -> Self {
        Self {
            snapshot,
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DomainIntel for CountingIntel {
    async fn fetch(&self, _domain: &str) -> anyhow::Result<DomainSnapshot> {
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

/// Wraps a [`MemoryStore`] and injects a failure into the SSL read for one
/// chosen domain, leaving every other operation intact.
pub struct SslFailingStore {
    pub inner: Arc<MemoryStore>,
    pub fail_domain_id: String,
}

#[async_trait]
impl DomainStore for SslFailingStore {
    async fn load_domains(&self, user_id: &str) -> StoreResult<Vec<TrackedDomain>> {
        self.inner.load_domains(user_id).await
    }

    async fn set_expiry_date(&self, domain_id: &str, expiry: DateTime<Utc>) -> StoreResult<()> {
        self.inner.set_expiry_date(domain_id, expiry).await
    }

    async fn upsert_registrar(
        &self,
        user_id: &str,
        name: &str,
        url: Option<&str>,
    ) -> StoreResult<String> {
        self.inner.upsert_registrar(user_id, name, url).await
    }

    async fn set_domain_registrar(&self, domain_id: &str, registrar_id: &str) -> StoreResult<()> {
        self.inner.set_domain_registrar(domain_id, registrar_id).await
    }

    async fn get_statuses(&self, domain_id: &str) -> StoreResult<Vec<String>> {
        self.inner.get_statuses(domain_id).await
    }

    async fn add_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        self.inner.add_status(domain_id, status).await
    }

    async fn remove_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        self.inner.remove_status(domain_id, status).await
    }

    async fn get_ssl_certificate(&self, domain_id: &str) -> StoreResult<Option<SslCertificate>> {
        if domain_id == self.fail_domain_id {
            return Err(StoreError::Backend("ssl read refused".to_string()));
        }
        self.inner.get_ssl_certificate(domain_id).await
    }

    async fn insert_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        self.inner.insert_ssl_certificate(domain_id, cert).await
    }

    async fn update_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        self.inner.update_ssl_certificate(domain_id, cert).await
    }

    async fn get_whois(&self, domain_id: &str) -> StoreResult<Option<WhoisContact>> {
        self.inner.get_whois(domain_id).await
    }

    async fn insert_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        self.inner.insert_whois(domain_id, contact).await
    }

    async fn update_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        self.inner.update_whois(domain_id, contact).await
    }

    async fn get_dns_records(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
    ) -> StoreResult<Vec<String>> {
        self.inner.get_dns_records(domain_id, record_type).await
    }

    async fn add_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        self.inner.add_dns_record(domain_id, record_type, value).await
    }

    async fn remove_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        self.inner
            .remove_dns_record(domain_id, record_type, value)
            .await
    }

    async fn upsert_host(&self, user_id: &str, host: &HostInfo) -> StoreResult<String> {
        self.inner.upsert_host(user_id, host).await
    }

    async fn set_domain_host(&self, domain_id: &str, host_id: &str) -> StoreResult<()> {
        self.inner.set_domain_host(domain_id, host_id).await
    }

    async fn append_update(&self, update: &DomainUpdate) -> StoreResult<()> {
        self.inner.append_update(update).await
    }

    async fn notification_preferences(
        &self,
        domain_id: &str,
    ) -> StoreResult<Vec<NotificationPreference>> {
        self.inner.notification_preferences(domain_id).await
    }
}

/// Seeds a tracked domain row and returns it with its minted id.
pub fn seed_domain(store: &MemoryStore, user_id: &str, name: &str) -> TrackedDomain {
    let mut domain = TrackedDomain {
        user_id: user_id.to_string(),
        domain_name: name.to_string(),
        ..Default::default()
    };
    domain.id = store.add_domain(domain.clone());
    domain
}
