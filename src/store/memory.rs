//! In-process storage adapter.
//!
//! Backs the embedded deployment mode and the test suite. All state lives
//! behind one mutex; operations are synchronous under the hood, so the
//! lock is never held across an await point.

use super::{DomainStore, StoreError, StoreResult};
use crate::core::{
    DnsRecordType, DomainUpdate, HostInfo, NotificationPreference, RegistrarInfo, SslCertificate,
    TrackedDomain, WhoisContact,
};
use crate::util::norm;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct RegistrarRow {
    id: String,
    user_id: String,
    name: String,
    url: Option<String>,
}

#[derive(Debug, Clone)]
struct HostRow {
    id: String,
    user_id: String,
    host: HostInfo,
}

#[derive(Default)]
struct Inner {
    domains: Vec<TrackedDomain>,
    registrars: Vec<RegistrarRow>,
    hosts: Vec<HostRow>,
    statuses: HashMap<String, BTreeSet<String>>,
    ssl: HashMap<String, SslCertificate>,
    whois: HashMap<String, WhoisContact>,
    dns: HashMap<(String, DnsRecordType), BTreeSet<String>>,
    updates: Vec<DomainUpdate>,
    prefs: HashMap<String, Vec<NotificationPreference>>,
}

/// In-memory implementation of the storage port.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tracked domain, minting an id if the row has none.
    /// Returns the domain id.
    pub fn add_domain(&self, mut domain: TrackedDomain) -> String {
        if domain.id.is_empty() {
            domain.id = Uuid::new_v4().to_string();
        }
        let id = domain.id.clone();
        self.inner.lock().unwrap().domains.push(domain);
        id
    }

    /// Seeds the stored status codes for a domain.
    pub fn set_statuses<I: IntoIterator<Item = String>>(&self, domain_id: &str, statuses: I) {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .insert(domain_id.to_string(), statuses.into_iter().collect());
    }

    /// Seeds the stored DNS records for one category.
    pub fn set_dns<I: IntoIterator<Item = String>>(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        values: I,
    ) {
        self.inner.lock().unwrap().dns.insert(
            (domain_id.to_string(), record_type),
            values.into_iter().collect(),
        );
    }

    /// Seeds the stored certificate for a domain.
    pub fn set_ssl(&self, domain_id: &str, cert: SslCertificate) {
        self.inner
            .lock()
            .unwrap()
            .ssl
            .insert(domain_id.to_string(), cert);
    }

    /// Seeds the stored WHOIS contact for a domain.
    pub fn set_whois_contact(&self, domain_id: &str, contact: WhoisContact) {
        self.inner
            .lock()
            .unwrap()
            .whois
            .insert(domain_id.to_string(), contact);
    }

    /// Seeds the notification preferences for a domain.
    pub fn set_preferences(&self, domain_id: &str, prefs: Vec<NotificationPreference>) {
        self.inner
            .lock()
            .unwrap()
            .prefs
            .insert(domain_id.to_string(), prefs);
    }

    /// Returns the audit records written for a domain, in append order.
    pub fn updates_for(&self, domain_id: &str) -> Vec<DomainUpdate> {
        self.inner
            .lock()
            .unwrap()
            .updates
            .iter()
            .filter(|u| u.domain_id == domain_id)
            .cloned()
            .collect()
    }

    /// Returns every audit record written so far.
    pub fn all_updates(&self) -> Vec<DomainUpdate> {
        self.inner.lock().unwrap().updates.clone()
    }

    /// Reads back a domain row, reflecting any registrar/host repoints.
    pub fn get_domain(&self, domain_id: &str) -> Option<TrackedDomain> {
        self.inner
            .lock()
            .unwrap()
            .domains
            .iter()
            .find(|d| d.id == domain_id)
            .cloned()
    }
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn load_domains(&self, user_id: &str) -> StoreResult<Vec<TrackedDomain>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .domains
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_expiry_date(&self, domain_id: &str, expiry: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let domain = inner
            .domains
            .iter_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| StoreError::NotFound(format!("domain {domain_id}")))?;
        domain.expiry_date = Some(expiry);
        Ok(())
    }

    async fn upsert_registrar(
        &self,
        user_id: &str,
        name: &str,
        url: Option<&str>,
    ) -> StoreResult<String> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner
            .registrars
            .iter_mut()
            .find(|r| r.user_id == user_id && norm(&r.name) == norm(name))
        {
            if let Some(url) = url {
                row.url = Some(url.to_string());
            }
            return Ok(row.id.clone());
        }
        let row = RegistrarRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            url: url.map(str::to_string),
        };
        let id = row.id.clone();
        inner.registrars.push(row);
        Ok(id)
    }

    async fn set_domain_registrar(&self, domain_id: &str, registrar_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let registrar = inner
            .registrars
            .iter()
            .find(|r| r.id == registrar_id)
            .ok_or_else(|| StoreError::NotFound(format!("registrar {registrar_id}")))?
            .clone();
        let domain = inner
            .domains
            .iter_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| StoreError::NotFound(format!("domain {domain_id}")))?;
        domain.registrar = Some(RegistrarInfo {
            id: Some(registrar.id),
            name: registrar.name,
            url: registrar.url,
        });
        Ok(())
    }

    async fn get_statuses(&self, domain_id: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .statuses
            .get(domain_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .entry(domain_id.to_string())
            .or_default()
            .insert(status.to_string());
        Ok(())
    }

    async fn remove_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        if let Some(set) = self.inner.lock().unwrap().statuses.get_mut(domain_id) {
            set.remove(status);
        }
        Ok(())
    }

    async fn get_ssl_certificate(&self, domain_id: &str) -> StoreResult<Option<SslCertificate>> {
        Ok(self.inner.lock().unwrap().ssl.get(domain_id).cloned())
    }

    async fn insert_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .ssl
            .insert(domain_id.to_string(), cert.clone());
        Ok(())
    }

    async fn update_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .ssl
            .insert(domain_id.to_string(), cert.clone());
        Ok(())
    }

    async fn get_whois(&self, domain_id: &str) -> StoreResult<Option<WhoisContact>> {
        Ok(self.inner.lock().unwrap().whois.get(domain_id).cloned())
    }

    async fn insert_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .whois
            .insert(domain_id.to_string(), contact.clone());
        Ok(())
    }

    async fn update_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .whois
            .insert(domain_id.to_string(), contact.clone());
        Ok(())
    }

    async fn get_dns_records(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
    ) -> StoreResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .dns
            .get(&(domain_id.to_string(), record_type))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .dns
            .entry((domain_id.to_string(), record_type))
            .or_default()
            .insert(value.to_string());
        Ok(())
    }

    async fn remove_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        if let Some(set) = self
            .inner
            .lock()
            .unwrap()
            .dns
            .get_mut(&(domain_id.to_string(), record_type))
        {
            set.remove(value);
        }
        Ok(())
    }

    async fn upsert_host(&self, user_id: &str, host: &HostInfo) -> StoreResult<String> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner
            .hosts
            .iter_mut()
            .find(|h| h.user_id == user_id && norm(&h.host.ip) == norm(&host.ip))
        {
            let id = row.id.clone();
            row.host = HostInfo {
                id: Some(id.clone()),
                ..host.clone()
            };
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        inner.hosts.push(HostRow {
            id: id.clone(),
            user_id: user_id.to_string(),
            host: HostInfo {
                id: Some(id.clone()),
                ..host.clone()
            },
        });
        Ok(id)
    }

    async fn set_domain_host(&self, domain_id: &str, host_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let host = inner
            .hosts
            .iter()
            .find(|h| h.id == host_id)
            .ok_or_else(|| StoreError::NotFound(format!("host {host_id}")))?
            .host
            .clone();
        let domain = inner
            .domains
            .iter_mut()
            .find(|d| d.id == domain_id)
            .ok_or_else(|| StoreError::NotFound(format!("domain {domain_id}")))?;
        domain.host = Some(host);
        Ok(())
    }

    async fn append_update(&self, update: &DomainUpdate) -> StoreResult<()> {
        self.inner.lock().unwrap().updates.push(update.clone());
        Ok(())
    }

    async fn notification_preferences(
        &self,
        domain_id: &str,
    ) -> StoreResult<Vec<NotificationPreference>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .prefs
            .get(domain_id)
            .cloned()
            .unwrap_or_default())
    }
}
