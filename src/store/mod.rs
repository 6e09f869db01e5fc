//! The storage port for the update pipeline.
//!
//! The pipeline never talks to a concrete backend: differencers and the
//! orchestrator depend only on [`DomainStore`]. Two adapters implement it —
//! an in-process map ([`memory::MemoryStore`]) backing tests and the
//! embedded mode, and a PostgREST-shaped HTTP adapter
//! ([`rest::RestStore`]) fronting both the managed and self-hosted
//! deployments.

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::core::{
    DnsRecordType, DomainUpdate, HostInfo, NotificationPreference, SslCertificate, TrackedDomain,
    WhoisContact,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by a storage adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the request.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A row the operation requires does not exist.
    #[error("row not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Stateless query surface over the domain-portfolio schema.
///
/// Every write here is an idempotent upsert or set mutation; a partially
/// applied run converges on the next scheduled invocation.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Loads all tracked domains for one user, with registrar and host
    /// join data. This is the single read the orchestrator starts from.
    async fn load_domains(&self, user_id: &str) -> StoreResult<Vec<TrackedDomain>>;

    /// Updates a domain's expiry date.
    async fn set_expiry_date(
        &self,
        domain_id: &str,
        expiry: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Inserts or updates a registrar by name, scoped to the user, and
    /// returns its id.
    async fn upsert_registrar(
        &self,
        user_id: &str,
        name: &str,
        url: Option<&str>,
    ) -> StoreResult<String>;

    /// Repoints a domain's registrar reference.
    async fn set_domain_registrar(&self, domain_id: &str, registrar_id: &str) -> StoreResult<()>;

    /// Reads the stored EPP status codes for a domain.
    async fn get_statuses(&self, domain_id: &str) -> StoreResult<Vec<String>>;

    /// Adds one status code. Must not create a duplicate (domain, value).
    async fn add_status(&self, domain_id: &str, status: &str) -> StoreResult<()>;

    /// Removes one status code.
    async fn remove_status(&self, domain_id: &str, status: &str) -> StoreResult<()>;

    /// Reads the current SSL certificate for a domain, if any.
    async fn get_ssl_certificate(&self, domain_id: &str) -> StoreResult<Option<SslCertificate>>;

    /// Inserts the certificate for a domain that has none stored.
    async fn insert_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()>;

    /// Replaces the current certificate in place.
    async fn update_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()>;

    /// Reads the WHOIS contact for a domain, if any.
    async fn get_whois(&self, domain_id: &str) -> StoreResult<Option<WhoisContact>>;

    /// Inserts the WHOIS contact for a domain that has none stored.
    async fn insert_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()>;

    /// One combined update for all changed WHOIS fields.
    async fn update_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()>;

    /// Reads the stored values for one DNS record category.
    async fn get_dns_records(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
    ) -> StoreResult<Vec<String>>;

    /// Adds one DNS record. Must not create a duplicate (domain, type, value).
    async fn add_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()>;

    /// Removes one DNS record.
    async fn remove_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()>;

    /// Looks up or inserts a host, deduplicated per user by IP, and
    /// returns its id.
    async fn upsert_host(&self, user_id: &str, host: &HostInfo) -> StoreResult<String>;

    /// Repoints a domain's host reference.
    async fn set_domain_host(&self, domain_id: &str, host_id: &str) -> StoreResult<()>;

    /// Appends one immutable audit record.
    async fn append_update(&self, update: &DomainUpdate) -> StoreResult<()>;

    /// Reads the notification preferences for a domain.
    async fn notification_preferences(
        &self,
        domain_id: &str,
    ) -> StoreResult<Vec<NotificationPreference>>;
}
