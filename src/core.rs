//! Core domain types and service traits for DomainWatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the update pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the domain portfolio, joined with its current registrar and
/// host references.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackedDomain {
    /// Unique row id.
    pub id: String,
    /// The owning user.
    pub user_id: String,
    /// The domain name, lowercase, unique per user.
    pub domain_name: String,
    /// Current expiry date, if known.
    pub expiry_date: Option<DateTime<Utc>>,
    /// Registration date, if known.
    pub registration_date: Option<DateTime<Utc>>,
    /// Last change seen upstream, if known.
    pub updated_date: Option<DateTime<Utc>>,
    /// Free-text user notes.
    pub notes: Option<String>,
    /// The domain's current registrar, if one is linked.
    pub registrar: Option<RegistrarInfo>,
    /// The domain's current host, if one is linked.
    pub host: Option<HostInfo>,
}

/// A registrar entity, deduplicated per user.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RegistrarInfo {
    pub id: Option<String>,
    pub name: String,
    pub url: Option<String>,
}

/// The single "current" SSL certificate stored for a domain.
///
/// A changed certificate is an update-in-place, not a new row; rotation
/// history is only visible through the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SslCertificate {
    pub issuer: Option<String>,
    pub issuer_country: Option<String>,
    pub subject: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub fingerprint: Option<String>,
    pub key_size: Option<i64>,
    pub signature_algorithm: Option<String>,
}

/// WHOIS registrant contact, one row per domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WhoisContact {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// The DNS record categories tracked per domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DnsRecordType {
    Ns,
    Mx,
    Txt,
}

impl DnsRecordType {
    /// Lowercase tag used in change-type strings and storage rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsRecordType::Ns => "ns",
            DnsRecordType::Mx => "mx",
            DnsRecordType::Txt => "txt",
        }
    }

    /// Uppercase label used in human-readable change tags.
    pub fn label(&self) -> &'static str {
        match self {
            DnsRecordType::Ns => "NS",
            DnsRecordType::Mx => "MX",
            DnsRecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host/geo information, deduplicated per user by IP.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HostInfo {
    pub id: Option<String>,
    pub ip: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

// =============================================================================
// Snapshot shape returned by the domain intelligence source
// =============================================================================

/// A normalized point-in-time read of a domain's live registration data.
///
/// Absent fields mean "no data for this category", never "field cleared";
/// differencers skip silently when their slice is missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DomainSnapshot {
    pub registrar: Option<SnapshotRegistrar>,
    pub dates: Option<SnapshotDates>,
    pub status: Option<Vec<String>>,
    pub dns: Option<SnapshotDns>,
    pub ssl: Option<SslCertificate>,
    pub whois: Option<WhoisContact>,
    pub host: Option<SnapshotHost>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotRegistrar {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotDates {
    pub creation_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotDns {
    #[serde(default, rename = "nameServers")]
    pub name_servers: Vec<String>,
    #[serde(default, rename = "mxRecords")]
    pub mx_records: Vec<String>,
    #[serde(default, rename = "txtRecords")]
    pub txt_records: Vec<String>,
    pub dnssec: Option<String>,
}

impl SnapshotDns {
    /// Returns the fresh record list for one category.
    pub fn records(&self, record_type: DnsRecordType) -> &[String] {
        match record_type {
            DnsRecordType::Ns => &self.name_servers,
            DnsRecordType::Mx => &self.mx_records,
            DnsRecordType::Txt => &self.txt_records,
        }
    }
}

/// Fresh host/geo data. The upstream geo-IP API reports the IP under `query`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotHost {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub isp: Option<String>,
    pub org: Option<String>,
    #[serde(rename = "as")]
    pub asn: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

// =============================================================================
// Audit trail and notifications
// =============================================================================

/// An immutable audit record describing one detected change.
///
/// This is the system of record for "what changed and when"; the pipeline
/// only ever appends these rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainUpdate {
    pub id: String,
    pub domain_id: String,
    pub user_id: String,
    /// Human-readable change description.
    pub change: String,
    /// Machine-readable tag, e.g. `ssl_valid_to`, `dns_mx_added`.
    pub change_type: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub date: DateTime<Utc>,
}

/// Per-domain opt-in flag for one change-type prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPreference {
    pub notification_type: String,
    pub is_enabled: bool,
}

/// An outbound user notification, dispatched best-effort.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

// =============================================================================
// Batch report
// =============================================================================

/// Per-domain outcome of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DomainResult {
    Updated { domain: String, changes: Vec<String> },
    Failed { domain: String, error: String },
}

impl DomainResult {
    pub fn domain(&self) -> &str {
        match self {
            DomainResult::Updated { domain, .. } => domain,
            DomainResult::Failed { domain, .. } => domain,
        }
    }
}

/// The aggregated result of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub results: Vec<DomainResult>,
    pub note: String,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Fetches a fresh registration-data snapshot for a domain name.
///
/// The WHOIS/RDAP/DNS/TLS/geo-IP lookup mechanics behind this are an
/// external concern; the pipeline only sees the fixed snapshot shape.
#[async_trait]
pub trait DomainIntel: Send + Sync {
    /// Fetches the current snapshot for `domain`.
    ///
    /// # Returns
    /// * `Ok(DomainSnapshot)` with whatever categories could be read
    /// * `Err` for network failures or malformed upstream responses
    async fn fetch(&self, domain: &str) -> anyhow::Result<DomainSnapshot>;
}

/// Dispatches an outbound user notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends one notification. Failure is reported to the caller, which
    /// logs it; delivery is never retried within a pipeline run.
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}
