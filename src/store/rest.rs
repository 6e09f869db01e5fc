//! PostgREST-shaped HTTP storage adapter.
//!
//! Fronts both the managed deployment and the self-hosted
//! Postgres-over-HTTP gateway, which expose the same table-endpoint
//! surface: filters as `column=eq.value` query parameters, upserts via
//! `Prefer: resolution=merge-duplicates` with an `on_conflict` key.

use super::{DomainStore, StoreError, StoreResult};
use crate::core::{
    DnsRecordType, DomainUpdate, HostInfo, NotificationPreference, RegistrarInfo, SslCertificate,
    TrackedDomain, WhoisContact,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP adapter over a PostgREST-compatible backend.
pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DomainRow {
    id: String,
    user_id: String,
    domain_name: String,
    expiry_date: Option<DateTime<Utc>>,
    registration_date: Option<DateTime<Utc>>,
    updated_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    registrars: Option<RegistrarRow>,
    hosts: Option<HostInfo>,
}

#[derive(Debug, Deserialize)]
struct RegistrarRow {
    id: String,
    name: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    status_code: String,
}

#[derive(Debug, Deserialize)]
struct DnsRow {
    record_value: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn auth(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => rb
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}")),
            None => rb,
        }
    }

    /// Sends a request and maps any non-2xx status to a backend error.
    async fn send(&self, rb: reqwest::RequestBuilder) -> StoreResult<reqwest::Response> {
        let resp = self.auth(rb).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!(
                "request failed with status {status}: {body}"
            )));
        }
        Ok(resp)
    }

    fn to_body(value: &impl serde::Serialize) -> StoreResult<serde_json::Value> {
        serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl DomainStore for RestStore {
    async fn load_domains(&self, user_id: &str) -> StoreResult<Vec<TrackedDomain>> {
        let resp = self
            .send(self.client.get(self.table("domains")).query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*,registrars(*),hosts(*)".to_string()),
            ]))
            .await?;
        let rows: Vec<DomainRow> = resp.json().await?;
        debug!(count = rows.len(), "Loaded domain rows from backend");
        Ok(rows
            .into_iter()
            .map(|r| TrackedDomain {
                id: r.id,
                user_id: r.user_id,
                domain_name: r.domain_name,
                expiry_date: r.expiry_date,
                registration_date: r.registration_date,
                updated_date: r.updated_date,
                notes: r.notes,
                registrar: r.registrars.map(|reg| RegistrarInfo {
                    id: Some(reg.id),
                    name: reg.name,
                    url: reg.url,
                }),
                host: r.hosts,
            })
            .collect())
    }

    async fn set_expiry_date(&self, domain_id: &str, expiry: DateTime<Utc>) -> StoreResult<()> {
        self.send(
            self.client
                .patch(self.table("domains"))
                .query(&[("id", format!("eq.{domain_id}"))])
                .json(&json!({ "expiry_date": expiry })),
        )
        .await?;
        Ok(())
    }

    async fn upsert_registrar(
        &self,
        user_id: &str,
        name: &str,
        url: Option<&str>,
    ) -> StoreResult<String> {
        let resp = self
            .send(
                self.client
                    .post(self.table("registrars"))
                    .query(&[("on_conflict", "user_id,name")])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&json!({ "user_id": user_id, "name": name, "url": url })),
            )
            .await?;
        let rows: Vec<IdRow> = resp.json().await?;
        rows.into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::Backend("registrar upsert returned no row".into()))
    }

    async fn set_domain_registrar(&self, domain_id: &str, registrar_id: &str) -> StoreResult<()> {
        self.send(
            self.client
                .patch(self.table("domains"))
                .query(&[("id", format!("eq.{domain_id}"))])
                .json(&json!({ "registrar_id": registrar_id })),
        )
        .await?;
        Ok(())
    }

    async fn get_statuses(&self, domain_id: &str) -> StoreResult<Vec<String>> {
        let resp = self
            .send(self.client.get(self.table("domain_statuses")).query(&[
                ("domain_id", format!("eq.{domain_id}")),
                ("select", "status_code".to_string()),
            ]))
            .await?;
        let rows: Vec<StatusRow> = resp.json().await?;
        Ok(rows.into_iter().map(|r| r.status_code).collect())
    }

    async fn add_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        self.send(
            self.client
                .post(self.table("domain_statuses"))
                .query(&[("on_conflict", "domain_id,status_code")])
                .header("Prefer", "resolution=ignore-duplicates,return=minimal")
                .json(&json!({ "domain_id": domain_id, "status_code": status })),
        )
        .await?;
        Ok(())
    }

    async fn remove_status(&self, domain_id: &str, status: &str) -> StoreResult<()> {
        self.send(self.client.delete(self.table("domain_statuses")).query(&[
            ("domain_id", format!("eq.{domain_id}")),
            ("status_code", format!("eq.{status}")),
        ]))
        .await?;
        Ok(())
    }

    async fn get_ssl_certificate(&self, domain_id: &str) -> StoreResult<Option<SslCertificate>> {
        let resp = self
            .send(self.client.get(self.table("ssl_certificates")).query(&[
                ("domain_id", format!("eq.{domain_id}")),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ]))
            .await?;
        let rows: Vec<SslCertificate> = resp.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        let mut body = Self::to_body(cert)?;
        body["domain_id"] = json!(domain_id);
        self.send(
            self.client
                .post(self.table("ssl_certificates"))
                .header("Prefer", "return=minimal")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn update_ssl_certificate(
        &self,
        domain_id: &str,
        cert: &SslCertificate,
    ) -> StoreResult<()> {
        self.send(
            self.client
                .patch(self.table("ssl_certificates"))
                .query(&[("domain_id", format!("eq.{domain_id}"))])
                .json(cert),
        )
        .await?;
        Ok(())
    }

    async fn get_whois(&self, domain_id: &str) -> StoreResult<Option<WhoisContact>> {
        let resp = self
            .send(
                self.client
                    .get(self.table("whois_info"))
                    .query(&[("domain_id", format!("eq.{domain_id}"))]),
            )
            .await?;
        let rows: Vec<WhoisContact> = resp.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        let mut body = Self::to_body(contact)?;
        body["domain_id"] = json!(domain_id);
        self.send(
            self.client
                .post(self.table("whois_info"))
                .header("Prefer", "return=minimal")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn update_whois(&self, domain_id: &str, contact: &WhoisContact) -> StoreResult<()> {
        self.send(
            self.client
                .patch(self.table("whois_info"))
                .query(&[("domain_id", format!("eq.{domain_id}"))])
                .json(contact),
        )
        .await?;
        Ok(())
    }

    async fn get_dns_records(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
    ) -> StoreResult<Vec<String>> {
        let resp = self
            .send(self.client.get(self.table("dns_records")).query(&[
                ("domain_id", format!("eq.{domain_id}")),
                ("record_type", format!("eq.{record_type}")),
                ("select", "record_value".to_string()),
            ]))
            .await?;
        let rows: Vec<DnsRow> = resp.json().await?;
        Ok(rows.into_iter().map(|r| r.record_value).collect())
    }

    async fn add_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        self.send(
            self.client
                .post(self.table("dns_records"))
                .query(&[("on_conflict", "domain_id,record_type,record_value")])
                .header("Prefer", "resolution=ignore-duplicates,return=minimal")
                .json(&json!({
                    "domain_id": domain_id,
                    "record_type": record_type.as_str(),
                    "record_value": value,
                })),
        )
        .await?;
        Ok(())
    }

    async fn remove_dns_record(
        &self,
        domain_id: &str,
        record_type: DnsRecordType,
        value: &str,
    ) -> StoreResult<()> {
        self.send(self.client.delete(self.table("dns_records")).query(&[
            ("domain_id", format!("eq.{domain_id}")),
            ("record_type", format!("eq.{record_type}")),
            ("record_value", format!("eq.{value}")),
        ]))
        .await?;
        Ok(())
    }

    async fn upsert_host(&self, user_id: &str, host: &HostInfo) -> StoreResult<String> {
        let mut body = Self::to_body(host)?;
        body["user_id"] = json!(user_id);
        if let Some(obj) = body.as_object_mut() {
            obj.remove("id");
        }
        let resp = self
            .send(
                self.client
                    .post(self.table("hosts"))
                    .query(&[("on_conflict", "user_id,ip")])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&body),
            )
            .await?;
        let rows: Vec<IdRow> = resp.json().await?;
        rows.into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::Backend("host upsert returned no row".into()))
    }

    async fn set_domain_host(&self, domain_id: &str, host_id: &str) -> StoreResult<()> {
        self.send(
            self.client
                .patch(self.table("domains"))
                .query(&[("id", format!("eq.{domain_id}"))])
                .json(&json!({ "host_id": host_id })),
        )
        .await?;
        Ok(())
    }

    async fn append_update(&self, update: &DomainUpdate) -> StoreResult<()> {
        self.send(
            self.client
                .post(self.table("domain_updates"))
                .header("Prefer", "return=minimal")
                .json(update),
        )
        .await?;
        Ok(())
    }

    async fn notification_preferences(
        &self,
        domain_id: &str,
    ) -> StoreResult<Vec<NotificationPreference>> {
        let resp = self
            .send(self.client.get(self.table("notification_preferences")).query(&[
                ("domain_id", format!("eq.{domain_id}")),
                ("select", "notification_type,is_enabled".to_string()),
            ]))
            .await?;
        let rows: Vec<NotificationPreference> = resp.json().await?;
        Ok(rows)
    }
}
