use crate::core::{DomainIntel, DomainSnapshot};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Queries the domain-intelligence service over HTTP.
///
/// The service is a black box that aggregates WHOIS, DNS, TLS and geo-IP
/// reads into one snapshot document. The per-fetch timeout here is a
/// client-side transport bound; the orchestrator applies its own harder
/// wall-clock timeout around the whole fetch.
pub struct HttpDomainIntel {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDomainIntel {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build intel HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl DomainIntel for HttpDomainIntel {
    async fn fetch(&self, domain: &str) -> Result<DomainSnapshot> {
        let url = format!("{}/domain-info", self.base_url);
        debug!(domain, "Fetching fresh snapshot");
        let resp = self
            .client
            .get(&url)
            .query(&[("domain", domain)])
            .send()
            .await
            .with_context(|| format!("snapshot request failed for {domain}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("intel service returned status {status} for {domain}");
        }

        let snapshot = resp
            .json::<DomainSnapshot>()
            .await
            .with_context(|| format!("malformed snapshot for {domain}"))?;
        Ok(snapshot)
    }
}
