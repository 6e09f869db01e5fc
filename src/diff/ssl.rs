use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, SslCertificate, TrackedDomain};
use crate::util::{date_changed, field_changed, fmt_day, int_changed};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Diffs the current SSL certificate field by field.
///
/// Validity dates carry handshake-time serialization jitter, so they only
/// count as changed beyond a one-day tolerance. A domain with no stored
/// certificate gets the fresh one inserted wholesale under a single
/// `ssl_created` record; otherwise each changed field gets its own record
/// and one combined update replaces the row in place.
pub struct SslDiff;

#[async_trait]
impl Differencer for SslDiff {
    fn name(&self) -> &'static str {
        "ssl"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = &snapshot.ssl else {
            return Ok(());
        };
        if *fresh == SslCertificate::default() {
            // The TLS read produced nothing; absence of data is not a change.
            return Ok(());
        }

        let Some(stored) = ctx.store.get_ssl_certificate(&domain.id).await? else {
            debug!(domain = %domain.domain_name, "No stored certificate, inserting fresh one");
            ctx.store.insert_ssl_certificate(&domain.id, fresh).await?;
            ctx.recorder
                .record(
                    domain,
                    "SSL certificate added",
                    "ssl_created",
                    None,
                    fresh.issuer.clone(),
                )
                .await?;
            changes.push("SSL".to_string());
            return Ok(());
        };

        let mut updated = stored.clone();
        let mut diffs: Vec<(&'static str, Option<String>, Option<String>)> = Vec::new();

        if field_changed(stored.issuer.as_deref(), fresh.issuer.as_deref()) {
            diffs.push(("issuer", stored.issuer.clone(), fresh.issuer.clone()));
            updated.issuer = fresh.issuer.clone();
        }
        if field_changed(
            stored.issuer_country.as_deref(),
            fresh.issuer_country.as_deref(),
        ) {
            diffs.push((
                "issuer_country",
                stored.issuer_country.clone(),
                fresh.issuer_country.clone(),
            ));
            updated.issuer_country = fresh.issuer_country.clone();
        }
        if field_changed(stored.subject.as_deref(), fresh.subject.as_deref()) {
            diffs.push(("subject", stored.subject.clone(), fresh.subject.clone()));
            updated.subject = fresh.subject.clone();
        }
        if let Some(fresh_from) = fresh.valid_from {
            if date_changed(stored.valid_from, fresh_from, ctx.ssl_date_tolerance_days) {
                diffs.push((
                    "valid_from",
                    stored.valid_from.map(fmt_day),
                    Some(fmt_day(fresh_from)),
                ));
                updated.valid_from = Some(fresh_from);
            }
        }
        if let Some(fresh_to) = fresh.valid_to {
            if date_changed(stored.valid_to, fresh_to, ctx.ssl_date_tolerance_days) {
                diffs.push((
                    "valid_to",
                    stored.valid_to.map(fmt_day),
                    Some(fmt_day(fresh_to)),
                ));
                updated.valid_to = Some(fresh_to);
            }
        }
        if field_changed(stored.fingerprint.as_deref(), fresh.fingerprint.as_deref()) {
            diffs.push((
                "fingerprint",
                stored.fingerprint.clone(),
                fresh.fingerprint.clone(),
            ));
            updated.fingerprint = fresh.fingerprint.clone();
        }
        if int_changed(stored.key_size, fresh.key_size) {
            diffs.push((
                "key_size",
                stored.key_size.map(|k| k.to_string()),
                fresh.key_size.map(|k| k.to_string()),
            ));
            updated.key_size = fresh.key_size;
        }
        if field_changed(
            stored.signature_algorithm.as_deref(),
            fresh.signature_algorithm.as_deref(),
        ) {
            diffs.push((
                "signature_algorithm",
                stored.signature_algorithm.clone(),
                fresh.signature_algorithm.clone(),
            ));
            updated.signature_algorithm = fresh.signature_algorithm.clone();
        }

        if diffs.is_empty() {
            return Ok(());
        }

        for (field, old, new) in &diffs {
            ctx.recorder
                .record(
                    domain,
                    &format!("SSL {field} changed"),
                    &format!("ssl_{field}"),
                    old.clone(),
                    new.clone(),
                )
                .await?;
            changes.push(format!("SSL {field}"));
        }
        ctx.store.update_ssl_certificate(&domain.id, &updated).await?;
        Ok(())
    }
}
