use super::{DiffContext, Differencer};
use crate::core::{DnsRecordType, DomainSnapshot, TrackedDomain};
use crate::util::norm;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// Set-diffs the NS, MX and TXT record sets.
///
/// Each added or removed record gets its own audit entry. An empty fresh
/// list for a category is treated as missing data rather than a mass
/// removal; resolver hiccups must not wipe a record set.
pub struct DnsDiff;

const TYPES: [DnsRecordType; 3] = [DnsRecordType::Ns, DnsRecordType::Mx, DnsRecordType::Txt];

#[async_trait]
impl Differencer for DnsDiff {
    fn name(&self) -> &'static str {
        "dns"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh_dns) = &snapshot.dns else {
            return Ok(());
        };

        for record_type in TYPES {
            let fresh = fresh_dns.records(record_type);
            if fresh.is_empty() {
                continue;
            }

            let stored = ctx.store.get_dns_records(&domain.id, record_type).await?;
            let stored_keys: HashSet<String> = stored.iter().map(|v| norm(v)).collect();
            let fresh_keys: HashSet<String> = fresh.iter().map(|v| norm(v)).collect();
            let label = record_type.label();

            // Upstreams return duplicate records; one audit entry per
            // distinct value.
            let mut added: HashSet<String> = HashSet::new();
            for value in fresh {
                let key = norm(value);
                if !stored_keys.contains(&key) && added.insert(key) {
                    let value = value.trim();
                    debug!(domain = %domain.domain_name, %record_type, value, "DNS record added");
                    ctx.store
                        .add_dns_record(&domain.id, record_type, value)
                        .await?;
                    ctx.recorder
                        .record(
                            domain,
                            &format!("DNS {label} record added: {value}"),
                            &format!("dns_{record_type}_added"),
                            None,
                            Some(value.to_string()),
                        )
                        .await?;
                    changes.push(format!("DNS {label}+"));
                }
            }

            for value in &stored {
                if !fresh_keys.contains(&norm(value)) {
                    debug!(domain = %domain.domain_name, %record_type, value, "DNS record removed");
                    ctx.store
                        .remove_dns_record(&domain.id, record_type, value)
                        .await?;
                    ctx.recorder
                        .record(
                            domain,
                            &format!("DNS {label} record removed: {value}"),
                            &format!("dns_{record_type}_removed"),
                            Some(value.clone()),
                            None,
                        )
                        .await?;
                    changes.push(format!("DNS {label}-"));
                }
            }
        }
        Ok(())
    }
}
