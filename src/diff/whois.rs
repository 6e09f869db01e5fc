use super::{DiffContext, Differencer};
use crate::core::{DomainSnapshot, TrackedDomain, WhoisContact};
use crate::util::field_changed;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Diffs the WHOIS registrant contact.
///
/// Same shape as the SSL differencer: wholesale insert under one
/// `whois_created` record when nothing is stored, otherwise per-field
/// audit records followed by one combined update.
pub struct WhoisDiff;

/// The contact fields compared, in audit order.
const FIELDS: [&str; 7] = [
    "name",
    "organization",
    "street",
    "city",
    "state",
    "postal_code",
    "country",
];

fn get_field<'a>(contact: &'a WhoisContact, field: &str) -> Option<&'a str> {
    match field {
        "name" => contact.name.as_deref(),
        "organization" => contact.organization.as_deref(),
        "street" => contact.street.as_deref(),
        "city" => contact.city.as_deref(),
        "state" => contact.state.as_deref(),
        "postal_code" => contact.postal_code.as_deref(),
        "country" => contact.country.as_deref(),
        _ => unreachable!("unknown whois field {field}"),
    }
}

fn set_field(contact: &mut WhoisContact, field: &str, value: Option<String>) {
    match field {
        "name" => contact.name = value,
        "organization" => contact.organization = value,
        "street" => contact.street = value,
        "city" => contact.city = value,
        "state" => contact.state = value,
        "postal_code" => contact.postal_code = value,
        "country" => contact.country = value,
        _ => unreachable!("unknown whois field {field}"),
    }
}

#[async_trait]
impl Differencer for WhoisDiff {
    fn name(&self) -> &'static str {
        "whois"
    }

    async fn apply(
        &self,
        ctx: &DiffContext,
        domain: &TrackedDomain,
        snapshot: &DomainSnapshot,
        changes: &mut Vec<String>,
    ) -> Result<()> {
        let Some(fresh) = &snapshot.whois else {
            return Ok(());
        };
        if *fresh == WhoisContact::default() {
            return Ok(());
        }

        let Some(stored) = ctx.store.get_whois(&domain.id).await? else {
            debug!(domain = %domain.domain_name, "No stored WHOIS contact, inserting fresh one");
            ctx.store.insert_whois(&domain.id, fresh).await?;
            ctx.recorder
                .record(
                    domain,
                    "WHOIS contact added",
                    "whois_created",
                    None,
                    fresh.name.clone(),
                )
                .await?;
            changes.push("WHOIS".to_string());
            return Ok(());
        };

        let mut updated = stored.clone();
        let mut changed_any = false;
        for field in FIELDS {
            let old = get_field(&stored, field);
            let new = get_field(fresh, field);
            if !field_changed(old, new) {
                continue;
            }
            ctx.recorder
                .record(
                    domain,
                    &format!("WHOIS {field} changed"),
                    &format!("whois_{field}"),
                    old.map(str::to_string),
                    new.map(str::to_string),
                )
                .await?;
            changes.push(format!("WHOIS {field}"));
            set_field(&mut updated, field, new.map(str::to_string));
            changed_any = true;
        }

        if changed_any {
            // One combined update for all changed fields.
            ctx.store.update_whois(&domain.id, &updated).await?;
        }
        Ok(())
    }
}
