//! The audit/notification recorder.
//!
//! Every detected change goes through [`Recorder::record`]: the immutable
//! audit row is always appended, then the domain's notification
//! preferences gate a single best-effort webhook dispatch. The audit trail
//! is authoritative regardless of notification delivery.

use crate::core::{DomainUpdate, Notification, NotificationSender, TrackedDomain};
use crate::store::DomainStore;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn DomainStore>,
    notifier: Option<Arc<dyn NotificationSender>>,
}

impl Recorder {
    pub fn new(store: Arc<dyn DomainStore>, notifier: Option<Arc<dyn NotificationSender>>) -> Self {
        Self { store, notifier }
    }

    /// Appends one audit record and, if the owner opted in to this change
    /// type, dispatches one notification.
    ///
    /// Only the audit insert can fail this call; preference reads and
    /// notification delivery are logged and swallowed.
    pub async fn record(
        &self,
        domain: &TrackedDomain,
        description: &str,
        change_type: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Result<()> {
        let update = DomainUpdate {
            id: Uuid::new_v4().to_string(),
            domain_id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            change: description.to_string(),
            change_type: change_type.to_string(),
            old_value,
            new_value,
            date: Utc::now(),
        };
        self.store.append_update(&update).await?;
        metrics::counter!("audit_records_total").increment(1);
        debug!(domain = %domain.domain_name, change_type, "Recorded change");

        let Some(notifier) = &self.notifier else {
            return Ok(());
        };

        let prefs = match self.store.notification_preferences(&domain.id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(
                    domain = %domain.domain_name,
                    error = %e,
                    "Could not read notification preferences, skipping dispatch"
                );
                return Ok(());
            }
        };

        let enabled = prefs
            .iter()
            .any(|p| p.is_enabled && change_type.starts_with(&p.notification_type));
        if !enabled {
            return Ok(());
        }

        let notification = Notification {
            title: domain.domain_name.clone(),
            body: format!("{}: {}", domain.domain_name, description),
            tags: vec![change_type.to_string()],
        };
        match notifier.send(&notification).await {
            Ok(()) => {
                metrics::counter!("notifications_sent_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total").increment(1);
                error!(
                    domain = %domain.domain_name,
                    error = %e,
                    "Notification dispatch failed; audit record is persisted"
                );
            }
        }
        Ok(())
    }
}
