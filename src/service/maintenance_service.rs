// service/maintenance_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::verificationdb::VerificationExt,
    dtos::verificationdtos::{
        ExpiredPropertySummary, ExpiringPropertySummary, ExpirySweepResult, MaintenanceReport,
        ReminderScanResult,
    },
    service::{error::ServiceError, notification_service::ExpiryNotifier},
};

/// How long an approved verification stays valid.
pub const VERIFICATION_VALIDITY_DAYS: i64 = 365;

/// How far ahead the reminder scan looks for lapsing verifications.
pub const REMINDER_LOOKAHEAD_DAYS: i64 = 7;

/// Whole days until `expiry`, rounded up. Zero once `expiry` is not in the future.
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining = (expiry - now).num_milliseconds();
    if remaining <= 0 {
        return 0;
    }
    let day = Duration::days(1).num_milliseconds();
    (remaining + day - 1) / day
}

/// Batch jobs run by the scheduler: the expiry sweep and the reminder scan.
///
/// Neither job returns an error. Failures come back as `success: false`
/// results so the caller can log them and try again on the next tick.
pub struct MaintenanceService {
    store: Arc<dyn VerificationExt>,
    notifier: Option<Arc<dyn ExpiryNotifier>>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn VerificationExt>, notifier: Option<Arc<dyn ExpiryNotifier>>) -> Self {
        Self { store, notifier }
    }

    /// Demote every VERIFIED property whose expiry is strictly before `now`.
    pub async fn expire_verifications(&self, now: DateTime<Utc>) -> ExpirySweepResult {
        match self.sweep(now).await {
            Ok(expired) => {
                tracing::info!("Verification expiry sweep: {} properties expired", expired.len());
                for property in &expired {
                    tracing::info!(
                        "Expired verification for property {} (\"{}\"), lapsed at {}",
                        property.id,
                        property.title,
                        property.verification_expiry
                    );
                }
                ExpirySweepResult::completed(expired)
            }
            Err(e) => {
                tracing::error!("Verification expiry sweep failed: {}", e);
                ExpirySweepResult::failed(e.to_string())
            }
        }
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<ExpiredPropertySummary>, ServiceError> {
        let candidates = self.store.find_expired_verified(now).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let expired = self.store.expire_properties(&ids, now).await?;

        if expired.len() < candidates.len() {
            tracing::debug!(
                "{} properties were renewed or changed before the sweep committed",
                candidates.len() - expired.len()
            );
        }

        Ok(candidates
            .into_iter()
            .filter(|c| expired.contains(&c.id))
            .map(ExpiredPropertySummary::from)
            .collect())
    }

    /// Find VERIFIED properties lapsing within the lookahead window and hand
    /// each one to the notifier, if one is configured. Never writes to the store.
    pub async fn send_expiry_reminders(&self, now: DateTime<Utc>) -> ReminderScanResult {
        let window_end = now + Duration::days(REMINDER_LOOKAHEAD_DAYS);

        let rows = match self.store.find_expiring_between(now, window_end).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Expiry reminder scan failed: {}", e);
                return ReminderScanResult::failed(e.to_string());
            }
        };

        let matches: Vec<ExpiringPropertySummary> = rows
            .into_iter()
            .map(|row| ExpiringPropertySummary {
                days_left: days_until(row.verification_expiry, now),
                owner: row.owner(),
                id: row.id,
                title: row.title,
                verification_expiry: row.verification_expiry,
            })
            .collect();

        tracing::info!("Expiry reminder scan: {} properties expiring soon", matches.len());

        for property in &matches {
            tracing::info!(
                "Property {} (\"{}\") expires in {} day(s), owner {}",
                property.id,
                property.title,
                property.days_left,
                property.owner.id
            );

            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier
                    .notify_expiring(&property.owner, &property.title, property.days_left)
                    .await
                {
                    tracing::warn!(
                        "Failed to deliver expiry reminder for property {}: {}",
                        property.id,
                        e
                    );
                }
            }
        }

        ReminderScanResult::completed(matches)
    }

    /// Sweep first, then scan. A failed sweep does not stop the scan.
    pub async fn run_maintenance(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let expiry = self.expire_verifications(now).await;
        let reminders = self.send_expiry_reminders(now).await;

        MaintenanceReport { expiry, reminders }
    }
}
