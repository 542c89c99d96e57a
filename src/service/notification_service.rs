// service/notification_service.rs
use async_trait::async_trait;

use crate::{
    mail::{mails::send_verification_expiry_email, sendmail::Mailer},
    models::propertymodel::OwnerContact,
    service::error::ServiceError,
};

/// Delivers "your verification is about to lapse" reminders to owners.
#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    async fn notify_expiring(
        &self,
        owner: &OwnerContact,
        property_title: &str,
        days_left: i64,
    ) -> Result<(), ServiceError>;
}

/// Writes reminders to the log only. Used when no mail provider is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl ExpiryNotifier for LogNotifier {
    async fn notify_expiring(
        &self,
        owner: &OwnerContact,
        property_title: &str,
        days_left: i64,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "Expiry reminder: owner {} ({}) - \"{}\" expires in {} day(s)",
            owner.id,
            owner.name,
            property_title,
            days_left
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EmailNotifier {
    mailer: Mailer,
    app_url: String,
}

impl EmailNotifier {
    pub fn new(mailer: Mailer, app_url: impl Into<String>) -> Self {
        Self {
            mailer,
            app_url: app_url.into(),
        }
    }
}

#[async_trait]
impl ExpiryNotifier for EmailNotifier {
    async fn notify_expiring(
        &self,
        owner: &OwnerContact,
        property_title: &str,
        days_left: i64,
    ) -> Result<(), ServiceError> {
        let Some(email) = owner.email.as_deref() else {
            tracing::warn!(
                "Owner {} has no email address, skipping reminder for \"{}\"",
                owner.id,
                property_title
            );
            return Ok(());
        };

        send_verification_expiry_email(
            &self.mailer,
            email,
            &owner.name,
            property_title,
            days_left,
            &self.app_url,
        )
        .await
        .map_err(|e| ServiceError::Notification(e.to_string()))
    }
}
