// service/verification_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::verificationdb::VerificationExt,
    dtos::verificationdtos::{
        PropertyVerificationDto, ReviewDecision, VerificationFee, VerificationStatusDto,
    },
    models::{propertymodel::Property, verificationmodels::PropertyVerification},
    service::{
        error::ServiceError, lifecycle::VerificationAction,
        maintenance_service::VERIFICATION_VALIDITY_DAYS,
    },
};

/// Owner and admin actions on a property's verification.
pub struct VerificationService {
    store: Arc<dyn VerificationExt>,
    fee: VerificationFee,
}

impl VerificationService {
    pub fn new(store: Arc<dyn VerificationExt>, fee: VerificationFee) -> Self {
        Self { store, fee }
    }

    pub fn fee(&self) -> &VerificationFee {
        &self.fee
    }

    async fn property(&self, property_id: Uuid) -> Result<Property, ServiceError> {
        self.store
            .get_property(property_id)
            .await?
            .ok_or(ServiceError::PropertyNotFound(property_id))
    }

    /// Start (or renew) verification. The property waits for payment next.
    pub async fn request_verification(
        &self,
        property_id: Uuid,
    ) -> Result<(Property, VerificationFee), ServiceError> {
        let property = self.property(property_id).await?;
        property
            .verification_status
            .apply(VerificationAction::Request)?;

        let property = self.store.mark_pending_payment(property_id).await?;
        tracing::info!("Verification requested for property {}", property_id);

        Ok((property, self.fee.clone()))
    }

    /// Record the (stubbed) fee payment and queue the property for review.
    pub async fn confirm_payment(
        &self,
        property_id: Uuid,
    ) -> Result<PropertyVerification, ServiceError> {
        let property = self.property(property_id).await?;
        property
            .verification_status
            .apply(VerificationAction::ConfirmPayment)?;

        let verification = self.store.submit_for_review(property_id).await?;
        tracing::info!(
            "Property {} queued for review as request {}",
            property_id,
            verification.id
        );

        Ok(verification)
    }

    pub async fn review(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        decision: ReviewDecision,
        review_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        match decision {
            ReviewDecision::Approve => self.approve(verification_id, admin_id, review_notes, now).await,
            ReviewDecision::Reject => self.reject(verification_id, admin_id, review_notes, now).await,
        }
    }

    /// Grant verification for `VERIFICATION_VALIDITY_DAYS` from `now`.
    pub async fn approve(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        let expires_at = now + Duration::days(VERIFICATION_VALIDITY_DAYS);
        let property = self
            .store
            .approve_verification(verification_id, admin_id, review_notes, now, expires_at)
            .await?;

        tracing::info!(
            "Admin {} approved verification {} for property {}, valid until {}",
            admin_id,
            verification_id,
            property.id,
            expires_at
        );
        Ok(property)
    }

    pub async fn reject(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        let property = self
            .store
            .reject_verification(verification_id, admin_id, review_notes, now)
            .await?;

        tracing::info!(
            "Admin {} rejected verification {} for property {}",
            admin_id,
            verification_id,
            property.id
        );
        Ok(property)
    }

    pub async fn status(&self, property_id: Uuid) -> Result<VerificationStatusDto, ServiceError> {
        let property = self.property(property_id).await?;
        let history = self.store.verification_history(property_id).await?;

        Ok(VerificationStatusDto {
            can_request_verification: property.verification_status.can_request_verification(),
            property: PropertyVerificationDto::from_property(&property),
            history,
        })
    }

    pub async fn pending(&self) -> Result<Vec<PropertyVerification>, ServiceError> {
        self.store.pending_verifications().await
    }
}
