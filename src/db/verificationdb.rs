// db/verificationdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;

use crate::{
    models::{
        propertymodel::{Property, PropertyOwnerRow, VerificationStatus},
        verificationmodels::{PropertyVerification, RequestStatus},
    },
    service::{error::ServiceError, lifecycle::VerificationAction},
};

const PROPERTY_COLUMNS: &str = r#"
    id, owner_id, title, verification_status, verification_expiry,
    is_verified, created_at, updated_at
"#;

const VERIFICATION_COLUMNS: &str = r#"
    id, property_id, status, is_active, review_notes,
    reviewed_by, reviewed_at, created_at
"#;

const PROPERTY_OWNER_COLUMNS: &str = r#"
    p.id, p.title, p.verification_expiry,
    o.id AS owner_id, o.name AS owner_name, o.email AS owner_email, o.phone AS owner_phone
"#;

/// Storage handle for the verification workflow.
///
/// Methods that write to more than one row are all-or-nothing: either every
/// row they touch is updated, or the store is left exactly as it was.
#[async_trait]
pub trait VerificationExt: Send + Sync {
    /// VERIFIED properties whose expiry is strictly before `now`.
    async fn find_expired_verified(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError>;

    /// Flip the given properties to EXPIRED and deactivate their active
    /// verification rows in one transaction. The VERIFIED / expiry predicate is
    /// re-checked at write time; only ids that still match are expired and
    /// returned.
    async fn expire_properties(
        &self,
        property_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ServiceError>;

    /// VERIFIED properties whose expiry falls in `[from, to]`.
    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError>;

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, ServiceError>;

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<PropertyVerification>, ServiceError>;

    /// Every request ever made for a property, newest first.
    async fn verification_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyVerification>, ServiceError>;

    /// Requests awaiting admin review, oldest first.
    async fn pending_verifications(&self) -> Result<Vec<PropertyVerification>, ServiceError>;

    async fn mark_pending_payment(&self, property_id: Uuid) -> Result<Property, ServiceError>;

    /// Move a paid property to PENDING_VERIFICATION and open a new active
    /// request row, deactivating whatever row governed it before.
    async fn submit_for_review(
        &self,
        property_id: Uuid,
    ) -> Result<PropertyVerification, ServiceError>;

    async fn approve_verification(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        reviewed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Property, ServiceError>;

    async fn reject_verification(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Property, ServiceError>;
}

impl DBClient {
    /// Explains why a status-guarded update matched nothing.
    async fn transition_error(
        &self,
        property_id: Uuid,
        action: VerificationAction,
    ) -> ServiceError {
        match self.get_property(property_id).await {
            Ok(Some(property)) => ServiceError::InvalidTransition {
                from: property.verification_status,
                action,
            },
            Ok(None) => ServiceError::PropertyNotFound(property_id),
            Err(e) => e,
        }
    }

    async fn review_target(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        verification_id: Uuid,
        action: VerificationAction,
    ) -> Result<(PropertyVerification, VerificationStatus), ServiceError> {
        let verification = sqlx::query_as::<_, PropertyVerification>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM property_verifications WHERE id = $1 FOR UPDATE"
        ))
        .bind(verification_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ServiceError::VerificationNotFound(verification_id))?;

        let current: VerificationStatus = sqlx::query_scalar(
            "SELECT verification_status FROM properties WHERE id = $1 FOR UPDATE",
        )
        .bind(verification.property_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ServiceError::PropertyNotFound(verification.property_id))?;

        if verification.status != RequestStatus::Pending {
            return Err(ServiceError::InvalidTransition {
                from: current,
                action,
            });
        }

        let next = current.apply(action)?;
        Ok((verification, next))
    }
}

fn reviewer_error(err: sqlx::Error, admin_id: Uuid) -> ServiceError {
    // 23503: foreign_key_violation on reviewed_by
    let unknown_admin = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "23503")
        .unwrap_or(false);

    if unknown_admin {
        ServiceError::Validation(format!("Admin {} does not exist", admin_id))
    } else {
        ServiceError::Database(err)
    }
}

#[async_trait]
impl VerificationExt for DBClient {
    async fn find_expired_verified(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError> {
        let rows = sqlx::query_as::<_, PropertyOwnerRow>(&format!(
            r#"
            SELECT {PROPERTY_OWNER_COLUMNS}
            FROM properties p
            JOIN owners o ON o.id = p.owner_id
            WHERE p.verification_status = $1
            AND p.verification_expiry IS NOT NULL
            AND p.verification_expiry < $2
            ORDER BY p.verification_expiry ASC
            "#
        ))
        .bind(VerificationStatus::Verified)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn expire_properties(
        &self,
        property_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ServiceError> {
        if property_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;

        let expired: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE properties
            SET verification_status = $1, is_verified = FALSE, updated_at = NOW()
            WHERE id = ANY($2)
            AND verification_status = $3
            AND verification_expiry < $4
            RETURNING id
            "#,
        )
        .bind(VerificationStatus::Expired)
        .bind(property_ids)
        .bind(VerificationStatus::Verified)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if !expired.is_empty() {
            sqlx::query(
                r#"
                UPDATE property_verifications
                SET is_active = FALSE
                WHERE property_id = ANY($1)
                AND is_active = TRUE
                "#,
            )
            .bind(&expired[..])
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(expired)
    }

    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError> {
        let rows = sqlx::query_as::<_, PropertyOwnerRow>(&format!(
            r#"
            SELECT {PROPERTY_OWNER_COLUMNS}
            FROM properties p
            JOIN owners o ON o.id = p.owner_id
            WHERE p.verification_status = $1
            AND p.verification_expiry IS NOT NULL
            AND p.verification_expiry BETWEEN $2 AND $3
            ORDER BY p.verification_expiry ASC
            "#
        ))
        .bind(VerificationStatus::Verified)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, ServiceError> {
        let property = sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<PropertyVerification>, ServiceError> {
        let verification = sqlx::query_as::<_, PropertyVerification>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM property_verifications WHERE id = $1"
        ))
        .bind(verification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }

    async fn verification_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyVerification>, ServiceError> {
        let rows = sqlx::query_as::<_, PropertyVerification>(&format!(
            r#"
            SELECT {VERIFICATION_COLUMNS}
            FROM property_verifications
            WHERE property_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn pending_verifications(&self) -> Result<Vec<PropertyVerification>, ServiceError> {
        let rows = sqlx::query_as::<_, PropertyVerification>(&format!(
            r#"
            SELECT {VERIFICATION_COLUMNS}
            FROM property_verifications
            WHERE status = $1 AND is_active = TRUE
            ORDER BY created_at ASC
            "#
        ))
        .bind(RequestStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_pending_payment(&self, property_id: Uuid) -> Result<Property, ServiceError> {
        let property = sqlx::query_as::<_, Property>(&format!(
            r#"
            UPDATE properties
            SET verification_status = $1, is_verified = FALSE, updated_at = NOW()
            WHERE id = $2
            AND verification_status IN ($3, $4)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(VerificationStatus::PendingPayment)
        .bind(property_id)
        .bind(VerificationStatus::NotVerified)
        .bind(VerificationStatus::Expired)
        .fetch_optional(&self.pool)
        .await?;

        match property {
            Some(property) => Ok(property),
            None => Err(self
                .transition_error(property_id, VerificationAction::Request)
                .await),
        }
    }

    async fn submit_for_review(
        &self,
        property_id: Uuid,
    ) -> Result<PropertyVerification, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let moved: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE properties
            SET verification_status = $1, updated_at = NOW()
            WHERE id = $2 AND verification_status = $3
            RETURNING id
            "#,
        )
        .bind(VerificationStatus::PendingVerification)
        .bind(property_id)
        .bind(VerificationStatus::PendingPayment)
        .fetch_optional(&mut *tx)
        .await?;

        if moved.is_none() {
            tx.rollback().await?;
            return Err(self
                .transition_error(property_id, VerificationAction::ConfirmPayment)
                .await);
        }

        sqlx::query(
            r#"
            UPDATE property_verifications
            SET is_active = FALSE
            WHERE property_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(property_id)
        .execute(&mut *tx)
        .await?;

        let verification = sqlx::query_as::<_, PropertyVerification>(&format!(
            r#"
            INSERT INTO property_verifications (property_id, status, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING {VERIFICATION_COLUMNS}
            "#
        ))
        .bind(property_id)
        .bind(RequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(verification)
    }

    async fn approve_verification(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        reviewed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let (verification, next) =
            DBClient::review_target(&mut tx, verification_id, VerificationAction::Approve).await?;

        sqlx::query(
            r#"
            UPDATE property_verifications
            SET is_active = FALSE
            WHERE property_id = $1 AND id <> $2 AND is_active = TRUE
            "#,
        )
        .bind(verification.property_id)
        .bind(verification_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE property_verifications
            SET status = $1, is_active = TRUE, reviewed_by = $2, review_notes = $3, reviewed_at = $4
            WHERE id = $5
            "#,
        )
        .bind(RequestStatus::Approved)
        .bind(admin_id)
        .bind(review_notes)
        .bind(reviewed_at)
        .bind(verification_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| reviewer_error(e, admin_id))?;

        let property = sqlx::query_as::<_, Property>(&format!(
            r#"
            UPDATE properties
            SET verification_status = $1, is_verified = $2, verification_expiry = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(next)
        .bind(next.is_verified())
        .bind(expires_at)
        .bind(verification.property_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(property)
    }

    async fn reject_verification(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let (verification, next) =
            DBClient::review_target(&mut tx, verification_id, VerificationAction::Reject).await?;

        sqlx::query(
            r#"
            UPDATE property_verifications
            SET status = $1, is_active = FALSE, reviewed_by = $2, review_notes = $3, reviewed_at = $4
            WHERE id = $5
            "#,
        )
        .bind(RequestStatus::Rejected)
        .bind(admin_id)
        .bind(review_notes)
        .bind(reviewed_at)
        .bind(verification_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| reviewer_error(e, admin_id))?;

        let property = sqlx::query_as::<_, Property>(&format!(
            r#"
            UPDATE properties
            SET verification_status = $1, is_verified = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(next)
        .bind(next.is_verified())
        .bind(verification.property_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(property)
    }
}
