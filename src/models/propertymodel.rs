use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Verification state of a listing. `properties.verification_status` is the
/// single source of truth; `is_verified` is always derived from it.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[default]
    NotVerified,
    PendingPayment,
    PendingVerification,
    Verified,
    Expired,
}

impl VerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationStatus::NotVerified => "NOT_VERIFIED",
            VerificationStatus::PendingPayment => "PENDING_PAYMENT",
            VerificationStatus::PendingVerification => "PENDING_VERIFICATION",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub verification_status: VerificationStatus,
    pub verification_expiry: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner fields a notifier needs to reach someone.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OwnerContact {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Row shape of the expiry and reminder queries (property joined with owner).
#[derive(Debug, FromRow, Clone)]
pub struct PropertyOwnerRow {
    pub id: Uuid,
    pub title: String,
    pub verification_expiry: DateTime<Utc>,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
}

impl PropertyOwnerRow {
    pub fn owner(&self) -> OwnerContact {
        OwnerContact {
            id: self.owner_id,
            name: self.owner_name.clone(),
            email: self.owner_email.clone(),
            phone: self.owner_phone.clone(),
        }
    }
}
