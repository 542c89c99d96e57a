use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Audit row for one verification request. At most one row per property has
/// `is_active = true`; that row governs the property's VERIFIED grant.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct PropertyVerification {
    pub id: Uuid,
    pub property_id: Uuid,
    pub status: RequestStatus,
    pub is_active: bool,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
