use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    propertymodel::{OwnerContact, Property, PropertyOwnerRow, VerificationStatus},
    verificationmodels::PropertyVerification,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewVerificationDto {
    pub admin_id: Uuid,

    pub decision: ReviewDecision,

    #[validate(length(max = 2000, message = "Review notes must be at most 2000 characters"))]
    pub review_notes: Option<String>,
}

/// Stubbed fee quote shown to owners; no payment is taken here.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VerificationFee {
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyVerificationDto {
    pub id: Uuid,
    pub title: String,
    pub verification_status: VerificationStatus,
    pub is_verified: bool,
    pub verification_expiry: Option<DateTime<Utc>>,
}

impl PropertyVerificationDto {
    pub fn from_property(property: &Property) -> Self {
        PropertyVerificationDto {
            id: property.id,
            title: property.title.clone(),
            verification_status: property.verification_status,
            is_verified: property.is_verified,
            verification_expiry: property.verification_expiry,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationStatusDto {
    pub property: PropertyVerificationDto,
    pub can_request_verification: bool,
    pub history: Vec<PropertyVerification>,
}

/// A property the expiry sweep demoted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExpiredPropertySummary {
    pub id: Uuid,
    pub title: String,
    pub verification_expiry: DateTime<Utc>,
    pub owner: OwnerContact,
}

impl From<PropertyOwnerRow> for ExpiredPropertySummary {
    fn from(row: PropertyOwnerRow) -> Self {
        ExpiredPropertySummary {
            owner: row.owner(),
            id: row.id,
            title: row.title,
            verification_expiry: row.verification_expiry,
        }
    }
}

/// A property whose verification lapses inside the reminder window.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExpiringPropertySummary {
    pub id: Uuid,
    pub title: String,
    pub verification_expiry: DateTime<Utc>,
    pub days_left: i64,
    pub owner: OwnerContact,
}

/// Body of `POST /expire-verifications`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExpirySweepResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<ExpiredPropertySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExpirySweepResult {
    pub fn completed(properties: Vec<ExpiredPropertySummary>) -> Self {
        ExpirySweepResult {
            success: true,
            expired: Some(properties.len()),
            properties: (!properties.is_empty()).then_some(properties),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ExpirySweepResult {
            success: false,
            expired: None,
            properties: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /send-expiry-reminders`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReminderScanResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<ExpiringPropertySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReminderScanResult {
    pub fn completed(properties: Vec<ExpiringPropertySummary>) -> Self {
        ReminderScanResult {
            success: true,
            reminders: Some(properties.len()),
            properties: (!properties.is_empty()).then_some(properties),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        ReminderScanResult {
            success: false,
            reminders: None,
            properties: None,
            error: Some(error.into()),
        }
    }

    pub fn matches(&self) -> &[ExpiringPropertySummary] {
        self.properties.as_deref().unwrap_or(&[])
    }
}

/// Body of `POST /run-maintenance`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MaintenanceReport {
    pub expiry: ExpirySweepResult,
    pub reminders: ReminderScanResult,
}

impl MaintenanceReport {
    pub fn is_success(&self) -> bool {
        self.expiry.success && self.reminders.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_sweep_omits_property_list() {
        let body = serde_json::to_value(ExpirySweepResult::completed(Vec::new())).unwrap();
        assert_eq!(body, json!({ "success": true, "expired": 0 }));
    }

    #[test]
    fn failed_scan_only_carries_error() {
        let body = serde_json::to_value(ReminderScanResult::failed("boom")).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn review_dto_rejects_oversized_notes() {
        let dto = ReviewVerificationDto {
            admin_id: Uuid::new_v4(),
            decision: ReviewDecision::Reject,
            review_notes: Some("x".repeat(2001)),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn review_decision_is_lowercase_on_the_wire() {
        let dto: ReviewVerificationDto = serde_json::from_value(json!({
            "admin_id": Uuid::nil(),
            "decision": "approve"
        }))
        .unwrap();
        assert_eq!(dto.decision, ReviewDecision::Approve);
        assert!(dto.review_notes.is_none());
    }
}
