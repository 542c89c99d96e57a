// service/lifecycle.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{models::propertymodel::VerificationStatus, service::error::ServiceError};

/// Something that moves a property through its verification lifecycle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationAction {
    Request,
    ConfirmPayment,
    Approve,
    Reject,
    Expire,
}

impl VerificationAction {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationAction::Request => "request verification for",
            VerificationAction::ConfirmPayment => "confirm payment for",
            VerificationAction::Approve => "approve",
            VerificationAction::Reject => "reject",
            VerificationAction::Expire => "expire",
        }
    }
}

impl fmt::Display for VerificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl VerificationStatus {
    /// Owners may only (re)start verification from these states.
    pub fn can_request_verification(&self) -> bool {
        matches!(
            self,
            VerificationStatus::NotVerified | VerificationStatus::Expired
        )
    }

    /// Value of the denormalised `is_verified` column for this status.
    pub fn is_verified(&self) -> bool {
        *self == VerificationStatus::Verified
    }

    pub fn apply(self, action: VerificationAction) -> Result<VerificationStatus, ServiceError> {
        use VerificationAction as A;
        use VerificationStatus as S;

        let next = match (self, action) {
            (S::NotVerified | S::Expired, A::Request) => S::PendingPayment,
            (S::PendingPayment, A::ConfirmPayment) => S::PendingVerification,
            (S::PendingVerification, A::Approve) => S::Verified,
            (S::PendingVerification, A::Reject) => S::NotVerified,
            (S::Verified, A::Expire) => S::Expired,
            (from, action) => return Err(ServiceError::InvalidTransition { from, action }),
        };

        Ok(next)
    }
}
