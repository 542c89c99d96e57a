// db/memory.rs
//
// In-process store with the same contract as the Postgres one. Every
// multi-row mutation works on a copy of the state and swaps it in only when
// all steps succeed.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::verificationdb::VerificationExt;
use crate::{
    models::{
        propertymodel::{OwnerContact, Property, PropertyOwnerRow, VerificationStatus},
        verificationmodels::{PropertyVerification, RequestStatus},
    },
    service::{error::ServiceError, lifecycle::VerificationAction},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    owners: HashMap<Uuid, OwnerContact>,
    properties: HashMap<Uuid, Property>,
    verifications: Vec<PropertyVerification>,
}

impl MemoryState {
    fn joined(&self, property: &Property) -> Option<PropertyOwnerRow> {
        let owner = self.owners.get(&property.owner_id)?;
        Some(PropertyOwnerRow {
            id: property.id,
            title: property.title.clone(),
            verification_expiry: property.verification_expiry?,
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            owner_email: owner.email.clone(),
            owner_phone: owner.phone.clone(),
        })
    }

    fn select<F>(&self, filter: F) -> Vec<PropertyOwnerRow>
    where
        F: Fn(&Property) -> bool,
    {
        let mut rows: Vec<PropertyOwnerRow> = self
            .properties
            .values()
            .filter(|p| filter(p))
            .filter_map(|p| self.joined(p))
            .collect();
        rows.sort_by_key(|r| r.verification_expiry);
        rows
    }

    fn review_target(
        &self,
        verification_id: Uuid,
        action: VerificationAction,
    ) -> Result<(usize, VerificationStatus), ServiceError> {
        let index = self
            .verifications
            .iter()
            .position(|v| v.id == verification_id)
            .ok_or(ServiceError::VerificationNotFound(verification_id))?;
        let verification = &self.verifications[index];
        let property = self
            .properties
            .get(&verification.property_id)
            .ok_or(ServiceError::PropertyNotFound(verification.property_id))?;

        if verification.status != RequestStatus::Pending {
            return Err(ServiceError::InvalidTransition {
                from: property.verification_status,
                action,
            });
        }

        let next = property.verification_status.apply(action)?;
        Ok((index, next))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    fail_next_expiry: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_owner(&self, name: &str, email: Option<&str>, phone: Option<&str>) -> Uuid {
        let owner = OwnerContact {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        };
        let id = owner.id;
        self.state.lock().unwrap().owners.insert(id, owner);
        id
    }

    pub fn add_property(
        &self,
        owner_id: Uuid,
        title: &str,
        status: VerificationStatus,
        expiry: Option<DateTime<Utc>>,
    ) -> Uuid {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            verification_status: status,
            verification_expiry: expiry,
            is_verified: status.is_verified(),
            created_at: now,
            updated_at: now,
        };
        let id = property.id;
        self.state.lock().unwrap().properties.insert(id, property);
        id
    }

    pub fn add_verification(
        &self,
        property_id: Uuid,
        status: RequestStatus,
        is_active: bool,
    ) -> Uuid {
        let verification = PropertyVerification {
            id: Uuid::new_v4(),
            property_id,
            status,
            is_active,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        let id = verification.id;
        self.state.lock().unwrap().verifications.push(verification);
        id
    }

    /// Test hook: push a property's expiry forward, as a concurrent renewal would.
    pub fn set_expiry(&self, property_id: Uuid, expiry: DateTime<Utc>) {
        if let Some(p) = self.state.lock().unwrap().properties.get_mut(&property_id) {
            p.verification_expiry = Some(expiry);
        }
    }

    pub fn property(&self, property_id: Uuid) -> Property {
        self.state.lock().unwrap().properties[&property_id].clone()
    }

    pub fn verifications_for(&self, property_id: Uuid) -> Vec<PropertyVerification> {
        self.state
            .lock()
            .unwrap()
            .verifications
            .iter()
            .filter(|v| v.property_id == property_id)
            .cloned()
            .collect()
    }

    /// Sorted copy of every row, for before/after comparisons.
    pub fn snapshot(&self) -> (Vec<Property>, Vec<PropertyVerification>) {
        let state = self.state.lock().unwrap();
        let mut properties: Vec<Property> = state.properties.values().cloned().collect();
        properties.sort_by_key(|p| p.id);
        let mut verifications = state.verifications.clone();
        verifications.sort_by_key(|v| v.id);
        (properties, verifications)
    }

    /// The next `expire_properties` call fails after applying its first
    /// update, the way a dropped connection mid-transaction would.
    pub fn fail_next_expiry(&self) {
        self.fail_next_expiry.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), ServiceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ServiceError::Store("connection refused".to_string()));
        }
        Ok(())
    }

    fn transition_error(
        state: &MemoryState,
        property_id: Uuid,
        action: VerificationAction,
    ) -> ServiceError {
        match state.properties.get(&property_id) {
            Some(p) => ServiceError::InvalidTransition {
                from: p.verification_status,
                action,
            },
            None => ServiceError::PropertyNotFound(property_id),
        }
    }
}

#[async_trait]
impl VerificationExt for InMemoryStore {
    async fn find_expired_verified(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state.select(|p| {
            p.verification_status == VerificationStatus::Verified
                && p.verification_expiry.map_or(false, |e| e < now)
        }))
    }

    async fn expire_properties(
        &self,
        property_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let mut working = state.clone();

        let mut expired = Vec::new();
        for id in property_ids {
            if let Some(p) = working.properties.get_mut(id) {
                let still_lapsed = p.verification_status == VerificationStatus::Verified
                    && p.verification_expiry.map_or(false, |e| e < now);
                if still_lapsed {
                    p.verification_status = VerificationStatus::Expired;
                    p.is_verified = false;
                    p.updated_at = now;
                    expired.push(*id);
                }
            }
        }

        if self.fail_next_expiry.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Store(
                "connection lost while deactivating verifications".to_string(),
            ));
        }

        for v in working.verifications.iter_mut() {
            if v.is_active && expired.contains(&v.property_id) {
                v.is_active = false;
            }
        }

        *state = working;
        Ok(expired)
    }

    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PropertyOwnerRow>, ServiceError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state.select(|p| {
            p.verification_status == VerificationStatus::Verified
                && p
                    .verification_expiry
                    .map_or(false, |e| e >= from && e <= to)
        }))
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, ServiceError> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().properties.get(&property_id).cloned())
    }

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<PropertyVerification>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .verifications
            .iter()
            .find(|v| v.id == verification_id)
            .cloned())
    }

    async fn verification_history(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<PropertyVerification>, ServiceError> {
        self.check_reads()?;
        let mut rows = self.verifications_for(property_id);
        // insertion order breaks ties between rows created in the same instant
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn pending_verifications(&self) -> Result<Vec<PropertyVerification>, ServiceError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        let mut rows: Vec<PropertyVerification> = state
            .verifications
            .iter()
            .filter(|v| v.status == RequestStatus::Pending && v.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.created_at);
        Ok(rows)
    }

    async fn mark_pending_payment(&self, property_id: Uuid) -> Result<Property, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let property = state
            .properties
            .get_mut(&property_id)
            .ok_or(ServiceError::PropertyNotFound(property_id))?;

        let next = property
            .verification_status
            .apply(VerificationAction::Request)?;
        property.verification_status = next;
        property.is_verified = next.is_verified();
        property.updated_at = Utc::now();
        Ok(property.clone())
    }

    async fn submit_for_review(
        &self,
        property_id: Uuid,
    ) -> Result<PropertyVerification, ServiceError> {
        let mut state = self.state.lock().unwrap();

        let next = match state.properties.get(&property_id) {
            Some(p) => p
                .verification_status
                .apply(VerificationAction::ConfirmPayment)?,
            None => {
                return Err(Self::transition_error(
                    &state,
                    property_id,
                    VerificationAction::ConfirmPayment,
                ))
            }
        };

        let now = Utc::now();
        if let Some(p) = state.properties.get_mut(&property_id) {
            p.verification_status = next;
            p.updated_at = now;
        }
        for v in state
            .verifications
            .iter_mut()
            .filter(|v| v.property_id == property_id)
        {
            v.is_active = false;
        }

        let verification = PropertyVerification {
            id: Uuid::new_v4(),
            property_id,
            status: RequestStatus::Pending,
            is_active: true,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
        };
        state.verifications.push(verification.clone());
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
        let mut state = self.state.lock().unwrap();
        let (index, next) = state.review_target(verification_id, VerificationAction::Approve)?;
        let property_id = state.verifications[index].property_id;

        for v in state
            .verifications
            .iter_mut()
            .filter(|v| v.property_id == property_id)
        {
            v.is_active = false;
        }
        let row = &mut state.verifications[index];
        row.status = RequestStatus::Approved;
        row.is_active = true;
        row.reviewed_by = Some(admin_id);
        row.review_notes = review_notes;
        row.reviewed_at = Some(reviewed_at);

        let property = state
            .properties
            .get_mut(&property_id)
            .ok_or(ServiceError::PropertyNotFound(property_id))?;
        property.verification_status = next;
        property.is_verified = next.is_verified();
        property.verification_expiry = Some(expires_at);
        property.updated_at = reviewed_at;
        Ok(property.clone())
    }

    async fn reject_verification(
        &self,
        verification_id: Uuid,
        admin_id: Uuid,
        review_notes: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Property, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let (index, next) = state.review_target(verification_id, VerificationAction::Reject)?;
        let property_id = state.verifications[index].property_id;

        let row = &mut state.verifications[index];
        row.status = RequestStatus::Rejected;
        row.is_active = false;
        row.reviewed_by = Some(admin_id);
        row.review_notes = review_notes;
        row.reviewed_at = Some(reviewed_at);

        let property = state
            .properties
            .get_mut(&property_id)
            .ok_or(ServiceError::PropertyNotFound(property_id))?;
        property.verification_status = next;
        property.is_verified = next.is_verified();
        property.updated_at = reviewed_at;
        Ok(property.clone())
    }
}
