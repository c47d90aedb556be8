use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::status::AttendancePolicy;
use crate::error::AttendanceError;
use crate::model::attendance::AttendanceRecord;
use crate::store::{AttendanceStore, StoreError};

/// Where a person's record for a day stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "record", rename_all = "kebab-case")]
pub enum RecordState {
    NotStarted,
    CheckedIn(AttendanceRecord),
    Completed(AttendanceRecord),
}

impl RecordState {
    pub fn of(record: Option<AttendanceRecord>) -> Self {
        match record {
            Some(r) if r.is_checked_out() => RecordState::Completed(r),
            Some(r) if r.is_checked_in() => RecordState::CheckedIn(r),
            _ => RecordState::NotStarted,
        }
    }
}

/// Check-in/check-out transitions: `NotStarted -> CheckedIn -> Completed`.
/// Records are never removed or reopened.
pub struct AttendanceService<S> {
    store: S,
    policy: AttendancePolicy,
}

impl<S: AttendanceStore> AttendanceService<S> {
    pub fn new(store: S, policy: AttendancePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(name = "attendance_check_in", skip(self))]
    pub async fn check_in(
        &self,
        person_id: u64,
        day: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if let Some(existing) = self.store.find_record(person_id, day).await? {
            if existing.is_checked_in() {
                info!("Rejected: already checked in");
                return Err(AttendanceError::AlreadyCheckedIn);
            }

            let record = existing.with_check_in(now, &self.policy)?;
            if !self.store.fill_check_in(&record).await? {
                warn!("Rejected: concurrent check-in won");
                return Err(AttendanceError::AlreadyCheckedIn);
            }
            debug!(status = %record.status(), "Checked in on existing record");
            return Ok(record);
        }

        let record = AttendanceRecord::checked_in(person_id, day, now, &self.policy);

        match self.store.insert(&record).await {
            Ok(()) => {
                debug!(status = %record.status(), "Checked in");
                Ok(record)
            }
            // lost a race against a concurrent check-in for the same day
            Err(StoreError::Duplicate) => {
                warn!("Rejected: concurrent check-in won");
                Err(AttendanceError::AlreadyCheckedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(name = "attendance_check_out", skip(self))]
    pub async fn check_out(
        &self,
        person_id: u64,
        day: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let existing = match self.store.find_record(person_id, day).await? {
            Some(r) if r.is_checked_in() => r,
            _ => {
                info!("Rejected: no check-in for the day");
                return Err(AttendanceError::NotCheckedIn);
            }
        };

        let record = existing.checked_out(now)?;

        if !self.store.complete(&record).await? {
            warn!("Rejected: concurrent check-out won");
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        debug!(total_hours = record.total_hours(), "Checked out");
        Ok(record)
    }

    pub async fn today(
        &self,
        person_id: u64,
        day: NaiveDate,
    ) -> Result<RecordState, AttendanceError> {
        Ok(RecordState::of(self.store.find_record(person_id, day).await?))
    }
}
