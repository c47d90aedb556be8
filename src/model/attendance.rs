use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::attendance::{hours::compute_hours, status::AttendancePolicy};
use crate::error::AttendanceError;

use super::person::Person;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
}

/// One person's attendance for one calendar day.
///
/// Times are local wall-clock instants. Fields are only reachable through
/// accessors so `status` and `total_hours` always match the timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    person_id: u64,
    day: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    status: AttendanceStatus,
    total_hours: f64,
    notes: String,
}

impl AttendanceRecord {
    /// A fresh record in the checked-in state, classified under `policy`.
    pub(crate) fn checked_in(
        person_id: u64,
        day: NaiveDate,
        at: NaiveDateTime,
        policy: &AttendancePolicy,
    ) -> Self {
        Self {
            person_id,
            day,
            check_in: Some(at),
            check_out: None,
            status: policy.classify(Some(at)),
            total_hours: 0.0,
            notes: String::new(),
        }
    }

    /// Copy of a record that exists without a check-in (e.g. a restored
    /// absence), checked in at `at` and reclassified. Notes are kept.
    pub(crate) fn with_check_in(
        &self,
        at: NaiveDateTime,
        policy: &AttendancePolicy,
    ) -> Result<Self, AttendanceError> {
        if self.check_in.is_some() {
            return Err(AttendanceError::AlreadyCheckedIn);
        }
        Ok(Self {
            check_in: Some(at),
            status: policy.classify(Some(at)),
            ..self.clone()
        })
    }

    /// Copy of this record checked out at `at`. Status is left untouched.
    pub(crate) fn checked_out(&self, at: NaiveDateTime) -> Result<Self, AttendanceError> {
        if self.check_in.is_none() {
            return Err(AttendanceError::NotCheckedIn);
        }
        if self.check_out.is_some() {
            return Err(AttendanceError::AlreadyCheckedOut);
        }
        let total_hours = compute_hours(self.check_in, Some(at))?;
        Ok(Self {
            check_out: Some(at),
            total_hours,
            ..self.clone()
        })
    }

    /// Rebuilds a record read back from storage.
    ///
    /// `total_hours` is recomputed from the timestamps; a check-out without a
    /// check-in is rejected.
    pub fn restore(
        person_id: u64,
        day: NaiveDate,
        check_in: Option<NaiveDateTime>,
        check_out: Option<NaiveDateTime>,
        status: AttendanceStatus,
        notes: String,
    ) -> Result<Self, AttendanceError> {
        if check_in.is_none() && check_out.is_some() {
            return Err(AttendanceError::invalid_argument(format!(
                "record for person {person_id} on {day} has a check-out without a check-in"
            )));
        }
        let total_hours = compute_hours(check_in, check_out)?;
        Ok(Self {
            person_id,
            day,
            check_in,
            check_out,
            status,
            total_hours,
            notes,
        })
    }

    pub fn person_id(&self) -> u64 {
        self.person_id
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn check_in(&self) -> Option<NaiveDateTime> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDateTime> {
        self.check_out
    }

    pub fn status(&self) -> AttendanceStatus {
        self.status
    }

    pub fn total_hours(&self) -> f64 {
        self.total_hours
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in.is_some()
    }

    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }
}

/// A record joined with its person. The join may come back empty, e.g. when
/// the person was removed from the roster after the record was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub record: AttendanceRecord,
    pub person: Option<Person>,
}

impl RecordView {
    pub fn new(record: AttendanceRecord, person: Option<Person>) -> Self {
        Self { record, person }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn status_uses_hyphenated_names() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half-day");
        assert_eq!(
            AttendanceStatus::from_str("half-day").unwrap(),
            AttendanceStatus::HalfDay
        );
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfDay).unwrap(),
            "\"half-day\""
        );
    }

    #[test]
    fn check_out_keeps_status_and_computes_hours() {
        let policy = AttendancePolicy::default();
        let record = AttendanceRecord::checked_in(1, at(0, 0).date(), at(9, 30), &policy);
        assert_eq!(record.status(), AttendanceStatus::Late);
        assert_eq!(record.total_hours(), 0.0);

        let done = record.checked_out(at(17, 45)).unwrap();
        assert_eq!(done.status(), AttendanceStatus::Late);
        assert_eq!(done.total_hours(), 8.25);
        assert!(matches!(
            done.checked_out(at(18, 0)),
            Err(AttendanceError::AlreadyCheckedOut)
        ));
    }

    #[test]
    fn absent_record_can_take_a_check_in() {
        let absent = AttendanceRecord::restore(
            1,
            at(0, 0).date(),
            None,
            None,
            AttendanceStatus::Absent,
            "called in sick".to_string(),
        )
        .unwrap();

        let record = absent.with_check_in(at(9, 40), &AttendancePolicy::default()).unwrap();
        assert_eq!(record.status(), AttendanceStatus::Late);
        assert_eq!(record.check_in(), Some(at(9, 40)));
        assert_eq!(record.notes(), "called in sick");
        assert!(matches!(
            record.with_check_in(at(10, 0), &AttendancePolicy::default()),
            Err(AttendanceError::AlreadyCheckedIn)
        ));
    }

    #[test]
    fn restore_rejects_check_out_without_check_in() {
        let result = AttendanceRecord::restore(
            1,
            at(0, 0).date(),
            None,
            Some(at(17, 0)),
            AttendanceStatus::Present,
            String::new(),
        );
        assert!(matches!(result, Err(AttendanceError::InvalidArgument(_))));
    }

    #[test]
    fn restore_recomputes_hours() {
        let record = AttendanceRecord::restore(
            1,
            at(0, 0).date(),
            Some(at(9, 0)),
            Some(at(17, 30)),
            AttendanceStatus::Present,
            "client visit".to_string(),
        )
        .unwrap();
        assert_eq!(record.total_hours(), 8.5);
        assert_eq!(record.notes(), "client visit");
    }
}
