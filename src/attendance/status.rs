use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::AttendanceError;
use crate::model::attendance::AttendanceStatus;

pub const DEFAULT_GRACE_MINUTES: i64 = 15;
pub const DEFAULT_LATE_THRESHOLD_MINUTES: i64 = 120;

/// Organisational check-in policy used to classify arrivals. Only built
/// through [`AttendancePolicy::new`] or `Default`, so the thresholds are
/// always ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttendancePolicy {
    standard_start: NaiveTime,
    grace_minutes: i64,
    late_threshold_minutes: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            standard_start: NaiveTime::MIN + Duration::hours(9),
            grace_minutes: DEFAULT_GRACE_MINUTES,
            late_threshold_minutes: DEFAULT_LATE_THRESHOLD_MINUTES,
        }
    }
}

impl AttendancePolicy {
    pub fn new(
        standard_start: NaiveTime,
        grace_minutes: i64,
        late_threshold_minutes: i64,
    ) -> Result<Self, AttendanceError> {
        if grace_minutes < 0 {
            return Err(AttendanceError::invalid_argument(
                "grace minutes must not be negative",
            ));
        }
        if late_threshold_minutes < grace_minutes {
            return Err(AttendanceError::invalid_argument(format!(
                "late threshold ({late_threshold_minutes} min) must not be shorter than the grace period ({grace_minutes} min)"
            )));
        }
        Ok(Self {
            standard_start,
            grace_minutes,
            late_threshold_minutes,
        })
    }

    pub fn standard_start(&self) -> NaiveTime {
        self.standard_start
    }

    pub fn grace_minutes(&self) -> i64 {
        self.grace_minutes
    }

    pub fn late_threshold_minutes(&self) -> i64 {
        self.late_threshold_minutes
    }

    pub fn classify(&self, check_in: Option<NaiveDateTime>) -> AttendanceStatus {
        classify(check_in, self)
    }
}

fn minutes_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Derives a status from the check-in time. Both thresholds are inclusive.
///
/// Only a missing check-in yields `Absent`; since records are created by a
/// check-in, stored records never carry it. Absence for a population comes
/// from [`roster_gap_absentees`](crate::attendance::summary::roster_gap_absentees).
pub fn classify(check_in: Option<NaiveDateTime>, policy: &AttendancePolicy) -> AttendanceStatus {
    let Some(check_in) = check_in else {
        return AttendanceStatus::Absent;
    };

    let delta =
        minutes_since_midnight(check_in.time()) - minutes_since_midnight(policy.standard_start);

    if delta <= policy.grace_minutes {
        AttendanceStatus::Present
    } else if delta <= policy.late_threshold_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::HalfDay
    }
}
