//! Aggregations over already materialised records.
//!
//! Every function here works on the slice it is given; selecting and paging
//! that slice is the store's job (see [`RecordFilter`](crate::store::RecordFilter)).
//! Empty input always yields zero counts.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::hours::round_hours;
use crate::error::AttendanceError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, RecordView},
    department::Department,
    person::Person,
};
use crate::utils::calendar::{DateRange, is_weekend, month_days, trailing_days, weekday_label};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub half_day: u32,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub total_people: u32,
    pub total_present: u32,
    pub total_absent: u32,
    pub total_late: u32,
    pub total_half_day: u32,
    pub average_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepartmentCounts {
    pub department: Department,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepartmentPresence {
    pub department: Department,
    pub total: u32,
    pub present: u32,
    pub absent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPresence {
    pub day: NaiveDate,
    pub weekday_label: &'static str,
    pub present_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub day: NaiveDate,
    pub is_weekend: bool,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

#[derive(Default)]
struct StatusTally {
    records: u32,
    present: u32,
    absent: u32,
    late: u32,
    half_day: u32,
    hours: f64,
}

impl StatusTally {
    fn add(&mut self, record: &AttendanceRecord) {
        self.records += 1;
        self.hours += record.total_hours();
        match record.status() {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::HalfDay => self.half_day += 1,
        }
    }

    fn of<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.add(record);
        }
        tally
    }
}

/// Status counts and hours for the records whose day falls in `range`.
pub fn person_summary(records: &[AttendanceRecord], range: DateRange) -> PersonSummary {
    let tally = StatusTally::of(records.iter().filter(|r| range.contains(r.day())));
    PersonSummary {
        total_days: tally.records,
        present: tally.present,
        absent: tally.absent,
        late: tally.late,
        half_day: tally.half_day,
        total_hours: round_hours(tally.hours),
    }
}

/// Summary for a group of people. `roster` only sizes the group; every
/// record in `range` is counted, whoever it belongs to. `average_hours`
/// divides by at least one record.
pub fn group_summary(
    records: &[AttendanceRecord],
    roster: &[Person],
    range: DateRange,
) -> GroupSummary {
    let tally = StatusTally::of(records.iter().filter(|r| range.contains(r.day())));
    GroupSummary {
        total_people: roster.len() as u32,
        total_present: tally.present,
        total_absent: tally.absent,
        total_late: tally.late,
        total_half_day: tally.half_day,
        average_hours: round_hours(tally.hours / f64::from(tally.records.max(1))),
    }
}

/// Per-department status counts in the order of `departments`, zero rows
/// included. Records whose person could not be joined are not attributed.
pub fn department_breakdown(
    views: &[RecordView],
    departments: &[Department],
) -> Vec<DepartmentCounts> {
    departments
        .iter()
        .map(|&department| {
            let tally = StatusTally::of(
                views
                    .iter()
                    .filter(|v| v.person.as_ref().is_some_and(|p| p.department == department))
                    .map(|v| &v.record),
            );
            DepartmentCounts {
                department,
                present: tally.present,
                absent: tally.absent,
                late: tally.late,
            }
        })
        .collect()
}

/// Checked-in head count for each of the `num_days` days ending at
/// `end_day`, oldest first. Status is not consulted.
pub fn daily_trend(
    records: &[AttendanceRecord],
    num_days: u32,
    end_day: NaiveDate,
) -> Vec<DailyPresence> {
    trailing_days(end_day, num_days)
        .into_iter()
        .map(|day| DailyPresence {
            day,
            weekday_label: weekday_label(day),
            present_count: records
                .iter()
                .filter(|r| r.day() == day && r.is_checked_in())
                .count() as u32,
        })
        .collect()
}

/// Roster members without a checked-in record in `records_for_day`, in roster
/// order. This is the authoritative absence computation; it ignores status.
pub fn roster_gap_absentees(
    roster: &[Person],
    records_for_day: &[AttendanceRecord],
) -> Vec<Person> {
    let checked_in: HashSet<u64> = records_for_day
        .iter()
        .filter(|r| r.is_checked_in())
        .map(|r| r.person_id())
        .collect();

    roster
        .iter()
        .filter(|p| !checked_in.contains(&p.id))
        .cloned()
        .collect()
}

/// Head count against check-ins per department for a single day. Only
/// roster members count as present, so `absent` never goes below zero.
pub fn department_presence(
    roster: &[Person],
    views_for_day: &[RecordView],
    departments: &[Department],
) -> Vec<DepartmentPresence> {
    let checked_in: HashSet<u64> = views_for_day
        .iter()
        .filter(|v| v.record.is_checked_in())
        .map(|v| v.record.person_id())
        .collect();

    departments
        .iter()
        .map(|&department| {
            let members = roster.iter().filter(|p| p.department == department);
            let (total, present) = members.fold((0u32, 0u32), |(total, present), p| {
                (total + 1, present + u32::from(checked_in.contains(&p.id)))
            });
            DepartmentPresence {
                department,
                total,
                present,
                absent: total - present,
            }
        })
        .collect()
}

/// Status counts for each day of a month, for the team calendar.
pub fn calendar_month(
    records: &[AttendanceRecord],
    year: i32,
    month: u32,
) -> Result<Vec<CalendarDay>, AttendanceError> {
    Ok(month_days(year, month)?
        .into_iter()
        .map(|day| {
            let tally = StatusTally::of(records.iter().filter(|r| r.day() == day));
            CalendarDay {
                day,
                is_weekend: is_weekend(day),
                present: tally.present,
                absent: tally.absent,
                late: tally.late,
            }
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::attendance::status::AttendancePolicy;
    use crate::model::{
        attendance::AttendanceRecord, department::Department, person::Person, role::Role,
    };

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        day.and_hms_opt(h, m, 0).unwrap()
    }

    pub fn person(id: u64, department: Department) -> Person {
        Person {
            id,
            employee_code: format!("EMP{id:03}"),
            name: format!("Employee {id}"),
            email: format!("emp{id}@company.com"),
            role: Role::Employee,
            department,
        }
    }

    pub fn checked_in(person_id: u64, day: NaiveDate, h: u32, m: u32) -> AttendanceRecord {
        AttendanceRecord::checked_in(person_id, day, at(day, h, m), &AttendancePolicy::default())
    }

    pub fn worked(
        person_id: u64,
        day: NaiveDate,
        from: (u32, u32),
        to: (u32, u32),
    ) -> AttendanceRecord {
        checked_in(person_id, day, from.0, from.1)
            .checked_out(at(day, to.0, to.1))
            .unwrap()
    }
}
