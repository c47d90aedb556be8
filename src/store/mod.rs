//! Persistence boundary for attendance records and the roster.
//!
//! Filtering and pagination happen inside the store; the aggregation code
//! only ever sees the slice a [`RecordFilter`] selected.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AttendanceError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, RecordView},
    department::Department,
    person::Person,
    role::Role,
};
use crate::utils::calendar::DateRange;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Attendance record already exists for this person and day")]
    Duplicate,
    #[error("Corrupt attendance row: {0}")]
    Corrupt(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AttendanceError> for StoreError {
    fn from(err: AttendanceError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page))
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub pages: u64,
    pub total: u64,
}

/// Selection criteria pushed down to the store. Results come back newest day
/// first, then by person id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub person_id: Option<u64>,
    pub employee_code: Option<String>,
    pub range: Option<DateRange>,
    pub status: Option<AttendanceStatus>,
    pub department: Option<Department>,
    pub checked_in_only: bool,
    pub page: Option<Page>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_person(person_id: u64) -> Self {
        Self {
            person_id: Some(person_id),
            ..Self::default()
        }
    }

    pub fn for_day(day: NaiveDate) -> Self {
        Self::default().in_range(DateRange::single(day))
    }

    /// Records of one month; month is 1-indexed.
    pub fn for_month(year: i32, month: u32) -> Result<Self, AttendanceError> {
        Ok(Self::default().in_range(DateRange::month(year, month)?))
    }

    pub fn in_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn person(mut self, person_id: u64) -> Self {
        self.person_id = Some(person_id);
        self
    }

    pub fn employee_code(mut self, code: impl Into<String>) -> Self {
        self.employee_code = Some(code.into());
        self
    }

    pub fn status(mut self, status: AttendanceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn department(mut self, department: Department) -> Self {
        self.department = Some(department);
        self
    }

    pub fn checked_in_only(mut self) -> Self {
        self.checked_in_only = true;
        self
    }

    pub fn paged(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Same criteria without pagination, for counting totals.
    pub fn unpaged(&self) -> Self {
        Self {
            page: None,
            ..self.clone()
        }
    }

    pub fn matches(&self, view: &RecordView) -> bool {
        let record = &view.record;
        if self.person_id.is_some_and(|id| id != record.person_id()) {
            return false;
        }
        if self.range.is_some_and(|range| !range.contains(record.day())) {
            return false;
        }
        if self.status.is_some_and(|status| status != record.status()) {
            return false;
        }
        if self.checked_in_only && !record.is_checked_in() {
            return false;
        }
        if let Some(code) = &self.employee_code {
            if view.person.as_ref().map(|p| &p.employee_code) != Some(code) {
                return false;
            }
        }
        if let Some(department) = self.department {
            if view.person.as_ref().map(|p| p.department) != Some(department) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_record(
        &self,
        person_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<RecordView>, StoreError>;

    /// Number of records matching `filter`, ignoring its page.
    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError>;

    /// Inserts a new record. Fails with [`StoreError::Duplicate`] when the
    /// (person, day) pair is already taken.
    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Writes check-in and status only if the stored record has no check-in
    /// yet. Returns whether a row was updated.
    async fn fill_check_in(&self, record: &AttendanceRecord) -> Result<bool, StoreError>;

    /// Writes check-out and hours only if the stored record has no check-out
    /// yet. Returns whether a row was updated.
    async fn complete(&self, record: &AttendanceRecord) -> Result<bool, StoreError>;

    async fn find_person(&self, person_id: u64) -> Result<Option<Person>, StoreError>;

    async fn count_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<u64, StoreError>;

    async fn list_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<Vec<Person>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped() {
        let page = Page::new(Some(0), Some(500));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);
        assert_eq!(page.offset(), 0);

        let page = Page::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.pages(21), 3);
        assert_eq!(page.pages(0), 0);
    }

    #[test]
    fn month_filter_rejects_bad_month() {
        assert!(RecordFilter::for_month(2024, 13).is_err());
        let filter = RecordFilter::for_month(2024, 2).unwrap().person(7).paged(Page::default());
        assert_eq!(filter.person_id, Some(7));
        assert_eq!(filter.unpaged().page, None);
    }
}
