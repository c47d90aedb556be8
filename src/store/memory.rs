use std::cmp::Reverse;
use std::collections::{BTreeMap, btree_map::Entry};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use super::{AttendanceStore, RecordFilter, StoreError};
use crate::model::{
    attendance::{AttendanceRecord, RecordView},
    department::Department,
    person::Person,
    role::Role,
};

/// Process-local store. The (person, day) map key is the uniqueness
/// constraint; inserts check and write under one write lock.
#[derive(Default)]
pub struct MemoryStore {
    persons: RwLock<BTreeMap<u64, Person>>,
    records: RwLock<BTreeMap<(u64, NaiveDate), AttendanceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(persons: impl IntoIterator<Item = Person>) -> Self {
        let store = Self::new();
        for person in persons {
            store.upsert_person(person);
        }
        store
    }

    pub fn upsert_person(&self, person: Person) {
        self.persons.write().insert(person.id, person);
    }

    pub fn remove_person(&self, person_id: u64) -> Option<Person> {
        self.persons.write().remove(&person_id)
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    fn matching(&self, filter: &RecordFilter) -> Vec<RecordView> {
        let persons = self.persons.read();
        let mut views: Vec<RecordView> = self
            .records
            .read()
            .values()
            .map(|record| {
                RecordView::new(record.clone(), persons.get(&record.person_id()).cloned())
            })
            .filter(|view| filter.matches(view))
            .collect();
        views.sort_by_key(|v| (Reverse(v.record.day()), v.record.person_id()));
        views
    }

    fn roster(&self, role: Role, department: Option<Department>) -> Vec<Person> {
        self.persons
            .read()
            .values()
            .filter(|p| p.role == role)
            .filter(|p| department.is_none_or(|d| p.department == d))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_record(
        &self,
        person_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.records.read().get(&(person_id, day)).cloned())
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<RecordView>, StoreError> {
        let views = self.matching(filter);
        Ok(match filter.page {
            Some(page) => views
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            None => views,
        })
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        Ok(self.matching(&filter.unpaged()).len() as u64)
    }

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        match self.records.write().entry((record.person_id(), record.day())) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn fill_check_in(&self, record: &AttendanceRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        match records.get_mut(&(record.person_id(), record.day())) {
            Some(stored) if !stored.is_checked_in() => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, record: &AttendanceRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        match records.get_mut(&(record.person_id(), record.day())) {
            Some(stored) if !stored.is_checked_out() => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_person(&self, person_id: u64) -> Result<Option<Person>, StoreError> {
        Ok(self.persons.read().get(&person_id).cloned())
    }

    async fn count_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<u64, StoreError> {
        Ok(self.roster(role, department).len() as u64)
    }

    async fn list_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<Vec<Person>, StoreError> {
        Ok(self.roster(role, department))
    }
}
