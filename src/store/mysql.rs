use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures_util::StreamExt;
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceStore, RecordFilter, StoreError};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, RecordView},
    department::Department,
    person::Person,
    role::Role,
};
use crate::utils::db_utils::{SqlValue, WhereClause, bind_query_as, bind_scalar};

const SELECT_VIEWS: &str = r#"
    SELECT
        a.person_id, a.day, a.check_in, a.check_out, a.status, a.notes,
        p.id AS joined_id, p.employee_code, p.name, p.email, p.role, p.department
    FROM attendance a
    LEFT JOIN persons p ON p.id = a.person_id
"#;

const COUNT_VIEWS: &str = r#"
    SELECT COUNT(*)
    FROM attendance a
    LEFT JOIN persons p ON p.id = a.person_id
"#;

#[derive(FromRow)]
struct AttendanceRow {
    person_id: u64,
    day: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    status: String,
    notes: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status)
            .map_err(|_| StoreError::Corrupt(format!("unknown status '{}'", row.status)))?;
        Ok(AttendanceRecord::restore(
            row.person_id,
            row.day,
            row.check_in,
            row.check_out,
            status,
            row.notes,
        )?)
    }
}

#[derive(FromRow)]
struct PersonRow {
    id: u64,
    employee_code: String,
    name: String,
    email: String,
    role: String,
    department: String,
}

impl TryFrom<PersonRow> for Person {
    type Error = StoreError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("unknown role '{}'", row.role)))?;
        let department = Department::from_str(&row.department)
            .map_err(|_| StoreError::Corrupt(format!("unknown department '{}'", row.department)))?;
        Ok(Person {
            id: row.id,
            employee_code: row.employee_code,
            name: row.name,
            email: row.email,
            role,
            department,
        })
    }
}

/// Attendance row with its LEFT JOINed person; person columns are NULL when
/// the person no longer exists.
#[derive(FromRow)]
struct ViewRow {
    #[sqlx(flatten)]
    record: AttendanceRow,
    joined_id: Option<u64>,
    employee_code: Option<String>,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    department: Option<String>,
}

impl TryFrom<ViewRow> for RecordView {
    type Error = StoreError;

    fn try_from(row: ViewRow) -> Result<Self, Self::Error> {
        let person = match (
            row.joined_id,
            row.employee_code,
            row.name,
            row.email,
            row.role,
            row.department,
        ) {
            (
                Some(id),
                Some(employee_code),
                Some(name),
                Some(email),
                Some(role),
                Some(department),
            ) => Some(Person::try_from(PersonRow {
                id,
                employee_code,
                name,
                email,
                role,
                department,
            })?),
            _ => None,
        };
        Ok(RecordView::new(AttendanceRecord::try_from(row.record)?, person))
    }
}

fn record_where(filter: &RecordFilter) -> WhereClause {
    let mut clause = WhereClause::default();

    if let Some(person_id) = filter.person_id {
        clause.and("a.person_id = ?", SqlValue::U64(person_id));
    }
    if let Some(code) = &filter.employee_code {
        clause.and("p.employee_code = ?", SqlValue::String(code.clone()));
    }
    if let Some(range) = filter.range {
        clause.and("a.day >= ?", SqlValue::Date(range.start));
        clause.and("a.day <= ?", SqlValue::Date(range.end));
    }
    if let Some(status) = filter.status {
        clause.and("a.status = ?", SqlValue::String(status.to_string()));
    }
    if let Some(department) = filter.department {
        clause.and("p.department = ?", SqlValue::String(department.to_string()));
    }
    if filter.checked_in_only {
        clause.and_raw("a.check_in IS NOT NULL");
    }

    clause
}

fn roster_where(role: Role, department: Option<Department>) -> WhereClause {
    let mut clause = WhereClause::default();
    clause.and("role = ?", SqlValue::String(role.to_string()));
    if let Some(department) = department {
        clause.and("department = ?", SqlValue::String(department.to_string()));
    }
    clause
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// MySQL-backed store. Expects the `persons` and `attendance` tables from
/// `schema.sql`, with a unique key on `attendance (person_id, day)`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Roster upsert keyed by person id.
    pub async fn upsert_person(&self, person: &Person) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO persons (id, employee_code, name, email, role, department)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                employee_code = VALUES(employee_code),
                name = VALUES(name),
                email = VALUES(email),
                role = VALUES(role),
                department = VALUES(department)
            "#,
        )
        .bind(person.id)
        .bind(&person.employee_code)
        .bind(&person.name)
        .bind(&person.email)
        .bind(person.role.to_string())
        .bind(person.department.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id = person.id, "Person upsert failed");
            StoreError::Database(e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_record(
        &self,
        person_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT person_id, day, check_in, check_out, status, notes
            FROM attendance
            WHERE person_id = ? AND day = ?
            "#,
        )
        .bind(person_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id, %day, "Failed to fetch attendance record");
            StoreError::Database(e)
        })?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<RecordView>, StoreError> {
        let clause = record_where(filter);
        let mut sql = format!(
            "{}{} ORDER BY a.day DESC, a.person_id ASC",
            SELECT_VIEWS, clause.sql
        );
        if filter.page.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = bind_query_as(sqlx::query_as::<_, ViewRow>(&sql), &clause.values);
        if let Some(page) = filter.page {
            query = query.bind(page.limit()).bind(page.offset());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance list");
            StoreError::Database(e)
        })?;

        rows.into_iter().map(RecordView::try_from).collect()
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let clause = record_where(filter);
        let sql = format!("{}{}", COUNT_VIEWS, clause.sql);

        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), &clause.values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to count attendance records");
                StoreError::Database(e)
            })?;

        Ok(total.max(0) as u64)
    }

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (person_id, day, check_in, check_out, status, total_hours, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.person_id())
        .bind(record.day())
        .bind(record.check_in())
        .bind(record.check_out())
        .bind(record.status().to_string())
        .bind(record.total_hours())
        .bind(record.notes())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // unique (person_id, day)
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    person_id = record.person_id(),
                    "Attendance insert failed"
                );
                Err(StoreError::Database(e))
            }
        }
    }

    async fn fill_check_in(&self, record: &AttendanceRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_in = ?, status = ?
            WHERE person_id = ?
            AND day = ?
            AND check_in IS NULL
            "#,
        )
        .bind(record.check_in())
        .bind(record.status().to_string())
        .bind(record.person_id())
        .bind(record.day())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id = record.person_id(), "Check-in update failed");
            StoreError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete(&self, record: &AttendanceRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, total_hours = ?
            WHERE person_id = ?
            AND day = ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(record.check_out())
        .bind(record.total_hours())
        .bind(record.person_id())
        .bind(record.day())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id = record.person_id(), "Check-out update failed");
            StoreError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_person(&self, person_id: u64) -> Result<Option<Person>, StoreError> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, employee_code, name, email, role, department
            FROM persons
            WHERE id = ?
            "#,
        )
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, person_id, "Failed to fetch person");
            StoreError::Database(e)
        })?;

        row.map(Person::try_from).transpose()
    }

    async fn count_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<u64, StoreError> {
        let clause = roster_where(role, department);
        let sql = format!("SELECT COUNT(*) FROM persons{}", clause.sql);

        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), &clause.values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %role, "Failed to count roster");
                StoreError::Database(e)
            })?;

        Ok(total.max(0) as u64)
    }

    async fn list_roster(
        &self,
        role: Role,
        department: Option<Department>,
    ) -> Result<Vec<Person>, StoreError> {
        let clause = roster_where(role, department);
        let sql = format!(
            "SELECT id, employee_code, name, email, role, department \
             FROM persons{} ORDER BY employee_code",
            clause.sql
        );

        let mut stream =
            bind_query_as(sqlx::query_as::<_, PersonRow>(&sql), &clause.values).fetch(&self.pool);

        let mut persons = Vec::new();
        while let Some(row) = stream.next().await {
            let row = row.map_err(|e| {
                tracing::error!(error = %e, %role, "Roster row fetch failed");
                StoreError::Database(e)
            })?;
            persons.push(Person::try_from(row)?);
        }

        Ok(persons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Page;
    use crate::utils::calendar::DateRange;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct ConstraintError(ErrorKind);

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint failed: {:?}", self.0)
        }
    }

    impl StdError for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint failed"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some("23000".into())
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn constraint_error(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError(kind)))
    }

    #[test]
    fn only_unique_violations_are_duplicates() {
        assert!(is_duplicate_key(&constraint_error(ErrorKind::UniqueViolation)));
        assert!(!is_duplicate_key(&constraint_error(ErrorKind::NotNullViolation)));
        assert!(!is_duplicate_key(&constraint_error(ErrorKind::ForeignKeyViolation)));
        assert!(!is_duplicate_key(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn record_where_pushes_every_filter_down() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let filter = RecordFilter::for_person(9)
            .in_range(DateRange::single(day))
            .status(AttendanceStatus::HalfDay)
            .department(Department::Hr)
            .employee_code("EMP005")
            .checked_in_only()
            .paged(Page::default());

        let clause = record_where(&filter);
        assert_eq!(
            clause.sql,
            " WHERE 1=1 AND a.person_id = ? AND p.employee_code = ? AND a.day >= ? AND a.day <= ? \
             AND a.status = ? AND p.department = ? AND a.check_in IS NOT NULL"
        );
        assert_eq!(
            clause.values,
            vec![
                SqlValue::U64(9),
                SqlValue::String("EMP005".into()),
                SqlValue::Date(day),
                SqlValue::Date(day),
                SqlValue::String("half-day".into()),
                SqlValue::String("HR".into()),
            ]
        );
    }

    #[test]
    fn roster_where_filters_role_and_department() {
        let clause = roster_where(Role::Employee, Some(Department::Sales));
        assert_eq!(clause.sql, " WHERE 1=1 AND role = ? AND department = ?");
        assert_eq!(
            clause.values,
            vec![
                SqlValue::String("employee".into()),
                SqlValue::String("Sales".into())
            ]
        );
    }

    #[test]
    fn view_row_without_person_maps_to_none() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let row = ViewRow {
            record: AttendanceRow {
                person_id: 3,
                day,
                check_in: day.and_hms_opt(9, 0, 0),
                check_out: None,
                status: "present".into(),
                notes: String::new(),
            },
            joined_id: None,
            employee_code: None,
            name: None,
            email: None,
            role: None,
            department: None,
        };
        let view = RecordView::try_from(row).unwrap();
        assert!(view.person.is_none());
        assert_eq!(view.record.person_id(), 3);
    }

    #[test]
    fn corrupt_rows_are_rejected() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let row = AttendanceRow {
            person_id: 3,
            day,
            check_in: None,
            check_out: day.and_hms_opt(17, 0, 0),
            status: "present".into(),
            notes: String::new(),
        };
        assert!(matches!(
            AttendanceRecord::try_from(row),
            Err(StoreError::Corrupt(_))
        ));

        let row = PersonRow {
            id: 1,
            employee_code: "EMP001".into(),
            name: "Alice Johnson".into(),
            email: "alice@company.com".into(),
            role: "employee".into(),
            department: "Legal".into(),
        };
        assert!(matches!(Person::try_from(row), Err(StoreError::Corrupt(_))));
    }
}
