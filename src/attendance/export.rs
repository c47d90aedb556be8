use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::AttendanceError;
use crate::model::{
    attendance::{AttendanceStatus, RecordView},
    department::Department,
};
use crate::store::{AttendanceStore, RecordFilter};

/// Flat row handed to whatever renders the export. Values stay raw; a
/// missing person yields `None` for the person columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Employee ID")]
    pub employee_id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Department")]
    pub department: Option<Department>,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Check In")]
    pub check_in: Option<NaiveDateTime>,
    #[serde(rename = "Check Out")]
    pub check_out: Option<NaiveDateTime>,
    #[serde(rename = "Status")]
    pub status: AttendanceStatus,
    #[serde(rename = "Total Hours")]
    pub total_hours: f64,
}

impl From<&RecordView> for ExportRow {
    fn from(view: &RecordView) -> Self {
        let person = view.person.as_ref();
        let record = &view.record;
        Self {
            employee_id: person.map(|p| p.employee_code.clone()),
            name: person.map(|p| p.name.clone()),
            department: person.map(|p| p.department),
            date: record.day(),
            check_in: record.check_in(),
            check_out: record.check_out(),
            status: record.status(),
            total_hours: record.total_hours(),
        }
    }
}

pub fn export_rows(views: &[RecordView]) -> Vec<ExportRow> {
    views.iter().map(ExportRow::from).collect()
}

/// Every record matching `filter`, page ignored, newest first.
pub async fn export<S: AttendanceStore>(
    store: &S,
    filter: &RecordFilter,
) -> Result<Vec<ExportRow>, AttendanceError> {
    let views = store.find_records(&filter.unpaged()).await?;
    tracing::info!(rows = views.len(), "Attendance export prepared");
    Ok(export_rows(&views))
}
