//! Store-backed views for dashboards and manager reports.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::summary::{
    DailyPresence, DepartmentCounts, DepartmentPresence, GroupSummary, PersonSummary,
    daily_trend, department_breakdown, department_presence, group_summary, person_summary,
    roster_gap_absentees,
};
use crate::error::AttendanceError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, RecordView},
    department::Department,
    person::Person,
    role::Role,
};
use crate::store::{AttendanceStore, Page, Paginated, RecordFilter};
use crate::utils::calendar::DateRange;

const RECENT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub checked_in: bool,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDashboard {
    pub today: TodayView,
    pub this_month: PersonSummary,
    /// Newest first.
    pub recent: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub summary: PersonSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub department_summary: Vec<DepartmentCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatusAll {
    pub total_employees: u32,
    pub present_count: u32,
    pub absent_count: u32,
    pub late_count: u32,
    pub present: Vec<RecordView>,
    pub absent: Vec<Person>,
    pub late: Vec<RecordView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerOverview {
    pub total_employees: u32,
    pub present_today: u32,
    pub absent_today: u32,
    pub late_today: u32,
    pub absent_employees: Vec<Person>,
    pub late_arrivals: Vec<RecordView>,
    pub weekly_trend: Vec<DailyPresence>,
    pub department_stats: Vec<DepartmentPresence>,
}

fn records_of(views: Vec<RecordView>) -> Vec<AttendanceRecord> {
    views.into_iter().map(|v| v.record).collect()
}

/// Month summary for one person; month is 1-indexed.
pub async fn monthly_summary<S: AttendanceStore>(
    store: &S,
    person_id: u64,
    year: i32,
    month: u32,
) -> Result<MonthlySummary, AttendanceError> {
    let range = DateRange::month(year, month)?;
    let filter = RecordFilter::for_person(person_id).in_range(range);
    let records = records_of(store.find_records(&filter).await?);

    Ok(MonthlySummary {
        year,
        month,
        summary: person_summary(&records, range),
    })
}

pub async fn employee_dashboard<S: AttendanceStore>(
    store: &S,
    person_id: u64,
    today: NaiveDate,
) -> Result<EmployeeDashboard, AttendanceError> {
    let today_record = store.find_record(person_id, today).await?;
    let this_month = monthly_summary(store, person_id, today.year(), today.month()).await?;

    let recent_filter =
        RecordFilter::for_person(person_id).in_range(DateRange::trailing(today, RECENT_DAYS));
    let recent = records_of(store.find_records(&recent_filter).await?);

    let today = match today_record {
        Some(r) => TodayView {
            checked_in: r.is_checked_in(),
            check_in: r.check_in(),
            check_out: r.check_out(),
            total_hours: r.total_hours(),
        },
        None => TodayView {
            checked_in: false,
            check_in: None,
            check_out: None,
            total_hours: 0.0,
        },
    };

    Ok(EmployeeDashboard {
        today,
        this_month: this_month.summary,
        recent,
    })
}

/// Paginated attendance listing, newest day first.
pub async fn list_attendance<S: AttendanceStore>(
    store: &S,
    filter: RecordFilter,
    page: Page,
) -> Result<Paginated<RecordView>, AttendanceError> {
    let filter = filter.paged(page);
    let total = store.count_records(&filter).await?;
    let data = store.find_records(&filter).await?;

    Ok(Paginated {
        data,
        page: page.page,
        per_page: page.per_page,
        pages: page.pages(total),
        total,
    })
}

/// Month-level summary with a breakdown over `departments`. `department`
/// narrows the employee head count only; status counts and the breakdown
/// cover every record of the month.
pub async fn team_summary<S: AttendanceStore>(
    store: &S,
    year: i32,
    month: u32,
    department: Option<Department>,
    departments: &[Department],
) -> Result<TeamSummary, AttendanceError> {
    let range = DateRange::month(year, month)?;

    let roster = store.list_roster(Role::Employee, department).await?;
    let views = store.find_records(&RecordFilter::all().in_range(range)).await?;
    let department_summary = department_breakdown(&views, departments);
    let records = records_of(views);

    Ok(TeamSummary {
        year,
        month,
        summary: group_summary(&records, &roster, range),
        department_summary,
    })
}

/// Who is in, who is out and who was late on `day`.
pub async fn today_status_all<S: AttendanceStore>(
    store: &S,
    day: NaiveDate,
) -> Result<TodayStatusAll, AttendanceError> {
    let roster = store.list_roster(Role::Employee, None).await?;
    let views = store.find_records(&RecordFilter::for_day(day)).await?;
    Ok(today_status_from(&roster, views))
}

fn today_status_from(roster: &[Person], views: Vec<RecordView>) -> TodayStatusAll {
    let records: Vec<AttendanceRecord> = views.iter().map(|v| v.record.clone()).collect();
    let absent = roster_gap_absentees(roster, &records);

    let present: Vec<RecordView> = views
        .into_iter()
        .filter(|v| v.record.is_checked_in())
        .collect();
    let late: Vec<RecordView> = present
        .iter()
        .filter(|v| v.record.status() == AttendanceStatus::Late)
        .cloned()
        .collect();

    TodayStatusAll {
        total_employees: roster.len() as u32,
        present_count: present.len() as u32,
        absent_count: absent.len() as u32,
        late_count: late.len() as u32,
        present,
        absent,
        late,
    }
}

pub async fn manager_overview<S: AttendanceStore>(
    store: &S,
    today: NaiveDate,
    departments: &[Department],
) -> Result<ManagerOverview, AttendanceError> {
    let roster = store.list_roster(Role::Employee, None).await?;
    let today_views = store.find_records(&RecordFilter::for_day(today)).await?;
    let week = store
        .find_records(
            &RecordFilter::all()
                .in_range(DateRange::trailing(today, RECENT_DAYS))
                .checked_in_only(),
        )
        .await?;

    let department_stats = department_presence(&roster, &today_views, departments);
    let status = today_status_from(&roster, today_views);

    tracing::debug!(
        total = status.total_employees,
        present = status.present_count,
        absent = status.absent_count,
        "Manager overview computed"
    );

    Ok(ManagerOverview {
        total_employees: status.total_employees,
        present_today: status.total_employees - status.absent_count,
        absent_today: status.absent_count,
        late_today: status.late_count,
        absent_employees: status.absent,
        late_arrivals: status.late,
        weekly_trend: daily_trend(&records_of(week), RECENT_DAYS, today),
        department_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::lifecycle::AttendanceService;
    use crate::attendance::status::AttendancePolicy;
    use crate::attendance::summary::fixtures::*;
    use crate::store::MemoryStore;

    fn roster() -> Vec<Person> {
        vec![
            person(1, Department::Engineering),
            person(2, Department::Engineering),
            person(3, Department::Marketing),
        ]
    }

    fn service() -> AttendanceService<MemoryStore> {
        AttendanceService::new(MemoryStore::with_roster(roster()), AttendancePolicy::default())
    }

    #[tokio::test]
    async fn one_check_in_leaves_two_absentees() {
        let service = service();
        let day = date(2024, 6, 3);
        service.check_in(2, day, at(day, 9, 5)).await.unwrap();

        let status = today_status_all(service.store(), day).await.unwrap();
        assert_eq!(status.total_employees, 3);
        assert_eq!(status.present_count, 1);
        assert_eq!(status.absent_count, 2);
        let absent: Vec<u64> = status.absent.iter().map(|p| p.id).collect();
        assert_eq!(absent, vec![1, 3]);
    }

    #[tokio::test]
    async fn manager_overview_combines_today_and_week() {
        let service = service();
        let today = date(2024, 6, 5);
        let yesterday = date(2024, 6, 4);

        service.check_in(1, yesterday, at(yesterday, 9, 0)).await.unwrap();
        service.check_in(2, yesterday, at(yesterday, 9, 0)).await.unwrap();
        service.check_in(1, today, at(today, 9, 45)).await.unwrap();

        let overview = manager_overview(service.store(), today, &Department::all())
            .await
            .unwrap();

        assert_eq!(overview.total_employees, 3);
        assert_eq!(overview.present_today, 1);
        assert_eq!(overview.absent_today, 2);
        assert_eq!(overview.late_today, 1);
        assert_eq!(overview.late_arrivals.len(), 1);
        assert_eq!(
            overview.late_arrivals[0].person.as_ref().map(|p| p.employee_code.as_str()),
            Some("EMP001")
        );

        assert_eq!(overview.weekly_trend.len(), 7);
        let counts: Vec<u32> = overview.weekly_trend.iter().map(|d| d.present_count).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 0, 2, 1]);

        let engineering = overview.department_stats[0];
        assert_eq!(engineering.department, Department::Engineering);
        assert_eq!((engineering.total, engineering.present, engineering.absent), (2, 1, 1));
    }

    #[tokio::test]
    async fn employee_dashboard_reports_today_and_month() {
        let service = service();
        let today = date(2024, 6, 5);
        for d in [3, 4] {
            let day = date(2024, 6, d);
            service.check_in(1, day, at(day, 9, 0)).await.unwrap();
            service.check_out(1, day, at(day, 17, 0)).await.unwrap();
        }
        service.check_in(1, today, at(today, 10, 0)).await.unwrap();

        let dashboard = employee_dashboard(service.store(), 1, today).await.unwrap();
        assert!(dashboard.today.checked_in);
        assert_eq!(dashboard.today.check_out, None);
        assert_eq!(dashboard.this_month.total_days, 3);
        assert_eq!(dashboard.this_month.present, 2);
        assert_eq!(dashboard.this_month.late, 1);
        assert_eq!(dashboard.this_month.total_hours, 16.0);
        let days: Vec<NaiveDate> = dashboard.recent.iter().map(|r| r.day()).collect();
        assert_eq!(days, vec![today, date(2024, 6, 4), date(2024, 6, 3)]);

        let other = employee_dashboard(service.store(), 3, today).await.unwrap();
        assert!(!other.today.checked_in);
        assert_eq!(other.this_month, PersonSummary::default());
    }

    #[tokio::test]
    async fn team_summary_narrows_head_count_to_department() {
        let mut manager = person(9, Department::Sales);
        manager.role = Role::Manager;
        let mut everyone = roster();
        everyone.push(manager);
        let service =
            AttendanceService::new(MemoryStore::with_roster(everyone), AttendancePolicy::default());

        let day = date(2024, 6, 3);
        service.check_in(1, day, at(day, 9, 0)).await.unwrap();
        service.check_out(1, day, at(day, 17, 0)).await.unwrap();
        service.check_in(3, day, at(day, 9, 30)).await.unwrap();
        service.check_in(9, day, at(day, 8, 50)).await.unwrap();

        let all = team_summary(service.store(), 2024, 6, None, &Department::all())
            .await
            .unwrap();
        assert_eq!(all.summary.total_people, 3);
        assert_eq!(all.summary.total_present, 2);
        assert_eq!(all.summary.total_late, 1);
        assert_eq!(all.summary.average_hours, 2.67);
        assert_eq!(all.department_summary.len(), 6);

        let marketing = team_summary(
            service.store(),
            2024,
            6,
            Some(Department::Marketing),
            &Department::all(),
        )
        .await
        .unwrap();
        assert_eq!(marketing.summary.total_people, 1);
        assert_eq!(marketing.summary.total_present, 2);
        assert_eq!(marketing.summary.total_late, 1);
        assert_eq!(marketing.department_summary, all.department_summary);

        let counts = |department: Department| {
            marketing
                .department_summary
                .iter()
                .find(|d| d.department == department)
                .map(|d| (d.present, d.late))
        };
        assert_eq!(counts(Department::Engineering), Some((1, 0)));
        assert_eq!(counts(Department::Marketing), Some((0, 1)));
        assert_eq!(counts(Department::Sales), Some((1, 0)));
        assert_eq!(counts(Department::Finance), Some((0, 0)));

        assert!(matches!(
            team_summary(service.store(), 2024, 13, None, &Department::all()).await,
            Err(AttendanceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_paginated_newest_first() {
        let service = service();
        for d in 3..=7 {
            let day = date(2024, 6, d);
            service.check_in(1, day, at(day, 9, 0)).await.unwrap();
        }

        let filter = RecordFilter::for_person(1);
        let page = list_attendance(service.store(), filter, Page::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        let days: Vec<NaiveDate> = page.data.iter().map(|v| v.record.day()).collect();
        assert_eq!(days, vec![date(2024, 6, 5), date(2024, 6, 4)]);
    }

    #[tokio::test]
    async fn removed_person_still_lists_without_join() {
        let service = service();
        let day = date(2024, 6, 3);
        service.check_in(3, day, at(day, 9, 0)).await.unwrap();
        service.store().remove_person(3);

        let page = list_attendance(service.store(), RecordFilter::for_day(day), Page::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.data[0].person.is_none());
    }
}
