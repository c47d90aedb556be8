use chrono::{Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use dotenvy::dotenv;
use tracing::{debug, info};

use attendance::attendance::AttendanceService;
use attendance::config::Config;
use attendance::db::init_db;
use attendance::error::AttendanceError;
use attendance::model::{department::Department, person::Person, role::Role};
use attendance::store::{AttendanceStore, MySqlStore};
use attendance::telemetry::init_tracing;
use attendance::utils::calendar::is_weekend;

const SEED_DAYS: u64 = 30;

#[derive(Clone, Copy)]
enum Arrival {
    OnTime,
    Late,
    HalfDay,
    NoShow,
}

// Four on-time days out of seven, like a typical office week.
const ARRIVALS: [Arrival; 7] = [
    Arrival::OnTime,
    Arrival::OnTime,
    Arrival::OnTime,
    Arrival::OnTime,
    Arrival::Late,
    Arrival::HalfDay,
    Arrival::NoShow,
];

#[derive(Debug, Default, PartialEq)]
struct SeedReport {
    created: usize,
    completed: usize,
    skipped: usize,
}

fn demo_person(id: u64, code: &str, name: &str, role: Role, department: Department) -> Person {
    let first = name.split_whitespace().next().unwrap_or(name).to_lowercase();
    let email = if role == Role::Manager {
        "manager@company.com".to_string()
    } else {
        format!("{first}@company.com")
    };
    Person {
        id,
        employee_code: code.to_string(),
        name: name.to_string(),
        email,
        role,
        department,
    }
}

fn demo_roster() -> Vec<Person> {
    vec![
        demo_person(1, "MGR001", "John Manager", Role::Manager, Department::Operations),
        demo_person(2, "EMP001", "Alice Johnson", Role::Employee, Department::Engineering),
        demo_person(3, "EMP002", "Bob Smith", Role::Employee, Department::Engineering),
        demo_person(4, "EMP003", "Carol Williams", Role::Employee, Department::Marketing),
        demo_person(5, "EMP004", "David Brown", Role::Employee, Department::Sales),
        demo_person(6, "EMP005", "Eva Martinez", Role::Employee, Department::Hr),
        demo_person(7, "EMP006", "Frank Garcia", Role::Employee, Department::Finance),
        demo_person(8, "EMP007", "Grace Lee", Role::Employee, Department::Engineering),
        demo_person(9, "EMP008", "Henry Wilson", Role::Employee, Department::Marketing),
        demo_person(10, "EMP009", "Ivy Chen", Role::Employee, Department::Operations),
    ]
}

fn at_offset(day: NaiveDate, hour: i64, minutes: u64) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + Duration::hours(hour) + Duration::minutes(minutes as i64)
}

/// Deterministic check-in/check-out pair for a person on a day, or `None`
/// for a no-show.
fn shift_for(
    day_index: u64,
    person_index: u64,
    day: NaiveDate,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let spread = day_index * 7 + person_index * 11;
    let check_in = match ARRIVALS[((day_index + person_index) % 7) as usize] {
        Arrival::OnTime => at_offset(day, 8, 20 + spread % 50),
        Arrival::Late => at_offset(day, 9, 30 + spread % 60),
        Arrival::HalfDay => at_offset(day, 11, 5 + spread % 55),
        Arrival::NoShow => return None,
    };
    let check_out = at_offset(day, 17, (spread * 13) % 120);
    Some((check_in, check_out))
}

/// Drives the last `days` weekdays of attendance for `employees` through the
/// regular check-in/check-out path. Today stays checked in.
async fn seed_attendance<S: AttendanceStore>(
    service: &AttendanceService<S>,
    employees: &[Person],
    today: NaiveDate,
    days: u64,
) -> Result<SeedReport, AttendanceError> {
    let mut report = SeedReport::default();

    for day_index in 0..days {
        let Some(day) = today.checked_sub_days(Days::new(day_index)) else {
            break;
        };
        if is_weekend(day) {
            continue;
        }

        for (person_index, person) in employees.iter().enumerate() {
            let Some((check_in, check_out)) = shift_for(day_index, person_index as u64, day) else {
                continue;
            };

            match service.check_in(person.id, day, check_in).await {
                Ok(_) => report.created += 1,
                Err(AttendanceError::AlreadyCheckedIn) => {
                    debug!(person_id = person.id, %day, "Record exists, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if day_index > 0 {
                service.check_out(person.id, day, check_out).await?;
                report.completed += 1;
            }
        }
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let _guard = init_tracing(&config.log_dir, "seed.log");

    info!("Seeding starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let store = MySqlStore::new(pool);

    let roster = demo_roster();
    for person in &roster {
        store.upsert_person(person).await?;
    }
    info!(count = roster.len(), "Roster upserted");

    let employees: Vec<Person> = roster
        .into_iter()
        .filter(|p| p.role == Role::Employee)
        .collect();

    let service = AttendanceService::new(store, config.policy);
    let today = Local::now().date_naive();
    let report = seed_attendance(&service, &employees, today, SEED_DAYS).await?;

    info!(
        created = report.created,
        completed = report.completed,
        skipped = report.skipped,
        "Attendance seeded"
    );
    println!(
        "Seeded {} attendance records ({} checked out, {} already present)",
        report.created, report.completed, report.skipped
    );

    Ok(())
}
