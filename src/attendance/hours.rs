use chrono::NaiveDateTime;

use crate::error::AttendanceError;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Worked hours between check-in and check-out, rounded half-up to 2 decimals.
///
/// Returns 0 while either side is missing.
pub fn compute_hours(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
) -> Result<f64, AttendanceError> {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return Ok(0.0);
    };
    if check_out < check_in {
        return Err(AttendanceError::InvalidRange);
    }

    let millis = (check_out - check_in).num_milliseconds();
    // integer hundredths, so .xx5 always rounds up
    let hundredths = (millis * 100 + MILLIS_PER_HOUR / 2) / MILLIS_PER_HOUR;
    Ok(hundredths as f64 / 100.0)
}

/// Rounds an accumulated hour value to 2 decimals.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
