use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::attendance::status::{
    AttendancePolicy, DEFAULT_GRACE_MINUTES, DEFAULT_LATE_THRESHOLD_MINUTES,
};
use crate::model::department::Department;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_dir: String,

    // Check-in policy
    pub policy: AttendancePolicy,

    /// Departments reported on, in display order.
    pub departments: Vec<Department>,
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let default_policy = AttendancePolicy::default();
        let standard_start = match lookup("STANDARD_CHECK_IN") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("STANDARD_CHECK_IN must be HH:MM, got '{raw}'"))?,
            None => default_policy.standard_start(),
        };

        let policy = AttendancePolicy::new(
            standard_start,
            parse_or(lookup("GRACE_MINUTES"), "GRACE_MINUTES", DEFAULT_GRACE_MINUTES)?,
            parse_or(
                lookup("LATE_THRESHOLD_MINUTES"),
                "LATE_THRESHOLD_MINUTES",
                DEFAULT_LATE_THRESHOLD_MINUTES,
            )?,
        )?;

        let departments = match lookup("DEPARTMENTS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    Department::from_str(name)
                        .map_err(|_| anyhow!("DEPARTMENTS contains unknown department '{name}'"))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Department::all(),
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            policy,
            departments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("DATABASE_URL", "mysql://localhost/attendance")]).unwrap();
        assert_eq!(config.policy, AttendancePolicy::default());
        assert_eq!(config.departments, Department::all());
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn reads_policy_and_departments() {
        let config = config_from(&[
            ("DATABASE_URL", "mysql://localhost/attendance"),
            ("STANDARD_CHECK_IN", "08:30"),
            ("GRACE_MINUTES", "10"),
            ("LATE_THRESHOLD_MINUTES", "90"),
            ("DEPARTMENTS", "Sales, hr ,Engineering"),
        ])
        .unwrap();

        assert_eq!(
            config.policy.standard_start(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert_eq!(config.policy.grace_minutes(), 10);
        assert_eq!(config.policy.late_threshold_minutes(), 90);
        assert_eq!(
            config.departments,
            vec![Department::Sales, Department::Hr, Department::Engineering]
        );
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("STANDARD_CHECK_IN", "9am")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("GRACE_MINUTES", "soon")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("DEPARTMENTS", "Legal")]).is_err());
        assert!(
            config_from(&[
                ("DATABASE_URL", "x"),
                ("GRACE_MINUTES", "60"),
                ("LATE_THRESHOLD_MINUTES", "30"),
            ])
            .is_err()
        );
    }
}
