use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Business constants of the leave and attendance rules.
#[derive(Debug, Clone)]
pub struct HrPolicy {
    /// Paid leave days granted to a new employee
    pub default_paid_leave: u32,
    /// Sick leave days granted to a new employee
    pub default_sick_leave: u32,
    /// Longest leave request, inclusive days
    pub max_leave_span_days: u32,
    pub min_reason_len: usize,
    /// Hours in a workday; anything beyond counts as extra hours
    pub standard_work_hours: Decimal,
}

impl Default for HrPolicy {
    fn default() -> Self {
        Self {
            default_paid_leave: 24,
            default_sick_leave: 12,
            max_leave_span_days: 30,
            min_reason_len: 10,
            standard_work_hours: Decimal::from(8),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Logging
    pub log_dir: String,
    pub log_level: String,

    pub policy: HrPolicy,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = HrPolicy::default();
        let policy = HrPolicy {
            default_paid_leave: var_or("DEFAULT_PAID_LEAVE", defaults.default_paid_leave)?,
            default_sick_leave: var_or("DEFAULT_SICK_LEAVE", defaults.default_sick_leave)?,
            max_leave_span_days: var_or("MAX_LEAVE_SPAN_DAYS", defaults.max_leave_span_days)?,
            min_reason_len: var_or("MIN_REASON_LEN", defaults.min_reason_len)?,
            standard_work_hours: var_or("STANDARD_WORK_HOURS", defaults.standard_work_hours)?,
        };

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080".to_string())?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: var_or("API_PREFIX", "/api".to_string())?,
            log_dir: var_or("LOG_DIR", "logs".to_string())?,
            log_level: var_or("LOG_LEVEL", "info".to_string())?,
            policy,
        })
    }
}
