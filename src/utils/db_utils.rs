use chrono::NaiveDate;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::{QueryAs, QueryScalar};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone)]
pub enum SqlValue {
    U64(u64),
    U32(u32),
    I32(i32),
    Str(String),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug, Default)]
pub struct Filter {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self {
            sql: String::from(" WHERE 1=1"),
            values: Vec::new(),
        }
    }

    /// Adds `AND <condition>` when a value is given; `condition` holds one `?`.
    pub fn and(mut self, condition: &str, value: Option<SqlValue>) -> Self {
        if let Some(value) = value {
            self.sql.push_str(" AND ");
            self.sql.push_str(condition);
            self.values.push(value);
        }
        self
    }
}

pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value.clone() {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::U32(v) => query.bind(v),
            SqlValue::I32(v) => query.bind(v),
            SqlValue::Str(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value.clone() {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::U32(v) => query.bind(v),
            SqlValue::I32(v) => query.bind(v),
            SqlValue::Str(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}
