use chrono::NaiveDate;
use sqlx::{
    MySql,
    mysql::MySqlArguments,
    query::{QueryAs, QueryScalar},
};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    String(String),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause container
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Default for WhereClause {
    fn default() -> Self {
        Self {
            sql: String::from(" WHERE 1=1"),
            values: Vec::new(),
        }
    }
}

impl WhereClause {
    /// Appends `AND <condition>` where the condition holds one `?` placeholder.
    pub fn and(&mut self, condition: &str, value: SqlValue) {
        self.sql.push_str(" AND ");
        self.sql.push_str(condition);
        self.values.push(value);
    }

    /// Appends a condition without placeholders.
    pub fn and_raw(&mut self, condition: &str) {
        self.sql.push_str(" AND ");
        self.sql.push_str(condition);
    }
}

/// ===============================
/// Bind values in placeholder order
/// ===============================
pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values.iter().cloned() {
        query = match value {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::String(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for value in values.iter().cloned() {
        query = match value {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::String(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }
    query
}
