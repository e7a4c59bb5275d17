//! Positional parameters and decoded result sets for raw statements

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo};

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Bool(bool),
    /// Bound as a NULL of type TEXT
    Null,
}

impl SqlParam {
    pub(crate) fn bind_to<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Date(v) => query.bind(*v),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Null => query.bind(None::<String>),
        }
    }

    /// The Postgres type `bind_to` sends for this value.
    pub(crate) fn type_info(&self) -> PgTypeInfo {
        match self {
            SqlParam::Int(_) => <i64 as Type<Postgres>>::type_info(),
            SqlParam::Text(_) | SqlParam::Null => <String as Type<Postgres>>::type_info(),
            SqlParam::Date(_) => <NaiveDate as Type<Postgres>>::type_info(),
            SqlParam::Bool(_) => <bool as Type<Postgres>>::type_info(),
        }
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v.into())
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(v: NaiveDate) -> Self {
        SqlParam::Date(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

/// Best-effort typing of a command-line value:
/// `null`, `true`/`false`, integers, `YYYY-MM-DD` dates, otherwise text.
///
/// Integers must be written canonically; `007` or `+5` stay text so they
/// reach the database unchanged.
impl FromStr for SqlParam {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("null") {
            return Ok(SqlParam::Null);
        }
        if let Ok(b) = s.parse::<bool>() {
            return Ok(SqlParam::Bool(b));
        }
        if let Ok(n) = s.parse::<i64>() {
            if n.to_string() == s {
                return Ok(SqlParam::Int(n));
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(SqlParam::Date(d));
        }
        Ok(SqlParam::Text(s.to_string()))
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Int(v) => write!(f, "{}", v),
            SqlParam::Text(v) => write!(f, "{:?}", v),
            SqlParam::Date(v) => write!(f, "{}", v),
            SqlParam::Bool(v) => write!(f, "{}", v),
            SqlParam::Null => f.write_str("NULL"),
        }
    }
}

/// Output of [`crate::RecordStore::run`].
///
/// `columns` comes from the prepared statement, so a SELECT that matches
/// nothing still names its columns. It is empty only for statements that
/// return no columns at all (plain INSERT/UPDATE/DELETE, DDL).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
}

impl ResultSet {
    pub(crate) fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub(crate) fn push_row(&mut self, row: &PgRow) {
        if self.columns.is_empty() {
            self.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
        }
        self.rows
            .push((0..row.len()).map(|i| decode_cell(row, i)).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_objects(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

fn cell<'r, T>(row: &'r PgRow, index: usize, to_json: impl FnOnce(T) -> Value) -> Option<Value>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .ok()
        .map(|v| v.map(to_json).unwrap_or(Value::Null))
}

fn decode_cell(row: &PgRow, index: usize) -> Value {
    let type_name = row.columns()[index].type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INT2" => cell::<i16>(row, index, Value::from),
        "INT4" => cell::<i32>(row, index, Value::from),
        "INT8" => cell::<i64>(row, index, Value::from),
        "FLOAT4" => cell::<f32>(row, index, |v| Value::from(f64::from(v))),
        "FLOAT8" => cell::<f64>(row, index, Value::from),
        "BOOL" => cell::<bool>(row, index, Value::from),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => cell::<String>(row, index, Value::from),
        "DATE" => cell::<NaiveDate>(row, index, |v| Value::from(v.to_string())),
        "TIMESTAMP" => cell::<NaiveDateTime>(row, index, |v| Value::from(v.to_string())),
        "TIMESTAMPTZ" => cell::<DateTime<Utc>>(row, index, |v| Value::from(v.to_rfc3339())),
        _ => None,
    };

    decoded.unwrap_or_else(|| Value::from(format!("<{}>", type_name.to_lowercase())))
}
