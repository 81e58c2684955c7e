//! Execution boundary between operators and a database backend.
//!
//! This module defines the values an operator binds, the shape of the
//! arguments it is invoked with, and the [`OperatorExecutor`] trait a
//! backend implements to actually talk to a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::MangoError;

/// A value that can be bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Strings(Vec<String>),
    Datetime(DateTime<Utc>),
    Json(serde_json::Value),
    Null,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strings(v)
    }
}

impl<'a> From<Vec<&'a str>> for Value {
    fn from(v: Vec<&'a str>) -> Self {
        Value::Strings(v.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Datetime(dt)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Arguments a mapped method is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    /// Positional values for a query or a single write.
    Single(Vec<Value>),
    /// One row of positional values per element of the batch parameter.
    Batch(Vec<Vec<Value>>),
}

impl Arguments {
    /// No arguments.
    pub fn none() -> Self {
        Arguments::Single(Vec::new())
    }

    fn describe(&self) -> &'static str {
        match self {
            Arguments::Single(_) => "single",
            Arguments::Batch(_) => "batch",
        }
    }

    pub(crate) fn into_single(self, operator: &str) -> Result<Vec<Value>, MangoError> {
        match self {
            Arguments::Single(values) => Ok(values),
            other => Err(MangoError::ArgumentMismatch(format!(
                "{} operator expects single arguments, got {}",
                operator,
                other.describe()
            ))),
        }
    }

    pub(crate) fn into_batch(self, operator: &str) -> Result<Vec<Vec<Value>>, MangoError> {
        match self {
            Arguments::Batch(rows) => Ok(rows),
            other => Err(MangoError::ArgumentMismatch(format!(
                "{} operator expects batch arguments, got {}",
                operator,
                other.describe()
            ))),
        }
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Arguments::Single(values)
    }
}

impl From<Vec<Vec<Value>>> for Arguments {
    fn from(rows: Vec<Vec<Value>>) -> Self {
        Arguments::Batch(rows)
    }
}

/// A fetched row as a column-name to JSON-value map.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result of a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of rows affected.
    pub rows_affected: u64,
    /// Generated id, when one was requested and the backend produced it.
    pub generated_id: Option<i64>,
}

/// Result of executing an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every row, for queries returning a collection or array.
    Rows(Vec<Row>),
    /// The first row, for queries returning a single value.
    Row(Option<Row>),
    /// Rows affected by a single write.
    Affected(u64),
    /// The generated id of an insert. An insert that wants its id but gets
    /// none back fails with `MangoError::StorageError` instead.
    GeneratedId(i64),
    /// Rows affected per batch element.
    BatchAffected(Vec<u64>),
}

/// Trait for executing operator statements against a database backend.
///
/// Implemented by database-specific pool types (e.g., `mango_postgres::PgPool`).
#[async_trait]
pub trait OperatorExecutor: Send + Sync {
    /// Execute a read statement and return every row.
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, MangoError>;

    /// Execute a single write, optionally retrieving the generated id.
    async fn update(
        &self,
        sql: &str,
        args: &[Value],
        return_generated_id: bool,
    ) -> Result<UpdateResult, MangoError>;

    /// Execute the same write once per row of arguments.
    ///
    /// Returns rows affected per element, in order.
    async fn batch_update(&self, sql: &str, batch: &[Vec<Value>])
    -> Result<Vec<u64>, MangoError>;
}
