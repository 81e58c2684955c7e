//! Value binding and row decoding for PostgreSQL statements.

use mango::{MangoError, Row, UpdateResult, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo};

fn storage_error(e: impl std::fmt::Display) -> MangoError {
    MangoError::StorageError(e.to_string())
}

/// Bind positional values to PgArguments, in order.
pub fn bind_values(values: &[Value]) -> Result<PgArguments, MangoError> {
    let mut args = PgArguments::default();
    for value in values {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

/// Bind a Value to PgArguments.
fn bind_value(args: &mut PgArguments, value: &Value) -> Result<(), MangoError> {
    match value {
        Value::String(s) => args.add(s.as_str()),
        Value::Int(n) => args.add(*n),
        // PostgreSQL doesn't have unsigned, use i64
        Value::UInt(n) => args.add(*n as i64),
        Value::Float(n) => args.add(*n),
        Value::Bool(b) => args.add(*b),
        Value::Strings(v) => args.add(v.as_slice()),
        Value::Datetime(dt) => args.add(*dt),
        Value::Json(v) => args.add(v.clone()),
        Value::Null => args.add(None::<String>),
    }
    .map_err(storage_error)
}

/// Where the code of a statement ends and whether it already returns rows.
#[derive(Debug, PartialEq, Eq)]
struct Scanned {
    has_returning: bool,
    /// Byte offset just past the last character outside comments.
    code_end: usize,
}

/// Byte offset just past a `'...'` or `"..."` run starting at `start`.
/// Doubled quotes are escapes.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Byte offset just past a `$tag$...$tag$` body starting at `start`, or
/// None when the `$` is not a dollar-quote opener (e.g. a `$1` placeholder).
fn skip_dollar_quoted(sql: &str, start: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut j = start + 1;
    if bytes.get(j).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    while bytes
        .get(j)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    {
        j += 1;
    }
    if bytes.get(j) != Some(&b'$') {
        return None;
    }
    let tag = &sql[start..=j];
    let body = j + 1;
    Some(
        sql[body..]
            .find(tag)
            .map_or(sql.len(), |pos| body + pos + tag.len()),
    )
}

/// Scan a statement, skipping literals, quoted identifiers, dollar-quoted
/// bodies and comments.
fn scan(sql: &str) -> Scanned {
    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut code_end = 0;
    let mut word_start: Option<usize> = None;
    let mut has_returning = false;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphanumeric() || b == b'_' {
            word_start.get_or_insert(i);
            i += 1;
            code_end = i;
            continue;
        }
        if let Some(start) = word_start.take() {
            has_returning |= sql[start..i].eq_ignore_ascii_case("returning");
        }

        match b {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i, b);
                code_end = i;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |pos| i + pos);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |pos| i + 2 + pos + 2);
            }
            b'$' => match skip_dollar_quoted(sql, i) {
                Some(end) => {
                    i = end;
                    code_end = i;
                }
                None => {
                    i += 1;
                    code_end = i;
                }
            },
            _ => {
                i += 1;
                if !b.is_ascii_whitespace() {
                    code_end = i;
                }
            }
        }
    }
    if let Some(start) = word_start {
        has_returning |= sql[start..].eq_ignore_ascii_case("returning");
    }

    Scanned {
        has_returning,
        code_end,
    }
}

/// Append `RETURNING <column>` unless the statement already has a RETURNING clause.
///
/// Words inside literals, quoted identifiers and comments are ignored.
/// Trailing comments and semicolons are dropped before appending.
pub fn with_returning(sql: &str, column: &str) -> String {
    let scanned = scan(sql);
    if scanned.has_returning {
        return sql.to_string();
    }
    let statement = sql[..scanned.code_end]
        .trim_end()
        .trim_end_matches(';')
        .trim_end();
    format!("{} RETURNING {}", statement, column)
}

/// Build the result of an insert that returned its generated ids.
///
/// An insert that wants its id but returns no row fails instead of
/// reporting zero rows affected.
pub fn returned_ids(ids: &[i64]) -> Result<UpdateResult, MangoError> {
    match ids.first() {
        Some(id) => Ok(UpdateResult {
            rows_affected: ids.len() as u64,
            generated_id: Some(*id),
        }),
        None => Err(MangoError::StorageError(
            "insert with RETURNING produced no generated id row".to_string(),
        )),
    }
}

/// Read the generated id from the first column of a RETURNING row.
pub fn generated_id(row: &PgRow) -> Result<i64, MangoError> {
    match row.try_get::<i64, _>(0) {
        Ok(id) => Ok(id),
        Err(_) => row
            .try_get::<i32, _>(0)
            .map(i64::from)
            .map_err(storage_error),
    }
}

/// Decode every column of a row into a column-name to JSON-value map.
///
/// NULL columns are kept as JSON null so optional fields deserialize to None.
pub fn decode_row(row: &PgRow) -> Result<Row, MangoError> {
    let mut obj = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = extract_column_value(row, idx, column.type_info().name())?;
        obj.insert(column.name().to_string(), value);
    }
    Ok(obj)
}

/// Extract a column value from a row as JSON
fn extract_column_value(
    row: &PgRow,
    col_idx: usize,
    type_name: &str,
) -> Result<serde_json::Value, MangoError> {
    use serde_json::Value as Json;

    let value = match type_name {
        "BOOL" => {
            let v: Option<bool> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(Json::Bool).unwrap_or(Json::Null)
        }
        "INT2" => {
            let v: Option<i16> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "INT4" => {
            let v: Option<i32> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "INT8" => {
            let v: Option<i64> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "FLOAT4" => {
            let v: Option<f32> = row.try_get(col_idx).map_err(storage_error)?;
            v.and_then(|n| serde_json::Number::from_f64(n.into()).map(Json::Number))
                .unwrap_or(Json::Null)
        }
        "FLOAT8" => {
            let v: Option<f64> = row.try_get(col_idx).map_err(storage_error)?;
            v.and_then(|n| serde_json::Number::from_f64(n).map(Json::Number))
                .unwrap_or(Json::Null)
        }
        "TIMESTAMPTZ" => {
            let v: Option<chrono::DateTime<chrono::Utc>> =
                row.try_get(col_idx).map_err(storage_error)?;
            v.map(|dt| Json::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)))
                .unwrap_or(Json::Null)
        }
        "TIMESTAMP" => {
            let v: Option<chrono::NaiveDateTime> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(|dt| Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()))
                .unwrap_or(Json::Null)
        }
        "JSONB" | "JSON" => {
            let v: Option<Json> = row.try_get(col_idx).map_err(storage_error)?;
            v.unwrap_or(Json::Null)
        }
        "TEXT[]" | "VARCHAR[]" => {
            let v: Option<Vec<String>> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(|items| Json::Array(items.into_iter().map(Json::String).collect()))
                .unwrap_or(Json::Null)
        }
        _ => {
            // Default: treat as string (VARCHAR, TEXT, CHAR, etc.)
            let v: Option<String> = row.try_get(col_idx).map_err(storage_error)?;
            v.map(Json::String).unwrap_or(Json::Null)
        }
    };

    Ok(value)
}
