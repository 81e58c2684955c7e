//! Statement classification by leading SQL keyword.

use std::sync::LazyLock;

use regex::Regex;

use crate::MangoError;

/// Whether a statement reads rows or writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Read,
    Write,
}

/// Leading keywords that make a statement a read.
const READ_KEYWORDS: [&str; 4] = ["SELECT", "SHOW", "DESC", "DESCRIBE"];

static READ_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| READ_KEYWORDS.iter().map(|k| keyword_pattern(k)).collect());

static INSERT_PATTERN: LazyLock<Regex> = LazyLock::new(|| keyword_pattern("INSERT"));

/// Matcher for `keyword` at the start of a statement, after optional
/// whitespace and followed by at least one whitespace char.
///
/// Case folding and `\s` are ASCII-only: `ſelect` or a no-break space
/// do not make a read.
#[allow(clippy::expect_used)]
fn keyword_pattern(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i-u)^\s*{}\s+", regex::escape(keyword)))
        .expect("pattern built from a fixed keyword literal")
}

/// Classify a statement as [`StatementKind::Read`] or [`StatementKind::Write`].
///
/// Fails with [`MangoError::IncorrectSql`] when the text is empty or blank.
pub fn classify(sql: &str) -> Result<StatementKind, MangoError> {
    if sql.trim().is_empty() {
        return Err(MangoError::IncorrectSql("sql is null or empty".to_string()));
    }
    Ok(classify_validated(sql))
}

/// Classify text already known to be non-blank.
pub(crate) fn classify_validated(sql: &str) -> StatementKind {
    // Every matcher runs; any hit makes the statement a read.
    let mut kind = StatementKind::Write;
    for pattern in READ_PATTERNS.iter() {
        if pattern.is_match(sql) {
            kind = StatementKind::Read;
        }
    }
    kind
}

/// True iff the statement's leading keyword is `INSERT`.
pub fn is_insert(sql: &str) -> bool {
    INSERT_PATTERN.is_match(sql)
}

/// Whether a single write should return the database-generated id.
///
/// Both the marker and a leading `INSERT` are required; the marker alone
/// on an `UPDATE` or `DELETE` has no effect.
pub fn wants_generated_id(has_marker: bool, sql: &str) -> bool {
    has_marker && is_insert(sql)
}
