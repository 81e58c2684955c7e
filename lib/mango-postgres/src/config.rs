//! Connection and executor configuration.

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_MAX_CONNECTIONS: u32 = 16;
pub(crate) const DEFAULT_GENERATED_ID_COLUMN: &str = "id";

/// Connection configuration for the PostgreSQL executor.
///
/// This enum is extensible for future authentication methods.
#[derive(Debug, Clone)]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Tuning for [`crate::PgPool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PgExecutorConfig {
    /// Maximum pool connections.
    pub max_connections: u32,
    /// Column read back by `RETURNING` when an insert wants its generated id.
    pub generated_id_column: String,
}

impl Default for PgExecutorConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            generated_id_column: DEFAULT_GENERATED_ID_COLUMN.to_string(),
        }
    }
}

impl PgExecutorConfig {
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn generated_id_column(mut self, column: impl Into<String>) -> Self {
        self.generated_id_column = column.into();
        self
    }
}
