use thiserror::Error;

#[derive(Error, Debug)]
pub enum MangoError {
    /// The method carries no `#[sql(...)]` declaration at all.
    #[error("No SQL annotation on method: {0}")]
    NoSqlAnnotation(String),

    /// The method's SQL declaration is empty or only whitespace.
    #[error("Incorrect SQL: {0}")]
    IncorrectSql(String),

    #[error("Unknown mapper method: {0}")]
    UnknownMethod(String),

    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),
}
