//! PostgreSQL implementation of OperatorExecutor.

use std::ops::Deref;

use async_trait::async_trait;
use mango::{MangoError, OperatorExecutor, Row, UpdateResult, Value};
use sqlx::postgres::PgPoolOptions;

use crate::bind::{bind_values, decode_row, generated_id, returned_ids, with_returning};
use crate::{ConnectionConfig, PgExecutorConfig};

fn storage_error(e: sqlx::Error) -> MangoError {
    MangoError::StorageError(e.to_string())
}

/// Wrapper around sqlx::PgPool that implements OperatorExecutor.
#[derive(Clone, Debug)]
pub struct PgPool {
    pool: sqlx::PgPool,
    config: PgExecutorConfig,
}

impl PgPool {
    /// Create a new PgPool from an sqlx PgPool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self::with_config(pool, PgExecutorConfig::default())
    }

    pub fn with_config(pool: sqlx::PgPool, config: PgExecutorConfig) -> Self {
        Self { pool, config }
    }

    /// Connect to a PostgreSQL database.
    pub async fn connect(
        connection: impl Into<ConnectionConfig>,
        config: PgExecutorConfig,
    ) -> Result<Self, MangoError> {
        let ConnectionConfig::Url(url) = connection.into();
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&url)
            .await
            .map_err(storage_error)?;
        tracing::info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool, config })
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PgExecutorConfig {
        &self.config
    }
}

impl Deref for PgPool {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

#[async_trait]
impl OperatorExecutor for PgPool {
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, MangoError> {
        let arguments = bind_values(args)?;
        let rows = sqlx::query_with(sql, arguments)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.iter().map(decode_row).collect()
    }

    async fn update(
        &self,
        sql: &str,
        args: &[Value],
        return_generated_id: bool,
    ) -> Result<UpdateResult, MangoError> {
        let arguments = bind_values(args)?;

        if !return_generated_id {
            let result = sqlx::query_with(sql, arguments)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
            return Ok(UpdateResult {
                rows_affected: result.rows_affected(),
                generated_id: None,
            });
        }

        let sql = with_returning(sql, &self.config.generated_id_column);
        let rows = sqlx::query_with(&sql, arguments)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        let ids = rows
            .iter()
            .map(generated_id)
            .collect::<Result<Vec<_>, _>>()?;
        let result = returned_ids(&ids)?;
        tracing::debug!(generated_id = ?result.generated_id, "insert returned generated id");
        Ok(result)
    }

    async fn batch_update(
        &self,
        sql: &str,
        batch: &[Vec<Value>],
    ) -> Result<Vec<u64>, MangoError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let mut affected = Vec::with_capacity(batch.len());

        for values in batch {
            let result = match bind_values(values) {
                Ok(arguments) => sqlx::query_with(sql, arguments)
                    .execute(&mut *tx)
                    .await
                    .map_err(storage_error),
                Err(e) => Err(e),
            };

            match result {
                Ok(result) => affected.push(result.rows_affected()),
                Err(e) => {
                    tracing::warn!(
                        element = affected.len(),
                        error = %e,
                        "batch update failed, rolling back"
                    );
                    tx.rollback().await.map_err(storage_error)?;
                    return Err(e);
                }
            }
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(affected)
    }
}
