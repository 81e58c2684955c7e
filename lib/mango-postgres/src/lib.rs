//! PostgreSQL executor for mango operators.
//!
//! This crate provides a PostgreSQL implementation of [`OperatorExecutor`].
//! Statements use positional placeholders (`$1`, `$2`, ...) and arguments
//! are bound in order.
//!
//! # Usage
//!
//! ```text
//! use mango::{Mapper, Value};
//! use mango_postgres::{PgExecutorConfig, PgPool};
//!
//! let pool = PgPool::connect("postgres://localhost/app", PgExecutorConfig::default()).await?;
//! let mapper = Mapper::for_interface::<UserDaoMapper>()?;
//!
//! let outcome = mapper
//!     .invoke(&pool, "insert", vec![Value::from("ash")].into())
//!     .await?;
//! ```
//!
//! # Generated ids
//!
//! PostgreSQL has no generated-keys channel, so an insert that wants its id
//! is rewritten to `... RETURNING <generated_id_column>` unless it already
//! has a RETURNING clause.
//!
//! # Batches
//!
//! A batch update runs every element in one transaction and rolls back on
//! the first failure.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod config;
mod executor;

pub use bind::{bind_values, decode_row, returned_ids, with_returning};
pub use config::{ConnectionConfig, PgExecutorConfig};
pub use executor::PgPool;

// Re-export core types for convenience
pub use mango::{
    Arguments, MangoError, Mapper, MethodDescriptor, Operator, OperatorExecutor, OperatorKind,
    Outcome, Row, UpdateResult, Value, get_operator,
};
