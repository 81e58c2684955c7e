//! Mango - operator classification and dispatch for a lightweight SQL mapper.
//!
//! Each mapped method carries a raw SQL statement. This crate decides, once
//! per method, which execution strategy the method represents and builds an
//! immutable [`Operator`] for it.
//!
//! # Core Concepts
//!
//! - **Method Descriptor**: the SQL text, generated-id marker, return types
//!   and parameter types of one mapped method.
//! - **Statement Kind**: `Read` or `Write`, from the statement's leading keyword.
//! - **Operator**: `Query`, `Update` or `BatchUpdate`.
//!
//! # Resolution
//!
//! - `Read` statements become [`QueryOperator`]s carrying the generic return type.
//! - `Write` statements with a single collection or array parameter become
//!   [`BatchUpdateOperator`]s.
//! - Every other write becomes an [`UpdateOperator`], which returns the
//!   generated id only when the method is marked and the statement is an `INSERT`.
//!
//! [`Mapper`] resolves every method of an interface once, when it is bound,
//! and dispatches calls through an [`OperatorExecutor`].

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unwrap_in_result,
        clippy::panic
    )
)]

mod descriptor;
mod error;
mod executor;
mod factory;
mod mapper;
mod operator;
mod statement;
#[cfg(test)]
mod testing;

pub use descriptor::{MethodDescriptor, TypeDescriptor, TypeShape};
pub use error::MangoError;
pub use executor::{Arguments, OperatorExecutor, Outcome, Row, UpdateResult, Value};
pub use factory::{get_operator, is_batch};
pub use mapper::{BoundMethod, Mapper, MapperDefinition, MapperInterface};
pub use operator::{BatchUpdateOperator, Operator, OperatorKind, QueryOperator, UpdateOperator};
pub use statement::{StatementKind, classify, is_insert, wants_generated_id};

// Re-export the attribute macro
pub use mango_derive::mapper;
