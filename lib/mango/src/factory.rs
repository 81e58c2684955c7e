//! Operator factory: turns a method descriptor into its operator.
//!
//! Resolution runs strictly downward: validate the SQL declaration,
//! classify the statement, detect the batch shape of writes, then build
//! the operator. Nothing is cached here; see [`crate::Mapper`] for
//! bind-time resolution.

use crate::{
    BatchUpdateOperator, MangoError, MethodDescriptor, Operator, QueryOperator, StatementKind,
    TypeDescriptor, UpdateOperator, wants_generated_id,
};
use crate::statement::classify_validated;

/// True iff there is exactly one parameter and it is a collection or array.
pub fn is_batch(parameter_types: &[TypeDescriptor]) -> bool {
    match parameter_types {
        [only] => only.is_sequence(),
        _ => false,
    }
}

/// Resolve the operator for a mapped method.
///
/// Fails with [`MangoError::NoSqlAnnotation`] when the method has no SQL
/// and [`MangoError::IncorrectSql`] when its SQL is blank. Equal
/// descriptors always resolve to equal operators.
pub fn get_operator(method: &MethodDescriptor) -> Result<Operator, MangoError> {
    let sql = method
        .sql
        .as_deref()
        .ok_or_else(|| MangoError::NoSqlAnnotation(method.name.clone()))?;
    if sql.trim().is_empty() {
        return Err(MangoError::IncorrectSql(format!(
            "sql is null or empty on method {}",
            method.name
        )));
    }

    let operator: Operator = match classify_validated(sql) {
        StatementKind::Read => QueryOperator::new(sql, method.generic_return_type.clone()).into(),
        StatementKind::Write if is_batch(&method.parameter_types) => {
            BatchUpdateOperator::new(sql, method.return_type.clone()).into()
        }
        StatementKind::Write => UpdateOperator::new(
            sql,
            method.return_type.clone(),
            wants_generated_id(method.return_generated_id, sql),
        )
        .into(),
    };

    tracing::debug!(
        method = %method.name,
        kind = ?operator.kind(),
        result_shape = operator.result_type().shape.as_str(),
        "resolved operator"
    );
    Ok(operator)
}
