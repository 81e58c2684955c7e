//! Operators: immutable execution strategies for mapped methods.

use serde::de::DeserializeOwned;

use crate::{Arguments, MangoError, OperatorExecutor, Outcome, Row, TypeDescriptor};

/// Variant tag of an [`Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Query,
    Update,
    BatchUpdate,
}

/// Execute a read statement and map rows into the method's generic return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOperator {
    sql: String,
    generic_return_type: TypeDescriptor,
}

impl QueryOperator {
    pub fn new(sql: impl Into<String>, generic_return_type: TypeDescriptor) -> Self {
        Self {
            sql: sql.into(),
            generic_return_type,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn generic_return_type(&self) -> &TypeDescriptor {
        &self.generic_return_type
    }

    /// True when the result is a collection or array of rows.
    pub fn returns_many(&self) -> bool {
        self.generic_return_type.is_sequence()
    }

    /// Shape fetched rows according to the generic return type.
    pub fn shape_rows(&self, rows: Vec<Row>) -> Outcome {
        if self.returns_many() {
            Outcome::Rows(rows)
        } else {
            Outcome::Row(rows.into_iter().next())
        }
    }

    /// Map a row into a typed value via serde.
    pub fn decode<T: DeserializeOwned>(row: Row) -> Result<T, MangoError> {
        Ok(serde_json::from_value(serde_json::Value::Object(row))?)
    }

    pub async fn execute<E: OperatorExecutor + ?Sized>(
        &self,
        executor: &E,
        args: Arguments,
    ) -> Result<Outcome, MangoError> {
        let values = args.into_single("query")?;
        let rows = executor.query(&self.sql, &values).await?;
        tracing::debug!(rows = rows.len(), "query executed");
        Ok(self.shape_rows(rows))
    }
}

/// Execute a single write, optionally retrieving an auto-generated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOperator {
    sql: String,
    return_type: TypeDescriptor,
    return_generated_id: bool,
}

impl UpdateOperator {
    pub fn new(
        sql: impl Into<String>,
        return_type: TypeDescriptor,
        return_generated_id: bool,
    ) -> Self {
        Self {
            sql: sql.into(),
            return_type,
            return_generated_id,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    pub fn return_generated_id(&self) -> bool {
        self.return_generated_id
    }

    pub async fn execute<E: OperatorExecutor + ?Sized>(
        &self,
        executor: &E,
        args: Arguments,
    ) -> Result<Outcome, MangoError> {
        let values = args.into_single("update")?;
        let result = executor
            .update(&self.sql, &values, self.return_generated_id)
            .await?;
        tracing::debug!(rows_affected = result.rows_affected, "update executed");

        if !self.return_generated_id {
            return Ok(Outcome::Affected(result.rows_affected));
        }
        match result.generated_id {
            Some(id) => Ok(Outcome::GeneratedId(id)),
            None => Err(MangoError::StorageError(format!(
                "insert affected {} rows but returned no generated id",
                result.rows_affected
            ))),
        }
    }
}

/// Execute the same write once per element of a collection or array parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdateOperator {
    sql: String,
    return_type: TypeDescriptor,
}

impl BatchUpdateOperator {
    pub fn new(sql: impl Into<String>, return_type: TypeDescriptor) -> Self {
        Self {
            sql: sql.into(),
            return_type,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    pub async fn execute<E: OperatorExecutor + ?Sized>(
        &self,
        executor: &E,
        args: Arguments,
    ) -> Result<Outcome, MangoError> {
        let rows = args.into_batch("batch update")?;
        if rows.is_empty() {
            return Ok(Outcome::BatchAffected(Vec::new()));
        }
        let affected = executor.batch_update(&self.sql, &rows).await?;
        tracing::debug!(elements = rows.len(), "batch update executed");
        Ok(Outcome::BatchAffected(affected))
    }
}

/// The execution strategy chosen for a mapped method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Query(QueryOperator),
    Update(UpdateOperator),
    BatchUpdate(BatchUpdateOperator),
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Query(_) => OperatorKind::Query,
            Operator::Update(_) => OperatorKind::Update,
            Operator::BatchUpdate(_) => OperatorKind::BatchUpdate,
        }
    }

    pub fn sql(&self) -> &str {
        match self {
            Operator::Query(op) => op.sql(),
            Operator::Update(op) => op.sql(),
            Operator::BatchUpdate(op) => op.sql(),
        }
    }

    /// The type carried into the operator: the generic return type for
    /// queries, the declared return type for writes.
    pub fn result_type(&self) -> &TypeDescriptor {
        match self {
            Operator::Query(op) => op.generic_return_type(),
            Operator::Update(op) => op.return_type(),
            Operator::BatchUpdate(op) => op.return_type(),
        }
    }

    /// Generated-id flag; always false for queries and batch updates.
    pub fn return_generated_id(&self) -> bool {
        match self {
            Operator::Update(op) => op.return_generated_id(),
            Operator::Query(_) | Operator::BatchUpdate(_) => false,
        }
    }

    /// Run the operator's statement through `executor`.
    pub async fn execute<E: OperatorExecutor + ?Sized>(
        &self,
        executor: &E,
        args: Arguments,
    ) -> Result<Outcome, MangoError> {
        match self {
            Operator::Query(op) => op.execute(executor, args).await,
            Operator::Update(op) => op.execute(executor, args).await,
            Operator::BatchUpdate(op) => op.execute(executor, args).await,
        }
    }
}

impl From<QueryOperator> for Operator {
    fn from(op: QueryOperator) -> Self {
        Operator::Query(op)
    }
}

impl From<UpdateOperator> for Operator {
    fn from(op: UpdateOperator) -> Self {
        Operator::Update(op)
    }
}

impl From<BatchUpdateOperator> for Operator {
    fn from(op: BatchUpdateOperator) -> Self {
        Operator::BatchUpdate(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use crate::{UpdateResult, Value};
    use serde::Deserialize;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn query_returning_collection_yields_all_rows() {
        let executor = RecordingExecutor::with_rows(vec![
            row(json!({ "id": 1 })),
            row(json!({ "id": 2 })),
        ]);
        let op = QueryOperator::new(
            "select id from users where age > $1",
            TypeDescriptor::collection("Vec<User>"),
        );

        let outcome = op
            .execute(&executor, vec![Value::Int(18)].into())
            .await
            .unwrap();

        match outcome {
            Outcome::Rows(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(executor.calls(), vec!["query".to_string()]);
    }

    #[tokio::test]
    async fn query_returning_single_value_yields_first_row() {
        let executor = RecordingExecutor::with_rows(vec![
            row(json!({ "id": 7 })),
            row(json!({ "id": 8 })),
        ]);
        let op = QueryOperator::new("select id from users", TypeDescriptor::plain("User"));

        let outcome = op.execute(&executor, Arguments::none()).await.unwrap();
        assert_eq!(outcome, Outcome::Row(Some(row(json!({ "id": 7 })))));
    }

    #[tokio::test]
    async fn query_with_no_rows_yields_none() {
        let executor = RecordingExecutor::default();
        let op = QueryOperator::new("select id from users", TypeDescriptor::plain("User"));

        let outcome = op.execute(&executor, Arguments::none()).await.unwrap();
        assert_eq!(outcome, Outcome::Row(None));
    }

    #[tokio::test]
    async fn update_returns_generated_id_when_flagged() {
        let executor = RecordingExecutor::with_update(UpdateResult {
            rows_affected: 1,
            generated_id: Some(42),
        });
        let op = UpdateOperator::new(
            "insert into users(name) values($1)",
            TypeDescriptor::plain("i64"),
            true,
        );

        let outcome = op
            .execute(&executor, vec![Value::from("ash")].into())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::GeneratedId(42));
    }

    #[tokio::test]
    async fn missing_generated_id_is_an_error() {
        let executor = RecordingExecutor::with_update(UpdateResult {
            rows_affected: 0,
            generated_id: None,
        });
        let op = UpdateOperator::new(
            "insert into users(name) values($1)",
            TypeDescriptor::plain("i64"),
            true,
        );

        let err = op
            .execute(&executor, vec![Value::from("ash")].into())
            .await
            .unwrap_err();
        assert!(matches!(err, MangoError::StorageError(_)));
    }

    #[tokio::test]
    async fn update_without_flag_reports_rows_affected() {
        let executor = RecordingExecutor::with_update(UpdateResult {
            rows_affected: 3,
            generated_id: Some(42),
        });
        let op = UpdateOperator::new(
            "update users set name = $1",
            TypeDescriptor::plain("u64"),
            false,
        );

        let outcome = op
            .execute(&executor, vec![Value::from("ash")].into())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Affected(3));
    }

    #[tokio::test]
    async fn batch_update_reports_per_element_counts() {
        let executor = RecordingExecutor::default();
        let op = BatchUpdateOperator::new(
            "insert into users(name) values($1)",
            TypeDescriptor::array("Vec"),
        );

        let batch = vec![vec![Value::from("a")], vec![Value::from("b")]];
        let outcome = op.execute(&executor, batch.into()).await.unwrap();

        assert_eq!(outcome, Outcome::BatchAffected(vec![1, 1]));
        assert_eq!(executor.calls(), vec!["batch_update".to_string()]);
    }

    #[tokio::test]
    async fn empty_batch_does_not_touch_the_executor() {
        let executor = RecordingExecutor::default();
        let op = BatchUpdateOperator::new("delete from users where id = $1", TypeDescriptor::unit());

        let outcome = op
            .execute(&executor, Arguments::Batch(Vec::new()))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::BatchAffected(Vec::new()));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn mismatched_arguments_are_rejected() {
        let executor = RecordingExecutor::default();

        let batch = Operator::from(BatchUpdateOperator::new(
            "delete from users where id = $1",
            TypeDescriptor::unit(),
        ));
        let err = batch
            .execute(&executor, Arguments::none())
            .await
            .unwrap_err();
        assert!(matches!(err, MangoError::ArgumentMismatch(_)));

        let query = Operator::from(QueryOperator::new(
            "select 1",
            TypeDescriptor::plain("i64"),
        ));
        let err = query
            .execute(&executor, Arguments::Batch(vec![vec![]]))
            .await
            .unwrap_err();
        assert!(matches!(err, MangoError::ArgumentMismatch(_)));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn decode_maps_row_into_type() {
        #[derive(Deserialize)]
        struct User {
            id: i64,
            name: String,
        }

        let user: User = QueryOperator::decode(row(json!({ "id": 1, "name": "ash" }))).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "ash");
    }

    #[test]
    fn accessors_expose_carried_fields() {
        let op = Operator::from(UpdateOperator::new(
            "insert into t values($1)",
            TypeDescriptor::plain("i64"),
            true,
        ));
        assert_eq!(op.kind(), OperatorKind::Update);
        assert_eq!(op.result_type().name, "i64");
        assert!(op.return_generated_id());
        assert_eq!(op.sql(), "insert into t values($1)");
    }
}
