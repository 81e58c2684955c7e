//! Recording executor for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{MangoError, OperatorExecutor, Row, UpdateResult, Value};

/// Returns canned results and records which entry point was called.
#[derive(Debug)]
pub(crate) struct RecordingExecutor {
    rows: Vec<Row>,
    update: UpdateResult,
    calls: Mutex<Vec<String>>,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            update: UpdateResult {
                rows_affected: 1,
                generated_id: None,
            },
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingExecutor {
    pub(crate) fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub(crate) fn with_update(update: UpdateResult) -> Self {
        Self {
            update,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl OperatorExecutor for RecordingExecutor {
    async fn query(&self, _sql: &str, _args: &[Value]) -> Result<Vec<Row>, MangoError> {
        self.record("query");
        Ok(self.rows.clone())
    }

    async fn update(
        &self,
        _sql: &str,
        _args: &[Value],
        return_generated_id: bool,
    ) -> Result<UpdateResult, MangoError> {
        self.record("update");
        Ok(UpdateResult {
            generated_id: self.update.generated_id.filter(|_| return_generated_id),
            ..self.update
        })
    }

    async fn batch_update(
        &self,
        _sql: &str,
        batch: &[Vec<Value>],
    ) -> Result<Vec<u64>, MangoError> {
        self.record("batch_update");
        Ok(vec![1; batch.len()])
    }
}
