use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::base::Executor;
use crate::errors::ExecutionError;

/// An executor that replays pre-configured results and records every call.
pub struct MockExecutor {
    responses: Arc<Mutex<Vec<Result<Value, ExecutionError>>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockExecutor {
    pub fn new(responses: Vec<Result<Value, ExecutionError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the recorded `(sequence_name, payload)` pairs.
    pub fn calls(&self) -> Arc<Mutex<Vec<(String, Value)>>> {
        self.calls.clone()
    }
}

impl Executor for MockExecutor {
    fn execute(&self, sequence_name: &str, payload: &Value) -> Result<Value, ExecutionError> {
        self.calls
            .lock()
            .unwrap()
            .push((sequence_name.to_string(), payload.clone()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(ExecutionError::IncompleteResult { body: Value::Null })
        } else {
            responses.remove(0)
        }
    }
}
