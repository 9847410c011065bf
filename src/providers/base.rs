use serde_json::Value;

use super::auth::AccessToken;
use crate::errors::{AuthError, ExecutionError};

/// Source of bearer tokens for the sequence API.
pub trait TokenProvider {
    /// Fetch a new token. Implementations must not hand out cached tokens.
    fn fetch_token(&self) -> Result<AccessToken, AuthError>;
}

/// Runs a named remote sequence and returns its `preds` value.
pub trait Executor {
    fn execute(&self, sequence_name: &str, payload: &Value) -> Result<Value, ExecutionError>;
}
