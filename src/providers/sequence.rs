use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    auth::{ClientCredentialsTokenProvider, Credentials},
    base::{Executor, TokenProvider},
    retry::RetryPolicy,
};
use crate::errors::ExecutionError;

/// Client for the `/api/v1/execute` endpoint.
///
/// Every attempt authenticates from scratch, so a retry triggered by an
/// expired or rejected token picks up a fresh one.
pub struct SequenceExecutor<T = ClientCredentialsTokenProvider> {
    client: Client,
    base_url: String,
    tokens: T,
    retry: RetryPolicy,
}

impl SequenceExecutor<ClientCredentialsTokenProvider> {
    /// Executor whose token provider shares the same HTTP client.
    pub fn with_credentials(
        client: Client,
        base_url: String,
        credentials: Credentials,
        retry: RetryPolicy,
    ) -> Self {
        let tokens = ClientCredentialsTokenProvider::new(client.clone(), credentials);
        Self::new(client, base_url, tokens, retry)
    }
}

impl<T: TokenProvider> SequenceExecutor<T> {
    pub fn new(client: Client, base_url: String, tokens: T, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url,
            tokens,
            retry,
        }
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/v1/execute", self.base_url.trim_end_matches('/'))
    }

    fn post(&self, sequence_name: &str, payload: &Value) -> Result<Value, ExecutionError> {
        let token = self.tokens.fetch_token()?;

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("sequence-name", sequence_name)])
            .bearer_auth(token.secret())
            .header("Content-Type", "application/json")
            .header("Accept", "*/*")
            .json(payload)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!(%status, %body, "raw sequence output");

        if !status.is_success() {
            return Err(ExecutionError::Status { status, body });
        }

        let mut output: Value = serde_json::from_str(&body).map_err(ExecutionError::Protocol)?;
        match output.as_object_mut().and_then(|o| o.remove("preds")) {
            Some(preds) => Ok(preds),
            None => Err(ExecutionError::IncompleteResult { body: output }),
        }
    }
}

impl<T: TokenProvider> Executor for SequenceExecutor<T> {
    fn execute(&self, sequence_name: &str, payload: &Value) -> Result<Value, ExecutionError> {
        self.retry.run(|attempt| {
            info!(
                sequence = sequence_name,
                attempt,
                max_attempts = self.retry.max_attempts(),
                "executing sequence"
            );
            self.post(sequence_name, payload)
        })
    }
}
