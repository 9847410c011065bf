use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures while obtaining a bearer token from the OAuth2 token endpoint.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Token response was not valid JSON: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error("access_token not found in token response")]
    MissingAccessToken,
}

/// Failures of a single sequence execution attempt.
///
/// Every variant is retryable. When the retry budget runs out the error of the
/// last attempt is handed back as-is.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Sequence request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sequence endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Sequence response was not valid JSON: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error("missing preds in sequence response: {body}")]
    IncompleteResult { body: Value },
}

/// `preds` came back but without the `answer.answer` string a chat reply needs.
#[derive(Error, Debug)]
#[error("Unexpected prediction shape, expected preds.answer.answer to be a string: {preds}")]
pub struct ContractViolation {
    pub preds: Value,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value `{key}` (set it in the secrets file or via {env_var})")]
    MissingValue { key: String, env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Environment variable that would supply a dotted configuration key.
pub fn to_env_var(key: &str) -> String {
    format!("CHATSIM_{}", key.replace('.', "__").to_uppercase())
}
