use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

use crate::errors::{to_env_var, ConfigError};
use crate::providers::auth::Credentials;
use crate::providers::retry::{self, RetryPolicy};
use crate::providers::types::conversation::ConversationMeta;

pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Connection settings, laid out like the `[general]` table of the secrets file.
#[derive(Debug, Deserialize)]
pub struct GeneralSettings {
    pub auth_domain: String,
    pub auth_resource_identifier: String,
    pub api_base_url: String,
    // Keys are lowercased on load, so `W_CLIENT_ID` in the file and
    // `CHATSIM_GENERAL__W_CLIENT_ID` land on the same key.
    #[serde(rename = "w_client_id")]
    pub client_id: String,
    #[serde(rename = "w_client_secret")]
    pub client_secret: String,
    pub model_name: String,
    pub utility_company: String,
}

#[derive(Debug, Deserialize)]
pub struct MetaSettings {
    #[serde(default = "default_customer_name")]
    pub customer_name: String,
    #[serde(default = "default_zip_code")]
    pub zip_code: String,
    #[serde(
        default = "default_available_providers",
        deserialize_with = "list_or_comma_separated"
    )]
    pub available_providers: Vec<String>,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
}

impl Default for MetaSettings {
    fn default() -> Self {
        Self {
            customer_name: default_customer_name(),
            zip_code: default_zip_code(),
            available_providers: default_available_providers(),
            agent_name: default_agent_name(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub general: GeneralSettings,
    #[serde(default)]
    pub meta: MetaSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Settings {
    /// Load settings from the secrets file, then let `CHATSIM_*` environment
    /// variables override individual keys.
    ///
    /// Without an explicit path the default secrets file is optional, so a
    /// purely environment-driven setup works too.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_SECRETS_FILE, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("CHATSIM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);
                let field = match &err {
                    config::ConfigError::NotFound(key) => Some(key.clone()),
                    _ => missing_field(&err.to_string()),
                };
                match field {
                    Some(field) => {
                        let key = if field == "general" || field.contains('.') {
                            field
                        } else {
                            format!("general.{}", field)
                        };
                        let env_var = to_env_var(&key);
                        Err(ConfigError::MissingValue { key, env_var })
                    }
                    None => Err(ConfigError::Other(err)),
                }
            }
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.general.auth_domain.clone(),
            self.general.auth_resource_identifier.clone(),
            self.general.client_id.clone(),
            self.general.client_secret.clone(),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::jittered(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.jitter_ms),
        )
    }

    pub fn conversation_meta(&self) -> ConversationMeta {
        ConversationMeta {
            customer_name: self.meta.customer_name.clone(),
            zip_code: self.meta.zip_code.clone(),
            utility_company: self.general.utility_company.clone(),
            available_providers: self.meta.available_providers.clone(),
            agent_name: self.meta.agent_name.clone(),
        }
    }
}

/// Accepts a TOML array, or a comma separated string as environment variables
/// supply it.
fn list_or_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

// "missing field `model_name`" -> "model_name"
fn missing_field(message: &str) -> Option<String> {
    let rest = message.split("missing field `").nth(1)?;
    let field = rest.split('`').next()?;
    Some(field.to_string())
}

fn default_customer_name() -> String {
    "Mary".to_string()
}

fn default_zip_code() -> String {
    "21560".to_string()
}

fn default_available_providers() -> Vec<String> {
    vec!["AT&T".to_string(), "Verizon".to_string()]
}

fn default_agent_name() -> String {
    "Tom".to_string()
}

fn default_max_attempts() -> u32 {
    retry::DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    retry::DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_jitter_ms() -> u64 {
    retry::DEFAULT_JITTER.as_millis() as u64
}
