use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use super::base::TokenProvider;
use crate::errors::AuthError;

/// OAuth2 client-credentials for the sequence API.
#[derive(Clone)]
pub struct Credentials {
    pub domain: String,
    pub audience: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(domain: String, audience: String, client_id: String, client_secret: String) -> Self {
        Self {
            domain,
            audience,
            client_id,
            client_secret,
        }
    }

    /// `https://{domain}/oauth/token`. A domain that already names its scheme
    /// is used as-is.
    pub fn token_endpoint(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{}/oauth/token", domain)
        } else {
            format!("https://{}/oauth/token", domain)
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("audience", &self.audience)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

pub struct ClientCredentialsTokenProvider {
    client: Client,
    credentials: Credentials,
}

impl ClientCredentialsTokenProvider {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl TokenProvider for ClientCredentialsTokenProvider {
    fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        let url = self.credentials.token_endpoint();
        debug!(%url, client_id = %self.credentials.client_id, "requesting access token");

        let payload = json!({
            "grant_type": "client_credentials",
            "client_id": self.credentials.client_id,
            "client_secret": self.credentials.client_secret,
            "audience": self.credentials.audience,
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(AuthError::Status { status, body });
        }

        let info: Value = serde_json::from_str(&body).map_err(AuthError::Protocol)?;
        let token = info
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(AuthError::MissingAccessToken)?;

        Ok(AccessToken::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(domain: &str) -> Credentials {
        Credentials::new(
            domain.to_string(),
            "https://api.example.com".to_string(),
            "client".to_string(),
            "shh".to_string(),
        )
    }

    #[test]
    fn test_token_endpoint_prefixes_https() {
        assert_eq!(
            credentials("auth.example.com").token_endpoint(),
            "https://auth.example.com/oauth/token"
        );
    }

    #[test]
    fn test_token_endpoint_keeps_explicit_scheme() {
        assert_eq!(
            credentials("http://127.0.0.1:1234/").token_endpoint(),
            "http://127.0.0.1:1234/oauth/token"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = format!("{:?}", credentials("auth.example.com"));
        assert!(creds.contains("client"));
        assert!(!creds.contains("shh"));

        let token = format!("{:?}", AccessToken::new("eyJhbGciOi"));
        assert!(!token.contains("eyJhbGciOi"));
    }
}
