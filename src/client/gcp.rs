//! Google Cloud Secret Manager client
//!
//! Fetches secret versions through the Secret Manager REST API:
//!
//! ```text
//! GET {endpoint}/v1/projects/{project}/secrets/{name}/versions/{version}:access
//! ```
//!
//! The response payload is base64 encoded and decoded here as UTF-8.
//!
//! ## Authentication
//!
//! The client sends an OAuth2 access token as a bearer token. Pass one
//! explicitly or let [`GoogleSecretManagerClient::from_env`] read it from
//! `GOOGLE_OAUTH_ACCESS_TOKEN` (for example the output of
//! `gcloud auth print-access-token`). Token acquisition and refresh are left
//! to the caller.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use super::{SecretClientError, SecretManagerClient};
use crate::config::EnvReader;
use crate::error::{Error, Result};

/// Environment variable read by [`GoogleSecretManagerClient::from_env`]
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

/// Secret Manager client for one GCP project
pub struct GoogleSecretManagerClient {
    project_id: String,
    access_token: String,
    endpoint: String,
    timeout: Duration,
    /// Created on first request
    http: OnceLock<reqwest::blocking::Client>,
}

impl std::fmt::Debug for GoogleSecretManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSecretManagerClient")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GoogleSecretManagerClient {
    /// Create a client for `project_id` authenticating with `access_token`
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            access_token: access_token.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            http: OnceLock::new(),
        }
    }

    /// Create a client reading the access token from `GOOGLE_OAUTH_ACCESS_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the variable is unset or empty.
    pub fn from_env(project_id: impl Into<String>, env: &dyn EnvReader) -> Result<Self> {
        let token = env
            .var(ACCESS_TOKEN_ENV)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config(format!("{ACCESS_TOKEN_ENV} is not set")))?;
        Ok(Self::new(project_id, token))
    }

    /// Override the API endpoint (emulators, tests)
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Resource name of a secret version
    #[must_use]
    pub fn secret_path(&self, secret_name: &str, secret_version: &str) -> String {
        format!(
            "projects/{}/secrets/{}/versions/{}",
            self.project_id, secret_name, secret_version
        )
    }

    fn http(&self) -> std::result::Result<&reqwest::blocking::Client, SecretClientError> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SecretClientError::Connection(e.to_string()))?;
        Ok(self.http.get_or_init(|| client))
    }
}

impl SecretManagerClient for GoogleSecretManagerClient {
    fn get_secret(
        &self,
        secret_name: &str,
        secret_version: &str,
    ) -> std::result::Result<String, SecretClientError> {
        let url = format!(
            "{}/v1/{}:access",
            self.endpoint.trim_end_matches('/'),
            self.secret_path(secret_name, secret_version)
        );
        log::debug!("Fetching secret '{secret_name}' version '{secret_version}' from GCP");

        let response = self
            .http()?
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| SecretClientError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status.as_u16() {
                404 => SecretClientError::NotFound {
                    name: secret_name.to_string(),
                    version: secret_version.to_string(),
                },
                401 | 403 => SecretClientError::PermissionDenied {
                    name: secret_name.to_string(),
                    message: body,
                },
                _ => SecretClientError::Backend(format!(
                    "Error during getting \"{secret_name}\" from the Google Secret Manager: HTTP {status}: {body}"
                )),
            });
        }

        let decode_err = |reason: String| SecretClientError::Decode {
            name: secret_name.to_string(),
            reason,
        };

        let body: AccessSecretVersionResponse =
            response.json().map_err(|e| decode_err(e.to_string()))?;
        let bytes = STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| decode_err(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| decode_err(e.to_string()))
    }

    fn client_name(&self) -> &'static str {
        "gcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;

    #[test]
    fn test_secret_path() {
        let client = GoogleSecretManagerClient::new("my-project", "token");
        assert_eq!(
            client.secret_path("db-pw", "latest"),
            "projects/my-project/secrets/db-pw/versions/latest"
        );
    }

    #[test]
    fn test_from_env() {
        let env = MapEnv::new().with(ACCESS_TOKEN_ENV, "ya29.token");
        let client = GoogleSecretManagerClient::from_env("proj", &env).unwrap();
        assert_eq!(client.project_id(), "proj");

        let err = GoogleSecretManagerClient::from_env("proj", &MapEnv::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GoogleSecretManagerClient::new("proj", "super-secret-token");
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
