//! Secret manager clients
//!
//! The secret manager source only needs one operation from a backend:
//! fetch the value of a named secret at a given version. Backends:
//! - **Memory**: In-memory table for tests and local development
//! - **Closure**: Any `Fn(&str, &str)` via [`from_fn`]
//! - **Google Secret Manager**: REST client - requires `gcp` feature

#[cfg(feature = "gcp")]
mod gcp;
mod memory;

#[cfg(feature = "gcp")]
pub use gcp::{ACCESS_TOKEN_ENV, GoogleSecretManagerClient};
pub use memory::MemorySecretClient;

use thiserror::Error;

/// Errors a secret client can report
///
/// The field walker treats every variant the same way: the field is left
/// unresolved and a diagnostic is recorded.
#[derive(Error, Debug)]
pub enum SecretClientError {
    #[error("Secret '{name}' version '{version}' not found")]
    NotFound { name: String, version: String },

    #[error("Permission denied for secret '{name}': {message}")]
    PermissionDenied { name: String, message: String },

    #[error("Connection to secret backend failed: {0}")]
    Connection(String),

    #[error("Failed to decode secret '{name}': {reason}")]
    Decode { name: String, reason: String },

    #[error("Secret backend error: {0}")]
    Backend(String),
}

/// Trait for secret manager backends
pub trait SecretManagerClient: Send + Sync {
    /// Fetch a secret by name and version
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot deliver the secret (not found,
    /// permission denied, network failure, undecodable payload).
    fn get_secret(
        &self,
        secret_name: &str,
        secret_version: &str,
    ) -> Result<String, SecretClientError>;

    /// Client name for logging/debugging
    fn client_name(&self) -> &'static str {
        "custom"
    }
}

/// Client backed by a closure
pub struct FnSecretClient<F> {
    fetch: F,
}

/// Wrap a closure as a [`SecretManagerClient`]
///
/// ```rust
/// use settings_secrets::client::{SecretManagerClient, from_fn};
///
/// let client = from_fn(|name, version| Ok(format!("{name}@{version}")));
/// assert_eq!(client.get_secret("db-pw", "v2").unwrap(), "db-pw@v2");
/// ```
pub fn from_fn<F>(fetch: F) -> FnSecretClient<F>
where
    F: Fn(&str, &str) -> Result<String, SecretClientError> + Send + Sync,
{
    FnSecretClient { fetch }
}

impl<F> SecretManagerClient for FnSecretClient<F>
where
    F: Fn(&str, &str) -> Result<String, SecretClientError> + Send + Sync,
{
    fn get_secret(
        &self,
        secret_name: &str,
        secret_version: &str,
    ) -> Result<String, SecretClientError> {
        (self.fetch)(secret_name, secret_version)
    }

    fn client_name(&self) -> &'static str {
        "closure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_client() {
        let client = from_fn(|name, version| {
            if name == "missing" {
                Err(SecretClientError::NotFound {
                    name: name.to_string(),
                    version: version.to_string(),
                })
            } else {
                Ok(format!("{name}:{version}"))
            }
        });

        assert_eq!(client.get_secret("api", "latest").unwrap(), "api:latest");
        assert!(matches!(
            client.get_secret("missing", "v1"),
            Err(SecretClientError::NotFound { .. })
        ));
        assert_eq!(client.client_name(), "closure");
    }

    #[test]
    fn test_error_messages() {
        let err = SecretClientError::NotFound {
            name: "db-pw".into(),
            version: "v2".into(),
        };
        assert_eq!(err.to_string(), "Secret 'db-pw' version 'v2' not found");
    }
}
