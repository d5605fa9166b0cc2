//! In-memory secret client for testing

use super::{SecretClientError, SecretManagerClient};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// In-memory secret table keyed by `(name, version)` (not persisted)
///
/// Every request is recorded, in call order, so tests can check which
/// secrets were fetched.
#[derive(Debug, Default)]
pub struct MemorySecretClient {
    secrets: RwLock<HashMap<(String, String), String>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl MemorySecretClient {
    /// Create an empty client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret (builder style)
    #[must_use]
    pub fn with_secret(
        self,
        name: impl Into<String>,
        version: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(name, version, value);
        self
    }

    pub fn insert(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
        value: impl Into<String>,
    ) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.insert((name.into(), version.into()), value.into());
        }
    }

    pub fn remove(&self, name: &str, version: &str) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.remove(&(name.to_string(), version.to_string()));
        }
    }

    /// `(name, version)` of every `get_secret` call so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl SecretManagerClient for MemorySecretClient {
    fn get_secret(
        &self,
        secret_name: &str,
        secret_version: &str,
    ) -> Result<String, SecretClientError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((secret_name.to_string(), secret_version.to_string()));
        }

        self.secrets
            .read()
            .ok()
            .and_then(|s| {
                s.get(&(secret_name.to_string(), secret_version.to_string()))
                    .cloned()
            })
            .ok_or_else(|| SecretClientError::NotFound {
                name: secret_name.to_string(),
                version: secret_version.to_string(),
            })
    }

    fn client_name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
