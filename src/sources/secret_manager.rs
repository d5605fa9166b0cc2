//! Secret manager source
//!
//! Adapts [`SecretResolver`] to the [`SettingsSource`] contract. Every call
//! walks the schema again; nothing is cached between loads.

use std::sync::Arc;

use super::{SettingsSource, SourceOutput};
use crate::client::SecretManagerClient;
use crate::config::{EnvReader, ProcessEnv, Schema};
use crate::error::Result;
use crate::resolver::{Resolution, SecretResolver};

/// Settings fetched from a secret manager for secret-tagged fields
#[derive(Clone)]
pub struct SecretManagerSource {
    client: Arc<dyn SecretManagerClient>,
    default_secret_version: Option<String>,
    env: Arc<dyn EnvReader>,
}

impl std::fmt::Debug for SecretManagerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerSource")
            .field("client", &self.client.client_name())
            .field("default_secret_version", &self.default_secret_version)
            .finish_non_exhaustive()
    }
}

impl SecretManagerSource {
    /// Create a source reading name/version indirections from the process environment
    pub fn new(client: impl SecretManagerClient + 'static) -> Self {
        Self::from_arc(Arc::new(client))
    }

    /// Create a source sharing an existing client
    pub fn from_arc(client: Arc<dyn SecretManagerClient>) -> Self {
        Self {
            client,
            default_secret_version: None,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Version used for fields naming a secret without a version
    #[must_use]
    pub fn default_version(mut self, version: impl Into<String>) -> Self {
        self.default_secret_version = Some(version.into());
        self
    }

    /// Environment used for `secret_name_env` / `secret_version_env`
    #[must_use]
    pub fn env_reader(mut self, env: Arc<dyn EnvReader>) -> Self {
        self.env = env;
        self
    }

    /// Walk `schema` and fetch every resolvable secret field
    pub fn resolve(&self, schema: &Schema) -> Resolution {
        SecretResolver::new(self.client.as_ref(), self.env.as_ref())
            .default_version(self.default_secret_version.as_deref())
            .resolve(schema)
    }
}

impl SettingsSource for SecretManagerSource {
    fn name(&self) -> &str {
        "secret_manager"
    }

    fn collect(&self, schema: &Schema) -> Result<SourceOutput> {
        let Resolution {
            values,
            diagnostics,
        } = self.resolve(schema);
        Ok(SourceOutput {
            values: values.into_json(),
            diagnostics,
        })
    }
}
