//! Settings sources
//!
//! A source turns something outside the program (explicit values, the process
//! environment, a dotenv file, a secrets directory, a secret manager) into a
//! JSON object keyed by field name. The loader collects sources in order and
//! deep-merges their objects; later sources win.
//!
//! Sources do not coerce types: they hand over strings (or parsed JSON for
//! complex fields) and let the loader validate against the schema.

#[cfg(feature = "dotenv")]
mod dotenv;
mod env;
mod init;
mod secret_manager;
mod secrets_dir;

#[cfg(feature = "dotenv")]
pub use dotenv::DotenvSource;
pub use env::EnvSettingsSource;
pub use init::InitSource;
pub use secret_manager::SecretManagerSource;
pub use secrets_dir::SecretsDirSource;

use serde_json::{Map, Value};

use crate::config::Schema;
use crate::diagnostics::Diagnostic;
use crate::error::Result;

/// Values and diagnostics produced by one source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceOutput {
    pub values: Map<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceOutput {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            values,
            diagnostics: Vec::new(),
        }
    }
}

/// Trait for pluggable settings sources
pub trait SettingsSource: Send + Sync {
    /// Source name for logging/debugging
    fn name(&self) -> &str;

    /// Produce this source's values for `schema`
    ///
    /// # Errors
    ///
    /// Returns an error only for problems that make the source itself
    /// unusable (unreadable file, malformed dotenv). Missing or unresolvable
    /// values are simply absent, optionally with a diagnostic.
    fn collect(&self, schema: &Schema) -> Result<SourceOutput>;
}
