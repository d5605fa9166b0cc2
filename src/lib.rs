//! # settings-secrets
//!
//! Typed application settings assembled from layered sources, where fields
//! tagged with a secret reference are fetched from a secret manager.
//!
//! ## Features
//!
//! - **Secret fields**: Tag a field with a secret name and version (literal or
//!   read from an environment variable) and it is fetched at load time
//! - **Pluggable backends**: Implement [`SecretManagerClient`] for any secret
//!   store; Google Secret Manager ships behind the `gcp` feature
//! - **Layered sources**: Secret manager, secrets directory, dotenv file,
//!   environment variables and explicit values, merged in priority order
//! - **Nested settings**: Sub-models are walked recursively (`DB__HOST`,
//!   `db.password`)
//! - **Non-fatal diagnostics**: Failed secret lookups never abort a load; they
//!   are logged and returned, and missing required fields are reported by
//!   validation
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Deserialize;
//! use settings_secrets::{
//!     FieldSpec, MapEnv, MemorySecretClient, Schema, SettingsLoader, SettingsSchema,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Debug, Deserialize)]
//! struct DatabaseSettings {
//!     host: String,
//!     port: u16,
//!     password: String,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Settings {
//!     db: DatabaseSettings,
//! }
//!
//! impl SettingsSchema for Settings {
//!     fn schema() -> Schema {
//!         Schema::new().field(FieldSpec::nested(
//!             "db",
//!             Schema::new()
//!                 .field(FieldSpec::text("host"))
//!                 .field(FieldSpec::integer("port").default_value(3306))
//!                 .field(
//!                     FieldSpec::text("password")
//!                         .secret_name("test-db-password")
//!                         .secret_version("v2"),
//!                 ),
//!         ))
//!     }
//! }
//!
//! let client = MemorySecretClient::new().with_secret("test-db-password", "v2", "s3cr3t");
//! let env = MapEnv::new().with("DB__HOST", "localhost");
//!
//! let loaded = SettingsLoader::<Settings>::builder()
//!     .env_nested_delimiter("__")
//!     .env_reader(Arc::new(env))
//!     .with_secret_manager(client)
//!     .build()?
//!     .load()?;
//!
//! assert_eq!(loaded.settings.db.host, "localhost");
//! assert_eq!(loaded.settings.db.port, 3306);
//! assert_eq!(loaded.settings.db.password, "s3cr3t");
//! # Ok::<(), settings_secrets::Error>(())
//! ```
//!
//! ## Secret References
//!
//! Each field may name its secret in four ways:
//!
//! | Key                  | Meaning                                         |
//! |----------------------|-------------------------------------------------|
//! | `secret_name`        | Literal secret name                             |
//! | `secret_name_env`    | Env var holding the name (wins when non-empty)  |
//! | `secret_version`     | Literal version                                 |
//! | `secret_version_env` | Env var holding the version (wins when non-empty) |
//!
//! A field with a name but no version falls back to the default secret
//! version of the source; without one it is skipped with a diagnostic.
//!
//! ## Source Priority
//!
//! Later sources win. The default chain is, lowest first: secret manager,
//! secrets directory, dotenv file, environment, explicit init values. Use
//! [`SettingsLoaderBuilder::customise_sources`] to change it.

// Core modules
mod diagnostics;
mod error;
mod loader;
mod resolver;

// Grouped modules
pub mod client;
pub mod config;
pub mod sources;

// Re-exports from core
pub use diagnostics::{Diagnostic, DiagnosticKind, FieldPath};
pub use error::{Error, FieldError, FieldErrorKind, Result, ValidationErrors};
pub use loader::{Loaded, SettingsLoader, SettingsLoaderBuilder};
pub use resolver::{Resolution, ResolvedMap, ResolvedValue, SecretResolver};

// Re-exports from config
pub use config::{
    EnvReader, FieldConstraints, FieldKind, FieldSpec, MapEnv, ProcessEnv, ResolvedSecretRef,
    Schema, SecretRef, SettingsConfig, SettingsConfigBuilder, SettingsSchema, meta,
};

// Client re-exports (GCP is feature-gated)
#[cfg(feature = "gcp")]
pub use client::GoogleSecretManagerClient;
pub use client::{MemorySecretClient, SecretClientError, SecretManagerClient, from_fn};

// Source re-exports
#[cfg(feature = "dotenv")]
pub use sources::DotenvSource;
pub use sources::{
    EnvSettingsSource, InitSource, SecretManagerSource, SecretsDirSource, SettingsSource,
    SourceOutput,
};

// Derive macro re-export (requires `derive` feature)
/// Derive macro for generating `SettingsSchema` implementations.
///
/// # Example
///
/// ```rust,ignore
/// use settings_secrets::DeriveSettingsSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, DeriveSettingsSchema)]
/// struct Settings {
///     #[setting(secret_name = "test-db-password", secret_version = "v2")]
///     password: String,
///     #[setting(default = 3306, min = 1, max = 65535)]
///     port: u16,
/// }
/// ```
#[cfg(feature = "derive")]
pub use settings_secrets_derive::SettingsSchema as DeriveSettingsSchema;
