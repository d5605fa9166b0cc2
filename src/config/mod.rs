//! Core configuration types and traits
//!
//! This module contains the foundational types for settings resolution:
//! - `Schema` / `FieldSpec` - Ordered, typed description of a settings struct
//! - `SettingsSchema` - Trait exposing the schema of a settings struct
//! - `SecretRef` - Typed secret name/version reference attached to a field
//! - `SettingsConfig` - Configuration of the default source chain

mod schema;
mod secret_ref;
mod types;

pub use schema::{FieldConstraints, FieldKind, FieldSpec, Schema, SettingsSchema, meta};

pub use secret_ref::{ResolvedSecretRef, SecretRef};

pub use types::{EnvReader, MapEnv, ProcessEnv, SettingsConfig, SettingsConfigBuilder};
