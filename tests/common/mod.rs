//! Common test utilities for settings-secrets integration tests
//!
//! Provides the shared settings fixtures and helper functions.

#![allow(dead_code)]

use serde::Deserialize;
use settings_secrets::{FieldSpec, MapEnv, Schema, SettingsSchema};
use std::sync::Arc;

// =============================================================================
// Test Settings Schema
// =============================================================================

pub const SECRET_VALUE: &str = "test-value-from-secret-manager";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SomeEnum {
    pub variable1: (String, String),
}

impl SettingsSchema for SomeEnum {
    fn schema() -> Schema {
        Schema::new().field(FieldSpec::json("variable1").default_value(vec!["foo", "bar"]))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    pub name: String,
    pub host: String,
    pub user: String,
    pub port: u16,
    pub password: String,
}

impl SettingsSchema for DatabaseSettings {
    fn schema() -> Schema {
        Schema::new()
            .field(FieldSpec::text("name"))
            .field(FieldSpec::text("host"))
            .field(FieldSpec::text("user"))
            .field(FieldSpec::integer("port").default_value(3306))
            .field(
                FieldSpec::text("password")
                    .secret_name("test-db-password")
                    .secret_version("v2"),
            )
    }
}

/// Settings with literal, env-indirected and nested secret fields
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub var1: String,
    pub var2: String,
    pub db: DatabaseSettings,
    pub some_enum: SomeEnum,
}

impl SettingsSchema for Settings {
    fn schema() -> Schema {
        Schema::new()
            .field(
                FieldSpec::text("var1")
                    .secret_name("test-secret")
                    .secret_version_env("VAR1_SECRET_VERSION"),
            )
            .field(FieldSpec::text("var2").secret_name_env("VAR2_SECRET_NAME"))
            .field(FieldSpec::nested("db", DatabaseSettings::schema()))
            .field(FieldSpec::nested("some_enum", SomeEnum::schema()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// The environment every workflow test starts from
pub fn test_env() -> MapEnv {
    MapEnv::new()
        .with("DB__HOST", "test-db-host")
        .with("DB__NAME", "test-db-name")
        .with("DB__USER", "test-db-user")
        .with("VAR1_SECRET_VERSION", "v5")
        .with("VAR2_SECRET_NAME", "test-var2-secret-name")
}

pub fn shared(env: MapEnv) -> Arc<MapEnv> {
    Arc::new(env)
}

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
