//! Tests for #[derive(DeriveSettingsSchema)]

mod common;

use common::{SECRET_VALUE, shared};
use serde::Deserialize;
use serde_json::json;
use settings_secrets::{
    DeriveSettingsSchema, FieldKind, MapEnv, SettingsLoader, SettingsSchema, from_fn, meta,
};
use std::collections::HashMap;

#[derive(Debug, Deserialize, DeriveSettingsSchema)]
struct Variables {
    #[setting(default = vec!["foo", "bar"])]
    variable1: (String, String),
}

#[derive(Debug, Deserialize, DeriveSettingsSchema)]
struct Database {
    host: String,

    #[setting(default = 3306, min = 1, max = 65535)]
    port: u16,

    #[setting(
        secret_name = "test-db-password",
        secret_version = "v2",
        description = "Database password"
    )]
    password: String,
}

#[derive(Debug, Deserialize, DeriveSettingsSchema)]
struct AppSettings {
    #[setting(secret_name = "test-secret", secret_version_env = "VAR1_SECRET_VERSION")]
    var1: String,

    #[setting(secret_name_env = "VAR2_SECRET_NAME")]
    var2: String,

    db: Database,

    #[setting(default)]
    some_enum: Variables,

    #[serde(rename = "log-level")]
    #[setting(default = "info", pattern = "^(debug|info|warn|error)$")]
    log_level: String,

    nickname: Option<String>,

    tags: Vec<String>,

    labels: HashMap<String, String>,

    ratio: f64,

    verbose: bool,

    #[serde(skip)]
    #[setting(skip)]
    runtime_only: u32,
}

#[test]
fn test_derived_schema_shape() {
    let schema = AppSettings::schema();

    let names: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "var1", "var2", "db", "some_enum", "log-level", "nickname", "tags", "labels",
            "ratio", "verbose"
        ]
    );

    assert_eq!(schema.get("var1").unwrap().kind, FieldKind::Text);
    assert_eq!(schema.get("tags").unwrap().kind, FieldKind::List);
    assert_eq!(schema.get("labels").unwrap().kind, FieldKind::Json);
    assert_eq!(schema.get("ratio").unwrap().kind, FieldKind::Number);
    assert_eq!(schema.get("verbose").unwrap().kind, FieldKind::Toggle);
    assert!(schema.get("db").unwrap().kind.nested().is_some());
    assert!(schema.validate_definition().is_ok());
}

#[test]
fn test_derived_secret_refs() {
    let schema = AppSettings::schema();

    let var1 = schema.get("var1").unwrap().secret.as_ref().unwrap();
    assert_eq!(var1.secret_name.as_deref(), Some("test-secret"));
    assert_eq!(var1.secret_version_env.as_deref(), Some("VAR1_SECRET_VERSION"));

    let var2 = schema.get("var2").unwrap().secret.as_ref().unwrap();
    assert_eq!(var2.secret_name_env.as_deref(), Some("VAR2_SECRET_NAME"));
    assert!(var2.secret_name.is_none());

    let paths: Vec<String> = schema.secret_fields().iter().map(ToString::to_string).collect();
    assert_eq!(paths, vec!["var1", "var2", "db.password"]);
}

#[test]
fn test_derived_defaults_and_constraints() {
    let schema = AppSettings::schema();

    let db = schema.get("db").unwrap().kind.nested().unwrap();
    let port = db.get("port").unwrap();
    assert_eq!(port.default, Some(json!(3306)));
    assert_eq!(port.constraints.min, Some(1.0));
    assert_eq!(port.constraints.max, Some(65535.0));
    assert_eq!(
        db.get("password").unwrap().get_meta_str(meta::DESCRIPTION),
        Some("Database password")
    );

    assert_eq!(schema.get("some_enum").unwrap().default, Some(json!({})));
    assert_eq!(schema.get("nickname").unwrap().default, Some(json!(null)));
    assert!(schema.get("db").unwrap().is_required());
}

#[test]
fn test_load_derived_settings() {
    let env = MapEnv::new()
        .with("DB__HOST", "test-db-host")
        .with("VAR1_SECRET_VERSION", "v5")
        .with("VAR2_SECRET_NAME", "test-var2-secret-name")
        .with("TAGS", r#"["a", "b"]"#)
        .with("LABELS", r#"{"team": "core"}"#)
        .with("RATIO", "0.5")
        .with("VERBOSE", "yes");

    let settings = SettingsLoader::<AppSettings>::builder()
        .env_nested_delimiter("__")
        .env_reader(shared(env))
        .with_secret_manager(from_fn(|_, _| Ok(SECRET_VALUE.to_string())))
        .default_secret_version("latest")
        .build()
        .unwrap()
        .load()
        .unwrap()
        .settings;

    assert_eq!(settings.var1, SECRET_VALUE);
    assert_eq!(settings.var2, SECRET_VALUE);
    assert_eq!(settings.db.host, "test-db-host");
    assert_eq!(settings.db.port, 3306);
    assert_eq!(settings.db.password, SECRET_VALUE);
    assert_eq!(settings.some_enum.variable1.0, "foo");
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.nickname, None);
    assert_eq!(settings.tags, vec!["a", "b"]);
    assert_eq!(settings.labels["team"], "core");
    assert_eq!(settings.ratio, 0.5);
    assert!(settings.verbose);
    assert_eq!(settings.runtime_only, 0);
}
