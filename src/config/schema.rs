//! Settings schema: an ordered tree of typed fields
//!
//! # Overview
//!
//! A [`Schema`] describes the shape of a settings struct the way the loader
//! and the sources need to see it:
//!
//! - **Ordered fields**: declaration order is kept; sources and secret lookups
//!   walk fields in that order
//! - **Typed kinds**: each field has a [`FieldKind`] used for lax coercion of
//!   string inputs (environment, dotenv, secrets)
//! - **Nested schemas**: a field of kind [`FieldKind::Nested`] carries the
//!   schema of its sub-model
//! - **Secret side table**: a field may carry a [`SecretRef`] telling the
//!   secret manager source where its value lives
//!
//! ```rust
//! use settings_secrets::{FieldSpec, Schema};
//!
//! let database = Schema::new()
//!     .field(FieldSpec::text("host"))
//!     .field(FieldSpec::integer("port").default_value(3306).min(1.0).max(65535.0))
//!     .field(
//!         FieldSpec::text("password")
//!             .secret_name("test-db-password")
//!             .secret_version("v2"),
//!     );
//!
//! let schema = Schema::new()
//!     .field(
//!         FieldSpec::text("var1")
//!             .secret_name("test-secret")
//!             .secret_version_env("VAR1_SECRET_VERSION"),
//!     )
//!     .field(FieldSpec::nested("db", database));
//!
//! assert!(schema.validate_definition().is_ok());
//! assert_eq!(schema.secret_fields().len(), 2);
//! ```
//!
//! # Metadata Keys
//!
//! Besides the typed [`SecretRef`], every field keeps a free-form metadata
//! map for application use (`description`, `label`, ...). The four keys the
//! secret source understands are listed in [`meta`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

use super::secret_ref::SecretRef;
use crate::diagnostics::FieldPath;
use crate::error::{Error, Result};

// =============================================================================
// Well-known Metadata Keys
// =============================================================================

/// Metadata keys recognised by the secret manager source.
///
/// All four are optional. A field without a resolvable secret name is not a
/// secret field and is left to the other sources.
pub mod meta {
    /// Literal secret name
    pub const SECRET_NAME: &str = "secret_name";
    /// Environment variable supplying (and overriding) the secret name
    pub const SECRET_NAME_ENV: &str = "secret_name_env";
    /// Literal secret version
    pub const SECRET_VERSION: &str = "secret_version";
    /// Environment variable supplying (and overriding) the secret version
    pub const SECRET_VERSION_ENV: &str = "secret_version_env";
    /// Help text, used by the derive macro
    pub const DESCRIPTION: &str = "description";
}

// =============================================================================
// Field Kinds
// =============================================================================

/// Declared type of a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 string
    #[default]
    Text,
    /// Signed or unsigned integer
    Integer,
    /// Floating point number
    Number,
    /// Boolean
    Toggle,
    /// JSON array
    List,
    /// Any JSON document (maps, tuples, ...)
    Json,
    /// Sub-model with its own schema
    Nested(Schema),
}

impl FieldKind {
    /// Complex fields are read as JSON by the sources and are never secret targets.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        matches!(self, FieldKind::List | FieldKind::Json | FieldKind::Nested(_))
    }

    /// Nested schema, if this is a sub-model
    #[must_use]
    pub fn nested(&self) -> Option<&Schema> {
        match self {
            FieldKind::Nested(schema) => Some(schema),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Toggle => "boolean",
            FieldKind::List => "list",
            FieldKind::Json => "json",
            FieldKind::Nested(_) => "object",
        }
    }

    /// Coerce a raw value into this kind (lax mode)
    ///
    /// Strings coming from the environment, dotenv files, secret files or the
    /// secret manager are parsed into the declared type.
    pub fn coerce(&self, value: Value) -> std::result::Result<Value, String> {
        let invalid = || format!("Input should be a valid {}", self.type_name());
        match self {
            FieldKind::Text => match value {
                Value::String(_) => Ok(value),
                _ => Err(invalid()),
            },
            FieldKind::Integer => match &value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
                Value::Number(n) => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Value::from(f as i64))
                    }
                    _ => Err(invalid()),
                },
                Value::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .map(Value::from)
                        .or_else(|_| s.parse::<u64>().map(Value::from))
                        .map_err(|_| invalid())
                }
                _ => Err(invalid()),
            },
            FieldKind::Number => match &value {
                Value::Number(_) => Ok(value),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
            FieldKind::Toggle => match &value {
                Value::Bool(_) => Ok(value),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err(invalid()),
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                    "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            FieldKind::List => match value {
                Value::Array(_) => Ok(value),
                Value::String(s) => match serde_json::from_str::<Value>(&s) {
                    Ok(parsed @ Value::Array(_)) => Ok(parsed),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            FieldKind::Json => match value {
                Value::String(s) => Ok(serde_json::from_str(&s).unwrap_or(Value::String(s))),
                other => Ok(other),
            },
            FieldKind::Nested(_) => match value {
                Value::Object(_) => Ok(value),
                Value::String(s) => match serde_json::from_str::<Value>(&s) {
                    Ok(parsed @ Value::Object(_)) => Ok(parsed),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
        }
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// Value constraints checked after coercion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FieldConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regex pattern for text fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

// =============================================================================
// Field Spec
// =============================================================================

/// Definition of a single settings field
///
/// A field without `default` is required: if no source supplies it the
/// loader reports it as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Where to fetch this field from the secret manager, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretRef>,

    #[serde(flatten)]
    pub constraints: FieldConstraints,

    /// Developer-defined custom metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl FieldSpec {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a field of the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            secret: None,
            constraints: FieldConstraints::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn toggle(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Toggle)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json)
    }

    /// Create a sub-model field
    pub fn nested(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    /// Set the default value, making the field optional
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept `null` and default to it (for `Option<T>` fields)
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.default = Some(Value::Null);
        self
    }

    /// Default a nested field to an empty object so its own defaults apply
    #[must_use]
    pub fn default_empty(mut self) -> Self {
        self.default = Some(json!({}));
        self
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    // =========================================================================
    // Secret reference (typed side table)
    // =========================================================================

    /// Attach a full secret reference
    #[must_use]
    pub fn secret(mut self, secret: SecretRef) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Literal secret name
    #[must_use]
    pub fn secret_name(mut self, name: impl Into<String>) -> Self {
        self.secret.get_or_insert_with(SecretRef::default).secret_name = Some(name.into());
        self
    }

    /// Environment variable holding the secret name
    #[must_use]
    pub fn secret_name_env(mut self, var: impl Into<String>) -> Self {
        self.secret.get_or_insert_with(SecretRef::default).secret_name_env = Some(var.into());
        self
    }

    /// Literal secret version
    #[must_use]
    pub fn secret_version(mut self, version: impl Into<String>) -> Self {
        self.secret.get_or_insert_with(SecretRef::default).secret_version = Some(version.into());
        self
    }

    /// Environment variable holding the secret version
    #[must_use]
    pub fn secret_version_env(mut self, var: impl Into<String>) -> Self {
        self.secret
            .get_or_insert_with(SecretRef::default)
            .secret_version_env = Some(var.into());
        self
    }

    // =========================================================================
    // Constraint setters (builder pattern)
    // =========================================================================

    #[must_use]
    pub fn min(mut self, val: f64) -> Self {
        self.constraints.min = Some(val);
        self
    }

    #[must_use]
    pub fn max(mut self, val: f64) -> Self {
        self.constraints.max = Some(val);
        self
    }

    /// Set regex pattern for validation
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    // =========================================================================
    // Dynamic metadata methods
    // =========================================================================

    /// Add custom string metadata
    ///
    /// The secret keys from [`meta`] are routed into the typed secret
    /// reference instead of the free-form map.
    #[must_use]
    pub fn meta_str(self, key: &str, value: impl Into<String>) -> Self {
        match key {
            meta::SECRET_NAME => self.secret_name(value),
            meta::SECRET_NAME_ENV => self.secret_name_env(value),
            meta::SECRET_VERSION => self.secret_version(value),
            meta::SECRET_VERSION_ENV => self.secret_version_env(value),
            _ => self.meta(key, Value::String(value.into())),
        }
    }

    /// Add custom boolean metadata
    #[must_use]
    pub fn meta_bool(self, key: &str, value: bool) -> Self {
        self.meta(key, Value::Bool(value))
    }

    /// Add custom JSON metadata
    #[must_use]
    pub fn meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Get metadata value as string
    pub fn get_meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Coerce a supplied value into this field's kind
    pub fn coerce(&self, value: Value) -> std::result::Result<Value, String> {
        if value.is_null() && self.default == Some(Value::Null) {
            return Ok(value);
        }
        self.kind.coerce(value)
    }

    /// Validate an already coerced value against this field's constraints
    ///
    /// Checks:
    /// - Number range (min/max)
    /// - Regex pattern for text
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self.kind {
            FieldKind::Integer | FieldKind::Number => {
                let Some(num) = value.as_f64() else {
                    return Ok(());
                };
                if let Some(min) = self.constraints.min {
                    if num < min {
                        return Err(format!("Value must be at least {min}"));
                    }
                }
                if let Some(max) = self.constraints.max {
                    if num > max {
                        return Err(format!("Value must be at most {max}"));
                    }
                }
            }
            FieldKind::Text => {
                if let (Some(pattern), Some(text)) = (&self.constraints.pattern, value.as_str()) {
                    let re = regex::Regex::new(pattern)
                        .map_err(|e| format!("Invalid regex pattern: {e}"))?;

                    if !re.is_match(text) {
                        return Err(format!("Value does not match pattern: {pattern}"));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate the field definition itself
    ///
    /// - name is not empty
    /// - min <= max
    /// - pattern is a valid, non-empty regex
    /// - default value satisfies the kind and constraints
    pub fn validate_definition(&self) -> std::result::Result<(), String> {
        if self.name.is_empty() {
            return Err("Field name cannot be empty".to_string());
        }

        if let (Some(min), Some(max)) = (self.constraints.min, self.constraints.max) {
            if min > max {
                return Err(format!("min ({min}) cannot be greater than max ({max})"));
            }
        }

        if let Some(ref pattern) = self.constraints.pattern {
            if pattern.is_empty() {
                return Err("Pattern cannot be empty string".to_string());
            }
            regex::Regex::new(pattern).map_err(|e| format!("Invalid regex pattern: {e}"))?;
        }

        if let Some(default) = &self.default {
            // Nested defaults are partial objects; their fields are checked on load
            if !matches!(self.kind, FieldKind::Nested(_)) {
                let value = self
                    .coerce(default.clone())
                    .map_err(|e| format!("Default value is invalid: {e}"))?;
                self.validate(&value)
                    .map_err(|e| format!("Default value is invalid: {e}"))?;
            }
        }

        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Ordered collection of fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder style)
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field in place
    pub fn push(&mut self, field: FieldSpec) {
        self.fields.push(field);
    }

    /// Look up a top-level field by name
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Paths of all leaf fields carrying a secret reference, in declaration order
    #[must_use]
    pub fn secret_fields(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        self.collect_secret_fields(&FieldPath::root(), &mut out);
        out
    }

    fn collect_secret_fields(&self, parent: &FieldPath, out: &mut Vec<FieldPath>) {
        for field in &self.fields {
            match &field.kind {
                FieldKind::Nested(inner) => {
                    inner.collect_secret_fields(&parent.child(&field.name), out);
                }
                kind if !kind.is_complex() && field.secret.is_some() => {
                    out.push(parent.child(&field.name));
                }
                _ => {}
            }
        }
    }

    /// Validate the whole schema definition, recursing into nested schemas
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] naming the first offending field.
    pub fn validate_definition(&self) -> Result<()> {
        self.validate_at(&FieldPath::root())
    }

    fn validate_at(&self, parent: &FieldPath) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            let path = parent.child(&field.name);
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidSchema {
                    field: path.to_string(),
                    reason: "duplicate field name".to_string(),
                });
            }
            field
                .validate_definition()
                .map_err(|reason| Error::InvalidSchema {
                    field: path.to_string(),
                    reason,
                })?;
            if let FieldKind::Nested(inner) = &field.kind {
                inner.validate_at(&path)?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// =============================================================================
// Settings Schema Trait
// =============================================================================

/// Trait for settings structs that expose their schema
///
/// Implement it by hand or with `#[derive(SettingsSchema)]` (feature `derive`).
pub trait SettingsSchema: DeserializeOwned {
    /// Field tree of this settings type, in declaration order
    fn schema() -> Schema;
}

// =============================================================================
// Tests
// =============================================================================
