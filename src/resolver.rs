//! Secret field walker
//!
//! Walks a [`Schema`] in declaration order and fetches every secret-tagged
//! leaf field from a [`SecretManagerClient`]. The result is a typed tree of
//! resolved values plus the diagnostics of every field that could not be
//! resolved. The walk itself never fails.
//!
//! - Nested fields are always recursed into and their (possibly empty)
//!   result is stored under the field name; they are never secret targets.
//!   An optional nested field with nothing resolved is left out, so it can
//!   still load as `None`.
//! - Other complex fields (lists, JSON) are skipped.
//! - Leaf fields with a resolvable name and version are fetched; a client
//!   error becomes a [`DiagnosticKind::SecretFetchFailed`].
//! - A name without any version becomes a
//!   [`DiagnosticKind::SecretVersionMissing`].
//! - Fields without a resolvable name are not secret fields.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::client::SecretManagerClient;
use crate::config::{EnvReader, FieldKind, Schema};
use crate::diagnostics::{Diagnostic, DiagnosticKind, FieldPath};

// =============================================================================
// Resolved values
// =============================================================================

/// A resolved secret or a nested mapping of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    Leaf(String),
    Nested(ResolvedMap),
}

impl ResolvedValue {
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ResolvedValue::Leaf(value) => Some(value),
            ResolvedValue::Nested(_) => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&ResolvedMap> {
        match self {
            ResolvedValue::Nested(map) => Some(map),
            ResolvedValue::Leaf(_) => None,
        }
    }

    fn into_json(self) -> Value {
        match self {
            ResolvedValue::Leaf(value) => Value::String(value),
            ResolvedValue::Nested(map) => Value::Object(map.into_json()),
        }
    }
}

/// Field name to resolved value; absent keys are left to other sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMap(HashMap<String, ResolvedValue>);

impl ResolvedMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: ResolvedValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.0.get(name)
    }

    /// Resolved secret of a leaf field at `path` (e.g. `["db", "password"]`)
    pub fn leaf(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut map = self;
        for segment in parents {
            map = map.get(segment)?.as_nested()?;
        }
        map.get(last)?.as_leaf()
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedValue)> {
        self.0.iter()
    }

    /// Convert into a JSON object for merging with other sources
    #[must_use]
    pub fn into_json(self) -> Map<String, Value> {
        self.0
            .into_iter()
            .map(|(name, value)| (name, value.into_json()))
            .collect()
    }
}

/// Outcome of one walk: resolved values and diagnostics, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub values: ResolvedMap,
    pub diagnostics: Vec<Diagnostic>,
}

// =============================================================================
// Walker
// =============================================================================

/// Walks a schema and fetches secret-tagged fields
pub struct SecretResolver<'a> {
    client: &'a dyn SecretManagerClient,
    env: &'a dyn EnvReader,
    default_version: Option<&'a str>,
}

impl<'a> SecretResolver<'a> {
    pub fn new(client: &'a dyn SecretManagerClient, env: &'a dyn EnvReader) -> Self {
        Self {
            client,
            env,
            default_version: None,
        }
    }

    /// Version used when a field names a secret but no version
    #[must_use]
    pub fn default_version(mut self, version: Option<&'a str>) -> Self {
        self.default_version = version;
        self
    }

    /// Walk `schema` once, fetching every resolvable secret
    pub fn resolve(&self, schema: &Schema) -> Resolution {
        let mut diagnostics = Vec::new();
        let values = self.walk(schema, &FieldPath::root(), &mut diagnostics);
        Resolution {
            values,
            diagnostics,
        }
    }

    fn walk(
        &self,
        schema: &Schema,
        parent: &FieldPath,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ResolvedMap {
        let mut values = ResolvedMap::new();

        for field in schema {
            let path = parent.child(&field.name);

            if field.kind.is_complex() {
                if let FieldKind::Nested(inner) = &field.kind {
                    let nested = self.walk(inner, &path, diagnostics);
                    if nested.is_empty() && field.default == Some(Value::Null) {
                        continue;
                    }
                    values.insert(&field.name, ResolvedValue::Nested(nested));
                }
                continue;
            }

            let Some(secret) = &field.secret else {
                continue;
            };
            let resolved = secret.resolve(self.env, self.default_version);

            match (resolved.name, resolved.version) {
                (Some(name), Some(version)) => match self.client.get_secret(&name, &version) {
                    Ok(value) => {
                        log::debug!(
                            "Resolved '{path}' from secret '{name}' version '{version}' ({})",
                            self.client.client_name()
                        );
                        values.insert(&field.name, ResolvedValue::Leaf(value));
                    }
                    Err(e) => diagnostics.push(Diagnostic::new(
                        path,
                        DiagnosticKind::SecretFetchFailed {
                            secret_name: name,
                            secret_version: version,
                            reason: e.to_string(),
                        },
                    )),
                },
                (Some(name), None) => diagnostics.push(Diagnostic::new(
                    path,
                    DiagnosticKind::SecretVersionMissing { secret_name: name },
                )),
                (None, _) => {}
            }
        }

        values
    }
}

// =============================================================================
// Tests
// =============================================================================
