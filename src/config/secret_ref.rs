//! Secret references attached to schema fields
//!
//! A [`SecretRef`] names a secret and its version, each either given as a
//! literal or looked up through an environment variable when settings are
//! resolved. Nothing is cached: every resolution reads the environment again.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::schema::meta;
use super::types::EnvReader;

/// Where a field's value lives in the secret manager
///
/// ```rust
/// use settings_secrets::{MapEnv, SecretRef};
///
/// let secret = SecretRef::named("test-secret").version_from_env("VAR1_SECRET_VERSION");
/// let env = MapEnv::new().with("VAR1_SECRET_VERSION", "v5");
///
/// let resolved = secret.resolve(&env, Some("latest"));
/// assert_eq!(resolved.name.as_deref(), Some("test-secret"));
/// assert_eq!(resolved.version.as_deref(), Some("v5"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_version_env: Option<String>,
}

/// Name and version after environment indirection and defaulting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSecretRef {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl SecretRef {
    /// Reference with a literal secret name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            secret_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Reference whose name comes from an environment variable
    pub fn name_from_env(var: impl Into<String>) -> Self {
        Self {
            secret_name_env: Some(var.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.secret_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn version_from_env(mut self, var: impl Into<String>) -> Self {
        self.secret_version_env = Some(var.into());
        self
    }

    /// Build a reference from a generic metadata map
    ///
    /// Reads the string values of the keys in [`meta`]; anything else is
    /// ignored. Returns `None` when none of the secret keys is present.
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Option<Self> {
        let get = |key: &str| metadata.get(key).and_then(Value::as_str).map(String::from);
        let secret = Self {
            secret_name: get(meta::SECRET_NAME),
            secret_name_env: get(meta::SECRET_NAME_ENV),
            secret_version: get(meta::SECRET_VERSION),
            secret_version_env: get(meta::SECRET_VERSION_ENV),
        };
        (secret != Self::default()).then_some(secret)
    }

    /// Resolve name and version against the environment
    ///
    /// An environment variable wins over the literal only when it is set and
    /// non-empty. A missing version falls back to `default_version`. Empty
    /// strings are treated as unset throughout.
    pub fn resolve(&self, env: &dyn EnvReader, default_version: Option<&str>) -> ResolvedSecretRef {
        let name = pick(
            self.secret_name.as_deref(),
            self.secret_name_env.as_deref(),
            env,
        );
        let version = pick(
            self.secret_version.as_deref(),
            self.secret_version_env.as_deref(),
            env,
        )
        .or_else(|| non_empty(default_version).map(String::from));

        ResolvedSecretRef { name, version }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn pick(literal: Option<&str>, env_var: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    non_empty(env_var)
        .and_then(|var| env.var(var))
        .filter(|v| !v.is_empty())
        .or_else(|| non_empty(literal).map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;
    use serde_json::json;

    #[test]
    fn test_literal_name_and_version() {
        let secret = SecretRef::named("db-pw").version("v2");
        let resolved = secret.resolve(&MapEnv::new(), None);

        assert_eq!(resolved.name.as_deref(), Some("db-pw"));
        assert_eq!(resolved.version.as_deref(), Some("v2"));
    }

    #[test]
    fn test_env_overrides_literal() {
        let secret = SecretRef {
            secret_name: Some("literal-name".into()),
            secret_name_env: Some("NAME_VAR".into()),
            secret_version: Some("v1".into()),
            secret_version_env: Some("VERSION_VAR".into()),
        };
        let env = MapEnv::new()
            .with("NAME_VAR", "env-name")
            .with("VERSION_VAR", "v9");

        let resolved = secret.resolve(&env, None);
        assert_eq!(resolved.name.as_deref(), Some("env-name"));
        assert_eq!(resolved.version.as_deref(), Some("v9"));
    }

    #[test]
    fn test_empty_or_unset_env_keeps_literal() {
        let secret = SecretRef {
            secret_name: Some("literal-name".into()),
            secret_name_env: Some("NAME_VAR".into()),
            secret_version: Some("v1".into()),
            secret_version_env: Some("VERSION_VAR".into()),
        };
        let env = MapEnv::new().with("NAME_VAR", "");

        let resolved = secret.resolve(&env, None);
        assert_eq!(resolved.name.as_deref(), Some("literal-name"));
        assert_eq!(resolved.version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_default_version_fallback() {
        let secret = SecretRef::named("test-secret").version_from_env("UNSET");

        let resolved = secret.resolve(&MapEnv::new(), Some("latest"));
        assert_eq!(resolved.version.as_deref(), Some("latest"));

        let resolved = secret.resolve(&MapEnv::new(), None);
        assert_eq!(resolved.version, None);

        let resolved = secret.resolve(&MapEnv::new(), Some(""));
        assert_eq!(resolved.version, None);
    }

    #[test]
    fn test_name_only_from_unset_env() {
        let secret = SecretRef::name_from_env("VAR2_SECRET_NAME");
        let resolved = secret.resolve(&MapEnv::new(), Some("latest"));

        assert_eq!(resolved.name, None);
        assert_eq!(resolved.version.as_deref(), Some("latest"));
    }

    #[test]
    fn test_empty_literal_is_unset() {
        let secret = SecretRef::named("").version("");
        let resolved = secret.resolve(&MapEnv::new(), None);
        assert_eq!(resolved, ResolvedSecretRef::default());
    }

    #[test]
    fn test_from_metadata() {
        let metadata: HashMap<String, Value> = [
            ("secret_name".to_string(), json!("test-secret")),
            ("secret_version_env".to_string(), json!("VAR1_SECRET_VERSION")),
            ("label".to_string(), json!("Var 1")),
        ]
        .into_iter()
        .collect();

        let secret = SecretRef::from_metadata(&metadata).unwrap();
        assert_eq!(secret.secret_name.as_deref(), Some("test-secret"));
        assert_eq!(
            secret.secret_version_env.as_deref(),
            Some("VAR1_SECRET_VERSION")
        );
        assert_eq!(secret.secret_version, None);

        let unrelated: HashMap<String, Value> =
            [("label".to_string(), json!("x"))].into_iter().collect();
        assert!(SecretRef::from_metadata(&unrelated).is_none());
    }
}
