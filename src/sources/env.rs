//! Environment variable source
//!
//! Maps variables to fields by name: `{prefix}{field}` for top-level fields
//! and `{prefix}{field}{delimiter}{sub_field}` for nested ones when a nested
//! delimiter is configured. Names are matched case-insensitively unless the
//! source is case sensitive. Complex fields (nested, lists, JSON) may be
//! given as one JSON document; nested variables are merged over it.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::{SettingsSource, SourceOutput};
use crate::config::{EnvReader, FieldKind, FieldSpec, ProcessEnv, Schema, SettingsConfig};
use crate::error::Result;
use crate::loader::merge::deep_merge;

/// Name matching rules shared by the env and dotenv sources
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvMatcher {
    prefix: String,
    nested_delimiter: Option<String>,
    case_sensitive: bool,
}

impl EnvMatcher {
    pub(crate) fn new(
        prefix: impl Into<String>,
        nested_delimiter: Option<String>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            nested_delimiter,
            case_sensitive,
        }
    }

    pub(crate) fn from_config(config: &SettingsConfig) -> Self {
        Self {
            prefix: config.env_prefix.clone(),
            nested_delimiter: config.env_nested_delimiter.clone(),
            case_sensitive: config.case_sensitive,
        }
    }

    fn normalize(&self, key: &str) -> String {
        if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        }
    }

    /// Index variables by normalized name
    ///
    /// When several names fold to the same key (`VAR1` and `var1` without
    /// case sensitivity), the one already spelled like the key wins, then the
    /// lexicographically smallest name. The result does not depend on the
    /// order of `vars`.
    pub(crate) fn index<V>(&self, vars: Vec<(String, V)>) -> HashMap<String, V> {
        let mut index: HashMap<String, (String, V)> = HashMap::new();
        for (name, value) in vars {
            match index.entry(self.normalize(&name)) {
                Entry::Vacant(slot) => {
                    slot.insert((name, value));
                }
                Entry::Occupied(mut slot) => {
                    let key = slot.key();
                    let rank = |n: &str| (n != key.as_str(), n.to_string());
                    if rank(&name) < rank(&slot.get().0) {
                        slot.insert((name, value));
                    }
                }
            }
        }
        index
            .into_iter()
            .map(|(key, (_, value))| (key, value))
            .collect()
    }

    /// Normalized key of a top-level field
    pub(crate) fn key_for(&self, field: &str) -> String {
        format!("{}{}", self.normalize(&self.prefix), self.normalize(field))
    }

    /// Collect values for every field of `schema` found in `vars`
    pub(crate) fn collect(
        &self,
        schema: &Schema,
        vars: &HashMap<String, String>,
    ) -> Map<String, Value> {
        self.collect_fields(schema, &self.normalize(&self.prefix), vars)
    }

    fn collect_fields(
        &self,
        schema: &Schema,
        key_prefix: &str,
        vars: &HashMap<String, String>,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for field in schema {
            let key = format!("{key_prefix}{}", self.normalize(&field.name));
            let direct = vars.get(&key).map(|raw| explode(field, raw));

            let nested = match (&field.kind, &self.nested_delimiter) {
                (FieldKind::Nested(inner), Some(delimiter)) => {
                    let sub = self.collect_fields(inner, &format!("{key}{delimiter}"), vars);
                    (!sub.is_empty()).then_some(sub)
                }
                _ => None,
            };

            let value = match (direct, nested) {
                (None, None) => continue,
                (Some(value), None) => value,
                (None, Some(sub)) => Value::Object(sub),
                (Some(Value::Object(mut base)), Some(sub)) => {
                    deep_merge(&mut base, sub);
                    Value::Object(base)
                }
                (Some(_), Some(sub)) => Value::Object(sub),
            };
            out.insert(field.name.clone(), value);
        }

        out
    }
}

/// Raw variable value as handed to the loader
fn explode(field: &FieldSpec, raw: &str) -> Value {
    if field.kind.is_complex() {
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    } else {
        Value::String(raw.to_string())
    }
}

/// Settings from environment variables
pub struct EnvSettingsSource {
    matcher: EnvMatcher,
    reader: Arc<dyn EnvReader>,
}

impl EnvSettingsSource {
    /// Read the process environment without prefix or nested delimiter
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: EnvMatcher::default(),
            reader: Arc::new(ProcessEnv),
        }
    }

    /// Use the prefix, delimiter, case rule and reader of `config`
    #[must_use]
    pub fn from_config(config: &SettingsConfig) -> Self {
        Self {
            matcher: EnvMatcher::from_config(config),
            reader: config.env_reader.clone(),
        }
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.matcher.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn nested_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.matcher.nested_delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.matcher.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn reader(mut self, reader: Arc<dyn EnvReader>) -> Self {
        self.reader = reader;
        self
    }
}

impl Default for EnvSettingsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsSource for EnvSettingsSource {
    fn name(&self) -> &str {
        "env"
    }

    fn collect(&self, schema: &Schema) -> Result<SourceOutput> {
        let vars = self.matcher.index(self.reader.vars());
        let values = self.matcher.collect(schema, &vars);
        log::debug!("Environment supplied {} top-level field(s)", values.len());
        Ok(SourceOutput::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .field(FieldSpec::text("var1"))
            .field(FieldSpec::list("tags"))
            .field(FieldSpec::nested(
                "db",
                Schema::new()
                    .field(FieldSpec::text("host"))
                    .field(FieldSpec::integer("port")),
            ))
    }

    fn source(env: MapEnv) -> EnvSettingsSource {
        EnvSettingsSource::new().reader(Arc::new(env))
    }

    #[test]
    fn test_top_level_case_insensitive() {
        let env = MapEnv::new().with("VAR1", "hello").with("UNRELATED", "x");

        let output = source(env).collect(&schema()).unwrap();

        assert_eq!(Value::Object(output.values), json!({"var1": "hello"}));
    }

    #[test]
    fn test_case_sensitive() {
        let env = MapEnv::new().with("VAR1", "upper").with("var1", "lower");

        let output = source(env).case_sensitive(true).collect(&schema()).unwrap();

        assert_eq!(output.values["var1"], json!("lower"));
    }

    #[test]
    fn test_case_insensitive_collision_prefers_exact_key() {
        let forward = MapEnv::new().with("VAR1", "upper").with("var1", "lower");
        let reverse = MapEnv::new().with("var1", "lower").with("VAR1", "upper");

        for env in [forward, reverse] {
            let output = source(env).collect(&schema()).unwrap();
            assert_eq!(output.values["var1"], json!("lower"));
        }
    }

    #[test]
    fn test_case_insensitive_collision_is_ordered() {
        let matcher = EnvMatcher::default();
        let vars = |names: &[&str]| -> Vec<(String, String)> {
            names.iter().map(|n| (n.to_string(), n.to_string())).collect()
        };

        let first = matcher.index(vars(&["Var1", "VAR1"]));
        let second = matcher.index(vars(&["VAR1", "Var1"]));

        assert_eq!(first["var1"], "VAR1");
        assert_eq!(second["var1"], "VAR1");
    }

    #[test]
    fn test_prefix() {
        let env = MapEnv::new().with("APP_VAR1", "prefixed").with("VAR1", "bare");

        let output = source(env).prefix("APP_").collect(&schema()).unwrap();

        assert_eq!(output.values["var1"], json!("prefixed"));
    }

    #[test]
    fn test_nested_delimiter() {
        let env = MapEnv::new()
            .with("DB__HOST", "test-db-host")
            .with("DB__PORT", "5432");

        let output = source(env).nested_delimiter("__").collect(&schema()).unwrap();

        assert_eq!(
            Value::Object(output.values),
            json!({"db": {"host": "test-db-host", "port": "5432"}})
        );
    }

    #[test]
    fn test_nested_without_delimiter_is_ignored() {
        let env = MapEnv::new().with("DB__HOST", "test-db-host");

        let output = source(env).collect(&schema()).unwrap();

        assert!(output.values.is_empty());
    }

    #[test]
    fn test_nested_json_merged_with_variables() {
        let env = MapEnv::new()
            .with("DB", r#"{"host": "json-host", "port": 1}"#)
            .with("DB__PORT", "2");

        let output = source(env).nested_delimiter("__").collect(&schema()).unwrap();

        assert_eq!(output.values["db"], json!({"host": "json-host", "port": "2"}));
    }

    #[test]
    fn test_complex_values_parsed_as_json() {
        let env = MapEnv::new().with("TAGS", r#"["a", "b"]"#);

        let output = source(env).collect(&schema()).unwrap();

        assert_eq!(output.values["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_invalid_json_kept_as_string() {
        let env = MapEnv::new().with("TAGS", "a,b");

        let output = source(env).collect(&schema()).unwrap();

        assert_eq!(output.values["tags"], json!("a,b"));
    }
}
