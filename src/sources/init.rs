//! Explicit values passed by the application

use serde::Serialize;
use serde_json::{Map, Value};

use super::{SettingsSource, SourceOutput};
use crate::config::Schema;
use crate::error::{Error, Result};

/// Settings given directly in code, e.g. from command-line arguments
#[derive(Debug, Clone, Default)]
pub struct InitSource {
    values: Map<String, Value>,
}

impl InitSource {
    #[must_use]
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Build from any value serializing to a JSON object
    ///
    /// # Errors
    ///
    /// Returns [`Error::Deserialize`] if serialization fails and
    /// [`Error::Config`] if the value is not an object.
    pub fn from_serialize<S: Serialize>(value: &S) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(Error::Config(format!(
                "init values must be an object, got {other}"
            ))),
        }
    }

    /// Set one value (builder style)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl SettingsSource for InitSource {
    fn name(&self) -> &str {
        "init"
    }

    fn collect(&self, _schema: &Schema) -> Result<SourceOutput> {
        Ok(SourceOutput::new(self.values.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_serialize() {
        let mut values = BTreeMap::new();
        values.insert("var1", "explicit");

        let source = InitSource::from_serialize(&values).unwrap().with("port", 8080);
        let output = source.collect(&Schema::new()).unwrap();

        assert_eq!(
            Value::Object(output.values),
            json!({"var1": "explicit", "port": 8080})
        );
    }

    #[test]
    fn test_non_object_rejected() {
        let err = InitSource::from_serialize(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
