//! Dotenv file source
//!
//! Reads `KEY=value` pairs with `dotenvy` (without touching the process
//! environment) and matches them to fields exactly like
//! [`EnvSettingsSource`](super::EnvSettingsSource).

use std::path::{Path, PathBuf};

use super::env::EnvMatcher;
use super::{SettingsSource, SourceOutput};
use crate::config::{Schema, SettingsConfig};
use crate::error::{Error, Result};

/// Settings from a dotenv file
#[derive(Debug, Clone)]
pub struct DotenvSource {
    path: PathBuf,
    matcher: EnvMatcher,
}

impl DotenvSource {
    /// Read `path` without prefix or nested delimiter
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            matcher: EnvMatcher::default(),
        }
    }

    /// Read `path` with the prefix, delimiter and case rule of `config`
    pub fn from_config(path: impl Into<PathBuf>, config: &SettingsConfig) -> Self {
        Self {
            path: path.into(),
            matcher: EnvMatcher::from_config(config),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pairs(&self) -> Result<Vec<(String, String)>> {
        let dotenv_err = |source| Error::Dotenv {
            path: self.path.clone(),
            source,
        };

        let iter = dotenvy::from_path_iter(&self.path).map_err(dotenv_err)?;
        iter.map(|item| item.map_err(dotenv_err)).collect()
    }
}

impl SettingsSource for DotenvSource {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn collect(&self, schema: &Schema) -> Result<SourceOutput> {
        if !self.path.is_file() {
            log::debug!("Dotenv file {:?} not found, skipping", self.path);
            return Ok(SourceOutput::default());
        }

        let vars = self.matcher.index(self.read_pairs()?);
        let values = self.matcher.collect(schema, &vars);
        log::debug!(
            "Dotenv file {:?} supplied {} top-level field(s)",
            self.path,
            values.len()
        );
        Ok(SourceOutput::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldSpec;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let source = DotenvSource::new(temp_dir.path().join(".env"));

        let output = source.collect(&Schema::new()).unwrap();

        assert!(output.values.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_reads_matching_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".env");
        std::fs::write(&path, "# comment\nVAR1=\"from dotenv\"\nOTHER=x\n").unwrap();
        let schema = Schema::new().field(FieldSpec::text("var1"));

        let output = DotenvSource::new(&path).collect(&schema).unwrap();

        assert_eq!(output.values["var1"], json!("from dotenv"));
        assert_eq!(output.values.len(), 1);
    }
}
