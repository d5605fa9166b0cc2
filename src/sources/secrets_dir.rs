//! Secrets directory source
//!
//! One file per top-level field, named `{prefix}{field}` (Docker and
//! Kubernetes secret mounts). Only files named after a field are read, so
//! unrelated binary files in the mount are ignored. File contents are trimmed
//! at the end; complex fields are parsed as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::env::EnvMatcher;
use super::{SettingsSource, SourceOutput};
use crate::config::{Schema, SettingsConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind, FieldPath};
use crate::error::{Error, Result, read_file};

/// Settings from files in a directory
#[derive(Debug, Clone)]
pub struct SecretsDirSource {
    dir: PathBuf,
    matcher: EnvMatcher,
}

impl SecretsDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            matcher: EnvMatcher::default(),
        }
    }

    /// Use the prefix and case rule of `config`
    pub fn from_config(dir: impl Into<PathBuf>, config: &SettingsConfig) -> Self {
        Self {
            dir: dir.into(),
            matcher: EnvMatcher::new(config.env_prefix.clone(), None, config.case_sensitive),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files of the directory, by file name
    fn list_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let dir_err = |source| Error::DirectoryRead {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            files.push((name.to_string(), path));
        }
        Ok(files)
    }

    /// Contents of the files matching a field of `schema`
    fn read_matched(&self, schema: &Schema) -> Result<HashMap<String, String>> {
        let mut files = self.matcher.index(self.list_files()?);

        let mut contents = HashMap::new();
        for field in schema {
            let key = self.matcher.key_for(&field.name);
            if let Some(path) = files.remove(&key) {
                let content = read_file(&path)?;
                contents.insert(key, content.trim_end().to_string());
            }
        }
        Ok(contents)
    }
}

impl SettingsSource for SecretsDirSource {
    fn name(&self) -> &str {
        "secrets_dir"
    }

    fn collect(&self, schema: &Schema) -> Result<SourceOutput> {
        if !self.dir.exists() {
            return Ok(SourceOutput {
                values: Default::default(),
                diagnostics: vec![Diagnostic::new(
                    FieldPath::root(),
                    DiagnosticKind::SecretsDirMissing {
                        path: self.dir.clone(),
                    },
                )],
            });
        }
        if !self.dir.is_dir() {
            return Err(Error::Config(format!(
                "secrets_dir must reference a directory, not a file: {}",
                self.dir.display()
            )));
        }

        let files = self.read_matched(schema)?;
        let values = self.matcher.collect(schema, &files);
        log::debug!(
            "Secrets directory {:?} supplied {} field(s)",
            self.dir,
            values.len()
        );
        Ok(SourceOutput::new(values))
    }
}
