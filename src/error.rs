//! Error types for settings-secrets

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, FieldPath};

/// Result type alias for settings-secrets operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for settings resolution
///
/// Secret lookups never produce one of these: a failed fetch is reported as a
/// [`Diagnostic`] and the field is left to the other sources.
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "dotenv")]
    #[error("Failed to parse dotenv file '{path}': {source}")]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to deserialize settings: {0}")]
    Deserialize(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Schema and Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid schema definition for '{field}': {reason}")]
    InvalidSchema { field: String, reason: String },

    #[error("{errors}")]
    Validation {
        errors: ValidationErrors,
        /// Diagnostics collected from the sources before validation failed.
        /// A missing field is often explained by a failed secret fetch.
        diagnostics: Vec<Diagnostic>,
    },

    // -------------------------------------------------------------------------
    // Source Errors
    // -------------------------------------------------------------------------
    #[error("Settings source '{source_name}' failed: {reason}")]
    Source { source_name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Paths of all fields reported as missing, in schema order
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&FieldPath> {
        match self {
            Error::Validation { errors, .. } => errors
                .iter()
                .filter(|e| e.kind == FieldErrorKind::Missing)
                .map(|e| &e.loc)
                .collect(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Kind of a single field validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// Required field not supplied by any source and without a default
    Missing,
    /// Value present but could not be coerced or broke a constraint
    Invalid { reason: String },
}

impl FieldErrorKind {
    /// Short machine-readable tag (`missing` / `invalid`)
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            FieldErrorKind::Missing => "missing",
            FieldErrorKind::Invalid { .. } => "invalid",
        }
    }
}

/// A validation failure located at a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub loc: FieldPath,
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::Missing => write!(f, "{}: field required", self.loc),
            FieldErrorKind::Invalid { reason } => write!(f, "{}: {reason}", self.loc),
        }
    }
}

/// All validation failures of one load, in schema declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn push(&mut self, loc: FieldPath, kind: FieldErrorKind) {
        self.0.push(FieldError { loc, kind });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.0.len();
        write!(
            f,
            "{count} validation error{} for settings",
            if count == 1 { "" } else { "s" }
        )?;
        for error in &self.0 {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Filesystem Helper Functions
// =============================================================================

use std::path::Path;

/// Read a file to string with proper error handling
pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldPath::root().child("var2"), FieldErrorKind::Missing);
        errors.push(
            FieldPath::root().child("db").child("port"),
            FieldErrorKind::Invalid {
                reason: "Input should be a valid integer".into(),
            },
        );

        let text = errors.to_string();
        assert!(text.starts_with("2 validation errors for settings"));
        assert!(text.contains("var2: field required"));
        assert!(text.contains("db.port: Input should be a valid integer"));
    }

    #[test]
    fn test_missing_fields() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldPath::root().child("var2"), FieldErrorKind::Missing);
        let err = Error::Validation {
            errors,
            diagnostics: Vec::new(),
        };

        assert!(err.is_validation_error());
        let missing = err.missing_fields();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].to_string(), "var2");
    }
}
