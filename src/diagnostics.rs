//! Structured, non-fatal diagnostics produced while collecting settings
//!
//! Sources never fail a load because a secret could not be fetched. They
//! record a [`Diagnostic`] instead and leave the field to the other sources;
//! whether the application should stop is decided later by required-field
//! validation or by the caller inspecting the list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Field Path
// =============================================================================

/// Location of a field inside a (possibly nested) schema, e.g. `db.password`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path (the settings root)
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path extended by one segment
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Last segment (the field's own name), `None` for the root
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// What went wrong while resolving a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The secret client returned an error for this field
    SecretFetchFailed {
        secret_name: String,
        secret_version: String,
        reason: String,
    },

    /// A secret name resolved but no version (and no default version) did
    SecretVersionMissing { secret_name: String },

    /// Configured secrets directory does not exist
    SecretsDirMissing { path: PathBuf },
}

/// A recoverable problem attached to a field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub field: FieldPath,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub(crate) fn new(field: FieldPath, kind: DiagnosticKind) -> Self {
        Self { field, kind }
    }

    /// Name of the field this diagnostic is about (last path segment)
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field.field_name()
    }

    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self.kind, DiagnosticKind::SecretFetchFailed { .. })
    }

    #[must_use]
    pub fn is_version_missing(&self) -> bool {
        matches!(self.kind, DiagnosticKind::SecretVersionMissing { .. })
    }

    /// Emit this diagnostic through the `log` facade
    pub(crate) fn log(&self) {
        log::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::SecretFetchFailed { reason, .. } => {
                write!(f, "Couldn't load secret for field \"{}\": {reason}", self.field)
            }
            DiagnosticKind::SecretVersionMissing { .. } => write!(
                f,
                "There is no secret version specified for field \"{}\". Skipping",
                self.field
            ),
            DiagnosticKind::SecretsDirMissing { path } => {
                write!(f, "Secrets directory \"{}\" does not exist", path.display())
            }
        }
    }
}
