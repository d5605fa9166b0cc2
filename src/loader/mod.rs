//! Settings loader
//!
//! Runs a chain of [`SettingsSource`]s for a [`SettingsSchema`] type, merges
//! their values, validates the result against the schema and deserializes it.
//!
//! The default chain, lowest priority first:
//!
//! 1. secret manager (if configured)
//! 2. secrets directory (if configured)
//! 3. dotenv file (if configured)
//! 4. environment variables
//! 5. explicit init values (if given)
//!
//! Sources added with [`SettingsLoaderBuilder::with_source`] come after these.

mod builder;
pub(crate) mod merge;

pub use builder::SettingsLoaderBuilder;

use serde_json::{Map, Value};
use std::marker::PhantomData;

use crate::config::{FieldKind, Schema, SettingsSchema};
use crate::diagnostics::{Diagnostic, FieldPath};
use crate::error::{Error, FieldErrorKind, Result, ValidationErrors};
use crate::sources::SettingsSource;
use merge::deep_merge;

/// Successfully loaded settings plus the diagnostics collected on the way
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub settings: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Loaded<T> {
    /// Drop the diagnostics
    pub fn into_inner(self) -> T {
        self.settings
    }
}

/// Loads `T` from an ordered chain of sources
pub struct SettingsLoader<T> {
    schema: Schema,
    sources: Vec<Box<dyn SettingsSource>>,
    _settings: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for SettingsLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsLoader")
            .field("fields", &self.schema.len())
            .field("sources", &self.source_names())
            .finish()
    }
}

impl<T: SettingsSchema> SettingsLoader<T> {
    /// Create a new builder for a loader of `T`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use settings_secrets::{FieldSpec, Schema, SettingsLoader, SettingsSchema};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct AppSettings {
    ///     api_key: String,
    /// }
    ///
    /// impl SettingsSchema for AppSettings {
    ///     fn schema() -> Schema {
    ///         Schema::new().field(FieldSpec::text("api_key"))
    ///     }
    /// }
    ///
    /// let settings = SettingsLoader::<AppSettings>::builder()
    ///     .env_prefix("MYAPP_")
    ///     .build()
    ///     .unwrap()
    ///     .load()
    ///     .unwrap()
    ///     .into_inner();
    /// ```
    #[must_use]
    pub fn builder() -> SettingsLoaderBuilder<T> {
        SettingsLoaderBuilder::new()
    }

    /// Create a loader with an explicit source chain (lowest priority first)
    pub fn with_sources(sources: Vec<Box<dyn SettingsSource>>) -> Self {
        Self {
            schema: T::schema(),
            sources,
            _settings: PhantomData,
        }
    }
}

impl<T> SettingsLoader<T> {
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Source names in merge order
    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl<T: SettingsSchema> SettingsLoader<T> {
    /// Collect, validate and deserialize the settings
    ///
    /// Diagnostics from the sources are logged as warnings and returned in
    /// either case.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSchema`] if the schema definition is broken
    /// - any error a source reports as fatal (unreadable files)
    /// - [`Error::Validation`] listing every missing or invalid field
    /// - [`Error::Deserialize`] if the validated values do not fit `T`
    pub fn load(&self) -> Result<Loaded<T>> {
        self.schema.validate_definition()?;

        let (mut values, diagnostics) = self.collect()?;

        let mut errors = ValidationErrors::default();
        apply_schema(&self.schema, &mut values, &FieldPath::root(), &mut errors);
        if !errors.is_empty() {
            log::debug!("Settings validation failed with {} error(s)", errors.len());
            return Err(Error::Validation {
                errors,
                diagnostics,
            });
        }

        let settings = serde_json::from_value(Value::Object(values))?;
        Ok(Loaded {
            settings,
            diagnostics,
        })
    }

    /// Merged raw values of all sources, before validation
    ///
    /// # Errors
    ///
    /// Returns the first fatal source error.
    pub fn collect(&self) -> Result<(Map<String, Value>, Vec<Diagnostic>)> {
        let mut values = Map::new();
        let mut diagnostics = Vec::new();

        for source in &self.sources {
            let output = source.collect(&self.schema)?;
            log::debug!(
                "Source '{}' supplied {} value(s), {} diagnostic(s)",
                source.name(),
                output.values.len(),
                output.diagnostics.len()
            );
            for diagnostic in &output.diagnostics {
                diagnostic.log();
            }
            deep_merge(&mut values, output.values);
            diagnostics.extend(output.diagnostics);
        }

        Ok((values, diagnostics))
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Fill defaults, coerce and check every field of `schema` in `values`
///
/// Unknown keys are left alone.
fn apply_schema(
    schema: &Schema,
    values: &mut Map<String, Value>,
    parent: &FieldPath,
    errors: &mut ValidationErrors,
) {
    for field in schema {
        let path = parent.child(&field.name);

        let Some(raw) = values.remove(&field.name).or_else(|| field.default.clone()) else {
            errors.push(path, FieldErrorKind::Missing);
            continue;
        };

        let mut value = match field.coerce(raw) {
            Ok(value) => value,
            Err(reason) => {
                errors.push(path, FieldErrorKind::Invalid { reason });
                continue;
            }
        };

        if let (FieldKind::Nested(inner), Value::Object(map)) = (&field.kind, &mut value) {
            apply_schema(inner, map, &path, errors);
        } else if let Err(reason) = field.validate(&value) {
            errors.push(path, FieldErrorKind::Invalid { reason });
            continue;
        }

        values.insert(field.name.clone(), value);
    }
}
