//! Builder for SettingsLoader
//!
//! This module contains [`SettingsLoaderBuilder`] which provides a fluent API
//! for creating a [`SettingsLoader`](super::SettingsLoader).

use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use super::SettingsLoader;
use crate::client::SecretManagerClient;
use crate::config::{EnvReader, SettingsConfig, SettingsConfigBuilder, SettingsSchema};
use crate::error::{Error, Result};
use crate::sources::{
    EnvSettingsSource, InitSource, SecretManagerSource, SecretsDirSource, SettingsSource,
};

type Sources = Vec<Box<dyn SettingsSource>>;
type Customiser = Box<dyn FnOnce(Sources) -> Sources>;

/// Builder for creating a [`SettingsLoader`] with a fluent API.
///
/// # Example
///
/// ```rust,no_run
/// use settings_secrets::{MemorySecretClient, SettingsLoader};
/// # use settings_secrets::{FieldSpec, Schema, SettingsSchema};
/// # #[derive(serde::Deserialize)]
/// # struct AppSettings { password: String }
/// # impl SettingsSchema for AppSettings {
/// #     fn schema() -> Schema {
/// #         Schema::new().field(FieldSpec::text("password").secret_name("db-pw"))
/// #     }
/// # }
///
/// let client = MemorySecretClient::new().with_secret("db-pw", "latest", "s3cr3t");
///
/// let loaded = SettingsLoader::<AppSettings>::builder()
///     .env_prefix("MYAPP_")
///     .env_nested_delimiter("__")
///     .env_file(".env")
///     .with_secret_manager(client)
///     .default_secret_version("latest")
///     .build()
///     .unwrap()
///     .load()
///     .unwrap();
/// ```
pub struct SettingsLoaderBuilder<T> {
    config_builder: SettingsConfigBuilder,
    init: Option<InitSource>,
    secret_client: Option<Arc<dyn SecretManagerClient>>,
    default_secret_version: Option<String>,
    extra_sources: Sources,
    customiser: Option<Customiser>,
    _settings: PhantomData<fn() -> T>,
}

impl<T> Default for SettingsLoaderBuilder<T> {
    fn default() -> Self {
        Self {
            config_builder: SettingsConfig::builder(),
            init: None,
            secret_client: None,
            default_secret_version: None,
            extra_sources: Vec::new(),
            customiser: None,
            _settings: PhantomData,
        }
    }
}

impl<T: SettingsSchema> SettingsLoaderBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the whole configuration
    pub fn config(mut self, config: SettingsConfig) -> Self {
        self.config_builder = SettingsConfigBuilder::from(config);
        self
    }

    /// Prefix for environment variables, dotenv keys and secret file names
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.env_prefix(prefix);
        self
    }

    /// Separator between nested field names, e.g. `"__"` for `DB__HOST`
    pub fn env_nested_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.env_nested_delimiter(delimiter);
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.config_builder = self.config_builder.case_sensitive(case_sensitive);
        self
    }

    /// Read a dotenv file (feature `dotenv`)
    ///
    /// Supports `~` expansion for home directory. A missing file is skipped.
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_builder = self.config_builder.env_file(path);
        self
    }

    /// Read one file per field from a directory
    ///
    /// Supports `~` expansion for home directory.
    pub fn secrets_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_builder = self.config_builder.secrets_dir(path);
        self
    }

    /// Use a custom environment instead of the process environment.
    ///
    /// Applies to the environment source and to secret name/version
    /// indirection.
    pub fn env_reader(mut self, reader: Arc<dyn EnvReader>) -> Self {
        self.config_builder = self.config_builder.env_reader(reader);
        self
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Explicit values with the highest default priority
    pub fn with_init(mut self, init: InitSource) -> Self {
        self.init = Some(init);
        self
    }

    /// Explicit values from any serializable object
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not serialize to a JSON object.
    pub fn with_init_values<S: Serialize>(self, values: &S) -> Result<Self> {
        Ok(self.with_init(InitSource::from_serialize(values)?))
    }

    /// Fetch secret-tagged fields from `client`
    ///
    /// The secret manager has the lowest priority: any other source supplying
    /// the same field wins.
    pub fn with_secret_manager(self, client: impl SecretManagerClient + 'static) -> Self {
        self.with_secret_manager_arc(Arc::new(client))
    }

    /// Like [`with_secret_manager`](Self::with_secret_manager) for a shared client
    pub fn with_secret_manager_arc(mut self, client: Arc<dyn SecretManagerClient>) -> Self {
        self.secret_client = Some(client);
        self
    }

    /// Version used for secret fields that name no version
    pub fn default_secret_version(mut self, version: impl Into<String>) -> Self {
        self.default_secret_version = Some(version.into());
        self
    }

    /// Append a source after the default chain (it wins over all of them)
    pub fn with_source(mut self, source: impl SettingsSource + 'static) -> Self {
        self.extra_sources.push(Box::new(source));
        self
    }

    /// Reorder, drop or replace sources once the chain is assembled
    ///
    /// The closure receives the full chain, lowest priority first.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let loader = SettingsLoader::<AppSettings>::builder()
    ///     .with_secret_manager(client)
    ///     // let secrets override everything else
    ///     .customise_sources(|mut sources| {
    ///         sources.rotate_left(1);
    ///         sources
    ///     })
    ///     .build()?;
    /// ```
    pub fn customise_sources(
        mut self,
        customiser: impl FnOnce(Sources) -> Sources + 'static,
    ) -> Self {
        self.customiser = Some(Box::new(customiser));
        self
    }

    /// Build the [`SettingsLoader`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an env file is configured without the
    /// `dotenv` feature.
    pub fn build(self) -> Result<SettingsLoader<T>> {
        let config = self.config_builder.build();
        let mut sources: Sources = Vec::new();

        if let Some(client) = self.secret_client {
            let mut source =
                SecretManagerSource::from_arc(client).env_reader(config.env_reader.clone());
            if let Some(version) = self.default_secret_version {
                source = source.default_version(version);
            }
            sources.push(Box::new(source));
        }

        if let Some(dir) = &config.secrets_dir {
            sources.push(Box::new(SecretsDirSource::from_config(dir, &config)));
        }

        if let Some(path) = &config.env_file {
            #[cfg(feature = "dotenv")]
            sources.push(Box::new(crate::sources::DotenvSource::from_config(
                path, &config,
            )));

            #[cfg(not(feature = "dotenv"))]
            return Err(Error::Config(format!(
                "env_file {} requires the `dotenv` feature",
                path.display()
            )));
        }

        sources.push(Box::new(EnvSettingsSource::from_config(&config)));

        if let Some(init) = self.init {
            sources.push(Box::new(init));
        }

        sources.extend(self.extra_sources);

        if let Some(customise) = self.customiser {
            sources = customise(sources);
        }

        if sources.is_empty() {
            return Err(Error::Config("no settings sources configured".to_string()));
        }

        let loader = SettingsLoader::with_sources(sources);
        log::debug!("Settings loader sources: {:?}", loader.source_names());
        Ok(loader)
    }
}
