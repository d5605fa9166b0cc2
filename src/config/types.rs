//! Core configuration types for settings-secrets

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

// =============================================================================
// Environment Access
// =============================================================================

/// Read-only view of a set of environment variables
///
/// The process environment is only ever read. Tests and dotenv files use
/// [`MapEnv`] so nothing has to mutate the real environment.
pub trait EnvReader: Send + Sync {
    /// Value of a variable, `None` if unset (or not valid UTF-8)
    fn var(&self, key: &str) -> Option<String>;

    /// All variables
    fn vars(&self) -> Vec<(String, String)>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// In-memory environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable (builder style)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvReader for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// =============================================================================
// Settings Config
// =============================================================================

/// Configuration of the default source chain
#[derive(Clone)]
pub struct SettingsConfig {
    /// Prefix prepended to field names when reading env vars, dotenv and secret files
    pub env_prefix: String,

    /// Separator between nested field names in variable names (e.g. `"__"` for `DB__HOST`)
    /// If None, nested fields can only be given as one JSON document
    pub env_nested_delimiter: Option<String>,

    /// Match variable names case-sensitively (default: false)
    pub case_sensitive: bool,

    /// Dotenv file to read (requires the `dotenv` feature)
    pub env_file: Option<PathBuf>,

    /// Directory holding one file per secret field
    pub secrets_dir: Option<PathBuf>,

    /// Environment used by the env source and for secret name/version indirection
    pub env_reader: Arc<dyn EnvReader>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            env_prefix: String::new(),
            env_nested_delimiter: None,
            case_sensitive: false,
            env_file: None,
            secrets_dir: None,
            env_reader: Arc::new(ProcessEnv),
        }
    }
}

impl std::fmt::Debug for SettingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsConfig")
            .field("env_prefix", &self.env_prefix)
            .field("env_nested_delimiter", &self.env_nested_delimiter)
            .field("case_sensitive", &self.case_sensitive)
            .field("env_file", &self.env_file)
            .field("secrets_dir", &self.secrets_dir)
            .field("env_reader", &"Arc<dyn EnvReader>")
            .finish()
    }
}

impl SettingsConfig {
    /// Create a new builder for SettingsConfig
    ///
    /// # Example
    /// ```rust
    /// use settings_secrets::SettingsConfig;
    ///
    /// let config = SettingsConfig::builder()
    ///     .env_prefix("MYAPP_")
    ///     .env_nested_delimiter("__")
    ///     .env_file(".env")
    ///     .build();
    /// assert_eq!(config.env_prefix, "MYAPP_");
    /// ```
    pub fn builder() -> SettingsConfigBuilder {
        SettingsConfigBuilder::default()
    }
}

/// Builder for creating SettingsConfig with a fluent API
#[derive(Debug, Clone, Default)]
pub struct SettingsConfigBuilder {
    config: SettingsConfig,
}

impl SettingsConfigBuilder {
    /// Prefix for variable names (case handling follows `case_sensitive`)
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.env_prefix = prefix.into();
        self
    }

    /// Separator used to address nested fields, e.g. `"__"`
    pub fn env_nested_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.env_nested_delimiter = Some(delimiter.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.config.case_sensitive = case_sensitive;
        self
    }

    /// Read variables from a dotenv file
    ///
    /// Supports `~` expansion for home directory.
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.env_file = Some(expand_home(path.into()));
        self
    }

    /// Read one file per field from this directory
    ///
    /// Supports `~` expansion for home directory.
    pub fn secrets_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.secrets_dir = Some(expand_home(path.into()));
        self
    }

    /// Use a custom environment instead of the process environment
    pub fn env_reader(mut self, reader: Arc<dyn EnvReader>) -> Self {
        self.config.env_reader = reader;
        self
    }

    pub fn build(self) -> SettingsConfig {
        self.config
    }
}

impl From<SettingsConfig> for SettingsConfigBuilder {
    fn from(config: SettingsConfig) -> Self {
        Self { config }
    }
}

fn expand_home(path: PathBuf) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(&path));
        }
    }
    path
}
