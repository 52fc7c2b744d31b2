use config::{Config, Environment, File, Map};
use lovebird_domain::constants::{ENV_CONFIG_FILE, ENV_ENDPOINT_URL, ENV_PREFIX, ENV_PUBLIC_KEY};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "lovebird";

/// Custom error type for config loading.
#[lovebird_derive::lovebird_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered configuration loader.
///
/// Sources, lowest precedence first:
/// 1. **Base file**: the given path, else `LOVEBIRD_CONFIG`, else `lovebird` (any format the
///    `config` crate recognises by extension). A missing file is not an error.
/// 2. **Environment overrides**: `LOVEBIRD__SECTION__KEY` (e.g. `LOVEBIRD__SERVER__PORT`).
/// 3. **Identity settings**: `SERVICE_ENDPOINT_URL` and `SERVICE_PUBLIC_KEY` map onto
///    `identity.endpoint_url` and `identity.public_key`.
///
/// Missing identity settings are not an error; see [`crate::health::check_health`].
///
/// # Example
/// ```rust
/// use lovebird_kernel::config::ConfigLoader;
/// use lovebird_kernel::domain::config::AppConfig;
///
/// let config: AppConfig = ConfigLoader::new()
///     .path("does-not-exist")
///     .env([("SERVICE_ENDPOINT_URL", "https://abc.supabase.co")])
///     .load()
///     .unwrap();
/// assert_eq!(config.identity.endpoint_url(), Some("https://abc.supabase.co"));
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: Option<Map<String, String>>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this base file instead of `LOVEBIRD_CONFIG` / `lovebird`.
    #[must_use]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read variables from `vars` instead of the process environment.
    #[must_use]
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Build and deserialize the configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Config`] when a source is malformed or the merged values do not
    /// match `T`.
    pub fn load<T>(self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let path = self
            .path
            .clone()
            .or_else(|| self.var(ENV_CONFIG_FILE).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        info!(path = %path.display(), "Loading configuration");

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .convert_case(config::Case::Snake)
            .source(self.env.clone());

        let builder = Config::builder()
            .add_source(File::from(path.as_path()).required(false))
            .add_source(environment)
            .set_override_option("identity.endpoint_url", self.var(ENV_ENDPOINT_URL))
            .context("Applying SERVICE_ENDPOINT_URL")?
            .set_override_option("identity.public_key", self.var(ENV_PUBLIC_KEY))
            .context("Applying SERVICE_PUBLIC_KEY")?;

        let config = builder
            .build()
            .context("Failed to build config")?
            .try_deserialize::<T>()
            .context("Failed to deserialize config")?;

        debug!("Configuration loaded");
        Ok(config)
    }

    fn var(&self, key: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }
}

/// Load configuration from the process environment and an optional base file.
///
/// # Errors
/// See [`ConfigLoader::load`].
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let loader = ConfigLoader::new();
    match path {
        Some(path) => loader.path(path).load(),
        None => loader.load(),
    }
}
