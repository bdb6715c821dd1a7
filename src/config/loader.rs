//! Configuration loader facade.
//!
//! Bundles path resolution, the file codec and the environment accessor behind
//! one value. Use [`ConfigLoader::new`] for an owned instance or
//! [`ConfigLoader::shared`] for the process-wide one.

use super::env_schema::EnvSchema;
use super::files::FileCodec;
use super::manager::ConfigManager;
use super::merge::{deep_merge, merge};
use super::source::{ENV_SOURCE_PRIORITY, FILE_SOURCE_BASE_PRIORITY, Source};
use super::types::Config;
use super::validate::validate;
use crate::env::{EnvProvider, OsEnv};
use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::format::Format;
use crate::paths::PathResolver;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static SHARED: OnceLock<ConfigLoader> = OnceLock::new();

/// Entry point for locating, loading, saving and composing configuration.
#[derive(Clone)]
pub struct ConfigLoader {
    env: Arc<dyn EnvProvider>,
    resolver: PathResolver,
    codec: FileCodec,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Loader over the process environment with the hardened codec.
    pub fn new() -> Self {
        Self::with_env(Arc::new(OsEnv))
    }

    /// Loader reading variables from `env`.
    pub fn with_env(env: Arc<dyn EnvProvider>) -> Self {
        Self {
            resolver: PathResolver::new(Arc::clone(&env)),
            env,
            codec: FileCodec::new(),
        }
    }

    pub fn with_codec(mut self, codec: FileCodec) -> Self {
        self.codec = codec;
        self
    }

    /// The process-wide loader, created on first use.
    pub fn shared() -> &'static ConfigLoader {
        SHARED.get_or_init(ConfigLoader::new)
    }

    pub fn env(&self) -> &dyn EnvProvider {
        self.env.as_ref()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn codec(&self) -> &FileCodec {
        &self.codec
    }

    /// Candidate paths for `base_name`; see [`PathResolver::build_config_paths`].
    pub fn candidate_paths<S: AsRef<str>>(
        &self,
        base_name: &str,
        search_dirs: &[S],
    ) -> Vec<PathBuf> {
        self.resolver.build_config_paths(base_name, search_dirs)
    }

    /// Load the first candidate for `base_name` that decodes into `T`.
    pub fn load_from_paths<T, S>(
        &self,
        base_name: &str,
        search_dirs: &[S],
    ) -> ConfigResult<(PathBuf, T)>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let paths = self.candidate_paths(base_name, search_dirs);
        let (path, value) = self.codec.load(&paths)?;
        info!("Loaded configuration from {}", path.display());
        Ok((path, value))
    }

    /// Load from files, then lay the `{prefix}_*` variables of the standard
    /// schema over the result. An empty prefix skips the overlay.
    pub fn load_with_env_overrides<S: AsRef<str>>(
        &self,
        base_name: &str,
        env_prefix: &str,
        search_dirs: &[S],
    ) -> ConfigResult<(PathBuf, Config)> {
        if env_prefix.is_empty() {
            return self.load_from_paths(base_name, search_dirs);
        }
        let schema = EnvSchema::standard(env_prefix)?;
        self.load_with_schema(base_name, &schema, search_dirs)
    }

    /// Like [`load_with_env_overrides`](Self::load_with_env_overrides) with a
    /// caller-supplied schema and destination type.
    pub fn load_with_schema<T, S>(
        &self,
        base_name: &str,
        schema: &EnvSchema,
        search_dirs: &[S],
    ) -> ConfigResult<(PathBuf, T)>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let (path, file_value): (PathBuf, Value) = self.load_from_paths(base_name, search_dirs)?;
        let overlay = schema.collect(self.env.as_ref());
        debug!(
            prefix = schema.prefix(),
            "Applying environment overrides to {}",
            path.display()
        );

        let merged = deep_merge(file_value, overlay);
        let value = serde_json::from_value(merged).map_err(|e| {
            ConfigError::InvalidBinding(format!(
                "failed to apply environment overrides to {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok((path, value))
    }

    /// A manager holding one file source per candidate path and, when
    /// `env_prefix` is non-empty, an environment source above them.
    pub fn setup_manager<S: AsRef<str>>(
        &self,
        base_name: &str,
        env_prefix: &str,
        search_dirs: &[S],
    ) -> ConfigResult<ConfigManager<Config>> {
        let manager = ConfigManager::new();
        let paths = self.candidate_paths(base_name, search_dirs);
        for (i, path) in paths.into_iter().enumerate() {
            let offset = i32::try_from(i).unwrap_or(i32::MAX);
            let priority = FILE_SOURCE_BASE_PRIORITY.saturating_sub(offset);
            manager.add_source(Source::file_detected(path, priority));
        }

        if !env_prefix.is_empty() {
            let schema = EnvSchema::standard(env_prefix)?;
            manager.add_source(Source::env_with(
                schema,
                ENV_SOURCE_PRIORITY,
                Arc::clone(&self.env),
            ));
        }
        Ok(manager)
    }

    /// Load a single configuration file.
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> ConfigResult<Config> {
        self.codec.load_from(path)
    }

    /// Save `config` in the format named by the path's extension (YAML when unknown).
    pub fn save(&self, config: &Config, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let format = match Format::from_path(path) {
            Format::Json => Format::Json,
            _ => Format::Yaml,
        };
        self.codec.save(path, config, format.as_str())?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn validate(&self, config: &Config) -> Result<(), ValidationError> {
        validate(Some(config))
    }

    /// Defaults, with the Go version taken from this loader's environment.
    pub fn defaults(&self) -> Config {
        Config::defaults_from_env(self.env.as_ref())
    }

    pub fn merge(&self, configs: &[Config]) -> Config {
        if configs.is_empty() {
            return self.defaults();
        }
        merge(configs)
    }
}
