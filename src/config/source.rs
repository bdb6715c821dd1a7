//! Configuration sources.
//!
//! A source is a named, prioritized provider that may or may not be available
//! and can populate a destination value. There are exactly two kinds: a file
//! on disk and a set of environment bindings.

use super::env_schema::EnvSchema;
use super::files::FileCodec;
use crate::env::{EnvProvider, OsEnv};
use crate::error::ConfigResult;
use crate::format::Format;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Priority for environment sources registered by the loader facade.
pub const ENV_SOURCE_PRIORITY: i32 = 2000;

/// Base priority for file sources registered by the loader facade; the n-th
/// candidate path gets `FILE_SOURCE_BASE_PRIORITY - n`.
pub const FILE_SOURCE_BASE_PRIORITY: i32 = 1000;

/// A provider of configuration values.
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Env(EnvSource),
}

impl Source {
    /// File source with an explicit declared format.
    pub fn file(path: impl Into<PathBuf>, format: Format, priority: i32) -> Self {
        Source::File(FileSource::new(path, format, priority))
    }

    /// File source whose declared format comes from the path's extension.
    pub fn file_detected(path: impl Into<PathBuf>, priority: i32) -> Self {
        let path = path.into();
        let format = Format::from_path(&path);
        Source::File(FileSource::new(path, format, priority))
    }

    /// Environment source reading the process environment.
    pub fn env(schema: EnvSchema, priority: i32) -> Self {
        Source::Env(EnvSource::new(schema, priority, Arc::new(OsEnv)))
    }

    /// Environment source reading from `env`.
    pub fn env_with(schema: EnvSchema, priority: i32, env: Arc<dyn EnvProvider>) -> Self {
        Source::Env(EnvSource::new(schema, priority, env))
    }

    /// Identity used in logs and errors: `file:<path>` or `env:<prefix>`.
    pub fn name(&self) -> String {
        match self {
            Source::File(f) => format!("file:{}", f.path.display()),
            Source::Env(e) => format!("env:{}", e.schema.prefix()),
        }
    }

    /// Higher priorities are tried first.
    pub fn priority(&self) -> i32 {
        match self {
            Source::File(f) => f.priority,
            Source::Env(e) => e.priority,
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Source::File(f) => f.path.exists(),
            Source::Env(e) => e.schema.any_set(e.env.as_ref()),
        }
    }

    /// Read the source into a fresh value. Nothing is cached.
    pub fn load<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        match self {
            Source::File(f) => f.codec.load_from(&f.path),
            Source::Env(e) => e.schema.bind(e.env.as_ref()),
        }
    }
}

/// A configuration file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: Format,
    priority: i32,
    codec: FileCodec,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, format: Format, priority: i32) -> Self {
        Self {
            path: path.into(),
            format,
            priority,
            codec: FileCodec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared format; parsing still dispatches on the extension.
    pub fn format(&self) -> Format {
        self.format
    }
}

/// Environment variables bound through a schema.
#[derive(Clone)]
pub struct EnvSource {
    schema: EnvSchema,
    priority: i32,
    env: Arc<dyn EnvProvider>,
}

impl EnvSource {
    pub fn new(schema: EnvSchema, priority: i32, env: Arc<dyn EnvProvider>) -> Self {
        Self {
            schema,
            priority,
            env,
        }
    }

    pub fn schema(&self) -> &EnvSchema {
        &self.schema
    }
}

impl std::fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSource")
            .field("schema", &self.schema)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::MapEnv;
    use crate::error::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn test_file_source_availability_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.yaml");
        let source = Source::file_detected(&path, 10);
        assert!(!source.is_available());
        assert!(matches!(
            source.load::<Config>(),
            Err(ConfigError::NotFound(_))
        ));

        std::fs::write(&path, "project:\n  name: file\n").unwrap();
        assert!(source.is_available());
        let config: Config = source.load().unwrap();
        assert_eq!(config.project.name, "file");
        assert_eq!(source.name(), format!("file:{}", path.display()));
        assert_eq!(source.priority(), 10);
    }

    #[test]
    fn test_declared_format() {
        match Source::file_detected("settings.toml", 1) {
            Source::File(f) => assert_eq!(f.format(), Format::Toml),
            other => panic!("unexpected source: {:?}", other),
        }
        match Source::file_detected("settings", 1) {
            Source::File(f) => assert_eq!(f.format(), Format::Yaml),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_env_source() {
        let env = Arc::new(MapEnv::new());
        let schema = EnvSchema::standard("BUILDCFG").unwrap();
        let source = Source::env_with(schema, ENV_SOURCE_PRIORITY, env.clone());
        assert_eq!(source.name(), "env:BUILDCFG");
        assert!(!source.is_available());
        match &source {
            Source::Env(env_source) => assert_eq!(env_source.schema().prefix(), "BUILDCFG"),
            other => panic!("expected an env source, got {:?}", other),
        }

        env.set("BUILDCFG_PROJECT_VERSION", "9.9.9").unwrap();
        assert!(source.is_available());
        let config: Config = source.load().unwrap();
        assert_eq!(config.project.version, "9.9.9");
    }
}
