//! Reading and writing single configuration files.
//!
//! Dispatch is by lower-cased extension:
//! - `.json` is parsed as JSON
//! - `.yaml` / `.yml` is parsed as YAML
//! - anything else is sniffed: JSON first, then YAML
//!
//! Saving always takes an explicit format and never falls back.

use crate::error::{ConfigError, ConfigResult};
use crate::format::extension_of;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode for files written by the hardened codec.
pub const HARDENED_FILE_MODE: u32 = 0o600;

/// Mode for files written by the simple codec.
pub const SIMPLE_FILE_MODE: u32 = 0o644;

/// Mode for directories created while saving.
pub const DIR_MODE: u32 = 0o755;

/// Formats with a codec, as accepted by [`FileCodec::save`].
pub const SUPPORTED_FORMATS: [&str; 3] = ["yaml", "yml", "json"];

/// YAML/JSON file codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCodec {
    file_mode: u32,
}

impl Default for FileCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCodec {
    /// Codec that writes files readable only by their owner (0600).
    pub fn new() -> Self {
        Self {
            file_mode: HARDENED_FILE_MODE,
        }
    }

    /// Codec that writes world-readable files (0644).
    pub fn simple() -> Self {
        Self {
            file_mode: SIMPLE_FILE_MODE,
        }
    }

    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    pub fn supported_formats(&self) -> &'static [&'static str] {
        &SUPPORTED_FORMATS
    }

    /// Load the first path that exists and decodes.
    ///
    /// Failures on individual paths are skipped; only exhaustion is an error.
    pub fn load<T, P>(&self, paths: &[P]) -> ConfigResult<(PathBuf, T)>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            match self.load_from(path) {
                Ok(value) => {
                    debug!("Loaded configuration from {}", path.display());
                    return Ok((path.to_path_buf(), value));
                }
                Err(ConfigError::NotFound(_)) => continue,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            }
        }

        Err(ConfigError::NoValidConfigFile(
            paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        ))
    }

    /// Load and decode a single file.
    pub fn load_from<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> ConfigResult<T> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| ConfigError::io(path, e))?;

        match extension_of(path).as_deref() {
            Some("json") => decode_json(path, &bytes),
            Some("yaml") | Some("yml") => decode_yaml(path, &bytes),
            other => {
                if let Ok(value) = decode_json(path, &bytes) {
                    return Ok(value);
                }
                if let Ok(value) = decode_yaml(path, &bytes) {
                    return Ok(value);
                }
                let ext = other.map(|e| format!(".{}", e)).unwrap_or_default();
                Err(ConfigError::UnsupportedFormat(format!(
                    "{} (extension {:?}, content is neither JSON nor YAML)",
                    path.display(),
                    ext
                )))
            }
        }
    }

    /// Serialize `data` to `path` in `format` (`json`, `yaml` or `yml`).
    ///
    /// Missing parent directories are created.
    pub fn save<T>(&self, path: impl AsRef<Path>, data: &T, format: &str) -> ConfigResult<()>
    where
        T: Serialize + ?Sized,
    {
        let path = path.as_ref();
        let contents = match format.to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::to_string(data)
                .map(String::into_bytes)
                .map_err(|e| ConfigError::Serialize {
                    format: "yaml",
                    message: e.to_string(),
                })?,
            "json" => {
                let mut json =
                    serde_json::to_vec_pretty(data).map_err(|e| ConfigError::Serialize {
                        format: "json",
                        message: e.to_string(),
                    })?;
                json.push(b'\n');
                json
            }
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }

        self.write_file(path, &contents)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> ConfigResult<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }

        let mut file = options.open(path).map_err(|e| ConfigError::io(path, e))?;
        file.write_all(contents)
            .map_err(|e| ConfigError::io(path, e))?;

        // The open mode is filtered by umask and ignored for existing files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.file_mode))
                .map_err(|e| ConfigError::io(path, e))?;
        }

        Ok(())
    }
}

fn create_dir_all(dir: &Path) -> ConfigResult<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir).map_err(|e| ConfigError::io(dir, e))
}

fn decode_json<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> ConfigResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        format: "json",
        message: e.to_string(),
    })
}

fn decode_yaml<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> ConfigResult<T> {
    serde_yaml::from_slice(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        format: "yaml",
        message: e.to_string(),
    })
}
