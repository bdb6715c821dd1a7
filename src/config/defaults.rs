//! Compiled-in defaults.

use super::types::{AnalyticsConfig, BuildConfig, Config, ProjectConfig, TestConfig};
use crate::env::{EnvProvider, OsEnv, clean_env_value};

/// Environment variable pinning the default toolchain version.
pub const GO_VERSION_ENV: &str = "BUILDCFG_GO_VERSION";

/// Legacy variable consulted when [`GO_VERSION_ENV`] is unset.
pub const LEGACY_GO_VERSION_ENV: &str = "GO_PRIMARY_VERSION";

/// Version used when neither variable is set.
pub const FALLBACK_GO_VERSION: &str = "1.24";

impl Config {
    /// Defaults, reading the toolchain version from the process environment.
    pub fn defaults() -> Self {
        Self::defaults_from_env(&OsEnv)
    }

    /// Defaults, reading the toolchain version from `env`.
    pub fn defaults_from_env(env: &dyn EnvProvider) -> Self {
        Config {
            project: ProjectConfig {
                name: "build-project".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            build: BuildConfig {
                go_version: default_go_version(env),
                platform: "linux/amd64".to_string(),
                cgo_enabled: false,
                ..Default::default()
            },
            test: TestConfig {
                timeout: 120,
                coverage: true,
                parallel: 4,
                ..Default::default()
            },
            analytics: AnalyticsConfig {
                enabled: false,
                sample_rate: 0.1,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Default toolchain version: primary variable, then legacy, then fallback.
/// A trailing `.x` (as in `1.24.x`) is stripped.
pub fn default_go_version(env: &dyn EnvProvider) -> String {
    let primary = env.get(GO_VERSION_ENV);
    let primary = clean_env_value(&primary);
    if !primary.is_empty() {
        return strip_x_suffix(primary).to_string();
    }

    let legacy = env.get(LEGACY_GO_VERSION_ENV);
    if !legacy.is_empty() {
        return strip_x_suffix(&legacy).to_string();
    }

    FALLBACK_GO_VERSION.to_string()
}

fn strip_x_suffix(version: &str) -> &str {
    match version.strip_suffix(".x") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => version,
    }
}
