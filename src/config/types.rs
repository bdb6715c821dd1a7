//! Configuration types and structures.
//!
//! Every section and field defaults when absent, so partial files and partial
//! environment bindings deserialize cleanly. List fields that take part in
//! merging are `Option<Vec<_>>`: `None` means "not specified", `Some(vec![])`
//! is an explicit empty list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub build: BuildConfig,
    pub test: TestConfig,
    pub analytics: AnalyticsConfig,
    pub security: SecurityConfig,
    pub deploy: DeployConfig,
}

/// Project metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    pub license: String,
    pub homepage: String,
    pub repository: String,
}

/// Build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Toolchain version such as `1.24`.
    pub go_version: String,
    /// Target in `os/arch` form.
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub ldflags: String,
    pub gcflags: String,
    pub cgo_enabled: bool,
    pub output_dir: String,
    pub binary: String,
}

impl BuildConfig {
    /// Whether any field that unlocks boolean overrides is set.
    pub fn has_signal(&self) -> bool {
        !self.go_version.is_empty() || !self.platform.is_empty() || self.tags.is_some()
    }
}

/// Test settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Timeout in seconds.
    pub timeout: i64,
    pub coverage: bool,
    pub verbose: bool,
    pub race: bool,
    pub parallel: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub output_dir: String,
    pub bench_time: String,
    pub mem_profile: bool,
    pub cpu_profile: bool,
}

impl TestConfig {
    /// Whether any field that unlocks boolean overrides is set.
    pub fn has_signal(&self) -> bool {
        self.timeout != 0 || self.parallel != 0 || self.tags.is_some()
    }
}

/// Analytics settings. Merged as a single unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub sample_rate: f64,
    pub retention_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_formats: Option<Vec<String>>,
    /// Endpoint name to URL.
    pub endpoints: BTreeMap<String, String>,
    pub batch_size: i64,
    /// Flush interval in seconds.
    pub flush_interval: i64,
}

impl AnalyticsConfig {
    /// Whether this section replaces an accumulated one during merge.
    pub fn is_specified(&self) -> bool {
        self.sample_rate != 0.0 || self.retention_days != 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enable_vuln_check: bool,
    pub skip_vuln_check: Vec<String>,
    pub required_checks: Vec<String>,
    pub policy_file: String,
    pub enable_code_scan: bool,
    pub enable_secret_scan: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub strategy: String,
    pub environment: String,
    pub variables: BTreeMap<String, String>,
    pub hooks: DeployHooks,
    pub rollback: RollbackConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployHooks {
    pub pre_deploy: Vec<String>,
    pub post_deploy: Vec<String>,
    pub on_failure: Vec<String>,
    pub on_success: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    pub enabled: bool,
    pub max_versions: i64,
    pub auto_rollback: bool,
    pub health_check_url: String,
    pub health_check_retry: i64,
}
