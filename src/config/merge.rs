//! Configuration merging.
//!
//! Two merge strategies live here:
//! - [`merge`] folds typed [`Config`] snapshots using per-section rules
//! - [`deep_merge`] layers untyped JSON values, used for environment overlays
//!
//! The typed rules are intentionally asymmetric:
//! - strings override when non-empty, numbers when non-zero
//! - lists override when present and replace wholesale (no union)
//! - section booleans override only when a signal field of the same section is
//!   set in the override, since a bare `false` is indistinguishable from "unset"
//! - analytics is replaced as one unit when its sample rate or retention is set
//! - security and deploy are carried from the first snapshot unchanged

use super::types::{AnalyticsConfig, BuildConfig, Config, ProjectConfig, TestConfig};
use serde_json::Value;

/// Merge configurations in order, later ones taking precedence.
///
/// No input yields [`Config::defaults`]; one input yields an independent copy.
pub fn merge(configs: &[Config]) -> Config {
    let Some((base, overrides)) = configs.split_first() else {
        return Config::defaults();
    };

    let mut result = base.clone();
    for override_config in overrides {
        merge_into(&mut result, override_config);
    }
    result
}

/// Merge a single override into an accumulated result.
pub fn merge_into(result: &mut Config, override_config: &Config) {
    merge_project(&mut result.project, &override_config.project);
    merge_build(&mut result.build, &override_config.build);
    merge_test(&mut result.test, &override_config.test);
    merge_analytics(&mut result.analytics, &override_config.analytics);
}

fn merge_project(result: &mut ProjectConfig, over: &ProjectConfig) {
    merge_string(&mut result.name, &over.name);
    merge_string(&mut result.version, &over.version);
    merge_string(&mut result.description, &over.description);
    merge_string(&mut result.license, &over.license);
    merge_string(&mut result.homepage, &over.homepage);
    merge_string(&mut result.repository, &over.repository);
    merge_list(&mut result.authors, &over.authors);
}

fn merge_build(result: &mut BuildConfig, over: &BuildConfig) {
    merge_string(&mut result.go_version, &over.go_version);
    merge_string(&mut result.platform, &over.platform);
    merge_string(&mut result.ldflags, &over.ldflags);
    merge_string(&mut result.gcflags, &over.gcflags);
    merge_string(&mut result.output_dir, &over.output_dir);
    merge_string(&mut result.binary, &over.binary);
    merge_list(&mut result.tags, &over.tags);

    if over.has_signal() {
        result.cgo_enabled = over.cgo_enabled;
    }
}

fn merge_test(result: &mut TestConfig, over: &TestConfig) {
    merge_number(&mut result.timeout, over.timeout);
    merge_number(&mut result.parallel, over.parallel);
    merge_string(&mut result.output_dir, &over.output_dir);
    merge_string(&mut result.bench_time, &over.bench_time);
    merge_list(&mut result.tags, &over.tags);

    if over.has_signal() {
        result.coverage = over.coverage;
        result.verbose = over.verbose;
        result.race = over.race;
        result.mem_profile = over.mem_profile;
        result.cpu_profile = over.cpu_profile;
    }
}

fn merge_analytics(result: &mut AnalyticsConfig, over: &AnalyticsConfig) {
    if over.is_specified() {
        *result = over.clone();
    }
}

fn merge_string(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}

fn merge_number(target: &mut i64, value: i64) {
    if value != 0 {
        *target = value;
    }
}

fn merge_list(target: &mut Option<Vec<String>>, value: &Option<Vec<String>>) {
    if let Some(items) = value {
        *target = Some(items.clone());
    }
}

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use buildcfg::config::deep_merge;
///
/// let base = json!({
///     "build": { "platform": "linux/amd64", "go_version": "1.22" },
///     "test": { "tags": ["unit"] }
/// });
/// let overlay = json!({
///     "build": { "go_version": "1.24" },
///     "test": { "tags": ["integration"] }
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result["build"]["platform"], "linux/amd64");
/// assert_eq!(result["build"]["go_version"], "1.24");
/// assert_eq!(result["test"]["tags"], json!(["integration"]));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
