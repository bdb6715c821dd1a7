//! Declarative environment bindings.
//!
//! An [`EnvSchema`] maps environment variable names onto dotted field paths of
//! the destination value (`TEST_TIMEOUT` → `test.timeout`). Bound values are
//! assembled into a JSON object and deserialized with serde, so any
//! `Deserialize` type can be populated without reflection. Schemas are checked
//! when they are built; a malformed schema never reaches a load.

use crate::env::{EnvProvider, parse_bool, split_list};
use crate::error::{ConfigError, ConfigResult};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::warn;

/// How a bound variable's text is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Bool,
    Int,
    Float,
    /// Comma-separated list, trimmed, empties dropped.
    List,
}

/// One variable bound to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    /// Dotted field path, e.g. `build.go_version`.
    pub field: String,
    /// Variable name without the schema prefix, e.g. `BUILD_GO_VERSION`.
    pub var: String,
    pub kind: ValueKind,
}

impl EnvBinding {
    pub fn new(field: impl Into<String>, var: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            field: field.into(),
            var: var.into(),
            kind,
        }
    }

    /// Binding whose variable name is the upper-cased field path with `.` → `_`.
    pub fn derived(field: &str, kind: ValueKind) -> Self {
        Self::new(field, field.replace('.', "_").to_uppercase(), kind)
    }
}

/// A validated set of bindings sharing a variable prefix.
#[derive(Debug, Clone)]
pub struct EnvSchema {
    prefix: String,
    bindings: Vec<EnvBinding>,
}

impl EnvSchema {
    /// Build a schema, rejecting malformed names, duplicates, and fields that
    /// are both a leaf and a parent of another binding.
    pub fn new(prefix: &str, bindings: Vec<EnvBinding>) -> ConfigResult<Self> {
        let prefix_re = compile(r"^[A-Z0-9_]*$")?;
        let var_re = compile(r"^[A-Z0-9_]+$")?;
        let field_re = compile(r"^[a-z0-9_]+(\.[a-z0-9_]+)*$")?;

        if !prefix_re.is_match(prefix) {
            return Err(ConfigError::InvalidBinding(format!(
                "prefix {:?} must be upper-case letters, digits or underscores",
                prefix
            )));
        }

        check_unique(&bindings)?;
        for binding in &bindings {
            if !field_re.is_match(&binding.field) {
                return Err(ConfigError::InvalidBinding(format!(
                    "field path {:?} is not a dotted lower-case path",
                    binding.field
                )));
            }
            if !var_re.is_match(&binding.var) {
                return Err(ConfigError::InvalidBinding(format!(
                    "variable {:?} for field {} must be upper-case letters, digits or underscores",
                    binding.var, binding.field
                )));
            }
        }

        for binding in &bindings {
            let nested = format!("{}.", binding.field);
            if let Some(child) = bindings.iter().find(|b| b.field.starts_with(&nested)) {
                return Err(ConfigError::InvalidBinding(format!(
                    "field {} is bound as a value and as the parent of {}",
                    binding.field, child.field
                )));
            }
        }

        Ok(Self {
            prefix: prefix.to_string(),
            bindings,
        })
    }

    /// Bindings for every scalar and list field of [`crate::config::Config`]
    /// outside the opaque sections.
    pub fn standard(prefix: &str) -> ConfigResult<Self> {
        use ValueKind as K;

        let fields: &[(&str, ValueKind)] = &[
            ("project.name", K::String),
            ("project.version", K::String),
            ("project.description", K::String),
            ("project.authors", K::List),
            ("project.license", K::String),
            ("project.homepage", K::String),
            ("project.repository", K::String),
            ("build.go_version", K::String),
            ("build.platform", K::String),
            ("build.tags", K::List),
            ("build.ldflags", K::String),
            ("build.gcflags", K::String),
            ("build.cgo_enabled", K::Bool),
            ("build.output_dir", K::String),
            ("build.binary", K::String),
            ("test.timeout", K::Int),
            ("test.coverage", K::Bool),
            ("test.verbose", K::Bool),
            ("test.race", K::Bool),
            ("test.parallel", K::Int),
            ("test.tags", K::List),
            ("test.output_dir", K::String),
            ("test.bench_time", K::String),
            ("test.mem_profile", K::Bool),
            ("test.cpu_profile", K::Bool),
            ("analytics.enabled", K::Bool),
            ("analytics.sample_rate", K::Float),
            ("analytics.retention_days", K::Int),
            ("analytics.export_formats", K::List),
            ("analytics.batch_size", K::Int),
            ("analytics.flush_interval", K::Int),
        ];

        let bindings = fields
            .iter()
            .map(|(field, kind)| EnvBinding::derived(field, *kind))
            .collect();
        Self::new(prefix, bindings)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn bindings(&self) -> &[EnvBinding] {
        &self.bindings
    }

    /// Full variable name for a binding (`{PREFIX}_{VAR}`).
    pub fn var_name(&self, binding: &EnvBinding) -> String {
        if self.prefix.is_empty() {
            binding.var.clone()
        } else {
            format!("{}_{}", self.prefix, binding.var)
        }
    }

    /// Whether at least one bound variable is set to a non-empty value.
    pub fn any_set(&self, env: &dyn EnvProvider) -> bool {
        self.bindings
            .iter()
            .any(|b| !env.get(&self.var_name(b)).is_empty())
    }

    /// Nested JSON object holding every bound variable that is set and parses.
    ///
    /// Values that do not parse as their declared kind are skipped with a warning.
    pub fn collect(&self, env: &dyn EnvProvider) -> Value {
        let mut root = Map::new();
        for binding in &self.bindings {
            let name = self.var_name(binding);
            let raw = env.get(&name);
            if raw.is_empty() {
                continue;
            }
            match convert(&raw, binding.kind) {
                Some(value) => insert_path(&mut root, &binding.field, value),
                None => warn!(
                    "Ignoring {}: {:?} is not a valid {:?} for {}",
                    name, raw, binding.kind, binding.field
                ),
            }
        }
        Value::Object(root)
    }

    /// Deserialize the bound variables into `T`. Unbound fields take `T`'s defaults.
    pub fn bind<T: DeserializeOwned>(&self, env: &dyn EnvProvider) -> ConfigResult<T> {
        serde_json::from_value(self.collect(env)).map_err(|e| {
            ConfigError::InvalidBinding(format!(
                "environment values with prefix {:?} do not fit the destination: {}",
                self.prefix, e
            ))
        })
    }
}

fn check_unique(bindings: &[EnvBinding]) -> ConfigResult<()> {
    let mut fields = HashSet::new();
    let mut vars = HashSet::new();
    for binding in bindings {
        if !fields.insert(binding.field.as_str()) {
            return Err(ConfigError::InvalidBinding(format!(
                "field {} is bound more than once",
                binding.field
            )));
        }
        if !vars.insert(binding.var.as_str()) {
            return Err(ConfigError::InvalidBinding(format!(
                "variable {} is bound more than once",
                binding.var
            )));
        }
    }
    Ok(())
}

fn compile(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidBinding(e.to_string()))
}

fn convert(raw: &str, kind: ValueKind) -> Option<Value> {
    match kind {
        ValueKind::String => Some(Value::String(raw.to_string())),
        ValueKind::Bool => parse_bool(raw).map(Value::Bool),
        ValueKind::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ValueKind::List => {
            let items = split_list(raw);
            if items.is_empty() {
                None
            } else {
                Some(Value::from(items))
            }
        }
    }
}

fn insert_path(root: &mut Map<String, Value>, field: &str, value: Value) {
    let mut segments: Vec<&str> = field.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut cursor = root;
    for segment in segments {
        let entry = cursor
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(map) => cursor = map,
            // Unreachable for validated schemas: leaves never share a path with parents.
            _ => return,
        }
    }
    cursor.insert(leaf.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::MapEnv;

    #[test]
    fn test_derived_var_name() {
        let b = EnvBinding::derived("build.go_version", ValueKind::String);
        assert_eq!(b.var, "BUILD_GO_VERSION");
    }

    #[test]
    fn test_standard_schema_binds_config() {
        let schema = EnvSchema::standard("APP").unwrap();
        let env = MapEnv::from_pairs([
            ("APP_PROJECT_NAME", "from-env"),
            ("APP_BUILD_TAGS", "netgo, osusergo"),
            ("APP_BUILD_CGO_ENABLED", "yes"),
            ("APP_TEST_TIMEOUT", "90"),
            ("APP_ANALYTICS_SAMPLE_RATE", "0.5"),
            ("UNRELATED", "x"),
        ]);

        let config: Config = schema.bind(&env).unwrap();
        assert_eq!(config.project.name, "from-env");
        assert_eq!(
            config.build.tags,
            Some(vec!["netgo".to_string(), "osusergo".to_string()])
        );
        assert!(config.build.cgo_enabled);
        assert_eq!(config.test.timeout, 90);
        assert_eq!(config.analytics.sample_rate, 0.5);
        assert_eq!(config.project.version, "");
    }

    #[test]
    fn test_invalid_values_skipped() {
        let schema = EnvSchema::standard("APP").unwrap();
        let env = MapEnv::from_pairs([
            ("APP_TEST_TIMEOUT", "soon"),
            ("APP_TEST_RACE", "perhaps"),
            ("APP_ANALYTICS_SAMPLE_RATE", "NaN"),
            ("APP_TEST_TAGS", " , "),
        ]);
        let collected = schema.collect(&env);
        assert_eq!(collected, Value::Object(Map::new()));
        assert!(schema.any_set(&env));
    }

    #[test]
    fn test_any_set_ignores_empty_values() {
        let schema = EnvSchema::standard("APP").unwrap();
        let env = MapEnv::from_pairs([("APP_PROJECT_NAME", "")]);
        assert!(!schema.any_set(&env));
    }

    #[test]
    fn test_empty_prefix() {
        let schema = EnvSchema::new(
            "",
            vec![EnvBinding::new("name", "NAME", ValueKind::String)],
        )
        .unwrap();
        assert_eq!(schema.var_name(&schema.bindings()[0]), "NAME");
    }

    #[test]
    fn test_rejects_malformed_schemas() {
        let bad_prefix = EnvSchema::new("app", vec![]);
        assert!(matches!(bad_prefix, Err(ConfigError::InvalidBinding(_))));

        let bad_field = EnvSchema::new(
            "APP",
            vec![EnvBinding::new("Build..tags", "TAGS", ValueKind::List)],
        );
        assert!(bad_field.is_err());

        let bad_var = EnvSchema::new(
            "APP",
            vec![EnvBinding::new("build.tags", "build-tags", ValueKind::List)],
        );
        assert!(bad_var.is_err());

        let duplicate_field = EnvSchema::new(
            "APP",
            vec![
                EnvBinding::new("build.tags", "A", ValueKind::List),
                EnvBinding::new("build.tags", "B", ValueKind::List),
            ],
        );
        assert!(duplicate_field.is_err());

        let duplicate_var = EnvSchema::new(
            "APP",
            vec![
                EnvBinding::new("build.tags", "A", ValueKind::List),
                EnvBinding::new("test.tags", "A", ValueKind::List),
            ],
        );
        assert!(duplicate_var.is_err());

        let leaf_and_parent = EnvSchema::new(
            "APP",
            vec![
                EnvBinding::new("build", "BUILD", ValueKind::String),
                EnvBinding::new("build.tags", "TAGS", ValueKind::List),
            ],
        );
        assert!(leaf_and_parent.is_err());
    }

    #[test]
    fn test_bind_type_mismatch_is_error() {
        let schema = EnvSchema::new(
            "APP",
            vec![EnvBinding::new("project.name", "NAME", ValueKind::Int)],
        )
        .unwrap();
        let env = MapEnv::from_pairs([("APP_NAME", "5")]);
        let err = schema.bind::<Config>(&env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBinding(_)));
    }
}
