//! Configuration validation.

use super::types::Config;
use crate::error::ValidationError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Checks a resolved value before it is handed to the caller.
pub trait Validator<T>: Send + Sync {
    fn validate(&self, value: &T) -> Result<(), ValidationError>;
}

/// Validate a configuration; `None` stands for a missing configuration.
///
/// Rules, in order:
/// 1. project name and version are required
/// 2. a non-empty Go version must start with `1.` and be at least 4 characters
/// 3. the test timeout must not be negative
pub fn validate(config: Option<&Config>) -> Result<(), ValidationError> {
    let config = config.ok_or(ValidationError::ConfigNil)?;

    if config.project.name.is_empty() {
        return Err(ValidationError::MissingProjectName);
    }
    if config.project.version.is_empty() {
        return Err(ValidationError::MissingProjectVersion);
    }

    validate_go_version(&config.build.go_version)?;

    if config.test.timeout < 0 {
        return Err(ValidationError::NegativeTestTimeout(config.test.timeout));
    }

    Ok(())
}

/// Accepts `""` (unspecified), `1.20`, `1.24.1`; rejects `go1.20`, `v1.20`, `2.20`, `1.2`.
pub fn validate_go_version(version: &str) -> Result<(), ValidationError> {
    if version.is_empty() {
        return Ok(());
    }
    if version.len() < 4 || !version.starts_with("1.") {
        return Err(ValidationError::InvalidGoVersion(version.to_string()));
    }
    Ok(())
}

/// The standard rules for [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidator;

impl Validator<Config> for ConfigValidator {
    fn validate(&self, value: &Config) -> Result<(), ValidationError> {
        validate(Some(value))
    }
}

/// A single field check; the error string becomes the failure message.
pub type FieldRule = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Validates any serializable value against named per-field rules.
///
/// Fields are addressed by dotted path (`build.go_version`). Rules for fields
/// absent from the value are not run. Rules run in path order.
#[derive(Clone, Default)]
pub struct RuleValidator {
    rules: BTreeMap<String, FieldRule>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for `field`.
    pub fn add_rule<F>(&mut self, field: impl Into<String>, rule: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.insert(field.into(), Arc::new(rule));
    }

    pub fn with_rule<F>(mut self, field: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.add_rule(field, rule);
        self
    }

    /// Replace every rule.
    pub fn set_rules(&mut self, rules: BTreeMap<String, FieldRule>) {
        self.rules = rules;
    }

    /// A copy of the current rules; changing it does not affect the validator.
    pub fn rules(&self) -> BTreeMap<String, FieldRule> {
        self.rules.clone()
    }

    /// Check a single field value. Fields without a rule pass.
    pub fn validate_field(&self, field: &str, value: &Value) -> Result<(), ValidationError> {
        let Some(rule) = self.rules.get(field) else {
            return Ok(());
        };
        rule(value).map_err(|message| ValidationError::FieldRule {
            field: field.to_string(),
            message,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the rules against an already-serialized value.
    pub fn validate_value(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            return Err(ValidationError::ConfigNil);
        }
        for field in self.rules.keys() {
            if let Some(field_value) = lookup(value, field) {
                self.validate_field(field, field_value)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RuleValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleValidator")
            .field("fields", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Serialize> Validator<T> for RuleValidator {
    fn validate(&self, value: &T) -> Result<(), ValidationError> {
        let value = serde_json::to_value(value).map_err(|e| ValidationError::FieldRule {
            field: String::new(),
            message: format!("value cannot be inspected: {}", e),
        })?;
        self.validate_value(&value)
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}
