//! Environment accessors.
//!
//! [`EnvProvider`] is the narrow surface collaborators use to read (and, rarely,
//! write) environment variables. Typed getters never fail: anything that does not
//! parse yields the caller's default.
//!
//! Two implementations are provided:
//! - [`OsEnv`] reads the process environment
//! - [`MapEnv`] is an in-memory map, useful for tests and embedding

use crate::error::{ConfigError, ConfigResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

/// Read/write access to a set of environment variables.
pub trait EnvProvider: Send + Sync {
    /// Look up a variable, reporting whether it is set.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Set a variable.
    fn set(&self, key: &str, value: &str) -> ConfigResult<()>;

    /// Remove a variable. Removing an unset variable is not an error.
    fn unset(&self, key: &str) -> ConfigResult<()>;

    /// Snapshot of every variable.
    fn get_all(&self) -> HashMap<String, String>;

    /// Value of a variable, or the empty string when unset.
    fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    fn get_with_default(&self, key: &str, default: &str) -> String {
        match self.lookup(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }

    /// Boolean value; accepts true/1/yes/on/enabled and false/0/no/off/disabled.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = self.get(key);
        if value.is_empty() {
            return default;
        }
        parse_bool(&value).unwrap_or(default)
    }

    /// 32-bit integer value. Values outside the `i32` range yield `default`;
    /// use [`get_i64`](Self::get_i64) for the full 64-bit range.
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key).parse().unwrap_or(default)
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get(key).parse().unwrap_or(default)
    }

    fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).parse().unwrap_or(default)
    }

    /// Duration in Go notation (`300ms`, `1.5h`, `2h45m`).
    fn get_duration(&self, key: &str, default: Duration) -> Duration {
        parse_duration(&self.get(key)).unwrap_or(default)
    }

    /// Comma-separated list; elements are trimmed and empty ones dropped.
    fn get_string_slice(&self, key: &str, default: &[String]) -> Vec<String> {
        let items = split_list(&self.get(key));
        if items.is_empty() {
            default.to_vec()
        } else {
            items
        }
    }

    /// Every variable whose name starts with `prefix`.
    fn get_with_prefix(&self, prefix: &str) -> HashMap<String, String> {
        self.get_all()
            .into_iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .collect()
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl EnvProvider for OsEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        if !is_valid_key(key) {
            return None;
        }
        std::env::var(key).ok()
    }

    /// Mutating the process environment is only sound while no other thread
    /// reads it; callers own that guarantee (typically at startup).
    fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        check_key(key)?;
        if value.contains('\0') {
            return Err(ConfigError::InvalidBinding(format!(
                "value for {} contains a NUL byte",
                key
            )));
        }
        // SAFETY: see the method contract above.
        unsafe {
            std::env::set_var(key, value);
        }
        Ok(())
    }

    fn unset(&self, key: &str) -> ConfigResult<()> {
        check_key(key)?;
        // SAFETY: same contract as `set`.
        unsafe {
            std::env::remove_var(key);
        }
        Ok(())
    }

    fn get_all(&self) -> HashMap<String, String> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// An in-memory environment.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: RwLock::new(vars),
        }
    }
}

impl EnvProvider for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        check_key(key)?;
        self.vars.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&self, key: &str) -> ConfigResult<()> {
        check_key(key)?;
        self.vars.write().remove(key);
        Ok(())
    }

    fn get_all(&self) -> HashMap<String, String> {
        self.vars.read().clone()
    }
}

/// Strip an inline ` #` comment and surrounding whitespace from a raw value.
pub fn clean_env_value(value: &str) -> &str {
    let value = match value.find(" #") {
        Some(idx) => &value[..idx],
        None => value,
    };
    value.trim()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a Go-style duration string. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return None;
    }
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." {
            return None;
        }
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return None,
        };

        let (whole, frac) = match number.split_once('.') {
            Some((w, f)) => (w, f),
            None => (number, ""),
        };
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().ok()?
        };
        let mut nanos = whole.checked_mul(scale)?;
        if !frac.is_empty() {
            // Truncate to the precision that can still matter at nanosecond scale.
            let digits = &frac[..frac.len().min(18)];
            let frac_value: u128 = digits.parse().ok()?;
            let divisor = 10u128.pow(digits.len() as u32);
            nanos = nanos.checked_add(frac_value.checked_mul(scale)? / divisor)?;
        }
        total_nanos = total_nanos.checked_add(nanos)?;
    }

    // Go durations are int64 nanoseconds.
    if total_nanos > i64::MAX as u128 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos as u64))
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.contains('\0')
}

fn check_key(key: &str) -> ConfigResult<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(ConfigError::InvalidBinding(format!(
            "invalid environment variable name: {:?}",
            key
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> MapEnv {
        MapEnv::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_get_and_default() {
        let e = env(&[("A", "x"), ("EMPTY", "")]);
        assert_eq!(e.get("A"), "x");
        assert_eq!(e.get("MISSING"), "");
        assert_eq!(e.get_with_default("MISSING", "d"), "d");
        assert_eq!(e.get_with_default("EMPTY", "d"), "d");
        assert_eq!(e.lookup("EMPTY"), Some(String::new()));
    }

    #[test]
    fn test_get_bool_variants() {
        let e = env(&[
            ("T1", "TRUE"),
            ("T2", "Enabled"),
            ("T3", "on"),
            ("F1", "0"),
            ("F2", "Disabled"),
            ("BAD", "maybe"),
        ]);
        assert!(e.get_bool("T1", false));
        assert!(e.get_bool("T2", false));
        assert!(e.get_bool("T3", false));
        assert!(!e.get_bool("F1", true));
        assert!(!e.get_bool("F2", true));
        assert!(e.get_bool("BAD", true));
        assert!(!e.get_bool("BAD", false));
        assert!(e.get_bool("MISSING", true));
    }

    #[test]
    fn test_numeric_getters_fall_back() {
        let e = env(&[
            ("INT", "42"),
            ("OVERFLOW", "99999999999"),
            ("BIG", "9223372036854775807"),
            ("FLOAT", "0.25"),
            ("JUNK", "12abc"),
        ]);
        assert_eq!(e.get_int("INT", 0), 42);
        assert_eq!(e.get_int("OVERFLOW", 7), 7);
        assert_eq!(e.get_i64("OVERFLOW", 7), 99_999_999_999);
        assert_eq!(e.get_int("MISSING", -3), -3);
        assert_eq!(e.get_i64("BIG", 0), i64::MAX);
        assert_eq!(e.get_i64("JUNK", -1), -1);
        assert_eq!(e.get_f64("FLOAT", 0.0), 0.25);
        assert_eq!(e.get_f64("JUNK", 1.5), 1.5);
    }

    #[test]
    fn test_get_duration() {
        let e = env(&[
            ("WAIT", "2h45m"),
            ("SHORT", "300ms"),
            ("BAD", "ten seconds"),
            ("NEG", "-5s"),
        ]);
        let fallback = Duration::from_secs(7);
        assert_eq!(e.get_duration("WAIT", fallback), Duration::from_secs(9900));
        assert_eq!(e.get_duration("SHORT", fallback), Duration::from_millis(300));
        assert_eq!(e.get_duration("BAD", fallback), fallback);
        assert_eq!(e.get_duration("NEG", fallback), fallback);
        assert_eq!(e.get_duration("MISSING", fallback), fallback);
    }

    #[test]
    fn test_string_slice() {
        let e = env(&[("LIST", " a, b ,,c "), ("COMMAS", " , ,")]);
        assert_eq!(e.get_string_slice("LIST", &[]), vec!["a", "b", "c"]);
        let default = vec!["x".to_string()];
        assert_eq!(e.get_string_slice("COMMAS", &default), default);
        assert_eq!(e.get_string_slice("MISSING", &default), default);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(
            parse_duration("2h45m"),
            Some(Duration::from_secs(2 * 3600 + 45 * 60))
        );
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("-1s"), None);
        assert_eq!(parse_duration("1x"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("99999999999h"), None);
    }

    #[test]
    fn test_set_unset_and_prefix() {
        let e = MapEnv::new();
        e.set("APP_ONE", "1").unwrap();
        e.set("APP_TWO", "2").unwrap();
        e.set("OTHER", "3").unwrap();
        assert_eq!(e.get_with_prefix("APP_").len(), 2);
        e.unset("APP_ONE").unwrap();
        assert_eq!(e.lookup("APP_ONE"), None);
        assert!(e.set("BAD=KEY", "v").is_err());
        assert!(e.unset("").is_err());
    }

    #[test]
    fn test_clean_env_value() {
        assert_eq!(clean_env_value("  1.22 # pinned "), "1.22");
        assert_eq!(clean_env_value("1.22#not-a-comment"), "1.22#not-a-comment");
        assert_eq!(clean_env_value(""), "");
    }
}
