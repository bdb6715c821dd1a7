//! Integration tests for locating, reading and writing configuration files.
//!
//! Covers the loader facade end to end:
//! - search path construction and `$HOME` expansion
//! - YAML/JSON decoding and the extension-less fallback
//! - saving with file modes
//! - environment overlays

use buildcfg::config::{Config, ConfigLoader, FileCodec};
use buildcfg::env::{EnvProvider, MapEnv};
use buildcfg::error::{ConfigError, ErrorCode};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn loader_with_home(home: &str) -> ConfigLoader {
    ConfigLoader::with_env(Arc::new(MapEnv::from_pairs([("HOME", home)])))
}

fn populated_config() -> Config {
    let mut config = Config::defaults();
    config.project.description = "integration".into();
    config.project.authors = Some(vec!["dev@example.com".into()]);
    config.build.tags = Some(vec!["netgo".into(), "osusergo".into()]);
    config.build.cgo_enabled = true;
    config.test.tags = Some(vec!["unit".into()]);
    config.analytics.export_formats = Some(vec!["json".into(), "csv".into()]);
    config
        .analytics
        .endpoints
        .insert("primary".into(), "https://metrics.example.com".into());
    config.security.required_checks = vec!["lint".into()];
    config.deploy.strategy = "rolling".into();
    config
        .deploy
        .variables
        .insert("REGION".into(), "eu-west-1".into());
    config
}

#[test]
fn test_home_search_dir_is_expanded() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("tool.yml"), "project:\n  name: from-home\n").unwrap();

    let loader = loader_with_home(&home.path().to_string_lossy());
    let (path, config): (PathBuf, Config) = loader
        .load_from_paths("tool", &["/nonexistent-buildcfg-dir", "$HOME/.config"])
        .unwrap();

    assert_eq!(path, config_dir.join("tool.yml"));
    assert_eq!(config.project.name, "from-home");
}

#[test]
fn test_extensionless_file_falls_back_to_yaml() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tool"), "build:\n  platform: darwin/arm64\n").unwrap();

    let loader = loader_with_home("/home/user");
    let dirs = [temp.path().to_string_lossy().into_owned()];
    let (path, config): (PathBuf, Config) = loader.load_from_paths("tool", &dirs).unwrap();
    assert_eq!(path, temp.path().join("tool"));
    assert_eq!(config.build.platform, "darwin/arm64");
}

#[test]
fn test_broken_candidate_is_skipped() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tool.yaml"), "project: [oops").unwrap();
    fs::write(temp.path().join("tool.json"), r#"{"project":{"name":"json"}}"#).unwrap();

    let loader = loader_with_home("/home/user");
    let dirs = [temp.path().to_string_lossy().into_owned()];
    let (path, config): (PathBuf, Config) = loader.load_from_paths("tool", &dirs).unwrap();
    assert_eq!(path, temp.path().join("tool.json"));
    assert_eq!(config.project.name, "json");
}

#[test]
fn test_unknown_content_is_unsupported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tool.toml");
    fs::write(&path, "[project]\nname = \"toml\"\n").unwrap();

    let loader = loader_with_home("/home/user");
    let err = loader.load_from_path(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
}

#[test]
fn test_missing_file() {
    let loader = loader_with_home("/home/user");
    let err = loader.load_from_path("/nonexistent-buildcfg/app.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn test_yaml_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out/app.yaml");
    let config = populated_config();

    let loader = loader_with_home("/home/user");
    loader.save(&config, &path).unwrap();
    assert_eq!(loader.load_from_path(&path).unwrap(), config);
}

#[test]
fn test_json_round_trip_with_codec() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.json");
    let config = populated_config();

    let codec = FileCodec::new();
    codec.save(&path, &config, "JSON").unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  \"project\""));

    let loaded: Config = codec.load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.toml");
    let err = FileCodec::new()
        .save(&path, &Config::default(), "toml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn test_saved_file_modes() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let hardened = temp.path().join("hardened.yaml");
    let simple = temp.path().join("nested/simple.yaml");

    loader_with_home("/home/user")
        .save(&Config::default(), &hardened)
        .unwrap();
    loader_with_home("/home/user")
        .with_codec(FileCodec::simple())
        .save(&Config::default(), &simple)
        .unwrap();

    let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&hardened), 0o600);
    assert_eq!(mode(&simple), 0o644);
}

#[test]
fn test_env_overlay_leaves_opaque_sections() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("svc.yaml"),
        concat!(
            "project:\n  name: svc\n  version: 1.0.0\n",
            "deploy:\n  strategy: canary\n",
            "analytics:\n  sample_rate: 0.5\n",
        ),
    )
    .unwrap();

    let env = Arc::new(MapEnv::from_pairs([
        ("SVC_ANALYTICS_SAMPLE_RATE", "0.25"),
        ("SVC_TEST_RACE", "yes"),
        ("SVC_TEST_TIMEOUT", "not-a-number"),
    ]));
    let loader = ConfigLoader::with_env(env);
    let dirs = [temp.path().to_string_lossy().into_owned()];
    let (_, config) = loader.load_with_env_overrides("svc", "SVC", &dirs).unwrap();

    assert_eq!(config.deploy.strategy, "canary");
    assert_eq!(config.analytics.sample_rate, 0.25);
    assert!(config.test.race);
    assert_eq!(config.test.timeout, 0);
}

#[test]
fn test_env_accessor_getters() {
    let env = MapEnv::from_pairs([
        ("FLAG", "Enabled"),
        ("COUNT", "99999999999"),
        ("RATE", "0.75"),
        ("WAIT", "1m30s"),
        ("LIST", " a, ,b ,c "),
        ("APP_ONE", "1"),
        ("APP_TWO", "2"),
    ]);

    assert!(env.get_bool("FLAG", false));
    assert!(env.get_bool("MISSING", true));
    assert_eq!(env.get_int("COUNT", 7), 7);
    assert_eq!(env.get_i64("COUNT", 7), 99_999_999_999);
    assert_eq!(env.get_f64("RATE", 0.0), 0.75);
    assert_eq!(env.get_duration("WAIT", Duration::ZERO), Duration::from_secs(90));
    assert_eq!(env.get_string_slice("LIST", &[]), vec!["a", "b", "c"]);
    assert_eq!(env.get_with_prefix("APP_").len(), 2);

    env.unset("FLAG").unwrap();
    assert_eq!(env.lookup("FLAG"), None);
    assert_eq!(env.get_with_default("FLAG", "fallback"), "fallback");
}

#[test]
fn test_expand_path_is_idempotent_without_home() {
    let loader = loader_with_home("/home/user");
    for input in ["/etc/app.yaml", "config/app.yaml", "./x", "/opt/c++", "%2Ftmp"] {
        let once = loader.resolver().expand_path(input);
        let twice = loader.resolver().expand_path(&once);
        if !input.contains('%') {
            assert_eq!(once, input);
        }
        assert_eq!(twice, loader.resolver().expand_path(&twice));
    }
}
