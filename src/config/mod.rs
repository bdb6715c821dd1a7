//! Build-tool configuration.
//!
//! The pieces, bottom-up:
//! - [`types`]: the typed configuration tree
//! - [`files`]: reading and writing YAML/JSON files
//! - [`env_schema`]: binding `{PREFIX}_*` environment variables onto fields
//! - [`source`] and [`manager`]: priority-ordered, first-match source selection
//! - [`merge`]: folding partial configurations
//! - [`validate`]: required-field and format checks
//! - [`loader`]: the facade tying them together
//!
//! ## Environment Variables
//! - `BUILDCFG_GO_VERSION` - Default Go version (`.x` suffix stripped)
//! - `GO_PRIMARY_VERSION` - Legacy fallback for the above
//! - `{PREFIX}_{SECTION}_{FIELD}` - Per-field overrides, e.g. `APP_BUILD_GO_VERSION`

mod defaults;
mod env_schema;
mod files;
mod loader;
mod manager;
mod merge;
mod source;
mod types;
mod validate;
mod watcher;

pub use defaults::{
    FALLBACK_GO_VERSION, GO_VERSION_ENV, LEGACY_GO_VERSION_ENV, default_go_version,
};
pub use env_schema::{EnvBinding, EnvSchema, ValueKind};
pub use files::{DIR_MODE, FileCodec, HARDENED_FILE_MODE, SIMPLE_FILE_MODE, SUPPORTED_FORMATS};
pub use loader::ConfigLoader;
pub use manager::{ConfigManager, Resolved};
pub use merge::{deep_merge, deep_merge_all, merge, merge_into};
pub use source::{ENV_SOURCE_PRIORITY, EnvSource, FILE_SOURCE_BASE_PRIORITY, FileSource, Source};
pub use types::*;
pub use validate::{
    ConfigValidator, FieldRule, RuleValidator, Validator, validate, validate_go_version,
};
pub use watcher::{NotifyOutcome, WatchSession, WatchSignal};
