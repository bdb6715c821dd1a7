//! Configuration resolution for build tooling.
//!
//! Locates configuration files across search directories, decodes YAML and
//! JSON, selects among prioritized file and environment sources, merges
//! partial configurations and validates the result.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod format;
pub mod logging;
pub mod paths;
