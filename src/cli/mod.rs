//! CLI command definitions for buildcfg
//!
//! The binary is a diagnostic front end over the library: it shows where
//! configuration would be looked up, which source wins, and what merging and
//! validation produce.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect and manage build-tool configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List candidate configuration paths
    Paths(PathsArgs),

    /// Expand `$HOME` in a path after security filtering
    Expand {
        /// Path to expand
        path: String,
    },

    /// Resolve configuration from the highest-priority available source
    Resolve(ResolveArgs),

    /// Validate a configuration file
    Validate {
        /// Configuration file
        file: PathBuf,
    },

    /// Merge configuration files, later files taking precedence
    Merge(MergeArgs),

    /// Print the default configuration
    Defaults {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Write the default configuration to a file
    Init(InitArgs),
}

/// Where to search and what to look for.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Base file name without extension
    #[arg(short, long, default_value = "buildcfg")]
    pub name: String,

    /// Search directory (repeatable; defaults to ., /etc, $HOME/.config, $HOME)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dirs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PathsArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// List the conventional locations for the name instead
    #[arg(long)]
    pub common: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Environment variable prefix; empty disables the environment source
    #[arg(short, long, default_value = "BUILDCFG")]
    pub prefix: String,

    /// Lay environment variables over the file instead of choosing one source
    #[arg(long)]
    pub overlay: bool,

    /// Skip validation of the resolved configuration
    #[arg(long)]
    pub no_validate: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Files to merge, lowest precedence first
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Write the result here instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format when printing
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination file; the extension picks the format
    #[arg(default_value = "buildcfg.yaml")]
    pub path: PathBuf,

    /// Write with mode 0644 instead of 0600
    #[arg(long)]
    pub simple: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Output format for printed configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}
