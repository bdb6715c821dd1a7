//! buildcfg
//!
//! Diagnostic command line over the configuration library.

use anyhow::{Context, Result, bail};
use buildcfg::cli::{Cli, Command, InitArgs, MergeArgs, OutputFormat, ResolveArgs, SearchArgs};
use buildcfg::config::{Config, ConfigLoader, FileCodec};
use buildcfg::logging::{self, LogTarget};
use buildcfg::paths::common_config_paths;
use clap::Parser;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let loader = ConfigLoader::shared();
    match cli.command {
        Command::Paths(args) => {
            let paths: Vec<String> = if args.common {
                common_config_paths(&args.search.name)
            } else {
                loader
                    .candidate_paths(&args.search.name, &args.search.dirs)
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect()
            };
            for path in paths {
                println!("{}", path);
            }
        }
        Command::Expand { path } => {
            println!("{}", loader.resolver().expand_path(&path));
        }
        Command::Resolve(args) => resolve(loader, &args)?,
        Command::Validate { file } => {
            let config = loader
                .load_from_path(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            loader.validate(&config)?;
            println!("{}: ok", file.display());
        }
        Command::Merge(args) => merge(loader, &args)?,
        Command::Defaults { format } => print_config(&loader.defaults(), format)?,
        Command::Init(args) => init(loader, &args)?,
    }

    Ok(())
}

fn resolve(loader: &ConfigLoader, args: &ResolveArgs) -> Result<()> {
    let SearchArgs { name, dirs } = &args.search;

    let (origin, config) = if args.overlay {
        let (path, config) = loader.load_with_env_overrides(name, &args.prefix, dirs)?;
        (path.display().to_string(), config)
    } else {
        let manager = loader.setup_manager(name, &args.prefix, dirs)?;
        debug!("Registered {} sources", manager.sources().len());
        let resolved = manager.load_config()?;
        (resolved.source, resolved.config)
    };

    if !args.no_validate {
        loader
            .validate(&config)
            .with_context(|| format!("configuration from {} is invalid", origin))?;
    }

    info!("Resolved configuration from {}", origin);
    eprintln!("# source: {}", origin);
    print_config(&config, args.format)
}

fn merge(loader: &ConfigLoader, args: &MergeArgs) -> Result<()> {
    let configs = args
        .files
        .iter()
        .map(|file| {
            loader
                .load_from_path(file)
                .with_context(|| format!("loading {}", file.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = loader.merge(&configs);
    match &args.output {
        Some(path) => {
            loader.save(&merged, path)?;
            println!("Wrote {}", path.display());
        }
        None => print_config(&merged, args.format)?,
    }
    Ok(())
}

fn init(loader: &ConfigLoader, args: &InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }

    let loader = if args.simple {
        loader.clone().with_codec(FileCodec::simple())
    } else {
        loader.clone()
    };
    loader.save(&loader.defaults(), &args.path)?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

fn print_config(config: &Config, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
        OutputFormat::Json => serde_json::to_string_pretty(config)? + "\n",
    };
    print!("{}", text);
    Ok(())
}
