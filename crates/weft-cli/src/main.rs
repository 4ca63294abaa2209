//! Weft CLI - Command line driver for the aspect weaving pass
//!
//! Compilation units are read as JSON (the host pipeline's parser produces
//! them); woven units are written back as canonical source or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::debug;

use weft_ast::{print_unit, CompilationUnit};
use weft_weaver::{ConfigError, Severity, TriggerSet, WeaveSession, WeaveSettings, WeftConfig};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Compile-time aspect weaver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weave a set of units as one build and print the result
    Weave {
        /// Unit files (JSON)
        files: Vec<PathBuf>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Trigger allow-list, overrides the one named in the config
        #[arg(short, long)]
        supports: Option<PathBuf>,
        /// Emit woven units as JSON instead of source
        #[arg(long)]
        json: bool,
        /// Pretty print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print a unit as source without weaving it
    Print {
        /// Unit file (JSON)
        file: PathBuf,
    },
    /// Resolve triggers over a set of units and list the final set
    Triggers {
        /// Unit files (JSON)
        files: Vec<PathBuf>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid unit {path}: {source}")]
    Unit {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Weave {
            files,
            config,
            supports,
            json,
            pretty,
        } => cmd_weave(&files, config.as_deref(), supports, json, pretty),
        Commands::Print { file } => cmd_print(&file),
        Commands::Triggers { files, config } => cmd_triggers(&files, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG`
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weft=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(config: Option<&Path>) -> Result<WeaveSettings, CliError> {
    match config {
        Some(path) => Ok(WeftConfig::from_file(path)?.weave),
        None => Ok(WeaveSettings::default()),
    }
}

fn load_units(files: &[PathBuf]) -> Result<Vec<CompilationUnit>, CliError> {
    files
        .iter()
        .map(|path| {
            let source = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let unit = serde_json::from_str(&source).map_err(|source| CliError::Unit {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "loaded unit");
            Ok(unit)
        })
        .collect()
}

fn cmd_weave(
    files: &[PathBuf],
    config: Option<&Path>,
    supports: Option<PathBuf>,
    json: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let mut settings = load_settings(config)?;
    if let Some(path) = supports {
        settings.supports_file = Some(path);
    }
    let mut units = load_units(files)?;
    let mut session = WeaveSession::new(settings)?;
    let reports = session.weave_build(&mut units);

    let mut errors = 0;
    for report in &reports {
        for diagnostic in &report.diagnostics {
            if diagnostic.severity == Severity::Error {
                errors += 1;
            }
            eprintln!("{}", diagnostic);
        }
    }

    if json {
        let out = if pretty {
            serde_json::to_string_pretty(&units)?
        } else {
            serde_json::to_string(&units)?
        };
        println!("{}", out);
    } else {
        for (unit, report) in units.iter().zip(&reports) {
            println!("// {}", unit.path);
            print!("{}", print_unit(unit));
            eprintln!(
                "{}: {} woven, {} already woven, {} rejected",
                report.path,
                report.woven().len(),
                report.already_woven().len(),
                report.rejected().len()
            );
        }
    }

    if errors > 0 {
        eprintln!("{} element(s) skipped on internal errors", errors);
    }
    Ok(())
}

fn cmd_print(file: &Path) -> Result<(), CliError> {
    let units = load_units(&[file.to_path_buf()])?;
    for unit in &units {
        print!("{}", print_unit(unit));
    }
    Ok(())
}

fn cmd_triggers(files: &[PathBuf], config: Option<&Path>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let units = load_units(files)?;
    let mut session = WeaveSession::new(settings)?;
    let triggers: &TriggerSet = session.discover_triggers(&units);
    for name in triggers.iter() {
        println!("{}", name);
    }
    Ok(())
}
