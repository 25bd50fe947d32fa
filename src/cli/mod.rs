//! CLI module for classmap

mod args;

pub use args::{Args, Command};

use crate::analysis::{AnalysisResult, Analyzer};
use crate::config::Config;
use crate::error::Result;
use crate::output::{generate, write_output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "classmap.toml";

/// Skipped files listed in the run summary
const SKIPPED_SHOWN: usize = 5;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    let overrides = args.command.overrides();

    match args.command {
        Command::Diagram {
            path,
            config,
            verbose,
            ..
        } => {
            init_logging(verbose);

            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(overrides);
            cfg.validate()?;

            let analyzer = Analyzer::new(&cfg)?.with_verbose(verbose);
            let result = analyzer.analyze(&path)?;

            let text = generate(&result.model, &cfg, &result.project_name)?;
            write_output(&text, &cfg.output.path)?;

            print_summary(&result, &cfg.output.path);
            Ok(())
        }

        Command::Inspect {
            path,
            config,
            pretty,
        } => {
            init_logging(false);

            let cfg = load_config(config.as_deref())?;
            let result = Analyzer::new(&cfg)?.analyze(&path)?;

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
            Ok(())
        }

        Command::Version => {
            println!("classmap {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests driving `execute` twice) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Explicit config must exist; the default file is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p),
        None => Config::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

fn print_summary(result: &AnalysisResult, output: &Path) {
    let classes = result.model.classes().count();
    let functions = result.model.functions().count();
    let destination = if output == Path::new("-") {
        "stdout".to_string()
    } else {
        output.display().to_string()
    };

    eprintln!(
        "Scanned {} files: {} classes, {} functions, {} skipped -> {}",
        result.files_scanned,
        classes,
        functions,
        result.skipped.len(),
        destination
    );

    for (path, reason) in result.skipped.iter().take(SKIPPED_SHOWN) {
        eprintln!("  skipped {}: {}", path, reason);
    }
    if result.skipped.len() > SKIPPED_SHOWN {
        eprintln!("  ... and {} more", result.skipped.len() - SKIPPED_SHOWN);
    }
}
