//! CLI argument parsing

use crate::config::{CliOverrides, DiagramMode, Direction};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate Mermaid class diagrams from Python codebases
#[derive(Parser, Debug)]
#[command(name = "classmap")]
#[command(about = "Generate Mermaid class diagrams from Python codebases")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a codebase and write its class diagram
    Diagram {
        /// Path to the codebase to scan
        path: PathBuf,

        /// Diagram kind (structure, callgraph)
        #[arg(short, long)]
        mode: Option<DiagramMode>,

        /// Layout direction (TB, TD, BT, LR, RL)
        #[arg(short, long)]
        direction: Option<Direction>,

        /// Output file, `-` for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Directory names to skip (can be repeated)
        #[arg(long = "exclude-dir")]
        exclude_dir: Vec<String>,

        /// Truncate the diagram to this many lines
        #[arg(long)]
        max_lines: Option<usize>,

        /// Name of the project-root node
        #[arg(long)]
        name: Option<String>,

        /// Parse files one at a time
        #[arg(long)]
        sequential: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the extracted model as JSON
    Inspect {
        /// Path to the codebase to scan
        path: PathBuf,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show version information
    Version,
}

impl Command {
    /// Config overrides carried by the `diagram` flags
    pub fn overrides(&self) -> CliOverrides {
        match self {
            Command::Diagram {
                mode,
                direction,
                output,
                exclude,
                exclude_dir,
                max_lines,
                name,
                sequential,
                ..
            } => CliOverrides {
                name: name.clone(),
                mode: *mode,
                direction: *direction,
                max_lines: *max_lines,
                output: output.clone(),
                exclude: exclude.clone(),
                exclude_dirs: exclude_dir.clone(),
                sequential: *sequential,
            },
            _ => CliOverrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagram_defaults() {
        let args = Args::try_parse_from(["classmap", "diagram", "./src"]).unwrap();
        match args.command {
            Command::Diagram {
                path,
                mode,
                direction,
                output,
                exclude,
                sequential,
                verbose,
                ..
            } => {
                assert_eq!(path, PathBuf::from("./src"));
                assert!(mode.is_none());
                assert!(direction.is_none());
                assert!(output.is_none());
                assert!(exclude.is_empty());
                assert!(!sequential);
                assert!(!verbose);
            }
            _ => panic!("Expected Diagram command"),
        }
    }

    #[test]
    fn test_diagram_with_options() {
        let args = Args::try_parse_from([
            "classmap", "diagram", "./project",
            "--mode", "callgraph",
            "--direction", "lr",
            "--output", "/tmp/out.mmd",
            "--config", "custom.toml",
            "--exclude", "tests/**",
            "--exclude-dir", "vendor",
            "--exclude-dir", "third_party",
            "--max-lines", "80",
            "--name", "shop",
            "--sequential",
            "--verbose",
        ])
        .unwrap();

        match args.command {
            Command::Diagram {
                ref path,
                mode,
                direction,
                ref config,
                verbose,
                ..
            } => {
                assert_eq!(path, &PathBuf::from("./project"));
                assert_eq!(mode, Some(DiagramMode::CallGraph));
                assert_eq!(direction, Some(Direction::Lr));
                assert_eq!(config, &Some(PathBuf::from("custom.toml")));
                assert!(verbose);
            }
            _ => panic!("Expected Diagram command"),
        }

        let overrides = args.command.overrides();
        assert_eq!(overrides.name.as_deref(), Some("shop"));
        assert_eq!(overrides.output, Some(PathBuf::from("/tmp/out.mmd")));
        assert_eq!(overrides.exclude, vec!["tests/**".to_string()]);
        assert_eq!(
            overrides.exclude_dirs,
            vec!["vendor".to_string(), "third_party".to_string()]
        );
        assert_eq!(overrides.max_lines, Some(80));
        assert!(overrides.sequential);
    }

    #[test]
    fn test_diagram_rejects_unknown_mode() {
        let result = Args::try_parse_from(["classmap", "diagram", ".", "--mode", "tree"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_diagram_requires_path() {
        assert!(Args::try_parse_from(["classmap", "diagram"]).is_err());
    }

    #[test]
    fn test_inspect() {
        let args = Args::try_parse_from(["classmap", "inspect", "./src", "--pretty"]).unwrap();
        match args.command {
            Command::Inspect { ref path, pretty, ref config } => {
                assert_eq!(path, &PathBuf::from("./src"));
                assert!(pretty);
                assert!(config.is_none());
            }
            _ => panic!("Expected Inspect command"),
        }
        assert!(args.command.overrides().mode.is_none());
    }

    #[test]
    fn test_version_command() {
        let args = Args::try_parse_from(["classmap", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));
    }
}
