use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub analysis: AnalysisConfig,
    pub diagram: DiagramConfig,
    pub output: OutputConfig,
}

/// Project metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Name of the project-root node; the scanned directory name when unset
    pub name: Option<String>,
}

/// Scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory names pruned from the walk
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against paths relative to the root
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    /// Files whose trimmed text is shorter than this are skipped
    pub min_source_chars: usize,
    pub max_file_bytes: u64,
    pub tolerate_syntax_errors: bool,
    pub parallel: bool,
}

/// Diagram settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub mode: DiagramMode,
    pub direction: Option<Direction>,
    pub max_lines: Option<usize>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `-` writes to stdout
    pub path: PathBuf,
}

/// Which diagram grammar to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagramMode {
    /// Properties, signatures, standalone functions and imports
    #[default]
    Structure,
    /// Constructor attributes, inheritance and cross-class calls
    #[serde(alias = "call-graph")]
    CallGraph,
}

/// Mermaid layout direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Tb,
    Td,
    Bt,
    Lr,
    Rl,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Direction::Tb => "TB",
            Direction::Td => "TD",
            Direction::Bt => "BT",
            Direction::Lr => "LR",
            Direction::Rl => "RL",
        };
        f.write_str(token)
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TB" => Ok(Direction::Tb),
            "TD" => Ok(Direction::Td),
            "BT" => Ok(Direction::Bt),
            "LR" => Ok(Direction::Lr),
            "RL" => Ok(Direction::Rl),
            other => Err(Error::config_validation(format!(
                "unknown direction '{}' (expected TB, TD, BT, LR or RL)",
                other
            ))),
        }
    }
}

impl FromStr for DiagramMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "structure" | "simple" => Ok(DiagramMode::Structure),
            "callgraph" | "call-graph" | "calls" => Ok(DiagramMode::CallGraph),
            other => Err(Error::config_validation(format!(
                "unknown diagram mode '{}' (expected structure or callgraph)",
                other
            ))),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                ".git",
                "__pycache__",
                "node_modules",
                ".venv",
                "venv",
                ".tox",
                ".eggs",
                "build",
                "dist",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: vec![],
            extensions: vec!["py".to_string()],
            min_source_chars: 0,
            max_file_bytes: 1024 * 1024,
            tolerate_syntax_errors: false,
            parallel: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("diagram.mmd"),
        }
    }
}

/// CLI overrides, applied on top of the file config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub name: Option<String>,
    pub mode: Option<DiagramMode>,
    pub direction: Option<Direction>,
    pub max_lines: Option<usize>,
    pub output: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub sequential: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file, falling back to defaults only when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(name) = cli.name {
            self.project.name = Some(name);
        }
        if let Some(mode) = cli.mode {
            self.diagram.mode = mode;
        }
        if let Some(direction) = cli.direction {
            self.diagram.direction = Some(direction);
        }
        if let Some(max) = cli.max_lines {
            self.diagram.max_lines = Some(max);
        }
        if let Some(out) = cli.output {
            self.output.path = out;
        }
        self.analysis.exclude.extend(cli.exclude);
        self.analysis.exclude_dirs.extend(cli.exclude_dirs);
        if cli.sequential {
            self.analysis.parallel = false;
        }
    }

    /// Direction to render with: explicit setting, else the mode's default
    pub fn effective_direction(&self) -> Option<Direction> {
        match (self.diagram.direction, self.diagram.mode) {
            (Some(d), _) => Some(d),
            (None, DiagramMode::CallGraph) => Some(Direction::Td),
            (None, DiagramMode::Structure) => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.extensions.is_empty() {
            return Err(Error::config_validation(
                "at least one source extension required",
            ));
        }

        if self.analysis.max_file_bytes == 0 {
            return Err(Error::config_validation("max_file_bytes must be at least 1"));
        }

        if let Some(max) = self.diagram.max_lines {
            if max < 2 {
                return Err(Error::config_validation("max_lines must be at least 2"));
            }
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}
