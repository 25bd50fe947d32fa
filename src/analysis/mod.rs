// Analysis module: repository scan and relationship extraction

pub mod relations;

pub use relations::*;

use crate::config::{AnalysisConfig, Config};
use crate::error::{Error, Result};
use crate::parser::{decode_lossy, FileRecord, PythonParser, RepositoryModel};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Why a file contributed nothing to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    TooShort { chars: usize, min: usize },
    TooLarge { bytes: u64, max: u64 },
    Unreadable(String),
    Unparsable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "file is empty"),
            SkipReason::TooShort { chars, min } => {
                write!(f, "file too short to analyze ({} < {} chars)", chars, min)
            }
            SkipReason::TooLarge { bytes, max } => {
                write!(f, "file too large ({} > {} bytes)", bytes, max)
            }
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::Unparsable(e) => write!(f, "unparsable: {}", e),
        }
    }
}

/// Result of scanning a repository
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub model: RepositoryModel,
    /// Relative path -> reason, for files that contributed nothing
    pub skipped: BTreeMap<String, SkipReason>,
    /// Name of the scanned directory
    pub project_name: String,
    pub files_scanned: usize,
}

/// Outcome of processing a single file
struct FileOutcome {
    path: String,
    record: Option<FileRecord>,
    skipped: Option<SkipReason>,
}

impl FileOutcome {
    fn parsed(record: FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            record: Some(record),
            skipped: None,
        }
    }

    fn skipped(path: String, reason: SkipReason) -> Self {
        Self {
            path,
            record: None,
            skipped: Some(reason),
        }
    }
}

/// Walks a source tree and builds the repository model
pub struct Analyzer {
    config: AnalysisConfig,
    excludes: Vec<glob::Pattern>,
    verbose: bool,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: &Config) -> Result<Self> {
        let excludes = config
            .analysis
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Fail early if the grammar cannot be loaded
        PythonParser::new()?;

        Ok(Self {
            config: config.analysis.clone(),
            excludes,
            verbose: false,
        })
    }

    /// Show a progress bar while parsing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Analyze the source tree at the given path
    ///
    /// Per-file failures never abort the run; they land in `skipped`.
    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let files = self.discover_files(&root)?;
        debug!(count = files.len(), root = %root.display(), "discovered source files");

        let progress = self.progress_bar(files.len());
        let outcomes: Vec<FileOutcome> = if self.config.parallel {
            files
                .par_iter()
                .map_init(
                    || self.new_parser(),
                    |parser, path| {
                        let outcome = match parser {
                            Ok(parser) => self.process_file(parser, &root, path),
                            Err(e) => FileOutcome::skipped(
                                relative_path(path, &root),
                                SkipReason::Unparsable(e.to_string()),
                            ),
                        };
                        if let Some(pb) = &progress {
                            pb.inc(1);
                        }
                        outcome
                    },
                )
                .collect()
        } else {
            let mut parser = self.new_parser()?;
            files
                .iter()
                .map(|path| {
                    let outcome = self.process_file(&mut parser, &root, path);
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                    outcome
                })
                .collect()
        };
        if let Some(pb) = progress {
            pb.finish_with_message("Parsing complete");
        }

        let mut model = RepositoryModel::new();
        let mut skipped = BTreeMap::new();
        for outcome in outcomes {
            if let Some(record) = outcome.record {
                model.insert(record);
            }
            if let Some(reason) = outcome.skipped {
                skipped.insert(outcome.path, reason);
            }
        }

        info!(
            files = files.len(),
            classes = model.classes().count(),
            functions = model.functions().count(),
            skipped = skipped.len(),
            "scan complete"
        );

        Ok(AnalysisResult {
            model,
            skipped,
            project_name: project_name(&root),
            files_scanned: files.len(),
        })
    }

    fn new_parser(&self) -> Result<PythonParser> {
        Ok(PythonParser::new()?.with_error_tolerance(self.config.tolerate_syntax_errors))
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }

    /// Discover all source files below the root, in path order
    fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root is fatal, anything below it is skipped
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| self.config.extensions.iter().any(|x| x == ext))
                .unwrap_or(false);
            if !matches_ext || self.should_exclude(path, root) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.config.exclude_dirs.iter().any(|d| d == name))
                .unwrap_or(false)
    }

    /// Check the relative path against the configured glob patterns
    fn should_exclude(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.excludes.iter().any(|p| p.matches_path(relative))
    }

    fn process_file(&self, parser: &mut PythonParser, root: &Path, path: &Path) -> FileOutcome {
        let rel = relative_path(path, root);

        if let Ok(meta) = std::fs::metadata(path) {
            if meta.len() > self.config.max_file_bytes {
                debug!(path = %rel, bytes = meta.len(), "skipping large file");
                return FileOutcome::skipped(
                    rel,
                    SkipReason::TooLarge {
                        bytes: meta.len(),
                        max: self.config.max_file_bytes,
                    },
                );
            }
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %rel, error = %e, "could not read file");
                return FileOutcome::skipped(rel, SkipReason::Unreadable(e.to_string()));
            }
        };

        let source = decode_lossy(&bytes);
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return FileOutcome::skipped(rel, SkipReason::Empty);
        }
        let chars = trimmed.chars().count();
        if chars < self.config.min_source_chars {
            return FileOutcome::skipped(
                rel,
                SkipReason::TooShort {
                    chars,
                    min: self.config.min_source_chars,
                },
            );
        }

        match parser.parse_and_extract(&rel, source) {
            Ok(record) => {
                debug!(
                    path = %rel,
                    classes = record.classes.len(),
                    functions = record.functions.len(),
                    imports = record.imports.len(),
                    "extracted declarations"
                );
                FileOutcome::parsed(record)
            }
            Err(e) => {
                warn!(path = %rel, error = %e, "could not parse file");
                let message = match e {
                    Error::Parse { message, .. } => message,
                    other => other.to_string(),
                };
                FileOutcome {
                    record: Some(FileRecord::new(rel.clone())),
                    skipped: Some(SkipReason::Unparsable(message)),
                    path: rel,
                }
            }
        }
    }
}

/// Scan `root` and build the repository model
pub fn extract_declarations(root: &Path, config: &Config) -> Result<AnalysisResult> {
    Analyzer::new(config)?.analyze(root)
}

/// `/`-separated path relative to the root
fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .iter()
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string())
}
