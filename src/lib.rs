//! classmap - Mermaid class diagrams from Python codebases
//!
//! Parses every Python file under a directory, extracts classes, functions,
//! imports and cross-class calls, and renders them as a Mermaid
//! `classDiagram` in one of two views: structure or call graph.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{extract_declarations, AnalysisResult, Analyzer, CallEdge, Relations, SkipReason};
pub use config::{Config, DiagramMode, Direction};
pub use error::{Error, Result};
pub use output::{generate, render_diagram, sanitize, truncate, write_output, DiagramGenerator};
pub use parser::{FileRecord, PythonParser, RepositoryModel};
