// Output generation module: render, truncate, sanitize, write

pub mod diagrams;
pub mod sanitize;

pub use diagrams::*;
pub use sanitize::sanitize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::RepositoryModel;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Render the model into final diagram text
///
/// `fallback_name` names the project-root node when the config leaves
/// `[project] name` unset.
pub fn generate(model: &RepositoryModel, config: &Config, fallback_name: &str) -> Result<String> {
    let project_name = config.project.name.as_deref().unwrap_or(fallback_name);
    let rendered = DiagramGenerator::new(config.diagram.mode)
        .with_direction(config.effective_direction())
        .with_project_name(project_name)
        .render(model);

    let text = match config.diagram.max_lines {
        Some(max) => truncate(&rendered, max),
        None => rendered,
    };

    let text = sanitize(&text);
    if text.is_empty() {
        return Err(Error::EmptyOutput);
    }

    debug!(lines = text.lines().count(), mode = ?config.diagram.mode, "diagram generated");
    Ok(text)
}

/// Cut a diagram to at most `max_lines` lines without splitting a class block
///
/// Keeps the longest prefix that ends outside any `{ ... }` block and fits
/// alongside the trailing truncation comment.
pub fn truncate(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let total = lines.len();
    if total <= max_lines || max_lines < 2 {
        return text.to_string();
    }

    let mut depth = 0usize;
    let mut keep = 0;
    for (i, line) in lines.iter().take(max_lines - 1).enumerate() {
        let trimmed = line.trim_end();
        if trimmed.ends_with('{') {
            depth += 1;
        } else if trimmed == "}" {
            depth = depth.saturating_sub(1);
        }
        if depth == 0 {
            keep = i + 1;
        }
    }

    let mut out: Vec<String> = lines[..keep].iter().map(|l| l.to_string()).collect();
    out.push(format!("%% Diagram truncated: {} of {} lines shown", keep, total));
    out.join("\n")
}

/// Write diagram text to `path`, or stdout when the path is `-`
pub fn write_output(text: &str, path: &Path) -> Result<()> {
    if path == Path::new("-") {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", text)?;
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, format!("{}\n", text))?;
    info!(path = %path.display(), "wrote diagram");
    Ok(())
}
