//! Reading and writing stage lists as JSON.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::types::Stage;

/// Read a JSON array of stages.
pub fn read_stages(path: &Path) -> Result<Vec<Stage>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stages from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse stages in {}", path.display()))
}

/// Pretty JSON for a stage list, with a trailing newline.
pub fn to_json(stages: &[Stage]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(stages).context("Failed to serialize stages")?;
    json.push('\n');
    Ok(json)
}

/// Write stages to `path`, creating parent directories as needed.
pub fn write_stages(path: &Path, stages: &[Stage]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, to_json(stages)?)
        .with_context(|| format!("Failed to write stages to {}", path.display()))
}

/// Write stages to stdout.
pub fn print_stages(stages: &[Stage]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(to_json(stages)?.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
