use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;

use crate::errors::TelemetryError;

/// Reads the value at `cursor` from a looping telemetry source and returns it
/// with the cursor of the following line. A cursor past the end wraps to the
/// first line.
pub async fn read_next(path: &Path, cursor: usize) -> Result<(f64, usize), TelemetryError> {
    let lines = load_lines(path).await?;

    let cursor = if cursor >= lines.len() { 0 } else { cursor };
    let value = parse_line(path, &lines[cursor])?;

    Ok((value, cursor + 1))
}

/// Picks a uniformly random line from the source. No cursor is involved.
pub async fn read_random(path: &Path) -> Result<f64, TelemetryError> {
    let lines = load_lines(path).await?;

    let line = lines
        .choose(&mut rand::rng())
        .ok_or_else(|| TelemetryError::EmptySource(path.to_path_buf()))?;

    parse_line(path, line)
}

async fn load_lines(path: &Path) -> Result<Vec<String>, TelemetryError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => TelemetryError::SourceNotFound(path.to_path_buf()),
        _ => TelemetryError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();

    if lines.is_empty() {
        return Err(TelemetryError::EmptySource(path.to_path_buf()));
    }

    Ok(lines)
}

fn parse_line(path: &Path, line: &str) -> Result<f64, TelemetryError> {
    line.parse::<f64>().map_err(|_| TelemetryError::MalformedValue {
        path: PathBuf::from(path),
        line: line.to_string(),
    })
}
