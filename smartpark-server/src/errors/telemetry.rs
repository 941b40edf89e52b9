use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Telemetry source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("No valid data in telemetry source: {}", .0.display())]
    EmptySource(PathBuf),

    #[error("Invalid numeric value in telemetry source {}: {line:?}", path.display())]
    MalformedValue { path: PathBuf, line: String },

    #[error("Failed to read telemetry source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
