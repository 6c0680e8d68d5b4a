use thiserror::Error;

/// Errors surfaced by file operations and configuration.
///
/// Data irregularities (unparseable dates, dangling dependencies, absurd
/// durations) are never errors; they are absorbed by the resolver's repair
/// rules and at most flag a task as invalid.
#[derive(Debug, Error)]
pub enum GanttError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown view mode '{0}'")]
    UnknownViewMode(String),

    #[error("{0}")]
    Import(String),
}

pub type Result<T> = std::result::Result<T, GanttError>;
