// Error and anomaly types shared across the pipeline.
//
// `PipelineError` is reserved for conditions that stop a whole command
// (unreadable geography map, unwritable output, bad configuration) and for
// the per-file parse failure the loader turns into an `Anomaly`. Everything
// that only affects one record is recorded as an `Anomaly` and logged, never
// raised.
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error at {path}: {msg}")]
    Io { path: String, msg: String },

    /// A source document that is not valid JSON even after `NaN` repair.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("geography map error: {0}")]
    Geography(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("write error at {path}: {msg}")]
    Write { path: String, msg: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn io(path: impl AsRef<std::path::Path>, e: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.as_ref().display().to_string(),
            msg: e.to_string(),
        }
    }

    pub fn write(path: impl AsRef<std::path::Path>, e: impl std::fmt::Display) -> Self {
        PipelineError::Write {
            path: path.as_ref().display().to_string(),
            msg: e.to_string(),
        }
    }
}

/// A recoverable irregularity found while loading or aggregating records.
///
/// Each variant is logged when it occurs and kept so callers can report on
/// it after the run. A parse failure means the record was dropped; the other
/// two only mean the record landed in a bucket that was created for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    ParseFailure {
        path: String,
        reason: String,
    },
    UnmappedConstituency {
        raw_name: String,
        key: String,
        district: String,
    },
    UnmappedDistrictCode {
        code: String,
    },
}

impl Anomaly {
    /// `true` when the anomaly caused a record to be excluded from totals.
    pub fn drops_record(&self) -> bool {
        matches!(self, Anomaly::ParseFailure { .. })
    }
}
