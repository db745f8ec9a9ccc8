//! Error types surfaced by the runner, the engines and configuration.
//!
//! Step failures are not errors here: they travel to the reporting sink as
//! result records. These types only cover problems that stop a run from
//! starting or progressing.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration supplied through the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable held a value outside its accepted set.
    #[error("invalid value '{value}' for {key}: {expected}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}

/// Failures raised while an engine drives a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A feature file could not be parsed as Gherkin.
    #[error("failed to parse feature {}: {message}", path.display())]
    Parse {
        /// Path of the offending feature.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// A listener returned without resuming the run.
    #[error("listener did not resume the run after event '{event}'")]
    Stalled {
        /// Name of the event that was not acknowledged.
        event: String,
    },
    /// A recorded event could not be decoded.
    #[error("invalid recorded event on line {line}: {source}")]
    Decode {
        /// One-based line number in the event log.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Reading an event log failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised while preparing or running features.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// No `.feature` paths were supplied.
    #[error(
        "No .feature files were found. Please add some .feature files to the run configuration."
    )]
    NoFeatureFiles,
    /// A feature file could not be read.
    #[error("failed to load feature {}: {source}", path.display())]
    Load {
        /// Path of the feature file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The engine aborted the run.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failures writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialising a report failed.
    #[error("failed to serialise report: {0}")]
    Serialise(#[from] serde_json::Error),
    /// Writing a report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
