//! Error types for pattern loading, model construction and scoring.
//!
//! Every error is a modelling or configuration fault, never a transient one:
//! callers get it immediately and models are left untouched.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("radiation pattern row {line} is not a number: {content:?}")]
    MalformedPattern { line: usize, content: String },

    #[error("radiation pattern has {actual} samples, expected {expected}")]
    PatternSize { expected: usize, actual: usize },

    #[error("cannot read radiation pattern {}: {source}", .path.display())]
    PatternIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sensor model name {name:?}, must be one of {available:?}")]
    UnknownModel {
        name: String,
        available: Vec<String>,
    },

    #[error("observation number ({value}) outside acceptable values: 0-{}", .num_avail.saturating_sub(1))]
    ObservationOutOfRange { value: usize, num_avail: usize },

    #[error("model {model} cannot score a {found} observation")]
    ObservationMismatch {
        model: &'static str,
        found: &'static str,
    },

    #[error("invalid target state: {0}")]
    InvalidState(String),

    #[error("model {model} expects {expected} hypotheses, got {found}")]
    HypothesisShape {
        model: &'static str,
        expected: String,
        found: String,
    },

    #[error("invalid sensor configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SensorError>;
