//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Errors raised while configuring, running, training or persisting a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The keep probability must lie in `(0, 1]`.
    #[error("invalid dropout probability: {0}")]
    InvalidDropout(f64),

    #[error("invalid melody coefficient: {0} (expected a value in [0, 1])")]
    InvalidMelodyCoeff(f64),

    #[error("invalid learning rate: {0}")]
    InvalidLearningRate(f64),

    /// RMSProp decay must lie in `[0, 1)`.
    #[error("invalid learning rate decay: {0}")]
    InvalidLearningRateDecay(f64),

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("objective {objective} expects {expected} targets, got {actual}")]
    TargetMismatch {
        objective: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A loss was requested over zero timesteps or zero sequences.
    #[error("empty time batch: {time} steps x {batch} sequences")]
    EmptyBatch { time: usize, batch: usize },

    #[error("target class {value} out of range for {classes} classes")]
    TargetOutOfRange { value: i64, classes: usize },

    #[error("checkpoint record error: {0}")]
    Record(#[from] burn::record::RecorderError),

    #[error("config error: {0}")]
    Config(#[from] burn::config::ConfigError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        ModelError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
