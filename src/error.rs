//! Error taxonomy for the CSD transform.
//!
//! Every variant is raised before the input container is touched, so a
//! failing call never leaves a half-transformed recording behind.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsdError {
    /// Wrong type for the container or for a dynamically supplied parameter.
    #[error("{name} must be an instance of {expected}, got {got}")]
    TypeConstraint {
        name: String,
        expected: String,
        got: String,
    },

    /// Non-finite / zero sensor positions or an unusable sphere.
    #[error("{0}")]
    Geometry(String),

    /// No EEG channels, or bad EEG channels that were not dropped.
    #[error("{0}")]
    ChannelSelection(String),

    /// Hyperparameter outside its admissible range.
    #[error("{0}")]
    ParameterRange(String),

    #[error("CSD already applied, should not be reapplied")]
    AlreadyApplied,

    /// The regularised interpolation matrix could not be inverted, or a data
    /// block does not match the channel layout.
    #[error("CSD solver failed: {0}")]
    Solver(String),

    /// Sample array does not match the channel metadata.
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("invalid CSD configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CsdError {
    pub(crate) fn type_constraint(name: &str, expected: &str, got: impl Into<String>) -> Self {
        CsdError::TypeConstraint {
            name: name.to_string(),
            expected: expected.to_string(),
            got: got.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CsdError>;
