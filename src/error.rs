//! Error types shared across the crate.
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the target model adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("model expects {expected} input features but received {given}")]
    InputDimMismatch { expected: usize, given: usize },
    #[error("{samples} samples were given with {labels} labels")]
    LabelCountMismatch { samples: usize, labels: usize },
    #[error("label {label} is out of range for a model with {nb_classes} classes")]
    LabelOutOfRange { label: usize, nb_classes: usize },
    #[error("model produced unorderable scores for sample {index}")]
    InvalidScores { index: usize },
    #[error("clip values for feature {index} are not a finite interval with lower <= upper")]
    InvalidClipValues { index: usize },
    #[error("network has no layers")]
    EmptyNetwork,
    #[error("layer {layer} expects {expected} inputs but receives {given}")]
    LayerMismatch {
        layer: usize,
        expected: usize,
        given: usize,
    },
    #[error("dense layer {layer} has {rows} basis rows but a shift of length {shift}")]
    MalformedDense {
        layer: usize,
        rows: usize,
        shift: usize,
    },
}

/// Failures loading a serialized network.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Shape(#[from] AdapterError),
}

#[derive(Debug, Error)]
pub enum AttackError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("cannot fit attack model with {members} members and {nonmembers} non-members")]
    InsufficientData { members: usize, nonmembers: usize },
    #[error("distance threshold has not been calibrated")]
    NotCalibrated,
    #[error("attack model has not been fit")]
    NotFitted,
    #[error("target model has no clip values to sample from")]
    MissingClipValues,
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{samples} feature rows were given with {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },
    #[error("member {member} and non-member {nonmember} are the same sample")]
    Overlap { member: usize, nonmember: usize },
    #[error("members have {members} features but non-members have {nonmembers}")]
    FeatureMismatch { members: usize, nonmembers: usize },
    #[error("split ratio {ratio} is outside [0, 1]")]
    InvalidRatio { ratio: f64 },
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Attack(#[from] AttackError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{0}` is not set in the harness configuration")]
    MissingPath(&'static str),
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<AdapterError> for HarnessError {
    fn from(err: AdapterError) -> Self {
        Self::Attack(AttackError::Adapter(err))
    }
}

impl From<ModelError> for HarnessError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Io { path, source } => Self::Io { path, source },
            ModelError::Json { path, source } => Self::Json { path, source },
            ModelError::Shape(err) => err.into(),
        }
    }
}
