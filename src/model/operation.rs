use crate::model::{Dense, ReLU};
use crate::MIAFloat;
use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// Operations may not be stateful. I.e., they must deterministically produce identical outputs from identical inputs.
#[enum_dispatch]
pub trait Operation: Clone + Debug + Send + Sync {
    fn input_dim(&self) -> usize;

    fn output_dim(&self) -> usize;

    fn forward1(&self, input: &Array1<MIAFloat>) -> Array1<MIAFloat>;

    /// Input and output are `(num_samples, dim)` batches.
    fn forward2(&self, input: &Array2<MIAFloat>) -> Array2<MIAFloat>;

    fn is_activation(&self) -> bool {
        // This should be implemented in activation layers to return true
        false
    }
}

#[enum_dispatch(Operation)]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum Layer {
    Dense,
    ReLU,
}

impl Layer {
    pub fn new_dense(aff: crate::affine::Affine2) -> Self {
        Self::Dense(Dense::new(aff))
    }

    pub const fn new_relu(ndims: usize) -> Self {
        Self::ReLU(ReLU::new(ndims))
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Dense(layer) => write!(f, "{}", layer),
            Self::ReLU(layer) => write!(f, "{}", layer),
        }
    }
}
