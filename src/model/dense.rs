use crate::affine::Affine2;
use crate::model::Operation;
use crate::MIAFloat;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Dense {
    aff: Affine2,
}

impl Dense {
    pub const fn new(aff: Affine2) -> Self {
        Self { aff }
    }

    pub const fn affine(&self) -> &Affine2 {
        &self.aff
    }
}

impl Operation for Dense {
    fn input_dim(&self) -> usize {
        self.aff.input_dim()
    }

    fn output_dim(&self) -> usize {
        self.aff.output_dim()
    }

    fn forward1(&self, input: &Array1<MIAFloat>) -> Array1<MIAFloat> {
        debug_assert_eq!(input.ndim(), 1);
        self.aff.apply(&input.view())
    }

    fn forward2(&self, input: &Array2<MIAFloat>) -> Array2<MIAFloat> {
        self.aff.apply_rows(&input.view())
    }
}

impl fmt::Display for Dense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dense {}", self.aff.output_dim())
    }
}
