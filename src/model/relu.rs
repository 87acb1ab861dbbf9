use crate::model::Operation;
use crate::MIAFloat;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReLU {
    ndims: usize,
}

impl ReLU {
    pub const fn new(ndims: usize) -> Self {
        Self { ndims }
    }
}

impl Display for ReLU {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "ReLU")
    }
}

impl Operation for ReLU {
    fn input_dim(&self) -> usize {
        self.ndims
    }

    fn output_dim(&self) -> usize {
        self.ndims
    }

    fn forward1(&self, input: &Array1<MIAFloat>) -> Array1<MIAFloat> {
        input.mapv(|x| if x.lt(&0.) { 0. } else { x })
    }

    fn forward2(&self, input: &Array2<MIAFloat>) -> Array2<MIAFloat> {
        input.mapv(|x| if x.lt(&0.) { 0. } else { x })
    }

    fn is_activation(&self) -> bool {
        true
    }
}
