#![allow(non_snake_case)]
//! Representation of affine transformations
use crate::MIAFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Affine map data structure, f(x) = Ax + b
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Affine2 {
    basis: Array2<MIAFloat>,
    shift: Array1<MIAFloat>,
}

impl Display for Affine2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(
            f,
            "Basis {:?} Shift {:?}",
            self.basis.shape(),
            self.shift.shape()
        )
    }
}

impl Affine2 {
    /// # Panics
    /// If improper shapes are passed in
    pub fn new(basis: Array2<MIAFloat>, shift: Array1<MIAFloat>) -> Self {
        debug_assert_eq!(basis.shape()[0], shift.len());
        Self { basis, shift }
    }

    pub fn zeros(input_dim: usize, output_dim: usize) -> Self {
        Self {
            basis: Array2::zeros((output_dim, input_dim)),
            shift: Array1::zeros(output_dim),
        }
    }

    pub fn basis(&self) -> ArrayView2<MIAFloat> {
        self.basis.view()
    }

    pub fn shift(&self) -> ArrayView1<MIAFloat> {
        self.shift.view()
    }

    pub fn input_dim(&self) -> usize {
        self.basis.shape()[1]
    }

    pub fn output_dim(&self) -> usize {
        self.shift.len()
    }

    pub fn get_eqn_mut(&mut self, index: usize) -> (ArrayViewMut1<MIAFloat>, &mut MIAFloat) {
        (self.basis.row_mut(index), &mut self.shift[index])
    }

    pub fn apply(&self, x: &ArrayView1<MIAFloat>) -> Array1<MIAFloat> {
        self.basis.dot(x) + &self.shift
    }

    /// Applies the map to each row of `x`, a `(num_samples, input_dim)` batch.
    pub fn apply_rows(&self, x: &ArrayView2<MIAFloat>) -> Array2<MIAFloat> {
        debug_assert_eq!(x.ncols(), self.input_dim());
        x.dot(&self.basis.t()) + &self.shift
    }
}
