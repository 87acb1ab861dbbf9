//! Axis-aligned boxes over the feature space, used as a model's clip values.
use crate::error::AdapterError;
use crate::util::l2_norm;
use crate::MIAFloat;
use ndarray::iter::Lanes;
use ndarray::{stack, Array1, Array2, ArrayView1, Axis, Ix1, Zip};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::fmt::Display;

/// Lower ends in row 0, upper ends in row 1. Every interval is finite and non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds1 {
    data: Array2<MIAFloat>,
}

impl Bounds1 {
    /// # Errors
    /// If `lower` and `upper` have different lengths, or some feature's
    /// interval is not finite or has its lower end above its upper end.
    pub fn new<'a>(
        lower: ArrayView1<'a, MIAFloat>,
        upper: ArrayView1<'a, MIAFloat>,
    ) -> Result<Self, AdapterError> {
        let data = stack(Axis(0), &[lower, upper]).map_err(|_| AdapterError::InputDimMismatch {
            expected: lower.len(),
            given: upper.len(),
        })?;
        if let Some(index) = data
            .lanes(Axis(0))
            .into_iter()
            .position(|b| !(b[0] <= b[1] && (b[1] - b[0]).is_finite()))
        {
            return Err(AdapterError::InvalidClipValues { index });
        }
        Ok(Self { data })
    }

    /// The same `[lower, upper]` interval on every one of `dim` features.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn from_elem(dim: usize, lower: MIAFloat, upper: MIAFloat) -> Result<Self, AdapterError> {
        Self::new(
            Array1::from_elem(dim, lower).view(),
            Array1::from_elem(dim, upper).view(),
        )
    }

    pub fn lower(&self) -> ArrayView1<MIAFloat> {
        self.data.index_axis(Axis(0), 0)
    }

    pub fn upper(&self) -> ArrayView1<MIAFloat> {
        self.data.index_axis(Axis(0), 1)
    }

    pub fn ndim(&self) -> usize {
        self.data.ncols()
    }

    pub fn bounds_iter(&self) -> Lanes<MIAFloat, Ix1> {
        self.data.lanes(Axis(0))
    }

    /// Projects `x` onto the box.
    pub fn clip(&self, x: &ArrayView1<MIAFloat>) -> Array1<MIAFloat> {
        Zip::from(x)
            .and(self.bounds_iter())
            .map_collect(|&x, bounds| x.max(bounds[0]).min(bounds[1]))
    }

    /// Length of the box's main diagonal, the largest distance between two members.
    pub fn diameter(&self) -> MIAFloat {
        l2_norm((&self.upper() - &self.lower()).view())
    }

    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> Array1<MIAFloat> {
        Zip::from(self.bounds_iter())
            .map_collect(|x| Uniform::new_inclusive(x[0], x[1]).sample(rng))
    }

    /// Draws `n` uniform samples, one per row.
    pub fn sample_n<R: Rng>(&self, n: usize, rng: &mut R) -> Array2<MIAFloat> {
        let mut samples = Array2::zeros((n, self.ndim()));
        samples
            .axis_iter_mut(Axis(0))
            .for_each(|mut row| row.assign(&self.sample_with(rng)));
        samples
    }
}

impl Display for Bounds1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "Lower: {}\nUpper: {}", self.lower(), self.upper())
    }
}
