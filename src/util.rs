//! Utility functions
use crate::error::AdapterError;
use crate::MIAFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::interpolate::Linear;
use ndarray_stats::{Quantile1dExt, QuantileExt};
use noisy_float::types::N64;

pub fn l2_norm(x: ArrayView1<MIAFloat>) -> MIAFloat {
    x.dot(&x).sqrt()
}

/// Row-wise softmax of a `(num_samples, num_classes)` logit matrix.
pub fn softmax_rows(logits: &ArrayView2<MIAFloat>) -> Array2<MIAFloat> {
    let mut out = logits.to_owned();
    out.axis_iter_mut(Axis(0)).for_each(|mut row| {
        let max = row.fold(MIAFloat::NEG_INFINITY, |acc, &x| acc.max(x));
        row.mapv_inplace(|x| (x - max).exp());
        let total = row.sum();
        row /= total;
    });
    out
}

/// Index of the largest score in each row.
///
/// # Errors
/// If a row contains NaN or is empty.
pub fn argmax_rows(scores: &ArrayView2<MIAFloat>) -> Result<Array1<usize>, AdapterError> {
    scores
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(index, row)| {
            row.argmax()
                .map_err(|_| AdapterError::InvalidScores { index })
        })
        .collect()
}

pub fn one_hot(labels: &ArrayView1<usize>, nb_classes: usize) -> Array2<MIAFloat> {
    let mut out = Array2::zeros((labels.len(), nb_classes));
    labels
        .iter()
        .enumerate()
        .filter(|(_, &label)| label < nb_classes)
        .for_each(|(i, &label)| out[[i, label]] = 1.);
    out
}

/// The `q`-th percentile (`0 <= q <= 100`) of `values`, linearly interpolated
/// between the closest ranks. `None` if `values` is empty or holds NaN.
pub fn percentile(values: &ArrayView1<MIAFloat>, q: MIAFloat) -> Option<MIAFloat> {
    let mut sorted = values
        .iter()
        .map(|&x| N64::try_new(x))
        .collect::<Option<Array1<N64>>>()?;
    sorted
        .quantile_mut(N64::try_new(q / 100.)?, &Linear)
        .ok()
        .map(N64::raw)
}
