use crate::dataset::LabeledSamples;
use crate::model::Classifier;
use crate::util::l2_norm;
use crate::MIAFloat;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// k-nearest-neighbour classifier under the L2 metric.
///
/// Scores are the fraction of the `k` nearest training points voting for each
/// class. With `k = 1` every training point is classified as its own label, which
/// makes it a convenient maximally overfit target model.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KNearestNeighbors {
    k: usize,
    nb_classes: usize,
    features: Array2<MIAFloat>,
    labels: Array1<usize>,
}

impl KNearestNeighbors {
    pub fn new(k: usize, nb_classes: usize) -> Self {
        Self {
            k: k.max(1),
            nb_classes,
            features: Array2::zeros((0, 0)),
            labels: Array1::zeros(0),
        }
    }

    /// Memorizes the training data. Labels at or above `nb_classes` grow the class count.
    pub fn fit(&mut self, data: &LabeledSamples) {
        self.features = data.features().to_owned();
        self.labels = data.labels().to_owned();
        if let Some(&max_label) = self.labels.iter().max() {
            self.nb_classes = self.nb_classes.max(max_label + 1);
        }
    }

    pub const fn k(&self) -> usize {
        self.k
    }
}

impl Classifier for KNearestNeighbors {
    fn input_dim(&self) -> usize {
        self.features.ncols()
    }

    fn nb_classes(&self) -> usize {
        self.nb_classes
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_scores(&self, x: &ArrayView2<MIAFloat>) -> Array2<MIAFloat> {
        let mut scores = Array2::zeros((x.nrows(), self.nb_classes));
        let k = self.k.min(self.labels.len());
        if k == 0 {
            return scores;
        }
        for (mut row_scores, query) in scores.axis_iter_mut(Axis(0)).zip(x.axis_iter(Axis(0))) {
            let mut neighbours: Vec<(OrderedFloat<MIAFloat>, usize)> = self
                .features
                .axis_iter(Axis(0))
                .zip(self.labels.iter())
                .map(|(train, &label)| (OrderedFloat(l2_norm((&train - &query).view())), label))
                .collect();
            neighbours.sort_unstable();
            neighbours
                .iter()
                .take(k)
                .for_each(|&(_, label)| row_scores[label] += 1. / k as MIAFloat);
        }
        scores
    }
}
