use super::BinaryClassifier;
use crate::affine::Affine2;
use crate::MIAFloat;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub learning_rate: MIAFloat,
    pub epochs: usize,
    /// L2 penalty on the weights (not the bias).
    pub l2: MIAFloat,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2: 1e-4,
        }
    }
}

/// Logistic regression on standardized features, trained by full-batch gradient descent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    weights: Affine2,
    mean: Array1<MIAFloat>,
    scale: Array1<MIAFloat>,
}

fn sigmoid(z: MIAFloat) -> MIAFloat {
    1. / (1. + (-z).exp())
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            weights: Affine2::zeros(0, 1),
            mean: Array1::zeros(0),
            scale: Array1::zeros(0),
        }
    }

    pub const fn weights(&self) -> &Affine2 {
        &self.weights
    }

    fn standardize(&self, x: &ArrayView2<MIAFloat>) -> ndarray::Array2<MIAFloat> {
        (x - &self.mean) / &self.scale
    }
}

impl BinaryClassifier for LogisticRegression {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, x: &ArrayView2<MIAFloat>, y: &ArrayView1<bool>) {
        let nfeatures = x.ncols();
        self.weights = Affine2::zeros(nfeatures, 1);
        self.mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(nfeatures));
        self.scale = x
            .std_axis(Axis(0), 0.)
            .mapv(|s| if s > 1e-12 { s } else { 1. });
        if x.nrows() == 0 {
            return;
        }
        let xs = self.standardize(x);
        let targets = y.mapv(|b| if b { 1. } else { 0. });
        let n = x.nrows() as MIAFloat;
        for epoch in 0..self.config.epochs {
            let probs = self
                .weights
                .apply_rows(&xs.view())
                .index_axis(Axis(1), 0)
                .mapv(sigmoid);
            let residual = &probs - &targets;
            let (mut coeffs, bias) = self.weights.get_eqn_mut(0);
            let grad = xs.t().dot(&residual) / n + &coeffs * self.config.l2;
            coeffs.scaled_add(-self.config.learning_rate, &grad);
            *bias -= self.config.learning_rate * residual.sum() / n;
            if epoch % 100 == 0 {
                debug!(
                    "logistic regression epoch {} mean residual {}",
                    epoch,
                    residual.mapv(MIAFloat::abs).sum() / n
                );
            }
        }
    }

    fn predict_proba(&self, x: &ArrayView2<MIAFloat>) -> Array1<MIAFloat> {
        self.weights
            .apply_rows(&self.standardize(x).view())
            .index_axis(Axis(1), 0)
            .mapv(sigmoid)
    }
}
