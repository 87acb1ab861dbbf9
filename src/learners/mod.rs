//! Binary classifiers used as membership attack models.
mod forest;
mod logistic;

pub use forest::{DecisionTree, ForestConfig, RandomForest};
pub use logistic::{LogisticConfig, LogisticRegression};

use crate::MIAFloat;
use enum_dispatch::enum_dispatch;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[enum_dispatch]
pub trait BinaryClassifier {
    /// Fits the classifier to the rows of `x` with boolean targets `y`.
    /// Callers must pass at least one sample of each class.
    fn fit(&mut self, x: &ArrayView2<MIAFloat>, y: &ArrayView1<bool>);

    /// Probability of the positive class for each row of `x`.
    fn predict_proba(&self, x: &ArrayView2<MIAFloat>) -> Array1<MIAFloat>;

    fn predict(&self, x: &ArrayView2<MIAFloat>) -> Array1<bool> {
        self.predict_proba(x).mapv(|p| p >= 0.5)
    }
}

#[enum_dispatch(BinaryClassifier)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum AttackClassifier {
    LogisticRegression,
    RandomForest,
}

/// Family and hyper-parameters of a membership attack model.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum AttackModelType {
    LogisticRegression(LogisticConfig),
    RandomForest(ForestConfig),
}

impl Default for AttackModelType {
    fn default() -> Self {
        Self::RandomForest(ForestConfig::default())
    }
}

impl AttackModelType {
    pub fn build(&self) -> AttackClassifier {
        match self {
            Self::LogisticRegression(config) => LogisticRegression::new(config.clone()).into(),
            Self::RandomForest(config) => RandomForest::new(config.clone()).into(),
        }
    }
}
