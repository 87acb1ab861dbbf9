use super::BinaryClassifier;
use crate::MIAFloat;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Unlimited when unset.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split. Defaults to the square root of the feature count.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
enum Node {
    Leaf {
        proba: MIAFloat,
    },
    Split {
        feature: usize,
        threshold: MIAFloat,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: MIAFloat,
    impurity: MIAFloat,
}

#[allow(clippy::cast_precision_loss)]
fn gini(positives: usize, total: usize) -> MIAFloat {
    if total == 0 {
        return 0.;
    }
    let p = positives as MIAFloat / total as MIAFloat;
    2. * p * (1. - p)
}

/// CART tree grown on Gini impurity.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    fn fit<R: Rng>(
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<bool>,
        idxs: Vec<usize>,
        config: &ForestConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            root: Self::grow(x, y, idxs, 0, config, rng),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn grow<R: Rng>(
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<bool>,
        idxs: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
        rng: &mut R,
    ) -> Node {
        let positives = idxs.iter().filter(|&&i| y[i]).count();
        let leaf = Node::Leaf {
            proba: positives as MIAFloat / idxs.len().max(1) as MIAFloat,
        };
        if positives == 0
            || positives == idxs.len()
            || idxs.len() < config.min_samples_split.max(2)
            || config.max_depth.map_or(false, |max| depth >= max)
        {
            return leaf;
        }
        let split = match Self::best_split(x, y, &idxs, config, rng) {
            Some(split) => split,
            None => return leaf,
        };
        let (left, right): (Vec<usize>, Vec<usize>) = idxs
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);
        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(Self::grow(x, y, left, depth + 1, config, rng)),
            right: Box::new(Self::grow(x, y, right, depth + 1, config, rng)),
        }
    }

    /// Examines at least `max_features` randomly ordered features, continuing
    /// past that until some feature admits a split.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    fn best_split<R: Rng>(
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<bool>,
        idxs: &[usize],
        config: &ForestConfig,
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let nfeatures = x.ncols();
        let max_features = config
            .max_features
            .unwrap_or_else(|| (nfeatures as MIAFloat).sqrt().ceil() as usize)
            .clamp(1, nfeatures.max(1));
        let mut features: Vec<usize> = (0..nfeatures).collect();
        features.shuffle(rng);

        let total = idxs.len();
        let total_pos = idxs.iter().filter(|&&i| y[i]).count();
        let mut best: Option<SplitCandidate> = None;
        for (examined, &feature) in features.iter().enumerate() {
            if examined >= max_features && best.is_some() {
                break;
            }
            let mut sorted = idxs.to_vec();
            sorted.sort_by_key(|&i| OrderedFloat(x[[i, feature]]));
            let mut left_pos = 0;
            for (pos, pair) in sorted.windows(2).enumerate() {
                if y[pair[0]] {
                    left_pos += 1;
                }
                let (lo, hi) = (x[[pair[0], feature]], x[[pair[1], feature]]);
                if lo >= hi {
                    continue;
                }
                let left_n = pos + 1;
                let right_n = total - left_n;
                let impurity = (left_n as MIAFloat * gini(left_pos, left_n)
                    + right_n as MIAFloat * gini(total_pos - left_pos, right_n))
                    / total as MIAFloat;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mid = lo + (hi - lo) / 2.;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        impurity,
                    });
                }
            }
        }
        best
    }

    pub fn predict_one(&self, row: &ArrayView1<MIAFloat>) -> MIAFloat {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

/// Bagged ensemble of [`DecisionTree`]s; the positive-class probability is the
/// mean of the trees' leaf frequencies.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: vec![],
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl BinaryClassifier for RandomForest {
    fn fit(&mut self, x: &ArrayView2<MIAFloat>, y: &ArrayView1<bool>) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n = x.nrows();
        self.trees = (0..self.config.n_estimators.max(1))
            .map(|_| {
                let idxs: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, y, idxs, &self.config, &mut rng)
            })
            .collect();
        debug!(
            "fit random forest of {} trees, max depth {}",
            self.trees.len(),
            self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict_proba(&self, x: &ArrayView2<MIAFloat>) -> Array1<MIAFloat> {
        let ntrees = self.trees.len().max(1) as MIAFloat;
        x.axis_iter(Axis(0))
            .map(|row| {
                self.trees
                    .iter()
                    .map(|tree| tree.predict_one(&row))
                    .sum::<MIAFloat>()
                    / ntrees
            })
            .collect()
    }
}
