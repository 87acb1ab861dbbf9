use crate::adversarial::{BoundarySearch, RandomDirectionSearch, SearchConfig};
use crate::attacks::MembershipInference;
use crate::error::AttackError;
use crate::model::TargetModel;
use crate::util::percentile;
use crate::MIAFloat;
use itertools::Itertools;
use log::{debug, info};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis, Zip};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// How the distance threshold of a [`LabelOnlyDecisionBoundary`] is obtained.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalibrationConfig {
    /// Maximize separation accuracy on known members and non-members.
    #[default]
    Supervised,
    /// Percentile of boundary distances of random points drawn from the clip values.
    Unsupervised {
        top_t: MIAFloat,
        num_samples: usize,
        max_queries: usize,
    },
    /// Use the given threshold as is.
    Fixed { tau: MIAFloat },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThresholdState {
    Uncalibrated,
    Calibrated { tau: MIAFloat },
}

/// Label-only attack: a correctly classified sample whose estimated distance to
/// the decision boundary is at least `tau` is inferred to be a member.
///
/// Distances are measured with an RNG freshly seeded from `seed` on every call,
/// so repeated calls on the same inputs agree.
#[derive(Clone, Debug)]
pub struct LabelOnlyDecisionBoundary<'a, S: BoundarySearch = RandomDirectionSearch> {
    model: &'a TargetModel,
    search: S,
    state: ThresholdState,
    seed: u64,
}

impl<'a> LabelOnlyDecisionBoundary<'a, RandomDirectionSearch> {
    pub const fn new(model: &'a TargetModel, config: SearchConfig, seed: u64) -> Self {
        Self::with_search(model, RandomDirectionSearch::new(config), seed)
    }
}

impl<'a, S: BoundarySearch> LabelOnlyDecisionBoundary<'a, S> {
    pub const fn with_search(model: &'a TargetModel, search: S, seed: u64) -> Self {
        Self {
            model,
            search,
            state: ThresholdState::Uncalibrated,
            seed,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, tau: MIAFloat) -> Self {
        self.set_distance_threshold(tau);
        self
    }

    pub fn set_distance_threshold(&mut self, tau: MIAFloat) {
        self.state = ThresholdState::Calibrated { tau };
    }

    pub const fn state(&self) -> ThresholdState {
        self.state
    }

    pub const fn distance_threshold(&self) -> Option<MIAFloat> {
        match self.state {
            ThresholdState::Uncalibrated => None,
            ThresholdState::Calibrated { tau } => Some(tau),
        }
    }

    pub const fn search(&self) -> &S {
        &self.search
    }

    /// Boundary distance of each sample and whether the model classified it
    /// correctly. Misclassified samples get distance 0.
    fn measure(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
        rng: &mut StdRng,
    ) -> Result<(Array1<MIAFloat>, Array1<bool>), AttackError> {
        self.model.check_labels(x, y)?;
        let predicted = self.model.predict_labels(x)?;
        let correct = Zip::from(&predicted).and(y).map_collect(|p, l| p == l);
        let mut distances = Array1::zeros(x.nrows());
        for (idx, row) in x.axis_iter(Axis(0)).enumerate() {
            if correct[idx] {
                distances[idx] = self
                    .search
                    .minimal_perturbation_distance(self.model, &row, y[idx], rng)?;
            }
        }
        Ok((distances, correct))
    }

    /// # Errors
    /// If `x` or `y` are malformed for the target model.
    pub fn boundary_distances(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<MIAFloat>, AttackError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(self.measure(x, y, &mut rng)?.0)
    }

    /// Chooses the threshold that best separates the given members from the
    /// given non-members. Every observed distance is a candidate, as is
    /// infinity; ties go to the smallest candidate.
    ///
    /// # Errors
    /// `InsufficientData` if no samples are given, or any adapter error.
    pub fn calibrate_distance_threshold(
        &mut self,
        member_x: &ArrayView2<MIAFloat>,
        member_y: &ArrayView1<usize>,
        nonmember_x: &ArrayView2<MIAFloat>,
        nonmember_y: &ArrayView1<usize>,
    ) -> Result<MIAFloat, AttackError> {
        if member_x.nrows() + nonmember_x.nrows() == 0 {
            return Err(AttackError::InsufficientData {
                members: 0,
                nonmembers: 0,
            });
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (member_d, member_correct) = self.measure(member_x, member_y, &mut rng)?;
        let (nonmember_d, nonmember_correct) = self.measure(nonmember_x, nonmember_y, &mut rng)?;

        let correct_at = |tau: MIAFloat| {
            let members = Zip::from(&member_d)
                .and(&member_correct)
                .fold(0_usize, |n, &d, &c| n + usize::from(c && d >= tau));
            let nonmembers = Zip::from(&nonmember_d)
                .and(&nonmember_correct)
                .fold(0_usize, |n, &d, &c| n + usize::from(!(c && d >= tau)));
            members + nonmembers
        };
        let candidates = member_d
            .iter()
            .chain(nonmember_d.iter())
            .copied()
            .chain(std::iter::once(MIAFloat::INFINITY))
            .map(OrderedFloat)
            .sorted()
            .dedup();

        let mut best = (MIAFloat::INFINITY, 0);
        for OrderedFloat(tau) in candidates {
            let score = correct_at(tau);
            if score > best.1 {
                best = (tau, score);
            }
        }
        let (tau, score) = best;
        info!(
            "calibrated distance threshold {} separating {} of {} samples",
            tau,
            score,
            member_d.len() + nonmember_d.len()
        );
        self.state = ThresholdState::Calibrated { tau };
        Ok(tau)
    }

    /// Sets the threshold to the `top_t` percentile of boundary distances of
    /// `num_samples` points drawn uniformly from the model's clip values, each
    /// labelled with the model's own prediction. A point's distance is the
    /// smallest found over `max_queries` independent searches.
    ///
    /// # Errors
    /// `InvalidParameter` for a `top_t` outside `[0, 100]` or zero counts,
    /// `MissingClipValues` if the model has no clip values.
    pub fn calibrate_distance_threshold_unsupervised(
        &mut self,
        top_t: MIAFloat,
        num_samples: usize,
        max_queries: usize,
    ) -> Result<MIAFloat, AttackError> {
        if !(0. ..=100.).contains(&top_t) {
            return Err(AttackError::InvalidParameter {
                name: "top_t",
                reason: format!("{} is not a percentile", top_t),
            });
        }
        let distances = self.unsupervised_distances(num_samples, max_queries)?;
        let tau = percentile(&distances.view(), top_t).ok_or_else(|| {
            AttackError::InvalidParameter {
                name: "num_samples",
                reason: "boundary distances are undefined".to_string(),
            }
        })?;
        info!(
            "calibrated distance threshold {} at percentile {} of {} random samples",
            tau, top_t, num_samples
        );
        self.state = ThresholdState::Calibrated { tau };
        Ok(tau)
    }

    fn unsupervised_distances(
        &self,
        num_samples: usize,
        max_queries: usize,
    ) -> Result<Array1<MIAFloat>, AttackError> {
        if num_samples == 0 {
            return Err(AttackError::InvalidParameter {
                name: "num_samples",
                reason: "at least one sample is required".to_string(),
            });
        }
        if max_queries == 0 {
            return Err(AttackError::InvalidParameter {
                name: "max_queries",
                reason: "at least one query is required".to_string(),
            });
        }
        let clip_values = self
            .model
            .clip_values()
            .ok_or(AttackError::MissingClipValues)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let x = clip_values.sample_n(num_samples, &mut rng);
        let y = self.model.predict_labels(&x.view())?;

        let mut distances = Array1::from_elem(num_samples, MIAFloat::INFINITY);
        for query in 0..max_queries {
            let (found, _) = self.measure(&x.view(), &y.view(), &mut rng)?;
            Zip::from(&mut distances)
                .and(&found)
                .for_each(|d, &f| *d = d.min(f));
            debug!("unsupervised calibration query {} of {}", query + 1, max_queries);
        }
        Ok(distances)
    }
}

impl<S: BoundarySearch> MembershipInference for LabelOnlyDecisionBoundary<'_, S> {
    fn infer(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<bool>, AttackError> {
        let tau = self
            .distance_threshold()
            .ok_or(AttackError::NotCalibrated)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (distances, correct) = self.measure(x, y, &mut rng)?;
        Ok(Zip::from(&distances)
            .and(&correct)
            .map_collect(|&d, &c| c && d >= tau))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine2;
    use crate::bounds::Bounds1;
    use crate::error::AdapterError;
    use crate::model::{Layer, DNN};
    use float_cmp::approx_eq;
    use ndarray::array;

    /// Reports the first feature of each sample as its boundary distance.
    #[derive(Clone, Copy, Debug)]
    struct FirstFeatureDistance;

    impl BoundarySearch for FirstFeatureDistance {
        fn minimal_perturbation_distance(
            &self,
            _model: &TargetModel,
            datum: &ArrayView1<MIAFloat>,
            _label: usize,
            _rng: &mut StdRng,
        ) -> Result<MIAFloat, AdapterError> {
            Ok(datum[0])
        }
    }

    /// Always predicts class 0 of 2.
    fn constant_model() -> TargetModel {
        TargetModel::new(DNN::new(vec![Layer::new_dense(Affine2::new(
            array![[0., 0.], [0., 0.]],
            array![1., 0.],
        ))]))
    }

    /// Two classes split by the hyperplane x_0 = 0.5 on the unit square.
    fn halfspace_model() -> TargetModel {
        TargetModel::new(DNN::new(vec![Layer::new_dense(Affine2::new(
            array![[-1., 0.], [1., 0.]],
            array![0.5, -0.5],
        ))]))
        .with_clip_values(Bounds1::from_elem(2, 0., 1.).unwrap())
        .unwrap()
    }

    #[test]
    fn test_infer_before_calibration_fails() {
        let model = halfspace_model();
        let attack = LabelOnlyDecisionBoundary::new(&model, SearchConfig::default(), 0);
        assert_eq!(attack.state(), ThresholdState::Uncalibrated);
        let err = attack
            .infer(&array![[0.1, 0.1]].view(), &array![0].view())
            .unwrap_err();
        assert!(matches!(err, AttackError::NotCalibrated));
    }

    #[test]
    fn test_distance_equal_to_threshold_is_member() {
        let model = constant_model();
        let attack = LabelOnlyDecisionBoundary::with_search(&model, FirstFeatureDistance, 0)
            .with_threshold(0.5);
        let x = array![[0.5, 0.], [0.49, 0.], [2., 0.], [3., 0.]];
        let y = array![0, 0, 0, 1];
        let membership = attack.infer(&x.view(), &y.view()).unwrap();
        assert_eq!(membership, array![true, false, true, false]);
    }

    #[test]
    fn test_misclassified_samples_have_zero_distance() {
        let model = constant_model();
        let attack = LabelOnlyDecisionBoundary::with_search(&model, FirstFeatureDistance, 0);
        let distances = attack
            .boundary_distances(&array![[0.7, 0.], [0.7, 0.]].view(), &array![0, 1].view())
            .unwrap();
        assert_eq!(distances, array![0.7, 0.]);
    }

    #[test]
    fn test_supervised_threshold_prefers_smallest_best() {
        let model = constant_model();
        let mut attack = LabelOnlyDecisionBoundary::with_search(&model, FirstFeatureDistance, 0);
        let member_x = array![[0.6, 0.], [0.7, 0.], [0.8, 0.], [0.9, 0.]];
        let member_y = array![0, 0, 0, 1];
        let nonmember_x = array![[0.1, 0.], [0.2, 0.], [0.65, 0.]];
        let nonmember_y = array![0, 0, 0];
        let tau = attack
            .calibrate_distance_threshold(
                &member_x.view(),
                &member_y.view(),
                &nonmember_x.view(),
                &nonmember_y.view(),
            )
            .unwrap();
        assert!(approx_eq!(f64, tau, 0.6));
        assert_eq!(attack.distance_threshold(), Some(tau));
    }

    #[test]
    fn test_supervised_threshold_separates_by_margin() {
        let model = halfspace_model();
        let mut attack = LabelOnlyDecisionBoundary::new(
            &model,
            SearchConfig {
                num_directions: 64,
                ..SearchConfig::default()
            },
            3,
        );
        // members sit far from x_0 = 0.5, non-members close to it
        let member_x = array![[0.05, 0.5], [0.1, 0.2], [0.95, 0.5], [0.9, 0.8]];
        let member_y = array![0, 0, 1, 1];
        let nonmember_x = array![[0.45, 0.5], [0.47, 0.1], [0.55, 0.5], [0.53, 0.9]];
        let nonmember_y = array![0, 0, 1, 1];
        attack
            .calibrate_distance_threshold(
                &member_x.view(),
                &member_y.view(),
                &nonmember_x.view(),
                &nonmember_y.view(),
            )
            .unwrap();
        assert!(attack
            .infer(&member_x.view(), &member_y.view())
            .unwrap()
            .iter()
            .all(|&m| m));
        assert!(attack
            .infer(&nonmember_x.view(), &nonmember_y.view())
            .unwrap()
            .iter()
            .all(|&m| !m));
    }

    #[test]
    fn test_unsupervised_median_threshold() {
        let model = halfspace_model();
        let config = SearchConfig {
            num_directions: 8,
            ..SearchConfig::default()
        };
        let mut attack = LabelOnlyDecisionBoundary::new(&model, config, 11);
        let distances = attack.unsupervised_distances(51, 2).unwrap();
        let tau = attack
            .calibrate_distance_threshold_unsupervised(50., 51, 2)
            .unwrap();
        let sorted: Vec<f64> = distances.iter().copied().sorted_by_key(|&d| OrderedFloat(d)).collect();
        assert!(approx_eq!(f64, tau, sorted[25], epsilon = 1e-12));
        let at_or_above = distances.iter().filter(|&&d| d >= tau).count();
        more_asserts::assert_ge!(at_or_above, 26);
    }

    #[test]
    fn test_unsupervised_requires_clip_values() {
        let model = constant_model();
        let mut attack = LabelOnlyDecisionBoundary::new(&model, SearchConfig::default(), 0);
        assert!(matches!(
            attack.calibrate_distance_threshold_unsupervised(50., 10, 1),
            Err(AttackError::MissingClipValues)
        ));
        assert!(matches!(
            attack.calibrate_distance_threshold_unsupervised(150., 10, 1),
            Err(AttackError::InvalidParameter { name: "top_t", .. })
        ));
        assert_eq!(attack.state(), ThresholdState::Uncalibrated);
    }

    #[test]
    fn test_unsupervised_rejects_invalid_parameters() {
        let model = halfspace_model();
        let mut attack = LabelOnlyDecisionBoundary::new(&model, SearchConfig::default(), 0);
        assert!(matches!(
            attack.calibrate_distance_threshold_unsupervised(50., 0, 1),
            Err(AttackError::InvalidParameter {
                name: "num_samples",
                ..
            })
        ));
        assert!(matches!(
            attack.calibrate_distance_threshold_unsupervised(50., 10, 0),
            Err(AttackError::InvalidParameter {
                name: "max_queries",
                ..
            })
        ));
        for top_t in [MIAFloat::NAN, MIAFloat::INFINITY, MIAFloat::NEG_INFINITY, -1.] {
            assert!(matches!(
                attack.calibrate_distance_threshold_unsupervised(top_t, 10, 1),
                Err(AttackError::InvalidParameter { name: "top_t", .. })
            ));
        }
        assert_eq!(attack.state(), ThresholdState::Uncalibrated);
        assert_eq!(model.num_queries(), 0);
    }

    #[test]
    fn test_repeated_inference_is_deterministic() {
        let model = halfspace_model();
        let attack =
            LabelOnlyDecisionBoundary::new(&model, SearchConfig::default(), 5).with_threshold(0.2);
        let x = array![[0.1, 0.3], [0.35, 0.9], [0.8, 0.4]];
        let y = array![0, 0, 1];
        assert_eq!(
            attack.boundary_distances(&x.view(), &y.view()).unwrap(),
            attack.boundary_distances(&x.view(), &y.view()).unwrap()
        );
        assert_eq!(
            attack.infer(&x.view(), &y.view()).unwrap(),
            attack.infer(&x.view(), &y.view()).unwrap()
        );
    }
}
