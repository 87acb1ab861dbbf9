use crate::attacks::MembershipInference;
use crate::error::AttackError;
use crate::learners::{AttackClassifier, AttackModelType, BinaryClassifier};
use crate::model::TargetModel;
use crate::util::one_hot;
use crate::MIAFloat;
use log::info;
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Which target model output the attack model learns from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackInputType {
    /// Per-class scores.
    #[default]
    Prediction,
    /// Cross-entropy loss of the true label.
    Loss,
}

/// Shadow-classifier attack: a binary classifier trained to tell members from
/// non-members by the target model's output on them, together with the true label.
#[derive(Clone, Debug)]
pub struct BlackBoxAttack<'a> {
    model: &'a TargetModel,
    input_type: AttackInputType,
    model_type: AttackModelType,
    attack_model: Option<AttackClassifier>,
}

impl<'a> BlackBoxAttack<'a> {
    pub const fn new(
        model: &'a TargetModel,
        input_type: AttackInputType,
        model_type: AttackModelType,
    ) -> Self {
        Self {
            model,
            input_type,
            model_type,
            attack_model: None,
        }
    }

    pub const fn is_fitted(&self) -> bool {
        self.attack_model.is_some()
    }

    fn attack_features(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array2<MIAFloat>, AttackError> {
        self.model.check_labels(x, y)?;
        let outputs = match self.input_type {
            AttackInputType::Prediction => self.model.predict(x)?,
            AttackInputType::Loss => self.model.loss(x, y)?.insert_axis(Axis(1)),
        };
        let labels = one_hot(y, self.model.nb_classes());
        Ok(ndarray::concatenate![Axis(1), outputs, labels])
    }

    /// Trains the attack model on known members and non-members.
    ///
    /// # Errors
    /// `InsufficientData` if either group is empty, or any adapter error.
    pub fn fit(
        &mut self,
        member_x: &ArrayView2<MIAFloat>,
        member_y: &ArrayView1<usize>,
        nonmember_x: &ArrayView2<MIAFloat>,
        nonmember_y: &ArrayView1<usize>,
    ) -> Result<(), AttackError> {
        if member_x.nrows() == 0 || nonmember_x.nrows() == 0 {
            return Err(AttackError::InsufficientData {
                members: member_x.nrows(),
                nonmembers: nonmember_x.nrows(),
            });
        }
        let member_features = self.attack_features(member_x, member_y)?;
        let nonmember_features = self.attack_features(nonmember_x, nonmember_y)?;
        let features = concatenate(
            Axis(0),
            &[member_features.view(), nonmember_features.view()],
        )
        .map_err(|_| AttackError::InvalidParameter {
            name: "nonmember_x",
            reason: "members and non-members produced different attack features".to_string(),
        })?;
        let targets: Array1<bool> = std::iter::repeat(true)
            .take(member_features.nrows())
            .chain(std::iter::repeat(false).take(nonmember_features.nrows()))
            .collect();

        let mut attack_model = self.model_type.build();
        attack_model.fit(&features.view(), &targets.view());
        info!(
            "fit black box attack ({:?} input) on {} members and {} non-members",
            self.input_type,
            member_features.nrows(),
            nonmember_features.nrows()
        );
        self.attack_model = Some(attack_model);
        Ok(())
    }

    /// Membership probability of each sample.
    ///
    /// # Errors
    /// `NotFitted` before [`Self::fit`], or any adapter error.
    pub fn infer_proba(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<MIAFloat>, AttackError> {
        let attack_model = self.attack_model.as_ref().ok_or(AttackError::NotFitted)?;
        let features = self.attack_features(x, y)?;
        Ok(attack_model.predict_proba(&features.view()))
    }
}

impl MembershipInference for BlackBoxAttack<'_> {
    fn infer(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<bool>, AttackError> {
        Ok(self.infer_proba(x, y)?.mapv(|p| p >= 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::gaussian_blobs;
    use crate::learners::ForestConfig;
    use crate::metrics::accuracy;
    use crate::model::DNN;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn random_target(seed: u64) -> TargetModel {
        let mut rng = Pcg64::seed_from_u64(seed);
        TargetModel::new(DNN::random(&[2, 3], &mut rng))
    }

    #[test]
    fn test_fit_requires_both_groups() {
        let model = random_target(0);
        let mut attack =
            BlackBoxAttack::new(&model, AttackInputType::Prediction, AttackModelType::default());
        let x = array![[0., 1.]];
        let y = array![0];
        let empty_x = Array2::<f64>::zeros((0, 2));
        let empty_y = Array1::<usize>::zeros(0);
        let err = attack
            .fit(&x.view(), &y.view(), &empty_x.view(), &empty_y.view())
            .unwrap_err();
        assert!(matches!(
            err,
            AttackError::InsufficientData {
                members: 1,
                nonmembers: 0
            }
        ));
        assert!(matches!(
            attack.infer(&x.view(), &y.view()),
            Err(AttackError::NotFitted)
        ));
    }

    #[test]
    fn test_training_accuracy_dominates_held_out_accuracy() {
        let model = random_target(1);
        let mut rng = Pcg64::seed_from_u64(2);
        let centers = array![[0., 0.], [3., 3.], [-3., 3.]];
        let members = gaussian_blobs(&centers.view(), 10, 1.0, &mut rng);
        let nonmembers = gaussian_blobs(&centers.view(), 10, 1.0, &mut rng);
        let held_out_members = gaussian_blobs(&centers.view(), 10, 1.0, &mut rng);
        let held_out_nonmembers = gaussian_blobs(&centers.view(), 10, 1.0, &mut rng);

        for input_type in [AttackInputType::Prediction, AttackInputType::Loss] {
            let mut attack = BlackBoxAttack::new(
                &model,
                input_type,
                AttackModelType::RandomForest(ForestConfig {
                    n_estimators: 1,
                    max_features: Some(usize::MAX),
                    bootstrap: false,
                    ..ForestConfig::default()
                }),
            );
            attack
                .fit(
                    &members.features(),
                    &members.labels(),
                    &nonmembers.features(),
                    &nonmembers.labels(),
                )
                .unwrap();
            let score = |m: &crate::LabeledSamples, n: &crate::LabeledSamples| {
                let inferred_m = attack.infer(&m.features(), &m.labels()).unwrap();
                let inferred_n = attack.infer(&n.features(), &n.labels()).unwrap();
                let truth_m = Array1::from_elem(m.len(), true);
                let truth_n = Array1::from_elem(n.len(), false);
                (accuracy(&inferred_m.view(), &truth_m.view())
                    + accuracy(&inferred_n.view(), &truth_n.view()))
                    / 2.
            };
            let train_acc = score(&members, &nonmembers);
            let held_out_acc = score(&held_out_members, &held_out_nonmembers);
            assert_eq!(train_acc, 1., "{:?}", input_type);
            more_asserts::assert_ge!(train_acc, held_out_acc);
        }
    }

    #[test]
    fn test_probabilities_have_one_entry_per_sample() {
        let model = random_target(4);
        let mut attack = BlackBoxAttack::new(
            &model,
            AttackInputType::Loss,
            AttackModelType::LogisticRegression(crate::learners::LogisticConfig::default()),
        );
        let member_x = array![[0., 0.], [1., 1.]];
        let nonmember_x = array![[5., 5.], [-4., 2.]];
        let y = array![0, 1];
        attack
            .fit(&member_x.view(), &y.view(), &nonmember_x.view(), &y.view())
            .unwrap();
        assert!(attack.is_fitted());
        let probs = attack.infer_proba(&member_x.view(), &y.view()).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| (0. ..=1.).contains(p)));
    }
}
