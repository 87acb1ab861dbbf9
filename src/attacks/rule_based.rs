use crate::attacks::MembershipInference;
use crate::error::AttackError;
use crate::model::TargetModel;
use crate::MIAFloat;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

/// Predicts "member" exactly when the target model classifies a sample correctly.
#[derive(Clone, Copy, Debug)]
pub struct RuleBasedAttack<'a> {
    model: &'a TargetModel,
}

impl<'a> RuleBasedAttack<'a> {
    pub const fn new(model: &'a TargetModel) -> Self {
        Self { model }
    }
}

impl MembershipInference for RuleBasedAttack<'_> {
    fn infer(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<bool>, AttackError> {
        self.model.check_labels(x, y)?;
        let predicted = self.model.predict_labels(x)?;
        let membership = Zip::from(&predicted)
            .and(y)
            .map_collect(|predicted, label| predicted == label);
        debug!(
            "rule based attack: {} of {} samples inferred as members",
            membership.iter().filter(|&&m| m).count(),
            membership.len()
        );
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::model::KNearestNeighbors;
    use crate::test_util::*;
    use crate::LabeledSamples;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_member_iff_prediction_matches(
            train in array2(6, 2),
            queries in array2(8, 2),
            train_labels in proptest::collection::vec(0_usize..3, 6),
            query_labels in proptest::collection::vec(0_usize..3, 8),
        ) {
            let mut knn = KNearestNeighbors::new(1, 3);
            knn.fit(&LabeledSamples::new(train, Array1::from_vec(train_labels)).unwrap());
            let model = TargetModel::new(knn);
            let y = Array1::from_vec(query_labels);
            let membership = RuleBasedAttack::new(&model).infer(&queries.view(), &y.view()).unwrap();
            let predicted = model.predict_labels(&queries.view()).unwrap();
            for i in 0..8 {
                prop_assert_eq!(membership[i], predicted[i] == y[i]);
            }
        }
    }

    #[test]
    fn test_label_count_mismatch_is_reported() {
        let mut knn = KNearestNeighbors::new(1, 2);
        knn.fit(&LabeledSamples::new(ndarray::array![[0.], [1.]], ndarray::array![0, 1]).unwrap());
        let model = TargetModel::new(knn);
        let err = RuleBasedAttack::new(&model)
            .infer(&ndarray::array![[0.]].view(), &ndarray::array![0, 1].view())
            .unwrap_err();
        assert!(matches!(
            err,
            AttackError::Adapter(AdapterError::LabelCountMismatch {
                samples: 1,
                labels: 2
            })
        ));
    }
}
