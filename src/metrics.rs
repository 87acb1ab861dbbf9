//! Scoring of membership predictions against known membership.
use crate::attacks::MembershipInference;
use crate::dataset::DatasetSplit;
use crate::error::AttackError;
use crate::MIAFloat;
use ndarray::{Array1, ArrayView1, Zip};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MembershipReport {
    /// Fraction of members inferred as members.
    pub member_accuracy: MIAFloat,
    /// Fraction of non-members inferred as non-members.
    pub nonmember_accuracy: MIAFloat,
    pub accuracy: MIAFloat,
    /// Of the samples inferred as members, the fraction that are members.
    pub precision: MIAFloat,
    /// Of the members, the fraction inferred as members.
    pub recall: MIAFloat,
    pub n_members: usize,
    pub n_nonmembers: usize,
}

impl MembershipReport {
    /// Builds a report from predictions on the members and on the non-members.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_predictions(
        inferred_members: &ArrayView1<bool>,
        inferred_nonmembers: &ArrayView1<bool>,
    ) -> Self {
        let n_members = inferred_members.len();
        let n_nonmembers = inferred_nonmembers.len();
        let member_accuracy = accuracy(
            inferred_members,
            &Array1::from_elem(n_members, true).view(),
        );
        let nonmember_accuracy = accuracy(
            inferred_nonmembers,
            &Array1::from_elem(n_nonmembers, false).view(),
        );
        let total = n_members + n_nonmembers;
        let accuracy = if total == 0 {
            1.
        } else {
            (member_accuracy * n_members as MIAFloat
                + nonmember_accuracy * n_nonmembers as MIAFloat)
                / total as MIAFloat
        };

        let predicted: Array1<bool> = inferred_members
            .iter()
            .chain(inferred_nonmembers.iter())
            .copied()
            .collect();
        let actual: Array1<bool> = std::iter::repeat(true)
            .take(n_members)
            .chain(std::iter::repeat(false).take(n_nonmembers))
            .collect();
        let (precision, recall) = precision_recall(&predicted.view(), &actual.view(), true);
        Self {
            member_accuracy,
            nonmember_accuracy,
            accuracy,
            precision,
            recall,
            n_members,
            n_nonmembers,
        }
    }
}

impl fmt::Display for MembershipReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Members Accuracy: {:.4} ({} samples)",
            self.member_accuracy, self.n_members
        )?;
        writeln!(
            f,
            "Non Members Accuracy {:.4} ({} samples)",
            self.nonmember_accuracy, self.n_nonmembers
        )?;
        writeln!(f, "Attack Accuracy {:.4}", self.accuracy)?;
        write!(
            f,
            "Precision {:.4}, Recall {:.4}",
            self.precision, self.recall
        )
    }
}

/// Runs `attack` on both sides of `split` and scores the predictions.
///
/// # Errors
/// Whatever the attack raises.
pub fn evaluate<A: MembershipInference + ?Sized>(
    attack: &A,
    split: &DatasetSplit,
) -> Result<MembershipReport, AttackError> {
    let members = split.members();
    let nonmembers = split.nonmembers();
    let inferred_members = attack.infer(&members.features(), &members.labels())?;
    let inferred_nonmembers = attack.infer(&nonmembers.features(), &nonmembers.labels())?;
    Ok(MembershipReport::from_predictions(
        &inferred_members.view(),
        &inferred_nonmembers.view(),
    ))
}

/// Fraction of positions where `predicted` agrees with `actual`; 1 when empty.
///
/// # Panics
/// If the arrays differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(predicted: &ArrayView1<bool>, actual: &ArrayView1<bool>) -> MIAFloat {
    if predicted.is_empty() {
        return 1.;
    }
    let agree = Zip::from(predicted)
        .and(actual)
        .fold(0_usize, |n, p, a| n + usize::from(p == a));
    agree as MIAFloat / predicted.len() as MIAFloat
}

/// Precision and recall of `predicted` against `actual`, treating `positive`
/// as the positive class. Precision is 1 when nothing is predicted positive
/// and recall is 1 when nothing is actually positive.
///
/// # Panics
/// If the arrays differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn precision_recall(
    predicted: &ArrayView1<bool>,
    actual: &ArrayView1<bool>,
    positive: bool,
) -> (MIAFloat, MIAFloat) {
    let (tp, predicted_pos, actual_pos) = Zip::from(predicted).and(actual).fold(
        (0_usize, 0_usize, 0_usize),
        |(tp, pp, ap), &p, &a| {
            let p = p == positive;
            let a = a == positive;
            (
                tp + usize::from(p && a),
                pp + usize::from(p),
                ap + usize::from(a),
            )
        },
    );
    let precision = if predicted_pos == 0 {
        1.
    } else {
        tp as MIAFloat / predicted_pos as MIAFloat
    };
    let recall = if actual_pos == 0 {
        1.
    } else {
        tp as MIAFloat / actual_pos as MIAFloat
    };
    (precision, recall)
}
