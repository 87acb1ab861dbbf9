//! Membership inference attacks against a [`TargetModel`](crate::TargetModel).
mod black_box;
mod label_only;
mod rule_based;

pub use black_box::{AttackInputType, BlackBoxAttack};
pub use label_only::{CalibrationConfig, LabelOnlyDecisionBoundary, ThresholdState};
pub use rule_based::RuleBasedAttack;

use crate::dataset::DatasetSplit;
use crate::error::AttackError;
use crate::MIAFloat;
use log::info;
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::fmt;

pub trait MembershipInference {
    /// Infers for each row of `x`, labelled by `y`, whether it was part of the
    /// target model's training set.
    ///
    /// # Errors
    /// If the attack is not ready or the inputs are malformed.
    fn infer(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<bool>, AttackError>;
}

/// Any of the supported attacks, together with how it is prepared.
#[derive(Clone, Debug)]
pub enum Attack<'a> {
    RuleBased(RuleBasedAttack<'a>),
    BlackBox(BlackBoxAttack<'a>),
    LabelOnly {
        attack: LabelOnlyDecisionBoundary<'a>,
        calibration: CalibrationConfig,
    },
}

impl Attack<'_> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RuleBased(_) => "rule_based",
            Self::BlackBox(_) => "black_box",
            Self::LabelOnly { .. } => "label_only",
        }
    }

    /// Fits or calibrates the attack on samples of known membership.
    ///
    /// # Errors
    /// Any error raised while fitting or calibrating.
    pub fn prepare(&mut self, known: &DatasetSplit) -> Result<(), AttackError> {
        let members = known.members();
        let nonmembers = known.nonmembers();
        match self {
            Self::RuleBased(_) => {}
            Self::BlackBox(attack) => attack.fit(
                &members.features(),
                &members.labels(),
                &nonmembers.features(),
                &nonmembers.labels(),
            )?,
            Self::LabelOnly {
                attack,
                calibration,
            } => {
                match *calibration {
                    CalibrationConfig::Supervised => attack.calibrate_distance_threshold(
                        &members.features(),
                        &members.labels(),
                        &nonmembers.features(),
                        &nonmembers.labels(),
                    )?,
                    CalibrationConfig::Unsupervised {
                        top_t,
                        num_samples,
                        max_queries,
                    } => attack.calibrate_distance_threshold_unsupervised(
                        top_t,
                        num_samples,
                        max_queries,
                    )?,
                    CalibrationConfig::Fixed { tau } => {
                        attack.set_distance_threshold(tau);
                        tau
                    }
                };
            }
        }
        info!("prepared {} attack on {} samples", self.name(), known.len());
        Ok(())
    }
}

impl MembershipInference for Attack<'_> {
    fn infer(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<bool>, AttackError> {
        match self {
            Self::RuleBased(attack) => attack.infer(x, y),
            Self::BlackBox(attack) => attack.infer(x, y),
            Self::LabelOnly { attack, .. } => attack.infer(x, y),
        }
    }
}

impl fmt::Display for Attack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RuleBased(_) => write!(f, "RuleBased"),
            Self::BlackBox(attack) => write!(f, "BlackBox(fitted: {})", attack.is_fitted()),
            Self::LabelOnly { attack, .. } => match attack.distance_threshold() {
                Some(tau) => write!(f, "LabelOnly(tau: {})", tau),
                None => write!(f, "LabelOnly(uncalibrated)"),
            },
        }
    }
}
