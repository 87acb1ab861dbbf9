#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]
//! Black-box membership inference attacks.
//!
//! A target classifier is wrapped in a [`TargetModel`] adapter and attacked by one
//! of three strategies: [`RuleBasedAttack`], [`BlackBoxAttack`] (a shadow classifier
//! trained on the model's outputs) or [`LabelOnlyDecisionBoundary`] (distance to the
//! decision boundary against a calibrated threshold). The [`metrics`] module scores
//! membership predictions and [`Harness`] ties everything together from a
//! [`HarnessConfig`].
extern crate ndarray;
extern crate ndarray_rand;
extern crate ndarray_stats;
extern crate rand;

pub mod adversarial;
pub mod affine;
pub mod attacks;
pub mod bounds;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod learners;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod tensorshape;
pub mod util;

#[cfg(test)]
mod test_util;

pub type MIAFloat = f64;

pub use crate::adversarial::{BoundarySearch, RandomDirectionSearch, SearchConfig};
pub use crate::attacks::{
    Attack, AttackInputType, BlackBoxAttack, LabelOnlyDecisionBoundary, MembershipInference,
    RuleBasedAttack,
};
pub use crate::bounds::Bounds1;
pub use crate::dataset::{DatasetSplit, LabeledSamples};
pub use crate::error::{AdapterError, AttackError, DatasetError, HarnessError, ModelError};
pub use crate::harness::{AttackConfig, CalibrationConfig, Harness, HarnessConfig};
pub use crate::learners::AttackModelType;
pub use crate::metrics::MembershipReport;
pub use crate::model::{Classifier, KNearestNeighbors, TargetModel, DNN};
