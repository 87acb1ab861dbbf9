//! Minimal adversarial perturbation search against a label-only oracle.
use crate::error::AdapterError;
use crate::model::TargetModel;
use crate::util::l2_norm;
use crate::MIAFloat;
use log::trace;
use ndarray::{Array1, ArrayView1};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Estimates how far a sample sits from the model's decision boundary.
pub trait BoundarySearch: Debug {
    /// L2 norm of the smallest perturbation found that changes the model's
    /// prediction away from `label`. `datum` is assumed to be classified as `label`.
    ///
    /// # Errors
    /// If the target model rejects the queries.
    fn minimal_perturbation_distance(
        &self,
        model: &TargetModel,
        datum: &ArrayView1<MIAFloat>,
        label: usize,
        rng: &mut StdRng,
    ) -> Result<MIAFloat, AdapterError>;
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of random directions tried per sample.
    pub num_directions: usize,
    /// Radius of the first probe along each direction.
    pub init_radius: MIAFloat,
    /// Largest radius probed. Also the distance reported when no direction
    /// reaches the boundary. Defaults to the clip values' diameter when unset.
    pub max_radius: Option<MIAFloat>,
    /// Bisection steps once the boundary has been bracketed.
    pub bisection_steps: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_directions: 32,
            init_radius: 0.01,
            max_radius: None,
            bisection_steps: 24,
        }
    }
}

/// Probes random unit directions: the radius is doubled until the prediction
/// flips, then the flip point is bisected. Perturbed samples are clipped into
/// the model's clip values when it has them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RandomDirectionSearch {
    config: SearchConfig,
}

const FALLBACK_MAX_RADIUS: MIAFloat = 10.;

impl RandomDirectionSearch {
    pub const fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn max_radius(&self, model: &TargetModel) -> MIAFloat {
        self.config.max_radius.unwrap_or_else(|| {
            model
                .clip_values()
                .map(crate::bounds::Bounds1::diameter)
                .filter(|d| d.is_finite() && *d > 0.)
                .unwrap_or(FALLBACK_MAX_RADIUS)
        })
    }

    fn perturb(
        model: &TargetModel,
        datum: &ArrayView1<MIAFloat>,
        direction: &Array1<MIAFloat>,
        radius: MIAFloat,
    ) -> Array1<MIAFloat> {
        let candidate = datum + &(direction * radius);
        match model.clip_values() {
            Some(bounds) => bounds.clip(&candidate.view()),
            None => candidate,
        }
    }

    /// Distance to the closest flip along `direction`, if one lies within `max_radius`.
    fn search_direction(
        &self,
        model: &TargetModel,
        datum: &ArrayView1<MIAFloat>,
        label: usize,
        direction: &Array1<MIAFloat>,
        max_radius: MIAFloat,
    ) -> Result<Option<MIAFloat>, AdapterError> {
        let mut lo = 0.;
        let mut hi = if self.config.init_radius > 0. {
            self.config.init_radius.min(max_radius)
        } else {
            max_radius
        };
        loop {
            let probe = Self::perturb(model, datum, direction, hi);
            if model.predict_label(&probe.view())? != label {
                break;
            }
            if hi >= max_radius {
                return Ok(None);
            }
            lo = hi;
            hi = (hi * 2.).min(max_radius);
        }
        for _ in 0..self.config.bisection_steps {
            let mid = (lo + hi) / 2.;
            let probe = Self::perturb(model, datum, direction, mid);
            if model.predict_label(&probe.view())? == label {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let adversarial = Self::perturb(model, datum, direction, hi);
        Ok(Some(l2_norm((&adversarial - datum).view())))
    }
}

impl BoundarySearch for RandomDirectionSearch {
    fn minimal_perturbation_distance(
        &self,
        model: &TargetModel,
        datum: &ArrayView1<MIAFloat>,
        label: usize,
        rng: &mut StdRng,
    ) -> Result<MIAFloat, AdapterError> {
        let max_radius = self.max_radius(model);
        let mut best = max_radius;
        for _ in 0..self.config.num_directions {
            let mut direction = Array1::random_using(datum.len(), StandardNormal, rng);
            let norm = l2_norm(direction.view());
            if norm == 0. {
                continue;
            }
            direction /= norm;
            if let Some(distance) =
                self.search_direction(model, datum, label, &direction, best)?
            {
                best = best.min(distance);
            }
        }
        trace!("boundary distance {} for label {}", best, label);
        Ok(best)
    }
}
