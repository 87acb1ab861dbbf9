//! Configured evaluation runs: load a split and a model, then prepare and score
//! each configured attack.
use crate::adversarial::SearchConfig;
use crate::attacks::{
    Attack, AttackInputType, BlackBoxAttack, LabelOnlyDecisionBoundary, RuleBasedAttack,
};
use crate::bounds::Bounds1;
use crate::dataset::DatasetSplit;
use crate::error::HarnessError;
use crate::learners::AttackModelType;
use crate::logging::{init_logging, LogConfig};
use crate::metrics::{evaluate, MembershipReport};
use crate::model::{TargetModel, DNN};
use crate::MIAFloat;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::attacks::CalibrationConfig;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttackConfig {
    RuleBased,
    BlackBox {
        #[serde(default)]
        input_type: AttackInputType,
        #[serde(default)]
        model_type: AttackModelType,
    },
    LabelOnly {
        #[serde(default)]
        search: SearchConfig,
        #[serde(default)]
        calibration: CalibrationConfig,
    },
}

impl AttackConfig {
    pub fn build<'a>(&self, model: &'a TargetModel, seed: u64) -> Attack<'a> {
        match self {
            Self::RuleBased => Attack::RuleBased(RuleBasedAttack::new(model)),
            Self::BlackBox {
                input_type,
                model_type,
            } => Attack::BlackBox(BlackBoxAttack::new(model, *input_type, model_type.clone())),
            Self::LabelOnly {
                search,
                calibration,
            } => Attack::LabelOnly {
                attack: LabelOnlyDecisionBoundary::new(model, search.clone(), seed),
                calibration: calibration.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Fraction of each membership class used to fit or calibrate the attacks.
    /// The remainder is evaluated.
    pub attack_train_ratio: MIAFloat,
    pub seed: u64,
    pub dataset_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    /// Per-feature `[lower, upper]` range of valid model inputs.
    pub clip_values: Option<[MIAFloat; 2]>,
    pub log: LogConfig,
    pub attacks: Vec<AttackConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            attack_train_ratio: 0.5,
            seed: 0,
            dataset_path: None,
            model_path: None,
            clip_values: None,
            log: LogConfig::default(),
            attacks: vec![AttackConfig::RuleBased],
        }
    }
}

impl HarnessConfig {
    /// # Errors
    /// On I/O or parse failures.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| HarnessError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Scores of one configured attack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttackReport {
    pub attack: String,
    pub report: MembershipReport,
}

#[derive(Clone, Debug, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub const fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// # Errors
    /// If the logger cannot be installed.
    pub fn init_logging(&self) -> Result<(), HarnessError> {
        init_logging(&self.config.log)
    }

    /// # Errors
    /// If no dataset path is configured or the file is not a valid split.
    pub fn load_split(&self) -> Result<DatasetSplit, HarnessError> {
        let path = self
            .config
            .dataset_path
            .as_ref()
            .ok_or(HarnessError::MissingPath("dataset_path"))?;
        Ok(DatasetSplit::from_json_file(path)?)
    }

    /// Loads a serialized [`DNN`] and wraps it with the configured clip values.
    ///
    /// # Errors
    /// If no model path is configured, the file is not a valid network or the
    /// clip values are not a finite interval.
    pub fn load_model(&self) -> Result<TargetModel, HarnessError> {
        let path = self
            .config
            .model_path
            .as_ref()
            .ok_or(HarnessError::MissingPath("model_path"))?;
        let dnn = DNN::from_json_file(path)?;
        debug!("loaded target model {}", dnn);
        let model = TargetModel::new(dnn);
        match self.config.clip_values {
            Some([lower, upper]) => {
                let bounds = Bounds1::from_elem(model.input_dim(), lower, upper)?;
                Ok(model.with_clip_values(bounds)?)
            }
            None => Ok(model),
        }
    }

    /// Prepares every configured attack on the leading `attack_train_ratio` of
    /// each membership class and evaluates it on the rest.
    ///
    /// # Errors
    /// If the split cannot be partitioned or any attack fails.
    pub fn run(
        &self,
        model: &TargetModel,
        split: &DatasetSplit,
    ) -> Result<Vec<AttackReport>, HarnessError> {
        let (known, evaluated) = split.partition(self.config.attack_train_ratio)?;
        info!(
            "preparing attacks on {} samples, evaluating on {}",
            known.len(),
            evaluated.len()
        );
        self.config
            .attacks
            .iter()
            .map(|attack_config| -> Result<AttackReport, HarnessError> {
                let mut attack = attack_config.build(model, self.config.seed);
                attack.prepare(&known)?;
                let report = evaluate(&attack, &evaluated)?;
                info!("{}\n{}", attack, report);
                Ok(AttackReport {
                    attack: attack.name().to_string(),
                    report,
                })
            })
            .collect()
    }

    /// Loads the configured split and model and runs every attack.
    ///
    /// # Errors
    /// See [`Self::load_split`], [`Self::load_model`] and [`Self::run`].
    pub fn execute(&self) -> Result<Vec<AttackReport>, HarnessError> {
        let split = self.load_split()?;
        let model = self.load_model()?;
        let reports = self.run(&model, &split)?;
        info!("target model answered {} queries", model.num_queries());
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AdapterError, AttackError};
    use crate::learners::ForestConfig;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_config_defaults() {
        let config: HarnessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert!((config.attack_train_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_attack_configs_parse() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{
                "seed": 7,
                "attacks": [
                    {"type": "rule_based"},
                    {"type": "black_box", "input_type": "loss",
                     "model_type": {"family": "random_forest", "n_estimators": 10}},
                    {"type": "label_only",
                     "calibration": {"mode": "unsupervised", "top_t": 50, "num_samples": 100, "max_queries": 1}},
                    {"type": "label_only", "calibration": {"mode": "fixed", "tau": 0.25}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(
            config.attacks,
            vec![
                AttackConfig::RuleBased,
                AttackConfig::BlackBox {
                    input_type: AttackInputType::Loss,
                    model_type: AttackModelType::RandomForest(ForestConfig {
                        n_estimators: 10,
                        ..ForestConfig::default()
                    }),
                },
                AttackConfig::LabelOnly {
                    search: SearchConfig::default(),
                    calibration: CalibrationConfig::Unsupervised {
                        top_t: 50.,
                        num_samples: 100,
                        max_queries: 1,
                    },
                },
                AttackConfig::LabelOnly {
                    search: SearchConfig::default(),
                    calibration: CalibrationConfig::Fixed { tau: 0.25 },
                },
            ]
        );
    }

    #[test]
    fn test_missing_paths_are_reported() {
        let harness = Harness::default();
        assert!(matches!(
            harness.load_split(),
            Err(HarnessError::MissingPath("dataset_path"))
        ));
        assert!(matches!(
            harness.load_model(),
            Err(HarnessError::MissingPath("model_path"))
        ));
    }

    #[test]
    fn test_inverted_clip_values_are_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        DNN::random(&[2, 2], &mut Pcg64::seed_from_u64(0))
            .to_json_file(&model_path)
            .unwrap();
        let harness = Harness::new(HarnessConfig {
            model_path: Some(model_path),
            clip_values: Some([1., 0.]),
            ..HarnessConfig::default()
        });
        assert!(matches!(
            harness.load_model(),
            Err(HarnessError::Attack(AttackError::Adapter(
                AdapterError::InvalidClipValues { index: 0 }
            )))
        ));
    }

    #[test]
    fn test_unparsable_model_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        fs::write(&model_path, "not a network").unwrap();
        let harness = Harness::new(HarnessConfig {
            model_path: Some(model_path.clone()),
            ..HarnessConfig::default()
        });
        match harness.load_model() {
            Err(HarnessError::Json { path, .. }) => assert_eq!(path, model_path),
            other => panic!("expected a parse error, got {:?}", other.map(|m| m.input_dim())),
        }
    }
}
