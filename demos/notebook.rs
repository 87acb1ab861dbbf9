//! Trains a memorizing target on synthetic blobs and runs every attack against it.
use log::LevelFilter;
use mia_rs::attacks::CalibrationConfig;
use mia_rs::dataset::gaussian_blobs;
use mia_rs::logging::LogConfig;
use mia_rs::{
    AttackConfig, AttackInputType, AttackModelType, Bounds1, DatasetSplit, Harness,
    HarnessConfig, HarnessError, KNearestNeighbors, SearchConfig, TargetModel,
};
use ndarray::array;
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn main() -> Result<(), HarnessError> {
    let config = HarnessConfig {
        attack_train_ratio: 0.5,
        seed: 1234,
        log: LogConfig {
            level: LevelFilter::Info,
            file: None,
        },
        attacks: vec![
            AttackConfig::RuleBased,
            AttackConfig::BlackBox {
                input_type: AttackInputType::Prediction,
                model_type: AttackModelType::default(),
            },
            AttackConfig::BlackBox {
                input_type: AttackInputType::Loss,
                model_type: AttackModelType::default(),
            },
            AttackConfig::LabelOnly {
                search: SearchConfig::default(),
                calibration: CalibrationConfig::Supervised,
            },
            AttackConfig::LabelOnly {
                search: SearchConfig::default(),
                calibration: CalibrationConfig::Unsupervised {
                    top_t: 50.,
                    num_samples: 100,
                    max_queries: 1,
                },
            },
        ],
        ..HarnessConfig::default()
    };
    let harness = Harness::new(config);
    harness.init_logging()?;

    let mut rng = Pcg64::seed_from_u64(harness.config().seed);
    let centers = array![[0., 0.], [2., 2.], [-2., 2.]];
    let members = gaussian_blobs(&centers.view(), 50, 1.0, &mut rng);
    let nonmembers = gaussian_blobs(&centers.view(), 50, 1.0, &mut rng);

    let mut knn = KNearestNeighbors::new(1, 3);
    knn.fit(&members);
    let model = TargetModel::new(knn).with_clip_values(Bounds1::from_elem(2, -5., 5.)?)?;
    let split = DatasetSplit::new(members, nonmembers)?;

    for attack_report in harness.run(&model, &split)? {
        println!("== {} ==\n{}\n", attack_report.attack, attack_report.report);
    }
    println!("target model answered {} queries", model.num_queries());
    Ok(())
}
