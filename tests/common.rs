#![allow(dead_code)]
use mia_rs::dataset::gaussian_blobs;
use mia_rs::{DatasetSplit, KNearestNeighbors, LabeledSamples, TargetModel, DNN};
use ndarray::{array, Array1};
use rand::Rng;

/// Ten training points in two well separated classes.
pub fn training_points<R: Rng>(rng: &mut R) -> LabeledSamples {
    let centers = array![[0., 0.], [4., 4.]];
    gaussian_blobs(&centers.view(), 5, 0.5, rng)
}

/// A 1-nearest-neighbour target that has memorized `members`.
pub fn memorizing_model(members: &LabeledSamples) -> TargetModel {
    let mut knn = KNearestNeighbors::new(1, 2);
    knn.fit(members);
    TargetModel::new(knn)
}

/// Non-members drawn from the same classes, relabelled so the target
/// misclassifies every one of them.
pub fn misclassified_nonmembers<R: Rng>(model: &TargetModel, rng: &mut R) -> LabeledSamples {
    let centers = array![[0., 0.], [4., 4.]];
    let fresh = gaussian_blobs(&centers.view(), 5, 0.5, rng);
    let predicted = model.predict_labels(&fresh.features()).unwrap();
    let wrong: Array1<usize> = predicted.mapv(|label| (label + 1) % 2);
    fresh.with_labels(wrong).unwrap()
}

pub fn memorization_split<R: Rng>(rng: &mut R) -> (TargetModel, DatasetSplit) {
    let members = training_points(rng);
    let model = memorizing_model(&members);
    let nonmembers = misclassified_nonmembers(&model, rng);
    (model, DatasetSplit::new(members, nonmembers).unwrap())
}

pub fn random_dnn<R: Rng>(sizes: &[usize], rng: &mut R) -> DNN {
    DNN::random(sizes, rng)
}
