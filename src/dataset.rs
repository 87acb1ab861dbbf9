//! Labeled samples and the member / non-member split an attack is evaluated on.
use crate::error::DatasetError;
use crate::MIAFloat;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A batch of feature vectors, one per row, with their true labels.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LabeledSamples {
    features: Array2<MIAFloat>,
    labels: Array1<usize>,
}

impl LabeledSamples {
    /// # Errors
    /// If the number of rows differs from the number of labels.
    pub fn new(features: Array2<MIAFloat>, labels: Array1<usize>) -> Result<Self, DatasetError> {
        if features.nrows() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                samples: features.nrows(),
                labels: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn nfeatures(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<MIAFloat> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<usize> {
        self.labels.view()
    }

    /// Iterates over `(feature_vector, label)` pairs.
    pub fn samples(&self) -> impl Iterator<Item = (ArrayView1<MIAFloat>, usize)> + '_ {
        self.features.rows().into_iter().zip(self.labels.iter().copied())
    }

    /// Splits into the first `idx` samples and the rest.
    ///
    /// # Panics
    /// If `idx > self.len()`.
    pub fn split_at(&self, idx: usize) -> (Self, Self) {
        assert!(idx <= self.len());
        (
            Self {
                features: self.features.slice(s![..idx, ..]).to_owned(),
                labels: self.labels.slice(s![..idx]).to_owned(),
            },
            Self {
                features: self.features.slice(s![idx.., ..]).to_owned(),
                labels: self.labels.slice(s![idx..]).to_owned(),
            },
        )
    }

    /// Returns the samples with their labels replaced.
    ///
    /// # Errors
    /// If `labels` has the wrong length.
    pub fn with_labels(&self, labels: Array1<usize>) -> Result<Self, DatasetError> {
        Self::new(self.features.clone(), labels)
    }
}

/// Training members and held-out non-members of a target model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSplit {
    members: LabeledSamples,
    nonmembers: LabeledSamples,
}

#[derive(Deserialize)]
struct RawSplit {
    members: LabeledSamples,
    nonmembers: LabeledSamples,
}

/// Bit patterns of a feature row, so `0.0` and `-0.0` are distinct samples.
fn row_key(row: ArrayView1<MIAFloat>) -> Vec<u64> {
    row.iter().map(|x| x.to_bits()).collect()
}

impl DatasetSplit {
    /// # Errors
    /// If the two sets disagree on the number of features or share a sample.
    pub fn new(members: LabeledSamples, nonmembers: LabeledSamples) -> Result<Self, DatasetError> {
        if !members.is_empty()
            && !nonmembers.is_empty()
            && members.nfeatures() != nonmembers.nfeatures()
        {
            return Err(DatasetError::FeatureMismatch {
                members: members.nfeatures(),
                nonmembers: nonmembers.nfeatures(),
            });
        }
        let member_rows: HashMap<Vec<u64>, usize> = members
            .features()
            .rows()
            .into_iter()
            .enumerate()
            .map(|(idx, row)| (row_key(row), idx))
            .collect();
        if let Some((nonmember, member)) = nonmembers
            .features()
            .rows()
            .into_iter()
            .enumerate()
            .find_map(|(idx, row)| member_rows.get(&row_key(row)).map(|&m| (idx, m)))
        {
            return Err(DatasetError::Overlap { member, nonmember });
        }
        Ok(Self {
            members,
            nonmembers,
        })
    }

    /// Loads a JSON document of the form `{"members": {...}, "nonmembers": {...}}`
    /// where each set holds serialized `features` and `labels` arrays.
    ///
    /// # Errors
    /// On I/O or parse failures, or if the parsed split is invalid.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawSplit = serde_json::from_str(&text).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(
            LabeledSamples::new(raw.members.features, raw.members.labels)?,
            LabeledSamples::new(raw.nonmembers.features, raw.nonmembers.labels)?,
        )
    }

    pub const fn members(&self) -> &LabeledSamples {
        &self.members
    }

    pub const fn nonmembers(&self) -> &LabeledSamples {
        &self.nonmembers
    }

    pub fn len(&self) -> usize {
        self.members.len() + self.nonmembers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits both sets at the same `ratio`: the first part of each set goes
    /// into the first returned split.
    ///
    /// # Errors
    /// If `ratio` is outside `[0, 1]`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn partition(&self, ratio: f64) -> Result<(Self, Self), DatasetError> {
        if !(0. ..=1.).contains(&ratio) {
            return Err(DatasetError::InvalidRatio { ratio });
        }
        let member_idx = (self.members.len() as f64 * ratio).floor() as usize;
        let nonmember_idx = (self.nonmembers.len() as f64 * ratio).floor() as usize;
        let (members_head, members_tail) = self.members.split_at(member_idx);
        let (nonmembers_head, nonmembers_tail) = self.nonmembers.split_at(nonmember_idx);
        Ok((
            Self {
                members: members_head,
                nonmembers: nonmembers_head,
            },
            Self {
                members: members_tail,
                nonmembers: nonmembers_tail,
            },
        ))
    }
}

/// Draws `n_per_class` samples around each row of `centers`, labelled with the
/// row index.
///
/// # Panics
/// If `std` is negative or not finite.
pub fn gaussian_blobs<R: Rng>(
    centers: &ArrayView2<MIAFloat>,
    n_per_class: usize,
    std: MIAFloat,
    rng: &mut R,
) -> LabeledSamples {
    let nfeatures = centers.ncols();
    let dist = Normal::new(0., std).unwrap();
    let mut features = Array2::zeros((centers.nrows() * n_per_class, nfeatures));
    let mut labels = Array1::zeros(centers.nrows() * n_per_class);
    for (class, center) in centers.rows().into_iter().enumerate() {
        let rows = class * n_per_class..(class + 1) * n_per_class;
        let noise = Array2::random_using((n_per_class, nfeatures), dist, rng);
        features
            .slice_mut(s![rows.clone(), ..])
            .assign(&(noise + &center));
        labels.slice_mut(s![rows]).fill(class);
    }
    LabeledSamples { features, labels }
}
