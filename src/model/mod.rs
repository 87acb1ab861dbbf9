//! Target model adapter and the classifiers it can wrap.
pub mod dense;
pub mod dnn;
pub mod knn;
pub mod operation;
pub mod relu;

pub use dense::Dense;
pub use dnn::DNN;
pub use knn::KNearestNeighbors;
pub use operation::{Layer, Operation};
pub use relu::ReLU;

use crate::bounds::Bounds1;
use crate::error::AdapterError;
use crate::tensorshape::TensorShape;
use crate::util::argmax_rows;
use crate::MIAFloat;
use log::trace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque classifier. Implementations must be deterministic for a fixed model state.
pub trait Classifier: Debug + Send + Sync {
    fn input_dim(&self) -> usize;

    fn nb_classes(&self) -> usize;

    /// One row of per-class scores for each row of `x`.
    fn predict_scores(&self, x: &ArrayView2<MIAFloat>) -> Array2<MIAFloat>;
}

/// Wraps a [`Classifier`] with input validation, label/loss helpers and a query counter.
#[derive(Debug)]
pub struct TargetModel {
    classifier: Box<dyn Classifier>,
    input_shape: TensorShape,
    clip_values: Option<Bounds1>,
    queries: AtomicUsize,
}

impl TargetModel {
    pub fn new<C: Classifier + 'static>(classifier: C) -> Self {
        let input_shape = TensorShape::batch_of(classifier.input_dim());
        Self {
            classifier: Box::new(classifier),
            input_shape,
            clip_values: None,
            queries: AtomicUsize::new(0),
        }
    }

    /// Restricts the model's input domain to `bounds`.
    ///
    /// # Errors
    /// If `bounds` does not cover exactly the model's input features.
    pub fn with_clip_values(mut self, bounds: Bounds1) -> Result<Self, AdapterError> {
        if bounds.ndim() != self.input_dim() {
            return Err(AdapterError::InputDimMismatch {
                expected: self.input_dim(),
                given: bounds.ndim(),
            });
        }
        self.clip_values = Some(bounds);
        Ok(self)
    }

    pub const fn clip_values(&self) -> Option<&Bounds1> {
        self.clip_values.as_ref()
    }

    pub const fn input_shape(&self) -> &TensorShape {
        &self.input_shape
    }

    pub fn input_dim(&self) -> usize {
        self.classifier.input_dim()
    }

    pub fn nb_classes(&self) -> usize {
        self.classifier.nb_classes()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Number of samples sent to the classifier so far.
    pub fn num_queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn check_input(&self, x: &ArrayView2<MIAFloat>) -> Result<(), AdapterError> {
        if self.input_shape.is_compatible_with(&TensorShape::from(x.shape())) {
            Ok(())
        } else {
            Err(AdapterError::InputDimMismatch {
                expected: self.input_dim(),
                given: x.ncols(),
            })
        }
    }

    /// Checks that `y` has one in-range label per row of `x`.
    ///
    /// # Errors
    pub fn check_labels(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<(), AdapterError> {
        if x.nrows() != y.len() {
            return Err(AdapterError::LabelCountMismatch {
                samples: x.nrows(),
                labels: y.len(),
            });
        }
        let nb_classes = self.nb_classes();
        match y.iter().find(|&&label| label >= nb_classes) {
            Some(&label) => Err(AdapterError::LabelOutOfRange { label, nb_classes }),
            None => Ok(()),
        }
    }

    /// Per-class scores, one row per sample.
    ///
    /// # Errors
    /// If `x` does not have the model's number of input features.
    pub fn predict(&self, x: &ArrayView2<MIAFloat>) -> Result<Array2<MIAFloat>, AdapterError> {
        self.check_input(x)?;
        self.queries.fetch_add(x.nrows(), Ordering::Relaxed);
        trace!("querying target model with {} samples", x.nrows());
        Ok(self.classifier.predict_scores(x))
    }

    /// # Errors
    /// If `x` has the wrong width or the model produced NaN scores.
    pub fn predict_labels(&self, x: &ArrayView2<MIAFloat>) -> Result<Array1<usize>, AdapterError> {
        argmax_rows(&self.predict(x)?.view())
    }

    /// # Errors
    /// If `x` has the wrong width or the model produced NaN scores.
    pub fn predict_label(&self, x: &ArrayView1<MIAFloat>) -> Result<usize, AdapterError> {
        let labels = self.predict_labels(&x.view().insert_axis(Axis(0)))?;
        Ok(labels[0])
    }

    /// Categorical cross-entropy of each sample's true label.
    ///
    /// # Errors
    /// If `x` or `y` are malformed.
    pub fn loss(
        &self,
        x: &ArrayView2<MIAFloat>,
        y: &ArrayView1<usize>,
    ) -> Result<Array1<MIAFloat>, AdapterError> {
        self.check_labels(x, y)?;
        let scores = self.predict(x)?;
        Ok(Zip::from(scores.rows())
            .and(y)
            .map_collect(|row, &label| -row[label].max(1e-12).ln()))
    }
}
