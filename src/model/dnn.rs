use crate::affine::Affine2;
use crate::error::{AdapterError, ModelError};
use crate::model::{Classifier, Layer, Operation};
use crate::util::softmax_rows;
use crate::MIAFloat;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A sequential feed-forward network. Its last layer produces logits, which
/// `predict_scores` turns into class probabilities with a softmax.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DNN {
    layers: Vec<Layer>,
}

impl DNN {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn add_layer(&mut self, layer: Layer) {
        debug_assert!(self
            .layers
            .last()
            .map_or(true, |last| last.output_dim() == layer.input_dim()));
        self.layers.push(layer);
    }

    pub fn get_layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// A fully connected ReLU network with Gaussian weights, `sizes[0]` inputs
    /// and `sizes[sizes.len() - 1]` output classes.
    ///
    /// # Panics
    /// If fewer than two sizes are given.
    pub fn random<R: Rng>(sizes: &[usize], rng: &mut R) -> Self {
        assert!(sizes.len() >= 2);
        let dist = Normal::new(0., 1.).unwrap();
        let mut dnn = Self::default();
        let n_affines = sizes.len() - 1;
        for (i, (&input, &output)) in sizes.iter().tuple_windows().enumerate() {
            dnn.add_layer(Layer::new_dense(Affine2::new(
                Array2::random_using((output, input), dist, rng),
                Array1::random_using(output, dist, rng),
            )));
            if i + 1 < n_affines {
                dnn.add_layer(Layer::new_relu(output));
            }
        }
        dnn
    }

    /// Checks that the network is non-empty, that each layer accepts what the
    /// previous one produces and that every dense layer is well formed.
    ///
    /// # Errors
    /// On the first layer that breaks one of those conditions.
    pub fn validate(&self) -> Result<(), AdapterError> {
        if self.layers.is_empty() {
            return Err(AdapterError::EmptyNetwork);
        }
        for (layer, op) in self.layers.iter().enumerate() {
            if let Layer::Dense(dense) = op {
                let aff = dense.affine();
                if aff.basis().nrows() != aff.shift().len() {
                    return Err(AdapterError::MalformedDense {
                        layer,
                        rows: aff.basis().nrows(),
                        shift: aff.shift().len(),
                    });
                }
            }
        }
        match self
            .layers
            .iter()
            .tuple_windows()
            .position(|(prev, next)| prev.output_dim() != next.input_dim())
        {
            Some(idx) => Err(AdapterError::LayerMismatch {
                layer: idx + 1,
                expected: self.layers[idx + 1].input_dim(),
                given: self.layers[idx].output_dim(),
            }),
            None => Ok(()),
        }
    }

    /// Reads a network written by [`Self::to_json_file`] and validates it.
    ///
    /// # Errors
    /// On I/O or parse failures, or if the layers do not chain.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dnn: Self = serde_json::from_str(&text).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        dnn.validate()?;
        Ok(dnn)
    }

    /// # Errors
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let text = serde_json::to_string(self).map_err(io::Error::from)?;
        fs::write(path, text)
    }

    pub fn forward1(&self, input: &Array1<MIAFloat>) -> Array1<MIAFloat> {
        self.layers
            .iter()
            .fold(input.clone(), |acc, layer| layer.forward1(&acc))
    }

    pub fn forward2(&self, input: &Array2<MIAFloat>) -> Array2<MIAFloat> {
        self.layers
            .iter()
            .fold(input.clone(), |acc, layer| layer.forward2(&acc))
    }
}

impl Classifier for DNN {
    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Operation::input_dim)
    }

    fn nb_classes(&self) -> usize {
        self.layers.last().map_or(0, Operation::output_dim)
    }

    fn predict_scores(&self, x: &ArrayView2<MIAFloat>) -> Array2<MIAFloat> {
        softmax_rows(&self.forward2(&x.to_owned()).view())
    }
}

impl fmt::Display for DNN {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let layers: Vec<String> = self.layers.iter().map(|x| format!("{}", x)).collect();
        write!(f, "Input {} => {}", self.input_dim(), layers.join(" => "))
    }
}
