use std::fmt;

/// Shape of a batch of samples, where `None` marks a free (batch) dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorShape {
    dims: Vec<Option<usize>>,
}

impl TensorShape {
    pub fn new(dims: Vec<Option<usize>>) -> Self {
        Self { dims }
    }

    /// Shape of a batch of flat feature vectors with `nfeatures` columns.
    pub fn batch_of(nfeatures: usize) -> Self {
        Self::new(vec![None, Some(nfeatures)])
    }

    pub fn is_compatible_with(&self, other: &Self) -> bool {
        if self.dims.len() != other.dims.len() {
            return false;
        }
        self.dims
            .iter()
            .zip(other.dims.iter())
            .all(|(x, y)| match (x, y) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
    }
}

impl From<&[usize]> for TensorShape {
    fn from(v: &[usize]) -> Self {
        Self {
            dims: v.iter().copied().map(Some).collect(),
        }
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dims: Vec<String> = self
            .dims
            .iter()
            .map(|d| d.map_or_else(|| "?".to_string(), |d| d.to_string()))
            .collect();
        write!(f, "({})", dims.join(", "))
    }
}
