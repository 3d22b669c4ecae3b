//! Samples passed to and returned from [`Network::predict`](crate::Network::predict).

use serde::{Deserialize, Serialize};

use crate::errors::{NetworkError, Result};

/// One record of input features and (expected or predicted) labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Vec<f64>,
    #[serde(default)]
    pub labels: Vec<f64>,
}

impl Sample {
    /// Creates a sample with features only.
    pub fn new(features: Vec<f64>) -> Self {
        Self {
            features,
            labels: Vec::new(),
        }
    }

    /// Creates a sample with features and labels.
    pub fn with_labels(features: Vec<f64>, labels: Vec<f64>) -> Self {
        Self { features, labels }
    }
}

/// An ordered collection of samples sharing the same feature and label counts.
#[derive(Debug, Clone)]
pub struct SampleSet {
    feature_size: usize,
    label_size: usize,
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new(feature_size: usize, label_size: usize) -> Self {
        Self {
            feature_size,
            label_size,
            samples: Vec::new(),
        }
    }

    /// Appends a sample, rejecting it if its arity differs from the set's.
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if sample.features.len() != self.feature_size {
            return Err(NetworkError::ArityMismatch {
                field: "features",
                expected: self.feature_size,
                actual: sample.features.len(),
            });
        }
        if sample.labels.len() != self.label_size {
            return Err(NetworkError::ArityMismatch {
                field: "labels",
                expected: self.label_size,
                actual: sample.labels.len(),
            });
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn label_size(&self) -> usize {
        self.label_size
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.samples.reserve(additional);
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
