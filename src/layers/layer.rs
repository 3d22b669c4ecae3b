//! Multi-dimensional neuron grids.

use crate::errors::{NetworkError, Result};

/// A grid of neurons described by its shape.
///
/// Neurons are addressed in row-major order: the last dimension is
/// contiguous, so `strides[last] == 1` and
/// `strides[i] == strides[i + 1] * shape[i + 1]`. Shape and strides are fixed
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    shape: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
}

impl Layer {
    /// Creates a layer with the given shape.
    ///
    /// Fails if the shape is empty or any dimension is zero.
    pub fn new(shape: impl Into<Vec<usize>>) -> Result<Self> {
        let shape = shape.into();
        if shape.is_empty() {
            return Err(NetworkError::EmptyShape);
        }
        if shape.contains(&0) {
            return Err(NetworkError::ZeroDimension { shape });
        }

        let Some(size) = shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim)) else {
            return Err(NetworkError::SizeOverflow { shape });
        };
        let strides = row_major_strides(&shape);

        Ok(Self {
            shape,
            strides,
            size,
        })
    }

    /// Returns the number of neurons in this layer.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the shape of this layer.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the row-major strides of this layer.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Every stride divides the layer size, so none can overflow once the size
/// itself fits in `usize`.
fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}
