//! Synapse - a single weighted connection between two neurons.

/// A directed, weighted and biased connection from one source neuron to one
/// target neuron.
///
/// Endpoint indices are flat (row-major) neuron indices into the link's
/// source and target layers. They are fixed when the owning link is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synapse {
    from_idx: usize,
    to_idx: usize,
    /// Connection weight.
    pub weight: f64,
    /// Bias contributed to the target neuron.
    pub bias: f64,
    /// Reserved for training; never read by evaluation or serialization.
    pub gradient: f64,
}

impl Synapse {
    /// Creates a zero-initialized synapse between two neuron indices.
    pub(crate) fn new(from_idx: usize, to_idx: usize) -> Self {
        Self::with_params(from_idx, to_idx, 0.0, 0.0)
    }

    pub(crate) fn with_params(from_idx: usize, to_idx: usize, weight: f64, bias: f64) -> Self {
        Self {
            from_idx,
            to_idx,
            weight,
            bias,
            gradient: 0.0,
        }
    }

    /// Returns the source neuron index.
    pub fn from_idx(&self) -> usize {
        self.from_idx
    }

    /// Returns the target neuron index.
    pub fn to_idx(&self) -> usize {
        self.to_idx
    }

    /// Returns the `(from_idx, to_idx)` endpoint pair.
    pub fn endpoints(&self) -> (usize, usize) {
        (self.from_idx, self.to_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_synapse_is_zeroed() {
        let syn = Synapse::new(3, 1);
        assert_eq!(syn.endpoints(), (3, 1));
        assert_eq!(syn.weight, 0.0);
        assert_eq!(syn.bias, 0.0);
        assert_eq!(syn.gradient, 0.0);
    }
}
