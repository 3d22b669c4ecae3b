//! Links - synapse-bearing connections between two layers.
//!
//! A link owns an ordered synapse list that its [`LinkKind`] populates at
//! construction. The ordering is part of the model file format and is never
//! changed after the link is built.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

use super::core::{LayerId, Network};
use super::synapse::Synapse;
use crate::errors::{NetworkError, Result};
use crate::layers::Activation;

/// Connectivity pattern of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    /// Full bipartite connectivity: every source neuron reaches every target
    /// neuron, ordered source-major, target-minor.
    Dense,
}

impl LinkKind {
    /// Returns the `Type=` tag used in model files.
    pub fn type_name(&self) -> &'static str {
        match self {
            LinkKind::Dense => "Dense",
        }
    }

    /// Looks up a link kind by its `Type=` tag.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Dense" => Some(LinkKind::Dense),
            _ => None,
        }
    }

    /// Number of synapses this pattern produces between layers of the given
    /// sizes, or `None` if the count does not fit in `usize`.
    pub fn synapse_count(&self, source_size: usize, target_size: usize) -> Option<usize> {
        match self {
            LinkKind::Dense => source_size.checked_mul(target_size),
        }
    }

    /// Yields the `(from_idx, to_idx)` pairs of this pattern in synapse order.
    fn endpoints(
        &self,
        source_size: usize,
        target_size: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        match self {
            LinkKind::Dense => {
                (0..source_size).flat_map(move |i| (0..target_size).map(move |j| (i, j)))
            }
        }
    }
}

/// Configuration for a dense link.
#[derive(Debug, Clone)]
pub struct DenseLinkConfig {
    /// Layer the link reads from.
    pub source: LayerId,
    /// Layer the link writes to.
    pub target: LayerId,
    /// Activation applied to the target neurons.
    pub activation: Activation,
}

impl DenseLinkConfig {
    /// Creates a new DenseLinkConfig with a linear activation.
    pub fn new(source: LayerId, target: LayerId) -> Self {
        Self {
            source,
            target,
            activation: Activation::Linear,
        }
    }

    /// Sets the activation function.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the activation function from its identifier.
    pub fn with_activation_name(self, name: &str) -> Result<Self> {
        let activation = Activation::from_name(name)?;
        Ok(self.with_activation(activation))
    }

    /// Builds the link against the layers of `network`.
    pub fn init(&self, network: &Network) -> Result<Link> {
        Link::new(
            LinkKind::Dense,
            network,
            self.source,
            self.target,
            self.activation,
        )
    }
}

/// A connection from a source layer to a target layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    kind: LinkKind,
    source: LayerId,
    target: LayerId,
    source_size: usize,
    target_size: usize,
    activation: Activation,
    synapses: Vec<Synapse>,
}

impl Link {
    /// Creates a link between two layers of `network` and populates its
    /// synapses according to `kind`. Weights and biases start at zero.
    pub fn new(
        kind: LinkKind,
        network: &Network,
        source: LayerId,
        target: LayerId,
        activation: Activation,
    ) -> Result<Self> {
        let source_size = network
            .layer(source)
            .ok_or(NetworkError::UnknownLayer { layer: source })?
            .size();
        let target_size = network
            .layer(target)
            .ok_or(NetworkError::UnknownLayer { layer: target })?
            .size();

        let count = kind
            .synapse_count(source_size, target_size)
            .ok_or(NetworkError::LinkTooLarge {
                source_size,
                target_size,
            })?;
        let mut synapses = Vec::with_capacity(count);
        synapses.extend(
            kind.endpoints(source_size, target_size)
                .map(|(from_idx, to_idx)| Synapse::new(from_idx, to_idx)),
        );

        Ok(Self {
            kind,
            source,
            target,
            source_size,
            target_size,
            activation,
            synapses,
        })
    }

    /// Rebuilds a link from a stored synapse list.
    ///
    /// The list must match the endpoints `kind` would generate, in the same order.
    pub(crate) fn from_synapses(
        kind: LinkKind,
        (source, source_size): (LayerId, usize),
        (target, target_size): (LayerId, usize),
        activation: Activation,
        synapses: Vec<Synapse>,
    ) -> Result<Self> {
        let expected = kind.synapse_count(source_size, target_size);
        if expected != Some(synapses.len()) {
            let expected = expected.map_or_else(|| format!("more than {}", usize::MAX), |n| n.to_string());
            return Err(NetworkError::format(format!(
                "{} link between layers of {} and {} neurons expects {} synapses, found {}",
                kind.type_name(),
                source_size,
                target_size,
                expected,
                synapses.len()
            )));
        }
        if let Some((pos, (want, got))) = kind
            .endpoints(source_size, target_size)
            .zip(&synapses)
            .enumerate()
            .find(|(_, (want, got))| *want != got.endpoints())
        {
            return Err(NetworkError::format(format!(
                "synapse #{} connects {:?}, expected {:?}",
                pos,
                got.endpoints(),
                want
            )));
        }

        Ok(Self {
            kind,
            source,
            target,
            source_size,
            target_size,
            activation,
            synapses,
        })
    }

    /// Returns the connectivity pattern.
    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Returns the source layer.
    pub fn source(&self) -> LayerId {
        self.source
    }

    /// Returns the target layer.
    pub fn target(&self) -> LayerId {
        self.target
    }

    /// Size of the source layer this link was built against.
    pub fn source_size(&self) -> usize {
        self.source_size
    }

    /// Size of the target layer this link was built against.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Returns the activation function.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Returns the activation identifier.
    pub fn activate(&self) -> &'static str {
        self.activation.name()
    }

    /// Returns the synapses in construction order.
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// Mutable access to weights and biases. Endpoints stay fixed.
    pub fn synapses_mut(&mut self) -> &mut [Synapse] {
        &mut self.synapses
    }

    /// Draws every weight and bias independently from a standard normal distribution.
    pub fn normal_init_synapses<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for syn in &mut self.synapses {
            syn.weight = StandardNormal.sample(rng);
            syn.bias = StandardNormal.sample(rng);
        }
    }

    /// Sets every weight and bias to `value`.
    ///
    /// Biases are per synapse, so each target neuron of a dense link ends up
    /// with an effective bias of `source_size * value`.
    pub fn value_init_synapses(&mut self, value: f64) {
        for syn in &mut self.synapses {
            syn.weight = value;
            syn.bias = value;
        }
    }

    /// Adds this link's contribution to `target`.
    ///
    /// Each target neuron `j` receives `f(sum_i source[i] * w(i, j) + b(i, j))`:
    /// the bias of `j` is the sum of the biases of every synapse entering it.
    pub(crate) fn propagate(&self, source: &[f64], target: &mut [f64]) {
        let mut pre_activation = vec![0.0; self.target_size];
        for syn in &self.synapses {
            pre_activation[syn.to_idx()] += source[syn.from_idx()] * syn.weight + syn.bias;
        }
        for (out, z) in target.iter_mut().zip(pre_activation) {
            *out += self.activation.apply(z);
        }
    }
}
