//! Network - layers, their names and the links between them.
//!
//! Layers live in an arena owned by the network. Links and the registry
//! refer to layers by [`LayerId`], the layer's index in that arena.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::link::Link;
use super::registry::Registry;
use super::schedule;
use crate::errors::{NetworkError, Result};
use crate::layers::{Activation, Layer};
use crate::model_file;
use crate::sample::{Sample, SampleSet};

/// Index of a layer in its network's arena.
pub type LayerId = usize;

/// Reserved name of the input layer.
pub const INPUT_LAYER: &str = "inputLayer";

/// Reserved name of the output layer.
pub const OUTPUT_LAYER: &str = "outputLayer";

/// A feed-forward network of layers connected by links.
///
/// # Example
///
/// ```
/// use nllnet::prelude::*;
///
/// let mut net = Network::new(Layer::new([2]).unwrap(), Layer::new([1]).unwrap());
/// let hidden = net.add_layer("hidden", Layer::new([2]).unwrap()).unwrap();
///
/// let mut to_hidden = DenseLinkConfig::new(net.input_id(), hidden).init(&net).unwrap();
/// to_hidden.value_init_synapses(1.0);
/// let mut to_output = DenseLinkConfig::new(hidden, net.output_id()).init(&net).unwrap();
/// to_output.value_init_synapses(1.0);
/// net.add_link(to_hidden).unwrap();
/// net.add_link(to_output).unwrap();
///
/// let out = net.predict(&Sample::new(vec![1.0, 1.0])).unwrap();
/// // hidden = [1 + 1 + 1 + 1; 2] = [4, 4], output = 4 + 1 + 4 + 1
/// assert_eq!(out.labels, vec![10.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    registry: Registry,
    links: Vec<Link>,
    input: LayerId,
    output: LayerId,
}

impl Network {
    /// Creates a network whose input and output layers are bound under
    /// [`INPUT_LAYER`] and [`OUTPUT_LAYER`].
    pub fn new(input: Layer, output: Layer) -> Self {
        Self {
            layers: vec![input, output],
            registry: Registry::with_reserved(0, 1),
            links: Vec::new(),
            input: 0,
            output: 1,
        }
    }

    /// Registers a hidden layer under `name`.
    ///
    /// Fails without changing the network if the name is invalid or already
    /// in use.
    pub fn add_layer(&mut self, name: impl Into<String>, layer: Layer) -> Result<LayerId> {
        let name = name.into();
        if let Err(err) = validate_name(&name) {
            log::warn!("Rejected layer: {}", err);
            return Err(err);
        }

        let id = self.layers.len();
        if let Err(err) = self.registry.insert(name.as_str(), id) {
            log::warn!("Rejected layer: {}", err);
            return Err(err);
        }
        log::debug!("Added layer '{}' #{} with shape {:?}", name, id, layer.shape());
        self.layers.push(layer);
        Ok(id)
    }

    /// Appends a link to the network.
    ///
    /// Both endpoints must be registered layers whose sizes match the sizes
    /// the link was built against. Returns the link's position.
    pub fn add_link(&mut self, link: Link) -> Result<usize> {
        let endpoints = [
            ("source", link.source(), link.source_size()),
            ("target", link.target(), link.target_size()),
        ];
        for (role, layer, size) in endpoints {
            if let Err(err) = self.check_endpoint(role, layer, size) {
                log::warn!("Rejected link: {}", err);
                return Err(err);
            }
        }

        log::debug!(
            "Added {} link #{} from #{} to #{} ({} synapses, {})",
            link.kind().type_name(),
            self.links.len(),
            link.source(),
            link.target(),
            link.synapses().len(),
            link.activate()
        );
        self.links.push(link);
        Ok(self.links.len() - 1)
    }

    fn check_endpoint(&self, role: &'static str, layer: LayerId, size: usize) -> Result<()> {
        let (Some(name), Some(registered)) = (self.registry.find_key(layer), self.layers.get(layer))
        else {
            return Err(NetworkError::UnregisteredLayer { role, layer });
        };
        if registered.size() != size {
            return Err(NetworkError::LinkSizeMismatch {
                role,
                layer: name.to_string(),
                expected: registered.size(),
                actual: size,
            });
        }
        Ok(())
    }

    /// Returns the id of the input layer.
    pub fn input_id(&self) -> LayerId {
        self.input
    }

    /// Returns the id of the output layer.
    pub fn output_id(&self) -> LayerId {
        self.output
    }

    /// Returns the layer with the given id.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Returns the layer registered under `name`.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.registry.find_value(name).and_then(|id| self.layer(id))
    }

    /// Returns the name a layer is registered under.
    pub fn layer_name(&self, id: LayerId) -> Option<&str> {
        self.registry.find_key(id)
    }

    /// Iterates `(name, id, layer)` in registration order.
    pub fn layers(&self) -> impl Iterator<Item = (&str, LayerId, &Layer)> {
        self.registry
            .iter()
            .filter_map(|(name, id)| self.layers.get(id).map(|layer| (name, id, layer)))
    }

    /// Number of registered layers.
    pub fn layer_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the links in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Mutable access to a link, e.g. to re-initialize its synapses.
    pub fn link_mut(&mut self, index: usize) -> Option<&mut Link> {
        self.links.get_mut(index)
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Returns the name registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the order in which [`forward`](Self::forward) applies links.
    ///
    /// Fails with a cycle error if no order lets every link see all of its
    /// source layer's inputs first.
    pub fn evaluation_order(&self) -> Result<Vec<usize>> {
        schedule::link_order(self.layers.len(), &self.links).map_err(|stuck| {
            NetworkError::Cycle {
                layers: stuck
                    .into_iter()
                    .map(|id| self.display_name(id))
                    .collect(),
            }
        })
    }

    fn display_name(&self, id: LayerId) -> String {
        self.layer_name(id)
            .map(String::from)
            .unwrap_or_else(|| format!("#{}", id))
    }

    /// Propagates `features` through every link and returns all layer
    /// activations.
    ///
    /// Layers start at zero; a layer reached by several links receives the
    /// sum of their contributions.
    pub fn forward(&self, features: &[f64]) -> Result<LayerActivations> {
        let input_size = self.layers[self.input].size();
        if features.len() != input_size {
            return Err(NetworkError::ArityMismatch {
                field: "features",
                expected: input_size,
                actual: features.len(),
            });
        }

        let order = self.evaluation_order()?;
        log::debug!("Evaluating links in order {:?}", order);

        let mut values: Vec<Vec<f64>> = self.layers.iter().map(|l| vec![0.0; l.size()]).collect();
        values[self.input].copy_from_slice(features);

        for idx in order {
            let link = &self.links[idx];
            let mut target = std::mem::take(&mut values[link.target()]);
            link.propagate(&values[link.source()], &mut target);
            values[link.target()] = target;
        }

        Ok(LayerActivations {
            values,
            names: self
                .registry
                .iter()
                .map(|(name, id)| (name.to_string(), id))
                .collect(),
        })
    }

    /// Runs the network on one sample.
    ///
    /// The returned sample carries the input features and the output layer's
    /// activations as labels. Input labels, if present, must match the output
    /// size and are otherwise ignored.
    pub fn predict(&self, sample: &Sample) -> Result<Sample> {
        let output_size = self.layers[self.output].size();
        if !sample.labels.is_empty() && sample.labels.len() != output_size {
            return Err(NetworkError::ArityMismatch {
                field: "labels",
                expected: output_size,
                actual: sample.labels.len(),
            });
        }

        let activations = self.forward(&sample.features)?;
        Ok(Sample {
            features: sample.features.clone(),
            labels: activations.values[self.output].clone(),
        })
    }

    /// Runs [`predict`](Self::predict) over every sample of a set.
    pub fn predict_batch(&self, samples: &SampleSet) -> Result<Vec<Sample>> {
        let input_size = self.layers[self.input].size();
        if samples.feature_size() != input_size {
            return Err(NetworkError::ArityMismatch {
                field: "features",
                expected: input_size,
                actual: samples.feature_size(),
            });
        }
        samples.iter().map(|sample| self.predict(sample)).collect()
    }

    /// Writes the network to a `.nll` model file, appending the suffix if
    /// missing. Returns the path actually written.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        model_file::save_model(self, path)
    }

    /// Reads a network from a `.nll` model file.
    pub fn load_model(path: impl AsRef<Path>) -> Result<Network> {
        model_file::load_model(path)
    }

    /// Describes the network's layers and links.
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            layers: self
                .layers()
                .map(|(name, _, layer)| LayerSummary {
                    name: name.to_string(),
                    shape: layer.shape().to_vec(),
                    size: layer.size(),
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|link| LinkSummary {
                    source: self.display_name(link.source()),
                    target: self.display_name(link.target()),
                    kind: link.kind().type_name(),
                    activation: link.activation(),
                    synapses: link.synapses().len(),
                })
                .collect(),
        }
    }

    /// Renders [`summary`](Self::summary) as pretty-printed JSON.
    pub fn summary_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

/// Names must survive the `[Link:src=..,tgt=..]` text records.
fn validate_name(name: &str) -> Result<()> {
    let forbidden = |c: char| matches!(c, ',' | '=' | '[' | ']' | '\n' | '\r');
    if name.is_empty() || name.contains(forbidden) {
        return Err(NetworkError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Activations of every layer after a forward pass.
#[derive(Debug, Clone)]
pub struct LayerActivations {
    values: Vec<Vec<f64>>,
    names: HashMap<String, LayerId>,
}

impl LayerActivations {
    /// Activations of the layer with the given id.
    pub fn get(&self, id: LayerId) -> Option<&[f64]> {
        self.values.get(id).map(Vec::as_slice)
    }

    /// Activations of the layer registered under `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&[f64]> {
        self.names.get(name).and_then(|&id| self.get(id))
    }
}

/// Serializable overview of a network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub layers: Vec<LayerSummary>,
    pub links: Vec<LinkSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub shape: Vec<usize>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub activation: Activation,
    pub synapses: usize,
}
