//! # nllnet
//!
//! Feed-forward neural-network topology with synapse-level links, and the
//! `.nll` model file format used to persist it.
//!
//! A [`Network`] owns its layers and names them through a bijective
//! [`Registry`](graph::Registry). Links connect a source layer to a target
//! layer and populate their own synapses according to their connectivity
//! pattern ([`LinkKind`](graph::LinkKind)); a dense link connects every source
//! neuron to every target neuron.
//!
//! ## Example
//!
//! ```
//! use nllnet::prelude::*;
//!
//! let mut net = Network::new(Layer::new([2]).unwrap(), Layer::new([1]).unwrap());
//! let hidden = net.add_layer("hidden", Layer::new([2]).unwrap()).unwrap();
//!
//! for (src, tgt) in [(net.input_id(), hidden), (hidden, net.output_id())] {
//!     let mut link = DenseLinkConfig::new(src, tgt)
//!         .with_activation(Activation::Linear)
//!         .init(&net)
//!         .unwrap();
//!     link.value_init_synapses(1.0);
//!     for syn in link.synapses_mut() {
//!         syn.bias = 0.0;
//!     }
//!     net.add_link(link).unwrap();
//! }
//!
//! let prediction = net.predict(&Sample::new(vec![1.0, 1.0])).unwrap();
//! assert_eq!(prediction.labels, vec![4.0]);
//! ```

pub mod errors;
pub mod graph;
pub mod layers;
pub mod model_file;
pub mod sample;

// Re-exports for convenience
pub use errors::{ErrorKind, NetworkError, Result};
pub use graph::{DenseLinkConfig, Link, Network};
pub use layers::{Activation, Layer};
pub use sample::{Sample, SampleSet};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::{ErrorKind, NetworkError};
    pub use crate::graph::{
        DenseLinkConfig, INPUT_LAYER, LayerId, Link, LinkKind, Network, OUTPUT_LAYER, Registry,
    };
    pub use crate::layers::{Activation, Layer};
    pub use crate::sample::{Sample, SampleSet};
}
