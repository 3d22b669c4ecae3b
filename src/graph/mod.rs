//! Network topology: layers registered by name and joined by links.
//!
//! # Example
//!
//! ```
//! use nllnet::graph::{DenseLinkConfig, Network};
//! use nllnet::layers::{Activation, Layer};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut net = Network::new(Layer::new([2, 2]).unwrap(), Layer::new([1]).unwrap());
//! let hidden = net.add_layer("hidden", Layer::new([3, 3]).unwrap()).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut to_hidden = DenseLinkConfig::new(net.input_id(), hidden)
//!     .with_activation(Activation::Sigmoid)
//!     .init(&net)
//!     .unwrap();
//! to_hidden.normal_init_synapses(&mut rng);
//! assert_eq!(to_hidden.synapses().len(), 4 * 9);
//!
//! net.add_link(to_hidden).unwrap();
//! assert_eq!(net.link_count(), 1);
//! ```

mod core;
mod link;
mod registry;
mod schedule;
mod synapse;

pub use self::core::{
    INPUT_LAYER, LayerActivations, LayerId, LayerSummary, LinkSummary, Network, NetworkSummary,
    OUTPUT_LAYER,
};
pub use link::{DenseLinkConfig, Link, LinkKind};
pub use registry::Registry;
pub use synapse::Synapse;
