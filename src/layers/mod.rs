//! Neuron layers and the activation functions links apply to them.

pub mod activation;
pub mod layer;

pub use activation::Activation;
pub use layer::Layer;
