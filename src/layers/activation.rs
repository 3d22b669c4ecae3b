//! Activation functions applied by links to their target neurons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NetworkError;

/// Supported activation functions.
///
/// The set is closed: a link names one of these by identifier, and any other
/// identifier is rejected when the link is built or read back from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Identity: f(x) = x
    #[default]
    Linear,
    /// Sigmoid: f(x) = 1 / (1 + exp(-x))
    Sigmoid,
}

impl Activation {
    /// All activations, in identifier order.
    pub const ALL: [Activation; 2] = [Activation::Sigmoid, Activation::Linear];

    /// Applies the activation function to a single pre-activation value.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Returns the identifier written to model files.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::Sigmoid => "sigmoid",
        }
    }

    /// Looks up an activation by its exact identifier.
    pub fn from_name(name: &str) -> Result<Self, NetworkError> {
        match name {
            "linear" => Ok(Activation::Linear),
            "sigmoid" => Ok(Activation::Sigmoid),
            _ => Err(NetworkError::UnknownActivation {
                name: name.to_string(),
            }),
        }
    }
}

impl FromStr for Activation {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::from_name(s)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_activation_names() {
        assert_eq!(Activation::Linear.name(), "linear");
        assert_eq!(Activation::Sigmoid.name(), "sigmoid");
        assert_eq!(Activation::default(), Activation::Linear);
    }

    #[test]
    fn test_activation_from_name() {
        assert_eq!(Activation::from_name("sigmoid").unwrap(), Activation::Sigmoid);
        assert_eq!("linear".parse::<Activation>().unwrap(), Activation::Linear);

        let err = Activation::from_name("relu").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("relu"));
    }

    #[test]
    fn test_activation_names_are_case_sensitive() {
        assert!(Activation::from_name("Sigmoid").is_err());
        assert!(Activation::from_name("").is_err());
    }

    #[test]
    fn test_activation_name_roundtrip() {
        for act in Activation::ALL {
            assert_eq!(Activation::from_name(act.name()).unwrap(), act);
        }
    }

    #[test]
    fn test_sigmoid_activation() {
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-12);
        assert!((Activation::Sigmoid.apply(2.0) - 0.880_797_077_977_882_4).abs() < 1e-12);
        assert!(Activation::Sigmoid.apply(-50.0) < 1e-20);
        assert!((Activation::Sigmoid.apply(50.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_activation() {
        for x in [-3.5, 0.0, 1.0, 42.25] {
            assert_eq!(Activation::Linear.apply(x), x);
        }
    }

    #[test]
    fn test_activation_serde() {
        let json = serde_json::to_string(&Activation::Sigmoid).unwrap();
        assert_eq!(json, "\"sigmoid\"");
        let act: Activation = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(act, Activation::Linear);
        assert!(serde_json::from_str::<Activation>("\"tanh\"").is_err());
    }
}
