//! Registry - bijective name <-> layer mapping.
//!
//! Every registered name maps to exactly one layer and every layer carries at
//! most one name. The serializer relies on this to recover a layer's canonical
//! name from a link endpoint.

use std::collections::HashMap;

use super::core::{INPUT_LAYER, LayerId, OUTPUT_LAYER};
use crate::errors::{NetworkError, Result};

/// Bidirectional map between layer names and layer ids.
///
/// Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(String, LayerId)>,
    by_name: HashMap<String, LayerId>,
    by_layer: HashMap<LayerId, String>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `layer`.
    ///
    /// Fails without mutating the registry if `name` is bound to another
    /// layer or `layer` is bound to another name. Re-inserting an existing
    /// pair is a no-op.
    pub fn insert(&mut self, name: impl Into<String>, layer: LayerId) -> Result<()> {
        let name = name.into();
        match (self.by_name.get(&name), self.by_layer.get(&layer)) {
            (Some(&bound), Some(existing)) if bound == layer && *existing == name => Ok(()),
            (Some(_), _) => Err(NetworkError::DuplicateName { name }),
            (None, Some(existing)) => Err(NetworkError::DuplicateLayer {
                name,
                existing: existing.clone(),
            }),
            (None, None) => {
                self.bind(name, layer);
                Ok(())
            }
        }
    }

    /// Registry holding only the two reserved names, bound to distinct ids.
    pub(crate) fn with_reserved(input: LayerId, output: LayerId) -> Self {
        debug_assert_ne!(input, output);
        let mut registry = Self::new();
        registry.bind(INPUT_LAYER.to_string(), input);
        registry.bind(OUTPUT_LAYER.to_string(), output);
        registry
    }

    /// Caller guarantees neither side is already bound.
    fn bind(&mut self, name: String, layer: LayerId) {
        self.by_name.insert(name.clone(), layer);
        self.by_layer.insert(layer, name.clone());
        self.entries.push((name, layer));
    }

    /// Returns the layer bound to `name`.
    pub fn find_value(&self, name: &str) -> Option<LayerId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name bound to `layer`.
    pub fn find_key(&self, layer: LayerId) -> Option<&str> {
        self.by_layer.get(&layer).map(String::as_str)
    }

    /// Removes the binding for `name`, returning the layer it pointed to.
    pub fn erase_by_key(&mut self, name: &str) -> Option<LayerId> {
        let layer = self.by_name.remove(name)?;
        self.by_layer.remove(&layer);
        self.entries.retain(|(_, id)| *id != layer);
        Some(layer)
    }

    /// Removes the binding for `layer`, returning the name it carried.
    pub fn erase_by_value(&mut self, layer: LayerId) -> Option<String> {
        let name = self.by_layer.remove(&layer)?;
        self.by_name.remove(&name);
        self.entries.retain(|(_, id)| *id != layer);
        Some(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_value(&self, layer: LayerId) -> bool {
        self.by_layer.contains_key(&layer)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, layer)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, LayerId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }
}
