//! Layered variable scopes with JavaScript implicit-global writes

use crate::core::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One layer of bindings, shared between every scope chain that contains it
pub type Layer = Rc<RefCell<HashMap<String, Value>>>;

/// Create an empty layer
pub fn new_layer() -> Layer {
    Rc::new(RefCell::new(HashMap::new()))
}

/// Create a layer from existing bindings
pub fn layer_from(bindings: HashMap<String, Value>) -> Layer {
    Rc::new(RefCell::new(bindings))
}

/// Ordered chain of binding layers, innermost first
///
/// Reads search innermost to outermost. Writes to a name that is already
/// bound mutate the first layer defining it; writes to a new name land in
/// the outermost layer, the way an undeclared assignment creates a global.
#[derive(Debug, Clone)]
pub struct Scope {
    layers: Vec<Layer>,
}

impl Scope {
    /// Scope with a single empty layer
    pub fn new() -> Self {
        Self {
            layers: vec![new_layer()],
        }
    }

    /// Scope over existing layers; an empty list gets one fresh layer
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        if layers.is_empty() {
            return Self::new();
        }
        Self { layers }
    }

    /// New scope with `bindings` as a fresh innermost layer
    pub fn child(&self, bindings: HashMap<String, Value>) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(layer_from(bindings));
        layers.extend(self.layers.iter().cloned());
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.layers
            .iter()
            .find_map(|layer| layer.borrow().get(name).cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.borrow().contains_key(name))
    }

    /// Assign following implicit-global semantics
    pub fn set(&self, name: &str, value: Value) {
        for layer in &self.layers {
            let mut bindings = layer.borrow_mut();
            if let Some(slot) = bindings.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(outermost) = self.layers.last() {
            outermost.borrow_mut().insert(name.to_string(), value);
        }
    }

    /// Define in the innermost layer, shadowing outer bindings
    pub fn set_local(&self, name: &str, value: Value) {
        self.layers[0].borrow_mut().insert(name.to_string(), value);
    }

    /// Value bound in the innermost layer only
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.layers[0].borrow().get(name).cloned()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
