//! Layered variable scope.
//!
//! Layer 0 holds builtins, layer 1 the program's globals, and every
//! function call, comprehension or class body pushes one more. Layers are
//! shared by reference: a function captures the stack that was live when
//! it was defined, so it sees later writes to those layers (a global bound
//! after the `def`) while its own assignments go to the layer its call
//! pushes.

use std::cell::RefCell;
use std::rc::Rc;

use dys_ir::Name;

use crate::value::{FxIndexMap, Value};

/// One mapping of names to values.
pub type Layer = Rc<RefCell<FxIndexMap<Name, Value>>>;

/// Create an empty layer.
pub fn new_layer() -> Layer {
    Rc::new(RefCell::new(FxIndexMap::default()))
}

/// Innermost-first chain of layers.
#[derive(Clone, Debug)]
pub struct Scope {
    layers: Vec<Layer>,
}

/// Layers that `pop` never removes.
const FIXED_LAYERS: usize = 2;

impl Scope {
    pub fn new(builtins: Layer, globals: Layer) -> Self {
        Scope {
            layers: vec![builtins, globals],
        }
    }

    /// Resolve a name, innermost layer first.
    pub fn get(&self, name: Name) -> Option<Value> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.borrow().get(&name).cloned())
    }

    /// Bind in the innermost layer.
    pub fn set(&self, name: Name, value: Value) {
        self.innermost().borrow_mut().insert(name, value);
    }

    /// Unbind from the innermost layer; returns whether it was bound.
    pub fn delete(&self, name: Name) -> bool {
        self.innermost().borrow_mut().shift_remove(&name).is_some()
    }

    /// Push a fresh empty layer.
    pub fn push(&mut self) {
        self.layers.push(new_layer());
    }

    /// Push an existing layer.
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Pop the innermost local layer. Builtins and globals stay.
    pub fn pop(&mut self) -> Option<Layer> {
        if self.layers.len() > FIXED_LAYERS {
            self.layers.pop()
        } else {
            None
        }
    }

    /// Copy of the layer stack sharing every layer.
    pub fn snapshot(&self) -> Scope {
        self.clone()
    }

    /// All visible bindings, inner layers shadowing outer ones.
    pub fn flatten(&self) -> FxIndexMap<Name, Value> {
        let mut merged = FxIndexMap::default();
        for layer in &self.layers {
            for (name, value) in layer.borrow().iter() {
                merged.insert(*name, value.clone());
            }
        }
        merged
    }

    /// Whether the innermost layer binds `name`.
    pub fn contains_local(&self, name: Name) -> bool {
        self.innermost().borrow().contains_key(&name)
    }

    /// Number of layers, builtins included.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn builtins(&self) -> &Layer {
        &self.layers[0]
    }

    pub fn globals(&self) -> &Layer {
        &self.layers[1]
    }

    pub fn innermost(&self) -> &Layer {
        let last = self.layers.len() - 1;
        &self.layers[last]
    }

    /// Approximate `repr` length of every layer above builtins, stopping
    /// once past `cap`. `name_len` gives each binding's name length.
    pub fn estimated_size(&self, cap: usize, name_len: impl Fn(Name) -> usize) -> usize {
        let mut total = 2;
        for layer in &self.layers[1..] {
            total += 2;
            for (name, value) in layer.borrow().iter() {
                if total > cap {
                    return total;
                }
                total += name_len(*name) + 4;
                total += value.estimate_len(cap.saturating_sub(total));
            }
        }
        total
    }

    /// Drop every binding above builtins. Breaks the reference cycles
    /// between globals and the functions that captured them.
    pub fn clear_locals_and_globals(&self) {
        for layer in &self.layers[1..] {
            let drained: Vec<Value> = layer.borrow_mut().drain(..).map(|(_, v)| v).collect();
            drop(drained);
        }
    }
}

#[cfg(test)]
mod tests;
