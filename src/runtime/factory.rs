//! Type-keyed factory that wraps computed values back into atoms.
//!
//! Operator results, composite literals, loop variables and native return
//! values all pass through [`NodeFactory::new_atom`]. The factory is owned by
//! an `Interpreter`, so independent interpreters can carry different tables.

use rustc_hash::FxHashMap;

use crate::interpreter::Node;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::{Value, ValueKind};

pub type AtomBuilder = fn(Value) -> Node;

#[derive(Debug, Clone)]
pub struct NodeFactory {
    builders: FxHashMap<ValueKind, AtomBuilder>,
}

impl NodeFactory {
    /// A factory with no builders; every `new_atom` call fails until kinds are registered.
    pub fn empty() -> Self {
        Self {
            builders: FxHashMap::default(),
        }
    }

    /// Registers `builder` for `kind`, returning the builder it replaced.
    pub fn register(&mut self, kind: ValueKind, builder: AtomBuilder) -> Option<AtomBuilder> {
        self.builders.insert(kind, builder)
    }

    pub fn supports(&self, kind: ValueKind) -> bool {
        self.builders.contains_key(&kind)
    }

    pub fn new_atom(&self, value: Value) -> Result<Node, RuntimeError> {
        match self.builders.get(&value.kind()) {
            Some(builder) => Ok(builder(value)),
            None => Err(RuntimeError::UnwrappableValue {
                type_name: value.type_name().to_string(),
            }),
        }
    }
}

impl Default for NodeFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        for kind in ValueKind::DATA {
            factory.register(kind, atom);
        }
        factory
    }
}

pub fn atom(value: Value) -> Node {
    Node::Atom(value)
}
