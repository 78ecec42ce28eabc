use std::rc::Rc;

use crate::ast::{ClassDef, FunctionDef, MethodDef, Property};
use crate::runtime::value::Value;
use crate::symtable::{ScopeId, ScopeLease};

/// A node bound in a symbol table or produced by evaluation.
///
/// Atoms carry data; declarations and instances are bound as themselves and
/// expose a marker value for dispatch and rendering.
#[derive(Debug, Clone)]
pub enum Node {
    Atom(Value),
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Method(Rc<MethodDef>),
    Property(Rc<Property>),
    Instance(Rc<Instance>),
}

impl Node {
    pub fn value(&self) -> Value {
        match self {
            Self::Atom(value) => value.clone(),
            Self::Function(def) => Value::Function(def.name.identifier().into()),
            Self::Class(def) => Value::Class(def.name().identifier().into()),
            Self::Method(def) => Value::Method(def.name.identifier().into()),
            Self::Property(def) => Value::Property(def.name.identifier().into()),
            Self::Instance(instance) => Value::Instance {
                class: instance.class.name().identifier().into(),
                id: instance.id,
            },
        }
    }

    pub fn as_instance(&self) -> Option<&Rc<Instance>> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

/// A constructed object: its class plus the class scope that holds its members.
#[derive(Debug)]
pub struct Instance {
    class: Rc<ClassDef>,
    scope: ScopeLease,
    id: u64,
}

impl Instance {
    pub(crate) fn new(class: Rc<ClassDef>, scope: ScopeLease, id: u64) -> Self {
        Self { class, scope, id }
    }

    pub fn class(&self) -> &Rc<ClassDef> {
        &self.class
    }

    pub fn scope(&self) -> ScopeId {
        self.scope.scope()
    }
}

/// Outcome of evaluating a statement or block.
#[derive(Debug, Clone)]
pub(crate) enum Flow {
    Nothing,
    Value(Node),
    Return(Node),
    Break,
    Continue,
}

impl Flow {
    pub(crate) fn is_signal(&self) -> bool {
        matches!(self, Self::Return(_) | Self::Break | Self::Continue)
    }
}
