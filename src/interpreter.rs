//! Tree-walking evaluator for Anchor programs.
//!
//! Execution pipeline:
//! `Interpreter::run` -> `Runtime::exec_program` -> `exec_block` ->
//! `exec_statement` -> `eval_expression` -> `eval_call` -> `exec_block`
//! (callee body, in a fresh frame).
use std::rc::Rc;

use tracing::debug;

use crate::ast::{ClassDef, FunctionDef, Program};
use crate::builtins::{BuiltinFunction, NativeClass};
use crate::runtime::error::RuntimeError;
use crate::runtime::factory::NodeFactory;
use crate::runtime::output::OutputSink;
use crate::symtable::{ScopeArena, SymbolFlags};

mod call;
mod node;
mod runtime;
#[cfg(test)]
mod tests;

pub(crate) use node::Flow;
pub use node::{Instance, Node};
use runtime::Runtime;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested calls allowed before the run fails with a recursion-limit error.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Result of a completed run with its printed lines captured.
#[derive(Debug)]
pub struct Evaluation {
    pub result: Option<Node>,
    pub output: Vec<String>,
}

/// Native definitions built once and bound into the Main scope of every run.
struct BuiltinRegistry {
    functions: Vec<Rc<FunctionDef>>,
    classes: Vec<Rc<ClassDef>>,
}

impl BuiltinRegistry {
    fn new() -> Self {
        Self {
            functions: BuiltinFunction::ALL
                .into_iter()
                .map(|builtin| Rc::new(FunctionDef::builtin(builtin)))
                .collect(),
            classes: NativeClass::ALL
                .into_iter()
                .map(|class| Rc::new(ClassDef::builtin(class)))
                .collect(),
        }
    }

    fn install(&self, scopes: &mut ScopeArena) {
        let main = scopes.main();
        for function in &self.functions {
            let node = Node::Function(Rc::clone(function));
            scopes.insert(main, function.name.identifier(), [node], SymbolFlags::BUILTIN);
        }
        for class in &self.classes {
            let node = Node::Class(Rc::clone(class));
            scopes.insert(main, class.name().identifier(), [node], SymbolFlags::BUILTIN);
        }
        debug!(
            functions = self.functions.len(),
            classes = self.classes.len(),
            "registered builtins"
        );
    }
}

/// Evaluates programs against a fresh Main scope per run.
pub struct Interpreter {
    config: InterpreterConfig,
    factory: NodeFactory,
    builtins: BuiltinRegistry,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            config: InterpreterConfig::default(),
            factory: NodeFactory::default(),
            builtins: BuiltinRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the atom factory used to wrap computed values.
    pub fn with_factory(mut self, factory: NodeFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn run(&self, program: &Program) -> Result<Evaluation, RuntimeError> {
        let mut output = Vec::new();
        let result = self.run_with_output(program, &mut output)?;
        Ok(Evaluation { result, output })
    }

    /// Runs `program`, streaming printed lines to `output`.
    pub fn run_with_output(
        &self,
        program: &Program,
        output: &mut dyn OutputSink,
    ) -> Result<Option<Node>, RuntimeError> {
        let mut runtime = Runtime::new(&self.factory, output, self.config.max_call_depth);
        self.builtins.install(&mut runtime.scopes);
        runtime.exec_program(program)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
