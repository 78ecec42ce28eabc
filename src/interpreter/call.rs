//! Call dispatch for functions, methods and classes.
//!
//! Arguments are evaluated in the caller's scope before any frame exists.
//! A function frame is parented at the scope the call was made from; a method
//! reached through `object.method(...)` gets a frame parented at the
//! instance's class scope instead, so member lookups resolve there.

use std::rc::Rc;

use tracing::debug;

use crate::ast::{ClassDef, Expression, FunctionDef, MethodDef, Parameter};
use crate::runtime::error::RuntimeError;
use crate::runtime::execution;
use crate::runtime::value::Value;
use crate::symtable::{ScopeId, ScopeKind, SymbolFlags};

use super::node::Instance;
use super::runtime::{Runtime, loop_control};
use super::{Flow, Node};

/// Native stack kept free before recursing into a call.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment when the red zone is reached.
const STACK_PER_RECURSION: usize = 1024 * 1024;

fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

impl Runtime<'_> {
    pub(super) fn eval_call(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
        scope: ScopeId,
    ) -> Result<Node, RuntimeError> {
        // The receiver stays bound here so a temporary instance outlives its call.
        let (target, receiver) = match callee {
            Expression::DotName { expression, name } => {
                let object = self.eval_expression(expression, scope)?;
                let target = self.resolve_member(&object, name.identifier(), scope)?;
                (target, Some(object))
            }
            other => (self.eval_expression(other, scope)?, None),
        };

        let mut args = Vec::with_capacity(arguments.len() + 1);
        let parent = match &receiver {
            Some(Node::Instance(instance)) => instance.scope(),
            Some(atom @ Node::Atom(_)) => {
                args.push(atom.clone());
                scope
            }
            _ => scope,
        };
        for argument in arguments {
            args.push(self.eval_expression(argument, scope)?);
        }

        let flow = self.call_node(&target, args, parent)?;
        drop(receiver);
        match flow {
            Flow::Value(node) | Flow::Return(node) => Ok(node),
            Flow::Nothing => Ok(Node::Atom(Value::Null)),
            Flow::Break => Err(loop_control("break")),
            Flow::Continue => Err(loop_control("continue")),
        }
    }

    pub(super) fn call_node(
        &mut self,
        target: &Node,
        args: Vec<Node>,
        parent: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        match target {
            Node::Function(def) => self.call_function(def, args, parent),
            Node::Method(def) => self.call_method(def, args, parent),
            Node::Class(def) => self.instantiate(def, args, parent),
            other => Err(RuntimeError::ObjectNotCallable {
                type_name: other.value().type_name().to_string(),
            }),
        }
    }

    fn call_function(
        &mut self,
        def: &Rc<FunctionDef>,
        args: Vec<Node>,
        parent: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        let name = def.name.identifier();
        RuntimeError::expect_arity(name, def.parameters.len(), args.len())?;
        debug!(function = name, builtin = def.is_builtin(), depth = self.depth, "call");

        self.enter_frame(|runtime| {
            let frame = runtime.scopes.open(ScopeKind::Function, name, parent);
            runtime.bind_parameters(frame, &def.parameters, args);
            let result = match def.native {
                Some(builtin) => {
                    let values = runtime.parameter_values(frame, &def.parameters);
                    execution::call_builtin(builtin, &values, &mut *runtime.output)
                        .and_then(|value| runtime.factory.new_atom(value))
                        .map(Flow::Return)
                }
                None => runtime.exec_block(&def.block, frame),
            };
            runtime.scopes.close(frame);
            result
        })
    }

    fn call_method(
        &mut self,
        def: &Rc<MethodDef>,
        args: Vec<Node>,
        parent: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        let name = def.name.identifier();
        RuntimeError::expect_arity(name, def.parameters.len(), args.len())?;
        debug!(method = name, builtin = def.is_builtin(), depth = self.depth, "call");

        self.enter_frame(|runtime| {
            let frame = runtime.scopes.open(ScopeKind::Function, name, parent);
            runtime.bind_parameters(frame, &def.parameters, args);
            let result = match def.native {
                Some(method) => {
                    let values = runtime.parameter_values(frame, &def.parameters);
                    execution::call_native_method(method, &values)
                        .and_then(|value| runtime.factory.new_atom(value))
                        .map(Flow::Return)
                }
                None => runtime.exec_block(&def.block, frame),
            };
            runtime.scopes.close(frame);
            result
        })
    }

    /// Builds the class scope, seeds it with the declared members and runs
    /// the constructor in it; the constructor's own result is discarded.
    fn instantiate(
        &mut self,
        class: &Rc<ClassDef>,
        args: Vec<Node>,
        parent: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        if let Some(native) = class.native() {
            let values = args.iter().map(Node::value).collect::<Vec<_>>();
            let value = execution::construct_native(native, &values)?;
            return Ok(Flow::Value(self.factory.new_atom(value)?));
        }

        let name = class.name().identifier();
        let class_scope = self.scopes.open(ScopeKind::Class, name, parent);
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        let instance = Rc::new(Instance::new(
            Rc::clone(class),
            self.scopes.lease(class_scope),
            id,
        ));
        debug!(class = name, instance = id, scope = %class_scope, "instantiate");

        for (identifier, property) in class.properties() {
            let node = Node::Property(Rc::clone(property));
            self.bind(class_scope, identifier, node, SymbolFlags::PROPERTY);
        }
        for (identifier, method) in class.methods() {
            let node = Node::Method(Rc::clone(method));
            self.bind(class_scope, identifier, node, SymbolFlags::METHOD);
        }

        match class.constructor() {
            Some(constructor) => match self.call_method(constructor, args, class_scope)? {
                Flow::Break => return Err(loop_control("break")),
                Flow::Continue => return Err(loop_control("continue")),
                _ => {}
            },
            None => RuntimeError::expect_arity(name, 0, args.len())?,
        }
        Ok(Flow::Value(Node::Instance(instance)))
    }

    fn enter_frame<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::RecursionLimit {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| body(self));
        self.depth -= 1;
        result
    }

    fn bind_parameters(&mut self, frame: ScopeId, parameters: &[Parameter], args: Vec<Node>) {
        for (parameter, node) in parameters.iter().zip(args) {
            self.bind(frame, parameter.name.identifier(), node, SymbolFlags::PARAMETER);
        }
    }

    /// Reads bound parameters back by name for a native entry point.
    fn parameter_values(&self, frame: ScopeId, parameters: &[Parameter]) -> Vec<Value> {
        parameters
            .iter()
            .map(|parameter| {
                self.scopes
                    .lookup_local(frame, parameter.name.identifier())
                    .map(|symbol| symbol.node().value())
                    .unwrap_or(Value::Null)
            })
            .collect()
    }
}
