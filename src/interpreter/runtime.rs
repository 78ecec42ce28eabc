use tracing::trace;

use crate::ast::{BinaryOperator, Block, Elif, Expression, Program, Statement, Target};
use crate::runtime::dict::Dict;
use crate::runtime::error::RuntimeError;
use crate::runtime::factory::NodeFactory;
use crate::runtime::operators;
use crate::runtime::output::OutputSink;
use crate::runtime::value::Value;
use crate::symtable::{ScopeArena, ScopeId, Symbol, SymbolFlags};

use super::{Flow, Node};

/// Per-run evaluation state: the scope arena plus the injected collaborators.
pub(super) struct Runtime<'a> {
    pub(super) scopes: ScopeArena,
    pub(super) factory: &'a NodeFactory,
    pub(super) output: &'a mut dyn OutputSink,
    pub(super) depth: usize,
    pub(super) max_depth: usize,
    pub(super) next_instance_id: u64,
}

impl<'a> Runtime<'a> {
    pub(super) fn new(
        factory: &'a NodeFactory,
        output: &'a mut dyn OutputSink,
        max_depth: usize,
    ) -> Self {
        Self {
            scopes: ScopeArena::new(),
            factory,
            output,
            depth: 0,
            max_depth,
            next_instance_id: 0,
        }
    }

    pub(super) fn exec_program(
        &mut self,
        program: &Program,
    ) -> Result<Option<Node>, RuntimeError> {
        let main = self.scopes.main();
        match self.exec_block(&program.block, main)? {
            Flow::Nothing => Ok(None),
            Flow::Value(node) | Flow::Return(node) => Ok(Some(node)),
            Flow::Break => Err(loop_control("break")),
            Flow::Continue => Err(loop_control("continue")),
        }
    }

    /// Runs statements in order, stopping at the first control-flow signal.
    pub(super) fn exec_block(
        &mut self,
        block: &Block,
        scope: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        for statement in &block.statements {
            let flow = self.exec_statement(statement, scope)?;
            if flow.is_signal() {
                return Ok(flow);
            }
            drop(flow);
            self.scopes.collect_released();
        }
        Ok(Flow::Nothing)
    }

    fn exec_statement(
        &mut self,
        statement: &Statement,
        scope: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        match statement {
            Statement::Expression(expression) => {
                Ok(Flow::Value(self.eval_expression(expression, scope)?))
            }
            Statement::Assignment { target, expression } => {
                let node = self.eval_expression(expression, scope)?;
                self.assign(target, node, scope)?;
                Ok(Flow::Nothing)
            }
            Statement::If {
                expression,
                block,
                elifs,
                else_block,
            } => self.exec_if(expression, block, elifs, else_block.as_ref(), scope),
            Statement::Loop { expression, block } => {
                while self.eval_expression(expression, scope)?.value().is_truthy() {
                    match self.exec_block(block, scope)? {
                        Flow::Return(node) => return Ok(Flow::Return(node)),
                        Flow::Break => break,
                        _ => {}
                    }
                }
                Ok(Flow::Nothing)
            }
            Statement::Iterate {
                iterable,
                variable,
                block,
            } => {
                let iterable = self.eval_expression(iterable, scope)?.value();
                let items = iterable.elements().ok_or_else(|| RuntimeError::NotIterable {
                    type_name: iterable.type_name().to_string(),
                })?;
                for item in items {
                    let node = self.factory.new_atom(item)?;
                    self.scopes
                        .insert(scope, variable.identifier(), [node], SymbolFlags::empty());
                    match self.exec_block(block, scope)? {
                        Flow::Return(node) => return Ok(Flow::Return(node)),
                        Flow::Break => break,
                        _ => {}
                    }
                }
                Ok(Flow::Nothing)
            }
            Statement::Break => Ok(Flow::Break),
            Statement::Continue => Ok(Flow::Continue),
            Statement::Return(expression) => {
                let node = match expression {
                    Some(expression) => self.eval_expression(expression, scope)?,
                    None => Node::Atom(Value::Null),
                };
                Ok(Flow::Return(node))
            }
            Statement::FunctionDef(def) => {
                let node = Node::Function(def.clone());
                self.bind(scope, def.name.identifier(), node, SymbolFlags::empty());
                Ok(Flow::Nothing)
            }
            Statement::ClassDef(def) => {
                let node = Node::Class(def.clone());
                self.bind(scope, def.name().identifier(), node, SymbolFlags::empty());
                Ok(Flow::Nothing)
            }
            Statement::MethodDef(def) => {
                let node = Node::Method(def.clone());
                self.bind(scope, def.name.identifier(), node, SymbolFlags::METHOD);
                Ok(Flow::Nothing)
            }
            Statement::Property(def) => {
                let node = Node::Property(def.clone());
                self.bind(scope, def.name.identifier(), node, SymbolFlags::PROPERTY);
                Ok(Flow::Nothing)
            }
            Statement::Annotation(annotation) => {
                trace!(annotation = annotation.literal(), "annotation statement");
                Ok(Flow::Nothing)
            }
        }
    }

    /// An elif carrying its own else takes that branch when its guard fails,
    /// without consulting later elifs.
    fn exec_if(
        &mut self,
        expression: &Expression,
        block: &Block,
        elifs: &[Elif],
        else_block: Option<&Block>,
        scope: ScopeId,
    ) -> Result<Flow, RuntimeError> {
        if self.eval_expression(expression, scope)?.value().is_truthy() {
            return self.exec_block(block, scope);
        }
        for elif in elifs {
            if self.eval_expression(&elif.expression, scope)?.value().is_truthy() {
                return self.exec_block(&elif.block, scope);
            }
            if let Some(else_block) = &elif.else_block {
                return self.exec_block(else_block, scope);
            }
        }
        match else_block {
            Some(else_block) => self.exec_block(else_block, scope),
            None => Ok(Flow::Nothing),
        }
    }

    pub(super) fn bind(
        &mut self,
        scope: ScopeId,
        identifier: &str,
        node: Node,
        flags: SymbolFlags,
    ) {
        self.scopes.insert(scope, identifier, [node], flags);
    }

    fn assign(&mut self, target: &Target, node: Node, scope: ScopeId) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                let identifier = name.identifier();
                let owner = self
                    .scopes
                    .lookup(scope, identifier)
                    .filter(|symbol| symbol.flags().contains(SymbolFlags::PROPERTY))
                    .map(Symbol::scope)
                    .unwrap_or(scope);
                self.bind(owner, identifier, node, SymbolFlags::empty());
            }
            Target::Member { object, name } => {
                let object = self.eval_expression(object, scope)?;
                let member = name.identifier();
                let Some(instance) = object.as_instance() else {
                    return Err(unknown_member(member, object.value().type_name()));
                };
                if !instance.class().properties().contains_key(member) {
                    return Err(unknown_member(member, instance.class().name().identifier()));
                }
                let owner = instance.scope();
                self.bind(owner, member, node, SymbolFlags::empty());
            }
        }
        Ok(())
    }

    pub(super) fn eval_expression(
        &mut self,
        expression: &Expression,
        scope: ScopeId,
    ) -> Result<Node, RuntimeError> {
        match expression {
            Expression::Boolean(value) => Ok(Node::Atom(Value::Boolean(*value))),
            Expression::Null => Ok(Node::Atom(Value::Null)),
            Expression::Integer(value) => Ok(Node::Atom(Value::Integer(*value))),
            Expression::Float(value) => Ok(Node::Atom(Value::Float(*value))),
            Expression::Complex(value) => Ok(Node::Atom(Value::Complex(*value))),
            Expression::String(value) => Ok(Node::Atom(Value::string(value))),
            Expression::Tuple(items) => {
                let items = self.eval_values(items, scope)?;
                self.factory.new_atom(Value::tuple(items))
            }
            Expression::List(items) => {
                let items = self.eval_values(items, scope)?;
                self.factory.new_atom(Value::list(items))
            }
            Expression::Dict(entries) => {
                let mut dict = Dict::new();
                for (key, value) in entries {
                    let key = self.eval_expression(key, scope)?.value();
                    let value = self.eval_expression(value, scope)?.value();
                    dict.insert(key, value)?;
                }
                self.factory.new_atom(Value::dict(dict))
            }
            Expression::Name(name) => self
                .scopes
                .lookup(scope, name.identifier())
                .map(|symbol| symbol.node().clone())
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    name: name.identifier().to_string(),
                }),
            Expression::DotName { expression, name } => {
                let object = self.eval_expression(expression, scope)?;
                self.resolve_member(&object, name.identifier(), scope)
            }
            Expression::Call { callee, arguments } => self.eval_call(callee, arguments, scope),
            Expression::BinaryOp { left, op, right } => {
                let left = self.eval_expression(left, scope)?;
                let right = self.eval_expression(right, scope)?;
                self.eval_binary(*op, left, right)
            }
            Expression::UnaryOp { op, operand } => {
                let operand = self.eval_expression(operand, scope)?.value();
                let result = operators::unary(*op, &operand)?;
                self.factory.new_atom(result)
            }
        }
    }

    fn eval_values(
        &mut self,
        items: &[Expression],
        scope: ScopeId,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval_expression(item, scope)?.value());
        }
        Ok(values)
    }

    /// Both operands are always evaluated; `or`/`and` then select one of them.
    fn eval_binary(
        &mut self,
        op: BinaryOperator,
        left: Node,
        right: Node,
    ) -> Result<Node, RuntimeError> {
        let selects_left = match op {
            BinaryOperator::Or => Some(left.value().is_truthy()),
            BinaryOperator::And => Some(!left.value().is_truthy()),
            _ => None,
        };
        if let Some(selects_left) = selects_left
            && !(matches!(left, Node::Atom(_)) && matches!(right, Node::Atom(_)))
        {
            return Ok(if selects_left { left } else { right });
        }
        let result = operators::binary(op, &left.value(), &right.value())?;
        self.factory.new_atom(result)
    }

    /// Member lookup: instance members live in the instance's class scope;
    /// members of data values are the methods of their native class.
    pub(super) fn resolve_member(
        &self,
        object: &Node,
        member: &str,
        scope: ScopeId,
    ) -> Result<Node, RuntimeError> {
        match object {
            Node::Instance(instance) => self
                .scopes
                .lookup_local(instance.scope(), member)
                .map(|symbol| symbol.node().clone())
                .ok_or_else(|| unknown_member(member, instance.class().name().identifier())),
            Node::Atom(value) => {
                let type_name = value.type_name();
                let native = self
                    .scopes
                    .lookup(scope, type_name)
                    .and_then(|symbol| match symbol.node() {
                        Node::Class(class) if class.is_builtin() => {
                            class.methods().get(member).cloned()
                        }
                        _ => None,
                    });
                native
                    .map(Node::Method)
                    .ok_or_else(|| unknown_member(member, type_name))
            }
            other => Err(unknown_member(member, other.value().type_name())),
        }
    }
}

pub(super) fn loop_control(keyword: &str) -> RuntimeError {
    RuntimeError::LoopControlOutsideLoop {
        keyword: keyword.to_string(),
    }
}

fn unknown_member(member: &str, type_name: &str) -> RuntimeError {
    RuntimeError::UnknownMember {
        member: member.to_string(),
        type_name: type_name.to_string(),
    }
}
