//! Syntax tree handed to the evaluation engine.
//!
//! An external parser builds these nodes (or a driver deserializes them from
//! JSON); the interpreter walks them directly without any lowering step.
//! Declarations are reference counted because evaluating them binds the node
//! itself into a symbol table that can outlive the borrowed tree.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::builtins::{BuiltinFunction, NativeClass, NativeMethod};
use crate::runtime::complex::Complex;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn identifier(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub block: Block,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            block: Block::new(statements),
        }
    }
}

/// Ordered statements evaluated in one scope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    EqEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::EqEqual => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::DoubleStar => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Boolean(bool),
    Null,
    Integer(i64),
    Float(f64),
    Complex(Complex),
    String(String),
    Tuple(Vec<Expression>),
    List(Vec<Expression>),
    Dict(Vec<(Expression, Expression)>),
    Name(Name),
    DotName {
        expression: Box<Expression>,
        name: Name,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

impl Expression {
    pub fn name(identifier: &str) -> Self {
        Self::Name(Name::from(identifier))
    }

    pub fn string(value: &str) -> Self {
        Self::String(value.to_string())
    }

    pub fn dot(expression: Expression, name: &str) -> Self {
        Self::DotName {
            expression: Box::new(expression),
            name: Name::from(name),
        }
    }

    pub fn call(callee: &str, arguments: Vec<Expression>) -> Self {
        Self::Call {
            callee: Box::new(Self::name(callee)),
            arguments,
        }
    }

    pub fn method_call(receiver: Expression, method: &str, arguments: Vec<Expression>) -> Self {
        Self::Call {
            callee: Box::new(Self::dot(receiver, method)),
            arguments,
        }
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Self::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Name(Name),
    Member { object: Expression, name: Name },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elif {
    pub expression: Expression,
    pub block: Block,
    #[serde(default)]
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Expression(Expression),
    Assignment {
        target: Target,
        expression: Expression,
    },
    If {
        expression: Expression,
        block: Block,
        #[serde(default)]
        elifs: Vec<Elif>,
        #[serde(default)]
        else_block: Option<Block>,
    },
    Loop {
        expression: Expression,
        block: Block,
    },
    Iterate {
        iterable: Expression,
        variable: Name,
        block: Block,
    },
    Break,
    Continue,
    Return(Option<Expression>),
    FunctionDef(Rc<FunctionDef>),
    ClassDef(Rc<ClassDef>),
    MethodDef(Rc<MethodDef>),
    Property(Rc<Property>),
    Annotation(Annotation),
}

impl Statement {
    pub fn assign(identifier: &str, expression: Expression) -> Self {
        Self::Assignment {
            target: Target::Name(Name::from(identifier)),
            expression,
        }
    }

    pub fn assign_member(object: Expression, member: &str, expression: Expression) -> Self {
        Self::Assignment {
            target: Target::Member {
                object,
                name: Name::from(member),
            },
            expression,
        }
    }

    pub fn ret(expression: Expression) -> Self {
        Self::Return(Some(expression))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Annotation {
    Public,
    Private,
    Protected,
    Factory,
    Get,
    Set,
    Ref,
    Val,
}

impl Annotation {
    pub fn literal(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Factory => "factory",
            Self::Get => "get",
            Self::Set => "set",
            Self::Ref => "ref",
            Self::Val => "val",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Name,
    #[serde(default)]
    pub type_name: Option<Name>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Parameter {
    pub fn new(identifier: &str) -> Self {
        Self {
            name: Name::from(identifier),
            type_name: None,
            annotations: Vec::new(),
        }
    }
}

fn parameters(identifiers: &[&str]) -> Vec<Parameter> {
    identifiers.iter().map(|name| Parameter::new(name)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Name,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<Expression>,
    #[serde(default)]
    pub block: Block,
    #[serde(skip)]
    pub native: Option<BuiltinFunction>,
}

impl FunctionDef {
    pub fn new(name: &str, parameter_names: &[&str], statements: Vec<Statement>) -> Self {
        Self {
            name: Name::from(name),
            parameters: parameters(parameter_names),
            return_type: None,
            block: Block::new(statements),
            native: None,
        }
    }

    /// Wraps a native entry point so it can be bound like a declared function.
    pub fn builtin(builtin: BuiltinFunction) -> Self {
        Self {
            name: Name::from(builtin.name()),
            parameters: parameters(builtin.parameters()),
            return_type: None,
            block: Block::default(),
            native: Some(builtin),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.native.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: Name,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub return_type: Option<Expression>,
    #[serde(default)]
    pub block: Block,
    #[serde(skip)]
    pub native: Option<NativeMethod>,
}

impl MethodDef {
    pub fn new(name: &str, parameter_names: &[&str], statements: Vec<Statement>) -> Self {
        Self {
            name: Name::from(name),
            parameters: parameters(parameter_names),
            annotations: vec![Annotation::Public],
            return_type: None,
            block: Block::new(statements),
            native: None,
        }
    }

    pub fn builtin(method: NativeMethod) -> Self {
        Self {
            name: Name::from(method.name()),
            parameters: parameters(method.parameters()),
            annotations: vec![Annotation::Public],
            return_type: None,
            block: Block::default(),
            native: Some(method),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.native.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: Name,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Property {
    pub fn new(name: &str) -> Self {
        Self {
            name: Name::from(name),
            annotations: vec![Annotation::Public],
        }
    }
}

/// Class declaration with its members indexed by name.
///
/// The member maps are derived from the body block when the node is built;
/// a constructor method named after the class is injected when the body
/// does not declare one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClassDecl", into = "ClassDecl")]
pub struct ClassDef {
    name: Name,
    annotations: Vec<Annotation>,
    block: Block,
    properties: FxHashMap<String, Rc<Property>>,
    methods: FxHashMap<String, Rc<MethodDef>>,
    native: Option<NativeClass>,
}

impl ClassDef {
    pub fn new(name: &str, annotations: Vec<Annotation>, statements: Vec<Statement>) -> Self {
        let block = Block::new(statements);
        let mut properties = FxHashMap::default();
        let mut methods = FxHashMap::default();
        for statement in &block.statements {
            match statement {
                Statement::Property(property) => {
                    properties.insert(
                        property.name.identifier().to_string(),
                        Rc::clone(property),
                    );
                }
                Statement::MethodDef(method) => {
                    methods.insert(method.name.identifier().to_string(), Rc::clone(method));
                }
                _ => {}
            }
        }
        methods
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(MethodDef::new(name, &[], Vec::new())));

        Self {
            name: Name::from(name),
            annotations,
            block,
            properties,
            methods,
            native: None,
        }
    }

    pub fn builtin(native: NativeClass) -> Self {
        let methods = native
            .methods()
            .iter()
            .map(|method| (method.name().to_string(), Rc::new(MethodDef::builtin(*method))))
            .collect();
        Self {
            name: Name::from(native.name()),
            annotations: vec![Annotation::Public],
            block: Block::default(),
            properties: FxHashMap::default(),
            methods,
            native: Some(native),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn properties(&self) -> &FxHashMap<String, Rc<Property>> {
        &self.properties
    }

    pub fn methods(&self) -> &FxHashMap<String, Rc<MethodDef>> {
        &self.methods
    }

    pub fn constructor(&self) -> Option<&Rc<MethodDef>> {
        self.methods.get(self.name.identifier())
    }

    pub fn native(&self) -> Option<NativeClass> {
        self.native
    }

    pub fn is_builtin(&self) -> bool {
        self.native.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct ClassDecl {
    name: Name,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    block: Block,
}

impl From<ClassDecl> for ClassDef {
    fn from(decl: ClassDecl) -> Self {
        ClassDef::new(decl.name.identifier(), decl.annotations, decl.block.statements)
    }
}

impl From<ClassDef> for ClassDecl {
    fn from(class: ClassDef) -> Self {
        ClassDecl {
            name: class.name,
            annotations: class.annotations,
            block: class.block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_def_indexes_members_and_injects_constructor() {
        let class = ClassDef::new(
            "Point",
            vec![Annotation::Public],
            vec![
                Statement::Property(Rc::new(Property::new("x"))),
                Statement::Property(Rc::new(Property::new("y"))),
                Statement::MethodDef(Rc::new(MethodDef::new("norm", &[], vec![]))),
            ],
        );

        assert_eq!(class.properties().len(), 2);
        assert!(class.methods().contains_key("norm"));
        let constructor = class.constructor().expect("constructor injected");
        assert!(constructor.parameters.is_empty());
        assert!(constructor.block.statements.is_empty());
    }

    #[test]
    fn declared_constructor_is_not_replaced() {
        let class = ClassDef::new(
            "Point",
            vec![],
            vec![Statement::MethodDef(Rc::new(MethodDef::new(
                "Point",
                &["a"],
                vec![Statement::Break],
            )))],
        );

        let constructor = class.constructor().expect("constructor declared");
        assert_eq!(constructor.parameters.len(), 1);
    }

    #[test]
    fn deserialized_class_rebuilds_member_maps() {
        let json = r#"{"name": "Counter", "block": [{"Property": {"name": "count"}}]}"#;
        let class: ClassDef = serde_json::from_str(json).expect("valid class json");

        assert_eq!(class.name().identifier(), "Counter");
        assert!(class.properties().contains_key("count"));
        assert!(class.constructor().is_some());
    }
}
