//! Immutable runtime values.
//!
//! The nine data kinds carry a native payload; the remaining kinds are
//! markers that only name what they classify. Composite payloads sit behind
//! `Rc` so clones are cheap, and a "mutation" always builds a new value.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::runtime::complex::Complex;
use crate::runtime::dict::Dict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Null,
    Integer,
    Float,
    Complex,
    String,
    Tuple,
    List,
    Dict,
    Function,
    Class,
    Method,
    Property,
    Instance,
    Annotation,
}

impl ValueKind {
    /// Kinds that wrap a native payload and can be rebuilt into atoms.
    pub const DATA: [ValueKind; 9] = [
        ValueKind::Boolean,
        ValueKind::Null,
        ValueKind::Integer,
        ValueKind::Float,
        ValueKind::Complex,
        ValueKind::String,
        ValueKind::Tuple,
        ValueKind::List,
        ValueKind::Dict,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Null => "Null",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Complex => "Complex",
            Self::String => "String",
            Self::Tuple => "Tuple",
            Self::List => "List",
            Self::Dict => "Dict",
            Self::Function => "Function",
            Self::Class => "Class",
            Self::Method => "Method",
            Self::Property => "Property",
            Self::Instance => "Instance",
            Self::Annotation => "Annotation",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Null,
    Integer(i64),
    Float(f64),
    Complex(Complex),
    String(Rc<str>),
    Tuple(Rc<[Value]>),
    List(Rc<[Value]>),
    Dict(Rc<Dict>),
    Function(Rc<str>),
    Class(Rc<str>),
    Method(Rc<str>),
    Property(Rc<str>),
    Instance { class: Rc<str>, id: u64 },
    Annotation(Rc<str>),
}

impl Value {
    pub fn string(value: impl AsRef<str>) -> Self {
        Self::String(Rc::from(value.as_ref()))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Self::Tuple(Rc::from(items))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::from(items))
    }

    pub fn dict(dict: Dict) -> Self {
        Self::Dict(Rc::new(dict))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Null => ValueKind::Null,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Complex(_) => ValueKind::Complex,
            Self::String(_) => ValueKind::String,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::List(_) => ValueKind::List,
            Self::Dict(_) => ValueKind::Dict,
            Self::Function(_) => ValueKind::Function,
            Self::Class(_) => ValueKind::Class,
            Self::Method(_) => ValueKind::Method,
            Self::Property(_) => ValueKind::Property,
            Self::Instance { .. } => ValueKind::Instance,
            Self::Annotation(_) => ValueKind::Annotation,
        }
    }

    /// Type name used in diagnostics and by `type`; instances report their class.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Instance { class, .. } => class,
            other => other.kind().name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Boolean(value) => *value,
            Self::Null => false,
            Self::Integer(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Complex(value) => !value.is_zero(),
            Self::String(value) => !value.is_empty(),
            Self::Tuple(items) | Self::List(items) => !items.is_empty(),
            Self::Dict(dict) => !dict.is_empty(),
            _ => true,
        }
    }

    /// Integer view of booleans and integers.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Boolean(value) => Some(i64::from(*value)),
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Traversal order used by `iterate`: characters, items, or dict keys.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Self::String(text) => Some(
                text.chars()
                    .map(|ch| Value::string(ch.encode_utf8(&mut [0; 4])))
                    .collect(),
            ),
            Self::Tuple(items) | Self::List(items) => Some(items.to_vec()),
            Self::Dict(dict) => Some(dict.keys().cloned().collect()),
            _ => None,
        }
    }

    pub fn is_hashable(&self) -> bool {
        match self {
            Self::List(_) | Self::Dict(_) => false,
            Self::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Structural equality with numeric kinds compared by value.
    pub fn equals(&self, other: &Value) -> bool {
        if let Some(equal) = self.numeric_equals(other) {
            return equal;
        }
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Tuple(left), Self::Tuple(right)) | (Self::List(left), Self::List(right)) => {
                left.len() == right.len()
                    && left.iter().zip(right.iter()).all(|(l, r)| l.equals(r))
            }
            (Self::Dict(left), Self::Dict(right)) => left.equals(right),
            (Self::Function(left), Self::Function(right))
            | (Self::Class(left), Self::Class(right))
            | (Self::Method(left), Self::Method(right))
            | (Self::Property(left), Self::Property(right))
            | (Self::Annotation(left), Self::Annotation(right)) => left == right,
            (Self::Instance { id: left, .. }, Self::Instance { id: right, .. }) => left == right,
            _ => false,
        }
    }

    /// Integers never pass through a float here, so large values stay distinct.
    fn numeric_equals(&self, other: &Value) -> Option<bool> {
        let left = self.as_complex()?;
        let right = other.as_complex()?;
        let exact = |int: i64, number: Complex| {
            number.im == 0.0 && compare_int_float(int, number.re) == Some(Ordering::Equal)
        };
        Some(match (self.as_integer(), other.as_integer()) {
            (Some(l), Some(r)) => l == r,
            (Some(int), None) => exact(int, right),
            (None, Some(int)) => exact(int, left),
            (None, None) => left == right,
        })
    }

    pub(crate) fn as_complex(&self) -> Option<Complex> {
        match self {
            Self::Boolean(value) => Some(Complex::new(f64::from(u8::from(*value)), 0.0)),
            Self::Integer(value) => Some(Complex::new(*value as f64, 0.0)),
            Self::Float(value) => Some(Complex::new(*value, 0.0)),
            Self::Complex(value) => Some(*value),
            _ => None,
        }
    }

    /// Text written by `print`: strings render bare, everything else as `repr`.
    pub fn to_output(&self) -> String {
        match self {
            Self::String(value) => value.to_string(),
            other => other.repr(),
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Self::Boolean(true) => "True".to_string(),
            Self::Boolean(false) => "False".to_string(),
            Self::Null => "Null".to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => float_repr(*value),
            Self::Complex(value) => value.repr(),
            Self::String(value) => string_repr(value),
            Self::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Self::Tuple(items) => format!("({})", join_repr(items)),
            Self::List(items) => format!("[{}]", join_repr(items)),
            Self::Dict(dict) => {
                let entries = dict
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.repr(), value.repr()))
                    .collect::<Vec<_>>();
                format!("{{{}}}", entries.join(", "))
            }
            Self::Function(name) => format!("<function {name}>"),
            Self::Class(name) => format!("<class {name}>"),
            Self::Method(name) => format!("<method {name}>"),
            Self::Property(name) => format!("<property {name}>"),
            Self::Instance { class, .. } => format!("<{class} instance>"),
            Self::Annotation(name) => format!("<annotation {name}>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

/// 2^63, exactly representable; finite floats below it in magnitude truncate into `i64`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// The integer a float is exactly equal to, if any.
pub(crate) fn exact_integer(float: f64) -> Option<i64> {
    (float.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&float)).then(|| float as i64)
}

/// Exact ordering of an integer against a float; `None` when the float is NaN.
pub(crate) fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if float < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    let ordering = int.cmp(&(whole as i64));
    if ordering != Ordering::Equal {
        return Some(ordering);
    }
    Some(if float > whole {
        Ordering::Less
    } else if float < whole {
        Ordering::Greater
    } else {
        Ordering::Equal
    })
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Shortest round-trip rendering; integral values keep a trailing `.0` and
/// very large or small magnitudes switch to `e+NN` notation.
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let rendered = if value > 0.0 { "inf" } else { "-inf" };
        return rendered.to_string();
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

fn string_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut rendered = String::with_capacity(value.len() + 2);
    rendered.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => rendered.push_str("\\\\"),
            '\n' => rendered.push_str("\\n"),
            '\r' => rendered.push_str("\\r"),
            '\t' => rendered.push_str("\\t"),
            ch if ch == quote => {
                rendered.push('\\');
                rendered.push(ch);
            }
            ch => rendered.push(ch),
        }
    }
    rendered.push(quote);
    rendered
}
