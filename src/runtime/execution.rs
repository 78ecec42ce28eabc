//! Native entry points behind builtin functions, classes and methods.
//!
//! Arguments arrive already extracted by parameter name, in declaration
//! order, so every entry can index them directly.

use crate::builtins::{BuiltinFunction, NativeClass, NativeMethod};
use crate::runtime::complex::Complex;
use crate::runtime::dict::Dict;
use crate::runtime::error::RuntimeError;
use crate::runtime::output::OutputSink;
use crate::runtime::value::Value;

pub(crate) fn call_builtin(
    builtin: BuiltinFunction,
    args: &[Value],
    output: &mut dyn OutputSink,
) -> Result<Value, RuntimeError> {
    RuntimeError::expect_arity(builtin.name(), builtin.parameters().len(), args.len())?;
    match builtin {
        BuiltinFunction::Print => {
            output.write_line(&args[0].to_output())?;
            Ok(Value::Null)
        }
        BuiltinFunction::Len => {
            let len = match &args[0] {
                Value::String(text) => text.chars().count(),
                Value::Tuple(items) | Value::List(items) => items.len(),
                Value::Dict(dict) => dict.len(),
                other => {
                    return Err(RuntimeError::invalid_argument(
                        "len",
                        "value",
                        "String, Tuple, List or Dict",
                        other.type_name(),
                    ));
                }
            };
            i64::try_from(len)
                .map(Value::Integer)
                .map_err(|_| RuntimeError::IntegerOverflow {
                    operator: "len".to_string(),
                })
        }
        BuiltinFunction::Range => {
            let stop = args[0].as_integer().ok_or_else(|| {
                RuntimeError::invalid_argument("range", "stop", "Integer", args[0].type_name())
            })?;
            Ok(Value::list((0..stop.max(0)).map(Value::Integer).collect()))
        }
        BuiltinFunction::Type => Ok(Value::string(args[0].type_name())),
    }
}

pub(crate) fn construct_native(class: NativeClass, args: &[Value]) -> Result<Value, RuntimeError> {
    RuntimeError::expect_arity(class.name(), class.parameters().len(), args.len())?;
    let name = class.name();
    match class {
        NativeClass::Boolean => Ok(Value::Boolean(args[0].is_truthy())),
        NativeClass::Null => Ok(Value::Null),
        NativeClass::Integer => to_integer(&args[0]).map(Value::Integer),
        NativeClass::Float => to_float(&args[0]).map(Value::Float),
        NativeClass::Complex => {
            let part = |value: &Value, argument: &str| {
                value.as_complex().ok_or_else(|| {
                    RuntimeError::invalid_argument(name, argument, "number", value.type_name())
                })
            };
            let real = part(&args[0], "real")?;
            let imag = part(&args[1], "imag")?;
            Ok(Value::Complex(real.add(imag.mul(Complex::new(0.0, 1.0)))))
        }
        NativeClass::String => Ok(Value::string(args[0].to_output())),
        NativeClass::Tuple => Ok(Value::tuple(iterable(name, &args[0])?)),
        NativeClass::List => Ok(Value::list(iterable(name, &args[0])?)),
        NativeClass::Dict => match &args[0] {
            Value::Dict(dict) => Ok(Value::Dict(dict.clone())),
            other => {
                let mut dict = Dict::new();
                for pair in iterable(name, other)? {
                    let (key, value) = match &pair {
                        Value::Tuple(items) | Value::List(items) if items.len() == 2 => {
                            (items[0].clone(), items[1].clone())
                        }
                        _ => {
                            return Err(RuntimeError::invalid_argument(
                                name,
                                "value",
                                "pairs",
                                pair.type_name(),
                            ));
                        }
                    };
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
        },
    }
}

pub(crate) fn call_native_method(
    method: NativeMethod,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    RuntimeError::expect_arity(method.name(), method.parameters().len(), args.len())?;
    let receiver = &args[0];
    let expected = method.class().name();
    if receiver.type_name() != expected {
        return Err(RuntimeError::invalid_argument(
            method.name(),
            "self",
            expected,
            receiver.type_name(),
        ));
    }

    match (method, receiver) {
        (NativeMethod::StringUpper, Value::String(text)) => Ok(Value::string(text.to_uppercase())),
        (NativeMethod::StringLower, Value::String(text)) => Ok(Value::string(text.to_lowercase())),
        (NativeMethod::StringStrip, Value::String(text)) => Ok(Value::string(text.trim())),
        (NativeMethod::StringSplit, Value::String(text)) => {
            let separator = string_argument(method, "separator", &args[1])?;
            if separator.is_empty() {
                return Err(RuntimeError::invalid_argument(
                    method.name(),
                    "separator",
                    "non-empty String",
                    "empty String",
                ));
            }
            Ok(Value::list(text.split(separator).map(Value::string).collect()))
        }
        (NativeMethod::StringContains, Value::String(text)) => {
            let item = string_argument(method, "item", &args[1])?;
            Ok(Value::Boolean(text.contains(item)))
        }
        (
            NativeMethod::TupleContains | NativeMethod::ListContains,
            Value::Tuple(items) | Value::List(items),
        ) => Ok(Value::Boolean(items.iter().any(|item| item.equals(&args[1])))),
        (NativeMethod::TupleGet | NativeMethod::ListGet, Value::Tuple(items) | Value::List(items)) => {
            let index = resolve_index(method, &args[1], items.len())?;
            Ok(items[index].clone())
        }
        (NativeMethod::ListSet, Value::List(items)) => {
            let index = resolve_index(method, &args[1], items.len())?;
            let mut rebuilt = items.to_vec();
            rebuilt[index] = args[2].clone();
            Ok(Value::list(rebuilt))
        }
        (NativeMethod::ListAppend, Value::List(items)) => {
            let mut rebuilt = items.to_vec();
            rebuilt.push(args[1].clone());
            Ok(Value::list(rebuilt))
        }
        (NativeMethod::DictGet, Value::Dict(dict)) => {
            dict.get(&args[1])?
                .cloned()
                .ok_or_else(|| RuntimeError::MissingKey {
                    key: args[1].repr(),
                })
        }
        (NativeMethod::DictSet, Value::Dict(dict)) => {
            let mut rebuilt = Dict::clone(dict);
            rebuilt.insert(args[1].clone(), args[2].clone())?;
            Ok(Value::dict(rebuilt))
        }
        (NativeMethod::DictKeys, Value::Dict(dict)) => Ok(Value::list(dict.keys().cloned().collect())),
        (NativeMethod::DictValues, Value::Dict(dict)) => {
            Ok(Value::list(dict.values().cloned().collect()))
        }
        (NativeMethod::DictContains, Value::Dict(dict)) => {
            Ok(Value::Boolean(dict.contains_key(&args[1])?))
        }
        (_, other) => Err(RuntimeError::invalid_argument(
            method.name(),
            "self",
            expected,
            other.type_name(),
        )),
    }
}

fn to_integer(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Boolean(_) | Value::Integer(_) => Ok(value.as_integer().unwrap_or_default()),
        Value::Float(float) => {
            if float.is_finite() && float.abs() < 9.2e18 {
                Ok(float.trunc() as i64)
            } else {
                Err(invalid_literal("Integer", value))
            }
        }
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| invalid_literal("Integer", value)),
        other => Err(RuntimeError::invalid_argument(
            "Integer",
            "value",
            "number or String",
            other.type_name(),
        )),
    }
}

fn to_float(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Boolean(_) | Value::Integer(_) => {
            Ok(value.as_integer().unwrap_or_default() as f64)
        }
        Value::Float(float) => Ok(*float),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| invalid_literal("Float", value)),
        other => Err(RuntimeError::invalid_argument(
            "Float",
            "value",
            "number or String",
            other.type_name(),
        )),
    }
}

fn iterable(operation: &str, value: &Value) -> Result<Vec<Value>, RuntimeError> {
    value.elements().ok_or_else(|| {
        RuntimeError::invalid_argument(operation, "value", "iterable", value.type_name())
    })
}

fn string_argument<'v>(
    method: NativeMethod,
    argument: &str,
    value: &'v Value,
) -> Result<&'v str, RuntimeError> {
    match value {
        Value::String(text) => Ok(&**text),
        other => Err(RuntimeError::invalid_argument(
            method.name(),
            argument,
            "String",
            other.type_name(),
        )),
    }
}

/// Maps a possibly negative index onto `0..len`.
fn resolve_index(method: NativeMethod, index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let raw = index.as_integer().ok_or_else(|| {
        RuntimeError::invalid_argument(method.name(), "index", "Integer", index.type_name())
    })?;
    let adjusted = if raw < 0 {
        i64::try_from(len).ok().and_then(|len| raw.checked_add(len))
    } else {
        Some(raw)
    };
    adjusted
        .and_then(|index| usize::try_from(index).ok())
        .filter(|&index| index < len)
        .ok_or(RuntimeError::IndexOutOfBounds { index: raw, len })
}

fn invalid_literal(type_name: &str, value: &Value) -> RuntimeError {
    RuntimeError::InvalidLiteral {
        type_name: type_name.to_string(),
        literal: value.repr(),
    }
}
