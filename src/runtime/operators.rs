//! Native semantics of the binary and unary operators.
//!
//! Operands are plain values; the caller re-wraps the result into an atom.
//! Booleans take part in arithmetic as `0`/`1`, integer arithmetic is checked,
//! and mixed numeric operands promote along Integer -> Float -> Complex.

use std::cmp::Ordering;

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::runtime::complex::Complex;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::{Value, compare_int_float};

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
    Complex(Complex),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(flag) => Some(Self::Int(i64::from(*flag))),
            Value::Integer(int) => Some(Self::Int(*int)),
            Value::Float(float) => Some(Self::Float(*float)),
            Value::Complex(complex) => Some(Self::Complex(*complex)),
            _ => None,
        }
    }

    fn as_float(self) -> Option<f64> {
        match self {
            Self::Int(int) => Some(int as f64),
            Self::Float(float) => Some(float),
            Self::Complex(_) => None,
        }
    }

    fn as_complex(self) -> Complex {
        match self {
            Self::Int(int) => Complex::new(int as f64, 0.0),
            Self::Float(float) => Complex::new(float, 0.0),
            Self::Complex(complex) => complex,
        }
    }
}

enum Promoted {
    Ints(i64, i64),
    Floats(f64, f64),
    Complexes(Complex, Complex),
}

fn promote(left: Number, right: Number) -> Promoted {
    match (left, right) {
        (Number::Int(l), Number::Int(r)) => Promoted::Ints(l, r),
        (l, r) => match (l.as_float(), r.as_float()) {
            (Some(l), Some(r)) => Promoted::Floats(l, r),
            _ => Promoted::Complexes(l.as_complex(), r.as_complex()),
        },
    }
}

pub(crate) fn binary(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOperator::Or => Ok(if left.is_truthy() { left } else { right }.clone()),
        BinaryOperator::And => Ok(if left.is_truthy() { right } else { left }.clone()),
        BinaryOperator::EqEqual => Ok(Value::Boolean(left.equals(right))),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!left.equals(right))),
        BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual => compare(op, left, right).map(Value::Boolean),
        BinaryOperator::Plus => add(left, right),
        BinaryOperator::Minus => arithmetic(op, left, right),
        BinaryOperator::Star => multiply(left, right),
        BinaryOperator::Slash
        | BinaryOperator::DoubleSlash
        | BinaryOperator::Percent
        | BinaryOperator::DoubleStar => arithmetic(op, left, right),
    }
}

pub(crate) fn unary(op: UnaryOperator, operand: &Value) -> Result<Value, RuntimeError> {
    if op == UnaryOperator::Not {
        return Ok(Value::Boolean(!operand.is_truthy()));
    }
    let number = Number::of(operand).ok_or_else(|| RuntimeError::UnaryTypeMismatch {
        operator: op.symbol().to_string(),
        operand: operand.type_name().to_string(),
    })?;
    match (op, number) {
        (UnaryOperator::Plus, Number::Int(int)) => Ok(Value::Integer(int)),
        (UnaryOperator::Plus, Number::Float(float)) => Ok(Value::Float(float)),
        (UnaryOperator::Plus, Number::Complex(complex)) => Ok(Value::Complex(complex)),
        (_, Number::Int(int)) => int
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow(op.symbol())),
        (_, Number::Float(float)) => Ok(Value::Float(-float)),
        (_, Number::Complex(complex)) => Ok(Value::Complex(complex.neg())),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok(Value::string(format!("{l}{r}"))),
        (Value::Tuple(l), Value::Tuple(r)) => Ok(Value::tuple(concat(l, r))),
        (Value::List(l), Value::List(r)) => Ok(Value::list(concat(l, r))),
        _ => arithmetic(BinaryOperator::Plus, left, right),
    }
}

fn concat(left: &[Value], right: &[Value]) -> Vec<Value> {
    left.iter().chain(right.iter()).cloned().collect()
}

fn multiply(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (sequence, count) = match (left, right) {
        (Value::String(_) | Value::Tuple(_) | Value::List(_), count) => (left, count),
        (count, Value::String(_) | Value::Tuple(_) | Value::List(_)) => (right, count),
        _ => return arithmetic(BinaryOperator::Star, left, right),
    };
    let Some(count) = count.as_integer() else {
        return Err(mismatch(BinaryOperator::Star, left, right));
    };
    let count = usize::try_from(count).unwrap_or(0);
    match sequence {
        Value::String(text) => {
            let total = repeated_len(text.len(), count)?;
            let mut repeated = String::new();
            repeated
                .try_reserve_exact(total)
                .map_err(|_| too_long("*"))?;
            if total > 0 {
                for _ in 0..count {
                    repeated.push_str(text);
                }
            }
            Ok(Value::string(repeated))
        }
        Value::Tuple(items) => Ok(Value::tuple(repeat(items, count)?)),
        Value::List(items) => Ok(Value::list(repeat(items, count)?)),
        _ => Err(mismatch(BinaryOperator::Star, left, right)),
    }
}

fn repeat(items: &[Value], count: usize) -> Result<Vec<Value>, RuntimeError> {
    let total = repeated_len(items.len(), count)?;
    let mut repeated = Vec::new();
    repeated
        .try_reserve_exact(total)
        .map_err(|_| too_long("*"))?;
    if total > 0 {
        for _ in 0..count {
            repeated.extend_from_slice(items);
        }
    }
    Ok(repeated)
}

fn repeated_len(len: usize, count: usize) -> Result<usize, RuntimeError> {
    len.checked_mul(count).ok_or_else(|| too_long("*"))
}

fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (Some(l), Some(r)) = (Number::of(left), Number::of(right)) else {
        return Err(mismatch(op, left, right));
    };
    let symbol = op.symbol();
    match promote(l, r) {
        Promoted::Ints(l, r) => int_arithmetic(op, l, r),
        Promoted::Floats(l, r) => float_arithmetic(op, l, r),
        Promoted::Complexes(l, r) => match op {
            BinaryOperator::Plus => Ok(Value::Complex(l.add(r))),
            BinaryOperator::Minus => Ok(Value::Complex(l.sub(r))),
            BinaryOperator::Star => Ok(Value::Complex(l.mul(r))),
            BinaryOperator::Slash => l
                .div(r)
                .map(Value::Complex)
                .ok_or_else(|| zero_division(symbol)),
            BinaryOperator::DoubleStar => l
                .pow(r)
                .map(Value::Complex)
                .ok_or_else(|| zero_division(symbol)),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn int_arithmetic(op: BinaryOperator, l: i64, r: i64) -> Result<Value, RuntimeError> {
    let symbol = op.symbol();
    let checked = |result: Option<i64>| result.map(Value::Integer).ok_or_else(|| overflow(symbol));
    match op {
        BinaryOperator::Plus => checked(l.checked_add(r)),
        BinaryOperator::Minus => checked(l.checked_sub(r)),
        BinaryOperator::Star => checked(l.checked_mul(r)),
        BinaryOperator::Slash => {
            if r == 0 {
                return Err(zero_division(symbol));
            }
            Ok(Value::Float(l as f64 / r as f64))
        }
        BinaryOperator::DoubleSlash => {
            if r == 0 {
                return Err(zero_division(symbol));
            }
            let quotient = l.checked_div(r).ok_or_else(|| overflow(symbol))?;
            if l % r != 0 && (l < 0) != (r < 0) {
                Ok(Value::Integer(quotient - 1))
            } else {
                Ok(Value::Integer(quotient))
            }
        }
        BinaryOperator::Percent => {
            if r == 0 {
                return Err(zero_division(symbol));
            }
            let remainder = l.wrapping_rem(r);
            if remainder != 0 && (remainder < 0) != (r < 0) {
                Ok(Value::Integer(remainder + r))
            } else {
                Ok(Value::Integer(remainder))
            }
        }
        BinaryOperator::DoubleStar => {
            if r < 0 {
                if l == 0 {
                    return Err(zero_division(symbol));
                }
                return Ok(Value::Float((l as f64).powf(r as f64)));
            }
            let Ok(exponent) = u32::try_from(r) else {
                return match l {
                    0 | 1 => Ok(Value::Integer(l)),
                    -1 => Ok(Value::Integer(if r % 2 == 0 { 1 } else { -1 })),
                    _ => Err(overflow(symbol)),
                };
            };
            checked(l.checked_pow(exponent))
        }
        _ => unreachable!("non-arithmetic operator {symbol}"),
    }
}

fn float_arithmetic(op: BinaryOperator, l: f64, r: f64) -> Result<Value, RuntimeError> {
    let symbol = op.symbol();
    match op {
        BinaryOperator::Plus => Ok(Value::Float(l + r)),
        BinaryOperator::Minus => Ok(Value::Float(l - r)),
        BinaryOperator::Star => Ok(Value::Float(l * r)),
        BinaryOperator::Slash => {
            if r == 0.0 {
                return Err(zero_division(symbol));
            }
            Ok(Value::Float(l / r))
        }
        BinaryOperator::DoubleSlash => {
            if r == 0.0 {
                return Err(zero_division(symbol));
            }
            Ok(Value::Float((l / r).floor()))
        }
        BinaryOperator::Percent => {
            if r == 0.0 {
                return Err(zero_division(symbol));
            }
            let remainder = l % r;
            if remainder != 0.0 && (remainder < 0.0) != (r < 0.0) {
                Ok(Value::Float(remainder + r))
            } else {
                Ok(Value::Float(remainder))
            }
        }
        BinaryOperator::DoubleStar => {
            if l == 0.0 && r < 0.0 {
                return Err(zero_division(symbol));
            }
            if l < 0.0 && r.fract() != 0.0 {
                return Complex::new(l, 0.0)
                    .pow(Complex::new(r, 0.0))
                    .map(Value::Complex)
                    .ok_or_else(|| zero_division(symbol));
            }
            Ok(Value::Float(l.powf(r)))
        }
        _ => unreachable!("non-arithmetic operator {symbol}"),
    }
}

fn compare(op: BinaryOperator, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    let ordering = match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Tuple(l), Value::Tuple(r)) | (Value::List(l), Value::List(r)) => {
            if let Some((a, b)) = l.iter().zip(r.iter()).find(|(a, b)| !a.equals(b)) {
                return compare(op, a, b);
            }
            Some(l.len().cmp(&r.len()))
        }
        _ => match (Number::of(left), Number::of(right)) {
            (Some(Number::Int(l)), Some(Number::Int(r))) => Some(l.cmp(&r)),
            (Some(Number::Int(l)), Some(Number::Float(r))) => compare_int_float(l, r),
            (Some(Number::Float(l)), Some(Number::Int(r))) => {
                compare_int_float(r, l).map(Ordering::reverse)
            }
            (Some(l), Some(r)) => match (l.as_float(), r.as_float()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => return Err(mismatch(op, left, right)),
            },
            _ => return Err(mismatch(op, left, right)),
        },
    };
    Ok(match ordering {
        None => false,
        Some(ordering) => match op {
            BinaryOperator::Less => ordering == Ordering::Less,
            BinaryOperator::LessEqual => ordering != Ordering::Greater,
            BinaryOperator::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        },
    })
}

fn mismatch(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operator: op.symbol().to_string(),
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}

fn zero_division(operator: &str) -> RuntimeError {
    RuntimeError::ZeroDivision {
        operator: operator.to_string(),
    }
}

fn too_long(operator: &str) -> RuntimeError {
    RuntimeError::SequenceTooLong {
        operator: operator.to_string(),
    }
}

fn overflow(operator: &str) -> RuntimeError {
    RuntimeError::IntegerOverflow {
        operator: operator.to_string(),
    }
}
