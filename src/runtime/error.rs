use thiserror::Error;

/// Typed failures raised while evaluating a program. The first one aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Unsupported operand types for {operator}: {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: String,
        right: String,
    },
    #[error("Unsupported operand type for unary {operator}: {operand}")]
    UnaryTypeMismatch { operator: String, operand: String },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Object of type {type_name} is not callable")]
    ObjectNotCallable { type_name: String },
    #[error("Unknown member '{member}' for type {type_name}")]
    UnknownMember { member: String, type_name: String },
    #[error("Object of type {type_name} is not iterable")]
    NotIterable { type_name: String },
    #[error("Division by zero in '{operator}'")]
    ZeroDivision { operator: String },
    #[error("Integer overflow in '{operator}'")]
    IntegerOverflow { operator: String },
    #[error("Result of '{operator}' is too long")]
    SequenceTooLong { operator: String },
    #[error("Unhashable key of type {type_name}")]
    UnhashableKey { type_name: String },
    #[error("Missing key {key}")]
    MissingKey { key: String },
    #[error("Index out of bounds: index {index}, len {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error(
        "Invalid argument type for operation '{operation}': '{argument}' expected {expected}, got {got}"
    )]
    InvalidArgumentType {
        operation: String,
        argument: String,
        expected: String,
        got: String,
    },
    #[error("Invalid literal for {type_name}: {literal}")]
    InvalidLiteral { type_name: String, literal: String },
    #[error("No atom builder registered for type {type_name}")]
    UnwrappableValue { type_name: String },
    #[error("'{keyword}' outside of loop")]
    LoopControlOutsideLoop { keyword: String },
    #[error("Maximum call depth of {limit} exceeded")]
    RecursionLimit { limit: usize },
    #[error("Failed to write output: {message}")]
    OutputFailed { message: String },
}

impl RuntimeError {
    pub(crate) fn expect_arity(name: &str, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::ArityMismatch {
                name: name.to_string(),
                expected,
                found,
            })
        }
    }

    pub(crate) fn invalid_argument(
        operation: &str,
        argument: &str,
        expected: &str,
        got: &str,
    ) -> Self {
        Self::InvalidArgumentType {
            operation: operation.to_string(),
            argument: argument.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
