//! Registry of native functions, classes and methods exposed to programs.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Print,
    Len,
    Range,
    Type,
}

impl BuiltinFunction {
    pub const ALL: [BuiltinFunction; 4] = [Self::Print, Self::Len, Self::Range, Self::Type];

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Len => "len",
            Self::Range => "range",
            Self::Type => "type",
        }
    }

    /// Declared parameter names, bound by name before the native entry runs.
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::Print | Self::Len | Self::Type => &["value"],
            Self::Range => &["stop"],
        }
    }
}

/// Native classes, one per data kind. Calling one converts its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeClass {
    Boolean,
    Null,
    Integer,
    Float,
    Complex,
    String,
    Tuple,
    List,
    Dict,
}

impl NativeClass {
    pub const ALL: [NativeClass; 9] = [
        Self::Boolean,
        Self::Null,
        Self::Integer,
        Self::Float,
        Self::Complex,
        Self::String,
        Self::Tuple,
        Self::List,
        Self::Dict,
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
        }
    }

    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::Null => &[],
            Self::Complex => &["real", "imag"],
            _ => &["value"],
        }
    }

    pub fn methods(self) -> &'static [NativeMethod] {
        use NativeMethod::*;
        match self {
            Self::String => &[StringUpper, StringLower, StringStrip, StringSplit, StringContains],
            Self::Tuple => &[TupleGet, TupleContains],
            Self::List => &[ListGet, ListSet, ListAppend, ListContains],
            Self::Dict => &[DictGet, DictSet, DictKeys, DictValues, DictContains],
            _ => &[],
        }
    }
}

/// Native methods; the receiver is always bound to the first parameter, `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeMethod {
    StringUpper,
    StringLower,
    StringStrip,
    StringSplit,
    StringContains,
    TupleGet,
    TupleContains,
    ListGet,
    ListSet,
    ListAppend,
    ListContains,
    DictGet,
    DictSet,
    DictKeys,
    DictValues,
    DictContains,
}

impl NativeMethod {
    pub fn class(self) -> NativeClass {
        match self {
            Self::StringUpper
            | Self::StringLower
            | Self::StringStrip
            | Self::StringSplit
            | Self::StringContains => NativeClass::String,
            Self::TupleGet | Self::TupleContains => NativeClass::Tuple,
            Self::ListGet | Self::ListSet | Self::ListAppend | Self::ListContains => {
                NativeClass::List
            }
            Self::DictGet | Self::DictSet | Self::DictKeys | Self::DictValues | Self::DictContains => {
                NativeClass::Dict
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StringUpper => "upper",
            Self::StringLower => "lower",
            Self::StringStrip => "strip",
            Self::StringSplit => "split",
            Self::StringContains | Self::TupleContains | Self::ListContains | Self::DictContains => {
                "contains"
            }
            Self::TupleGet | Self::ListGet | Self::DictGet => "get",
            Self::ListSet | Self::DictSet => "set",
            Self::ListAppend => "append",
            Self::DictKeys => "keys",
            Self::DictValues => "values",
        }
    }

    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::StringUpper
            | Self::StringLower
            | Self::StringStrip
            | Self::DictKeys
            | Self::DictValues => &["self"],
            Self::StringSplit => &["self", "separator"],
            Self::StringContains
            | Self::TupleContains
            | Self::ListContains
            | Self::ListAppend => &["self", "item"],
            Self::TupleGet | Self::ListGet => &["self", "index"],
            Self::ListSet => &["self", "index", "item"],
            Self::DictGet | Self::DictContains => &["self", "key"],
            Self::DictSet => &["self", "key", "value"],
        }
    }
}
