//! This module defines the runtime value model shared by the parser and the evaluator.
//! The main enum, [`Value`], covers booleans, numbers, symbols and lists, where lists
//! are persistent [`ConsList`]s. Ergonomic helper functions such as [`val`], [`sym`]
//! and [`nil`] are provided for convenient AST construction in both code and tests,
//! and conversion traits make it easy to build Values from Rust literals, arrays and
//! vectors. Display follows Scheme conventions so that printed values parse back.

use std::fmt;

use crate::conslist::ConsList;
use crate::number::Number;
use crate::{Error, ErrorKind};

/// Symbols that can never be bound by `define` or `set!`
pub(crate) const RESERVED_KEYWORDS: &[&str] = &[
    "or", "not", "and", "lambda", "define", "set!", "cons", "#t", "#f", "nil", "car", "cdr",
    "list", "if", "quote", "map",
];

/// Placeholder symbol separating the two sides of a dotted pair
pub(crate) const DOT: &str = ".";

/// Check if a name can be bound by `define`/`set!`:
/// an ASCII letter followed by letters, digits or `_`, and not a reserved keyword
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_KEYWORDS.contains(&name)
}

/// Core value type of the interpreter
///
/// To build an AST, use the ergonomic helper functions:
/// - `val(42)` for values, `sym("name")` for symbols, `nil()` for empty lists
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Boolean values, written `#t` and `#f`
    Bool(bool),
    /// Exact integers and decimals
    Number(Number),
    /// Symbols (identifiers and operator names)
    Symbol(String),
    /// List expressions; the empty list is nil
    List(ConsList<Value>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Number(n) => write!(f, "{n}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(list) => write!(f, "{list}"),
        }
    }
}

impl Value {
    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    /// Check if a value is the given symbol
    pub(crate) fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Value::Symbol(s) if s == name)
    }

    /// Check if a value is shaped like `(lambda ...)`; well-formedness is checked separately
    pub(crate) fn is_lambda_form(&self) -> bool {
        matches!(self, Value::List(list) if list.car().is_some_and(|head| head.is_symbol("lambda")))
    }

    /// Check if a value is a three element `(a . b)` pair built by `cons`
    pub(crate) fn is_dotted_pair(&self) -> bool {
        matches!(self, Value::List(list) if list.len() == 3 && list.nth(1).is_some_and(|dot| dot.is_symbol(DOT)))
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<ConsList<Value>> for Value {
    fn from(list: ConsList<Value>) -> Self {
        Value::List(list)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(Number::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(i64);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

// Fallible conversions from `Value` into the payloads operators work on.

impl<'a> TryFrom<&'a Value> for &'a Number {
    type Error = Error;

    fn try_from(value: &'a Value) -> Result<&'a Number, Error> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(Error::eval(
                ErrorKind::NotANumber,
                format!("Not a number: {other}"),
            )),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = Error;

    fn try_from(value: &Value) -> Result<bool, Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::eval(
                ErrorKind::NotABoolean,
                format!("Not a boolean: {other}"),
            )),
        }
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil) - follows Lisp/Scheme conventions
pub fn nil() -> Value {
    Value::List(ConsList::nil())
}
