//! minilisp - a small Scheme-like interpreter
//!
//! This crate reads a textual S-expression, turns it into a [`ast::Value`] tree and
//! evaluates that tree against a mutable per-interpreter environment:
//!
//! ```scheme
//! (+ 1 2 3)                              ; arithmetic on exact integers
//! (* 1.5 2)                              ; decimals, no binary floating point
//! (if (> 3 2) #t #f)                     ; conditionals
//! (car (cons 1 (list 2 3)))              ; list operations
//! (define double (lambda (n) (* 2 n)))   ; user functions
//! (map double (list 1 2 3))
//! ```
//!
//! ## Semantics
//!
//! - Numbers are either exact arbitrary-precision integers or arbitrary-precision
//!   decimals. Integer-only arithmetic stays exact; mixing in a decimal promotes.
//! - Boolean operators require actual booleans (no "truthiness").
//! - Lists are persistent cons lists: operations build new lists and never mutate
//!   shared structure.
//! - `define` never rebinds an existing name, `set!` only rebinds existing ones.
//! - Functions are not closures: a function body sees its own parameters and the
//!   globals. How parameters are bound across nested calls is chosen with
//!   [`evaluator::CallModel`].
//!
//! ## Modules
//!
//! - `conslist`: the persistent list
//! - `number`: the numeric tower
//! - `ast`: the runtime value model
//! - `scheme`: S-expression parsing from text
//! - `evaluator`: the environment and the evaluation engine
//! - `builtinops`: operator registry (functions and special forms)
//! - `interpreter`: the `parse` / `evaluate` / `eval` entry points

use std::fmt;

/// Default maximum parsing depth, prevents stack overflow on deeply nested input
pub const MAX_PARSE_DEPTH: usize = 128;

/// Default maximum evaluation depth.
/// Set higher than parse depth to allow for nested function applications, and low
/// enough that a debug build trips it before exhausting a 2 MiB thread stack
pub const MAX_EVAL_DEPTH: usize = 256;

/// Every way parsing or evaluation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `#` not followed by exactly `t` or `f`
    InvalidBoolean,
    /// A character that cannot start any item
    UnexpectedCharacter,
    /// Unterminated list or empty input
    MisformedExpression,
    /// A `)` without a matching `(`
    NoOpeningParenthesis,
    /// Operator applied to the wrong number of operands
    InvalidNumberOfOperands,
    /// Malformed numeric literal, or a non-number where a number is required
    NotANumber,
    /// A non-boolean where a boolean is required
    NotABoolean,
    /// `car`/`cdr` (or `map`) applied to something that is not a non-empty list
    NotACons,
    /// Invalid or reserved identifier, or an attempt to redefine a name
    InvalidIdentifier,
    /// Unknown symbol
    UndefinedVariable,
    DivisionByZero,
    /// A list head that is a list but not a lambda form
    InvalidImbricatedExpression,
    /// A list head symbol that names neither an operator nor a function
    UnsupportedOperator,
    /// More input after the first complete top-level item
    UnexpectedDataAfterParse,
    /// A list head that is neither a symbol nor a list
    InvalidExpression,
    /// Input nesting exceeded the configured parse depth
    TooDeeplyNested,
    /// Evaluation recursion exceeded the configured evaluation depth
    DepthLimitExceeded,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a ParseError with all fields
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a ParseError with context extracted from input at a given offset
    pub fn with_context(
        kind: ErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        Self::with_context_and_found(kind, message, input, error_offset, None)
    }

    /// Create a ParseError with context and found token
    pub fn with_context_and_found(
        kind: ErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Offsets are byte offsets; show up to 20 characters before the error
        let prefix_chars = input
            .get(..error_offset)
            .map_or(0, |prefix| prefix.chars().count());
        let context_start = prefix_chars.saturating_sub(20);

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, "\nFound: {found}")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Error type for the interpreter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    ParseError(#[from] ParseError),
    #[error("{message}")]
    EvalError { kind: ErrorKind, message: String },
}

impl Error {
    /// Create an evaluation error of the given kind
    pub fn eval(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error::EvalError {
            kind,
            message: message.into(),
        }
    }

    /// The wrong number of operands was given to an operator
    pub fn operand_count() -> Self {
        Self::eval(ErrorKind::InvalidNumberOfOperands, "Invalid number of operands")
    }

    pub fn undefined(name: &str) -> Self {
        Self::eval(ErrorKind::UndefinedVariable, format!("{name} is undefined"))
    }

    pub fn invalid_identifier(name: impl fmt::Display) -> Self {
        Self::eval(
            ErrorKind::InvalidIdentifier,
            format!("{name} is not a valid identifier"),
        )
    }

    /// The kind of failure, regardless of which phase produced it
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ParseError(e) => e.kind,
            Error::EvalError { kind, .. } => *kind,
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod conslist;
pub mod evaluator;
pub mod interpreter;
pub mod number;
pub mod scheme;

pub use ast::Value;
pub use conslist::ConsList;
pub use evaluator::{CallModel, Environment, EvalConfig};
pub use interpreter::Interpreter;
pub use number::Number;
pub use scheme::ParseConfig;
