//! S-expression reader.
//!
//! The reader is a small recursive-descent state machine over the trimmed input. It
//! keeps a cursor (the unread suffix of the input), the current nesting depth and
//! the top-level items read so far. Items are recognised from their first character,
//! always in this order:
//!
//! 1. `#` starts a boolean (`#t` / `#f`, case-insensitive)
//! 2. `(` starts a list, `)` without an opening parenthesis is an error
//! 3. a digit starts a number
//! 4. a letter or one of `+ - * / < > =` starts a symbol, except that `-` directly
//!    followed by a digit or `.` starts a negative number
//!
//! Token boundaries are found with `nom` combinators.

use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::{char, multispace0, not_line_ending},
    sequence::preceded,
};
use tracing::trace;

use crate::ast::Value;
use crate::number::Number;
use crate::{Error, ErrorKind, MAX_PARSE_DEPTH, ParseError};

/// Operators that make no sense without operands: `(<)` is rejected while reading
const COMPARISON_OPERATORS: &[&str] = &["<", ">", "<=", ">=", "="];

/// Configuration for the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Treat `;` as the start of a comment running to the end of the line
    pub handle_comments: bool,
    /// Maximum list nesting depth
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: false,
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=')
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '.' | 'e' | 'E')
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// Split off the longest prefix whose characters satisfy `pred`
fn take_token(input: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let parsed: IResult<&str, &str> = take_while(pred).parse(input);
    parsed.unwrap_or((input, ""))
}

fn skip_space(input: &str) -> &str {
    let parsed: IResult<&str, &str> = multispace0(input);
    parsed.map_or(input, |(rest, _)| rest)
}

fn skip_comment(input: &str) -> Option<&str> {
    let parsed: IResult<&str, &str> = preceded(char(';'), not_line_ending).parse(input);
    parsed.ok().map(|(rest, _)| rest)
}

struct Reader<'a> {
    input: &'a str,
    rest: &'a str,
    depth: usize,
    config: ParseConfig,
    items: Vec<Value>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str, config: ParseConfig) -> Self {
        let input = input.trim();
        Reader {
            input,
            rest: input,
            depth: 0,
            config,
            items: Vec::new(),
        }
    }

    fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    fn is_exhausted(&self) -> bool {
        self.rest.is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>, found: Option<String>) -> Error {
        ParseError::with_context_and_found(kind, message, self.input, self.offset(), found).into()
    }

    fn skip_whitespace(&mut self) {
        loop {
            self.rest = skip_space(self.rest);
            match self.config.handle_comments.then(|| skip_comment(self.rest)).flatten() {
                Some(rest) => self.rest = rest,
                None => break,
            }
        }
    }

    /// Read one complete item at the cursor. Top-level items are also recorded.
    fn read_item(&mut self) -> Result<Value, Error> {
        self.skip_whitespace();
        let Some(first) = self.peek() else {
            return Err(self.error(ErrorKind::MisformedExpression, "Empty expression", None));
        };
        trace!(offset = self.offset(), lookahead = %first, "reading item");

        let item = match first {
            '#' => self.read_boolean()?,
            '(' => self.read_list()?,
            ')' => {
                return Err(self.error(
                    ErrorKind::NoOpeningParenthesis,
                    "No opening parenthesis!",
                    Some(")".to_owned()),
                ));
            }
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_alphabetic() || is_operator_char(c) => {
                if c == '-' && self.starts_negative_number() {
                    self.read_number()?
                } else {
                    self.read_symbol()
                }
            }
            other => {
                return Err(self.error(
                    ErrorKind::UnexpectedCharacter,
                    format!("Unexpected character: '{other}'"),
                    Some(other.to_string()),
                ));
            }
        };

        if self.depth == 0 {
            self.items.push(item.clone());
        }
        Ok(item)
    }

    /// `-` followed by a digit or `.` is a sign, not the subtraction operator
    fn starts_negative_number(&self) -> bool {
        self.rest
            .chars()
            .nth(1)
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
    }

    fn read_boolean(&mut self) -> Result<Value, Error> {
        let (rest, token) = take_token(self.rest, |c| !is_delimiter(c));
        let value = match token.to_ascii_lowercase().as_str() {
            "#t" => Value::Bool(true),
            "#f" => Value::Bool(false),
            _ => {
                return Err(self.error(
                    ErrorKind::InvalidBoolean,
                    "Invalid boolean representation",
                    Some(token.to_owned()),
                ));
            }
        };
        self.rest = rest;
        Ok(value)
    }

    fn read_number(&mut self) -> Result<Value, Error> {
        let (rest, token) = take_token(self.rest, is_number_char);
        if rest.chars().next().is_some_and(|c| !is_delimiter(c)) {
            let (_, whole) = take_token(self.rest, |c| !is_delimiter(c));
            return Err(self.error(
                ErrorKind::NotANumber,
                "Not a number",
                Some(whole.to_owned()),
            ));
        }
        let number: Number = token
            .parse()
            .map_err(|_| self.error(ErrorKind::NotANumber, "Not a number", Some(token.to_owned())))?;
        self.rest = rest;
        Ok(Value::Number(number))
    }

    fn read_symbol(&mut self) -> Value {
        let (rest, token) = take_token(self.rest, |c| !is_delimiter(c));
        self.rest = rest;
        Value::Symbol(token.to_owned())
    }

    fn read_list(&mut self) -> Result<Value, Error> {
        if self.depth >= self.config.max_depth {
            return Err(self.error(
                ErrorKind::TooDeeplyNested,
                format!(
                    "Expression too deeply nested (max depth: {})",
                    self.config.max_depth
                ),
                None,
            ));
        }
        let start = self.offset();
        self.rest = &self.rest[1..]; // '('
        self.depth += 1;

        let mut elements = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(ParseError::with_context(
                        ErrorKind::MisformedExpression,
                        "Misformed Expression",
                        self.input,
                        start,
                    )
                    .into());
                }
                Some(')') => {
                    self.rest = &self.rest[1..];
                    break;
                }
                Some(_) => elements.push(self.read_item()?),
            }
        }
        self.depth -= 1;

        if let [Value::Symbol(op)] = elements.as_slice()
            && COMPARISON_OPERATORS.contains(&op.as_str())
        {
            return Err(ParseError::with_context_and_found(
                ErrorKind::InvalidNumberOfOperands,
                "Invalid number of operands",
                self.input,
                start,
                Some(format!("({op})")),
            )
            .into());
        }

        Ok(Value::List(elements.into_iter().collect()))
    }
}

/// Parse exactly one S-expression; anything but whitespace after it is an error.
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    parse_scheme_with_config(input, ParseConfig::default())
}

/// Parse exactly one S-expression with the given configuration
pub fn parse_scheme_with_config(input: &str, config: ParseConfig) -> Result<Value, Error> {
    let mut reader = Reader::new(input, config);
    let value = reader.read_item()?;
    reader.skip_whitespace();
    if !reader.is_exhausted() {
        let offset = reader.offset();
        // A stray token reports its own error first (e.g. an unmatched ')')
        reader.read_item()?;
        return Err(ParseError::with_context(
            ErrorKind::UnexpectedDataAfterParse,
            "Unexpected data after the expression",
            reader.input,
            offset,
        )
        .into());
    }
    Ok(value)
}

/// Read every top-level S-expression in the input, in order.
/// Input holding only whitespace (or comments) yields no items.
pub fn parse_scheme_all(input: &str, config: ParseConfig) -> Result<Vec<Value>, Error> {
    let mut reader = Reader::new(input, config);
    loop {
        reader.skip_whitespace();
        if reader.is_exhausted() {
            return Ok(reader.items);
        }
        reader.read_item()?;
    }
}
