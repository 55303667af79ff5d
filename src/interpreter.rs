//! The `parse` / `evaluate` / `eval` entry points.
//!
//! An [`Interpreter`] owns one [`Environment`]; definitions made through one call stay
//! visible to the next, and nothing is rolled back when a call fails.
//!
//! ```
//! use minilisp::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.eval("(define double (lambda (n) (* 2 n)))").unwrap();
//! assert_eq!(interpreter.eval("(double 21)").unwrap().to_string(), "42");
//! ```

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{self, Environment, EvalConfig};
use crate::scheme::{ParseConfig, parse_scheme_all, parse_scheme_with_config};

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    env: Environment,
    parse_config: ParseConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(parse_config: ParseConfig, eval_config: EvalConfig) -> Self {
        Interpreter {
            env: Environment::with_config(eval_config),
            parse_config,
        }
    }

    /// Parse exactly one top-level expression
    pub fn parse(&self, text: &str) -> Result<Value, Error> {
        parse_scheme_with_config(text, self.parse_config)
    }

    pub fn evaluate(&mut self, expr: &Value) -> Result<Value, Error> {
        evaluator::eval(expr, &mut self.env)
    }

    /// Parse and evaluate one expression
    pub fn eval(&mut self, text: &str) -> Result<Value, Error> {
        let expr = self.parse(text)?;
        self.evaluate(&expr)
    }

    /// Parse every top-level expression in `text` and evaluate them in order,
    /// stopping at the first failure
    pub fn eval_all(&mut self, text: &str) -> Result<Vec<Value>, Error> {
        parse_scheme_all(text, self.parse_config)?
            .iter()
            .map(|expr| self.evaluate(expr))
            .collect()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}
