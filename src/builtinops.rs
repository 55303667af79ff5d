//! Built-in operations registry.
//!
//! Every operator the evaluator knows by name lives in one table, together with its
//! arity and how its operands are treated:
//!
//! - **Functions**: all operands are evaluated before application (e.g. `+`, `not`, `car`)
//! - **Special Forms**: receive their operands unevaluated (e.g. `if`, `and`, `define`)
//!
//! ```scheme
//! (not #t)                 ; logical negation
//! (+ 1 2 3)                ; arithmetic
//! (< 1 2 3)                ; chained comparison
//! (cons 1 (list 2 3))      ; list construction
//! ```
//!
//! ## Error Handling
//!
//! Operators are strict: `(not 42)` is `NotABoolean`, `(+ 1 #t)` is `NotANumber`, and
//! there is no truthiness. Arity is validated by the evaluator before dispatch, so an
//! implementation only ever sees operand counts its [`Arity`] allows.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** following the signature `fn(args: &[Value]) -> Result<Value, Error>`
//!    (or the special form signature taking the environment and the current depth)
//! 2. **Add to BUILTIN_OPS** with its Scheme identifier and arity
//! 3. **Reserve the name** in `ast::RESERVED_KEYWORDS` if it must not be rebound
//! 4. **Add tests** covering edge cases and error conditions

use crate::ast::{DOT, Value, sym};
use crate::conslist::ConsList;
use crate::evaluator::{
    Environment, eval_and, eval_define, eval_if, eval_lambda, eval_map, eval_or, eval_quote,
    eval_set,
};
use crate::number::Number;
use crate::{Error, ErrorKind};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Signature of a special form: unevaluated operands, the environment and the current depth
pub(crate) type SpecialFormFn = fn(&[Value], &mut Environment, usize) -> Result<Value, Error>;

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone)]
pub enum OpKind {
    /// Regular function that takes evaluated arguments and returns a value
    Function(fn(&[Value]) -> Result<Value, Error>),
    /// Special form that requires access to the environment, unevaluated arguments and current evaluation stack depth
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Number of operands an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many
    Exact(usize),
    /// This many or more
    AtLeast(usize),
    /// Inclusive bounds
    Range(usize, usize),
}

impl Arity {
    /// Check an operand count, failing with `InvalidNumberOfOperands`
    pub(crate) fn validate(&self, count: usize) -> Result<(), Error> {
        let ok = match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(min) => count >= min,
            Arity::Range(min, max) => (min..=max).contains(&count),
        };
        if ok { Ok(()) } else { Err(Error::operand_count()) }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The Scheme identifier for this operation
    pub scheme_id: &'static str,
    /// The implementation of this operation (function or special form)
    pub op_kind: OpKind,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Compare operations by their scheme_id, which uniquely identifies them
        self.scheme_id == other.scheme_id
    }
}

impl BuiltinOp {
    /// Check if this operation is a special form
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    /// Check if the given number of arguments is valid for this operation
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Builtin Function Implementations
//

/// View every operand as a number, failing on the first one that is not
fn numbers(args: &[Value]) -> Result<Vec<&Number>, Error> {
    args.iter().map(<&Number>::try_from).collect()
}

// Macro to generate chained numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $holds:ident) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            // Every operand is checked before any comparison is made
            let numbers = numbers(args)?;
            Ok(Value::Bool(
                numbers
                    .windows(2)
                    .all(|pair| pair[0].compare(pair[1]).$holds()),
            ))
        }
    };
}

numeric_comparison!(builtin_eq, is_eq);
numeric_comparison!(builtin_lt, is_lt);
numeric_comparison!(builtin_le, is_le);
numeric_comparison!(builtin_gt, is_gt);
numeric_comparison!(builtin_ge, is_ge);

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let sum = numbers(args)?
        .into_iter()
        .fold(Number::from(0), |acc, n| acc.add(n));
    Ok(Value::Number(sum))
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let product = numbers(args)?
        .into_iter()
        .fold(Number::from(1), |acc, n| acc.multiply(n));
    Ok(Value::Number(product))
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    match numbers(args)?.as_slice() {
        [n] => Ok(Value::Number(n.negate())),
        [a, b] => Ok(Value::Number(a.subtract(b))),
        _ => Err(Error::operand_count()),
    }
}

fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    match numbers(args)?.as_slice() {
        [n] => n.reciprocal().map(Value::Number),
        [a, b] => a.divide(b).map(Value::Number),
        _ => Err(Error::operand_count()),
    }
}

fn builtin_not(args: &[Value]) -> Result<Value, Error> {
    match args {
        [operand] => Ok(Value::Bool(!bool::try_from(operand)?)),
        _ => Err(Error::operand_count()),
    }
}

/// A list tail is spliced; anything else makes a dotted pair
fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    match args {
        [head, Value::List(tail)] => Ok(Value::List(tail.prepend(head.clone()))),
        [left, right] => Ok(Value::List(ConsList::from(vec![
            left.clone(),
            sym(DOT),
            right.clone(),
        ]))),
        _ => Err(Error::operand_count()),
    }
}

fn not_a_cons(value: &Value) -> Error {
    Error::eval(ErrorKind::NotACons, format!("{value} is not a cons"))
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match args {
        [Value::List(list)] if !list.is_empty() => {
            list.car().cloned().ok_or_else(|| not_a_cons(&args[0]))
        }
        [other] => Err(not_a_cons(other)),
        _ => Err(Error::operand_count()),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    match args {
        // (a . b) yields b
        [pair @ Value::List(list)] if pair.is_dotted_pair() => {
            list.nth(2).cloned().ok_or_else(|| not_a_cons(pair))
        }
        [Value::List(list)] if !list.is_empty() => Ok(Value::List(list.cdr())),
        [other] => Err(not_a_cons(other)),
        _ => Err(Error::operand_count()),
    }
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.iter().cloned().collect()))
}

/// Global registry of all built-in operations
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Boolean operations
        BuiltinOp {
            scheme_id: "and",
            op_kind: OpKind::SpecialForm(eval_and),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            scheme_id: "or",
            op_kind: OpKind::SpecialForm(eval_or),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            scheme_id: "not",
            op_kind: OpKind::Function(builtin_not),
            arity: Arity::Exact(1),
        },
        // Comparison operations
        BuiltinOp {
            scheme_id: "=",
            op_kind: OpKind::Function(builtin_eq),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "<",
            op_kind: OpKind::Function(builtin_lt),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "<=",
            op_kind: OpKind::Function(builtin_le),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: ">",
            op_kind: OpKind::Function(builtin_gt),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: ">=",
            op_kind: OpKind::Function(builtin_ge),
            arity: Arity::AtLeast(2),
        },
        // Arithmetic operations
        BuiltinOp {
            scheme_id: "+",
            op_kind: OpKind::Function(builtin_add),
            arity: Arity::AtLeast(0),
        },
        BuiltinOp {
            scheme_id: "-",
            op_kind: OpKind::Function(builtin_sub),
            arity: Arity::Range(1, 2),
        },
        BuiltinOp {
            scheme_id: "*",
            op_kind: OpKind::Function(builtin_mul),
            arity: Arity::AtLeast(0),
        },
        BuiltinOp {
            scheme_id: "/",
            op_kind: OpKind::Function(builtin_div),
            arity: Arity::Range(1, 2),
        },
        // List operations
        BuiltinOp {
            scheme_id: "cons",
            op_kind: OpKind::Function(builtin_cons),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "car",
            op_kind: OpKind::Function(builtin_car),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "cdr",
            op_kind: OpKind::Function(builtin_cdr),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "list",
            op_kind: OpKind::Function(builtin_list),
            arity: Arity::AtLeast(0),
        },
        BuiltinOp {
            scheme_id: "map",
            op_kind: OpKind::SpecialForm(eval_map),
            arity: Arity::Exact(2),
        },
        // Special forms
        BuiltinOp {
            scheme_id: "quote",
            op_kind: OpKind::SpecialForm(eval_quote),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "if",
            op_kind: OpKind::SpecialForm(eval_if),
            arity: Arity::Exact(3),
        },
        BuiltinOp {
            scheme_id: "define",
            op_kind: OpKind::SpecialForm(eval_define),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "set!",
            op_kind: OpKind::SpecialForm(eval_set),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "lambda",
            op_kind: OpKind::SpecialForm(eval_lambda),
            arity: Arity::Exact(2),
        },
    ]
});

/// Lazy static map from scheme_id to BuiltinOp
static SCHEME_OPS: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.scheme_id, op)).collect());

/// Find a builtin operation by its Scheme identifier
pub fn find_scheme_op(scheme_id: &str) -> Option<&'static BuiltinOp> {
    SCHEME_OPS.get(scheme_id).copied()
}

/// All builtin operations, in registry order
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    &BUILTIN_OPS
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, val};
    use pretty_assertions::assert_eq;

    fn dec(text: &str) -> Value {
        Value::Number(text.parse().unwrap())
    }

    fn call(id: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_scheme_op(id).unwrap();
        op.validate_arity(args.len())?;
        match op.op_kind {
            OpKind::Function(f) => f(args),
            OpKind::SpecialForm(_) => panic!("{id} is a special form"),
        }
    }

    #[test]
    fn test_registry_lookup() {
        for op in get_builtin_ops() {
            assert_eq!(find_scheme_op(op.scheme_id), Some(op));
        }
        assert!(find_scheme_op("if").unwrap().is_special_form());
        assert!(find_scheme_op("map").unwrap().is_special_form());
        assert!(!find_scheme_op("car").unwrap().is_special_form());
        assert!(find_scheme_op("foo").is_none());
        assert!(find_scheme_op("equal?").is_none());
    }

    #[test]
    fn test_arity_validation() {
        let cases = [
            (Arity::Exact(2), 2, true),
            (Arity::Exact(2), 1, false),
            (Arity::Exact(2), 3, false),
            (Arity::AtLeast(0), 0, true),
            (Arity::AtLeast(2), 1, false),
            (Arity::AtLeast(2), 9, true),
            (Arity::Range(1, 2), 0, false),
            (Arity::Range(1, 2), 1, true),
            (Arity::Range(1, 2), 2, true),
            (Arity::Range(1, 2), 3, false),
        ];
        for (arity, count, ok) in cases {
            let result = arity.validate(count);
            assert_eq!(result.is_ok(), ok, "{arity:?} with {count} operands");
            if let Err(e) = result {
                assert_eq!(e.kind(), ErrorKind::InvalidNumberOfOperands);
            }
        }
    }

    #[test]
    fn test_builtin_functions_data_driven() {
        // (operator, operands, expected result or error kind)
        let cases: Vec<(&str, Vec<Value>, Result<Value, ErrorKind>)> = vec![
            ("+", vec![], Ok(val(0))),
            ("*", vec![], Ok(val(1))),
            ("+", vec![val(1), val(2), val(3)], Ok(val(6))),
            ("+", vec![val(1), dec("0.5")], Ok(dec("1.5"))),
            ("*", vec![dec("1.5"), val(2)], Ok(dec("3.0"))),
            ("-", vec![val(5)], Ok(val(-5))),
            ("-", vec![val(5), val(3)], Ok(val(2))),
            ("-", vec![], Err(ErrorKind::InvalidNumberOfOperands)),
            ("-", vec![val(1), val(2), val(3)], Err(ErrorKind::InvalidNumberOfOperands)),
            ("/", vec![val(7), val(2)], Ok(val(3))),
            ("/", vec![val(2)], Ok(val(0))),
            ("/", vec![dec("4.0")], Ok(dec("0.25"))),
            ("/", vec![val(1), val(0)], Err(ErrorKind::DivisionByZero)),
            ("/", vec![], Err(ErrorKind::InvalidNumberOfOperands)),
            ("+", vec![val(1), val(true)], Err(ErrorKind::NotANumber)),
            ("=", vec![val(2), dec("2.0")], Ok(val(true))),
            ("<", vec![val(1), val(2), val(3)], Ok(val(true))),
            ("<", vec![val(1), val(3), val(2)], Ok(val(false))),
            ("<=", vec![val(1), val(1), val(2)], Ok(val(true))),
            (">", vec![val(3), val(2)], Ok(val(true))),
            (">=", vec![val(2), val(3)], Ok(val(false))),
            ("<", vec![val(1)], Err(ErrorKind::InvalidNumberOfOperands)),
            ("<", vec![val(2), val(1), val(true)], Err(ErrorKind::NotANumber)),
            ("not", vec![val(true)], Ok(val(false))),
            ("not", vec![val(0)], Err(ErrorKind::NotABoolean)),
            ("list", vec![], Ok(nil())),
            ("list", vec![val(1), val(true)], Ok(val(vec![val(1), val(true)]))),
            ("cons", vec![val(1), val([2, 3])], Ok(val([1, 2, 3]))),
            ("cons", vec![val(1), nil()], Ok(val([1]))),
            ("cons", vec![val(1), val(2)], Ok(val(vec![val(1), sym("."), val(2)]))),
            ("car", vec![val([1, 2])], Ok(val(1))),
            ("car", vec![nil()], Err(ErrorKind::NotACons)),
            ("car", vec![val(1)], Err(ErrorKind::NotACons)),
            ("cdr", vec![val([1, 2, 3])], Ok(val([2, 3]))),
            ("cdr", vec![val([1])], Ok(nil())),
            ("cdr", vec![val(vec![val(1), sym("."), val(2)])], Ok(val(2))),
            ("cdr", vec![nil()], Err(ErrorKind::NotACons)),
            ("cdr", vec![val(false)], Err(ErrorKind::NotACons)),
        ];

        for (i, (id, args, expected)) in cases.into_iter().enumerate() {
            let actual = call(id, &args).map_err(|e| e.kind());
            assert_eq!(actual, expected, "case #{} ({id} {args:?})", i + 1);
        }
    }
}
