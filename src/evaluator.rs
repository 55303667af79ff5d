use crate::ast::{Value, is_valid_identifier, nil, sym};
use crate::builtinops::{OpKind, find_scheme_op};
use crate::conslist::ConsList;
use crate::{Error, ErrorKind, MAX_EVAL_DEPTH};
use std::collections::HashMap;
use tracing::debug;

/// How parameter bindings are kept while user functions run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallModel {
    /// Every call pushes a fresh frame that is popped on return, so nested and
    /// recursive calls each see their own parameters.
    #[default]
    Frames,
    /// One parameter map per function name, overwritten by every call and never
    /// restored. An argument written exactly as the parameter it feeds is not
    /// re-evaluated. Recursive functions that read a parameter after a recursive
    /// call see the inner call's binding.
    SharedContext,
}

/// Evaluation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub call_model: CallModel,
    /// Deeper evaluation fails with `DepthLimitExceeded`
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            call_model: CallModel::default(),
            max_depth: MAX_EVAL_DEPTH,
        }
    }
}

/// A user-defined function: distinct parameter names and an unevaluated body
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    params: Vec<String>,
    body: Value,
}

impl Function {
    /// Validate a `(lambda (params) body)` form
    pub(crate) fn from_lambda(form: &Value) -> Result<Function, Error> {
        let Value::List(elements) = form else {
            return Err(not_a_function(form));
        };
        match elements.to_vec().as_slice() {
            [head, Value::List(params), body] if head.is_symbol("lambda") => {
                let mut names: Vec<String> = Vec::with_capacity(params.len());
                for param in params {
                    match param {
                        Value::Symbol(name) if !names.contains(name) => names.push(name.clone()),
                        other => return Err(Error::invalid_identifier(other)),
                    }
                }
                Ok(Function {
                    params: names,
                    body: body.clone(),
                })
            }
            [head, params, _] if head.is_symbol("lambda") => Err(Error::eval(
                ErrorKind::InvalidIdentifier,
                format!("{params} is not a parameter list"),
            )),
            [head, ..] if head.is_symbol("lambda") => Err(Error::operand_count()),
            _ => Err(not_a_function(form)),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The `(lambda (params) body)` form this function was built from
    pub fn to_lambda(&self) -> Value {
        let params: ConsList<Value> = self.params.iter().map(sym).collect();
        Value::List(ConsList::from(vec![
            sym("lambda"),
            Value::List(params),
            self.body.clone(),
        ]))
    }
}

fn not_a_function(value: &Value) -> Error {
    Error::eval(
        ErrorKind::UnsupportedOperator,
        format!("{value} is not a function"),
    )
}

type Bindings = HashMap<String, Value>;

/// Parameter bindings of the functions currently running
#[derive(Debug, Clone)]
enum CallContext {
    Frames(Vec<Bindings>),
    Shared {
        contexts: HashMap<String, Bindings>,
        /// Keys of the running calls, innermost last
        active: Vec<String>,
    },
}

impl CallContext {
    fn new(model: CallModel) -> Self {
        match model {
            CallModel::Frames => CallContext::Frames(Vec::new()),
            CallModel::SharedContext => CallContext::Shared {
                contexts: HashMap::new(),
                active: Vec::new(),
            },
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        match self {
            CallContext::Frames(frames) => frames.last()?.get(name),
            CallContext::Shared { contexts, active } => contexts.get(active.last()?)?.get(name),
        }
    }

    /// Make `bindings` the active context for a call of `function`.
    /// `None` leaves the previous binding of that parameter in place.
    fn enter(&mut self, function: &str, bindings: Vec<(String, Option<Value>)>) {
        let bound = bindings
            .into_iter()
            .filter_map(|(param, value)| value.map(|value| (param, value)));
        match self {
            CallContext::Frames(frames) => frames.push(bound.collect()),
            CallContext::Shared { contexts, active } => {
                contexts
                    .entry(function.to_owned())
                    .or_default()
                    .extend(bound);
                active.push(function.to_owned());
            }
        }
    }

    fn leave(&mut self) {
        match self {
            CallContext::Frames(frames) => {
                frames.pop();
            }
            CallContext::Shared { active, .. } => {
                active.pop();
            }
        }
    }
}

/// Global state of one interpreter: variables, user functions and the call context
#[derive(Debug, Clone)]
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    calls: CallContext,
    config: EvalConfig,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Environment {
            variables: HashMap::new(),
            functions: HashMap::new(),
            calls: CallContext::new(config.call_model),
            config,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Check if `name` is bound as a global variable or a user function
    pub fn is_defined(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.functions.contains_key(name)
    }

    /// Get all global bindings, functions shown as their lambda forms
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut result: Vec<_> = self
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .chain(
                self.functions
                    .iter()
                    .map(|(name, function)| (name.clone(), function.to_lambda())),
            )
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Resolve a symbol: `nil`, then the active call, then variables, then functions
    fn lookup(&self, name: &str) -> Result<Value, Error> {
        if name == "nil" {
            return Ok(nil());
        }
        if let Some(value) = self.calls.lookup(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.variables.get(name) {
            return Ok(value.clone());
        }
        self.functions
            .get(name)
            .map(Function::to_lambda)
            .ok_or_else(|| Error::undefined(name))
    }

    /// The function a head symbol calls: a parameter holding a lambda form, else a user function.
    /// A malformed lambda form in a parameter is an error, not a fallthrough.
    fn resolve_function(&self, name: &str) -> Result<Option<Function>, Error> {
        if let Some(value) = self.calls.lookup(name)
            && value.is_lambda_form()
        {
            return Function::from_lambda(value).map(Some);
        }
        Ok(self.functions.get(name).cloned())
    }

    /// Bind a global name, moving it between the variable and function tables
    /// according to the value. Lambda forms become functions.
    fn bind(&mut self, name: &str, value: &Value) -> Result<(), Error> {
        if value.is_lambda_form() {
            let function = Function::from_lambda(value)?;
            self.variables.remove(name);
            self.functions.insert(name.to_owned(), function);
        } else {
            self.functions.remove(name);
            self.variables.insert(name.to_owned(), value.clone());
        }
        Ok(())
    }
}

/// Evaluate an S-expression (public API)
pub fn eval(expr: &Value, env: &mut Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate an S-expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Value,
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    let max_depth = env.config.max_depth;
    if depth >= max_depth {
        return Err(Error::eval(
            ErrorKind::DepthLimitExceeded,
            format!("Evaluation depth limit exceeded (max: {max_depth})"),
        ));
    }
    match expr {
        // Self-evaluating forms
        Value::Bool(_) | Value::Number(_) => Ok(expr.clone()),

        Value::Symbol(name) => env.lookup(name),

        // The empty list is nil, anything else is an application
        Value::List(elements) => match elements.car() {
            None => Ok(expr.clone()),
            Some(head) => eval_list(head, &elements.cdr().to_vec(), env, depth),
        },
    }
}

/// Helper function to evaluate a list of argument expressions with depth tracking
fn eval_args(args: &[Value], env: &mut Environment, depth: usize) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
        .collect()
}

/// Evaluate a non-empty list expression, dispatching on its head
fn eval_list(
    head: &Value,
    operands: &[Value],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    match head {
        Value::Symbol(name) => {
            if let Some(op) = find_scheme_op(name) {
                op.validate_arity(operands.len())?;
                match &op.op_kind {
                    OpKind::Function(f) => {
                        let args = eval_args(operands, env, depth)?;
                        f(&args)
                    }
                    // Special forms get unevaluated operands and handle their own depth tracking
                    OpKind::SpecialForm(special_form) => special_form(operands, env, depth),
                }
            } else if let Some(function) = env.resolve_function(name)? {
                apply_function(name, &function, operands, env, depth)
            } else {
                Err(Error::eval(
                    ErrorKind::UnsupportedOperator,
                    format!("Unsupported operator: {name}"),
                ))
            }
        }
        // ((lambda (x) ...) arg) or an expression producing a lambda form
        Value::List(_) => {
            let form = if head.is_lambda_form() {
                head.clone()
            } else {
                eval_with_depth_tracking(head, env, depth + 1)?
            };
            if !form.is_lambda_form() {
                return Err(Error::eval(
                    ErrorKind::InvalidImbricatedExpression,
                    format!("Invalid imbricated expression: {head}"),
                ));
            }
            let function = Function::from_lambda(&form)?;
            apply_function(&form.to_string(), &function, operands, env, depth)
        }
        Value::Bool(_) | Value::Number(_) => Err(Error::eval(
            ErrorKind::InvalidExpression,
            format!("{head} is not an operator"),
        )),
    }
}

/// Bind arguments to parameters and evaluate the body. `key` names the call
/// for the shared call model.
fn apply_function(
    key: &str,
    function: &Function,
    operands: &[Value],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    if operands.len() != function.params.len() {
        return Err(Error::operand_count());
    }

    let shared = matches!(env.calls, CallContext::Shared { .. });
    let mut bindings = Vec::with_capacity(operands.len());
    for (param, arg) in function.params.iter().zip(operands) {
        // Arguments are evaluated under the caller's context
        let value = if shared && arg.is_symbol(param) {
            None
        } else {
            Some(eval_with_depth_tracking(arg, env, depth + 1)?)
        };
        bindings.push((param.clone(), value));
    }

    debug!(function = key, depth, "apply");
    env.calls.enter(key, bindings);
    let result = eval_with_depth_tracking(&function.body, env, depth + 1);
    env.calls.leave();
    result
}

/// Evaluate quote special form
pub(crate) fn eval_quote(
    args: &[Value],
    _env: &mut Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::operand_count()),
    }
}

/// Evaluate define special form
pub(crate) fn eval_define(
    args: &[Value],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            if !is_valid_identifier(name) {
                return Err(Error::invalid_identifier(name));
            }
            if env.is_defined(name) {
                return Err(Error::eval(
                    ErrorKind::InvalidIdentifier,
                    format!("{name} is already defined"),
                ));
            }
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.bind(name, &value)?;
            debug!(symbol = name.as_str(), %value, "define");
            Ok(value)
        }
        [target, _] => Err(Error::invalid_identifier(target)),
        _ => Err(Error::operand_count()),
    }
}

/// Evaluate set! special form
pub(crate) fn eval_set(args: &[Value], env: &mut Environment, depth: usize) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            if !is_valid_identifier(name) {
                return Err(Error::invalid_identifier(name));
            }
            if !env.is_defined(name) {
                return Err(Error::undefined(name));
            }
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.bind(name, &value)?;
            debug!(symbol = name.as_str(), %value, "set!");
            Ok(value)
        }
        [target, _] => Err(Error::invalid_identifier(target)),
        _ => Err(Error::operand_count()),
    }
}

/// Evaluate if special form
pub(crate) fn eval_if(args: &[Value], env: &mut Environment, depth: usize) -> Result<Value, Error> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            let condition = eval_with_depth_tracking(condition_expr, env, depth + 1)?;
            if bool::try_from(&condition)? {
                eval_with_depth_tracking(then_expr, env, depth + 1)
            } else {
                eval_with_depth_tracking(else_expr, env, depth + 1)
            }
        }
        _ => Err(Error::operand_count()),
    }
}

/// Evaluate lambda special form: validate it, then yield the form itself
pub(crate) fn eval_lambda(
    args: &[Value],
    _env: &mut Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [params, body] => {
            let form = Value::List(ConsList::from(vec![
                sym("lambda"),
                params.clone(),
                body.clone(),
            ]));
            Function::from_lambda(&form)?;
            Ok(form)
        }
        _ => Err(Error::operand_count()),
    }
}

/// Work out what `map` calls for each element. Builtin operators are called by name,
/// user functions and lambdas must take exactly one parameter.
fn map_callee(function_expr: &Value, env: &mut Environment, depth: usize) -> Result<Value, Error> {
    let (callee, function) = match function_expr {
        Value::Symbol(name) if find_scheme_op(name).is_some() => {
            return Ok(function_expr.clone());
        }
        Value::Symbol(name) => match env.resolve_function(name)? {
            Some(function) => (function_expr.clone(), function),
            None => return Err(not_a_function(function_expr)),
        },
        Value::List(_) => {
            let form = if function_expr.is_lambda_form() {
                function_expr.clone()
            } else {
                eval_with_depth_tracking(function_expr, env, depth + 1)?
            };
            if !form.is_lambda_form() {
                return Err(not_a_function(&form));
            }
            let function = Function::from_lambda(&form)?;
            (form, function)
        }
        Value::Bool(_) | Value::Number(_) => return Err(not_a_function(function_expr)),
    };
    if function.params().len() != 1 {
        return Err(Error::operand_count());
    }
    Ok(callee)
}

/// Evaluate map special form
pub(crate) fn eval_map(args: &[Value], env: &mut Environment, depth: usize) -> Result<Value, Error> {
    let [function_expr, list_expr] = args else {
        return Err(Error::operand_count());
    };
    let callee = map_callee(function_expr, env, depth)?;
    let list = match eval_with_depth_tracking(list_expr, env, depth + 1)? {
        Value::List(list) => list,
        other => {
            return Err(Error::eval(
                ErrorKind::NotACons,
                format!("{other} is not a list"),
            ));
        }
    };

    // Each element is quoted so it reaches the callee exactly as stored
    list.iter()
        .map(|element| {
            let quoted = Value::List(ConsList::from(vec![sym("quote"), element.clone()]));
            let call = Value::List(ConsList::from(vec![callee.clone(), quoted]));
            eval_with_depth_tracking(&call, env, depth + 1)
        })
        .collect::<Result<ConsList<Value>, Error>>()
        .map(Value::List)
}

macro_rules! boolean_logic_op {
    ($name:ident, $short_circuit:literal) => {
        pub(crate) fn $name(
            args: &[Value],
            env: &mut Environment,
            depth: usize,
        ) -> Result<Value, Error> {
            // Evaluate left to right, stopping at the first deciding operand
            for arg in args {
                let result = eval_with_depth_tracking(arg, env, depth + 1)?;
                if bool::try_from(&result)? == $short_circuit {
                    return Ok(Value::Bool($short_circuit));
                }
            }
            Ok(Value::Bool(!$short_circuit))
        }
    };
}

// Generate boolean logic functions
boolean_logic_op!(eval_and, false);
boolean_logic_op!(eval_or, true);
