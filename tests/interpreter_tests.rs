//! Integration tests for the public interpreter API.
//!
//! Every test goes text → parse → evaluate through [`Interpreter`], the same way a
//! host application would.

#![expect(clippy::expect_used)] // test code OK

use minilisp::{CallModel, ErrorKind, EvalConfig, Interpreter, ParseConfig, Value};

/// Evaluate a sequence of expressions in one interpreter, returning the last result
fn run(sources: &[&str]) -> Result<Value, minilisp::Error> {
    let mut interpreter = Interpreter::new();
    let mut last = Value::List(minilisp::ConsList::nil());
    for source in sources {
        last = interpreter.eval(source)?;
    }
    Ok(last)
}

/// Helper to check that code evaluates and prints as expected
fn eval_ok(sources: &[&str], expected: &str) {
    let value = run(sources).expect("should evaluate successfully");
    assert_eq!(value.to_string(), expected, "evaluating {sources:?}");
}

/// Helper to check that code fails with the expected kind of error
fn eval_err(sources: &[&str], expected: ErrorKind) {
    match run(sources) {
        Err(e) => assert_eq!(e.kind(), expected, "evaluating {sources:?}: {e}"),
        Ok(v) => panic!("expected {expected:?} from {sources:?}, got {v}"),
    }
}

// =============================================================================
// Literals
// =============================================================================

mod literals {
    use super::*;

    #[test]
    fn literals_print_back_normalized() {
        let cases = [
            ("42", "42"),
            ("-7", "-7"),
            ("3.140", "3.14"),
            ("2.0", "2.0"),
            ("-0.5", "-0.5"),
            ("1.5e3", "1500.0"),
            ("#t", "#t"),
            ("#F", "#f"),
            ("(quote (1 (2 3) ()))", "(1 (2 3) ())"),
            ("nil", "()"),
        ];
        for (source, expected) in cases {
            eval_ok(&[source], expected);
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        let cases = [
            ("#x", ErrorKind::InvalidBoolean),
            ("#true", ErrorKind::InvalidBoolean),
            ("(+ 1 2", ErrorKind::MisformedExpression),
            ("", ErrorKind::MisformedExpression),
            (")", ErrorKind::NoOpeningParenthesis),
            ("1 2", ErrorKind::UnexpectedDataAfterParse),
            ("(+ 1 2))", ErrorKind::NoOpeningParenthesis),
            ("12abc", ErrorKind::NotANumber),
            ("1.2.3", ErrorKind::NotANumber),
            ("\"text\"", ErrorKind::UnexpectedCharacter),
            ("(<)", ErrorKind::InvalidNumberOfOperands),
        ];
        for (source, expected) in cases {
            eval_err(&[source], expected);
        }
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

mod arithmetic {
    use super::*;

    #[test]
    fn identities_and_operand_counts() {
        eval_ok(&["(+)"], "0");
        eval_ok(&["(*)"], "1");
        eval_err(&["(-)"], ErrorKind::InvalidNumberOfOperands);
        eval_err(&["(/)"], ErrorKind::InvalidNumberOfOperands);
    }

    #[test]
    fn basic_operations() {
        eval_ok(&["(+ 1 2 3)"], "6");
        eval_ok(&["(- 5)"], "-5");
        eval_ok(&["(- 5 3)"], "2");
        eval_ok(&["(- 3 5)"], "-2");
        eval_ok(&["(/ 9 3)"], "3");
        eval_err(&["(/ 1 0)"], ErrorKind::DivisionByZero);
    }

    #[test]
    fn exactness_and_promotion() {
        eval_ok(&["(* 99999999999 99999999999)"], "9999999999800000000001");
        eval_ok(&["(+ 1 2.5)"], "3.5");
        eval_ok(&["(* 1.5 2)"], "3.0");
        eval_ok(&["(- 0.3 0.1)"], "0.2");
        eval_ok(&["(/ 1 4.0)"], "0.25");
    }

    #[test]
    fn negative_literals_versus_minus_operator() {
        eval_ok(&["(- -3)"], "3");
        eval_ok(&["(+ -0.5 1)"], "0.5");
        eval_ok(&["(-  10 4)"], "6");
    }
}

// =============================================================================
// Control flow and lists
// =============================================================================

mod control_and_lists {
    use super::*;

    #[test]
    fn conditionals() {
        eval_ok(&["(if (> 3 2) 1 0)"], "1");
        eval_ok(&["(if #f 1 0)"], "0");
        eval_ok(&["(if (and (< 1 2) (not #f)) (quote yes) (quote no))"], "yes");
        eval_err(&["(if 0 1 2)"], ErrorKind::NotABoolean);
    }

    #[test]
    fn cons_car_cdr() {
        eval_ok(&["(car (cons 1 (list 2 3)))"], "1");
        eval_ok(&["(cdr (cons 1 (list 2 3)))"], "(2 3)");
        eval_ok(&["(cons 1 2)"], "(1 . 2)");
        eval_ok(&["(cdr (cons 1 2))"], "2");
        eval_err(&["(car (list))"], ErrorKind::NotACons);
    }

    #[test]
    fn quote_leaves_operands_unevaluated() {
        eval_ok(&["(quote (1 2 3))"], "(1 2 3)");
        eval_ok(&["(quote (undefined_a (undefined_b)))"], "(undefined_a (undefined_b))");
    }

    #[test]
    fn map_over_lists() {
        eval_ok(&["(map (lambda (x) (* x x)) (list 1 2 3))"], "(1 4 9)");
        eval_ok(&["(map cdr (quote ((1 2) (3 4))))"], "((2) (4))");
    }
}

// =============================================================================
// Definitions
// =============================================================================

mod definitions {
    use super::*;

    #[test]
    fn define_and_redefine() {
        eval_ok(&["(define x 5)", "x"], "5");
        eval_err(&["(define x 5)", "(define x 6)"], ErrorKind::InvalidIdentifier);
        eval_ok(&["(define x 5)", "(set! x 6)", "x"], "6");
        eval_err(&["(set! x 6)"], ErrorKind::UndefinedVariable);
        eval_err(&["y"], ErrorKind::UndefinedVariable);
    }

    #[test]
    fn reserved_and_malformed_names() {
        for name in ["car", "cdr", "list", "lambda", "define", "nil", "if", "x-y", "set!"] {
            let source = format!("(define {name} 1)");
            eval_err(&[source.as_str()], ErrorKind::InvalidIdentifier);
        }
    }

    #[test]
    fn user_functions() {
        eval_ok(
            &["(define double (lambda (n) (* 2 n)))", "(double 5)"],
            "10",
        );
        eval_ok(
            &["(define double (lambda (n) (* 2 n)))", "double"],
            "(lambda (n) (* 2 n))",
        );
        eval_ok(&["((lambda (a b) (- a b)) 10 4)"], "6");
        eval_err(&["(undefined_fn 1)"], ErrorKind::UnsupportedOperator);
        eval_err(&["((list 1 2) 3)"], ErrorKind::InvalidImbricatedExpression);
        eval_err(&["(5 1)"], ErrorKind::InvalidExpression);
    }

    #[test]
    fn recursion_with_call_frames() {
        eval_ok(
            &[
                "(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))",
                "(fact 20)",
            ],
            "2432902008176640000",
        );
        eval_ok(
            &[
                "(define fib (lambda (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))",
                "(fib 15)",
            ],
            "610",
        );
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn shared_context_model_reproduces_overwritten_parameters() {
        let config = EvalConfig {
            call_model: CallModel::SharedContext,
            ..EvalConfig::default()
        };
        let mut interpreter = Interpreter::with_config(ParseConfig::default(), config);
        interpreter
            .eval("(define fib (lambda (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))")
            .expect("define should succeed");
        let result = interpreter.eval("(fib 2)").expect("fib should evaluate");
        assert_eq!(result.to_string(), "0");

        // Non-recursive use is unaffected
        interpreter
            .eval("(define sq (lambda (x) (* x x)))")
            .expect("define should succeed");
        let result = interpreter.eval("(sq 12)").expect("sq should evaluate");
        assert_eq!(result.to_string(), "144");
    }

    #[test]
    fn default_depth_limit_trips_within_a_small_thread_stack() {
        let worker = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(|| {
                let mut interpreter = Interpreter::new();
                interpreter
                    .eval("(define deep (lambda (n) (if (= n 0) 0 (+ 1 (deep (- n 1))))))")
                    .expect("define should succeed");
                let shallow = interpreter.eval("(deep 50)").expect("within the limit");
                let err = interpreter.eval("(deep 1000)").expect_err("too deep");
                (shallow.to_string(), err.kind())
            })
            .expect("thread should spawn");
        let (shallow, kind) = worker.join().expect("evaluation should not overflow the stack");
        assert_eq!(shallow, "50");
        assert_eq!(kind, ErrorKind::DepthLimitExceeded);
    }

    #[test]
    fn parse_depth_limit() {
        let config = ParseConfig {
            max_depth: 4,
            ..ParseConfig::default()
        };
        let mut interpreter = Interpreter::with_config(config, EvalConfig::default());
        let ok = interpreter.eval("(+ 1 (+ 2 (+ 3 4)))").expect("within the limit");
        assert_eq!(ok.to_string(), "10");
        let err = interpreter
            .eval("(+ 1 (+ 2 (+ 3 (+ 4 (+ 5 6)))))")
            .expect_err("too deep");
        assert_eq!(err.kind(), ErrorKind::TooDeeplyNested);
    }

    #[test]
    fn comments_only_when_enabled() {
        eval_err(&["(+ 1 2) ; three"], ErrorKind::UnexpectedCharacter);

        let config = ParseConfig {
            handle_comments: true,
            ..ParseConfig::default()
        };
        let mut interpreter = Interpreter::with_config(config, EvalConfig::default());
        let value = interpreter.eval("(+ 1 2) ; three").expect("comment is skipped");
        assert_eq!(value.to_string(), "3");
    }

    #[test]
    fn environment_lists_definitions() {
        let mut interpreter = Interpreter::new();
        interpreter.eval("(define b 2)").expect("define should succeed");
        interpreter
            .eval("(define a (lambda (x) x))")
            .expect("define should succeed");
        let bindings: Vec<(String, String)> = interpreter
            .environment()
            .get_all_bindings()
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("a".to_owned(), "(lambda (x) x)".to_owned()),
                ("b".to_owned(), "2".to_owned()),
            ]
        );
    }
}
