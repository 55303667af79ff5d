use minilisp::builtinops::get_builtin_ops;
use minilisp::{Environment, EvalConfig, Interpreter, ParseConfig};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;

fn main() -> rustyline::Result<()> {
    init_tracing();

    println!("minilisp - a small Scheme-like interpreter");
    println!("Enter S-expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;
    // Comments are allowed at the prompt and in loaded files
    let parse_config = ParseConfig {
        handle_comments: true,
        ..ParseConfig::default()
    };
    let mut interpreter = Interpreter::with_config(parse_config, EvalConfig::default());

    loop {
        match rl.readline("minilisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                // Handle special commands
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(interpreter.environment());
                        continue;
                    }
                    ":quit" | ":exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                if let Some(path) = load_command(line) {
                    load_file(&mut interpreter, path);
                    continue;
                }

                match interpreter.eval(line) {
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
    Ok(())
}

/// Log to stderr only when RUST_LOG is set
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

/// The path argument of a `:load` command, or `None` if `line` is not one
fn load_command(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(":load")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn load_file(interpreter: &mut Interpreter, path: &str) {
    if path.is_empty() {
        println!("Usage: :load <file>");
        return;
    }
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            println!("Error: cannot read {path}: {e}");
            return;
        }
    };
    match interpreter.eval_all(&source) {
        Ok(results) => {
            for result in results {
                println!("{result}");
            }
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn print_help() {
    println!("minilisp commands:");
    println!("  :help        - Show this help message");
    println!("  :env         - Show current definitions");
    println!("  :load <file> - Evaluate every expression in a file");
    println!("  :quit        - Exit the interpreter (also :exit, quit)");
    println!("  Ctrl+C       - Exit the interpreter");
    println!();
    println!("Values:");
    println!("  Numbers: 42, -5, 3.14, 1.5e3 (exact integers and decimals)");
    println!("  Booleans: #t, #f");
    println!("  Lists: (list 1 2 3), (quote (a b)), nil");
    println!();
    print!("Operators:");
    for op in get_builtin_ops() {
        print!(" {}", op.scheme_id);
    }
    println!();
    println!();
    println!("Examples:");
    println!("  (+ 1 2 3)");
    println!("  (if (> 3 2) 1 0)");
    println!("  (define double (lambda (n) (* 2 n)))");
    println!("  (map double (list 1 2 3))");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    // Functions are shown as their lambda forms
    let (functions, variables): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .partition(|(name, _)| env.function(name).is_some());

    if !variables.is_empty() {
        println!("Variables ({}):", variables.len());
        for (name, value) in variables {
            println!("  {name} = {value}");
        }
    }
    if !functions.is_empty() {
        println!("Functions ({}):", functions.len());
        for (name, value) in functions {
            println!("  {name} = {value}");
        }
    }
}
