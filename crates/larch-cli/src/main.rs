use std::process::ExitCode;

use larch::{run_repl, Env, EnvError};

const HELP: &str = "\
OVERVIEW: larch - embeddable lisp runtime
USAGE: larch [options] [src-file...]

OPTIONS:
  -h                   print this message
  -v                   print version string
  -i                   enter repl after processing arguments
  -l SRCFILE           load SRCFILE in sequence
  -e SEXPR             evaluate SEXPR and print each result
  -q SEXPR             evaluate SEXPR quietly
  src-file             load source file
";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut env = Env::new();
    let mut enter_repl = false;
    let mut files: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" => print!("{HELP}"),
            "-v" => println!("{}", Env::VERSION),
            "-i" => enter_repl = true,
            "-l" => {
                let Some(file) = iter.next() else {
                    eprintln!("larch: -l requires a file argument");
                    return ExitCode::from(2);
                };
                if let Some(code) = guard(&mut env, |env| env.load(file).map(|_| ())) {
                    return code;
                }
            }
            "-e" => {
                let Some(expr) = iter.next() else {
                    eprintln!("larch: -e requires an expression argument");
                    return ExitCode::from(2);
                };
                if let Some(code) = guard(&mut env, |env| env.eval_source(expr, true)) {
                    return code;
                }
            }
            "-q" => {
                let Some(expr) = iter.next() else {
                    eprintln!("larch: -q requires an expression argument");
                    return ExitCode::from(2);
                };
                if let Some(code) = guard(&mut env, |env| env.eval_source(expr, false)) {
                    return code;
                }
            }
            other if other.starts_with('-') => {
                eprintln!("larch: unknown option {other}");
                print!("{HELP}");
                return ExitCode::from(2);
            }
            file => files.push(file.to_owned()),
        }
    }

    for file in &files {
        if let Some(code) = guard(&mut env, |env| env.load(file).map(|_| ())) {
            return code;
        }
    }

    if enter_repl {
        return exit_code(run_repl(&mut env));
    }
    ExitCode::SUCCESS
}

/// Runs one step under the condition guard: conditions print a diagnostic
/// and processing continues, `(exit n)` stops with that code.
fn guard(env: &mut Env, step: impl FnOnce(&mut Env) -> Result<(), EnvError>) -> Option<ExitCode> {
    match env.with_condition(step) {
        Ok(_) => None,
        Err(code) => Some(exit_code(code)),
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}
