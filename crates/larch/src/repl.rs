use crate::{
    compile,
    env::Env,
    eval, read,
    types::symbol,
};

/// The interactive loop: read a form from standard input, evaluate, print.
///
/// Conditions escaping a form print their diagnostic to the error-output
/// stream and the loop resumes; `(exit n)` ends the loop with `n`; end of
/// input ends it with 0.
pub fn run_repl(env: &mut Env) -> i32 {
    loop {
        let stdin = symbol::value_of(&env.heap, env.standard_input);
        if !env.is_stream(stdin) || env.stream_is_eof(stdin) {
            return 0;
        }

        let step = env.with_condition(|env| {
            let stdin = symbol::value_of(&env.heap, env.standard_input);
            let result = read::read_form(env, stdin)
                .and_then(|form| compile::compile(env, form))
                .and_then(|compiled| eval::eval(env, compiled));
            let value = env.host(result)?;
            env.print(value, true);
            env.terpri();
            Ok(())
        });
        if let Err(code) = step {
            return code;
        }
    }
}
