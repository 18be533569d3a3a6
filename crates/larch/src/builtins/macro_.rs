use super::expect_symbol;
use crate::{compile, env::Env, types::condition::EvalResult, value::Tag};

/// `(macroexpand form)`: expands until the head is no longer a macro.
pub(crate) fn macroexpand(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    compile::macroexpand(env, args[0])
}

/// `(macro-function sym)`: the expander function, or NIL.
pub(crate) fn macro_function(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "macro-function")?;
    Ok(compile::macro_function(env, sym))
}
