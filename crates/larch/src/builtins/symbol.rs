use super::{expect_string, expect_symbol};
use crate::{
    env::Env,
    types::condition::{raise, CondClass, EvalResult},
    types::{symbol, vector},
    value::Tag,
};

pub(crate) fn symbolp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_symbol()))
}

pub(crate) fn boundp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "(boundp)")?;
    Ok(Tag::bool(symbol::is_bound(&env.heap, sym)))
}

pub(crate) fn symbol_name(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "(symbol-name)")?;
    Ok(symbol::name_of(&env.heap, sym))
}

pub(crate) fn symbol_ns(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "(symbol-ns)")?;
    Ok(symbol::ns_of(&env.heap, sym))
}

pub(crate) fn symbol_value(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "(symbol-value)")?;
    if !symbol::is_bound(&env.heap, sym) {
        return raise(env, CondClass::Unsym, "unbound variable (symbol-value)", sym);
    }
    Ok(symbol::value_of(&env.heap, sym))
}

/// `(make-symbol name)`: a fresh uninterned, unbound symbol.
pub(crate) fn make_symbol(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let text = expect_string(env, args[0], "(make-symbol)")?;
    let name = vector::make_string(&mut env.heap, text.as_bytes());
    Ok(symbol::make_uninterned(&mut env.heap, name))
}

/// `(keyword designator)`: a keyword from a string, a symbol's name, or a
/// keyword itself.
pub(crate) fn keyword(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let arg = args[0];
    if arg.is_keyword() {
        return Ok(arg);
    }
    if arg.is_symbol() {
        let name = symbol::name_of(&env.heap, arg);
        let text = vector::string_text(&env.heap, name).unwrap_or_default();
        return symbol::make_keyword(env, &text);
    }
    let text = expect_string(env, arg, "(keyword)")?;
    symbol::make_keyword(env, &text)
}
