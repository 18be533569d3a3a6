use super::{expect_fixnum, expect_function, expect_list};
use crate::{
    env::Env,
    eval,
    types::condition::{raise, CondClass, EvalResult},
    types::cons,
    value::Tag,
};

pub(crate) fn consp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_cons()))
}

pub(crate) fn cons(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(cons::cons(&mut env.heap, args[0], args[1]))
}

pub(crate) fn car(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let list = expect_list(env, args[0], "(car)")?;
    Ok(cons::car(&env.heap, list))
}

pub(crate) fn cdr(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let list = expect_list(env, args[0], "(cdr)")?;
    Ok(cons::cdr(&env.heap, list))
}

pub(crate) fn length(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    if !args[0].is_list() {
        return raise(env, CondClass::Type, "is not a list (length)", args[0]);
    }
    let len = cons::length_checked(env, args[0])?;
    Ok(Tag::fixnum(len as i64))
}

pub(crate) fn nth(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let index = expect_fixnum(env, args[0], "(nth)")?;
    let list = expect_list(env, args[1], "(nth)")?;
    if index < 0 {
        return raise(env, CondClass::Range, "(nth)", args[0]);
    }
    Ok(cons::nth(&env.heap, list, index as usize))
}

pub(crate) fn nthcdr(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let index = expect_fixnum(env, args[0], "(nthcdr)")?;
    let list = expect_list(env, args[1], "(nthcdr)")?;
    if index < 0 {
        return raise(env, CondClass::Range, "(nthcdr)", args[0]);
    }
    Ok(cons::nthcdr(&env.heap, list, index as usize))
}

/// `(mapc fn list)`: applies for effect, returns the list.
pub(crate) fn mapc(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (mapc)")?;
    let list = expect_list(env, args[1], "is not a list (mapc)")?;
    for element in cons::list_to_vec(&env.heap, list) {
        eval::funcall(env, func, &[element])?;
    }
    Ok(list)
}

/// `(mapcar fn list)`: collects the results into a fresh list.
pub(crate) fn mapcar(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (mapcar)")?;
    let list = expect_list(env, args[1], "is not a list (mapcar)")?;
    let mut results = Vec::new();
    for element in cons::list_to_vec(&env.heap, list) {
        results.push(eval::funcall(env, func, &[element])?);
    }
    Ok(cons::list(&mut env.heap, &results))
}

/// `(mapl fn list)`: applies to successive tails for effect.
pub(crate) fn mapl(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (mapl)")?;
    let list = expect_list(env, args[1], "is not a list (mapl)")?;
    let mut cursor = list;
    while cursor.is_cons() {
        eval::funcall(env, func, &[cursor])?;
        cursor = cons::cdr(&env.heap, cursor);
    }
    Ok(list)
}

/// `(maplist fn list)`: collects the results over successive tails.
pub(crate) fn maplist(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (maplist)")?;
    let list = expect_list(env, args[1], "is not a list (maplist)")?;
    let mut results = Vec::new();
    let mut cursor = list;
    while cursor.is_cons() {
        results.push(eval::funcall(env, func, &[cursor])?);
        cursor = cons::cdr(&env.heap, cursor);
    }
    Ok(cons::list(&mut env.heap, &results))
}
