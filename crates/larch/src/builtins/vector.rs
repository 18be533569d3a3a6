use super::{expect_fixnum, expect_function, expect_keyword, expect_list};
use crate::{
    env::Env,
    eval,
    types::condition::{raise, CondClass, EvalResult},
    types::vector,
    value::Tag,
};

fn expect_vector(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if vector::is_vector(&env.heap, tag) {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(crate) fn vectorp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(vector::is_vector(&env.heap, args[0])))
}

pub(crate) fn list_to_vector(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let class = expect_keyword(env, args[0], "is not a vector class (list-to-vector)")?;
    let list = expect_list(env, args[1], "is not a list (list-to-vector)")?;
    vector::list_to_vector(env, class, list)
}

pub(crate) fn vector_length(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let vec = expect_vector(env, args[0], "(vector-length)")?;
    let len = vector::length(&env.heap, vec).unwrap_or(0);
    Ok(Tag::fixnum(len as i64))
}

pub(crate) fn vector_type(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let vec = expect_vector(env, args[0], "(vector-type)")?;
    let class = vector::element_class(&env.heap, vec).unwrap_or(crate::value::SysClass::T);
    Ok(class.keyword())
}

pub(crate) fn vector_ref(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let vec = expect_vector(env, args[0], "(vector-ref)")?;
    let index = expect_fixnum(env, args[1], "(vector-ref)")?;
    if index < 0 {
        return raise(env, CondClass::Range, "(vector-ref)", args[1]);
    }
    match vector::ref_element(&env.heap, vec, index as usize) {
        Some(element) => Ok(element),
        None => raise(env, CondClass::Range, "(vector-ref)", args[1]),
    }
}

/// `(vector-map fn vec)`: a fresh `:t` vector of the results.
pub(crate) fn vector_map(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (vector-map)")?;
    let vec = expect_vector(env, args[1], "is not a vector (vector-map)")?;
    let len = vector::length(&env.heap, vec).unwrap_or(0);
    let mut results = Vec::with_capacity(len);
    for index in 0..len {
        let element = vector::ref_element(&env.heap, vec, index).unwrap_or(Tag::NIL);
        results.push(eval::funcall(env, func, &[element])?);
    }
    Ok(vector::make_t_vector(&mut env.heap, results))
}

/// `(vector-mapc fn vec)`: applies for effect, returns the vector.
pub(crate) fn vector_mapc(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (vector-mapc)")?;
    let vec = expect_vector(env, args[1], "is not a vector (vector-mapc)")?;
    let len = vector::length(&env.heap, vec).unwrap_or(0);
    for index in 0..len {
        let element = vector::ref_element(&env.heap, vec, index).unwrap_or(Tag::NIL);
        eval::funcall(env, func, &[element])?;
    }
    Ok(vec)
}
