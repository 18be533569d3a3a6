use super::{expect_fixnum, expect_function, expect_list};
use crate::{
    env::Env,
    eval,
    heap::HeapData,
    types::condition::{raise, CondClass, EvalResult},
    types::{cons, vector::VectorData},
    value::Tag,
};

pub(crate) fn apply(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "is not a function (apply)")?;
    let list = expect_list(env, args[1], "is not a list (apply)")?;
    let argv = cons::list_to_vec(&env.heap, list);
    eval::funcall(env, func, &argv)
}

pub(crate) fn closure(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "closure")?;
    eval::promote_closure(env, func)
}

/// `(trampoline thunk)`: iterate a thunk until it returns a non-function.
pub(crate) fn trampoline(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let mut value = expect_function(env, args[0], "trampoline")?;
    loop {
        value = eval::funcall(env, value, &[])?;
        if !value.is_function() {
            return Ok(value);
        }
    }
}

/// `(frame-ref frame-id offset)`: reads a slot of the most recent live
/// activation carrying `frame-id`.
pub(crate) fn frame_ref(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let frame_id = expect_fixnum(env, args[0], "frame-ref")?;
    let offset = expect_fixnum(env, args[1], "frame-ref")?;
    let Some(argv) = env.cache_top(frame_id as u64) else {
        return raise(env, CondClass::Control, "no active frame (frame-ref)", args[0]);
    };
    let element = match env.heap.get(argv) {
        HeapData::Vector(data) => data.get(offset as usize),
        _ => None,
    };
    match element {
        Some(value) => Ok(value),
        None => raise(env, CondClass::Range, "frame-ref", args[1]),
    }
}

/// `(letq frame-id offset value)`: assigns a slot of the most recent live
/// activation and returns the value.
pub(crate) fn letq(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let frame_id = expect_fixnum(env, args[0], "letq")?;
    let offset = expect_fixnum(env, args[1], "letq")?;
    let value = args[2];
    let Some(argv) = env.cache_top(frame_id as u64) else {
        return raise(env, CondClass::Control, "no active frame (letq)", args[0]);
    };
    if let HeapData::Vector(VectorData::T(values)) = env.heap.get_mut(argv) {
        if let Some(slot) = values.get_mut(offset as usize) {
            *slot = value;
            return Ok(value);
        }
    }
    raise(env, CondClass::Range, "letq", args[1])
}
