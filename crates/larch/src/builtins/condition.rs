use super::{expect_function, expect_keyword, expect_string};
use crate::{
    env::Env,
    eval,
    heap::HeapData,
    types::condition::{self, raise, CondClass, EvalResult, Unwind},
    value::Tag,
};

pub(crate) fn conditionp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(condition::is_condition(env, args[0])))
}

/// `(condition tag reason source)`: a fresh condition object.
pub(crate) fn make(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let tag = expect_keyword(env, args[0], "condition")?;
    if !crate::types::vector::is_string(&env.heap, args[1]) {
        return raise(env, CondClass::Type, "condition", args[1]);
    }
    Ok(condition::make_condition(env, tag, args[1], args[2]))
}

/// `(raise reason source)`: throws a fresh `:simple` condition.
pub(crate) fn raise_simple(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let reason = expect_string(env, args[0], "error")?;
    raise(env, CondClass::Simple, &reason, args[1])
}

/// `(raise-condition condition)`: rethrows an existing condition object.
pub(crate) fn raise_condition(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    if !condition::is_condition(env, args[0]) {
        return raise(env, CondClass::Type, "raise-condition", args[0]);
    }
    Err(Unwind::Condition(args[0]))
}

/// `(with-condition thunk handler)`: calls the thunk; a condition unwinding
/// out of it truncates the frame stack and runs the handler on the
/// condition. Block throws pass through untouched.
pub(crate) fn with_condition(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let thunk = expect_function(env, args[0], "with-condition")?;
    let handler = expect_function(env, args[1], "with-condition")?;
    let mark = env.frames.len();
    match eval::funcall(env, thunk, &[]) {
        Ok(value) => Ok(value),
        Err(Unwind::Condition(cond)) => {
            env.frames.truncate(mark);
            eval::funcall(env, handler, &[cond])
        }
        Err(other) => Err(other),
    }
}

/// `(block :tag thunk)`: the primitive entry, for `apply`-style calls. The
/// evaluator front-runs this for ordinary call forms so the catch exists
/// during argument evaluation as well.
pub(crate) fn block(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let tag = args[0];
    if !tag.is_symbol() {
        return raise(env, CondClass::Type, "is not a symbol (block)", tag);
    }
    let thunk = expect_function(env, args[1], "is not a function (block)")?;
    let mark = env.frames.len();
    let result = eval::funcall(env, thunk, &[]);
    eval::catch_throw(env, tag, mark, result)
}

/// `(return :tag value)`: unwinds with `(tag . value)` to a matching block.
pub(crate) fn return_(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let tag = args[0];
    if !tag.is_keyword() {
        return raise(env, CondClass::Type, "is not a symbol (return)", tag);
    }
    let pair = env.heap.alloc(HeapData::Cons { car: tag, cdr: args[1] });
    Err(Unwind::Throw(pair))
}
