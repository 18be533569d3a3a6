use super::expect_fixnum;
use crate::{
    env::Env,
    types::condition::{raise, CondClass, EvalResult},
    types::cons,
    value::Tag,
};

pub(crate) fn fixnump(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_fixnum()))
}

pub(crate) fn add(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "fixnum+")?;
    let b = expect_fixnum(env, args[1], "fixnum+")?;
    Ok(Tag::fixnum(a.wrapping_add(b)))
}

pub(crate) fn sub(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "fixnum-")?;
    let b = expect_fixnum(env, args[1], "fixnum-")?;
    Ok(Tag::fixnum(a.wrapping_sub(b)))
}

pub(crate) fn mul(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "fixnum*")?;
    let b = expect_fixnum(env, args[1], "fixnum*")?;
    Ok(Tag::fixnum(a.wrapping_mul(b)))
}

pub(crate) fn less_than(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "fixnum<")?;
    let b = expect_fixnum(env, args[1], "fixnum<")?;
    Ok(Tag::bool(a < b))
}

/// `(truncate n d)`: quotient toward zero, `(quotient . remainder)`.
pub(crate) fn truncate(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let n = expect_fixnum(env, args[0], "truncate")?;
    let d = expect_fixnum(env, args[1], "truncate")?;
    if d == 0 {
        return raise(env, CondClass::ZeroDiv, "truncate", args[1]);
    }
    let quotient = n.wrapping_div(d);
    let remainder = n.wrapping_sub(quotient.wrapping_mul(d));
    Ok(cons::cons(&mut env.heap, Tag::fixnum(quotient), Tag::fixnum(remainder)))
}

/// `(floor n d)`: quotient toward negative infinity, `(quotient . remainder)`.
pub(crate) fn floor(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let n = expect_fixnum(env, args[0], "floor")?;
    let d = expect_fixnum(env, args[1], "floor")?;
    if d == 0 {
        return raise(env, CondClass::ZeroDiv, "floor", args[1]);
    }
    let mut quotient = n.wrapping_div(d);
    let trunc_remainder = n.wrapping_sub(quotient.wrapping_mul(d));
    if trunc_remainder != 0 && (trunc_remainder < 0) != (d < 0) {
        quotient -= 1;
    }
    let remainder = n.wrapping_sub(quotient.wrapping_mul(d));
    Ok(cons::cons(&mut env.heap, Tag::fixnum(quotient), Tag::fixnum(remainder)))
}

pub(crate) fn logand(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "logand")?;
    let b = expect_fixnum(env, args[1], "logand")?;
    Ok(Tag::fixnum(a & b))
}

pub(crate) fn logor(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_fixnum(env, args[0], "logor")?;
    let b = expect_fixnum(env, args[1], "logor")?;
    Ok(Tag::fixnum(a | b))
}
