use super::expect_float;
use crate::{env::Env, types::condition::EvalResult, value::Tag};

pub(crate) fn floatp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_float()))
}

pub(crate) fn add(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_float(env, args[0], "float+")?;
    let b = expect_float(env, args[1], "float+")?;
    Ok(Tag::float(a + b))
}

pub(crate) fn sub(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_float(env, args[0], "float-")?;
    let b = expect_float(env, args[1], "float-")?;
    Ok(Tag::float(a - b))
}

pub(crate) fn mul(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_float(env, args[0], "float*")?;
    let b = expect_float(env, args[1], "float*")?;
    Ok(Tag::float(a * b))
}

pub(crate) fn div(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_float(env, args[0], "float/")?;
    let b = expect_float(env, args[1], "float/")?;
    Ok(Tag::float(a / b))
}

pub(crate) fn less_than(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let a = expect_float(env, args[0], "float<")?;
    let b = expect_float(env, args[1], "float<")?;
    Ok(Tag::bool(a < b))
}

macro_rules! unary_math {
    ($name:ident, $what:literal, $method:ident) => {
        pub(crate) fn $name(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
            let x = expect_float(env, args[0], $what)?;
            Ok(Tag::float(x.$method()))
        }
    };
}

unary_math!(sqrt, "(sqrt)", sqrt);
unary_math!(exp, "(exp)", exp);
unary_math!(log, "(log)", ln);
unary_math!(log10, "(log10)", log10);
unary_math!(sin, "(sin)", sin);
unary_math!(cos, "(cos)", cos);
unary_math!(tan, "(tan)", tan);
unary_math!(asin, "(asin)", asin);
unary_math!(acos, "(acos)", acos);
unary_math!(atan, "(atan)", atan);

pub(crate) fn pow(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let base = expect_float(env, args[0], "(pow)")?;
    let exponent = expect_float(env, args[1], "(pow)")?;
    Ok(Tag::float(base.powf(exponent)))
}
