use super::{expect_keyword, expect_list};
use crate::{
    env::Env,
    types::condition::{raise, CondClass, EvalResult},
    types::strukt,
    value::Tag,
};

pub(crate) fn structp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(strukt::is_struct(&env.heap, args[0])))
}

/// `(struct :type slots)`: a struct cell from a type keyword and slot list.
pub(crate) fn make(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stype = expect_keyword(env, args[0], "struct")?;
    let slots = expect_list(env, args[1], "struct")?;
    Ok(strukt::make_struct(&mut env.heap, stype, slots))
}

pub(crate) fn stype(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    if !strukt::is_struct(&env.heap, args[0]) {
        return raise(env, CondClass::Type, "struct-type", args[0]);
    }
    Ok(strukt::struct_type(&env.heap, args[0]))
}

pub(crate) fn slots(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    if !strukt::is_struct(&env.heap, args[0]) {
        return raise(env, CondClass::Type, "struct-slots", args[0]);
    }
    Ok(strukt::struct_slots(&env.heap, args[0]))
}
