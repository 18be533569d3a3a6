use super::expect_symbol;
use crate::{
    compile,
    env::Env,
    heap::HeapData,
    namespace,
    types::condition::{ConditionData, EvalResult},
    types::{strukt, symbol, vector},
    value::{SysClass, Tag},
};

pub(crate) fn eq(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0] == args[1]))
}

pub(crate) fn charp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_char()))
}

pub(crate) fn functionp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_function()))
}

pub(crate) fn keywordp(_env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(args[0].is_keyword()))
}

/// `(type-of object)`: the class keyword; structs answer their own type.
pub(crate) fn type_of(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    if strukt::is_struct(&env.heap, args[0]) {
        return Ok(strukt::struct_type(&env.heap, args[0]));
    }
    Ok(env.class_of(args[0]).keyword())
}

pub(crate) fn special_operatorp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let sym = expect_symbol(env, args[0], "special-operatorp")?;
    Ok(Tag::bool(compile::is_spec_op(sym)))
}

/// `(view object)`: a `:t` vector describing the object's fields.
pub(crate) fn view(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let object = args[0];
    let class = env.class_of(object);
    let shifted = Tag::fixnum((object.bits() >> 3) as i64);
    let mut fields = vec![class.keyword(), object, shifted];

    match class {
        SysClass::Cons => {
            if let HeapData::Cons { car, cdr } = env.heap.get(object) {
                fields.push(*car);
                fields.push(*cdr);
            }
        }
        SysClass::Symbol => {
            fields.push(symbol::name_of(&env.heap, object));
            fields.push(symbol::ns_of(&env.heap, object));
            fields.push(symbol::value_of(&env.heap, object));
        }
        SysClass::Function => {
            if let HeapData::Function(data) = env.heap.get(object) {
                fields.push(data.name);
                fields.push(data.form);
                fields.push(Tag::fixnum(data.frame_id as i64));
                fields.push(Tag::fixnum(data.arity as i64));
            }
        }
        SysClass::Macro => {
            if let HeapData::Macro { func } = env.heap.get(object) {
                fields.push(*func);
            }
        }
        SysClass::Vector | SysClass::String => {
            let element_class = vector::element_class(&env.heap, object).unwrap_or(SysClass::T);
            fields.push(element_class.keyword());
            fields.push(Tag::fixnum(vector::length(&env.heap, object).unwrap_or(0) as i64));
        }
        SysClass::Namespace => {
            fields.push(namespace::name_of(&env.heap, object));
            fields.push(namespace::imports_of(&env.heap, object));
        }
        SysClass::Stream => {
            if let HeapData::Stream(data) = env.heap.get(object) {
                let id = data.id.map_or(-1, |id| id.index() as i64);
                fields.push(Tag::fixnum(id));
                fields.push(data.func);
            }
        }
        SysClass::Condition => {
            if let HeapData::Condition(ConditionData { class, frame, source, reason }) =
                env.heap.get(object)
            {
                fields.push(*class);
                fields.push(*frame);
                fields.push(*source);
                fields.push(*reason);
            }
        }
        SysClass::Struct => {
            fields.push(strukt::struct_type(&env.heap, object));
            fields.push(strukt::struct_slots(&env.heap, object));
        }
        SysClass::Fixnum => fields.push(object),
        SysClass::Char => fields.push(Tag::fixnum(i64::from(object.as_char()))),
        _ => {}
    }

    Ok(vector::make_t_vector(&mut env.heap, fields))
}
