pub(crate) mod condition;
pub(crate) mod env_;
pub(crate) mod fixnum;
pub(crate) mod float;
pub(crate) mod function;
pub(crate) mod list;
pub(crate) mod macro_;
pub(crate) mod namespace;
pub(crate) mod stream;
pub(crate) mod strukt;
pub(crate) mod symbol;
pub(crate) mod type_;
pub(crate) mod vector;

use crate::{
    env::Env,
    types::condition::{raise, CondClass, EvalResult},
    types::vector as vec_type,
    value::Tag,
};

/// Implementation of one core function. Arguments arrive pre-packed into the
/// frame's slots; rest parameters never occur in this table.
pub(crate) type CoreFnImpl = fn(&mut Env, &[Tag]) -> EvalResult<Tag>;

/// One entry of the core dispatch tables.
pub(crate) struct CoreDef {
    pub name: &'static str,
    pub nreqs: usize,
    pub run: CoreFnImpl,
}

const fn def(name: &'static str, nreqs: usize, run: CoreFnImpl) -> CoreDef {
    CoreDef { name, nreqs, run }
}

/// Externally visible core functions, interned into the core namespace.
pub(crate) static EXTERN_FUNCTIONS: &[CoreDef] = &[
    def("acos", 1, float::acos),
    def("apply", 2, function::apply),
    def("asin", 1, float::asin),
    def("atan", 1, float::atan),
    def("boundp", 1, symbol::boundp),
    def("car", 1, list::car),
    def("cdr", 1, list::cdr),
    def("charp", 1, type_::charp),
    def("close", 1, stream::close),
    def("closure", 1, function::closure),
    def("condition", 3, condition::make),
    def("conditionp", 1, condition::conditionp),
    def("cons", 2, list::cons),
    def("consp", 1, list::consp),
    def("cos", 1, float::cos),
    def("current-ns", 0, namespace::current_ns),
    def("eofp", 1, stream::eofp),
    def("eq", 2, type_::eq),
    def("eval", 1, env_::eval),
    def("exp", 1, float::exp),
    def("find-in-ns", 3, namespace::find_in_ns),
    def("find-ns", 1, namespace::find_ns),
    def("find-symbol", 2, namespace::find_symbol),
    def("fixnum*", 2, fixnum::mul),
    def("fixnum+", 2, fixnum::add),
    def("fixnum-", 2, fixnum::sub),
    def("fixnum<", 2, fixnum::less_than),
    def("fixnump", 1, fixnum::fixnump),
    def("float*", 2, float::mul),
    def("float+", 2, float::add),
    def("float-", 2, float::sub),
    def("float/", 2, float::div),
    def("float<", 2, float::less_than),
    def("floatp", 1, float::floatp),
    def("floor", 2, fixnum::floor),
    def("functionp", 1, type_::functionp),
    def("gc", 1, env_::gc),
    def("get-output-stream-string", 1, stream::get_output_stream_string),
    def("in-ns", 1, namespace::in_ns),
    def("intern", 4, namespace::intern),
    def("keyword", 1, symbol::keyword),
    def("keywordp", 1, type_::keywordp),
    def("length", 1, list::length),
    def("list-to-vector", 2, vector::list_to_vector),
    def("load", 1, stream::load),
    def("log", 1, float::log),
    def("log10", 1, float::log10),
    def("logand", 2, fixnum::logand),
    def("logor", 2, fixnum::logor),
    def("macro-function", 1, macro_::macro_function),
    def("macroexpand", 1, macro_::macroexpand),
    def("make-symbol", 1, symbol::make_symbol),
    def("mapc", 2, list::mapc),
    def("mapcar", 2, list::mapcar),
    def("mapl", 2, list::mapl),
    def("maplist", 2, list::maplist),
    def("namespacep", 1, namespace::namespacep),
    def("ns", 2, namespace::ns),
    def("ns-import", 1, namespace::ns_import),
    def("ns-name", 1, namespace::ns_name),
    def("ns-symbols", 1, namespace::ns_symbols),
    def("nth", 2, list::nth),
    def("nthcdr", 2, list::nthcdr),
    def("open-input-file", 1, stream::open_input_file),
    def("open-input-string", 1, stream::open_input_string),
    def("open-output-file", 1, stream::open_output_file),
    def("open-output-string", 1, stream::open_output_string),
    def("open-stream", 1, stream::open_stream),
    def("pow", 2, float::pow),
    def("print", 3, stream::print),
    def("raise", 2, condition::raise_simple),
    def("raise-condition", 1, condition::raise_condition),
    def("read", 1, stream::read),
    def("read-byte", 1, stream::read_byte),
    def("read-char", 1, stream::read_char),
    def("set-macro-character", 2, stream::set_macro_character),
    def("sin", 1, float::sin),
    def("special-operatorp", 1, type_::special_operatorp),
    def("sqrt", 1, float::sqrt),
    def("streamp", 1, stream::streamp),
    def("struct", 2, strukt::make),
    def("struct-slots", 1, strukt::slots),
    def("struct-type", 1, strukt::stype),
    def("structp", 1, strukt::structp),
    def("symbol-name", 1, symbol::symbol_name),
    def("symbol-ns", 1, symbol::symbol_ns),
    def("symbol-value", 1, symbol::symbol_value),
    def("symbolp", 1, symbol::symbolp),
    def("tan", 1, float::tan),
    def("terpri", 1, stream::terpri),
    def("trampoline", 1, function::trampoline),
    def("truncate", 2, fixnum::truncate),
    def("type-of", 1, type_::type_of),
    def("unread-char", 2, stream::unread_char),
    def("vector-length", 1, vector::vector_length),
    def("vector-map", 2, vector::vector_map),
    def("vector-mapc", 2, vector::vector_mapc),
    def("vector-ref", 2, vector::vector_ref),
    def("vector-type", 1, vector::vector_type),
    def("vectorp", 1, vector::vectorp),
    def("view", 1, type_::view),
    def("with-condition", 2, condition::with_condition),
    def("write-byte", 2, stream::write_byte),
    def("write-char", 2, stream::write_char),
];

/// Core functions reachable only as interns (`core::name`).
pub(crate) static INTERN_FUNCTIONS: &[CoreDef] = &[
    def("block", 2, condition::block),
    def("clocks", 0, env_::clocks),
    def("env-view", 0, env_::env_view),
    def("exit", 1, env_::exit),
    def("frame-ref", 2, function::frame_ref),
    def("heap-view", 1, env_::heap_view),
    def("letq", 3, function::letq),
    def("return", 2, condition::return_),
];

/// Resolves a combined-table index stored in a function cell.
pub(crate) fn core_def(index: u16) -> &'static CoreDef {
    let index = index as usize;
    if index < EXTERN_FUNCTIONS.len() {
        &EXTERN_FUNCTIONS[index]
    } else {
        &INTERN_FUNCTIONS[index - EXTERN_FUNCTIONS.len()]
    }
}

// --- shared argument validation ---------------------------------------------

pub(super) fn expect_fixnum(env: &mut Env, tag: Tag, what: &str) -> EvalResult<i64> {
    if tag.is_fixnum() {
        Ok(tag.as_fixnum())
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_float(env: &mut Env, tag: Tag, what: &str) -> EvalResult<f32> {
    if tag.is_float() {
        Ok(tag.as_float())
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_function(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if tag.is_function() {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_symbol(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if tag.is_symbol() {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_keyword(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if tag.is_keyword() {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_list(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if tag.is_list() {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_string(env: &mut Env, tag: Tag, what: &str) -> EvalResult<String> {
    match vec_type::string_text(&env.heap, tag) {
        Some(text) => Ok(text),
        None => raise(env, CondClass::Type, what, tag),
    }
}

pub(super) fn expect_char(env: &mut Env, tag: Tag, what: &str) -> EvalResult<u8> {
    if tag.is_char() {
        Ok(tag.as_char())
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(super) fn expect_stream(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if env.is_stream(tag) {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}
