use crate::{
    env::Env,
    heap::HeapData,
    namespace::{self, Qualifier},
    types::{
        condition::EvalResult,
        cons, symbol,
        vector::{self, VectorData},
    },
    value::{SysClass, Tag},
};

/// Prints `value` to a stream designator.
///
/// With `escape` on, strings quote, chars use `#\` syntax, and symbols carry
/// their namespace qualifier. Classes without a dedicated printer fall back
/// to broket syntax around the raw word.
pub(crate) fn print(env: &mut Env, value: Tag, stream: Tag, escape: bool) -> EvalResult<()> {
    let stream = env.stream_designator(stream)?;
    print_form(env, value, stream, escape);
    Ok(())
}

pub(crate) fn terpri(env: &mut Env, stream: Tag) -> EvalResult<()> {
    let stream = env.stream_designator(stream)?;
    env.stream_write_byte(stream, b'\n');
    Ok(())
}

/// Prints to a resolved platform stream. The printer itself cannot unwind;
/// writes on closed streams are ignored at the byte layer.
pub(crate) fn print_form(env: &mut Env, value: Tag, stream: Tag, escape: bool) {
    match env.class_of(value) {
        SysClass::Fixnum => print_str(env, stream, &value.as_fixnum().to_string()),
        SysClass::Float => print_float(env, stream, value.as_float()),
        SysClass::Char => print_char(env, stream, value.as_char(), escape),
        SysClass::String => print_string(env, stream, value, escape),
        SysClass::Symbol => print_symbol(env, stream, value, escape),
        SysClass::Cons => print_list(env, stream, value, escape),
        SysClass::Vector => print_vector(env, stream, value, escape),
        SysClass::Function => {
            let name = function_name_text(env, value);
            let text = format!("#<:func #x{:x} ({name})>", value.bits());
            print_str(env, stream, &text);
        }
        SysClass::Macro => {
            let func = match env.heap.get(value) {
                HeapData::Macro { func } => *func,
                _ => Tag::NIL,
            };
            let name = function_name_text(env, func);
            let text = format!("#<:macro #x{:x} ({name})>", value.bits());
            print_str(env, stream, &text);
        }
        SysClass::Namespace => {
            let name = vector::string_text(&env.heap, namespace::name_of(&env.heap, value))
                .unwrap_or_default();
            let text = format!("#<:namespc #x{:x} ({name})>", value.bits());
            print_str(env, stream, &text);
        }
        class => {
            let keyword_name: &'static str = class.into();
            let text = format!("#<:{keyword_name} #x{:x} ()>", value.bits());
            print_str(env, stream, &text);
        }
    }
}

/// Renders a value into a fresh string.
pub(crate) fn to_string(env: &mut Env, value: Tag, escape: bool) -> String {
    let id = env.streams.open_output_string(Vec::new());
    let stream = env.make_stream(id);
    print_form(env, value, stream, escape);
    let bytes = env.streams.take_string(id).unwrap_or_default();
    env.streams.close(id);
    String::from_utf8_lossy(&bytes).into_owned()
}

pub(crate) fn print_str(env: &mut Env, stream: Tag, text: &str) {
    for byte in text.bytes() {
        env.stream_write_byte(stream, byte);
    }
}

fn print_float(env: &mut Env, stream: Tag, value: f32) {
    if value.is_finite() {
        let mut buffer = ryu::Buffer::new();
        let text = buffer.format_finite(value).to_owned();
        print_str(env, stream, &text);
    } else {
        print_str(env, stream, &value.to_string());
    }
}

fn print_char(env: &mut Env, stream: Tag, byte: u8, escape: bool) {
    if !escape {
        env.stream_write_byte(stream, byte);
        return;
    }
    print_str(env, stream, "#\\");
    match byte {
        0x0a => print_str(env, stream, "newline"),
        0x0d => print_str(env, stream, "return"),
        b' ' => print_str(env, stream, "space"),
        0x09 => print_str(env, stream, "tab"),
        _ => env.stream_write_byte(stream, byte),
    }
}

fn print_string(env: &mut Env, stream: Tag, value: Tag, escape: bool) {
    if escape {
        env.stream_write_byte(stream, b'"');
    }
    let bytes = vector::string_bytes(&env.heap, value).unwrap_or_default();
    for byte in bytes {
        env.stream_write_byte(stream, byte);
    }
    if escape {
        env.stream_write_byte(stream, b'"');
    }
}

/// Symbols print their name; escaped printing prepends the namespace
/// qualifier, with the current namespace elided to a bare `:` or `::`.
fn print_symbol(env: &mut Env, stream: Tag, value: Tag, escape: bool) {
    if value.is_keyword() {
        print_str(env, stream, ":");
    } else if escape {
        match namespace::qualifier(env, value) {
            Qualifier::Uninterned => print_str(env, stream, "#:"),
            Qualifier::Extern(ns) => {
                if ns != env.current_ns {
                    let ns_name =
                        vector::string_text(&env.heap, namespace::name_of(&env.heap, ns))
                            .unwrap_or_default();
                    print_str(env, stream, &ns_name);
                }
                print_str(env, stream, ":");
            }
            Qualifier::Intern(ns) => {
                if ns != env.current_ns {
                    let ns_name =
                        vector::string_text(&env.heap, namespace::name_of(&env.heap, ns))
                            .unwrap_or_default();
                    print_str(env, stream, &ns_name);
                }
                print_str(env, stream, "::");
            }
        }
    }
    let name = symbol::name_of(&env.heap, value);
    let text = vector::string_text(&env.heap, name).unwrap_or_default();
    print_str(env, stream, &text);
}

fn print_list(env: &mut Env, stream: Tag, value: Tag, escape: bool) {
    print_str(env, stream, "(");
    let mut cursor = value;
    let mut first = true;
    while cursor.is_cons() {
        if !first {
            print_str(env, stream, " ");
        }
        first = false;
        let car = cons::car(&env.heap, cursor);
        print_form(env, car, stream, escape);
        cursor = cons::cdr(&env.heap, cursor);
    }
    if !cursor.is_nil() {
        print_str(env, stream, " . ");
        print_form(env, cursor, stream, escape);
    }
    print_str(env, stream, ")");
}

fn print_vector(env: &mut Env, stream: Tag, value: Tag, escape: bool) {
    let class = vector::element_class(&env.heap, value).unwrap_or(SysClass::T);
    print_str(env, stream, "#(");
    print_form(env, class.keyword(), stream, escape);

    let elements: Vec<Tag> = match env.heap.get(value) {
        HeapData::Vector(VectorData::T(items)) => items.clone(),
        HeapData::Vector(data) => (0..data.len()).filter_map(|i| data.get(i)).collect(),
        _ => Vec::new(),
    };
    for element in elements {
        print_str(env, stream, " ");
        print_form(env, element, stream, escape);
    }
    print_str(env, stream, ")");
}

fn function_name_text(env: &Env, func: Tag) -> String {
    if !func.is_function() {
        return String::new();
    }
    let name = match env.heap.get(func) {
        HeapData::Function(data) => data.name,
        _ => Tag::NIL,
    };
    if name.is_nil() {
        return String::new();
    }
    let name = symbol::name_of(&env.heap, name);
    vector::string_text(&env.heap, name).unwrap_or_default()
}
