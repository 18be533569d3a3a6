use crate::{
    env::Env,
    heap::{Heap, HeapData},
    namespace,
    types::condition::{raise, CondClass, EvalResult},
    types::vector,
    value::{Tag, IMMEDIATE_STR_MAX},
};

/// Symbol namespace; keywords have none.
pub(crate) fn ns_of(heap: &Heap, sym: Tag) -> Tag {
    if sym.is_keyword() {
        return Tag::NIL;
    }
    match heap.get(sym) {
        HeapData::Symbol { ns, .. } => *ns,
        _ => Tag::NIL,
    }
}

/// Symbol print name as a string value. A keyword's name is its payload.
pub(crate) fn name_of(heap: &Heap, sym: Tag) -> Tag {
    if sym.is_keyword() {
        let len = sym.immediate_str_len();
        return Tag::short_string(&sym.immediate_bytes()[..len]);
    }
    match heap.get(sym) {
        HeapData::Symbol { name, .. } => *name,
        _ => Tag::NIL,
    }
}

/// Symbol value cell; keywords evaluate to themselves.
pub(crate) fn value_of(heap: &Heap, sym: Tag) -> Tag {
    if sym.is_keyword() {
        return sym;
    }
    match heap.get(sym) {
        HeapData::Symbol { value, .. } => *value,
        _ => Tag::NIL,
    }
}

pub(crate) fn is_bound(heap: &Heap, sym: Tag) -> bool {
    if sym.is_keyword() {
        return true;
    }
    match heap.get(sym) {
        HeapData::Symbol { value, .. } => *value != Tag::UNBOUND,
        _ => false,
    }
}

/// Replaces the symbol's value cell.
pub(crate) fn bind(heap: &mut Heap, sym: Tag, new_value: Tag) -> Tag {
    if let HeapData::Symbol { value, .. } = heap.get_mut(sym) {
        *value = new_value;
    }
    sym
}

/// Allocates an unbound symbol with no namespace.
pub(crate) fn make_uninterned(heap: &mut Heap, name: Tag) -> Tag {
    heap.alloc(HeapData::Symbol {
        ns: Tag::NIL,
        name,
        value: Tag::UNBOUND,
    })
}

/// Makes a keyword from a name, enforcing the immediate length cap.
pub(crate) fn make_keyword(env: &mut Env, name: &str) -> EvalResult<Tag> {
    if name.is_empty() || name.len() > IMMEDIATE_STR_MAX {
        let source = vector::make_string(&mut env.heap, name.as_bytes());
        return raise(
            env,
            CondClass::Parse,
            "keyword symbols may not exceed seven characters",
            source,
        );
    }
    Ok(Tag::keyword(name))
}

/// Parses an atom into a symbol.
///
/// `name` interns as an extern of the current namespace, `ns:name` as an
/// extern of `ns`, `ns::name` as an intern of `ns`, `:name` as a keyword.
/// With `intern` false (the `#:` reader path) the result is a fresh
/// uninterned symbol and qualified names are rejected.
pub(crate) fn parse_symbol(env: &mut Env, text: &str, intern: bool) -> EvalResult<Tag> {
    if text.is_empty() {
        return raise(env, CondClass::Parse, "naked symbol syntax (read)", Tag::NIL);
    }

    if let Some(name) = text.strip_prefix(':') {
        if name.is_empty() {
            return raise(env, CondClass::Eof, "early eof in keyword (read)", Tag::NIL);
        }
        return make_keyword(env, name);
    }

    let (ns_name, sep, name) = split_qualifier(text);
    match (ns_name, intern) {
        (Some(ns_name), true) => {
            let ns = env.find_namespace(ns_name);
            if ns.is_nil() {
                let source = vector::make_string(&mut env.heap, ns_name.as_bytes());
                return raise(env, CondClass::Parse, "unmapped namespace", source);
            }
            let name = vector::make_string(&mut env.heap, name.as_bytes());
            if sep == "::" {
                Ok(namespace::intern_private(env, ns, name))
            } else {
                Ok(namespace::extern_in_ns(env, ns, name))
            }
        }
        (Some(_), false) => {
            let source = vector::make_string(&mut env.heap, text.as_bytes());
            raise(
                env,
                CondClass::Parse,
                "uninterned symbols may not be qualified (read)",
                source,
            )
        }
        (None, true) => {
            let current = env.current_ns;
            let name = vector::make_string(&mut env.heap, name.as_bytes());
            let found = namespace::find_interns(env, current, name);
            if found.is_nil() {
                Ok(namespace::intern(env, current, name))
            } else {
                Ok(found)
            }
        }
        (None, false) => {
            let name = vector::make_string(&mut env.heap, name.as_bytes());
            Ok(make_uninterned(&mut env.heap, name))
        }
    }
}

/// Splits `ns::name` / `ns:name` qualifiers. The double-colon form wins when
/// both match.
fn split_qualifier(text: &str) -> (Option<&str>, &str, &str) {
    if let Some(pos) = text.find("::") {
        (Some(&text[..pos]), "::", &text[pos + 2..])
    } else if let Some(pos) = text.find(':') {
        (Some(&text[..pos]), ":", &text[pos + 1..])
    } else {
        (None, "", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifier_split() {
        assert_eq!(split_qualifier("abc"), (None, "", "abc"));
        assert_eq!(split_qualifier("core:abc"), (Some("core"), ":", "abc"));
        assert_eq!(split_qualifier("core::abc"), (Some("core"), "::", "abc"));
    }

    #[test]
    fn uninterned_symbols_are_unbound() {
        let mut heap = Heap::new();
        let name = vector::make_string(&mut heap, b"gensym");
        let sym = make_uninterned(&mut heap, name);
        assert!(sym.is_symbol());
        assert!(!is_bound(&heap, sym));
        assert!(ns_of(&heap, sym).is_nil());
        bind(&mut heap, sym, Tag::fixnum(5));
        assert!(is_bound(&heap, sym));
        assert_eq!(value_of(&heap, sym), Tag::fixnum(5));
    }
}
