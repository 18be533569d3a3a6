use ahash::AHashMap;

use crate::{
    env::Env,
    heap::{Heap, HeapData},
    types::{cons, symbol, vector},
    value::Tag,
};

/// Heap layout of a namespace cell.
///
/// Both symbol maps are keyed by the 64-bit FNV-1a hash of the symbol's name
/// bytes; once a name is interned its entry is never replaced, which is what
/// keeps symbol identity stable for the life of the environment.
#[derive(Debug)]
pub(crate) struct NamespaceData {
    /// Name string.
    pub name: Tag,
    /// Ordered list of imported namespaces.
    pub imports: Tag,
    /// Externally visible symbols: `ns:name` or unqualified lookup.
    pub externs: AHashMap<u64, Tag>,
    /// Private symbols, visible only as `ns::name`.
    pub interns: AHashMap<u64, Tag>,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

/// FNV-1a over the name's bytes.
fn hash_name(heap: &Heap, name: Tag) -> u64 {
    let bytes = vector::string_bytes(heap, name).unwrap_or_default();
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub(crate) fn make_namespace(heap: &mut Heap, name: Tag, imports: Tag) -> Tag {
    heap.alloc(HeapData::Namespace(NamespaceData {
        name,
        imports,
        externs: AHashMap::new(),
        interns: AHashMap::new(),
    }))
}

pub(crate) fn is_namespace(heap: &Heap, tag: Tag) -> bool {
    tag.is_extended() && matches!(heap.get(tag), HeapData::Namespace(_))
}

pub(crate) fn name_of(heap: &Heap, ns: Tag) -> Tag {
    match heap.get(ns) {
        HeapData::Namespace(data) => data.name,
        _ => Tag::NIL,
    }
}

pub(crate) fn imports_of(heap: &Heap, ns: Tag) -> Tag {
    match heap.get(ns) {
        HeapData::Namespace(data) => data.imports,
        _ => Tag::NIL,
    }
}

fn with_data<R>(heap: &Heap, ns: Tag, f: impl FnOnce(&NamespaceData) -> R) -> R {
    match heap.get(ns) {
        HeapData::Namespace(data) => f(data),
        _ => unreachable!("namespace access through a non-namespace tag"),
    }
}

pub(crate) fn find_externs(env: &Env, ns: Tag, name: Tag) -> Tag {
    let key = hash_name(&env.heap, name);
    with_data(&env.heap, ns, |data| data.externs.get(&key).copied()).unwrap_or(Tag::NIL)
}

pub(crate) fn find_interns(env: &Env, ns: Tag, name: Tag) -> Tag {
    let key = hash_name(&env.heap, name);
    with_data(&env.heap, ns, |data| data.interns.get(&key).copied()).unwrap_or(Tag::NIL)
}

pub(crate) fn is_extern(env: &Env, ns: Tag, name: Tag) -> bool {
    !find_externs(env, ns, name).is_nil()
}

/// `find`: probe the externs, then each import in order, depth first.
pub(crate) fn find_symbol(env: &Env, ns: Tag, name: Tag) -> Tag {
    let sym = find_externs(env, ns, name);
    if !sym.is_nil() {
        return sym;
    }
    let imports = cons::list_to_vec(&env.heap, imports_of(&env.heap, ns));
    for import in imports {
        let sym = find_symbol(env, import, name);
        if !sym.is_nil() {
            return sym;
        }
    }
    Tag::NIL
}

fn insert_extern(env: &mut Env, ns: Tag, name: Tag, sym: Tag) -> Tag {
    let key = hash_name(&env.heap, name);
    if let HeapData::Namespace(data) = env.heap.get_mut(ns) {
        data.externs.insert(key, sym);
    }
    sym
}

fn insert_intern(env: &mut Env, ns: Tag, name: Tag, sym: Tag) -> Tag {
    let key = hash_name(&env.heap, name);
    if let HeapData::Namespace(data) = env.heap.get_mut(ns) {
        data.interns.insert(key, sym);
    }
    sym
}

fn fresh_symbol(env: &mut Env, ns: Tag, name: Tag, value: Tag) -> Tag {
    env.heap.alloc(HeapData::Symbol { ns, name, value })
}

/// Intern-as-extern: an existing visible symbol wins, otherwise a fresh
/// unbound symbol is inserted into the externs.
pub(crate) fn intern(env: &mut Env, ns: Tag, name: Tag) -> Tag {
    let sym = find_symbol(env, ns, name);
    if !sym.is_nil() {
        return sym;
    }
    let fresh = fresh_symbol(env, ns, name, Tag::UNBOUND);
    insert_extern(env, ns, name, fresh)
}

/// Variant of [`intern`] carrying an initial bound value.
pub(crate) fn intern_with_value(env: &mut Env, ns: Tag, name: Tag, value: Tag) -> Tag {
    let sym = find_symbol(env, ns, name);
    if !sym.is_nil() {
        return sym;
    }
    let fresh = fresh_symbol(env, ns, name, value);
    insert_extern(env, ns, name, fresh)
}

/// Intern into the private partition; found only via `ns::name`.
pub(crate) fn intern_private(env: &mut Env, ns: Tag, name: Tag) -> Tag {
    let sym = find_interns(env, ns, name);
    if !sym.is_nil() {
        return sym;
    }
    let fresh = fresh_symbol(env, ns, name, Tag::UNBOUND);
    insert_intern(env, ns, name, fresh)
}

/// Extern lookup scoped to one namespace, interning on miss.
pub(crate) fn extern_in_ns(env: &mut Env, ns: Tag, name: Tag) -> Tag {
    let sym = find_externs(env, ns, name);
    if !sym.is_nil() {
        return sym;
    }
    let fresh = fresh_symbol(env, ns, name, Tag::UNBOUND);
    insert_extern(env, ns, name, fresh)
}

/// `(externs . interns)` symbol lists for `ns-symbols`.
pub(crate) fn symbol_lists(env: &mut Env, ns: Tag) -> (Tag, Tag) {
    let (externs, interns) = with_data(&env.heap, ns, |data| {
        (
            data.externs.values().copied().collect::<Vec<_>>(),
            data.interns.values().copied().collect::<Vec<_>>(),
        )
    });
    let externs = cons::list(&mut env.heap, &externs);
    let interns = cons::list(&mut env.heap, &interns);
    (externs, interns)
}

/// How a symbol should print its qualifier.
pub(crate) fn qualifier(env: &Env, sym: Tag) -> Qualifier {
    let ns = symbol::ns_of(&env.heap, sym);
    if ns.is_nil() {
        return Qualifier::Uninterned;
    }
    let name = symbol::name_of(&env.heap, sym);
    if is_extern(env, ns, name) {
        Qualifier::Extern(ns)
    } else {
        Qualifier::Intern(ns)
    }
}

pub(crate) enum Qualifier {
    Uninterned,
    Extern(Tag),
    Intern(Tag),
}
