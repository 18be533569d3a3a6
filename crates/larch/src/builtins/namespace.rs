use super::expect_string;
use crate::{
    env::Env,
    namespace,
    types::condition::{raise, CondClass, EvalResult},
    types::{cons, symbol, vector},
    value::Tag,
};

fn expect_namespace(env: &mut Env, tag: Tag, what: &str) -> EvalResult<Tag> {
    if namespace::is_namespace(&env.heap, tag) {
        Ok(tag)
    } else {
        raise(env, CondClass::Type, what, tag)
    }
}

pub(crate) fn namespacep(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(namespace::is_namespace(&env.heap, args[0])))
}

/// `(ns name imports)`: makes a namespace and registers it with the
/// environment.
pub(crate) fn ns(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let name = args[0];
    let imports = args[1];
    if vector::string_text(&env.heap, name).is_none() {
        return raise(env, CondClass::Type, "ns", name);
    }
    if !imports.is_list() {
        return raise(env, CondClass::Type, "ns", imports);
    }
    for import in cons::list_to_vec(&env.heap, imports) {
        if !namespace::is_namespace(&env.heap, import) {
            return raise(env, CondClass::Type, "ns", import);
        }
    }
    let ns = namespace::make_namespace(&mut env.heap, name, imports);
    env.add_namespace(ns);
    Ok(ns)
}

pub(crate) fn ns_name(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "ns-name")?;
    Ok(namespace::name_of(&env.heap, ns))
}

pub(crate) fn ns_import(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "ns-import")?;
    Ok(namespace::imports_of(&env.heap, ns))
}

/// `(ns-symbols ns)`: `(externs . interns)` lists.
pub(crate) fn ns_symbols(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "ns-symbols")?;
    let (externs, interns) = namespace::symbol_lists(env, ns);
    Ok(cons::cons(&mut env.heap, externs, interns))
}

pub(crate) fn current_ns(env: &mut Env, _args: &[Tag]) -> EvalResult<Tag> {
    Ok(env.current_ns)
}

/// `(in-ns ns)`: switches the current namespace, returning the previous one.
pub(crate) fn in_ns(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "in-ns")?;
    let previous = env.current_ns;
    env.current_ns = ns;
    Ok(previous)
}

pub(crate) fn find_ns(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let name = expect_string(env, args[0], "find-ns")?;
    Ok(env.find_namespace(&name))
}

pub(crate) fn find_symbol(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "find-symbol")?;
    let name = args[1];
    if vector::string_text(&env.heap, name).is_none() {
        return raise(env, CondClass::Type, "find-symbol", name);
    }
    Ok(namespace::find_symbol(env, ns, name))
}

/// `(find-in-ns ns :intern|:extern name)`.
pub(crate) fn find_in_ns(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "find-in-ns")?;
    let partition = args[1];
    let name = args[2];
    if vector::string_text(&env.heap, name).is_none() {
        return raise(env, CondClass::Type, "find-in-ns", name);
    }
    if partition == Tag::keyword("intern") {
        Ok(namespace::find_interns(env, ns, name))
    } else if partition == Tag::keyword("extern") {
        Ok(namespace::find_externs(env, ns, name))
    } else {
        raise(env, CondClass::Type, "find-in-ns", partition)
    }
}

/// `(intern ns :intern|:extern name value)`: interns and binds the symbol
/// when it is not already bound.
pub(crate) fn intern(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let ns = expect_namespace(env, args[0], "intern")?;
    let partition = args[1];
    let name = args[2];
    let value = args[3];
    if vector::string_text(&env.heap, name).is_none() {
        return raise(env, CondClass::Type, "intern", name);
    }
    let sym = if partition == Tag::keyword("intern") {
        namespace::intern_private(env, ns, name)
    } else if partition == Tag::keyword("extern") {
        namespace::intern(env, ns, name)
    } else {
        return raise(env, CondClass::Type, "intern", partition);
    };
    if !symbol::is_bound(&env.heap, sym) {
        symbol::bind(&mut env.heap, sym, value);
    }
    Ok(sym)
}
