//! Namespace behavior: interning identity, extern/intern visibility, the
//! import chain, and the qualified symbol syntax.

use larch::{Env, EnvError, Tag};
use pretty_assertions::assert_eq;

fn eval_print(env: &mut Env, src: &str) -> String {
    let value = env.eval_str(src).unwrap();
    env.print_to_string(value, true)
}

#[test]
fn interning_is_idempotent() {
    let mut env = Env::new();
    assert_eq!(env.eval_str("(eq 'foo 'foo)").unwrap(), Tag::T);
    assert_eq!(
        env.eval_str("(eq (find-symbol (current-ns) \"car\") 'car)").unwrap(),
        Tag::T
    );
}

#[test]
fn the_core_namespace_exists_and_is_current() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(ns-name (current-ns))"), "\"core\"");
    assert_eq!(env.eval_str("(eq (find-ns \"core\") (current-ns))").unwrap(), Tag::T);
    assert_eq!(env.eval_str("(find-ns \"missing\")").unwrap(), Tag::NIL);
}

#[test]
fn fresh_namespaces_see_their_imports() {
    let mut env = Env::new();
    env.eval_str("(:defsym app (ns \"app\" (cons (current-ns) ())))").unwrap();
    env.eval_str("(in-ns app)").unwrap();

    // Core externs remain visible through the import chain.
    assert_eq!(eval_print(&mut env, "(fixnum+ 1 2)"), "3");

    env.eval_str("(:defsym local-x 9)").unwrap();
    assert_eq!(eval_print(&mut env, "local-x"), "9");

    // Back in core, app's externs need qualification.
    env.eval_str("(in-ns (find-ns \"core\"))").unwrap();
    assert_eq!(eval_print(&mut env, "app:local-x"), "9");
}

#[test]
fn interns_are_visible_only_with_double_colons() {
    let mut env = Env::new();
    env.eval_str("(:defsym app (ns \"app\" ()))").unwrap();
    env.eval_str("(intern app :intern \"secret\" 42)").unwrap();
    assert_eq!(eval_print(&mut env, "app::secret"), "42");

    // The extern partition knows nothing called `secret`.
    assert_eq!(
        env.eval_str("(find-in-ns app :extern \"secret\")").unwrap(),
        Tag::NIL
    );
    let found = env.eval_str("(find-in-ns app :intern \"secret\")").unwrap();
    assert!(found.is_symbol());
}

#[test]
fn intern_binds_only_unbound_symbols() {
    let mut env = Env::new();
    env.eval_str("(:defsym app (ns \"app\" ()))").unwrap();
    env.eval_str("(intern app :extern \"v\" 1)").unwrap();
    env.eval_str("(intern app :extern \"v\" 2)").unwrap();
    assert_eq!(eval_print(&mut env, "app:v"), "1");
}

#[test]
fn core_interns_are_reachable_by_qualified_name() {
    let mut env = Env::new();
    // `frame-ref` lives in the intern partition.
    assert_eq!(
        env.eval_str("(find-in-ns (current-ns) :extern \"frame-ref\")").unwrap(),
        Tag::NIL
    );
    let sym = env.eval_str("(find-in-ns (current-ns) :intern \"frame-ref\")").unwrap();
    assert!(sym.is_symbol());
    let printed = eval_print(&mut env, "core::frame-ref");
    assert!(printed.starts_with("#<:func"), "got {printed}");
}

#[test]
fn ns_symbols_partitions_externs_and_interns() {
    let mut env = Env::new();
    env.eval_str("(:defsym app (ns \"app\" ()))").unwrap();
    env.eval_str("(intern app :extern \"e\" 1)").unwrap();
    env.eval_str("(intern app :intern \"i\" 2)").unwrap();
    assert_eq!(eval_print(&mut env, "(length (car (ns-symbols app)))"), "1");
    assert_eq!(eval_print(&mut env, "(length (cdr (ns-symbols app)))"), "1");
}

#[test]
fn unmapped_namespace_qualifiers_are_parse_errors() {
    let mut env = Env::new();
    match env.eval_str("nowhere:thing") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":parse"),
        other => panic!("expected a parse condition, got {other:?}"),
    }
}

#[test]
fn in_ns_returns_the_previous_namespace() {
    let mut env = Env::new();
    // Import core so the follow-up forms still resolve from inside app.
    env.eval_str("(:defsym app (ns \"app\" (cons (current-ns) ())))").unwrap();
    assert_eq!(env.eval_str("(eq (in-ns app) (find-ns \"core\"))").unwrap(), Tag::T);
    assert_eq!(env.eval_str("(eq (current-ns) app)").unwrap(), Tag::T);
}

#[test]
fn symbol_accessors() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(symbol-name 'car)"), "\"car\"");
    assert_eq!(eval_print(&mut env, "(symbol-name :kw)"), "\"kw\"");
    assert_eq!(env.eval_str("(eq (symbol-ns 'car) (current-ns))").unwrap(), Tag::T);
    assert_eq!(env.eval_str("(symbol-ns :kw)").unwrap(), Tag::NIL);
    assert_eq!(eval_print(&mut env, "(:defsym sv 5) (symbol-value 'sv)"), "5");
}

#[test]
fn keyword_constructor() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(keyword \"up\")"), ":up");
    assert_eq!(eval_print(&mut env, "(keyword 'car)"), ":car");
    match env.eval_str("(keyword \"eightlong\")") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":parse"),
        other => panic!("expected a parse condition, got {other:?}"),
    }
}
