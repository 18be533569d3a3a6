//! Printer behavior: escape modes, qualifiers, and the broket fallback.

use larch::Env;
use pretty_assertions::assert_eq;

fn print_of(src: &str, escape: bool) -> String {
    let mut env = Env::new();
    let value = env.eval_str(src).unwrap();
    env.print_to_string(value, escape)
}

#[test]
fn fixnums_and_floats() {
    assert_eq!(print_of("42", false), "42");
    assert_eq!(print_of("-42", false), "-42");
    assert_eq!(print_of("1.5", false), "1.5");
    assert_eq!(print_of("(float/ 1.0 4.0)", true), "0.25");
}

#[test]
fn strings_quote_only_when_escaped() {
    assert_eq!(print_of("\"hi\"", true), "\"hi\"");
    assert_eq!(print_of("\"hi\"", false), "hi");
}

#[test]
fn chars_use_sharp_backslash_when_escaped() {
    assert_eq!(print_of("#\\a", true), "#\\a");
    assert_eq!(print_of("#\\a", false), "a");
    assert_eq!(print_of("#\\space", true), "#\\space");
}

#[test]
fn keywords_always_carry_their_colon() {
    assert_eq!(print_of(":kw", true), ":kw");
    assert_eq!(print_of(":kw", false), ":kw");
    assert_eq!(print_of("()", true), ":nil");
    assert_eq!(print_of("(eq 1 1)", true), ":t");
}

#[test]
fn symbols_print_their_qualifier_when_escaped() {
    let mut env = Env::new();
    // Current-namespace externs elide the namespace name.
    let sym = env.eval_str("'plain").unwrap();
    assert_eq!(env.print_to_string(sym, true), ":plain");
    assert_eq!(env.print_to_string(sym, false), "plain");

    // Other-namespace externs carry the full qualifier.
    env.eval_str("(:defsym app (ns \"app\" ()))").unwrap();
    env.eval_str("(intern app :extern \"thing\" 1)").unwrap();
    let qualified = env.eval_str("'app:thing").unwrap();
    assert_eq!(env.print_to_string(qualified, true), "app:thing");

    // Uninterned symbols print the gensym marker.
    let gensym = env.eval_str("(make-symbol \"g\")").unwrap();
    assert_eq!(env.print_to_string(gensym, true), "#:g");
}

#[test]
fn lists_print_with_dotted_tails() {
    assert_eq!(print_of("(cons 1 (cons 2 ()))", true), "(1 2)");
    assert_eq!(print_of("(cons 1 2)", true), "(1 . 2)");
}

#[test]
fn vectors_print_their_class_keyword() {
    assert_eq!(print_of("(list-to-vector :t '(1 2))", true), "#(:t 1 2)");
    assert_eq!(print_of("(list-to-vector :fixnum '(3))", true), "#(:fixnum 3)");
}

#[test]
fn functions_and_macros_print_as_brokets_with_names() {
    let mut env = Env::new();
    let car = env.eval_str("car").unwrap();
    let printed = env.print_to_string(car, true);
    assert!(printed.starts_with("#<:func #x"), "got {printed}");
    assert!(printed.ends_with("(car)>"), "got {printed}");

    env.eval_str("(:defsym m (:macro (x) x))").unwrap();
    let m = env.eval_str("(symbol-value 'm)").unwrap();
    let printed = env.print_to_string(m, true);
    assert!(printed.starts_with("#<:macro #x"), "got {printed}");
}

#[test]
fn namespaces_print_their_name() {
    let printed = print_of("(current-ns)", true);
    assert!(printed.starts_with("#<:namespc #x"), "got {printed}");
    assert!(printed.ends_with("(core)>"), "got {printed}");
}

#[test]
fn opaque_classes_fall_back_to_broket_syntax() {
    let mut env = Env::new();
    for (src, prefix) in [
        ("(open-input-string \"\")", "#<:stream #x"),
        ("(struct :s ())", "#<:struct #x"),
        ("(condition :simple \"r\" :src)", "#<:except #x"),
    ] {
        let value = env.eval_str(src).unwrap();
        let printed = env.print_to_string(value, true);
        assert!(printed.starts_with(prefix), "{src} printed {printed}");
        assert!(printed.ends_with(")>"), "{src} printed {printed}");

        // Broket output re-reads as the same raw word.
        let reread = env.read_str(&printed).unwrap();
        assert_eq!(reread, value, "{src}");
    }
}

#[test]
fn condition_diagnostics_format_per_the_report_line() {
    let mut env = Env::new();
    match env.eval_str("(raise \"boom\" :src)") {
        Err(larch::EnvError::Condition(exception)) => {
            assert_eq!(exception.class, ":simple");
            assert_eq!(exception.source, ":src");
            assert_eq!(exception.reason, "boom");
            let line = exception.to_string();
            assert!(
                line.starts_with("condition: :simple :src boom on frame "),
                "got {line}"
            );
        }
        other => panic!("expected a condition, got {other:?}"),
    }
}

#[test]
fn view_vectors_lead_with_the_class_keyword() {
    let mut env = Env::new();
    let view = env.eval_str("(view '(1 2))").unwrap();
    let printed = env.print_to_string(view, true);
    assert!(printed.starts_with("#(:t :cons"), "got {printed}");
    let class = env.eval_str("(vector-ref (view 5) 0)").unwrap();
    assert_eq!(env.print_to_string(class, true), ":fixnum");
}
