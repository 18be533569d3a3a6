//! Evaluator behavior: application, lexical closures, non-local exit,
//! conditions, and the core function set.

use larch::{Env, EnvError};
use pretty_assertions::assert_eq;

fn eval_print(env: &mut Env, src: &str) -> String {
    let value = env.eval_str(src).unwrap();
    env.print_to_string(value, true)
}

fn expect_condition(env: &mut Env, src: &str, class: &str) {
    match env.eval_str(src) {
        Err(EnvError::Condition(exception)) => {
            assert_eq!(exception.class, class, "for {src}: {exception}");
        }
        other => panic!("expected a {class} condition for {src}, got {other:?}"),
    }
}

#[test]
fn constants_evaluate_to_themselves() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "42"), "42");
    assert_eq!(eval_print(&mut env, "1.5"), "1.5");
    assert_eq!(eval_print(&mut env, ":k"), ":k");
    assert_eq!(eval_print(&mut env, "\"str\""), "\"str\"");
    assert_eq!(eval_print(&mut env, "#\\a"), "#\\a");
}

#[test]
fn lambda_application() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "((:lambda (x y) (fixnum+ x y)) 2 3)"), "5");
}

#[test]
fn defsym_binds_and_quotes_its_symbol() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(:defsym x 3)"), ":x");
    assert_eq!(eval_print(&mut env, "x"), "3");
}

#[test]
fn defsym_rejects_rebinding_and_keywords() {
    let mut env = Env::new();
    env.eval_str("(:defsym once 1)").unwrap();
    expect_condition(&mut env, "(:defsym once 2)", ":cell");
    expect_condition(&mut env, "(:defsym :kw 2)", ":type");
}

#[test]
fn defsym_names_defined_functions() {
    let mut env = Env::new();
    env.eval_str("(:defsym ident (:lambda (x) x))").unwrap();
    let printed = eval_print(&mut env, "ident");
    assert!(printed.starts_with("#<:func #x"), "got {printed}");
    assert!(printed.ends_with("(ident)>"), "got {printed}");
}

#[test]
fn arguments_evaluate_left_to_right() {
    let mut env = Env::new();
    env.eval_str("(:defsym s (open-output-string \"\"))").unwrap();
    env.eval_str("((:lambda (a b) :nil) (print 1 s :nil) (print 2 s :nil))")
        .unwrap();
    assert_eq!(eval_print(&mut env, "(get-output-stream-string s)"), "\"12\"");
}

#[test]
fn arity_is_enforced() {
    let mut env = Env::new();
    expect_condition(&mut env, "((:lambda (x) x) 1 2)", ":type");
    expect_condition(&mut env, "((:lambda (x) x))", ":type");
    expect_condition(&mut env, "(car 1 2)", ":type");
}

#[test]
fn rest_parameters_pack_a_list() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "((:lambda (x :rest r) (cons x r)) 1 2 3)"), "(1 2 3)");
    assert_eq!(eval_print(&mut env, "((:lambda (:rest r) r))"), ":nil");
    assert_eq!(eval_print(&mut env, "((:lambda (:rest r) r) 1)"), "(1)");
}

#[test]
fn lambda_list_parse_errors() {
    let mut env = Env::new();
    expect_condition(&mut env, "(:lambda (x x) x)", ":parse");
    expect_condition(&mut env, "(:lambda (:k) 1)", ":type");
    expect_condition(&mut env, "(:lambda (:rest) 1)", ":parse");
    expect_condition(&mut env, "(:lambda (:rest a b) 1)", ":parse");
    expect_condition(&mut env, "(:lambda (x :rest x) 1)", ":parse");
}

#[test]
fn conditional_heads_select_their_branch() {
    let mut env = Env::new();
    // A head evaluating to :t takes the second element, :nil the third.
    assert_eq!(eval_print(&mut env, "((eq 1 1) 10 20)"), "10");
    assert_eq!(eval_print(&mut env, "((eq 1 2) 10 20)"), "20");
}

#[test]
fn quote_returns_the_literal_form() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "'(1 2 3)"), "(1 2 3)");
    assert_eq!(eval_print(&mut env, "(eval '(:quote (1 2)))"), "(1 2)");
}

#[test]
fn unbound_symbols_raise_unsym() {
    let mut env = Env::new();
    expect_condition(&mut env, "nosuch", ":unsym");
    expect_condition(&mut env, "(nosuchfn 1)", ":unsym");
}

#[test]
fn non_function_heads_raise() {
    let mut env = Env::new();
    expect_condition(&mut env, "(:defsym notfn 3) (notfn 1)", ":type");
}

#[test]
fn letq_assigns_a_lexical_slot() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(&mut env, "((:lambda (x) ((:lambda () (:letq x 1) x))) 0)"),
        "1"
    );
}

#[test]
fn letq_requires_a_lexical_variable() {
    let mut env = Env::new();
    expect_condition(&mut env, "(:lambda () (:letq zz 1))", ":type");
}

#[test]
fn closures_capture_frame_snapshots() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(&mut env, "((:lambda (f) ((f 42))) (:lambda (x) #'(:lambda () x)))"),
        "42"
    );
}

#[test]
fn closures_survive_the_defining_frame() {
    let mut env = Env::new();
    env.eval_str("(:defsym make-adder (:lambda (n) #'(:lambda (m) (fixnum+ n m))))")
        .unwrap();
    env.eval_str("(:defsym add3 (make-adder 3))").unwrap();
    assert_eq!(eval_print(&mut env, "(add3 4)"), "7");
}

#[test]
fn block_catches_a_matching_return() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(&mut env, "(block :b (:lambda () (core::return :b 42)))"),
        "42"
    );
}

#[test]
fn block_catches_returns_fired_during_argument_evaluation() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(
            &mut env,
            "(block :out ((:lambda () (mapc (:lambda (e) (core::return :out e)) '(1 2 3)))))"
        ),
        "1"
    );
}

#[test]
fn mismatched_returns_keep_unwinding() {
    let mut env = Env::new();
    expect_condition(
        &mut env,
        "(block :b (:lambda () (core::return :other 42)))",
        ":control",
    );
    assert_eq!(
        eval_print(
            &mut env,
            "(block :b (:lambda () (block :c (:lambda () (core::return :b 7)))))"
        ),
        "7"
    );
}

#[test]
fn with_condition_runs_the_handler_on_the_condition() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(
            &mut env,
            "(with-condition (:lambda () (raise \"boom\" :src)) (:lambda (c) (type-of c)))"
        ),
        ":except"
    );
}

#[test]
fn with_condition_passes_block_throws_through() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(
            &mut env,
            "(block :b (:lambda () (with-condition \
                (:lambda () (core::return :b 5)) \
                (:lambda (c) :handled))))"
        ),
        "5"
    );
}

#[test]
fn conditions_carry_their_class() {
    let mut env = Env::new();
    expect_condition(&mut env, "(fixnum+ 1 :no)", ":type");
    expect_condition(&mut env, "(truncate 1 0)", ":zerodiv");
    expect_condition(&mut env, "(raise \"oops\" :nil)", ":simple");
    expect_condition(&mut env, "(vector-ref #(:t 1) 9)", ":range");
}

#[test]
fn raise_condition_rethrows() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(
            &mut env,
            "(with-condition \
               (:lambda () (raise-condition (condition :parse \"bad\" :src))) \
               (:lambda (c) (type-of c)))"
        ),
        ":except"
    );
}

#[test]
fn fixnum_arithmetic() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(fixnum+ 2 3)"), "5");
    assert_eq!(eval_print(&mut env, "(fixnum- 2 3)"), "-1");
    assert_eq!(eval_print(&mut env, "(fixnum* 6 7)"), "42");
    assert_eq!(eval_print(&mut env, "(fixnum< 1 2)"), ":t");
    assert_eq!(eval_print(&mut env, "(fixnum< 2 1)"), ":nil");
    assert_eq!(eval_print(&mut env, "(logand 12 10)"), "8");
    assert_eq!(eval_print(&mut env, "(logor 12 10)"), "14");
}

#[test]
fn truncate_and_floor_return_quotient_remainder_pairs() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(truncate 7 2)"), "(3 . 1)");
    assert_eq!(eval_print(&mut env, "(truncate -7 2)"), "(-3 . -1)");
    assert_eq!(eval_print(&mut env, "(floor 7 2)"), "(3 . 1)");
    assert_eq!(eval_print(&mut env, "(floor -7 2)"), "(-4 . 1)");
}

#[test]
fn float_arithmetic() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(float+ 1.5 2.25)"), "3.75");
    assert_eq!(eval_print(&mut env, "(float/ 1.0 4.0)"), "0.25");
    assert_eq!(eval_print(&mut env, "(float< 1.0 2.0)"), ":t");
    assert_eq!(eval_print(&mut env, "(sqrt 4.0)"), "2.0");
    assert_eq!(eval_print(&mut env, "(pow 2.0 10.0)"), "1024.0");
}

#[test]
fn list_operations() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(cons 1 2)"), "(1 . 2)");
    assert_eq!(eval_print(&mut env, "(car '(1 2))"), "1");
    assert_eq!(eval_print(&mut env, "(cdr '(1 2))"), "(2)");
    assert_eq!(eval_print(&mut env, "(car ())"), ":nil");
    assert_eq!(eval_print(&mut env, "(length '(1 2 3))"), "3");
    assert_eq!(eval_print(&mut env, "(nth 1 '(1 2 3))"), "2");
    assert_eq!(eval_print(&mut env, "(nthcdr 2 '(1 2 3))"), "(3)");
}

#[test]
fn map_family() {
    let mut env = Env::new();
    assert_eq!(
        eval_print(&mut env, "(mapcar (:lambda (n) (fixnum* n n)) '(1 2 3))"),
        "(1 4 9)"
    );
    assert_eq!(eval_print(&mut env, "(mapc (:lambda (n) n) '(1 2))"), "(1 2)");
    assert_eq!(
        eval_print(&mut env, "(maplist (:lambda (tail) (length tail)) '(1 2 3))"),
        "(3 2 1)"
    );
}

#[test]
fn mapcar_requires_a_list() {
    let mut env = Env::new();
    expect_condition(
        &mut env,
        "(mapcar (:lambda (n) (fixnum* n n)) (list-to-vector :t '(1 2 3)))",
        ":type",
    );
}

#[test]
fn apply_spreads_a_list() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(apply cons '(1 2))"), "(1 . 2)");
}

#[test]
fn trampoline_iterates_until_a_non_function() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(trampoline (:lambda () 5))"), "5");
    assert_eq!(eval_print(&mut env, "(trampoline (:lambda () (:lambda () 9)))"), "9");
}

#[test]
fn macros_expand_before_compilation() {
    let mut env = Env::new();
    env.eval_str("(:defsym twice (:macro (form) (cons 'fixnum+ (cons form (cons form ())))))")
        .unwrap();
    assert_eq!(eval_print(&mut env, "(twice 21)"), "42");
    assert_eq!(eval_print(&mut env, "(macroexpand '(twice 3))"), "(:fixnum+ 3 3)");
    let printed = eval_print(&mut env, "(macro-function 'twice)");
    assert!(printed.starts_with("#<:func"), "got {printed}");
    assert_eq!(eval_print(&mut env, "(macro-function 'car)"), ":nil");
}

#[test]
fn predicates() {
    let mut env = Env::new();
    for (src, expected) in [
        ("(fixnump 1)", ":t"),
        ("(fixnump :k)", ":nil"),
        ("(floatp 1.0)", ":t"),
        ("(charp #\\a)", ":t"),
        ("(consp '(1))", ":t"),
        ("(consp ())", ":nil"),
        ("(symbolp 'a)", ":t"),
        ("(symbolp :a)", ":t"),
        ("(keywordp :a)", ":t"),
        ("(keywordp 'a)", ":nil"),
        ("(functionp car)", ":t"),
        ("(vectorp #(:t 1))", ":t"),
        ("(vectorp \"str\")", ":t"),
        ("(streamp (open-input-string \"\"))", ":t"),
        ("(namespacep (current-ns))", ":t"),
        ("(special-operatorp :lambda)", ":t"),
        ("(special-operatorp :frob)", ":nil"),
        ("(boundp 'car)", ":t"),
    ] {
        assert_eq!(eval_print(&mut env, src), expected, "{src}");
    }
}

#[test]
fn type_of_answers_class_keywords() {
    let mut env = Env::new();
    for (src, expected) in [
        ("(type-of 1)", ":fixnum"),
        ("(type-of 1.0)", ":float"),
        ("(type-of #\\a)", ":char"),
        ("(type-of \"s\")", ":string"),
        ("(type-of 'a)", ":symbol"),
        ("(type-of '(1))", ":cons"),
        ("(type-of car)", ":func"),
        ("(type-of #(:t 1))", ":vector"),
        ("(type-of (current-ns))", ":namespc"),
        ("(type-of (open-input-string \"\"))", ":stream"),
        ("(type-of (struct :point '(1 2)))", ":point"),
    ] {
        assert_eq!(eval_print(&mut env, src), expected, "{src}");
    }
}

#[test]
fn structs_carry_type_and_slots() {
    let mut env = Env::new();
    env.eval_str("(:defsym p (struct :point '(1 2)))").unwrap();
    assert_eq!(eval_print(&mut env, "(struct-type p)"), ":point");
    assert_eq!(eval_print(&mut env, "(struct-slots p)"), "(1 2)");
    assert_eq!(eval_print(&mut env, "(structp p)"), ":t");
}

#[test]
fn vector_operations() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(vector-length #(:t 1 2 3))"), "3");
    assert_eq!(eval_print(&mut env, "(vector-ref #(:fixnum 5 6) 1)"), "6");
    assert_eq!(eval_print(&mut env, "(vector-type #(:byte 1))"), ":byte");
    assert_eq!(eval_print(&mut env, "(vector-length \"abc\")"), "3");
    assert_eq!(eval_print(&mut env, "(vector-ref \"abc\" 1)"), "#\\b");
    assert_eq!(
        eval_print(&mut env, "(vector-map (:lambda (n) (fixnum+ n 1)) #(:fixnum 1 2))"),
        "#(:t 2 3)"
    );
}

#[test]
fn streams_write_and_read_back() {
    let mut env = Env::new();
    env.eval_str("(:defsym out (open-output-string \"\"))").unwrap();
    env.eval_str("(write-char #\\h out) (write-char #\\i out)").unwrap();
    assert_eq!(eval_print(&mut env, "(get-output-stream-string out)"), "\"hi\"");

    env.eval_str("(:defsym in (open-input-string \"ab\"))").unwrap();
    assert_eq!(eval_print(&mut env, "(read-char in)"), "#\\a");
    env.eval_str("(unread-char #\\a in)").unwrap();
    assert_eq!(eval_print(&mut env, "(read-byte in)"), "97");
    assert_eq!(eval_print(&mut env, "(eofp in)"), ":nil");
    assert_eq!(eval_print(&mut env, "(read-char in)"), "#\\b");
    assert_eq!(eval_print(&mut env, "(eofp in)"), ":t");
}

#[test]
fn closed_streams_read_eof_and_ignore_writes() {
    let mut env = Env::new();
    env.eval_str("(:defsym s (open-input-string \"xyz\"))").unwrap();
    assert_eq!(eval_print(&mut env, "(close s)"), ":t");
    assert_eq!(eval_print(&mut env, "(eofp s)"), ":t");
}

#[test]
fn function_streams_feed_the_reader() {
    let mut env = Env::new();
    env.eval_str("(:defsym fs (open-stream (:lambda () 7)))").unwrap();
    assert_eq!(eval_print(&mut env, "(read-byte fs)"), "7");
    expect_condition(
        &mut env,
        "(read-byte (open-stream (:lambda () :notbyte)))",
        ":type",
    );
}

#[test]
fn print_primitive_returns_its_object() {
    let mut env = Env::new();
    env.eval_str("(:defsym s (open-output-string \"\"))").unwrap();
    assert_eq!(eval_print(&mut env, "(print 42 s :nil)"), "42");
    env.eval_str("(print \"x\" s :t) (terpri s)").unwrap();
    // The string printer writes raw bytes between quotes without escaping.
    assert_eq!(eval_print(&mut env, "(get-output-stream-string s)"), "\"42\"x\"\n\"");
}

#[test]
fn exit_surfaces_its_code() {
    let mut env = Env::new();
    match env.eval_str("(core::exit 3)") {
        Err(EnvError::Exit(3)) => {}
        other => panic!("expected Exit(3), got {other:?}"),
    }
}

#[test]
fn eval_primitive_compiles_its_argument() {
    let mut env = Env::new();
    assert_eq!(eval_print(&mut env, "(eval '(fixnum+ 1 2))"), "3");
}

#[test]
fn clocks_answers_a_pair_of_fixnums() {
    let mut env = Env::new();
    let value = env.eval_str("(core::clocks)").unwrap();
    assert!(value.is_cons());
}

#[test]
fn env_view_is_a_vector() {
    let mut env = Env::new();
    let printed = eval_print(&mut env, "(core::env-view)");
    assert!(printed.starts_with("#(:t :env"), "got {printed}");
}
