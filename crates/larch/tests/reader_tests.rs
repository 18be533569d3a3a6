//! Reader behavior: lexical syntax, `#` dispatch, numbers, symbols, and the
//! round trips the printer is expected to close.

use larch::{Env, EnvError, Tag};
use pretty_assertions::assert_eq;

fn read_print(src: &str, escape: bool) -> String {
    let mut env = Env::new();
    let form = env.read_str(src).unwrap();
    env.print_to_string(form, escape)
}

#[test]
fn fixnums_read_in_every_radix() {
    let mut env = Env::new();
    for (src, expected) in [
        ("42", 42),
        ("-7", -7),
        ("0x10", 16),
        ("010", 8),
        ("#x2a", 42),
        ("#d42", 42),
        ("#o52", 42),
        ("#x-1", -1),
    ] {
        let form = env.read_str(src).unwrap();
        assert!(form.is_fixnum(), "{src} should read as a fixnum");
        assert_eq!(form.as_fixnum(), expected, "{src}");
    }
}

#[test]
fn fixnum_literals_outside_62_bits_are_rejected() {
    let mut env = Env::new();
    // i64::MAX needs 63 bits; the top two payload bits would disagree.
    match env.read_str("9223372036854775807") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":parse"),
        other => panic!("expected a parse condition, got {other:?}"),
    }
}

#[test]
fn fixnum_boundaries_round_trip() {
    let mut env = Env::new();
    for src in ["2305843009213693951", "-2305843009213693952"] {
        let form = env.read_str(src).unwrap();
        assert!(form.is_fixnum());
        assert_eq!(env.print_to_string(form, false), src);
    }
}

#[test]
fn floats_read_as_single_precision() {
    let mut env = Env::new();
    let form = env.read_str("1.5").unwrap();
    assert!(form.is_float());
    assert_eq!(form.as_float(), 1.5f32);
    assert_eq!(env.print_to_string(form, true), "1.5");
}

#[test]
fn short_strings_are_identical_immediates() {
    let mut env = Env::new();
    let t = env.eval_str("(eq \"abc\" \"abc\")").unwrap();
    assert_eq!(t, Tag::T);
    // Heap strings have per-object identity.
    let nil = env.eval_str("(eq \"longerstring\" \"longerstring\")").unwrap();
    assert_eq!(nil, Tag::NIL);
}

#[test]
fn short_string_print_round_trip() {
    for s in ["", "a", "7bytes!"] {
        let quoted = format!("\"{s}\"");
        assert_eq!(read_print(&quoted, true), quoted);
    }
}

#[test]
fn string_escapes_take_the_next_byte_literally() {
    assert_eq!(read_print("\"a\\\"b\"", false), "a\"b");
    assert_eq!(read_print("\"a\\\\b\"", false), "a\\b");
}

#[test]
fn char_literals_named_and_plain() {
    let mut env = Env::new();
    for (src, byte) in [
        ("#\\a", b'a'),
        ("#\\(", b'('),
        ("#\\newline", 0x0a),
        ("#\\space", b' '),
        ("#\\tab", 0x09),
        ("#\\return", 0x0d),
        ("#\\linefeed", 0x0a),
        ("#\\page", 0x0c),
        ("#\\rubout", 0x7f),
        ("#\\backspace", 0x08),
    ] {
        let form = env.read_str(src).unwrap();
        assert!(form.is_char(), "{src}");
        assert_eq!(form.as_char(), byte, "{src}");
    }
}

#[test]
fn char_print_round_trip() {
    assert_eq!(read_print("#\\newline", true), "#\\newline");
    assert_eq!(read_print("#\\a", true), "#\\a");
    assert_eq!(read_print("#\\a", false), "a");
}

#[test]
fn unmapped_char_names_are_read_errors() {
    let mut env = Env::new();
    match env.read_str("#\\frobnicate") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":read"),
        other => panic!("expected a read condition, got {other:?}"),
    }
}

#[test]
fn lists_and_dotted_pairs() {
    assert_eq!(read_print("(1 2 3)", true), "(1 2 3)");
    assert_eq!(read_print("(1 . 2)", true), "(1 . 2)");
    assert_eq!(read_print("(1 2 . 3)", true), "(1 2 . 3)");
    assert_eq!(read_print("((1 2) (3))", true), "((1 2) (3))");
    assert_eq!(read_print("()", true), ":nil");
}

#[test]
fn stray_close_paren_is_a_read_error() {
    let mut env = Env::new();
    match env.read_str(")") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":read"),
        other => panic!("expected a read condition, got {other:?}"),
    }
}

#[test]
fn unterminated_list_is_a_parse_error() {
    let mut env = Env::new();
    match env.read_str("(1 2") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":parse"),
        other => panic!("expected a parse condition, got {other:?}"),
    }
}

#[test]
fn quote_sugar_wraps_symbols_and_lists() {
    // Current-namespace symbols print with an elided qualifier; keywords
    // carry their colon in both modes.
    assert_eq!(read_print("'x", true), "(:quote :x)");
    assert_eq!(read_print("'x", false), "(:quote x)");
    assert_eq!(read_print("'(1 2)", true), "(:quote (1 2))");
    // Self-evaluating forms pass through unwrapped.
    assert_eq!(read_print("'3", true), "3");
}

#[test]
fn comments_are_whitespace() {
    assert_eq!(read_print("; leading\n42", true), "42");
    assert_eq!(read_print("#| block |# 42", true), "42");
    assert_eq!(read_print("(1 ; inline\n 2)", true), "(1 2)");
}

#[test]
fn keywords_read_and_cap_at_seven_bytes() {
    let mut env = Env::new();
    let kw = env.read_str(":foo").unwrap();
    assert!(kw.is_keyword());
    assert_eq!(env.print_to_string(kw, true), ":foo");

    match env.read_str(":eightlong") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":parse"),
        other => panic!("expected a parse condition, got {other:?}"),
    }
}

#[test]
fn uninterned_symbols_have_no_namespace() {
    let mut env = Env::new();
    let value = env.eval_str("(symbol-ns (make-symbol \"g1\"))").unwrap();
    assert_eq!(value, Tag::NIL);
    let sym = env.read_str("#:gen").unwrap();
    assert!(sym.is_symbol() && !sym.is_keyword());
    assert_eq!(env.print_to_string(sym, true), "#:gen");
}

#[test]
fn vectors_read_with_a_class_keyword() {
    assert_eq!(read_print("#(:t 1 2 3)", true), "#(:t 1 2 3)");
    assert_eq!(read_print("#(:fixnum 1 2)", true), "#(:fixnum 1 2)");
    assert_eq!(read_print("#(:byte 7 8)", true), "#(:byte 7 8)");
    assert_eq!(read_print("#(:float 1.5)", true), "#(:float 1.5)");
    // Character vectors are strings.
    assert_eq!(read_print("#(:char #\\h #\\i)", true), "\"hi\"");
}

#[test]
fn vector_elements_must_match_the_class() {
    let mut env = Env::new();
    match env.read_str("#(:fixnum 1 :oops)") {
        Err(EnvError::Condition(exception)) => assert_eq!(exception.class, ":type"),
        other => panic!("expected a type condition, got {other:?}"),
    }
}

#[test]
fn read_time_eval() {
    let mut env = Env::new();
    let form = env.read_str("#.(fixnum+ 1 2)").unwrap();
    assert_eq!(form.as_fixnum(), 3);
}

#[test]
fn broket_syntax_round_trips_opaque_objects() {
    let mut env = Env::new();
    let stream = env.eval_str("(open-input-string \"x\")").unwrap();
    let printed = env.print_to_string(stream, true);
    assert!(printed.starts_with("#<:stream #x"), "got {printed}");
    let reread = env.read_str(&printed).unwrap();
    assert_eq!(reread, stream);
}

#[test]
fn dotted_pair_via_char_dot_matches_the_reader_token() {
    // The `.` token and `#\.` share a word; a lone dot in list position is
    // always the pair marker.
    assert_eq!(read_print("(1 . (2 3))", true), "(1 2 3)");
}

#[test]
fn user_read_macros_dispatch_through_the_readtable() {
    let mut env = Env::new();
    env.eval_str("(set-macro-character #\\! (:lambda (stream ch) 99))")
        .unwrap();
    let value = env.eval_str("(read (open-input-string \"!\"))").unwrap();
    assert_eq!(value.as_fixnum(), 99);
}
