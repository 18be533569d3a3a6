use crate::{
    compile,
    env::Env,
    eval,
    heap::HeapData,
    readtable::{is_constituent, is_whitespace},
    types::{
        condition::{raise, CondClass, EvalResult},
        cons, symbol, vector,
    },
    value::{SysClass, Tag},
};

/// The token the list reader recognizes as the dotted-pair marker. A lone
/// `.` atom and the character literal `#\.` share this word.
pub(crate) const DOT: Tag = Tag::char(b'.');

/// Reads one form from a stream designator.
///
/// Function streams are driven by their callable; everything else goes
/// through the readtable-driven parser. Returns NIL at end of stream.
pub(crate) fn read(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let stream = env.stream_designator(stream)?;
    let stream_fn = match env.heap.get(stream) {
        HeapData::Stream(data) if data.is_function() => Some(data.func),
        _ => None,
    };
    if let Some(func) = stream_fn {
        return eval::funcall(env, func, &[]);
    }
    read_form(env, stream)
}

/// Reads one form from a resolved platform stream.
pub(crate) fn read_form(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    if !skip_whitespace(env, stream) {
        return Ok(Tag::NIL);
    }
    let byte = env.stream_read_byte(stream).expect("lookahead byte vanished");

    // User read macros run before the built-in syntax.
    if let Some(&reader_fn) = env.readtable.get(&byte) {
        return eval::funcall(env, reader_fn, &[stream, Tag::char(byte)]);
    }

    match byte {
        b';' => {
            if !skip_line(env, stream) {
                return Ok(Tag::NIL);
            }
            read_form(env, stream)
        }
        b'(' => read_list(env, stream),
        b'\'' => {
            let form = read_form(env, stream)?;
            if form.is_symbol() || form.is_cons() {
                let quote = Tag::keyword("quote");
                Ok(cons::list(&mut env.heap, &[quote, form]))
            } else {
                Ok(form)
            }
        }
        b'"' => read_string_literal(env, stream),
        b'#' => read_sharp(env, stream),
        b')' => raise(env, CondClass::Read, "naked syntax", Tag::char(b')')),
        _ => {
            env.stream_unread_byte(stream, byte);
            let atom = read_atom(env, stream)?;
            if atom == "." {
                return Ok(DOT);
            }
            if let Some(number) = parse_number(env, &atom)? {
                return Ok(number);
            }
            symbol::parse_symbol(env, &atom, true)
        }
    }
}

/// `#` dispatch.
fn read_sharp(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let Some(byte) = env.stream_read_byte(stream) else {
        return raise(env, CondClass::Eof, "read", stream);
    };
    match byte {
        b'<' => read_broket(env, stream),
        b'x' => read_radix_fixnum(env, stream, 16),
        b'd' => read_radix_fixnum(env, stream, 10),
        b'o' => read_radix_fixnum(env, stream, 8),
        b'\\' => read_char_literal(env, stream),
        b'(' => read_vector(env, stream),
        b'\'' => {
            let form = read_form(env, stream)?;
            let closure = env.sym_closure;
            Ok(cons::list(&mut env.heap, &[closure, form]))
        }
        b':' => {
            let atom = read_atom(env, stream)?;
            if parse_number(env, &atom)?.is_some() {
                let source = vector::make_string(&mut env.heap, atom.as_bytes());
                return raise(env, CondClass::Read, "uninterned symbol", source);
            }
            symbol::parse_symbol(env, &atom, false)
        }
        b'.' => {
            let form = read_form(env, stream)?;
            let compiled = compile::compile(env, form)?;
            eval::eval(env, compiled)
        }
        b'|' => {
            skip_block_comment(env, stream)?;
            read_form(env, stream)
        }
        _ => raise(env, CondClass::Read, "# syntax", Tag::char(byte)),
    }
}

/// Absorbs whitespace and `;` comments; false means end of stream. On true,
/// the next byte is un-consumed lookahead.
pub(crate) fn skip_whitespace(env: &mut Env, stream: Tag) -> bool {
    loop {
        let Some(byte) = env.stream_read_byte(stream) else {
            return false;
        };
        if byte == b';' {
            loop {
                match env.stream_read_byte(stream) {
                    None => return false,
                    Some(b'\n') => break,
                    Some(_) => {}
                }
            }
            continue;
        }
        if !is_whitespace(byte) {
            env.stream_unread_byte(stream, byte);
            return true;
        }
    }
}

/// Consumes the rest of a `;` comment line; false at end of stream.
fn skip_line(env: &mut Env, stream: Tag) -> bool {
    loop {
        match env.stream_read_byte(stream) {
            None => return false,
            Some(b'\n') => return true,
            Some(_) => {}
        }
    }
}

/// `#|...|#`, non-nesting.
fn skip_block_comment(env: &mut Env, stream: Tag) -> EvalResult<()> {
    loop {
        match env.stream_read_byte(stream) {
            None => return raise(env, CondClass::Read, "eof in block comment", Tag::NIL),
            Some(b'|') => match env.stream_read_byte(stream) {
                None => return raise(env, CondClass::Read, "eof in block comment", Tag::NIL),
                Some(b'#') => return Ok(()),
                Some(other) => env.stream_unread_byte(stream, other),
            },
            Some(_) => {}
        }
    }
}

/// Reads a run of constituent bytes, leaving the terminator un-consumed.
fn read_atom(env: &mut Env, stream: Tag) -> EvalResult<String> {
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        match env.stream_read_byte(stream) {
            None => break,
            Some(byte) if is_constituent(byte) => bytes.push(byte),
            Some(byte) => {
                env.stream_unread_byte(stream, byte);
                break;
            }
        }
    }
    if bytes.is_empty() {
        return raise(env, CondClass::Parse, "naked atom syntax (read-atom)", Tag::NIL);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// List syntax, `(` already consumed. A lone `.` between the final two
/// elements produces a dotted pair.
fn read_list(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let mut items: Vec<Tag> = Vec::new();

    if !skip_whitespace(env, stream) {
        return raise(env, CondClass::Parse, "early end of file in list form (read)", Tag::NIL);
    }
    let byte = env.stream_read_byte(stream).expect("lookahead byte vanished");
    if byte == b')' {
        return Ok(Tag::NIL);
    }
    env.stream_unread_byte(stream, byte);

    loop {
        let element = read_form(env, stream)?;

        if element == DOT {
            if items.is_empty() {
                return raise(env, CondClass::Parse, "syntax problem in dotted form (read)", Tag::NIL);
            }
            let tail = read_form(env, stream)?;
            items.push(tail);
            if !skip_whitespace(env, stream) {
                return raise(env, CondClass::Parse, "early end of file in dotted form", Tag::NIL);
            }
            let byte = env.stream_read_byte(stream).expect("lookahead byte vanished");
            if byte != b')' {
                return raise(env, CondClass::Parse, "syntax problem in dotted form (read)", Tag::char(byte));
            }
            return Ok(cons::list_dot(&mut env.heap, &items));
        }

        items.push(element);

        if !skip_whitespace(env, stream) {
            return raise(env, CondClass::Parse, "early end of file in list form (read)", Tag::NIL);
        }
        let byte = env.stream_read_byte(stream).expect("lookahead byte vanished");
        if byte == b')' {
            return Ok(cons::list(&mut env.heap, &items));
        }
        env.stream_unread_byte(stream, byte);
    }
}

/// String syntax, opening `"` consumed. `\` escapes the next byte literally.
fn read_string_literal(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        let Some(byte) = env.stream_read_byte(stream) else {
            return raise(env, CondClass::Eof, "EOF in string", stream);
        };
        match byte {
            b'"' => break,
            b'\\' => {
                let Some(escaped) = env.stream_read_byte(stream) else {
                    return raise(env, CondClass::Eof, "EOF in string", stream);
                };
                bytes.push(escaped);
            }
            _ => bytes.push(byte),
        }
    }
    Ok(vector::make_string(&mut env.heap, &bytes))
}

/// `#\` character literals, named or single-byte.
fn read_char_literal(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let Some(first) = env.stream_read_byte(stream) else {
        return raise(env, CondClass::Read, "eof in #\\", Tag::NIL);
    };
    if is_whitespace(first) {
        return raise(env, CondClass::Read, "malformed character literal", Tag::NIL);
    }

    let mut name = String::new();
    name.push(first as char);
    loop {
        match env.stream_read_byte(stream) {
            None => break,
            Some(byte) if is_constituent(byte) => name.push(byte as char),
            Some(byte) => {
                env.stream_unread_byte(stream, byte);
                break;
            }
        }
    }

    if name.len() == 1 {
        return Ok(Tag::char(first));
    }
    match name.as_str() {
        "newline" | "linefeed" => Ok(Tag::char(0x0a)),
        "space" => Ok(Tag::char(b' ')),
        "tab" => Ok(Tag::char(0x09)),
        "return" => Ok(Tag::char(0x0d)),
        "page" => Ok(Tag::char(0x0c)),
        "rubout" => Ok(Tag::char(0x7f)),
        "backspace" => Ok(Tag::char(0x08)),
        _ => {
            let source = vector::make_string(&mut env.heap, name.as_bytes());
            raise(env, CondClass::Read, "unmapped char", source)
        }
    }
}

/// `#(` vector syntax: the first element is the element-class keyword.
fn read_vector(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let class = read_form(env, stream)?;
    if !class.is_keyword() {
        return raise(env, CondClass::Type, "type botch in vector reader", class);
    }
    let elements = read_list(env, stream)?;
    vector::list_to_vector(env, class, elements)
}

/// `#<type #xHEX attrs>`: re-reads an opaque printed value as the raw word.
fn read_broket(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    let class = read_form(env, stream)?;
    let word = read_form(env, stream)?;
    // The attribute list only keeps the reader from bumping into the `>`.
    let _attrs = read_form(env, stream)?;

    let Some(bracket) = env.stream_read_byte(stream) else {
        return raise(env, CondClass::Eof, "read", stream);
    };
    if bracket != b'>' {
        return raise(env, CondClass::Type, "broket syntax (terminal)", Tag::char(bracket));
    }
    if !class.is_keyword() || SysClass::from_keyword(class).is_none() {
        return raise(env, CondClass::Type, "broket syntax (class)", class);
    }
    if !word.is_fixnum() {
        return raise(env, CondClass::Type, "broket syntax (type)", word);
    }
    Ok(Tag::from_bits(word.as_fixnum() as u64))
}

/// `#x` / `#d` / `#o` radixed fixnums.
fn read_radix_fixnum(env: &mut Env, stream: Tag, radix: u32) -> EvalResult<Tag> {
    let atom = read_atom(env, stream)?;
    let (negative, digits) = strip_sign(&atom);
    match i64::from_str_radix(digits, radix) {
        Ok(magnitude) => {
            let n = if negative { -magnitude } else { magnitude };
            fixnum_checked(env, n, &atom)
        }
        Err(_) => {
            let source = vector::make_string(&mut env.heap, atom.as_bytes());
            raise(env, CondClass::Parse, "parse-number", source)
        }
    }
}

fn strip_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Rejects values that would collide with the tag field.
fn fixnum_checked(env: &mut Env, n: i64, atom: &str) -> EvalResult<Tag> {
    if Tag::fits_fixnum(n) {
        Ok(Tag::fixnum(n))
    } else {
        let source = vector::make_string(&mut env.heap, atom.as_bytes());
        raise(env, CondClass::Parse, "parse-number:fixnum", source)
    }
}

/// Parses an unadorned atom as a number: fixnum first (with `0x` and leading-
/// zero octal auto-detection), then single-precision float. `Ok(None)` means
/// the atom is a symbol.
fn parse_number(env: &mut Env, atom: &str) -> EvalResult<Option<Tag>> {
    if let Some(n) = parse_fixnum_auto(atom) {
        return fixnum_checked(env, n, atom).map(Some);
    }
    if looks_numeric(atom) {
        if let Ok(value) = atom.parse::<f32>() {
            return Ok(Some(Tag::float(value)));
        }
    }
    Ok(None)
}

fn parse_fixnum_auto(atom: &str) -> Option<i64> {
    let (negative, digits) = strip_sign(atom);
    if digits.is_empty() {
        return None;
    }
    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1
        && digits.starts_with('0')
        && digits.bytes().all(|b| (b'0'..=b'7').contains(&b))
    {
        i64::from_str_radix(digits, 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Guard so symbol atoms like `inf` or `e` never reach the float parser.
fn looks_numeric(atom: &str) -> bool {
    let (_, digits) = strip_sign(atom);
    digits.bytes().next().is_some_and(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().any(|b| b.is_ascii_digit())
}
