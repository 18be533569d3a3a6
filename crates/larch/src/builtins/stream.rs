use std::path::Path;

use super::{expect_char, expect_fixnum, expect_function, expect_stream, expect_string};
use crate::{
    env::{self, Env},
    eval,
    heap::HeapData,
    print as printer, read as reader,
    types::condition::{raise, CondClass, EvalResult},
    types::{
        stream::StreamData,
        vector,
    },
    value::Tag,
};

pub(crate) fn streamp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    Ok(Tag::bool(env.is_stream(args[0])))
}

fn is_function_stream(env: &Env, stream: Tag) -> bool {
    matches!(env.heap.try_get(stream), Some(HeapData::Stream(data)) if data.is_function())
}

fn stream_function(env: &Env, stream: Tag) -> Tag {
    match env.heap.try_get(stream) {
        Some(HeapData::Stream(data)) => data.func,
        _ => Tag::NIL,
    }
}

pub(crate) fn open_input_file(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let path = expect_string(env, args[0], "argument must be a filespec (open-input-file)")?;
    match env.streams.open_input_file(Path::new(&path)) {
        Ok(id) => Ok(env.make_stream(id)),
        Err(_) => raise(env, CondClass::File, "cannot open (open-input-file)", args[0]),
    }
}

pub(crate) fn open_output_file(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let path = expect_string(env, args[0], "argument must be a filespec (open-output-file)")?;
    match env.streams.open_output_file(Path::new(&path)) {
        Ok(id) => Ok(env.make_stream(id)),
        Err(_) => raise(env, CondClass::File, "cannot open (open-output-file)", args[0]),
    }
}

pub(crate) fn open_input_string(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let text = expect_string(env, args[0], "argument must be a string (open-input-string)")?;
    let id = env.streams.open_input_string(text.into_bytes());
    Ok(env.make_stream(id))
}

pub(crate) fn open_output_string(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let text = expect_string(env, args[0], "argument must be a string (open-output-string)")?;
    let id = env.streams.open_output_string(text.into_bytes());
    Ok(env.make_stream(id))
}

/// `(open-stream fn)`: a stream driven by a function.
pub(crate) fn open_stream(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let func = expect_function(env, args[0], "argument must be a function (open-stream)")?;
    Ok(env.heap.alloc(HeapData::Stream(StreamData { id: None, func })))
}

pub(crate) fn get_output_stream_string(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stream = expect_stream(env, args[0], "argument must be a stream (get-output-stream-string)")?;
    let Some(id) = env.stream_platform_id(stream) else {
        return raise(
            env,
            CondClass::Type,
            "argument must be a string stream (get-output-stream-string)",
            stream,
        );
    };
    if !env.streams.is_output_string(id) {
        return raise(
            env,
            CondClass::Type,
            "argument must be a string stream (get-output-stream-string)",
            stream,
        );
    }
    let bytes = env.streams.take_string(id).unwrap_or_default();
    Ok(vector::make_string(&mut env.heap, &bytes))
}

pub(crate) fn close(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stream = expect_stream(env, args[0], "(close)")?;
    let Some(id) = env.stream_platform_id(stream) else {
        return raise(env, CondClass::Stream, "cannot close a function stream (close)", stream);
    };
    env.streams.close(id);
    Ok(Tag::T)
}

pub(crate) fn eofp(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stream = env.stream_designator(args[0])?;
    if is_function_stream(env, stream) {
        return Ok(Tag::NIL);
    }
    Ok(Tag::bool(env.stream_is_eof(stream)))
}

/// `(read-char stream)`: a char, or NIL once the stream runs dry mid-read.
pub(crate) fn read_char(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stream = env.stream_designator(args[0])?;
    if is_function_stream(env, stream) {
        let func = stream_function(env, stream);
        let value = eval::funcall(env, func, &[])?;
        if !value.is_char() {
            return raise(env, CondClass::Type, "function stream returns non-char (read-char)", stream);
        }
        return Ok(value);
    }
    if env.stream_is_eof(stream) {
        return raise(env, CondClass::Eof, "(read-char)", args[0]);
    }
    match env.stream_read_byte(stream) {
        Some(byte) => Ok(Tag::char(byte)),
        None => Ok(Tag::NIL),
    }
}

/// `(read-byte stream)`: a fixnum in [0, 255], or NIL at end of stream.
pub(crate) fn read_byte(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let stream = env.stream_designator(args[0])?;
    if is_function_stream(env, stream) {
        let func = stream_function(env, stream);
        let value = eval::funcall(env, func, &[])?;
        if !value.is_fixnum() || !(0..=255).contains(&value.as_fixnum()) {
            return raise(env, CondClass::Type, "function stream returns non-byte (read-byte)", stream);
        }
        return Ok(value);
    }
    if env.stream_is_eof(stream) {
        return raise(env, CondClass::Eof, "(read-byte)", args[0]);
    }
    match env.stream_read_byte(stream) {
        Some(byte) => Ok(Tag::fixnum(i64::from(byte))),
        None => Ok(Tag::NIL),
    }
}

pub(crate) fn unread_char(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let byte = expect_char(env, args[0], "not a character (unread-char)")?;
    let stream = env.stream_designator(args[1])?;
    if is_function_stream(env, stream) {
        return raise(
            env,
            CondClass::Type,
            "may not reverse time on a function stream (unread-char)",
            stream,
        );
    }
    env.stream_unread_byte(stream, byte);
    Ok(args[0])
}

pub(crate) fn write_char(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let byte = expect_char(env, args[0], "(write-char)")?;
    let stream = env.stream_designator(args[1])?;
    env.stream_write_byte(stream, byte);
    Ok(args[0])
}

pub(crate) fn write_byte(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let byte = expect_fixnum(env, args[0], "(write-byte)")?;
    if !(0..=255).contains(&byte) {
        return raise(env, CondClass::Range, "(write-byte)", args[0]);
    }
    let stream = env.stream_designator(args[1])?;
    env.stream_write_byte(stream, byte as u8);
    Ok(args[0])
}

pub(crate) fn read(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    reader::read(env, args[0])
}

/// `(print object stream escape)`: prints and returns the object.
pub(crate) fn print(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    printer::print(env, args[0], args[1], !args[2].is_nil())?;
    Ok(args[0])
}

pub(crate) fn terpri(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    printer::terpri(env, args[0])?;
    Ok(Tag::NIL)
}

pub(crate) fn load(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let path = expect_string(env, args[0], "argument must be a filespec (load)")?;
    env::load_file(env, &path)
}

/// `(set-macro-character char fn)`: installs a user reader for `char`.
pub(crate) fn set_macro_character(env: &mut Env, args: &[Tag]) -> EvalResult<Tag> {
    let byte = expect_char(env, args[0], "(set-macro-character)")?;
    let func = expect_function(env, args[1], "(set-macro-character)")?;
    env.readtable.insert(byte, func);
    Ok(Tag::T)
}
