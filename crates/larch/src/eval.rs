use smallvec::SmallVec;

use crate::{
    builtins,
    env::{Env, Frame},
    heap::HeapData,
    types::{
        condition::{raise, CondClass, EvalResult, Unwind},
        cons, symbol,
        vector::{self, VectorData},
    },
    value::{SysClass, Tag},
};

/// Evaluates a compiled form.
///
/// Symbols read their value cell, call forms evaluate head then arguments
/// left to right, and everything else is a constant. A head that evaluates
/// to a keyword must be one of the three evaluator-interpreted operators.
pub(crate) fn eval(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    match env.class_of(form) {
        SysClass::Symbol => {
            if !symbol::is_bound(&env.heap, form) {
                return raise(env, CondClass::Unsym, "(eval)", form);
            }
            Ok(symbol::value_of(&env.heap, form))
        }
        SysClass::Cons => {
            let head = cons::car(&env.heap, form);
            let op = eval(env, head)?;

            if op.is_keyword() {
                return if op == Tag::keyword("quote") {
                    Ok(cons::nth(&env.heap, form, 1))
                } else if op == Tag::T {
                    let consequent = cons::nth(&env.heap, form, 1);
                    eval(env, consequent)
                } else if op == Tag::NIL {
                    let alternative = cons::nth(&env.heap, form, 2);
                    eval(env, alternative)
                } else {
                    raise(env, CondClass::Unfunc, "(eval)", op)
                };
            }

            if op.is_function() {
                // `block` must own its dynamic extent before the thunk
                // argument is evaluated, or a `return` fired during argument
                // evaluation could never find it.
                if core_index(env, op) == Some(env.block_core) {
                    return eval_block(env, form);
                }
                let arg_forms = cons::list_to_vec(&env.heap, cons::cdr(&env.heap, form));
                let mut args: SmallVec<[Tag; 8]> = SmallVec::with_capacity(arg_forms.len());
                for arg_form in arg_forms {
                    args.push(eval(env, arg_form)?);
                }
                return funcall(env, op, &args);
            }

            raise(env, CondClass::Type, "(eval)", op)
        }
        _ => Ok(form),
    }
}

/// Applies a function to already-evaluated arguments.
///
/// Builds the frame's argument vector (packing any rest arguments into a
/// fresh list), pushes the frame and its cache entries, dispatches to the
/// primitive or the compiled body, and pops symmetrically on every path.
pub(crate) fn funcall(env: &mut Env, func: Tag, args: &[Tag]) -> EvalResult<Tag> {
    if !func.is_function() {
        return raise(env, CondClass::Unfunc, "(funcall)", func);
    }
    let (core, nreqs, has_rest, frame_id, form, context) = match env.heap.get(func) {
        HeapData::Function(data) => (
            data.core,
            data.nreqs(),
            data.has_rest(),
            data.frame_id,
            data.form,
            data.context.clone(),
        ),
        _ => return raise(env, CondClass::Unfunc, "(funcall)", func),
    };
    env.tracer.on_apply(frame_id, args.len());

    if args.len() < nreqs {
        let reason = format!(
            "argument list arity: nargs ({}) < nreqs ({nreqs}) (funcall)",
            args.len()
        );
        return raise(env, CondClass::Type, &reason, func);
    }
    if !has_rest && args.len() > nreqs {
        let reason = format!(
            "argument list arity: !rest && nargs ({}) > nreqs ({nreqs}) (funcall)",
            args.len()
        );
        return raise(env, CondClass::Type, &reason, func);
    }

    let nslots = nreqs + usize::from(has_rest);
    let mut argv: Vec<Tag> = Vec::with_capacity(nslots);
    argv.extend_from_slice(&args[..nreqs]);
    if has_rest {
        if args.len() == nreqs {
            argv.push(Tag::NIL);
        } else {
            let rest = cons::list(&mut env.heap, &args[nreqs..]);
            argv.push(rest);
        }
    }

    let argv_tag = if nslots > 0 {
        vector::make_t_vector(&mut env.heap, argv.clone())
    } else {
        Tag::NIL
    };

    env.frames.push(Frame {
        func,
        frame_id,
        argv: argv_tag,
        nargs: nslots,
    });
    if nslots > 0 {
        env.cache_push(frame_id, argv_tag);
    }

    // Captured activations become visible for the extent of this call.
    let mut pushed_context: SmallVec<[u64; 4]> = SmallVec::new();
    for (context_id, context_argv) in &context {
        if vector::length(&env.heap, *context_argv).unwrap_or(0) > 0 {
            env.cache_push(*context_id, *context_argv);
            pushed_context.push(*context_id);
        }
    }

    let result = if let Some(index) = core {
        (builtins::core_def(index).run)(env, &argv)
    } else {
        call_body(env, form)
    };

    for context_id in pushed_context.iter().rev() {
        env.cache_pop(*context_id);
    }
    if nslots > 0 {
        env.cache_pop(frame_id);
    }
    env.frames.pop();

    result
}

/// Evaluates a compiled body left to right; the last form's value wins.
fn call_body(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let body = cons::cdr(&env.heap, form);
    let mut value = Tag::NIL;
    for body_form in cons::list_to_vec(&env.heap, body) {
        value = eval(env, body_form)?;
    }
    Ok(value)
}

fn core_index(env: &Env, func: Tag) -> Option<u16> {
    match env.heap.get(func) {
        HeapData::Function(data) => data.core,
        _ => None,
    }
}

/// `(block :tag thunk-form)`: establishes the catch, then evaluates the
/// thunk form and calls its value inside the dynamic scope.
fn eval_block(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let arg_forms = cons::list_to_vec(&env.heap, cons::cdr(&env.heap, form));
    if arg_forms.len() != 2 {
        return raise(env, CondClass::Type, "block: argument count(2)", form);
    }
    let tag = eval(env, arg_forms[0])?;
    if !tag.is_symbol() {
        return raise(env, CondClass::Type, "is not a symbol (block)", tag);
    }

    let mark = env.frames.len();
    let result = eval(env, arg_forms[1]).and_then(|thunk| {
        if !thunk.is_function() {
            return raise(env, CondClass::Type, "is not a function (block)", thunk);
        }
        funcall(env, thunk, &[])
    });
    catch_throw(env, tag, mark, result)
}

/// Catch side of `block`: a throw with a matching tag is absorbed, anything
/// else keeps unwinding.
pub(crate) fn catch_throw(
    env: &mut Env,
    tag: Tag,
    mark: usize,
    result: EvalResult<Tag>,
) -> EvalResult<Tag> {
    match result {
        Err(Unwind::Throw(pair)) if cons::car(&env.heap, pair) == tag => {
            env.frames.truncate(mark);
            Ok(cons::cdr(&env.heap, pair))
        }
        other => other,
    }
}

/// The `closure` promotion: snapshots the live activation of every function
/// in the lexical environment list into the function's context.
pub(crate) fn promote_closure(env: &mut Env, func: Tag) -> EvalResult<Tag> {
    let captured_env = match env.heap.get(func) {
        HeapData::Function(data) => data.env,
        _ => return raise(env, CondClass::Type, "closure", func),
    };
    if captured_env.is_nil() {
        return Ok(func);
    }

    let mut context: Vec<(u64, Tag)> = Vec::new();
    for captured_fn in cons::list_to_vec(&env.heap, captured_env) {
        let captured_id = match env.heap.get(captured_fn) {
            HeapData::Function(data) => data.frame_id,
            _ => continue,
        };
        let Some(live_argv) = env.cache_top(captured_id) else {
            return raise(env, CondClass::Control, "no active frame (closure)", captured_fn);
        };
        let snapshot_values = match env.heap.get(live_argv) {
            HeapData::Vector(VectorData::T(values)) => values.clone(),
            _ => Vec::new(),
        };
        let snapshot = vector::make_t_vector(&mut env.heap, snapshot_values);
        context.push((captured_id, snapshot));
    }

    if let HeapData::Function(data) = env.heap.get_mut(func) {
        data.context = context;
    }
    Ok(func)
}
