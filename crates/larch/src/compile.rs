use crate::{
    env::Env,
    eval,
    heap::HeapData,
    types::{
        condition::{raise, CondClass, EvalResult},
        cons,
        function::FunctionData,
        symbol,
    },
    value::{SysClass, Tag},
};

/// The special operator keywords handled structurally by the compiler.
const SPEC_OPS: [&str; 7] = ["defsym", "lambda", "letq", "macro", "quote", "t", "nil"];

pub(crate) fn is_spec_op(tag: Tag) -> bool {
    tag.is_keyword() && SPEC_OPS.iter().any(|name| Tag::keyword(name) == tag)
}

/// Rewrites a reader form into an evaluator-ready form.
///
/// Lexically visible symbols become `(frame-ref id offset)` calls, macro
/// calls expand until their head is no longer a macro, and special operators
/// dispatch structurally. Everything else passes through with its elements
/// compiled.
pub(crate) fn compile(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    match env.class_of(form) {
        SysClass::Cons => {
            let head = cons::car(&env.heap, form);
            match env.class_of(head) {
                SysClass::Cons => compile_list(env, form),
                SysClass::Symbol => {
                    if lexical_ref(env, head).is_some() {
                        return compile_list(env, form);
                    }
                    if !macro_function(env, head).is_nil() {
                        let expanded = macroexpand(env, form)?;
                        return compile(env, expanded);
                    }
                    if is_spec_op(head) {
                        return compile_special(env, head, form);
                    }
                    if !symbol::is_bound(&env.heap, head) {
                        return raise(env, CondClass::Unsym, "compile: function symbol", head);
                    }
                    compile_list(env, form)
                }
                SysClass::Function => compile_list(env, form),
                _ => raise(env, CondClass::Type, "compile: function type", head),
            }
        }
        SysClass::Symbol => {
            if let Some((func, offset)) = lexical_ref(env, form) {
                let frame_id = frame_id_of(env, func);
                let frame_ref = env.sym_frame_ref;
                let rewrite = [frame_ref, Tag::fixnum(frame_id as i64), Tag::fixnum(offset as i64)];
                Ok(cons::list(&mut env.heap, &rewrite))
            } else {
                Ok(form)
            }
        }
        _ => Ok(form),
    }
}

/// Compiles each element of a call form.
fn compile_list(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let items = cons::list_to_vec(&env.heap, form);
    let mut compiled = Vec::with_capacity(items.len());
    for item in items {
        compiled.push(compile(env, item)?);
    }
    Ok(cons::list(&mut env.heap, &compiled))
}

/// Scans the lexical environment innermost-outward for `sym`.
///
/// Returns the enclosing function and the symbol's position in its lambda
/// list. Keywords are never lexical.
fn lexical_ref(env: &Env, sym: Tag) -> Option<(Tag, usize)> {
    if sym.is_keyword() || !sym.is_symbol() {
        return None;
    }
    for &func in env.lexenv.iter().rev() {
        let lexicals = lexicals_of(env, func);
        let names = cons::list_to_vec(&env.heap, lexicals);
        if let Some(offset) = names.iter().position(|&name| name == sym) {
            return Some((func, offset));
        }
    }
    None
}

/// The lambda list of a compiled function: `car` of its lambda descriptor.
fn lexicals_of(env: &Env, func: Tag) -> Tag {
    let form = match env.heap.get(func) {
        HeapData::Function(data) => data.form,
        _ => return Tag::NIL,
    };
    let descriptor = cons::car(&env.heap, form);
    cons::car(&env.heap, descriptor)
}

fn frame_id_of(env: &Env, func: Tag) -> u64 {
    match env.heap.get(func) {
        HeapData::Function(data) => data.frame_id,
        _ => 0,
    }
}

/// The macro expander bound to `sym`, or NIL.
pub(crate) fn macro_function(env: &Env, sym: Tag) -> Tag {
    if sym.is_keyword() || !sym.is_symbol() {
        return Tag::NIL;
    }
    if !symbol::is_bound(&env.heap, sym) {
        return Tag::NIL;
    }
    let value = symbol::value_of(&env.heap, sym);
    if value.is_extended() {
        if let HeapData::Macro { func } = env.heap.get(value) {
            return *func;
        }
    }
    Tag::NIL
}

/// Expands a macro call until its head is no longer a macro.
pub(crate) fn macroexpand(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let mut expanded = form;
    loop {
        if !expanded.is_cons() {
            return Ok(expanded);
        }
        let head = cons::car(&env.heap, expanded);
        let expander = macro_function(env, head);
        if expander.is_nil() {
            return Ok(expanded);
        }
        let args = cons::list_to_vec(&env.heap, cons::cdr(&env.heap, expanded));
        expanded = eval::funcall(env, expander, &args)?;
    }
}

fn compile_special(env: &mut Env, op: Tag, form: Tag) -> EvalResult<Tag> {
    if op == Tag::keyword("quote") {
        return special_quote(env, form);
    }
    if op == Tag::keyword("lambda") {
        return special_lambda(env, form, false);
    }
    if op == Tag::keyword("macro") {
        return special_lambda(env, form, true);
    }
    if op == Tag::keyword("defsym") {
        return special_defsym(env, form);
    }
    if op == Tag::keyword("letq") {
        return special_letq(env, form);
    }
    // :t and :nil pass through; the evaluator interprets the head.
    let len = cons::length_checked(env, form)?;
    if len != 3 {
        let reason = if op == Tag::T {
            ":t: argument count(2)"
        } else {
            ":nil: argument count(2)"
        };
        return raise(env, CondClass::Type, reason, form);
    }
    compile_list(env, form)
}

/// `(:quote x)` passes through unchanged.
fn special_quote(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let len = cons::length_checked(env, form)?;
    if len != 2 {
        return raise(env, CondClass::Type, ":quote: argument count(1)", form);
    }
    Ok(form)
}

/// `(:defsym sym expr)`: evaluates the compiled expression at compile time,
/// binds the symbol, and leaves a quote of it behind.
fn special_defsym(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let len = cons::length_checked(env, form)?;
    if len != 3 {
        return raise(env, CondClass::Type, ":defsym: argument count(2)", form);
    }
    let args = cons::cdr(&env.heap, form);
    let sym = cons::nth(&env.heap, args, 0);
    let expr = cons::nth(&env.heap, args, 1);

    if !sym.is_symbol() {
        return raise(env, CondClass::Type, "is not a symbol (:defsym)", sym);
    }
    if sym.is_keyword() {
        return raise(env, CondClass::Type, "can't bind keywords (:defsym)", sym);
    }
    if symbol::is_bound(&env.heap, sym) {
        return raise(env, CondClass::Cell, "symbol previously bound (:defsym)", sym);
    }

    let compiled = compile(env, expr)?;
    let value = eval::eval(env, compiled)?;
    symbol::bind(&mut env.heap, sym, value);

    // Defining a function names it after its defining symbol.
    if value.is_function() {
        if let HeapData::Function(data) = env.heap.get_mut(value) {
            data.name = sym;
        }
    }

    let quote = Tag::keyword("quote");
    Ok(cons::list(&mut env.heap, &[quote, sym]))
}

/// `(:letq sym expr)`: requires `sym` to be lexically visible and rewrites
/// into a direct call of the `letq` primitive on its frame slot.
fn special_letq(env: &mut Env, form: Tag) -> EvalResult<Tag> {
    let len = cons::length_checked(env, form)?;
    if len != 3 {
        return raise(env, CondClass::Type, ":letq: argument count(2)", form);
    }
    let args = cons::cdr(&env.heap, form);
    let sym = cons::nth(&env.heap, args, 0);
    let expr = cons::nth(&env.heap, args, 1);

    if !sym.is_symbol() {
        return raise(env, CondClass::Type, ":letq", sym);
    }
    let resolved = compile(env, sym)?;
    if !resolved.is_cons() {
        return raise(env, CondClass::Type, ":letq", resolved);
    }

    let frame_id = cons::nth(&env.heap, resolved, 1);
    let offset = cons::nth(&env.heap, resolved, 2);
    let compiled = compile(env, expr)?;
    let letq = env.sym_letq;
    Ok(cons::list(&mut env.heap, &[letq, frame_id, offset, compiled]))
}

/// `(:lambda params . body)` and `(:macro params . body)`.
fn special_lambda(env: &mut Env, form: Tag, as_macro: bool) -> EvalResult<Tag> {
    let len = cons::length_checked(env, form)?;
    if len == 1 {
        return raise(env, CondClass::Type, ":lambda: argument count(1*)", form);
    }
    let args = cons::cdr(&env.heap, form);
    let lambda_list = cons::nth(&env.heap, args, 0);
    if !lambda_list.is_list() {
        return raise(env, CondClass::Type, ":lambda", lambda_list);
    }

    let func = compile_lambda(env, args)?;
    if as_macro {
        Ok(env.heap.alloc(HeapData::Macro { func }))
    } else {
        Ok(func)
    }
}

/// Builds a function from `(lambda-list . body)`, compiling the body inside
/// a scope where the new function is on the lexical environment.
fn compile_lambda(env: &mut Env, args: Tag) -> EvalResult<Tag> {
    let lambda_list = cons::car(&env.heap, args);
    let body = cons::cdr(&env.heap, args);

    let (lexicals, restsym) = parse_lambda_list(env, lambda_list)?;
    let has_rest = !restsym.is_nil();
    let required = lexicals.len() - usize::from(has_rest);
    let arity = FunctionData::encode_arity(required, has_rest);

    let lexicals_list = cons::list(&mut env.heap, &lexicals);
    let descriptor = cons::cons(&mut env.heap, lexicals_list, restsym);
    let initial_form = cons::cons(&mut env.heap, descriptor, Tag::NIL);
    let captured_env = {
        let lexenv = env.lexenv.clone();
        cons::list(&mut env.heap, &lexenv)
    };

    let frame_id = env.next_frame_id();
    let func = env.heap.alloc(HeapData::Function(FunctionData {
        name: Tag::NIL,
        core: None,
        form: initial_form,
        env: captured_env,
        frame_id,
        arity,
        context: Vec::new(),
    }));

    // Parameterless lambdas contribute nothing to lexical resolution.
    let scoped = arity != 0;
    if scoped {
        env.lexenv.push(func);
    }

    let mut compiled_body = Vec::new();
    let mut failure = None;
    for item in cons::list_to_vec(&env.heap, body) {
        match compile(env, item) {
            Ok(compiled) => compiled_body.push(compiled),
            Err(unwind) => {
                failure = Some(unwind);
                break;
            }
        }
    }
    if scoped {
        env.lexenv.pop();
    }
    if let Some(unwind) = failure {
        return Err(unwind);
    }

    let body_list = cons::list(&mut env.heap, &compiled_body);
    let final_form = cons::cons(&mut env.heap, descriptor, body_list);
    if let HeapData::Function(data) = env.heap.get_mut(func) {
        data.form = final_form;
    }
    Ok(func)
}

/// Parses a lambda list into its positional symbols and optional rest
/// symbol. The rest symbol, when present, terminates the list and is kept at
/// the end of the lexicals so it owns the final frame slot.
fn parse_lambda_list(env: &mut Env, lambda_list: Tag) -> EvalResult<(Vec<Tag>, Tag)> {
    if cons::proper_length(&env.heap, lambda_list).is_none() {
        return raise(env, CondClass::Type, "non-symbol in lambda list (parse-lambda)", lambda_list);
    }

    let rest_marker = Tag::keyword("rest");
    let mut lexicals: Vec<Tag> = Vec::new();
    let mut has_rest = false;
    let mut restsym = Tag::NIL;

    for item in cons::list_to_vec(&env.heap, lambda_list) {
        if !item.is_symbol() {
            return raise(env, CondClass::Type, "non-symbol in lambda list (parse-lambda)", lambda_list);
        }
        if item == rest_marker {
            if has_rest {
                return raise(env, CondClass::Parse, "multiple rest clauses (parse-lambda)", lambda_list);
            }
            has_rest = true;
            continue;
        }
        if item.is_keyword() {
            return raise(
                env,
                CondClass::Type,
                "keyword cannot be used as a lexical variable (parse-lambda)",
                lambda_list,
            );
        }
        if has_rest && !restsym.is_nil() {
            return raise(env, CondClass::Parse, ":rest should terminate lambda list (parse-lambda)", lambda_list);
        }
        if lexicals.contains(&item) {
            return raise(env, CondClass::Parse, "duplicate symbol in lambda list (parse-lambda)", lambda_list);
        }
        if has_rest {
            restsym = item;
        }
        lexicals.push(item);
    }

    if has_rest && restsym.is_nil() {
        return raise(env, CondClass::Parse, "early end of lambda list (parse-lambda)", lambda_list);
    }

    Ok((lexicals, restsym))
}
