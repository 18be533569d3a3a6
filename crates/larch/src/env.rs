use std::time::{Instant, SystemTime, UNIX_EPOCH};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    builtins, compile,
    exception::{EnvError, Exception},
    eval,
    heap::{Heap, HeapData, HeapStats},
    namespace,
    print, read,
    tracer::{EvalTracer, NoopTracer},
    types::{
        condition::{raise, CondClass, EvalResult, Unwind},
        cons,
        function::FunctionData,
        stream::{StreamData, StreamId, StreamTable},
        symbol, vector,
    },
    value::{LowTag, SysClass, Tag},
};

/// Name of the namespace carrying the built-in functions.
pub(crate) const CORE_NS: &str = "core";

/// One call activation.
///
/// The argument vector is a heap `:t` vector so the frame cache, closure
/// snapshots, and `letq` all address the same representation and the
/// collector sees arguments through the ordinary root walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub func: Tag,
    pub frame_id: u64,
    pub argv: Tag,
    pub nargs: usize,
}

/// The runtime environment. Owns the heap, the namespace table, the frame
/// stack and cache, the readtable, and the standard streams; multiple
/// environments are fully independent.
pub struct Env {
    pub(crate) heap: Heap,
    pub(crate) streams: StreamTable,
    /// Name to namespace object, in creation order.
    pub(crate) namespaces: IndexMap<String, Tag>,
    pub(crate) core_ns: Tag,
    pub(crate) current_ns: Tag,
    /// The active call chain, oldest first.
    pub(crate) frames: Vec<Frame>,
    /// frame id to stack of argument vectors, for closure lookups.
    pub(crate) frame_cache: AHashMap<u64, Vec<Tag>>,
    next_frame_id: u64,
    /// Enclosing lambdas during compilation.
    pub(crate) lexenv: Vec<Tag>,
    /// User read-macro table: byte to reader function.
    pub(crate) readtable: AHashMap<u8, Tag>,
    /// Symbols bound to the standard streams.
    pub(crate) standard_input: Tag,
    pub(crate) standard_output: Tag,
    pub(crate) error_output: Tag,
    /// Interned handles the compiler and reader rewrite through.
    pub(crate) sym_frame_ref: Tag,
    pub(crate) sym_letq: Tag,
    pub(crate) sym_closure: Tag,
    /// Combined-table index of the `block` primitive.
    pub(crate) block_core: u16,
    pub(crate) src: Tag,
    start: Instant,
    pub(crate) tracer: Box<dyn EvalTracer>,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Builds an environment wired to the process standard streams, with the
    /// core namespace populated.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Self {
            heap: Heap::new(),
            streams: StreamTable::new(),
            namespaces: IndexMap::new(),
            core_ns: Tag::NIL,
            current_ns: Tag::NIL,
            frames: Vec::new(),
            frame_cache: AHashMap::new(),
            next_frame_id: 0,
            lexenv: Vec::new(),
            readtable: AHashMap::new(),
            standard_input: Tag::NIL,
            standard_output: Tag::NIL,
            error_output: Tag::NIL,
            sym_frame_ref: Tag::NIL,
            sym_letq: Tag::NIL,
            sym_closure: Tag::NIL,
            block_core: u16::MAX,
            src: Tag::NIL,
            start: Instant::now(),
            tracer: Box::new(NoopTracer),
        };

        let core_name = vector::make_string(&mut env.heap, CORE_NS.as_bytes());
        let core = namespace::make_namespace(&mut env.heap, core_name, Tag::NIL);
        env.core_ns = core;
        env.current_ns = core;
        env.add_namespace(core);

        let stdin_id = env.streams.open_stdin();
        let stdin = env.make_stream(stdin_id);
        env.standard_input = env.intern_bound(core, "standard-input", stdin);

        let stdout_id = env.streams.open_stdout();
        let stdout = env.make_stream(stdout_id);
        env.standard_output = env.intern_bound(core, "standard-output", stdout);

        let stderr_id = env.streams.open_stderr();
        let stderr = env.make_stream(stderr_id);
        env.error_output = env.intern_bound(core, "error-output", stderr);

        env.install_core_functions();
        env
    }

    fn intern_bound(&mut self, ns: Tag, name: &str, value: Tag) -> Tag {
        let name = vector::make_string(&mut self.heap, name.as_bytes());
        namespace::intern_with_value(self, ns, name, value)
    }

    /// Interns both primitive tables into the core namespace and binds each
    /// symbol to its function cell.
    fn install_core_functions(&mut self) {
        let core = self.core_ns;
        for (index, def) in builtins::EXTERN_FUNCTIONS.iter().enumerate() {
            let sym = {
                let name = vector::make_string(&mut self.heap, def.name.as_bytes());
                namespace::intern(self, core, name)
            };
            self.bind_core_fn(sym, index as u16, def.nreqs);
            if def.name == "closure" {
                self.sym_closure = sym;
            }
        }
        let base = builtins::EXTERN_FUNCTIONS.len();
        for (offset, def) in builtins::INTERN_FUNCTIONS.iter().enumerate() {
            let index = (base + offset) as u16;
            let sym = {
                let name = vector::make_string(&mut self.heap, def.name.as_bytes());
                namespace::intern_private(self, core, name)
            };
            self.bind_core_fn(sym, index, def.nreqs);
            match def.name {
                "frame-ref" => self.sym_frame_ref = sym,
                "letq" => self.sym_letq = sym,
                "block" => self.block_core = index,
                _ => {}
            }
        }
    }

    fn bind_core_fn(&mut self, sym: Tag, index: u16, nreqs: usize) {
        let frame_id = self.next_frame_id();
        let func = self.heap.alloc(HeapData::Function(FunctionData {
            name: sym,
            core: Some(index),
            form: Tag::NIL,
            env: Tag::NIL,
            frame_id,
            arity: FunctionData::encode_arity(nreqs, false),
            context: Vec::new(),
        }));
        symbol::bind(&mut self.heap, sym, func);
    }

    // --- identity and classification ----------------------------------------

    /// System class of any value: immediates by sub-encoding, heap references
    /// by their header.
    pub(crate) fn class_of(&self, tag: Tag) -> SysClass {
        use crate::value::ImmediateClass;
        match tag.low_tag() {
            LowTag::Address => SysClass::Address,
            LowTag::EvenFixnum | LowTag::OddFixnum => SysClass::Fixnum,
            LowTag::Immediate => match tag.immediate_class() {
                ImmediateClass::Char => SysClass::Char,
                ImmediateClass::String => SysClass::String,
                ImmediateClass::Keyword => SysClass::Symbol,
                ImmediateClass::Float => SysClass::Float,
            },
            LowTag::Symbol | LowTag::Function | LowTag::Cons | LowTag::Extend => {
                self.heap.sys_class(tag)
            }
        }
    }

    pub(crate) fn next_frame_id(&mut self) -> u64 {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        id
    }

    // --- namespaces ---------------------------------------------------------

    /// The namespace registered under `name`; an empty name designates the
    /// current namespace.
    pub(crate) fn find_namespace(&self, name: &str) -> Tag {
        if name.is_empty() {
            return self.current_ns;
        }
        self.namespaces.get(name).copied().unwrap_or(Tag::NIL)
    }

    pub(crate) fn add_namespace(&mut self, ns: Tag) {
        let name = namespace::name_of(&self.heap, ns);
        let name = vector::string_text(&self.heap, name).unwrap_or_default();
        self.namespaces.entry(name).or_insert(ns);
    }

    // --- frame cache --------------------------------------------------------

    pub(crate) fn cache_push(&mut self, frame_id: u64, argv: Tag) {
        self.frame_cache.entry(frame_id).or_default().push(argv);
    }

    pub(crate) fn cache_pop(&mut self, frame_id: u64) {
        if let Some(stack) = self.frame_cache.get_mut(&frame_id) {
            stack.pop();
        }
    }

    /// Most recent live activation of `frame_id`, if any.
    pub(crate) fn cache_top(&self, frame_id: u64) -> Option<Tag> {
        self.frame_cache.get(&frame_id).and_then(|stack| stack.last().copied())
    }

    // --- frame views --------------------------------------------------------

    fn frame_view_at(&mut self, index: usize) -> Tag {
        let Some(frame) = self.frames.get(index).copied() else {
            return Tag::NIL;
        };
        let args = if frame.argv.is_nil() {
            Tag::NIL
        } else {
            let values = match self.heap.get(frame.argv) {
                HeapData::Vector(data) => (0..data.len()).filter_map(|i| data.get(i)).collect(),
                _ => Vec::new(),
            };
            cons::list(&mut self.heap, &values)
        };
        let view = vec![
            Tag::keyword("frame"),
            frame.func,
            Tag::fixnum(frame.nargs as i64),
            args,
            Tag::fixnum(frame.frame_id as i64),
        ];
        vector::make_t_vector(&mut self.heap, view)
    }

    /// View of the oldest live frame; NIL outside any call.
    pub(crate) fn last_frame_view(&mut self) -> Tag {
        if self.frames.is_empty() {
            Tag::NIL
        } else {
            self.frame_view_at(0)
        }
    }

    /// The whole frame stack as a list of frame views.
    pub(crate) fn env_stack_view(&mut self) -> Tag {
        let mut views = Vec::with_capacity(self.frames.len());
        for index in 0..self.frames.len() {
            views.push(self.frame_view_at(index));
        }
        cons::list(&mut self.heap, &views)
    }

    /// Wall clock and process clock in milliseconds.
    pub(crate) fn clocks(&self) -> (i64, i64) {
        let system = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let process = self.start.elapsed().as_millis() as i64;
        (system, process)
    }

    // --- streams ------------------------------------------------------------

    pub(crate) fn make_stream(&mut self, id: StreamId) -> Tag {
        self.heap.alloc(HeapData::Stream(StreamData { id: Some(id), func: Tag::NIL }))
    }

    pub(crate) fn is_stream(&self, tag: Tag) -> bool {
        matches!(self.heap.try_get(tag), Some(HeapData::Stream(_)))
    }

    /// Resolves a stream designator: `:t` names standard input, `:nil`
    /// standard output, a stream cell itself.
    pub(crate) fn stream_designator(&mut self, tag: Tag) -> EvalResult<Tag> {
        let resolved = if tag == Tag::T {
            symbol::value_of(&self.heap, self.standard_input)
        } else if tag == Tag::NIL {
            symbol::value_of(&self.heap, self.standard_output)
        } else {
            tag
        };
        if self.is_stream(resolved) {
            Ok(resolved)
        } else {
            raise(self, CondClass::Type, "not a stream (stream-designator)", tag)
        }
    }

    pub(crate) fn stream_platform_id(&self, stream: Tag) -> Option<StreamId> {
        match self.heap.try_get(stream)? {
            HeapData::Stream(data) => data.id,
            _ => None,
        }
    }

    pub(crate) fn stream_read_byte(&mut self, stream: Tag) -> Option<u8> {
        let id = self.stream_platform_id(stream)?;
        self.streams.read_byte(id)
    }

    pub(crate) fn stream_unread_byte(&mut self, stream: Tag, byte: u8) {
        if let Some(id) = self.stream_platform_id(stream) {
            self.streams.unread_byte(id, byte);
        }
    }

    pub(crate) fn stream_write_byte(&mut self, stream: Tag, byte: u8) {
        if let Some(id) = self.stream_platform_id(stream) {
            self.streams.write_byte(id, byte);
        }
    }

    pub(crate) fn stream_is_eof(&mut self, stream: Tag) -> bool {
        match self.stream_platform_id(stream) {
            Some(id) => self.streams.is_eof(id),
            None => false,
        }
    }

    // --- garbage collection -------------------------------------------------

    fn gc_roots(&self) -> Vec<Tag> {
        let mut roots: Vec<Tag> = Vec::new();
        roots.extend(self.namespaces.values().copied());
        roots.extend(self.lexenv.iter().copied());
        for frame in &self.frames {
            roots.push(frame.func);
            roots.push(frame.argv);
        }
        for stack in self.frame_cache.values() {
            roots.extend(stack.iter().copied());
        }
        roots.push(self.src);
        roots
    }

    /// Runs a collection and returns the bytes reclaimed.
    pub fn gc_now(&mut self) -> usize {
        let roots = self.gc_roots();
        let reclaimed = self.heap.collect(roots);
        self.tracer.on_gc(reclaimed);
        reclaimed
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn EvalTracer>) {
        self.tracer = tracer;
    }

    // --- embedding API ------------------------------------------------------

    /// Reads the next form from a string. NIL on an empty or all-comment
    /// string, as at end of stream.
    pub fn read_str(&mut self, text: &str) -> Result<Tag, EnvError> {
        let id = self.streams.open_input_string(text.as_bytes().to_vec());
        let stream = self.make_stream(id);
        let saved_src = self.src;
        self.src = stream;
        let result = read::read_form(self, stream);
        self.src = saved_src;
        self.host(result)
    }

    /// Reads the next form from a stream value.
    pub fn read_stream(&mut self, stream: Tag) -> Result<Tag, EnvError> {
        let result = read::read(self, stream);
        self.host(result)
    }

    /// Compiles and evaluates a form.
    pub fn eval(&mut self, form: Tag) -> Result<Tag, EnvError> {
        let result = compile::compile(self, form).and_then(|compiled| eval::eval(self, compiled));
        self.host(result)
    }

    /// Evaluates every form in `text`, returning the last value.
    ///
    /// The source stream cell is parked in `src` for the duration so a
    /// collection triggered mid-source cannot sweep it.
    pub fn eval_str(&mut self, text: &str) -> Result<Tag, EnvError> {
        let id = self.streams.open_input_string(text.as_bytes().to_vec());
        let stream = self.make_stream(id);
        let saved_src = self.src;
        self.src = stream;
        let mut outcome = Ok(Tag::NIL);
        loop {
            if !read::skip_whitespace(self, stream) {
                break;
            }
            let result = read::read_form(self, stream)
                .and_then(|form| compile::compile(self, form))
                .and_then(|compiled| eval::eval(self, compiled));
            match self.host(result) {
                Ok(value) => outcome = Ok(value),
                Err(error) => {
                    outcome = Err(error);
                    break;
                }
            }
        }
        self.src = saved_src;
        outcome
    }

    /// Evaluates every form in `text`, printing each result on its own line
    /// when `print_results` is set.
    pub fn eval_source(&mut self, text: &str, print_results: bool) -> Result<(), EnvError> {
        let id = self.streams.open_input_string(text.as_bytes().to_vec());
        let stream = self.make_stream(id);
        let saved_src = self.src;
        self.src = stream;
        let mut outcome = Ok(());
        loop {
            if !read::skip_whitespace(self, stream) {
                break;
            }
            let result = read::read_form(self, stream)
                .and_then(|form| compile::compile(self, form))
                .and_then(|compiled| eval::eval(self, compiled));
            match self.host(result) {
                Ok(value) => {
                    if print_results {
                        self.print(value, true);
                        self.terpri();
                    }
                }
                Err(error) => {
                    outcome = Err(error);
                    break;
                }
            }
        }
        self.src = saved_src;
        outcome
    }

    /// Loads a source file: every form read, compiled, evaluated.
    pub fn load(&mut self, path: &str) -> Result<Tag, EnvError> {
        let result = load_file(self, path);
        self.host(result)
    }

    /// Prints to the standard output stream.
    pub fn print(&mut self, value: Tag, escape: bool) {
        let _ = print::print(self, value, Tag::NIL, escape);
    }

    /// Renders a value into a fresh host string.
    pub fn print_to_string(&mut self, value: Tag, escape: bool) -> String {
        print::to_string(self, value, escape)
    }

    /// Writes a newline to the standard output stream.
    pub fn terpri(&mut self) {
        let _ = print::terpri(self, Tag::NIL);
    }

    /// Runs `f`; an escaping condition is formatted to the standard error
    /// stream and absorbed so the caller can resume. `(exit n)` surfaces as
    /// `Err(n)`.
    pub fn with_condition<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, EnvError>,
    ) -> Result<Option<T>, i32> {
        let mark = self.frames.len();
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(EnvError::Exit(code)) => Err(code),
            Err(EnvError::Condition(exception)) => {
                self.frames.truncate(mark);
                self.report_exception(&exception);
                Ok(None)
            }
        }
    }

    /// Writes the standard diagnostic line to the error-output stream.
    pub(crate) fn report_exception(&mut self, exception: &Exception) {
        let stream = symbol::value_of(&self.heap, self.error_output);
        let text = format!("{exception}\n");
        if self.is_stream(stream) {
            print::print_str(self, stream, &text);
        } else {
            eprint!("{text}");
        }
    }

    /// Lowers an internal unwind into the host error type.
    pub(crate) fn host<T>(&mut self, result: EvalResult<T>) -> Result<T, EnvError> {
        result.map_err(|unwind| self.demote(unwind))
    }

    fn demote(&mut self, unwind: Unwind) -> EnvError {
        match unwind {
            Unwind::Exit(code) => EnvError::Exit(code),
            Unwind::Condition(condition) => {
                let (class, frame, source, reason) = match self.heap.get(condition) {
                    HeapData::Condition(data) => (data.class, data.frame, data.source, data.reason),
                    _ => (Tag::NIL, Tag::NIL, Tag::NIL, Tag::NIL),
                };
                let reason = vector::string_text(&self.heap, reason)
                    .unwrap_or_else(|| print::to_string(self, reason, false));
                EnvError::Condition(Exception {
                    class: print::to_string(self, class, true),
                    source: print::to_string(self, source, true),
                    reason,
                    frame: print::to_string(self, frame, false),
                })
            }
            Unwind::Throw(pair) => EnvError::Condition(Exception {
                class: ":control".to_owned(),
                source: print::to_string(self, pair, true),
                reason: "uncaught block return".to_owned(),
                frame: ":nil".to_owned(),
            }),
        }
    }
}

/// The `load` workhorse, shared between the primitive and the public method.
pub(crate) fn load_file(env: &mut Env, path: &str) -> EvalResult<Tag> {
    let id = match env.streams.open_input_file(std::path::Path::new(path)) {
        Ok(id) => id,
        Err(_) => {
            let source = vector::make_string(&mut env.heap, path.as_bytes());
            return raise(env, CondClass::File, "cannot open (load)", source);
        }
    };
    let stream = env.make_stream(id);
    let saved_src = env.src;
    env.src = stream;
    let result = load_stream(env, stream);
    env.src = saved_src;
    if let Some(id) = env.stream_platform_id(stream) {
        env.streams.close(id);
    }
    result
}

fn load_stream(env: &mut Env, stream: Tag) -> EvalResult<Tag> {
    while read::skip_whitespace(env, stream) {
        let form = read::read_form(env, stream)?;
        let compiled = compile::compile(env, form)?;
        eval::eval(env, compiled)?;
    }
    Ok(Tag::T)
}
