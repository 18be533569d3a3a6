/// Hooks into the evaluator's interesting moments.
///
/// The environment owns exactly one tracer; there is no global logger. The
/// default [`NoopTracer`] compiles down to nothing on the hot path.
pub trait EvalTracer {
    /// A function application is about to run.
    fn on_apply(&mut self, _frame_id: u64, _nargs: usize) {}

    /// A collection finished, reclaiming this many bytes.
    fn on_gc(&mut self, _reclaimed: usize) {}

    /// A condition of the named class was raised.
    fn on_condition(&mut self, _class: &'static str) {}
}

/// The silent default.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Writes one line per event to standard error. Useful when chasing a
/// miscompiled form or a surprise collection.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_apply(&mut self, frame_id: u64, nargs: usize) {
        eprintln!("apply: frame {frame_id} nargs {nargs}");
    }

    fn on_gc(&mut self, reclaimed: usize) {
        eprintln!("gc: reclaimed {reclaimed} bytes");
    }

    fn on_condition(&mut self, class: &'static str) {
        eprintln!("condition: :{class}");
    }
}

/// Counts events; handy in tests.
#[derive(Debug, Default)]
pub struct CountingTracer {
    pub applies: usize,
    pub collections: usize,
    pub conditions: usize,
}

impl EvalTracer for CountingTracer {
    fn on_apply(&mut self, _frame_id: u64, _nargs: usize) {
        self.applies += 1;
    }

    fn on_gc(&mut self, _reclaimed: usize) {
        self.collections += 1;
    }

    fn on_condition(&mut self, _class: &'static str) {
        self.conditions += 1;
    }
}
