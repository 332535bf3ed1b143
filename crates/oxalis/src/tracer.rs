//! Evaluation tracing hooks.
//!
//! The [`EvalTracer`] trait defines hook points at the evaluator's key
//! events. All methods have no-op defaults, so [`NoopTracer`] costs nothing
//! and implementations only override the hooks they care about. The `debug`
//! primitive swaps the interpreter's tracer between [`NoopTracer`] and
//! [`StderrTracer`] at runtime.

/// Trait for evaluator tracing.
pub trait EvalTracer {
    /// Called at each `eval` dispatch with the printed form and the current
    /// recursion depth.
    fn on_eval(&mut self, _form: &str, _depth: usize) {}

    /// Called when a function or primitive is about to be applied.
    fn on_apply(&mut self, _name: &str, _depth: usize) {}

    /// Called after a macro expansion, with the printed expansion.
    fn on_expand(&mut self, _name: &str, _expansion: &str) {}
}

/// Zero-cost no-op tracer, the default.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Human-readable execution log to stderr, one line per event.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_eval(&mut self, form: &str, depth: usize) {
        eprintln!("{:indent$}eval: {form}", "", indent = depth * 2);
    }

    fn on_apply(&mut self, name: &str, depth: usize) {
        eprintln!("{:indent$}apply: {name}", "", indent = depth * 2);
    }

    fn on_expand(&mut self, name: &str, expansion: &str) {
        eprintln!("expand {name}: {expansion}");
    }
}
