//! Persistent interpreter sessions.
//!
//! A [`ReplSession`] owns an interpreter whose global frame survives across
//! `execute()` calls, which is what a REPL, a scripting host, or a test
//! harness wants. Sessions can be snapshotted to bytes and restored later,
//! as long as the restoring session registered the same primitives in the
//! same order.

use crate::{
    error::ReplError,
    interp::Interp,
    io::PrintWriter,
    reader::read_source,
    value::Value,
};

pub struct ReplSession {
    interp: Interp,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    /// A fresh session printing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self { interp: Interp::new() }
    }

    /// A fresh session writing primitive output through `writer`.
    #[must_use]
    pub fn with_writer(writer: Box<dyn PrintWriter>) -> Self {
        Self {
            interp: Interp::with_writer(writer),
        }
    }

    /// Reads every form in `source` and evaluates them in order in the
    /// session's global frame, returning the last result (Nil for empty
    /// input).
    pub fn execute(&mut self, source: &str) -> Result<Value, ReplError> {
        let forms = read_source(source, &mut self.interp)?;
        let mut result = Value::Nil;
        for form in forms {
            result = self.interp.eval_global(form)?;
        }
        Ok(result)
    }

    /// The underlying interpreter, for registration and direct evaluation.
    pub fn interp(&mut self) -> &mut Interp {
        &mut self.interp
    }

    #[must_use]
    pub fn interp_ref(&self) -> &Interp {
        &self.interp
    }

    /// Printed form of a value with strings quoted.
    #[must_use]
    pub fn repr(&self, value: Value) -> String {
        self.interp.repr(value)
    }

    /// Printed form of a value with raw string text.
    #[must_use]
    pub fn display(&self, value: Value) -> String {
        self.interp.display(value)
    }

    /// Serializes the session's interpreter state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.interp.snapshot()
    }

    /// Restores state captured by [`ReplSession::snapshot`].
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), postcard::Error> {
        self.interp.restore(bytes)
    }
}
