//! Output plumbing for interpreter primitives.
//!
//! `write-line`, `dump`, and `time` write through a [`PrintWriter`] owned by
//! the interpreter, so embedders can capture or suppress interpreter output
//! without touching process stdout.

use std::{
    borrow::Cow,
    cell::RefCell,
    io::{self, Write as _},
    rc::Rc,
};

/// Trait for handling output produced by interpreter primitives.
///
/// Implement this to capture or redirect output from sandboxed Lisp code.
/// The default implementation `StdPrint` writes to stdout.
pub trait PrintWriter {
    /// Writes a chunk of output text, without any terminator.
    fn stdout_write(&mut self, output: Cow<'_, str>);

    /// Writes a single character, generally a separator or newline.
    fn stdout_push(&mut self, end: char);
}

thread_local! {
    /// Thread-local stdout buffer for `StdPrint`; flushed on newline and on
    /// drop so interleaved host output stays ordered.
    static STDOUT_BUFFER: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl StdPrint {
    fn flush() {
        STDOUT_BUFFER.with(|buffer| {
            let mut buffer = buffer.borrow_mut();
            if buffer.is_empty() {
                return;
            }
            let _ = io::stdout().write_all(buffer.as_bytes());
            let _ = io::stdout().flush();
            buffer.clear();
        });
    }
}

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        STDOUT_BUFFER.with(|buffer| buffer.borrow_mut().push_str(&output));
    }

    fn stdout_push(&mut self, end: char) {
        STDOUT_BUFFER.with(|buffer| buffer.borrow_mut().push(end));
        if end == '\n' {
            Self::flush();
        }
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        Self::flush();
    }
}

/// A `PrintWriter` that collects all output into a shared string buffer.
///
/// The buffer sits behind `Rc<RefCell>` so a test can keep a clone of the
/// writer while the interpreter owns the original as a trait object.
#[derive(Debug, Clone, Default)]
pub struct CollectStringPrint(Rc<RefCell<String>>);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the output collected so far.
    #[must_use]
    pub fn output(&self) -> String {
        self.0.borrow().clone()
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        self.0.borrow_mut().push_str(&output);
    }

    fn stdout_push(&mut self, end: char) {
        self.0.borrow_mut().push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) {}

    fn stdout_push(&mut self, _end: char) {}
}
