//! Runtime and session error types.
//!
//! Evaluation failures are never recovered inside the evaluator: any error
//! aborts the enclosing form and unwinds to the caller with `?`. Errors
//! carry the environment they occurred in so a host can dump a
//! backtrace-like view of the frame chain.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{env::EnvId, reader::ReadError};

/// Result type alias for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// The kinds of failure the evaluator surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ErrKind {
    /// `set!` found no enclosing binding for the symbol.
    UnboundSymbol,
    /// Head of a combination resolved to a non-callable value.
    NotCallable,
    /// Actuals violate the declared arity.
    ArityMismatch,
    /// An actual or a return value violates a declared type mask.
    TypeMismatch,
    /// `typedef` named an unknown type.
    InvalidType,
    /// `define` attempted to overwrite a primitive binding.
    RedefinePrimitive,
    /// Special-form syntax violated.
    MalformedForm,
    /// A primitive's native callable reported an error.
    PropagatedFromPrimitive,
    /// Evaluation recursed past the configured depth limit.
    RecursionLimit,
}

/// An evaluation failure: what went wrong, a human-readable message, and the
/// environment in which it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalError {
    pub kind: ErrKind,
    pub message: String,
    pub env: EnvId,
}

impl EvalError {
    pub fn new(kind: ErrKind, message: impl Into<String>, env: EnvId) -> Self {
        Self {
            kind,
            message: message.into(),
            env,
        }
    }

    /// Error raised from inside a primitive's native callable.
    pub fn from_primitive(message: impl Into<String>, env: EnvId) -> Self {
        Self::new(ErrKind::PropagatedFromPrimitive, message, env)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for EvalError {}

/// Error type for REPL execution, separating failures by pipeline stage.
///
/// Keeping read and evaluation failures distinct lets callers handle user
/// feedback and recovery accurately without string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplError {
    /// The reader rejected the source text.
    Read(ReadError),
    /// Evaluation of a well-formed tree failed.
    Eval(EvalError),
}

impl fmt::Display for ReplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(error) => write!(f, "read error: {error}"),
            Self::Eval(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for ReplError {}

impl From<ReadError> for ReplError {
    fn from(error: ReadError) -> Self {
        Self::Read(error)
    }
}

impl From<EvalError> for ReplError {
    fn from(error: EvalError) -> Self {
        Self::Eval(error)
    }
}
