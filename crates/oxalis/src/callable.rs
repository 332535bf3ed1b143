//! Callable object model: functions, macros, and primitives.
//!
//! Functions and macros are plain data (formals, body, captured environment)
//! stored in the arena; the evaluator owns application. Primitives live in a
//! registry on the interpreter context and values carry only the registry
//! index, which keeps native function pointers out of the serializable
//! state: a host that re-registers the same primitives in the same order
//! gets ids that line up with a restored snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    env::EnvId,
    error::EvalResult,
    intern::SymbolId,
    interp::Interp,
    types::TypeMask,
    value::Value,
};

/// A user-defined function.
///
/// `formals` is the formal-parameter tree as read: a proper list, a dotted
/// list with a rest parameter, or a single symbol taking the whole actual
/// list. The captured environment is shared by reference; mutations in it
/// are visible through every closure that captured it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: SymbolId,
    pub formals: Value,
    pub doc: Option<String>,
    /// List of body forms, evaluated in order; the last is the result.
    pub body: Value,
    pub env: EnvId,
}

/// A macro (or compiler macro): formals bound to unevaluated forms, a single
/// body form producing the expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroObject {
    pub name: SymbolId,
    pub formals: Value,
    pub body: Value,
    pub env: EnvId,
}

/// Index into the interpreter's primitive registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimitiveId(u32);

impl PrimitiveId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("primitive registry overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Signature of a native callable.
///
/// For a non-special primitive `args` is the list of pre-evaluated actuals;
/// for a special form it is the raw unevaluated form tail, and the native
/// decides what to evaluate.
pub type NativeFn = fn(&mut Interp, args: Value, env: EnvId) -> EvalResult<Value>;

/// Declared argument-count shape of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arity {
    /// Any number of arguments (`-1` in spec notation).
    Any,
    Exactly(usize),
    /// `">=N"`: at least N arguments.
    AtLeast(usize),
}

impl Arity {
    /// Parses `"-1"`, `"N"`, or `">=N"`.
    #[must_use]
    pub fn from_spec(spec: &str) -> Option<Self> {
        if spec == "-1" {
            return Some(Self::Any);
        }
        if let Some(rest) = spec.strip_prefix(">=") {
            return rest.parse().ok().map(Self::AtLeast);
        }
        spec.parse().ok().map(Self::Exactly)
    }

    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any number of arguments"),
            Self::Exactly(n) => write!(f, "exactly {n} argument(s)"),
            Self::AtLeast(n) => write!(f, "at least {n} argument(s)"),
        }
    }
}

/// A registered primitive: a named native callable with an arity spec, a
/// special flag, and optional per-argument type masks.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub name: SymbolId,
    pub arity: Arity,
    /// When set, the evaluator passes the raw form tail unevaluated.
    pub special: bool,
    pub native: NativeFn,
    pub arg_types: Option<Vec<TypeMask>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_specs() {
        assert_eq!(Arity::from_spec("-1"), Some(Arity::Any));
        assert_eq!(Arity::from_spec("2"), Some(Arity::Exactly(2)));
        assert_eq!(Arity::from_spec(">=1"), Some(Arity::AtLeast(1)));
        assert_eq!(Arity::from_spec("nope"), None);
        assert!(Arity::Any.accepts(0));
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(4));
        assert!(!Arity::AtLeast(1).accepts(0));
    }
}
