//! Execution limits.
//!
//! The evaluator recurses on the host stack, so unbounded Lisp recursion
//! would abort the process instead of failing cleanly. The depth limit
//! turns that into an ordinary propagated error.

use serde::{Deserialize, Serialize};

/// Default maximum evaluator recursion depth.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Configurable limits enforced during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum nesting of `eval` calls before evaluation fails with
    /// `RecursionLimit`.
    pub max_recursion_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}
