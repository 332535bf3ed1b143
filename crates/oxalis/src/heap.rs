//! Arena storage for aggregate values.
//!
//! Aggregate data (strings, pairs, vectors, callables, frames) lives in a
//! central arena and is addressed by [`HeapId`]. `Value` stays `Copy` and
//! pair mutation through any alias is visible to every holder of the id,
//! which also makes cyclic structures representable. The arena is
//! append-only: a collector distinct from the host's memory manager is out
//! of scope, so slots live for the lifetime of the interpreter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    callable::{Function, MacroObject},
    intern::SymbolId,
    value::Value,
};

/// Index of an aggregate value in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeapId(u32);

impl HeapId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("heap overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A cons cell. `car` and `cdr` are mutable in place; every other
/// aggregate's payload is immutable once allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

/// A named-slot record, property-list style. Slot order is preserved for
/// printing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameRecord {
    slots: IndexMap<SymbolId, Value>,
}

impl FrameRecord {
    #[must_use]
    pub fn get(&self, key: SymbolId) -> Option<Value> {
        self.slots.get(&key).copied()
    }

    pub fn set(&mut self, key: SymbolId, value: Value) -> Option<Value> {
        self.slots.insert(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, Value)> + '_ {
        self.slots.iter().map(|(&k, &v)| (k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Arena-resident data.
#[derive(Debug, Serialize, Deserialize)]
pub enum HeapData {
    /// Immutable UTF-8 text.
    Str(String),
    Pair(Pair),
    /// A vectorized list: behaviorally a proper list, contiguous for O(1)
    /// indexed access. Element slots are mutable through `set-nth!`.
    Vector(Vec<Value>),
    Function(Function),
    Macro(MacroObject),
    /// Shaped like a macro but consulted only by a compile phase; the
    /// evaluator never expands one.
    CompilerMacro(MacroObject),
    Frame(FrameRecord),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Heap {
    slots: Vec<HeapData>,
}

impl Heap {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let id = HeapId::new(self.slots.len());
        self.slots.push(data);
        id
    }

    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id.index()]
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id.index()]
    }

    /// Number of live arena slots, for diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
