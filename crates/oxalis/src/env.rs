//! Lexically-nested symbol tables.
//!
//! Frames are owned by a central [`Envs`] store and addressed by [`EnvId`],
//! so closures capturing a frame and callers mutating it observe the same
//! bindings without shared-pointer plumbing. Index 0 is always the global
//! frame. Frames are never freed: a discarded activation simply becomes
//! unreachable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{intern::SymbolId, value::Value};

/// Index of a frame in the environment store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvId(u32);

impl EnvId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("environment store overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The global frame, created with the store.
pub const GLOBAL_ENV: EnvId = EnvId(0);

/// One lexical scope: a debug name, its bindings in insertion order, the
/// lexical parent, and the dynamic predecessor set by the let-family forms.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EnvFrame {
    name: String,
    bindings: IndexMap<SymbolId, Value>,
    parent: Option<EnvId>,
    previous: Option<EnvId>,
}

/// Storage for all frames.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envs {
    frames: Vec<EnvFrame>,
}

impl Envs {
    pub fn new() -> Self {
        Self {
            frames: vec![EnvFrame {
                name: "global".to_owned(),
                bindings: IndexMap::new(),
                parent: None,
                previous: None,
            }],
        }
    }

    /// Creates a child frame whose lexical parent is `parent`.
    pub fn new_frame_below(&mut self, parent: EnvId, name: impl Into<String>) -> EnvId {
        let id = EnvId::new(self.frames.len());
        self.frames.push(EnvFrame {
            name: name.into(),
            bindings: IndexMap::new(),
            parent: Some(parent),
            previous: None,
        });
        id
    }

    /// Records the dynamic predecessor of a frame.
    pub fn set_previous(&mut self, env: EnvId, previous: EnvId) {
        self.frames[env.index()].previous = Some(previous);
    }

    /// Walks the lexical parent chain for the first binding of `sym`.
    pub fn value_of(&self, env: EnvId, sym: SymbolId) -> Option<Value> {
        let mut cur = Some(env);
        while let Some(id) = cur {
            let frame = &self.frames[id.index()];
            if let Some(&value) = frame.bindings.get(&sym) {
                return Some(value);
            }
            cur = frame.parent;
        }
        None
    }

    /// Creates or overwrites the binding in the current frame only,
    /// returning the previous value if there was one.
    pub fn bind_locally_to(&mut self, env: EnvId, sym: SymbolId, value: Value) -> Option<Value> {
        self.frames[env.index()].bindings.insert(sym, value)
    }

    /// `set!` semantics: updates the nearest enclosing frame that binds
    /// `sym`. `Err(())` when no enclosing frame binds it.
    pub fn bind_to(&mut self, env: EnvId, sym: SymbolId, value: Value) -> Result<(), ()> {
        let mut cur = Some(env);
        while let Some(id) = cur {
            let frame = &mut self.frames[id.index()];
            if let Some(slot) = frame.bindings.get_mut(&sym) {
                *slot = value;
                return Ok(());
            }
            cur = frame.parent;
        }
        Err(())
    }

    pub fn frame_name(&self, env: EnvId) -> &str {
        &self.frames[env.index()].name
    }

    pub fn parent(&self, env: EnvId) -> Option<EnvId> {
        self.frames[env.index()].parent
    }

    /// Bindings of one frame, in insertion order. Debug surface for `dump`.
    pub fn frame_bindings(&self, env: EnvId) -> impl Iterator<Item = (SymbolId, Value)> + '_ {
        self.frames[env.index()].bindings.iter().map(|(&k, &v)| (k, v))
    }
}
