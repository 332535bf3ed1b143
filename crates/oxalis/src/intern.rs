//! Symbol interning.
//!
//! Symbols are interned into an append-only table and referenced by
//! [`SymbolId`] indices, so symbol equality is index equality and the textual
//! name is looked up only for error messages and printing. The table is
//! populated with [`StaticSymbols`] on construction, then grows as the reader
//! and host intern new names.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Index into the symbol interner's storage.
///
/// Uses `u32` to save space. Two symbols with the same textual name always
/// share the same id, so `eq?` on symbols is a plain integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("symbol table overflow"))
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbols known at compile time, pre-interned in discriminant order so that
/// `SymbolId::from(StaticSymbols::Quote)` is a constant-time conversion with
/// no table lookup.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum StaticSymbols {
    Quote,
    Begin,
    #[strum(serialize = "set!")]
    SetBang,
    If,
    Lambda,
    Define,
    Typedef,
    Defmacro,
    #[strum(serialize = "define-macro")]
    DefineMacro,
    #[strum(serialize = "define-compiler-macro")]
    DefineCompilerMacro,
    Do,
    Apply,
    #[strum(serialize = "->")]
    Chain,
    #[strum(serialize = "=>")]
    Tap,
    #[strum(serialize = "definition-of")]
    DefinitionOf,
    Doc,
    Type,
    Let,
    #[strum(serialize = "let*")]
    LetStar,
    Letrec,
    /// Name given to `lambda`-built functions.
    Unnamed,
    /// Name used by `definition-of` when the argument is not a symbol.
    Anonymous,
}

impl From<StaticSymbols> for SymbolId {
    fn from(sym: StaticSymbols) -> Self {
        Self(sym as u32)
    }
}

/// The symbol table: names in insertion order plus a reverse map.
///
/// Write-mostly during startup and reading, read-only during evaluation.
/// Serialized whole so snapshots restore ids positionally.
#[derive(Debug, Serialize, Deserialize)]
pub struct Interns {
    names: Vec<String>,
    by_name: AHashMap<String, SymbolId>,
}

impl Interns {
    pub(crate) fn new() -> Self {
        let mut interns = Self {
            names: Vec::new(),
            by_name: AHashMap::new(),
        };
        for sym in StaticSymbols::iter() {
            let name: &'static str = sym.into();
            let id = interns.intern(name);
            debug_assert_eq!(id, SymbolId::from(sym), "static symbol interned out of order");
        }
        interns
    }

    /// Interns a name, returning the existing id when the name is known.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = SymbolId::new(self.names.len());
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Returns the textual name of an interned symbol.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }

    /// Looks up a name without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Number of interned symbols, static set included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
