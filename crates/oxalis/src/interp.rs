//! The interpreter context.
//!
//! All interpreter state — arena, environments, symbol table, primitive
//! registry, type signatures — hangs off an explicit [`Interp`] the host
//! passes into every call. There are no implicit globals, so tests and
//! embedders can run any number of isolated interpreters side by side.
//! Concurrency is the host's concern: either give each thread its own
//! `Interp` or serialize calls against a shared one.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    builtins,
    callable::{Arity, NativeFn, Primitive, PrimitiveId},
    env::{EnvId, Envs, GLOBAL_ENV},
    error::{ErrKind, EvalError, EvalResult},
    heap::{FrameRecord, Heap, HeapData},
    intern::{Interns, SymbolId},
    io::{PrintWriter, StdPrint},
    list,
    resource::ResourceLimits,
    tracer::{EvalTracer, NoopTracer},
    types::{TypeMask, TypeSignature},
    value::{PrintStyle, Value, write_value},
};

pub struct Interp {
    pub(crate) heap: Heap,
    pub(crate) envs: Envs,
    pub(crate) interns: Interns,
    pub(crate) primitives: Vec<Primitive>,
    pub(crate) type_sigs: AHashMap<SymbolId, TypeSignature>,
    pub(crate) writer: Box<dyn PrintWriter>,
    pub(crate) tracer: Box<dyn EvalTracer>,
    pub(crate) tracing: bool,
    pub(crate) limits: ResourceLimits,
    pub(crate) depth: usize,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    /// A fresh interpreter with the builtin primitive library registered
    /// and output going to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(StdPrint))
    }

    /// A fresh interpreter writing primitive output through `writer`.
    #[must_use]
    pub fn with_writer(writer: Box<dyn PrintWriter>) -> Self {
        let mut interp = Self {
            heap: Heap::new(),
            envs: Envs::new(),
            interns: Interns::new(),
            primitives: Vec::new(),
            type_sigs: AHashMap::new(),
            writer,
            tracer: Box::new(NoopTracer),
            tracing: false,
            limits: ResourceLimits::default(),
            depth: 0,
        };
        builtins::register_core(&mut interp);
        interp
    }

    /// Read access to the arena, for host-side predicates and traversal.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Read access to the symbol table.
    #[must_use]
    pub fn interns(&self) -> &Interns {
        &self.interns
    }

    // ------------------------------------------------------------------
    // Environment surface

    /// The global frame.
    #[must_use]
    pub fn global(&self) -> EnvId {
        GLOBAL_ENV
    }

    /// Creates a child frame below `parent`.
    pub fn new_env_below(&mut self, parent: EnvId, name: &str) -> EnvId {
        self.envs.new_frame_below(parent, name)
    }

    /// Resolves a symbol along the lexical chain; unbound symbols read as
    /// Nil.
    #[must_use]
    pub fn value_of(&self, env: EnvId, sym: SymbolId) -> Value {
        self.envs.value_of(env, sym).unwrap_or(Value::Nil)
    }

    /// Binds in the given frame only, returning any previous value.
    pub fn bind_locally(&mut self, env: EnvId, sym: SymbolId, value: Value) -> Option<Value> {
        self.envs.bind_locally_to(env, sym, value)
    }

    /// `set!` semantics: updates the nearest enclosing binding.
    pub fn bind(&mut self, env: EnvId, sym: SymbolId, value: Value) -> EvalResult<()> {
        self.envs.bind_to(env, sym, value).map_err(|()| {
            EvalError::new(
                ErrKind::UnboundSymbol,
                format!("{} is not bound in any enclosing frame", self.interns.name(sym)),
                env,
            )
        })
    }

    // ------------------------------------------------------------------
    // Value construction

    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.interns.intern(name)
    }

    pub fn symbol(&mut self, name: &str) -> Value {
        Value::Symbol(self.interns.intern(name))
    }

    pub fn string(&mut self, text: &str) -> Value {
        Value::Ref(self.heap.allocate(HeapData::Str(text.to_owned())))
    }

    pub fn cons(&mut self, car: Value, cdr: Value) -> Value {
        list::cons(&mut self.heap, car, cdr)
    }

    /// Builds a proper list from a slice of values.
    pub fn list(&mut self, items: &[Value]) -> Value {
        list::array_to_list(&mut self.heap, items)
    }

    /// Builds a pair spine over `items` sharing `tail`.
    pub fn list_with_tail(&mut self, items: &[Value], tail: Value) -> Value {
        list::array_to_list_with_tail(&mut self.heap, items, tail)
    }

    /// Builds a vectorized list.
    pub fn vector(&mut self, items: Vec<Value>) -> Value {
        Value::Ref(self.heap.allocate(HeapData::Vector(items)))
    }

    /// Builds a named-slot frame record.
    pub fn frame(&mut self, slots: &[(SymbolId, Value)]) -> Value {
        let mut record = FrameRecord::default();
        for &(key, value) in slots {
            record.set(key, value);
        }
        Value::Ref(self.heap.allocate(HeapData::Frame(record)))
    }

    // ------------------------------------------------------------------
    // List surface

    #[must_use]
    pub fn car(&self, v: Value) -> Value {
        list::car(&self.heap, v)
    }

    pub fn cdr(&mut self, v: Value) -> Value {
        list::cdr(&mut self.heap, v)
    }

    /// Applies a string of `a`/`d` steps, consumed right-to-left.
    pub fn walk_list(&mut self, v: Value, path: &str) -> Value {
        list::walk_list(&mut self.heap, v, path)
    }

    #[must_use]
    pub fn nth(&self, v: Value, n: i64) -> Value {
        list::nth(&self.heap, v, n)
    }

    pub fn set_nth(&mut self, v: Value, n: i64, value: Value) -> Value {
        list::set_nth(&mut self.heap, v, n, value)
    }

    #[must_use]
    pub fn length(&self, v: Value) -> usize {
        list::length(&self.heap, v)
    }

    pub fn append(&mut self, a: Value, b: Value) -> Value {
        list::append(&mut self.heap, a, b)
    }

    // ------------------------------------------------------------------
    // Primitive registration

    /// Registers a primitive whose arguments are pre-evaluated by the
    /// caller, binding it in the global frame.
    pub fn register_primitive(&mut self, name: &str, arity: Arity, native: NativeFn) -> PrimitiveId {
        self.register(name, arity, false, native, None)
    }

    /// Registers a special form: the native receives the raw unevaluated
    /// form tail.
    pub fn register_special_form(&mut self, name: &str, arity: Arity, native: NativeFn) -> PrimitiveId {
        self.register(name, arity, true, native, None)
    }

    /// Registers a primitive with per-argument type masks, checked against
    /// the evaluated actuals before the native runs.
    pub fn register_typed_primitive(
        &mut self,
        name: &str,
        arity: Arity,
        native: NativeFn,
        arg_types: Vec<TypeMask>,
    ) -> PrimitiveId {
        self.register(name, arity, false, native, Some(arg_types))
    }

    fn register(
        &mut self,
        name: &str,
        arity: Arity,
        special: bool,
        native: NativeFn,
        arg_types: Option<Vec<TypeMask>>,
    ) -> PrimitiveId {
        let sym = self.interns.intern(name);
        let id = PrimitiveId::new(self.primitives.len());
        self.primitives.push(Primitive {
            name: sym,
            arity,
            special,
            native,
            arg_types,
        });
        self.envs.bind_locally_to(GLOBAL_ENV, sym, Value::Primitive(id));
        id
    }

    // ------------------------------------------------------------------
    // Printing

    /// Printed form with strings quoted and characters spelled `#\x`.
    #[must_use]
    pub fn repr(&self, v: Value) -> String {
        self.print(v, PrintStyle::Repr)
    }

    /// Printed form with raw string and character text.
    #[must_use]
    pub fn display(&self, v: Value) -> String {
        self.print(v, PrintStyle::Display)
    }

    fn print(&self, v: Value, style: PrintStyle) -> String {
        let mut out = String::new();
        let mut active = AHashSet::new();
        write_value(&mut out, v, style, &self.heap, &self.interns, &self.primitives, &mut active);
        out
    }

    /// Debug dump of every frame from `env` to the global frame, one
    /// binding per line. The format is not a stable interface.
    pub fn dump(&mut self, env: EnvId) {
        let mut cur = Some(env);
        while let Some(id) = cur {
            let header = format!("Frame: {}\n", self.envs.frame_name(id));
            self.writer.stdout_write(header.into());
            let bindings: Vec<(SymbolId, Value)> = self.envs.frame_bindings(id).collect();
            for (sym, value) in bindings {
                let line = format!("  {}: {}\n", self.interns.name(sym), self.repr(value));
                self.writer.stdout_write(line.into());
            }
            cur = self.envs.parent(id);
        }
    }

    // ------------------------------------------------------------------
    // Configuration

    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.limits = limits;
    }

    #[must_use]
    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    pub fn set_writer(&mut self, writer: Box<dyn PrintWriter>) {
        self.writer = writer;
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn EvalTracer>, enabled: bool) {
        self.tracer = tracer;
        self.tracing = enabled;
    }

    // ------------------------------------------------------------------
    // Snapshots

    /// Serializes the interpreter's data state (arena, environments, symbol
    /// table, type signatures). The primitive registry is not included:
    /// restoring is only valid against an identically-registered
    /// interpreter, where registry ids line up positionally.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        let snapshot = SnapshotRef {
            heap: &self.heap,
            envs: &self.envs,
            interns: &self.interns,
            type_sigs: &self.type_sigs,
        };
        postcard::to_allocvec(&snapshot).expect("interpreter state serialization should not fail")
    }

    /// Restores state captured by [`Interp::snapshot`].
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), postcard::Error> {
        let snapshot: SnapshotOwned = postcard::from_bytes(bytes)?;
        self.heap = snapshot.heap;
        self.envs = snapshot.envs;
        self.interns = snapshot.interns;
        self.type_sigs = snapshot.type_sigs;
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    heap: &'a Heap,
    envs: &'a Envs,
    interns: &'a Interns,
    type_sigs: &'a AHashMap<SymbolId, TypeSignature>,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    heap: Heap,
    envs: Envs,
    interns: Interns,
    type_sigs: AHashMap<SymbolId, TypeSignature>,
}
