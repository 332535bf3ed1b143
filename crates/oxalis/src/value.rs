//! The universal tagged datum.
//!
//! `Value` is a hybrid of immediate variants stored inline (nil, booleans,
//! numbers, characters, interned symbols, opaque handles) and aggregates
//! stored in the arena behind [`Value::Ref`]. The enum is `Copy`: passing a
//! value shares the underlying aggregate, so mutation through one alias is
//! visible through all of them.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    callable::{Primitive, PrimitiveId},
    env::EnvId,
    heap::{Heap, HeapData, HeapId},
    intern::Interns,
    types::TypeMask,
};

/// Opaque host handle carried through the interpreter untouched.
///
/// Boxed objects round-trip between host and interpreter without allocating
/// arena slots; the host keeps whatever the handle means on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxedHandle(u64);

impl BoxedHandle {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque I/O handle; the host owns the actual port object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortHandle(u32);

impl PortHandle {
    #[must_use]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Primary runtime value.
///
/// Derived `PartialEq` is identity equality (`eq?`): symbols compare by
/// interned id, aggregates by arena id. Structural comparison is
/// [`equal`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The empty list, doubling as the falsy marker distinct from `#f`.
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Character(char),
    /// An interned symbol; same name, same id.
    Symbol(crate::intern::SymbolId),
    /// Index into the interpreter's primitive registry.
    Primitive(PrimitiveId),
    Boxed(BoxedHandle),
    Port(PortHandle),
    /// A first-class environment reference.
    Environment(EnvId),
    /// Arena-resident aggregate: string, pair, vector, callable, or frame.
    Ref(HeapId),
}

impl Value {
    /// Boolean projection: everything is true except Nil and `#f`.
    #[inline]
    #[must_use]
    pub fn truthy(self) -> bool {
        !matches!(self, Self::Nil | Self::Boolean(false))
    }

    #[inline]
    #[must_use]
    pub fn is_nil(self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_symbol(self) -> Option<crate::intern::SymbolId> {
        match self {
            Self::Symbol(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_pair(self, heap: &Heap) -> bool {
        matches!(self, Self::Ref(id) if matches!(heap.get(id), HeapData::Pair(_)))
    }

    #[must_use]
    pub fn is_vector(self, heap: &Heap) -> bool {
        matches!(self, Self::Ref(id) if matches!(heap.get(id), HeapData::Vector(_)))
    }

    /// Nil, a pair, or a vectorized list.
    #[must_use]
    pub fn is_list(self, heap: &Heap) -> bool {
        self.is_nil() || self.is_pair(heap) || self.is_vector(heap)
    }

    /// A chain of pairs terminated by a non-Nil, non-pair value.
    #[must_use]
    pub fn is_dotted_list(self, heap: &Heap) -> bool {
        let mut cur = self;
        let mut saw_pair = false;
        loop {
            match cur {
                Self::Ref(id) => match heap.get(id) {
                    HeapData::Pair(pair) => {
                        saw_pair = true;
                        cur = pair.cdr;
                    }
                    _ => return saw_pair,
                },
                Self::Nil => return false,
                _ => return saw_pair,
            }
        }
    }

    #[must_use]
    pub fn is_string(self, heap: &Heap) -> bool {
        matches!(self, Self::Ref(id) if matches!(heap.get(id), HeapData::Str(_)))
    }

    #[must_use]
    pub fn is_function(self, heap: &Heap) -> bool {
        matches!(self, Self::Ref(id) if matches!(heap.get(id), HeapData::Function(_)))
    }

    #[must_use]
    pub fn is_macro(self, heap: &Heap) -> bool {
        matches!(self, Self::Ref(id) if matches!(heap.get(id), HeapData::Macro(_)))
    }

    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// The single-bit type tag of this value.
    #[must_use]
    pub fn type_of(self, heap: &Heap) -> TypeMask {
        match self {
            Self::Nil => TypeMask::LIST,
            Self::Boolean(_) => TypeMask::BOOLEAN,
            Self::Integer(_) => TypeMask::INTEGER,
            Self::Float(_) => TypeMask::FLOAT,
            Self::Character(_) => TypeMask::CHARACTER,
            Self::Symbol(_) => TypeMask::SYMBOL,
            Self::Primitive(_) => TypeMask::PRIMITIVE,
            Self::Boxed(_) => TypeMask::BOXED_OBJECT,
            Self::Port(_) => TypeMask::PORT,
            Self::Environment(_) => TypeMask::ENVIRONMENT,
            Self::Ref(id) => match heap.get(id) {
                HeapData::Str(_) => TypeMask::STRING,
                HeapData::Pair(_) => TypeMask::LIST,
                HeapData::Vector(_) => TypeMask::VECTOR,
                HeapData::Function(_) => TypeMask::FUNCTION,
                HeapData::Macro(_) | HeapData::CompilerMacro(_) => TypeMask::MACRO,
                HeapData::Frame(_) => TypeMask::FRAME,
            },
        }
    }
}

/// Structural equality (`equal?`). Identity-equal values short-circuit;
/// strings compare by content, pairs and vectors element-wise.
#[must_use]
pub fn equal(a: Value, b: Value, heap: &Heap) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Ref(ia), Value::Ref(ib)) => match (heap.get(ia), heap.get(ib)) {
            (HeapData::Str(sa), HeapData::Str(sb)) => sa == sb,
            (HeapData::Pair(pa), HeapData::Pair(pb)) => {
                let (pa, pb) = (pa.clone(), pb.clone());
                equal(pa.car, pb.car, heap) && equal(pa.cdr, pb.cdr, heap)
            }
            (HeapData::Vector(va), HeapData::Vector(vb)) => {
                va.len() == vb.len() && va.iter().zip(vb.iter()).all(|(&x, &y)| equal(x, y, heap))
            }
            _ => false,
        },
        _ => false,
    }
}

/// Rendering mode: `Repr` quotes strings and spells characters `#\x`;
/// `Display` writes their raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrintStyle {
    Repr,
    Display,
}

/// Writes the printed form of a value.
///
/// `active` holds the arena ids currently on the traversal stack; revisiting
/// one means the structure is cyclic and prints as `#=<cycle>`.
pub(crate) fn write_value(
    out: &mut String,
    value: Value,
    style: PrintStyle,
    heap: &Heap,
    interns: &Interns,
    primitives: &[Primitive],
    active: &mut AHashSet<HeapId>,
) {
    match value {
        Value::Nil => out.push_str("()"),
        Value::Boolean(true) => out.push_str("#t"),
        Value::Boolean(false) => out.push_str("#f"),
        Value::Integer(n) => {
            out.push_str(&n.to_string());
        }
        Value::Float(f) => {
            if f.is_finite() {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format_finite(f));
            } else {
                out.push_str(&format!("{f}"));
            }
        }
        Value::Character(c) => match style {
            PrintStyle::Display => out.push(c),
            PrintStyle::Repr => {
                out.push_str("#\\");
                match c {
                    ' ' => out.push_str("space"),
                    '\n' => out.push_str("newline"),
                    '\t' => out.push_str("tab"),
                    _ => out.push(c),
                }
            }
        },
        Value::Symbol(id) => out.push_str(interns.name(id)),
        Value::Primitive(id) => {
            out.push_str("#<primitive ");
            match primitives.get(id.index()) {
                Some(prim) => out.push_str(interns.name(prim.name)),
                None => out.push('?'),
            }
            out.push('>');
        }
        Value::Boxed(handle) => {
            out.push_str(&format!("#<boxed-object 0x{:x}>", handle.raw()));
        }
        Value::Port(handle) => {
            out.push_str(&format!("#<port {}>", handle.raw()));
        }
        Value::Environment(env) => {
            out.push_str(&format!("#<environment {}>", env.index()));
        }
        Value::Ref(id) => write_heap_value(out, id, style, heap, interns, primitives, active),
    }
}

fn write_heap_value(
    out: &mut String,
    id: HeapId,
    style: PrintStyle,
    heap: &Heap,
    interns: &Interns,
    primitives: &[Primitive],
    active: &mut AHashSet<HeapId>,
) {
    match heap.get(id) {
        HeapData::Str(s) => match style {
            PrintStyle::Display => out.push_str(s),
            PrintStyle::Repr => {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        _ => out.push(c),
                    }
                }
                out.push('"');
            }
        },
        HeapData::Pair(_) => {
            if !active.insert(id) {
                out.push_str("#=<cycle>");
                return;
            }
            out.push('(');
            let mut spine = vec![id];
            let mut cur = id;
            loop {
                let HeapData::Pair(pair) = heap.get(cur) else {
                    unreachable!("spine walk stays on pairs")
                };
                let (car, cdr) = (pair.car, pair.cdr);
                write_value(out, car, style, heap, interns, primitives, active);
                match cdr {
                    Value::Nil => break,
                    Value::Ref(next) if matches!(heap.get(next), HeapData::Pair(_)) => {
                        if !active.insert(next) {
                            out.push_str(" . #=<cycle>");
                            break;
                        }
                        spine.push(next);
                        out.push(' ');
                        cur = next;
                    }
                    other => {
                        out.push_str(" . ");
                        write_value(out, other, style, heap, interns, primitives, active);
                        break;
                    }
                }
            }
            out.push(')');
            for spine_id in spine {
                active.remove(&spine_id);
            }
        }
        HeapData::Vector(items) => {
            // Vectorized lists are behaviorally proper lists; print them as one.
            if !active.insert(id) {
                out.push_str("#=<cycle>");
                return;
            }
            out.push('(');
            for (i, &item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item, style, heap, interns, primitives, active);
            }
            out.push(')');
            active.remove(&id);
        }
        HeapData::Function(function) => {
            out.push_str("#<function ");
            out.push_str(interns.name(function.name));
            out.push('>');
        }
        HeapData::Macro(m) => {
            out.push_str("#<macro ");
            out.push_str(interns.name(m.name));
            out.push('>');
        }
        HeapData::CompilerMacro(m) => {
            out.push_str("#<compiler-macro ");
            out.push_str(interns.name(m.name));
            out.push('>');
        }
        HeapData::Frame(frame) => {
            if !active.insert(id) {
                out.push_str("#=<cycle>");
                return;
            }
            out.push('{');
            for (i, (key, slot)) in frame.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(interns.name(key));
                out.push_str(": ");
                write_value(out, slot, style, heap, interns, primitives, active);
            }
            out.push('}');
            active.remove(&id);
        }
    }
}
