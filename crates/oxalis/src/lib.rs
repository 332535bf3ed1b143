#![doc = include_str!("../../../README.md")]

mod builtins;
mod callable;
mod env;
mod error;
mod eval;
mod heap;
mod intern;
mod interp;
mod io;
mod list;
mod reader;
mod repl;
mod resource;
mod tracer;
mod types;
mod value;

pub use crate::{
    callable::{Arity, Function, MacroObject, NativeFn, Primitive, PrimitiveId},
    env::{EnvId, GLOBAL_ENV},
    error::{ErrKind, EvalError, EvalResult, ReplError},
    heap::{FrameRecord, Heap, HeapData, HeapId, Pair},
    intern::{Interns, SymbolId},
    interp::Interp,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    reader::{ReadError, read_source},
    repl::ReplSession,
    resource::{DEFAULT_MAX_RECURSION_DEPTH, ResourceLimits},
    tracer::{EvalTracer, NoopTracer, StderrTracer},
    types::{TypeMask, TypeSignature, mask_for_name, mask_name, spec_to_mask},
    value::{BoxedHandle, PortHandle, Value, equal},
};
