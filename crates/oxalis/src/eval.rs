//! The evaluator and applier.
//!
//! `eval` recurses on sub-expressions, consulting the environment chain and
//! invoking callables; callables call back into `eval` for their bodies.
//! Argument evaluation is strict left-to-right, body forms are strict
//! in-order, and errors are never recovered here: any failure unwinds to
//! the caller.

use smallvec::SmallVec;

use crate::{
    callable::PrimitiveId,
    env::EnvId,
    error::{ErrKind, EvalError, EvalResult},
    heap::{HeapData, HeapId},
    intern::{StaticSymbols, SymbolId},
    interp::Interp,
    list,
    types::TypeMask,
    value::Value,
};

/// How the head of a combination can be applied.
enum ProcKind {
    Function(HeapId),
    Macro(HeapId),
    CompilerMacro,
    Primitive(PrimitiveId, bool),
    NotCallable,
}

impl Interp {
    /// Evaluates a value tree in an environment.
    pub fn eval(&mut self, x: Value, env: EnvId) -> EvalResult<Value> {
        if self.depth >= self.limits.max_recursion_depth {
            return Err(EvalError::new(
                ErrKind::RecursionLimit,
                format!("evaluation exceeded {} nested calls", self.limits.max_recursion_depth),
                env,
            ));
        }
        self.depth += 1;
        if self.tracing {
            let form = self.repr(x);
            let depth = self.depth;
            self.tracer.on_eval(&form, depth);
        }
        let result = self.eval_inner(x, env);
        self.depth -= 1;
        result
    }

    /// Evaluates in the global frame.
    pub fn eval_global(&mut self, x: Value) -> EvalResult<Value> {
        self.eval(x, self.global())
    }

    fn eval_inner(&mut self, x: Value, env: EnvId) -> EvalResult<Value> {
        match x {
            // Symbols resolve along the lexical chain; unbound reads as Nil.
            Value::Symbol(sym) => Ok(self.envs.value_of(env, sym).unwrap_or(Value::Nil)),
            // Pairs are combinations; every other value is self-quoting.
            Value::Ref(id) if matches!(self.heap.get(id), HeapData::Pair(_)) => self.eval_combination(x, env),
            _ => Ok(x),
        }
    }

    fn eval_combination(&mut self, form: Value, env: EnvId) -> EvalResult<Value> {
        let head = list::car(&self.heap, form);
        let tail = list::cdr(&mut self.heap, form);

        // Syntactic keywords dispatch on the head symbol itself, before any
        // binding lookup.
        if let Value::Symbol(sym) = head {
            if sym == StaticSymbols::Quote.into() {
                return Ok(list::car(&self.heap, tail));
            }
            if sym == StaticSymbols::Begin.into() {
                return self.eval_sequence(tail, env);
            }
            if sym == StaticSymbols::SetBang.into() {
                return self.eval_set(tail, env);
            }
            if sym == StaticSymbols::If.into() {
                let cond = list::car(&self.heap, tail);
                let cond = self.eval(cond, env)?;
                let branch = if cond.truthy() {
                    list::cadr(&mut self.heap, tail)
                } else {
                    // Absent else yields Nil: evaluating Nil is Nil.
                    list::caddr(&mut self.heap, tail)
                };
                return self.eval(branch, env);
            }
            if sym == StaticSymbols::Lambda.into() {
                return self.eval_lambda(tail, env);
            }
        }

        let proc = self.eval(head, env)?;
        match self.proc_kind(proc) {
            ProcKind::Macro(id) => {
                let expansion = self.expand_macro(id, tail, env)?;
                self.eval(expansion, env)
            }
            ProcKind::Function(id) => {
                let args = self.eval_args(tail, env)?;
                self.apply_function(id, args, env)
            }
            ProcKind::Primitive(pid, special) => {
                if special {
                    self.apply_primitive(pid, tail, env)
                } else {
                    let args = self.eval_args(tail, env)?;
                    self.apply_primitive(pid, args, env)
                }
            }
            ProcKind::CompilerMacro => Err(EvalError::new(
                ErrKind::NotCallable,
                format!(
                    "{} is a compiler macro and is not applicable at run time",
                    self.repr(proc)
                ),
                env,
            )),
            ProcKind::NotCallable => Err(EvalError::new(
                ErrKind::NotCallable,
                format!("{} is not callable", self.repr(proc)),
                env,
            )),
        }
    }

    fn proc_kind(&self, proc: Value) -> ProcKind {
        match proc {
            Value::Primitive(pid) => match self.primitives.get(pid.index()) {
                Some(prim) => ProcKind::Primitive(pid, prim.special),
                None => ProcKind::NotCallable,
            },
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Function(_) => ProcKind::Function(id),
                HeapData::Macro(_) => ProcKind::Macro(id),
                HeapData::CompilerMacro(_) => ProcKind::CompilerMacro,
                _ => ProcKind::NotCallable,
            },
            _ => ProcKind::NotCallable,
        }
    }

    /// Evaluates each form in order, returning the last result (Nil when
    /// the sequence is empty).
    pub(crate) fn eval_sequence(&mut self, forms: Value, env: EnvId) -> EvalResult<Value> {
        let mut result = Value::Nil;
        for form in list::elements(&self.heap, forms) {
            result = self.eval(form, env)?;
        }
        Ok(result)
    }

    fn eval_set(&mut self, tail: Value, env: EnvId) -> EvalResult<Value> {
        let target = list::car(&self.heap, tail);
        let Some(sym) = target.as_symbol() else {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                format!("set! requires a symbol to bind, received {}", self.repr(target)),
                env,
            ));
        };
        let expr = list::cadr(&mut self.heap, tail);
        let value = self.eval(expr, env)?;
        self.bind(env, sym, value)?;
        Ok(value)
    }

    fn eval_lambda(&mut self, tail: Value, env: EnvId) -> EvalResult<Value> {
        let formals = list::car(&self.heap, tail);
        if !formals.is_list(&self.heap) && !formals.is_dotted_list(&self.heap) {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                format!("lambda requires a parameter list, received {}", self.repr(formals)),
                env,
            ));
        }
        let body = list::cdr(&mut self.heap, tail);
        let function = crate::callable::Function {
            name: StaticSymbols::Unnamed.into(),
            formals,
            doc: None,
            body,
            env,
        };
        Ok(Value::Ref(self.heap.allocate(HeapData::Function(function))))
    }

    /// Evaluates the elements of `forms` left to right and collects the
    /// results into a fresh actual list.
    fn eval_args(&mut self, forms: Value, env: EnvId) -> EvalResult<Value> {
        let mut actuals: SmallVec<[Value; 8]> = SmallVec::new();
        for form in list::elements(&self.heap, forms) {
            actuals.push(self.eval(form, env)?);
        }
        Ok(list::array_to_list(&mut self.heap, &actuals))
    }

    /// Applies an already-evaluated callable to an already-evaluated actual
    /// list. The entry point used by `apply` and by host code.
    pub fn apply_without_eval(&mut self, proc: Value, args: Value, env: EnvId) -> EvalResult<Value> {
        match self.proc_kind(proc) {
            ProcKind::Function(id) => self.apply_function(id, args, env),
            ProcKind::Primitive(pid, _) => self.apply_primitive(pid, args, env),
            _ => Err(EvalError::new(
                ErrKind::NotCallable,
                format!("{} is not callable", self.repr(proc)),
                env,
            )),
        }
    }

    /// Host convenience: applies `proc` to a slice of argument values.
    pub fn apply(&mut self, proc: Value, args: &[Value], env: EnvId) -> EvalResult<Value> {
        let list = list::array_to_list(&mut self.heap, args);
        self.apply_without_eval(proc, list, env)
    }

    pub(crate) fn apply_function(&mut self, id: HeapId, args: Value, caller_env: EnvId) -> EvalResult<Value> {
        let HeapData::Function(function) = self.heap.get(id) else {
            unreachable!("apply_function requires a function id")
        };
        let function = function.clone();
        if self.tracing {
            let name = self.interns.name(function.name).to_owned();
            let depth = self.depth;
            self.tracer.on_apply(&name, depth);
        }

        let frame_name = self.interns.name(function.name).to_owned();
        let frame = self.envs.new_frame_below(function.env, frame_name);
        self.envs.set_previous(frame, caller_env);
        self.bind_formals(frame, function.formals, args, function.name, caller_env)?;

        let sig = self.type_sigs.get(&function.name).cloned();
        if let Some(sig) = &sig {
            let actuals = list::elements(&self.heap, args);
            for (i, (&actual, &mask)) in actuals.iter().zip(sig.args.iter()).enumerate() {
                self.check_type(
                    actual,
                    mask,
                    &format!("argument {} of {}", i + 1, self.interns.name(function.name)),
                    caller_env,
                )?;
            }
        }

        let result = self.eval_sequence(function.body, frame)?;

        if let Some(sig) = &sig {
            self.check_type(
                result,
                sig.ret,
                &format!("return value of {}", self.interns.name(function.name)),
                caller_env,
            )?;
        }
        Ok(result)
    }

    pub(crate) fn apply_primitive(&mut self, pid: PrimitiveId, args: Value, env: EnvId) -> EvalResult<Value> {
        let prim = self.primitives[pid.index()].clone();
        if self.tracing {
            let name = self.interns.name(prim.name).to_owned();
            let depth = self.depth;
            self.tracer.on_apply(&name, depth);
        }

        let count = list::length(&self.heap, args);
        if !prim.arity.accepts(count) {
            return Err(EvalError::new(
                ErrKind::ArityMismatch,
                format!(
                    "{} expects {}, got {count}",
                    self.interns.name(prim.name),
                    prim.arity
                ),
                env,
            ));
        }
        if !prim.special
            && let Some(arg_types) = &prim.arg_types
        {
            let actuals = list::elements(&self.heap, args);
            for (i, (&actual, &mask)) in actuals.iter().zip(arg_types.iter()).enumerate() {
                self.check_type(
                    actual,
                    mask,
                    &format!("argument {} of {}", i + 1, self.interns.name(prim.name)),
                    env,
                )?;
            }
        }
        (prim.native)(self, args, env)
    }

    /// Expands a macro: formals are bound to the unevaluated actual forms
    /// in a child of the captured environment, and the body is evaluated
    /// there to produce the expansion.
    pub(crate) fn expand_macro(&mut self, id: HeapId, forms: Value, caller_env: EnvId) -> EvalResult<Value> {
        let mac = match self.heap.get(id) {
            HeapData::Macro(m) | HeapData::CompilerMacro(m) => m.clone(),
            _ => unreachable!("expand_macro requires a macro id"),
        };
        let frame_name = self.interns.name(mac.name).to_owned();
        let frame = self.envs.new_frame_below(mac.env, frame_name);
        self.envs.set_previous(frame, caller_env);
        self.bind_formals(frame, mac.formals, forms, mac.name, caller_env)?;
        let expansion = self.eval(mac.body, frame)?;
        if self.tracing {
            let name = self.interns.name(mac.name).to_owned();
            let printed = self.repr(expansion);
            self.tracer.on_expand(&name, &printed);
        }
        Ok(expansion)
    }

    /// Binds a formal-parameter tree against an actual list in `frame`.
    ///
    /// A proper formals list demands an exact count; a dotted tail takes
    /// the remaining actuals as a (possibly Nil) list; a single symbol
    /// takes the whole actual list.
    fn bind_formals(
        &mut self,
        frame: EnvId,
        formals: Value,
        actuals: Value,
        name: SymbolId,
        env: EnvId,
    ) -> EvalResult<()> {
        let (fixed, rest) = self.formals_shape(formals);
        let got = list::length(&self.heap, actuals);
        let arity_error = |interp: &Self| {
            let wanted = if rest {
                format!("at least {fixed}")
            } else {
                format!("exactly {fixed}")
            };
            EvalError::new(
                ErrKind::ArityMismatch,
                format!("{} expects {wanted} argument(s), got {got}", interp.interns.name(name)),
                env,
            )
        };

        let mut f = formals;
        let mut a = actuals;
        loop {
            match f {
                Value::Nil => {
                    if !a.is_nil() {
                        return Err(arity_error(self));
                    }
                    return Ok(());
                }
                Value::Symbol(rest_sym) => {
                    self.envs.bind_locally_to(frame, rest_sym, a);
                    return Ok(());
                }
                _ if f.is_pair(&self.heap) || f.is_vector(&self.heap) => {
                    let formal = list::car(&self.heap, f);
                    let Some(sym) = formal.as_symbol() else {
                        return Err(EvalError::new(
                            ErrKind::MalformedForm,
                            format!("formal parameters must be symbols, received {}", self.repr(formal)),
                            env,
                        ));
                    };
                    if a.is_nil() {
                        return Err(arity_error(self));
                    }
                    let actual = list::car(&self.heap, a);
                    self.envs.bind_locally_to(frame, sym, actual);
                    f = list::cdr(&mut self.heap, f);
                    a = list::cdr(&mut self.heap, a);
                }
                _ => {
                    return Err(EvalError::new(
                        ErrKind::MalformedForm,
                        format!("malformed formal parameter list {}", self.repr(formals)),
                        env,
                    ));
                }
            }
        }
    }

    /// Counts the fixed formals and reports whether a rest parameter is
    /// present.
    fn formals_shape(&mut self, formals: Value) -> (usize, bool) {
        let mut fixed = 0;
        let mut f = formals;
        loop {
            match f {
                Value::Nil => return (fixed, false),
                Value::Symbol(_) => return (fixed, true),
                _ if f.is_pair(&self.heap) || f.is_vector(&self.heap) => {
                    fixed += 1;
                    f = list::cdr(&mut self.heap, f);
                }
                _ => return (fixed, false),
            }
        }
    }

    pub(crate) fn check_type(&self, value: Value, mask: TypeMask, what: &str, env: EnvId) -> EvalResult<()> {
        let tag = value.type_of(&self.heap);
        if mask.admits(tag) {
            return Ok(());
        }
        Err(EvalError::new(
            ErrKind::TypeMismatch,
            format!("{what} should be of type {mask}, got {tag}"),
            env,
        ))
    }
}
