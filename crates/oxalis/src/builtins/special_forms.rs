//! Special-form primitives.
//!
//! These natives receive their form tail unevaluated and decide what to
//! evaluate themselves. The five syntactic keywords (`quote`, `begin`,
//! `set!`, `if`, `lambda`) are dispatched inside the evaluator; everything
//! else lives here.

use crate::{
    callable::{Arity, Function, MacroObject},
    env::EnvId,
    error::{ErrKind, EvalError, EvalResult},
    heap::HeapData,
    intern::{StaticSymbols, SymbolId},
    interp::Interp,
    list,
    types::{TypeMask, TypeSignature, spec_to_mask},
    value::Value,
};

pub(crate) fn register(interp: &mut Interp) {
    interp.register_special_form("define", Arity::AtLeast(1), define_impl);
    interp.register_special_form("typedef", Arity::AtLeast(1), typedef_impl);
    interp.register_special_form("defmacro", Arity::AtLeast(1), defmacro_impl);
    interp.register_special_form("define-macro", Arity::AtLeast(1), defmacro_impl);
    interp.register_special_form("define-compiler-macro", Arity::AtLeast(1), def_compiler_macro_impl);
    interp.register_special_form("do", Arity::AtLeast(2), do_impl);
    interp.register_special_form("apply", Arity::AtLeast(1), apply_impl);
    interp.register_special_form("->", Arity::AtLeast(1), chain_impl);
    interp.register_special_form("=>", Arity::AtLeast(1), tap_impl);
    interp.register_special_form("definition-of", Arity::Exactly(1), definition_of_impl);
    interp.register_special_form("doc", Arity::Exactly(1), doc_impl);
    interp.register_special_form("type", Arity::Exactly(1), type_impl);
    interp.register_special_form("let", Arity::AtLeast(1), let_impl);
    interp.register_special_form("let*", Arity::AtLeast(1), let_star_impl);
    interp.register_special_form("letrec", Arity::AtLeast(1), letrec_impl);
}

fn define_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let thing = list::car(&interp.heap, args);
    if let Some(sym) = thing.as_symbol() {
        if interp.value_of(env, sym).is_primitive() {
            return Err(redefine_primitive(interp, sym, env));
        }
        let expr = list::cadr(&mut interp.heap, args);
        let value = interp.eval(expr, env)?;
        interp.bind_locally(env, sym, value);
        return Ok(value);
    }
    if thing.is_pair(&interp.heap) || thing.is_vector(&interp.heap) {
        let name = list::car(&interp.heap, thing);
        let Some(name_sym) = name.as_symbol() else {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                "function name has to be a symbol",
                env,
            ));
        };
        if interp.value_of(env, name_sym).is_primitive() {
            return Err(redefine_primitive(interp, name_sym, env));
        }
        let formals = list::cdr(&mut interp.heap, thing);
        let mut body = list::cdr(&mut interp.heap, args);
        let mut doc = None;
        let first_form = list::car(&interp.heap, body);
        if let Value::Ref(id) = first_form
            && let HeapData::Str(text) = interp.heap.get(id)
        {
            doc = Some(text.clone());
            body = list::cdr(&mut interp.heap, body);
        }
        let function = Function {
            name: name_sym,
            formals,
            doc,
            body,
            env,
        };
        let value = Value::Ref(interp.heap.allocate(HeapData::Function(function)));
        interp.bind_locally(env, name_sym, value);
        return Ok(value);
    }
    Err(EvalError::new(
        ErrKind::MalformedForm,
        format!(
            "define expected a symbol or formals list as its first argument but received {}",
            interp.repr(thing)
        ),
        env,
    ))
}

fn redefine_primitive(interp: &Interp, sym: SymbolId, env: EnvId) -> EvalError {
    EvalError::new(
        ErrKind::RedefinePrimitive,
        format!("primitive function {} can not be redefined", interp.interns.name(sym)),
        env,
    )
}

fn typedef_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let thing = list::car(&interp.heap, args);
    let Some(name_sym) = thing.as_symbol() else {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            format!("typedef expected a symbol name but received {}", interp.repr(thing)),
            env,
        ));
    };

    let mut arg_masks = Vec::new();
    let mut ret = TypeMask::ANY;
    let mut cell = list::cdr(&mut interp.heap, args);
    while !cell.is_nil() {
        let token = list::car(&interp.heap, cell);
        if token.as_symbol() == Some(StaticSymbols::Chain.into()) {
            let rest = list::cdr(&mut interp.heap, cell);
            if rest.is_nil() {
                return Err(EvalError::new(
                    ErrKind::MalformedForm,
                    "typedef expected a type name to follow ->",
                    env,
                ));
            }
            let ret_token = list::car(&interp.heap, rest);
            ret = parse_type_token(interp, ret_token, env)?;
            break;
        }
        arg_masks.push(parse_type_token(interp, token, env)?);
        cell = list::cdr(&mut interp.heap, cell);
    }

    interp.type_sigs.insert(name_sym, TypeSignature { args: arg_masks, ret });
    Ok(Value::Nil)
}

/// Type tokens are symbols (or strings) whose text is a `|`-separated spec.
fn parse_type_token(interp: &Interp, token: Value, env: EnvId) -> EvalResult<TypeMask> {
    let text = match token {
        Value::Symbol(sym) => interp.interns.name(sym).to_owned(),
        Value::Ref(id) => match interp.heap.get(id) {
            HeapData::Str(s) => s.clone(),
            _ => {
                return Err(EvalError::new(
                    ErrKind::MalformedForm,
                    format!("typedef expected a type name but received {}", interp.repr(token)),
                    env,
                ));
            }
        },
        _ => {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                format!("typedef expected a type name but received {}", interp.repr(token)),
                env,
            ));
        }
    };
    spec_to_mask(&text).map_err(|bad| {
        EvalError::new(
            ErrKind::InvalidType,
            format!("typedef specified an invalid type: '{bad}'"),
            env,
        )
    })
}

fn defmacro_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    make_macro(interp, args, env, false)
}

fn def_compiler_macro_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    make_macro(interp, args, env, true)
}

fn make_macro(interp: &mut Interp, args: Value, env: EnvId, compiler: bool) -> EvalResult<Value> {
    let thing = list::car(&interp.heap, args);
    if !thing.is_list(&interp.heap) && !thing.is_dotted_list(&interp.heap) {
        return Err(EvalError::new(ErrKind::MalformedForm, "invalid macro definition", env));
    }
    let name = list::car(&interp.heap, thing);
    let Some(name_sym) = name.as_symbol() else {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "macro name has to be a symbol",
            env,
        ));
    };
    let formals = list::cdr(&mut interp.heap, thing);
    let body = list::cadr(&mut interp.heap, args);
    let mac = MacroObject {
        name: name_sym,
        formals,
        body,
        env,
    };
    let data = if compiler {
        HeapData::CompilerMacro(mac)
    } else {
        HeapData::Macro(mac)
    };
    let value = Value::Ref(interp.heap.allocate(data));
    interp.bind_locally(env, name_sym, value);
    Ok(value)
}

/// Binds the let-family binding pairs. `rec` pre-binds every name to Nil so
/// inits can reference any sibling; inits are evaluated in `eval_env` and
/// bound into `local_env` in order.
fn bind_let_locals(
    interp: &mut Interp,
    binding_forms: Value,
    rec: bool,
    local_env: EnvId,
    eval_env: EnvId,
) -> EvalResult<()> {
    let pairs = list::elements(&interp.heap, binding_forms);
    for &binding in &pairs {
        if !binding.is_list(&interp.heap) {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                "let requires a list of bindings (which are pairs) as its first argument",
                eval_env,
            ));
        }
        let name = list::car(&interp.heap, binding);
        let Some(name_sym) = name.as_symbol() else {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                "first part of a let binding pair must be a symbol",
                eval_env,
            ));
        };
        if rec {
            interp.bind_locally(local_env, name_sym, Value::Nil);
        }
    }

    for &binding in &pairs {
        let name = list::car(&interp.heap, binding);
        let name_sym = name.as_symbol().expect("binding names checked above");
        let value = if list::length(&interp.heap, binding) == 1 {
            Value::Nil
        } else {
            let init = list::cadr(&mut interp.heap, binding);
            interp.eval(init, eval_env)?
        };
        interp.bind_locally(local_env, name_sym, value);
    }
    Ok(())
}

fn let_common(interp: &mut Interp, args: Value, env: EnvId, star: bool, rec: bool) -> EvalResult<Value> {
    let bindings = list::car(&interp.heap, args);
    if !bindings.is_list(&interp.heap) {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "let requires a list of bindings as its first argument",
            env,
        ));
    }

    let local_env = interp.envs.new_frame_below(env, "let");
    interp.envs.set_previous(local_env, env);
    let eval_env = if star || rec { local_env } else { env };
    bind_let_locals(interp, bindings, rec, local_env, eval_env)?;

    let body = list::cdr(&mut interp.heap, args);
    interp.eval_sequence(body, local_env)
}

fn named_let_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let name = list::car(&interp.heap, args);
    let name_sym = name.as_symbol().expect("named let dispatched on a symbol");
    let bindings = list::cadr(&mut interp.heap, args);
    if !bindings.is_list(&interp.heap) {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "a named let requires a list of bindings as its second argument",
            env,
        ));
    }
    let body = list::cddr(&mut interp.heap, args);

    let mut vars = Vec::new();
    let mut inits = Vec::new();
    for binding in list::elements(&interp.heap, bindings) {
        let var = list::car(&interp.heap, binding);
        if var.as_symbol().is_none() {
            return Err(EvalError::new(
                ErrKind::MalformedForm,
                "the first element of a binding must be a symbol",
                env,
            ));
        }
        vars.push(var);
        inits.push(list::cadr(&mut interp.heap, binding));
    }
    let vars_list = list::array_to_list(&mut interp.heap, &vars);

    // The function is bound under its own name in a fresh frame so the body
    // can recurse on it.
    let frame_name = interp.interns.name(name_sym).to_owned();
    let local_env = interp.envs.new_frame_below(env, frame_name);
    interp.envs.set_previous(local_env, env);
    interp.bind_locally(local_env, name_sym, Value::Nil);
    let function = Function {
        name: name_sym,
        formals: vars_list,
        doc: None,
        body,
        env: local_env,
    };
    let proc = Value::Ref(interp.heap.allocate(HeapData::Function(function)));
    interp.bind_locally(local_env, name_sym, proc);

    let mut initial_values = Vec::with_capacity(inits.len());
    for init in inits {
        initial_values.push(interp.eval(init, env)?);
    }
    let actual_list = list::array_to_list(&mut interp.heap, &initial_values);
    interp.apply_without_eval(proc, actual_list, env)
}

fn let_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    if list::car(&interp.heap, args).as_symbol().is_some() {
        named_let_impl(interp, args, env)
    } else {
        let_common(interp, args, env, false, false)
    }
}

fn let_star_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let_common(interp, args, env, true, false)
}

fn letrec_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let_common(interp, args, env, false, true)
}

fn do_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let bindings = list::car(&interp.heap, args);
    if !bindings.is_list(&interp.heap) {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "do requires a list of bindings as its first argument",
            env,
        ));
    }
    let test_clause = list::cadr(&mut interp.heap, args);
    if !test_clause.is_list(&interp.heap) {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "do requires a test clause list as its second argument",
            env,
        ));
    }

    let local_env = interp.envs.new_frame_below(env, "do");
    interp.envs.set_previous(local_env, env);
    bind_let_locals(interp, bindings, false, local_env, env)?;

    let body = list::cddr(&mut interp.heap, args);
    let test = list::car(&interp.heap, test_clause);
    let result_forms = list::cdr(&mut interp.heap, test_clause);

    loop {
        let should_exit = interp.eval(test, local_env)?;
        if should_exit.truthy() {
            return interp.eval_sequence(result_forms, local_env);
        }

        interp.eval_sequence(body, local_env)?;

        // All step values are computed before any rebinding, so steps see
        // the previous iteration's values.
        let mut rebinds = Vec::new();
        for tuple in list::elements(&interp.heap, bindings) {
            let name = list::car(&interp.heap, tuple);
            let name_sym = name.as_symbol().expect("binding names checked above");
            let step = list::caddr(&mut interp.heap, tuple);
            let value = if step.is_nil() {
                interp.value_of(local_env, name_sym)
            } else {
                interp.eval(step, local_env)?
            };
            rebinds.push((name_sym, value));
        }
        for (name_sym, value) in rebinds {
            interp.bind_locally(local_env, name_sym, value);
        }
    }
}

fn apply_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let head = list::car(&interp.heap, args);
    let proc = interp.eval(head, env)?;
    if !proc.is_function(&interp.heap) && !proc.is_primitive() {
        return Err(EvalError::new(
            ErrKind::NotCallable,
            format!("apply requires a function as its first argument, but got {}", interp.repr(proc)),
            env,
        ));
    }

    let rest_forms = list::cdr(&mut interp.heap, args);
    let forms = list::elements(&interp.heap, rest_forms);
    if forms.is_empty() {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            "apply requires a final argument list",
            env,
        ));
    }
    let mut values = Vec::with_capacity(forms.len());
    for form in forms {
        values.push(interp.eval(form, env)?);
    }

    let last = *values.last().expect("checked non-empty above");
    if !last.is_list(&interp.heap) {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            format!("apply requires the last arg to be a list, but got {}", interp.repr(last)),
            env,
        ));
    }
    let actual_list = if values.len() > 1 {
        list::array_to_list_with_tail(&mut interp.heap, &values[..values.len() - 1], last)
    } else {
        last
    };
    interp.apply_without_eval(proc, actual_list, env)
}

/// Builds `(quote v)` so an already-evaluated value survives re-evaluation.
fn quote_it(interp: &mut Interp, value: Value) -> Value {
    let quote = Value::Symbol(StaticSymbols::Quote.into());
    let items = [quote, value];
    list::array_to_list(&mut interp.heap, &items)
}

/// Threads `value` as the trailing argument through each form.
fn thread_step(interp: &mut Interp, sexpr: Value, value: Value, env: EnvId) -> EvalResult<Value> {
    let quoted = quote_it(interp, value);
    let new_expr = if sexpr.is_pair(&interp.heap) || sexpr.is_vector(&interp.heap) {
        let head = list::car(&interp.heap, sexpr);
        let rest = list::cdr(&mut interp.heap, sexpr);
        let mut items = list::elements(&interp.heap, rest);
        items.push(quoted);
        let tail = list::array_to_list(&mut interp.heap, &items);
        list::cons(&mut interp.heap, head, tail)
    } else {
        let items = [sexpr, quoted];
        list::array_to_list(&mut interp.heap, &items)
    };
    interp.eval(new_expr, env)
}

fn chain_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let first = list::car(&interp.heap, args);
    let mut value = interp.eval(first, env)?;
    let rest = list::cdr(&mut interp.heap, args);
    for sexpr in list::elements(&interp.heap, rest) {
        value = thread_step(interp, sexpr, value, env)?;
    }
    Ok(value)
}

fn tap_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let first = list::car(&interp.heap, args);
    let value = interp.eval(first, env)?;
    let rest = list::cdr(&mut interp.heap, args);
    for sexpr in list::elements(&interp.heap, rest) {
        thread_step(interp, sexpr, value, env)?;
    }
    Ok(value)
}

/// Resolves the single argument of a reflective form to a Function,
/// evaluating it exactly once.
fn resolve_function(interp: &mut Interp, args: Value, env: EnvId, what: &str) -> EvalResult<Function> {
    let arg = list::car(&interp.heap, args);
    let value = interp.eval(arg, env)?;
    match value {
        Value::Ref(id) => match interp.heap.get(id) {
            HeapData::Function(function) => Ok(function.clone()),
            _ => Err(non_function(interp, value, env, what)),
        },
        _ => Err(non_function(interp, value, env, what)),
    }
}

fn non_function(interp: &Interp, value: Value, env: EnvId, what: &str) -> EvalError {
    EvalError::new(
        ErrKind::TypeMismatch,
        format!(
            "{what} requires a function argument, but received a {}",
            value.type_of(&interp.heap)
        ),
        env,
    )
}

fn definition_of_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let arg = list::car(&interp.heap, args);
    let name_sym = arg.as_symbol().unwrap_or_else(|| StaticSymbols::Anonymous.into());
    let function = resolve_function(interp, args, env, "definition-of")?;

    let define = Value::Symbol(StaticSymbols::Define.into());
    if function.name == StaticSymbols::Unnamed.into() {
        // (define name (lambda formals body...))
        let lambda = Value::Symbol(StaticSymbols::Lambda.into());
        let lambda_tail = list::cons(&mut interp.heap, function.formals, function.body);
        let lambda_form = list::cons(&mut interp.heap, lambda, lambda_tail);
        let items = [define, Value::Symbol(name_sym), lambda_form];
        Ok(list::array_to_list(&mut interp.heap, &items))
    } else {
        // (define (name . formals) body...)
        let header = list::cons(&mut interp.heap, Value::Symbol(function.name), function.formals);
        let tail = list::cons(&mut interp.heap, header, function.body);
        Ok(list::cons(&mut interp.heap, define, tail))
    }
}

fn doc_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let name = list::car(&interp.heap, args);
    let Some(name_sym) = name.as_symbol() else {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            format!("doc requires a symbol naming a function, but received {}", interp.repr(name)),
            env,
        ));
    };
    let function = resolve_function(interp, args, env, "doc")?;
    let text = match function.doc {
        Some(doc) if !doc.is_empty() => doc,
        _ => format!("{} has no documentation string.", interp.interns.name(name_sym)),
    };
    Ok(interp.string(&text))
}

fn type_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let name = list::car(&interp.heap, args);
    if name.as_symbol().is_none() {
        return Err(EvalError::new(
            ErrKind::MalformedForm,
            format!("type requires a symbol naming a function, but received {}", interp.repr(name)),
            env,
        ));
    }
    let function = resolve_function(interp, args, env, "type")?;

    let Some(sig) = interp.type_sigs.get(&function.name).cloned() else {
        return Ok(Value::Nil);
    };
    let mut items = Vec::with_capacity(sig.args.len() + 2);
    for mask in &sig.args {
        let sym = interp.intern(&mask.to_string());
        items.push(Value::Symbol(sym));
    }
    items.push(Value::Symbol(StaticSymbols::Chain.into()));
    let ret_sym = interp.intern(&sig.ret.to_string());
    items.push(Value::Symbol(ret_sym));
    Ok(list::array_to_list(&mut interp.heap, &items))
}
