//! Type predicates and equality.

use crate::{
    callable::Arity,
    env::EnvId,
    error::EvalResult,
    interp::Interp,
    list,
    value::{Value, equal},
};

macro_rules! predicate_primitives {
    ($(($name:literal, $fn_name:ident, $test:expr)),* $(,)?) => {
        $(
            fn $fn_name(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
                let v = list::car(&interp.heap, args);
                let test: fn(&Interp, Value) -> bool = $test;
                Ok(Value::Boolean(test(interp, v)))
            }
        )*
        fn register_predicates(interp: &mut Interp) {
            $(interp.register_primitive($name, Arity::Exactly(1), $fn_name);)*
        }
    };
}

predicate_primitives![
    ("nil?", nil_p, |_i: &Interp, v: Value| v.is_nil()),
    ("pair?", pair_p, |i: &Interp, v: Value| v.is_pair(&i.heap)),
    ("list?", list_p, |i: &Interp, v: Value| v.is_list(&i.heap)),
    ("vector?", vector_p, |i: &Interp, v: Value| v.is_vector(&i.heap)),
    ("symbol?", symbol_p, |_i: &Interp, v: Value| v.as_symbol().is_some()),
    ("string?", string_p, |i: &Interp, v: Value| v.is_string(&i.heap)),
    ("number?", number_p, |_i: &Interp, v: Value| v.is_number()),
    ("integer?", integer_p, |_i: &Interp, v: Value| matches!(v, Value::Integer(_))),
    ("float?", float_p, |_i: &Interp, v: Value| matches!(v, Value::Float(_))),
    ("boolean?", boolean_p, |_i: &Interp, v: Value| matches!(v, Value::Boolean(_))),
    ("character?", character_p, |_i: &Interp, v: Value| matches!(v, Value::Character(_))),
    ("function?", function_p, |i: &Interp, v: Value| v.is_function(&i.heap)),
    ("macro?", macro_p, |i: &Interp, v: Value| v.is_macro(&i.heap)),
    ("primitive?", primitive_p, |_i: &Interp, v: Value| v.is_primitive()),
];

pub(crate) fn register(interp: &mut Interp) {
    register_predicates(interp);
    interp.register_primitive("eq?", Arity::Exactly(2), eq_impl);
    interp.register_primitive("equal?", Arity::Exactly(2), equal_impl);
    interp.register_primitive("not", Arity::Exactly(1), not_impl);
}

/// Identity equality: interned-symbol ids, arena ids, and immediate
/// payloads.
fn eq_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let a = list::car(&interp.heap, args);
    let b = list::cadr(&mut interp.heap, args);
    Ok(Value::Boolean(a == b))
}

fn equal_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let a = list::car(&interp.heap, args);
    let b = list::cadr(&mut interp.heap, args);
    Ok(Value::Boolean(equal(a, b, &interp.heap)))
}

fn not_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let v = list::car(&interp.heap, args);
    Ok(Value::Boolean(!v.truthy()))
}
