//! List primitives.

use crate::{
    callable::Arity,
    env::EnvId,
    error::{ErrKind, EvalError, EvalResult},
    heap::HeapData,
    interp::Interp,
    list,
    types::TypeMask,
    value::Value,
};

macro_rules! cxr_primitives {
    ($(($name:literal, $fn_name:ident, $path:literal)),* $(,)?) => {
        $(
            fn $fn_name(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
                let target = list::car(&interp.heap, args);
                Ok(list::walk_list(&mut interp.heap, target, $path))
            }
        )*
        fn register_cxr(interp: &mut Interp) {
            $(interp.register_primitive($name, Arity::Exactly(1), $fn_name);)*
        }
    };
}

cxr_primitives![
    ("car", car_impl, "a"),
    ("cdr", cdr_impl, "d"),
    ("caar", caar_impl, "aa"),
    ("cadr", cadr_impl, "ad"),
    ("cdar", cdar_impl, "da"),
    ("cddr", cddr_impl, "dd"),
    ("caaar", caaar_impl, "aaa"),
    ("caadr", caadr_impl, "aad"),
    ("cadar", cadar_impl, "ada"),
    ("caddr", caddr_impl, "add"),
    ("cdaar", cdaar_impl, "daa"),
    ("cdadr", cdadr_impl, "dad"),
    ("cddar", cddar_impl, "dda"),
    ("cdddr", cdddr_impl, "ddd"),
];

macro_rules! nth_primitives {
    ($(($name:literal, $fn_name:ident, $index:literal)),* $(,)?) => {
        $(
            fn $fn_name(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
                let target = list::car(&interp.heap, args);
                Ok(list::nth(&interp.heap, target, $index))
            }
        )*
        fn register_ordinals(interp: &mut Interp) {
            $(interp.register_primitive($name, Arity::Exactly(1), $fn_name);)*
        }
    };
}

nth_primitives![
    ("first", first_impl, 0),
    ("second", second_impl, 1),
    ("third", third_impl, 2),
    ("fourth", fourth_impl, 3),
    ("fifth", fifth_impl, 4),
    ("sixth", sixth_impl, 5),
    ("seventh", seventh_impl, 6),
    ("eighth", eighth_impl, 7),
    ("ninth", ninth_impl, 8),
    ("tenth", tenth_impl, 9),
];

pub(crate) fn register(interp: &mut Interp) {
    register_cxr(interp);
    register_ordinals(interp);
    interp.register_primitive("cons", Arity::Exactly(2), cons_impl);
    interp.register_primitive("list", Arity::Any, list_impl);
    interp.register_primitive("vector", Arity::Any, vector_impl);
    interp.register_typed_primitive(
        "nth",
        Arity::Exactly(2),
        nth_impl,
        vec![TypeMask::SEQUENCE, TypeMask::INTEGER],
    );
    interp.register_typed_primitive(
        "set-nth!",
        Arity::Exactly(3),
        set_nth_impl,
        vec![TypeMask::SEQUENCE, TypeMask::INTEGER, TypeMask::ANY],
    );
    interp.register_typed_primitive("set-car!", Arity::Exactly(2), set_car_impl, vec![TypeMask::LIST, TypeMask::ANY]);
    interp.register_typed_primitive("set-cdr!", Arity::Exactly(2), set_cdr_impl, vec![TypeMask::LIST, TypeMask::ANY]);
    interp.register_typed_primitive("length", Arity::Exactly(1), length_impl, vec![TypeMask::SEQUENCE]);
    interp.register_typed_primitive(
        "append",
        Arity::Exactly(2),
        append_impl,
        vec![TypeMask::SEQUENCE, TypeMask::ANY],
    );
}

fn cons_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let car = list::car(&interp.heap, args);
    let cdr = list::cadr(&mut interp.heap, args);
    Ok(list::cons(&mut interp.heap, car, cdr))
}

/// The evaluated actual list already is the result.
fn list_impl(_interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    Ok(args)
}

fn vector_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let items = list::elements(&interp.heap, args);
    Ok(Value::Ref(interp.heap.allocate(HeapData::Vector(items))))
}

fn nth_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let target = list::car(&interp.heap, args);
    let Value::Integer(index) = list::cadr(&mut interp.heap, args) else {
        unreachable!("index type checked by registration")
    };
    Ok(list::nth(&interp.heap, target, index))
}

fn set_nth_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let target = list::car(&interp.heap, args);
    let Value::Integer(index) = list::cadr(&mut interp.heap, args) else {
        unreachable!("index type checked by registration")
    };
    let value = list::caddr(&mut interp.heap, args);
    Ok(list::set_nth(&mut interp.heap, target, index, value))
}

fn set_car_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let target = list::car(&interp.heap, args);
    let value = list::cadr(&mut interp.heap, args);
    let Value::Ref(id) = target else {
        return Err(set_pair_error(interp, "set-car!", target, env));
    };
    match interp.heap.get_mut(id) {
        HeapData::Pair(pair) => {
            pair.car = value;
            Ok(value)
        }
        _ => Err(set_pair_error(interp, "set-car!", target, env)),
    }
}

fn set_cdr_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let target = list::car(&interp.heap, args);
    let value = list::cadr(&mut interp.heap, args);
    let Value::Ref(id) = target else {
        return Err(set_pair_error(interp, "set-cdr!", target, env));
    };
    match interp.heap.get_mut(id) {
        HeapData::Pair(pair) => {
            pair.cdr = value;
            Ok(value)
        }
        _ => Err(set_pair_error(interp, "set-cdr!", target, env)),
    }
}

fn set_pair_error(interp: &Interp, name: &str, target: Value, env: EnvId) -> EvalError {
    EvalError::new(
        ErrKind::PropagatedFromPrimitive,
        format!("{name} requires a pair, but got {}", interp.repr(target)),
        env,
    )
}

fn length_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let target = list::car(&interp.heap, args);
    let len = list::length(&interp.heap, target);
    Ok(Value::Integer(i64::try_from(len).expect("list length fits i64")))
}

fn append_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let a = list::car(&interp.heap, args);
    let b = list::cadr(&mut interp.heap, args);
    Ok(list::append(&mut interp.heap, a, b))
}
