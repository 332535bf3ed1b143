//! Numeric primitives.
//!
//! Arithmetic follows the usual contagion rule: integer operands stay
//! integral, any float operand makes the result a float. Integer overflow
//! and division by zero are reported, not wrapped.

use std::cmp::Ordering;

use crate::{
    callable::Arity,
    env::EnvId,
    error::{EvalError, EvalResult},
    interp::Interp,
    list,
    value::Value,
};

pub(crate) fn register(interp: &mut Interp) {
    interp.register_primitive("+", Arity::Any, add_impl);
    interp.register_primitive("-", Arity::AtLeast(1), sub_impl);
    interp.register_primitive("*", Arity::Any, mul_impl);
    interp.register_primitive("/", Arity::AtLeast(1), div_impl);
    interp.register_primitive("%", Arity::Exactly(2), rem_impl);
    interp.register_primitive("=", Arity::AtLeast(2), num_eq_impl);
    interp.register_primitive("<", Arity::AtLeast(2), lt_impl);
    interp.register_primitive(">", Arity::AtLeast(2), gt_impl);
    interp.register_primitive("<=", Arity::AtLeast(2), le_impl);
    interp.register_primitive(">=", Arity::AtLeast(2), ge_impl);
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(n) => Value::Integer(n),
            Self::Float(f) => Value::Float(f),
        }
    }
}

fn want_number(interp: &Interp, name: &str, v: Value, env: EnvId) -> EvalResult<Num> {
    match v {
        Value::Integer(n) => Ok(Num::Int(n)),
        Value::Float(f) => Ok(Num::Float(f)),
        _ => Err(EvalError::from_primitive(
            format!("{name} expected a number, received {}", interp.repr(v)),
            env,
        )),
    }
}

fn numbers(interp: &Interp, name: &str, args: Value, env: EnvId) -> EvalResult<Vec<Num>> {
    list::elements(&interp.heap, args)
        .into_iter()
        .map(|v| want_number(interp, name, v, env))
        .collect()
}

fn overflow(name: &str, env: EnvId) -> EvalError {
    EvalError::from_primitive(format!("integer overflow in {name}"), env)
}

fn add_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let mut acc = Num::Int(0);
    for n in numbers(interp, "+", args, env)? {
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.checked_add(b).ok_or_else(|| overflow("+", env))?),
            (a, b) => Num::Float(a.as_f64() + b.as_f64()),
        };
    }
    Ok(acc.into_value())
}

fn sub_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let nums = numbers(interp, "-", args, env)?;
    if nums.len() == 1 {
        return Ok(match nums[0] {
            Num::Int(n) => Value::Integer(n.checked_neg().ok_or_else(|| overflow("-", env))?),
            Num::Float(f) => Value::Float(-f),
        });
    }
    let mut acc = nums[0];
    for &n in &nums[1..] {
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.checked_sub(b).ok_or_else(|| overflow("-", env))?),
            (a, b) => Num::Float(a.as_f64() - b.as_f64()),
        };
    }
    Ok(acc.into_value())
}

fn mul_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let mut acc = Num::Int(1);
    for n in numbers(interp, "*", args, env)? {
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.checked_mul(b).ok_or_else(|| overflow("*", env))?),
            (a, b) => Num::Float(a.as_f64() * b.as_f64()),
        };
    }
    Ok(acc.into_value())
}

fn div_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let nums = numbers(interp, "/", args, env)?;
    if nums.len() == 1 {
        let d = nums[0].as_f64();
        if d == 0.0 {
            return Err(EvalError::from_primitive("division by zero", env));
        }
        return Ok(Value::Float(1.0 / d));
    }
    let mut acc = nums[0];
    for &n in &nums[1..] {
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => {
                if b == 0 {
                    return Err(EvalError::from_primitive("division by zero", env));
                }
                Num::Int(a.checked_div(b).ok_or_else(|| overflow("/", env))?)
            }
            (a, b) => {
                let divisor = b.as_f64();
                if divisor == 0.0 {
                    return Err(EvalError::from_primitive("division by zero", env));
                }
                Num::Float(a.as_f64() / divisor)
            }
        };
    }
    Ok(acc.into_value())
}

fn rem_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let nums = numbers(interp, "%", args, env)?;
    let (Num::Int(a), Num::Int(b)) = (nums[0], nums[1]) else {
        return Err(EvalError::from_primitive("% requires integer arguments", env));
    };
    if b == 0 {
        return Err(EvalError::from_primitive("division by zero", env));
    }
    Ok(Value::Integer(a.wrapping_rem(b)))
}

fn compare(interp: &mut Interp, name: &str, args: Value, env: EnvId, holds: fn(Ordering) -> bool) -> EvalResult<Value> {
    let nums = numbers(interp, name, args, env)?;
    for window in nums.windows(2) {
        let ordering = match (window[0], window[1]) {
            (Num::Int(a), Num::Int(b)) => a.cmp(&b),
            (a, b) => match a.as_f64().partial_cmp(&b.as_f64()) {
                Some(ordering) => ordering,
                None => return Ok(Value::Boolean(false)),
            },
        };
        if !holds(ordering) {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn num_eq_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    compare(interp, "=", args, env, Ordering::is_eq)
}

fn lt_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    compare(interp, "<", args, env, Ordering::is_lt)
}

fn gt_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    compare(interp, ">", args, env, Ordering::is_gt)
}

fn le_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    compare(interp, "<=", args, env, Ordering::is_le)
}

fn ge_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    compare(interp, ">=", args, env, Ordering::is_ge)
}
