//! System primitives: output, tracing, timing.

use std::time::Instant;

use crate::{
    callable::Arity,
    env::EnvId,
    error::{EvalError, EvalResult},
    interp::Interp,
    list,
    tracer::{NoopTracer, StderrTracer},
    value::Value,
};

pub(crate) fn register(interp: &mut Interp) {
    interp.register_primitive("dump", Arity::Exactly(0), dump_impl);
    interp.register_primitive("write-line", Arity::Exactly(1), write_line_impl);
    interp.register_primitive("str", Arity::Any, str_impl);
    interp.register_primitive("debug", Arity::Any, debug_impl);
    interp.register_primitive("sleep", Arity::Exactly(1), sleep_impl);
    interp.register_special_form("time", Arity::AtLeast(1), time_impl);
}

fn dump_impl(interp: &mut Interp, _args: Value, env: EnvId) -> EvalResult<Value> {
    interp.dump(env);
    Ok(Value::Nil)
}

fn write_line_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let value = list::car(&interp.heap, args);
    let text = interp.display(value);
    interp.writer.stdout_write(text.into());
    interp.writer.stdout_push('\n');
    Ok(Value::Nil)
}

/// Concatenates the printed form of every argument.
fn str_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let mut text = String::new();
    for value in list::elements(&interp.heap, args) {
        text.push_str(&interp.display(value));
    }
    Ok(interp.string(&text))
}

/// With an argument, switches evaluation tracing on or off; returns the
/// current setting either way.
fn debug_impl(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    if list::length(&interp.heap, args) == 1 {
        let enable = list::car(&interp.heap, args).truthy();
        if enable {
            interp.set_tracer(Box::new(StderrTracer), true);
        } else {
            interp.set_tracer(Box::new(NoopTracer), false);
        }
    }
    Ok(Value::Boolean(interp.tracing))
}

/// Blocks the evaluating thread for the given number of milliseconds.
fn sleep_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let millis = match list::car(&interp.heap, args) {
        Value::Integer(n) if n >= 0 => n as f64,
        Value::Float(f) if f >= 0.0 && f.is_finite() => f,
        other => {
            return Err(EvalError::from_primitive(
                format!("sleep expected a non-negative number, received {}", interp.repr(other)),
                env,
            ));
        }
    };
    std::thread::sleep(std::time::Duration::from_secs_f64(millis / 1000.0));
    Ok(Value::Nil)
}

/// Evaluates its forms, reports the elapsed wall time, and returns it in
/// milliseconds.
fn time_impl(interp: &mut Interp, args: Value, env: EnvId) -> EvalResult<Value> {
    let start = Instant::now();
    interp.eval_sequence(args, env)?;
    let elapsed = start.elapsed();
    let line = format!("took {elapsed:?} to run\n");
    interp.writer.stdout_write(line.into());
    let millis = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
    Ok(Value::Integer(millis))
}
