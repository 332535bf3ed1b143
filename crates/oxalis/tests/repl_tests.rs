//! Behavior of `ReplSession`: persistent state across executes, output
//! capture, host primitive registration, resource limits, and snapshot
//! round-trips.

use oxalis::{
    Arity, BoxedHandle, CollectStringPrint, EnvId, ErrKind, EvalError, EvalResult, Interp, NoPrint, ReplError,
    ReplSession, ResourceLimits, Value,
};
use pretty_assertions::assert_eq;

fn session() -> ReplSession {
    ReplSession::with_writer(Box::new(NoPrint))
}

// =============================================================================
// 1. Persistence
// =============================================================================

/// Bindings made in one execute() survive to the next.
#[test]
fn bindings_persist_across_lines() {
    let mut session = session();
    session.execute("(define a 10)").expect("define should succeed");
    session.execute("(define b 20)").expect("define should succeed");
    let result = session.execute("(+ a b)").expect("sum should succeed");
    assert_eq!(session.repr(result), "30");
}

/// A function defined on one line can be called on a later line.
#[test]
fn function_defined_then_called() {
    let mut session = session();
    session
        .execute("(define (double n) (* n 2))")
        .expect("define should succeed");
    let result = session.execute("(double 21)").expect("call should succeed");
    assert_eq!(session.repr(result), "42");
}

/// Empty input evaluates to Nil.
#[test]
fn empty_input_is_nil() {
    let mut session = session();
    let result = session.execute("   ; just a comment\n").expect("empty input is fine");
    assert_eq!(result, Value::Nil);
}

/// A read failure reports the Read stage, not Eval.
#[test]
fn read_errors_are_distinct() {
    let mut session = session();
    match session.execute("(1 2") {
        Err(ReplError::Read(error)) => {
            assert!(
                error.message.contains("unterminated"),
                "unexpected message: {}",
                error.message
            );
        }
        other => panic!("expected a read error, got {other:?}"),
    }
}

// =============================================================================
// 2. Output capture
// =============================================================================

/// write-line output goes through the session's PrintWriter.
#[test]
fn write_line_captured() {
    let collector = CollectStringPrint::new();
    let mut session = ReplSession::with_writer(Box::new(collector.clone()));
    session
        .execute("(write-line \"hello\") (write-line (+ 1 2))")
        .expect("write-line should succeed");
    assert_eq!(collector.output(), "hello\n3\n");
}

/// str concatenates printed forms with no leading blanks.
#[test]
fn str_concatenates_cleanly() {
    let mut session = session();
    let result = session.execute("(str \"a\" 1 'b)").expect("str should succeed");
    assert_eq!(session.display(result), "a1b");
    let empty = session.execute("(str)").expect("empty str should succeed");
    assert_eq!(session.display(empty), "");
}

/// dump lists each binding on its own line.
#[test]
fn dump_shows_bindings() {
    let collector = CollectStringPrint::new();
    let mut session = ReplSession::with_writer(Box::new(collector.clone()));
    session.execute("(define marker 1234) (dump)").expect("dump should succeed");
    let output = collector.output();
    assert!(
        output.contains("marker: 1234"),
        "dump output should list the binding:\n{output}"
    );
}

// =============================================================================
// 3. Host registration
// =============================================================================

fn host_sum(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    let mut total = 0;
    let mut cur = args;
    loop {
        match interp.car(cur) {
            Value::Integer(n) => total += n,
            Value::Nil => break,
            _ => break,
        }
        cur = interp.cdr(cur);
    }
    Ok(Value::Integer(total))
}

/// A host-registered primitive is callable from Lisp by name.
#[test]
fn host_primitive_callable() {
    let mut session = session();
    session.interp().register_primitive("host-sum", Arity::Any, host_sum);
    let result = session.execute("(host-sum 1 2 3)").expect("host primitive should run");
    assert_eq!(session.repr(result), "6");
}

fn raw_tail(interp: &mut Interp, args: Value, _env: EnvId) -> EvalResult<Value> {
    // A special form receives its tail unevaluated.
    Ok(interp.car(args))
}

/// A host special form receives raw forms, not values.
#[test]
fn host_special_form_gets_raw_forms() {
    let mut session = session();
    session
        .interp()
        .register_special_form("first-form", Arity::AtLeast(1), raw_tail);
    let result = session
        .execute("(first-form (+ 1 2) ignored)")
        .expect("special form should run");
    assert_eq!(session.repr(result), "(+ 1 2)");
}

fn make_handle(_interp: &mut Interp, _args: Value, _env: EnvId) -> EvalResult<Value> {
    Ok(Value::Boxed(BoxedHandle::new(0xBEEF)))
}

/// Opaque host handles round-trip through Lisp untouched.
#[test]
fn boxed_handles_round_trip() {
    let mut session = session();
    session
        .interp()
        .register_primitive("make-handle", Arity::Exactly(0), make_handle);
    let result = session
        .execute("(begin (define h (make-handle)) h)")
        .expect("handle should round-trip");
    assert_eq!(result, Value::Boxed(BoxedHandle::new(0xBEEF)));
}

/// Calling a user-defined function from host code.
#[test]
fn host_apply() {
    let mut session = session();
    session.execute("(define (add a b) (+ a b))").expect("define should succeed");
    let interp = session.interp();
    let sym = interp.intern("add");
    let global = interp.global();
    let function = interp.value_of(global, sym);
    let result = interp
        .apply(function, &[Value::Integer(2), Value::Integer(40)], global)
        .expect("host apply should succeed");
    assert_eq!(result, Value::Integer(42));
}

// =============================================================================
// 4. Resource limits
// =============================================================================

/// Unbounded recursion fails with RecursionLimit instead of blowing the
/// host stack.
#[test]
fn recursion_limit_enforced() {
    let mut session = session();
    session.interp().set_limits(ResourceLimits {
        max_recursion_depth: 64,
    });
    session.execute("(define (spin) (spin))").expect("define should succeed");
    match session.execute("(spin)") {
        Err(ReplError::Eval(EvalError { kind, .. })) => assert_eq!(kind, ErrKind::RecursionLimit),
        other => panic!("expected RecursionLimit, got {other:?}"),
    }
}

/// Evaluation still works after a recursion failure unwinds.
#[test]
fn session_usable_after_unwind() {
    let mut session = session();
    session.interp().set_limits(ResourceLimits {
        max_recursion_depth: 64,
    });
    session.execute("(define (spin) (spin))").expect("define should succeed");
    assert!(session.execute("(spin)").is_err());
    let result = session.execute("(+ 1 1)").expect("session should recover");
    assert_eq!(session.repr(result), "2");
}

// =============================================================================
// 5. Regex primitive
// =============================================================================

#[test]
fn re_string_match() {
    let mut session = session();
    let matched = session
        .execute("(re-string-match \"(a+)(b*)\" \"aab\")")
        .expect("match should succeed");
    assert_eq!(session.repr(matched), "(\"aab\" \"aa\" \"b\")");
    let missed = session
        .execute("(re-string-match \"z+\" \"aab\")")
        .expect("non-match should succeed");
    assert_eq!(missed, Value::Boolean(false));
}

#[test]
fn re_bad_pattern_propagates() {
    let mut session = session();
    match session.execute("(re-string-match \"(\" \"x\")") {
        Err(ReplError::Eval(error)) => assert_eq!(error.kind, ErrKind::PropagatedFromPrimitive),
        other => panic!("expected a propagated error, got {other:?}"),
    }
}

// =============================================================================
// 6. Snapshots
// =============================================================================

/// Snapshot and restore round-trip the whole interpreter state.
#[test]
fn snapshot_round_trip() {
    let mut session = session();
    session
        .execute("(define x 42) (define (inc n) (+ n 1))")
        .expect("setup should succeed");
    let snapshot = session.snapshot();

    session.execute("(set! x 0)").expect("mutation should succeed");
    session.restore(&snapshot).expect("restore should succeed");

    let x = session.execute("x").expect("x should be bound");
    assert_eq!(session.repr(x), "42");
    let called = session.execute("(inc 41)").expect("functions should survive");
    assert_eq!(session.repr(called), "42");
}

/// Primitives keep working after a restore because registry ids are
/// positional.
#[test]
fn primitives_survive_restore() {
    let mut session = session();
    let snapshot = session.snapshot();
    let mut fresh = session_like(&snapshot);
    let result = fresh.execute("(car '(9 8))").expect("primitives should work");
    assert_eq!(fresh.repr(result), "9");
}

fn session_like(snapshot: &[u8]) -> ReplSession {
    let mut fresh = ReplSession::with_writer(Box::new(NoPrint));
    fresh.restore(snapshot).expect("restore should succeed");
    fresh
}

/// Type signatures are part of the snapshot.
#[test]
fn type_signatures_survive_restore() {
    let mut session = session();
    session
        .execute("(define (inc n) (+ n 1)) (typedef inc integer -> integer)")
        .expect("setup should succeed");
    let snapshot = session.snapshot();
    let mut fresh = session_like(&snapshot);
    match fresh.execute("(inc \"x\")") {
        Err(ReplError::Eval(error)) => assert_eq!(error.kind, ErrKind::TypeMismatch),
        other => panic!("expected TypeMismatch after restore, got {other:?}"),
    }
}
