//! End-to-end evaluator behavior: the core scenarios and the semantic laws
//! the evaluator guarantees (quotation identity, strict left-to-right
//! argument order, lexical scoping, binding visibility, aliasing).

use oxalis::{ErrKind, EvalError, Interp, NoPrint, ReplError, ReplSession, Value};
use pretty_assertions::assert_eq;

fn session() -> ReplSession {
    ReplSession::with_writer(Box::new(NoPrint))
}

fn eval_repr(source: &str) -> String {
    let mut session = session();
    let value = session.execute(source).expect("evaluation should succeed");
    session.repr(value)
}

fn eval_err(source: &str) -> EvalError {
    let mut session = session();
    match session.execute(source) {
        Err(ReplError::Eval(error)) => error,
        Ok(value) => panic!("expected an error, got {}", session.repr(value)),
        Err(other) => panic!("expected an eval error, got {other}"),
    }
}

// =============================================================================
// 1. Scenarios
// =============================================================================

/// define then set! then read back: mutation through the global frame.
#[test]
fn define_set_read_back() {
    assert_eq!(eval_repr("(begin (define x 10) (set! x (+ x 5)) x)"), "15");
}

/// Inner let inits evaluate in the enclosing environment, so `y` sees the
/// outer `x`.
#[test]
fn nested_let_inits_see_enclosing() {
    assert_eq!(
        eval_repr("(let ((x 1) (y 2)) (let ((x 10) (y x)) (list x y)))"),
        "(10 1)"
    );
}

/// let* inits see prior siblings.
#[test]
fn let_star_sees_prior_siblings() {
    assert_eq!(eval_repr("(let* ((x 1) (y (+ x 1))) y)"), "2");
}

/// letrec supports self-recursive bindings.
#[test]
fn letrec_factorial() {
    assert_eq!(
        eval_repr("(letrec ((f (lambda (n) (if (= n 0) 1 (* n (f (- n 1))))))) (f 5))"),
        "120"
    );
}

/// do loops until the test fires and returns the result expression.
#[test]
fn do_sums_indices() {
    assert_eq!(eval_repr("(do ((i 0 (+ i 1)) (s 0 (+ s i))) ((= i 5) s))"), "10");
}

/// A macro rewrites its unevaluated arguments into a new form.
#[test]
fn defmacro_when() {
    assert_eq!(
        eval_repr("(defmacro (when c . body) (list 'if c (cons 'begin body))) (when #t 1 2 3)"),
        "3"
    );
}

/// -> threads the value as the trailing argument of each form.
#[test]
fn chain_threads_value() {
    assert_eq!(eval_repr("(-> 5 (+ 3) (* 2))"), "16");
}

/// apply spreads its final list argument.
#[test]
fn apply_spreads_list() {
    assert_eq!(eval_repr("(apply + '(1 2 3))"), "6");
}

/// apply prepends intermediate arguments in front of the final list.
#[test]
fn apply_with_leading_args() {
    assert_eq!(eval_repr("(apply + 10 20 '(1 2))"), "33");
}

// =============================================================================
// 2. Quotation and self-evaluation
// =============================================================================

/// Evaluating a quoted tree yields the tree itself, structurally.
#[test]
fn quote_is_identity() {
    assert_eq!(eval_repr("(quote (1 (2 3) \"s\"))"), "(1 (2 3) \"s\")");
    assert_eq!(eval_repr("'(a . b)"), "(a . b)");
    assert_eq!(eval_repr("''x"), "(quote x)");
}

/// Atoms other than symbols evaluate to themselves.
#[test]
fn atoms_self_evaluate() {
    assert_eq!(eval_repr("42"), "42");
    assert_eq!(eval_repr("2.5"), "2.5");
    assert_eq!(eval_repr("#t"), "#t");
    assert_eq!(eval_repr("#\\a"), "#\\a");
    assert_eq!(eval_repr("\"hi\""), "\"hi\"");
}

/// Evaluating a symbol reads exactly what the environment holds; unbound
/// symbols read as Nil.
#[test]
fn symbol_evaluation_matches_value_of() {
    let mut interp = Interp::with_writer(Box::new(NoPrint));
    let sym = interp.intern("answer");
    let global = interp.global();
    interp.bind_locally(global, sym, Value::Integer(42));
    let read = interp.eval(Value::Symbol(sym), global).expect("symbol should evaluate");
    assert_eq!(read, interp.value_of(global, sym));

    let unbound = interp.symbol("never-bound");
    assert_eq!(interp.eval(unbound, global).expect("unbound reads as Nil"), Value::Nil);
}

// =============================================================================
// 3. Argument evaluation order
// =============================================================================

/// Arguments evaluate left to right, exactly once each, before the call.
#[test]
fn arguments_evaluate_left_to_right_once() {
    let mut session = session();
    session
        .execute("(define order '()) (define (note n) (set! order (cons n order)) n)")
        .expect("setup should succeed");
    let result = session
        .execute("(list (note 1) (note 2) (note 3))")
        .expect("call should succeed");
    assert_eq!(session.repr(result), "(1 2 3)");
    let order = session.execute("order").expect("order should be bound");
    // conses build the record in reverse, so last-evaluated comes first
    assert_eq!(session.repr(order), "(3 2 1)");
}

// =============================================================================
// 4. Scoping
// =============================================================================

/// A function body sees its defining environment, not its caller's.
#[test]
fn lexical_scoping_ignores_caller_frames() {
    assert_eq!(
        eval_repr("(begin (define x 5) (define (getx) x) (let ((x 99)) (getx)))"),
        "5"
    );
}

/// let inits cannot see sibling bindings; let* inits can.
#[test]
fn sibling_visibility() {
    assert_eq!(eval_repr("(begin (define x 77) (let ((x 1) (y x)) y))"), "77");
    assert_eq!(eval_repr("(begin (define x 77) (let* ((x 1) (y x)) y))"), "1");
}

/// letrec pre-binds every sibling to Nil before any init runs.
#[test]
fn letrec_later_siblings_read_nil_until_bound() {
    assert_eq!(eval_repr("(letrec ((a b) (b 2)) a)"), "()");
    assert_eq!(eval_repr("(letrec ((a b) (b 2)) b)"), "2");
}

/// set! mutates the nearest enclosing binding; inner frames shadow without
/// destroying outer ones.
#[test]
fn set_hits_nearest_enclosing_binding() {
    assert_eq!(eval_repr("(begin (define x 1) (let ((x 2)) (set! x 3) x))"), "3");
    assert_eq!(eval_repr("(begin (define x 1) (let ((x 2)) (set! x 3)) x)"), "1");
}

/// Closures share their captured frame by reference: mutation through the
/// frame is visible on the next call.
#[test]
fn closures_share_mutable_frames() {
    assert_eq!(
        eval_repr(
            "(begin \
             (define (make-counter) (let ((n 0)) (lambda () (set! n (+ n 1)) n))) \
             (define tick (make-counter)) \
             (tick) (tick) (tick))"
        ),
        "3"
    );
}

// =============================================================================
// 5. Formals binding
// =============================================================================

/// A dotted tail takes the remaining actuals; exhausted it binds Nil.
#[test]
fn rest_parameters() {
    assert_eq!(eval_repr("(begin (define (f . xs) xs) (f 1 2 3))"), "(1 2 3)");
    assert_eq!(eval_repr("(begin (define (f a b . xs) xs) (f 1 2))"), "()");
    assert_eq!(eval_repr("(begin (define (f a b . xs) xs) (f 1 2 3 4))"), "(3 4)");
}

/// Exact formals demand exact arity.
#[test]
fn exact_arity_enforced() {
    let error = eval_err("((lambda (x y) x) 1)");
    assert_eq!(error.kind, ErrKind::ArityMismatch);
    let error = eval_err("((lambda (x) x) 1 2)");
    assert_eq!(error.kind, ErrKind::ArityMismatch);
}

// =============================================================================
// 6. Booleans and conditionals
// =============================================================================

/// Everything is true except Nil and #f.
#[test]
fn boolean_projection() {
    assert_eq!(eval_repr("(if 0 'yes 'no)"), "yes");
    assert_eq!(eval_repr("(if \"\" 'yes 'no)"), "yes");
    assert_eq!(eval_repr("(if '() 'yes 'no)"), "no");
    assert_eq!(eval_repr("(if #f 'yes 'no)"), "no");
}

/// An if without an else arm yields Nil when the condition is false.
#[test]
fn if_without_else_yields_nil() {
    assert_eq!(eval_repr("(if #f 'yes)"), "()");
}

// =============================================================================
// 7. Mutation and aliasing
// =============================================================================

/// set-car! is visible through every alias of the pair.
#[test]
fn set_car_observable_through_aliases() {
    assert_eq!(
        eval_repr("(begin (define a '(1 2)) (define b a) (set-car! a 99) b)"),
        "(99 2)"
    );
}

/// set-nth! mutates pair chains and vectors in place.
#[test]
fn set_nth_mutates_both_shapes() {
    assert_eq!(
        eval_repr("(begin (define l (list 1 2 3)) (set-nth! l 1 99) l)"),
        "(1 99 3)"
    );
    assert_eq!(
        eval_repr("(begin (define v (vector 1 2 3)) (set-nth! v 0 7) v)"),
        "(7 2 3)"
    );
}

/// A pair cycle created through set-cdr! prints with a cycle marker
/// instead of looping forever.
#[test]
fn cyclic_list_prints_with_marker() {
    assert_eq!(
        eval_repr("(begin (define l (list 1 2)) (set-cdr! (cdr l) l) l)"),
        "(1 2 . #=<cycle>)"
    );
}

// =============================================================================
// 8. List substrate
// =============================================================================

/// walk_list path "ad" is car-of-cdr.
#[test]
fn walk_list_composes_right_to_left() {
    let mut interp = Interp::with_writer(Box::new(NoPrint));
    let items = [Value::Integer(1), Value::Integer(2), Value::Integer(3)];
    let l = interp.list(&items);
    let via_path = interp.walk_list(l, "ad");
    let rest = interp.cdr(l);
    assert_eq!(via_path, interp.car(rest));
    assert_eq!(via_path, Value::Integer(2));
}

/// The cxr compositions agree with nth.
#[test]
fn cxr_family() {
    assert_eq!(eval_repr("(cadr '(1 2 3 4))"), "2");
    assert_eq!(eval_repr("(caddr '(1 2 3 4))"), "3");
    assert_eq!(eval_repr("(cdddr '(1 2 3 4))"), "(4)");
    assert_eq!(eval_repr("(caar '((1 2) 3))"), "1");
    assert_eq!(eval_repr("(car '())"), "()");
    assert_eq!(eval_repr("(cdr 5)"), "()");
}

/// Ordinal accessors and nth agree; out-of-range reads are Nil.
#[test]
fn ordinals_and_nth() {
    assert_eq!(eval_repr("(first '(a b c))"), "a");
    assert_eq!(eval_repr("(third '(a b c))"), "c");
    assert_eq!(eval_repr("(tenth '(a b c))"), "()");
    assert_eq!(eval_repr("(nth '(a b c) 1)"), "b");
    assert_eq!(eval_repr("(nth '(a b c) 9)"), "()");
}

/// Vectorized lists answer the same list protocol.
#[test]
fn vectors_behave_like_lists() {
    assert_eq!(eval_repr("(car (vector 1 2 3))"), "1");
    assert_eq!(eval_repr("(cdr (vector 1 2 3))"), "(2 3)");
    assert_eq!(eval_repr("(length (vector 1 2 3))"), "3");
    assert_eq!(eval_repr("(cadr (vector 1 2 3))"), "2");
}

#[test]
fn append_and_length() {
    assert_eq!(eval_repr("(append '(1 2) '(3 4))"), "(1 2 3 4)");
    assert_eq!(eval_repr("(append '() '(1))"), "(1)");
    assert_eq!(eval_repr("(length '())"), "0");
    assert_eq!(eval_repr("(length '(1 2 3))"), "3");
}

// =============================================================================
// 9. Equality
// =============================================================================

#[test]
fn eq_and_equal() {
    assert_eq!(eval_repr("(eq? 'a 'a)"), "#t");
    assert_eq!(eval_repr("(eq? '(1) '(1))"), "#f");
    assert_eq!(eval_repr("(equal? '(1 (2)) '(1 (2)))"), "#t");
    assert_eq!(eval_repr("(equal? \"ab\" \"ab\")"), "#t");
    assert_eq!(eval_repr("(equal? 1 1.0)"), "#f");
}
