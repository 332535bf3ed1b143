//! Special-form behavior: the let family, do, threading forms, macros,
//! reflection, and the error contract of malformed or illegal forms.

use oxalis::{ErrKind, EvalError, NoPrint, ReplError, ReplSession};
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
// 1. define
// =============================================================================

/// define returns the bound value in both of its shapes.
#[test]
fn define_returns_value() {
    assert_eq!(eval_repr("(define x 42)"), "42");
    assert_eq!(eval_repr("(define (f x) x)"), "#<function f>");
}

/// The optional doc string sits between the header and the body.
#[test]
fn define_with_doc_string() {
    assert_eq!(
        eval_repr("(begin (define (inc n) \"adds one\" (+ n 1)) (inc 4))"),
        "5"
    );
    assert_eq!(
        eval_repr("(begin (define (inc n) \"adds one\" (+ n 1)) (doc inc))"),
        "\"adds one\""
    );
}

/// Primitives cannot be redefined, in either define shape.
#[test]
fn define_cannot_shadow_primitives() {
    assert_eq!(eval_err("(define car 5)").kind, ErrKind::RedefinePrimitive);
    assert_eq!(eval_err("(define (car x) x)").kind, ErrKind::RedefinePrimitive);
}

/// User functions may be redefined freely.
#[test]
fn user_functions_redefine() {
    assert_eq!(
        eval_repr("(begin (define (f) 1) (define (f) 2) (f))"),
        "2"
    );
}

#[test]
fn define_malformed() {
    assert_eq!(eval_err("(define 5 1)").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(define (5) 1)").kind, ErrKind::MalformedForm);
}

// =============================================================================
// 2. let family
// =============================================================================

/// A binding pair without an init binds Nil.
#[test]
fn let_binding_without_init() {
    assert_eq!(eval_repr("(let ((x)) x)"), "()");
}

/// Named let builds a self-recursive function applied to the inits.
#[test]
fn named_let_loops() {
    assert_eq!(
        eval_repr("(let loop ((i 0) (acc '())) (if (= i 3) acc (loop (+ i 1) (cons i acc))))"),
        "(2 1 0)"
    );
}

/// The named let's name is not visible in the enclosing environment
/// afterwards.
#[test]
fn named_let_name_stays_local() {
    assert_eq!(eval_repr("(begin (let go ((i 0)) i) go)"), "()");
}

#[test]
fn let_malformed() {
    assert_eq!(eval_err("(let 5 1)").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(let ((1 2)) 1)").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(let (x) 1)").kind, ErrKind::MalformedForm);
}

// =============================================================================
// 3. do
// =============================================================================

/// A binding without a step keeps its current value across iterations,
/// including mutations made by the body.
#[test]
fn do_without_step_keeps_mutations() {
    assert_eq!(
        eval_repr("(do ((i 0 (+ i 1)) (seen '())) ((= i 2) seen) (set! seen (cons i seen)))"),
        "(1 0)"
    );
}

/// Steps are all computed against the previous iteration before any
/// rebinding happens.
#[test]
fn do_steps_see_previous_iteration() {
    // j steps to the old i each round, so it trails by one
    assert_eq!(
        eval_repr("(do ((i 0 (+ i 1)) (j 100 i)) ((= i 3) j))"),
        "2"
    );
}

/// An empty result sequence yields Nil.
#[test]
fn do_empty_result_is_nil() {
    assert_eq!(eval_repr("(do ((i 0 (+ i 1))) ((= i 2)))"), "()");
}

#[test]
fn do_malformed() {
    assert_eq!(eval_err("(do 5 (#t))").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(do () 5)").kind, ErrKind::MalformedForm);
}

// =============================================================================
// 4. Threading forms
// =============================================================================

/// -> appends the threaded value as the trailing argument.
#[test]
fn chain_appends_trailing() {
    assert_eq!(eval_repr("(-> 10 (- 4))"), "-6");
    assert_eq!(eval_repr("(-> 5)"), "5");
}

/// An atom step is called with the value as its only argument.
#[test]
fn chain_atom_step() {
    assert_eq!(eval_repr("(begin (define (double n) (* n 2)) (-> 5 double double))"), "20");
}

/// => evaluates its steps for effect but returns the original value.
#[test]
fn tap_returns_original() {
    let mut session = session();
    session
        .execute("(define seen '()) (define (note v) (set! seen (cons v seen)))")
        .expect("setup should succeed");
    let result = session.execute("(=> 42 note note)").expect("tap should succeed");
    assert_eq!(session.repr(result), "42");
    let seen = session.execute("seen").expect("seen should be bound");
    assert_eq!(session.repr(seen), "(42 42)");
}

// =============================================================================
// 5. Macros
// =============================================================================

/// Evaluating a macro call equals evaluating its expansion in the caller's
/// environment.
#[test]
fn macro_call_equals_expansion() {
    let mut session = session();
    session
        .execute("(defmacro (twice e) (list 'begin e e)) (define n 0)")
        .expect("setup should succeed");
    session
        .execute("(twice (set! n (+ n 1)))")
        .expect("macro call should succeed");
    let via_macro = session.execute("n").expect("n should be bound");
    assert_eq!(session.repr(via_macro), "2");

    session.execute("(set! n 0)").expect("reset should succeed");
    session
        .execute("(begin (set! n (+ n 1)) (set! n (+ n 1)))")
        .expect("expansion should succeed");
    let via_expansion = session.execute("n").expect("n should be bound");
    assert_eq!(session.repr(via_expansion), "2");
}

/// Macro formals bind the unevaluated forms, not their values.
#[test]
fn macro_receives_raw_forms() {
    assert_eq!(
        eval_repr("(defmacro (show e) (list 'quote e)) (show (+ 1 2))"),
        "(+ 1 2)"
    );
}

#[test]
fn defmacro_malformed() {
    assert_eq!(eval_err("(defmacro x 1)").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(defmacro (5 x) 1)").kind, ErrKind::MalformedForm);
}

/// define-macro is an alias for defmacro.
#[test]
fn define_macro_alias() {
    assert_eq!(
        eval_repr("(define-macro (when2 c . body) (list 'if c (cons 'begin body))) (when2 #t 7)"),
        "7"
    );
}

/// A compiler macro is a distinct object the evaluator refuses to apply;
/// it is never silently treated as a macro.
#[test]
fn compiler_macro_not_applicable() {
    let mut session = session();
    let defined = session
        .execute("(define-compiler-macro (cm x) (list '+ x x))")
        .expect("definition should succeed");
    assert_eq!(session.repr(defined), "#<compiler-macro cm>");
    match session.execute("(cm 2)") {
        Err(ReplError::Eval(error)) => assert_eq!(error.kind, ErrKind::NotCallable),
        other => panic!("expected NotCallable, got {other:?}"),
    }
}

// =============================================================================
// 6. Reflection
// =============================================================================

/// definition-of rebuilds the define form for a named function.
#[test]
fn definition_of_named() {
    assert_eq!(
        eval_repr("(begin (define (add2 x) (+ x 2)) (definition-of add2))"),
        "(define (add2 x) (+ x 2))"
    );
}

/// For a lambda-bound symbol the definition is rendered through lambda.
#[test]
fn definition_of_unnamed() {
    assert_eq!(
        eval_repr("(begin (define g (lambda (x) x)) (definition-of g))"),
        "(define g (lambda (x) x))"
    );
}

/// doc falls back to a stock sentence for undocumented functions.
#[test]
fn doc_fallback() {
    assert_eq!(
        eval_repr("(begin (define (g x) x) (doc g))"),
        "\"g has no documentation string.\""
    );
}

#[test]
fn reflection_errors() {
    assert_eq!(eval_err("(definition-of 5)").kind, ErrKind::TypeMismatch);
    assert_eq!(eval_err("(doc 5)").kind, ErrKind::MalformedForm);
    assert_eq!(eval_err("(begin (define z 5) (doc z))").kind, ErrKind::TypeMismatch);
}

// =============================================================================
// 7. Error contract
// =============================================================================

#[test]
fn set_unbound_symbol() {
    let error = eval_err("(set! nowhere 1)");
    assert_eq!(error.kind, ErrKind::UnboundSymbol);
    assert!(
        error.message.contains("nowhere"),
        "message should name the symbol: {}",
        error.message
    );
}

#[test]
fn non_callable_head() {
    assert_eq!(eval_err("(5 1 2)").kind, ErrKind::NotCallable);
    assert_eq!(eval_err("(\"s\")").kind, ErrKind::NotCallable);
}

#[test]
fn lambda_requires_formals_list() {
    assert_eq!(eval_err("(lambda 5 1)").kind, ErrKind::MalformedForm);
}

#[test]
fn apply_errors() {
    assert_eq!(eval_err("(apply 5 '(1))").kind, ErrKind::NotCallable);
    assert_eq!(eval_err("(apply + 1)").kind, ErrKind::MalformedForm);
}

#[test]
fn primitive_arity_checked() {
    assert_eq!(eval_err("(cons 1)").kind, ErrKind::ArityMismatch);
    assert_eq!(eval_err("(= 1)").kind, ErrKind::ArityMismatch);
}

/// Errors inside primitives surface as PropagatedFromPrimitive and unwind
/// through every in-flight form.
#[test]
fn primitive_errors_propagate() {
    let error = eval_err("(let ((x 1)) (begin (/ x 0)))");
    assert_eq!(error.kind, ErrKind::PropagatedFromPrimitive);
    assert!(
        error.message.contains("division by zero"),
        "unexpected message: {}",
        error.message
    );
}
