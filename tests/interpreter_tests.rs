use std::sync::Arc;

use gnomish::analysis::{self, ScopeKind, SymbolTable};
use gnomish::ast::{Arg, Expr, LetScope, TypeExpr};
use gnomish::interpreter::{Interpreter, RuntimeError, Storage, Value};
use gnomish::methods::MethodRegistry;
use gnomish::prelude::{self, Transcript};

fn environment() -> (SymbolTable, Arc<MethodRegistry>) {
    (prelude::standard_symbols(), prelude::standard_methods())
}

fn eval(program: Expr<()>) -> Value {
    let (mut symbols, methods) = environment();
    gnomish::run(&program, &mut symbols, &methods).unwrap()
}

fn eval_err(program: Expr<()>) -> RuntimeError {
    let (mut symbols, methods) = environment();
    let analyzed = analysis::analyze(&program, &mut symbols, &methods).unwrap();
    Interpreter::new().run(&analyzed).unwrap_err()
}

fn call(receiver: Expr<()>, selector: &str, args: Vec<Expr<()>>) -> Expr<()> {
    Expr::call(receiver, selector, args)
}

#[test]
fn literals_evaluate_to_themselves() {
    assert_eq!(eval(Expr::int(42)), Value::Int(42));
    assert_eq!(eval(Expr::real(2.5)), Value::Real(2.5));
    assert_eq!(eval(Expr::string("gnome")), Value::string("gnome"));
    assert_eq!(eval(Expr::list(vec![])), Value::Unit);
}

#[test]
fn static_bindings_evaluate_to_their_value() {
    assert_eq!(eval(Expr::var("true")), Value::Bool(true));
    assert_eq!(eval(Expr::var("false")), Value::Bool(false));
}

#[test]
fn let_then_read() {
    let program = Expr::list(vec![Expr::let_("x", Expr::int(7)), Expr::var("x")]);
    assert_eq!(eval(program), Value::Int(7));
}

#[test]
fn let_rebinding_observes_new_value() {
    let program = Expr::list(vec![
        Expr::let_("r", Expr::int(3)),
        Expr::let_("r", Expr::var("true")),
        Expr::var("r"),
    ]);
    assert_eq!(eval(program), Value::Bool(true));
}

#[test]
fn let_and_assign_yield_the_written_value() {
    let program = Expr::list(vec![
        Expr::let_("x", Expr::int(1)),
        Expr::assign("x", Expr::int(5)),
    ]);
    assert_eq!(eval(program), Value::Int(5));
}

#[test]
fn arithmetic_through_methods() {
    let program = call(
        call(Expr::int(6), "*", vec![Expr::int(7)]),
        "-",
        vec![Expr::int(2)],
    );
    assert_eq!(eval(program), Value::Int(40));
}

#[test]
fn if_with_else() {
    let program = Expr::if_(
        vec![call(Expr::int(1), "<", vec![Expr::int(2)])],
        vec![Expr::string("less")],
        Some(vec![Expr::string("more")]),
    );
    assert_eq!(eval(program), Value::string("less"));
}

#[test]
fn if_without_else_yields_option() {
    let taken = Expr::if_(vec![Expr::var("true")], vec![Expr::int(1)], None);
    assert_eq!(eval(taken), Value::some(Value::Int(1)));

    let skipped = Expr::if_(vec![Expr::var("false")], vec![Expr::int(1)], None);
    assert_eq!(eval(skipped), Value::none());
}

#[test]
fn while_doubles_accumulator_ten_times() {
    // let i = 0; let acc = 1; while { i < 10 } do { acc = acc * 2; i = i + 1 }; acc
    let program = Expr::list(vec![
        Expr::let_("i", Expr::int(0)),
        Expr::let_("acc", Expr::int(1)),
        Expr::while_(
            vec![call(Expr::var("i"), "<", vec![Expr::int(10)])],
            vec![
                Expr::assign("acc", call(Expr::var("acc"), "*", vec![Expr::int(2)])),
                Expr::assign("i", call(Expr::var("i"), "+", vec![Expr::int(1)])),
            ],
        ),
        Expr::var("acc"),
    ]);
    assert_eq!(eval(program), Value::Int(1024));
}

#[test]
fn while_returns_last_action_value() {
    let program = Expr::list(vec![
        Expr::let_("i", Expr::int(0)),
        Expr::while_(
            vec![call(Expr::var("i"), "<", vec![Expr::int(3)])],
            vec![Expr::assign("i", call(Expr::var("i"), "+", vec![Expr::int(1)]))],
        ),
    ]);
    assert_eq!(eval(program), Value::some(Value::Int(3)));
}

#[test]
fn while_that_never_runs_yields_no_value() {
    let program = Expr::while_(vec![Expr::var("false")], vec![Expr::int(1)]);
    assert_eq!(eval(program), Value::none());
}

#[test]
fn block_call_binds_arguments() {
    let program = call(
        Expr::block(
            vec![
                Arg::typed("a", TypeExpr::named("Int")),
                Arg::typed("b", TypeExpr::named("Int")),
            ],
            vec![call(Expr::var("a"), "-", vec![Expr::var("b")])],
        ),
        "call",
        vec![Expr::int(10), Expr::int(4)],
    );
    assert_eq!(eval(program), Value::Int(6));
}

#[test]
fn closure_shares_captured_storage_with_creator() {
    // let count = 0; let bump = { count = count + 1 }; bump.call; bump.call; count
    let program = Expr::list(vec![
        Expr::let_("count", Expr::int(0)),
        Expr::let_(
            "bump",
            Expr::block(
                vec![],
                vec![Expr::assign(
                    "count",
                    call(Expr::var("count"), "+", vec![Expr::int(1)]),
                )],
            ),
        ),
        call(Expr::var("bump"), "call", vec![]),
        call(Expr::var("bump"), "call", vec![]),
        Expr::var("count"),
    ]);
    assert_eq!(eval(program), Value::Int(2));
}

#[test]
fn closure_sees_writes_made_after_creation() {
    let program = Expr::list(vec![
        Expr::let_("x", Expr::int(1)),
        Expr::let_("read", Expr::block(vec![], vec![Expr::var("x")])),
        Expr::assign("x", Expr::int(9)),
        call(Expr::var("read"), "call", vec![]),
    ]);
    assert_eq!(eval(program), Value::Int(9));
}

#[test]
fn closures_capture_their_own_invocation_frame() {
    // let make = { |start: Int| { start = start + 1 } };
    // let a = make.call(10); let b = make.call(20);
    // a.call; a.call; b.call
    let counter = Expr::block(
        vec![Arg::typed("start", TypeExpr::named("Int"))],
        vec![Expr::block(
            vec![],
            vec![Expr::assign(
                "start",
                call(Expr::var("start"), "+", vec![Expr::int(1)]),
            )],
        )],
    );
    let program = Expr::list(vec![
        Expr::let_("make", counter),
        Expr::let_("a", call(Expr::var("make"), "call", vec![Expr::int(10)])),
        Expr::let_("b", call(Expr::var("make"), "call", vec![Expr::int(20)])),
        call(Expr::var("a"), "call", vec![]),
        Expr::let_("second", call(Expr::var("a"), "call", vec![])),
        Expr::let_("other", call(Expr::var("b"), "call", vec![])),
        call(Expr::var("second"), "max", vec![Expr::var("other")]),
    ]);
    assert_eq!(eval(program), Value::Int(21));
}

#[test]
fn host_calls_fill_missing_arguments_from_defaults() {
    let (mut symbols, methods) = environment();
    let program = Expr::block(
        vec![
            Arg::typed("a", TypeExpr::named("Int")),
            Arg::new("b").with_default(call(Expr::var("a"), "*", vec![Expr::int(2)])),
        ],
        vec![call(Expr::var("a"), "+", vec![Expr::var("b")])],
    );
    let analyzed = analysis::analyze(&program, &mut symbols, &methods).unwrap();

    let mut interpreter = Interpreter::new();
    let block = interpreter.run(&analyzed).unwrap();
    let closure = block.as_block().unwrap().clone();

    assert_eq!(
        interpreter.call_block(&closure, vec![Value::Int(5)]).unwrap(),
        Value::Int(15)
    );
    assert_eq!(
        interpreter
            .call_block(&closure, vec![Value::Int(5), Value::Int(1)])
            .unwrap(),
        Value::Int(6)
    );
    assert!(matches!(
        interpreter.call_block(&closure, vec![]),
        Err(RuntimeError::MissingArgument { ref name }) if name == "a"
    ));
    assert!(matches!(
        interpreter.call_block(&closure, vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        Err(RuntimeError::TooManyArguments { expected: 2, found: 3 })
    ));
}

#[test]
fn repeatable_argument_collects_values() {
    let block = Expr::block(
        vec![Arg::typed("xs", TypeExpr::named("Int")).repeated()],
        vec![call(Expr::var("xs"), "size", vec![])],
    );
    let program = Expr::list(vec![
        Expr::let_("count", block),
        Expr::let_("none", call(Expr::var("count"), "call", vec![])),
        call(
            Expr::var("count"),
            "call",
            vec![Expr::int(1), Expr::int(2), Expr::int(3)],
        ),
    ]);
    assert_eq!(eval(program), Value::Int(3));
}

#[test]
fn repeatable_method_argument() {
    let program = call(
        Expr::int(3),
        "max",
        vec![Expr::int(9), Expr::int(4)],
    );
    assert_eq!(eval(program), Value::Int(9));
    assert_eq!(eval(call(Expr::int(3), "max", vec![])), Value::Int(3));
}

#[test]
fn print_writes_to_transcript() {
    let (mut symbols, methods) = environment();
    let program = Expr::list(vec![
        call(Expr::string("hello"), "print", vec![]),
        call(call(Expr::int(1), "+", vec![Expr::int(1)]), "print", vec![]),
    ]);
    let analyzed = analysis::analyze(&program, &mut symbols, &methods).unwrap();

    let mut transcript = Transcript::new();
    let value = Interpreter::with_host(&mut transcript).run(&analyzed).unwrap();
    assert_eq!(value, Value::Int(2));
    assert_eq!(transcript.lines(), ["hello".to_string(), "2".to_string()]);
}

#[test]
fn option_value_of_none_fails() {
    let program = call(
        Expr::if_(vec![Expr::var("false")], vec![Expr::int(1)], None),
        "value",
        vec![],
    );
    let err = eval_err(program);
    assert_eq!(err.to_string(), "`value` failed: no value");
}

#[test]
fn division_by_zero_is_runtime_error() {
    let err = eval_err(call(Expr::int(1), "/", vec![Expr::int(0)]));
    assert!(matches!(err, RuntimeError::Method { ref selector, .. } if selector == "/"));
}

#[test]
fn state_persists_across_runs_through_seeded_storage() {
    let base = Arc::new(prelude::standard_symbols());
    let methods = prelude::standard_methods();
    let mut game = SymbolTable::derive(base, ScopeKind::named("game"));
    let frame = game.current();
    let storage = Storage::new();

    let first = Expr::let_in(LetScope::parse("game"), "score", Expr::int(10));
    let analyzed = analysis::analyze(&first, &mut game, &methods).unwrap();
    Interpreter::new()
        .with_frame(frame, storage.clone())
        .run(&analyzed)
        .unwrap();

    let second = Expr::assign("score", call(Expr::var("score"), "+", vec![Expr::int(5)]));
    let analyzed = analysis::analyze(&second, &mut game, &methods).unwrap();
    let mut interpreter = Interpreter::new().with_frame(frame, storage.clone());
    assert_eq!(interpreter.run(&analyzed).unwrap(), Value::Int(15));
    assert!(interpreter.frame_storage(frame).unwrap().aliases(&storage));
    assert_eq!(storage.get(0), Some(Value::Int(15)));
    assert_eq!(storage.snapshot(), vec![Some(Value::Int(15))]);
}

#[test]
fn named_scope_let_inside_called_block_writes_through() {
    let base = Arc::new(prelude::standard_symbols());
    let methods = prelude::standard_methods();
    let mut game = SymbolTable::derive(base, ScopeKind::named("game"));
    let frame = game.current();
    let storage = Storage::new();

    let program = Expr::list(vec![
        call(
            Expr::block(
                vec![],
                vec![Expr::let_in(LetScope::parse("game"), "score", Expr::int(5))],
            ),
            "call",
            vec![],
        ),
        Expr::var("score"),
    ]);
    let analyzed = analysis::analyze(&program, &mut game, &methods).unwrap();
    let value = Interpreter::new()
        .with_frame(frame, storage.clone())
        .run(&analyzed)
        .unwrap();
    assert_eq!(value, Value::Int(5));
    assert_eq!(storage.snapshot(), vec![Some(Value::Int(5))]);
}

#[test]
fn untyped_argument_round_trips_through_generic_method() {
    let echo = Expr::block(
        vec![Arg::new("x")],
        vec![call(Expr::var("x"), "print", vec![])],
    );
    assert_eq!(eval(call(echo.clone(), "call", vec![Expr::int(3)])), Value::Int(3));

    let size = call(call(echo, "call", vec![Expr::string("ab")]), "size", vec![]);
    assert_eq!(eval(size), Value::Int(2));
}
