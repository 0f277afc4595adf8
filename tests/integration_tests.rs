use std::sync::Arc;

use gnomish::analysis::{self, ScopeKind, SymbolTable};
use gnomish::ast::Expr;
use gnomish::interpreter::{Interpreter, Value};
use gnomish::methods::MethodRegistry;
use gnomish::prelude::{self, Transcript};
use gnomish::types::Type;
use gnomish::{wire, Error, ErrorKind};

/// Records every `tally` call made by a program.
#[derive(Default)]
struct Tally {
    seen: Vec<i64>,
}

/// A host environment layered over the shared prelude.
fn host_environment() -> (SymbolTable, MethodRegistry) {
    let symbols = SymbolTable::derive(
        Arc::new(prelude::standard_symbols()),
        ScopeKind::named("game"),
    );
    let mut methods = MethodRegistry::derive(prelude::standard_methods());

    methods.register(Type::int(), "tally", vec![], Type::int(), |inv, _| {
        let n = inv.receiver.as_int()?;
        match inv.host::<Tally>() {
            Some(tally) => tally.seen.push(n),
            None => return Err(inv.error("no tally host")),
        }
        Ok(Value::Int(n))
    });
    methods.register(
        Type::int(),
        "times",
        vec![Type::block(Type::param("R"), vec![])],
        Type::int(),
        |inv, args| {
            let n = inv.receiver.as_int()?;
            let closure = args
                .first()
                .ok_or_else(|| inv.error("missing block"))?
                .as_block()?
                .clone();
            for _ in 0..n {
                inv.call(&closure, vec![])?;
            }
            Ok(Value::Int(n))
        },
    );

    (symbols, methods)
}

fn run_text(text: &str) -> Result<Value, Error> {
    let program = wire::from_str(text)?;
    let (mut symbols, methods) = host_environment();
    let analyzed = analysis::analyze(&program, &mut symbols, &methods)?;
    let mut tally = Tally::default();
    Ok(Interpreter::with_host(&mut tally).run(&analyzed)?)
}

#[test]
fn wire_program_runs_against_host_methods() {
    // let n = 0; 4.times({ n = n + 1; n.tally }); n
    let text = r#"{
        "version": 1,
        "root": { "kind": "exprList", "exprs": [
            { "kind": "let", "scope": "block", "name": "n", "value": { "kind": "int", "value": 0 } },
            { "kind": "call", "name": "times", "receiver": { "kind": "int", "value": 4 }, "args": [
                { "kind": "block", "args": [], "body": { "kind": "exprList", "exprs": [
                    { "kind": "assign", "name": "n", "value": {
                        "kind": "call", "name": "+",
                        "receiver": { "kind": "var", "name": "n" },
                        "args": [{ "kind": "int", "value": 1 }]
                    } },
                    { "kind": "call", "name": "tally", "receiver": { "kind": "var", "name": "n" }, "args": [] }
                ] } }
            ] },
            { "kind": "var", "name": "n" }
        ] }
    }"#;
    let program = wire::from_str(text).unwrap();
    let (mut symbols, methods) = host_environment();
    let analyzed = analysis::analyze(&program, &mut symbols, &methods).unwrap();
    assert_eq!(analyzed.info().ty, Type::int());

    let mut tally = Tally::default();
    let value = Interpreter::with_host(&mut tally).run(&analyzed).unwrap();
    assert_eq!(value, Value::Int(4));
    assert_eq!(tally.seen, vec![1, 2, 3, 4]);
}

#[test]
fn host_method_without_host_context_fails_at_runtime() {
    let program = Expr::call(Expr::int(3), "tally", vec![]);
    let (mut symbols, methods) = host_environment();
    let err = gnomish::run(&program, &mut symbols, &methods).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(err.to_string(), "`tally` failed: no tally host");
}

#[test]
fn host_methods_do_not_leak_into_the_prelude() {
    let (_, methods) = host_environment();
    assert!(methods.selectors().contains("tally"));
    assert!(!prelude::standard_methods().selectors().contains("tally"));

    let program = Expr::call(Expr::int(3), "tally", vec![]);
    let mut symbols = prelude::standard_symbols();
    let err = gnomish::run(&program, &mut symbols, &prelude::standard_methods()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Method);
}

#[test]
fn game_scoped_let_survives_across_programs() {
    let (mut symbols, methods) = host_environment();
    let game = symbols.current();
    let storage = gnomish::interpreter::Storage::new();

    let declare = Expr::let_in(
        gnomish::ast::LetScope::parse("game"),
        "lives",
        Expr::int(3),
    );
    let analyzed = analysis::analyze(&declare, &mut symbols, &methods).unwrap();
    Interpreter::new()
        .with_frame(game, storage.clone())
        .run(&analyzed)
        .unwrap();

    let lose = Expr::assign(
        "lives",
        Expr::call(Expr::var("lives"), "-", vec![Expr::int(1)]),
    );
    let analyzed = analysis::analyze(&lose, &mut symbols, &methods).unwrap();
    let mut interpreter = Interpreter::new().with_frame(game, storage.clone());
    interpreter.run(&analyzed).unwrap();
    assert_eq!(interpreter.run(&analyzed).unwrap(), Value::Int(1));
}

#[test]
fn game_scoped_let_from_a_block_is_visible_after_the_call() {
    let (mut symbols, methods) = host_environment();
    let program = Expr::list(vec![
        Expr::call(
            Expr::block(
                vec![],
                vec![Expr::let_in(
                    gnomish::ast::LetScope::parse("game"),
                    "score",
                    Expr::int(5),
                )],
            ),
            "call",
            vec![],
        ),
        Expr::var("score"),
    ]);
    let value = gnomish::run(&program, &mut symbols, &methods).unwrap();
    assert_eq!(value, Value::Int(5));
}

#[test]
fn error_kinds_classify_each_stage() {
    let unsupported = run_text(r#"{ "version": 7, "root": { "kind": "int", "value": 1 } }"#);
    assert_eq!(unsupported.unwrap_err().kind(), ErrorKind::Serialization);

    let malformed = run_text(r#"{ "version": 1, "root": { "kind": "nope" } }"#);
    assert_eq!(malformed.unwrap_err().kind(), ErrorKind::Serialization);

    let unresolved = run_text(r#"{ "version": 1, "root": { "kind": "var", "name": "ghost" } }"#);
    assert_eq!(unresolved.unwrap_err().kind(), ErrorKind::Resolution);

    let mistyped = run_text(
        r#"{ "version": 1, "root": {
            "kind": "if",
            "condition": { "kind": "block", "args": [], "body": { "kind": "exprList", "exprs": [{ "kind": "int", "value": 1 }] } },
            "then": { "kind": "block", "args": [], "body": { "kind": "exprList", "exprs": [] } }
        } }"#,
    );
    assert_eq!(mistyped.unwrap_err().kind(), ErrorKind::Type);

    let no_overload = run_text(
        r#"{ "version": 1, "root": {
            "kind": "call", "name": "+",
            "receiver": { "kind": "int", "value": 1 },
            "args": [{ "kind": "string", "value": "a" }]
        } }"#,
    );
    let err = no_overload.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Method);
    assert_eq!(
        err.to_string(),
        "no method `+` on Int matching argument types (String)"
    );

    let failing = run_text(
        r#"{ "version": 1, "root": {
            "kind": "call", "name": "%",
            "receiver": { "kind": "int", "value": 1 },
            "args": [{ "kind": "int", "value": 0 }]
        } }"#,
    );
    assert_eq!(failing.unwrap_err().kind(), ErrorKind::Runtime);
}

#[test]
fn transcript_host_collects_prints_from_closures() {
    let program = Expr::list(vec![
        Expr::let_(
            "greet",
            Expr::block(
                vec![gnomish::ast::Arg::typed(
                    "who",
                    gnomish::ast::TypeExpr::named("String"),
                )],
                vec![Expr::call(
                    Expr::call(Expr::string("hi "), "+", vec![Expr::var("who")]),
                    "print",
                    vec![],
                )],
            ),
        ),
        Expr::call(Expr::var("greet"), "call", vec![Expr::string("gnome")]),
        Expr::call(Expr::var("greet"), "call", vec![Expr::string("troll")]),
    ]);
    let mut symbols = prelude::standard_symbols();
    let methods = prelude::standard_methods();
    let analyzed = analysis::analyze(&program, &mut symbols, &methods).unwrap();

    let mut transcript = Transcript::new();
    let value = Interpreter::with_host(&mut transcript).run(&analyzed).unwrap();
    assert_eq!(value, Value::string("hi troll"));
    assert_eq!(transcript.lines(), ["hi gnome".to_string(), "hi troll".to_string()]);
}
