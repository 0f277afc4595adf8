//! The standard base layer every host derives from.
//!
//! - [`standard_types`]: the builtin nominal types
//! - [`standard_symbols`]: a root table with `true`, `false` and every
//!   builtin type name bound statically
//! - [`standard_methods`]: arithmetic, comparison, and a handful of methods
//!   on strings, booleans, blocks, options and lists
//!
//! Build these once, wrap them in `Arc`, and derive per-context children
//! with [`SymbolTable::derive`] and [`MethodRegistry::derive`].

use std::sync::Arc;

use crate::analysis::{StaticValue, SymbolTable};
use crate::interpreter::{RuntimeError, RuntimeResult, Value};
use crate::methods::MethodRegistry;
use crate::types::{Type, TypeRegistry, registry};

/// Host context collecting the output of `print`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

pub fn standard_types() -> TypeRegistry {
    registry::builtins().clone()
}

pub fn standard_symbols() -> SymbolTable {
    let types = standard_types();
    let mut symbols = SymbolTable::new();
    symbols.set_static("true", Type::bool(), StaticValue::Bool(true));
    symbols.set_static("false", Type::bool(), StaticValue::Bool(false));
    for ty in types.iter() {
        if let Some(name) = ty.base_name() {
            symbols.set_static(name, Type::meta(ty.clone()), StaticValue::Type(ty.clone()));
        }
    }
    symbols
}

pub fn standard_methods() -> Arc<MethodRegistry> {
    let mut methods = MethodRegistry::new();
    register_int(&mut methods);
    register_real(&mut methods);
    register_string(&mut methods);
    register_bool(&mut methods);
    register_block(&mut methods);
    register_option(&mut methods);
    register_list(&mut methods);
    register_any(&mut methods);
    Arc::new(methods)
}

fn argument(args: &[Value], index: usize) -> RuntimeResult<&Value> {
    args.get(index).ok_or_else(|| RuntimeError::MissingArgument {
        name: format!("#{}", index),
    })
}

fn register_int(methods: &mut MethodRegistry) {
    let arithmetic: [(&str, fn(i64, i64) -> Option<i64>); 5] = [
        ("+", i64::checked_add),
        ("-", i64::checked_sub),
        ("*", i64::checked_mul),
        ("/", i64::checked_div),
        ("%", i64::checked_rem),
    ];
    for (selector, op) in arithmetic {
        methods.register(Type::int(), selector, vec![Type::int()], Type::int(), move |inv, args| {
            let left = inv.receiver.as_int()?;
            let right = argument(&args, 0)?.as_int()?;
            op(left, right)
                .map(Value::Int)
                .ok_or_else(|| inv.error(format!("undefined for {} and {}", left, right)))
        });
    }

    let comparison: [(&str, fn(&i64, &i64) -> bool); 6] = [
        ("<", i64::lt),
        (">", i64::gt),
        ("<=", i64::le),
        (">=", i64::ge),
        ("==", i64::eq),
        ("!=", i64::ne),
    ];
    for (selector, op) in comparison {
        methods.register(Type::int(), selector, vec![Type::int()], Type::bool(), move |inv, args| {
            let left = inv.receiver.as_int()?;
            let right = argument(&args, 0)?.as_int()?;
            Ok(Value::Bool(op(&left, &right)))
        });
    }

    methods.register(
        Type::int(),
        "max",
        vec![Type::repeatable(Type::int())],
        Type::int(),
        |inv, args| {
            let mut max = inv.receiver.as_int()?;
            for arg in &args {
                max = max.max(arg.as_int()?);
            }
            Ok(Value::Int(max))
        },
    );

    methods.register(Type::int(), "toReal", vec![], Type::real(), |inv, _| {
        Ok(Value::Real(inv.receiver.as_int()? as f64))
    });
}

fn register_real(methods: &mut MethodRegistry) {
    let arithmetic: [(&str, fn(f64, f64) -> f64); 4] = [
        ("+", |a, b| a + b),
        ("-", |a, b| a - b),
        ("*", |a, b| a * b),
        ("/", |a, b| a / b),
    ];
    for (selector, op) in arithmetic {
        methods.register(Type::real(), selector, vec![Type::real()], Type::real(), move |inv, args| {
            let left = inv.receiver.as_real()?;
            let right = argument(&args, 0)?.as_real()?;
            Ok(Value::Real(op(left, right)))
        });
    }

    let comparison: [(&str, fn(&f64, &f64) -> bool); 5] = [
        ("<", f64::lt),
        (">", f64::gt),
        ("<=", f64::le),
        (">=", f64::ge),
        ("==", f64::eq),
    ];
    for (selector, op) in comparison {
        methods.register(Type::real(), selector, vec![Type::real()], Type::bool(), move |inv, args| {
            let left = inv.receiver.as_real()?;
            let right = argument(&args, 0)?.as_real()?;
            Ok(Value::Bool(op(&left, &right)))
        });
    }
}

fn register_string(methods: &mut MethodRegistry) {
    methods.register(Type::string(), "+", vec![Type::string()], Type::string(), |inv, args| {
        let left = inv.receiver.as_str()?;
        let right = argument(&args, 0)?.as_str()?;
        Ok(Value::string(&format!("{}{}", left, right)))
    });
    methods.register(Type::string(), "size", vec![], Type::int(), |inv, _| {
        Ok(Value::Int(inv.receiver.as_str()?.chars().count() as i64))
    });
    methods.register(Type::string(), "==", vec![Type::string()], Type::bool(), |inv, args| {
        Ok(Value::Bool(inv.receiver.as_str()? == argument(&args, 0)?.as_str()?))
    });
}

fn register_bool(methods: &mut MethodRegistry) {
    methods.register(Type::bool(), "and", vec![Type::bool()], Type::bool(), |inv, args| {
        Ok(Value::Bool(inv.receiver.as_bool()? && argument(&args, 0)?.as_bool()?))
    });
    methods.register(Type::bool(), "or", vec![Type::bool()], Type::bool(), |inv, args| {
        Ok(Value::Bool(inv.receiver.as_bool()? || argument(&args, 0)?.as_bool()?))
    });
    methods.register(Type::bool(), "not", vec![], Type::bool(), |inv, _| {
        Ok(Value::Bool(!inv.receiver.as_bool()?))
    });
}

fn register_block(methods: &mut MethodRegistry) {
    methods.register(
        Type::block(Type::param("R"), vec![Type::splat("A")]),
        "call",
        vec![Type::splat("A")],
        Type::param("R"),
        |inv, args| {
            let closure = inv.receiver.as_block()?.clone();
            inv.call(&closure, args)
        },
    );
}

fn register_option(methods: &mut MethodRegistry) {
    let option = Type::option(Type::param("T"));
    methods.register(option.clone(), "hasValue", vec![], Type::bool(), |inv, _| {
        Ok(Value::Bool(inv.receiver.as_option()?.is_some()))
    });
    methods.register(option, "value", vec![], Type::param("T"), |inv, _| {
        match inv.receiver.as_option()? {
            Some(value) => Ok(value.clone()),
            None => Err(inv.error("no value")),
        }
    });
}

fn register_list(methods: &mut MethodRegistry) {
    let list = Type::list(Type::param("T"));
    methods.register(list.clone(), "size", vec![], Type::int(), |inv, _| {
        Ok(Value::Int(inv.receiver.as_list()?.len() as i64))
    });
    methods.register(list, "at", vec![Type::int()], Type::param("T"), |inv, args| {
        let index = argument(&args, 0)?.as_int()?;
        let items = inv.receiver.as_list()?;
        usize::try_from(index)
            .ok()
            .and_then(|index| items.get(index))
            .cloned()
            .ok_or_else(|| inv.error(format!("index {} out of range for {} items", index, items.len())))
    });
}

fn register_any(methods: &mut MethodRegistry) {
    methods.register(Type::param("T"), "toString", vec![], Type::string(), |inv, _| {
        Ok(Value::string(&inv.receiver.to_string()))
    });
    methods.register(Type::param("T"), "print", vec![], Type::param("T"), |inv, _| {
        let line = inv.receiver.to_string();
        tracing::debug!(%line, "print");
        if let Some(transcript) = inv.host::<Transcript>() {
            transcript.push(line);
        }
        Ok(inv.receiver.clone())
    });
}
