//! # Gnomish - An Embeddable, Statically-Typed Expression Language
//!
//! Gnomish is a small closure-based scripting language meant to live inside
//! a host application. The host owns parsing and the domain object model;
//! this crate owns everything between a syntax tree and a result.
//!
//! ## Architecture Overview
//!
//! 1. **AST** (`ast`) - Node types, generic over a per-node `info` payload,
//!    plus a double-dispatch visitor
//! 2. **Types** (`types`) - Type model and list unification with variadic
//!    (repeatable and splat) parameters
//! 3. **Methods** (`methods`) - Overload sets per selector, resolved by
//!    unification
//! 4. **Analysis** (`analysis`) - Scope resolution, slot allocation, typing
//!    and method resolution in a single pass
//! 5. **Interpreter** (`interpreter`) - Tree-walking evaluation of analyzed
//!    trees with lexically scoped closures
//! 6. **Wire** (`wire`) - Versioned JSON serialization of trees
//!
//! ## Pipeline Flow
//!
//! ```text
//! Host parser / wire::deserialize
//!     ↓
//! Expr<()>
//!     ↓
//! [Analyzer + SymbolTable + MethodRegistry]
//!     ↓
//! Expr<Annotation>   (types, frame/slot addresses, resolved methods)
//!     ↓
//! [Interpreter + host context]
//!     ↓
//! Value
//! ```
//!
//! ## Key Design Decisions
//!
//! ### Phase-Typed Trees
//! The analyzer does not mutate nodes. It builds a new tree whose `info`
//! payload is an [`analysis::Annotation`], and the interpreter only accepts
//! that tree type. Running an unanalyzed program is a compile error.
//!
//! ### Frames as Handles
//! Lexical scopes are arena entries addressed by a copyable
//! [`analysis::FrameId`]. The analyzer assigns every binding a frame and a
//! slot; at run time each frame id maps to shared slot storage, which is
//! what closures alias when they capture a frame.
//!
//! ### Layered Base Environment
//! The standard [`prelude`] is built once and shared behind `Arc`. Hosts
//! derive child symbol tables and method registries from it; children never
//! mutate their parents.
//!
//! ## Module Structure
//!
//! - [`ast`] - Abstract syntax tree and visitor
//! - [`fmt`] - S-expression rendering
//! - [`types`] - Types, bindings, unification, type interning
//! - [`methods`] - Method signatures and registry
//! - [`analysis`] - Symbol table and analyzer
//! - [`interpreter`] - Values, storage and evaluation
//! - [`wire`] - Serialization
//! - [`prelude`] - Standard types, statics and methods
//! - [`error`] - Crate-wide error and error kinds
//!
//! ## Example
//!
//! ```
//! use gnomish::ast::Expr;
//! use gnomish::interpreter::Value;
//! use gnomish::prelude;
//!
//! // let x = 40; x + 2
//! let program = Expr::list(vec![
//!     Expr::let_("x", Expr::int(40)),
//!     Expr::call(Expr::var("x"), "+", vec![Expr::int(2)]),
//! ]);
//!
//! let mut symbols = prelude::standard_symbols();
//! let methods = prelude::standard_methods();
//! let value = gnomish::run(&program, &mut symbols, &methods).unwrap();
//! assert_eq!(value, Value::Int(42));
//! ```

pub mod analysis;
pub mod ast;
pub mod error;
pub mod fmt;
pub mod interpreter;
pub mod methods;
pub mod prelude;
pub mod types;
pub mod wire;

pub use error::{Error, ErrorKind, Result};

use analysis::SymbolTable;
use interpreter::{Interpreter, Value};
use methods::MethodRegistry;

/// Analyze and run a program without a host context.
pub fn run(
    program: &ast::Expr<()>,
    symbols: &mut SymbolTable,
    methods: &MethodRegistry,
) -> Result<Value> {
    let analyzed = analysis::analyze(program, symbols, methods)?;
    Ok(Interpreter::new().run(&analyzed)?)
}
