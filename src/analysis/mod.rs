//! # Static Analysis
//!
//! Turns an unanalyzed `Expr<()>` into an `Expr<Annotation>` in one pass:
//!
//! 1. **Scope resolution** - every `let`, `arg` and `var` is resolved against
//!    the [`SymbolTable`], yielding either a frame+slot or a static value
//! 2. **Slot allocation** - slots are numbered per frame in declaration
//!    order, starting at 0
//! 3. **Typing** - literals get builtin types, annotations are unified with
//!    the values they annotate, `if`/`while` conditions must yield `Bool`
//! 4. **Method resolution** - every `call` is resolved to exactly one
//!    signature through the [`crate::methods::MethodRegistry`]
//!
//! Capture sets recorded by the symbol table while a block's body is analyzed
//! are copied onto the block's annotation, so the interpreter knows which
//! enclosing frames a closure must alias.
//!
//! A failed analysis returns an error and no tree; nothing half-annotated
//! escapes.

pub mod analyzer;
pub mod annotation;
pub mod error;
pub mod symbols;

pub use analyzer::{Analyzer, analyze};
pub use annotation::{Annotation, Resolution, ScopeInfo, SlotRef};
pub use error::{AnalysisError, UsageError};
pub use symbols::{Entry, FrameId, Lookup, ResolutionError, ScopeKind, StaticValue, SymbolTable};
