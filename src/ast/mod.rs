//! # Gnomish AST
//!
//! The node types of a Gnomish program. The tree is produced by the host's
//! parser or by [`crate::wire::deserialize`] and then handed to the analyzer.
//!
//! ## Phases
//!
//! Every node is generic over an `info: T` payload:
//!
//! - **Before analysis**: `Expr<()>`
//! - **After analysis**: `Expr<Annotation>` (type, frame/slot, resolved method)
//!
//! The interpreter only accepts `Expr<Annotation>`, so an unanalyzed tree can
//! never reach it.
//!
//! ## Node kinds
//!
//! ```text
//! exprList  e1; e2; ...            value of the last element, Unit if empty
//! if        {c} then {a} else {b}  else optional
//! while     {c} do {a}
//! assign    x = e
//! let       let x: T = e           scope: block | named (e.g. game)
//! call      r.sel(a, b)
//! block     { |x: T = d, ys: T...| body }
//! int, real, string, var
//! ```
//!
//! `Arg` and `TypeExpr` are nodes too (they are visited and annotated) but
//! only appear inside blocks and `let`.

pub mod expression;
pub mod visit;

pub use expression::*;
pub use visit::{Node, Visit};
