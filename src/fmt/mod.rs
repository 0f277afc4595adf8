//! Pretty-printing for Gnomish trees.

pub mod sexp;

pub use sexp::to_sexp;
