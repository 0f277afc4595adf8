//! # Analysis Error Definitions
//!
//! Errors raised while turning an `Expr<()>` into an `Expr<Annotation>`:
//!
//! - A name cannot be found, or a scope operation is invalid (resolution)
//! - Two types that must agree do not (type)
//! - A call cannot be resolved to exactly one method (method dispatch)
//!
//! [`UsageError`] is different in kind: it signals that the crate itself (or
//! a host that built an annotated tree by hand) broke an ordering contract.
//! It is never caused by a Gnomish program.
//!
//! ## Related Modules
//!
//! - [`crate::analysis::symbols`] - produces [`ResolutionError`]
//! - [`crate::types::unify`] - [`UnifyError`] is wrapped with context here
//! - [`crate::methods`] - produces [`MethodError`]

use thiserror::Error;

use super::symbols::ResolutionError;
use crate::error::ErrorKind;
use crate::methods::MethodError;
use crate::types::{Type, UnifyError};

/// Error encountered while analyzing a program.
///
/// # Example Error Messages
///
/// ```text
/// identifier `count` not found
/// type annotation of `x` does not match its value: type mismatch: expected Int, found String
/// condition must be Bool: expected Block(Bool), found Block(Int)
/// no method `+` on Int matching argument types (String)
/// ```
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Assignment to a name that was never declared.
    #[error("identifier `{name}` not found")]
    IdentifierNotFound { name: String },

    /// `let` or `arg` whose annotation and value disagree.
    #[error("type annotation of `{name}` does not match its value: {source}")]
    AnnotationMismatch { name: String, source: UnifyError },

    /// Condition block of `if` or `while` does not yield `Bool`.
    ///
    /// Both types are block types, e.g. `Block(Bool)` and `Block(Int)`.
    #[error("condition must be Bool: expected {expected}, found {found}")]
    ConditionNotBool { expected: Type, found: Type },

    /// `then` and `else` yield types that do not unify.
    #[error("branches of `if` disagree: then yields {then}, else yields {otherwise}")]
    BranchMismatch {
        then: Type,
        otherwise: Type,
        source: UnifyError,
    },

    /// Assigned value does not fit the declared type of the target.
    #[error("cannot assign to `{name}`: {source}")]
    IncompatibleAssignment { name: String, source: UnifyError },

    #[error("cannot assign to static binding `{name}`")]
    AssignToStatic { name: String },

    /// A type expression names something that does not denote a type.
    #[error("`{name}` is not a type")]
    NotAType { name: String },

    /// Splat marker on a name that is not a type parameter.
    #[error("only type parameters can be splatted, found `{name}`")]
    InvalidSplat { name: String },

    /// `if`/`while` blocks are evaluated inline and take no arguments.
    #[error("control blocks of `{construct}` cannot declare arguments")]
    ControlBlockArgs { construct: &'static str },

    #[error(transparent)]
    Method(#[from] MethodError),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Resolution(_) | AnalysisError::IdentifierNotFound { .. } => {
                ErrorKind::Resolution
            }
            AnalysisError::Method(_) => ErrorKind::Method,
            _ => ErrorKind::Type,
        }
    }
}

/// A contract violation between pipeline stages.
///
/// Raised when a node is read for information it does not carry, e.g. the
/// slot of a node that was resolved as a static value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("expected a {expected} resolution, found {found}")]
    UnexpectedResolution {
        expected: &'static str,
        found: &'static str,
    },
}
