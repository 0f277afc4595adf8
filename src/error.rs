//! # Error Umbrella
//!
//! Each layer reports its own error type:
//!
//! | Layer | Error |
//! |-------|-------|
//! | symbol table | [`ResolutionError`] |
//! | unifier | [`UnifyError`](crate::types::UnifyError) |
//! | method registry | [`MethodError`] |
//! | analyzer | [`AnalysisError`] (wraps the three above) |
//! | interpreter | [`RuntimeError`] |
//! | wire format | [`WireError`] |
//!
//! [`Error`] gathers them for hosts that drive the whole pipeline, and
//! [`Error::kind`] tells user mistakes apart from contract violations
//! ([`ErrorKind::Usage`]).

use crate::analysis::{AnalysisError, ResolutionError, UsageError};
use crate::interpreter::RuntimeError;
use crate::methods::MethodError;
use crate::wire::WireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown identifier, unknown scope, pop of the root scope.
    Resolution,
    /// Mismatched annotation, non-boolean condition, branch or assignment mismatch.
    Type,
    /// No such method, no matching overload, ambiguous overload.
    Method,
    /// Malformed payload or unsupported wire format version.
    Serialization,
    /// A pipeline stage was used out of order. Never caused by a program.
    Usage,
    /// Failure while running an analyzed program.
    Runtime,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Analysis(err) => err.kind(),
            Error::Runtime(err) => err.kind(),
            Error::Wire(_) => ErrorKind::Serialization,
            Error::Usage(_) => ErrorKind::Usage,
        }
    }
}

impl From<ResolutionError> for Error {
    fn from(err: ResolutionError) -> Self {
        Error::Analysis(err.into())
    }
}

impl From<MethodError> for Error {
    fn from(err: MethodError) -> Self {
        Error::Analysis(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
