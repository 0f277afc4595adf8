//! # Interpreter
//!
//! Tree-walking evaluator over analyzed trees (`Expr<Annotation>`).
//!
//! ## Storage Model
//!
//! Every frame the analyzer created is addressed by its [`FrameId`]. At run
//! time the interpreter maps frame ids to [`Storage`], a slot vector shared
//! by reference:
//!
//! ```text
//! frames: { #0 → [Int 1, Bool true], #3 → [Int 0] }
//!                   ↑                     ↑
//!            root frame storage     storage of the block being run
//! ```
//!
//! Evaluating a `block` node snapshots the storage handles of every captured
//! frame into a [`Closure`]. Calling the closure swaps the interpreter's frame
//! map for the closure's snapshot plus a fresh frame for the block itself, so
//! the callee sees exactly the frames it captured.
//!
//! `if` and `while` run their blocks inline with fresh storage for the block
//! frame and never allocate closures.
//!
//! ## Host Interaction
//!
//! Methods are host callbacks receiving an [`Invocation`]: the receiver, the
//! selector, and the interpreter itself, through which a callback can call
//! closures or reach the opaque host context.

mod eval;
mod storage;
mod value;

pub use storage::Storage;
pub use value::{Closure, Value};

use std::any::Any;
use std::collections::HashMap;

use thiserror::Error;

use crate::analysis::{Annotation, FrameId, UsageError};
use crate::ast::Expr;
use crate::error::ErrorKind;

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("slot {slot} of frame {frame} read before it was written")]
    UninitializedSlot { frame: FrameId, slot: u32 },
    #[error("expected a {expected} value, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("block takes {expected} arguments, got {found}")]
    TooManyArguments { expected: usize, found: usize },
    #[error("missing value for argument `{name}`")]
    MissingArgument { name: String },
    /// Failure reported by a method callback, e.g. division by zero.
    #[error("`{selector}` failed: {message}")]
    Method { selector: String, message: String },
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Usage(_) => ErrorKind::Usage,
            _ => ErrorKind::Runtime,
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Evaluator state: live frame storage and the optional host context.
pub struct Interpreter<'h> {
    frames: HashMap<FrameId, Storage>,
    host: Option<&'h mut (dyn Any + 'static)>,
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> Interpreter<'h> {
    pub fn new() -> Self {
        Interpreter {
            frames: HashMap::new(),
            host: None,
        }
    }

    /// An interpreter whose callbacks can reach `host` through
    /// [`Invocation::host`].
    pub fn with_host(host: &'h mut (dyn Any + 'static)) -> Self {
        Interpreter {
            frames: HashMap::new(),
            host: Some(host),
        }
    }

    /// Seed the storage of `frame`, e.g. to keep state across runs.
    pub fn with_frame(mut self, frame: FrameId, storage: Storage) -> Self {
        self.frames.insert(frame, storage);
        self
    }

    /// Storage of `frame`, if the frame has been written or captured.
    pub fn frame_storage(&self, frame: FrameId) -> Option<&Storage> {
        self.frames.get(&frame)
    }

    pub fn host<T: Any>(&mut self) -> Option<&mut T> {
        self.host.as_deref_mut().and_then(|host| host.downcast_mut::<T>())
    }

    /// Evaluate an analyzed program.
    #[tracing::instrument(skip_all, fields(kind = expr.kind()))]
    pub fn run(&mut self, expr: &Expr<Annotation>) -> RuntimeResult<Value> {
        let value = self.eval(expr)?;
        tracing::debug!(%value, "run finished");
        Ok(value)
    }
}

/// Context handed to every method callback.
pub struct Invocation<'a, 'h> {
    pub receiver: Value,
    pub selector: &'a str,
    pub interpreter: &'a mut Interpreter<'h>,
}

impl Invocation<'_, '_> {
    /// The host context, if one of type `T` was supplied.
    pub fn host<T: Any>(&mut self) -> Option<&mut T> {
        self.interpreter.host::<T>()
    }

    /// Call a closure, typically the receiver or an argument.
    pub fn call(&mut self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        self.interpreter.call_block(closure, args)
    }

    /// A [`RuntimeError::Method`] naming this invocation's selector.
    pub fn error(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::Method {
            selector: self.selector.to_string(),
            message: message.into(),
        }
    }
}
