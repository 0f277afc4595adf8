//! # Wire Format
//!
//! Lossless, versioned conversion between trees and JSON payloads:
//!
//! ```json
//! { "version": 1, "root": { "kind": "exprList", "exprs": [] } }
//! ```
//!
//! Serialization ignores annotations, so both `Expr<()>` and
//! `Expr<Annotation>` serialize; deserialization always produces an
//! unanalyzed `Expr<()>`. The envelope's `version` selects the decoder, and
//! unknown versions are rejected.
//!
//! JSON has no representation for NaN or the infinities, so a tree holding a
//! non-finite `Real` literal is refused by [`serialize`].

pub mod v1;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::visit::{Node, Visit};
use crate::ast::{Expr, Real};

/// Version written by [`serialize`].
pub const CURRENT_VERSION: u64 = 1;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("unsupported wire format version {version}")]
    UnsupportedVersion { version: u64 },
    #[error("expected a {expected} record, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("real literal {value} has no wire representation")]
    NonFiniteReal { value: f64 },
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct Envelope {
    version: u64,
    root: v1::Node,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: u64,
    root: serde_json::Value,
}

/// Finds the first non-finite real literal in a tree.
#[derive(Default)]
struct NonFinite(Option<f64>);

impl<T> Visit<T> for NonFinite {
    fn visit_real(&mut self, node: &Real<T>) {
        if self.0.is_none() && !node.value.is_finite() {
            self.0 = Some(node.value);
        }
    }
}

pub fn serialize<T>(expr: &Expr<T>) -> Result<serde_json::Value, WireError> {
    let mut check = NonFinite::default();
    expr.accept(&mut check);
    if let Some(value) = check.0 {
        return Err(WireError::NonFiniteReal { value });
    }

    let envelope = Envelope {
        version: CURRENT_VERSION,
        root: v1::encode(expr),
    };
    Ok(serde_json::to_value(envelope)?)
}

pub fn to_string<T>(expr: &Expr<T>) -> Result<String, WireError> {
    Ok(serde_json::to_string(&serialize(expr)?)?)
}

pub fn deserialize(payload: &serde_json::Value) -> Result<Expr<()>, WireError> {
    let envelope = RawEnvelope::deserialize(payload)?;
    tracing::debug!(version = envelope.version, "deserializing payload");
    match envelope.version {
        1 => v1::decode(v1::Node::deserialize(&envelope.root)?),
        version => Err(WireError::UnsupportedVersion { version }),
    }
}

pub fn from_str(text: &str) -> Result<Expr<()>, WireError> {
    let payload: serde_json::Value = serde_json::from_str(text)?;
    deserialize(&payload)
}
