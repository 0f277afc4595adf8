use std::sync::Arc;

use super::error::UsageError;
use super::symbols::{FrameId, StaticValue};
use crate::methods::Signature;
use crate::types::Type;

/// Runtime address of a dynamic binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub frame: FrameId,
    pub slot: u32,
}

/// Frame owned by a block, plus the enclosing frames its body reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
    pub frame: FrameId,
    pub slots: u32,
    pub captures: Vec<FrameId>,
}

/// What the analyzer resolved a node to, besides its type.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    None,
    /// `let`, `arg`, `assign` and dynamic `var` nodes.
    Slot(SlotRef),
    /// `var` nodes bound to a compile-time constant.
    Static(StaticValue),
    /// `call` nodes.
    Method(Arc<Signature>),
    /// `block` nodes.
    Scope(ScopeInfo),
}

impl Resolution {
    fn describe(&self) -> &'static str {
        match self {
            Resolution::None => "none",
            Resolution::Slot(_) => "slot",
            Resolution::Static(_) => "static",
            Resolution::Method(_) => "method",
            Resolution::Scope(_) => "scope",
        }
    }
}

/// The `info` payload of an analyzed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub ty: Type,
    pub resolution: Resolution,
}

impl Annotation {
    pub fn typed(ty: Type) -> Self {
        Annotation {
            ty,
            resolution: Resolution::None,
        }
    }

    pub fn resolved(ty: Type, resolution: Resolution) -> Self {
        Annotation { ty, resolution }
    }

    pub fn slot(&self) -> Result<SlotRef, UsageError> {
        match &self.resolution {
            Resolution::Slot(slot) => Ok(*slot),
            other => Err(self.unexpected("slot", other)),
        }
    }

    pub fn static_value(&self) -> Result<&StaticValue, UsageError> {
        match &self.resolution {
            Resolution::Static(value) => Ok(value),
            other => Err(self.unexpected("static", other)),
        }
    }

    pub fn method(&self) -> Result<&Arc<Signature>, UsageError> {
        match &self.resolution {
            Resolution::Method(signature) => Ok(signature),
            other => Err(self.unexpected("method", other)),
        }
    }

    pub fn scope(&self) -> Result<&ScopeInfo, UsageError> {
        match &self.resolution {
            Resolution::Scope(scope) => Ok(scope),
            other => Err(self.unexpected("scope", other)),
        }
    }

    fn unexpected(&self, expected: &'static str, found: &Resolution) -> UsageError {
        UsageError::UnexpectedResolution {
            expected,
            found: found.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_resolution_is_usage_error() {
        let annotation = Annotation::typed(Type::int());
        assert_eq!(
            annotation.slot(),
            Err(UsageError::UnexpectedResolution {
                expected: "slot",
                found: "none"
            })
        );
        assert!(annotation.scope().is_err());
    }

    #[test]
    fn test_static_is_not_a_slot() {
        let annotation = Annotation::resolved(Type::bool(), Resolution::Static(StaticValue::Bool(true)));
        assert_eq!(annotation.static_value(), Ok(&StaticValue::Bool(true)));
        assert!(annotation.slot().is_err());
    }
}
