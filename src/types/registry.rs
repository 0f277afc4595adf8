use std::collections::HashMap;
use std::sync::OnceLock;

use super::ty::{Name, Type, builtin};

/// Interns nominal type names.
///
/// Every lookup of the same name returns a `Type` sharing one allocation, so
/// hosts can register their own nominal types once at startup and hand the
/// resulting values around freely.
static BUILTINS: OnceLock<TypeRegistry> = OnceLock::new();

/// The process-wide registry of builtin types. Constructors such as
/// [`Type::int`] hand out clones of its entries.
pub fn builtins() -> &'static TypeRegistry {
    BUILTINS.get_or_init(TypeRegistry::standard)
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<Name, Type>,
    order: Vec<Name>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the builtin nominal types.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for name in builtin::ALL {
            registry.declare(name);
        }
        registry
    }

    /// Declare a nominal type, returning the interned value. Declaring an
    /// existing name returns the existing value.
    pub fn declare(&mut self, name: &str) -> Type {
        if let Some(ty) = self.types.get(name) {
            return ty.clone();
        }
        let name = Name::from(name);
        let ty = Type::Simple(name.clone());
        self.types.insert(name.clone(), ty.clone());
        self.order.push(name);
        ty
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Declared types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }
}
