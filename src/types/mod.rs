pub mod registry;
pub mod subst;
pub mod ty;
pub mod unify;

pub use registry::TypeRegistry;
pub use subst::Bindings;
pub use ty::{Name, Type, builtin};
pub use unify::{UnifyError, unify, unify_preferring, unify_types, unify_with};
