use std::collections::BTreeMap;

use super::ty::{Name, Type};

/// Type-parameter bindings produced by unification.
///
/// Ordinary parameters (`'A`) are bound to a single type; splat parameters
/// (`*'A`) are bound to a [`Type::List`]. Both share one namespace, keyed by
/// the prefixed parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<Name, Type>);

impl Bindings {
    pub fn empty() -> Self {
        Bindings(BTreeMap::new())
    }

    pub fn singleton(name: Name, ty: Type) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name, ty);
        Bindings(map)
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Type)> {
        self.0.iter()
    }

    pub fn insert(&mut self, name: Name, ty: Type) {
        self.0.insert(name, ty);
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn extend(&mut self, other: Bindings) {
        for (name, ty) in other.0 {
            self.0.insert(name, ty);
        }
    }

    /// Follow parameter bindings until reaching something that is not a bound
    /// parameter. Splats are left alone; they only expand inside lists.
    pub fn resolve(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        // A chain can never be longer than the number of bindings.
        for _ in 0..=self.0.len() {
            let next = match &current {
                Type::Param(name) => match self.0.get(name) {
                    Some(bound) if bound != &current => bound.clone(),
                    _ => break,
                },
                _ => break,
            };
            current = next;
        }
        current
    }

    /// Substitute every bound parameter in `ty`, expanding bound splats that
    /// occur inside compound argument lists.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Simple(_) => ty.clone(),
            Type::Param(_) => {
                let resolved = self.resolve(ty);
                if &resolved == ty {
                    resolved
                } else {
                    self.apply(&resolved)
                }
            }
            Type::Splat(name) => match self.0.get(name) {
                Some(Type::List(items)) => Type::List(self.apply_list(items)),
                _ => ty.clone(),
            },
            Type::Compound(base, params) => {
                Type::Compound(Box::new(self.apply(base)), self.apply_list(params))
            }
            Type::Repeatable(inner) => Type::Repeatable(Box::new(self.apply(inner))),
            Type::List(items) => Type::List(self.apply_list(items)),
        }
    }

    /// Apply to an ordered type list, splicing bound splats in place.
    pub fn apply_list(&self, types: &[Type]) -> Vec<Type> {
        let mut result = Vec::with_capacity(types.len());
        for ty in types {
            match ty {
                Type::Splat(name) => match self.0.get(name) {
                    Some(Type::List(items)) => result.extend(self.apply_list(items)),
                    _ => result.push(ty.clone()),
                },
                _ => result.push(self.apply(ty)),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bindings() {
        let bindings = Bindings::empty();
        assert_eq!(bindings.apply(&Type::param("A")), Type::param("A"));
    }

    #[test]
    fn test_singleton_bindings() {
        let bindings = Bindings::singleton(Name::from("'A"), Type::int());
        assert_eq!(bindings.apply(&Type::param("A")), Type::int());
    }

    #[test]
    fn test_apply_follows_chains() {
        let mut bindings = Bindings::singleton(Name::from("'B"), Type::param("A"));
        bindings.insert(Name::from("'A"), Type::string());
        let ty = Type::option(Type::param("B"));
        assert_eq!(bindings.apply(&ty), Type::option(Type::string()));
    }

    #[test]
    fn test_apply_expands_splat() {
        let bindings = Bindings::singleton(
            Name::from("'A"),
            Type::List(vec![Type::int(), Type::bool()]),
        );
        let ty = Type::block(Type::unit(), vec![Type::splat("A")]);
        assert_eq!(
            bindings.apply(&ty),
            Type::block(Type::unit(), vec![Type::int(), Type::bool()])
        );
    }

    #[test]
    fn test_apply_preserves_unbound() {
        let bindings = Bindings::singleton(Name::from("'A"), Type::int());
        let ty = Type::block(Type::param("R"), vec![Type::splat("S")]);
        assert_eq!(bindings.apply(&ty), ty);
    }

    #[test]
    fn test_apply_idempotent() {
        let bindings = Bindings::singleton(Name::from("'A"), Type::int());
        let once = bindings.apply(&Type::list(Type::param("A")));
        let twice = bindings.apply(&once);
        assert_eq!(once, twice);
    }
}
