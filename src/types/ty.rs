use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Shared, cheaply clonable name used by every type shape.
pub type Name = Arc<str>;

/// Names of the builtin nominal types.
pub mod builtin {
    pub const INT: &str = "Int";
    pub const REAL: &str = "Real";
    pub const STRING: &str = "String";
    pub const BOOL: &str = "Bool";
    pub const UNIT: &str = "Unit";
    pub const BLOCK: &str = "Block";
    pub const OPTION: &str = "Option";
    pub const LIST: &str = "List";
    pub const TYPE: &str = "Type";

    pub const ALL: [&str; 9] = [INT, REAL, STRING, BOOL, UNIT, BLOCK, OPTION, LIST, TYPE];
}

/// Prefix that distinguishes a type parameter from a nominal type.
pub const PARAM_PREFIX: char = '\'';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Nominal type such as `Int`.
    Simple(Name),
    /// Unbound type variable, e.g. `'A`. The name keeps its prefix.
    Param(Name),
    /// A base applied to ordered arguments, e.g. `Block(Int, 'A)`.
    Compound(Box<Type>, Vec<Type>),
    /// Matches zero or more positions of the wrapped type.
    Repeatable(Box<Type>),
    /// Stands for a whole, possibly empty, run of types.
    Splat(Name),
    /// The value a splat parameter is bound to.
    List(Vec<Type>),
}

impl Type {
    pub fn simple(name: impl Into<Name>) -> Self {
        Type::Simple(name.into())
    }

    /// Build a type parameter, adding the `'` prefix if the caller left it off.
    pub fn param(name: &str) -> Self {
        Type::Param(prefixed(name))
    }

    pub fn splat(name: &str) -> Self {
        Type::Splat(prefixed(name))
    }

    pub fn repeatable(inner: Type) -> Self {
        Type::Repeatable(Box::new(inner))
    }

    pub fn compound(base: Type, params: Vec<Type>) -> Self {
        Type::Compound(Box::new(base), params)
    }

    /// A builtin nominal type, sharing the name held by the builtin registry.
    fn builtin(name: &str) -> Self {
        super::registry::builtins()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Type::simple(name))
    }

    pub fn int() -> Self {
        Type::builtin(builtin::INT)
    }

    pub fn real() -> Self {
        Type::builtin(builtin::REAL)
    }

    pub fn string() -> Self {
        Type::builtin(builtin::STRING)
    }

    pub fn bool() -> Self {
        Type::builtin(builtin::BOOL)
    }

    pub fn unit() -> Self {
        Type::builtin(builtin::UNIT)
    }

    /// `Block(ret, args...)`
    pub fn block(ret: Type, args: Vec<Type>) -> Self {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(ret);
        params.extend(args);
        Type::compound(Type::builtin(builtin::BLOCK), params)
    }

    pub fn option(inner: Type) -> Self {
        Type::compound(Type::builtin(builtin::OPTION), vec![inner])
    }

    pub fn list(inner: Type) -> Self {
        Type::compound(Type::builtin(builtin::LIST), vec![inner])
    }

    /// The type of a value that denotes a type, e.g. the static `Int` binding.
    pub fn meta(inner: Type) -> Self {
        Type::compound(Type::builtin(builtin::TYPE), vec![inner])
    }

    /// True for shapes that may only appear inside an ordered type list.
    pub fn is_variadic(&self) -> bool {
        matches!(self, Type::Repeatable(_) | Type::Splat(_))
    }

    /// The base name of a simple or compound type.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Type::Simple(name) => Some(name),
            Type::Compound(base, _) => base.base_name(),
            _ => None,
        }
    }

    /// Type arguments of a compound type; empty for every other shape.
    pub fn params(&self) -> &[Type] {
        match self {
            Type::Compound(_, params) => params,
            _ => &[],
        }
    }

    /// Names of every parameter and splat occurring in this type.
    pub fn free_params(&self) -> BTreeSet<Name> {
        let mut names = BTreeSet::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params(&self, names: &mut BTreeSet<Name>) {
        match self {
            Type::Simple(_) => {}
            Type::Param(name) | Type::Splat(name) => {
                names.insert(name.clone());
            }
            Type::Compound(base, params) => {
                base.collect_params(names);
                for param in params {
                    param.collect_params(names);
                }
            }
            Type::Repeatable(inner) => inner.collect_params(names),
            Type::List(items) => {
                for item in items {
                    item.collect_params(names);
                }
            }
        }
    }

    /// True if no parameter or splat remains anywhere in the type.
    pub fn is_concrete(&self) -> bool {
        self.free_params().is_empty()
    }

    /// Rename parameters according to `rename`, leaving the rest untouched.
    pub fn rename_params(&self, rename: &dyn Fn(&Name) -> Option<Name>) -> Type {
        match self {
            Type::Simple(_) => self.clone(),
            Type::Param(name) => Type::Param(rename(name).unwrap_or_else(|| name.clone())),
            Type::Splat(name) => Type::Splat(rename(name).unwrap_or_else(|| name.clone())),
            Type::Compound(base, params) => Type::Compound(
                Box::new(base.rename_params(rename)),
                params.iter().map(|p| p.rename_params(rename)).collect(),
            ),
            Type::Repeatable(inner) => Type::Repeatable(Box::new(inner.rename_params(rename))),
            Type::List(items) => Type::List(items.iter().map(|t| t.rename_params(rename)).collect()),
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Type::Simple(name) | Type::Param(name) => name.to_string(),
            Type::Compound(base, params) => format!("{}({})", base.pretty(), pretty_list(params)),
            Type::Repeatable(inner) => format!("{}...", inner.pretty()),
            Type::Splat(name) => format!("*{}", name),
            Type::List(items) => format!("[{}]", pretty_list(items)),
        }
    }
}

fn prefixed(name: &str) -> Name {
    if name.starts_with(PARAM_PREFIX) {
        Name::from(name)
    } else {
        Name::from(format!("{}{}", PARAM_PREFIX, name))
    }
}

/// Comma separated rendering of an ordered type list.
pub fn pretty_list(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::pretty)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}
