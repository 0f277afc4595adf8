use std::collections::BTreeSet;

use thiserror::Error;

use super::subst::Bindings;
use super::ty::{Name, Type, pretty_list};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyError {
    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: Type, found: Type },
    #[error(
        "arity mismatch: expected ({}), found ({})",
        pretty_list(.expected),
        pretty_list(.found)
    )]
    Arity { expected: Vec<Type>, found: Vec<Type> },
    #[error("occurs check: cannot construct infinite type {param} = {ty}")]
    OccursCheck { param: Name, ty: Type },
    #[error("variadic type {ty} cannot stand in a single-type position")]
    VariadicPosition { ty: Type },
}

impl UnifyError {
    /// Swap expected and found, used when the algorithm recursed with its
    /// operands exchanged.
    fn flipped(self) -> Self {
        match self {
            UnifyError::Mismatch { expected, found } => UnifyError::Mismatch {
                expected: found,
                found: expected,
            },
            UnifyError::Arity { expected, found } => UnifyError::Arity {
                expected: found,
                found: expected,
            },
            other => other,
        }
    }
}

/// Unify two ordered type lists, starting from no bindings.
///
/// Every call site in Gnomish compares *lists* of types (a receiver followed
/// by the argument types), because argument lists carry arity and may contain
/// variadic patterns. The result is the set of parameter bindings that makes
/// both lists equal.
///
/// # Algorithm
///
/// The lists are walked left to right. At each position:
///
/// ```text
/// equal elements            → consume both
/// unbound splat  *'A        → bind 'A to the longest run of the other side
///                             that still lets the rest unify (greedy, then
///                             backtracking towards the empty run)
/// bound splat    *'A = [..] → splice the bound list in place and continue
/// Repeatable vs Repeatable  → unify the element types, consume both
/// Repeatable     T...       → consume as many leading non-variadic elements
///                             of the other side as possible, each of which
///                             must unify with the same T
/// anything else             → unify the two single types, consume both
/// ```
///
/// Single types unify as follows:
///
/// ```text
/// Unify(Int, Int)                 = ∅
/// Unify(Int, String)              = Error
/// Unify('A, Int)                  = ['A := Int]
/// Unify('B, 'A)                   = ['B := 'A]     (greater name → smaller)
/// Unify('A, Option('A))           = Error          (occurs check)
/// Unify(Block('R, Int), Block(Bool, 'X)) = ['R := Bool, 'X := Int]
/// ```
///
/// Bindings produced at one position are visible to every later position, so
/// `['A, 'A]` against `[Int, String]` fails.
///
/// # Splat vs Repeatable
///
/// ```text
/// Unify([Int...], [Int, Int, Int])   = ∅                      one type, many slots
/// Unify([*'A],    [Int, String])     = ['A := [Int, String]]  a whole list
/// ```
///
/// # Failure
///
/// Unification either succeeds completely or fails without touching the
/// caller's bindings; the error names the expected and found types.
pub fn unify(left: &[Type], right: &[Type]) -> Result<Bindings, UnifyError> {
    unify_with(left, right, &Bindings::empty())
}

/// Unify two type lists on top of existing bindings.
///
/// The existing bindings are never modified; on success the returned bindings
/// contain both the old and the newly produced entries.
pub fn unify_with(
    left: &[Type],
    right: &[Type],
    bindings: &Bindings,
) -> Result<Bindings, UnifyError> {
    unify_preferring(left, right, bindings, &BTreeSet::new())
}

/// Unify two type lists, binding parameters named in `flexible` whenever a
/// flexible parameter meets a rigid one.
///
/// Method lookup passes the signature's own parameters here, so a caller's
/// parameter is never renamed after a signature's.
pub fn unify_preferring(
    left: &[Type],
    right: &[Type],
    bindings: &Bindings,
    flexible: &BTreeSet<Name>,
) -> Result<Bindings, UnifyError> {
    unify_lists(left, right, bindings.clone(), flexible).map_err(|err| match err {
        UnifyError::Arity { .. } => UnifyError::Arity {
            expected: bindings.apply_list(left),
            found: bindings.apply_list(right),
        },
        other => other,
    })
}

/// Unify two single types.
pub fn unify_types(left: &Type, right: &Type) -> Result<Bindings, UnifyError> {
    unify(std::slice::from_ref(left), std::slice::from_ref(right))
}

fn unify_lists(
    left: &[Type],
    right: &[Type],
    bindings: Bindings,
    flexible: &BTreeSet<Name>,
) -> Result<Bindings, UnifyError> {
    match (left.first(), right.first()) {
        (None, None) => Ok(bindings),
        (Some(l), Some(r)) if l == r => {
            unify_lists(&left[1..], &right[1..], bindings, flexible)
        }
        (Some(Type::Splat(name)), _) if !bindings.contains(name) => {
            match_splat(name, &left[1..], right, bindings, flexible)
        }
        (_, Some(Type::Splat(name))) if !bindings.contains(name) => {
            match_splat(name, &right[1..], left, bindings, flexible)
                .map_err(UnifyError::flipped)
        }
        (Some(Type::Splat(name)), _) => {
            let expanded = expand_splat(name, &left[1..], &bindings)?;
            unify_lists(&expanded, right, bindings, flexible)
        }
        (_, Some(Type::Splat(name))) => {
            let expanded = expand_splat(name, &right[1..], &bindings)?;
            unify_lists(left, &expanded, bindings, flexible)
        }
        (Some(Type::Repeatable(l)), Some(Type::Repeatable(r))) => {
            let bindings = unify_one(l, r, bindings, flexible)?;
            unify_lists(&left[1..], &right[1..], bindings, flexible)
        }
        (Some(Type::Repeatable(pattern)), _) => {
            match_repeatable(pattern, &left[1..], right, bindings, flexible)
        }
        (_, Some(Type::Repeatable(pattern))) => {
            match_repeatable(pattern, &right[1..], left, bindings, flexible)
                .map_err(UnifyError::flipped)
        }
        (Some(l), Some(r)) => {
            let bindings = unify_one(l, r, bindings, flexible)?;
            unify_lists(&left[1..], &right[1..], bindings, flexible)
        }
        _ => Err(UnifyError::Arity {
            expected: left.to_vec(),
            found: right.to_vec(),
        }),
    }
}

/// Bind the unbound splat `name` to a prefix of `other`, longest first.
fn match_splat(
    name: &Name,
    rest: &[Type],
    other: &[Type],
    bindings: Bindings,
    flexible: &BTreeSet<Name>,
) -> Result<Bindings, UnifyError> {
    let mut first_error = None;
    for taken in (0..=other.len()).rev() {
        let run = bindings.apply_list(&other[..taken]);
        if run.iter().any(|ty| ty.free_params().contains(name)) {
            first_error.get_or_insert(UnifyError::OccursCheck {
                param: name.clone(),
                ty: Type::List(run),
            });
            continue;
        }
        let mut attempt = bindings.clone();
        attempt.insert(name.clone(), Type::List(run));
        match unify_lists(rest, &other[taken..], attempt, flexible) {
            Ok(result) => return Ok(result),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| UnifyError::Arity {
        expected: rest.to_vec(),
        found: other.to_vec(),
    }))
}

/// Match `pattern...` against as many leading fixed elements of `other` as
/// possible, backing off one element at a time until the rest unifies.
fn match_repeatable(
    pattern: &Type,
    rest: &[Type],
    other: &[Type],
    bindings: Bindings,
    flexible: &BTreeSet<Name>,
) -> Result<Bindings, UnifyError> {
    let available = other.iter().take_while(|ty| !ty.is_variadic()).count();
    let mut first_error = None;
    for taken in (0..=available).rev() {
        let attempt = other[..taken]
            .iter()
            .try_fold(bindings.clone(), |acc, ty| unify_one(pattern, ty, acc, flexible))
            .and_then(|acc| unify_lists(rest, &other[taken..], acc, flexible));
        match attempt {
            Ok(result) => return Ok(result),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| UnifyError::Arity {
        expected: rest.to_vec(),
        found: other.to_vec(),
    }))
}

fn expand_splat(name: &Name, rest: &[Type], bindings: &Bindings) -> Result<Vec<Type>, UnifyError> {
    match bindings.get(name) {
        Some(Type::List(items)) => Ok(items.iter().chain(rest).cloned().collect()),
        Some(other) => Err(UnifyError::VariadicPosition { ty: other.clone() }),
        None => Ok(std::iter::once(Type::Splat(name.clone()))
            .chain(rest.iter().cloned())
            .collect()),
    }
}

fn unify_one(
    left: &Type,
    right: &Type,
    bindings: Bindings,
    flexible: &BTreeSet<Name>,
) -> Result<Bindings, UnifyError> {
    let left = bindings.resolve(left);
    let right = bindings.resolve(right);

    if left == right {
        return Ok(bindings);
    }

    match (&left, &right) {
        (Type::Param(a), Type::Param(b)) => {
            // Flexible names are bound first; otherwise the greater name is.
            let (from, to) = match (flexible.contains(a), flexible.contains(b)) {
                (true, false) => (a, &right),
                (false, true) => (b, &left),
                _ if a > b => (a, &right),
                _ => (b, &left),
            };
            let mut bindings = bindings;
            bindings.insert(from.clone(), to.clone());
            Ok(bindings)
        }
        (Type::Param(param), other) | (other, Type::Param(param)) => {
            bind_param(param, other, bindings)
        }
        (ty, _) | (_, ty) if ty.is_variadic() => {
            Err(UnifyError::VariadicPosition { ty: ty.clone() })
        }
        (Type::Compound(left_base, left_params), Type::Compound(right_base, right_params)) => {
            let mismatch = || UnifyError::Mismatch {
                expected: bindings.apply(&left),
                found: bindings.apply(&right),
            };
            let after_base = unify_one(left_base, right_base, bindings.clone(), flexible)
                .map_err(|_| mismatch())?;
            unify_lists(left_params, right_params, after_base, flexible).map_err(|err| match err {
                UnifyError::Arity { .. } => mismatch(),
                other => other,
            })
        }
        (Type::List(left_items), Type::List(right_items)) => {
            unify_lists(left_items, right_items, bindings, flexible)
        }
        _ => Err(UnifyError::Mismatch {
            expected: bindings.apply(&left),
            found: bindings.apply(&right),
        }),
    }
}

fn bind_param(param: &Name, ty: &Type, bindings: Bindings) -> Result<Bindings, UnifyError> {
    if ty.is_variadic() || matches!(ty, Type::List(_)) {
        return Err(UnifyError::VariadicPosition { ty: ty.clone() });
    }
    let ty = bindings.apply(ty);
    if ty.free_params().contains(param) {
        return Err(UnifyError::OccursCheck {
            param: param.clone(),
            ty,
        });
    }
    let mut bindings = bindings;
    bindings.insert(param.clone(), ty);
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Type {
        Type::param("A")
    }

    fn b() -> Type {
        Type::param("B")
    }

    #[test]
    fn test_unify_identical_simple() {
        assert_eq!(unify(&[Type::int()], &[Type::int()]), Ok(Bindings::empty()));
    }

    #[test]
    fn test_unify_mismatch_simple() {
        let result = unify(&[Type::int()], &[Type::string()]);
        assert_eq!(
            result,
            Err(UnifyError::Mismatch {
                expected: Type::int(),
                found: Type::string()
            })
        );
    }

    #[test]
    fn test_unify_param_with_concrete() {
        let result = unify(&[a()], &[Type::int()]).unwrap();
        assert_eq!(result.apply(&a()), Type::int());
    }

    #[test]
    fn test_unify_concrete_with_param() {
        let result = unify(&[Type::int()], &[a()]).unwrap();
        assert_eq!(result.apply(&a()), Type::int());
    }

    #[test]
    fn test_unify_two_params_is_order_independent() {
        let forward = unify(&[a()], &[b()]).unwrap();
        let backward = unify(&[b()], &[a()]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.apply(&b()), a());
    }

    #[test]
    fn test_flexible_param_is_the_one_bound() {
        // 'A would normally be kept and 'Z bound to it.
        let flexible = BTreeSet::from([Name::from("'A")]);
        let result =
            unify_preferring(&[a()], &[Type::param("Z")], &Bindings::empty(), &flexible).unwrap();
        assert_eq!(result.get("'A"), Some(&Type::param("Z")));
        assert!(!result.contains("'Z"));

        let both = BTreeSet::from([Name::from("'A"), Name::from("'Z")]);
        let result =
            unify_preferring(&[a()], &[Type::param("Z")], &Bindings::empty(), &both).unwrap();
        assert_eq!(result.get("'Z"), Some(&a()));
    }

    #[test]
    fn test_unify_occurs_check() {
        let result = unify(&[a()], &[Type::option(a())]);
        assert!(matches!(result, Err(UnifyError::OccursCheck { .. })));
    }

    #[test]
    fn test_unify_left_to_right_dependency() {
        let result = unify(&[a(), a()], &[Type::int(), Type::string()]);
        assert_eq!(
            result,
            Err(UnifyError::Mismatch {
                expected: Type::int(),
                found: Type::string()
            })
        );
    }

    #[test]
    fn test_unify_compound() {
        let left = Type::block(Type::param("R"), vec![Type::int()]);
        let right = Type::block(Type::bool(), vec![Type::param("X")]);
        let result = unify(&[left.clone()], &[right]).unwrap();
        assert_eq!(result.apply(&left), Type::block(Type::bool(), vec![Type::int()]));
        assert_eq!(result.apply(&Type::param("X")), Type::int());
    }

    #[test]
    fn test_unify_compound_arity_mismatch() {
        let left = Type::block(Type::int(), vec![Type::int()]);
        let right = Type::block(Type::int(), vec![]);
        let result = unify(&[left.clone()], &[right.clone()]);
        assert_eq!(
            result,
            Err(UnifyError::Mismatch {
                expected: left,
                found: right
            })
        );
    }

    #[test]
    fn test_unify_compound_base_mismatch() {
        let result = unify(&[Type::option(Type::int())], &[Type::list(Type::int())]);
        assert!(matches!(result, Err(UnifyError::Mismatch { .. })));
    }

    #[test]
    fn test_unify_list_arity_mismatch() {
        let result = unify(&[Type::int()], &[Type::int(), Type::int()]);
        assert!(matches!(result, Err(UnifyError::Arity { .. })));
    }

    #[test]
    fn test_repeatable_zero_one_many() {
        let pattern = [Type::repeatable(Type::int())];
        for count in 0..4 {
            let args = vec![Type::int(); count];
            assert!(unify(&pattern, &args).is_ok(), "count {count}");
        }
        assert!(unify(&pattern, &[Type::int(), Type::string()]).is_err());
    }

    #[test]
    fn test_repeatable_with_trailing_fixed() {
        let pattern = [Type::repeatable(Type::int()), Type::string()];
        assert!(unify(&pattern, &[Type::string()]).is_ok());
        assert!(unify(&pattern, &[Type::int(), Type::string()]).is_ok());
        assert!(unify(&pattern, &[Type::int(), Type::int(), Type::string()]).is_ok());
        assert!(unify(&pattern, &[Type::int()]).is_err());
        assert!(unify(&pattern, &[]).is_err());
    }

    #[test]
    fn test_repeatable_param_is_one_type() {
        let pattern = [Type::repeatable(a())];
        let same = unify(&pattern, &[Type::int(), Type::int()]).unwrap();
        assert_eq!(same.apply(&a()), Type::int());
        assert!(unify(&pattern, &[Type::int(), Type::bool()]).is_err());
    }

    #[test]
    fn test_repeatable_backtracks_for_trailing_param() {
        let pattern = [Type::repeatable(Type::int()), a()];
        let result = unify(&pattern, &[Type::int(), Type::int()]).unwrap();
        assert_eq!(result.apply(&a()), Type::int());
    }

    #[test]
    fn test_splat_binds_whole_list() {
        let result = unify(&[Type::splat("A")], &[Type::int(), Type::string()]).unwrap();
        assert_eq!(
            result.get("'A"),
            Some(&Type::List(vec![Type::int(), Type::string()]))
        );
    }

    #[test]
    fn test_splat_binds_empty_list() {
        let result = unify(&[Type::splat("A"), Type::int()], &[Type::int()]).unwrap();
        assert_eq!(result.get("'A"), Some(&Type::List(vec![])));
    }

    #[test]
    fn test_splat_reunifies_against_existing_binding() {
        let receiver = Type::block(Type::param("R"), vec![Type::splat("A")]);
        let signature = [receiver, Type::splat("A")];
        let actual = [
            Type::block(Type::int(), vec![Type::int(), Type::string()]),
            Type::int(),
            Type::string(),
        ];
        let result = unify(&signature, &actual).unwrap();
        assert_eq!(result.apply(&Type::param("R")), Type::int());

        let wrong = [
            Type::block(Type::int(), vec![Type::int(), Type::string()]),
            Type::int(),
        ];
        assert!(unify(&signature, &wrong).is_err());
    }

    #[test]
    fn test_splat_binding_in_scalar_position_rejected() {
        let existing = Bindings::singleton(Name::from("'S"), Type::List(vec![Type::int()]));
        let result = unify_with(&[Type::param("S")], &[Type::int()], &existing);
        assert!(result.is_err());
    }

    #[test]
    fn test_splat_captures_repeatable() {
        let block_sig = [Type::block(Type::param("R"), vec![Type::splat("A")]), Type::splat("A")];
        let actual = [
            Type::block(Type::int(), vec![Type::repeatable(Type::int())]),
            Type::int(),
            Type::int(),
            Type::int(),
        ];
        let result = unify(&block_sig, &actual).unwrap();
        assert_eq!(result.apply(&Type::param("R")), Type::int());
    }

    #[test]
    fn test_failure_leaves_bindings_untouched() {
        let existing = Bindings::singleton(Name::from("'A"), Type::int());
        let result = unify_with(&[a(), b()], &[Type::int(), Type::option(b())], &existing);
        assert!(result.is_err());
        assert_eq!(existing.len(), 1);
    }

    #[test]
    fn test_reapplying_binding_is_idempotent() {
        let left = [Type::block(a(), vec![b()])];
        let right = [Type::block(Type::int(), vec![Type::string()])];
        let first = unify(&left, &right).unwrap();
        let second = unify_with(&left, &right, &first).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_symmetry_of_success_and_failure() {
        let cases: Vec<(Vec<Type>, Vec<Type>)> = vec![
            (vec![Type::int()], vec![Type::int()]),
            (vec![Type::int()], vec![Type::bool()]),
            (vec![a(), a()], vec![Type::int(), Type::int()]),
            (vec![a(), a()], vec![Type::int(), Type::real()]),
            (vec![Type::repeatable(Type::int())], vec![]),
            (
                vec![Type::repeatable(Type::int()), Type::string()],
                vec![Type::int(), Type::string()],
            ),
            (vec![Type::splat("A")], vec![Type::int(), Type::bool()]),
            (
                vec![Type::block(a(), vec![Type::splat("S")])],
                vec![Type::block(Type::int(), vec![Type::int(), Type::int()])],
            ),
            (vec![a()], vec![Type::option(a())]),
            (vec![Type::int()], vec![]),
        ];
        for (left, right) in cases {
            let forward = unify(&left, &right);
            let backward = unify(&right, &left);
            assert_eq!(
                forward.is_ok(),
                backward.is_ok(),
                "asymmetric result for {} vs {}",
                pretty_list(&left),
                pretty_list(&right)
            );
            if let (Ok(f), Ok(b)) = (forward, backward) {
                assert_eq!(f.apply_list(&left), b.apply_list(&left));
            }
        }
    }

    #[test]
    fn test_error_messages_name_both_types() {
        let err = unify(&[Type::int()], &[Type::string()]).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected Int, found String");
    }
}
