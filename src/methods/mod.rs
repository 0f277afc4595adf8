//! # Method Registry
//!
//! Gnomish has no free functions: every operation, including arithmetic, is
//! a method call `receiver.selector(args...)`. Methods are grouped by
//! selector into overload sets, and a call is resolved by unifying
//!
//! ```text
//! [sig.receiver, sig.args...]   against   [receiver type, arg types...]
//! ```
//!
//! for every registered signature of the selector.
//!
//! ## Resolution Rules
//!
//! - no signature for the selector → [`MethodError::NoSuchMethod`]
//! - no signature unifies → [`MethodError::NoMatchingOverload`]
//! - more than one unifies → [`MethodError::Ambiguous`] (no tie-breaking)
//! - exactly one → that signature, with its return type resolved
//!
//! When a caller's type parameter meets one of the signature's own, the
//! signature's parameter is the one bound, so the caller's names survive into
//! [`Resolved::bindings`].
//!
//! ## Layering
//!
//! A registry may be derived from a shared parent (typically the standard
//! prelude). Registration only ever touches the local layer, while lookup
//! pools candidates from every layer *before* judging ambiguity.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::interpreter::{Invocation, RuntimeResult, Value};
use crate::types::ty::pretty_list;
use crate::types::{Bindings, Name, Type, unify_preferring};

/// Host or prelude implementation of a method.
pub type Callback =
    Arc<dyn Fn(&mut Invocation<'_, '_>, Vec<Value>) -> RuntimeResult<Value> + Send + Sync>;

/// An immutable, registered method.
#[derive(Clone)]
pub struct Signature {
    pub receiver: Type,
    pub selector: String,
    pub args: Vec<Type>,
    pub ret: Type,
    callback: Callback,
}

impl Signature {
    pub fn invoke(&self, invocation: &mut Invocation<'_, '_>, args: Vec<Value>) -> RuntimeResult<Value> {
        (self.callback)(invocation, args)
    }

    /// Copy of this signature with every type passed through `bindings`.
    fn resolved(&self, bindings: &Bindings) -> Signature {
        Signature {
            receiver: bindings.apply(&self.receiver),
            selector: self.selector.clone(),
            args: bindings.apply_list(&self.args),
            ret: bindings.apply(&self.ret),
            callback: self.callback.clone(),
        }
    }

    /// Copy of this signature whose parameters avoid every name in `taken`.
    fn freshened(&self, taken: &BTreeSet<Name>) -> Signature {
        let own = self.params();

        let mut renames = HashMap::new();
        for name in own.iter().filter(|name| taken.contains(*name)) {
            let fresh = (1..)
                .map(|n| Name::from(format!("{}{}", name, n)))
                .find(|candidate| !taken.contains(candidate) && !own.contains(candidate))
                .unwrap_or_else(|| name.clone());
            renames.insert(name.clone(), fresh);
        }
        if renames.is_empty() {
            return self.clone();
        }

        let rename = |name: &Name| renames.get(name).cloned();
        Signature {
            receiver: self.receiver.rename_params(&rename),
            selector: self.selector.clone(),
            args: self.args.iter().map(|arg| arg.rename_params(&rename)).collect(),
            ret: self.ret.rename_params(&rename),
            callback: self.callback.clone(),
        }
    }

    fn pattern(&self) -> Vec<Type> {
        std::iter::once(self.receiver.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    fn params(&self) -> BTreeSet<Name> {
        let mut params = self.receiver.free_params();
        for arg in &self.args {
            params.extend(arg.free_params());
        }
        params.extend(self.ret.free_params());
        params
    }
}

/// Outcome of resolving a call.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The matching signature with its types resolved for this call.
    pub signature: Arc<Signature>,
    /// Bindings for parameters of the caller's types, fully applied.
    pub bindings: Bindings,
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.receiver == other.receiver
            && self.selector == other.selector
            && self.args == other.args
            && self.ret == other.ret
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}({}) -> {}",
            self.receiver,
            self.selector,
            pretty_list(&self.args),
            self.ret
        )
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

#[derive(Debug, Clone, Error)]
pub enum MethodError {
    #[error("no such method `{selector}`")]
    NoSuchMethod { selector: String },
    #[error("no method `{selector}` on {receiver}{}", describe_args(.args))]
    NoMatchingOverload {
        selector: String,
        receiver: Type,
        args: Vec<Type>,
    },
    #[error(
        "ambiguous call to `{selector}` on {receiver}{}: candidates are {}",
        describe_args(.args),
        describe_candidates(.candidates)
    )]
    Ambiguous {
        selector: String,
        receiver: Type,
        args: Vec<Type>,
        candidates: Vec<Arc<Signature>>,
    },
}

fn describe_args(args: &[Type]) -> String {
    if args.is_empty() {
        String::new()
    } else {
        format!(" matching argument types ({})", pretty_list(args))
    }
}

fn describe_candidates(candidates: &[Arc<Signature>]) -> String {
    candidates
        .iter()
        .map(|candidate| candidate.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Overload sets keyed by selector, optionally layered over a parent.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    parent: Option<Arc<MethodRegistry>>,
    methods: HashMap<String, Vec<Arc<Signature>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child registry whose lookups also see every method of `parent`.
    pub fn derive(parent: Arc<MethodRegistry>) -> Self {
        MethodRegistry {
            parent: Some(parent),
            methods: HashMap::new(),
        }
    }

    /// Append a signature to the overload set of `selector`.
    ///
    /// No uniqueness check happens here; overlapping signatures only surface
    /// as [`MethodError::Ambiguous`] when a call matches several of them.
    pub fn register<F>(
        &mut self,
        receiver: Type,
        selector: &str,
        args: Vec<Type>,
        ret: Type,
        callback: F,
    ) -> Arc<Signature>
    where
        F: Fn(&mut Invocation<'_, '_>, Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let signature = Arc::new(Signature {
            receiver,
            selector: selector.to_string(),
            args,
            ret,
            callback: Arc::new(callback),
        });
        tracing::trace!(%signature, "registered method");
        self.methods
            .entry(selector.to_string())
            .or_default()
            .push(signature.clone());
        signature
    }

    /// All signatures for `selector`, local layer first.
    pub fn candidates(&self, selector: &str) -> Vec<Arc<Signature>> {
        let mut candidates = self.methods.get(selector).cloned().unwrap_or_default();
        if let Some(parent) = &self.parent {
            candidates.extend(parent.candidates(selector));
        }
        candidates
    }

    /// Selectors known to this registry or any ancestor, sorted.
    pub fn selectors(&self) -> BTreeSet<String> {
        let mut selectors: BTreeSet<String> = self.methods.keys().cloned().collect();
        if let Some(parent) = &self.parent {
            selectors.extend(parent.selectors());
        }
        selectors
    }

    /// Resolve a call to exactly one signature.
    pub fn lookup(
        &self,
        receiver: &Type,
        selector: &str,
        args: &[Type],
    ) -> Result<Arc<Signature>, MethodError> {
        self.resolve(receiver, selector, args)
            .map(|resolved| resolved.signature)
    }

    /// Resolve a call, also reporting what the match implies about the
    /// parameters of `receiver` and `args`.
    pub fn resolve(
        &self,
        receiver: &Type,
        selector: &str,
        args: &[Type],
    ) -> Result<Resolved, MethodError> {
        let candidates = self.candidates(selector);
        if candidates.is_empty() {
            return Err(MethodError::NoSuchMethod {
                selector: selector.to_string(),
            });
        }

        let actual: Vec<Type> = std::iter::once(receiver.clone())
            .chain(args.iter().cloned())
            .collect();
        let mut taken = BTreeSet::new();
        for ty in &actual {
            taken.extend(ty.free_params());
        }

        let mut matches = Vec::new();
        for candidate in candidates {
            let fresh = candidate.freshened(&taken);
            let flexible = fresh.params();
            match unify_preferring(&fresh.pattern(), &actual, &Bindings::empty(), &flexible) {
                Ok(bindings) => matches.push((candidate, fresh, bindings)),
                Err(err) => tracing::trace!(signature = %candidate, %err, "overload rejected"),
            }
        }

        if matches.len() > 1 {
            return Err(MethodError::Ambiguous {
                selector: selector.to_string(),
                receiver: receiver.clone(),
                args: args.to_vec(),
                candidates: matches.into_iter().map(|(original, ..)| original).collect(),
            });
        }

        let Some((original, fresh, bindings)) = matches.pop() else {
            return Err(MethodError::NoMatchingOverload {
                selector: selector.to_string(),
                receiver: receiver.clone(),
                args: args.to_vec(),
            });
        };

        let mut caller = Bindings::empty();
        for (name, ty) in bindings.iter().filter(|(name, _)| taken.contains(*name)) {
            caller.insert(name.clone(), bindings.apply(ty));
        }

        let resolved = fresh.resolved(&bindings);
        tracing::debug!(%resolved, "resolved method");
        let signature = if resolved.ret == original.ret {
            original
        } else {
            Arc::new(resolved)
        };
        Ok(Resolved {
            signature,
            bindings: caller,
        })
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("selectors", &self.methods.keys().collect::<Vec<_>>())
            .field("parent", &self.parent.is_some())
            .finish()
    }
}
