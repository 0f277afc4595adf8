use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use super::annotation::{Annotation, Resolution, ScopeInfo, SlotRef};
use super::error::AnalysisError;
use super::symbols::{Entry, Lookup, ResolutionError, ScopeKind, StaticValue, SymbolTable};
use crate::ast::*;
use crate::methods::{MethodRegistry, Resolved};
use crate::types::ty::PARAM_PREFIX;
use crate::types::{Bindings, Name, Type, unify_with};

type Result<T> = std::result::Result<T, AnalysisError>;

/// Analyze `expr` against `symbols` and `methods`.
///
/// Declarations made at the top level of `expr` stay in `symbols`, so a
/// later program analyzed against the same table sees them at the same slots.
pub fn analyze(
    expr: &Expr<()>,
    symbols: &mut SymbolTable,
    methods: &MethodRegistry,
) -> Result<Expr<Annotation>> {
    Analyzer::new(symbols, methods).analyze(expr)
}

/// Single-pass checker turning `Expr<()>` into `Expr<Annotation>`.
///
/// Bindings produced by unification (e.g. `let x: 'A = 3` binding `'A` to
/// `Int`) accumulate for the lifetime of the analyzer and are applied to every
/// type read back from the symbol table afterwards.
pub struct Analyzer<'a> {
    symbols: &'a mut SymbolTable,
    methods: &'a MethodRegistry,
    bindings: Bindings,
    next_param: usize,
}

impl<'a> Analyzer<'a> {
    pub fn new(symbols: &'a mut SymbolTable, methods: &'a MethodRegistry) -> Self {
        Analyzer {
            symbols,
            methods,
            bindings: Bindings::empty(),
            next_param: 0,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    #[tracing::instrument(skip_all, fields(kind = expr.kind()))]
    pub fn analyze(&mut self, expr: &Expr<()>) -> Result<Expr<Annotation>> {
        let analyzed = self.analyze_expr(expr)?;
        tracing::debug!(ty = %analyzed.info().ty, "analysis finished");
        Ok(analyzed)
    }

    fn fresh_name(&mut self) -> Name {
        let id = self.next_param;
        self.next_param += 1;
        Name::from(format!("{}_{}", PARAM_PREFIX, id))
    }

    fn fresh_param(&mut self) -> Type {
        Type::Param(self.fresh_name())
    }

    fn analyze_expr(&mut self, expr: &Expr<()>) -> Result<Expr<Annotation>> {
        match expr {
            Expr::ExprList(list) => Ok(Expr::ExprList(self.analyze_expr_list(list)?)),
            Expr::If(node) => self.analyze_if(node).map(Expr::If),
            Expr::While(node) => self.analyze_while(node).map(Expr::While),
            Expr::Assign(node) => self.analyze_assign(node).map(Expr::Assign),
            Expr::Let(node) => self.analyze_let(node).map(Expr::Let),
            Expr::Call(node) => self.analyze_call(node).map(Expr::Call),
            Expr::Block(node) => Ok(Expr::Block(Rc::new(self.analyze_block(node)?))),
            Expr::Int(node) => Ok(Expr::Int(Integer {
                value: node.value,
                info: Annotation::typed(Type::int()),
            })),
            Expr::Real(node) => Ok(Expr::Real(Real {
                value: node.value,
                info: Annotation::typed(Type::real()),
            })),
            Expr::String(node) => Ok(Expr::String(StringLiteral {
                value: node.value.clone(),
                info: Annotation::typed(Type::string()),
            })),
            Expr::Var(node) => self.analyze_var(node).map(Expr::Var),
        }
    }

    fn analyze_expr_list(&mut self, list: &ExprList<()>) -> Result<ExprList<Annotation>> {
        let exprs = list
            .exprs
            .iter()
            .map(|expr| self.analyze_expr(expr))
            .collect::<Result<Vec<_>>>()?;
        let ty = exprs
            .last()
            .map(|last| last.info().ty.clone())
            .unwrap_or_else(Type::unit);
        Ok(ExprList {
            exprs,
            info: Annotation::typed(ty),
        })
    }

    fn analyze_var(&mut self, node: &Var<()>) -> Result<Var<Annotation>> {
        let Lookup { frame, entry } = self.symbols.at(&node.name)?;
        let info = match entry {
            Entry::Slot { ty, slot } => Annotation::resolved(
                self.bindings.apply(&ty),
                Resolution::Slot(SlotRef { frame, slot }),
            ),
            Entry::Static { ty, value } => Annotation::resolved(ty, Resolution::Static(value)),
        };
        Ok(Var {
            name: node.name.clone(),
            info,
        })
    }

    fn analyze_let(&mut self, node: &Let<()>) -> Result<Let<Annotation>> {
        let value = self.analyze_expr(&node.value)?;
        let value_ty = value.info().ty.clone();

        let (ty_node, ty) = match &node.ty {
            None => (None, value_ty),
            Some(annotation) => {
                let annotation = self.analyze_type(annotation)?;
                let ty = self.unify_declared(&node.name, &annotation.info.ty, &value_ty)?;
                (Some(annotation), ty)
            }
        };

        let frame = match &node.scope {
            LetScope::Block => self.symbols.current(),
            LetScope::Named(kind) => {
                let frame = self.symbols.enclosing(kind)?;
                self.symbols.capture(frame);
                frame
            }
        };
        let slot = self.symbols.allocate_slot_in(frame, &node.name, ty.clone())?;

        Ok(Let {
            scope: node.scope.clone(),
            name: node.name.clone(),
            ty: ty_node,
            value: Box::new(value),
            info: Annotation::resolved(ty, Resolution::Slot(SlotRef { frame, slot })),
        })
    }

    /// Unify an annotation with the type of the value it annotates.
    fn unify_declared(&mut self, name: &str, declared: &Type, found: &Type) -> Result<Type> {
        self.bindings = unify_with(
            std::slice::from_ref(declared),
            std::slice::from_ref(found),
            &self.bindings,
        )
        .map_err(|source| AnalysisError::AnnotationMismatch {
            name: name.to_string(),
            source,
        })?;
        Ok(self.bindings.apply(declared))
    }

    fn analyze_assign(&mut self, node: &Assign<()>) -> Result<Assign<Annotation>> {
        let value = self.analyze_expr(&node.value)?;

        let Lookup { frame, entry } = self.symbols.at(&node.name).map_err(|err| match err {
            ResolutionError::UnresolvedIdentifier { name } => {
                AnalysisError::IdentifierNotFound { name }
            }
            other => other.into(),
        })?;

        let (declared, slot) = match entry {
            Entry::Slot { ty, slot } => (ty, slot),
            Entry::Static { .. } => {
                return Err(AnalysisError::AssignToStatic {
                    name: node.name.clone(),
                });
            }
        };

        self.bindings = unify_with(
            std::slice::from_ref(&declared),
            std::slice::from_ref(&value.info().ty),
            &self.bindings,
        )
        .map_err(|source| AnalysisError::IncompatibleAssignment {
            name: node.name.clone(),
            source,
        })?;
        let ty = self.bindings.apply(&declared);

        Ok(Assign {
            name: node.name.clone(),
            value: Box::new(value),
            info: Annotation::resolved(ty, Resolution::Slot(SlotRef { frame, slot })),
        })
    }

    fn analyze_call(&mut self, node: &Call<()>) -> Result<Call<Annotation>> {
        let receiver = self.analyze_expr(&node.receiver)?;
        let args = node
            .args
            .iter()
            .map(|arg| self.analyze_expr(arg))
            .collect::<Result<Vec<_>>>()?;

        let receiver_ty = self.bindings.apply(&receiver.info().ty);
        let arg_types = args
            .iter()
            .map(|arg| self.bindings.apply(&arg.info().ty))
            .collect::<Vec<_>>();
        let Resolved {
            signature,
            bindings,
        } = self
            .methods
            .resolve(&receiver_ty, &node.selector, &arg_types)?;
        tracing::debug!(selector = %node.selector, %signature, "call resolved");

        let mut taken = receiver_ty.free_params();
        for ty in &arg_types {
            taken.extend(ty.free_params());
        }
        let ret = self.absorb(&taken, bindings, &signature.ret);
        Ok(Call {
            receiver: Box::new(receiver),
            selector: node.selector.clone(),
            args,
            info: Annotation::resolved(ret, Resolution::Method(signature)),
        })
    }

    /// Fold the bindings a call produced for the parameters in `taken` into
    /// the analyzer's own.
    ///
    /// Signature parameters left free in the bindings or in `ret` are renamed
    /// to fresh analyzer parameters so separate calls never share them.
    /// Returns `ret` with everything known applied.
    fn absorb(&mut self, taken: &BTreeSet<Name>, bindings: Bindings, ret: &Type) -> Type {
        let mut leftover = ret.free_params();
        for (_, ty) in bindings.iter() {
            leftover.extend(ty.free_params());
        }
        leftover.retain(|name| !taken.contains(name));

        let renames: HashMap<Name, Name> = leftover
            .into_iter()
            .map(|name| (name, self.fresh_name()))
            .collect();
        let rename = |name: &Name| renames.get(name).cloned();

        for (name, ty) in bindings.iter() {
            self.bindings.insert(name.clone(), ty.rename_params(&rename));
        }
        self.bindings.apply(&ret.rename_params(&rename))
    }

    /// Analyze a block in a fresh frame. Its type is `Block(ret, args...)`.
    fn analyze_block(&mut self, node: &Block<()>) -> Result<Block<Annotation>> {
        let frame = self.symbols.push(ScopeKind::Block);
        let analyzed = self.analyze_block_contents(node);
        self.symbols.pop()?;
        let (args, body) = analyzed?;

        let arg_types = args
            .iter()
            .map(|arg| {
                if arg.repeatable {
                    Type::repeatable(arg.info.ty.clone())
                } else {
                    arg.info.ty.clone()
                }
            })
            .collect();
        let ty = self
            .bindings
            .apply(&Type::block(body.info.ty.clone(), arg_types));

        let scope = ScopeInfo {
            frame,
            slots: self.symbols.slot_count(frame),
            captures: self.symbols.captures(frame),
        };
        tracing::trace!(%frame, captures = ?scope.captures, "block analyzed");

        Ok(Block {
            args,
            body,
            info: Annotation::resolved(ty, Resolution::Scope(scope)),
        })
    }

    fn analyze_block_contents(
        &mut self,
        node: &Block<()>,
    ) -> Result<(Vec<Arg<Annotation>>, ExprList<Annotation>)> {
        let args = node
            .args
            .iter()
            .map(|arg| self.analyze_arg(arg))
            .collect::<Result<Vec<_>>>()?;
        let body = self.analyze_expr_list(&node.body)?;
        Ok((args, body))
    }

    fn analyze_arg(&mut self, node: &Arg<()>) -> Result<Arg<Annotation>> {
        let default = node
            .default
            .as_ref()
            .map(|default| self.analyze_expr(default).map(Box::new))
            .transpose()?;
        let ty_node = node
            .ty
            .as_ref()
            .map(|ty| self.analyze_type(ty))
            .transpose()?;

        let ty = match (&ty_node, &default) {
            (Some(declared), None) => declared.info.ty.clone(),
            (None, Some(default)) => default.info().ty.clone(),
            (Some(declared), Some(default)) => {
                let found = default.info().ty.clone();
                self.unify_declared(&node.name, &declared.info.ty, &found)?
            }
            (None, None) => self.fresh_param(),
        };
        let ty = match ty {
            Type::Repeatable(inner) if node.repeatable => *inner,
            other => other,
        };

        let local_ty = if node.repeatable {
            Type::list(ty.clone())
        } else {
            ty.clone()
        };
        let frame = self.symbols.current();
        let slot = self.symbols.allocate_slot(&node.name, local_ty);

        Ok(Arg {
            name: node.name.clone(),
            ty: ty_node,
            default,
            repeatable: node.repeatable,
            info: Annotation::resolved(ty, Resolution::Slot(SlotRef { frame, slot })),
        })
    }

    fn analyze_control_block(
        &mut self,
        construct: &'static str,
        node: &Block<()>,
    ) -> Result<Block<Annotation>> {
        if !node.args.is_empty() {
            return Err(AnalysisError::ControlBlockArgs { construct });
        }
        self.analyze_block(node)
    }

    fn expect_condition(&mut self, condition: &Block<Annotation>) -> Result<()> {
        let found = &condition.body.info.ty;
        match unify_with(
            &[Type::bool()],
            std::slice::from_ref(found),
            &self.bindings,
        ) {
            Ok(bindings) => {
                self.bindings = bindings;
                Ok(())
            }
            Err(_) => Err(AnalysisError::ConditionNotBool {
                expected: Type::block(Type::bool(), vec![]),
                found: condition.info.ty.clone(),
            }),
        }
    }

    fn analyze_if(&mut self, node: &If<()>) -> Result<If<Annotation>> {
        let condition = self.analyze_control_block("if", &node.condition)?;
        self.expect_condition(&condition)?;
        let then_block = self.analyze_control_block("if", &node.then_block)?;
        let else_block = node
            .else_block
            .as_ref()
            .map(|block| self.analyze_control_block("if", block))
            .transpose()?;

        let then_ty = then_block.body.info.ty.clone();
        let ty = match &else_block {
            None => Type::option(then_ty),
            Some(else_block) => {
                let else_ty = else_block.body.info.ty.clone();
                self.bindings = unify_with(
                    std::slice::from_ref(&then_ty),
                    std::slice::from_ref(&else_ty),
                    &self.bindings,
                )
                .map_err(|source| AnalysisError::BranchMismatch {
                    then: then_ty.clone(),
                    otherwise: else_ty.clone(),
                    source,
                })?;
                self.bindings.apply(&then_ty)
            }
        };

        Ok(If {
            condition,
            then_block,
            else_block,
            info: Annotation::typed(ty),
        })
    }

    fn analyze_while(&mut self, node: &While<()>) -> Result<While<Annotation>> {
        let condition = self.analyze_control_block("while", &node.condition)?;
        self.expect_condition(&condition)?;
        let action = self.analyze_control_block("while", &node.action)?;
        let ty = Type::option(action.body.info.ty.clone());

        Ok(While {
            condition,
            action,
            info: Annotation::typed(ty),
        })
    }

    /// Resolve a type expression to the type it denotes.
    ///
    /// Names starting with `'` are type parameters; every other name must be
    /// a static binding holding a type, which is how `Int` and friends reach
    /// the analyzer.
    fn analyze_type(&mut self, node: &TypeExpr<()>) -> Result<TypeExpr<Annotation>> {
        let params = node
            .params
            .iter()
            .map(|param| self.analyze_type(param))
            .collect::<Result<Vec<_>>>()?;

        let base = if node.name.starts_with(PARAM_PREFIX) {
            if node.splat {
                Type::splat(&node.name)
            } else {
                Type::param(&node.name)
            }
        } else if node.splat {
            return Err(AnalysisError::InvalidSplat {
                name: node.name.clone(),
            });
        } else {
            match self.symbols.at(&node.name)?.entry {
                Entry::Static {
                    value: StaticValue::Type(ty),
                    ..
                } => ty,
                _ => {
                    return Err(AnalysisError::NotAType {
                        name: node.name.clone(),
                    });
                }
            }
        };

        let mut ty = if params.is_empty() {
            base
        } else {
            Type::compound(base, params.iter().map(|p| p.info.ty.clone()).collect())
        };
        if node.optional {
            ty = Type::option(ty);
        }
        if node.repeatable {
            ty = Type::repeatable(ty);
        }

        Ok(TypeExpr {
            name: node.name.clone(),
            params,
            optional: node.optional,
            repeatable: node.repeatable,
            splat: node.splat,
            info: Annotation::typed(ty),
        })
    }
}
