//! Double-dispatch traversal over the AST.
//!
//! Each node type implements [`Node::accept`], which calls the matching
//! `visit_*` method. The default `visit_*` methods delegate to the `walk_*`
//! functions below, which define the traversal order: pre-order, left to
//! right over each node's semantic children. A concrete visitor overrides the
//! methods it cares about and calls the corresponding `walk_*` function when
//! it still wants to recurse.

use super::expression::*;

pub trait Visit<T> {
    fn visit_expr(&mut self, expr: &Expr<T>) {
        walk_expr(self, expr)
    }

    fn visit_expr_list(&mut self, node: &ExprList<T>) {
        walk_expr_list(self, node)
    }

    fn visit_if(&mut self, node: &If<T>) {
        walk_if(self, node)
    }

    fn visit_while(&mut self, node: &While<T>) {
        walk_while(self, node)
    }

    fn visit_assign(&mut self, node: &Assign<T>) {
        walk_assign(self, node)
    }

    fn visit_let(&mut self, node: &Let<T>) {
        walk_let(self, node)
    }

    fn visit_call(&mut self, node: &Call<T>) {
        walk_call(self, node)
    }

    fn visit_block(&mut self, node: &Block<T>) {
        walk_block(self, node)
    }

    fn visit_arg(&mut self, node: &Arg<T>) {
        walk_arg(self, node)
    }

    fn visit_type(&mut self, node: &TypeExpr<T>) {
        walk_type(self, node)
    }

    fn visit_int(&mut self, _node: &Integer<T>) {}

    fn visit_real(&mut self, _node: &Real<T>) {}

    fn visit_string(&mut self, _node: &StringLiteral<T>) {}

    fn visit_var(&mut self, _node: &Var<T>) {}
}

/// The single dispatch entry point every node exposes.
pub trait Node<T> {
    fn accept<V: Visit<T> + ?Sized>(&self, visitor: &mut V);
}

macro_rules! impl_node {
    ($($node:ident => $method:ident),* $(,)?) => {
        $(
            impl<T> Node<T> for $node<T> {
                fn accept<V: Visit<T> + ?Sized>(&self, visitor: &mut V) {
                    visitor.$method(self)
                }
            }
        )*
    };
}

impl_node! {
    Expr => visit_expr,
    ExprList => visit_expr_list,
    If => visit_if,
    While => visit_while,
    Assign => visit_assign,
    Let => visit_let,
    Call => visit_call,
    Block => visit_block,
    Arg => visit_arg,
    TypeExpr => visit_type,
    Integer => visit_int,
    Real => visit_real,
    StringLiteral => visit_string,
    Var => visit_var,
}

pub fn walk_expr<T, V: Visit<T> + ?Sized>(visitor: &mut V, expr: &Expr<T>) {
    match expr {
        Expr::ExprList(node) => node.accept(visitor),
        Expr::If(node) => node.accept(visitor),
        Expr::While(node) => node.accept(visitor),
        Expr::Assign(node) => node.accept(visitor),
        Expr::Let(node) => node.accept(visitor),
        Expr::Call(node) => node.accept(visitor),
        Expr::Block(node) => node.as_ref().accept(visitor),
        Expr::Int(node) => node.accept(visitor),
        Expr::Real(node) => node.accept(visitor),
        Expr::String(node) => node.accept(visitor),
        Expr::Var(node) => node.accept(visitor),
    }
}

pub fn walk_expr_list<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &ExprList<T>) {
    for expr in &node.exprs {
        expr.accept(visitor);
    }
}

pub fn walk_if<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &If<T>) {
    node.condition.accept(visitor);
    node.then_block.accept(visitor);
    if let Some(else_block) = &node.else_block {
        else_block.accept(visitor);
    }
}

pub fn walk_while<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &While<T>) {
    node.condition.accept(visitor);
    node.action.accept(visitor);
}

pub fn walk_assign<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &Assign<T>) {
    node.value.accept(visitor);
}

pub fn walk_let<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &Let<T>) {
    if let Some(ty) = &node.ty {
        ty.accept(visitor);
    }
    node.value.accept(visitor);
}

pub fn walk_call<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &Call<T>) {
    node.receiver.accept(visitor);
    for arg in &node.args {
        arg.accept(visitor);
    }
}

pub fn walk_block<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &Block<T>) {
    for arg in &node.args {
        arg.accept(visitor);
    }
    node.body.accept(visitor);
}

pub fn walk_arg<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &Arg<T>) {
    if let Some(ty) = &node.ty {
        ty.accept(visitor);
    }
    if let Some(default) = &node.default {
        default.accept(visitor);
    }
}

pub fn walk_type<T, V: Visit<T> + ?Sized>(visitor: &mut V, node: &TypeExpr<T>) {
    for param in &node.params {
        param.accept(visitor);
    }
}
