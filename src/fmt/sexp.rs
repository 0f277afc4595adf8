//! S-expression rendering of Gnomish trees.
//!
//! The rendering ignores node annotations, so an analyzed tree and the
//! unanalyzed tree it came from print identically. Round-trip tests for the
//! wire format compare these renderings.
//!
//! ```text
//! (exprList (let block x (type Int) (int 3)) (call + (var x) (int 1)))
//! ```

use std::fmt::{self, Display, Write};

use crate::ast::visit::{self, Node, Visit};
use crate::ast::*;

struct Formatter {
    buffer: String,
}

impl Formatter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn separate(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with('(') {
            self.buffer.push(' ');
        }
    }

    fn open(&mut self, kind: &str) {
        self.separate();
        self.buffer.push('(');
        self.buffer.push_str(kind);
    }

    fn atom(&mut self, text: impl Display) {
        self.separate();
        // Writing into a String cannot fail.
        let _ = write!(self.buffer, "{}", text);
    }

    fn close(&mut self) {
        self.buffer.push(')');
    }

    fn finish(self) -> String {
        self.buffer
    }
}

impl<T> Visit<T> for Formatter {
    fn visit_expr_list(&mut self, node: &ExprList<T>) {
        self.open("exprList");
        visit::walk_expr_list(self, node);
        self.close();
    }

    fn visit_if(&mut self, node: &If<T>) {
        self.open("if");
        visit::walk_if(self, node);
        self.close();
    }

    fn visit_while(&mut self, node: &While<T>) {
        self.open("while");
        visit::walk_while(self, node);
        self.close();
    }

    fn visit_assign(&mut self, node: &Assign<T>) {
        self.open("assign");
        self.atom(&node.name);
        visit::walk_assign(self, node);
        self.close();
    }

    fn visit_let(&mut self, node: &Let<T>) {
        self.open("let");
        self.atom(&node.scope);
        self.atom(&node.name);
        visit::walk_let(self, node);
        self.close();
    }

    fn visit_call(&mut self, node: &Call<T>) {
        self.open("call");
        self.atom(&node.selector);
        visit::walk_call(self, node);
        self.close();
    }

    fn visit_block(&mut self, node: &Block<T>) {
        self.open("block");
        visit::walk_block(self, node);
        self.close();
    }

    fn visit_arg(&mut self, node: &Arg<T>) {
        self.open("arg");
        self.atom(&node.name);
        if let Some(ty) = &node.ty {
            ty.accept(self);
        }
        if let Some(default) = &node.default {
            self.open("default");
            default.accept(self);
            self.close();
        }
        if node.repeatable {
            self.atom("repeatable");
        }
        self.close();
    }

    fn visit_type(&mut self, node: &TypeExpr<T>) {
        self.open("type");
        self.atom(&node.name);
        visit::walk_type(self, node);
        if node.optional {
            self.atom("optional");
        }
        if node.repeatable {
            self.atom("repeatable");
        }
        if node.splat {
            self.atom("splat");
        }
        self.close();
    }

    fn visit_int(&mut self, node: &Integer<T>) {
        self.open("int");
        self.atom(node.value);
        self.close();
    }

    fn visit_real(&mut self, node: &Real<T>) {
        self.open("real");
        self.atom(format!("{:?}", node.value));
        self.close();
    }

    fn visit_string(&mut self, node: &StringLiteral<T>) {
        self.open("string");
        self.atom(format!("{:?}", node.value));
        self.close();
    }

    fn visit_var(&mut self, node: &Var<T>) {
        self.open("var");
        self.atom(&node.name);
        self.close();
    }
}

/// Render any node as an S-expression.
pub fn to_sexp<T, N: Node<T>>(node: &N) -> String {
    let mut formatter = Formatter::new();
    node.accept(&mut formatter);
    formatter.finish()
}

impl<T> Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_sexp(self))
    }
}
