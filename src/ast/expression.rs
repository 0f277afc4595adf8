use std::fmt;
use std::rc::Rc;

/// A Gnomish expression.
///
/// Every node carries an `info: T` payload. Trees fresh from the host parser
/// or the wire deserializer are `Expr<()>`; the analyzer produces
/// `Expr<Annotation>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<T> {
    ExprList(ExprList<T>),
    If(If<T>),
    While(While<T>),
    Assign(Assign<T>),
    Let(Let<T>),
    Call(Call<T>),
    Block(Rc<Block<T>>),
    Int(Integer<T>),
    Real(Real<T>),
    String(StringLiteral<T>),
    Var(Var<T>),
}

/// Ordered sequence of expressions; evaluates to its last element.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprList<T> {
    pub exprs: Vec<Expr<T>>,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If<T> {
    pub condition: Block<T>,
    pub then_block: Block<T>,
    pub else_block: Option<Block<T>>,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While<T> {
    pub condition: Block<T>,
    pub action: Block<T>,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign<T> {
    pub name: String,
    pub value: Box<Expr<T>>,
    pub info: T,
}

/// Where a `let` places its binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LetScope {
    /// The innermost frame.
    Block,
    /// The nearest enclosing frame of the named scope kind, e.g. `game`.
    Named(String),
}

impl LetScope {
    pub fn parse(name: &str) -> Self {
        match name {
            "block" => LetScope::Block,
            other => LetScope::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LetScope::Block => "block",
            LetScope::Named(name) => name,
        }
    }
}

impl fmt::Display for LetScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Let<T> {
    pub scope: LetScope,
    pub name: String,
    pub ty: Option<TypeExpr<T>>,
    pub value: Box<Expr<T>>,
    pub info: T,
}

/// Method call `receiver.selector(args...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call<T> {
    pub receiver: Box<Expr<T>>,
    pub selector: String,
    pub args: Vec<Expr<T>>,
    pub info: T,
}

/// A closure literal. Also used, without arguments, for the condition and
/// branches of `if` and `while`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    pub args: Vec<Arg<T>>,
    pub body: ExprList<T>,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg<T> {
    pub name: String,
    pub ty: Option<TypeExpr<T>>,
    pub default: Option<Box<Expr<T>>>,
    pub repeatable: bool,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Integer<T> {
    pub value: i64,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Real<T> {
    pub value: f64,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral<T> {
    pub value: String,
    pub info: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Var<T> {
    pub name: String,
    pub info: T,
}

/// A type expression such as `Block('R, *'A)` or `Int?`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr<T> {
    pub name: String,
    pub params: Vec<TypeExpr<T>>,
    pub optional: bool,
    pub repeatable: bool,
    pub splat: bool,
    pub info: T,
}

impl<T> Expr<T> {
    pub fn info(&self) -> &T {
        match self {
            Expr::ExprList(n) => &n.info,
            Expr::If(n) => &n.info,
            Expr::While(n) => &n.info,
            Expr::Assign(n) => &n.info,
            Expr::Let(n) => &n.info,
            Expr::Call(n) => &n.info,
            Expr::Block(n) => &n.info,
            Expr::Int(n) => &n.info,
            Expr::Real(n) => &n.info,
            Expr::String(n) => &n.info,
            Expr::Var(n) => &n.info,
        }
    }

    /// The wire-format discriminator of this node.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::ExprList(_) => "exprList",
            Expr::If(_) => "if",
            Expr::While(_) => "while",
            Expr::Assign(_) => "assign",
            Expr::Let(_) => "let",
            Expr::Call(_) => "call",
            Expr::Block(_) => "block",
            Expr::Int(_) => "int",
            Expr::Real(_) => "real",
            Expr::String(_) => "string",
            Expr::Var(_) => "var",
        }
    }
}

// Constructors for unanalyzed trees, used by hosts and tests.

impl Expr<()> {
    pub fn int(value: i64) -> Self {
        Expr::Int(Integer { value, info: () })
    }

    pub fn real(value: f64) -> Self {
        Expr::Real(Real { value, info: () })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(StringLiteral {
            value: value.into(),
            info: (),
        })
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(Var {
            name: name.into(),
            info: (),
        })
    }

    pub fn list(exprs: Vec<Expr<()>>) -> Self {
        Expr::ExprList(ExprList::new(exprs))
    }

    pub fn let_(name: impl Into<String>, value: Expr<()>) -> Self {
        Expr::Let(Let {
            scope: LetScope::Block,
            name: name.into(),
            ty: None,
            value: Box::new(value),
            info: (),
        })
    }

    pub fn let_typed(name: impl Into<String>, ty: TypeExpr<()>, value: Expr<()>) -> Self {
        Expr::Let(Let {
            scope: LetScope::Block,
            name: name.into(),
            ty: Some(ty),
            value: Box::new(value),
            info: (),
        })
    }

    pub fn let_in(scope: LetScope, name: impl Into<String>, value: Expr<()>) -> Self {
        Expr::Let(Let {
            scope,
            name: name.into(),
            ty: None,
            value: Box::new(value),
            info: (),
        })
    }

    pub fn assign(name: impl Into<String>, value: Expr<()>) -> Self {
        Expr::Assign(Assign {
            name: name.into(),
            value: Box::new(value),
            info: (),
        })
    }

    pub fn call(receiver: Expr<()>, selector: impl Into<String>, args: Vec<Expr<()>>) -> Self {
        Expr::Call(Call {
            receiver: Box::new(receiver),
            selector: selector.into(),
            args,
            info: (),
        })
    }

    pub fn block(args: Vec<Arg<()>>, body: Vec<Expr<()>>) -> Self {
        Expr::Block(Rc::new(Block::new(args, body)))
    }

    pub fn if_(condition: Vec<Expr<()>>, then: Vec<Expr<()>>, otherwise: Option<Vec<Expr<()>>>) -> Self {
        Expr::If(If {
            condition: Block::new(vec![], condition),
            then_block: Block::new(vec![], then),
            else_block: otherwise.map(|body| Block::new(vec![], body)),
            info: (),
        })
    }

    pub fn while_(condition: Vec<Expr<()>>, action: Vec<Expr<()>>) -> Self {
        Expr::While(While {
            condition: Block::new(vec![], condition),
            action: Block::new(vec![], action),
            info: (),
        })
    }
}

impl ExprList<()> {
    pub fn new(exprs: Vec<Expr<()>>) -> Self {
        ExprList { exprs, info: () }
    }
}

impl Block<()> {
    pub fn new(args: Vec<Arg<()>>, body: Vec<Expr<()>>) -> Self {
        Block {
            args,
            body: ExprList::new(body),
            info: (),
        }
    }
}

impl Arg<()> {
    pub fn new(name: impl Into<String>) -> Self {
        Arg {
            name: name.into(),
            ty: None,
            default: None,
            repeatable: false,
            info: (),
        }
    }

    pub fn typed(name: impl Into<String>, ty: TypeExpr<()>) -> Self {
        Arg {
            ty: Some(ty),
            ..Arg::new(name)
        }
    }

    pub fn with_default(mut self, default: Expr<()>) -> Self {
        self.default = Some(Box::new(default));
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

impl TypeExpr<()> {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr {
            name: name.into(),
            params: vec![],
            optional: false,
            repeatable: false,
            splat: false,
            info: (),
        }
    }

    pub fn applied(name: impl Into<String>, params: Vec<TypeExpr<()>>) -> Self {
        TypeExpr {
            params,
            ..TypeExpr::named(name)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn splatted(mut self) -> Self {
        self.splat = true;
        self
    }
}
