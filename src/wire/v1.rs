//! Version 1 of the wire format.
//!
//! Every record carries a `kind` discriminator and the fields of the
//! matching node. Optional fields are omitted when absent:
//!
//! ```json
//! { "kind": "let", "scope": "block", "name": "x",
//!   "type": { "kind": "type", "name": "Int" },
//!   "value": { "kind": "int", "value": 3 } }
//! ```
//!
//! This module is frozen: a change to the format means a new `v2` module and
//! a new arm in [`super::deserialize`].

use serde::{Deserialize, Serialize};

use super::WireError;
use crate::ast::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    ExprList {
        exprs: Vec<Node>,
    },
    If {
        condition: Box<Node>,
        then: Box<Node>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        action: Box<Node>,
    },
    Assign {
        name: String,
        value: Box<Node>,
    },
    Let {
        scope: String,
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<Box<Node>>,
        value: Box<Node>,
    },
    Block {
        args: Vec<Node>,
        body: Box<Node>,
    },
    Arg {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        ty: Option<Box<Node>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<Node>>,
        #[serde(default, skip_serializing_if = "is_false")]
        repeatable: bool,
    },
    Call {
        name: String,
        receiver: Box<Node>,
        args: Vec<Node>,
    },
    Int {
        value: i64,
    },
    Real {
        value: f64,
    },
    String {
        value: String,
    },
    Var {
        name: String,
    },
    Type {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Node>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        repeatable: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        splat: bool,
    },
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::ExprList { .. } => "exprList",
            Node::If { .. } => "if",
            Node::While { .. } => "while",
            Node::Assign { .. } => "assign",
            Node::Let { .. } => "let",
            Node::Block { .. } => "block",
            Node::Arg { .. } => "arg",
            Node::Call { .. } => "call",
            Node::Int { .. } => "int",
            Node::Real { .. } => "real",
            Node::String { .. } => "string",
            Node::Var { .. } => "var",
            Node::Type { .. } => "type",
        }
    }
}

pub fn encode<T>(expr: &Expr<T>) -> Node {
    match expr {
        Expr::ExprList(list) => encode_list(list),
        Expr::If(node) => Node::If {
            condition: Box::new(encode_block(&node.condition)),
            then: Box::new(encode_block(&node.then_block)),
            otherwise: node.else_block.as_ref().map(|b| Box::new(encode_block(b))),
        },
        Expr::While(node) => Node::While {
            condition: Box::new(encode_block(&node.condition)),
            action: Box::new(encode_block(&node.action)),
        },
        Expr::Assign(node) => Node::Assign {
            name: node.name.clone(),
            value: Box::new(encode(&node.value)),
        },
        Expr::Let(node) => Node::Let {
            scope: node.scope.to_string(),
            name: node.name.clone(),
            ty: node.ty.as_ref().map(|ty| Box::new(encode_type(ty))),
            value: Box::new(encode(&node.value)),
        },
        Expr::Call(node) => Node::Call {
            name: node.selector.clone(),
            receiver: Box::new(encode(&node.receiver)),
            args: node.args.iter().map(encode).collect(),
        },
        Expr::Block(block) => encode_block(block),
        Expr::Int(node) => Node::Int { value: node.value },
        Expr::Real(node) => Node::Real { value: node.value },
        Expr::String(node) => Node::String {
            value: node.value.clone(),
        },
        Expr::Var(node) => Node::Var {
            name: node.name.clone(),
        },
    }
}

fn encode_list<T>(list: &ExprList<T>) -> Node {
    Node::ExprList {
        exprs: list.exprs.iter().map(encode).collect(),
    }
}

fn encode_block<T>(block: &Block<T>) -> Node {
    Node::Block {
        args: block.args.iter().map(encode_arg).collect(),
        body: Box::new(encode_list(&block.body)),
    }
}

fn encode_arg<T>(arg: &Arg<T>) -> Node {
    Node::Arg {
        name: arg.name.clone(),
        ty: arg.ty.as_ref().map(|ty| Box::new(encode_type(ty))),
        default: arg.default.as_ref().map(|d| Box::new(encode(d))),
        repeatable: arg.repeatable,
    }
}

fn encode_type<T>(ty: &TypeExpr<T>) -> Node {
    Node::Type {
        name: ty.name.clone(),
        params: ty.params.iter().map(encode_type).collect(),
        optional: ty.optional,
        repeatable: ty.repeatable,
        splat: ty.splat,
    }
}

fn unexpected(expected: &'static str, found: &Node) -> WireError {
    WireError::UnexpectedKind {
        expected,
        found: found.kind(),
    }
}

pub fn decode(node: Node) -> Result<Expr<()>, WireError> {
    Ok(match node {
        Node::ExprList { exprs } => Expr::ExprList(ExprList {
            exprs: decode_all(exprs)?,
            info: (),
        }),
        Node::If {
            condition,
            then,
            otherwise,
        } => Expr::If(If {
            condition: decode_block(*condition)?,
            then_block: decode_block(*then)?,
            else_block: otherwise.map(|b| decode_block(*b)).transpose()?,
            info: (),
        }),
        Node::While { condition, action } => Expr::While(While {
            condition: decode_block(*condition)?,
            action: decode_block(*action)?,
            info: (),
        }),
        Node::Assign { name, value } => Expr::Assign(Assign {
            name,
            value: Box::new(decode(*value)?),
            info: (),
        }),
        Node::Let {
            scope,
            name,
            ty,
            value,
        } => Expr::Let(Let {
            scope: LetScope::parse(&scope),
            name,
            ty: ty.map(|ty| decode_type(*ty)).transpose()?,
            value: Box::new(decode(*value)?),
            info: (),
        }),
        node @ Node::Block { .. } => Expr::Block(std::rc::Rc::new(decode_block(node)?)),
        Node::Call {
            name,
            receiver,
            args,
        } => Expr::Call(Call {
            receiver: Box::new(decode(*receiver)?),
            selector: name,
            args: decode_all(args)?,
            info: (),
        }),
        Node::Int { value } => Expr::Int(Integer { value, info: () }),
        Node::Real { value } => Expr::Real(Real { value, info: () }),
        Node::String { value } => Expr::String(StringLiteral { value, info: () }),
        Node::Var { name } => Expr::Var(Var { name, info: () }),
        other @ (Node::Arg { .. } | Node::Type { .. }) => {
            return Err(unexpected("expression", &other));
        }
    })
}

fn decode_all(nodes: Vec<Node>) -> Result<Vec<Expr<()>>, WireError> {
    nodes.into_iter().map(decode).collect()
}

fn decode_list(node: Node) -> Result<ExprList<()>, WireError> {
    match node {
        Node::ExprList { exprs } => Ok(ExprList {
            exprs: decode_all(exprs)?,
            info: (),
        }),
        other => Err(unexpected("exprList", &other)),
    }
}

fn decode_block(node: Node) -> Result<Block<()>, WireError> {
    match node {
        Node::Block { args, body } => Ok(Block {
            args: args.into_iter().map(decode_arg).collect::<Result<_, _>>()?,
            body: decode_list(*body)?,
            info: (),
        }),
        other => Err(unexpected("block", &other)),
    }
}

fn decode_arg(node: Node) -> Result<Arg<()>, WireError> {
    match node {
        Node::Arg {
            name,
            ty,
            default,
            repeatable,
        } => Ok(Arg {
            name,
            ty: ty.map(|ty| decode_type(*ty)).transpose()?,
            default: default.map(|d| decode(*d).map(Box::new)).transpose()?,
            repeatable,
            info: (),
        }),
        other => Err(unexpected("arg", &other)),
    }
}

fn decode_type(node: Node) -> Result<TypeExpr<()>, WireError> {
    match node {
        Node::Type {
            name,
            params,
            optional,
            repeatable,
            splat,
        } => Ok(TypeExpr {
            name,
            params: params.into_iter().map(decode_type).collect::<Result<_, _>>()?,
            optional,
            repeatable,
            splat,
            info: (),
        }),
        other => Err(unexpected("type", &other)),
    }
}
