use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::analysis::{Annotation, FrameId, StaticValue};
use crate::ast::Block;
use crate::types::Type;

use super::storage::Storage;
use super::{RuntimeError, RuntimeResult};

/// A block evaluated into a callable value.
///
/// `captured` aliases the storage of every frame the block's body reads
/// from, so writes through the closure are visible to its creator and the
/// other way round.
pub struct Closure {
    pub block: Rc<Block<Annotation>>,
    pub captured: HashMap<FrameId, Storage>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut frames: Vec<_> = self.captured.keys().collect();
        frames.sort();
        f.debug_struct("Closure")
            .field("type", &self.block.info.ty)
            .field("captured", &frames)
            .finish()
    }
}

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(Rc<str>),
    Block(Rc<Closure>),
    /// `Some` or the "no value" sentinel.
    Option(Option<Box<Value>>),
    List(Rc<Vec<Value>>),
    Type(Type),
}

impl Value {
    pub fn string(value: &str) -> Self {
        Value::String(Rc::from(value))
    }

    pub fn some(value: Value) -> Self {
        Value::Option(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Option(None)
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(values))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::Block(_) => "Block",
            Value::Option(_) => "Option",
            Value::List(_) => "List",
            Value::Type(_) => "Type",
        }
    }

    fn unexpected(&self, expected: &'static str) -> RuntimeError {
        RuntimeError::UnexpectedValue {
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_bool(&self) -> RuntimeResult<bool> {
        match self {
            Value::Bool(value) => Ok(*value),
            other => Err(other.unexpected("Bool")),
        }
    }

    pub fn as_int(&self) -> RuntimeResult<i64> {
        match self {
            Value::Int(value) => Ok(*value),
            other => Err(other.unexpected("Int")),
        }
    }

    pub fn as_real(&self) -> RuntimeResult<f64> {
        match self {
            Value::Real(value) => Ok(*value),
            other => Err(other.unexpected("Real")),
        }
    }

    pub fn as_str(&self) -> RuntimeResult<&str> {
        match self {
            Value::String(value) => Ok(value),
            other => Err(other.unexpected("String")),
        }
    }

    pub fn as_block(&self) -> RuntimeResult<&Rc<Closure>> {
        match self {
            Value::Block(closure) => Ok(closure),
            other => Err(other.unexpected("Block")),
        }
    }

    pub fn as_option(&self) -> RuntimeResult<Option<&Value>> {
        match self {
            Value::Option(value) => Ok(value.as_deref()),
            other => Err(other.unexpected("Option")),
        }
    }

    pub fn as_list(&self) -> RuntimeResult<&[Value]> {
        match self {
            Value::List(values) => Ok(values),
            other => Err(other.unexpected("List")),
        }
    }

    /// JSON rendering used by the command line `--json` output.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        match self {
            Value::Unit => serde_json::Value::Null,
            Value::Bool(value) => json!(value),
            Value::Int(value) => json!(value),
            Value::Real(value) => json!(value),
            Value::String(value) => json!(&**value),
            Value::Block(closure) => json!({ "block": closure.block.info.ty.to_string() }),
            Value::Option(None) => json!({ "none": null }),
            Value::Option(Some(value)) => json!({ "some": value.to_json() }),
            Value::List(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            Value::Type(ty) => json!({ "type": ty.to_string() }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Block(a), Value::Block(b)) => Rc::ptr_eq(a, b),
            (Value::Option(a), Value::Option(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&StaticValue> for Value {
    fn from(value: &StaticValue) -> Self {
        match value {
            StaticValue::Unit => Value::Unit,
            StaticValue::Bool(value) => Value::Bool(*value),
            StaticValue::Int(value) => Value::Int(*value),
            StaticValue::Real(value) => Value::Real(*value),
            StaticValue::String(value) => Value::string(value),
            StaticValue::Type(ty) => Value::Type(ty.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{:?}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Block(closure) => write!(f, "<{}>", closure.block.info.ty),
            Value::Option(None) => write!(f, "None"),
            Value::Option(Some(value)) => write!(f, "Some({})", value),
            Value::List(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Type(ty) => write!(f, "{}", ty),
        }
    }
}
