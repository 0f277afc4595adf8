use std::collections::HashMap;
use std::rc::Rc;

use crate::analysis::{Annotation, Resolution, SlotRef};
use crate::ast::*;

use super::storage::Storage;
use super::value::{Closure, Value};
use super::{Interpreter, Invocation, RuntimeError, RuntimeResult};

impl<'h> Interpreter<'h> {
    pub(super) fn eval(&mut self, expr: &Expr<Annotation>) -> RuntimeResult<Value> {
        match expr {
            Expr::ExprList(list) => self.eval_list(list),
            Expr::If(node) => self.eval_if(node),
            Expr::While(node) => self.eval_while(node),
            Expr::Assign(node) => {
                let value = self.eval(&node.value)?;
                self.store(node.info.slot()?, value.clone());
                Ok(value)
            }
            Expr::Let(node) => {
                let value = self.eval(&node.value)?;
                self.store(node.info.slot()?, value.clone());
                Ok(value)
            }
            Expr::Call(node) => self.eval_call(node),
            Expr::Block(block) => self.make_closure(block),
            Expr::Int(node) => Ok(Value::Int(node.value)),
            Expr::Real(node) => Ok(Value::Real(node.value)),
            Expr::String(node) => Ok(Value::string(&node.value)),
            Expr::Var(node) => match &node.info.resolution {
                Resolution::Static(value) => Ok(Value::from(value)),
                _ => self.load(node.info.slot()?),
            },
        }
    }

    fn eval_list(&mut self, list: &ExprList<Annotation>) -> RuntimeResult<Value> {
        let mut last = Value::Unit;
        for expr in &list.exprs {
            last = self.eval(expr)?;
        }
        Ok(last)
    }

    fn store(&mut self, target: SlotRef, value: Value) {
        self.frames
            .entry(target.frame)
            .or_default()
            .set(target.slot, value);
    }

    fn load(&self, target: SlotRef) -> RuntimeResult<Value> {
        self.frames
            .get(&target.frame)
            .and_then(|storage| storage.get(target.slot))
            .ok_or(RuntimeError::UninitializedSlot {
                frame: target.frame,
                slot: target.slot,
            })
    }

    fn make_closure(&mut self, block: &Rc<Block<Annotation>>) -> RuntimeResult<Value> {
        let scope = block.info.scope()?;
        let captured = scope
            .captures
            .iter()
            .map(|frame| (*frame, self.frames.entry(*frame).or_default().clone()))
            .collect();
        Ok(Value::Block(Rc::new(Closure {
            block: block.clone(),
            captured,
        })))
    }

    /// Run a control block in place with fresh storage for its frame.
    fn run_inline(&mut self, block: &Block<Annotation>) -> RuntimeResult<Value> {
        let scope = block.info.scope()?;
        let previous = self
            .frames
            .insert(scope.frame, Storage::with_capacity(scope.slots));
        let result = self.eval_list(&block.body);
        match previous {
            Some(storage) => self.frames.insert(scope.frame, storage),
            None => self.frames.remove(&scope.frame),
        };
        result
    }

    fn eval_if(&mut self, node: &If<Annotation>) -> RuntimeResult<Value> {
        let condition = self.run_inline(&node.condition)?.as_bool()?;
        match (&node.else_block, condition) {
            (Some(_), true) => self.run_inline(&node.then_block),
            (Some(else_block), false) => self.run_inline(else_block),
            (None, true) => Ok(Value::some(self.run_inline(&node.then_block)?)),
            (None, false) => Ok(Value::none()),
        }
    }

    fn eval_while(&mut self, node: &While<Annotation>) -> RuntimeResult<Value> {
        let mut last = None;
        while self.run_inline(&node.condition)?.as_bool()? {
            last = Some(self.run_inline(&node.action)?);
        }
        Ok(Value::Option(last.map(Box::new)))
    }

    fn eval_call(&mut self, node: &Call<Annotation>) -> RuntimeResult<Value> {
        let signature = node.info.method()?.clone();
        let receiver = self.eval(&node.receiver)?;
        let args = node
            .args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<RuntimeResult<Vec<_>>>()?;

        tracing::trace!(selector = %node.selector, %receiver, "call");
        let mut invocation = Invocation {
            receiver,
            selector: &node.selector,
            interpreter: self,
        };
        signature.invoke(&mut invocation, args)
    }

    /// Call a closure with already evaluated arguments.
    ///
    /// Missing trailing arguments take their defaults, evaluated in the
    /// callee frame after the preceding arguments are bound. A repeatable
    /// argument collects every value not needed by the arguments after it.
    pub fn call_block(&mut self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        let block = &closure.block;
        let scope = block.info.scope()?;
        tracing::trace!(frame = %scope.frame, args = args.len(), "call block");

        let mut frames: HashMap<_, _> = closure.captured.clone();
        frames.insert(scope.frame, Storage::with_capacity(scope.slots));
        let saved = std::mem::replace(&mut self.frames, frames);
        let result = self.bind_and_run(block, args);
        self.frames = saved;
        result
    }

    fn bind_and_run(&mut self, block: &Block<Annotation>, args: Vec<Value>) -> RuntimeResult<Value> {
        let declared = block.args.len();
        let has_repeatable = block.args.iter().any(|arg| arg.repeatable);
        if !has_repeatable && args.len() > declared {
            return Err(RuntimeError::TooManyArguments {
                expected: declared,
                found: args.len(),
            });
        }

        let mut values = args.into_iter();
        for (index, arg) in block.args.iter().enumerate() {
            let value = if arg.repeatable {
                let later = declared - index - 1;
                let take = values.len().saturating_sub(later);
                Value::list(values.by_ref().take(take).collect())
            } else if let Some(value) = values.next() {
                value
            } else if let Some(default) = &arg.default {
                self.eval(default)?
            } else {
                return Err(RuntimeError::MissingArgument {
                    name: arg.name.clone(),
                });
            };
            self.store(arg.info.slot()?, value);
        }

        self.eval_list(&block.body)
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::{Annotation, Resolution, UsageError};
    use crate::ast::*;
    use crate::interpreter::{Interpreter, RuntimeError, Value};
    use crate::types::Type;

    #[test]
    fn test_hand_built_tree_without_resolution_is_usage_error() {
        let program: Expr<Annotation> = Expr::Var(Var {
            name: "x".to_string(),
            info: Annotation::typed(Type::int()),
        });
        let err = Interpreter::new().run(&program).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Usage(UsageError::UnexpectedResolution { expected: "slot", .. })
        ));
    }

    #[test]
    fn test_literals_evaluate_to_themselves() {
        let program: Expr<Annotation> = Expr::ExprList(ExprList {
            exprs: vec![
                Expr::Int(Integer {
                    value: 4,
                    info: Annotation::typed(Type::int()),
                }),
                Expr::String(StringLiteral {
                    value: "four".to_string(),
                    info: Annotation::typed(Type::string()),
                }),
            ],
            info: Annotation::resolved(Type::string(), Resolution::None),
        });
        assert_eq!(Interpreter::new().run(&program).unwrap(), Value::string("four"));
    }
}
