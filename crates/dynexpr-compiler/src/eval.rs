//! Tree-walking evaluation of compiled expressions.
//!
//! A [`CompiledExpr`] owns the typed tree, the declared parameter types,
//! and the total slot count. Invocation fills a flat slot environment
//! with the arguments and walks the tree. Lambda nodes close over a
//! snapshot of the environment at the point they are evaluated, so a
//! function value handed back to the host keeps the outer parameter
//! values it saw.

use std::cmp::Ordering;
use std::sync::Arc;

use dynexpr_core::arith;
use dynexpr_core::{
    BinaryKind, EvalError, FuncValue, IndexAccess, Ir, RecordValue, Ty, UnaryKind, Value,
};

use crate::conversion;

/// An expression compiled to its typed tree, ready to invoke.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    ir: Ir,
    params: Vec<Ty>,
    slots: usize,
}

impl CompiledExpr {
    pub(crate) fn new(ir: Ir, params: Vec<Ty>, slots: usize) -> Self {
        CompiledExpr { ir, params, slots }
    }

    /// Declared parameter types, in invocation order.
    pub fn param_tys(&self) -> &[Ty] {
        &self.params
    }

    /// Static result type.
    pub fn ty(&self) -> Ty {
        self.ir.ty()
    }

    /// The compiled tree.
    pub fn ir(&self) -> &Ir {
        &self.ir
    }

    /// Evaluate with one value per declared parameter.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() != self.params.len() {
            return Err(EvalError::ArgumentCount {
                expected: self.params.len(),
                got: args.len(),
            });
        }
        // parameters occupy the first slots; lambda frames use the rest
        let mut env = vec![Value::Null; self.slots];
        for (cell, arg) in env.iter_mut().zip(args) {
            *cell = arg.clone();
        }
        eval(&self.ir, &mut env)
    }

    /// Evaluate and convert the result into a host type.
    pub fn result<T>(&self, args: &[Value]) -> Result<T, EvalError>
    where
        T: TryFrom<Value, Error = EvalError>,
    {
        T::try_from(self.invoke(args)?)
    }
}

fn eval(ir: &Ir, env: &mut [Value]) -> Result<Value, EvalError> {
    match ir {
        Ir::Constant { value, .. } => Ok(value.clone()),
        Ir::ParameterRef { slot, .. } => Ok(env.get(*slot).cloned().unwrap_or(Value::Null)),
        Ir::MemberRead { owner, member } => {
            let value = eval(owner, env)?;
            // static reads carry a constant-null owner and skip the check
            if value.is_null() && !owner.is_null_literal() {
                return Err(EvalError::NullReference {
                    context: member.name.to_string(),
                });
            }
            (member.getter)(&value)
        }
        Ir::IndexRead {
            owner, key, access, ..
        } => {
            let target = eval(owner, env)?;
            if target.is_null() {
                return Err(EvalError::NullReference {
                    context: "index access".to_string(),
                });
            }
            let key = eval(key, env)?;
            match access {
                IndexAccess::Element => {
                    let array = target.as_array()?;
                    let index = element_index(&key)?;
                    match usize::try_from(index).ok().and_then(|i| array.items.get(i)) {
                        Some(item) => Ok(item.clone()),
                        None => Err(EvalError::IndexOutOfRange {
                            index,
                            len: array.len(),
                        }),
                    }
                }
                IndexAccess::Indexer(indexer) => (indexer.get)(&target, &key),
            }
        }
        Ir::Call {
            target,
            method,
            args,
        } => {
            let mut values = Vec::with_capacity(args.len() + 1);
            if let Some(target) = target {
                values.push(eval(target, env)?);
            }
            for arg in args {
                values.push(eval(arg, env)?);
            }
            method.func.invoke(&values)
        }
        Ir::RecordInit { shape, bindings } => {
            let mut values = vec![Value::Null; shape.len()];
            for (slot, expr) in bindings {
                let value = eval(expr, env)?;
                if let Some(cell) = values.get_mut(*slot) {
                    *cell = value;
                }
            }
            Ok(Value::Record(RecordValue::new(shape.clone(), values)))
        }
        Ir::ArrayNew { elem, items } => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval(item, env)?);
            }
            Ok(Value::array(elem.clone(), values))
        }
        Ir::Conditional {
            predicate,
            when_true,
            when_false,
            ..
        } => {
            if eval(predicate, env)?.as_bool()? {
                eval(when_true, env)
            } else {
                eval(when_false, env)
            }
        }
        Ir::Convert { operand, ty } => {
            let value = eval(operand, env)?;
            conversion::convert_value(value, ty)
        }
        Ir::Unary { kind, operand, .. } => {
            let value = eval(operand, env)?;
            match kind {
                UnaryKind::Negate => arith::negate(&value),
                UnaryKind::UnaryPlus => arith::unary_plus(&value),
                UnaryKind::Not => arith::logical_not(&value),
                UnaryKind::OnesComplement => arith::complement(&value),
            }
        }
        Ir::Binary {
            kind, left, right, ..
        } => eval_binary(kind, left, right, env),
        Ir::Lambda {
            param_slots,
            func_ty,
            body,
        } => {
            // the closure keeps the slot values visible at this point
            let snapshot = env.to_vec();
            let slots = param_slots.clone();
            let body = Arc::new((**body).clone());
            let expected = slots.len();
            let f = Arc::new(move |args: &[Value]| {
                if args.len() != expected {
                    return Err(EvalError::ArgumentCount {
                        expected,
                        got: args.len(),
                    });
                }
                let mut local = snapshot.clone();
                for (slot, value) in slots.iter().zip(args) {
                    if let Some(cell) = local.get_mut(*slot) {
                        *cell = value.clone();
                    }
                }
                eval(&body, &mut local)
            });
            Ok(Value::Func(FuncValue::new((**func_ty).clone(), f)))
        }
    }
}

fn eval_binary(
    kind: &BinaryKind,
    left: &Ir,
    right: &Ir,
    env: &mut [Value],
) -> Result<Value, EvalError> {
    match kind {
        BinaryKind::AndAlso => {
            if !eval(left, env)?.as_bool()? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, env)?.as_bool()?))
        }
        BinaryKind::OrElse => {
            if eval(left, env)?.as_bool()? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, env)?.as_bool()?))
        }
        BinaryKind::Coalesce => {
            let value = eval(left, env)?;
            if value.is_null() {
                eval(right, env)
            } else {
                Ok(value)
            }
        }
        BinaryKind::Add => {
            let (a, b) = both(left, right, env)?;
            arith::add(&a, &b)
        }
        BinaryKind::Subtract => {
            let (a, b) = both(left, right, env)?;
            arith::subtract(&a, &b)
        }
        BinaryKind::Multiply => {
            let (a, b) = both(left, right, env)?;
            arith::multiply(&a, &b)
        }
        BinaryKind::Divide => {
            let (a, b) = both(left, right, env)?;
            arith::divide(&a, &b)
        }
        BinaryKind::Modulo => {
            let (a, b) = both(left, right, env)?;
            arith::modulo(&a, &b)
        }
        BinaryKind::And => {
            let (a, b) = both(left, right, env)?;
            arith::bit_and(&a, &b)
        }
        BinaryKind::Or => {
            let (a, b) = both(left, right, env)?;
            arith::bit_or(&a, &b)
        }
        BinaryKind::ExclusiveOr => {
            let (a, b) = both(left, right, env)?;
            arith::bit_xor(&a, &b)
        }
        BinaryKind::LeftShift => {
            let (a, b) = both(left, right, env)?;
            arith::shift_left(&a, &b)
        }
        BinaryKind::RightShift => {
            let (a, b) = both(left, right, env)?;
            arith::shift_right(&a, &b)
        }
        BinaryKind::Equal => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(arith::equal(&a, &b)))
        }
        BinaryKind::NotEqual => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(!arith::equal(&a, &b)))
        }
        BinaryKind::LessThan => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(arith::compare(&a, &b)? == Ordering::Less))
        }
        BinaryKind::LessThanOrEqual => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(arith::compare(&a, &b)? != Ordering::Greater))
        }
        BinaryKind::GreaterThan => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(arith::compare(&a, &b)? == Ordering::Greater))
        }
        BinaryKind::GreaterThanOrEqual => {
            let (a, b) = both(left, right, env)?;
            Ok(Value::Bool(arith::compare(&a, &b)? != Ordering::Less))
        }
    }
}

fn both(left: &Ir, right: &Ir, env: &mut [Value]) -> Result<(Value, Value), EvalError> {
    let a = eval(left, env)?;
    let b = eval(right, env)?;
    Ok((a, b))
}

/// Integer array index from any integral value.
fn element_index(key: &Value) -> Result<i64, EvalError> {
    match key {
        Value::Int8(v) => Ok(i64::from(*v)),
        Value::Int16(v) => Ok(i64::from(*v)),
        Value::Int32(v) => Ok(i64::from(*v)),
        Value::Int64(v) => Ok(*v),
        Value::UInt8(v) => Ok(i64::from(*v)),
        Value::UInt16(v) => Ok(i64::from(*v)),
        Value::UInt32(v) => Ok(i64::from(*v)),
        Value::UInt64(v) => Ok(i64::try_from(*v).unwrap_or(i64::MAX)),
        other => Err(EvalError::TypeMismatch {
            expected: "an integer index".to_string(),
            found: other.ty().to_string(),
        }),
    }
}
