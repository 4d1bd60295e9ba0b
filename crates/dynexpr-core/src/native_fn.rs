//! Native function plumbing: how compiled expressions call back into host code.
//!
//! Registered methods, extension methods, and property getters are host
//! closures behind [`NativeFn`] / [`Getter`] handles. A method invocation
//! receives a [`CallContext`] with the evaluated arguments (receiver first
//! for instance methods) and typed accessors.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::EvalError;
use crate::value::{ArrayValue, FuncValue, Value};

/// Property accessor: receiver in, member value out.
pub type Getter = Arc<dyn Fn(&Value) -> Result<Value, EvalError> + Send + Sync>;

/// Indexer accessor: receiver and key in, element out.
pub type IndexGetter = Arc<dyn Fn(&Value, &Value) -> Result<Value, EvalError> + Send + Sync>;

/// Anything invocable as a registered method implementation.
pub trait NativeCallable: Send + Sync {
    fn call(&self, cx: CallContext<'_>) -> Result<Value, EvalError>;
}

impl<F> NativeCallable for F
where
    F: Fn(CallContext<'_>) -> Result<Value, EvalError> + Send + Sync,
{
    fn call(&self, cx: CallContext<'_>) -> Result<Value, EvalError> {
        self(cx)
    }
}

/// A named, shareable native function handle.
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    callable: Arc<dyn NativeCallable>,
}

impl NativeFn {
    pub fn new(name: impl Into<Arc<str>>, callable: impl NativeCallable + 'static) -> Self {
        NativeFn {
            name: name.into(),
            callable: Arc::new(callable),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with already-evaluated arguments, receiver first for
    /// instance methods.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        self.callable.call(CallContext::new(args))
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// Argument view handed to a native implementation.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    args: &'a [Value],
}

impl<'a> CallContext<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        CallContext { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn arg(&self, index: usize) -> Result<&'a Value, EvalError> {
        self.args.get(index).ok_or(EvalError::ArgumentCount {
            expected: index + 1,
            got: self.args.len(),
        })
    }

    pub fn bool_arg(&self, index: usize) -> Result<bool, EvalError> {
        self.arg(index)?.as_bool()
    }

    pub fn i32_arg(&self, index: usize) -> Result<i32, EvalError> {
        self.arg(index)?.as_i32()
    }

    pub fn i64_arg(&self, index: usize) -> Result<i64, EvalError> {
        self.arg(index)?.as_i64()
    }

    pub fn f64_arg(&self, index: usize) -> Result<f64, EvalError> {
        self.arg(index)?.as_f64()
    }

    pub fn str_arg(&self, index: usize) -> Result<&'a str, EvalError> {
        self.arg(index)?.as_str()
    }

    pub fn array_arg(&self, index: usize) -> Result<&'a ArrayValue, EvalError> {
        self.arg(index)?.as_array()
    }

    pub fn func_arg(&self, index: usize) -> Result<&'a FuncValue, EvalError> {
        self.arg(index)?.as_func()
    }

    pub fn guid_arg(&self, index: usize) -> Result<Uuid, EvalError> {
        match self.arg(index)? {
            Value::Guid(g) => Ok(*g),
            other => Err(EvalError::TypeMismatch {
                expected: "Guid".to_string(),
                found: other.ty().to_string(),
            }),
        }
    }

    pub fn datetime_arg(&self, index: usize) -> Result<NaiveDateTime, EvalError> {
        match self.arg(index)? {
            Value::DateTime(d) => Ok(*d),
            other => Err(EvalError::TypeMismatch {
                expected: "DateTime".to_string(),
                found: other.ty().to_string(),
            }),
        }
    }

    /// Nullable argument: `Null` maps to `None`.
    pub fn opt_arg(&self, index: usize) -> Result<Option<&'a Value>, EvalError> {
        let value = self.arg(index)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    pub fn opt_str_arg(&self, index: usize) -> Result<Option<&'a str>, EvalError> {
        self.opt_arg(index)?.map(Value::as_str).transpose()
    }

    pub fn opt_i32_arg(&self, index: usize) -> Result<Option<i32>, EvalError> {
        self.opt_arg(index)?.map(Value::as_i32).transpose()
    }

    pub fn opt_f64_arg(&self, index: usize) -> Result<Option<f64>, EvalError> {
        self.opt_arg(index)?.map(Value::as_f64).transpose()
    }

    /// Borrow a host object argument.
    pub fn native_arg<T: std::any::Any>(&self, index: usize) -> Result<&'a T, EvalError> {
        self.arg(index)?.as_native()?.downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invokes_closure_with_context() {
        let add = NativeFn::new("Add", |cx: CallContext<'_>| {
            Ok(Value::Int32(cx.i32_arg(0)? + cx.i32_arg(1)?))
        });
        let out = add.invoke(&[Value::Int32(2), Value::Int32(3)]);
        assert_eq!(out, Ok(Value::Int32(5)));
        assert_eq!(add.name(), "Add");
    }

    #[test]
    fn missing_argument_reports_count() {
        let first = NativeFn::new("First", |cx: CallContext<'_>| Ok(cx.arg(2)?.clone()));
        let err = first.invoke(&[Value::Null]).unwrap_err();
        assert_eq!(err, EvalError::ArgumentCount { expected: 3, got: 1 });
    }

    #[test]
    fn optional_accessors_map_null() {
        let cx_args = [Value::Null, Value::from("x")];
        let cx = CallContext::new(&cx_args);
        assert_eq!(cx.opt_str_arg(0).unwrap(), None);
        assert_eq!(cx.opt_str_arg(1).unwrap(), Some("x"));
    }
}
