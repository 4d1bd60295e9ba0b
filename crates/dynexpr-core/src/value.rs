//! Runtime values flowing through compiled expressions.
//!
//! [`Value`] is a closed sum mirroring [`Ty`](crate::ty::Ty): primitives,
//! strings, Guid/DateTime, arrays, string-keyed maps, synthesized records,
//! callable functions, and registered host objects. Values are cheaply
//! clonable (heavy variants are `Arc`-backed) and structurally comparable.
//!
//! A runtime value never carries nullable-ness; `Value::Null` stands in for
//! any missing value and its static type lives on the IR node instead.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use uuid::Uuid;
use xxhash_rust::xxh64::xxh64;

use crate::error::EvalError;
use crate::record::RecordValue;
use crate::ty::{FuncTy, NamedTy, Ty};

/// A registered host object: type identity plus shared opaque state.
///
/// Equality is reference identity, matching host-object semantics.
#[derive(Clone)]
pub struct NativeObject {
    ty: NamedTy,
    data: Arc<dyn Any + Send + Sync>,
}

impl NativeObject {
    pub fn new<T: Any + Send + Sync>(ty: NamedTy, value: T) -> Self {
        NativeObject {
            ty,
            data: Arc::new(value),
        }
    }

    pub fn ty(&self) -> &NamedTy {
        &self.ty
    }

    /// Borrow the underlying host value.
    pub fn downcast_ref<T: Any>(&self) -> Result<&T, EvalError> {
        self.data
            .downcast_ref::<T>()
            .ok_or_else(|| EvalError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: self.ty.name.to_string(),
            })
    }
}

impl PartialEq for NativeObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeObject({})", self.ty.name)
    }
}

/// A callable value produced by compiling a nested lambda, or supplied by a
/// host. Equality is closure identity.
#[derive(Clone)]
pub struct FuncValue {
    ty: FuncTy,
    f: Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>,
}

impl FuncValue {
    pub fn new(
        ty: FuncTy,
        f: Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>,
    ) -> Self {
        FuncValue { ty, f }
    }

    pub fn ty(&self) -> &FuncTy {
        &self.ty
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.f)(args)
    }
}

impl PartialEq for FuncValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn")?;
        for (i, p) in self.ty.params.iter().enumerate() {
            if i == 0 {
                write!(f, "(")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        if !self.ty.params.is_empty() {
            write!(f, ")")?;
        } else {
            write!(f, "()")?;
        }
        write!(f, " -> {}>", self.ty.ret)
    }
}

/// A homogeneous array value with its static element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub elem: Ty,
    pub items: Arc<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(elem: Ty, items: Vec<Value>) -> Self {
        ArrayValue {
            elem,
            items: Arc::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Char(char),
    Str(Arc<str>),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    Array(ArrayValue),
    Map(Arc<FxHashMap<String, Value>>),
    Record(RecordValue),
    Func(FuncValue),
    Native(NativeObject),
}

impl Value {
    /// Build an array value with an explicit element type.
    pub fn array(elem: Ty, items: Vec<Value>) -> Value {
        Value::Array(ArrayValue::new(elem, items))
    }

    /// Build a string-keyed map value.
    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Static type of this value. `Null` reports the untyped-object type.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Null => Ty::Object,
            Value::Bool(_) => Ty::Bool,
            Value::Int8(_) => Ty::Int8,
            Value::Int16(_) => Ty::Int16,
            Value::Int32(_) => Ty::Int32,
            Value::Int64(_) => Ty::Int64,
            Value::UInt8(_) => Ty::UInt8,
            Value::UInt16(_) => Ty::UInt16,
            Value::UInt32(_) => Ty::UInt32,
            Value::UInt64(_) => Ty::UInt64,
            Value::Float32(_) => Ty::Float32,
            Value::Float64(_) => Ty::Float64,
            Value::Char(_) => Ty::Char,
            Value::Str(_) => Ty::Str,
            Value::Guid(_) => Ty::Guid,
            Value::DateTime(_) => Ty::DateTime,
            Value::Array(a) => a.elem.clone().array_of(),
            Value::Map(_) => Ty::Map,
            Value::Record(r) => Ty::Record(r.shape.clone()),
            Value::Func(f) => Ty::Func(Box::new(f.ty().clone())),
            Value::Native(o) => Ty::Named(o.ty().clone()),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.type_error("bool")),
        }
    }

    pub fn as_i32(&self) -> Result<i32, EvalError> {
        match self {
            Value::Int32(v) => Ok(*v),
            other => Err(other.type_error("int")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int64(v) => Ok(*v),
            other => Err(other.type_error("long")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, EvalError> {
        match self {
            Value::Float64(v) => Ok(*v),
            other => Err(other.type_error("double")),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.type_error("string")),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayValue, EvalError> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(other.type_error("array")),
        }
    }

    pub fn as_func(&self) -> Result<&FuncValue, EvalError> {
        match self {
            Value::Func(f) => Ok(f),
            other => Err(other.type_error("function")),
        }
    }

    pub fn as_native(&self) -> Result<&NativeObject, EvalError> {
        match self {
            Value::Native(o) => Ok(o),
            other => Err(other.type_error("host object")),
        }
    }

    /// Borrow the host value behind a `Native` variant.
    pub fn downcast_ref<T: Any>(&self) -> Result<&T, EvalError> {
        self.as_native()?.downcast_ref::<T>()
    }

    fn type_error(&self, expected: &str) -> EvalError {
        EvalError::TypeMismatch {
            expected: expected.to_string(),
            found: self.ty().to_string(),
        }
    }

    /// Order-independent 64-bit structural hash, consistent with `==`.
    pub fn structural_hash(&self) -> u64 {
        const NULL: u64 = 0x9ae16a3b2f90404f;
        match self {
            Value::Null => NULL,
            Value::Bool(b) => 0x1000 ^ (*b as u64),
            Value::Int8(v) => 0x2000 ^ (*v as u64),
            Value::Int16(v) => 0x2001 ^ (*v as u64),
            Value::Int32(v) => 0x2002 ^ (*v as u64),
            Value::Int64(v) => 0x2003 ^ (*v as u64),
            Value::UInt8(v) => 0x2004 ^ (*v as u64),
            Value::UInt16(v) => 0x2005 ^ (*v as u64),
            Value::UInt32(v) => 0x2006 ^ (*v as u64),
            Value::UInt64(v) => 0x2007 ^ *v,
            Value::Float32(v) => 0x3000 ^ (v.to_bits() as u64),
            Value::Float64(v) => 0x3001 ^ v.to_bits(),
            Value::Char(c) => 0x4000 ^ (*c as u64),
            Value::Str(s) => xxh64(s.as_bytes(), 0),
            Value::Guid(g) => xxh64(g.as_bytes(), 1),
            Value::DateTime(d) => 0x5000 ^ (d.and_utc().timestamp_millis() as u64),
            Value::Array(a) => a
                .items
                .iter()
                .fold(0x6000u64, |acc, v| {
                    acc.rotate_left(7) ^ v.structural_hash()
                }),
            Value::Map(m) => m
                .iter()
                .fold(0x7000u64, |acc, (k, v)| {
                    acc ^ (xxh64(k.as_bytes(), 2) ^ v.structural_hash())
                }),
            Value::Record(r) => r.structural_hash(),
            Value::Func(f) => Arc::as_ptr(&f.f) as *const () as u64,
            Value::Native(o) => Arc::as_ptr(&o.data) as *const () as u64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            // source-language capitalization
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Guid(g) => write!(f, "{g}"),
            Value::DateTime(d) => write!(f, "{d}"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, item) in a.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => write!(f, "<map[{}]>", m.len()),
            Value::Record(r) => write!(f, "{r}"),
            Value::Func(func) => write!(f, "{func:?}"),
            Value::Native(o) => write!(f, "<{}>", o.ty().name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::Str(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

macro_rules! try_from_value {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl TryFrom<Value> for $ty {
            type Error = EvalError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(EvalError::TypeMismatch {
                        expected: $expected.to_string(),
                        found: other.ty().to_string(),
                    }),
                }
            }
        }
    };
}

try_from_value!(bool, Bool, "bool");
try_from_value!(i8, Int8, "sbyte");
try_from_value!(i16, Int16, "short");
try_from_value!(i32, Int32, "int");
try_from_value!(i64, Int64, "long");
try_from_value!(u8, UInt8, "byte");
try_from_value!(u16, UInt16, "ushort");
try_from_value!(u32, UInt32, "uint");
try_from_value!(u64, UInt64, "ulong");
try_from_value!(f32, Float32, "float");
try_from_value!(f64, Float64, "double");
try_from_value!(char, Char, "char");
try_from_value!(Uuid, Guid, "Guid");
try_from_value!(NaiveDateTime, DateTime, "DateTime");

impl TryFrom<Value> for String {
    type Error = EvalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(EvalError::TypeMismatch {
                expected: "string".to_string(),
                found: other.ty().to_string(),
            }),
        }
    }
}

/// Parse a `DateTime` string the way literal coercion and `DateTime.Parse`
/// expect: ISO datetime with a `T` or space separator and optional
/// fractional seconds, or a bare date.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const WITH_TIME: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
    ];
    const DATE_ONLY: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

    let text = text.trim();
    for fmt in WITH_TIME {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATE_ONLY {
        if let Ok(parsed) = chrono::NaiveDate::parse_from_str(text, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}
