//! Type conversions, compile-time and runtime.
//!
//! Overload trials ask [`coerce`] whether an argument fits a parameter:
//! implicit widening only, so `int` passes where `long` is declared but
//! never the other way around. Binary operator unification is looser; it
//! inserts [`Ir::convert`] nodes that [`convert_value`] settles at
//! runtime, where numeric casts may narrow and strings may parse into
//! Guid and DateTime values.

use dynexpr_core::{parse_datetime, CompileError, EvalError, Ir, Ty, Value};
use dynexpr_registry::TypeRegistry;
use uuid::Uuid;

/// Implicit numeric widening table. Signed targets must hold the whole
/// source range, so unsigned ranks never widen into same-width signed
/// ones.
pub(crate) fn numeric_widens(from: &Ty, to: &Ty) -> bool {
    match from {
        Ty::Int8 => matches!(to, Ty::Int16 | Ty::Int32 | Ty::Int64 | Ty::Float32 | Ty::Float64),
        Ty::UInt8 => matches!(
            to,
            Ty::Int16
                | Ty::UInt16
                | Ty::Int32
                | Ty::UInt32
                | Ty::Int64
                | Ty::UInt64
                | Ty::Float32
                | Ty::Float64
        ),
        Ty::Int16 => matches!(to, Ty::Int32 | Ty::Int64 | Ty::Float32 | Ty::Float64),
        Ty::UInt16 => matches!(
            to,
            Ty::Int32 | Ty::UInt32 | Ty::Int64 | Ty::UInt64 | Ty::Float32 | Ty::Float64
        ),
        Ty::Int32 => matches!(to, Ty::Int64 | Ty::Float32 | Ty::Float64),
        Ty::UInt32 => matches!(to, Ty::Int64 | Ty::UInt64 | Ty::Float32 | Ty::Float64),
        Ty::Int64 | Ty::UInt64 => matches!(to, Ty::Float32 | Ty::Float64),
        // char stays out of the 16-bit ranks; a char can exceed them
        Ty::Char => matches!(
            to,
            Ty::Int32 | Ty::UInt32 | Ty::Int64 | Ty::UInt64 | Ty::Float32 | Ty::Float64
        ),
        Ty::Float32 => matches!(to, Ty::Float64),
        _ => false,
    }
}

/// True when a value of `from` implicitly converts to `to`: identity,
/// everything-to-object, lifting into nullable, upcasts along the
/// registered base chain and interfaces, and numeric widening.
pub(crate) fn widens_to(registry: &TypeRegistry, from: &Ty, to: &Ty) -> bool {
    if from == to || *to == Ty::Object {
        return true;
    }
    match (from, to) {
        (Ty::Nullable(f), Ty::Nullable(t)) => widens_to(registry, f, t),
        (_, Ty::Nullable(t)) => widens_to(registry, from, t),
        (_, Ty::Named(want)) => {
            if let Ty::Named(_) = from {
                let mut base = registry.entry_of(from).and_then(|e| e.base.clone());
                while let Some(named) = base {
                    if named.hash == want.hash {
                        return true;
                    }
                    base = registry
                        .entry_of(&Ty::Named(named))
                        .and_then(|e| e.base.clone());
                }
            }
            registry
                .interfaces_of(from)
                .iter()
                .any(|i| i.hash == want.hash)
        }
        _ => numeric_widens(from, to),
    }
}

/// Types a null value may inhabit.
pub(crate) fn accepts_null(ty: &Ty) -> bool {
    matches!(
        ty,
        Ty::Object
            | Ty::Nullable(_)
            | Ty::Str
            | Ty::Named(_)
            | Ty::Array(_)
            | Ty::Map
            | Ty::Func(_)
            | Ty::Record(_)
    )
}

/// `ty` if it already holds null, otherwise its nullable form.
pub(crate) fn nullable_form(ty: &Ty) -> Ty {
    if accepts_null(ty) {
        ty.clone()
    } else {
        ty.clone().nullable()
    }
}

/// Fit an expression to a wanted type, or `None` when it does not fit.
/// This is the overload-trial check: null literals adopt any nullable
/// type, string literals parse into wanted Guid/DateTime constants, and
/// everything else must widen.
pub(crate) fn coerce(registry: &TypeRegistry, expr: Ir, want: &Ty) -> Option<Ir> {
    let have = expr.ty();
    if have == *want || *want == Ty::Object {
        return Some(expr);
    }
    if expr.is_null_literal() {
        return accepts_null(want).then(|| Ir::typed_constant(Value::Null, want.clone()));
    }
    if let Some(text) = expr.as_str_literal() {
        match want.unwrap_nullable() {
            Ty::Guid => {
                let parsed = Uuid::parse_str(text).ok()?;
                return Some(Ir::typed_constant(Value::Guid(parsed), want.clone()));
            }
            Ty::DateTime => {
                let parsed = parse_datetime(text)?;
                return Some(Ir::typed_constant(Value::DateTime(parsed), want.clone()));
            }
            _ => {}
        }
    }
    widens_to(registry, &have, want).then(|| Ir::convert(expr, want.clone()))
}

/// Parse a string literal into the typed constant a Guid/DateTime
/// comparison needs. Unlike [`coerce`], failure here is a hard compile
/// error, since no other overload could absorb the operand.
pub(crate) fn parse_typed_literal(text: &str, target: &Ty) -> Result<Value, CompileError> {
    let bad = || CompileError::BadTypedLiteral {
        literal: text.to_string(),
        target: target.to_string(),
    };
    match target.unwrap_nullable() {
        Ty::Guid => Uuid::parse_str(text).map(Value::Guid).map_err(|_| bad()),
        Ty::DateTime => parse_datetime(text).map(Value::DateTime).ok_or_else(bad),
        _ => Err(bad()),
    }
}

/// Settle an [`Ir::Convert`] node at runtime. Numeric casts go both ways
/// here (operator unification may have inserted a narrowing one) and
/// truncate like an unchecked cast; strings parse into Guid/DateTime;
/// anything else that is not an identity or null fails.
pub(crate) fn convert_value(value: Value, want: &Ty) -> Result<Value, EvalError> {
    if *want == Ty::Object {
        return Ok(value);
    }
    if value.is_null() {
        return if accepts_null(want) {
            Ok(Value::Null)
        } else {
            Err(conversion_failed(&Value::Null, want))
        };
    }
    let inner = want.unwrap_nullable();
    if value.ty() == *inner {
        return Ok(value);
    }
    if let Some(cast) = cast_numeric(&value, inner) {
        return Ok(cast);
    }
    match (&value, inner) {
        (Value::Str(s), Ty::DateTime) => {
            return parse_datetime(s)
                .map(Value::DateTime)
                .ok_or_else(|| conversion_failed(&value, want));
        }
        (Value::Str(s), Ty::Guid) => {
            return Uuid::parse_str(s)
                .map(Value::Guid)
                .map_err(|_| conversion_failed(&value, want));
        }
        // upcasts were checked when the node was built
        (Value::Native(_), Ty::Named(_)) => return Ok(value),
        _ => {}
    }
    Err(conversion_failed(&value, want))
}

fn conversion_failed(value: &Value, want: &Ty) -> EvalError {
    EvalError::ConversionFailed {
        from: value.ty().to_string(),
        to: want.to_string(),
    }
}

fn cast_numeric(value: &Value, want: &Ty) -> Option<Value> {
    let (int, float) = match value {
        Value::Int8(v) => (*v as i128, *v as f64),
        Value::Int16(v) => (*v as i128, *v as f64),
        Value::Int32(v) => (*v as i128, *v as f64),
        Value::Int64(v) => (*v as i128, *v as f64),
        Value::UInt8(v) => (*v as i128, *v as f64),
        Value::UInt16(v) => (*v as i128, *v as f64),
        Value::UInt32(v) => (*v as i128, *v as f64),
        Value::UInt64(v) => (*v as i128, *v as f64),
        Value::Char(c) => (*c as i128, (*c as u32) as f64),
        Value::Float32(v) => (*v as i128, *v as f64),
        Value::Float64(v) => (*v as i128, *v),
        _ => return None,
    };
    Some(match want {
        Ty::Int8 => Value::Int8(int as i8),
        Ty::Int16 => Value::Int16(int as i16),
        Ty::Int32 => Value::Int32(int as i32),
        Ty::Int64 => Value::Int64(int as i64),
        Ty::UInt8 => Value::UInt8(int as u8),
        Ty::UInt16 => Value::UInt16(int as u16),
        Ty::UInt32 => Value::UInt32(int as u32),
        Ty::UInt64 => Value::UInt64(int as u64),
        Ty::Float32 => Value::Float32(float as f32),
        Ty::Float64 => Value::Float64(float),
        Ty::Char => Value::Char(char::from_u32(int as u32)?),
        _ => return None,
    })
}
