//! Runtime arithmetic over [`Value`] with source-language numeric promotion.
//!
//! Operands promote to the wider rank; signed/unsigned mixes promote to the
//! signed rank that holds the unsigned range; any float operand promotes the
//! whole operation to floating point. `Char` behaves as its code point and
//! promotes to `Int32`, as do the sub-`int` integer ranks under unary and
//! shift operators. Integer math is computed in `i128` and wrapped into the
//! promoted rank.

use std::cmp::Ordering;

use crate::error::EvalError;
use crate::value::Value;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Rank {
    fn bits(self) -> u32 {
        match self {
            Rank::I8 | Rank::U8 => 8,
            Rank::I16 | Rank::U16 => 16,
            Rank::I32 | Rank::U32 | Rank::F32 => 32,
            Rank::I64 | Rank::U64 | Rank::F64 => 64,
        }
    }

    fn is_signed(self) -> bool {
        matches!(self, Rank::I8 | Rank::I16 | Rank::I32 | Rank::I64)
    }

    fn signed_with(bits: u32) -> Rank {
        match bits {
            8 => Rank::I8,
            16 => Rank::I16,
            32 => Rank::I32,
            _ => Rank::I64,
        }
    }

    /// Sub-`int` ranks promote to `Int32` under unary and shift operators.
    fn widen_small(self) -> Rank {
        match self {
            Rank::I8 | Rank::U8 | Rank::I16 | Rank::U16 => Rank::I32,
            other => other,
        }
    }
}

fn rank_of(value: &Value) -> Option<Rank> {
    match value {
        Value::Int8(_) => Some(Rank::I8),
        Value::Int16(_) => Some(Rank::I16),
        Value::Int32(_) => Some(Rank::I32),
        Value::Int64(_) => Some(Rank::I64),
        Value::UInt8(_) => Some(Rank::U8),
        Value::UInt16(_) => Some(Rank::U16),
        Value::UInt32(_) => Some(Rank::U32),
        Value::UInt64(_) => Some(Rank::U64),
        Value::Float32(_) => Some(Rank::F32),
        Value::Float64(_) => Some(Rank::F64),
        Value::Char(_) => Some(Rank::I32),
        _ => None,
    }
}

fn promote(a: Rank, b: Rank) -> Rank {
    if a == Rank::F64 || b == Rank::F64 {
        return Rank::F64;
    }
    if a == Rank::F32 || b == Rank::F32 {
        return Rank::F32;
    }
    if a == b {
        return a;
    }
    if a.is_signed() == b.is_signed() {
        return if a.bits() >= b.bits() { a } else { b };
    }
    let (unsigned_bits, signed_bits) = if a.is_signed() {
        (b.bits(), a.bits())
    } else {
        (a.bits(), b.bits())
    };
    if signed_bits > unsigned_bits {
        Rank::signed_with(signed_bits)
    } else {
        Rank::signed_with((unsigned_bits * 2).min(64))
    }
}

fn to_i128(value: &Value) -> Result<i128, EvalError> {
    match value {
        Value::Int8(v) => Ok(*v as i128),
        Value::Int16(v) => Ok(*v as i128),
        Value::Int32(v) => Ok(*v as i128),
        Value::Int64(v) => Ok(*v as i128),
        Value::UInt8(v) => Ok(*v as i128),
        Value::UInt16(v) => Ok(*v as i128),
        Value::UInt32(v) => Ok(*v as i128),
        Value::UInt64(v) => Ok(*v as i128),
        Value::Char(c) => Ok(*c as i128),
        other => Err(not_numeric(other)),
    }
}

fn to_f64(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Float32(v) => Ok(*v as f64),
        Value::Float64(v) => Ok(*v),
        other => Ok(to_i128(other)? as f64),
    }
}

fn wrap_int(rank: Rank, v: i128) -> Value {
    match rank {
        Rank::I8 => Value::Int8(v as i8),
        Rank::I16 => Value::Int16(v as i16),
        Rank::I32 => Value::Int32(v as i32),
        Rank::I64 => Value::Int64(v as i64),
        Rank::U8 => Value::UInt8(v as u8),
        Rank::U16 => Value::UInt16(v as u16),
        Rank::U32 => Value::UInt32(v as u32),
        Rank::U64 => Value::UInt64(v as u64),
        Rank::F32 => Value::Float32(v as f32),
        Rank::F64 => Value::Float64(v as f64),
    }
}

fn not_numeric(value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: "a numeric value".to_string(),
        found: value.ty().to_string(),
    }
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    int_op: impl Fn(i128, i128) -> Result<i128, EvalError>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let (ra, rb) = match (rank_of(a), rank_of(b)) {
        (Some(ra), Some(rb)) => (ra, rb),
        (None, _) => return Err(not_numeric(a)),
        (_, None) => return Err(not_numeric(b)),
    };
    Ok(match promote(ra, rb) {
        Rank::F64 => Value::Float64(float_op(to_f64(a)?, to_f64(b)?)),
        // f64 has enough precision that one final rounding to f32 matches
        // native f32 arithmetic for + - * / %
        Rank::F32 => Value::Float32(float_op(to_f64(a)?, to_f64(b)?) as f32),
        rank => wrap_int(rank, int_op(to_i128(a)?, to_i128(b)?)?),
    })
}

fn divide_by_zero() -> EvalError {
    EvalError::other("attempt to divide by zero")
}

/// Addition; if either operand is a string, both render and concatenate.
pub fn add(a: &Value, b: &Value) -> Result<Value, EvalError> {
    if matches!(a, Value::Str(_)) || matches!(b, Value::Str(_)) {
        return Ok(Value::from(format!("{a}{b}")));
    }
    numeric_binop(a, b, |x, y| Ok(x.wrapping_add(y)), |x, y| x + y)
}

pub fn subtract(a: &Value, b: &Value) -> Result<Value, EvalError> {
    numeric_binop(a, b, |x, y| Ok(x.wrapping_sub(y)), |x, y| x - y)
}

pub fn multiply(a: &Value, b: &Value) -> Result<Value, EvalError> {
    numeric_binop(a, b, |x, y| Ok(x.wrapping_mul(y)), |x, y| x * y)
}

pub fn divide(a: &Value, b: &Value) -> Result<Value, EvalError> {
    numeric_binop(
        a,
        b,
        |x, y| {
            if y == 0 {
                Err(divide_by_zero())
            } else {
                Ok(x.wrapping_div(y))
            }
        },
        |x, y| x / y,
    )
}

pub fn modulo(a: &Value, b: &Value) -> Result<Value, EvalError> {
    numeric_binop(
        a,
        b,
        |x, y| {
            if y == 0 {
                Err(divide_by_zero())
            } else {
                Ok(x.wrapping_rem(y))
            }
        },
        |x, y| x % y,
    )
}

/// Unary minus. Small and unsigned ranks promote to the signed rank that
/// holds their range.
pub fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Float32(v) => Ok(Value::Float32(-v)),
        Value::Float64(v) => Ok(Value::Float64(-v)),
        other => {
            let rank = rank_of(other).ok_or_else(|| not_numeric(other))?;
            let target = match rank.widen_small() {
                Rank::U32 | Rank::U64 | Rank::I64 => Rank::I64,
                _ => Rank::I32,
            };
            Ok(wrap_int(target, to_i128(other)?.wrapping_neg()))
        }
    }
}

/// Unary plus: numeric identity.
pub fn unary_plus(value: &Value) -> Result<Value, EvalError> {
    rank_of(value).ok_or_else(|| not_numeric(value))?;
    Ok(value.clone())
}

/// Logical not, boolean only.
pub fn logical_not(value: &Value) -> Result<Value, EvalError> {
    Ok(Value::Bool(!value.as_bool()?))
}

/// Bitwise complement on integer ranks.
pub fn complement(value: &Value) -> Result<Value, EvalError> {
    let rank = rank_of(value).ok_or_else(|| not_numeric(value))?;
    if matches!(rank, Rank::F32 | Rank::F64) {
        return Err(not_numeric(value));
    }
    Ok(wrap_int(rank.widen_small(), !to_i128(value)?))
}

fn bitwise(
    a: &Value,
    b: &Value,
    bool_op: impl Fn(bool, bool) -> bool,
    int_op: impl Fn(i128, i128) -> i128,
) -> Result<Value, EvalError> {
    if let (Value::Bool(x), Value::Bool(y)) = (a, b) {
        return Ok(Value::Bool(bool_op(*x, *y)));
    }
    let (ra, rb) = match (rank_of(a), rank_of(b)) {
        (Some(ra), Some(rb)) => (ra, rb),
        (None, _) => return Err(not_numeric(a)),
        (_, None) => return Err(not_numeric(b)),
    };
    let rank = promote(ra, rb);
    if matches!(rank, Rank::F32 | Rank::F64) {
        return Err(not_numeric(a));
    }
    Ok(wrap_int(rank, int_op(to_i128(a)?, to_i128(b)?)))
}

/// `&`: boolean and without short-circuit, or integer bitwise and.
pub fn bit_and(a: &Value, b: &Value) -> Result<Value, EvalError> {
    bitwise(a, b, |x, y| x && y, |x, y| x & y)
}

/// `|`: boolean or without short-circuit, or integer bitwise or.
pub fn bit_or(a: &Value, b: &Value) -> Result<Value, EvalError> {
    bitwise(a, b, |x, y| x || y, |x, y| x | y)
}

/// `^`: boolean or integer exclusive or.
pub fn bit_xor(a: &Value, b: &Value) -> Result<Value, EvalError> {
    bitwise(a, b, |x, y| x ^ y, |x, y| x ^ y)
}

fn shift(a: &Value, b: &Value, left: bool) -> Result<Value, EvalError> {
    let rank = rank_of(a).ok_or_else(|| not_numeric(a))?;
    if matches!(rank, Rank::F32 | Rank::F64) {
        return Err(not_numeric(a));
    }
    // the left operand keeps its (int-promoted) rank; the count is masked
    // to its bit width
    let rank = rank.widen_small();
    let count = (to_i128(b)? as u32) & (rank.bits() - 1);
    let value = to_i128(a)?;
    let shifted = if left {
        value.wrapping_shl(count)
    } else {
        value.wrapping_shr(count)
    };
    Ok(wrap_int(rank, shifted))
}

pub fn shift_left(a: &Value, b: &Value) -> Result<Value, EvalError> {
    shift(a, b, true)
}

pub fn shift_right(a: &Value, b: &Value) -> Result<Value, EvalError> {
    shift(a, b, false)
}

/// Ordering across numeric ranks, strings, chars, bools, dates and guids.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    if let (Some(ra), Some(rb)) = (rank_of(a), rank_of(b)) {
        return Ok(match promote(ra, rb) {
            Rank::F32 | Rank::F64 => to_f64(a)?.total_cmp(&to_f64(b)?),
            _ => to_i128(a)?.cmp(&to_i128(b)?),
        });
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Ok(x.cmp(y)),
        (Value::Guid(x), Value::Guid(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(EvalError::TypeMismatch {
            expected: "comparable values".to_string(),
            found: format!("{} and {}", a.ty(), b.ty()),
        }),
    }
}

/// Equality: numeric operands compare across ranks, everything else
/// compares structurally. Null equals only null.
pub fn equal(a: &Value, b: &Value) -> bool {
    if rank_of(a).is_some() && rank_of(b).is_some() {
        return compare(a, b).map(Ordering::is_eq).unwrap_or(false);
    }
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_promotion() {
        assert_eq!(
            add(&Value::Int32(1), &Value::Int64(2)),
            Ok(Value::Int64(3))
        );
        assert_eq!(
            add(&Value::Int8(1), &Value::Int8(2)),
            Ok(Value::Int8(3))
        );
        assert_eq!(
            add(&Value::Int32(1), &Value::Float32(0.5)),
            Ok(Value::Float32(1.5))
        );
        assert_eq!(
            multiply(&Value::Float32(2.0), &Value::Float64(0.5)),
            Ok(Value::Float64(1.0))
        );
    }

    #[test]
    fn signed_unsigned_mix_promotes_to_signed() {
        assert_eq!(
            add(&Value::UInt32(1), &Value::Int32(2)),
            Ok(Value::Int64(3))
        );
        assert_eq!(
            add(&Value::UInt8(1), &Value::Int32(2)),
            Ok(Value::Int32(3))
        );
    }

    #[test]
    fn char_promotes_to_int() {
        assert_eq!(add(&Value::Char('a'), &Value::Int32(1)), Ok(Value::Int32(98)));
        assert_eq!(
            compare(&Value::Char('a'), &Value::Char('b')),
            Ok(Ordering::Less)
        );
    }

    #[test]
    fn string_add_concatenates_through_display() {
        assert_eq!(
            add(&Value::from("don't "), &Value::Int32(42)),
            Ok(Value::from("don't 42"))
        );
        assert_eq!(
            add(&Value::from("x"), &Value::Null),
            Ok(Value::from("x"))
        );
    }

    #[test]
    fn integer_division_by_zero_fails() {
        assert!(divide(&Value::Int32(1), &Value::Int32(0)).is_err());
        assert!(modulo(&Value::Int32(1), &Value::Int32(0)).is_err());
        // float division by zero is well defined
        let inf = divide(&Value::Float64(1.0), &Value::Float64(0.0));
        assert_eq!(inf, Ok(Value::Float64(f64::INFINITY)));
    }

    #[test]
    fn shifts_keep_the_left_rank() {
        assert_eq!(
            shift_left(&Value::Int32(1), &Value::Int32(3)),
            Ok(Value::Int32(8))
        );
        assert_eq!(
            shift_right(&Value::UInt64(16), &Value::Int32(2)),
            Ok(Value::UInt64(4))
        );
        // count is masked to the operand width
        assert_eq!(
            shift_left(&Value::Int32(1), &Value::Int32(33)),
            Ok(Value::Int32(2))
        );
    }

    #[test]
    fn unary_operators() {
        assert_eq!(negate(&Value::Int32(4)), Ok(Value::Int32(-4)));
        assert_eq!(negate(&Value::UInt32(4)), Ok(Value::Int64(-4)));
        assert_eq!(logical_not(&Value::Bool(true)), Ok(Value::Bool(false)));
        assert_eq!(complement(&Value::Int32(0)), Ok(Value::Int32(-1)));
        assert!(logical_not(&Value::Int32(1)).is_err());
    }

    #[test]
    fn boolean_bitwise_forms() {
        assert_eq!(
            bit_and(&Value::Bool(true), &Value::Bool(false)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            bit_xor(&Value::Bool(true), &Value::Bool(false)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            bit_or(&Value::Int32(4), &Value::Int32(1)),
            Ok(Value::Int32(5))
        );
    }

    #[test]
    fn cross_rank_equality() {
        assert!(equal(&Value::Int32(4), &Value::Int64(4)));
        assert!(equal(&Value::Int32(4), &Value::Float64(4.0)));
        assert!(!equal(&Value::Null, &Value::Int32(0)));
        assert!(equal(&Value::Null, &Value::Null));
        assert!(equal(&Value::from("a"), &Value::from("a")));
    }
}
