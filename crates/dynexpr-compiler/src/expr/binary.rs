//! Binary operator lowering and operand unification.
//!
//! Custom operators receive both compiled operands untouched. Built-in
//! operators first settle `+` with a string side as concatenation, then
//! unify mismatched operand types in a fixed order: null literals adopt
//! the other side's nullable form, a bare value lifts to its nullable
//! pair, a floating side pulls the other one up, Guid/DateTime operands
//! turn string literals into typed constants at compile time, and as
//! the last resort the right operand converts to the left's type with
//! the failure deferred to runtime.

use dynexpr_core::{BinaryConverter, BinaryKind, CompileError, Ir, Ty, Value};
use dynexpr_parser::Token;

use super::{compile_token, Compiler};
use crate::conversion;

type Result<T> = std::result::Result<T, CompileError>;

pub(crate) fn compile_binary(
    c: &mut Compiler,
    op: &str,
    left: &Token,
    right: &Token,
) -> Result<Ir> {
    let info = c
        .settings
        .binary_op(op)
        .ok_or_else(|| CompileError::UnknownBinaryOperator { op: op.to_string() })?;
    let left = compile_token(c, left)?;
    let right = compile_token(c, right)?;
    match info.converter {
        BinaryConverter::Custom(lower) => lower(left, right),
        BinaryConverter::Builtin(kind) => lower_builtin(kind, left, right),
    }
}

pub(crate) fn lower_builtin(kind: BinaryKind, left: Ir, right: Ir) -> Result<Ir> {
    if kind == BinaryKind::Add && (is_string(&left) || is_string(&right)) {
        return Ok(Ir::binary_typed(BinaryKind::Add, left, right, Ty::Str));
    }
    let (left, right) = unify_operands(left, right)?;
    Ok(Ir::binary(kind, left, right))
}

fn is_string(expr: &Ir) -> bool {
    matches!(expr.ty().unwrap_nullable(), Ty::Str)
}

fn unify_operands(left: Ir, right: Ir) -> Result<(Ir, Ir)> {
    let left_ty = left.ty();
    let right_ty = right.ty();
    if left_ty == right_ty {
        return Ok((left, right));
    }

    // null literals adopt the other side's nullable form
    if left.is_null_literal() {
        let want = conversion::nullable_form(&right_ty);
        return Ok((Ir::typed_constant(Value::Null, want), right));
    }
    if right.is_null_literal() {
        let want = conversion::nullable_form(&left_ty);
        return Ok((left, Ir::typed_constant(Value::Null, want)));
    }

    // a bare value meets its nullable pair by lifting
    if let Ty::Nullable(inner) = &left_ty {
        if **inner == right_ty {
            return Ok((left, Ir::convert(right, left_ty.clone())));
        }
    }
    if let Ty::Nullable(inner) = &right_ty {
        if **inner == left_ty {
            return Ok((Ir::convert(left, right_ty.clone()), right));
        }
    }

    // a floating side pulls the other numeric side up
    let left_inner = left_ty.unwrap_nullable();
    let right_inner = right_ty.unwrap_nullable();
    if (left_inner.is_floating() || right_inner.is_floating())
        && left_inner.is_numeric()
        && right_inner.is_numeric()
    {
        let target = if *left_inner == Ty::Float64 || *right_inner == Ty::Float64 {
            Ty::Float64
        } else {
            Ty::Float32
        };
        let left = float_widen(left, &left_ty, &target);
        let right = float_widen(right, &right_ty, &target);
        return Ok((left, right));
    }

    // Guid/DateTime operands parse string literals at compile time
    if matches!(left_ty.unwrap_nullable(), Ty::Guid | Ty::DateTime) {
        if let Some(text) = right.as_str_literal() {
            let value = conversion::parse_typed_literal(text, &left_ty)?;
            return Ok((left, Ir::typed_constant(value, left_ty)));
        }
    }
    if matches!(right_ty.unwrap_nullable(), Ty::Guid | Ty::DateTime) {
        if let Some(text) = left.as_str_literal() {
            let value = conversion::parse_typed_literal(text, &right_ty)?;
            return Ok((Ir::typed_constant(value, right_ty), right));
        }
    }

    // anything else converts the right side to the left's type; a true
    // mismatch surfaces as a runtime conversion failure
    Ok((left, Ir::convert(right, left_ty)))
}

fn float_widen(expr: Ir, have: &Ty, target: &Ty) -> Ir {
    if have.unwrap_nullable() == target {
        return expr;
    }
    let want = if have.is_nullable() {
        target.clone().nullable()
    } else {
        target.clone()
    };
    Ir::convert(expr, want)
}
