//! Nested lambda compilation.
//!
//! Lambdas have no type annotations, so a lambda body only compiles
//! once a call trial supplies the parameter types of the candidate's
//! function-typed parameter. Parameters bind fresh environment slots;
//! the evaluator snapshots the enclosing environment, so the body may
//! also read outer parameters.

use std::sync::Arc;

use dynexpr_core::{CompileError, FuncTy, Ir, Ty};
use dynexpr_parser::Token;

use super::{compile_token, Compiler};
use crate::conversion;

type Result<T> = std::result::Result<T, CompileError>;

/// Compile a lambda against known parameter types. With an expected
/// return type the body must produce it, possibly through a widening
/// conversion; without one the body's own type becomes the return type.
pub(crate) fn compile_lambda(
    c: &mut Compiler,
    names: &[String],
    body: &Token,
    param_tys: &[Ty],
    expected_ret: Option<&Ty>,
) -> Result<Ir> {
    if names.len() != param_tys.len() {
        return Err(CompileError::ParameterCountMismatch {
            expected: names.len(),
            got: param_tys.len(),
        });
    }
    let frame: Vec<(Arc<str>, Ty)> = names
        .iter()
        .zip(param_tys)
        .map(|(name, ty)| (Arc::from(name.as_str()), ty.clone()))
        .collect();
    let slots = c.scope.push_frame(&frame);
    let body_ir = compile_token(c, body);
    c.scope.pop_frame();
    let mut body_ir = body_ir?;

    if let Some(want) = expected_ret {
        if body_ir.ty() != *want {
            body_ir = conversion::coerce(&c.registry, body_ir, want)
                .ok_or(CompileError::MisplacedLambda)?;
        }
    }

    let func_ty = FuncTy {
        params: param_tys.to_vec(),
        ret: body_ir.ty(),
    };
    Ok(Ir::Lambda {
        param_slots: slots,
        func_ty: Box::new(func_ty),
        body: Box::new(body_ir),
    })
}
