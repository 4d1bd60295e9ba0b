//! Array and object literal compilation.

use std::sync::Arc;

use dynexpr_core::{CompileError, Ir, RecordMember, Ty};
use dynexpr_parser::Token;

use super::{compile_token, Compiler};
use crate::conversion;

type Result<T> = std::result::Result<T, CompileError>;

/// `[a, b, c]`. The first item fixes the element type; later items
/// convert to it when they can and otherwise keep their own runtime
/// values.
pub(crate) fn compile_array(c: &mut Compiler, items: &[Token]) -> Result<Ir> {
    let mut compiled = Vec::with_capacity(items.len());
    for item in items {
        compiled.push(compile_token(c, item)?);
    }
    let elem = compiled.first().map(Ir::ty).unwrap_or(Ty::Object);
    let mut converted = Vec::with_capacity(compiled.len());
    for item in compiled {
        if item.ty() == elem {
            converted.push(item);
            continue;
        }
        match conversion::coerce(&c.registry, item.clone(), &elem) {
            Some(widened) => converted.push(widened),
            None => converted.push(item),
        }
    }
    Ok(Ir::ArrayNew {
        elem,
        items: converted,
    })
}

/// `new { Name = ..., Age = ... }`. Members compile in declaration
/// order; the (name, type) set interns a record shape, and each binding
/// targets its slot in that shape.
pub(crate) fn compile_object(c: &mut Compiler, members: &[Token]) -> Result<Ir> {
    let mut names: Vec<&str> = Vec::with_capacity(members.len());
    let mut exprs = Vec::with_capacity(members.len());
    for member in members {
        let Token::Assign { name, right } = member else {
            return Err(CompileError::MisplacedToken {
                kind: member.kind_name(),
            });
        };
        exprs.push(compile_token(c, right)?);
        names.push(name.as_str());
    }

    let shape = c.records.shape_for(
        names
            .iter()
            .zip(&exprs)
            .map(|(name, expr)| RecordMember {
                name: Arc::from(*name),
                ty: expr.ty(),
            })
            .collect(),
    );

    let mut bindings = Vec::with_capacity(exprs.len());
    for (name, expr) in names.iter().zip(exprs) {
        // an interned shape always carries the literal's names, possibly
        // in another declaration's order
        let slot = shape
            .index_of(name)
            .ok_or_else(|| CompileError::UnknownMember {
                name: name.to_string(),
                owner: Ty::Record(shape.clone()).to_string(),
            })?;
        bindings.push((slot, expr));
    }
    Ok(Ir::RecordInit { shape, bindings })
}
