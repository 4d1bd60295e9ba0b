//! Bare-name resolution.

use dynexpr_core::{CompileError, Ir};

use super::{member, Compiler, Resolved};

type Result<T> = std::result::Result<T, CompileError>;

/// Resolve a bare name in value position. A static class name alone has
/// no value, so it reports as an unknown variable unless a member or
/// call consumes it.
pub(crate) fn compile_variable(c: &Compiler, name: &str) -> Result<Ir> {
    match resolve_name(c, name)? {
        Resolved::Value(ir) => Ok(ir),
        Resolved::StaticClass(_) => Err(CompileError::UnknownVariable {
            name: name.to_string(),
        }),
    }
}

/// Full resolution order: external variables (captured by value), known
/// constants, bound parameters, static class names, and finally member
/// access on the sole bound parameter.
pub(crate) fn resolve_name(c: &Compiler, name: &str) -> Result<Resolved> {
    if let Some(value) = c.variables.get(name) {
        return Ok(Resolved::Value(Ir::constant(value.clone())));
    }
    // the parser folds knowns into literals; hand-built trees may not
    if let Some(value) = c.settings.known_value(name) {
        return Ok(Resolved::Value(Ir::constant(value)));
    }
    if let Some(binding) = c.scope.resolve(name) {
        return Ok(Resolved::Value(Ir::ParameterRef {
            slot: binding.slot,
            ty: binding.ty.clone(),
        }));
    }
    if let Some(entry) = c.registry.static_class(name) {
        return Ok(Resolved::StaticClass(entry));
    }
    if let Some(owner) = sole_param(c) {
        if let Ok(read) = member::member_read(c, owner, name) {
            return Ok(Resolved::Value(read));
        }
    }
    Err(CompileError::UnknownVariable {
        name: name.to_string(),
    })
}

/// The sole bound parameter as an IR reference, when there is one.
pub(crate) fn sole_param(c: &Compiler) -> Option<Ir> {
    c.scope.sole_binding().map(|binding| Ir::ParameterRef {
        slot: binding.slot,
        ty: binding.ty.clone(),
    })
}
