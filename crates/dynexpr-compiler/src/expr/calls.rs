//! Call resolution.
//!
//! A call site names either `owner.Method(...)` or, with a sole bound
//! parameter, a bare `Method(...)` on it. Resolution runs in tiers:
//!
//! 1. Without lambda arguments, every argument compiles once up front
//!    (so argument errors surface as themselves) and an arity-exact
//!    instance overload is picked directly, preferring an all-exact
//!    signature over an all-convertible one.
//! 2. Instance overload trials: each candidate compiles the arguments
//!    against its declared parameter types, injecting trailing defaults
//!    and compiling lambda arguments against the candidate's function
//!    parameter. A failed trial rejects only that candidate.
//! 3. The same trials over extension candidates, with the receiver
//!    unified against the extension's receiver scheme and passed as the
//!    leading argument.
//! 4. A zero-argument `ToString` resolves on every value.
//!
//! `GetType` never resolves; runtime type introspection stays outside
//! the language.

use dynexpr_core::{CompileError, Ir, MethodRef, Ty};
use dynexpr_parser::Token;
use dynexpr_registry::{
    find_static_methods, universal_to_string, ClassEntry, ExtensionEntry, MethodEntry, TyScheme,
};

use super::{compile_owner, compile_token, lambda, name_matches, Compiler, Resolved};
use crate::conversion;

type Result<T> = std::result::Result<T, CompileError>;

pub(crate) fn compile_call(c: &mut Compiler, callee: &Token, args: &[Token]) -> Result<Ir> {
    match callee {
        Token::Member { owner, name } => {
            reject_introspection(c, name)?;
            match compile_owner(c, owner)? {
                Resolved::StaticClass(entry) => static_call(c, &entry, name, args),
                Resolved::Value(owner) => instance_call(c, owner, name, args),
            }
        }
        // a bare name can be a method on the sole bound parameter
        Token::Variable { name } => {
            reject_introspection(c, name)?;
            match super::identifiers::sole_param(c) {
                Some(owner) => instance_call(c, owner, name, args),
                None => Err(CompileError::InvalidCallTarget),
            }
        }
        _ => Err(CompileError::InvalidCallTarget),
    }
}

fn reject_introspection(c: &Compiler, name: &str) -> Result<()> {
    if name_matches("GetType", name, c.settings.ignore_member_case()) {
        return Err(CompileError::ForbiddenIntrospection {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn instance_call(c: &mut Compiler, owner: Ir, name: &str, arg_tokens: &[Token]) -> Result<Ir> {
    let ignore_case = c.settings.ignore_member_case();
    let owner_ty = owner.ty();
    let receiver_ty = owner_ty.unwrap_nullable().clone();
    let methods = c.registry.find_methods(&receiver_ty, name, ignore_case);

    if !arg_tokens.iter().any(is_lambda) {
        // argument errors are the caller's, not a failed overload's
        let mut compiled = Vec::with_capacity(arg_tokens.len());
        for token in arg_tokens {
            compiled.push(compile_token(c, token)?);
        }
        if let Some(call) = pick_by_signature(c, Some(&owner), &methods, &compiled) {
            return Ok(call);
        }
    }

    for entry in &methods {
        if let Some(call) = try_method(c, Some(&owner), entry, arg_tokens) {
            return Ok(call);
        }
    }

    let candidates = c
        .extensions
        .candidates(&c.registry, &owner_ty, name, ignore_case);
    for entry in candidates {
        if let Some(call) = try_extension(c, &owner, &entry, arg_tokens) {
            return Ok(call);
        }
    }

    // every value answers a bare ToString
    if name_matches("ToString", name, ignore_case) && arg_tokens.is_empty() {
        let entry = universal_to_string();
        return Ok(Ir::call(Some(owner), method_ref(&entry), Vec::new()));
    }

    Err(CompileError::UnknownMethod {
        name: name.to_string(),
        owner: owner_ty.to_string(),
    })
}

fn static_call(
    c: &mut Compiler,
    entry: &ClassEntry,
    name: &str,
    arg_tokens: &[Token],
) -> Result<Ir> {
    let methods = find_static_methods(&c.registry, entry, name, c.settings.ignore_member_case());

    if !arg_tokens.iter().any(is_lambda) {
        let mut compiled = Vec::with_capacity(arg_tokens.len());
        for token in arg_tokens {
            compiled.push(compile_token(c, token)?);
        }
        if let Some(call) = pick_by_signature(c, None, &methods, &compiled) {
            return Ok(call);
        }
    }

    for candidate in &methods {
        if let Some(call) = try_method(c, None, candidate, arg_tokens) {
            return Ok(call);
        }
    }

    Err(CompileError::UnknownMethod {
        name: name.to_string(),
        owner: entry.ty.name.to_string(),
    })
}

/// Arity-exact pick over already-compiled arguments: a fully exact
/// signature wins, then the first signature every argument widens into.
fn pick_by_signature(
    c: &Compiler,
    owner: Option<&Ir>,
    methods: &[MethodEntry],
    args: &[Ir],
) -> Option<Ir> {
    let arity_exact: Vec<&MethodEntry> = methods
        .iter()
        .filter(|m| m.params.len() == args.len())
        .collect();

    for entry in &arity_exact {
        if entry
            .params
            .iter()
            .zip(args)
            .all(|(param, arg)| param.ty == arg.ty())
        {
            return Some(build_call(owner.cloned(), entry, args.to_vec()));
        }
    }
    for entry in &arity_exact {
        let converted: Option<Vec<Ir>> = entry
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| conversion::coerce(&c.registry, arg.clone(), &param.ty))
            .collect();
        if let Some(converted) = converted {
            return Some(build_call(owner.cloned(), entry, converted));
        }
    }
    None
}

/// One registered-method trial. `None` rejects the candidate only.
fn try_method(
    c: &mut Compiler,
    owner: Option<&Ir>,
    entry: &MethodEntry,
    arg_tokens: &[Token],
) -> Option<Ir> {
    if !entry.accepts_arity(arg_tokens.len()) {
        return None;
    }
    let mut args = Vec::with_capacity(entry.params.len());
    for (param, token) in entry.params.iter().zip(arg_tokens) {
        args.push(compile_argument(c, token, &param.ty)?);
    }
    for param in &entry.params[arg_tokens.len()..] {
        let default = param.default.clone()?;
        args.push(Ir::typed_constant(default, param.ty.clone()));
    }
    Some(build_call(owner.cloned(), entry, args))
}

/// One extension trial: unify the receiver to bind type parameters,
/// compile arguments against the instantiated schemes (lambda bodies
/// feed result inference), then instantiate the return type.
fn try_extension(
    c: &mut Compiler,
    owner: &Ir,
    entry: &ExtensionEntry,
    arg_tokens: &[Token],
) -> Option<Ir> {
    if !entry.accepts_arity(arg_tokens.len()) {
        return None;
    }
    let mut bindings = entry.bind_receiver(&c.registry, &owner.ty())?;

    let mut args = Vec::with_capacity(entry.params.len() + 1);
    args.push(owner.clone());
    for (param, token) in entry.params.iter().zip(arg_tokens) {
        args.push(compile_ext_argument(c, token, &param.scheme, &mut bindings)?);
    }
    for param in &entry.params[arg_tokens.len()..] {
        let default = param.default.clone()?;
        let ty = param.scheme.instantiate(&bindings)?;
        args.push(Ir::typed_constant(default, ty));
    }

    let ret = entry.ret.instantiate(&bindings)?;
    Some(Ir::call(
        None,
        MethodRef {
            name: entry.name.clone(),
            ret,
            func: entry.native.clone(),
        },
        args,
    ))
}

/// Compile one argument against a concrete parameter type. Lambdas only
/// fit function-typed parameters; everything else must coerce.
fn compile_argument(c: &mut Compiler, token: &Token, want: &Ty) -> Option<Ir> {
    if let Token::Lambda { params, body } = token {
        let func = want.as_func()?;
        if func.params.len() != params.len() {
            return None;
        }
        return lambda::compile_lambda(c, params, body, &func.params, Some(&func.ret)).ok();
    }
    let ir = compile_token(c, token).ok()?;
    conversion::coerce(&c.registry, ir, want)
}

/// Compile one argument against a scheme-typed extension parameter,
/// binding type parameters as it goes.
fn compile_ext_argument(
    c: &mut Compiler,
    token: &Token,
    scheme: &TyScheme,
    bindings: &mut Vec<Option<Ty>>,
) -> Option<Ir> {
    if let Token::Lambda { params, body } = token {
        let TyScheme::Func(param_schemes, ret_scheme) = scheme else {
            return None;
        };
        if param_schemes.len() != params.len() {
            return None;
        }
        let param_tys: Vec<Ty> = param_schemes
            .iter()
            .map(|s| s.instantiate(bindings))
            .collect::<Option<_>>()?;
        // an open result scheme is inferred from the compiled body
        let expected_ret = ret_scheme.instantiate(bindings);
        let compiled =
            lambda::compile_lambda(c, params, body, &param_tys, expected_ret.as_ref()).ok()?;
        if expected_ret.is_none() {
            let lambda_ty = compiled.ty();
            let body_ret = lambda_ty.as_func()?.ret.clone();
            if !ret_scheme.unify(&body_ret, bindings) {
                return None;
            }
        }
        return Some(compiled);
    }

    let ir = compile_token(c, token).ok()?;
    match scheme.instantiate(bindings) {
        Some(want) => conversion::coerce(&c.registry, ir, &want),
        None => scheme.unify(&ir.ty(), bindings).then_some(ir),
    }
}

fn build_call(target: Option<Ir>, entry: &MethodEntry, args: Vec<Ir>) -> Ir {
    Ir::call(target, method_ref(entry), args)
}

fn method_ref(entry: &MethodEntry) -> MethodRef {
    MethodRef {
        name: entry.name.clone(),
        ret: entry.ret.clone(),
        func: entry.native.clone(),
    }
}

fn is_lambda(token: &Token) -> bool {
    matches!(token, Token::Lambda { .. })
}
