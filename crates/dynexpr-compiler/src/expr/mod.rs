//! Token-tree to IR compilation.
//!
//! [`Compiler`] carries everything resolution needs: settings (operator
//! tables, case options), the type registry, the extension index, the
//! record shape cache, and the external variable table. Each token form
//! compiles in its own submodule through a free function taking the
//! compiler context; [`compile_token`] dispatches exhaustively.
//!
//! The root entry is [`Compiler::compile`]: a `Lambda` root binds its
//! parameter names to the supplied types, any other root gets an
//! anonymous frame so a lone parameter stays reachable through the
//! member fallback.

pub(crate) mod binary;
pub(crate) mod calls;
pub(crate) mod identifiers;
pub(crate) mod lambda;
pub(crate) mod literals;
pub(crate) mod member;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use dynexpr_core::{
    CompileError, Ir, Settings, Ty, UnaryConverter, UnaryKind, Value,
};
use dynexpr_parser::Token;
use dynexpr_registry::{ClassEntry, ExtensionIndex, RecordFactory, TypeRegistry};

use crate::conversion;
use crate::eval::CompiledExpr;
use crate::scope::ScopeStack;

type Result<T> = std::result::Result<T, CompileError>;

/// Compilation context and entry point.
///
/// A compiler is configured once (variables, positional values, shared
/// tables) and consumed by [`Compiler::compile`].
pub struct Compiler {
    pub(crate) settings: Arc<Settings>,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) extensions: Arc<ExtensionIndex>,
    pub(crate) records: Arc<RecordFactory>,
    pub(crate) variables: FxHashMap<String, Value>,
    pub(crate) scope: ScopeStack,
}

impl Compiler {
    /// Compiler over the process-wide settings, registry and indexes.
    pub fn new() -> Self {
        Self::with_settings(Settings::global())
    }

    pub fn with_settings(settings: Arc<Settings>) -> Self {
        Compiler {
            settings,
            registry: TypeRegistry::global(),
            extensions: ExtensionIndex::global(),
            records: RecordFactory::global(),
            variables: FxHashMap::default(),
            scope: ScopeStack::new(),
        }
    }

    /// Swap in a private registry (tests, isolated hosts).
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Swap in a private extension index.
    pub fn with_extensions(mut self, extensions: Arc<ExtensionIndex>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Bind an external variable; its current value is captured as a
    /// constant at compile time.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Bind positional values as `@0`, `@1`, ... . A name already bound
    /// explicitly wins over its positional value.
    pub fn positionals(mut self, values: &[Value]) -> Self {
        for (index, value) in values.iter().enumerate() {
            self.variables
                .entry(format!("@{index}"))
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Compile a parsed tree against the given parameter types.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(mut self, token: &Token, params: &[Ty]) -> Result<CompiledExpr> {
        let ir = match token {
            Token::Lambda {
                params: names,
                body,
            } => {
                if names.len() != params.len() {
                    return Err(CompileError::ParameterCountMismatch {
                        expected: names.len(),
                        got: params.len(),
                    });
                }
                let frame: Vec<(Arc<str>, Ty)> = names
                    .iter()
                    .zip(params)
                    .map(|(name, ty)| (Arc::from(name.as_str()), ty.clone()))
                    .collect();
                self.scope.push_frame(&frame);
                compile_token(&mut self, body)?
            }
            _ => {
                let frame: Vec<(Arc<str>, Ty)> =
                    params.iter().map(|ty| (Arc::from(""), ty.clone())).collect();
                self.scope.push_frame(&frame);
                compile_token(&mut self, token)?
            }
        };
        Ok(CompiledExpr::new(ir, params.to_vec(), self.scope.slot_count()))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a parsed tree with default context and no bound variables.
pub fn compile(token: &Token, params: &[Ty]) -> Result<CompiledExpr> {
    Compiler::new().compile(token, params)
}

/// Compile any token in value position.
pub(crate) fn compile_token(c: &mut Compiler, token: &Token) -> Result<Ir> {
    match token {
        Token::Literal { value } => Ok(Ir::constant(value.clone())),
        Token::Variable { name } => identifiers::compile_variable(c, name),
        Token::Unary { op, target } => compile_unary(c, *op, target),
        Token::Binary { op, left, right } => binary::compile_binary(c, op, left, right),
        Token::Group { items } => match items.as_slice() {
            [single] => compile_token(c, single),
            _ => Err(CompileError::MisplacedToken {
                kind: token.kind_name(),
            }),
        },
        Token::Assign { .. } => Err(CompileError::MisplacedToken {
            kind: token.kind_name(),
        }),
        Token::Object { members } => literals::compile_object(c, members),
        Token::Array { items } => literals::compile_array(c, items),
        Token::Member { owner, name } => member::compile_member(c, owner, name),
        Token::Indexer { owner, key } => member::compile_indexer(c, owner, key),
        Token::Call { callee, args } => calls::compile_call(c, callee, args),
        Token::Lambda { .. } => Err(CompileError::MisplacedLambda),
        Token::Ternary {
            predicate,
            when_true,
            when_false,
        } => compile_ternary(c, predicate, when_true, when_false),
    }
}

/// What a call or member owner resolves to.
pub(crate) enum Resolved {
    Value(Ir),
    /// A bare static class name; only `Member` and `Call` consume it.
    StaticClass(Arc<ClassEntry>),
}

/// Resolve an owner position, keeping static class names symbolic.
pub(crate) fn compile_owner(c: &mut Compiler, owner: &Token) -> Result<Resolved> {
    if let Token::Variable { name } = owner {
        return identifiers::resolve_name(c, name);
    }
    Ok(Resolved::Value(compile_token(c, owner)?))
}

/// Name comparison under the ignore-member-case setting.
pub(crate) fn name_matches(declared: &str, requested: &str, ignore_case: bool) -> bool {
    if ignore_case {
        declared.eq_ignore_ascii_case(requested)
    } else {
        declared == requested
    }
}

fn compile_unary(c: &mut Compiler, op: char, target: &Token) -> Result<Ir> {
    let converter = c
        .settings
        .unary_converter(op)
        .ok_or(CompileError::UnknownUnaryOperator { op })?;
    let operand = compile_token(c, target)?;
    match converter {
        UnaryConverter::Custom(lower) => lower(operand),
        UnaryConverter::Builtin(kind) => {
            let ty = match kind {
                UnaryKind::Not => Ty::Bool,
                // negation promotes like the runtime will
                UnaryKind::Negate => match operand.ty().unwrap_nullable() {
                    Ty::Float32 => Ty::Float32,
                    Ty::Float64 => Ty::Float64,
                    Ty::UInt32 | Ty::UInt64 | Ty::Int64 => Ty::Int64,
                    _ => Ty::Int32,
                },
                UnaryKind::UnaryPlus | UnaryKind::OnesComplement => operand.ty(),
            };
            Ok(Ir::Unary {
                kind,
                operand: Box::new(operand),
                ty,
            })
        }
    }
}

fn compile_ternary(
    c: &mut Compiler,
    predicate: &Token,
    when_true: &Token,
    when_false: &Token,
) -> Result<Ir> {
    let predicate = compile_token(c, predicate)?;
    if predicate.ty() != Ty::Bool {
        return Err(CompileError::PredicateNotBool {
            found: predicate.ty().to_string(),
        });
    }
    let when_true = compile_token(c, when_true)?;
    let when_false = compile_token(c, when_false)?;
    let (when_true, when_false, ty) = unify_branches(c, when_true, when_false);
    Ok(Ir::Conditional {
        predicate: Box::new(predicate),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
        ty,
    })
}

/// Agree on one result type for the two branches: equal types, a null
/// literal adopting the other side's nullable form, a widening either
/// way, or `object` as the last resort.
fn unify_branches(c: &Compiler, when_true: Ir, when_false: Ir) -> (Ir, Ir, Ty) {
    let true_ty = when_true.ty();
    let false_ty = when_false.ty();
    if true_ty == false_ty {
        return (when_true, when_false, true_ty);
    }
    if when_true.is_null_literal() {
        let ty = conversion::nullable_form(&false_ty);
        return (
            Ir::typed_constant(Value::Null, ty.clone()),
            when_false,
            ty,
        );
    }
    if when_false.is_null_literal() {
        let ty = conversion::nullable_form(&true_ty);
        return (
            when_true,
            Ir::typed_constant(Value::Null, ty.clone()),
            ty,
        );
    }
    if let Some(widened) = conversion::coerce(&c.registry, when_false.clone(), &true_ty) {
        return (when_true, widened, true_ty);
    }
    if let Some(widened) = conversion::coerce(&c.registry, when_true.clone(), &false_ty) {
        return (widened, when_false, false_ty);
    }
    (when_true, when_false, Ty::Object)
}
