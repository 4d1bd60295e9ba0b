//! Typed intermediate representation produced by the compiler.
//!
//! Every node carries its static result type, and resolution results
//! (property getters, method handles, indexer accessors) are embedded
//! directly, so evaluating the tree never consults a registry.
//!
//! Custom operator converters build nodes through the constructor helpers
//! ([`Ir::binary`], [`Ir::call`], ...), which compute result types.

use std::fmt;
use std::sync::Arc;

use crate::native_fn::{Getter, IndexGetter, NativeFn};
use crate::record::RecordShape;
use crate::ty::{FuncTy, Ty};
use crate::value::Value;

/// Built-in unary operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    Negate,
    UnaryPlus,
    Not,
    OnesComplement,
}

impl UnaryKind {
    /// Kind for a default-table operator char.
    pub fn from_char(op: char) -> Option<UnaryKind> {
        match op {
            '-' => Some(UnaryKind::Negate),
            '+' => Some(UnaryKind::UnaryPlus),
            '!' => Some(UnaryKind::Not),
            '~' => Some(UnaryKind::OnesComplement),
            _ => None,
        }
    }
}

/// Built-in binary operation kinds.
///
/// `AndAlso`/`OrElse` are the short-circuit forms of `And`/`Or`;
/// `Coalesce` takes the right side only when the left is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    AndAlso,
    OrElse,
    Coalesce,
    And,
    Or,
    ExclusiveOr,
    Equal,
    NotEqual,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LessThan,
    GreaterThan,
    LeftShift,
    RightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryKind {
    /// Kind for a default-table operator spelling.
    pub fn from_op(op: &str) -> Option<BinaryKind> {
        match op {
            "&&" => Some(BinaryKind::AndAlso),
            "||" => Some(BinaryKind::OrElse),
            "??" => Some(BinaryKind::Coalesce),
            "&" => Some(BinaryKind::And),
            "|" => Some(BinaryKind::Or),
            "^" => Some(BinaryKind::ExclusiveOr),
            "==" => Some(BinaryKind::Equal),
            "!=" => Some(BinaryKind::NotEqual),
            "<=" => Some(BinaryKind::LessThanOrEqual),
            ">=" => Some(BinaryKind::GreaterThanOrEqual),
            "<" => Some(BinaryKind::LessThan),
            ">" => Some(BinaryKind::GreaterThan),
            "<<" => Some(BinaryKind::LeftShift),
            ">>" => Some(BinaryKind::RightShift),
            "+" => Some(BinaryKind::Add),
            "-" => Some(BinaryKind::Subtract),
            "*" => Some(BinaryKind::Multiply),
            "/" => Some(BinaryKind::Divide),
            "%" => Some(BinaryKind::Modulo),
            _ => None,
        }
    }

    /// True for kinds whose result is always boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryKind::Equal
                | BinaryKind::NotEqual
                | BinaryKind::LessThanOrEqual
                | BinaryKind::GreaterThanOrEqual
                | BinaryKind::LessThan
                | BinaryKind::GreaterThan
        )
    }
}

/// A resolved method: display name, result type, invocable handle.
#[derive(Clone)]
pub struct MethodRef {
    pub name: Arc<str>,
    pub ret: Ty,
    pub func: NativeFn,
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodRef({} -> {})", self.name, self.ret)
    }
}

/// A resolved property or field read.
#[derive(Clone)]
pub struct MemberRef {
    pub name: Arc<str>,
    pub ty: Ty,
    pub getter: Getter,
}

impl fmt::Debug for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberRef({}: {})", self.name, self.ty)
    }
}

/// A resolved single-parameter indexer.
#[derive(Clone)]
pub struct IndexerRef {
    pub ret: Ty,
    pub get: IndexGetter,
}

impl fmt::Debug for IndexerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexerRef(-> {})", self.ret)
    }
}

/// How an index read resolves.
#[derive(Debug, Clone)]
pub enum IndexAccess {
    /// Direct array element access (integer key).
    Element,
    /// Through a registered indexer.
    Indexer(IndexerRef),
}

/// A typed IR node.
#[derive(Debug, Clone)]
pub enum Ir {
    Constant {
        value: Value,
        ty: Ty,
    },
    ParameterRef {
        slot: usize,
        ty: Ty,
    },
    MemberRead {
        owner: Box<Ir>,
        member: MemberRef,
    },
    IndexRead {
        owner: Box<Ir>,
        key: Box<Ir>,
        access: IndexAccess,
        ty: Ty,
    },
    Call {
        /// None for static and extension calls (owner folded into args).
        target: Option<Box<Ir>>,
        method: MethodRef,
        args: Vec<Ir>,
    },
    RecordInit {
        shape: Arc<RecordShape>,
        /// (shape slot, expression), in literal declaration order.
        bindings: Vec<(usize, Ir)>,
    },
    ArrayNew {
        elem: Ty,
        items: Vec<Ir>,
    },
    Conditional {
        predicate: Box<Ir>,
        when_true: Box<Ir>,
        when_false: Box<Ir>,
        ty: Ty,
    },
    Convert {
        operand: Box<Ir>,
        ty: Ty,
    },
    Unary {
        kind: UnaryKind,
        operand: Box<Ir>,
        ty: Ty,
    },
    Binary {
        kind: BinaryKind,
        left: Box<Ir>,
        right: Box<Ir>,
        ty: Ty,
    },
    Lambda {
        /// Environment slots the parameters bind, in declaration order.
        param_slots: Vec<usize>,
        func_ty: Box<FuncTy>,
        body: Box<Ir>,
    },
}

impl Ir {
    /// Constant typed by the value itself.
    pub fn constant(value: Value) -> Ir {
        let ty = value.ty();
        Ir::Constant { value, ty }
    }

    /// Constant with an explicit static type (typed nulls, nullable
    /// constants).
    pub fn typed_constant(value: Value, ty: Ty) -> Ir {
        Ir::Constant { value, ty }
    }

    /// Unary node; the result keeps the operand's type (`!` on bool stays
    /// bool, `~`/`-`/`+` keep the numeric rank).
    pub fn unary(kind: UnaryKind, operand: Ir) -> Ir {
        let ty = operand.ty();
        Ir::Unary {
            kind,
            operand: Box::new(operand),
            ty,
        }
    }

    /// Binary node with the kind's natural result type: comparisons and
    /// logicals produce bool, coalesce strips the left's nullability,
    /// everything else keeps the left operand's type.
    pub fn binary(kind: BinaryKind, left: Ir, right: Ir) -> Ir {
        let ty = match kind {
            _ if kind.is_comparison() => Ty::Bool,
            BinaryKind::AndAlso | BinaryKind::OrElse => Ty::Bool,
            BinaryKind::Coalesce => left.ty().unwrap_nullable().clone(),
            _ => left.ty(),
        };
        Ir::Binary {
            kind,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    /// Binary node with an explicit result type (string concatenation).
    pub fn binary_typed(kind: BinaryKind, left: Ir, right: Ir, ty: Ty) -> Ir {
        Ir::Binary {
            kind,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    pub fn convert(operand: Ir, ty: Ty) -> Ir {
        Ir::Convert {
            operand: Box::new(operand),
            ty,
        }
    }

    pub fn call(target: Option<Ir>, method: MethodRef, args: Vec<Ir>) -> Ir {
        Ir::Call {
            target: target.map(Box::new),
            method,
            args,
        }
    }

    /// Static result type of this node.
    pub fn ty(&self) -> Ty {
        match self {
            Ir::Constant { ty, .. } => ty.clone(),
            Ir::ParameterRef { ty, .. } => ty.clone(),
            Ir::MemberRead { member, .. } => member.ty.clone(),
            Ir::IndexRead { ty, .. } => ty.clone(),
            Ir::Call { method, .. } => method.ret.clone(),
            Ir::RecordInit { shape, .. } => Ty::Record(shape.clone()),
            Ir::ArrayNew { elem, .. } => elem.clone().array_of(),
            Ir::Conditional { ty, .. } => ty.clone(),
            Ir::Convert { ty, .. } => ty.clone(),
            Ir::Unary { ty, .. } => ty.clone(),
            Ir::Binary { ty, .. } => ty.clone(),
            Ir::Lambda { func_ty, .. } => Ty::Func(func_ty.clone()),
        }
    }

    /// The literal string when this node is a plain string constant.
    /// Used by the Guid/DateTime comparison coercions.
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Ir::Constant {
                value: Value::Str(s),
                ty: Ty::Str,
            } => Some(s),
            _ => None,
        }
    }

    /// True for a constant null (the untyped `null` literal or a typed
    /// null constant).
    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            Ir::Constant {
                value: Value::Null,
                ..
            }
        )
    }
}
