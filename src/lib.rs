//! Compile C#-flavored expression strings into typed, invocable
//! closures.
//!
//! The pipeline has two stages: a single-pass recursive-descent parser
//! producing a [`Token`] tree, and a compiler resolving names, members,
//! operators, overloads, extension methods, and implicit conversions
//! against a type registry, producing a [`CompiledExpr`] that evaluates
//! with one [`Value`] per declared parameter.
//!
//! # Quick start
//!
//! ```
//! use dynexpr::{eval, Value};
//!
//! assert_eq!(eval("1 + 2 * 3")?, Value::Int32(7));
//! assert_eq!(eval("$\"4{1 + 1}\"")?, Value::from("42"));
//! # Ok::<(), dynexpr::ExprError>(())
//! ```
//!
//! Expressions with parameters compile once and invoke many times:
//!
//! ```
//! use dynexpr::{parse_and_compile, Ty, Value};
//!
//! let expr = parse_and_compile("(a, b) => a > b ? a : b", &[Ty::Int32, Ty::Int32])?;
//! assert_eq!(expr.invoke(&[Value::Int32(4), Value::Int32(7)])?, Value::Int32(7));
//! # Ok::<(), dynexpr::ExprError>(())
//! ```
//!
//! Or as a plain typed closure:
//!
//! ```
//! use dynexpr::{to_fn1, Ty};
//!
//! let double = to_fn1::<i32, i32>("x => x * 2", Ty::Int32)?;
//! assert_eq!(double(21)?, 42);
//! # Ok::<(), dynexpr::ExprError>(())
//! ```
//!
//! Host types, methods, and extension methods register through
//! [`TypeRegistry`] and [`ExtensionIndex`]; operator tables, known
//! constants, and lexing options live on [`Settings`].

mod evaluator;

pub use dynexpr_core::{
    ArrayValue, BinaryConverter, BinaryKind, BinaryOpInfo, CallContext, CompileError, EvalError,
    ExprError, ExprResult, FuncTy, FuncValue, Getter, IndexGetter, Ir, NamedTy, NativeCallable,
    NativeFn, NativeObject, RecordMember, RecordShape, RecordValue, Settings, SyntaxError, Ty,
    TypeHash, UnaryConverter, UnaryKind, Value, DEFAULT_PRECEDENCE,
};

pub use dynexpr_parser::{Parser, Token};

pub use dynexpr_registry::{
    ClassEntry, ExtParam, ExtensionEntry, ExtensionIndex, IndexerEntry, MemberFlags, MethodEntry,
    ParamDef, PropertyEntry, RecordFactory, TyScheme, TypeRegistry,
};

pub use dynexpr_compiler::{CompiledExpr, Compiler};

pub use evaluator::{
    compile, eval, eval_with, parse, parse_and_compile, parse_with, to_fn0, to_fn1, to_fn2,
    Evaluator,
};

pub mod prelude {
    pub use crate::{
        compile, eval, eval_with, parse, parse_and_compile, parse_with, CompileError,
        CompiledExpr, Compiler, EvalError, Evaluator, ExprError, ExprResult, Settings,
        SyntaxError, Token, Ty, Value,
    };
}
