//! Core types shared by the expression parser and compiler.
//!
//! This crate provides:
//! - The runtime value model ([`Value`]) and static type model ([`Ty`])
//! - Stable structural type hashes ([`TypeHash`])
//! - Anonymous record shapes and instances ([`RecordShape`], [`RecordValue`])
//! - The typed intermediate representation ([`Ir`]) evaluated at runtime
//! - Native function handles and call-site argument access ([`NativeFn`],
//!   [`CallContext`])
//! - Shared evaluation settings ([`Settings`]): known constants, operator
//!   tables, lexing options
//! - Error types for each pipeline phase
//!
//! # Example
//!
//! ```
//! use dynexpr_core::{Settings, Value};
//!
//! let settings = Settings::new();
//! settings.add_known_value("answer", Value::Int32(42));
//! assert_eq!(settings.known_value("answer"), Some(Value::Int32(42)));
//! ```

// Error types
pub mod error;

// Structural type hashing
pub mod type_hash;

// Static type model
pub mod ty;

// Anonymous record shapes
pub mod record;

// Runtime values
pub mod value;

// Runtime numeric arithmetic and promotion
pub mod arith;

// Native function handles
pub mod native_fn;

// Typed intermediate representation
pub mod ir;

// Shared evaluation settings
pub mod settings;

// Re-export commonly used types at crate root
pub use error::{CompileError, EvalError, ExprError, ExprResult, SyntaxError};
pub use ir::{BinaryKind, IndexAccess, IndexerRef, Ir, MemberRef, MethodRef, UnaryKind};
pub use native_fn::{CallContext, Getter, IndexGetter, NativeCallable, NativeFn};
pub use record::{RecordMember, RecordShape, RecordValue};
pub use settings::{
    BinaryConverter, BinaryFn, BinaryOpInfo, Settings, UnaryConverter, UnaryFn,
    DEFAULT_PRECEDENCE,
};
pub use ty::{FuncTy, NamedTy, Ty};
pub use type_hash::TypeHash;
pub use value::{parse_datetime, ArrayValue, FuncValue, NativeObject, Value};
