//! Compilation of parsed expression trees into invocable typed trees.
//!
//! The compiler resolves everything the parser left symbolic:
//! - Identifiers, against bound variables, known constants, lambda
//!   parameters, and registered static classes
//! - Members, indexers, and method calls, against the type registry,
//!   with overload selection, trailing parameter defaults, and
//!   extension-method candidates
//! - Operators, against the operator tables in [`dynexpr_core::Settings`]
//!   with numeric promotion and null lifting
//! - Object literals, against interned record shapes
//!
//! The result is a [`CompiledExpr`]: a typed tree plus its parameter
//! signature, invoked with one value per parameter.
//!
//! # Example
//!
//! ```
//! use dynexpr_compiler::Compiler;
//! use dynexpr_core::{Ty, Value};
//! use dynexpr_parser::Parser;
//!
//! let token = Parser::parse("(a, b) => a * 10 + b")?;
//! let expr = Compiler::new().compile(&token, &[Ty::Int32, Ty::Int32])?;
//! assert_eq!(expr.invoke(&[Value::Int32(4), Value::Int32(2)])?, Value::Int32(42));
//! # Ok::<(), dynexpr_core::ExprError>(())
//! ```

// Compile-time coercion rules and runtime value conversion
mod conversion;

// Lambda parameter frames and slot allocation
mod scope;

// Token-tree compilation
pub mod expr;

// Compiled expressions and the tree-walking evaluator
pub mod eval;

pub use eval::CompiledExpr;
pub use expr::{compile, Compiler};
