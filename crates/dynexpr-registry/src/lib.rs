//! Type metadata crate.
//!
//! This crate holds the shared lookup tables the compiler resolves
//! members against. It includes:
//! - The [`TypeRegistry`] of classes with properties, methods, indexers,
//!   and base/interface links
//! - The [`ExtensionIndex`] of extension methods with generic receiver
//!   patterns
//! - The [`RecordFactory`] that interns anonymous record shapes
//! - Built-in classes (`string`, `Math`, `DateTime`, `Guid`, `Map`) and
//!   the sequence extension set, installed into the shared instances on
//!   first use
//!
//! # Example
//!
//! ```
//! use dynexpr_core::{NamedTy, Ty, Value};
//! use dynexpr_registry::{ClassEntry, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! registry.register(
//!     ClassEntry::new(NamedTy::plain("Person"))
//!         .with_property("Age", Ty::Int32, |_| Ok(Value::Int32(30))),
//! );
//! let person = Ty::Named(NamedTy::plain("Person"));
//! assert!(registry.find_property(&person, "Age", false).is_some());
//! ```

// Class and member entry module
pub mod entries;

// Type registry module
pub mod registry;

// Extension method index module
pub mod extensions;

// Record shape interning module
pub mod record_factory;

// Built-in classes and extensions module
pub mod builtins;

// Re-export commonly used types at crate root
pub use builtins::universal_to_string;
pub use entries::{ClassEntry, IndexerEntry, MemberFlags, MethodEntry, ParamDef, PropertyEntry};
pub use extensions::{ExtParam, ExtensionEntry, ExtensionIndex, TyScheme};
pub use record_factory::RecordFactory;
pub use registry::{find_static_methods, find_static_property, TypeRegistry};
