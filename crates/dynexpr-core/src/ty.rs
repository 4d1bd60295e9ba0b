//! Static type model for compiled expressions.
//!
//! [`Ty`] is a closed sum over every type the compiler can reason about:
//! the primitive ranks, strings, Guid/DateTime, nullable and array wrappers,
//! function types, synthesized record shapes, and registered host types
//! ([`NamedTy`]). Every IR node carries one.

use std::fmt;
use std::sync::Arc;

use crate::record::RecordShape;
use crate::type_hash::TypeHash;

/// A registered host type or interface, possibly a closed generic.
///
/// `hash` identifies the closed instance; the open definition is always
/// recoverable as `TypeHash::from_name(&name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTy {
    pub name: Arc<str>,
    pub hash: TypeHash,
    pub args: Arc<[Ty]>,
}

impl NamedTy {
    /// A non-generic named type.
    pub fn plain(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let hash = TypeHash::from_name(&name);
        NamedTy {
            name,
            hash,
            args: Arc::from([]),
        }
    }

    /// A closed generic instance, e.g. `Entity<Guid>`.
    pub fn generic(name: impl Into<Arc<str>>, args: impl Into<Arc<[Ty]>>) -> Self {
        let name = name.into();
        let args: Arc<[Ty]> = args.into();
        let definition = TypeHash::from_name(&name);
        let arg_hashes: Vec<TypeHash> = args.iter().map(Ty::type_hash).collect();
        let hash = if arg_hashes.is_empty() {
            definition
        } else {
            TypeHash::from_generic(definition, &arg_hashes)
        };
        NamedTy { name, hash, args }
    }

    /// Hash of the open definition (name alone, argument-agnostic).
    pub fn definition_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.name)
    }
}

/// Signature of a function type: parameter types and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncTy {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

/// Static type of a value or IR node.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    /// Untyped object: the type of a bare `null`, map values, and the
    /// element type of an empty array literal. Every type widens to it.
    Object,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Char,
    Str,
    Guid,
    DateTime,
    /// A value type that may also be null.
    Nullable(Box<Ty>),
    /// Homogeneous array with a static element type.
    Array(Box<Ty>),
    /// String-keyed dynamic bag; members resolve through its indexer.
    Map,
    /// Function type of lambda arguments and callable values.
    Func(Box<FuncTy>),
    /// Synthesized literal-record shape.
    Record(Arc<RecordShape>),
    /// Registered host type or interface.
    Named(NamedTy),
}

impl Ty {
    /// Wrap in `Nullable`, collapsing double wrapping.
    pub fn nullable(self) -> Ty {
        match self {
            Ty::Nullable(_) | Ty::Object => self,
            other => Ty::Nullable(Box::new(other)),
        }
    }

    /// Array-of-self.
    pub fn array_of(self) -> Ty {
        Ty::Array(Box::new(self))
    }

    /// Function type from parts.
    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(Box::new(FuncTy { params, ret }))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Ty::Nullable(_))
    }

    /// The wrapped type for `Nullable`, self otherwise.
    pub fn unwrap_nullable(&self) -> &Ty {
        match self {
            Ty::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Ty::Int8
                | Ty::Int16
                | Ty::Int32
                | Ty::Int64
                | Ty::UInt8
                | Ty::UInt16
                | Ty::UInt32
                | Ty::UInt64
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Ty::Float32 | Ty::Float64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating() || matches!(self, Ty::Char)
    }

    pub fn as_func(&self) -> Option<&FuncTy> {
        match self {
            Ty::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_array_elem(&self) -> Option<&Ty> {
        match self {
            Ty::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Canonical hash identity for this type.
    ///
    /// Structural wrappers hash as generics over well-known definition
    /// names, so `int[]` has one identity everywhere.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Ty::Object => TypeHash::from_name("object"),
            Ty::Bool => TypeHash::from_name("bool"),
            Ty::Int8 => TypeHash::from_name("sbyte"),
            Ty::Int16 => TypeHash::from_name("short"),
            Ty::Int32 => TypeHash::from_name("int"),
            Ty::Int64 => TypeHash::from_name("long"),
            Ty::UInt8 => TypeHash::from_name("byte"),
            Ty::UInt16 => TypeHash::from_name("ushort"),
            Ty::UInt32 => TypeHash::from_name("uint"),
            Ty::UInt64 => TypeHash::from_name("ulong"),
            Ty::Float32 => TypeHash::from_name("float"),
            Ty::Float64 => TypeHash::from_name("double"),
            Ty::Char => TypeHash::from_name("char"),
            Ty::Str => TypeHash::from_name("string"),
            Ty::Guid => TypeHash::from_name("Guid"),
            Ty::DateTime => TypeHash::from_name("DateTime"),
            Ty::Map => TypeHash::from_name("Map"),
            Ty::Nullable(inner) => {
                TypeHash::from_generic(TypeHash::from_name("Nullable"), &[inner.type_hash()])
            }
            Ty::Array(elem) => {
                TypeHash::from_generic(TypeHash::from_name("Array"), &[elem.type_hash()])
            }
            Ty::Func(f) => {
                let mut hashes: Vec<TypeHash> = f.params.iter().map(Ty::type_hash).collect();
                hashes.push(f.ret.type_hash());
                TypeHash::from_generic(TypeHash::from_name("Func"), &hashes)
            }
            Ty::Record(shape) => shape.type_hash(),
            Ty::Named(named) => named.hash,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Object => write!(f, "object"),
            Ty::Bool => write!(f, "bool"),
            Ty::Int8 => write!(f, "sbyte"),
            Ty::Int16 => write!(f, "short"),
            Ty::Int32 => write!(f, "int"),
            Ty::Int64 => write!(f, "long"),
            Ty::UInt8 => write!(f, "byte"),
            Ty::UInt16 => write!(f, "ushort"),
            Ty::UInt32 => write!(f, "uint"),
            Ty::UInt64 => write!(f, "ulong"),
            Ty::Float32 => write!(f, "float"),
            Ty::Float64 => write!(f, "double"),
            Ty::Char => write!(f, "char"),
            Ty::Str => write!(f, "string"),
            Ty::Guid => write!(f, "Guid"),
            Ty::DateTime => write!(f, "DateTime"),
            Ty::Map => write!(f, "Map"),
            Ty::Nullable(inner) => write!(f, "{inner}?"),
            Ty::Array(elem) => write!(f, "{elem}[]"),
            Ty::Func(func) => {
                write!(f, "Func<")?;
                for p in &func.params {
                    write!(f, "{p}, ")?;
                }
                write!(f, "{}>", func.ret)
            }
            Ty::Record(shape) => {
                write!(f, "{{")?;
                for (i, member) in shape.members().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", member.name, member.ty)?;
                }
                write!(f, "}}")
            }
            Ty::Named(named) => {
                write!(f, "{}", named.name)?;
                if !named.args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in named.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_collapses() {
        let t = Ty::Int32.nullable().nullable();
        assert_eq!(t, Ty::Nullable(Box::new(Ty::Int32)));
        assert_eq!(t.unwrap_nullable(), &Ty::Int32);
        assert_eq!(Ty::Object.nullable(), Ty::Object);
    }

    #[test]
    fn classification_helpers() {
        assert!(Ty::Int32.is_integer());
        assert!(Ty::UInt16.is_integer());
        assert!(!Ty::Float32.is_integer());
        assert!(Ty::Float64.is_floating());
        assert!(Ty::Char.is_numeric());
        assert!(!Ty::Str.is_numeric());
    }

    #[test]
    fn structural_type_hashes_are_stable() {
        assert_eq!(Ty::Int32.array_of().type_hash(), Ty::Int32.array_of().type_hash());
        assert_ne!(Ty::Int32.array_of().type_hash(), Ty::Str.array_of().type_hash());
        assert_ne!(
            Ty::Int32.nullable().type_hash(),
            Ty::Int32.type_hash()
        );
    }

    #[test]
    fn named_generic_identity() {
        let open = NamedTy::plain("Entity");
        let closed = NamedTy::generic("Entity", vec![Ty::Guid]);
        assert_ne!(open.hash, closed.hash);
        assert_eq!(closed.definition_hash(), open.hash);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Ty::Int32.to_string(), "int");
        assert_eq!(Ty::Int32.nullable().to_string(), "int?");
        assert_eq!(Ty::Str.array_of().to_string(), "string[]");
        assert_eq!(
            Ty::func(vec![Ty::Int32], Ty::Bool).to_string(),
            "Func<int, bool>"
        );
        assert_eq!(
            Ty::Named(NamedTy::generic("Entity", vec![Ty::Guid])).to_string(),
            "Entity<Guid>"
        );
    }
}
