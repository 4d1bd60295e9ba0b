//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a type's registered name,
//! used as the registry key for host types and as the extension-index key.
//! Hashes are deterministic, so identity can be computed before (or without)
//! registration and there are no registration-order dependencies.
//!
//! Closed generic types mix their argument hashes into the definition hash
//! in order, so `Entity<Guid>` and `Entity<int>` are distinct while both can
//! be reduced to the open `Entity` definition by re-hashing the name alone.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constants so different entity kinds never collide on a name.
pub mod hash_constants {
    /// Separator folded between ordered components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type names.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for record-shape members.
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;

    /// Position markers so type-argument order matters.
    pub const ARG_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a registered type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a type name (the open definition for generic types).
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a closed generic instance: definition hash plus argument
    /// hashes, order-sensitive.
    #[inline]
    pub fn from_generic(definition: TypeHash, args: &[TypeHash]) -> Self {
        let mut hash = definition.0;
        for (i, arg) in args.iter().enumerate() {
            let marker = hash_constants::ARG_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::ARG_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps argument order significant (XOR would not)
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ arg.0);
        }
        TypeHash(hash)
    }

    /// Hash of one (name, type) record member, for signature folding.
    #[inline]
    pub fn from_member(name: &str, ty: TypeHash) -> Self {
        TypeHash(hash_constants::MEMBER ^ xxh64(name.as_bytes(), 0) ^ ty.0)
    }

    /// Check if this is the empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The underlying u64.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
