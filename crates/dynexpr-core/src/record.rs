//! Synthesized literal-record shapes and values.
//!
//! Object literals (`new { a = 4, b.c }`) compile against a [`RecordShape`]:
//! an immutable member list with an order-independent signature hash, so
//! `new { a = 4, b = 2 }` and `new { b = 2, a = 4 }` share one shape.
//! [`RecordValue`] pairs a shape with one value per member, is structurally
//! comparable, and renders as `{a=4, b=2}` in shape declaration order.

use std::fmt;
use std::sync::Arc;

use crate::ty::Ty;
use crate::type_hash::TypeHash;
use crate::value::Value;

/// One member of a record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMember {
    pub name: Arc<str>,
    pub ty: Ty,
}

/// An immutable literal-record shape.
///
/// Identity is the order-independent signature over (name, type) pairs;
/// member order is the declaration order of the first literal that
/// synthesized the shape and drives rendering only.
#[derive(Debug, Clone)]
pub struct RecordShape {
    members: Vec<RecordMember>,
    hash: TypeHash,
}

impl RecordShape {
    /// Build a shape from members in declaration order.
    pub fn new(members: Vec<RecordMember>) -> Self {
        let hash = Self::signature_of(members.iter().map(|m| (m.name.as_ref(), &m.ty)));
        RecordShape { members, hash }
    }

    /// Order-independent signature over (name, type) pairs.
    pub fn signature_of<'a>(members: impl Iterator<Item = (&'a str, &'a Ty)>) -> TypeHash {
        // XOR fold: commutative, so member order cannot matter
        let mut hash = 0u64;
        for (name, ty) in members {
            hash ^= TypeHash::from_member(name, ty.type_hash()).0;
        }
        TypeHash(hash)
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[RecordMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Slot index of a member by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name.as_ref() == name)
    }

    /// Case-insensitive slot lookup, for the ignore-member-case option.
    pub fn index_of_ignore_case(&self, name: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Signature hash identifying this shape.
    pub fn type_hash(&self) -> TypeHash {
        self.hash
    }

    /// True when this shape covers exactly the given (name, type) set,
    /// regardless of order.
    pub fn matches<'a>(&self, members: impl ExactSizeIterator<Item = (&'a str, &'a Ty)>) -> bool {
        if members.len() != self.members.len() {
            return false;
        }
        members.into_iter().all(|(name, ty)| {
            self.index_of(name)
                .is_some_and(|i| &self.members[i].ty == ty)
        })
    }
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self
                .matches(other.members.iter().map(|m| (m.name.as_ref(), &m.ty)))
    }
}

/// A record instance: one value per shape member, in shape order.
#[derive(Debug, Clone)]
pub struct RecordValue {
    pub shape: Arc<RecordShape>,
    pub values: Arc<Vec<Value>>,
}

impl RecordValue {
    pub fn new(shape: Arc<RecordShape>, values: Vec<Value>) -> Self {
        debug_assert_eq!(shape.len(), values.len());
        RecordValue {
            shape,
            values: Arc::new(values),
        }
    }

    /// Value of the member at `slot`.
    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    /// Value of a member by name.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.shape.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Order-independent structural hash over member names and values.
    pub fn structural_hash(&self) -> u64 {
        self.shape
            .members()
            .iter()
            .zip(self.values.iter())
            .fold(0u64, |acc, (member, value)| {
                acc ^ (TypeHash::from_member(&member.name, member.ty.type_hash()).0
                    ^ value.structural_hash())
            })
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        if self.shape.type_hash() != other.shape.type_hash() {
            return false;
        }
        self.shape.members().iter().zip(self.values.iter()).all(
            |(member, value)| other.get_named(&member.name) == Some(value),
        )
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (member, value)) in self
            .shape
            .members()
            .iter()
            .zip(self.values.iter())
            .enumerate()
        {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", member.name, value)?;
        }
        write!(f, "}}")
    }
}
