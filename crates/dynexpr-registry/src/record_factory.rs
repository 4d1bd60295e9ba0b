//! Process-wide cache of synthesized record shapes.
//!
//! Object literals with the same member names and types, in any order,
//! must compile against the same [`RecordShape`] so their values compare
//! and hash interchangeably. The factory keys shapes by their
//! order-independent signature and hands out shared `Arc`s.

use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use dynexpr_core::{RecordMember, RecordShape, TypeHash};

lazy_static! {
    static ref GLOBAL_FACTORY: Arc<RecordFactory> = Arc::new(RecordFactory::new());
}

/// Shape cache keyed by signature hash.
pub struct RecordFactory {
    shapes: RwLock<FxHashMap<TypeHash, Arc<RecordShape>>>,
}

impl RecordFactory {
    pub fn new() -> Self {
        RecordFactory {
            shapes: RwLock::new(FxHashMap::default()),
        }
    }

    /// The shared instance.
    pub fn global() -> Arc<RecordFactory> {
        GLOBAL_FACTORY.clone()
    }

    /// The canonical shape for a member list. The first caller's member
    /// order becomes the shape's declaration order; later callers with a
    /// permuted list get the same shape back.
    pub fn shape_for(&self, members: Vec<RecordMember>) -> Arc<RecordShape> {
        let signature =
            RecordShape::signature_of(members.iter().map(|m| (m.name.as_ref(), &m.ty)));

        if let Ok(shapes) = self.shapes.read() {
            if let Some(shape) = shapes.get(&signature) {
                return shape.clone();
            }
        }

        // double-checked: another thread may have inserted between the
        // read and this write
        let shape = Arc::new(RecordShape::new(members));
        if let Ok(mut shapes) = self.shapes.write() {
            return shapes.entry(signature).or_insert_with(|| shape.clone()).clone();
        }
        shape
    }

    /// Number of distinct shapes synthesized so far.
    pub fn len(&self) -> usize {
        self.shapes.read().map(|shapes| shapes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::Ty;

    fn member(name: &str, ty: Ty) -> RecordMember {
        RecordMember {
            name: Arc::from(name),
            ty,
        }
    }

    #[test]
    fn same_member_set_shares_one_shape() {
        let factory = RecordFactory::new();
        let ab = factory.shape_for(vec![member("a", Ty::Int32), member("b", Ty::Str)]);
        let ba = factory.shape_for(vec![member("b", Ty::Str), member("a", Ty::Int32)]);
        assert!(Arc::ptr_eq(&ab, &ba));
        assert_eq!(factory.len(), 1);
        // declaration order of the first caller wins
        assert_eq!(ab.members()[0].name.as_ref(), "a");
    }

    #[test]
    fn different_members_get_different_shapes() {
        let factory = RecordFactory::new();
        let int_b = factory.shape_for(vec![member("a", Ty::Int32), member("b", Ty::Int32)]);
        let str_b = factory.shape_for(vec![member("a", Ty::Int32), member("b", Ty::Str)]);
        assert!(!Arc::ptr_eq(&int_b, &str_b));
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn global_instance_is_shared() {
        let a = RecordFactory::global();
        let b = RecordFactory::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
