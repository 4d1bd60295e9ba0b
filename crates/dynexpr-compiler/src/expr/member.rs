//! Member and index access.
//!
//! Member lookup order: structural members (array `Length`, record
//! members), registered instance properties then fields along the base
//! chain, then a string-keyed indexer answering for the name (maps).
//! Static class owners resolve against static properties instead.

use std::sync::Arc;

use dynexpr_core::{
    CompileError, EvalError, Getter, IndexAccess, IndexerRef, Ir, MemberRef, Ty, Value,
};
use dynexpr_parser::Token;
use dynexpr_registry::{find_static_property, ClassEntry};

use super::{compile_owner, compile_token, name_matches, Compiler, Resolved};
use crate::conversion;

type Result<T> = std::result::Result<T, CompileError>;

pub(crate) fn compile_member(c: &mut Compiler, owner: &Token, name: &str) -> Result<Ir> {
    match compile_owner(c, owner)? {
        Resolved::StaticClass(entry) => static_member(c, &entry, name),
        Resolved::Value(owner) => member_read(c, owner, name),
    }
}

/// Resolve `name` on an already-compiled owner.
pub(crate) fn member_read(c: &Compiler, owner: Ir, name: &str) -> Result<Ir> {
    let ignore_case = c.settings.ignore_member_case();
    let owner_ty = owner.ty();
    let ty = owner_ty.unwrap_nullable().clone();

    if let Ty::Array(_) = &ty {
        if name_matches("Length", name, ignore_case) {
            let getter: Getter = Arc::new(|v| Ok(Value::Int32(v.as_array()?.len() as i32)));
            return Ok(read(
                owner,
                MemberRef {
                    name: Arc::from("Length"),
                    ty: Ty::Int32,
                    getter,
                },
            ));
        }
    }

    if let Ty::Record(shape) = &ty {
        let slot = if ignore_case {
            shape.index_of_ignore_case(name)
        } else {
            shape.index_of(name)
        };
        if let Some((slot, field)) =
            slot.and_then(|slot| shape.members().get(slot).map(|m| (slot, m)))
        {
            let field_name = field.name.clone();
            let getter: Getter = Arc::new(move |v| match v {
                Value::Record(record) => {
                    record
                        .get(slot)
                        .cloned()
                        .ok_or_else(|| EvalError::KeyNotFound {
                            key: field_name.to_string(),
                        })
                }
                other => Err(EvalError::TypeMismatch {
                    expected: "a record".to_string(),
                    found: other.ty().to_string(),
                }),
            });
            return Ok(read(
                owner,
                MemberRef {
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    getter,
                },
            ));
        }
    }

    if let Some(prop) = c.registry.find_property(&ty, name, ignore_case) {
        return Ok(read(
            owner,
            MemberRef {
                name: prop.name,
                ty: prop.ty,
                getter: prop.getter,
            },
        ));
    }

    if let Some(field) = c.registry.find_field(&ty, name, ignore_case) {
        return Ok(read(
            owner,
            MemberRef {
                name: field.name,
                ty: field.ty,
                getter: field.getter,
            },
        ));
    }

    // a string-keyed indexer answers for unresolved member names
    if let Some(indexer) = c.registry.indexer_of(&ty) {
        if indexer.key == Ty::Str {
            let ret = indexer.ret.clone();
            return Ok(Ir::IndexRead {
                owner: Box::new(owner),
                key: Box::new(Ir::constant(Value::from(name))),
                access: IndexAccess::Indexer(IndexerRef {
                    ret: indexer.ret,
                    get: indexer.get,
                }),
                ty: ret,
            });
        }
    }

    Err(CompileError::UnknownMember {
        name: name.to_string(),
        owner: owner_ty.to_string(),
    })
}

/// `Class.Property` for a registered static class.
fn static_member(c: &Compiler, entry: &ClassEntry, name: &str) -> Result<Ir> {
    let prop = find_static_property(&c.registry, entry, name, c.settings.ignore_member_case())
        .ok_or_else(|| CompileError::UnknownMember {
            name: name.to_string(),
            owner: entry.ty.name.to_string(),
        })?;
    // static getters ignore their receiver; the constant-null owner also
    // marks the read as static for the evaluator's null check
    Ok(read(
        Ir::typed_constant(Value::Null, Ty::Object),
        MemberRef {
            name: prop.name,
            ty: prop.ty,
            getter: prop.getter,
        },
    ))
}

pub(crate) fn compile_indexer(c: &mut Compiler, owner: &Token, key: &Token) -> Result<Ir> {
    let owner = match compile_owner(c, owner)? {
        Resolved::Value(ir) => ir,
        Resolved::StaticClass(entry) => {
            return Err(CompileError::UnknownIndexer {
                owner: entry.ty.name.to_string(),
            });
        }
    };
    let key = compile_token(c, key)?;
    let owner_ty = owner.ty();
    let ty = owner_ty.unwrap_nullable().clone();

    if let Ty::Array(elem) = &ty {
        if key.ty().unwrap_nullable().is_integer() {
            return Ok(Ir::IndexRead {
                owner: Box::new(owner),
                key: Box::new(key),
                access: IndexAccess::Element,
                ty: (**elem).clone(),
            });
        }
    }

    if let Some(indexer) = c.registry.indexer_of(&ty) {
        if let Some(key) = conversion::coerce(&c.registry, key, &indexer.key) {
            let ret = indexer.ret.clone();
            return Ok(Ir::IndexRead {
                owner: Box::new(owner),
                key: Box::new(key),
                access: IndexAccess::Indexer(IndexerRef {
                    ret: indexer.ret,
                    get: indexer.get,
                }),
                ty: ret,
            });
        }
    }

    Err(CompileError::UnknownIndexer {
        owner: owner_ty.to_string(),
    })
}

fn read(owner: Ir, member: MemberRef) -> Ir {
    Ir::MemberRead {
        owner: Box::new(owner),
        member,
    }
}
