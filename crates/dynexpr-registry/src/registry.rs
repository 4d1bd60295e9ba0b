//! Process-wide type registry.
//!
//! Maps [`TypeHash`]es to [`ClassEntry`]s and resolves members with
//! base-chain walking. Built-in classes (string members, `Math`,
//! `DateTime`, `Guid`, `Map`) install into the global instance on first
//! access; hosts add their own classes with [`TypeRegistry::register`].

use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use dynexpr_core::{NamedTy, Ty, TypeHash};

use crate::entries::{ClassEntry, IndexerEntry, MethodEntry, PropertyEntry};

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<TypeRegistry> = {
        let registry = TypeRegistry::new();
        crate::builtins::install_types(&registry);
        Arc::new(registry)
    };
}

/// Thread-safe registry of classes keyed by type hash.
pub struct TypeRegistry {
    classes: RwLock<FxHashMap<TypeHash, Arc<ClassEntry>>>,
    static_names: RwLock<FxHashMap<String, TypeHash>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            classes: RwLock::new(FxHashMap::default()),
            static_names: RwLock::new(FxHashMap::default()),
        }
    }

    /// The shared instance, with built-ins installed.
    pub fn global() -> Arc<TypeRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Register a class. Entries become visible to concurrent lookups
    /// only as a whole; re-registering a hash replaces the entry.
    pub fn register(&self, entry: ClassEntry) {
        let hash = entry.ty.hash;
        let static_name = entry.has_static_side().then(|| entry.ty.name.to_string());
        let entry = Arc::new(entry);
        if let Ok(mut classes) = self.classes.write() {
            classes.insert(hash, entry);
        }
        if let Some(name) = static_name {
            if let Ok(mut names) = self.static_names.write() {
                names.insert(name, hash);
            }
        }
    }

    /// Entry for a type: the closed instance if registered, otherwise the
    /// open generic definition.
    pub fn entry_of(&self, ty: &Ty) -> Option<Arc<ClassEntry>> {
        let classes = self.classes.read().ok()?;
        if let Some(entry) = classes.get(&ty.type_hash()) {
            return Some(entry.clone());
        }
        if let Ty::Named(named) = ty {
            if !named.args.is_empty() {
                return classes.get(&named.definition_hash()).cloned();
            }
        }
        None
    }

    /// Class addressable by bare name in an expression, like `Math`.
    pub fn static_class(&self, name: &str) -> Option<Arc<ClassEntry>> {
        let hash = {
            let names = self.static_names.read().ok()?;
            *names.get(name)?
        };
        self.classes.read().ok()?.get(&hash).cloned()
    }

    /// Instance property by name, walking the base chain.
    pub fn find_property(&self, ty: &Ty, name: &str, ignore_case: bool) -> Option<PropertyEntry> {
        let mut current = self.entry_of(ty);
        while let Some(entry) = current {
            if let Some(found) = entry.property(name, ignore_case, false) {
                return Some(found.clone());
            }
            current = self.base_entry(&entry);
        }
        None
    }

    /// Instance field by name, walking the base chain. Member resolution
    /// consults this only after properties miss.
    pub fn find_field(&self, ty: &Ty, name: &str, ignore_case: bool) -> Option<PropertyEntry> {
        let mut current = self.entry_of(ty);
        while let Some(entry) = current {
            if let Some(found) = entry.field(name, ignore_case) {
                return Some(found.clone());
            }
            current = self.base_entry(&entry);
        }
        None
    }

    /// All instance method overloads by name, most-derived first.
    pub fn find_methods(&self, ty: &Ty, name: &str, ignore_case: bool) -> Vec<MethodEntry> {
        let mut found = Vec::new();
        let mut current = self.entry_of(ty);
        while let Some(entry) = current {
            found.extend(entry.methods_named(name, ignore_case, false));
            current = self.base_entry(&entry);
        }
        found
    }

    /// Indexer for a type, walking the base chain.
    pub fn indexer_of(&self, ty: &Ty) -> Option<IndexerEntry> {
        let mut current = self.entry_of(ty);
        while let Some(entry) = current {
            if let Some(indexer) = &entry.indexer {
                return Some(indexer.clone());
            }
            current = self.base_entry(&entry);
        }
        None
    }

    /// Every interface a type satisfies, transitively.
    ///
    /// Arrays and strings expose the structural `Sequence<T>` interface the
    /// built-in extension methods target.
    pub fn interfaces_of(&self, ty: &Ty) -> Vec<NamedTy> {
        let mut out: Vec<NamedTy> = Vec::new();
        match ty {
            Ty::Array(elem) => out.push(NamedTy::generic("Sequence", vec![(**elem).clone()])),
            Ty::Str => out.push(NamedTy::generic("Sequence", vec![Ty::Char])),
            _ => {
                let mut current = self.entry_of(ty);
                while let Some(entry) = current {
                    for interface in &entry.interfaces {
                        if !out.iter().any(|i| i.hash == interface.hash) {
                            out.push(interface.clone());
                        }
                    }
                    current = self.base_entry(&entry);
                }
            }
        }

        // interfaces may themselves declare interfaces
        let mut i = 0;
        while i < out.len() {
            let nested = self
                .entry_of(&Ty::Named(out[i].clone()))
                .map(|entry| entry.interfaces.clone())
                .unwrap_or_default();
            for interface in nested {
                if !out.iter().any(|existing| existing.hash == interface.hash) {
                    out.push(interface);
                }
            }
            i += 1;
        }
        out
    }

    /// One hop up the base chain.
    pub(crate) fn base_entry(&self, entry: &ClassEntry) -> Option<Arc<ClassEntry>> {
        entry
            .base
            .as_ref()
            .and_then(|base| self.entry_of(&Ty::Named(base.clone())))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a property on an entry or its bases using an explicit registry,
/// honoring static-ness. Used for static class member access.
pub fn find_static_property(
    registry: &TypeRegistry,
    entry: &ClassEntry,
    name: &str,
    ignore_case: bool,
) -> Option<PropertyEntry> {
    if let Some(found) = entry.property(name, ignore_case, true) {
        return Some(found.clone());
    }
    registry
        .base_entry(entry)
        .and_then(|base| find_static_property(registry, &base, name, ignore_case))
}

/// All static method overloads by name on an entry and its bases.
pub fn find_static_methods(
    registry: &TypeRegistry,
    entry: &ClassEntry,
    name: &str,
    ignore_case: bool,
) -> Vec<MethodEntry> {
    let mut found = entry.methods_named(name, ignore_case, true);
    if let Some(base) = registry.base_entry(entry) {
        found.extend(find_static_methods(registry, &base, name, ignore_case));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::ParamDef;
    use dynexpr_core::{CallContext, Value};

    fn sample_registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(
            ClassEntry::new(NamedTy::plain("EntityBase"))
                .with_property("Id", Ty::Int32, |_| Ok(Value::Int32(1)))
                .with_field("Revision", Ty::Int32, |_| Ok(Value::Int32(7))),
        );
        registry.register(
            ClassEntry::new(NamedTy::plain("Company"))
                .with_base(NamedTy::plain("EntityBase"))
                .with_property("Name", Ty::Str, |_| Ok(Value::from("Netflix")))
                .with_method(MethodEntry::instance(
                    "UpdateName",
                    vec![ParamDef::required("name", Ty::Str)],
                    Ty::Str,
                    |cx: CallContext<'_>| Ok(cx.arg(1)?.clone()),
                )),
        );
        registry
    }

    #[test]
    fn resolves_through_base_chain() {
        let registry = sample_registry();
        let company = Ty::Named(NamedTy::plain("Company"));
        assert!(registry.find_property(&company, "Name", false).is_some());
        assert!(registry.find_property(&company, "Id", false).is_some());
        assert!(registry.find_property(&company, "Missing", false).is_none());
        assert_eq!(registry.find_methods(&company, "UpdateName", false).len(), 1);

        // fields live in their own bucket and inherit like properties
        assert!(registry.find_field(&company, "Revision", false).is_some());
        assert!(registry.find_property(&company, "Revision", false).is_none());
    }

    #[test]
    fn case_sensitivity_is_opt_in() {
        let registry = sample_registry();
        let company = Ty::Named(NamedTy::plain("Company"));
        assert!(registry.find_property(&company, "name", false).is_none());
        assert!(registry.find_property(&company, "name", true).is_some());
    }

    #[test]
    fn static_classes_resolve_by_name() {
        let registry = TypeRegistry::new();
        registry.register(
            ClassEntry::static_class("Math").with_method(MethodEntry::static_method(
                "Zero",
                Vec::new(),
                Ty::Int32,
                |_cx: CallContext<'_>| Ok(Value::Int32(0)),
            )),
        );
        let math = registry.static_class("Math");
        assert!(math.is_some());
        assert!(registry.static_class("NotAClass").is_none());
        let math = math.unwrap();
        assert_eq!(find_static_methods(&registry, &math, "Zero", false).len(), 1);
    }

    #[test]
    fn arrays_and_strings_implement_sequence() {
        let registry = TypeRegistry::new();
        let ifaces = registry.interfaces_of(&Ty::Int32.array_of());
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces[0].name.as_ref(), "Sequence");
        assert_eq!(ifaces[0].args.as_ref(), &[Ty::Int32]);

        let ifaces = registry.interfaces_of(&Ty::Str);
        assert_eq!(ifaces[0].args.as_ref(), &[Ty::Char]);
    }

    #[test]
    fn open_generic_definition_is_a_fallback() {
        let registry = TypeRegistry::new();
        registry.register(
            ClassEntry::new(NamedTy::plain("Entity"))
                .with_property("Tag", Ty::Str, |_| Ok(Value::from("open"))),
        );
        let closed = Ty::Named(NamedTy::generic("Entity", vec![Ty::Guid]));
        assert!(registry.find_property(&closed, "Tag", false).is_some());
    }
}
