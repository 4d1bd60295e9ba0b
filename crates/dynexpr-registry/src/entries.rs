//! Registered member descriptors: what the compiler resolves names against.
//!
//! A host type registers as a [`ClassEntry`]: a bag of properties, fields,
//! methods and at most one indexer, plus an optional base class and
//! interface list.
//! Members carry concrete [`Ty`]s and native implementations; generic
//! extension methods live in the extension index instead, since their
//! signatures need type parameters.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use dynexpr_core::{Getter, IndexGetter, NamedTy, NativeCallable, NativeFn, Ty, Value};

bitflags! {
    /// Member dispatch flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemberFlags: u8 {
        /// Resolved on the class itself, not on instances.
        const STATIC = 1 << 0;
        /// Registered through the extension index.
        const EXTENSION = 1 << 1;
    }
}

/// One declared parameter of a registered method.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: Arc<str>,
    pub ty: Ty,
    /// When present, callers may omit this argument and the default is
    /// injected at compile time.
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn required(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        ParamDef {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn optional(name: impl Into<Arc<str>>, ty: Ty, default: Value) -> Self {
        ParamDef {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }
}

/// A registered method overload.
///
/// The native implementation receives the receiver first for instance
/// methods; static methods receive arguments only.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub name: Arc<str>,
    pub params: Vec<ParamDef>,
    pub ret: Ty,
    pub flags: MemberFlags,
    pub native: NativeFn,
}

impl MethodEntry {
    pub fn instance(
        name: impl Into<Arc<str>>,
        params: Vec<ParamDef>,
        ret: Ty,
        native: impl NativeCallable + 'static,
    ) -> Self {
        let name = name.into();
        MethodEntry {
            native: NativeFn::new(name.clone(), native),
            name,
            params,
            ret,
            flags: MemberFlags::empty(),
        }
    }

    pub fn static_method(
        name: impl Into<Arc<str>>,
        params: Vec<ParamDef>,
        ret: Ty,
        native: impl NativeCallable + 'static,
    ) -> Self {
        let mut entry = Self::instance(name, params, ret, native);
        entry.flags |= MemberFlags::STATIC;
        entry
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub fn is_extension(&self) -> bool {
        self.flags.contains(MemberFlags::EXTENSION)
    }

    /// Arguments required once defaults are taken into account.
    pub fn min_arity(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn max_arity(&self) -> usize {
        self.params.len()
    }

    pub fn accepts_arity(&self, n: usize) -> bool {
        self.min_arity() <= n && n <= self.max_arity()
    }
}

/// A registered readable property.
#[derive(Clone)]
pub struct PropertyEntry {
    pub name: Arc<str>,
    pub ty: Ty,
    pub flags: MemberFlags,
    pub getter: Getter,
}

impl PropertyEntry {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

impl fmt::Debug for PropertyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyEntry")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A registered indexer: one key type, one element type.
#[derive(Clone)]
pub struct IndexerEntry {
    pub key: Ty,
    pub ret: Ty,
    pub get: IndexGetter,
}

impl fmt::Debug for IndexerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerEntry")
            .field("key", &self.key)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

/// A registered class: identity, inheritance and members.
///
/// Properties and fields share the entry shape; they differ only in
/// lookup order (a property shadows a same-named field).
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub ty: NamedTy,
    pub base: Option<NamedTy>,
    pub interfaces: Vec<NamedTy>,
    pub properties: Vec<PropertyEntry>,
    pub fields: Vec<PropertyEntry>,
    pub methods: Vec<MethodEntry>,
    pub indexer: Option<IndexerEntry>,
    /// Static classes resolve by bare name in expressions (`Math.Min`).
    pub is_static: bool,
    /// Interfaces search ahead of the receiver type in extension lookup.
    pub is_interface: bool,
}

impl ClassEntry {
    pub fn new(ty: NamedTy) -> Self {
        ClassEntry {
            ty,
            base: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            indexer: None,
            is_static: false,
            is_interface: false,
        }
    }

    /// A class addressed only through its name, like `Math` or `Guid`.
    pub fn static_class(name: impl Into<Arc<str>>) -> Self {
        let mut entry = Self::new(NamedTy::plain(name));
        entry.is_static = true;
        entry
    }

    /// An interface entry; implementing classes list it through
    /// [`ClassEntry::with_interface`].
    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        let mut entry = Self::new(NamedTy::plain(name));
        entry.is_interface = true;
        entry
    }

    pub fn with_base(mut self, base: NamedTy) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: NamedTy) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_property<F>(mut self, name: impl Into<Arc<str>>, ty: Ty, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, dynexpr_core::EvalError> + Send + Sync + 'static,
    {
        self.properties.push(PropertyEntry {
            name: name.into(),
            ty,
            flags: MemberFlags::empty(),
            getter: Arc::new(getter),
        });
        self
    }

    pub fn with_static_property<F>(mut self, name: impl Into<Arc<str>>, ty: Ty, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, dynexpr_core::EvalError> + Send + Sync + 'static,
    {
        self.properties.push(PropertyEntry {
            name: name.into(),
            ty,
            flags: MemberFlags::STATIC,
            getter: Arc::new(getter),
        });
        self
    }

    pub fn with_field<F>(mut self, name: impl Into<Arc<str>>, ty: Ty, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, dynexpr_core::EvalError> + Send + Sync + 'static,
    {
        self.fields.push(PropertyEntry {
            name: name.into(),
            ty,
            flags: MemberFlags::empty(),
            getter: Arc::new(getter),
        });
        self
    }

    pub fn with_method(mut self, method: MethodEntry) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_indexer<F>(mut self, key: Ty, ret: Ty, get: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, dynexpr_core::EvalError> + Send + Sync + 'static,
    {
        self.indexer = Some(IndexerEntry {
            key,
            ret,
            get: Arc::new(get),
        });
        self
    }

    /// Property by name on this entry alone, without base-chain walking.
    pub fn property(&self, name: &str, ignore_case: bool, want_static: bool) -> Option<&PropertyEntry> {
        self.properties
            .iter()
            .find(|p| p.is_static() == want_static && name_eq(&p.name, name, ignore_case))
    }

    /// Field by name on this entry alone.
    pub fn field(&self, name: &str, ignore_case: bool) -> Option<&PropertyEntry> {
        self.fields
            .iter()
            .find(|f| name_eq(&f.name, name, ignore_case))
    }

    /// All method overloads by name on this entry alone.
    pub fn methods_named(&self, name: &str, ignore_case: bool, want_static: bool) -> Vec<MethodEntry> {
        self.methods
            .iter()
            .filter(|m| m.is_static() == want_static && name_eq(&m.name, name, ignore_case))
            .cloned()
            .collect()
    }

    /// True when this entry is addressable by bare name.
    pub fn has_static_side(&self) -> bool {
        self.is_static
            || self.methods.iter().any(MethodEntry::is_static)
            || self.properties.iter().any(PropertyEntry::is_static)
    }
}

/// Name comparison honoring the ignore-member-case setting.
pub(crate) fn name_eq(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::CallContext;

    #[test]
    fn arity_respects_defaults() {
        let method = MethodEntry::instance(
            "Len",
            vec![ParamDef::optional("added", Ty::Int32, Value::Int32(0))],
            Ty::Int32,
            |cx: CallContext<'_>| Ok(cx.arg(0)?.clone()),
        );
        assert_eq!(method.min_arity(), 0);
        assert_eq!(method.max_arity(), 1);
        assert!(method.accepts_arity(0));
        assert!(method.accepts_arity(1));
        assert!(!method.accepts_arity(2));
    }

    #[test]
    fn builder_collects_members() {
        let entry = ClassEntry::new(NamedTy::plain("Company"))
            .with_base(NamedTy::plain("EntityBase"))
            .with_property("Name", Ty::Str, |_| Ok(Value::from("Netflix")))
            .with_method(MethodEntry::static_method(
                "Of",
                vec![ParamDef::required("name", Ty::Str)],
                Ty::Named(NamedTy::plain("Company")),
                |cx: CallContext<'_>| Ok(cx.arg(0)?.clone()),
            ));
        assert!(entry.property("Name", false, false).is_some());
        assert!(entry.property("name", false, false).is_none());
        assert!(entry.property("name", true, false).is_some());
        assert_eq!(entry.methods_named("Of", false, true).len(), 1);
        assert!(entry.methods_named("Of", false, false).is_empty());
        assert!(entry.has_static_side());
    }
}
