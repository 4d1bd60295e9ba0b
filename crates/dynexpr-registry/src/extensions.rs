//! Process-wide extension method index.
//!
//! Extension methods attach new instance methods to existing types,
//! including generic ones (`Select<T, R>` over any `Sequence<T>`). Their
//! signatures are [`TyScheme`]s: type patterns with numbered parameters
//! that unify against concrete [`Ty`]s at compile time.
//!
//! Lookups probe the interfaces the receiver satisfies first (the
//! receiver leading its group when it is itself an interface), then the
//! receiver type and each ancestor up the base chain, and finally the
//! any-receiver bucket for extensions on a bare type parameter. Closed
//! keys probe before their open generic definitions throughout.

use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use dynexpr_core::{NativeCallable, NativeFn, Ty, TypeHash, Value};

use crate::entries::name_eq;
use crate::registry::TypeRegistry;

lazy_static! {
    static ref GLOBAL_INDEX: Arc<ExtensionIndex> = {
        let index = ExtensionIndex::new();
        crate::builtins::install_extensions(&index);
        Arc::new(index)
    };
}

/// A type pattern with numbered type parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TyScheme {
    /// Exactly this type.
    Concrete(Ty),
    /// The n-th type parameter of the owning extension.
    Param(usize),
    Array(Box<TyScheme>),
    Nullable(Box<TyScheme>),
    Func(Vec<TyScheme>, Box<TyScheme>),
    /// A named type or interface, possibly generic.
    Named(Arc<str>, Vec<TyScheme>),
}

impl TyScheme {
    pub fn concrete(ty: Ty) -> Self {
        TyScheme::Concrete(ty)
    }

    pub fn param(index: usize) -> Self {
        TyScheme::Param(index)
    }

    pub fn array(elem: TyScheme) -> Self {
        TyScheme::Array(Box::new(elem))
    }

    pub fn func(params: Vec<TyScheme>, ret: TyScheme) -> Self {
        TyScheme::Func(params, Box::new(ret))
    }

    pub fn named(name: impl Into<Arc<str>>, args: Vec<TyScheme>) -> Self {
        TyScheme::Named(name.into(), args)
    }

    /// The sequence interface pattern built-in extensions target.
    pub fn sequence_of(elem: TyScheme) -> Self {
        TyScheme::named("Sequence", vec![elem])
    }

    /// Unify this pattern against a concrete type, binding parameters.
    ///
    /// A parameter already bound must see the same type again; bindings
    /// partially written by a failed unification are the caller's problem,
    /// so unify against a scratch vector.
    pub fn unify(&self, ty: &Ty, bindings: &mut [Option<Ty>]) -> bool {
        match self {
            TyScheme::Concrete(expected) => expected == ty,
            TyScheme::Param(i) => match bindings.get_mut(*i) {
                Some(Some(bound)) => &*bound == ty,
                Some(slot @ None) => {
                    *slot = Some(ty.clone());
                    true
                }
                None => false,
            },
            TyScheme::Array(elem) => ty
                .as_array_elem()
                .is_some_and(|t| elem.unify(t, bindings)),
            TyScheme::Nullable(inner) => match ty {
                Ty::Nullable(t) => inner.unify(t, bindings),
                _ => false,
            },
            TyScheme::Func(params, ret) => ty.as_func().is_some_and(|f| {
                params.len() == f.params.len()
                    && params
                        .iter()
                        .zip(&f.params)
                        .all(|(scheme, ty)| scheme.unify(ty, bindings))
                    && ret.unify(&f.ret, bindings)
            }),
            TyScheme::Named(name, args) => match ty {
                Ty::Named(named) => {
                    named.name.as_ref() == name.as_ref()
                        && named.args.len() == args.len()
                        && args
                            .iter()
                            .zip(named.args.iter())
                            .all(|(scheme, ty)| scheme.unify(ty, bindings))
                }
                _ => false,
            },
        }
    }

    /// Substitute bindings into this pattern; `None` when a parameter the
    /// pattern mentions is still unbound.
    pub fn instantiate(&self, bindings: &[Option<Ty>]) -> Option<Ty> {
        match self {
            TyScheme::Concrete(ty) => Some(ty.clone()),
            TyScheme::Param(i) => bindings.get(*i).and_then(Clone::clone),
            TyScheme::Array(elem) => Some(elem.instantiate(bindings)?.array_of()),
            TyScheme::Nullable(inner) => Some(inner.instantiate(bindings)?.nullable()),
            TyScheme::Func(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| p.instantiate(bindings))
                    .collect::<Option<Vec<_>>>()?;
                Some(Ty::func(params, ret.instantiate(bindings)?))
            }
            TyScheme::Named(name, args) => {
                let args = args
                    .iter()
                    .map(|a| a.instantiate(bindings))
                    .collect::<Option<Vec<_>>>()?;
                Some(Ty::Named(dynexpr_core::NamedTy::generic(
                    name.clone(),
                    args,
                )))
            }
        }
    }

    /// True when this pattern mentions any unbound parameter.
    pub fn is_open(&self) -> bool {
        match self {
            TyScheme::Concrete(_) => false,
            TyScheme::Param(_) => true,
            TyScheme::Array(elem) | TyScheme::Nullable(elem) => elem.is_open(),
            TyScheme::Func(params, ret) => params.iter().any(TyScheme::is_open) || ret.is_open(),
            TyScheme::Named(_, args) => args.iter().any(TyScheme::is_open),
        }
    }

    /// Bucket key for the index: closed types key by their hash, open
    /// patterns by their definition, bare parameters by the any-receiver
    /// bucket.
    fn index_key(&self) -> TypeHash {
        match self {
            TyScheme::Concrete(ty) => ty.type_hash(),
            TyScheme::Param(_) => any_receiver_key(),
            TyScheme::Array(_) => TypeHash::from_name("Array"),
            TyScheme::Nullable(_) => TypeHash::from_name("Nullable"),
            TyScheme::Func(..) => TypeHash::from_name("Func"),
            TyScheme::Named(name, _) => TypeHash::from_name(name),
        }
    }
}

fn any_receiver_key() -> TypeHash {
    TypeHash::from_name("$any-receiver")
}

/// The receiver's own bucket keys: its closed hash, then the structural
/// or open-definition key a generic registration would have used.
fn receiver_keys(keys: &mut Vec<TypeHash>, receiver: &Ty) {
    keys.push(receiver.type_hash());
    match receiver {
        Ty::Array(_) => keys.push(TypeHash::from_name("Array")),
        Ty::Nullable(_) => keys.push(TypeHash::from_name("Nullable")),
        Ty::Func(_) => keys.push(TypeHash::from_name("Func")),
        Ty::Named(named) if !named.args.is_empty() => keys.push(named.definition_hash()),
        _ => {}
    }
}

/// One declared parameter of an extension method, scheme-typed.
#[derive(Debug, Clone)]
pub struct ExtParam {
    pub name: Arc<str>,
    pub scheme: TyScheme,
    pub default: Option<Value>,
}

impl ExtParam {
    pub fn required(name: impl Into<Arc<str>>, scheme: TyScheme) -> Self {
        ExtParam {
            name: name.into(),
            scheme,
            default: None,
        }
    }

    pub fn optional(name: impl Into<Arc<str>>, scheme: TyScheme, default: Value) -> Self {
        ExtParam {
            name: name.into(),
            scheme,
            default: Some(default),
        }
    }
}

/// A registered extension method.
///
/// The native implementation always receives the receiver as its first
/// argument, like an instance method.
#[derive(Debug, Clone)]
pub struct ExtensionEntry {
    pub name: Arc<str>,
    /// Number of type parameters the schemes may mention.
    pub type_params: usize,
    pub receiver: TyScheme,
    pub params: Vec<ExtParam>,
    pub ret: TyScheme,
    pub native: NativeFn,
}

impl ExtensionEntry {
    pub fn new(
        name: impl Into<Arc<str>>,
        type_params: usize,
        receiver: TyScheme,
        params: Vec<ExtParam>,
        ret: TyScheme,
        native: impl NativeCallable + 'static,
    ) -> Self {
        let name = name.into();
        ExtensionEntry {
            native: NativeFn::new(name.clone(), native),
            name,
            type_params,
            receiver,
            params,
            ret,
        }
    }

    pub fn min_arity(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn max_arity(&self) -> usize {
        self.params.len()
    }

    pub fn accepts_arity(&self, n: usize) -> bool {
        self.min_arity() <= n && n <= self.max_arity()
    }

    /// Bind type parameters from the receiver type, falling back to the
    /// interfaces it satisfies and then its base chain. `None` when the
    /// receiver does not match.
    pub fn bind_receiver(
        &self,
        registry: &TypeRegistry,
        receiver: &Ty,
    ) -> Option<Vec<Option<Ty>>> {
        let mut bindings = vec![None; self.type_params];
        if self.receiver.unify(receiver, &mut bindings) {
            return Some(bindings);
        }
        for interface in registry.interfaces_of(receiver) {
            let mut bindings = vec![None; self.type_params];
            if self.receiver.unify(&Ty::Named(interface), &mut bindings) {
                return Some(bindings);
            }
        }
        let mut current = registry.entry_of(receiver);
        while let Some(entry) = current {
            if let Some(base) = &entry.base {
                let mut bindings = vec![None; self.type_params];
                if self.receiver.unify(&Ty::Named(base.clone()), &mut bindings) {
                    return Some(bindings);
                }
            }
            current = registry.base_entry(&entry);
        }
        None
    }
}

/// Thread-safe index of extension methods bucketed by receiver key.
pub struct ExtensionIndex {
    by_key: RwLock<FxHashMap<TypeHash, Vec<Arc<ExtensionEntry>>>>,
}

impl ExtensionIndex {
    pub fn new() -> Self {
        ExtensionIndex {
            by_key: RwLock::new(FxHashMap::default()),
        }
    }

    /// The shared instance, with built-in sequence extensions installed.
    pub fn global() -> Arc<ExtensionIndex> {
        GLOBAL_INDEX.clone()
    }

    /// Register an extension. The entry is stored whole under the write
    /// lock, so a concurrent compile never sees a partial method.
    pub fn register(&self, entry: ExtensionEntry) {
        let key = entry.receiver.index_key();
        let entry = Arc::new(entry);
        if let Ok(mut map) = self.by_key.write() {
            map.entry(key).or_default().push(entry);
        }
    }

    /// Every registered extension that could apply to `receiver` by name.
    /// Candidates order by bucket: the interfaces the receiver satisfies
    /// (the receiver leading when it is itself an interface), the receiver
    /// type, its ancestors, the any-receiver bucket. Receiver unification
    /// and argument checking are the caller's trials.
    pub fn candidates(
        &self,
        registry: &TypeRegistry,
        receiver: &Ty,
        name: &str,
        ignore_case: bool,
    ) -> Vec<Arc<ExtensionEntry>> {
        let entry = registry.entry_of(receiver);
        let receiver_is_interface = entry.as_ref().is_some_and(|e| e.is_interface);

        let mut keys: Vec<TypeHash> = Vec::new();
        if receiver_is_interface {
            receiver_keys(&mut keys, receiver);
        }
        for interface in registry.interfaces_of(receiver) {
            keys.push(interface.hash);
            keys.push(interface.definition_hash());
        }
        if !receiver_is_interface {
            receiver_keys(&mut keys, receiver);
        }
        let mut current = entry;
        while let Some(class) = current {
            if let Some(base) = &class.base {
                keys.push(base.hash);
                keys.push(base.definition_hash());
            }
            current = registry.base_entry(&class);
        }
        keys.push(any_receiver_key());
        keys.dedup();

        let mut found: Vec<Arc<ExtensionEntry>> = Vec::new();
        let Ok(map) = self.by_key.read() else {
            return found;
        };
        for key in keys {
            let Some(bucket) = map.get(&key) else {
                continue;
            };
            for entry in bucket {
                if name_eq(&entry.name, name, ignore_case)
                    && !found.iter().any(|e| Arc::ptr_eq(e, entry))
                {
                    found.push(entry.clone());
                }
            }
        }
        found
    }
}

impl Default for ExtensionIndex {
    fn default() -> Self {
        Self::new()
    }
}
