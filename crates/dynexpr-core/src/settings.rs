//! Mutable evaluation settings: known constants, unary and binary
//! operator tables, and lexing options.
//!
//! The parser consults the binary table for operator spellings and
//! precedence; the compiler consults both tables to lower operators into
//! IR. A process-wide default instance is shared by every evaluation that
//! does not supply its own.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::error::CompileError;
use crate::ir::{BinaryKind, Ir, UnaryKind};
use crate::value::Value;

/// Precedence assigned to custom binary operators registered without an
/// explicit level. Binds tighter than every default operator.
pub const DEFAULT_PRECEDENCE: u8 = 7;

/// Custom unary lowering: receives the compiled operand.
pub type UnaryFn = Arc<dyn Fn(Ir) -> Result<Ir, CompileError> + Send + Sync>;

/// Custom binary lowering: receives both compiled operands.
pub type BinaryFn = Arc<dyn Fn(Ir, Ir) -> Result<Ir, CompileError> + Send + Sync>;

/// How a unary operator lowers to IR.
#[derive(Clone)]
pub enum UnaryConverter {
    Builtin(UnaryKind),
    Custom(UnaryFn),
}

impl std::fmt::Debug for UnaryConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryConverter::Builtin(kind) => write!(f, "Builtin({kind:?})"),
            UnaryConverter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// How a binary operator lowers to IR.
#[derive(Clone)]
pub enum BinaryConverter {
    Builtin(BinaryKind),
    Custom(BinaryFn),
}

impl std::fmt::Debug for BinaryConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryConverter::Builtin(kind) => write!(f, "Builtin({kind:?})"),
            BinaryConverter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A registered binary operator: its precedence level and lowering.
#[derive(Debug, Clone)]
pub struct BinaryOpInfo {
    pub precedence: u8,
    pub converter: BinaryConverter,
}

const DEFAULT_BINARY_OPS: &[(&str, u8, BinaryKind)] = &[
    ("&&", 0, BinaryKind::AndAlso),
    ("||", 0, BinaryKind::OrElse),
    ("??", 0, BinaryKind::Coalesce),
    ("|", 1, BinaryKind::Or),
    ("^", 1, BinaryKind::ExclusiveOr),
    ("&", 1, BinaryKind::And),
    ("==", 2, BinaryKind::Equal),
    ("!=", 2, BinaryKind::NotEqual),
    ("<=", 3, BinaryKind::LessThanOrEqual),
    (">=", 3, BinaryKind::GreaterThanOrEqual),
    ("<", 3, BinaryKind::LessThan),
    (">", 3, BinaryKind::GreaterThan),
    ("<<", 4, BinaryKind::LeftShift),
    (">>", 4, BinaryKind::RightShift),
    ("+", 5, BinaryKind::Add),
    ("-", 5, BinaryKind::Subtract),
    ("*", 6, BinaryKind::Multiply),
    ("/", 6, BinaryKind::Divide),
    ("%", 6, BinaryKind::Modulo),
];

/// Shared, mutable evaluation settings.
///
/// All tables are behind read/write locks so expressions can be parsed
/// and compiled concurrently while operators are registered.
pub struct Settings {
    knowns: RwLock<FxHashMap<String, Value>>,
    unary: RwLock<FxHashMap<char, UnaryConverter>>,
    binary: RwLock<FxHashMap<String, BinaryOpInfo>>,
    decimal_separator: AtomicU32,
    ignore_member_case: AtomicBool,
}

lazy_static! {
    static ref DEFAULT_SETTINGS: Arc<Settings> = Arc::new(Settings::new());
}

impl Settings {
    /// Fresh settings carrying the default operator tables and the
    /// `true`/`false`/`null` constants.
    pub fn new() -> Settings {
        let mut knowns = FxHashMap::default();
        knowns.insert("true".to_string(), Value::Bool(true));
        knowns.insert("false".to_string(), Value::Bool(false));
        knowns.insert("null".to_string(), Value::Null);

        let mut unary = FxHashMap::default();
        for op in ['-', '+', '!', '~'] {
            if let Some(kind) = UnaryKind::from_char(op) {
                unary.insert(op, UnaryConverter::Builtin(kind));
            }
        }

        let mut binary = FxHashMap::default();
        for &(op, precedence, kind) in DEFAULT_BINARY_OPS {
            binary.insert(
                op.to_string(),
                BinaryOpInfo {
                    precedence,
                    converter: BinaryConverter::Builtin(kind),
                },
            );
        }

        Settings {
            knowns: RwLock::new(knowns),
            unary: RwLock::new(unary),
            binary: RwLock::new(binary),
            decimal_separator: AtomicU32::new('.' as u32),
            ignore_member_case: AtomicBool::new(false),
        }
    }

    /// The process-wide default instance.
    pub fn global() -> Arc<Settings> {
        DEFAULT_SETTINGS.clone()
    }

    /// Value bound to a known constant name, if registered.
    pub fn known_value(&self, name: &str) -> Option<Value> {
        self.knowns
            .read()
            .ok()
            .and_then(|map| map.get(name).cloned())
    }

    /// Register (or replace) a known constant.
    pub fn add_known_value(&self, name: impl Into<String>, value: Value) -> &Self {
        if let Ok(mut map) = self.knowns.write() {
            map.insert(name.into(), value);
        }
        self
    }

    /// True when `name` is a registered known constant.
    pub fn contains_known(&self, name: &str) -> bool {
        self.knowns
            .read()
            .map(|map| map.contains_key(name))
            .unwrap_or(false)
    }

    /// Snapshot of the registered known constant names.
    pub fn known_identifiers(&self) -> Vec<String> {
        self.knowns
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Lowering for a unary operator char, if registered.
    pub fn unary_converter(&self, op: char) -> Option<UnaryConverter> {
        self.unary.read().ok().and_then(|map| map.get(&op).cloned())
    }

    /// True when `op` is a registered unary operator.
    pub fn is_unary_op(&self, op: char) -> bool {
        self.unary
            .read()
            .map(|map| map.contains_key(&op))
            .unwrap_or(false)
    }

    /// Snapshot of the registered unary operator chars.
    pub fn unary_operators(&self) -> Vec<char> {
        self.unary
            .read()
            .map(|map| map.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Register a custom unary operator.
    pub fn add_unary_operator<F>(&self, op: char, convert: F) -> &Self
    where
        F: Fn(Ir) -> Result<Ir, CompileError> + Send + Sync + 'static,
    {
        if let Ok(mut map) = self.unary.write() {
            map.insert(op, UnaryConverter::Custom(Arc::new(convert)));
        }
        self
    }

    /// Registered info for a binary operator spelling.
    pub fn binary_op(&self, op: &str) -> Option<BinaryOpInfo> {
        self.binary.read().ok().and_then(|map| map.get(op).cloned())
    }

    /// True when `op` is a registered binary operator.
    pub fn is_binary_op(&self, op: &str) -> bool {
        self.binary
            .read()
            .map(|map| map.contains_key(op))
            .unwrap_or(false)
    }

    /// Longest registered binary operator `text` starts with, together
    /// with its info. The parser calls this at postfix position, so `??`
    /// wins over a ternary `?` and `<=` over `<`.
    pub fn match_binary_op(&self, text: &str) -> Option<(String, BinaryOpInfo)> {
        let map = self.binary.read().ok()?;
        map.iter()
            .filter(|(op, _)| text.starts_with(op.as_str()))
            .max_by_key(|(op, _)| op.len())
            .map(|(op, info)| (op.clone(), info.clone()))
    }

    /// Snapshot of the registered binary operator spellings.
    pub fn binary_operators(&self) -> Vec<String> {
        self.binary
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Register a custom binary operator at [`DEFAULT_PRECEDENCE`].
    pub fn add_binary_operator<F>(&self, op: impl Into<String>, convert: F) -> &Self
    where
        F: Fn(Ir, Ir) -> Result<Ir, CompileError> + Send + Sync + 'static,
    {
        self.add_binary_operator_with_precedence(op, DEFAULT_PRECEDENCE, convert)
    }

    /// Register a custom binary operator at an explicit precedence level.
    pub fn add_binary_operator_with_precedence<F>(
        &self,
        op: impl Into<String>,
        precedence: u8,
        convert: F,
    ) -> &Self
    where
        F: Fn(Ir, Ir) -> Result<Ir, CompileError> + Send + Sync + 'static,
    {
        if let Ok(mut map) = self.binary.write() {
            map.insert(
                op.into(),
                BinaryOpInfo {
                    precedence,
                    converter: BinaryConverter::Custom(Arc::new(convert)),
                },
            );
        }
        self
    }

    /// Char accepted between the integral and fractional digits of a
    /// number literal. Defaults to `.`.
    pub fn decimal_separator(&self) -> char {
        char::from_u32(self.decimal_separator.load(Ordering::Relaxed)).unwrap_or('.')
    }

    pub fn set_decimal_separator(&self, sep: char) {
        self.decimal_separator.store(sep as u32, Ordering::Relaxed);
    }

    /// When set, member and method name lookups ignore case.
    pub fn ignore_member_case(&self) -> bool {
        self.ignore_member_case.load(Ordering::Relaxed)
    }

    pub fn set_ignore_member_case(&self, ignore: bool) {
        self.ignore_member_case.store(ignore, Ordering::Relaxed);
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("decimal_separator", &self.decimal_separator())
            .field("ignore_member_case", &self.ignore_member_case())
            .finish_non_exhaustive()
    }
}
