//! Error types for every phase of the expression pipeline.
//!
//! Each phase has its own error enum:
//! - [`SyntaxError`] - tokenizing/parsing failures, carrying the offending byte index
//! - [`CompileError`] - name/operator/overload resolution failures
//! - [`EvalError`] - failures raised while invoking a compiled expression
//!
//! [`ExprError`] wraps all of them for APIs that span phases.

use thiserror::Error;

/// Error produced while parsing expression source text.
///
/// Every variant except [`SyntaxError::BlankSource`] carries the byte index
/// of the offending character; [`SyntaxError::index`] exposes it uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// The source string was empty or whitespace-only.
    #[error("expression source must not be empty or blank")]
    BlankSource,

    /// A character that cannot start or continue any production.
    #[error("unexpected character '{ch}' at index {index}")]
    UnexpectedChar { ch: char, index: usize },

    /// An expression was required but none could be parsed.
    #[error("expected an expression at index {index}")]
    ExpectedExpression { index: usize },

    /// A specific character was required.
    #[error("expected '{expected}' at index {index}")]
    ExpectedChar { expected: char, index: usize },

    /// A string literal ran to the end of input without a closing quote.
    #[error("unterminated string literal starting at index {index}")]
    UnterminatedString { index: usize },

    /// An interpolation segment (`{...}`) was not closed.
    #[error("unterminated interpolation starting at index {index}")]
    UnterminatedInterpolation { index: usize },

    /// An identifier character directly followed a completed number literal.
    #[error("unexpected identifier character after number at index {index}")]
    IdentAfterNumber { index: usize },

    /// A digit run that does not fit the literal's numeric type.
    #[error("invalid number literal at index {index}")]
    InvalidNumber { index: usize },

    /// `@` was not followed by digits.
    #[error("expected digits after '@' at index {index}")]
    MissingParameterDigits { index: usize },

    /// Input remained after a complete expression was parsed.
    #[error("unexpected trailing input at index {index}")]
    TrailingInput { index: usize },
}

impl SyntaxError {
    /// Byte index of the offending character, when the error has one.
    pub fn index(&self) -> Option<usize> {
        match self {
            SyntaxError::BlankSource => None,
            SyntaxError::UnexpectedChar { index, .. }
            | SyntaxError::ExpectedExpression { index }
            | SyntaxError::ExpectedChar { index, .. }
            | SyntaxError::UnterminatedString { index }
            | SyntaxError::UnterminatedInterpolation { index }
            | SyntaxError::IdentAfterNumber { index }
            | SyntaxError::InvalidNumber { index }
            | SyntaxError::MissingParameterDigits { index }
            | SyntaxError::TrailingInput { index } => Some(*index),
        }
    }
}

/// Error produced while compiling a token tree into IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A variable name resolved to nothing in any scope.
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// A unary operator without a registered converter.
    #[error("unknown unary operator '{op}'")]
    UnknownUnaryOperator { op: char },

    /// A binary operator without a registered converter.
    #[error("unknown binary operator '{op}'")]
    UnknownBinaryOperator { op: String },

    /// No property, field, or indexer fallback matched the member name.
    #[error("cannot resolve member '{name}' on type {owner}")]
    UnknownMember { name: String, owner: String },

    /// The owner type exposes no indexer.
    #[error("cannot find indexer on type {owner}")]
    UnknownIndexer { owner: String },

    /// No instance or extension method matched after all trials.
    #[error("could not find instance or extension method '{name}' for {owner}")]
    UnknownMethod { name: String, owner: String },

    /// Runtime type introspection is never allowed through the language.
    #[error("'{name}' cannot be called")]
    ForbiddenIntrospection { name: String },

    /// A Group/Assign/Lambda token appeared outside its legal production.
    #[error("invalid '{kind}' token in this position")]
    MisplacedToken { kind: &'static str },

    /// A string literal could not be parsed as the typed constant a binary
    /// comparison requires (Guid/DateTime coercion).
    #[error("cannot parse '{literal}' as {target}")]
    BadTypedLiteral { literal: String, target: String },

    /// Ternary predicate was not boolean.
    #[error("ternary predicate must be bool, found {found}")]
    PredicateNotBool { found: String },

    /// A call with a callee shape the language cannot dispatch.
    #[error("invalid call target")]
    InvalidCallTarget,

    /// A lambda appeared where no function-typed parameter expects one.
    #[error("lambda is not valid in this position")]
    MisplacedLambda,

    /// Number of supplied parameter types did not match a lambda root.
    #[error("expected {expected} parameter types, got {got}")]
    ParameterCountMismatch { expected: usize, got: usize },
}

/// Error raised while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A runtime conversion inserted at compile time failed.
    #[error("cannot convert {from} to {to}")]
    ConversionFailed { from: String, to: String },

    /// Wrong number of values passed when invoking the closure.
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// A null value reached an operation that requires a value.
    #[error("null value in '{context}'")]
    NullReference { context: String },

    /// A value had an unexpected runtime type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// An index fell outside the bounds of an array or string.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// A map lookup missed.
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    /// Failure reported by a native method implementation.
    #[error("{message}")]
    Other { message: String },
}

impl EvalError {
    /// Shorthand for native implementations reporting a failure.
    pub fn other(message: impl Into<String>) -> Self {
        EvalError::Other {
            message: message.into(),
        }
    }
}

/// Unified error for APIs that parse, compile, and evaluate in one call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result alias for the unified error.
pub type ExprResult<T> = Result<T, ExprError>;
