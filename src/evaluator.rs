//! One-call conveniences over the parse, compile, invoke pipeline.
//!
//! [`Evaluator`] is the reusable front door: it carries settings and a
//! variable table and applies them to any number of expressions. The
//! free functions cover the one-shot cases, and the `to_fn*` helpers
//! wrap a compiled expression as a plain typed closure.

use std::sync::Arc;

use dynexpr_compiler::{CompiledExpr, Compiler};
use dynexpr_core::{
    CompileError, EvalError, ExprError, ExprResult, Settings, SyntaxError, Ty, Value,
};
use dynexpr_parser::{Parser, Token};

/// Parse source with the process-wide settings.
pub fn parse(source: &str) -> Result<Token, SyntaxError> {
    Parser::parse(source)
}

/// Parse source with explicit settings.
pub fn parse_with(source: &str, settings: &Arc<Settings>) -> Result<Token, SyntaxError> {
    Parser::parse_with(source, settings.clone())
}

/// Compile an already parsed tree with default context and no bound
/// variables.
pub fn compile(token: &Token, params: &[Ty]) -> Result<CompiledExpr, CompileError> {
    dynexpr_compiler::compile(token, params)
}

/// Parse and compile in one step.
pub fn parse_and_compile(source: &str, params: &[Ty]) -> ExprResult<CompiledExpr> {
    let token = Parser::parse(source)?;
    Ok(dynexpr_compiler::compile(&token, params)?)
}

/// Parse, compile, and invoke a parameterless expression.
pub fn eval(source: &str) -> ExprResult<Value> {
    Evaluator::new().eval(source)
}

/// [`eval`] with explicit settings.
pub fn eval_with(source: &str, settings: &Arc<Settings>) -> ExprResult<Value> {
    Evaluator::with_settings(settings.clone()).eval(source)
}

/// Wrap a parameterless expression as a typed closure.
pub fn to_fn0<R>(source: &str) -> ExprResult<impl Fn() -> Result<R, ExprError>>
where
    R: TryFrom<Value, Error = EvalError>,
{
    let expr = parse_and_compile(source, &[])?;
    Ok(move || -> Result<R, ExprError> { Ok(expr.result::<R>(&[])?) })
}

/// Wrap a one-parameter expression as a typed closure.
pub fn to_fn1<A, R>(source: &str, param: Ty) -> ExprResult<impl Fn(A) -> Result<R, ExprError>>
where
    A: Into<Value>,
    R: TryFrom<Value, Error = EvalError>,
{
    let expr = parse_and_compile(source, &[param])?;
    Ok(move |a: A| -> Result<R, ExprError> { Ok(expr.result::<R>(&[a.into()])?) })
}

/// Wrap a two-parameter expression as a typed closure.
pub fn to_fn2<A, B, R>(
    source: &str,
    params: (Ty, Ty),
) -> ExprResult<impl Fn(A, B) -> Result<R, ExprError>>
where
    A: Into<Value>,
    B: Into<Value>,
    R: TryFrom<Value, Error = EvalError>,
{
    let expr = parse_and_compile(source, &[params.0, params.1])?;
    Ok(move |a: A, b: B| -> Result<R, ExprError> {
        Ok(expr.result::<R>(&[a.into(), b.into()])?)
    })
}

/// Settings and bound values, reusable across expressions.
///
/// ```
/// use dynexpr::{Evaluator, Ty, Value};
///
/// let expr = Evaluator::new()
///     .variable("bonus", 5)
///     .compile("x => x * 2 + bonus", &[Ty::Int32])?;
/// assert_eq!(expr.invoke(&[Value::Int32(10)])?, Value::Int32(25));
/// # Ok::<(), dynexpr::ExprError>(())
/// ```
pub struct Evaluator {
    settings: Arc<Settings>,
    variables: Vec<(String, Value)>,
    positionals: Vec<Value>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_settings(Settings::global())
    }

    pub fn with_settings(settings: Arc<Settings>) -> Self {
        Evaluator {
            settings,
            variables: Vec::new(),
            positionals: Vec::new(),
        }
    }

    /// Bind a named variable, captured as a constant at compile time.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Append a positional value, reachable as `@0`, `@1`, ... .
    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        self.positionals.push(value.into());
        self
    }

    /// Replace the positional values wholesale.
    pub fn positionals(mut self, values: &[Value]) -> Self {
        self.positionals = values.to_vec();
        self
    }

    /// Parse and compile against this evaluator's settings and values.
    pub fn compile(&self, source: &str, params: &[Ty]) -> ExprResult<CompiledExpr> {
        let token = Parser::parse_with(source, self.settings.clone())?;
        Ok(self.compiler().compile(&token, params)?)
    }

    /// Compile and invoke a parameterless expression.
    pub fn eval(&self, source: &str) -> ExprResult<Value> {
        Ok(self.compile(source, &[])?.invoke(&[])?)
    }

    fn compiler(&self) -> Compiler {
        let mut compiler = Compiler::with_settings(self.settings.clone());
        for (name, value) in &self.variables {
            compiler = compiler.variable(name.clone(), value.clone());
        }
        compiler.positionals(&self.positionals)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
