//! Token AST produced by the parser.
//!
//! One variant per syntax form; the compiler dispatches on the variant
//! exhaustively. Trees are immutable and owned, so they can be built by
//! hand and handed to the compiler without going through the parser.
//!
//! Placement rules the parser guarantees but hand-built trees may break
//! (a `Group` with more or fewer than one item in value position, an
//! `Assign` outside an object literal, a `Lambda` outside a call
//! argument) are diagnosed at compile time, not here.

use dynexpr_core::Value;

/// A parsed expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal value (number, string, known constant)
    Literal { value: Value },
    /// Name reference, including positional externals (`@0`)
    Variable { name: String },
    /// Prefix operator application
    Unary { op: char, target: Box<Token> },
    /// Infix operator application
    Binary {
        op: String,
        left: Box<Token>,
        right: Box<Token>,
    },
    /// Parenthesized list; a single-item group behaves as that item
    Group { items: Vec<Token> },
    /// Object-literal member binding
    Assign { name: String, right: Box<Token> },
    /// Object literal (`new { ... }`), holding [`Token::Assign`] members
    Object { members: Vec<Token> },
    /// Array literal
    Array { items: Vec<Token> },
    /// Member access (`owner.name`)
    Member { owner: Box<Token>, name: String },
    /// Index access (`owner[key]`)
    Indexer { owner: Box<Token>, key: Box<Token> },
    /// Invocation (`callee(args)`)
    Call { callee: Box<Token>, args: Vec<Token> },
    /// Lambda (`params => body`)
    Lambda { params: Vec<String>, body: Box<Token> },
    /// Conditional (`predicate ? whenTrue : whenFalse`)
    Ternary {
        predicate: Box<Token>,
        when_true: Box<Token>,
        when_false: Box<Token>,
    },
}

impl Token {
    /// Variant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Literal { .. } => "literal",
            Token::Variable { .. } => "variable",
            Token::Unary { .. } => "unary",
            Token::Binary { .. } => "binary",
            Token::Group { .. } => "group",
            Token::Assign { .. } => "assign",
            Token::Object { .. } => "object",
            Token::Array { .. } => "array",
            Token::Member { .. } => "member",
            Token::Indexer { .. } => "indexer",
            Token::Call { .. } => "call",
            Token::Lambda { .. } => "lambda",
            Token::Ternary { .. } => "ternary",
        }
    }

    /// Shorthand for a literal token.
    pub fn literal(value: impl Into<Value>) -> Token {
        Token::Literal {
            value: value.into(),
        }
    }

    /// Shorthand for a variable token.
    pub fn variable(name: impl Into<String>) -> Token {
        Token::Variable { name: name.into() }
    }

    /// Shorthand for a binary token.
    pub fn binary(op: impl Into<String>, left: Token, right: Token) -> Token {
        Token::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// True for shapes a lambda arrow accepts as its parameter list:
    /// a single variable or a parenthesized list of variables.
    pub fn is_lambda_params(&self) -> bool {
        match self {
            Token::Variable { .. } => true,
            Token::Group { items } => items
                .iter()
                .all(|item| matches!(item, Token::Variable { .. })),
            _ => false,
        }
    }
}
