//! Expression parser crate.
//!
//! This crate turns expression source text into the token tree the
//! compiler consumes. It includes:
//! - A character-level cursor over the source
//! - The closed [`Token`] tree definition
//! - A single-pass recursive-descent parser (no separate lexer stage)
//! - Settings-driven operator recognition and precedence fix-up
//!
//! # Example
//!
//! ```
//! use dynexpr_parser::{Parser, Token};
//!
//! match Parser::parse("Name.Length > 4 ? Name : \"too short\"") {
//!     Ok(token) => assert!(matches!(token, Token::Ternary { .. })),
//!     Err(err) => eprintln!("parse error: {}", err),
//! }
//! ```

// Cursor module
pub mod cursor;

// Token tree module
pub mod token;

// Parser module
pub mod parser;

// Re-export commonly used types at crate root
pub use parser::Parser;
pub use token::Token;
