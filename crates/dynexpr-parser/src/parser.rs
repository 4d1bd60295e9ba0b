//! Single-pass recursive-descent expression parser.
//!
//! Lexing, parsing and precedence resolution are folded into one pass:
//! the parser reads characters directly (no separate token stream),
//! consults [`Settings`] for operator spellings, and repairs operator
//! precedence with a single rotation at each binary node as the
//! recursion unwinds.

use std::sync::Arc;

use dynexpr_core::{Settings, SyntaxError, Value, DEFAULT_PRECEDENCE};

use crate::cursor::{is_ident_continue, is_ident_start, Cursor};
use crate::token::Token;

/// Recursive-descent parser over a single expression string.
pub struct Parser<'src> {
    cursor: Cursor<'src>,
    settings: Arc<Settings>,
}

impl<'src> Parser<'src> {
    /// Parse with the process-wide default settings.
    pub fn parse(source: &str) -> Result<Token, SyntaxError> {
        Self::parse_with(source, Settings::global())
    }

    /// Parse with explicit settings.
    ///
    /// Fails with [`SyntaxError::BlankSource`] on empty or whitespace-only
    /// input, and with an index-carrying variant on malformed syntax.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_with(source: &str, settings: Arc<Settings>) -> Result<Token, SyntaxError> {
        if source.trim().is_empty() {
            return Err(SyntaxError::BlankSource);
        }

        let mut parser = Parser {
            cursor: Cursor::new(source),
            settings,
        };
        let token = parser.expression()?;

        parser.cursor.skip_ws();
        if !parser.cursor.is_eof() {
            return Err(SyntaxError::TrailingInput {
                index: parser.cursor.offset(),
            });
        }
        Ok(token)
    }

    /// One full expression: a primary followed by greedily applied
    /// postfix productions (member, indexer, call, lambda arrow,
    /// ternary, binary operators).
    fn expression(&mut self) -> Result<Token, SyntaxError> {
        self.cursor.skip_ws();
        let mut token = self.primary()?;

        loop {
            self.cursor.skip_ws();
            match self.cursor.peek() {
                Some('.') => {
                    self.cursor.advance();
                    token = self.member(token)?;
                }
                Some('[') => {
                    self.cursor.advance();
                    token = self.indexer(token)?;
                }
                Some('(') => {
                    self.cursor.advance();
                    token = self.call(token)?;
                }
                Some('=') if self.cursor.check_str("=>") && token.is_lambda_params() => {
                    self.cursor.advance_bytes(2);
                    token = self.lambda(token)?;
                }
                Some(ch) => {
                    // operator match first, so `??` beats a ternary `?`
                    if let Some((op, _)) = self.settings.match_binary_op(self.cursor.rest()) {
                        self.cursor.advance_bytes(op.len());
                        token = self.binary(op, token)?;
                    } else if ch == '?' {
                        self.cursor.advance();
                        token = self.ternary(token)?;
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }

        Ok(token)
    }

    fn primary(&mut self) -> Result<Token, SyntaxError> {
        let index = self.cursor.offset();
        let Some(ch) = self.cursor.peek() else {
            return Err(SyntaxError::ExpectedExpression { index });
        };

        if ch.is_ascii_digit() {
            return self.number();
        }
        if ch == '"' {
            self.cursor.advance();
            return self.string(false, index);
        }
        if ch == '$' && self.cursor.peek_nth(1) == Some('"') {
            self.cursor.advance_bytes(2);
            return self.string(true, index);
        }
        if ch == '@' {
            self.cursor.advance();
            return self.positional(index);
        }
        if is_ident_start(ch) {
            return self.identifier_expr();
        }
        if ch == '(' {
            self.cursor.advance();
            let items = self.comma_list(')')?;
            return Ok(Token::Group { items });
        }
        if ch == '[' {
            self.cursor.advance();
            let items = self.comma_list(']')?;
            return Ok(Token::Array { items });
        }
        if self.settings.is_unary_op(ch) {
            self.cursor.advance();
            let target = self.expression()?;
            return Ok(Token::Unary {
                op: ch,
                target: Box::new(target),
            });
        }

        Err(SyntaxError::UnexpectedChar { ch, index })
    }

    /// Maximal digit run, optionally followed by the configured decimal
    /// separator and another digit run. An identifier character directly
    /// after the literal is an error.
    fn number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.cursor.offset();
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let sep = self.settings.decimal_separator();
        let mut is_float = false;
        if self.cursor.check(|c| c == sep) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        if self.cursor.check(is_ident_start) {
            return Err(SyntaxError::IdentAfterNumber {
                index: self.cursor.offset(),
            });
        }

        let text = self.cursor.slice_from(start);
        let value = if is_float {
            let parsed = if sep == '.' {
                text.parse::<f32>()
            } else {
                text.replace(sep, ".").parse::<f32>()
            };
            Value::Float32(parsed.map_err(|_| SyntaxError::InvalidNumber { index: start })?)
        } else {
            // a run past the 32-bit range takes the 64-bit rank
            match text.parse::<i32>() {
                Ok(small) => Value::Int32(small),
                Err(_) => Value::Int64(
                    text.parse::<i64>()
                        .map_err(|_| SyntaxError::InvalidNumber { index: start })?,
                ),
            }
        };
        Ok(Token::Literal { value })
    }

    /// String body after the opening quote. In interpolated mode `{...}`
    /// segments parse as nested expressions; the result folds all
    /// segments left-associatively with `+` starting from an empty
    /// string, except that a lone interpolated segment with no
    /// surrounding text stays unwrapped.
    fn string(&mut self, interpolated: bool, start: usize) -> Result<Token, SyntaxError> {
        let mut segments: Vec<Token> = Vec::new();
        let mut text = String::new();

        loop {
            let Some(ch) = self.cursor.advance() else {
                return Err(SyntaxError::UnterminatedString { index: start });
            };
            match ch {
                '"' => return Ok(fold_interpolation(segments, text)),
                '\\' => {
                    let Some(esc) = self.cursor.advance() else {
                        return Err(SyntaxError::UnterminatedString { index: start });
                    };
                    match esc {
                        'a' => text.push('\x07'),
                        'b' => text.push('\x08'),
                        'f' => text.push('\x0C'),
                        'n' => text.push('\n'),
                        'r' => text.push('\r'),
                        't' => text.push('\t'),
                        'v' => text.push('\x0B'),
                        '0' => text.push('\0'),
                        '\\' => text.push('\\'),
                        '"' => text.push('"'),
                        other => {
                            // unknown escapes keep the backslash
                            text.push('\\');
                            text.push(other);
                        }
                    }
                }
                '{' if interpolated => {
                    let brace = self.cursor.offset() - 1;
                    if !text.is_empty() {
                        segments.push(Token::Literal {
                            value: Value::from(std::mem::take(&mut text)),
                        });
                    }
                    let inner = self.expression()?;
                    self.cursor.skip_ws();
                    if !self.cursor.eat('}') {
                        return Err(SyntaxError::UnterminatedInterpolation { index: brace });
                    }
                    segments.push(inner);
                }
                other => text.push(other),
            }
        }
    }

    /// `@` + digits; the digits become a synthesized variable name the
    /// compiler resolves against injected positional values.
    fn positional(&mut self, index: usize) -> Result<Token, SyntaxError> {
        let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(SyntaxError::MissingParameterDigits { index });
        }
        if self.cursor.check(is_ident_start) {
            return Err(SyntaxError::IdentAfterNumber {
                index: self.cursor.offset(),
            });
        }
        Ok(Token::Variable {
            name: format!("@{digits}"),
        })
    }

    /// Identifier in operand position: `new` followed by `{` or `[`
    /// becomes an object/array literal, known constants become literals,
    /// everything else is a variable reference.
    fn identifier_expr(&mut self) -> Result<Token, SyntaxError> {
        let name = self.cursor.eat_while(is_ident_continue);

        if name == "new" {
            let mark = self.cursor;
            self.cursor.skip_ws();
            if self.cursor.eat('{') {
                return self.object_literal();
            }
            if self.cursor.eat('[') {
                return self.new_array_literal();
            }
            self.cursor = mark;
        }

        if let Some(value) = self.settings.known_value(name) {
            return Ok(Token::Literal { value });
        }
        Ok(Token::Variable {
            name: name.to_string(),
        })
    }

    /// Object literal body after `new {`. Members are either explicit
    /// bindings (`a = expr`), bare shorthands (`b`, binding the variable
    /// under its own name), or dotted shorthands (`b.c`, binding the
    /// path under its last segment).
    fn object_literal(&mut self) -> Result<Token, SyntaxError> {
        let mut members = Vec::new();
        loop {
            self.cursor.skip_ws();
            let name = self.identifier()?.to_string();
            self.cursor.skip_ws();

            let member = if self.cursor.check(|c| c == '=')
                && !self.cursor.check_str("==")
                && !self.cursor.check_str("=>")
            {
                self.cursor.advance();
                let right = self.expression()?;
                Token::Assign {
                    name,
                    right: Box::new(right),
                }
            } else if self.cursor.check(|c| c == '.') {
                let mut path = Token::Variable { name };
                let mut last = String::new();
                while self.cursor.eat('.') {
                    self.cursor.skip_ws();
                    last = self.identifier()?.to_string();
                    path = Token::Member {
                        owner: Box::new(path),
                        name: last.clone(),
                    };
                    self.cursor.skip_ws();
                }
                Token::Assign {
                    name: last,
                    right: Box::new(path),
                }
            } else {
                Token::Assign {
                    name: name.clone(),
                    right: Box::new(Token::Variable { name }),
                }
            };
            members.push(member);

            self.cursor.skip_ws();
            if self.cursor.eat(',') {
                continue;
            }
            if self.cursor.eat('}') {
                return Ok(Token::Object { members });
            }
            return Err(self.expected('}'));
        }
    }

    /// `new [] { items }` array creation; the brackets must be empty.
    fn new_array_literal(&mut self) -> Result<Token, SyntaxError> {
        self.cursor.skip_ws();
        if !self.cursor.eat(']') {
            return Err(self.expected(']'));
        }
        self.cursor.skip_ws();
        if !self.cursor.eat('{') {
            return Err(self.expected('{'));
        }
        let items = self.comma_list('}')?;
        Ok(Token::Array { items })
    }

    fn member(&mut self, owner: Token) -> Result<Token, SyntaxError> {
        self.cursor.skip_ws();
        let name = self.identifier()?.to_string();
        Ok(Token::Member {
            owner: Box::new(owner),
            name,
        })
    }

    fn indexer(&mut self, owner: Token) -> Result<Token, SyntaxError> {
        let key = self.expression()?;
        self.cursor.skip_ws();
        if !self.cursor.eat(']') {
            return Err(self.expected(']'));
        }
        Ok(Token::Indexer {
            owner: Box::new(owner),
            key: Box::new(key),
        })
    }

    fn call(&mut self, callee: Token) -> Result<Token, SyntaxError> {
        let args = self.comma_list(')')?;
        Ok(Token::Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// Lambda body after `=>`. The caller guarantees `left` is a valid
    /// parameter list shape ([`Token::is_lambda_params`]).
    fn lambda(&mut self, left: Token) -> Result<Token, SyntaxError> {
        let params = match left {
            Token::Variable { name } => vec![name],
            Token::Group { items } => items
                .into_iter()
                .filter_map(|item| match item {
                    Token::Variable { name } => Some(name),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let body = self.expression()?;
        Ok(Token::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn ternary(&mut self, predicate: Token) -> Result<Token, SyntaxError> {
        let when_true = self.expression()?;
        self.cursor.skip_ws();
        if !self.cursor.eat(':') {
            return Err(self.expected(':'));
        }
        let when_false = self.expression()?;
        Ok(Token::Ternary {
            predicate: Box::new(predicate),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        })
    }

    fn binary(&mut self, op: String, left: Token) -> Result<Token, SyntaxError> {
        let right = self.expression()?;
        Ok(self.fix_precedence(op, left, right))
    }

    /// Single-rotation precedence fix-up. The right side was parsed by a
    /// full recursive call; when it is itself a binary whose operator
    /// binds less tightly, rotate so the tighter operator sits deeper:
    /// `left op1 (l2 op2 r2)` becomes `(left op1 l2) op2 r2`. Groups are
    /// opaque here, which is how parentheses defeat the rotation.
    fn fix_precedence(&self, op: String, left: Token, right: Token) -> Token {
        match right {
            Token::Binary {
                op: inner_op,
                left: inner_left,
                right: inner_right,
            } if self.precedence_of(&inner_op) < self.precedence_of(&op) => Token::Binary {
                op: inner_op,
                left: Box::new(Token::Binary {
                    op,
                    left: Box::new(left),
                    right: inner_left,
                }),
                right: inner_right,
            },
            right => Token::binary(op, left, right),
        }
    }

    fn precedence_of(&self, op: &str) -> u8 {
        self.settings
            .binary_op(op)
            .map(|info| info.precedence)
            .unwrap_or(DEFAULT_PRECEDENCE)
    }

    fn identifier(&mut self) -> Result<&'src str, SyntaxError> {
        if !self.cursor.check(is_ident_start) {
            let index = self.cursor.offset();
            return match self.cursor.peek() {
                Some(ch) => Err(SyntaxError::UnexpectedChar { ch, index }),
                None => Err(SyntaxError::ExpectedExpression { index }),
            };
        }
        Ok(self.cursor.eat_while(is_ident_continue))
    }

    /// Comma-separated expressions up to `close`, consuming it.
    fn comma_list(&mut self, close: char) -> Result<Vec<Token>, SyntaxError> {
        let mut items = Vec::new();
        self.cursor.skip_ws();
        if self.cursor.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            self.cursor.skip_ws();
            if self.cursor.eat(',') {
                continue;
            }
            return if self.cursor.eat(close) {
                Ok(items)
            } else {
                Err(self.expected(close))
            };
        }
    }

    fn expected(&self, expected: char) -> SyntaxError {
        SyntaxError::ExpectedChar {
            expected,
            index: self.cursor.offset(),
        }
    }
}

/// Combine interpolation segments per the folding rule.
fn fold_interpolation(mut segments: Vec<Token>, trailing: String) -> Token {
    if segments.is_empty() {
        return Token::Literal {
            value: Value::from(trailing),
        };
    }
    if !trailing.is_empty() {
        segments.push(Token::Literal {
            value: Value::from(trailing),
        });
    }
    if segments.len() == 1 {
        if let Some(single) = segments.pop() {
            return single;
        }
    }

    let mut acc = Token::Literal {
        value: Value::from(String::new()),
    };
    for segment in segments {
        acc = Token::binary("+", acc, segment);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Token {
        match Parser::parse(source) {
            Ok(token) => token,
            Err(err) => panic!("parse({source:?}) failed: {err}"),
        }
    }

    fn parse_err(source: &str) -> SyntaxError {
        match Parser::parse(source) {
            Ok(token) => panic!("parse({source:?}) unexpectedly produced {token:?}"),
            Err(err) => err,
        }
    }

    #[test]
    fn rejects_blank_source() {
        assert_eq!(parse_err(""), SyntaxError::BlankSource);
        assert_eq!(parse_err("   \t "), SyntaxError::BlankSource);
    }

    #[test]
    fn parses_integer_and_float_literals() {
        assert_eq!(parse("42"), Token::literal(42i32));
        assert_eq!(parse("42.4242"), Token::literal(42.4242f32));
        assert_eq!(parse("42."), Token::literal(42.0f32));
        assert_eq!(parse("4200000000"), Token::literal(4_200_000_000i64));
        assert!(matches!(
            parse_err("99999999999999999999"),
            SyntaxError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn rejects_identifier_after_number() {
        assert!(matches!(
            parse_err("42abc"),
            SyntaxError::IdentAfterNumber { .. }
        ));
        assert!(matches!(
            parse_err("42.a"),
            SyntaxError::IdentAfterNumber { .. }
        ));
    }

    #[test]
    fn decimal_separator_is_configurable() {
        let settings = Arc::new(Settings::new());
        settings.set_decimal_separator(',');
        let token = Parser::parse_with("42,5", settings).unwrap();
        assert_eq!(token, Token::literal(42.5f32));
    }

    #[test]
    fn parses_known_constants() {
        assert_eq!(parse("true"), Token::literal(true));
        assert_eq!(parse("false"), Token::literal(false));
        assert_eq!(parse("null"), Token::Literal { value: Value::Null });
    }

    #[test]
    fn parses_string_escapes() {
        assert_eq!(parse(r#""4\"2""#), Token::literal("4\"2"));
        assert_eq!(
            parse(r#""\a\b\f\n\r\t\v\0\"\\""#),
            Token::literal("\x07\x08\x0C\n\r\t\x0B\0\"\\")
        );
        // unknown escape keeps the backslash
        assert_eq!(parse(r#""\q""#), Token::literal("\\q"));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            parse_err("\"blow"),
            SyntaxError::UnterminatedString { .. }
        ));
    }

    #[test]
    fn parses_positional_reference() {
        assert_eq!(parse("@0"), Token::variable("@0"));
        assert_eq!(parse("@12"), Token::variable("@12"));
        assert!(matches!(
            parse_err("@"),
            SyntaxError::MissingParameterDigits { .. }
        ));
    }

    #[test]
    fn precedence_rotation() {
        assert_eq!(
            parse("1 + 2 * 3"),
            Token::binary(
                "+",
                Token::literal(1i32),
                Token::binary("*", Token::literal(2i32), Token::literal(3i32))
            )
        );
        assert_eq!(
            parse("1 * 2 + 3"),
            Token::binary(
                "+",
                Token::binary("*", Token::literal(1i32), Token::literal(2i32)),
                Token::literal(3i32)
            )
        );
    }

    #[test]
    fn parentheses_block_rotation() {
        assert_eq!(
            parse("1 * (2 + 3)"),
            Token::binary(
                "*",
                Token::literal(1i32),
                Token::Group {
                    items: vec![Token::binary(
                        "+",
                        Token::literal(2i32),
                        Token::literal(3i32)
                    )]
                }
            )
        );
    }

    #[test]
    fn coalesce_beats_ternary() {
        assert_eq!(
            parse("a ?? b"),
            Token::binary("??", Token::variable("a"), Token::variable("b"))
        );
    }

    #[test]
    fn parses_ternary() {
        assert_eq!(
            parse("@0 ? 42 : 21"),
            Token::Ternary {
                predicate: Box::new(Token::variable("@0")),
                when_true: Box::new(Token::literal(42i32)),
                when_false: Box::new(Token::literal(21i32)),
            }
        );
    }

    #[test]
    fn parses_member_indexer_call_chain() {
        assert_eq!(
            parse("a.b[0](c)"),
            Token::Call {
                callee: Box::new(Token::Indexer {
                    owner: Box::new(Token::Member {
                        owner: Box::new(Token::variable("a")),
                        name: "b".into(),
                    }),
                    key: Box::new(Token::literal(0i32)),
                }),
                args: vec![Token::variable("c")],
            }
        );
    }

    #[test]
    fn parses_lambda_forms() {
        assert_eq!(
            parse("n => n"),
            Token::Lambda {
                params: vec!["n".into()],
                body: Box::new(Token::variable("n")),
            }
        );
        assert_eq!(
            parse("(a, b) => a"),
            Token::Lambda {
                params: vec!["a".into(), "b".into()],
                body: Box::new(Token::variable("a")),
            }
        );
        assert_eq!(
            parse("() => 42"),
            Token::Lambda {
                params: vec![],
                body: Box::new(Token::literal(42i32)),
            }
        );
    }

    #[test]
    fn arrow_after_non_parameter_shape_is_an_error() {
        assert!(matches!(
            parse_err("1 => 2"),
            SyntaxError::TrailingInput { .. }
        ));
    }

    #[test]
    fn parses_object_literal_with_shorthands() {
        assert_eq!(
            parse("new { a = 4, b }"),
            Token::Object {
                members: vec![
                    Token::Assign {
                        name: "a".into(),
                        right: Box::new(Token::literal(4i32)),
                    },
                    Token::Assign {
                        name: "b".into(),
                        right: Box::new(Token::variable("b")),
                    },
                ]
            }
        );
        assert_eq!(
            parse("new { b.c }"),
            Token::Object {
                members: vec![Token::Assign {
                    name: "c".into(),
                    right: Box::new(Token::Member {
                        owner: Box::new(Token::variable("b")),
                        name: "c".into(),
                    }),
                }]
            }
        );
    }

    #[test]
    fn bare_new_is_a_variable() {
        assert_eq!(parse("new"), Token::variable("new"));
        assert_eq!(parse("news"), Token::variable("news"));
    }

    #[test]
    fn parses_array_literals() {
        let expected = Token::Array {
            items: vec![Token::literal(1i32), Token::literal(2i32)],
        };
        assert_eq!(parse("[1, 2]"), expected);
        assert_eq!(parse("new [] { 1, 2 }"), expected);
        assert_eq!(parse("[]"), Token::Array { items: vec![] });
    }

    #[test]
    fn parses_interpolated_string() {
        assert_eq!(
            parse(r#"$"don't {@0}, 42""#),
            Token::binary(
                "+",
                Token::binary(
                    "+",
                    Token::binary("+", Token::literal(""), Token::literal("don't ")),
                    Token::variable("@0")
                ),
                Token::literal(", 42")
            )
        );
    }

    #[test]
    fn lone_interpolation_segment_stays_unwrapped() {
        assert_eq!(parse(r#"$"{@0}""#), Token::variable("@0"));
    }

    #[test]
    fn rejects_unterminated_interpolation() {
        assert!(matches!(
            parse_err(r#"$"don't {@0"#),
            SyntaxError::UnterminatedInterpolation { .. }
        ));
    }

    #[test]
    fn dollar_without_quote_is_an_identifier() {
        assert_eq!(parse("$x"), Token::variable("$x"));
    }

    #[test]
    fn unary_targets_the_rest_of_the_expression() {
        assert_eq!(
            parse("!done"),
            Token::Unary {
                op: '!',
                target: Box::new(Token::variable("done")),
            }
        );
        assert_eq!(
            parse("-2 + 3"),
            Token::Unary {
                op: '-',
                target: Box::new(Token::binary(
                    "+",
                    Token::literal(2i32),
                    Token::literal(3i32)
                )),
            }
        );
    }

    #[test]
    fn custom_operator_binds_tighter_than_defaults() {
        let settings = Arc::new(Settings::new());
        settings.add_binary_operator("**", |l, r| {
            Ok(dynexpr_core::Ir::binary(
                dynexpr_core::BinaryKind::Multiply,
                l,
                r,
            ))
        });
        let token = Parser::parse_with("2 * 3 ** 4", settings).unwrap();
        assert_eq!(
            token,
            Token::binary(
                "*",
                Token::literal(2i32),
                Token::binary("**", Token::literal(3i32), Token::literal(4i32))
            )
        );
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(matches!(
            parse_err("1 + 2 #"),
            SyntaxError::TrailingInput { .. }
        ));
        assert!(matches!(parse_err("."), SyntaxError::UnexpectedChar { .. }));
    }

    #[test]
    fn error_indexes_point_at_the_offender() {
        let err = parse_err("1 + 2 #");
        assert_eq!(err.index(), Some(6));
        let err = parse_err(r#""abc"#);
        assert_eq!(err.index(), Some(0));
    }
}
