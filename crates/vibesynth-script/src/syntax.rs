//! Lexer and parser for the script language.
//!
//! Source grammar, one or more unit blocks per source text:
//!
//! ```text
//! unit demo.GreetingImpl implements demo.Greeting {
//!     pub fn greet(name) {
//!         "Hello, " + name + "!"
//!     }
//! }
//! ```
//!
//! Method bodies are single expressions: string and integer literals,
//! parameter references, `+`, parentheses, and cross-unit static calls
//! `pkg.Unit::method(args)`. Line comments start with `//`.
//!
//! The parser collects every error it can attribute (recovering at the
//! next `unit` keyword) so the toolchain can surface the full diagnostic
//! list, not just the first failure.

use crate::ir::Expr;

// ── Tokens ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    KwUnit,
    KwImplements,
    KwPub,
    KwFn,
    Ident(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Plus,
    Dot,
    ColonColon,
    Eof,
}

#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

/// A parse error with a 1-based source position.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message} at {line}:{col}")]
pub struct SyntaxError {
    /// Human-readable message.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl SyntaxError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            col: token.col,
        }
    }
}

// ── Lexer ──────────────────────────────────────────────────────────────

pub(crate) fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;
    let mut col: u32 = 1;

    macro_rules! push {
        ($kind:expr, $line:expr, $col:expr) => {
            tokens.push(Token {
                kind: $kind,
                line: $line,
                col: $col,
            })
        };
    }

    while let Some(&c) = chars.peek() {
        let (tok_line, tok_col) = (line, col);
        match c {
            '\n' => {
                chars.next();
                line += 1;
                col = 1;
            }
            c if c.is_whitespace() => {
                chars.next();
                col += 1;
            }
            '/' => {
                chars.next();
                col += 1;
                if chars.peek() == Some(&'/') {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            col = 1;
                            break;
                        }
                    }
                } else {
                    return Err(SyntaxError {
                        message: "unexpected character '/'".into(),
                        line: tok_line,
                        col: tok_col,
                    });
                }
            }
            '{' => {
                chars.next();
                col += 1;
                push!(TokenKind::LBrace, tok_line, tok_col);
            }
            '}' => {
                chars.next();
                col += 1;
                push!(TokenKind::RBrace, tok_line, tok_col);
            }
            '(' => {
                chars.next();
                col += 1;
                push!(TokenKind::LParen, tok_line, tok_col);
            }
            ')' => {
                chars.next();
                col += 1;
                push!(TokenKind::RParen, tok_line, tok_col);
            }
            ',' => {
                chars.next();
                col += 1;
                push!(TokenKind::Comma, tok_line, tok_col);
            }
            '+' => {
                chars.next();
                col += 1;
                push!(TokenKind::Plus, tok_line, tok_col);
            }
            '.' => {
                chars.next();
                col += 1;
                push!(TokenKind::Dot, tok_line, tok_col);
            }
            ':' => {
                chars.next();
                col += 1;
                if chars.peek() == Some(&':') {
                    chars.next();
                    col += 1;
                    push!(TokenKind::ColonColon, tok_line, tok_col);
                } else {
                    return Err(SyntaxError {
                        message: "expected '::'".into(),
                        line: tok_line,
                        col: tok_col,
                    });
                }
            }
            '"' => {
                chars.next();
                col += 1;
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    col += 1;
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('n') => {
                                col += 1;
                                value.push('\n');
                            }
                            Some('t') => {
                                col += 1;
                                value.push('\t');
                            }
                            Some('"') => {
                                col += 1;
                                value.push('"');
                            }
                            Some('\\') => {
                                col += 1;
                                value.push('\\');
                            }
                            other => {
                                return Err(SyntaxError {
                                    message: format!("invalid escape {:?}", other),
                                    line,
                                    col,
                                })
                            }
                        },
                        '\n' => {
                            return Err(SyntaxError {
                                message: "unterminated string literal".into(),
                                line: tok_line,
                                col: tok_col,
                            })
                        }
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(SyntaxError {
                        message: "unterminated string literal".into(),
                        line: tok_line,
                        col: tok_col,
                    });
                }
                push!(TokenKind::Str(value), tok_line, tok_col);
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                if c == '-' {
                    text.push(c);
                    chars.next();
                    col += 1;
                }
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                let value: i64 = text.parse().map_err(|_| SyntaxError {
                    message: format!("invalid integer literal '{}'", text),
                    line: tok_line,
                    col: tok_col,
                })?;
                push!(TokenKind::Int(value), tok_line, tok_col);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        text.push(d);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                let kind = match text.as_str() {
                    "unit" => TokenKind::KwUnit,
                    "implements" => TokenKind::KwImplements,
                    "pub" => TokenKind::KwPub,
                    "fn" => TokenKind::KwFn,
                    _ => TokenKind::Ident(text),
                };
                push!(kind, tok_line, tok_col);
            }
            other => {
                return Err(SyntaxError {
                    message: format!("unexpected character '{}'", other),
                    line: tok_line,
                    col: tok_col,
                })
            }
        }
    }
    push!(TokenKind::Eof, line, col);
    Ok(tokens)
}

// ── AST ────────────────────────────────────────────────────────────────

/// One parsed method.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    /// Method name.
    pub name: String,
    /// Parameter names in order.
    pub params: Vec<String>,
    /// Body expression.
    pub body: Expr,
    /// 1-based line of the `fn` keyword.
    pub line: u32,
}

/// One parsed unit block.
#[derive(Clone, Debug)]
pub struct UnitDecl {
    /// Qualified unit name.
    pub name: String,
    /// Optional conformance declaration.
    pub implements: Option<String>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDecl>,
}

/// Result of parsing one source text: the units that parsed cleanly plus
/// every error encountered. Recovery restarts at the next `unit` keyword.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Units that parsed without error.
    pub units: Vec<UnitDecl>,
    /// All collected errors.
    pub errors: Vec<SyntaxError>,
}

/// Parse a source text into unit declarations.
pub fn parse(source: &str) -> ParseOutcome {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            return ParseOutcome {
                units: vec![],
                errors: vec![err],
            }
        }
    };
    let mut parser = Parser { tokens, pos: 0 };
    let mut outcome = ParseOutcome::default();
    while !parser.at_eof() {
        match parser.parse_unit() {
            Ok(unit) => outcome.units.push(unit),
            Err(err) => {
                outcome.errors.push(err);
                parser.recover_to_next_unit();
            }
        }
    }
    outcome
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, SyntaxError> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(SyntaxError::at(
                self.peek(),
                format!("expected {}, found {:?}", what, self.peek().kind),
            ))
        }
    }

    fn recover_to_next_unit(&mut self) {
        while !self.at_eof() && self.peek().kind != TokenKind::KwUnit {
            self.advance();
        }
    }

    fn parse_ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(SyntaxError::at(
                self.peek(),
                format!("expected {}, found {:?}", what, other),
            )),
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = self.parse_ident("a name")?;
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            name.push('.');
            name.push_str(&self.parse_ident("a name segment")?);
        }
        Ok(name)
    }

    fn parse_unit(&mut self) -> Result<UnitDecl, SyntaxError> {
        self.expect(&TokenKind::KwUnit, "'unit'")?;
        let name = self.parse_qualified_name()?;
        let implements = if self.peek().kind == TokenKind::KwImplements {
            self.advance();
            Some(self.parse_qualified_name()?)
        } else {
            None
        };
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut methods = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            if self.at_eof() {
                return Err(SyntaxError::at(
                    self.peek(),
                    format!("unit '{}' is missing a closing '}}'", name),
                ));
            }
            methods.push(self.parse_method()?);
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(UnitDecl {
            name,
            implements,
            methods,
        })
    }

    fn parse_method(&mut self) -> Result<MethodDecl, SyntaxError> {
        let line = self.peek().line;
        self.expect(&TokenKind::KwPub, "'pub'")?;
        self.expect(&TokenKind::KwFn, "'fn'")?;
        let name = self.parse_ident("a method name")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                params.push(self.parse_ident("a parameter name")?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_expr()?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(MethodDecl {
            name,
            params,
            body,
            line,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_term()?;
        while self.peek().kind == TokenKind::Plus {
            self.advance();
            let rhs = self.parse_term()?;
            expr = Expr::Add(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek().kind.clone() {
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::Ident(_) => {
                let start = self.peek().clone();
                let name = self.parse_qualified_name()?;
                if self.peek().kind == TokenKind::ColonColon {
                    self.advance();
                    let method = self.parse_ident("a method name")?;
                    self.expect(&TokenKind::LParen, "'('")?;
                    let mut args = Vec::new();
                    if self.peek().kind != TokenKind::RParen {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek().kind == TokenKind::Comma {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    Ok(Expr::Call {
                        unit: name,
                        method,
                        args,
                    })
                } else if name.contains('.') {
                    Err(SyntaxError::at(
                        &start,
                        format!("expected '::' after qualified name '{}'", name),
                    ))
                } else {
                    Ok(Expr::Param(name))
                }
            }
            other => Err(SyntaxError::at(
                self.peek(),
                format!("expected an expression, found {:?}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str = r#"
unit demo.GreetingImpl implements demo.Greeting {
    pub fn greet(name) {
        "Hello, " + name + "!"
    }
}
"#;

    #[test]
    fn parses_greeting_unit() {
        let outcome = parse(GREETING);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.units.len(), 1);
        let unit = &outcome.units[0];
        assert_eq!(unit.name, "demo.GreetingImpl");
        assert_eq!(unit.implements.as_deref(), Some("demo.Greeting"));
        assert_eq!(unit.methods.len(), 1);
        assert_eq!(unit.methods[0].name, "greet");
        assert_eq!(unit.methods[0].params, vec!["name"]);
    }

    #[test]
    fn parses_unit_without_implements() {
        let outcome = parse("unit demo.Helper {\n pub fn shout(x) { x }\n}");
        assert!(outcome.errors.is_empty());
        assert!(outcome.units[0].implements.is_none());
    }

    #[test]
    fn parses_cross_unit_call() {
        let outcome = parse(
            "unit demo.A {\n pub fn run(x) { demo.Helper::shout(x, 1 + 2) }\n}",
        );
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        match &outcome.units[0].methods[0].body {
            Expr::Call { unit, method, args } => {
                assert_eq!(unit, "demo.Helper");
                assert_eq!(method, "shout");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn parses_string_escapes_and_comments() {
        let outcome = parse(
            "// header comment\nunit demo.A {\n pub fn f() { \"line\\n\\\"quoted\\\"\" }\n}",
        );
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        match &outcome.units[0].methods[0].body {
            Expr::Str(s) => assert_eq!(s, "line\n\"quoted\""),
            other => panic!("expected a string literal, got {:?}", other),
        }
    }

    #[test]
    fn parses_negative_integers() {
        let outcome = parse("unit demo.A {\n pub fn f() { -4 + 6 }\n}");
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    }

    #[test]
    fn syntax_error_carries_position() {
        let outcome = parse("unit demo.A {\n pub fn f( { 1 }\n}");
        assert_eq!(outcome.units.len(), 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 2);
    }

    #[test]
    fn recovery_salvages_later_units() {
        let source = "unit demo.Bad { pub fn ( }\nunit demo.Good {\n pub fn ok() { 1 }\n}";
        let outcome = parse(source);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].name, "demo.Good");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let outcome = parse("unit demo.A {\n pub fn f() { \"open\n}\n}");
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn missing_closing_brace_is_reported() {
        let outcome = parse("unit demo.A {\n pub fn f() { 1 }\n");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("closing"));
    }

    #[test]
    fn multiple_units_parse() {
        let source = "unit demo.A { pub fn a() { 1 } }\nunit demo.B { pub fn b() { 2 } }";
        let outcome = parse(source);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.units.len(), 2);
    }
}
