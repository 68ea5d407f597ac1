//! Tokenizer and recursive-descent parser for `.schema` modules.
//!
//! ```text
//! # comments start with '#' or '//'
//! type User {
//!   id: Int
//!   name: String?
//!   tags: [String]
//! }
//! enum Role { Admin, Member }
//! ```

use std::path::{Path, PathBuf};
use typeweave_core::{Error, Result, TypeRef};

/// A top-level declaration as written in one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// 1-based line of the declaring keyword.
    pub line: usize,
    pub body: DeclarationBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationBody {
    Object(Vec<FieldDecl>),
    Enum(Vec<VariantDecl>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Question,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{}`", name),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Question => "`?`".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

/// Parses one module's source text.
///
/// `module` is only used for error reporting.
pub fn parse_module(source: &str, module: &Path) -> Result<Vec<Declaration>> {
    let tokens = tokenize(source, module)?;
    let last_line = source.lines().count().max(1);
    Parser {
        tokens,
        pos: 0,
        module,
        last_line,
    }
    .parse_declarations()
}

fn parse_error(module: &Path, line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        module: module.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn tokenize(source: &str, module: &Path) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        let token = match c {
            '\n' => {
                line += 1;
                continue;
            }
            c if c.is_whitespace() => continue,
            '#' => {
                skip_to_eol(&mut chars);
                continue;
            }
            '/' if chars.peek() == Some(&'/') => {
                skip_to_eol(&mut chars);
                continue;
            }
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '?' => Token::Question,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(ident)
            }
            other => {
                return Err(parse_error(
                    module,
                    line,
                    format!("unexpected character `{}`", other),
                ))
            }
        };
        tokens.push(Spanned { token, line });
    }

    Ok(tokens)
}

// Leaves the newline in place so the caller still counts it.
fn skip_to_eol(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&next) = chars.peek() {
        if next == '\n' {
            break;
        }
        chars.next();
    }
}

/// Deepest list nesting accepted in a field type.
pub const MAX_TYPE_DEPTH: usize = 64;

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    module: &'a Path,
    last_line: usize,
}

impl Parser<'_> {
    fn parse_declarations(mut self) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();

        while let Some(spanned) = self.next() {
            let line = spanned.line;
            let declaration = match spanned.token {
                Token::Ident(keyword) if keyword == "type" => {
                    let name = self.expect_ident("type name")?;
                    self.expect(Token::LBrace)?;
                    Declaration {
                        name,
                        line,
                        body: DeclarationBody::Object(self.parse_fields()?),
                    }
                }
                Token::Ident(keyword) if keyword == "enum" => {
                    let name = self.expect_ident("enum name")?;
                    self.expect(Token::LBrace)?;
                    Declaration {
                        name,
                        line,
                        body: DeclarationBody::Enum(self.parse_variants()?),
                    }
                }
                other => {
                    return Err(self.error_at(
                        line,
                        format!("expected `type` or `enum`, found {}", other.describe()),
                    ))
                }
            };
            declarations.push(declaration);
        }

        Ok(declarations)
    }

    fn parse_fields(&mut self) -> Result<Vec<FieldDecl>> {
        let mut fields = Vec::new();
        loop {
            if self.eat(&Token::RBrace) {
                return Ok(fields);
            }
            let line = self.current_line();
            let name = self.expect_ident("field name or `}`")?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl { name, ty, line });
            self.eat(&Token::Comma);
        }
    }

    fn parse_variants(&mut self) -> Result<Vec<VariantDecl>> {
        let mut variants = Vec::new();
        loop {
            if self.eat(&Token::RBrace) {
                return Ok(variants);
            }
            let line = self.current_line();
            let name = self.expect_ident("variant name or `}`")?;
            variants.push(VariantDecl { name, line });
            self.eat(&Token::Comma);
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        self.parse_type_at(0)
    }

    fn parse_type_at(&mut self, depth: usize) -> Result<TypeRef> {
        if depth > MAX_TYPE_DEPTH {
            return Err(self.error_at(
                self.current_line(),
                format!("type nesting too deep (limit {})", MAX_TYPE_DEPTH),
            ));
        }

        let base = if self.eat(&Token::LBracket) {
            let inner = self.parse_type_at(depth + 1)?;
            self.expect(Token::RBracket)?;
            TypeRef::list(inner)
        } else {
            TypeRef::named(self.expect_ident("type")?)
        };

        if self.eat(&Token::Question) {
            Ok(TypeRef::optional(base))
        } else {
            Ok(base)
        }
    }

    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn eat(&mut self, expected: &Token) -> bool {
        match self.tokens.get(self.pos) {
            Some(spanned) if &spanned.token == expected => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.eat(&expected) {
            return Ok(());
        }
        Err(self.unexpected(&expected.describe()))
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.tokens.get(self.pos) {
            Some(spanned) => self.error_at(
                spanned.line,
                format!("expected {}, found {}", expected, spanned.token.describe()),
            ),
            None => self.error_at(
                self.last_line,
                format!("expected {}, found end of file", expected),
            ),
        }
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.line)
            .unwrap_or(self.last_line)
    }

    fn error_at(&self, line: usize, message: String) -> Error {
        parse_error(self.module, line, message)
    }
}

/// Convenience for tests and callers holding an owned path.
pub fn parse_module_at(source: &str, module: impl Into<PathBuf>) -> Result<Vec<Declaration>> {
    let module = module.into();
    parse_module(source, &module)
}
