//! Tokenizer for the supported JavaScript subset

use crate::core::value::parse_number;
use crate::error::JsError;

/// Punctuators, longest first so that prefix matching picks the longest
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", "**=", "<<=", ">>=", ">>>", "?.", "??", "==", "!=", "<=", ">=", "&&",
    "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "**", "=>",
    "{", "}", "(", ")", "[", "]", ";", ",", ":", "?", "=", "+", "-", "*", "/", "%", "&", "|",
    "^", "!", "<", ">", ".", "~",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Punct(&'static str),
}

/// A token with its byte span in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(p) if *p == punct)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(ident) if ident == name)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn punct(&self) -> Option<&'static str> {
        match &self.kind {
            TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Split source text into tokens, dropping whitespace and comments
pub fn tokenize(src: &str) -> Result<Vec<Token>, JsError> {
    let mut lexer = Lexer {
        src,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn run(&mut self) -> Result<(), JsError> {
        while let Some(c) = self.peek() {
            let start = self.pos;

            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if self.rest().starts_with("//") {
                self.pos = self.rest().find('\n').map_or(self.src.len(), |idx| self.pos + idx);
            } else if self.rest().starts_with("/*") {
                let close = self.rest()[2..]
                    .find("*/")
                    .ok_or_else(|| JsError::syntax("Unterminated comment", self.rest()))?;
                self.pos += close + 4;
            } else if c == '"' || c == '\'' {
                let value = self.string(c)?;
                self.push(TokenKind::Str(value), start);
            } else if c == '`' {
                return Err(JsError::unsupported(self.rest()));
            } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
                let value = self.number()?;
                self.push(TokenKind::Number(value), start);
            } else if is_ident_start(c) {
                let len = self.rest().find(|ch: char| !is_ident_part(ch)).unwrap_or(self.rest().len());
                let ident = self.rest()[..len].to_string();
                self.pos += len;
                self.push(TokenKind::Ident(ident), start);
            } else if let Some(punct) = PUNCTUATORS.iter().find(|p| self.rest().starts_with(**p)) {
                // `a?.5:b` is a conditional, not optional chaining
                let punct = if *punct == "?." && self.rest()[2..].starts_with(|d: char| d.is_ascii_digit()) {
                    "?"
                } else {
                    *punct
                };
                self.pos += punct.len();
                self.push(TokenKind::Punct(punct), start);
            } else {
                return Err(JsError::syntax(&format!("Unexpected character {:?}", c), self.rest()));
            }
        }
        Ok(())
    }

    fn number(&mut self) -> Result<f64, JsError> {
        let rest = self.rest();
        let len = if rest.starts_with("0x") || rest.starts_with("0X") {
            2 + rest[2..].find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(rest.len() - 2)
        } else {
            let bytes = rest.as_bytes();
            let mut len = 0;
            while len < bytes.len() && (bytes[len].is_ascii_digit() || bytes[len] == b'.') {
                len += 1;
            }
            if len < bytes.len() && (bytes[len] == b'e' || bytes[len] == b'E') {
                let mut exp = len + 1;
                if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                    exp += 1;
                }
                if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                        exp += 1;
                    }
                    len = exp;
                }
            }
            len
        };

        let literal = &rest[..len];
        let value = parse_number(literal)
            .ok_or_else(|| JsError::syntax(&format!("Invalid number {}", literal), rest))?;
        self.pos += len;
        Ok(value)
    }

    fn string(&mut self, quote: char) -> Result<String, JsError> {
        let literal_start = self.pos;
        self.pos += 1;
        let mut value = String::new();

        loop {
            let c = self
                .peek()
                .ok_or_else(|| JsError::syntax("Unterminated string", &self.src[literal_start..]))?;
            self.pos += c.len_utf8();

            if c == quote {
                return Ok(value);
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let escaped = self
                .peek()
                .ok_or_else(|| JsError::syntax("Unterminated string", &self.src[literal_start..]))?;
            self.pos += escaped.len_utf8();
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{8}'),
                'f' => value.push('\u{c}'),
                'v' => value.push('\u{b}'),
                '0' => value.push('\0'),
                '\n' => {}
                'x' => {
                    let code = self.code_unit(2)?;
                    value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                'u' if self.peek() == Some('{') => {
                    let close = self
                        .rest()
                        .find('}')
                        .ok_or_else(|| JsError::syntax("Invalid unicode escape", &self.src[literal_start..]))?;
                    let code = u32::from_str_radix(&self.rest()[1..close], 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| JsError::syntax("Invalid unicode escape", &self.src[literal_start..]))?;
                    self.pos += close + 1;
                    value.push(code);
                }
                'u' => value.push(self.utf16_escape()?),
                other => value.push(other),
            }
        }
    }

    /// Read a fixed-width hex escape body
    fn code_unit(&mut self, digits: usize) -> Result<u32, JsError> {
        let hex = self
            .rest()
            .get(..digits)
            .ok_or_else(|| JsError::syntax("Invalid escape sequence", self.rest()))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| JsError::syntax("Invalid escape sequence", hex))?;
        self.pos += digits;
        Ok(code)
    }

    /// Decode `\uXXXX`, joining a high surrogate with a following `\uXXXX` low surrogate
    fn utf16_escape(&mut self) -> Result<char, JsError> {
        let high = self.code_unit(4)?;
        if (0xD800..0xDC00).contains(&high) && self.rest().starts_with("\\u") {
            let low = self
                .rest()
                .get(2..6)
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .filter(|low| (0xDC00..0xE000).contains(low));
            if let Some(low) = low {
                self.pos += 6;
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
        Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}
