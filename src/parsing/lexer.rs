//! Tokenizer for the IDL surface syntax.
//!
//! Produces two streams: code tokens with their line/column, and comments
//! with the line they occupy. Keeping comments out of the token stream lets
//! the parser stay oblivious to them while the attacher works purely from
//! positions.

use super::error::{ParseError, ParseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword or dotted type path (`foo`, `api.v1.User`, `.pkg.T`)
    Ident,
    /// Integer or float literal, sign excluded
    Number,
    /// String literal contents without the quotes
    Str,
    /// Any single punctuation character
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u16,
}

impl Token {
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub line: u32,
    pub end_line: u32,
    pub text: String,
    /// Code precedes the comment on its first line
    pub trailing: bool,
}

#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u16,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column = self.column.saturating_add(1);
        }
        Some(c)
    }
}

/// Tokenize `source`. Fails only on unterminated strings or block comments.
pub fn tokenize(source: &str) -> ParseResult<Lexed> {
    let mut cursor = Cursor {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 0,
    };
    let mut lexed = Lexed::default();
    let mut code_on_line = false;

    while let Some(c) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.column);

        if c == '\n' {
            cursor.bump();
            code_on_line = false;
            continue;
        }

        if c.is_whitespace() || c == '\u{feff}' {
            cursor.bump();
            continue;
        }

        if c == '/' && cursor.peek_at(1) == Some('/') {
            let mut raw = String::new();
            while let Some(next) = cursor.peek() {
                if next == '\n' {
                    break;
                }
                raw.push(next);
                cursor.bump();
            }
            lexed.comments.push(Comment {
                line,
                end_line: line,
                text: clean_line_comment(&raw),
                trailing: code_on_line,
            });
            continue;
        }

        if c == '/' && cursor.peek_at(1) == Some('*') {
            cursor.bump();
            cursor.bump();
            let mut raw = String::new();
            loop {
                match cursor.peek() {
                    None => {
                        return Err(ParseError::new(line, column, "unterminated block comment"));
                    }
                    Some('*') if cursor.peek_at(1) == Some('/') => {
                        cursor.bump();
                        cursor.bump();
                        break;
                    }
                    Some(next) => {
                        raw.push(next);
                        cursor.bump();
                    }
                }
            }
            lexed.comments.push(Comment {
                line,
                end_line: cursor.line,
                text: clean_block_comment(&raw),
                trailing: code_on_line,
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            cursor.bump();
            let mut text = String::new();
            loop {
                match cursor.bump() {
                    None | Some('\n') => {
                        return Err(ParseError::new(line, column, "unterminated string literal"));
                    }
                    Some('\\') => {
                        if let Some(escaped) = cursor.bump() {
                            text.push(escaped);
                        }
                    }
                    Some(next) if next == quote => break,
                    Some(next) => text.push(next),
                }
            }
            lexed.tokens.push(Token {
                kind: TokenKind::Str,
                text,
                line,
                column,
            });
            code_on_line = true;
            continue;
        }

        let starts_ident = c.is_alphabetic()
            || c == '_'
            || (c == '.' && cursor.peek_at(1).is_some_and(|n| n.is_alphabetic() || n == '_'));
        if starts_ident {
            let mut text = String::new();
            while let Some(next) = cursor.peek() {
                if next.is_alphanumeric() || next == '_' || next == '.' {
                    text.push(next);
                    cursor.bump();
                } else {
                    break;
                }
            }
            lexed.tokens.push(Token {
                kind: TokenKind::Ident,
                text,
                line,
                column,
            });
            code_on_line = true;
            continue;
        }

        if c.is_ascii_digit() {
            let mut text = String::new();
            while let Some(next) = cursor.peek() {
                let exponent_sign = (next == '+' || next == '-')
                    && text.ends_with(['e', 'E'])
                    && !text.starts_with("0x")
                    && !text.starts_with("0X");
                if next.is_alphanumeric() || next == '.' || exponent_sign {
                    text.push(next);
                    cursor.bump();
                } else {
                    break;
                }
            }
            lexed.tokens.push(Token {
                kind: TokenKind::Number,
                text,
                line,
                column,
            });
            code_on_line = true;
            continue;
        }

        cursor.bump();
        lexed.tokens.push(Token {
            kind: TokenKind::Symbol(c),
            text: c.to_string(),
            line,
            column,
        });
        code_on_line = true;
    }

    Ok(lexed)
}

fn clean_line_comment(raw: &str) -> String {
    raw.trim_start_matches('/').trim().to_string()
}

fn clean_block_comment(raw: &str) -> String {
    raw.lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
