//! Recursive-descent parser over the token stream.
//!
//! Recovers a structural subset of the grammar: services with their RPCs,
//! messages (nested to any depth), enums, fields and enum values. Anything
//! it does not understand (options, extensions, reserved ranges, groups) is
//! skipped statement by statement, so one bad declaration never hides the
//! rest of the file.

use super::comments::CommentAttacher;
use super::definition::{EnumValue, Field, Message, ProtoEnum, ProtoFile, Rpc, Service};
use super::error::ParseResult;
use super::lexer::{Token, TokenKind, tokenize};
use crate::types::{Label, Range};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Parse one source file into a [`ProtoFile`].
///
/// Fails only when the text cannot be tokenized at all.
pub fn parse(source: &str, path: impl Into<PathBuf>) -> ParseResult<ProtoFile> {
    let lexed = tokenize(source)?;
    let mut file = ProtoFile::new(path);

    let mut parser = Parser {
        tokens: &lexed.tokens,
        pos: 0,
        attacher: CommentAttacher::new(&lexed.comments, &lexed.tokens),
        package: String::new(),
        scope: Vec::new(),
    };
    parser.parse_file(&mut file);

    tracing::debug!(
        target: "parser",
        "parsed {}: {} services, {} messages, {} enums",
        file.path.display(),
        file.services.len(),
        file.messages.len(),
        file.enums.len()
    );

    Ok(file)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    attacher: CommentAttacher<'a>,
    package: String,
    /// Names of the enclosing messages, outermost first
    scope: Vec<String>,
}

fn range_between(start: &Token, end: &Token) -> Range {
    Range::new(
        start.line,
        start.column,
        end.line,
        end.column.saturating_add(end.text.chars().count() as u16),
    )
}

fn parse_integer(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat_symbol(&mut self, c: char) -> Option<&'a Token> {
        match self.peek() {
            Some(token) if token.is_symbol(c) => self.advance(),
            _ => None,
        }
    }

    fn eat_ident(&mut self) -> Option<&'a Token> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => self.advance(),
            _ => None,
        }
    }

    fn at_symbol(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(c))
    }

    /// Skip to the end of the current statement: a `;` or a balanced
    /// `{ ... }` block. Stops before a `}` that closes the enclosing body.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Symbol(';') if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                TokenKind::Symbol('{') => {
                    depth += 1;
                    self.pos += 1;
                }
                TokenKind::Symbol('}') => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a balanced bracketed group starting at the current `open` token.
    fn skip_group(&mut self, open: char, close: char) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is_symbol(open) {
                depth += 1;
            } else if token.is_symbol(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn scoped_name(&self, name: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.scope.len() + 2);
        if !self.package.is_empty() {
            parts.push(&self.package);
        }
        parts.extend(self.scope.iter().map(String::as_str));
        parts.push(name);
        parts.join(".")
    }

    fn parse_file(&mut self, file: &mut ProtoFile) {
        let mut syntax_seen = false;
        let mut package_seen = false;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Ident => match token.text.as_str() {
                    "syntax" => {
                        if let Some(syntax) = self.parse_assignment_string() {
                            if !syntax_seen {
                                file.syntax = syntax;
                                syntax_seen = true;
                            }
                        }
                    }
                    "package" => {
                        self.advance();
                        match (self.eat_ident(), self.eat_symbol(';')) {
                            (Some(name), Some(_)) => {
                                if !package_seen {
                                    self.package = name.text.clone();
                                    file.package = name.text.clone();
                                    package_seen = true;
                                }
                            }
                            _ => self.skip_statement(),
                        }
                    }
                    "import" => {
                        if let Some(import) = self.parse_import() {
                            file.imports.push(import);
                        }
                    }
                    "message" => {
                        if let Some(message) = self.parse_message() {
                            file.messages.push(Arc::new(message));
                        }
                    }
                    "enum" => {
                        if let Some(proto_enum) = self.parse_enum() {
                            file.enums.push(Arc::new(proto_enum));
                        }
                    }
                    "service" => {
                        if let Some(service) = self.parse_service() {
                            file.services.push(Arc::new(service));
                        }
                    }
                    _ => self.skip_statement(),
                },
                TokenKind::Symbol(';') | TokenKind::Symbol('}') => {
                    self.advance();
                }
                _ => self.skip_statement(),
            }
        }
    }

    /// `keyword = "value" ;`
    fn parse_assignment_string(&mut self) -> Option<String> {
        self.advance();
        if self.eat_symbol('=').is_none() {
            self.skip_statement();
            return None;
        }
        let value = match self.peek() {
            Some(token) if token.kind == TokenKind::Str => {
                self.advance();
                token.text.clone()
            }
            _ => {
                self.skip_statement();
                return None;
            }
        };
        if self.eat_symbol(';').is_none() {
            self.skip_statement();
            return None;
        }
        Some(value)
    }

    /// `import [public|weak] "path" ;`
    fn parse_import(&mut self) -> Option<String> {
        self.advance();
        if let Some(token) = self.peek() {
            if token.is_ident("public") || token.is_ident("weak") {
                self.advance();
            }
        }
        let path = match self.peek() {
            Some(token) if token.kind == TokenKind::Str => {
                self.advance();
                token.text.clone()
            }
            _ => {
                self.skip_statement();
                return None;
            }
        };
        if self.eat_symbol(';').is_none() {
            self.skip_statement();
        }
        Some(path)
    }

    /// Consume `keyword Name {` and return (keyword token, name token).
    fn parse_block_header(&mut self) -> Option<(&'a Token, &'a Token)> {
        let keyword = self.advance()?;
        let Some(name) = self.eat_ident() else {
            self.skip_statement();
            return None;
        };
        if !self.at_symbol('{') {
            self.skip_statement();
            return None;
        }
        self.advance();
        Some((keyword, name))
    }

    fn parse_message(&mut self) -> Option<Message> {
        let (keyword, name) = self.parse_block_header()?;
        let comment = self.attacher.attach(keyword, name.line);
        let full_name = self.scoped_name(&name.text);

        self.scope.push(name.text.clone());
        let mut fields = Vec::new();
        let mut nested_messages = Vec::new();
        let mut nested_enums = Vec::new();

        let end = loop {
            let Some(token) = self.peek() else {
                break None;
            };
            match token.kind {
                TokenKind::Symbol('}') => {
                    self.advance();
                    break Some(token);
                }
                TokenKind::Symbol(';') => {
                    self.advance();
                }
                TokenKind::Ident => match token.text.as_str() {
                    "message" => {
                        if let Some(nested) = self.parse_message() {
                            nested_messages.push(Arc::new(nested));
                        }
                    }
                    "enum" => {
                        if let Some(nested) = self.parse_enum() {
                            nested_enums.push(Arc::new(nested));
                        }
                    }
                    "oneof" => self.parse_oneof(&mut fields),
                    "option" | "reserved" | "extensions" | "extend" | "service" => {
                        self.skip_statement()
                    }
                    _ => {
                        if let Some(field) = self.parse_field() {
                            fields.push(field);
                        }
                    }
                },
                _ => self.skip_statement(),
            }
        };
        self.scope.pop();

        let Some(end) = end else {
            tracing::debug!(target: "parser", "message {} is never closed, dropping it", name.text);
            return None;
        };

        Some(Message {
            name: name.text.clone(),
            full_name,
            fields,
            nested_messages,
            nested_enums,
            comment,
            range: range_between(keyword, end),
        })
    }

    /// Members of a `oneof` are flattened into the enclosing message.
    fn parse_oneof(&mut self, fields: &mut Vec<Field>) {
        if self.parse_block_header().is_none() {
            return;
        }
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Symbol('}') => {
                    self.advance();
                    return;
                }
                TokenKind::Symbol(';') => {
                    self.advance();
                }
                TokenKind::Ident if token.text == "option" => self.skip_statement(),
                TokenKind::Ident => {
                    if let Some(field) = self.parse_field() {
                        fields.push(field);
                    }
                }
                _ => self.skip_statement(),
            }
        }
    }

    /// `[label] Type name = N [ [options] ] ;`
    fn parse_field(&mut self) -> Option<Field> {
        let start = self.peek()?;

        let mut label = None;
        if let (Some(word), Some(next)) = (Label::from_keyword(&start.text), self.peek_at(1)) {
            if next.kind == TokenKind::Ident {
                label = Some(word);
                self.advance();
            }
        }

        let Some(type_name) = self.parse_type() else {
            self.skip_statement();
            return None;
        };
        let Some(name) = self.eat_ident() else {
            self.skip_statement();
            return None;
        };
        if self.eat_symbol('=').is_none() {
            self.skip_statement();
            return None;
        }
        let number = match self.peek() {
            Some(token) if token.kind == TokenKind::Number => {
                self.advance();
                parse_integer(&token.text)
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
            }
            _ => None,
        };
        let Some(number) = number else {
            self.skip_statement();
            return None;
        };

        let options = if self.at_symbol('[') {
            self.parse_options()
        } else {
            IndexMap::new()
        };

        // Proto2 groups carry a body; they are not plain fields.
        if self.at_symbol('{') {
            self.skip_group('{', '}');
            return None;
        }

        let Some(end) = self.eat_symbol(';') else {
            self.skip_statement();
            return None;
        };

        Some(Field {
            name: name.text.clone(),
            type_name,
            number,
            label,
            comment: self.attacher.attach(start, end.line),
            options,
            range: range_between(start, end),
        })
    }

    /// A type token, or `map<K, V>` rendered back as a single string.
    fn parse_type(&mut self) -> Option<String> {
        let token = self.eat_ident()?;
        if token.text != "map" || !self.at_symbol('<') {
            return Some(token.text.clone());
        }

        self.advance();
        let key = self.eat_ident()?;
        self.eat_symbol(',')?;
        let value = self.eat_ident()?;
        self.eat_symbol('>')?;
        Some(format!("map<{}, {}>", key.text, value.text))
    }

    /// `[key = value, (custom).path = value]`
    fn parse_options(&mut self) -> IndexMap<String, String> {
        let mut options = IndexMap::new();
        self.advance();

        loop {
            let mut key = String::new();
            while let Some(token) = self.peek() {
                if token.is_symbol('=') || token.is_symbol(']') || token.is_symbol(';') {
                    break;
                }
                key.push_str(&token.text);
                self.advance();
            }
            if self.eat_symbol('=').is_none() {
                self.eat_symbol(']');
                return options;
            }

            let mut value: Vec<&Token> = Vec::new();
            let mut depth = 0usize;
            while let Some(token) = self.peek() {
                match token.kind {
                    TokenKind::Symbol('{') | TokenKind::Symbol('[') | TokenKind::Symbol('(') => {
                        depth += 1
                    }
                    TokenKind::Symbol('}') | TokenKind::Symbol(')') => {
                        depth = depth.saturating_sub(1)
                    }
                    TokenKind::Symbol(']') if depth > 0 => depth -= 1,
                    TokenKind::Symbol(']') | TokenKind::Symbol(',') if depth == 0 => break,
                    TokenKind::Symbol(';') if depth == 0 => break,
                    _ => {}
                }
                value.push(token);
                self.advance();
            }
            options.insert(key, render_option_value(&value));

            if self.eat_symbol(',').is_none() {
                self.eat_symbol(']');
                return options;
            }
        }
    }

    fn parse_enum(&mut self) -> Option<ProtoEnum> {
        let (keyword, name) = self.parse_block_header()?;
        let comment = self.attacher.attach(keyword, name.line);
        let full_name = self.scoped_name(&name.text);
        let mut values = Vec::new();

        let end = loop {
            let Some(token) = self.peek() else {
                break None;
            };
            match token.kind {
                TokenKind::Symbol('}') => {
                    self.advance();
                    break Some(token);
                }
                TokenKind::Symbol(';') => {
                    self.advance();
                }
                TokenKind::Ident if token.text == "option" || token.text == "reserved" => {
                    self.skip_statement()
                }
                TokenKind::Ident => {
                    if let Some(value) = self.parse_enum_value() {
                        values.push(value);
                    }
                }
                _ => self.skip_statement(),
            }
        };

        let Some(end) = end else {
            tracing::debug!(target: "parser", "enum {} is never closed, dropping it", name.text);
            return None;
        };

        Some(ProtoEnum {
            name: name.text.clone(),
            full_name,
            values,
            comment,
            range: range_between(keyword, end),
        })
    }

    /// `NAME = [-]N [ [options] ] ;`
    fn parse_enum_value(&mut self) -> Option<EnumValue> {
        let Some(name) = self.eat_ident() else {
            self.skip_statement();
            return None;
        };
        if self.eat_symbol('=').is_none() {
            self.skip_statement();
            return None;
        }
        let negative = self.eat_symbol('-').is_some();
        let number = match self.peek() {
            Some(token) if token.kind == TokenKind::Number => {
                self.advance();
                parse_integer(&token.text)
                    .map(|n| if negative { -n } else { n })
                    .and_then(|n| i32::try_from(n).ok())
            }
            _ => None,
        };
        let Some(number) = number else {
            self.skip_statement();
            return None;
        };
        if self.at_symbol('[') {
            self.skip_group('[', ']');
        }
        let Some(end) = self.eat_symbol(';') else {
            self.skip_statement();
            return None;
        };

        Some(EnumValue {
            name: name.text.clone(),
            number,
            comment: self.attacher.attach(name, end.line),
            range: range_between(name, end),
        })
    }

    fn parse_service(&mut self) -> Option<Service> {
        let (keyword, name) = self.parse_block_header()?;
        let comment = self.attacher.attach(keyword, name.line);
        let full_name = self.scoped_name(&name.text);
        let mut rpcs = Vec::new();

        let end = loop {
            let Some(token) = self.peek() else {
                break None;
            };
            match token.kind {
                TokenKind::Symbol('}') => {
                    self.advance();
                    break Some(token);
                }
                TokenKind::Symbol(';') => {
                    self.advance();
                }
                TokenKind::Ident if token.text == "rpc" => {
                    if let Some(rpc) = self.parse_rpc() {
                        rpcs.push(rpc);
                    }
                }
                _ => self.skip_statement(),
            }
        };

        let Some(end) = end else {
            tracing::debug!(target: "parser", "service {} is never closed, dropping it", name.text);
            return None;
        };

        Some(Service {
            name: name.text.clone(),
            full_name,
            rpcs,
            comment,
            range: range_between(keyword, end),
        })
    }

    /// `( [stream] Type )`
    fn parse_rpc_argument(&mut self) -> Option<(bool, String, &'a Token)> {
        self.eat_symbol('(')?;
        let mut streaming = false;
        if let (Some(first), Some(second)) = (self.peek(), self.peek_at(1)) {
            if first.is_ident("stream") && second.kind == TokenKind::Ident {
                streaming = true;
                self.advance();
            }
        }
        let type_name = self.eat_ident()?;
        let close = self.eat_symbol(')')?;
        Some((streaming, type_name.text.clone(), close))
    }

    /// `rpc Name ( [stream] Req ) returns ( [stream] Resp ) ( ; | { ... } )`
    fn parse_rpc(&mut self) -> Option<Rpc> {
        let keyword = self.advance()?;
        let Some(name) = self.eat_ident() else {
            self.skip_statement();
            return None;
        };
        let Some((request_streaming, request_type, _)) = self.parse_rpc_argument() else {
            self.skip_statement();
            return None;
        };
        if !self.peek().is_some_and(|t| t.is_ident("returns")) {
            self.skip_statement();
            return None;
        }
        self.advance();
        let Some((response_streaming, response_type, signature_end)) = self.parse_rpc_argument()
        else {
            self.skip_statement();
            return None;
        };

        let end = if self.at_symbol('{') {
            let open = self.pos;
            self.skip_group('{', '}');
            self.tokens.get(self.pos.saturating_sub(1)).filter(|_| self.pos > open)
        } else {
            self.eat_symbol(';')
        };
        let Some(end) = end else {
            self.skip_statement();
            return None;
        };

        Some(Rpc {
            name: name.text.clone(),
            request_type,
            response_type,
            request_streaming,
            response_streaming,
            comment: self.attacher.attach(keyword, signature_end.line),
            range: range_between(keyword, end),
        })
    }
}

fn render_option_value(tokens: &[&Token]) -> String {
    match tokens {
        [single] => single.text.clone(),
        [sign, number] if sign.is_symbol('-') && number.kind == TokenKind::Number => {
            format!("-{}", number.text)
        }
        _ => tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
    }
}
