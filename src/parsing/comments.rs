//! Position-aware documentation attachment.
//!
//! A construct receives the run of comment-only lines ending directly above
//! its first line, then a comment sitting in front of its first token on the
//! same line, then any trailing comment on its header line. A blank line (or
//! a line with code) ends the run.

use super::lexer::{Comment, Token};
use std::collections::HashMap;

pub struct CommentAttacher<'a> {
    /// Comment-only entries keyed by the line they end on
    leading: HashMap<u32, Vec<&'a Comment>>,
    /// Comments followed by code on their last line, keyed by the position
    /// of the first token after them
    inline: HashMap<(u32, u16), Vec<&'a Comment>>,
    /// Comments that follow code, keyed by their line
    trailing: HashMap<u32, Vec<&'a Comment>>,
}

impl<'a> CommentAttacher<'a> {
    pub fn new(comments: &'a [Comment], tokens: &[Token]) -> Self {
        let mut first_column: HashMap<u32, u16> = HashMap::new();
        for token in tokens {
            first_column
                .entry(token.line)
                .and_modify(|column| *column = (*column).min(token.column))
                .or_insert(token.column);
        }

        let mut leading: HashMap<u32, Vec<&Comment>> = HashMap::new();
        let mut inline: HashMap<(u32, u16), Vec<&Comment>> = HashMap::new();
        let mut trailing: HashMap<u32, Vec<&Comment>> = HashMap::new();

        for comment in comments {
            if comment.trailing {
                trailing.entry(comment.line).or_default().push(comment);
            } else if let Some(&column) = first_column.get(&comment.end_line) {
                inline
                    .entry((comment.end_line, column))
                    .or_default()
                    .push(comment);
            } else {
                leading.entry(comment.end_line).or_default().push(comment);
            }
        }

        Self {
            leading,
            inline,
            trailing,
        }
    }

    /// Comment for a construct whose first token is `start` and whose header
    /// ends on `header_line`. Returns `None` when nothing is attached.
    pub fn attach(&self, start: &Token, header_line: u32) -> Option<String> {
        let mut parts = self.leading_for(start.line);

        if let Some(comments) = self.inline.get(&(start.line, start.column)) {
            parts.extend(comments.iter().map(|c| c.text.as_str()));
        }
        if let Some(comments) = self.trailing.get(&header_line) {
            parts.extend(comments.iter().map(|c| c.text.as_str()));
        }

        let joined = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() { None } else { Some(joined) }
    }

    fn leading_for(&self, start_line: u32) -> Vec<&'a str> {
        let mut blocks: Vec<&Vec<&Comment>> = Vec::new();
        let mut expected = start_line.saturating_sub(1);

        while expected > 0 {
            let Some(comments) = self.leading.get(&expected) else {
                break;
            };
            blocks.push(comments);
            let first_line = comments.iter().map(|c| c.line).min().unwrap_or(expected);
            expected = first_line.saturating_sub(1);
        }

        blocks
            .into_iter()
            .rev()
            .flat_map(|comments| comments.iter().map(|c| c.text.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lexer::{Lexed, tokenize};

    /// First token on `line`.
    fn token_on(lexed: &Lexed, line: u32) -> &Token {
        lexed.tokens.iter().find(|t| t.line == line).unwrap()
    }

    fn attach_at(source: &str, line: u32) -> Option<String> {
        let lexed = tokenize(source).unwrap();
        let attacher = CommentAttacher::new(&lexed.comments, &lexed.tokens);
        attacher.attach(token_on(&lexed, line), line)
    }

    #[test]
    fn test_leading_run_and_trailing_are_joined() {
        let source = "// First line\n// Second line\nmessage User { // inline\n}\n";
        assert_eq!(
            attach_at(source, 3).as_deref(),
            Some("First line Second line inline")
        );
    }

    #[test]
    fn test_blank_line_breaks_the_run() {
        let source = "// Detached license header\n\n// Attached doc\nmessage User {}\n";
        assert_eq!(attach_at(source, 4).as_deref(), Some("Attached doc"));
    }

    #[test]
    fn test_trailing_comment_of_previous_line_is_not_leading() {
        let source = "  string a = 1; // about a\n  string b = 2;\n";
        assert_eq!(attach_at(source, 1).as_deref(), Some("about a"));
        assert_eq!(attach_at(source, 2), None);
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let source = "/*\n * Multi-line\n * block\n */\nenum Kind {}\n";
        assert_eq!(attach_at(source, 5).as_deref(), Some("Multi-line block"));
    }

    #[test]
    fn test_block_comment_before_code_belongs_to_that_code() {
        let source = "/* legacy id */ string a = 1;\nstring b = 2;\n";
        assert_eq!(attach_at(source, 1).as_deref(), Some("legacy id"));
        assert_eq!(attach_at(source, 2), None);
    }

    #[test]
    fn test_inline_block_comment_only_reaches_the_next_token() {
        let source = "/* doc */ message A { string x = 1; }\n";
        let lexed = tokenize(source).unwrap();
        let attacher = CommentAttacher::new(&lexed.comments, &lexed.tokens);

        let field_start = lexed.tokens.iter().find(|t| t.text == "string").unwrap();
        assert_eq!(attacher.attach(token_on(&lexed, 1), 1).as_deref(), Some("doc"));
        assert_eq!(attacher.attach(field_start, 1), None);
    }

    #[test]
    fn test_no_comment_at_file_start() {
        assert_eq!(attach_at("message A {}", 1), None);
    }
}
