//! Typed document model produced by the parser.
//!
//! Every entity is immutable once built. Messages, enums and services are
//! wrapped in `Arc` so the symbol index can share them with the owning
//! [`ProtoFile`] instead of copying.

use crate::types::{Label, Range};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Syntax version assumed when a file has no `syntax` statement.
pub const DEFAULT_SYNTAX: &str = "proto2";

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub number: u32,
    pub label: Option<Label>,
    pub comment: Option<String>,
    pub options: IndexMap<String, String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub comment: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub full_name: String,
    pub fields: Vec<Field>,
    pub nested_messages: Vec<Arc<Message>>,
    pub nested_enums: Vec<Arc<ProtoEnum>>,
    pub comment: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoEnum {
    pub name: String,
    pub full_name: String,
    pub values: Vec<EnumValue>,
    pub comment: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rpc {
    pub name: String,
    pub request_type: String,
    pub response_type: String,
    pub request_streaming: bool,
    pub response_streaming: bool,
    pub comment: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub full_name: String,
    pub rpcs: Vec<Rpc>,
    pub comment: Option<String>,
    pub range: Range,
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoFile {
    pub path: PathBuf,
    pub syntax: String,
    pub package: String,
    pub imports: Vec<String>,
    pub services: Vec<Arc<Service>>,
    pub messages: Vec<Arc<Message>>,
    pub enums: Vec<Arc<ProtoEnum>>,
}

impl ProtoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            syntax: DEFAULT_SYNTAX.to_string(),
            package: String::new(),
            imports: Vec::new(),
            services: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
        }
    }

    /// All messages in declaration order, each followed by its nested messages.
    pub fn all_messages(&self) -> Vec<&Arc<Message>> {
        fn walk<'a>(messages: &'a [Arc<Message>], out: &mut Vec<&'a Arc<Message>>) {
            for message in messages {
                out.push(message);
                walk(&message.nested_messages, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.messages, &mut out);
        out
    }

    /// Top-level enums first, then enums nested inside messages.
    pub fn all_enums(&self) -> Vec<&Arc<ProtoEnum>> {
        let mut out: Vec<&Arc<ProtoEnum>> = self.enums.iter().collect();
        for message in self.all_messages() {
            out.extend(message.nested_enums.iter());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(name: &str, nested: Vec<Arc<Message>>, enums: Vec<Arc<ProtoEnum>>) -> Arc<Message> {
        Arc::new(Message {
            name: name.to_string(),
            full_name: format!("pkg.{name}"),
            fields: Vec::new(),
            nested_messages: nested,
            nested_enums: enums,
            comment: None,
            range: Range::default(),
        })
    }

    fn proto_enum(name: &str) -> Arc<ProtoEnum> {
        Arc::new(ProtoEnum {
            name: name.to_string(),
            full_name: format!("pkg.{name}"),
            values: Vec::new(),
            comment: None,
            range: Range::default(),
        })
    }

    #[test]
    fn test_all_messages_is_preorder() {
        let mut file = ProtoFile::new("a.proto");
        let inner = message("Inner", vec![message("Deepest", vec![], vec![])], vec![]);
        file.messages = vec![message("Outer", vec![inner], vec![]), message("Other", vec![], vec![])];

        let names: Vec<_> = file.all_messages().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["Outer", "Inner", "Deepest", "Other"]);
    }

    #[test]
    fn test_all_enums_includes_nested() {
        let mut file = ProtoFile::new("a.proto");
        file.enums = vec![proto_enum("Top")];
        file.messages = vec![message("Holder", vec![], vec![proto_enum("Kind")])];

        let names: Vec<_> = file.all_enums().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["Top", "Kind"]);
    }

    #[test]
    fn test_cloned_file_shares_nested_entities() {
        let mut file = ProtoFile::new("a.proto");
        file.messages = vec![message("Outer", vec![message("Inner", vec![], vec![])], vec![])];

        let copy = file.clone();
        assert_eq!(copy, file);
        assert!(Arc::ptr_eq(&copy.all_messages()[1], &file.all_messages()[1]));
    }

    #[test]
    fn test_default_syntax() {
        let file = ProtoFile::new("x.proto");
        assert_eq!(file.syntax, DEFAULT_SYNTAX);
        assert!(file.package.is_empty());
    }
}
