//! Cross-reference resolution.
//!
//! Starting from a message (or every RPC of a service), follows each
//! non-primitive type token to its definition and keeps going through the
//! fields of the messages it finds. One visited set is shared across the whole
//! walk: a token is expanded at most once, which both breaks cycles and avoids
//! repeating shared subtrees.

use super::index::SymbolIndex;
use super::views::{EnumValueView, FieldView};
use crate::parsing::{Message, Service};
use crate::types::{EntityKind, is_primitive};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// A type definition reached from the root, keyed by the token that referred to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedDefinition {
    Message {
        name: String,
        full_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        fields: Vec<FieldView>,
        file: PathBuf,
    },
    Enum {
        name: String,
        full_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        values: Vec<EnumValueView>,
        file: PathBuf,
    },
}

impl ResolvedDefinition {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Message { .. } => EntityKind::Message,
            Self::Enum { .. } => EntityKind::Enum,
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            Self::Message { full_name, .. } | Self::Enum { full_name, .. } => full_name,
        }
    }
}

/// Type tokens referenced by a field type. Map fields reference their key and
/// value types.
pub fn referenced_types(type_name: &str) -> Vec<&str> {
    match type_name
        .strip_prefix("map<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) => inner.split(',').map(str::trim).collect(),
        None => vec![type_name],
    }
}

pub struct TypeResolver<'a> {
    index: &'a SymbolIndex,
    visited: HashSet<String>,
    resolved: IndexMap<String, ResolvedDefinition>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(index: &'a SymbolIndex) -> Self {
        Self {
            index,
            visited: HashSet::new(),
            resolved: IndexMap::new(),
        }
    }

    /// Everything reachable from the fields of `message`, at most `max_depth` levels deep.
    pub fn resolve_message(
        mut self,
        message: &Message,
        max_depth: usize,
    ) -> IndexMap<String, ResolvedDefinition> {
        self.visit_fields(message, max_depth);
        self.resolved
    }

    /// Everything reachable from the request and response types of the service's RPCs.
    pub fn resolve_service(
        mut self,
        service: &Service,
        max_depth: usize,
    ) -> IndexMap<String, ResolvedDefinition> {
        if max_depth == 0 {
            return self.resolved;
        }
        for rpc in &service.rpcs {
            self.visit_type(&rpc.request_type, &service.full_name, max_depth);
            self.visit_type(&rpc.response_type, &service.full_name, max_depth);
        }
        self.resolved
    }

    fn visit_fields(&mut self, message: &Message, depth: usize) {
        if depth == 0 {
            return;
        }
        for field in &message.fields {
            for token in referenced_types(&field.type_name) {
                self.visit_type(token, &message.full_name, depth);
            }
        }
    }

    fn visit_type(&mut self, token: &str, context: &str, depth: usize) {
        if is_primitive(token) || !self.visited.insert(token.to_string()) {
            return;
        }

        let index = self.index;
        if let Some(found) = index.message_for_type(token, context) {
            let message = &found.item;
            self.resolved.insert(
                token.to_string(),
                ResolvedDefinition::Message {
                    name: message.name.clone(),
                    full_name: message.full_name.clone(),
                    comment: message.comment.clone(),
                    fields: message.fields.iter().map(FieldView::from).collect(),
                    file: found.file.clone(),
                },
            );
            self.visit_fields(message, depth - 1);
        } else if let Some(found) = index.enum_for_type(token, context) {
            let proto_enum = &found.item;
            self.resolved.insert(
                token.to_string(),
                ResolvedDefinition::Enum {
                    name: proto_enum.name.clone(),
                    full_name: proto_enum.full_name.clone(),
                    comment: proto_enum.comment.clone(),
                    values: proto_enum.values.iter().map(EnumValueView::from).collect(),
                    file: found.file.clone(),
                },
            );
        } else {
            tracing::debug!(target: "resolver", "unresolved type {token} in {context}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;
    use std::sync::Arc;

    fn index_of(sources: &[(&str, &str)]) -> SymbolIndex {
        let mut index = SymbolIndex::new();
        for (path, source) in sources {
            index.ingest(Arc::new(parse(source, *path).unwrap()));
        }
        index
    }

    const CHAIN: &str = r#"
package chain;
message A { B b = 1; }
message B { C c = 1; Kind kind = 2; }
message C { string leaf = 1; }
enum Kind { K0 = 0; K1 = 1; }
service Svc {
  rpc First(A) returns (C);
  rpc Second(B) returns (A);
}
"#;

    #[test]
    fn test_depth_limits_expansion() {
        let index = index_of(&[("chain.proto", CHAIN)]);
        let a = &index.message_exact("chain.A").unwrap().item;

        assert!(TypeResolver::new(&index).resolve_message(a, 0).is_empty());

        let one = TypeResolver::new(&index).resolve_message(a, 1);
        assert_eq!(one.keys().collect::<Vec<_>>(), vec!["B"]);

        let all = TypeResolver::new(&index).resolve_message(a, 10);
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["B", "C", "Kind"]);
        assert_eq!(all["Kind"].kind(), EntityKind::Enum);
        assert_eq!(all["C"].full_name(), "chain.C");
    }

    #[test]
    fn test_self_reference_terminates() {
        let index = index_of(&[("a.proto", "message A { A self = 1; string name = 2; }")]);
        let a = &index.message_exact("A").unwrap().item;

        let resolved = TypeResolver::new(&index).resolve_message(a, 5);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["A"].kind(), EntityKind::Message);
    }

    #[test]
    fn test_service_shares_visited_across_rpcs() {
        let index = index_of(&[("chain.proto", CHAIN)]);
        let svc = &index.service_exact("chain.Svc").unwrap().item;

        let resolved = TypeResolver::new(&index).resolve_service(svc, 10);
        // Each type appears once even though several RPCs reach it
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["A", "B", "C", "Kind"]);
        assert!(TypeResolver::new(&index).resolve_service(svc, 0).is_empty());
    }

    #[test]
    fn test_unknown_and_primitive_types_are_dropped() {
        let index = index_of(&[(
            "m.proto",
            "message M { google.protobuf.Timestamp at = 1; bytes raw = 2; }",
        )]);
        let m = &index.message_exact("M").unwrap().item;

        assert!(TypeResolver::new(&index).resolve_message(m, 10).is_empty());
    }

    #[test]
    fn test_map_value_types_resolve() {
        let index = index_of(&[(
            "m.proto",
            "package p; message Bag { map<string, Item> items = 1; } message Item { int32 n = 1; }",
        )]);
        let bag = &index.message_exact("p.Bag").unwrap().item;

        let resolved = TypeResolver::new(&index).resolve_message(bag, 10);
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["Item"]);
    }

    #[test]
    fn test_resolved_definition_serializes_with_kind_tag() {
        let index = index_of(&[("chain.proto", CHAIN)]);
        let b = &index.message_exact("chain.B").unwrap().item;
        let resolved = TypeResolver::new(&index).resolve_message(b, 1);

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["Kind"]["kind"], "enum");
        assert_eq!(json["Kind"]["values"][1]["name"], "K1");
        assert_eq!(json["C"]["kind"], "message");
        assert_eq!(json["C"]["file"], "chain.proto");
    }

    #[test]
    fn test_referenced_types() {
        assert_eq!(referenced_types("map<string, User>"), vec!["string", "User"]);
        assert_eq!(referenced_types("api.v1.User"), vec!["api.v1.User"]);
    }
}
