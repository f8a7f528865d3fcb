//! Owned, serializable snapshots returned by the facade.
//!
//! Views copy what callers need out of the index so the read lock can be
//! released before results are handed back.

use super::index::Indexed;
use super::resolver::ResolvedDefinition;
use crate::parsing::{EnumValue, Field, Message, ProtoEnum, Rpc, Service};
use crate::types::Label;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
    pub line: u32,
}

impl From<&Field> for FieldView {
    fn from(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            type_name: field.type_name.clone(),
            number: field.number,
            label: field.label,
            comment: field.comment.clone(),
            options: field.options.clone(),
            line: field.range.start_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueView {
    pub name: String,
    pub number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub line: u32,
}

impl From<&EnumValue> for EnumValueView {
    fn from(value: &EnumValue) -> Self {
        Self {
            name: value.name.clone(),
            number: value.number,
            comment: value.comment.clone(),
            line: value.range.start_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcView {
    pub name: String,
    pub request_type: String,
    pub response_type: String,
    pub request_streaming: bool,
    pub response_streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub line: u32,
}

impl From<&Rpc> for RpcView {
    fn from(rpc: &Rpc) -> Self {
        Self {
            name: rpc.name.clone(),
            request_type: rpc.request_type.clone(),
            response_type: rpc.response_type.clone(),
            request_streaming: rpc.request_streaming,
            response_streaming: rpc.response_streaming,
            comment: rpc.comment.clone(),
            line: rpc.range.start_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceView {
    pub name: String,
    pub full_name: String,
    pub file: PathBuf,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub rpcs: Vec<RpcView>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resolved_types: IndexMap<String, ResolvedDefinition>,
}

impl ServiceView {
    pub fn new(entry: &Indexed<Service>, resolved_types: IndexMap<String, ResolvedDefinition>) -> Self {
        let service = &entry.item;
        Self {
            name: service.name.clone(),
            full_name: service.full_name.clone(),
            file: entry.file.clone(),
            line: service.range.start_line,
            comment: service.comment.clone(),
            rpcs: service.rpcs.iter().map(RpcView::from).collect(),
            resolved_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageView {
    pub name: String,
    pub full_name: String,
    pub file: PathBuf,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub fields: Vec<FieldView>,
    /// Full names of messages declared inside this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_messages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_enums: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resolved_types: IndexMap<String, ResolvedDefinition>,
}

impl MessageView {
    pub fn new(entry: &Indexed<Message>, resolved_types: IndexMap<String, ResolvedDefinition>) -> Self {
        let message = &entry.item;
        Self {
            name: message.name.clone(),
            full_name: message.full_name.clone(),
            file: entry.file.clone(),
            line: message.range.start_line,
            comment: message.comment.clone(),
            fields: message.fields.iter().map(FieldView::from).collect(),
            nested_messages: message
                .nested_messages
                .iter()
                .map(|m| m.full_name.clone())
                .collect(),
            nested_enums: message.nested_enums.iter().map(|e| e.full_name.clone()).collect(),
            resolved_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumView {
    pub name: String,
    pub full_name: String,
    pub file: PathBuf,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub values: Vec<EnumValueView>,
}

impl From<&Indexed<ProtoEnum>> for EnumView {
    fn from(entry: &Indexed<ProtoEnum>) -> Self {
        let proto_enum = &entry.item;
        Self {
            name: proto_enum.name.clone(),
            full_name: proto_enum.full_name.clone(),
            file: entry.file.clone(),
            line: proto_enum.range.start_line,
            comment: proto_enum.comment.clone(),
            values: proto_enum.values.iter().map(EnumValueView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;
    use std::sync::Arc;

    #[test]
    fn test_empty_resolved_types_are_omitted() {
        let file = parse(
            "package p;\n// Doc\nmessage M {\n  string a = 1 [deprecated = true];\n}",
            "m.proto",
        )
        .unwrap();
        let entry = Indexed {
            item: Arc::clone(&file.messages[0]),
            file: PathBuf::from("m.proto"),
        };

        let view = MessageView::new(&entry, IndexMap::new());
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("resolved_types").is_none());
        assert_eq!(json["full_name"], "p.M");
        assert_eq!(json["line"], 3);
        assert_eq!(json["comment"], "Doc");
        assert_eq!(json["fields"][0]["type"], "string");
        assert_eq!(json["fields"][0]["options"]["deprecated"], "true");
        assert!(json["fields"][0].get("label").is_none());
    }
}
