//! Reverse lookup: which RPCs carry a given message or enum.
//!
//! For every RPC the request and response types are walked field by field,
//! depth first in declaration order. The walk records the field path that
//! leads to the target, never expands the target itself, and does not
//! re-enter a message already on the current path.
//!
//! Before walking, a breadth-first pass over reversed field edges computes
//! how many fields each message is from the target. The walk only enters
//! messages that can still reach the target within the depth limit, so wide
//! schemas that never mention the target cost one pass over the fields.

use super::index::{Indexed, SymbolIndex};
use super::resolver::referenced_types;
use crate::parsing::{Message, Service};
use crate::types::{EntityKind, is_primitive};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum UsageContext {
    Request,
    Response,
}

impl fmt::Display for UsageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("Request"),
            Self::Response => f.write_str("Response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    /// Simple service name
    pub service: String,
    pub service_full_name: String,
    pub rpc: String,
    pub context: UsageContext,
    /// Field names from the RPC type down to the field holding the target.
    /// Empty when the RPC type is the target.
    pub field_path: Vec<String>,
    pub depth: usize,
}

enum Target<'a> {
    Message(&'a Indexed<Message>),
    Enum(&'a str),
}

impl Target<'_> {
    fn key(&self) -> (EntityKind, &str) {
        match self {
            Self::Message(m) => (EntityKind::Message, m.item.full_name.as_str()),
            Self::Enum(full_name) => (EntityKind::Enum, full_name),
        }
    }
}

/// Fewest fields from a message (by full name) to one that holds the target.
type Distances<'a> = HashMap<&'a str, usize>;

pub struct UsageFinder<'a> {
    index: &'a SymbolIndex,
    max_depth: usize,
}

impl<'a> UsageFinder<'a> {
    pub fn new(index: &'a SymbolIndex, max_depth: usize) -> Self {
        Self { index, max_depth }
    }

    /// Usages of the message or enum called `type_name` (exact name first, then
    /// simple name). `None` when no such type is indexed.
    pub fn find(&self, type_name: &str) -> Option<Vec<TypeUsage>> {
        let target = match self.index.find_message(type_name) {
            Some(message) => (EntityKind::Message, message.item.full_name.as_str()),
            None => {
                let proto_enum = self.index.find_enum(type_name)?;
                (EntityKind::Enum, proto_enum.item.full_name.as_str())
            }
        };

        let distances = self.distances(target);
        let mut usages = Vec::new();
        for entry in self.index.services() {
            let service = &entry.item;
            for rpc in &service.rpcs {
                for (context, token) in [
                    (UsageContext::Request, &rpc.request_type),
                    (UsageContext::Response, &rpc.response_type),
                ] {
                    let mut found = Vec::new();
                    self.scan_rpc_type(token, service, target, &distances, &mut found);
                    usages.extend(found.into_iter().map(|field_path| TypeUsage {
                        service: service.name.clone(),
                        service_full_name: service.full_name.clone(),
                        rpc: rpc.name.clone(),
                        context,
                        depth: field_path.len(),
                        field_path,
                    }));
                }
            }
        }

        crate::debug_event!("indexer", "usages", "{} of {}", usages.len(), target.1);
        Some(usages)
    }

    fn resolve(&self, token: &str, context: &str) -> Option<Target<'a>> {
        if is_primitive(token) {
            return None;
        }
        let index = self.index;
        if let Some(message) = index.message_for_type(token, context) {
            return Some(Target::Message(message));
        }
        index
            .enum_for_type(token, context)
            .map(|e| Target::Enum(e.item.full_name.as_str()))
    }

    /// Messages that can reach the target within `max_depth` fields. Cycles
    /// are ignored here, so each distance is a lower bound for the walk.
    fn distances(&self, target: (EntityKind, &str)) -> Distances<'a> {
        let index = self.index;
        let mut referrers: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut queue = VecDeque::new();
        let mut distances = Distances::new();

        for entry in index.messages() {
            let message: &'a Message = &entry.item;
            let mut holds_target = false;
            for field in &message.fields {
                for token in referenced_types(&field.type_name) {
                    match self.resolve(token, &message.full_name) {
                        Some(resolved) if resolved.key() == target => holds_target = true,
                        Some(Target::Message(next)) => referrers
                            .entry(next.item.full_name.as_str())
                            .or_default()
                            .push(message.full_name.as_str()),
                        _ => {}
                    }
                }
            }
            if holds_target {
                distances.insert(message.full_name.as_str(), 1);
                queue.push_back((message.full_name.as_str(), 1));
            }
        }

        while let Some((name, distance)) = queue.pop_front() {
            if distance >= self.max_depth {
                continue;
            }
            for &referrer in referrers.get(name).into_iter().flatten() {
                if !distances.contains_key(referrer) {
                    distances.insert(referrer, distance + 1);
                    queue.push_back((referrer, distance + 1));
                }
            }
        }

        distances
    }

    fn scan_rpc_type(
        &self,
        token: &str,
        service: &Arc<Service>,
        target: (EntityKind, &str),
        distances: &Distances<'a>,
        found: &mut Vec<Vec<String>>,
    ) {
        let Some(resolved) = self.resolve(token, &service.full_name) else {
            return;
        };
        if resolved.key() == target {
            found.push(Vec::new());
            return;
        }
        if let Target::Message(message) = resolved {
            let name = message.item.full_name.as_str();
            if !distances.contains_key(name) {
                return;
            }
            let mut path = Vec::new();
            let mut on_path = vec![name];
            self.scan_fields(&message.item, target, distances, &mut path, &mut on_path, found);
        }
    }

    fn scan_fields(
        &self,
        message: &'a Message,
        target: (EntityKind, &str),
        distances: &Distances<'a>,
        path: &mut Vec<String>,
        on_path: &mut Vec<&'a str>,
        found: &mut Vec<Vec<String>>,
    ) {
        for field in &message.fields {
            path.push(field.name.clone());

            let resolved: Vec<Target<'a>> = referenced_types(&field.type_name)
                .into_iter()
                .filter_map(|token| self.resolve(token, &message.full_name))
                .collect();

            if resolved.iter().any(|r| r.key() == target) {
                found.push(path.clone());
            } else if path.len() < self.max_depth {
                for r in resolved {
                    let Target::Message(next) = r else {
                        continue;
                    };
                    let name = next.item.full_name.as_str();
                    let reachable = distances
                        .get(name)
                        .is_some_and(|distance| path.len() + distance <= self.max_depth);
                    if !reachable || on_path.contains(&name) {
                        continue;
                    }
                    on_path.push(name);
                    self.scan_fields(&next.item, target, distances, path, on_path, found);
                    on_path.pop();
                }
            }

            path.pop();
        }
    }
}
