//! In-memory symbol table over parsed files.
//!
//! Every table is an `IndexMap` so iteration, and therefore the suffix
//! fallback in name lookups, follows ingestion order.

use crate::parsing::{Message, ProtoEnum, ProtoFile, Service};
use crate::types::{EntityKind, parent_scope};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A table entry: the shared entity plus the file that declared it.
#[derive(Debug)]
pub struct Indexed<T> {
    pub item: Arc<T>,
    pub file: PathBuf,
}

impl<T> Clone for Indexed<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            file: self.file.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EntityRef {
    Service(Arc<Service>),
    Message(Arc<Message>),
    Enum(Arc<ProtoEnum>),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Service(_) => EntityKind::Service,
            Self::Message(_) => EntityKind::Message,
            Self::Enum(_) => EntityKind::Enum,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Service(s) => s.comment.as_deref(),
            Self::Message(m) => m.comment.as_deref(),
            Self::Enum(e) => e.comment.as_deref(),
        }
    }
}

/// One row of the flat list the search engine scans.
#[derive(Debug, Clone)]
pub struct SearchEntry {
    pub full_name: String,
    pub entity: EntityRef,
    pub file: PathBuf,
}

impl SearchEntry {
    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub service_count: usize,
    pub message_count: usize,
    pub enum_count: usize,
    pub entry_count: usize,
}

trait Named {
    fn name(&self) -> &str;
    fn full_name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn full_name(&self) -> &str {
                &self.full_name
            }
        })*
    };
}

impl_named!(Service, Message, ProtoEnum);

fn insert_entity<T>(
    table: &mut IndexMap<String, Indexed<T>>,
    item: &Arc<T>,
    file: &Path,
    kind: EntityKind,
) where
    T: Named,
{
    let full_name = item.full_name().to_string();
    let previous = table.insert(
        full_name.clone(),
        Indexed {
            item: Arc::clone(item),
            file: file.to_path_buf(),
        },
    );
    if let Some(previous) = previous {
        tracing::debug!(
            target: "indexer",
            "{kind} {full_name} from {} replaces the one from {}",
            file.display(),
            previous.file.display()
        );
    }
}

/// Remove `item` from `table` only when the entry is still this exact `Arc`.
fn remove_entity<T: Named>(table: &mut IndexMap<String, Indexed<T>>, item: &Arc<T>) {
    let owned = table
        .get(item.full_name())
        .is_some_and(|entry| Arc::ptr_eq(&entry.item, item));
    if owned {
        table.shift_remove(item.full_name());
    }
}

/// Exact key, then the token qualified by each enclosing scope of the
/// referring entity (innermost first), then the first suffix or simple-name
/// match.
fn find_in<'t, T: Named>(
    table: &'t IndexMap<String, Indexed<T>>,
    token: &str,
    context_full_name: Option<&str>,
) -> Option<&'t Indexed<T>> {
    let token = token.strip_prefix('.').unwrap_or(token);

    if let Some(found) = table.get(token) {
        return Some(found);
    }

    let mut scope = context_full_name.unwrap_or_default();
    while !scope.is_empty() {
        if let Some(found) = table.get(&format!("{scope}.{token}")) {
            return Some(found);
        }
        scope = parent_scope(scope);
    }

    fuzzy_in(table, token)
}

fn fuzzy_in<'t, T: Named>(
    table: &'t IndexMap<String, Indexed<T>>,
    name: &str,
) -> Option<&'t Indexed<T>> {
    let suffix = format!(".{name}");
    table
        .values()
        .find(|entry| entry.item.name() == name || entry.item.full_name().ends_with(&suffix))
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    files: IndexMap<PathBuf, Arc<ProtoFile>>,
    services: IndexMap<String, Indexed<Service>>,
    messages: IndexMap<String, Indexed<Message>>,
    enums: IndexMap<String, Indexed<ProtoEnum>>,
    entries: Vec<SearchEntry>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a parsed file and register every entity it declares, nested ones
    /// included. Entities with an already known full name replace the old entry.
    pub fn ingest(&mut self, file: Arc<ProtoFile>) {
        let path = file.path.clone();
        if self.evict(&path).is_some() {
            tracing::debug!(target: "indexer", "replacing earlier contents of {}", path.display());
        }

        for service in &file.services {
            insert_entity(&mut self.services, service, &path, EntityKind::Service);
            self.entries.push(SearchEntry {
                full_name: service.full_name.clone(),
                entity: EntityRef::Service(Arc::clone(service)),
                file: path.clone(),
            });
        }

        for message in file.all_messages() {
            insert_entity(&mut self.messages, message, &path, EntityKind::Message);
            self.entries.push(SearchEntry {
                full_name: message.full_name.clone(),
                entity: EntityRef::Message(Arc::clone(message)),
                file: path.clone(),
            });
        }

        for proto_enum in file.all_enums() {
            insert_entity(&mut self.enums, proto_enum, &path, EntityKind::Enum);
            self.entries.push(SearchEntry {
                full_name: proto_enum.full_name.clone(),
                entity: EntityRef::Enum(Arc::clone(proto_enum)),
                file: path.clone(),
            });
        }

        self.files.insert(path, file);
    }

    /// Drop a file and everything it contributed. Unknown paths are ignored.
    ///
    /// Table entries that a later file has since overwritten are left alone.
    pub fn evict(&mut self, path: &Path) -> Option<Arc<ProtoFile>> {
        let file = self.files.shift_remove(path)?;

        for service in &file.services {
            remove_entity(&mut self.services, service);
        }
        for message in file.all_messages() {
            remove_entity(&mut self.messages, message);
        }
        for proto_enum in file.all_enums() {
            remove_entity(&mut self.enums, proto_enum);
        }
        self.entries.retain(|entry| entry.file.as_path() != path);

        Some(file)
    }

    pub fn services(&self) -> impl Iterator<Item = &Indexed<Service>> {
        self.services.values()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Indexed<Message>> {
        self.messages.values()
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn service_exact(&self, full_name: &str) -> Option<&Indexed<Service>> {
        self.services.get(full_name)
    }

    pub fn message_exact(&self, full_name: &str) -> Option<&Indexed<Message>> {
        self.messages.get(full_name)
    }

    /// Exact match first, then the suffix/simple-name fallback.
    pub fn find_service(&self, name: &str) -> Option<&Indexed<Service>> {
        find_in(&self.services, name, None)
    }

    pub fn find_message(&self, name: &str) -> Option<&Indexed<Message>> {
        find_in(&self.messages, name, None)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Indexed<ProtoEnum>> {
        find_in(&self.enums, name, None)
    }

    /// Resolve a type token written inside the entity named `context`.
    pub fn message_for_type(&self, token: &str, context: &str) -> Option<&Indexed<Message>> {
        find_in(&self.messages, token, Some(context))
    }

    pub fn enum_for_type(&self, token: &str, context: &str) -> Option<&Indexed<ProtoEnum>> {
        find_in(&self.enums, token, Some(context))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            file_count: self.files.len(),
            service_count: self.services.len(),
            message_count: self.messages.len(),
            enum_count: self.enums.len(),
            entry_count: self.entries.len(),
        }
    }
}
