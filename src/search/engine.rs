//! Two-phase fuzzy search over the index's search entries.
//!
//! Phase one scores the query against every fully-qualified name. Phase two
//! looks at the entries phase one did not return, first at their comment,
//! then at their field names (messages) or RPC names (services).

use super::scorer::Scorer;
use crate::config::SearchConfig;
use crate::indexing::{EntityRef, SearchEntry};
use crate::types::EntityKind;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// What produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Name,
    Comment,
    Field,
    Rpc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Fully-qualified name
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub file: PathBuf,
    pub score: u32,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpcs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rpc: Option<String>,
}

impl SearchResult {
    fn new(entry: &SearchEntry, score: u32, match_type: MatchType) -> Self {
        Self {
            name: entry.full_name.clone(),
            kind: entry.kind(),
            file: entry.file.clone(),
            score,
            match_type,
            comment: None,
            rpcs: None,
            rpc_count: None,
            fields: None,
            field_count: None,
            values: None,
            value_count: None,
            matched_field: None,
            matched_rpc: None,
        }
    }

    /// Child names and counts for the entry's kind, plus its comment.
    fn with_details(mut self, entry: &SearchEntry) -> Self {
        match &entry.entity {
            EntityRef::Service(service) => self = self.with_rpcs(service.rpcs.iter().map(|r| &r.name)),
            EntityRef::Message(message) => {
                self = self.with_fields(message.fields.iter().map(|f| &f.name))
            }
            EntityRef::Enum(proto_enum) => {
                let values: Vec<String> = proto_enum.values.iter().map(|v| v.name.clone()).collect();
                self.value_count = Some(values.len());
                self.values = Some(values);
            }
        }
        self.comment = entry.entity.comment().map(str::to_string);
        self
    }

    fn with_rpcs<'n>(mut self, names: impl Iterator<Item = &'n String>) -> Self {
        let rpcs: Vec<String> = names.cloned().collect();
        self.rpc_count = Some(rpcs.len());
        self.rpcs = Some(rpcs);
        self
    }

    fn with_fields<'n>(mut self, names: impl Iterator<Item = &'n String>) -> Self {
        let fields: Vec<String> = names.cloned().collect();
        self.field_count = Some(fields.len());
        self.fields = Some(fields);
        self
    }
}

pub struct SearchEngine {
    name_scorer: Arc<dyn Scorer>,
    comment_scorer: Arc<dyn Scorer>,
    child_scorer: Arc<dyn Scorer>,
}

impl SearchEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_scorers(
            config.name_scorer.scorer(),
            config.comment_scorer.scorer(),
            config.child_scorer.scorer(),
        )
    }

    pub fn with_scorers(
        name_scorer: Arc<dyn Scorer>,
        comment_scorer: Arc<dyn Scorer>,
        child_scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            name_scorer,
            comment_scorer,
            child_scorer,
        }
    }

    /// Ranked hits, best first, at most `limit` of them, each scoring at
    /// least `min_score`. Every fully-qualified name appears at most once.
    pub fn search(
        &self,
        entries: &[SearchEntry],
        query: &str,
        limit: usize,
        min_score: u32,
    ) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut results = self.match_names(entries, query, limit, min_score, &mut seen);
        let name_hits = results.len();
        results.extend(self.match_contents(entries, query, min_score, &mut seen));

        tracing::debug!(
            target: "search",
            "'{query}': {name_hits} name hits, {} content hits",
            results.len() - name_hits
        );

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.truncate(limit);
        results
    }

    fn match_names<'e>(
        &self,
        entries: &'e [SearchEntry],
        query: &str,
        limit: usize,
        min_score: u32,
        seen: &mut HashSet<&'e str>,
    ) -> Vec<SearchResult> {
        let mut scored: Vec<(&SearchEntry, u32)> = entries
            .iter()
            .map(|entry| (entry, self.name_scorer.score(query, &entry.full_name)))
            .collect();

        // Stable: equal scores keep ingestion order, except a literal name match goes first
        scored.sort_by(|(a, sa), (b, sb)| {
            sb.cmp(sa).then_with(|| {
                let exact_a = a.full_name.eq_ignore_ascii_case(query);
                let exact_b = b.full_name.eq_ignore_ascii_case(query);
                exact_b.cmp(&exact_a)
            })
        });

        let mut results = Vec::new();
        for (entry, score) in scored.into_iter().take(limit.saturating_mul(2)) {
            if score < min_score || !seen.insert(entry.full_name.as_str()) {
                continue;
            }
            results.push(SearchResult::new(entry, score, MatchType::Name).with_details(entry));
        }
        results
    }

    fn match_contents<'e>(
        &self,
        entries: &'e [SearchEntry],
        query: &str,
        min_score: u32,
        seen: &mut HashSet<&'e str>,
    ) -> Vec<SearchResult> {
        let query = query.to_lowercase();
        let mut results = Vec::new();

        for entry in entries {
            if seen.contains(entry.full_name.as_str()) {
                continue;
            }

            if let Some(comment) = entry.entity.comment() {
                let score = self.comment_scorer.score(&query, &comment.to_lowercase());
                if score >= min_score {
                    let mut result = SearchResult::new(entry, score, MatchType::Comment);
                    result.comment = Some(comment.to_string());
                    results.push(result);
                    seen.insert(entry.full_name.as_str());
                    continue;
                }
            }

            let hit = match &entry.entity {
                EntityRef::Message(message) => message.fields.iter().find_map(|field| {
                    let score = self.child_scorer.score(&query, &field.name.to_lowercase());
                    (score >= min_score).then(|| {
                        let mut result = SearchResult::new(entry, score, MatchType::Field)
                            .with_fields(message.fields.iter().map(|f| &f.name));
                        result.matched_field = Some(field.name.clone());
                        result
                    })
                }),
                EntityRef::Service(service) => service.rpcs.iter().find_map(|rpc| {
                    let score = self.child_scorer.score(&query, &rpc.name.to_lowercase());
                    (score >= min_score).then(|| {
                        let mut result = SearchResult::new(entry, score, MatchType::Rpc)
                            .with_rpcs(service.rpcs.iter().map(|r| &r.name));
                        result.matched_rpc = Some(rpc.name.clone());
                        result
                    })
                }),
                EntityRef::Enum(_) => None,
            };

            if let Some(result) = hit {
                results.push(result);
                seen.insert(entry.full_name.as_str());
            }
        }

        results
    }
}
