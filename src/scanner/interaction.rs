//! InteractionExtractor: resolved spans → weighted co-occurrence counts
//!
//! Spans are sorted by start, consecutive mentions of the same entity set
//! are coalesced into one presence, then each mention scans forward until a
//! target is either the same entity set or too far away.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{PipelineConfig, DEFAULT_DISTANCE_THRESHOLD};
use crate::scanner::consolidate::ConsolidatedSpan;

// =============================================================================
// InteractionCounts
// =============================================================================

/// One exported edge row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub source: String,
    pub target: String,
    pub weight: usize,
}

/// Unordered pair → count. Keys are stored with the smaller id first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Interaction>", into = "Vec<Interaction>")]
pub struct InteractionCounts {
    pairs: BTreeMap<(String, String), usize>,
}

impl From<Vec<Interaction>> for InteractionCounts {
    fn from(rows: Vec<Interaction>) -> Self {
        let mut counts = InteractionCounts::default();
        for row in rows {
            counts.add(&row.source, &row.target, row.weight);
        }
        counts
    }
}

impl From<InteractionCounts> for Vec<Interaction> {
    fn from(counts: InteractionCounts) -> Self {
        counts.records()
    }
}

fn canonical(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl InteractionCounts {
    pub fn record(&mut self, a: &str, b: &str) {
        self.add(a, b, 1);
    }

    fn add(&mut self, a: &str, b: &str, weight: usize) {
        *self.pairs.entry(canonical(a, b)).or_insert(0) += weight;
    }

    /// Count for the pair in either order
    pub fn get(&self, a: &str, b: &str) -> usize {
        self.pairs.get(&canonical(a, b)).copied().unwrap_or(0)
    }

    /// Number of distinct pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Sum of all weights
    pub fn total(&self) -> usize {
        self.pairs.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.pairs
            .iter()
            .map(|((a, b), &count)| (a.as_str(), b.as_str(), count))
    }

    /// Sum another set of counts into this one
    pub fn merge(&mut self, other: &InteractionCounts) {
        for ((a, b), &count) in &other.pairs {
            *self.pairs.entry((a.clone(), b.clone())).or_insert(0) += count;
        }
    }

    /// Rows sorted by pair key
    pub fn records(&self) -> Vec<Interaction> {
        self.iter()
            .map(|(source, target, weight)| Interaction {
                source: source.to_string(),
                target: target.to_string(),
                weight,
            })
            .collect()
    }
}

// =============================================================================
// InteractionExtractor
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct InteractionExtractor {
    distance_threshold: usize,
}

impl Default for InteractionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_THRESHOLD)
    }
}

impl InteractionExtractor {
    pub fn new(distance_threshold: usize) -> Self {
        Self { distance_threshold }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.distance_threshold)
    }

    pub fn distance_threshold(&self) -> usize {
        self.distance_threshold
    }

    /// Counts over one chapter's resolved spans
    pub fn extract(&self, spans: &[ConsolidatedSpan]) -> InteractionCounts {
        let mentions = coalesce(spans);
        let mut counts = InteractionCounts::default();

        for (i, source) in mentions.iter().enumerate() {
            for target in &mentions[i + 1..] {
                if source.same_entities(target) || source.end.abs_diff(target.start) >= self.distance_threshold {
                    break;
                }
                for a in source.entity_ids() {
                    for b in target.entity_ids() {
                        if a != b {
                            counts.record(a, b);
                        }
                    }
                }
            }
        }

        counts
    }
}

/// Sort by start (stable) and merge runs of the same entity set, extending
/// the earlier span's end
pub fn coalesce(spans: &[ConsolidatedSpan]) -> Vec<ConsolidatedSpan> {
    let mut sorted: Vec<&ConsolidatedSpan> = spans.iter().collect();
    sorted.sort_by_key(|s| s.start);

    let mut mentions: Vec<ConsolidatedSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match mentions.last_mut() {
            Some(last) if last.same_entities(span) => last.extend_end(span.end),
            _ => mentions.push(span.clone()),
        }
    }
    mentions
}

/// One single-id span per id of every multi-id span, for export
pub fn flatten_spans(spans: &[ConsolidatedSpan]) -> Vec<ConsolidatedSpan> {
    spans
        .iter()
        .flat_map(|span| {
            span.entity_ids()
                .iter()
                .map(move |id| ConsolidatedSpan::single(id.clone(), span.start, span.end, span.span_text.clone()))
        })
        .collect()
}
