//! MatchConsolidator: overlapping candidates → one span per region
//!
//! Candidates are folded in one at a time against the spans built so far.
//! Each incoming candidate is classified by plain interval comparison, in
//! this priority:
//!
//! 1. **Contained**: an existing span strictly covers it and shares one
//!    boundary. Dropped.
//! 2. **Identical**: same `[start, end)`. Its entity id joins that span,
//!    which is how ambiguity arises.
//! 3. **Longer at shared start / shared end**: it beats a shorter span.
//!    The shorter span is removed and the candidate appended.
//! 4. Otherwise it becomes a new span.
//!
//! Spans overlapping without a shared boundary are left alone. Output order
//! is consolidation order, not start order.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeaveError};

// =============================================================================
// Types
// =============================================================================

/// Raw hit from the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entity_id: String,
    pub start: usize,
    pub end: usize,
    pub span_text: String,
}

impl MatchCandidate {
    pub fn new(
        entity_id: impl Into<String>,
        start: usize,
        end: usize,
        span_text: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            start,
            end,
            span_text: span_text.into(),
        }
    }
}

/// A mention interval with the entity ids it may refer to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedSpan {
    /// Insertion-ordered, no duplicates
    entity_ids: Vec<String>,
    pub start: usize,
    pub end: usize,
    pub span_text: String,
}

impl ConsolidatedSpan {
    pub fn new(
        entity_ids: Vec<String>,
        start: usize,
        end: usize,
        span_text: impl Into<String>,
    ) -> Self {
        let mut span = Self {
            entity_ids: Vec::with_capacity(entity_ids.len()),
            start,
            end,
            span_text: span_text.into(),
        };
        for id in entity_ids {
            span.add_entity(id);
        }
        span
    }

    pub fn single(
        entity_id: impl Into<String>,
        start: usize,
        end: usize,
        span_text: impl Into<String>,
    ) -> Self {
        Self::new(vec![entity_id.into()], start, end, span_text)
    }

    fn from_candidate(candidate: MatchCandidate) -> Self {
        Self {
            entity_ids: vec![candidate.entity_id],
            start: candidate.start,
            end: candidate.end,
            span_text: candidate.span_text,
        }
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn is_ambiguous(&self) -> bool {
        self.entity_ids.len() > 1
    }

    /// The id when exactly one remains
    pub fn resolved_id(&self) -> Option<&str> {
        match self.entity_ids.as_slice() {
            [id] => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entity_ids.iter().any(|e| e == id)
    }

    /// Same id set, ignoring order
    pub fn same_entities(&self, other: &ConsolidatedSpan) -> bool {
        self.entity_ids.len() == other.entity_ids.len()
            && self.entity_ids.iter().all(|id| other.contains_entity(id))
    }

    pub fn add_entity(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.contains_entity(&id) {
            self.entity_ids.push(id);
        }
    }

    pub fn resolve_to(&mut self, id: impl Into<String>) {
        self.entity_ids = vec![id.into()];
    }

    /// Coordinated mentions ("Mr. and Mrs. Dursley") keep several ids
    pub fn resolve_to_many(&mut self, ids: &[String]) {
        self.entity_ids.clear();
        for id in ids {
            self.add_entity(id.clone());
        }
    }

    /// Mark as unresolvable; such spans are dropped after disambiguation
    pub fn clear_entities(&mut self) {
        self.entity_ids.clear();
    }

    pub fn extend_end(&mut self, end: usize) {
        self.end = end;
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// =============================================================================
// MatchConsolidator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Contained,
    Identical(usize),
    LongerAtStart(usize),
    LongerAtEnd(usize),
    Independent,
}

#[derive(Debug, Clone, Default)]
pub struct MatchConsolidator {
    token_count: Option<usize>,
}

impl MatchConsolidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject candidates that end past the token stream
    pub fn bounded(token_count: usize) -> Self {
        Self {
            token_count: Some(token_count),
        }
    }

    pub fn consolidate(
        &self,
        candidates: impl IntoIterator<Item = MatchCandidate>,
    ) -> Result<Vec<ConsolidatedSpan>> {
        let mut spans: Vec<ConsolidatedSpan> = Vec::new();

        for candidate in candidates {
            self.validate(&candidate)?;

            match classify(&spans, &candidate) {
                Relation::Contained => {
                    log::trace!(
                        "[MatchConsolidator] drop contained {} [{}, {})",
                        candidate.entity_id,
                        candidate.start,
                        candidate.end
                    );
                }
                Relation::Identical(i) => spans[i].add_entity(candidate.entity_id),
                Relation::LongerAtStart(i) | Relation::LongerAtEnd(i) => {
                    let replaced = spans.remove(i);
                    log::trace!(
                        "[MatchConsolidator] [{}, {}) replaces shorter [{}, {})",
                        candidate.start,
                        candidate.end,
                        replaced.start,
                        replaced.end
                    );
                    spans.push(ConsolidatedSpan::from_candidate(candidate));
                }
                Relation::Independent => spans.push(ConsolidatedSpan::from_candidate(candidate)),
            }
        }

        Ok(spans)
    }

    fn validate(&self, candidate: &MatchCandidate) -> Result<()> {
        if candidate.start >= candidate.end {
            return Err(WeaveError::MalformedCandidate {
                entity_id: candidate.entity_id.clone(),
                start: candidate.start,
                end: candidate.end,
            });
        }
        if let Some(token_count) = self.token_count {
            if candidate.end > token_count {
                return Err(WeaveError::CandidateOutOfBounds {
                    entity_id: candidate.entity_id.clone(),
                    end: candidate.end,
                    token_count,
                });
            }
        }
        Ok(())
    }
}

fn classify(spans: &[ConsolidatedSpan], c: &MatchCandidate) -> Relation {
    let contained = spans.iter().any(|s| {
        (c.start == s.start && c.end < s.end) || (c.start > s.start && c.end == s.end)
    });
    if contained {
        return Relation::Contained;
    }
    if let Some(i) = spans.iter().position(|s| c.start == s.start && c.end == s.end) {
        return Relation::Identical(i);
    }
    if let Some(i) = spans.iter().position(|s| c.start == s.start && c.end > s.end) {
        return Relation::LongerAtStart(i);
    }
    if let Some(i) = spans.iter().position(|s| c.start < s.start && c.end == s.end) {
        return Relation::LongerAtEnd(i);
    }
    Relation::Independent
}
