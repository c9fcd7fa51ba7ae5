//! PatternMatcher: runs compiled patterns over a resolved token stream
//!
//! Emits every (entity, interval) hit, overlapping or not. Cleaning up the
//! overlaps is the consolidator's job.

use std::collections::{HashMap, HashSet};

use crate::scanner::consolidate::MatchCandidate;
use crate::scanner::patterns::PatternSpec;
use crate::scanner::tokens::ResolvedDoc;

pub struct PatternMatcher {
    patterns: Vec<PatternSpec>,
    /// First-slot key → pattern indices
    by_first_token: HashMap<String, Vec<usize>>,
}

impl PatternMatcher {
    pub fn new(patterns: Vec<PatternSpec>) -> Self {
        let mut by_first_token: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, pattern) in patterns.iter().enumerate() {
            if let Some(first) = pattern.tokens.first() {
                by_first_token.entry(first.index_key()).or_default().push(i);
            }
        }
        Self {
            patterns,
            by_first_token,
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// All candidates, ordered by start, then end, then pattern order
    pub fn find(&self, doc: &ResolvedDoc) -> Vec<MatchCandidate> {
        let tokens = doc.tokens();
        let mut hits: Vec<(usize, usize, usize)> = Vec::new();

        for start in 0..tokens.len() {
            let key = tokens[start].text.to_lowercase();
            let Some(indices) = self.by_first_token.get(&key) else {
                continue;
            };
            for &pi in indices {
                let pattern = &self.patterns[pi];
                let end = start + pattern.len();
                if end > tokens.len() {
                    continue;
                }
                let matched = pattern
                    .tokens
                    .iter()
                    .zip(&tokens[start..end])
                    .all(|(constraint, token)| constraint.matches(&token.text));
                if matched {
                    hits.push((start, end, pi));
                }
            }
        }

        hits.sort_unstable();

        let mut seen: HashSet<(&str, usize, usize)> = HashSet::new();
        let mut candidates = Vec::with_capacity(hits.len());
        for (start, end, pi) in hits {
            let entity_id = self.patterns[pi].entity_id.as_str();
            if !seen.insert((entity_id, start, end)) {
                continue;
            }
            candidates.push(MatchCandidate::new(
                entity_id,
                start,
                end,
                doc.span_text(start, end),
            ));
        }

        log::trace!(
            "[PatternMatcher] {} candidates from {} patterns over {} tokens",
            candidates.len(),
            self.patterns.len(),
            tokens.len()
        );
        candidates
    }
}
