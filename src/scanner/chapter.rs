//! ChapterCortex: one call per chapter
//!
//! compile roster → match → consolidate → disambiguate → extract.
//!
//! The roster passed in must be the snapshot of characters known up to and
//! including this chapter (see [`RosterLedger::roster_until`]). Chapters are
//! otherwise independent.
//!
//! [`RosterLedger::roster_until`]: crate::roster::RosterLedger::roster_until

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::roster::Roster;
use crate::scanner::{
    flatten_spans, ConsolidatedSpan, Diagnostic, InteractionCounts, InteractionExtractor,
    MatchCandidate, MatchConsolidator, OptionDisambiguator, PatternCompiler, PatternMatcher,
    ResolvedDoc, Token,
};

// =============================================================================
// Types
// =============================================================================

/// Per-phase timings in microseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterTimings {
    pub total_us: u64,
    pub compile_us: u64,
    pub match_us: u64,
    pub consolidate_us: u64,
    pub disambiguate_us: u64,
    pub extract_us: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterStats {
    pub timings: ChapterTimings,
    pub token_count: usize,
    pub patterns_compiled: usize,
    pub candidates_found: usize,
    pub spans_consolidated: usize,
    pub ambiguous_spans: usize,
    pub resolved_by_rule: usize,
    pub resolved_by_neighbor: usize,
    pub resolved_by_fallback: usize,
    pub spans_dropped: usize,
    pub interaction_pairs: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterResult {
    /// Resolved spans in consolidation order; coordinated mentions keep several ids
    pub spans: Vec<ConsolidatedSpan>,
    pub interactions: InteractionCounts,
    /// Ambiguous spans that were dropped
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ChapterStats,
}

impl ChapterResult {
    /// Spans with one id each, for persistence
    pub fn flattened_spans(&self) -> Vec<ConsolidatedSpan> {
        flatten_spans(&self.spans)
    }
}

/// JS input for [`ChapterCortex::js_process`]. Supply either `text` or
/// already-resolved `tokens`; `candidates` skips the built-in matcher.
#[derive(Debug, Clone, Default, Deserialize)]
struct ChapterInput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tokens: Option<Vec<Token>>,
    #[serde(default)]
    roster: Roster,
    #[serde(default)]
    candidates: Option<Vec<MatchCandidate>>,
}

fn micros(start: instant::Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

// =============================================================================
// ChapterCortex
// =============================================================================

#[wasm_bindgen]
pub struct ChapterCortex {
    config: PipelineConfig,
    disambiguator: OptionDisambiguator,
    extractor: InteractionExtractor,
}

#[wasm_bindgen]
impl ChapterCortex {
    /// `config` may be `undefined` for defaults, or a partial config object
    #[wasm_bindgen(constructor)]
    pub fn js_new(config: JsValue) -> std::result::Result<ChapterCortex, JsValue> {
        let config: PipelineConfig = if config.is_undefined() || config.is_null() {
            PipelineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
        };
        ChapterCortex::new(config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = distanceThreshold)]
    pub fn distance_threshold(&self) -> usize {
        self.extractor.distance_threshold()
    }

    /// Process one chapter: `{ text | tokens, roster, candidates? }`
    #[wasm_bindgen(js_name = process)]
    pub fn js_process(&mut self, input: JsValue) -> std::result::Result<JsValue, JsValue> {
        let input: ChapterInput = serde_wasm_bindgen::from_value(input)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse chapter input: {}", e)))?;

        let doc = match (input.tokens, input.text) {
            (Some(tokens), _) => ResolvedDoc::from_tokens(tokens),
            (None, Some(text)) => ResolvedDoc::tokenize(&text),
            (None, None) => ResolvedDoc::default(),
        };
        let result = match input.candidates {
            Some(candidates) => self.process_candidates(&doc, candidates),
            None => self.process(&doc, &input.roster),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        match serde_wasm_bindgen::to_value(&result) {
            Ok(v) => Ok(v),
            Err(e) => {
                web_sys::console::error_1(&format!("[ChapterCortex] Serialization failed: {:?}", e).into());
                Ok(JsValue::NULL)
            }
        }
    }

    /// Token windows for the external resolver: `[{ token_offset, token_count, text }]`
    #[wasm_bindgen(js_name = chunkText)]
    pub fn js_chunk_text(&self, text: &str) -> JsValue {
        let windows = ResolvedDoc::tokenize(text).windows(self.config.chunk_size);
        match serde_wasm_bindgen::to_value(&windows) {
            Ok(v) => v,
            Err(e) => {
                web_sys::console::error_1(&format!("[ChapterCortex] Serialization failed: {:?}", e).into());
                JsValue::NULL
            }
        }
    }
}

impl ChapterCortex {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let disambiguator = OptionDisambiguator::from_config(&config)?;
        let extractor = InteractionExtractor::from_config(&config);
        Ok(Self {
            config,
            disambiguator,
            extractor,
        })
    }

    /// Swap in a custom disambiguator (extra predicate rules, a custom chooser).
    /// A chooser passed to [`OptionDisambiguator::new`] keeps its state across chapters.
    pub fn with_disambiguator(mut self, disambiguator: OptionDisambiguator) -> Self {
        self.disambiguator = disambiguator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full pipeline over a resolved document, using the built-in matcher
    pub fn process(&mut self, doc: &ResolvedDoc, roster: &Roster) -> Result<ChapterResult> {
        let overall_start = instant::Instant::now();

        let compile_start = instant::Instant::now();
        let patterns = PatternCompiler::new(&self.config.lexicon).compile_roster(roster);
        let compile_us = micros(compile_start);
        let patterns_compiled = patterns.len();

        let match_start = instant::Instant::now();
        let candidates = PatternMatcher::new(patterns).find(doc);
        let match_us = micros(match_start);

        let mut result = self.process_candidates(doc, candidates)?;
        result.stats.patterns_compiled = patterns_compiled;
        result.stats.timings.compile_us = compile_us;
        result.stats.timings.match_us = match_us;
        result.stats.timings.total_us = micros(overall_start);
        Ok(result)
    }

    /// Tokenize plain text and run [`process`](Self::process)
    pub fn process_text(&mut self, text: &str, roster: &Roster) -> Result<ChapterResult> {
        self.process(&ResolvedDoc::tokenize(text), roster)
    }

    /// Reassemble independently resolved chunks, then process
    pub fn process_chunks(&mut self, chunks: Vec<ResolvedDoc>, roster: &Roster) -> Result<ChapterResult> {
        let doc = ResolvedDoc::concat(chunks)?;
        self.process(&doc, roster)
    }

    /// Pipeline from externally matched candidates (document order)
    pub fn process_candidates(
        &mut self,
        doc: &ResolvedDoc,
        candidates: Vec<MatchCandidate>,
    ) -> Result<ChapterResult> {
        let overall_start = instant::Instant::now();
        let mut result = ChapterResult::default();
        result.stats.token_count = doc.len();
        result.stats.candidates_found = candidates.len();

        let consolidate_start = instant::Instant::now();
        let mut spans = MatchConsolidator::bounded(doc.len()).consolidate(candidates)?;
        result.stats.timings.consolidate_us = micros(consolidate_start);
        result.stats.spans_consolidated = spans.len();

        let disambiguate_start = instant::Instant::now();
        self.disambiguator.reset_chooser();
        let report = self.disambiguator.disambiguate(&mut spans, doc);
        result.stats.timings.disambiguate_us = micros(disambiguate_start);
        result.stats.ambiguous_spans = report.ambiguous;
        result.stats.resolved_by_rule = report.by_rule;
        result.stats.resolved_by_neighbor = report.by_neighbor;
        result.stats.resolved_by_fallback = report.by_fallback;
        result.stats.spans_dropped = report.diagnostics.len();

        let extract_start = instant::Instant::now();
        result.interactions = self.extractor.extract(&spans);
        result.stats.timings.extract_us = micros(extract_start);
        result.stats.interaction_pairs = result.interactions.len();

        log::debug!(
            "[ChapterCortex] {} tokens, {} candidates → {} spans ({} ambiguous, {} dropped) → {} pairs",
            result.stats.token_count,
            result.stats.candidates_found,
            result.stats.spans_consolidated,
            result.stats.ambiguous_spans,
            result.stats.spans_dropped,
            result.stats.interaction_pairs
        );

        result.spans = spans;
        result.diagnostics = report.diagnostics;
        result.stats.timings.total_us = micros(overall_start);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackPolicy;
    use crate::error::WeaveError;
    use crate::scanner::{FallbackChooser, FallbackTable, RuleTable};

    fn cortex() -> ChapterCortex {
        ChapterCortex::new(PipelineConfig::deterministic()).unwrap()
    }

    #[test]
    fn test_process_text_end_to_end() {
        let roster = Roster::from_names(&["Harry Potter", "Ron Weasley"]);
        let result = cortex()
            .process_text("Harry Potter waved at Ron. Later that evening, nobody else in the whole quiet castle spoke a word to Harry.", &roster)
            .unwrap();

        let ids: Vec<_> = result.spans.iter().filter_map(|s| s.resolved_id()).collect();
        assert_eq!(ids, vec!["Harry Potter", "Ron Weasley", "Harry Potter"]);
        assert_eq!(result.interactions.get("Harry Potter", "Ron Weasley"), 1);
        assert_eq!(result.stats.interaction_pairs, 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_shared_surname_resolved_by_neighbor() {
        let roster = Roster::from_names(&["Fred Weasley", "George Weasley"]);
        let result = cortex().process_text("Fred Weasley grinned. Weasley laughed.", &roster).unwrap();

        assert_eq!(result.stats.ambiguous_spans, 1);
        assert_eq!(result.stats.resolved_by_neighbor, 1);
        assert!(result.spans.iter().all(|s| s.resolved_id() == Some("Fred Weasley")));
    }

    #[test]
    fn test_unresolvable_span_reported() {
        let roster = Roster::from_names(&["Fred Weasley", "George Weasley"]);
        let result = cortex().process_text("Weasley laughed.", &roster).unwrap();
        assert!(result.spans.is_empty());
        assert_eq!(result.stats.spans_dropped, 1);
        assert_eq!(result.diagnostics[0].surface, "Weasley");
        assert_eq!(result.diagnostics[0].candidates, vec!["Fred Weasley", "George Weasley"]);
    }

    #[test]
    fn test_process_candidates_validates_bounds() {
        let doc = ResolvedDoc::tokenize("Harry smiled");
        let err = cortex()
            .process_candidates(&doc, vec![MatchCandidate::new("Harry Potter", 0, 5, "Harry")])
            .unwrap_err();
        assert!(matches!(err, WeaveError::CandidateOutOfBounds { token_count: 2, .. }));
    }

    #[test]
    fn test_empty_roster_and_document() {
        let mut cortex = cortex();
        let empty = cortex.process_text("", &Roster::default()).unwrap();
        assert!(empty.spans.is_empty());
        assert!(empty.interactions.is_empty());

        let no_roster = cortex.process_text("Harry smiled.", &Roster::default()).unwrap();
        assert_eq!(no_roster.stats.patterns_compiled, 0);
        assert!(no_roster.spans.is_empty());
    }

    fn patil_chapter() -> (ResolvedDoc, Vec<MatchCandidate>) {
        let doc = ResolvedDoc::tokenize("Patil waved to Harry across the hall.");
        let candidates = vec![
            MatchCandidate::new("Padma Patil", 0, 1, "Patil"),
            MatchCandidate::new("Parvati Patil", 0, 1, "Patil"),
            MatchCandidate::new("Harry Potter", 3, 4, "Harry"),
        ];
        (doc, candidates)
    }

    fn patil_pick(cortex: &mut ChapterCortex) -> String {
        let (doc, candidates) = patil_chapter();
        let result = cortex.process_candidates(&doc, candidates).unwrap();
        assert_eq!(result.stats.resolved_by_fallback, 1);
        result.spans[0].resolved_id().unwrap().to_string()
    }

    #[test]
    fn test_seeded_fallback_repeats_across_chapters() {
        for seed in 0..16 {
            let config = PipelineConfig::default().with_fallback_policy(FallbackPolicy::Random { seed: Some(seed) });
            let fresh = patil_pick(&mut ChapterCortex::new(config.clone()).unwrap());

            let mut reused = ChapterCortex::new(config).unwrap();
            for chapter in 0..3 {
                assert_eq!(patil_pick(&mut reused), fresh, "seed {} chapter {}", seed, chapter);
            }
        }
    }

    /// Walks the options in order, one step per call
    struct Cycle(usize);

    impl FallbackChooser for Cycle {
        fn choose(&mut self, _surface: &str, options: &[String]) -> usize {
            let i = self.0 % options.len();
            self.0 += 1;
            i
        }
    }

    #[test]
    fn test_injected_chooser_keeps_state_across_chapters() {
        let config = PipelineConfig::default();
        let fallbacks = FallbackTable::new(config.disambiguation.fallbacks.clone());
        let disambiguator = OptionDisambiguator::new(RuleTable::new(), fallbacks, Box::new(Cycle(0)));
        let mut cortex = ChapterCortex::new(config).unwrap().with_disambiguator(disambiguator);

        assert_eq!(patil_pick(&mut cortex), "Padma Patil");
        assert_eq!(patil_pick(&mut cortex), "Parvati Patil");
        assert_eq!(patil_pick(&mut cortex), "Padma Patil");
    }

    #[test]
    fn test_invalid_rule_rejected_at_construction() {
        let config = PipelineConfig::from_json(
            r#"{ "disambiguation": { "rules": [ { "name": "bad", "when": { "kind": "prefix_matches", "pattern": "[" }, "resolve": "defer" } ] } }"#,
        )
        .unwrap();
        assert!(matches!(
            ChapterCortex::new(config),
            Err(WeaveError::InvalidRule { .. })
        ));
    }
}
