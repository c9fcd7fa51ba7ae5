//! OptionDisambiguator: ambiguous spans → exactly one entity
//!
//! Spans are processed in list order. For each span carrying several
//! candidate ids:
//!
//! 1. **Context rules**: an ordered table of predicates over the span text
//!    and a few tokens either side ("Mrs." before "Dursley"). The first rule
//!    that matches decides: a single id, a coordinated multi-id set, or
//!    deferral to step 2.
//! 2. **Nearest neighbor**: the closest (by `end`) span already resolved to
//!    one of the candidate ids. First found wins ties.
//! 3. **Fallback table**: a curated surface → ids table; several ids go
//!    through the configured [`FallbackChooser`].
//! 4. Otherwise the span is dropped and a [`Diagnostic`] is recorded.
//!
//! Because step 2 reads spans resolved earlier in the same pass, this must
//! run sequentially over a chapter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::config::{FallbackPolicy, PipelineConfig, DEFAULT_CONTEXT_WINDOW};
use crate::error::{Result, WeaveError};
use crate::scanner::consolidate::ConsolidatedSpan;
use crate::scanner::tokens::ResolvedDoc;

// =============================================================================
// Rule Definitions (serializable)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextCondition {
    Always,
    /// Preceding window contains any of these substrings
    PrefixContains { any: Vec<String> },
    /// Following window contains any of these substrings
    SuffixContains { any: Vec<String> },
    /// Preceding window matches this regex
    PrefixMatches { pattern: String },
    /// Following window matches this regex
    SuffixMatches { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResolution {
    Single(String),
    /// Intentionally keeps several ids: each one is co-present
    Multi(Vec<String>),
    /// Stop checking rules, go to nearest-neighbor search
    Defer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRule {
    pub name: String,
    /// Literal span text this rule applies to; `None` applies to any span
    #[serde(default)]
    pub surface: Option<String>,
    pub when: ContextCondition,
    pub resolve: RuleResolution,
}

/// What a rule predicate sees
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub surface: &'a str,
    pub prefix: &'a str,
    pub suffix: &'a str,
}

// =============================================================================
// RuleTable
// =============================================================================

type Predicate = Arc<dyn Fn(&RuleContext) -> bool + Send + Sync>;

#[derive(Clone)]
enum Condition {
    Always,
    PrefixContains(Vec<String>),
    SuffixContains(Vec<String>),
    PrefixMatches(Regex),
    SuffixMatches(Regex),
    Custom(Predicate),
}

impl Condition {
    fn compile(rule: &str, condition: &ContextCondition) -> Result<Self> {
        let regex = |pattern: &str| {
            Regex::new(pattern).map_err(|e| WeaveError::InvalidRule {
                rule: rule.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(match condition {
            ContextCondition::Always => Condition::Always,
            ContextCondition::PrefixContains { any } => Condition::PrefixContains(any.clone()),
            ContextCondition::SuffixContains { any } => Condition::SuffixContains(any.clone()),
            ContextCondition::PrefixMatches { pattern } => Condition::PrefixMatches(regex(pattern)?),
            ContextCondition::SuffixMatches { pattern } => Condition::SuffixMatches(regex(pattern)?),
        })
    }

    fn holds(&self, ctx: &RuleContext) -> bool {
        match self {
            Condition::Always => true,
            Condition::PrefixContains(any) => any.iter().any(|s| ctx.prefix.contains(s.as_str())),
            Condition::SuffixContains(any) => any.iter().any(|s| ctx.suffix.contains(s.as_str())),
            Condition::PrefixMatches(re) => re.is_match(ctx.prefix),
            Condition::SuffixMatches(re) => re.is_match(ctx.suffix),
            Condition::Custom(predicate) => predicate(ctx),
        }
    }
}

#[derive(Clone)]
struct CompiledRule {
    name: String,
    surface: Option<String>,
    condition: Condition,
    resolution: RuleResolution,
}

/// A rule must name at least one id; an empty resolution would silently
/// drop the span
fn validate_resolution(rule: &str, resolution: &RuleResolution) -> Result<()> {
    let invalid = |reason: &str| WeaveError::InvalidRule {
        rule: rule.to_string(),
        reason: reason.to_string(),
    };
    match resolution {
        RuleResolution::Single(id) if id.is_empty() => Err(invalid("empty entity id")),
        RuleResolution::Multi(ids) if ids.is_empty() => Err(invalid("empty id set")),
        RuleResolution::Multi(ids) if ids.iter().any(String::is_empty) => {
            Err(invalid("empty entity id in set"))
        }
        _ => Ok(()),
    }
}

/// Ordered predicate → resolution pairs, evaluated top to bottom
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| &r.name))
            .finish()
    }
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(rules: &[ContextRule]) -> Result<Self> {
        let mut table = RuleTable::new();
        for rule in rules {
            validate_resolution(&rule.name, &rule.resolve)?;
            table.rules.push(CompiledRule {
                name: rule.name.clone(),
                surface: rule.surface.clone(),
                condition: Condition::compile(&rule.name, &rule.when)?,
                resolution: rule.resolve.clone(),
            });
        }
        Ok(table)
    }

    /// Append a rule backed by an arbitrary predicate
    pub fn push_predicate<F>(
        &mut self,
        name: impl Into<String>,
        surface: Option<&str>,
        predicate: F,
        resolution: RuleResolution,
    ) -> Result<()>
    where
        F: Fn(&RuleContext) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        validate_resolution(&name, &resolution)?;
        self.rules.push(CompiledRule {
            name,
            surface: surface.map(str::to_string),
            condition: Condition::Custom(Arc::new(predicate)),
            resolution,
        });
        Ok(())
    }

    /// First matching rule's name and resolution
    pub fn evaluate(&self, ctx: &RuleContext) -> Option<(&str, &RuleResolution)> {
        self.rules
            .iter()
            .filter(|r| r.surface.as_deref().map_or(true, |s| s == ctx.surface))
            .find(|r| r.condition.holds(ctx))
            .map(|r| (r.name.as_str(), &r.resolution))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// FallbackTable
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackLookup<'a> {
    /// Surface is on the skip list
    Skipped,
    Missing,
    Options(&'a [String]),
}

/// Curated surface → acceptable ids, plus surfaces never to resolve
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    entries: BTreeMap<String, Vec<String>>,
    skip: HashSet<String>,
}

impl FallbackTable {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            entries,
            skip: HashSet::new(),
        }
    }

    pub fn with_skipped<S: Into<String>>(mut self, surfaces: impl IntoIterator<Item = S>) -> Self {
        self.skip.extend(surfaces.into_iter().map(Into::into));
        self
    }

    pub fn insert(&mut self, surface: impl Into<String>, ids: Vec<String>) {
        self.entries.insert(surface.into(), ids);
    }

    pub fn lookup(&self, surface: &str) -> FallbackLookup<'_> {
        if self.skip.contains(surface) {
            return FallbackLookup::Skipped;
        }
        match self.entries.get(surface) {
            Some(ids) if !ids.is_empty() => FallbackLookup::Options(ids),
            _ => FallbackLookup::Missing,
        }
    }
}

// =============================================================================
// Fallback Choice
// =============================================================================

/// Picks one of several fallback ids
pub trait FallbackChooser: Send {
    /// Index into `options` (never empty)
    fn choose(&mut self, surface: &str, options: &[String]) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl FallbackChooser for FirstChoice {
    fn choose(&mut self, _surface: &str, _options: &[String]) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
pub struct RandomChoice {
    rng: StdRng,
}

impl RandomChoice {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl FallbackChooser for RandomChoice {
    fn choose(&mut self, _surface: &str, options: &[String]) -> usize {
        self.rng.gen_range(0..options.len())
    }
}

pub fn chooser_for(policy: &FallbackPolicy) -> Box<dyn FallbackChooser> {
    match policy {
        FallbackPolicy::First => Box::new(FirstChoice),
        FallbackPolicy::Random { seed: Some(seed) } => Box::new(RandomChoice::seeded(*seed)),
        FallbackPolicy::Random { seed: None } => Box::new(RandomChoice::from_entropy()),
    }
}

// =============================================================================
// Diagnostics & Report
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticReason {
    /// No rule, neighbor or fallback entry
    NoResolution,
    /// Surface is on the fallback skip list
    Skipped,
}

/// An ambiguous span that was dropped, for a curator to act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub surface: String,
    pub candidates: Vec<String>,
    pub start: usize,
    pub end: usize,
    pub reason: DiagnosticReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationReport {
    pub ambiguous: usize,
    pub by_rule: usize,
    pub by_neighbor: usize,
    pub by_fallback: usize,
    pub diagnostics: Vec<Diagnostic>,
}

enum Outcome {
    Ids(Vec<String>),
    Unresolved(DiagnosticReason),
}

// =============================================================================
// OptionDisambiguator
// =============================================================================

pub struct OptionDisambiguator {
    rules: RuleTable,
    fallbacks: FallbackTable,
    chooser: Box<dyn FallbackChooser>,
    /// Set when the chooser comes from config; injected choosers keep their state
    policy: Option<FallbackPolicy>,
    window: usize,
}

impl OptionDisambiguator {
    pub fn new(rules: RuleTable, fallbacks: FallbackTable, chooser: Box<dyn FallbackChooser>) -> Self {
        Self {
            rules,
            fallbacks,
            chooser,
            policy: None,
            window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let tables = &config.disambiguation;
        let fallbacks = FallbackTable::new(tables.fallbacks.clone())
            .with_skipped(tables.skip_surfaces.iter().cloned());
        let mut disambiguator = Self::new(
            RuleTable::compile(&tables.rules)?,
            fallbacks,
            chooser_for(&config.fallback_policy),
        )
        .with_window(config.context_window);
        disambiguator.policy = Some(config.fallback_policy.clone());
        Ok(disambiguator)
    }

    /// Rebuild a config-derived chooser so a seeded policy restarts its
    /// sequence. Called once per chapter.
    pub fn reset_chooser(&mut self) {
        if let Some(policy) = &self.policy {
            self.chooser = chooser_for(policy);
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Resolve every ambiguous span in place. Unresolvable spans are removed
    /// from `spans` and reported.
    pub fn disambiguate(&mut self, spans: &mut Vec<ConsolidatedSpan>, doc: &ResolvedDoc) -> DisambiguationReport {
        let mut report = DisambiguationReport::default();
        let pending: Vec<usize> = spans
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_ambiguous())
            .map(|(i, _)| i)
            .collect();
        report.ambiguous = pending.len();

        for index in pending {
            let outcome = self.resolve_one(spans, index, doc, &mut report);
            let span = &mut spans[index];
            match outcome {
                Outcome::Ids(ids) => span.resolve_to_many(&ids),
                Outcome::Unresolved(reason) => {
                    log::warn!(
                        "[OptionDisambiguator] no way to disambiguate '{}' from options {:?}",
                        span.span_text,
                        span.entity_ids()
                    );
                    report.diagnostics.push(Diagnostic {
                        surface: span.span_text.clone(),
                        candidates: span.entity_ids().to_vec(),
                        start: span.start,
                        end: span.end,
                        reason,
                    });
                    span.clear_entities();
                }
            }
        }

        spans.retain(|s| !s.entity_ids().is_empty());
        report
    }

    fn resolve_one(
        &mut self,
        spans: &[ConsolidatedSpan],
        index: usize,
        doc: &ResolvedDoc,
        report: &mut DisambiguationReport,
    ) -> Outcome {
        let span = &spans[index];
        let prefix = doc.context_before(span.start, self.window);
        let suffix = doc.context_after(span.end, self.window);
        let ctx = RuleContext {
            surface: &span.span_text,
            prefix: &prefix,
            suffix: &suffix,
        };

        match self.rules.evaluate(&ctx) {
            Some((name, RuleResolution::Single(id))) => {
                log::debug!("[OptionDisambiguator] rule '{}' → {}", name, id);
                report.by_rule += 1;
                return Outcome::Ids(vec![id.clone()]);
            }
            Some((name, RuleResolution::Multi(ids))) => {
                log::debug!("[OptionDisambiguator] rule '{}' → {:?}", name, ids);
                report.by_rule += 1;
                return Outcome::Ids(ids.clone());
            }
            Some((_, RuleResolution::Defer)) | None => {}
        }

        if let Some(id) = nearest_neighbor(spans, span) {
            report.by_neighbor += 1;
            return Outcome::Ids(vec![id.to_string()]);
        }

        match self.fallbacks.lookup(&span.span_text) {
            FallbackLookup::Options(ids) => {
                let choice = if ids.len() == 1 {
                    0
                } else {
                    self.chooser.choose(&span.span_text, ids).min(ids.len() - 1)
                };
                report.by_fallback += 1;
                Outcome::Ids(vec![ids[choice].clone()])
            }
            FallbackLookup::Skipped => Outcome::Unresolved(DiagnosticReason::Skipped),
            FallbackLookup::Missing => Outcome::Unresolved(DiagnosticReason::NoResolution),
        }
    }
}

/// Closest span (by end offset) resolved to one of `span`'s candidates
fn nearest_neighbor<'a>(spans: &'a [ConsolidatedSpan], span: &ConsolidatedSpan) -> Option<&'a str> {
    let mut best: Option<(usize, &str)> = None;
    for other in spans {
        let Some(id) = other.resolved_id() else {
            continue;
        };
        if !span.contains_entity(id) {
            continue;
        }
        let distance = span.end.abs_diff(other.end);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn span(list: &[&str], start: usize, end: usize, text: &str) -> ConsolidatedSpan {
        ConsolidatedSpan::new(ids(list), start, end, text)
    }

    fn bare() -> OptionDisambiguator {
        OptionDisambiguator::new(RuleTable::new(), FallbackTable::default(), Box::new(FirstChoice))
    }

    fn filler(n: usize) -> ResolvedDoc {
        ResolvedDoc::tokenize(&vec!["word"; n].join(" "))
    }

    #[test]
    fn test_nearest_neighbor_prefers_closest_end() {
        let mut spans = vec![
            span(&["X"], 9, 10, "X"),
            span(&["X", "Y"], 11, 12, "Sur"),
            span(&["X"], 49, 50, "X"),
            span(&["Y"], 59, 60, "Y"),
        ];
        let report = bare().disambiguate(&mut spans, &filler(60));
        assert_eq!(spans[1].entity_ids(), &["X"]);
        assert_eq!(report.by_neighbor, 1);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_nearest_neighbor_tie_goes_to_first_found() {
        let mut spans = vec![
            span(&["Y"], 15, 16, "Y"),
            span(&["X", "Y"], 9, 10, "Sur"),
            span(&["X"], 3, 4, "X"),
        ];
        bare().disambiguate(&mut spans, &filler(20));
        assert_eq!(spans[1].entity_ids(), &["Y"]);
    }

    #[test]
    fn test_earlier_resolution_feeds_later_span() {
        let mut spans = vec![
            span(&["X"], 0, 1, "X"),
            span(&["X", "Y"], 5, 6, "Sur"),
            span(&["X", "Z"], 8, 9, "Other"),
            span(&["Z"], 40, 41, "Z"),
        ];
        bare().disambiguate(&mut spans, &filler(50));
        assert_eq!(spans[1].entity_ids(), &["X"]);
        // [5,6) now resolved to X is closer than Z at 41
        assert_eq!(spans[2].entity_ids(), &["X"]);
    }

    #[test]
    fn test_context_rules_single_and_multi() {
        let doc = ResolvedDoc::tokenize("Mr. and Mrs. Dursley met Mrs. Dursley and Mr. Dursley");
        // tokens: Mr. and Mrs. Dursley(3) met Mrs. Dursley(6) and Mr. Dursley(9)
        let all = ["Vernon Dursley", "Petunia Dursley", "Dudley Dursley"];
        let mut spans = vec![
            span(&all, 3, 4, "Dursley"),
            span(&all, 6, 7, "Dursley"),
            span(&all, 9, 10, "Dursley"),
        ];
        let mut disambiguator = OptionDisambiguator::from_config(&PipelineConfig::deterministic()).unwrap();
        let report = disambiguator.disambiguate(&mut spans, &doc);

        assert_eq!(spans[0].entity_ids(), &["Vernon Dursley", "Petunia Dursley"]);
        assert_eq!(spans[1].entity_ids(), &["Petunia Dursley"]);
        assert_eq!(spans[2].entity_ids(), &["Vernon Dursley"]);
        assert_eq!(report.by_rule, 3);
    }

    #[test]
    fn test_rule_surface_must_match_exactly() {
        let doc = ResolvedDoc::tokenize("Mrs. Weasley and Mrs. Potter");
        let mut spans = vec![span(&["Lily Potter", "James Potter"], 4, 5, "Potter")];
        let mut disambiguator = OptionDisambiguator::from_config(&PipelineConfig::deterministic()).unwrap();
        let report = disambiguator.disambiguate(&mut spans, &doc);
        assert!(spans.is_empty());
        assert_eq!(report.diagnostics[0].reason, DiagnosticReason::NoResolution);
        assert_eq!(report.diagnostics[0].candidates, ids(&["Lily Potter", "James Potter"]));
    }

    #[test]
    fn test_defer_rule_skips_later_rules() {
        let mut rules = RuleTable::new();
        rules.push_predicate("defer_all", None, |_| true, RuleResolution::Defer).unwrap();
        rules
            .push_predicate("never_reached", None, |_| true, RuleResolution::Single("Y".into()))
            .unwrap();
        let mut disambiguator = OptionDisambiguator::new(rules, FallbackTable::default(), Box::new(FirstChoice));

        let mut spans = vec![span(&["X"], 0, 1, "X"), span(&["X", "Y"], 3, 4, "Sur")];
        disambiguator.disambiguate(&mut spans, &filler(5));
        assert_eq!(spans[1].entity_ids(), &["X"]);
    }

    #[test]
    fn test_suffix_regex_rule() {
        let rules = RuleTable::compile(&[ContextRule {
            name: "twins_fred".into(),
            surface: Some("Weasley".into()),
            when: ContextCondition::SuffixMatches {
                pattern: r"^,? the (elder|older)".into(),
            },
            resolve: RuleResolution::Single("Fred Weasley".into()),
        }])
        .unwrap();
        let doc = ResolvedDoc::tokenize("Weasley, the elder twin");
        let ctx = RuleContext {
            surface: "Weasley",
            prefix: &doc.context_before(0, 3),
            suffix: &doc.context_after(1, 3),
        };
        assert_eq!(rules.evaluate(&ctx).map(|(name, _)| name), Some("twins_fred"));
    }

    #[test]
    fn test_invalid_regex_rule_is_error() {
        let err = RuleTable::compile(&[ContextRule {
            name: "broken".into(),
            surface: None,
            when: ContextCondition::PrefixMatches { pattern: "(".into() },
            resolve: RuleResolution::Defer,
        }])
        .unwrap_err();
        assert!(matches!(err, WeaveError::InvalidRule { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_empty_rule_resolution_is_error() {
        let rule = |name: &str, resolve: RuleResolution| ContextRule {
            name: name.into(),
            surface: Some("Dursley".into()),
            when: ContextCondition::Always,
            resolve,
        };
        for bad in [
            rule("no_ids", RuleResolution::Multi(Vec::new())),
            rule("blank_in_set", RuleResolution::Multi(ids(&["Vernon Dursley", ""]))),
            rule("blank_single", RuleResolution::Single(String::new())),
        ] {
            let err = RuleTable::compile(&[bad.clone()]).unwrap_err();
            assert!(matches!(err, WeaveError::InvalidRule { ref rule, .. } if *rule == bad.name));
        }

        let mut table = RuleTable::new();
        assert!(table
            .push_predicate("empty", None, |_| true, RuleResolution::Multi(Vec::new()))
            .is_err());
        assert!(table.is_empty());

        let config = PipelineConfig::from_json(
            r#"{ "disambiguation": { "rules": [ { "name": "nobody", "when": { "kind": "always" }, "resolve": { "multi": [] } } ] } }"#,
        )
        .unwrap();
        assert!(OptionDisambiguator::from_config(&config).is_err());
    }

    #[test]
    fn test_fallback_single_and_multiple() {
        let mut table = FallbackTable::default();
        table.insert("Tom", ids(&["Tom"]));
        table.insert("Patil", ids(&["Padma Patil", "Parvati Patil"]));
        let mut disambiguator = OptionDisambiguator::new(RuleTable::new(), table, Box::new(FirstChoice));

        let mut spans = vec![
            span(&["Tom Riddle", "Tom"], 0, 1, "Tom"),
            span(&["Padma Patil", "Parvati Patil"], 4, 5, "Patil"),
        ];
        let report = disambiguator.disambiguate(&mut spans, &filler(6));
        assert_eq!(spans[0].entity_ids(), &["Tom"]);
        assert_eq!(spans[1].entity_ids(), &["Padma Patil"]);
        assert_eq!(report.by_fallback, 2);
    }

    #[test]
    fn test_seeded_random_choice_is_reproducible() {
        let options = ids(&["A", "B", "C", "D"]);
        let mut a = RandomChoice::seeded(42);
        let mut b = RandomChoice::seeded(42);
        let picks_a: Vec<usize> = (0..16).map(|_| a.choose("s", &options)).collect();
        let picks_b: Vec<usize> = (0..16).map(|_| b.choose("s", &options)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|&i| i < options.len()));
    }

    #[test]
    fn test_reset_chooser_restarts_seeded_sequence() {
        let config = PipelineConfig::default().with_fallback_policy(FallbackPolicy::Random { seed: Some(3) });
        let mut disambiguator = OptionDisambiguator::from_config(&config).unwrap();
        let pick = |d: &mut OptionDisambiguator| {
            let mut spans = vec![span(&["Padma Patil", "Parvati Patil"], 0, 1, "Patil")];
            d.disambiguate(&mut spans, &filler(2));
            spans[0].entity_ids().to_vec()
        };

        let first = pick(&mut disambiguator);
        for _ in 0..8 {
            disambiguator.reset_chooser();
            assert_eq!(pick(&mut disambiguator), first);
        }
    }

    #[test]
    fn test_skipped_surface_is_dropped_with_diagnostic() {
        let mut table = FallbackTable::default();
        table.insert("Professor", ids(&["Albus Dumbledore"]));
        let table = table.with_skipped(["Professor"]);
        let mut disambiguator = OptionDisambiguator::new(RuleTable::new(), table, Box::new(FirstChoice));

        let mut spans = vec![
            span(&["Harry Potter"], 0, 1, "Harry"),
            span(&["Albus Dumbledore", "Minerva McGonagall"], 2, 3, "Professor"),
        ];
        let report = disambiguator.disambiguate(&mut spans, &filler(4));
        assert_eq!(spans.len(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].reason, DiagnosticReason::Skipped);
        assert_eq!(report.diagnostics[0].surface, "Professor");
    }

    #[test]
    fn test_every_retained_span_is_reduced() {
        let mut spans = vec![
            span(&["A", "B"], 0, 1, "Q"),
            span(&["A"], 3, 4, "A"),
            span(&["C", "D"], 6, 7, "R"),
        ];
        bare().disambiguate(&mut spans, &filler(8));
        assert!(spans.iter().all(|s| s.entity_ids().len() == 1));
        assert_eq!(spans.len(), 2);
    }
}
