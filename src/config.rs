//! Configuration types and defaults for the chapter pipeline
//!
//! Every table the pipeline consults (stop words, nicknames, epithets,
//! context rules, fallbacks) lives here as plain data so it can be loaded
//! from JSON and versioned per book.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::scanner::disambiguate::{ContextCondition, ContextRule, RuleResolution};

/// Default proximity (in tokens) under which two mentions interact
pub const DEFAULT_DISTANCE_THRESHOLD: usize = 14;
/// Default number of tokens inspected on each side of an ambiguous span
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;
/// Default window size used when batching text for the external resolver
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

// =============================================================================
// Fallback Policy
// =============================================================================

/// How a fallback entry with several acceptable ids picks one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always take the first listed id
    First,
    /// Pick uniformly at random; a seed makes the choice reproducible
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::Random { seed: None }
    }
}

// =============================================================================
// Lexicon
// =============================================================================

/// Surface-form tables used when compiling roster patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Name parts too generic to match on their own (compared lowercase)
    pub stop_words: Vec<String>,
    /// Name part → nickname ("Ronald" → "ron")
    pub short_forms: BTreeMap<String, String>,
    /// Prefixes whose names need an exact-orthography pattern (McGonagall)
    pub orthographic_prefixes: Vec<String>,
    /// Entity id → alias phrases that never appear in the roster name
    pub epithets: BTreeMap<String, Vec<String>>,
    /// Entities whose display name contains one of these words are not compiled
    pub excluded_title_words: Vec<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        let stop_words = [
            "of", "the", "at", "family", "keeper", "wizard", "fat", "de", "hogwarts", "hotel",
            "owner", "express",
        ];
        let short_forms = [
            ("Ronald", "ron"),
            ("William", "bill"),
            ("Charles", "charlie"),
            ("Percy", "perce"),
            ("Ginevra", "ginny"),
        ];
        let mut epithets = BTreeMap::new();
        epithets.insert(
            "Tom Riddle".to_string(),
            vec![
                "Lord Voldemort".to_string(),
                "Voldemort".to_string(),
                "You-Know-Who".to_string(),
                "He-Who-Must-Not-Be-Named".to_string(),
            ],
        );

        Self {
            stop_words: stop_words.iter().map(|s| s.to_string()).collect(),
            short_forms: short_forms
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            orthographic_prefixes: vec!["Mc".to_string(), "Mac".to_string()],
            epithets,
            excluded_title_words: Vec::new(),
        }
    }
}

/// Title words that mark a roster entry as a group, creature or place
/// rather than a nameable character
pub const CANON_EXCLUDED_TITLE_WORDS: &[&str] = &[
    "wizard", "Wizard", "witch", "Witch", "director", "at", "of", "owner", "family",
    "Unidentified", "conductor", "Goblin", "Squid", "ghoul", "and", "Salamander", "ghost",
    "Ghost", "Transylvania", "colony", "saleswoman", "Dementor", "herd", "Boggart", "Troll",
    "Hangleton", "House", "Academy", "postman", "Omnioculars", "Veela", "children", "Hogwarts",
    "Sisters", "sisters", "Unicorn", "Lake", "Maze", "Place", "Nottingham", "Girl", "Member",
    "Inferius", "official", "peacock", "boy", "cat", "Department", "woman", "brothers",
    "Wandless",
];

impl LexiconConfig {
    /// Lexicon with no book-specific tables (only generic stop words)
    pub fn bare() -> Self {
        Self {
            short_forms: BTreeMap::new(),
            epithets: BTreeMap::new(),
            ..Self::default()
        }
    }

    pub fn is_stop_word(&self, part: &str) -> bool {
        let lower = part.to_lowercase();
        self.stop_words.iter().any(|w| w.to_lowercase() == lower)
    }

    pub fn short_form(&self, part: &str) -> Option<&str> {
        self.short_forms.get(part).map(String::as_str)
    }

    pub fn has_orthographic_prefix(&self, part: &str) -> bool {
        self.orthographic_prefixes.iter().any(|p| part.starts_with(p.as_str()))
    }

    pub fn epithets_for(&self, entity_id: &str) -> &[String] {
        self.epithets.get(entity_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any whitespace-separated word of the name is an excluded title word
    pub fn is_excluded(&self, display_name: &str) -> bool {
        display_name
            .split_whitespace()
            .any(|word| self.excluded_title_words.iter().any(|w| w == word))
    }
}

// =============================================================================
// Disambiguation Tables
// =============================================================================

/// Rule and fallback tables for ambiguous spans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Checked top to bottom; first match wins
    pub rules: Vec<ContextRule>,
    /// Surface text → ordered list of acceptable ids
    pub fallbacks: BTreeMap<String, Vec<String>>,
    /// Surface forms that are never resolved
    pub skip_surfaces: Vec<String>,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        let prefix = |any: &[&str]| ContextCondition::PrefixContains {
            any: any.iter().map(|s| s.to_string()).collect(),
        };
        let rules = vec![
            ContextRule {
                name: "dursley_couple".to_string(),
                surface: Some("Dursley".to_string()),
                when: prefix(&["Mr. and Mrs.", "Mrs. and Mr."]),
                resolve: RuleResolution::Multi(vec![
                    "Vernon Dursley".to_string(),
                    "Petunia Dursley".to_string(),
                ]),
            },
            ContextRule {
                name: "dursley_mrs".to_string(),
                surface: Some("Dursley".to_string()),
                when: prefix(&["Mrs."]),
                resolve: RuleResolution::Single("Petunia Dursley".to_string()),
            },
            ContextRule {
                name: "dursley_mr".to_string(),
                surface: Some("Dursley".to_string()),
                when: prefix(&["Mr."]),
                resolve: RuleResolution::Single("Vernon Dursley".to_string()),
            },
            ContextRule {
                name: "weasley_mrs".to_string(),
                surface: Some("Weasley".to_string()),
                when: prefix(&["Mrs."]),
                resolve: RuleResolution::Single("Molly Weasley".to_string()),
            },
        ];

        let mut fallbacks = BTreeMap::new();
        fallbacks.insert(
            "Patil".to_string(),
            vec!["Padma Patil".to_string(), "Parvati Patil".to_string()],
        );
        fallbacks.insert("Tom".to_string(), vec!["Tom".to_string()]);

        Self {
            rules,
            fallbacks,
            skip_surfaces: Vec::new(),
        }
    }
}

impl DisambiguationConfig {
    pub fn bare() -> Self {
        Self {
            rules: Vec::new(),
            fallbacks: BTreeMap::new(),
            skip_surfaces: Vec::new(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mentions closer than this (end of source to start of target) interact. Default: 14
    pub distance_threshold: usize,
    /// Tokens of context on each side of an ambiguous span. Default: 3
    pub context_window: usize,
    /// Token window size for the external resolver. Default: 2000
    pub chunk_size: usize,
    pub fallback_policy: FallbackPolicy,
    pub lexicon: LexiconConfig,
    pub disambiguation: DisambiguationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            context_window: DEFAULT_CONTEXT_WINDOW,
            chunk_size: DEFAULT_CHUNK_SIZE,
            fallback_policy: FallbackPolicy::default(),
            lexicon: LexiconConfig::default(),
            disambiguation: DisambiguationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// No book-specific tables at all
    pub fn bare() -> Self {
        Self {
            lexicon: LexiconConfig::bare(),
            disambiguation: DisambiguationConfig::bare(),
            ..Self::default()
        }
    }

    /// Canon tables with first-candidate fallback, for reproducible runs
    pub fn deterministic() -> Self {
        Self {
            fallback_policy: FallbackPolicy::First,
            ..Self::default()
        }
    }

    /// Canon tables plus the roster title filter
    pub fn curated() -> Self {
        let mut config = Self::default();
        config.lexicon.excluded_title_words = CANON_EXCLUDED_TITLE_WORDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        config
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_distance_threshold(mut self, threshold: usize) -> Self {
        self.distance_threshold = threshold;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }
}
