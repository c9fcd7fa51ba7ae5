//! PatternCompiler: roster → token-level surface patterns
//!
//! Each character yields its full name as a contiguous pattern plus one
//! single-token pattern per usable name part. Parts are matched
//! case-insensitively, but only against title-cased tokens.
//!
//! **Derived forms**: configured nicknames ("Ronald" → "Ron"), exact
//! orthography for Mc-/Mac- surnames (never title-cased), and epithets for
//! characters the text mostly names by alias.

use serde::{Deserialize, Serialize};

use crate::config::LexiconConfig;
use crate::roster::{CharacterEntity, Roster};
use crate::scanner::tokens::ResolvedDoc;

// =============================================================================
// Types
// =============================================================================

/// One token slot of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenConstraint {
    /// Lowercased token text equals `text`; `title` additionally requires a title-cased token
    Lower { text: String, title: bool },
    /// Token text equals `text` exactly
    Orth { text: String },
}

impl TokenConstraint {
    pub fn title(text: &str) -> Self {
        TokenConstraint::Lower {
            text: text.to_lowercase(),
            title: true,
        }
    }

    pub fn lower(text: &str) -> Self {
        TokenConstraint::Lower {
            text: text.to_lowercase(),
            title: false,
        }
    }

    pub fn orth(text: &str) -> Self {
        TokenConstraint::Orth {
            text: text.to_string(),
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        match self {
            TokenConstraint::Lower { text, title } => {
                token.to_lowercase() == *text && (!title || is_title_case(token))
            }
            TokenConstraint::Orth { text } => token == text,
        }
    }

    /// Lowercased key used to index patterns by their first slot
    pub fn index_key(&self) -> String {
        match self {
            TokenConstraint::Lower { text, .. } => text.clone(),
            TokenConstraint::Orth { text } => text.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    FullName,
    NamePart,
    ShortForm,
    Orthographic,
    Epithet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub entity_id: String,
    pub kind: PatternKind,
    pub tokens: Vec<TokenConstraint>,
}

impl PatternSpec {
    fn new(entity_id: &str, kind: PatternKind, tokens: Vec<TokenConstraint>) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            kind,
            tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Title case: at least one cased character, uppercase only after uncased
/// characters, lowercase only after cased ones. "McGonagall" is not title case.
pub fn is_title_case(s: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

// =============================================================================
// PatternCompiler
// =============================================================================

pub struct PatternCompiler<'a> {
    lexicon: &'a LexiconConfig,
}

impl<'a> PatternCompiler<'a> {
    pub fn new(lexicon: &'a LexiconConfig) -> Self {
        Self { lexicon }
    }

    /// Patterns for a single character, without duplicates.
    /// Zero patterns is legal: the character simply never matches.
    pub fn compile(&self, entity: &CharacterEntity) -> Vec<PatternSpec> {
        let mut patterns: Vec<PatternSpec> = Vec::new();
        let id = entity.id();

        let full_name: Vec<TokenConstraint> = entity
            .name_parts()
            .iter()
            .map(|part| TokenConstraint::title(part))
            .collect();
        push_unique(&mut patterns, PatternSpec::new(id, PatternKind::FullName, full_name));

        if !entity.is_possessive() {
            for part in entity.name_parts() {
                if self.lexicon.is_stop_word(part) {
                    continue;
                }
                push_unique(
                    &mut patterns,
                    PatternSpec::new(id, PatternKind::NamePart, vec![TokenConstraint::title(part)]),
                );
                if let Some(short) = self.lexicon.short_form(part) {
                    push_unique(
                        &mut patterns,
                        PatternSpec::new(id, PatternKind::ShortForm, vec![TokenConstraint::title(short)]),
                    );
                }
                if self.lexicon.has_orthographic_prefix(part) {
                    push_unique(
                        &mut patterns,
                        PatternSpec::new(id, PatternKind::Orthographic, vec![TokenConstraint::orth(part)]),
                    );
                }
            }

            if let Some(short) = entity.short_form() {
                push_unique(
                    &mut patterns,
                    PatternSpec::new(id, PatternKind::ShortForm, vec![TokenConstraint::title(short)]),
                );
            }
        }

        for phrase in self.lexicon.epithets_for(id) {
            push_unique(
                &mut patterns,
                PatternSpec::new(id, PatternKind::Epithet, epithet_tokens(phrase)),
            );
        }

        patterns
    }

    /// Patterns for a whole roster, skipping title-filtered characters
    pub fn compile_roster(&self, roster: &Roster) -> Vec<PatternSpec> {
        roster
            .iter()
            .filter(|entity| !self.lexicon.is_excluded(entity.display_name()))
            .flat_map(|entity| self.compile(entity))
            .collect()
    }
}

fn push_unique(patterns: &mut Vec<PatternSpec>, pattern: PatternSpec) {
    if pattern.is_empty() || patterns.iter().any(|p| p.tokens == pattern.tokens) {
        return;
    }
    patterns.push(pattern);
}

/// Word tokens must be title-cased; punctuation ("-") matches as-is
fn epithet_tokens(phrase: &str) -> Vec<TokenConstraint> {
    ResolvedDoc::tokenize(phrase)
        .tokens()
        .iter()
        .map(|token| {
            if token.text.chars().any(char::is_alphabetic) {
                TokenConstraint::title(&token.text)
            } else {
                TokenConstraint::lower(&token.text)
            }
        })
        .collect()
}
