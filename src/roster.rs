//! Character roster and the cross-chapter ledger
//!
//! A [`Roster`] is the snapshot of "characters known so far" for one chapter.
//! The [`RosterLedger`] is the explicit accumulator that produces those
//! snapshots in book/chapter order and sums interaction counts per book.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scanner::interaction::InteractionCounts;

/// Name parts shorter than this are dropped ("of", "de")
const MIN_NAME_PART_CHARS: usize = 3;

// =============================================================================
// CharacterEntity
// =============================================================================

/// Roster input as it arrives from the character index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterInput {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_form: Option<String>,
}

/// A known character. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CharacterInput")]
pub struct CharacterEntity {
    id: String,
    display_name: String,
    name_parts: Vec<String>,
    short_form: Option<String>,
}

impl From<CharacterInput> for CharacterEntity {
    fn from(input: CharacterInput) -> Self {
        let display_name = input.display_name.unwrap_or_else(|| input.id.clone());
        let mut entity = CharacterEntity::with_display_name(input.id, display_name);
        entity.short_form = input.short_form;
        entity
    }
}

impl CharacterEntity {
    /// Entity whose display name is its canonical id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_display_name(id.clone(), id)
    }

    pub fn with_display_name(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let name_parts = display_name
            .split(' ')
            .filter(|part| part.chars().count() >= MIN_NAME_PART_CHARS)
            .map(str::to_string)
            .collect();
        Self {
            id: id.into(),
            display_name,
            name_parts,
            short_form: None,
        }
    }

    pub fn with_short_form(mut self, short_form: impl Into<String>) -> Self {
        self.short_form = Some(short_form.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn name_parts(&self) -> &[String] {
        &self.name_parts
    }

    pub fn short_form(&self) -> Option<&str> {
        self.short_form.as_deref()
    }

    /// Possessive constructions ("Hagrid's wife") only match as a whole
    pub fn is_possessive(&self) -> bool {
        self.display_name.contains('\'') || self.display_name.contains('\u{2019}')
    }
}

// =============================================================================
// Roster
// =============================================================================

/// Ordered, id-unique set of characters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CharacterEntity>", into = "Vec<CharacterEntity>")]
pub struct Roster {
    entities: Vec<CharacterEntity>,
}

impl From<Vec<CharacterEntity>> for Roster {
    fn from(entities: Vec<CharacterEntity>) -> Self {
        Roster::new(entities)
    }
}

impl From<Roster> for Vec<CharacterEntity> {
    fn from(roster: Roster) -> Self {
        roster.entities
    }
}

impl Roster {
    /// Build a roster; the first entity wins when ids repeat
    pub fn new(entities: impl IntoIterator<Item = CharacterEntity>) -> Self {
        let mut roster = Roster::default();
        roster.extend(entities);
        roster
    }

    /// Shorthand for rosters where every display name is the id
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Roster::new(names.iter().map(|n| CharacterEntity::new(n.as_ref())))
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = CharacterEntity>) {
        for entity in entities {
            if !self.contains(entity.id()) {
                self.entities.push(entity);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&CharacterEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterEntity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// RosterLedger
// =============================================================================

/// Book/chapter key; books and chapters are 1-based
pub type ChapterKey = (u32, u32);

/// Cross-chapter accumulator: who was introduced where, and what interacted
#[derive(Debug, Clone, Default)]
pub struct RosterLedger {
    introductions: BTreeMap<ChapterKey, Vec<CharacterEntity>>,
    interactions: BTreeMap<ChapterKey, InteractionCounts>,
}

impl RosterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the characters first appearing in a chapter
    pub fn introduce(
        &mut self,
        book: u32,
        chapter: u32,
        entities: impl IntoIterator<Item = CharacterEntity>,
    ) {
        self.introductions
            .entry((book, chapter))
            .or_default()
            .extend(entities);
    }

    /// Every character introduced in earlier books, plus chapters
    /// `1..=chapter` of `book`
    pub fn roster_until(&self, book: u32, chapter: u32) -> Roster {
        Roster::new(
            self.introductions
                .range(..=(book, chapter))
                .flat_map(|(_, entities)| entities.iter().cloned()),
        )
    }

    pub fn record_interactions(&mut self, book: u32, chapter: u32, counts: InteractionCounts) {
        self.interactions.insert((book, chapter), counts);
    }

    pub fn chapter_interactions(&self, book: u32, chapter: u32) -> Option<&InteractionCounts> {
        self.interactions.get(&(book, chapter))
    }

    /// Sum of all recorded chapter counts for one book
    pub fn book_totals(&self, book: u32) -> InteractionCounts {
        let mut totals = InteractionCounts::default();
        for counts in self
            .interactions
            .range((book, 0)..=(book, u32::MAX))
            .map(|(_, c)| c)
        {
            totals.merge(counts);
        }
        totals
    }

    /// Chapters with recorded interactions, in order
    pub fn recorded_chapters(&self, book: u32) -> Vec<u32> {
        self.interactions
            .range((book, 0)..=(book, u32::MAX))
            .map(|((_, chapter), _)| *chapter)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parts_drop_short_particles() {
        let entity = CharacterEntity::new("Cuthbert de la Binns");
        assert_eq!(entity.name_parts(), &["Cuthbert", "Binns"]);
        // Three characters is long enough to keep
        assert_eq!(CharacterEntity::new("Lee Jordan").name_parts(), &["Lee", "Jordan"]);
        assert!(!entity.is_possessive());
        assert!(CharacterEntity::new("Hagrid's wife").is_possessive());
    }

    #[test]
    fn test_character_input_deserializes() {
        let entity: CharacterEntity = serde_json::from_str(
            r#"{ "id": "Ronald Weasley", "short_form": "Ronnie" }"#,
        )
        .unwrap();
        assert_eq!(entity.display_name(), "Ronald Weasley");
        assert_eq!(entity.short_form(), Some("Ronnie"));
        assert_eq!(entity.name_parts(), &["Ronald", "Weasley"]);
    }

    #[test]
    fn test_roster_dedupes_ids() {
        let roster = Roster::new(vec![
            CharacterEntity::new("Harry Potter"),
            CharacterEntity::with_display_name("Harry Potter", "Harry James Potter"),
            CharacterEntity::new("Ron Weasley"),
        ]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("Harry Potter").unwrap().display_name(), "Harry Potter");
    }

    #[test]
    fn test_roster_until_grows_monotonically() {
        let mut ledger = RosterLedger::new();
        ledger.introduce(1, 1, vec![CharacterEntity::new("Vernon Dursley")]);
        ledger.introduce(1, 2, vec![CharacterEntity::new("Harry Potter")]);
        ledger.introduce(1, 6, vec![CharacterEntity::new("Ron Weasley")]);
        ledger.introduce(2, 1, vec![CharacterEntity::new("Dobby")]);

        assert_eq!(ledger.roster_until(1, 1).len(), 1);
        assert_eq!(ledger.roster_until(1, 5).len(), 2);
        let book_two: Vec<String> = ledger.roster_until(2, 1).ids().map(str::to_string).collect();
        assert_eq!(book_two, vec!["Vernon Dursley", "Harry Potter", "Ron Weasley", "Dobby"]);
        assert!(ledger.roster_until(0, 9).is_empty());
    }

    #[test]
    fn test_book_totals_sum_chapters() {
        let mut ledger = RosterLedger::new();
        let mut first = InteractionCounts::default();
        first.record("Ron Weasley", "Harry Potter");
        let mut second = InteractionCounts::default();
        second.record("Harry Potter", "Ron Weasley");
        second.record("Harry Potter", "Hermione Granger");
        let mut other_book = InteractionCounts::default();
        other_book.record("Harry Potter", "Dobby");

        ledger.record_interactions(1, 1, first);
        ledger.record_interactions(1, 2, second);
        ledger.record_interactions(2, 1, other_book);

        let totals = ledger.book_totals(1);
        assert_eq!(totals.get("Harry Potter", "Ron Weasley"), 2);
        assert_eq!(totals.get("Harry Potter", "Hermione Granger"), 1);
        assert_eq!(totals.get("Harry Potter", "Dobby"), 0);
        assert_eq!(ledger.recorded_chapters(1), vec![1, 2]);
        assert_eq!(ledger.chapter_interactions(2, 1).unwrap().total(), 1);
    }
}
