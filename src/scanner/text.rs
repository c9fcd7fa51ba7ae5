//! Chapter text preparation
//!
//! Plain-text books separate chapters with a `CHAPTER ` marker followed by
//! the chapter number on the same line and the title on the next non-empty
//! line.

use serde::{Deserialize, Serialize};

pub const CHAPTER_MARKER: &str = "CHAPTER ";

/// Raw chapter texts, in order. Anything before the first marker (front
/// matter) is discarded.
pub fn split_book(text: &str) -> Vec<&str> {
    text.split(CHAPTER_MARKER).skip(1).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterText {
    pub title: String,
    /// Remaining lines joined with single spaces
    pub body: String,
}

impl ChapterText {
    /// Parse one chunk produced by [`split_book`]. The first line is the
    /// chapter number remnant and is dropped.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw
            .lines()
            .skip(1)
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty());

        let title = lines.next().unwrap_or_default().trim().to_string();
        let body = lines.collect::<Vec<_>>().join(" ");
        Self { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = "Front matter\n\nCHAPTER ONE\n\nTHE BOY WHO LIVED\n\nMr. and Mrs. Dursley were proud.\nThank you very much.\n\nCHAPTER TWO\nTHE VANISHING GLASS\nNearly ten years had passed.\n";

    #[test]
    fn test_split_book_drops_front_matter() {
        let chapters = split_book(BOOK);
        assert_eq!(chapters.len(), 2);
        assert!(chapters[0].starts_with("ONE"));
        assert!(chapters[1].starts_with("TWO"));
    }

    #[test]
    fn test_parse_title_and_body() {
        let chapters = split_book(BOOK);
        let first = ChapterText::parse(chapters[0]);
        assert_eq!(first.title, "THE BOY WHO LIVED");
        assert_eq!(first.body, "Mr. and Mrs. Dursley were proud. Thank you very much.");

        let second = ChapterText::parse(chapters[1]);
        assert_eq!(second.title, "THE VANISHING GLASS");
        assert_eq!(second.body, "Nearly ten years had passed.");
    }

    #[test]
    fn test_parse_degenerate_input() {
        assert_eq!(ChapterText::parse(""), ChapterText::default());
        let only_title = ChapterText::parse("THREE\nTHE LETTERS FROM NO ONE");
        assert_eq!(only_title.title, "THE LETTERS FROM NO ONE");
        assert!(only_title.body.is_empty());
        assert!(split_book("no markers here").is_empty());
    }
}
