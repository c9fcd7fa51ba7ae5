//! Resolved token stream
//!
//! Every span in the pipeline is a half-open `[start, end)` interval of token
//! indices into a [`ResolvedDoc`]. Tokens carry their trailing whitespace so
//! span text can be rebuilt exactly as the resolver produced it.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Result, WeaveError};

/// Abbreviations that stay glued to their period ("Mrs." is one token)
const TITLE_ABBREVIATIONS: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof", "St"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Whitespace following the token (may be empty)
    #[serde(default)]
    pub whitespace: String,
    /// Byte offset of the token in the document text
    pub offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, whitespace: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            whitespace: whitespace.into(),
            offset,
        }
    }
}

/// A window of the token stream handed to the external resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWindow {
    /// Index of the window's first token in the whole document
    pub token_offset: usize,
    pub token_count: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDoc {
    tokens: Vec<Token>,
}

impl ResolvedDoc {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Split text on unicode word boundaries, folding whitespace into the
    /// preceding token and splitting possessive `'s` into its own token.
    pub fn tokenize(text: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();

        for (offset, word) in text.split_word_bound_indices() {
            if word.chars().all(char::is_whitespace) {
                if let Some(last) = tokens.last_mut() {
                    last.whitespace.push_str(word);
                }
                continue;
            }

            if word == "." {
                if let Some(last) = tokens.last_mut() {
                    if last.whitespace.is_empty() && TITLE_ABBREVIATIONS.contains(&last.text.as_str())
                    {
                        last.text.push('.');
                        continue;
                    }
                }
            }

            match split_possessive(word) {
                Some((stem, suffix)) => {
                    tokens.push(Token::new(stem, "", offset));
                    tokens.push(Token::new(suffix, "", offset + stem.len()));
                }
                None => tokens.push(Token::new(word, "", offset)),
            }
        }

        Self { tokens }
    }

    /// Reassemble independently resolved chunks into one document.
    ///
    /// Token indices of the result are absolute; byte offsets are rebased so
    /// each chunk continues where the previous one ended.
    pub fn concat(chunks: Vec<ResolvedDoc>) -> Result<Self> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut base = 0usize;

        for (index, chunk) in chunks.into_iter().enumerate() {
            if chunk
                .tokens
                .windows(2)
                .any(|pair| pair[1].offset < pair[0].offset + pair[0].text.len())
            {
                return Err(WeaveError::MalformedChunk {
                    index,
                    reason: "token offsets overlap or run backwards".to_string(),
                });
            }
            if chunk.tokens.is_empty() {
                continue;
            }

            if let Some(last) = tokens.last_mut() {
                if last.whitespace.is_empty() {
                    last.whitespace.push(' ');
                    base += 1;
                }
            }

            let chunk_start = chunk.tokens[0].offset;
            let mut chunk_end = base;
            for token in chunk.tokens {
                let offset = base + (token.offset - chunk_start);
                chunk_end = offset + token.text.len() + token.whitespace.len();
                tokens.push(Token { offset, ..token });
            }
            base = chunk_end;
        }

        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Full document text
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .flat_map(|t| [t.text.as_str(), t.whitespace.as_str()])
            .collect()
    }

    /// Text of `[start, end)`, without the last token's trailing whitespace.
    /// Out-of-range bounds are clamped.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }
        let mut out = String::new();
        for (i, token) in self.tokens[start..end].iter().enumerate() {
            out.push_str(&token.text);
            if start + i + 1 < end {
                out.push_str(&token.whitespace);
            }
        }
        out
    }

    /// Up to `n` tokens immediately before `start`
    pub fn context_before(&self, start: usize, n: usize) -> String {
        self.span_text(start.saturating_sub(n), start)
    }

    /// Up to `n` tokens immediately after `end`
    pub fn context_after(&self, end: usize, n: usize) -> String {
        self.span_text(end, end.saturating_add(n))
    }

    /// Consecutive fixed-size windows covering the whole stream
    pub fn windows(&self, size: usize) -> Vec<TokenWindow> {
        let size = size.max(1);
        (0..self.tokens.len())
            .step_by(size)
            .map(|offset| {
                let end = (offset + size).min(self.tokens.len());
                TokenWindow {
                    token_offset: offset,
                    token_count: end - offset,
                    text: self.span_text(offset, end),
                }
            })
            .collect()
    }
}

/// Fixed-size windows for batching text through the external resolver
pub fn token_windows(doc: &ResolvedDoc, chunk_size: usize) -> Vec<TokenWindow> {
    doc.windows(chunk_size)
}

fn split_possessive(word: &str) -> Option<(&str, &str)> {
    for suffix in ["'s", "\u{2019}s"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return Some((stem, &word[stem.len()..]));
            }
        }
    }
    None
}
