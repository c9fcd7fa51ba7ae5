//! CharWeave: character interaction graphs from narrative text
//!
//! A Rust/WASM pipeline that turns a coreference-resolved chapter into
//! weighted interactions between known characters.
//!
//! # Architecture
//!
//! ## Scanner Components
//! - `tokens.rs` - ResolvedDoc: token stream, tokenizer, window chunking
//! - `text.rs` - Book splitting and chapter title/body extraction
//! - `patterns.rs` - PatternCompiler: roster → surface-form patterns
//! - `matcher.rs` - PatternMatcher: patterns → raw match candidates
//! - `consolidate.rs` - MatchConsolidator: overlapping candidates → spans
//! - `disambiguate.rs` - OptionDisambiguator: context rules, nearest neighbor, fallbacks
//! - `interaction.rs` - InteractionExtractor: spans → pair counts
//! - `chapter.rs` - ChapterCortex: **one call per chapter**
//!
//! ## Supporting Modules
//! - `config.rs` - Pipeline, lexicon and disambiguation tables
//! - `roster.rs` - Characters, per-chapter roster, cross-chapter ledger
//! - `graph.rs` - InteractionGraph over aggregated counts
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ChapterCortex } from 'charweave';
//!
//! await init();
//!
//! const cortex = new ChapterCortex({ fallback_policy: { policy: 'first' } });
//! const result = cortex.process({
//!   text: "Harry Potter waved at Ron.",
//!   roster: [{ id: 'Harry Potter' }, { id: 'Ron Weasley' }],
//! });
//!
//! console.log(result.interactions); // [{ source, target, weight }]
//! console.log(result.diagnostics);  // ambiguous mentions that were dropped
//! console.log(result.stats);        // counts + timing per phase
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod roster;
pub mod scanner;

pub use config::*;
pub use error::{Result, WeaveError};
pub use graph::InteractionGraph;
pub use roster::*;
pub use scanner::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install the panic hook so panics reach the browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("charweave v{}", env!("CARGO_PKG_VERSION"))
}
