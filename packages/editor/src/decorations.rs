//! # Dictionary Decoration Engine
//!
//! Computes the text ranges that must bypass spellchecking because they
//! match an exempted word. Decorations are derived state: they are never
//! persisted, and they are recomputed only when the document or the
//! exemption set actually changed; a selection-only transition reuses the
//! previous set untouched.

use std::collections::HashSet;
use std::sync::OnceLock;

use folio_model::Node;
use regex::Regex;
use serde::Serialize;

use crate::Transition;

/// Case-insensitive exempted-word set, merged from the global and
/// per-project word lists at load time. Owned by the engine for one
/// session; never process-global.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExemptionSet {
    words: HashSet<String>,
}

impl ExemptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Insert one word; returns true if it was not present. Takes effect
    /// on the next recompute without reloading the stored lists.
    pub fn insert(&mut self, word: &str) -> bool {
        self.words.insert(word.to_lowercase())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One exempted span in document coordinates, tagged with a
/// spellcheck-suppressing directive by the rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
}

impl Decoration {
    /// Attribute the surface applies over the span
    pub fn directive() -> (&'static str, &'static str) {
        ("spellcheck", "false")
    }
}

/// Sorted, disjoint set of decorations for one document state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    fn new(decorations: Vec<Decoration>) -> Self {
        debug_assert!(decorations.windows(2).all(|w| w[0].to <= w[1].from));
        Self { decorations }
    }

    pub fn ranges(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b\w+\b").expect("word pattern compiles"))
}

/// Scan every text leaf exactly once and mark each word-boundary token
/// that is in the exemption set. Pure: identical inputs yield identical
/// range sets.
pub fn build_decorations(doc: &Node, exemptions: &ExemptionSet) -> DecorationSet {
    if exemptions.is_empty() {
        return DecorationSet::default();
    }

    let mut decorations = Vec::new();
    doc.for_each_text(|span| {
        // Track byte→char conversion incrementally; positions are in
        // characters while the regex reports byte offsets.
        let mut chars = 0usize;
        let mut byte_cursor = 0usize;
        for m in word_pattern().find_iter(span.text) {
            chars += span.text[byte_cursor..m.start()].chars().count();
            let word_chars = m.as_str().chars().count();
            if exemptions.contains(m.as_str()) {
                decorations.push(Decoration {
                    from: span.from + chars,
                    to: span.from + chars + word_chars,
                });
            }
            chars += word_chars;
            byte_cursor = m.end();
        }
    });

    DecorationSet::new(decorations)
}

/// Owns the exemption set and the cached decoration set for one editing
/// session.
#[derive(Debug, Default)]
pub struct DecorationEngine {
    exemptions: ExemptionSet,
    cache: DecorationSet,
    /// Armed when a word is added directly on the engine; forces a
    /// recompute on the next transition even without the meta marker.
    exemptions_dirty: bool,
}

impl DecorationEngine {
    pub fn new(exemptions: ExemptionSet) -> Self {
        Self {
            exemptions,
            cache: DecorationSet::default(),
            exemptions_dirty: false,
        }
    }

    pub fn exemptions(&self) -> &ExemptionSet {
        &self.exemptions
    }

    /// Add one word to the session's set; the next transition recomputes
    pub fn add_exemption(&mut self, word: &str) -> bool {
        let inserted = self.exemptions.insert(word);
        if inserted {
            self.exemptions_dirty = true;
        }
        inserted
    }

    /// Recompute decorations for a transition, or reuse the cached set
    /// when neither the document nor the exemption set changed.
    pub fn apply_transition(&mut self, transition: &Transition) -> &DecorationSet {
        if transition.doc_changed || transition.meta.exemptions_changed || self.exemptions_dirty {
            self.cache = build_decorations(&transition.doc, &self.exemptions);
            self.exemptions_dirty = false;
        }
        &self.cache
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.cache
    }
}
