use folio_model::Node;
use serde::{Deserialize, Serialize};

/// One applied change of the editing surface: the tree after the change
/// plus what kind of change it was.
///
/// `doc_changed` is false for selection-only transitions, which lets
/// derived caches skip recomputation. A transition can additionally carry
/// metadata markers for state that lives outside the tree (currently only
/// the exemption set).
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub doc: Node,
    pub doc_changed: bool,
    pub meta: TransitionMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionMeta {
    /// Set when the exemption word set changed since the previous
    /// transition. Changing the set alone does not alter the tree, so the
    /// surface attaches this marker to its next transition to force a
    /// decoration recompute.
    #[serde(rename = "exemptionsChanged", default)]
    pub exemptions_changed: bool,
}

impl Transition {
    /// A transition that changed the document structurally or textually
    pub fn doc_change(doc: Node) -> Self {
        Self {
            doc,
            doc_changed: true,
            meta: TransitionMeta::default(),
        }
    }

    /// A transition that left the document untouched (selection moves,
    /// focus changes)
    pub fn selection_only(doc: Node) -> Self {
        Self {
            doc,
            doc_changed: false,
            meta: TransitionMeta::default(),
        }
    }

    pub fn with_exemptions_marker(mut self) -> Self {
        self.meta.exemptions_changed = true;
        self
    }
}
