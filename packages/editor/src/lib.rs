//! # Folio Editor
//!
//! Editing-surface engines for Folio.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: content tree + persisted records     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: per-transition engines              │
//! │  - Decoration engine (spellcheck exemptions)│
//! │  - Style sampling over a selection          │
//! │  - Chapter drag/drop reorder math           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: store + persistence + autosave   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything in this crate is synchronous and side-effect-free: each engine
//! is a pure function of a content tree (plus a transition describing how it
//! changed), so all of it can be tested without the editing surface or any
//! I/O. The workspace crate owns the glue that feeds trees in and persists
//! results out.

mod decorations;
mod reorder;
mod selection;
mod transition;

pub use decorations::{build_decorations, Decoration, DecorationEngine, DecorationSet, ExemptionSet};
pub use reorder::{reorder, DropPosition};
pub use selection::style_from_selection;
pub use transition::{Transition, TransitionMeta};
