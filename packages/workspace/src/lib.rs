//! # Folio Workspace
//!
//! Owns everything stateful about one authoring session: the observable
//! project store, the persisted record layout, the debounced autosave
//! worker, and the chapter lifecycle operations. The editing surface talks
//! to [`Workspace`]; everything else in the repo is pure computation it
//! delegates to.

mod autosave;
mod errors;
mod persistence;
mod store;
mod workspace;

#[cfg(test)]
mod autosave_tests;

pub use autosave::{Autosave, DEFAULT_DEBOUNCE};
pub use errors::{PersistenceError, WorkspaceError};
pub use persistence::{
    AppConfig, DictionaryScope, FsPersistence, MetadataPatch, Persistence,
};
pub use store::{ProjectState, ProjectStore, StoreChange, StoreEvent};
pub use workspace::Workspace;
