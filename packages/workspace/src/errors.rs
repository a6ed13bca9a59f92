use std::path::PathBuf;

use folio_model::{ChapterId, ModelError};
use thiserror::Error;

/// Failures while reading or writing the persisted project records
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Project record not found in {0}")]
    ProjectNotFound(PathBuf),

    #[error("Invalid chapter content: {0}")]
    InvalidContent(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("No project is open")]
    NoProject,

    #[error("Unknown chapter: {0}")]
    UnknownChapter(ChapterId),

    #[error("Autosave worker has stopped")]
    AutosaveStopped,
}
