//! # Autosave Synchronizer
//!
//! Debounced persistence for the active chapter. A single worker task owns
//! one pending deadline: every scheduled edit resets it (only the active
//! chapter accrues edits, so one timer suffices), and a flush cancels it
//! and saves immediately. The worker awaits each save inline, which is
//! what guarantees at most one in-flight save per chapter.
//!
//! A failed save leaves the dirty flag set and is only logged; the next
//! edit or flush re-attempts. There is no automatic retry loop.

use std::sync::Arc;
use std::time::Duration;

use folio_model::ChapterId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use crate::{Persistence, ProjectStore, WorkspaceError};

/// Quiet period between the last edit and its persist
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

enum Command {
    Schedule(ChapterId),
    Flush(ChapterId, oneshot::Sender<Result<(), WorkspaceError>>),
    Shutdown(oneshot::Sender<Result<(), WorkspaceError>>),
}

pub struct Autosave {
    commands: mpsc::UnboundedSender<Command>,
}

impl Autosave {
    pub fn spawn(
        store: Arc<ProjectStore>,
        persistence: Arc<dyn Persistence>,
        debounce: Duration,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(store, persistence, debounce, rx));
        Self { commands }
    }

    /// Mark intent to persist; rapid repeated calls for the same chapter
    /// coalesce into one save after the quiet period.
    pub fn schedule_save(&self, chapter: ChapterId) {
        let _ = self.commands.send(Command::Schedule(chapter));
    }

    /// Cancel any pending deadline and persist now. Used on chapter
    /// switch and project close; resolves once the save has settled.
    pub async fn flush(&self, chapter: ChapterId) -> Result<(), WorkspaceError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(chapter, tx))
            .map_err(|_| WorkspaceError::AutosaveStopped)?;
        rx.await.map_err(|_| WorkspaceError::AutosaveStopped)?
    }

    /// Flush whatever is pending and stop the worker
    pub async fn shutdown(&self) -> Result<(), WorkspaceError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(tx))
            .map_err(|_| WorkspaceError::AutosaveStopped)?;
        rx.await.map_err(|_| WorkspaceError::AutosaveStopped)?
    }
}

async fn run_worker(
    store: Arc<ProjectStore>,
    persistence: Arc<dyn Persistence>,
    debounce: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<(ChapterId, Instant)> = None;

    loop {
        let deadline = pending.map(|(_, at)| at).unwrap_or_else(Instant::now);

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Schedule(chapter)) => {
                    // Debounce: every new edit restarts the quiet period
                    pending = Some((chapter, Instant::now() + debounce));
                }
                Some(Command::Flush(chapter, ack)) => {
                    pending = None;
                    let result = save_chapter(&store, persistence.as_ref(), chapter).await;
                    let _ = ack.send(result);
                }
                Some(Command::Shutdown(ack)) => {
                    let result = match pending.take() {
                        Some((chapter, _)) => {
                            save_chapter(&store, persistence.as_ref(), chapter).await
                        }
                        None => Ok(()),
                    };
                    let _ = ack.send(result);
                    return;
                }
                None => {
                    if let Some((chapter, _)) = pending.take() {
                        if let Err(error) =
                            save_chapter(&store, persistence.as_ref(), chapter).await
                        {
                            tracing::error!(chapter, %error, "final autosave failed");
                        }
                    }
                    return;
                }
            },
            _ = sleep_until(deadline), if pending.is_some() => {
                if let Some((chapter, _)) = pending.take() {
                    if let Err(error) = save_chapter(&store, persistence.as_ref(), chapter).await {
                        tracing::error!(chapter, %error, "autosave failed; chapter stays dirty");
                    }
                }
            }
        }
    }
}

/// Persist one chapter if it has unsaved changes; otherwise a no-op.
/// Clears the dirty flag only when the persist succeeded.
async fn save_chapter(
    store: &ProjectStore,
    persistence: &dyn Persistence,
    chapter: ChapterId,
) -> Result<(), WorkspaceError> {
    // Snapshot under the lock; the save itself runs without it.
    let snapshot = store
        .with_state(|state| {
            if !state.dirty.contains(&chapter) {
                return None;
            }
            let tree = state.chapter(chapter)?.content.clone()?;
            Some((state.path.clone(), tree))
        })
        .flatten();

    let Some((path, tree)) = snapshot else {
        return Ok(());
    };

    persistence.save_chapter_content(&path, chapter, &tree).await?;
    store.clear_dirty(chapter);
    tracing::debug!(chapter, "chapter persisted");
    Ok(())
}
