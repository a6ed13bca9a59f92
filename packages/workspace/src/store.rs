//! Process-wide observable project state.
//!
//! The store is the single shared mutable resource: every component reads a
//! snapshot and writes back through the methods here. Each method computes
//! the full new state under the lock, releases it, and only then publishes
//! a change notification, so observers never see a partially-applied
//! transition. Nothing holds the lock across an await point.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use folio_model::{Chapter, ChapterId, Node, PageSettings, Project, ProjectStyles};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// What changed in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StoreChange {
    ProjectOpened,
    ProjectClosed,
    /// Project metadata outside the chapter list (font, export location)
    ProjectChanged,
    ChapterListChanged,
    ActiveChapterChanged { chapter: Option<ChapterId> },
    DirtyChanged { chapter: ChapterId, dirty: bool },
    StylesChanged,
    PageSettingsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreEvent {
    #[serde(flatten)]
    pub change: StoreChange,
    /// Milliseconds since the epoch, for observers that order events
    pub timestamp: i64,
}

/// State of the one open project. Lives for the duration of a session;
/// cleared on close.
#[derive(Debug, Clone)]
pub struct ProjectState {
    pub path: PathBuf,
    pub project: Project,
    /// Chapters in display order (kept aligned with `project.chapter_order`)
    pub chapters: Vec<Chapter>,
    pub active_chapter: Option<ChapterId>,
    /// Highest chapter id ever assigned this session. Deletions never
    /// lower it, so ids are never reused while the project stays open.
    pub max_assigned: ChapterId,
    /// Chapters with unsaved in-memory changes since their last persist
    pub dirty: HashSet<ChapterId>,
    /// Fully-populated styles, recomputed whenever the overrides change
    pub resolved_styles: ProjectStyles,
    pub page_settings: PageSettings,
}

impl ProjectState {
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }
}

pub struct ProjectStore {
    state: Mutex<Option<ProjectState>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<StoreEvent> {
        BroadcastStream::new(self.subscribe())
    }

    fn publish(&self, change: StoreChange) {
        // Nobody listening is fine
        let _ = self.events.send(StoreEvent {
            change,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    /// Read access to the current state; None when no project is open
    pub fn with_state<R>(&self, f: impl FnOnce(&ProjectState) -> R) -> Option<R> {
        self.state.lock().unwrap().as_ref().map(f)
    }

    /// Full snapshot clone (for tests and coarse observers)
    pub fn snapshot(&self) -> Option<ProjectState> {
        self.state.lock().unwrap().clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().is_some()
    }

    pub fn project_path(&self) -> Option<PathBuf> {
        self.with_state(|s| s.path.clone())
    }

    pub fn active_chapter(&self) -> Option<ChapterId> {
        self.with_state(|s| s.active_chapter).flatten()
    }

    pub fn is_dirty(&self, id: ChapterId) -> bool {
        self.with_state(|s| s.dirty.contains(&id)).unwrap_or(false)
    }

    pub fn chapter_tree(&self, id: ChapterId) -> Option<Node> {
        self.with_state(|s| s.chapter(id).and_then(|c| c.content.clone()))
            .flatten()
    }

    pub fn open(&self, state: ProjectState) {
        *self.state.lock().unwrap() = Some(state);
        self.publish(StoreChange::ProjectOpened);
    }

    pub fn close(&self) {
        *self.state.lock().unwrap() = None;
        self.publish(StoreChange::ProjectClosed);
    }

    pub fn set_active(&self, chapter: Option<ChapterId>) {
        let changed = {
            let mut guard = self.state.lock().unwrap();
            match guard.as_mut() {
                Some(state) if state.active_chapter != chapter => {
                    state.active_chapter = chapter;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.publish(StoreChange::ActiveChapterChanged { chapter });
        }
    }

    /// Install a freshly loaded tree without touching the dirty set
    pub fn set_chapter_content(&self, id: ChapterId, tree: Node) {
        let mut guard = self.state.lock().unwrap();
        if let Some(state) = guard.as_mut() {
            if let Some(chapter) = state.chapters.iter_mut().find(|c| c.id == id) {
                chapter.content = Some(tree);
            }
        }
    }

    /// Record an edited tree and mark the chapter dirty
    pub fn apply_content_change(&self, id: ChapterId, tree: Node) {
        let newly_dirty = {
            let mut guard = self.state.lock().unwrap();
            match guard.as_mut() {
                Some(state) => match state.chapters.iter_mut().find(|c| c.id == id) {
                    Some(chapter) => {
                        chapter.content = Some(tree);
                        state.dirty.insert(id)
                    }
                    None => false,
                },
                None => false,
            }
        };
        if newly_dirty {
            self.publish(StoreChange::DirtyChanged {
                chapter: id,
                dirty: true,
            });
        }
    }

    /// Called by the autosave worker after a successful persist
    pub fn clear_dirty(&self, id: ChapterId) {
        let was_dirty = {
            let mut guard = self.state.lock().unwrap();
            guard.as_mut().map(|s| s.dirty.remove(&id)).unwrap_or(false)
        };
        if was_dirty {
            self.publish(StoreChange::DirtyChanged {
                chapter: id,
                dirty: false,
            });
        }
    }

    pub fn insert_chapter(&self, chapter: Chapter) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state.max_assigned = state.max_assigned.max(chapter.id);
                state.project.chapter_order.push(chapter.id);
                state.chapters.push(chapter);
            }
        }
        self.publish(StoreChange::ChapterListChanged);
    }

    pub fn remove_chapter(&self, id: ChapterId) -> Option<Chapter> {
        let (removed, was_dirty) = {
            let mut guard = self.state.lock().unwrap();
            match guard.as_mut() {
                Some(state) => {
                    let index = state.chapters.iter().position(|c| c.id == id);
                    let removed = index.map(|i| state.chapters.remove(i));
                    if removed.is_some() {
                        state.project.chapter_order.retain(|&other| other != id);
                    }
                    (removed, state.dirty.remove(&id))
                }
                None => (None, false),
            }
        };
        if removed.is_some() {
            self.publish(StoreChange::ChapterListChanged);
        }
        if was_dirty {
            self.publish(StoreChange::DirtyChanged {
                chapter: id,
                dirty: false,
            });
        }
        removed
    }

    pub fn set_chapter_title(&self, id: ChapterId, title: String) {
        let changed = {
            let mut guard = self.state.lock().unwrap();
            match guard.as_mut().and_then(|s| s.chapters.iter_mut().find(|c| c.id == id)) {
                Some(chapter) => {
                    chapter.title = title;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.publish(StoreChange::ChapterListChanged);
        }
    }

    /// Replace the chapter order and realign the chapter list to it
    pub fn set_order(&self, order: Vec<ChapterId>) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state
                    .chapters
                    .sort_by_key(|c| order.iter().position(|&id| id == c.id).unwrap_or(usize::MAX));
                state.project.chapter_order = order;
            }
        }
        self.publish(StoreChange::ChapterListChanged);
    }

    /// Store new overrides and recompute the resolved styles
    pub fn set_styles(&self, overrides: ProjectStyles) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state.resolved_styles = folio_stylesheet::resolve(&overrides);
                state.project.styles = Some(overrides);
            }
        }
        self.publish(StoreChange::StylesChanged);
    }

    pub fn set_project_font(&self, font_family: Option<String>) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state.project.font_family = font_family;
            }
        }
        self.publish(StoreChange::ProjectChanged);
    }

    pub fn set_export_dir(&self, export_dir: Option<String>) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state.project.export_dir = export_dir;
            }
        }
        self.publish(StoreChange::ProjectChanged);
    }

    pub fn set_page_settings(&self, settings: PageSettings) {
        {
            let mut guard = self.state.lock().unwrap();
            if let Some(state) = guard.as_mut() {
                state.page_settings = settings.clone();
                state.project.page_settings = Some(settings);
            }
        }
        self.publish(StoreChange::PageSettingsChanged);
    }
}
