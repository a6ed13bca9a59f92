//! # Workspace orchestrator
//!
//! Glues the store, the persistence collaborator, the autosave worker, and
//! the per-session decoration engine together and exposes the chapter
//! lifecycle operations. Every method computes the full state transition
//! before publishing it; persistence of styles, page settings, and chapter
//! order is fire-and-forget relative to the in-memory state, which is the
//! source of truth for the session.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use folio_editor::{
    reorder, style_from_selection, DecorationEngine, DecorationSet, DropPosition, ExemptionSet,
    Transition,
};
use folio_model::{
    default_chapter_title, make_unique_title, next_chapter_id, BlockKey, Chapter, ChapterId, Node,
    PageSettings, Project, ProjectStyles,
};
use folio_stylesheet::{build_stylesheet, estimate_pages, reset_key, resolve, PageGeometry};

use crate::autosave::DEFAULT_DEBOUNCE;
use crate::{
    Autosave, DictionaryScope, MetadataPatch, Persistence, ProjectState, ProjectStore,
    WorkspaceError,
};

pub struct Workspace {
    store: Arc<ProjectStore>,
    persistence: Arc<dyn Persistence>,
    autosave: Autosave,
    decorations: Mutex<DecorationEngine>,
}

impl Workspace {
    pub fn new(persistence: Arc<dyn Persistence>) -> Self {
        Self::with_debounce(persistence, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(persistence: Arc<dyn Persistence>, debounce: Duration) -> Self {
        let store = Arc::new(ProjectStore::new());
        let autosave = Autosave::spawn(store.clone(), persistence.clone(), debounce);
        Self {
            store,
            persistence,
            autosave,
            decorations: Mutex::new(DecorationEngine::default()),
        }
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Project lifecycle
    // ------------------------------------------------------------------

    /// Create a fresh project record at `path` and open it
    pub async fn create_project(&self, path: &Path, title: &str) -> Result<(), WorkspaceError> {
        let project = Project::new(title);
        let patch = MetadataPatch {
            title: Some(project.title.clone()),
            author: Some(project.author.clone()),
            chapter_order: Some(vec![]),
            ..Default::default()
        };
        self.persistence.save_project_metadata(path, &patch).await?;
        self.open_project(path).await
    }

    pub async fn open_project(&self, path: &Path) -> Result<(), WorkspaceError> {
        let (project, titles) = self.persistence.load_project_metadata(path).await?;

        let mut chapters = Vec::with_capacity(project.chapter_order.len());
        for &id in &project.chapter_order {
            let content = self.persistence.load_chapter_content(path, id).await?;
            let title = titles
                .get(&id)
                .cloned()
                .unwrap_or_else(|| default_chapter_title(id));
            chapters.push(Chapter { id, title, content });
        }

        // One in-memory exemption set per session, merged from both lists
        let words = self.persistence.load_exemption_words(Some(path)).await?;
        *self.decorations.lock().unwrap() = DecorationEngine::new(ExemptionSet::from_words(words));

        let overrides = project.styles.clone().unwrap_or_default();
        let page_settings = project.page_settings.clone().unwrap_or_default();
        let active_chapter = chapters.first().map(|c| c.id);
        // Id gaps in a reloaded project are preserved, never compacted
        let max_assigned = chapters.iter().map(|c| c.id).max().unwrap_or(0);

        self.store.open(ProjectState {
            path: path.to_path_buf(),
            project,
            chapters,
            active_chapter,
            max_assigned,
            dirty: HashSet::new(),
            resolved_styles: resolve(&overrides),
            page_settings,
        });

        // Remember the project for next launch; failure is not fatal
        let mut config = self.persistence.read_config().await.unwrap_or_default();
        config.last_project_path = Some(path.display().to_string());
        if let Err(error) = self.persistence.write_config(&config).await {
            tracing::warn!(%error, "could not update app config");
        }

        Ok(())
    }

    /// Flush pending work and clear the in-memory project
    pub async fn close_project(&self) -> Result<(), WorkspaceError> {
        if let Some(active) = self.store.active_chapter() {
            self.autosave.flush(active).await?;
        }
        self.store.close();
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), WorkspaceError> {
        if self.store.is_open() {
            self.close_project().await?;
        }
        self.autosave.shutdown().await
    }

    // ------------------------------------------------------------------
    // Chapter lifecycle
    // ------------------------------------------------------------------

    /// Switch the active chapter. The outgoing chapter's pending save is
    /// flushed before the incoming tree is touched, so two chapters'
    /// edits can never conflate.
    pub async fn set_active_chapter(&self, id: ChapterId) -> Result<(), WorkspaceError> {
        let known = self
            .store
            .with_state(|s| s.chapter(id).is_some())
            .unwrap_or(false);
        if !known || self.store.active_chapter() == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.store.active_chapter() {
            self.autosave.flush(previous).await?;
        }
        self.activate(id).await
    }

    /// Make `id` active, lazily loading its tree. Does not flush; callers
    /// decide whether the outgoing chapter still has content worth saving.
    async fn activate(&self, id: ChapterId) -> Result<(), WorkspaceError> {
        let loaded = self
            .store
            .with_state(|s| s.chapter(id).map(|c| c.content.is_some()))
            .flatten()
            .unwrap_or(false);

        if !loaded {
            let path = self.store.project_path().ok_or(WorkspaceError::NoProject)?;
            let tree = self
                .persistence
                .load_chapter_content(&path, id)
                .await?
                .unwrap_or_else(Node::empty_document);
            self.store.set_chapter_content(id, tree);
        }

        self.store.set_active(Some(id));
        Ok(())
    }

    /// Append a new empty chapter and activate it
    pub async fn add_chapter(&self) -> Result<ChapterId, WorkspaceError> {
        if let Some(previous) = self.store.active_chapter() {
            self.autosave.flush(previous).await?;
        }

        let (id, title, path) = self
            .store
            .with_state(|s| {
                // max+1 over everything assigned this session, so ids of
                // deleted chapters are never handed out again
                let id = next_chapter_id(s.chapters.iter().map(|c| c.id).chain([s.max_assigned]));
                let used: HashSet<String> =
                    s.chapters.iter().map(|c| c.title.to_lowercase()).collect();
                let title = make_unique_title(&default_chapter_title(id), &used);
                (id, title, s.path.clone())
            })
            .ok_or(WorkspaceError::NoProject)?;

        let tree = Node::empty_document();
        self.store.insert_chapter(Chapter {
            id,
            title: title.clone(),
            content: Some(tree.clone()),
        });
        self.store.set_active(Some(id));

        self.persistence.save_chapter_content(&path, id, &tree).await?;
        self.persist_chapter_list(&path).await;

        Ok(id)
    }

    /// Rename a chapter, applying the unique-title rule. An empty trimmed
    /// title is a silent no-op (the surface simply leaves editing mode).
    pub async fn rename_chapter(&self, id: ChapterId, title: &str) -> Result<(), WorkspaceError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let renamed = self.store.with_state(|s| {
            s.chapter(id)?;
            let used: HashSet<String> = s
                .chapters
                .iter()
                .filter(|c| c.id != id)
                .map(|c| c.title.to_lowercase())
                .collect();
            Some((make_unique_title(trimmed, &used), s.path.clone()))
        });

        let Some(Some((unique, path))) = renamed else {
            return Ok(());
        };

        self.store.set_chapter_title(id, unique);
        self.persist_chapter_list(&path).await;
        Ok(())
    }

    /// Delete a chapter. When the active chapter is deleted, the adjacent
    /// remaining chapter is activated first (the one that shifts into the
    /// vacated index, else the new last), so the surface never shows a
    /// chapter that no longer exists.
    pub async fn delete_chapter(&self, id: ChapterId) -> Result<(), WorkspaceError> {
        let info = self.store.with_state(|s| {
            let index = s.chapters.iter().position(|c| c.id == id)?;
            let survivors: Vec<ChapterId> = s
                .chapters
                .iter()
                .map(|c| c.id)
                .filter(|&other| other != id)
                .collect();
            let next_active = if s.active_chapter == Some(id) {
                let clamped = index.min(survivors.len().saturating_sub(1));
                survivors.get(clamped).copied()
            } else {
                s.active_chapter
            };
            Some((next_active, s.path.clone()))
        });

        // Unknown id or no project: a no-op, not an error
        let Some(Some((next_active, path))) = info else {
            return Ok(());
        };

        if next_active != self.store.active_chapter() {
            match next_active {
                Some(next) => self.activate(next).await?,
                None => self.store.set_active(None),
            }
        }

        self.store.remove_chapter(id);

        self.persistence.delete_chapter_content(&path, id).await?;
        self.persist_chapter_list(&path).await;
        Ok(())
    }

    /// Apply a drag/drop reorder and persist the new order. Computing the
    /// order cannot fail; persisting it is a separate, logged side effect.
    pub async fn reorder_chapters(
        &self,
        dragged: ChapterId,
        target: ChapterId,
        position: DropPosition,
    ) -> Result<(), WorkspaceError> {
        let order = self
            .store
            .with_state(|s| s.project.chapter_order.clone())
            .ok_or(WorkspaceError::NoProject)?;

        let new_order = reorder(&order, dragged, target, position);
        if new_order == order {
            return Ok(());
        }

        self.store.set_order(new_order);
        if let Some(path) = self.store.project_path() {
            self.persist_chapter_list(&path).await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Record one transition from the editing surface: store the tree,
    /// mark the chapter dirty, schedule the debounced save, and return
    /// the decorations for the new state. Decorations are recomputed
    /// strictly after the transition has been applied to the store.
    pub fn apply_transition(&self, transition: &Transition) -> Result<DecorationSet, WorkspaceError> {
        let active = self.store.active_chapter().ok_or(WorkspaceError::NoProject)?;

        if transition.doc_changed {
            self.store.apply_content_change(active, transition.doc.clone());
            self.autosave.schedule_save(active);
        }

        let mut engine = self.decorations.lock().unwrap();
        Ok(engine.apply_transition(transition).clone())
    }

    /// Persist the active chapter immediately (chapter switch and close
    /// call this through flush; explicit "save now" lands here too)
    pub async fn save_now(&self, id: ChapterId) -> Result<(), WorkspaceError> {
        self.autosave.flush(id).await
    }

    pub fn decorations(&self) -> DecorationSet {
        self.decorations.lock().unwrap().decorations().clone()
    }

    /// Add a word to the dictionary and arm a decoration recompute for
    /// the next transition; the stored word lists are appended to, never
    /// reloaded wholesale.
    pub async fn add_exemption(
        &self,
        word: &str,
        scope: DictionaryScope,
    ) -> Result<bool, WorkspaceError> {
        let project_path = self.store.project_path();
        self.persistence
            .append_exemption_word(word, scope, project_path.as_deref())
            .await?;
        Ok(self.decorations.lock().unwrap().add_exemption(word))
    }

    // ------------------------------------------------------------------
    // Styles and page settings
    // ------------------------------------------------------------------

    /// Replace the style overrides; resolution happens in the store, the
    /// metadata persist is fire-and-forget.
    pub async fn update_styles(&self, overrides: ProjectStyles) -> Result<(), WorkspaceError> {
        let path = self.store.project_path().ok_or(WorkspaceError::NoProject)?;
        self.store.set_styles(overrides.clone());

        let patch = MetadataPatch {
            styles: Some(overrides),
            ..Default::default()
        };
        if let Err(error) = self.persistence.save_project_metadata(&path, &patch).await {
            tracing::error!(%error, "failed to persist style overrides");
        }
        Ok(())
    }

    /// Adopt the unanimous formatting of the selection into the override
    /// for the enclosing block key. Fields the selection disagrees on are
    /// left untouched.
    pub async fn update_style_from_selection(
        &self,
        from: usize,
        to: usize,
    ) -> Result<(), WorkspaceError> {
        let active = self.store.active_chapter().ok_or(WorkspaceError::NoProject)?;
        let Some(tree) = self.store.chapter_tree(active) else {
            return Ok(());
        };
        let Some((key, sampled)) = style_from_selection(&tree, from, to) else {
            return Ok(());
        };

        let mut overrides = self
            .store
            .with_state(|s| s.project.styles.clone().unwrap_or_default())
            .ok_or(WorkspaceError::NoProject)?;

        let mut def = overrides.get(key).cloned().unwrap_or_default();
        if let Some(size) = sampled.font_size {
            def.font_size = Some(size);
        }
        if let Some(family) = sampled.font_family {
            def.font_family = Some(family);
        }
        if let Some(bold) = sampled.bold {
            def.bold = Some(bold);
        }
        if let Some(italic) = sampled.italic {
            def.italic = Some(italic);
        }
        overrides.set(key, def);

        self.update_styles(overrides).await
    }

    /// Reset one block key to the built-in default
    pub async fn reset_style(&self, key: BlockKey) -> Result<(), WorkspaceError> {
        let mut overrides = self
            .store
            .with_state(|s| s.project.styles.clone().unwrap_or_default())
            .ok_or(WorkspaceError::NoProject)?;
        reset_key(&mut overrides, key);
        self.update_styles(overrides).await
    }

    pub async fn update_page_settings(&self, settings: PageSettings) -> Result<(), WorkspaceError> {
        let path = self.store.project_path().ok_or(WorkspaceError::NoProject)?;
        self.store.set_page_settings(settings.clone());

        let patch = MetadataPatch {
            page_settings: Some(settings),
            ..Default::default()
        };
        if let Err(error) = self.persistence.save_project_metadata(&path, &patch).await {
            tracing::error!(%error, "failed to persist page settings");
        }
        Ok(())
    }

    /// Update the app-wide font preference in the config record
    pub async fn set_app_font(&self, font_family: &str) -> Result<(), WorkspaceError> {
        let mut config = self.persistence.read_config().await.unwrap_or_default();
        config.font_family = Some(font_family.to_string());
        self.persistence.write_config(&config).await?;
        Ok(())
    }

    /// Update the project-level font preference
    pub async fn set_project_font(&self, font_family: &str) -> Result<(), WorkspaceError> {
        let path = self.store.project_path().ok_or(WorkspaceError::NoProject)?;
        self.store.set_project_font(Some(font_family.to_string()));

        let patch = MetadataPatch {
            font_family: Some(font_family.to_string()),
            ..Default::default()
        };
        if let Err(error) = self.persistence.save_project_metadata(&path, &patch).await {
            tracing::error!(%error, "failed to persist project font");
        }
        Ok(())
    }

    /// Remember where exports should land for this project
    pub async fn set_export_dir(&self, export_dir: &str) -> Result<(), WorkspaceError> {
        let path = self.store.project_path().ok_or(WorkspaceError::NoProject)?;
        self.store.set_export_dir(Some(export_dir.to_string()));

        let patch = MetadataPatch {
            export_dir: Some(export_dir.to_string()),
            ..Default::default()
        };
        if let Err(error) = self.persistence.save_project_metadata(&path, &patch).await {
            tracing::error!(%error, "failed to persist export directory");
        }
        Ok(())
    }

    /// Presentation rules for the current resolved styles
    pub fn stylesheet(&self) -> Option<String> {
        self.store.with_state(|s| build_stylesheet(&s.resolved_styles))
    }

    /// Pixel geometry plus the word-count page estimate for the active
    /// chapter
    pub fn page_geometry(&self) -> Option<(PageGeometry, u32)> {
        self.store.with_state(|s| {
            let geometry = PageGeometry::from_settings(&s.page_settings);
            let words = s
                .active_chapter
                .and_then(|id| s.chapter(id))
                .and_then(|c| c.content.as_ref())
                .map(|tree| tree.word_count())
                .unwrap_or(0);
            (geometry, estimate_pages(words))
        })
    }

    // ------------------------------------------------------------------

    /// Persist the chapter order and title map; errors are reported but
    /// never roll back the in-memory state.
    async fn persist_chapter_list(&self, path: &Path) {
        let patch = self.store.with_state(|s| {
            let chapter_titles: BTreeMap<String, String> = s
                .chapters
                .iter()
                .map(|c| (c.id.to_string(), c.title.clone()))
                .collect();
            MetadataPatch {
                chapter_order: Some(s.project.chapter_order.clone()),
                chapter_titles: Some(chapter_titles),
                ..Default::default()
            }
        });

        if let Some(patch) = patch {
            if let Err(error) = self.persistence.save_project_metadata(path, &patch).await {
                tracing::error!(%error, "failed to persist chapter list");
            }
        }
    }
}
