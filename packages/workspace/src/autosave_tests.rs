//! Autosave worker tests against a recording persistence double, driven
//! on a paused clock so the debounce window is deterministic.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use folio_model::{
    BlockAttrs, Chapter, ChapterId, Node, PageSettings, Project, ProjectStyles,
};

use crate::{
    AppConfig, Autosave, DictionaryScope, MetadataPatch, Persistence, PersistenceError,
    ProjectState, ProjectStore,
};

#[derive(Default)]
struct RecordingPersistence {
    saves: Mutex<Vec<(ChapterId, Node)>>,
    fail_saves: AtomicBool,
}

impl RecordingPersistence {
    fn saved(&self) -> Vec<(ChapterId, Node)> {
        self.saves.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Persistence for RecordingPersistence {
    async fn load_project_metadata(
        &self,
        _path: &Path,
    ) -> Result<(Project, BTreeMap<ChapterId, String>), PersistenceError> {
        Ok((Project::new("Test"), BTreeMap::new()))
    }

    async fn save_project_metadata(
        &self,
        _path: &Path,
        _patch: &MetadataPatch,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load_chapter_content(
        &self,
        _path: &Path,
        _id: ChapterId,
    ) -> Result<Option<Node>, PersistenceError> {
        Ok(None)
    }

    async fn save_chapter_content(
        &self,
        _path: &Path,
        id: ChapterId,
        tree: &Node,
    ) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk unavailable",
            )));
        }
        self.saves.lock().unwrap().push((id, tree.clone()));
        Ok(())
    }

    async fn delete_chapter_content(
        &self,
        _path: &Path,
        _id: ChapterId,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn load_exemption_words(
        &self,
        _project_path: Option<&Path>,
    ) -> Result<Vec<String>, PersistenceError> {
        Ok(Vec::new())
    }

    async fn append_exemption_word(
        &self,
        _word: &str,
        _scope: DictionaryScope,
        _project_path: Option<&Path>,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn read_config(&self) -> Result<AppConfig, PersistenceError> {
        Ok(AppConfig::default())
    }

    async fn write_config(&self, _config: &AppConfig) -> Result<(), PersistenceError> {
        Ok(())
    }
}

fn doc(text: &str) -> Node {
    Node::Doc {
        content: vec![Node::Paragraph {
            attrs: BlockAttrs::default(),
            content: vec![Node::Text {
                text: text.to_string(),
                marks: vec![],
            }],
        }],
    }
}

fn open_store_with_chapters(ids: &[ChapterId]) -> Arc<ProjectStore> {
    let store = Arc::new(ProjectStore::new());
    let chapters: Vec<Chapter> = ids
        .iter()
        .map(|&id| Chapter {
            id,
            title: format!("Chapter {}", id),
            content: Some(Node::empty_document()),
        })
        .collect();
    let mut project = Project::new("Test");
    project.chapter_order = ids.to_vec();
    store.open(ProjectState {
        path: PathBuf::from("/tmp/test-project"),
        project,
        chapters,
        active_chapter: ids.first().copied(),
        max_assigned: ids.iter().copied().max().unwrap_or(0),
        dirty: HashSet::new(),
        resolved_styles: folio_stylesheet::resolve(&ProjectStyles::new()),
        page_settings: PageSettings::default(),
    });
    store
}

const DEBOUNCE: Duration = Duration::from_millis(1000);

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_coalesce_into_one_save_with_final_content() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    for text in ["T", "Th", "The"] {
        store.apply_content_change(1, doc(text));
        autosave.schedule_save(1);
    }

    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
    // Flush synchronizes with the worker; the chapter is clean by now so
    // this adds no save.
    autosave.flush(1).await.unwrap();

    let saves = persistence.saved();
    assert_eq!(saves.len(), 1, "three edits inside the window, one persist");
    assert_eq!(saves[0].0, 1);
    assert_eq!(saves[0].1, doc("The"));
    assert!(!store.is_dirty(1));
}

#[tokio::test(start_paused = true)]
async fn test_new_edit_restarts_the_quiet_period() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    store.apply_content_change(1, doc("a"));
    autosave.schedule_save(1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    store.apply_content_change(1, doc("ab"));
    autosave.schedule_save(1);

    // 1.2s after the first edit, but only 0.6s after the second: the
    // reset deadline has not elapsed yet.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(persistence.saved().is_empty());
    assert!(store.is_dirty(1));

    tokio::time::sleep(Duration::from_millis(500)).await;
    autosave.flush(1).await.unwrap();
    assert_eq!(persistence.saved().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chapter_switch_flushes_pre_switch_content() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1, 2]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    store.apply_content_change(1, doc("chapter one text"));
    autosave.schedule_save(1);

    // Switch before the timer fires: immediate flush of the old chapter.
    autosave.flush(1).await.unwrap();
    assert_eq!(persistence.saved(), vec![(1, doc("chapter one text"))]);
    assert!(!store.is_dirty(1));

    store.set_active(Some(2));
    store.apply_content_change(2, doc("chapter two text"));
    autosave.schedule_save(2);
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
    autosave.flush(2).await.unwrap();

    // No save ever pairs one chapter's id with the other's tree.
    let saves = persistence.saved();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0], (1, doc("chapter one text")));
    assert_eq!(saves[1], (2, doc("chapter two text")));
}

#[tokio::test(start_paused = true)]
async fn test_flush_on_clean_chapter_is_a_noop() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    autosave.flush(1).await.unwrap();
    assert!(persistence.saved().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_leaves_dirty_flag_and_flush_retries() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    persistence.set_failing(true);
    store.apply_content_change(1, doc("unsaved"));
    autosave.schedule_save(1);
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;

    // The timer fired, the save failed, nothing was recorded and the
    // chapter is still dirty.
    assert!(persistence.saved().is_empty());
    assert!(store.is_dirty(1));

    // An explicit flush surfaces the failure to the caller.
    persistence.set_failing(true);
    assert!(autosave.flush(1).await.is_err());
    assert!(store.is_dirty(1));

    // Once storage recovers, the retry persists and clears the flag.
    persistence.set_failing(false);
    autosave.flush(1).await.unwrap();
    assert_eq!(persistence.saved(), vec![(1, doc("unsaved"))]);
    assert!(!store.is_dirty(1));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_work() {
    let persistence = Arc::new(RecordingPersistence::default());
    let store = open_store_with_chapters(&[1]);
    let autosave = Autosave::spawn(store.clone(), persistence.clone(), DEBOUNCE);

    store.apply_content_change(1, doc("last words"));
    autosave.schedule_save(1);

    autosave.shutdown().await.unwrap();
    assert_eq!(persistence.saved(), vec![(1, doc("last words"))]);

    // The worker is gone afterwards.
    assert!(autosave.flush(1).await.is_err());
}
