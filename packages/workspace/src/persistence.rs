//! Persisted project layout and the collaborator trait over it.
//!
//! One project is a directory:
//!
//! ```text
//! <project>/project.json            metadata record (merge-on-save)
//! <project>/chapters/<id>.json      one content tree per chapter
//! <project>/custom_dictionary.json  project-scoped exemption words
//! ```
//!
//! plus two app-level records in the configured app directory:
//! `config.json` (last project, font preference) and the global
//! `custom_dictionary.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use folio_model::{ChapterId, Node, PageSettings, Project, ProjectStyles};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

/// Which word list an exemption goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryScope {
    Global,
    Project,
}

/// App-level configuration record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub last_project_path: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
}

/// Partial project-metadata record. Only the populated fields are written;
/// everything else already in the stored record survives the save.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_order: Option<Vec<ChapterId>>,
    /// Chapter display titles keyed by stringified id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_titles: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<ProjectStyles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_settings: Option<PageSettings>,
}

/// Everything the workspace needs from storage. Implemented over the
/// filesystem in production and by an in-memory double in tests.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the metadata record plus the chapter-title map stored
    /// alongside it.
    async fn load_project_metadata(
        &self,
        path: &Path,
    ) -> Result<(Project, BTreeMap<ChapterId, String>), PersistenceError>;

    /// Merge the patch into the stored record without clobbering fields
    /// the patch does not carry.
    async fn save_project_metadata(
        &self,
        path: &Path,
        patch: &MetadataPatch,
    ) -> Result<(), PersistenceError>;

    async fn load_chapter_content(
        &self,
        path: &Path,
        id: ChapterId,
    ) -> Result<Option<Node>, PersistenceError>;

    async fn save_chapter_content(
        &self,
        path: &Path,
        id: ChapterId,
        tree: &Node,
    ) -> Result<(), PersistenceError>;

    async fn delete_chapter_content(&self, path: &Path, id: ChapterId)
        -> Result<(), PersistenceError>;

    /// Global and project word lists merged, sorted, deduplicated
    async fn load_exemption_words(
        &self,
        project_path: Option<&Path>,
    ) -> Result<Vec<String>, PersistenceError>;

    async fn append_exemption_word(
        &self,
        word: &str,
        scope: DictionaryScope,
        project_path: Option<&Path>,
    ) -> Result<(), PersistenceError>;

    async fn read_config(&self) -> Result<AppConfig, PersistenceError>;

    async fn write_config(&self, config: &AppConfig) -> Result<(), PersistenceError>;
}

/// Word-list record shape shared by both dictionary files
#[derive(Debug, Default, Serialize, Deserialize)]
struct WordList {
    #[serde(default)]
    words: Vec<String>,
}

/// Filesystem implementation of the persisted layout
pub struct FsPersistence {
    /// App-level directory holding config.json and the global dictionary
    config_dir: PathBuf,
}

impl FsPersistence {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    fn project_file(path: &Path) -> PathBuf {
        path.join("project.json")
    }

    fn chapter_file(path: &Path, id: ChapterId) -> PathBuf {
        path.join("chapters").join(format!("{}.json", id))
    }

    fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    fn dictionary_file(&self, scope: DictionaryScope, project_path: Option<&Path>) -> Option<PathBuf> {
        match scope {
            DictionaryScope::Global => Some(self.config_dir.join("custom_dictionary.json")),
            DictionaryScope::Project => {
                project_path.map(|p| p.join("custom_dictionary.json"))
            }
        }
    }

    fn read_record(file: &Path) -> Result<serde_json::Value, PersistenceError> {
        let content = fs::read_to_string(file)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_record(file: &Path, value: &impl Serialize) -> Result<(), PersistenceError> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn load_word_list(file: &Path) -> Result<Vec<String>, PersistenceError> {
        if !file.exists() {
            return Ok(Vec::new());
        }
        let list: WordList = serde_json::from_str(&fs::read_to_string(file)?)?;
        Ok(list.words)
    }
}

#[async_trait]
impl Persistence for FsPersistence {
    async fn load_project_metadata(
        &self,
        path: &Path,
    ) -> Result<(Project, BTreeMap<ChapterId, String>), PersistenceError> {
        let file = Self::project_file(path);
        if !file.exists() {
            return Err(PersistenceError::ProjectNotFound(path.to_path_buf()));
        }

        let record = Self::read_record(&file)?;
        let project: Project = serde_json::from_value(record.clone())?;

        let mut titles = BTreeMap::new();
        if let Some(map) = record.get("chapterTitles").and_then(|v| v.as_object()) {
            for (key, value) in map {
                if let (Ok(id), Some(title)) = (key.parse::<ChapterId>(), value.as_str()) {
                    titles.insert(id, title.to_string());
                }
            }
        }

        Ok((project, titles))
    }

    async fn save_project_metadata(
        &self,
        path: &Path,
        patch: &MetadataPatch,
    ) -> Result<(), PersistenceError> {
        let file = Self::project_file(path);

        // Read whatever is on disk so fields outside the patch survive
        let mut merged = if file.exists() {
            Self::read_record(&file).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        let patch_value = serde_json::to_value(patch)?;
        if let (Some(target), Some(source)) = (merged.as_object_mut(), patch_value.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        } else {
            merged = patch_value;
        }

        Self::write_record(&file, &merged)
    }

    async fn load_chapter_content(
        &self,
        path: &Path,
        id: ChapterId,
    ) -> Result<Option<Node>, PersistenceError> {
        let file = Self::chapter_file(path, id);
        if !file.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&file)?;
        match serde_json::from_str::<Node>(&content) {
            Ok(tree) => Ok(Some(tree)),
            Err(error) => {
                // A damaged record behaves like an empty chapter rather
                // than blocking the whole project from opening.
                tracing::warn!(chapter = id, %error, "unreadable chapter record");
                Ok(None)
            }
        }
    }

    async fn save_chapter_content(
        &self,
        path: &Path,
        id: ChapterId,
        tree: &Node,
    ) -> Result<(), PersistenceError> {
        tree.validate()?;
        Self::write_record(&Self::chapter_file(path, id), tree)
    }

    async fn delete_chapter_content(
        &self,
        path: &Path,
        id: ChapterId,
    ) -> Result<(), PersistenceError> {
        let file = Self::chapter_file(path, id);
        if file.exists() {
            fs::remove_file(&file)?;
        }
        Ok(())
    }

    async fn load_exemption_words(
        &self,
        project_path: Option<&Path>,
    ) -> Result<Vec<String>, PersistenceError> {
        let mut words = Vec::new();

        if let Some(file) = self.dictionary_file(DictionaryScope::Global, None) {
            words.extend(Self::load_word_list(&file)?);
        }
        if let Some(file) = self.dictionary_file(DictionaryScope::Project, project_path) {
            words.extend(Self::load_word_list(&file)?);
        }

        words.sort();
        words.dedup();
        Ok(words)
    }

    async fn append_exemption_word(
        &self,
        word: &str,
        scope: DictionaryScope,
        project_path: Option<&Path>,
    ) -> Result<(), PersistenceError> {
        let Some(file) = self.dictionary_file(scope, project_path) else {
            // Project scope without an open project: nowhere to write
            return Ok(());
        };

        let mut words = Self::load_word_list(&file)?;
        let lower = word.to_lowercase();
        if !words.iter().any(|w| w.to_lowercase() == lower) {
            words.push(word.to_string());
            words.sort();
        }

        Self::write_record(&file, &WordList { words })
    }

    async fn read_config(&self) -> Result<AppConfig, PersistenceError> {
        let file = self.config_file();
        if !file.exists() {
            return Ok(AppConfig::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(&file)?)?)
    }

    async fn write_config(&self, config: &AppConfig) -> Result<(), PersistenceError> {
        Self::write_record(&self.config_file(), config)
    }
}
