use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Node, PageSettings, ProjectStyles};

/// Chapter identifier, unique within a project. Assigned `max(existing)+1`
/// and never reused within a session; gaps left by deletions are preserved
/// across reloads.
pub type ChapterId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    /// Content tree; None until first load or save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Node>,
}

/// Project metadata as persisted in the project record. The chapter-title
/// map lives alongside this in the same record but is handled by the
/// persistence layer so partial saves never clobber it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub chapter_order: Vec<ChapterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<ProjectStyles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_settings: Option<PageSettings>,
}

impl Project {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: String::new(),
            chapter_order: Vec::new(),
            font_family: None,
            export_dir: None,
            styles: None,
            page_settings: None,
        }
    }
}

/// Default display title for a chapter id
pub fn default_chapter_title(id: ChapterId) -> String {
    format!("Chapter {}", id)
}

/// Next free chapter id: `max(existing)+1`, or 1 for an empty project.
/// Ids of deleted chapters are not reclaimed.
pub fn next_chapter_id<I>(existing: I) -> ChapterId
where
    I: IntoIterator<Item = ChapterId>,
{
    existing.into_iter().max().map_or(1, |max| max + 1)
}

/// Return a title not already in `used_titles`, appending " (1)", " (2)", …
/// as needed. Comparison is case-insensitive; the set stores lowercased
/// titles.
pub fn make_unique_title(title: &str, used_titles: &HashSet<String>) -> String {
    if !used_titles.contains(&title.to_lowercase()) {
        return title.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{} ({})", title, n);
        if !used_titles.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_title_passthrough() {
        let used = HashSet::new();
        assert_eq!(make_unique_title("Chapter 1", &used), "Chapter 1");
    }

    #[test]
    fn test_unique_title_case_insensitive_collision() {
        let used: HashSet<String> = ["chapter 1".to_string()].into_iter().collect();
        assert_eq!(make_unique_title("Chapter 1", &used), "Chapter 1 (1)");
    }

    #[test]
    fn test_unique_title_increments_suffix() {
        let used: HashSet<String> = ["chapter 1".to_string(), "chapter 1 (1)".to_string()]
            .into_iter()
            .collect();
        assert_eq!(make_unique_title("Chapter 1", &used), "Chapter 1 (2)");
    }

    #[test]
    fn test_next_chapter_id_starts_at_one() {
        assert_eq!(next_chapter_id([]), 1);
    }

    #[test]
    fn test_next_chapter_id_preserves_gaps() {
        // Chapters 1,3 after deleting 2: next id is 4, never a reused 2.
        assert_eq!(next_chapter_id([1, 3]), 4);
    }

    #[test]
    fn test_project_record_wire_names() {
        let mut project = Project::new("Draft");
        project.chapter_order = vec![1, 2];
        project.font_family = Some("Georgia".to_string());

        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["chapterOrder"], serde_json::json!([1, 2]));
        assert_eq!(value["fontFamily"], "Georgia");
        // Absent optionals stay absent so record merges don't clobber them.
        assert!(value.get("exportDir").is_none());
        assert!(value.get("pageSettings").is_none());
    }
}
