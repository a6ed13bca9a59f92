use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// The fixed set of block-type keys styles can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockKey {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "h2")]
    H2,
    #[serde(rename = "h3")]
    H3,
    #[serde(rename = "h4")]
    H4,
    #[serde(rename = "h5")]
    H5,
    #[serde(rename = "h6")]
    H6,
    #[serde(rename = "blockquote")]
    Blockquote,
}

impl BlockKey {
    pub const ALL: [BlockKey; 7] = [
        BlockKey::Paragraph,
        BlockKey::H2,
        BlockKey::H3,
        BlockKey::H4,
        BlockKey::H5,
        BlockKey::H6,
        BlockKey::Blockquote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKey::Paragraph => "paragraph",
            BlockKey::H2 => "h2",
            BlockKey::H3 => "h3",
            BlockKey::H4 => "h4",
            BlockKey::H5 => "h5",
            BlockKey::H6 => "h6",
            BlockKey::Blockquote => "blockquote",
        }
    }

    pub fn parse(key: &str) -> Option<BlockKey> {
        match key {
            "paragraph" => Some(BlockKey::Paragraph),
            "h2" => Some(BlockKey::H2),
            "h3" => Some(BlockKey::H3),
            "h4" => Some(BlockKey::H4),
            "h5" => Some(BlockKey::H5),
            "h6" => Some(BlockKey::H6),
            "blockquote" => Some(BlockKey::Blockquote),
            _ => None,
        }
    }

    /// Key for a heading level, if the level maps to one
    pub fn for_heading_level(level: u8) -> Option<BlockKey> {
        match level {
            2 => Some(BlockKey::H2),
            3 => Some(BlockKey::H3),
            4 => Some(BlockKey::H4),
            5 => Some(BlockKey::H5),
            6 => Some(BlockKey::H6),
            _ => None,
        }
    }
}

/// Sparse per-block style override. Absent fields fall back to the
/// built-in defaults at resolution time; resolution is per field, never
/// per key wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
}

impl StyleDefinition {
    pub fn is_empty(&self) -> bool {
        self.font_size.is_none()
            && self.font_family.is_none()
            && self.line_height.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
    }
}

/// Block-key → style-override mapping as persisted in the project record.
/// Unknown keys in a stored record are dropped on load rather than
/// rejected, so older or hand-edited records stay loadable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ProjectStyles(BTreeMap<BlockKey, StyleDefinition>);

impl ProjectStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: BlockKey) -> Option<&StyleDefinition> {
        self.0.get(&key)
    }

    pub fn set(&mut self, key: BlockKey, def: StyleDefinition) {
        self.0.insert(key, def);
    }

    pub fn remove(&mut self, key: BlockKey) -> Option<StyleDefinition> {
        self.0.remove(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockKey, &StyleDefinition)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

impl<'de> Deserialize<'de> for ProjectStyles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, StyleDefinition>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for (key, def) in raw {
            if let Some(key) = BlockKey::parse(&key) {
                map.insert(key, def);
            }
        }
        Ok(ProjectStyles(map))
    }
}

impl FromIterator<(BlockKey, StyleDefinition)> for ProjectStyles {
    fn from_iter<I: IntoIterator<Item = (BlockKey, StyleDefinition)>>(iter: I) -> Self {
        ProjectStyles(iter.into_iter().collect())
    }
}
