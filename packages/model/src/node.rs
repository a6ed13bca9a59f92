use serde::{Deserialize, Serialize};

use crate::ModelError;

/// One node of a chapter's content tree.
///
/// The wire shape matches what the editing surface produces and what the
/// chapter records store on disk: `{"type": "paragraph", "content": [...]}`
/// for blocks, `{"type": "text", "text": "...", "marks": [...]}` for leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// Root node. A valid chapter tree is always rooted here.
    #[serde(rename = "doc")]
    Doc {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    #[serde(rename = "paragraph")]
    Paragraph {
        #[serde(default, skip_serializing_if = "BlockAttrs::is_empty")]
        attrs: BlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    /// Section heading; levels 2-6 only (level 1 is reserved for the
    /// chapter title rendered outside the tree).
    #[serde(rename = "heading")]
    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    #[serde(rename = "blockquote")]
    Blockquote {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    #[serde(rename = "bulletList")]
    BulletList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    #[serde(rename = "orderedList")]
    OrderedList {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    #[serde(rename = "listItem")]
    ListItem {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    /// Full-bleed tinted section. May not nest inside itself.
    #[serde(rename = "colorBleed")]
    ColorBleed {
        #[serde(default)]
        attrs: ColorBleedAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },

    /// Full-bleed image; leaf node referencing a project asset by name.
    #[serde(rename = "imageBleed")]
    ImageBleed { attrs: ImageAttrs },

    #[serde(rename = "horizontalRule")]
    HorizontalRule,

    #[serde(rename = "hardBreak")]
    HardBreak,

    /// Text leaf with formatting marks.
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockAttrs {
    #[serde(rename = "textAlign", default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

impl BlockAttrs {
    pub fn is_empty(&self) -> bool {
        self.text_align.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
    #[serde(rename = "textAlign", default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorBleedAttrs {
    #[serde(rename = "backgroundColor", default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(rename = "textColor", default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageAttrs {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Formatting mark on a text leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mark {
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "italic")]
    Italic,
    #[serde(rename = "strike")]
    Strike,
    #[serde(rename = "textStyle")]
    TextStyle {
        #[serde(default)]
        attrs: TextStyleAttrs,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyleAttrs {
    #[serde(rename = "fontSize", default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(rename = "fontFamily", default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

/// A text leaf located in document coordinates.
///
/// `from` is the position of the leaf's first character. Positions count 1
/// per character inside a text leaf, 1 for entering and 1 for leaving any
/// non-leaf node, and 1 for a non-text leaf; the root's content starts at 0.
/// These are the same coordinates the editing surface reports selections in.
#[derive(Debug, Clone, Copy)]
pub struct TextSpan<'a> {
    pub text: &'a str,
    pub marks: &'a [Mark],
    pub from: usize,
}

impl<'a> TextSpan<'a> {
    /// Position one past the leaf's last character
    pub fn to(&self) -> usize {
        self.from + self.text.chars().count()
    }
}

impl Node {
    /// The empty chapter tree: a doc holding one empty paragraph
    pub fn empty_document() -> Node {
        Node::Doc {
            content: vec![Node::Paragraph {
                attrs: BlockAttrs::default(),
                content: vec![],
            }],
        }
    }

    /// Node type tag as persisted
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Doc { .. } => "doc",
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::Blockquote { .. } => "blockquote",
            Node::BulletList { .. } => "bulletList",
            Node::OrderedList { .. } => "orderedList",
            Node::ListItem { .. } => "listItem",
            Node::ColorBleed { .. } => "colorBleed",
            Node::ImageBleed { .. } => "imageBleed",
            Node::HorizontalRule => "horizontalRule",
            Node::HardBreak => "hardBreak",
            Node::Text { .. } => "text",
        }
    }

    /// Child nodes, or None for leaves
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::Blockquote { content }
            | Node::BulletList { content }
            | Node::OrderedList { content }
            | Node::ListItem { content }
            | Node::ColorBleed { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::Blockquote { content }
            | Node::BulletList { content }
            | Node::OrderedList { content }
            | Node::ListItem { content }
            | Node::ColorBleed { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Validate structural invariants: doc root, heading levels 2-6,
    /// no bleed-inside-bleed.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !matches!(self, Node::Doc { .. }) {
            return Err(ModelError::InvalidRoot(self.kind().to_string()));
        }
        validate_node(self, false)
    }

    /// Visit every text leaf exactly once, in document order, with its
    /// absolute start position.
    pub fn for_each_text<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(TextSpan<'a>),
    {
        if let Some(children) = self.children() {
            let mut pos = 0;
            for child in children {
                pos = visit_text(child, pos, &mut f);
            }
        }
    }

    /// Concatenated leaf text with block boundaries collapsed to single
    /// spaces. Input to word counting; not a faithful rendering.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Whitespace-separated token count over the whole tree
    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }
}

fn validate_node(node: &Node, inside_bleed: bool) -> Result<(), ModelError> {
    match node {
        Node::Heading { attrs, .. } if !(2..=6).contains(&attrs.level) => {
            return Err(ModelError::InvalidHeadingLevel(attrs.level));
        }
        Node::ColorBleed { .. } if inside_bleed => {
            return Err(ModelError::NestedBleed);
        }
        _ => {}
    }

    let entering_bleed = matches!(node, Node::ColorBleed { .. });
    if let Some(children) = node.children() {
        for child in children {
            validate_node(child, inside_bleed || entering_bleed)?;
        }
    }
    Ok(())
}

fn visit_text<'a, F>(node: &'a Node, pos: usize, f: &mut F) -> usize
where
    F: FnMut(TextSpan<'a>),
{
    match node {
        Node::Text { text, marks } => {
            f(TextSpan {
                text,
                marks,
                from: pos,
            });
            pos + text.chars().count()
        }
        _ => match node.children() {
            Some(children) => {
                let mut p = pos + 1;
                for child in children {
                    p = visit_text(child, p, f);
                }
                p + 1
            }
            None => pos + 1,
        },
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { text, .. } => out.push_str(text),
        Node::HardBreak => out.push(' '),
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    collect_text(child, out);
                }
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text {
            text: s.to_string(),
            marks: vec![],
        }
    }

    fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph {
            attrs: BlockAttrs::default(),
            content: children,
        }
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let json = serde_json::json!({
            "type": "doc",
            "content": [
                {
                    "type": "paragraph",
                    "content": [
                        { "type": "text", "text": "Hello ", "marks": [{ "type": "bold" }] },
                        { "type": "text", "text": "world" }
                    ]
                },
                {
                    "type": "heading",
                    "attrs": { "level": 2 },
                    "content": [{ "type": "text", "text": "Part One" }]
                }
            ]
        });

        let doc: Node = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(doc.children().unwrap().len(), 2);

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_text_style_mark_attrs() {
        let json = serde_json::json!({
            "type": "text",
            "text": "styled",
            "marks": [{ "type": "textStyle", "attrs": { "fontSize": 14.0, "fontFamily": "Courier" } }]
        });
        let node: Node = serde_json::from_value(json).unwrap();
        match node {
            Node::Text { marks, .. } => match &marks[0] {
                Mark::TextStyle { attrs } => {
                    assert_eq!(attrs.font_size, Some(14.0));
                    assert_eq!(attrs.font_family.as_deref(), Some("Courier"));
                }
                other => panic!("unexpected mark: {:?}", other),
            },
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_empty_document() {
        assert!(Node::empty_document().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_doc_root() {
        let err = paragraph(vec![]).validate().unwrap_err();
        assert_eq!(err, ModelError::InvalidRoot("paragraph".to_string()));
    }

    #[test]
    fn test_validate_rejects_heading_level_out_of_range() {
        for level in [0u8, 1, 7] {
            let doc = Node::Doc {
                content: vec![Node::Heading {
                    attrs: HeadingAttrs {
                        level,
                        text_align: None,
                    },
                    content: vec![],
                }],
            };
            assert_eq!(
                doc.validate().unwrap_err(),
                ModelError::InvalidHeadingLevel(level)
            );
        }
    }

    #[test]
    fn test_validate_rejects_nested_bleed() {
        let doc = Node::Doc {
            content: vec![Node::ColorBleed {
                attrs: ColorBleedAttrs::default(),
                content: vec![paragraph(vec![]), Node::ColorBleed {
                    attrs: ColorBleedAttrs::default(),
                    content: vec![],
                }],
            }],
        };
        assert_eq!(doc.validate().unwrap_err(), ModelError::NestedBleed);
    }

    #[test]
    fn test_text_positions_first_paragraph_starts_at_one() {
        let doc = Node::Doc {
            content: vec![
                paragraph(vec![text("hello "), text("world")]),
                paragraph(vec![text("again")]),
            ],
        };

        let mut spans = Vec::new();
        doc.for_each_text(|s| spans.push((s.from, s.to(), s.text.to_string())));

        // First paragraph opens at 0, its text starts at 1.
        assert_eq!(spans[0], (1, 7, "hello ".to_string()));
        assert_eq!(spans[1], (7, 12, "world".to_string()));
        // First paragraph closes at 12..13; second opens, text starts at 14.
        assert_eq!(spans[2], (14, 19, "again".to_string()));
    }

    #[test]
    fn test_text_positions_count_characters_not_bytes() {
        let doc = Node::Doc {
            content: vec![paragraph(vec![text("héllo"), text("x")])],
        };
        let mut spans = Vec::new();
        doc.for_each_text(|s| spans.push((s.from, s.to())));
        assert_eq!(spans, vec![(1, 6), (6, 7)]);
    }

    #[test]
    fn test_word_count_separates_blocks() {
        let doc = Node::Doc {
            content: vec![paragraph(vec![text("one two")]), paragraph(vec![text("three")])],
        };
        assert_eq!(doc.word_count(), 3);
        assert_eq!(Node::empty_document().word_count(), 0);
    }

    #[test]
    fn test_empty_content_deserializes() {
        let json = serde_json::json!({ "type": "paragraph" });
        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(node.children().unwrap().len(), 0);
    }
}
