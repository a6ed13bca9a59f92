//! Style sampling over a text selection.
//!
//! "Update style from selection" reads formatting off the selected text and
//! turns it into a per-block style override. A field is adopted only when
//! every touched leaf agrees on its value; disagreeing fields are left out
//! of the override entirely, without feedback. This is the safe-merge behavior the
//! surface relies on.

use folio_model::{BlockKey, Mark, Node, StyleDefinition};

#[derive(Debug)]
struct LeafSample {
    from: usize,
    to: usize,
    key: BlockKey,
    bold: bool,
    italic: bool,
    font_size: Option<f64>,
    font_family: Option<String>,
}

#[derive(Debug)]
struct BlockRange {
    from: usize,
    to: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct BlockContext {
    heading: Option<BlockKey>,
    in_blockquote: bool,
}

impl BlockContext {
    fn leaf_key(&self) -> BlockKey {
        if let Some(key) = self.heading {
            key
        } else if self.in_blockquote {
            BlockKey::Blockquote
        } else {
            BlockKey::Paragraph
        }
    }
}

/// Derive a style override from the formatting of the text in
/// `[from, to)`, in the position scheme of [`Node::for_each_text`].
///
/// An empty range expands to the enclosing block first. Returns the block
/// key the override targets (from the block containing the range start)
/// and the unanimous fields; None when the range touches no text.
pub fn style_from_selection(doc: &Node, from: usize, to: usize) -> Option<(BlockKey, StyleDefinition)> {
    let mut leaves = Vec::new();
    let mut blocks = Vec::new();
    if let Some(children) = doc.children() {
        let mut pos = 0;
        for child in children {
            pos = visit(child, pos, BlockContext::default(), &mut leaves, &mut blocks);
        }
    }

    let (from, to) = if from == to {
        // Innermost block containing the caret: the latest-starting range
        let block = blocks
            .iter()
            .filter(|b| b.from <= from && from < b.to)
            .max_by_key(|b| b.from)?;
        (block.from, block.to)
    } else {
        (from, to)
    };

    let touched: Vec<&LeafSample> = leaves
        .iter()
        .filter(|leaf| leaf.from < to && leaf.to > from)
        .collect();
    let first = touched.first()?;

    let mut def = StyleDefinition::default();
    if touched.iter().all(|l| l.bold == first.bold) {
        def.bold = Some(first.bold);
    }
    if touched.iter().all(|l| l.italic == first.italic) {
        def.italic = Some(first.italic);
    }
    if touched.iter().all(|l| l.font_size == first.font_size) {
        def.font_size = first.font_size;
    }
    if touched.iter().all(|l| l.font_family == first.font_family) {
        def.font_family = first.font_family.clone();
    }

    Some((first.key, def))
}

fn visit(
    node: &Node,
    pos: usize,
    ctx: BlockContext,
    leaves: &mut Vec<LeafSample>,
    blocks: &mut Vec<BlockRange>,
) -> usize {
    match node {
        Node::Text { text, marks } => {
            let len = text.chars().count();
            let mut sample = LeafSample {
                from: pos,
                to: pos + len,
                key: ctx.leaf_key(),
                bold: false,
                italic: false,
                font_size: None,
                font_family: None,
            };
            for mark in marks {
                match mark {
                    Mark::Bold => sample.bold = true,
                    Mark::Italic => sample.italic = true,
                    Mark::TextStyle { attrs } => {
                        sample.font_size = attrs.font_size;
                        sample.font_family = attrs.font_family.clone();
                    }
                    Mark::Strike => {}
                }
            }
            leaves.push(sample);
            pos + len
        }
        _ => {
            let mut ctx = ctx;
            match node {
                Node::Heading { attrs, .. } => {
                    ctx.heading = BlockKey::for_heading_level(attrs.level);
                }
                Node::Blockquote { .. } => ctx.in_blockquote = true,
                _ => {}
            }
            match node.children() {
                Some(children) => {
                    let start = pos;
                    let mut p = pos + 1;
                    for child in children {
                        p = visit(child, p, ctx, leaves, blocks);
                    }
                    let end = p + 1;
                    blocks.push(BlockRange { from: start, to: end });
                    end
                }
                None => pos + 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{BlockAttrs, HeadingAttrs, TextStyleAttrs};

    fn text(s: &str, marks: Vec<Mark>) -> Node {
        Node::Text {
            text: s.to_string(),
            marks,
        }
    }

    fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph {
            attrs: BlockAttrs::default(),
            content: children,
        }
    }

    #[test]
    fn test_non_unanimous_bold_is_not_adopted() {
        // Two leaves in one paragraph: "bold" (1..5) and "plain" (5..10)
        let doc = Node::Doc {
            content: vec![paragraph(vec![
                text("bold", vec![Mark::Bold]),
                text("plain", vec![]),
            ])],
        };

        let (key, def) = style_from_selection(&doc, 1, 10).unwrap();
        assert_eq!(key, BlockKey::Paragraph);
        assert_eq!(def.bold, None);
        // Italic is unanimously absent, which reads as "not italic"
        assert_eq!(def.italic, Some(false));
    }

    #[test]
    fn test_unanimous_fields_are_adopted() {
        let style = Mark::TextStyle {
            attrs: TextStyleAttrs {
                font_size: Some(14.0),
                font_family: Some("Courier".to_string()),
            },
        };
        let doc = Node::Doc {
            content: vec![paragraph(vec![
                text("one ", vec![Mark::Bold, style.clone()]),
                text("two", vec![Mark::Bold, style]),
            ])],
        };

        let (_, def) = style_from_selection(&doc, 1, 8).unwrap();
        assert_eq!(def.bold, Some(true));
        assert_eq!(def.font_size, Some(14.0));
        assert_eq!(def.font_family.as_deref(), Some("Courier"));
    }

    #[test]
    fn test_empty_range_expands_to_enclosing_block() {
        let doc = Node::Doc {
            content: vec![
                paragraph(vec![text("first", vec![])]),
                paragraph(vec![text("second", vec![Mark::Italic])]),
            ],
        };

        // Caret inside the second paragraph (positions 8..15)
        let (key, def) = style_from_selection(&doc, 10, 10).unwrap();
        assert_eq!(key, BlockKey::Paragraph);
        assert_eq!(def.italic, Some(true));
    }

    #[test]
    fn test_heading_selection_targets_heading_key() {
        let doc = Node::Doc {
            content: vec![Node::Heading {
                attrs: HeadingAttrs {
                    level: 3,
                    text_align: None,
                },
                content: vec![text("Title", vec![Mark::Bold])],
            }],
        };

        let (key, def) = style_from_selection(&doc, 1, 6).unwrap();
        assert_eq!(key, BlockKey::H3);
        assert_eq!(def.bold, Some(true));
    }

    #[test]
    fn test_range_touching_no_text_is_none() {
        let doc = Node::Doc {
            content: vec![paragraph(vec![text("hi", vec![])])],
        };
        assert!(style_from_selection(&doc, 40, 50).is_none());
    }
}
