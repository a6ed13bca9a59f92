use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    #[serde(rename = "letter")]
    Letter,
    #[serde(rename = "legal")]
    Legal,
    #[serde(rename = "a4")]
    A4,
    #[serde(rename = "a5")]
    A5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberPosition {
    #[serde(rename = "bottomCenter")]
    BottomCenter,
    #[serde(rename = "bottomRight")]
    BottomRight,
    #[serde(rename = "topRight")]
    TopRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParagraphAlignment {
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "justify")]
    Justify,
}

/// Page setup for the manuscript view. A project record may override any
/// subset of fields; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub paper_size: PaperSize,
    /// Margins in inches
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub page_numbering: bool,
    pub first_number: u32,
    pub number_position: NumberPosition,
    /// Paragraph first-line indent in inches
    pub first_line_indent: f64,
    /// Spacing between paragraphs in points
    pub paragraph_spacing: f64,
    pub alignment: ParagraphAlignment,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::Letter,
            margin_top: 1.0,
            margin_bottom: 1.0,
            margin_left: 1.0,
            margin_right: 1.0,
            page_numbering: true,
            first_number: 1,
            number_position: NumberPosition::BottomCenter,
            first_line_indent: 0.5,
            paragraph_spacing: 0.0,
            alignment: ParagraphAlignment::Left,
        }
    }
}
