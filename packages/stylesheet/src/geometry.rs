//! Page geometry: pixel dimensions for the manuscript view plus the
//! word-count page estimate. Advisory only; no line breaking or real
//! pagination happens here.

use folio_model::{PageSettings, PaperSize};
use serde::Serialize;

/// Fixed rendering resolution, pixels per inch
pub const DPI: f64 = 96.0;

/// Manuscript-convention words per page for the estimate
pub const WORDS_PER_PAGE: usize = 250;

/// Pixel geometry derived from page settings at [`DPI`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub margin_right: u32,
}

fn paper_pixels(size: PaperSize) -> (u32, u32) {
    // Canonical sheet sizes at 96 px/in
    match size {
        PaperSize::Letter => (816, 1056),
        PaperSize::Legal => (816, 1344),
        PaperSize::A4 => (794, 1123),
        PaperSize::A5 => (559, 794),
    }
}

fn inches_to_px(inches: f64) -> u32 {
    (inches * DPI).round() as u32
}

impl PageGeometry {
    pub fn from_settings(settings: &PageSettings) -> Self {
        let (page_width, page_height) = paper_pixels(settings.paper_size);
        Self {
            page_width,
            page_height,
            margin_top: inches_to_px(settings.margin_top),
            margin_bottom: inches_to_px(settings.margin_bottom),
            margin_left: inches_to_px(settings.margin_left),
            margin_right: inches_to_px(settings.margin_right),
        }
    }

    /// Horizontal space left for text
    pub fn content_width(&self) -> u32 {
        self.page_width.saturating_sub(self.margin_left + self.margin_right)
    }
}

/// `max(1, ceil(word_count / 250))`; every document is at least one page
pub fn estimate_pages(word_count: usize) -> u32 {
    (word_count.div_ceil(WORDS_PER_PAGE)).max(1) as u32
}
