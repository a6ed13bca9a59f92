use thiserror::Error;

/// Structural violations in a content tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Document root must be a doc node, found: {0}")]
    InvalidRoot(String),

    #[error("Heading level out of range (2-6): {0}")]
    InvalidHeadingLevel(u8),

    #[error("Bleed block may not nest inside another bleed block")]
    NestedBleed,
}
