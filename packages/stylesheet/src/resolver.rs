//! Style cascade resolution: per-field merge of project overrides onto the
//! built-in defaults.

use folio_model::{BlockKey, ProjectStyles, StyleDefinition};

const DEFAULT_FAMILY: &str = "Georgia";

/// The built-in, fully-populated definition for a block key. Overrides
/// cascade onto these; reset restores exactly these.
pub fn builtin_default(key: BlockKey) -> StyleDefinition {
    let (font_size, line_height, bold, italic) = match key {
        BlockKey::Paragraph => (12.0, 1.5, false, false),
        BlockKey::H2 => (22.0, 1.3, true, false),
        BlockKey::H3 => (18.0, 1.3, true, false),
        BlockKey::H4 => (16.0, 1.3, true, false),
        BlockKey::H5 => (14.0, 1.3, true, false),
        BlockKey::H6 => (13.0, 1.3, true, false),
        BlockKey::Blockquote => (12.0, 1.5, false, true),
    };
    StyleDefinition {
        font_size: Some(font_size),
        font_family: Some(DEFAULT_FAMILY.to_string()),
        line_height: Some(line_height),
        bold: Some(bold),
        italic: Some(italic),
    }
}

/// Resolve sparse overrides into a complete definition for every fixed
/// block key. The merge is per field: a key's override replaces only the
/// fields it actually carries, never the whole definition.
pub fn resolve(overrides: &ProjectStyles) -> ProjectStyles {
    BlockKey::ALL
        .iter()
        .map(|&key| {
            let mut def = builtin_default(key);
            if let Some(over) = overrides.get(key) {
                if let Some(size) = over.font_size {
                    def.font_size = Some(size);
                }
                if let Some(family) = &over.font_family {
                    def.font_family = Some(family.clone());
                }
                if let Some(line_height) = over.line_height {
                    def.line_height = Some(line_height);
                }
                if let Some(bold) = over.bold {
                    def.bold = Some(bold);
                }
                if let Some(italic) = over.italic {
                    def.italic = Some(italic);
                }
            }
            (key, def)
        })
        .collect()
}

/// Reset one key to exactly its built-in default (fully populated, not
/// empty), leaving every other key's override alone.
pub fn reset_key(overrides: &mut ProjectStyles, key: BlockKey) {
    overrides.set(key, builtin_default(key));
}
