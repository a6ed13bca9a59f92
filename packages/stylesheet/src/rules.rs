//! Rendering resolved styles into presentation rules for the manuscript
//! view.

use folio_model::{BlockKey, ProjectStyles};

/// Fixed block-key → selector table for the editing surface
pub fn selector_for(key: BlockKey) -> &'static str {
    match key {
        BlockKey::Paragraph => ".editor-page p",
        BlockKey::H2 => ".editor-page h2",
        BlockKey::H3 => ".editor-page h3",
        BlockKey::H4 => ".editor-page h4",
        BlockKey::H5 => ".editor-page h5",
        BlockKey::H6 => ".editor-page h6",
        BlockKey::Blockquote => ".editor-page blockquote",
    }
}

/// Render one rule per key, emitting only the properties the definition
/// actually carries. A key with no meaningful properties emits no rule, so
/// feeding sparse overrides straight in also works.
pub fn build_stylesheet(styles: &ProjectStyles) -> String {
    let mut css = String::new();

    for key in BlockKey::ALL {
        let Some(def) = styles.get(key) else { continue };

        let mut props = Vec::new();
        if let Some(size) = def.font_size {
            props.push(format!("font-size: {}pt", size));
        }
        if let Some(family) = &def.font_family {
            props.push(format!("font-family: {}", family));
        }
        if let Some(line_height) = def.line_height {
            props.push(format!("line-height: {}", line_height));
        }
        if let Some(bold) = def.bold {
            props.push(format!("font-weight: {}", if bold { "bold" } else { "normal" }));
        }
        if let Some(italic) = def.italic {
            props.push(format!("font-style: {}", if italic { "italic" } else { "normal" }));
        }

        if props.is_empty() {
            continue;
        }

        css.push_str(selector_for(key));
        css.push_str(" {\n");
        for prop in props {
            css.push_str("  ");
            css.push_str(&prop);
            css.push_str(";\n");
        }
        css.push_str("}\n");
    }

    css
}
