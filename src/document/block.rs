//! Block-level elements of the source flow

use serde::{Deserialize, Serialize};

/// The kind of block element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    /// Regular paragraph
    #[default]
    Paragraph,
    /// Any other element; always splittable
    Other,
}

impl BlockKind {
    /// Classify an element by tag name (case-insensitive)
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "h1" => BlockKind::Heading1,
            "h2" => BlockKind::Heading2,
            "h3" => BlockKind::Heading3,
            "h4" => BlockKind::Heading4,
            "p" => BlockKind::Paragraph,
            _ => BlockKind::Other,
        }
    }

    /// Heading level (1-4), if this is a heading
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            BlockKind::Heading4 => Some(4),
            BlockKind::Paragraph | BlockKind::Other => None,
        }
    }

    /// Check if this is a heading.
    ///
    /// Headings are indivisible: they are never split across pages.
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Whether the paginator may cut this block at a line boundary
    pub fn is_splittable(&self) -> bool {
        !self.is_heading()
    }

    /// Font size multiplier relative to the base font
    pub fn font_scale(&self) -> f64 {
        match self {
            BlockKind::Heading1 => 1.5,
            BlockKind::Heading2 => 1.4,
            BlockKind::Heading3 => 1.3,
            BlockKind::Heading4 => 1.2,
            BlockKind::Paragraph | BlockKind::Other => 1.0,
        }
    }

    /// Spacing after this block, in ems of the base font
    pub fn spacing_after(&self) -> f64 {
        match self {
            BlockKind::Paragraph => 1.0,
            BlockKind::Other => 0.75,
            _ => 0.5,
        }
    }
}

/// Inline rich content of a block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MarkupFragment {
    /// Outer markup exactly as it appeared in the source
    pub markup: String,
    /// Plain text used for measurement; `\n` marks a hard break
    pub text: String,
}

impl MarkupFragment {
    pub fn new(markup: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            text: text.into(),
        }
    }
}

/// A structural unit of the source document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub kind: BlockKind,
    pub content: MarkupFragment,
}

impl Block {
    pub fn new(kind: BlockKind, content: MarkupFragment) -> Self {
        Self { kind, content }
    }

    /// Build a block from plain text, synthesizing its markup
    pub fn from_text(kind: BlockKind, text: &str) -> Self {
        let tag = match kind {
            BlockKind::Heading1 => "h1",
            BlockKind::Heading2 => "h2",
            BlockKind::Heading3 => "h3",
            BlockKind::Heading4 => "h4",
            BlockKind::Paragraph => "p",
            BlockKind::Other => "div",
        };
        let escaped = quick_xml::escape::escape(text).replace('\n', "<br/>");
        Self::new(
            kind,
            MarkupFragment::new(format!("<{tag}>{escaped}</{tag}>"), text),
        )
    }

    pub fn paragraph(text: &str) -> Self {
        Self::from_text(BlockKind::Paragraph, text)
    }

    /// Create a heading block; levels outside 1-4 are clamped
    pub fn heading(level: u8, text: &str) -> Self {
        let kind = match level.clamp(1, 4) {
            1 => BlockKind::Heading1,
            2 => BlockKind::Heading2,
            3 => BlockKind::Heading3,
            _ => BlockKind::Heading4,
        };
        Self::from_text(kind, text)
    }

    pub fn markup(&self) -> &str {
        &self.content.markup
    }

    pub fn text(&self) -> &str {
        &self.content.text
    }

    pub fn is_heading(&self) -> bool {
        self.kind.is_heading()
    }
}

impl Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Block", 2)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("html", &self.content.markup)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind() {
        assert!(!BlockKind::Paragraph.is_heading());
        assert!(BlockKind::Paragraph.is_splittable());
        assert!(BlockKind::Other.is_splittable());

        assert!(BlockKind::Heading1.is_heading());
        assert!(!BlockKind::Heading4.is_splittable());
        assert_eq!(BlockKind::Heading3.heading_level(), Some(3));
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(BlockKind::from_tag("H2"), BlockKind::Heading2);
        assert_eq!(BlockKind::from_tag("p"), BlockKind::Paragraph);
        // Only h1-h4 are headings
        assert_eq!(BlockKind::from_tag("h5"), BlockKind::Other);
        assert_eq!(BlockKind::from_tag("header"), BlockKind::Other);
        assert_eq!(BlockKind::from_tag("hr"), BlockKind::Other);
    }

    #[test]
    fn test_from_text_escapes() {
        let block = Block::paragraph("a < b\nc");
        assert_eq!(block.markup(), "<p>a &lt; b<br/>c</p>");
        assert_eq!(block.text(), "a < b\nc");

        assert_eq!(Block::heading(9, "x").kind, BlockKind::Heading4);
        assert_eq!(Block::heading(0, "x").kind, BlockKind::Heading1);
    }
}
