use crate::types::Pt;
use crate::visit::{ChartImage, VisitKind, VisitMeta};

/// One flow element of the format-agnostic intermediate document. Block
/// order is the canonical print order for every output format.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Bullet { text: String },
    /// Centered paragraph, used for chart captions.
    Caption { text: String },
    /// Placeholder for an embedded image; serializers resolve the
    /// resource id against the bundle's chart images.
    Image {
        resource_id: String,
        width: Pt,
        height: Pt,
    },
    /// Explicit break: following content always starts a fresh page.
    PageBreak,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateDocument {
    pub blocks: Vec<Block>,
}

impl IntermediateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph { text: text.into() });
    }

    pub fn bullet(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Bullet { text: text.into() });
    }

    pub fn caption(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Caption { text: text.into() });
    }

    pub fn image(&mut self, resource_id: impl Into<String>, width: Pt, height: Pt) {
        self.blocks.push(Block::Image {
            resource_id: resource_id.into(),
            width,
            height,
        });
    }

    pub fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Splits at explicit page-break markers into independent segments;
    /// a manual break always starts a fresh page regardless of fill.
    pub fn segments(&self) -> Vec<&[Block]> {
        self.blocks
            .split(|block| matches!(block, Block::PageBreak))
            .collect()
    }

    /// Plain-text rendering used by the package builder for paragraph
    /// classification and title extraction. One line per text block;
    /// images contribute nothing.
    pub fn to_text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. }
                | Block::Paragraph { text }
                | Block::Caption { text } => lines.push(text.clone()),
                Block::Bullet { text } => lines.push(format!("\u{2022} {text}")),
                Block::Image { .. } | Block::PageBreak => {}
            }
        }
        lines
    }
}

/// Everything one export call works from: built fresh per call,
/// discarded after serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    pub kind: VisitKind,
    pub meta: VisitMeta,
    pub body: IntermediateDocument,
    pub charts: Option<IntermediateDocument>,
    pub images: Vec<ChartImage>,
}

impl ReportBundle {
    pub fn image(&self, resource_id: &str) -> Option<&ChartImage> {
        self.images
            .iter()
            .find(|image| image.resource_id() == resource_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_split_on_page_breaks() {
        let mut doc = IntermediateDocument::new();
        doc.paragraph("a");
        doc.page_break();
        doc.paragraph("b");
        doc.paragraph("c");
        let segments = doc.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 1);
        assert_eq!(segments[1].len(), 2);
    }
}
