use crate::font::FontId;
use crate::types::{Pt, Size};

/// Drawing commands recorded in top-left coordinates. The PDF writer maps
/// them into the page-description document's bottom-left space.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFont { font: FontId, size: Pt },
    DrawString { x: Pt, y: Pt, text: String },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

/// Command recorder; one open page at a time, flushed on `end_page`.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_font(&mut self, font: FontId, size: Pt) {
        self.current.commands.push(Command::SetFont { font, size });
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_image(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, resource_id: &str) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.to_string(),
        });
    }

    pub fn end_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
    }

    pub fn current_page_is_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    /// Flushes the open page (when non-empty) and returns the document.
    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() {
            self.end_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}
