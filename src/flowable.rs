use crate::canvas::Canvas;
use crate::font::{FontId, text_width, wrap_lines};
use crate::normalize::BULLET;
use crate::types::{Pt, Size};

/// A placeable flow element: measured against an available box, split
/// across pages when possible, drawn at a top-left anchor.
pub trait Flowable {
    fn wrap(&self, avail_width: Pt, avail_height: Pt) -> Size;
    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)>;
    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontId,
    pub size: Pt,
    pub leading: Pt,
    pub space_after: Pt,
    pub centered: bool,
    pub bullet: bool,
}

impl TextStyle {
    pub fn paragraph() -> Self {
        Self {
            font: FontId::Regular,
            size: Pt::from_f32(11.0),
            leading: Pt::from_f32(14.0),
            space_after: Pt::from_f32(4.0),
            centered: false,
            bullet: false,
        }
    }

    pub fn bullet() -> Self {
        Self {
            bullet: true,
            ..Self::paragraph()
        }
    }

    pub fn caption() -> Self {
        Self {
            size: Pt::from_f32(10.0),
            leading: Pt::from_f32(13.0),
            space_after: Pt::from_f32(6.0),
            centered: true,
            ..Self::paragraph()
        }
    }

    pub fn heading(level: u8) -> Self {
        let (size, leading, space_after) = if level <= 1 {
            (18.0, 23.0, 10.0)
        } else {
            (14.0, 18.0, 6.0)
        };
        Self {
            font: FontId::Bold,
            size: Pt::from_f32(size),
            leading: Pt::from_f32(leading),
            space_after: Pt::from_f32(space_after),
            centered: false,
            bullet: false,
        }
    }
}

pub struct ParagraphFlowable {
    text: String,
    style: TextStyle,
}

impl ParagraphFlowable {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn marker_indent(&self) -> Pt {
        if self.style.bullet {
            text_width(BULLET, self.style.font, self.style.size)
        } else {
            Pt::ZERO
        }
    }

    fn lines(&self, avail_width: Pt) -> Vec<String> {
        let usable = (avail_width - self.marker_indent()).max(Pt::from_f32(1.0));
        wrap_lines(&self.text, self.style.font, self.style.size, usable)
    }
}

impl Flowable for ParagraphFlowable {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let line_count = self.lines(avail_width).len() as i32;
        Size {
            width: avail_width,
            height: Pt::from_milli(self.style.leading.to_milli() * line_count as i64)
                + self.style.space_after,
        }
    }

    fn split(
        &self,
        avail_width: Pt,
        avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        let lines = self.lines(avail_width);
        if lines.len() < 2 {
            return None;
        }
        let leading = self.style.leading.to_milli();
        let fit = (avail_height.to_milli() / leading.max(1)) as usize;
        if fit == 0 || fit >= lines.len() {
            return None;
        }
        let first = ParagraphFlowable {
            text: lines[..fit].join(" "),
            style: self.style,
        };
        let mut rest_style = self.style;
        // The continuation never repeats the bullet marker.
        rest_style.bullet = false;
        let second = ParagraphFlowable {
            text: lines[fit..].join(" "),
            style: rest_style,
        };
        Some((Box::new(first), Box::new(second)))
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt) {
        canvas.set_font(self.style.font, self.style.size);
        let indent = self.marker_indent();
        let mut cursor = y;
        for (index, line) in self.lines(avail_width).iter().enumerate() {
            let baseline = cursor + self.style.size;
            if self.style.centered {
                let width = text_width(line, self.style.font, self.style.size);
                let offset = (avail_width - width).max(Pt::ZERO) * 0.5;
                canvas.draw_string(x + offset, baseline, line.clone());
            } else if self.style.bullet {
                if index == 0 {
                    canvas.draw_string(x, baseline, BULLET.trim_end());
                }
                canvas.draw_string(x + indent, baseline, line.clone());
            } else {
                canvas.draw_string(x, baseline, line.clone());
            }
            cursor += self.style.leading;
        }
    }
}

/// Images reserve their full measured bounding box; they are scaled down
/// to the available width but never clipped to a single-line height.
pub struct ImageFlowable {
    resource_id: String,
    width: Pt,
    height: Pt,
}

impl ImageFlowable {
    pub fn new(resource_id: impl Into<String>, width: Pt, height: Pt) -> Self {
        Self {
            resource_id: resource_id.into(),
            width,
            height,
        }
    }

    fn scaled(&self, avail_width: Pt) -> (Pt, Pt) {
        if self.width <= avail_width || self.width <= Pt::ZERO {
            return (self.width, self.height);
        }
        let ratio = avail_width.to_f32() / self.width.to_f32();
        (avail_width, self.height * ratio)
    }
}

impl Flowable for ImageFlowable {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        let (width, height) = self.scaled(avail_width);
        Size { width, height }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt, avail_width: Pt) {
        let (width, height) = self.scaled(avail_width);
        // Center narrow images in the column.
        let offset = (avail_width - width).max(Pt::ZERO) * 0.5;
        canvas.draw_image(x + offset, y, width, height, &self.resource_id);
    }
}

pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: Pt) -> Self {
        Self { height }
    }
}

impl Flowable for Spacer {
    fn wrap(&self, avail_width: Pt, _avail_height: Pt) -> Size {
        Size {
            width: avail_width,
            height: self.height,
        }
    }

    fn split(
        &self,
        _avail_width: Pt,
        _avail_height: Pt,
    ) -> Option<(Box<dyn Flowable>, Box<dyn Flowable>)> {
        None
    }

    fn draw(&self, _canvas: &mut Canvas, _x: Pt, _y: Pt, _avail_width: Pt) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_height_counts_wrapped_lines() {
        let style = TextStyle::paragraph();
        let para = ParagraphFlowable::new(
            "a reasonably long sentence that will need to wrap onto several lines",
            style,
        );
        let narrow = para.wrap(Pt::from_f32(100.0), Pt::from_f32(500.0));
        let wide = para.wrap(Pt::from_f32(500.0), Pt::from_f32(500.0));
        assert!(narrow.height > wide.height);
    }

    #[test]
    fn paragraph_split_preserves_all_words() {
        let style = TextStyle::paragraph();
        let text = "one two three four five six seven eight nine ten";
        let para = ParagraphFlowable::new(text, style);
        let (first, second) = para
            .split(Pt::from_f32(60.0), Pt::from_f32(30.0))
            .expect("splits");
        let first = first.wrap(Pt::from_f32(60.0), Pt::from_f32(30.0));
        assert!(first.height <= Pt::from_f32(30.0) + style.space_after);
        let _ = second;
    }

    #[test]
    fn image_scales_down_but_keeps_full_box() {
        let image = ImageFlowable::new("chart.weight", Pt::from_f32(600.0), Pt::from_f32(300.0));
        let size = image.wrap(Pt::from_f32(500.0), Pt::from_f32(100.0));
        assert_eq!(size.width, Pt::from_f32(500.0));
        assert_eq!(size.height.to_milli(), 250_000);
        assert!(image.split(Pt::from_f32(500.0), Pt::from_f32(100.0)).is_none());
    }
}
