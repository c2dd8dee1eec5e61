use crate::canvas::Canvas;
use crate::flowable::Flowable;
use crate::types::{Pt, Rect};

pub enum AddResult {
    Placed,
    Split(Box<dyn Flowable>),
    Overflow(Box<dyn Flowable>),
}

/// One content-rect-sized container being filled top to bottom.
pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    pub fn add(&mut self, flowable: Box<dyn Flowable>, canvas: &mut Canvas) -> AddResult {
        let avail_width = self.rect.width;
        let avail_height = self.remaining_height();
        if avail_height <= Pt::ZERO {
            return AddResult::Overflow(flowable);
        }

        let size = flowable.wrap(avail_width, avail_height);
        if size.height <= avail_height {
            flowable.draw(
                canvas,
                self.rect.x,
                self.rect.y + self.cursor_y,
                avail_width,
            );
            self.cursor_y += size.height;
            return AddResult::Placed;
        }

        if let Some((first, second)) = flowable.split(avail_width, avail_height) {
            let first_size = first.wrap(avail_width, avail_height);
            if first_size.height > Pt::ZERO && first_size.height <= avail_height {
                first.draw(
                    canvas,
                    self.rect.x,
                    self.rect.y + self.cursor_y,
                    avail_width,
                );
                self.cursor_y += first_size.height;
                return AddResult::Split(second);
            }
        }

        // Taller than a full container and unsplittable: place it on an
        // empty frame anyway so pagination keeps moving forward.
        if self.is_empty() {
            flowable.draw(canvas, self.rect.x, self.rect.y, avail_width);
            self.cursor_y = self.rect.height;
            return AddResult::Placed;
        }

        AddResult::Overflow(flowable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::flowable::{ParagraphFlowable, Spacer, TextStyle};
    use crate::types::Size;

    fn frame_rect(height: f32) -> Rect {
        Rect {
            x: Pt::from_f32(36.0),
            y: Pt::from_f32(36.0),
            width: Pt::from_f32(200.0),
            height: Pt::from_f32(height),
        }
    }

    #[test]
    fn placing_advances_cursor() {
        let mut canvas = Canvas::new(Size::new(595.0, 842.0));
        let mut frame = Frame::new(frame_rect(500.0));
        let result = frame.add(Box::new(Spacer::new(Pt::from_f32(100.0))), &mut canvas);
        assert!(matches!(result, AddResult::Placed));
        assert_eq!(frame.remaining_height(), Pt::from_f32(400.0));
    }

    #[test]
    fn overfull_paragraph_splits() {
        let mut canvas = Canvas::new(Size::new(595.0, 842.0));
        let mut frame = Frame::new(frame_rect(40.0));
        let para = ParagraphFlowable::new(
            "many words that will certainly not fit into a forty point tall frame at two hundred points wide because they wrap a lot",
            TextStyle::paragraph(),
        );
        let result = frame.add(Box::new(para), &mut canvas);
        assert!(matches!(result, AddResult::Split(_)));
    }

    #[test]
    fn non_fitting_block_on_filled_frame_overflows() {
        let mut canvas = Canvas::new(Size::new(595.0, 842.0));
        let mut frame = Frame::new(frame_rect(150.0));
        assert!(matches!(
            frame.add(Box::new(Spacer::new(Pt::from_f32(100.0))), &mut canvas),
            AddResult::Placed
        ));
        assert!(matches!(
            frame.add(Box::new(Spacer::new(Pt::from_f32(100.0))), &mut canvas),
            AddResult::Overflow(_)
        ));
    }

    #[test]
    fn oversized_block_on_empty_frame_is_forced() {
        let mut canvas = Canvas::new(Size::new(595.0, 842.0));
        let mut frame = Frame::new(frame_rect(50.0));
        let result = frame.add(Box::new(Spacer::new(Pt::from_f32(500.0))), &mut canvas);
        assert!(matches!(result, AddResult::Placed));
        assert_eq!(frame.remaining_height(), Pt::ZERO);
    }
}
