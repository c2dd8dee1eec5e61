use std::collections::VecDeque;

use crate::blocks::{Block, IntermediateDocument};
use crate::canvas::{Canvas, Document};
use crate::flowable::{Flowable, ImageFlowable, ParagraphFlowable, Spacer, TextStyle};
use crate::font::{FontId, text_width, wrap_lines};
use crate::types::{PageGeometry, Pt};

/// Physical cap on chart width: 18 cm at 72 pt/in.
pub const CHART_WIDTH_CAP: f32 = 18.0 * 72.0 / 2.54;

fn block_flowables(blocks: &[Block]) -> VecDeque<Box<dyn Flowable>> {
    let mut out: VecDeque<Box<dyn Flowable>> = VecDeque::new();
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                if *level > 1 && !out.is_empty() {
                    out.push_back(Box::new(Spacer::new(Pt::from_f32(6.0))));
                }
                out.push_back(Box::new(ParagraphFlowable::new(
                    text.clone(),
                    TextStyle::heading(*level),
                )));
            }
            Block::Paragraph { text } => {
                out.push_back(Box::new(ParagraphFlowable::new(
                    text.clone(),
                    TextStyle::paragraph(),
                )));
            }
            Block::Bullet { text } => {
                out.push_back(Box::new(ParagraphFlowable::new(
                    text.clone(),
                    TextStyle::bullet(),
                )));
            }
            Block::Caption { text } => {
                out.push_back(Box::new(ParagraphFlowable::new(
                    text.clone(),
                    TextStyle::caption(),
                )));
            }
            Block::Image {
                resource_id,
                width,
                height,
            } => {
                out.push_back(Box::new(ImageFlowable::new(
                    resource_id.clone(),
                    *width,
                    *height,
                )));
            }
            Block::PageBreak => {}
        }
    }
    out
}

/// Flows the intermediate document into pages. Explicit page-break
/// markers split the content into independent segments, so a manual
/// break always starts a fresh page regardless of prior fill level.
pub fn paginate(doc: &IntermediateDocument, geometry: PageGeometry) -> Document {
    let content = geometry.content_rect();
    let mut canvas = Canvas::new(geometry.page_size);

    for (segment_index, segment) in doc.segments().into_iter().enumerate() {
        if segment_index > 0 {
            canvas.end_page();
        }
        let mut queue = block_flowables(segment);
        let mut frame = crate::frame::Frame::new(content);
        // Guard against a queue that cannot make progress.
        let mut stalls = 0usize;
        while let Some(flowable) = queue.pop_front() {
            match frame.add(flowable, &mut canvas) {
                crate::frame::AddResult::Placed => {
                    stalls = 0;
                }
                crate::frame::AddResult::Split(rest) => {
                    canvas.end_page();
                    frame = crate::frame::Frame::new(content);
                    queue.push_front(rest);
                    stalls = 0;
                }
                crate::frame::AddResult::Overflow(flowable) => {
                    stalls += 1;
                    if stalls > 2 {
                        break;
                    }
                    canvas.end_page();
                    frame = crate::frame::Frame::new(content);
                    queue.push_front(flowable);
                }
            }
        }
    }
    canvas.finish()
}

/// Direct chart pages: one metric per page, centered caption, image
/// scaled to the content width capped at 18 cm physical width with the
/// native aspect preserved. No flow engine involved; each segment of the
/// charts document is drawn straight onto its own page.
pub fn charts_document(doc: &IntermediateDocument, geometry: PageGeometry, width_cap: Pt) -> Document {
    let content = geometry.content_rect();
    let cap = content.width.min(width_cap);
    let mut canvas = Canvas::new(geometry.page_size);

    for (segment_index, segment) in doc.segments().into_iter().enumerate() {
        if segment_index > 0 {
            canvas.end_page();
        }
        let mut cursor = content.y;
        for block in segment {
            match block {
                Block::Heading { level, text } => {
                    let style = TextStyle::heading(*level);
                    cursor = draw_text_run(&mut canvas, text, style, content.x, cursor, content.width);
                }
                Block::Paragraph { text } => {
                    let style = TextStyle::paragraph();
                    cursor = draw_text_run(&mut canvas, text, style, content.x, cursor, content.width);
                }
                Block::Bullet { text } => {
                    let style = TextStyle::bullet();
                    cursor = draw_text_run(&mut canvas, text, style, content.x, cursor, content.width);
                }
                Block::Caption { text } => {
                    let style = TextStyle::caption();
                    cursor = draw_text_run(&mut canvas, text, style, content.x, cursor, content.width);
                }
                Block::Image {
                    resource_id,
                    width,
                    height,
                } => {
                    let (w, h) = fit_width(*width, *height, cap);
                    let x = content.x + (content.width - w).max(Pt::ZERO) * 0.5;
                    canvas.draw_image(x, cursor, w, h, resource_id);
                    cursor += h + Pt::from_f32(8.0);
                }
                Block::PageBreak => {}
            }
        }
    }
    canvas.finish()
}

fn fit_width(width: Pt, height: Pt, cap: Pt) -> (Pt, Pt) {
    if width <= cap || width <= Pt::ZERO {
        return (width, height);
    }
    let ratio = cap.to_f32() / width.to_f32();
    (cap, height * ratio)
}

fn draw_text_run(
    canvas: &mut Canvas,
    text: &str,
    style: TextStyle,
    x: Pt,
    y: Pt,
    width: Pt,
) -> Pt {
    canvas.set_font(style.font, style.size);
    let mut cursor = y;
    for line in wrap_lines(text, style.font, style.size, width) {
        let line_x = if style.centered {
            x + (width - text_width(&line, style.font, style.size)).max(Pt::ZERO) * 0.5
        } else {
            x
        };
        canvas.draw_string(line_x, cursor + style.size, line);
        cursor += style.leading;
    }
    cursor + style.space_after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::types::Size;

    fn geometry() -> PageGeometry {
        PageGeometry::report_default()
    }

    #[test]
    fn explicit_break_always_starts_fresh_page() {
        let mut doc = IntermediateDocument::new();
        doc.paragraph("first");
        doc.page_break();
        doc.paragraph("second");
        let rendered = paginate(&doc, geometry());
        assert_eq!(rendered.pages.len(), 2);
    }

    #[test]
    fn long_content_flows_over_multiple_pages() {
        let mut doc = IntermediateDocument::new();
        for i in 0..200 {
            doc.paragraph(format!("paragraph number {i} with a little bit of extra text"));
        }
        let rendered = paginate(&doc, geometry());
        assert!(rendered.pages.len() > 1);
    }

    #[test]
    fn charts_render_one_metric_per_page_with_capped_width() {
        let mut doc = IntermediateDocument::new();
        doc.heading(1, "Growth charts");
        doc.caption("Weight for age");
        doc.image("chart.weight", Pt::from_f32(600.0), Pt::from_f32(400.0));
        doc.page_break();
        doc.caption("Length/height for age");
        doc.image("chart.length", Pt::from_f32(600.0), Pt::from_f32(400.0));

        let rendered = charts_document(&doc, geometry(), Pt::from_f32(CHART_WIDTH_CAP));
        assert_eq!(rendered.pages.len(), 2);

        let cap = Pt::from_f32(CHART_WIDTH_CAP).min(geometry().content_rect().width);
        for page in &rendered.pages {
            for command in &page.commands {
                if let Command::DrawImage { width, height, .. } = command {
                    assert!(*width <= cap);
                    // 600x400 aspect preserved.
                    let ratio = width.to_f32() / height.to_f32();
                    assert!((ratio - 1.5).abs() < 0.01);
                }
            }
        }
    }

    #[test]
    fn page_size_carries_through() {
        let doc = IntermediateDocument::new();
        let rendered = paginate(&doc, geometry());
        assert_eq!(rendered.page_size, Size::new(595.0, 842.0));
    }
}
