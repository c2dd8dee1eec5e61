use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::GenericImageView;

use crate::canvas::{Command, Document, Page};
use crate::debug::DebugLogger;
use crate::error::WellPressError;
use crate::font::FontId;
use crate::types::Pt;
use crate::visit::ChartImage;

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;
const PDF_FONT_REGULAR_ID: usize = 4;
const PDF_FONT_BOLD_ID: usize = 5;
const PDF_FIRST_FREE_ID: usize = 6;

/// Serializes a recorded document into PDF bytes. Image XObjects are
/// resolved from `images` by resource id; a command naming an unknown
/// resource is dropped with a diagnostic instead of failing the export.
pub fn document_to_pdf(
    document: &Document,
    images: &[ChartImage],
    debug: Option<&DebugLogger>,
) -> Result<Vec<u8>, WellPressError> {
    let mut writer = PdfWriter::new();
    writer.write_header();

    // XObject ids are assigned up front so the shared resource
    // dictionary and the page content streams agree on names.
    let mut image_entries: Vec<(String, usize, PdfImage)> = Vec::new();
    let mut next_id = PDF_FIRST_FREE_ID;
    for chart in images {
        match PdfImage::prepare(chart) {
            Some(prepared) => {
                image_entries.push((chart.resource_id(), next_id, prepared));
                next_id += 1;
            }
            None => {
                if let Some(logger) = debug {
                    logger.log_event("pdf.image.unreadable", &chart.resource_id());
                    logger.increment("pdf.image.unreadable", 1);
                }
            }
        }
    }

    let page_count = document.pages.len();
    let content_base = next_id;
    let page_base = content_base + page_count;

    let kids: Vec<String> = (0..page_count)
        .map(|index| format!("{} 0 R", page_base + index))
        .collect();
    writer.write_object(
        PDF_CATALOG_ID,
        &format!("<< /Type /Catalog /Pages {} 0 R >>", PDF_PAGES_ID),
    );
    writer.write_object(
        PDF_PAGES_ID,
        &format!(
            "<< /Type /Pages /Count {} /Kids [{}] >>",
            page_count,
            kids.join(" ")
        ),
    );

    let mut resources = format!(
        "<< /Font << /{} {} 0 R /{} {} 0 R >>",
        FontId::Regular.resource(),
        PDF_FONT_REGULAR_ID,
        FontId::Bold.resource(),
        PDF_FONT_BOLD_ID
    );
    if !image_entries.is_empty() {
        let entries: Vec<String> = image_entries
            .iter()
            .enumerate()
            .map(|(index, (_, id, _))| format!("/Im{} {} 0 R", index + 1, id))
            .collect();
        resources.push_str(&format!(" /XObject << {} >>", entries.join(" ")));
    }
    resources.push_str(" >>");
    writer.write_object(PDF_RESOURCES_ID, &resources);

    writer.write_object(PDF_FONT_REGULAR_ID, &font_object(FontId::Regular));
    writer.write_object(PDF_FONT_BOLD_ID, &font_object(FontId::Bold));

    for (_, id, prepared) in &image_entries {
        writer.write_stream_object(*id, &prepared.dict(), &prepared.data);
    }

    let page_height = document.page_size.height;
    for (index, page) in document.pages.iter().enumerate() {
        let content = render_page(page, page_height, &image_entries, debug);
        let compressed = flate_compress(content.as_bytes());
        writer.write_stream_object(
            content_base + index,
            &format!(
                "<< /Length {} /Filter /FlateDecode >>",
                compressed.len()
            ),
            &compressed,
        );
        writer.write_object(
            page_base + index,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
                PDF_PAGES_ID,
                fmt_pt(document.page_size.width),
                fmt_pt(page_height),
                PDF_RESOURCES_ID,
                content_base + index
            ),
        );
    }

    let total = page_base + page_count - 1;
    writer.write_xref_and_trailer(total);
    if let Some(logger) = debug {
        logger.log_event("pdf.done", &format!("pages={}", page_count));
        logger.increment("pdf.pages", page_count as u64);
    }
    Ok(writer.out)
}

/// Flips the recorder's top-left coordinates into PDF's bottom-left
/// space. DrawString y is the baseline; DrawImage y is the box top.
fn render_page(
    page: &Page,
    page_height: Pt,
    images: &[(String, usize, PdfImage)],
    debug: Option<&DebugLogger>,
) -> String {
    let mut out = String::new();
    let mut current_font = FontId::Regular;
    let mut current_size = Pt::from_f32(11.0);
    for command in &page.commands {
        match command {
            Command::SetFont { font, size } => {
                current_font = *font;
                current_size = *size;
            }
            Command::DrawString { x, y, text } => {
                let encoded = encode_winansi_pdf_string(text);
                if encoded.replaced > 0 {
                    if let Some(logger) = debug {
                        logger.log_event("pdf.winansi.lossy", text);
                        logger.increment("pdf.winansi.lossy", encoded.replaced as u64);
                    }
                }
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    current_font.resource(),
                    fmt_pt(current_size)
                ));
                out.push_str(&format!("{} {} Td\n", fmt_pt(*x), fmt_pt(page_height - *y)));
                out.push_str(&format!("({}) Tj\n", encoded.text));
                out.push_str("ET\n");
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                let Some(position) = images.iter().position(|(id, _, _)| id == resource_id)
                else {
                    if let Some(logger) = debug {
                        logger.log_event("pdf.image.missing", resource_id);
                        logger.increment("pdf.image.missing", 1);
                    }
                    continue;
                };
                out.push_str(&format!(
                    "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
                    fmt_pt(*width),
                    fmt_pt(*height),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    position + 1
                ));
            }
        }
    }
    out
}

struct PdfWriter {
    out: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            offsets: Vec::new(),
        }
    }

    fn write_header(&mut self) {
        self.out.extend_from_slice(b"%PDF-1.7\n");
        // Binary comment marker so transfer tools treat the file as binary.
        self.out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
    }

    fn record_offset(&mut self, obj_id: usize) {
        if self.offsets.len() <= obj_id {
            self.offsets.resize(obj_id + 1, 0);
        }
        self.offsets[obj_id] = self.out.len();
    }

    fn write_object(&mut self, obj_id: usize, body: &str) {
        self.record_offset(obj_id);
        self.out
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", obj_id, body).as_bytes());
    }

    fn write_stream_object(&mut self, obj_id: usize, dict: &str, data: &[u8]) {
        self.record_offset(obj_id);
        self.out
            .extend_from_slice(format!("{} 0 obj\n{}\nstream\n", obj_id, dict).as_bytes());
        self.out.extend_from_slice(data);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn write_xref_and_trailer(&mut self, total_objects: usize) {
        let xref_start = self.out.len();
        self.out
            .extend_from_slice(format!("xref\n0 {}\n", total_objects + 1).as_bytes());
        self.out.extend_from_slice(b"0000000000 65535 f \n");
        for id in 1..=total_objects {
            let offset = self.offsets.get(id).copied().unwrap_or(0);
            self.out
                .extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF",
                total_objects + 1,
                PDF_CATALOG_ID,
                xref_start
            )
            .as_bytes(),
        );
    }
}

fn font_object(font: FontId) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        font.base_name()
    )
}

struct PdfImage {
    width: u32,
    height: u32,
    filter: &'static str,
    color_space: &'static str,
    data: Vec<u8>,
}

impl PdfImage {
    /// JPEG payloads pass through untouched under DCTDecode. Everything
    /// else is decoded, flattened onto white, and re-encoded as zlib RGB.
    fn prepare(chart: &ChartImage) -> Option<Self> {
        let is_jpeg = matches!(
            image::guess_format(&chart.data),
            Ok(image::ImageFormat::Jpeg)
        );
        if is_jpeg {
            return Some(Self {
                width: chart.pixel_width,
                height: chart.pixel_height,
                filter: "/DCTDecode",
                color_space: "/DeviceRGB",
                data: chart.data.clone(),
            });
        }

        let decoded = image::load_from_memory(&chart.data).ok()?;
        let (width, height) = decoded.dimensions();
        let rgba = decoded.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 255 {
                rgb.extend_from_slice(&[r, g, b]);
            } else {
                // Composite over white.
                let blend = |c: u8| -> u8 {
                    let c = c as u32 * a as u32 + 255 * (255 - a as u32);
                    (c / 255) as u8
                };
                rgb.extend_from_slice(&[blend(r), blend(g), blend(b)]);
            }
        }
        Some(Self {
            width,
            height,
            filter: "/FlateDecode",
            color_space: "/DeviceRGB",
            data: flate_compress(&rgb),
        })
    }

    fn dict(&self) -> String {
        format!(
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Filter {} /Length {} >>",
            self.width, self.height, self.color_space, self.filter, self.data.len()
        )
    }
}

fn flate_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

struct WinAnsiEncoded {
    text: String,
    replaced: usize,
}

fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut replaced = 0usize;
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{2122}' => 0x99,
            _ => {
                replaced += 1;
                b'?'
            }
        };
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    WinAnsiEncoded {
        text: out,
        replaced,
    }
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::types::Size;
    use crate::visit::ChartMetric;

    fn simple_document() -> Document {
        let mut canvas = Canvas::new(Size::new(595.0, 842.0));
        canvas.set_font(FontId::Bold, Pt::from_f32(18.0));
        canvas.draw_string(Pt::from_f32(36.0), Pt::from_f32(54.0), "Well visit report");
        canvas.finish()
    }

    #[test]
    fn header_trailer_and_text_are_present() {
        let bytes = document_to_pdf(&simple_document(), &[], None).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.ends_with("%%EOF"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("startxref"));
    }

    #[test]
    fn baseline_is_flipped_into_bottom_left_space() {
        let page = Page {
            commands: vec![
                Command::SetFont {
                    font: FontId::Regular,
                    size: Pt::from_f32(11.0),
                },
                Command::DrawString {
                    x: Pt::from_f32(36.0),
                    y: Pt::from_f32(47.0),
                    text: "x".into(),
                },
            ],
        };
        let rendered = render_page(&page, Pt::from_f32(842.0), &[], None);
        assert!(rendered.contains("36 795 Td"));
    }

    #[test]
    fn bullet_and_dashes_encode_as_winansi_octal() {
        let encoded = encode_winansi_pdf_string("\u{2022} item \u{2013} status \u{2014}");
        assert_eq!(encoded.replaced, 0);
        assert!(encoded.text.contains("\\225"));
        assert!(encoded.text.contains("\\226"));
        assert!(encoded.text.contains("\\227"));
    }

    #[test]
    fn unknown_image_resource_is_skipped() {
        let page = Page {
            commands: vec![Command::DrawImage {
                x: Pt::from_f32(36.0),
                y: Pt::from_f32(36.0),
                width: Pt::from_f32(100.0),
                height: Pt::from_f32(80.0),
                resource_id: "chart.weight".into(),
            }],
        };
        let rendered = render_page(&page, Pt::from_f32(842.0), &[], None);
        assert!(!rendered.contains("Do"));
    }

    #[test]
    fn png_chart_becomes_flate_rgb_xobject() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("png");
        let chart = ChartImage::new(
            ChartMetric::Weight,
            buffer.into_inner(),
            Size::new(400.0, 300.0),
        )
        .expect("chart");
        let prepared = PdfImage::prepare(&chart).expect("prepared");
        assert_eq!(prepared.filter, "/FlateDecode");
        assert_eq!(prepared.width, 4);
        assert_eq!(prepared.height, 3);
    }
}
