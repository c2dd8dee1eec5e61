use std::fmt::Write as _;

use crate::blocks::{Block, ReportBundle};
use crate::debug::DebugLogger;
use crate::error::WellPressError;
use crate::types::{PageGeometry, Pt};
use crate::visit::ChartImage;

/// Incremental RTF document builder. Content is appended block by block
/// and the file is produced in a single forward pass; nothing is ever
/// rewritten after it has been emitted.
pub struct RtfWriter<'a> {
    out: String,
    debug: Option<&'a DebugLogger>,
}

impl<'a> RtfWriter<'a> {
    pub fn new(geometry: PageGeometry, debug: Option<&'a DebugLogger>) -> Self {
        let mut out = String::new();
        out.push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0");
        out.push_str("{\\fonttbl{\\f0\\fswiss\\fcharset0 Helvetica;}}");
        let _ = write!(
            out,
            "\\paperw{}\\paperh{}\\margl{}\\margr{}\\margt{}\\margb{}\n",
            geometry.page_size.width.to_twips(),
            geometry.page_size.height.to_twips(),
            geometry.inset.left.to_twips(),
            geometry.inset.right.to_twips(),
            geometry.inset.top.to_twips(),
            geometry.inset.bottom.to_twips(),
        );
        Self { out, debug }
    }

    pub fn append_blocks(&mut self, blocks: &[Block], images: &[ChartImage]) {
        for block in blocks {
            self.append_block(block, images);
        }
    }

    pub fn append_block(&mut self, block: &Block, images: &[ChartImage]) {
        match block {
            Block::Heading { level, text } => {
                let half_points = if *level <= 1 { 36 } else { 28 };
                let _ = write!(
                    self.out,
                    "\\pard\\sa120{{\\b\\fs{} {}}}\\par\n",
                    half_points,
                    sanitize(text)
                );
            }
            Block::Paragraph { text } => {
                let _ = write!(
                    self.out,
                    "\\pard\\sa80{{\\fs22 {}}}\\par\n",
                    sanitize(text)
                );
            }
            Block::Bullet { text } => {
                let _ = write!(
                    self.out,
                    "\\pard\\sa80\\li200{{\\fs22 * {}}}\\par\n",
                    sanitize(text)
                );
            }
            Block::Caption { text } => {
                let _ = write!(
                    self.out,
                    "\\pard\\qc\\sa120{{\\fs20 {}}}\\par\n",
                    sanitize(text)
                );
            }
            Block::Image {
                resource_id,
                width,
                height,
            } => {
                let Some(chart) = images
                    .iter()
                    .find(|image| image.resource_id() == *resource_id)
                else {
                    self.diagnostic("rtf.image.missing", resource_id);
                    return;
                };
                match encode_pict(chart, *width, *height) {
                    Some(pict) => {
                        let _ = write!(self.out, "\\pard\\qc {}\\par\n", pict);
                    }
                    None => {
                        self.diagnostic("rtf.image.unembeddable", resource_id);
                    }
                }
            }
            Block::PageBreak => {
                self.out.push_str("\\page\n");
            }
        }
    }

    pub fn page_break(&mut self) {
        self.out.push_str("\\page\n");
    }

    pub fn finish(mut self) -> String {
        self.out.push('}');
        self.out
    }

    fn diagnostic(&self, kind: &str, detail: &str) {
        if let Some(logger) = self.debug {
            logger.log_event(kind, detail);
            logger.increment(kind, 1);
        }
    }
}

/// Serializes the whole bundle. Sick visits carry the body only; well
/// visits append every chart block after an explicit page break.
pub fn document_to_rtf(
    bundle: &ReportBundle,
    geometry: PageGeometry,
    debug: Option<&DebugLogger>,
) -> Result<Vec<u8>, WellPressError> {
    let mut writer = RtfWriter::new(geometry, debug);
    writer.append_blocks(&bundle.body.blocks, &bundle.images);
    if let Some(charts) = &bundle.charts {
        if !charts.is_empty() {
            writer.page_break();
            writer.append_blocks(&charts.blocks, &bundle.images);
        }
    }
    let out = writer.finish();
    if !out.is_ascii() {
        return Err(WellPressError::RtfSerialization(
            "output contains non-ascii bytes".to_string(),
        ));
    }
    Ok(out.into_bytes())
}

/// Best embedding first: the chart's vector form as EMF, then JPEG at
/// quality 85, then lossless PNG. `None` means the chart could not be
/// embedded in any form and should be skipped.
fn encode_pict(chart: &ChartImage, width: Pt, height: Pt) -> Option<String> {
    if let Some(vector) = &chart.vector {
        return Some(emf_pict(vector, width, height));
    }
    if let Some(pict) = jpeg_pict(chart, width, height) {
        return Some(pict);
    }
    png_pict(chart, width, height)
}

/// EMF dimension fields are in 0.01 mm units; 1 pt = 2540/72 of them.
fn hundredths_mm(value: Pt) -> i64 {
    (value.to_f32() * 2540.0 / 72.0).round() as i64
}

fn emf_pict(data: &[u8], width: Pt, height: Pt) -> String {
    format!(
        "{{\\pict\\emfblip\\picw{}\\pich{}\\picwgoal{}\\pichgoal{}\\picscalex100\\picscaley100\n{}}}",
        hundredths_mm(width),
        hundredths_mm(height),
        width.to_twips(),
        height.to_twips(),
        hex_wrapped(data)
    )
}

fn jpeg_pict(chart: &ChartImage, width: Pt, height: Pt) -> Option<String> {
    let is_jpeg = matches!(
        image::guess_format(&chart.data),
        Ok(image::ImageFormat::Jpeg)
    );
    let data = if is_jpeg {
        chart.data.clone()
    } else {
        let decoded = image::load_from_memory(&chart.data).ok()?;
        let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
        let mut buffer = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 85);
        rgb.write_with_encoder(encoder).ok()?;
        buffer.into_inner()
    };
    Some(raster_pict("jpegblip", chart, &data, width, height))
}

fn png_pict(chart: &ChartImage, width: Pt, height: Pt) -> Option<String> {
    let is_png = matches!(
        image::guess_format(&chart.data),
        Ok(image::ImageFormat::Png)
    );
    let data = if is_png {
        chart.data.clone()
    } else {
        let decoded = image::load_from_memory(&chart.data).ok()?;
        let mut buffer = std::io::Cursor::new(Vec::new());
        decoded.write_to(&mut buffer, image::ImageFormat::Png).ok()?;
        buffer.into_inner()
    };
    Some(raster_pict("pngblip", chart, &data, width, height))
}

fn raster_pict(blip: &str, chart: &ChartImage, data: &[u8], width: Pt, height: Pt) -> String {
    format!(
        "{{\\pict\\{}\\picw{}\\pich{}\\picwgoal{}\\pichgoal{}\\picscalex100\\picscaley100\n{}}}",
        blip,
        chart.pixel_width,
        chart.pixel_height,
        width.to_twips(),
        height.to_twips(),
        hex_wrapped(data)
    )
}

/// Uppercase hex, 128 characters per line.
fn hex_wrapped(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + data.len() / 64);
    for (index, byte) in data.iter().enumerate() {
        let _ = write!(out, "{:02X}", byte);
        if index % 64 == 63 {
            out.push('\n');
        }
    }
    out
}

/// Forces text into the 7-bit RTF body: typographic characters get
/// plain-ASCII stand-ins and anything else non-ASCII becomes `?`.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\par "),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2022}' => out.push('*'),
            '\u{00A0}' => out.push(' '),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
