use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::blocks::{Block, ReportBundle};
use crate::debug::DebugLogger;
use crate::error::WellPressError;
use crate::locale::Locale;
use crate::normalize::{BULLET, normalize_lines};
use crate::types::Pt;
use crate::visit::ChartImage;

fn packaging_err(path: &Path, message: impl ToString) -> WellPressError {
    WellPressError::Packaging {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Unique package build directory under the system temp dir; removed on
/// every exit path.
struct BuildRoot {
    path: PathBuf,
}

impl BuildRoot {
    fn create() -> Result<Self, WellPressError> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let nonce = SEQ.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "wellpress-docx-{}-{}",
            std::process::id(),
            nonce
        ));
        fs::create_dir_all(&path).map_err(|err| packaging_err(&path, err))?;
        Ok(Self { path })
    }

    fn write_part(&self, relative: &str, contents: &[u8]) -> Result<(), WellPressError> {
        let target = self.path.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| packaging_err(parent, err))?;
        }
        fs::write(&target, contents).map_err(|err| packaging_err(&target, err))
    }
}

impl Drop for BuildRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

struct MediaPart {
    file_name: String,
    rel_id: String,
    content_type: &'static str,
    data: Vec<u8>,
}

/// Media parts carry a short content digest in the name so regenerated
/// packages with identical charts produce identical entries.
fn media_part(index: usize, chart: &ChartImage) -> MediaPart {
    let (extension, content_type, data) = match image::guess_format(&chart.data) {
        Ok(image::ImageFormat::Jpeg) => ("jpeg", "image/jpeg", chart.data.clone()),
        Ok(image::ImageFormat::Png) => ("png", "image/png", chart.data.clone()),
        _ => {
            let data = image::load_from_memory(&chart.data)
                .ok()
                .and_then(|decoded| {
                    let mut buffer = std::io::Cursor::new(Vec::new());
                    decoded
                        .write_to(&mut buffer, image::ImageFormat::Png)
                        .ok()?;
                    Some(buffer.into_inner())
                })
                .unwrap_or_else(|| chart.data.clone());
            ("png", "image/png", data)
        }
    };
    let digest = Sha256::digest(&data);
    let short: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    MediaPart {
        file_name: format!("chart{}_{}.{}", index + 1, short, extension),
        rel_id: format!("rId{}", index + 10),
        content_type,
        data,
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builds the complete OOXML word-processing package for the bundle and
/// returns the zipped archive bytes.
pub fn document_to_docx(
    bundle: &ReportBundle,
    locale: &Locale,
    debug: Option<&DebugLogger>,
) -> Result<Vec<u8>, WellPressError> {
    let root = BuildRoot::create()?;

    let media: Vec<MediaPart> = bundle
        .images
        .iter()
        .enumerate()
        .map(|(index, chart)| media_part(index, chart))
        .collect();

    let title = extract_title(&bundle.body.to_text_lines(), locale);

    root.write_part("[Content_Types].xml", content_types(&media).as_bytes())?;
    root.write_part("_rels/.rels", ROOT_RELS.as_bytes())?;
    root.write_part("docProps/core.xml", core_props(bundle, &title).as_bytes())?;
    root.write_part("docProps/app.xml", APP_PROPS.as_bytes())?;
    root.write_part("word/styles.xml", STYLES_XML.as_bytes())?;
    root.write_part(
        "word/_rels/document.xml.rels",
        document_rels(&media).as_bytes(),
    )?;
    root.write_part(
        "word/document.xml",
        document_xml(bundle, locale, &media).as_bytes(),
    )?;
    for part in &media {
        root.write_part(&format!("word/media/{}", part.file_name), &part.data)?;
    }

    if let Some(logger) = debug {
        logger.log_event("docx.media", &media.len().to_string());
        logger.increment("docx.media", media.len() as u64);
    }

    archive_tree(&root.path)
}

/// Walks the build tree and deflates every file into the archive with
/// entry paths relative to the root.
fn archive_tree(root: &Path) -> Result<Vec<u8>, WellPressError> {
    let mut entries = Vec::new();
    collect_files(root, root, &mut entries)?;
    entries.sort();

    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for relative in entries {
        let absolute = root.join(&relative);
        let contents = fs::read(&absolute).map_err(|err| packaging_err(&absolute, err))?;
        let entry_name = relative
            .to_str()
            .ok_or_else(|| packaging_err(&absolute, "non-utf8 path"))?
            .replace('\\', "/");
        writer
            .start_file(entry_name, options)
            .map_err(|err| packaging_err(&absolute, err))?;
        writer
            .write_all(&contents)
            .map_err(|err| packaging_err(&absolute, err))?;
    }
    let cursor = writer
        .finish()
        .map_err(WellPressError::Zip)?;
    Ok(cursor.into_inner())
}

fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<(), WellPressError> {
    let reader = fs::read_dir(dir).map_err(|err| packaging_err(dir, err))?;
    for entry in reader {
        let entry = entry.map_err(|err| packaging_err(dir, err))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|err| packaging_err(&path, err))?;
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// Joins the patient-name line and the visit-title heading with the
/// localized separator; a generic title when no name line is present.
fn extract_title(lines: &[String], locale: &Locale) -> String {
    let prefix = locale.patient_prefix();
    let patient = lines.iter().find_map(|line| {
        let rest = line.strip_prefix(prefix)?;
        let rest = rest.split(" | ").next().unwrap_or(rest);
        let rest = rest.split(" (").next().unwrap_or(rest).trim();
        if rest.is_empty() { None } else { Some(rest) }
    });
    let visit = lines.iter().find(|line| {
        line.as_str() == locale.visit_title(true) || line.as_str() == locale.visit_title(false)
    });
    match (patient, visit) {
        (Some(patient), Some(visit)) => {
            format!("{}{}{}", patient, locale.title_separator(), visit)
        }
        (Some(patient), None) => patient.to_string(),
        _ => locale.fallback_title().to_string(),
    }
}

fn content_types(media: &[MediaPart]) -> String {
    let mut defaults = String::from(
        "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    );
    if media.iter().any(|m| m.content_type == "image/png") {
        defaults.push_str("<Default Extension=\"png\" ContentType=\"image/png\"/>");
    }
    if media.iter().any(|m| m.content_type == "image/jpeg") {
        defaults.push_str("<Default Extension=\"jpeg\" ContentType=\"image/jpeg\"/>");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">{}\
         <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
         <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
         <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
         </Types>",
        defaults
    )
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>\
</Relationships>";

const APP_PROPS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
<Application>WellPress</Application>\
</Properties>";

fn core_props(bundle: &ReportBundle, title: &str) -> String {
    let creator = bundle
        .meta
        .clinician
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("WellPress");
    let created = bundle
        .meta
        .generated_at
        .map(|ts| ts.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let created = created
        .map(|stamp| {
            format!(
                "<dcterms:created xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:created>\
                 <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:modified>"
            )
        })
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{}</dc:title><dc:creator>{}</dc:creator>{}\
         </cp:coreProperties>",
        escape_xml(title),
        escape_xml(creator),
        created
    )
}

const STYLES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:style w:type=\"paragraph\" w:styleId=\"Normal\" w:default=\"1\">\
<w:name w:val=\"Normal\"/><w:rPr><w:sz w:val=\"22\"/></w:rPr>\
</w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Title\">\
<w:name w:val=\"Title\"/><w:basedOn w:val=\"Normal\"/>\
<w:rPr><w:b/><w:sz w:val=\"40\"/></w:rPr>\
</w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Heading1\">\
<w:name w:val=\"heading 1\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:spacing w:before=\"240\" w:after=\"120\"/></w:pPr>\
<w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr>\
</w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Heading2\">\
<w:name w:val=\"heading 2\"/><w:basedOn w:val=\"Normal\"/>\
<w:pPr><w:spacing w:before=\"160\" w:after=\"80\"/></w:pPr>\
<w:rPr><w:b/><w:sz w:val=\"26\"/></w:rPr>\
</w:style>\
</w:styles>";

fn document_rels(media: &[MediaPart]) -> String {
    let mut rels = String::from(
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    );
    for part in media {
        rels.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" Target=\"media/{}\"/>",
            part.rel_id, part.file_name
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
        rels
    )
}

fn paragraph_xml(style: &str, centered: bool, text: &str) -> String {
    let jc = if centered {
        "<w:jc w:val=\"center\"/>"
    } else {
        ""
    };
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"{}\"/>{}</w:pPr>\
         <w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        style,
        jc,
        escape_xml(text)
    )
}

fn page_break_xml() -> &'static str {
    "<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>"
}

/// Inline drawing sized in EMU from the same logical point size the
/// other formats use.
fn drawing_xml(part: &MediaPart, index: usize, width: Pt, height: Pt) -> String {
    let cx = width.to_emu();
    let cy = height.to_emu();
    let id = index + 1;
    format!(
        "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:drawing>\
         <wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">\
         <wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
         <wp:docPr id=\"{id}\" name=\"Chart {id}\"/>\
         <a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
         <a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"Chart {id}\"/><pic:cNvPicPr/></pic:nvPicPr>\
         <pic:blipFill><a:blip r:embed=\"{rel}\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>\
         <a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
         <pic:spPr><a:xfrm><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
         </pic:pic></a:graphicData></a:graphic></wp:inline>\
         </w:drawing></w:r></w:p>",
        rel = part.rel_id,
    )
}

/// Converts the body to styled paragraphs with the bullet-run
/// normalization from the shared normalizer. Dedup state resets at every
/// Heading1 and every non-bullet paragraph so distinct sections can
/// legitimately repeat a line.
fn body_paragraphs(bundle: &ReportBundle, locale: &Locale) -> String {
    let heading_labels = locale.heading_labels();
    let milestones_header = locale.milestones_header().to_string();
    let is_heading = |line: &str| {
        heading_labels.contains(&line)
            || line == locale.visit_title(true)
            || line == locale.visit_title(false)
    };

    let mut out = String::new();
    let mut bullet_run: Vec<String> = Vec::new();

    let flush_run = |run: &mut Vec<String>, out: &mut String| {
        if run.is_empty() {
            return;
        }
        let joined = run.join("\n");
        for line in normalize_lines(&joined, &milestones_header) {
            out.push_str(&paragraph_xml("Normal", false, &format!("{BULLET}{line}")));
        }
        run.clear();
    };

    for line in bundle.body.to_text_lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(content) = trimmed.strip_prefix(BULLET) {
            bullet_run.push(format!("{BULLET}{content}"));
            continue;
        }
        flush_run(&mut bullet_run, &mut out);
        if is_heading(trimmed) {
            out.push_str(&paragraph_xml("Heading1", false, trimmed));
        } else {
            out.push_str(&paragraph_xml("Normal", false, trimmed));
        }
    }
    flush_run(&mut bullet_run, &mut out);
    out
}

fn chart_paragraphs(bundle: &ReportBundle, media: &[MediaPart]) -> String {
    let Some(charts) = &bundle.charts else {
        return String::new();
    };
    let mut out = String::new();
    out.push_str(page_break_xml());
    for block in &charts.blocks {
        match block {
            Block::Heading { text, .. } => {
                out.push_str(&paragraph_xml("Heading1", false, text));
            }
            Block::Paragraph { text } => {
                out.push_str(&paragraph_xml("Normal", false, text));
            }
            Block::Bullet { text } => {
                out.push_str(&paragraph_xml("Normal", false, &format!("{BULLET}{text}")));
            }
            Block::Caption { text } => {
                out.push_str(&paragraph_xml("Normal", true, text));
            }
            Block::Image {
                resource_id,
                width,
                height,
            } => {
                let part = bundle
                    .images
                    .iter()
                    .position(|image| image.resource_id() == *resource_id)
                    .and_then(|index| media.get(index).map(|part| (index, part)));
                if let Some((index, part)) = part {
                    out.push_str(&drawing_xml(part, index, *width, *height));
                }
            }
            Block::PageBreak => {
                out.push_str(page_break_xml());
            }
        }
    }
    out
}

fn document_xml(bundle: &ReportBundle, locale: &Locale, media: &[MediaPart]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}{}</w:body></w:document>",
        body_paragraphs(bundle, locale),
        chart_paragraphs(bundle, media),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::IntermediateDocument;
    use crate::types::Size;
    use crate::visit::{ChartMetric, VisitKind, VisitMeta};
    use std::io::Read;

    fn tiny_png() -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([0, 128, 255]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("png");
        buffer.into_inner()
    }

    fn well_bundle() -> ReportBundle {
        let locale = Locale::builtin_en();
        let chart = ChartImage::new(ChartMetric::Weight, tiny_png(), Size::new(400.0, 300.0))
            .expect("chart");
        let mut body = IntermediateDocument::new();
        body.heading(1, locale.visit_title(true));
        body.paragraph("Patient: Ada Q (ada) | MRN 12345");
        body.heading(2, "Feeding");
        body.bullet("breast milk");
        let mut charts = IntermediateDocument::new();
        charts.heading(1, "Growth charts");
        charts.caption("Weight for age");
        charts.image("chart.weight", Pt::from_f32(400.0), Pt::from_f32(300.0));
        ReportBundle {
            kind: VisitKind::Well,
            meta: VisitMeta::default(),
            body,
            charts: Some(charts),
            images: vec![chart],
        }
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).expect("archive");
        (0..archive.len())
            .map(|i| archive.by_index(i).expect("entry").name().to_string())
            .collect()
    }

    #[test]
    fn package_contains_the_required_parts() {
        let locale = Locale::builtin_en();
        let bytes = document_to_docx(&well_bundle(), &locale, None).expect("docx");
        let names = archive_names(&bytes);
        for required in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.iter().any(|n| n == required), "missing {required}");
        }
        assert_eq!(
            names.iter().filter(|n| n.starts_with("word/media/")).count(),
            1
        );
    }

    #[cfg(unix)]
    #[test]
    fn archive_failures_name_the_offending_path() {
        use std::os::unix::ffi::OsStrExt;
        let root = BuildRoot::create().expect("root");
        root.write_part("word/document.xml", b"<w:document/>")
            .expect("part");
        let bad = root.path.join(std::ffi::OsStr::from_bytes(b"bad\xFF.bin"));
        fs::write(&bad, b"x").expect("bad file");
        let err = archive_tree(&root.path).expect_err("unarchivable entry");
        match err {
            WellPressError::Packaging { path, .. } => assert_eq!(path, bad),
            other => panic!("expected packaging error, got {other:?}"),
        }
    }

    #[test]
    fn core_props_carry_title_and_creator() {
        let locale = Locale::builtin_en();
        let mut bundle = well_bundle();
        bundle.meta.clinician = Some("Dr. Byron".to_string());
        let bytes = document_to_docx(&bundle, &locale, None).expect("docx");
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("archive");
        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .expect("core props")
            .read_to_string(&mut core)
            .expect("read");
        assert!(core.contains("<dc:creator>Dr. Byron</dc:creator>"));

        // Absent clinician falls back to the application name.
        let bytes = document_to_docx(&well_bundle(), &locale, None).expect("docx");
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("archive");
        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .expect("core props")
            .read_to_string(&mut core)
            .expect("read");
        assert!(core.contains("<dc:creator>WellPress</dc:creator>"));
    }

    #[test]
    fn media_name_carries_content_digest() {
        let chart = ChartImage::new(ChartMetric::Weight, tiny_png(), Size::new(400.0, 300.0))
            .expect("chart");
        let first = media_part(0, &chart);
        let second = media_part(0, &chart);
        assert_eq!(first.file_name, second.file_name);
        assert!(first.file_name.starts_with("chart1_"));
        assert!(first.file_name.ends_with(".png"));
    }

    #[test]
    fn heading_lines_are_promoted_and_bullets_normalized() {
        let locale = Locale::builtin_en();
        let bytes = document_to_docx(&well_bundle(), &locale, None).expect("docx");
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("archive");
        let mut doc = String::new();
        archive
            .by_name("word/document.xml")
            .expect("document")
            .read_to_string(&mut doc)
            .expect("read");
        assert!(doc.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(doc.contains("\u{2022} breast milk"));
        assert!(doc.contains("<a:blip r:embed=\"rId10\""));
        // 400 x 300 pt in EMU.
        assert!(doc.contains("cx=\"5080000\" cy=\"3810000\""));
    }

    #[test]
    fn title_joins_patient_and_visit() {
        let locale = Locale::builtin_en();
        let lines = vec![
            "Well-child visit".to_string(),
            "Patient: Ada Q (ada) | MRN 12345".to_string(),
        ];
        let title = extract_title(&lines, &locale);
        assert_eq!(title, "Ada Q \u{2013} Well-child visit");
    }

    #[test]
    fn missing_patient_line_falls_back_to_generic_title() {
        let locale = Locale::builtin_en();
        let title = extract_title(&["Feeding".to_string()], &locale);
        assert_eq!(title, locale.fallback_title());
    }
}
