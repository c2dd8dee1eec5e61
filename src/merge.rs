use lopdf::content::Content;
use lopdf::{
    Document as LoDocument, Object as LoObject, ObjectId as LoObjectId, dictionary,
};

use crate::debug::DebugLogger;
use crate::error::WellPressError;

fn page_read_err(part: &str, err: lopdf::Error) -> WellPressError {
    WellPressError::PageRead(format!("{}: {}", part, err))
}

/// A page counts as blank when its content stream carries no text
/// operators and the page has no annotations. Vector furniture such as
/// rules or frames does not rescue a page: the body and chart documents
/// only ever place text and images, and images always come with a
/// caption, so text presence is the reliable signal.
fn page_is_blank(doc: &LoDocument, page_id: LoObjectId, part: &str) -> Result<bool, WellPressError> {
    let page = doc
        .get_object(page_id)
        .and_then(LoObject::as_dict)
        .map_err(|err| page_read_err(part, err))?;
    if let Ok(annots) = page.get(b"Annots") {
        let has_annots = match annots {
            LoObject::Array(items) => !items.is_empty(),
            LoObject::Reference(_) => true,
            _ => false,
        };
        if has_annots {
            return Ok(false);
        }
    }

    let content_bytes = doc
        .get_page_content(page_id)
        .map_err(|err| page_read_err(part, err))?;
    let content = Content::decode(&content_bytes).map_err(|err| page_read_err(part, err))?;
    let has_text = content.operations.iter().any(|op| {
        matches!(op.operator.as_str(), "Tj" | "TJ" | "'" | "\"")
    });
    Ok(!has_text)
}

fn load_part(bytes: &[u8], part: &str) -> Result<LoDocument, WellPressError> {
    let doc = LoDocument::load_mem(bytes).map_err(|err| page_read_err(part, err))?;
    if doc.is_encrypted() {
        return Err(WellPressError::PageRead(format!(
            "{}: document is encrypted",
            part
        )));
    }
    Ok(doc)
}

/// Drops trailing blank pages so a body that ends exactly at a page
/// boundary does not ship an empty last sheet.
fn trim_trailing_blank(doc: &mut LoDocument, part: &str) -> Result<usize, WellPressError> {
    let pages: Vec<(u32, LoObjectId)> = doc.get_pages().into_iter().collect();
    let mut doomed = Vec::new();
    for (number, page_id) in pages.into_iter().rev() {
        if page_is_blank(doc, page_id, part)? {
            doomed.push(number);
        } else {
            break;
        }
    }
    if !doomed.is_empty() {
        doc.delete_pages(&doomed);
    }
    Ok(doomed.len())
}

/// Chart renderers occasionally emit a spurious empty first page before
/// the first figure. Interior and trailing chart pages are kept as-is.
fn trim_leading_blank(doc: &mut LoDocument, part: &str) -> Result<usize, WellPressError> {
    let pages: Vec<(u32, LoObjectId)> = doc.get_pages().into_iter().collect();
    let mut doomed = Vec::new();
    for (number, page_id) in pages {
        if page_is_blank(doc, page_id, part)? {
            doomed.push(number);
        } else {
            break;
        }
    }
    if !doomed.is_empty() {
        doc.delete_pages(&doomed);
    }
    Ok(doomed.len())
}

fn import_pages(dst: &mut LoDocument, mut src: LoDocument) -> Vec<LoObjectId> {
    let start_id = dst.max_id + 1;
    src.renumber_objects_with(start_id);
    let page_ids: Vec<LoObjectId> = src.get_pages().into_values().collect();
    if src.max_id > dst.max_id {
        dst.max_id = src.max_id;
    }
    dst.objects.extend(src.objects);
    page_ids
}

/// Concatenates the trimmed body document with the trimmed chart
/// document, body pages first, keeping page order within each part.
pub fn merge_reports(
    body: &[u8],
    charts: Option<&[u8]>,
    debug: Option<&DebugLogger>,
) -> Result<Vec<u8>, WellPressError> {
    let mut body_doc = load_part(body, "body")?;
    let trimmed_body = trim_trailing_blank(&mut body_doc, "body")?;

    let charts_doc = match charts {
        Some(bytes) => {
            let mut doc = load_part(bytes, "charts")?;
            let trimmed = trim_leading_blank(&mut doc, "charts")?;
            if let Some(logger) = debug {
                if trimmed > 0 {
                    logger.log_event("merge.trimmed.charts", &trimmed.to_string());
                    logger.increment("merge.trimmed.charts", trimmed as u64);
                }
            }
            Some(doc)
        }
        None => None,
    };
    if let Some(logger) = debug {
        if trimmed_body > 0 {
            logger.log_event("merge.trimmed.body", &trimmed_body.to_string());
            logger.increment("merge.trimmed.body", trimmed_body as u64);
        }
    }

    let mut merged = LoDocument::with_version("1.7");
    let mut page_ids = import_pages(&mut merged, body_doc);
    if let Some(doc) = charts_doc {
        page_ids.extend(import_pages(&mut merged, doc));
    }
    if page_ids.is_empty() {
        return Err(WellPressError::PageRead(
            "merged: no pages left after trimming".to_string(),
        ));
    }

    let pages_id = merged.new_object_id();
    for page_id in &page_ids {
        let page = merged
            .get_object_mut(*page_id)
            .and_then(LoObject::as_dict_mut)
            .map_err(|err| page_read_err("merged", err))?;
        page.set("Parent", LoObject::Reference(pages_id));
    }
    let kids: Vec<LoObject> = page_ids
        .iter()
        .map(|id| LoObject::Reference(*id))
        .collect();
    merged.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => LoObject::Array(kids),
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => LoObject::Reference(pages_id),
    });
    merged.trailer.set("Root", catalog_id);

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    let mut out = Vec::new();
    merged
        .save_to(&mut out)
        .map_err(|err| WellPressError::PdfSerialization(err.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream as LoStream;

    fn fixture_pdf(page_contents: &[&str]) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for content in page_contents {
            let content_id =
                doc.add_object(LoStream::new(dictionary! {}, content.as_bytes().to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => LoObject::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => LoObject::Reference(content_id),
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => dictionary! {
                            "Type" => "Font",
                            "Subtype" => "Type1",
                            "BaseFont" => "Helvetica",
                        },
                    },
                },
            });
            kids.push(LoObject::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            LoObject::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => LoObject::Array(kids),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => LoObject::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).expect("fixture save");
        out
    }

    const TEXT_PAGE: &str = "BT /F1 11 Tf 36 800 Td (hello) Tj ET";
    const EMPTY_PAGE: &str = "";
    const RULE_ONLY_PAGE: &str = "36 400 523 1 re f";

    fn page_count(bytes: &[u8]) -> usize {
        LoDocument::load_mem(bytes).expect("load").get_pages().len()
    }

    #[test]
    fn trailing_blank_body_pages_are_dropped() {
        let body = fixture_pdf(&[TEXT_PAGE, TEXT_PAGE, EMPTY_PAGE]);
        let merged = merge_reports(&body, None, None).expect("merge");
        assert_eq!(page_count(&merged), 2);
    }

    #[test]
    fn interior_blank_body_page_survives() {
        let body = fixture_pdf(&[TEXT_PAGE, EMPTY_PAGE, TEXT_PAGE]);
        let merged = merge_reports(&body, None, None).expect("merge");
        assert_eq!(page_count(&merged), 3);
    }

    #[test]
    fn leading_blank_chart_page_is_dropped() {
        let body = fixture_pdf(&[TEXT_PAGE]);
        let charts = fixture_pdf(&[EMPTY_PAGE, TEXT_PAGE, TEXT_PAGE]);
        let merged = merge_reports(&body, Some(&charts), None).expect("merge");
        assert_eq!(page_count(&merged), 3);
    }

    #[test]
    fn page_with_only_vector_furniture_counts_as_blank() {
        let body = fixture_pdf(&[TEXT_PAGE, RULE_ONLY_PAGE]);
        let merged = merge_reports(&body, None, None).expect("merge");
        assert_eq!(page_count(&merged), 1);
    }

    #[test]
    fn body_order_precedes_chart_order() {
        let body = fixture_pdf(&["BT /F1 11 Tf 36 800 Td (body) Tj ET"]);
        let charts = fixture_pdf(&["BT /F1 11 Tf 36 800 Td (chart) Tj ET"]);
        let merged = merge_reports(&body, Some(&charts), None).expect("merge");
        let doc = LoDocument::load_mem(&merged).expect("load");
        let pages: Vec<_> = doc.get_pages().into_values().collect();
        assert_eq!(pages.len(), 2);
        let first = doc.extract_text(&[1]).expect("text");
        assert!(first.contains("body"));
        let second = doc.extract_text(&[2]).expect("text");
        assert!(second.contains("chart"));
    }

    #[test]
    fn everything_blank_is_an_error() {
        let body = fixture_pdf(&[EMPTY_PAGE, EMPTY_PAGE]);
        let result = merge_reports(&body, None, None);
        assert!(matches!(result, Err(WellPressError::PageRead(_))));
    }
}
