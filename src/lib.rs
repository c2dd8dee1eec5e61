mod assemble;
mod blocks;
mod canvas;
mod debug;
mod error;
mod flowable;
mod font;
mod frame;
mod layout;
mod locale;
mod merge;
mod normalize;
mod package;
mod pdf;
mod rtf;
mod tokens;
mod types;
mod visit;

use std::fs;
use std::path::{Path, PathBuf};

pub use assemble::{Assembler, age_display};
pub use blocks::{Block, IntermediateDocument, ReportBundle};
pub use canvas::{Canvas, Command, Document, Page};
pub use debug::DebugLogger;
pub use error::WellPressError;
pub use flowable::{Flowable, ImageFlowable, ParagraphFlowable, Spacer, TextStyle};
pub use font::FontId;
pub use frame::{AddResult, Frame};
pub use layout::CHART_WIDTH_CAP;
pub use locale::{Locale, PLACEHOLDER, humanize};
pub use normalize::{BULLET, SEPARATOR, normalize_block, normalize_lines};
pub use rtf::RtfWriter;
pub use tokens::render_problem_block;
pub use types::{Margins, PageGeometry, Pt, Rect, Size};
pub use visit::{
    ChartImage, ChartMetric, ExamGroup, GrowthPoint, GrowthSeries, MetricSeries,
    MilestoneSummary, PreviousFinding, ProblemToken, SectionVisibility, VisitKind, VisitMeta,
    VisitReportData,
};

/// Per-visit section visibility, answered by the caller's rule engine.
pub trait VisibilityRules {
    fn visibility(&self, visit_id: i64) -> SectionVisibility;
}

/// Supplies the pre-gated structured data for a visit.
pub trait VisitDataSource {
    fn load(&self, visit_id: i64) -> Result<VisitReportData, WellPressError>;
}

/// Renders growth charts for a series; called fresh on every export,
/// results are never cached across calls.
pub trait ChartRenderer {
    fn render(&self, series: &GrowthSeries, size: Size) -> Vec<ChartImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Rtf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Rtf => "rtf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// Everything the engine needs, supplied at construction. There is no
/// process-global state; two engines with different geometry can run
/// side by side.
pub struct EngineConfig {
    pub geometry: PageGeometry,
    pub chart_width_cap: Pt,
    pub locale: Locale,
    pub debug_log: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::report_default(),
            chart_width_cap: Pt::from_f32(CHART_WIDTH_CAP),
            locale: Locale::builtin_en(),
            debug_log: None,
        }
    }
}

pub struct WellPress {
    geometry: PageGeometry,
    chart_width_cap: Pt,
    locale: Locale,
    debug: Option<DebugLogger>,
}

impl WellPress {
    pub fn new(config: EngineConfig) -> Result<Self, WellPressError> {
        let content = config.geometry.content_rect();
        if content.width <= Pt::ZERO || content.height <= Pt::ZERO {
            return Err(WellPressError::InvalidConfiguration(
                "page inset leaves no content area".to_string(),
            ));
        }
        if config.chart_width_cap <= Pt::ZERO {
            return Err(WellPressError::InvalidConfiguration(
                "chart width cap must be positive".to_string(),
            ));
        }
        let debug = match config.debug_log {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        Ok(Self {
            geometry: config.geometry,
            chart_width_cap: config.chart_width_cap,
            locale: config.locale,
            debug,
        })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Builds the intermediate bundle every serializer works from. One
    /// pipeline for both visit kinds; the chart document exists only for
    /// well visits that actually carry charts.
    pub fn assemble(
        &self,
        kind: VisitKind,
        data: &VisitReportData,
        visibility: &SectionVisibility,
        charts: Option<(&GrowthSeries, Vec<ChartImage>)>,
    ) -> ReportBundle {
        let assembler = Assembler::new(&self.locale);
        let body = assembler.assemble_body(data, visibility, kind);
        let (charts_doc, images) = match (kind, charts) {
            (VisitKind::Well, Some((series, images))) if !images.is_empty() => {
                let doc = assembler.assemble_charts(series, &images);
                (Some(doc), images)
            }
            _ => (None, Vec::new()),
        };
        if let Some(logger) = self.debug.as_ref() {
            logger.log_event(
                "assemble.done",
                &format!("blocks={} charts={}", body.blocks.len(), images.len()),
            );
        }
        ReportBundle {
            kind,
            meta: data.meta.clone(),
            body,
            charts: charts_doc,
            images,
        }
    }

    pub fn export_pdf(&self, bundle: &ReportBundle) -> Result<Vec<u8>, WellPressError> {
        let body_doc = layout::paginate(&bundle.body, self.geometry);
        let body_bytes = pdf::document_to_pdf(&body_doc, &[], self.debug.as_ref())?;
        let chart_bytes = match &bundle.charts {
            Some(charts) if !charts.is_empty() => {
                let doc = layout::charts_document(charts, self.geometry, self.chart_width_cap);
                Some(pdf::document_to_pdf(
                    &doc,
                    &bundle.images,
                    self.debug.as_ref(),
                )?)
            }
            _ => None,
        };
        let merged = merge::merge_reports(
            &body_bytes,
            chart_bytes.as_deref(),
            self.debug.as_ref(),
        )?;
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary("export.pdf");
        }
        Ok(merged)
    }

    pub fn export_rtf(&self, bundle: &ReportBundle) -> Result<Vec<u8>, WellPressError> {
        let bytes = rtf::document_to_rtf(bundle, self.geometry, self.debug.as_ref())?;
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary("export.rtf");
        }
        Ok(bytes)
    }

    pub fn export_docx(&self, bundle: &ReportBundle) -> Result<Vec<u8>, WellPressError> {
        let bytes = package::document_to_docx(bundle, &self.locale, self.debug.as_ref())?;
        if let Some(logger) = self.debug.as_ref() {
            logger.emit_summary("export.docx");
        }
        Ok(bytes)
    }

    pub fn export(
        &self,
        bundle: &ReportBundle,
        format: ExportFormat,
    ) -> Result<Vec<u8>, WellPressError> {
        match format {
            ExportFormat::Pdf => self.export_pdf(bundle),
            ExportFormat::Rtf => self.export_rtf(bundle),
            ExportFormat::Docx => self.export_docx(bundle),
        }
    }

    /// `<patient-slug>_<visit-type-slug>_report_<date-slug>`.
    pub fn export_file_stem(&self, meta: &VisitMeta) -> String {
        let patient = slug(if meta.patient_name.trim().is_empty() {
            "patient"
        } else {
            meta.patient_name.as_str()
        });
        let visit_type = slug(if meta.visit_type.trim().is_empty() {
            "visit"
        } else {
            meta.visit_type.as_str()
        });
        let date = meta
            .visit_date
            .or_else(|| meta.generated_at.map(|ts| ts.date_naive()))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        format!("{}_{}_report_{}", patient, visit_type, slug(&date))
    }

    /// Serializes and writes atomically: temp file in the target
    /// directory, then rename. Partially written exports never land
    /// under the final name.
    pub fn export_to_file(
        &self,
        bundle: &ReportBundle,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<PathBuf, WellPressError> {
        let bytes = self.export(bundle, format)?;
        let stem = self.export_file_stem(&bundle.meta);
        let target = dir.join(format!("{}.{}", stem, format.extension()));
        let temp = dir.join(format!(".{}.{}.tmp", stem, format.extension()));
        fs::write(&temp, &bytes)?;
        if let Err(err) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(WellPressError::Io(err));
        }
        Ok(target)
    }

    /// Full collaborator-driven pipeline: load, gate, render charts,
    /// assemble, serialize, write.
    pub fn export_visit(
        &self,
        visit_id: i64,
        kind: VisitKind,
        source: &dyn VisitDataSource,
        rules: &dyn VisibilityRules,
        charts: Option<(&dyn ChartRenderer, &GrowthSeries)>,
        format: ExportFormat,
        dir: &Path,
    ) -> Result<PathBuf, WellPressError> {
        let data = source.load(visit_id)?;
        let visibility = rules.visibility(visit_id);
        let chart_input = match (kind, charts) {
            (VisitKind::Well, Some((renderer, series))) => {
                let size = Size {
                    width: self.chart_width_cap.min(self.geometry.content_rect().width),
                    height: self.geometry.content_rect().height * 0.5,
                };
                Some((series, renderer.render(series, size)))
            }
            _ => None,
        };
        let bundle = self.assemble(kind, &data, &visibility, chart_input);
        self.export_to_file(&bundle, format, dir)
    }
}

/// Unsafe filename characters become `-`, spaces become `_`.
fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch.to_ascii_lowercase());
        } else if ch == ' ' {
            out.push('_');
        } else {
            out.push('-');
        }
    }
    if out.is_empty() {
        out.push_str("report");
    }
    out
}
