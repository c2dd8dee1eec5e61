use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use image::GenericImageView;
use std::collections::BTreeMap;

use crate::types::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    Well,
    Sick,
}

/// Explicit, typed visit metadata. Every field the report header needs is
/// named here; absent values degrade to the placeholder glyph at render
/// time, never to an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitMeta {
    pub alias: String,
    pub mrn: Option<String>,
    pub patient_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub visit_date: Option<NaiveDate>,
    pub visit_type: String,
    pub clinician: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub generated_at: Option<DateTime<Utc>>,
    /// Precomputed age string; recomputed from DOB when empty or a
    /// placeholder.
    pub age_display: Option<String>,
    pub next_visit_date: Option<NaiveDate>,
}

/// One discrete clinical fact awaiting localized rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemToken {
    pub key: String,
    pub args: Vec<String>,
}

impl ProblemToken {
    pub fn new(key: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamGroup {
    pub label: String,
    pub findings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilestoneSummary {
    pub achieved: u32,
    pub expected: u32,
    pub delayed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousFinding {
    pub visit_date: Option<NaiveDate>,
    pub summary: String,
}

/// Per-visit snapshot handed in by the loader collaborator. Read-only to
/// the engine; built fresh for every export call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitReportData {
    pub meta: VisitMeta,
    pub feeding: BTreeMap<String, String>,
    pub supplementation: BTreeMap<String, String>,
    pub sleep: BTreeMap<String, String>,
    pub stool: BTreeMap<String, String>,
    pub development: BTreeMap<String, String>,
    pub measurements: BTreeMap<String, String>,
    pub physical_exam: Vec<ExamGroup>,
    pub milestones: Option<MilestoneSummary>,
    pub concerns: Option<String>,
    pub conclusions: Option<String>,
    pub guidance: Option<String>,
    pub comments: Option<String>,
    pub problem_tokens: Vec<ProblemToken>,
    /// Plain-text fallback used when the token list renders to nothing.
    pub problem_text: String,
    pub perinatal: BTreeMap<String, String>,
    pub previous_findings: Vec<PreviousFinding>,
}

/// Per-section booleans gating only current-visit content; `None` means
/// show. Perinatal summary, previous-visit findings and growth charts are
/// never gated and have no flag here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionVisibility {
    pub concerns: Option<bool>,
    pub feeding: Option<bool>,
    pub supplementation: Option<bool>,
    pub sleep: Option<bool>,
    pub development: Option<bool>,
    pub milestones: Option<bool>,
    pub measurements: Option<bool>,
    pub physical_exam: Option<bool>,
    pub problems: Option<bool>,
    pub conclusions: Option<bool>,
    pub guidance: Option<bool>,
    pub comments: Option<bool>,
    pub next_visit: Option<bool>,
}

pub(crate) fn shows(flag: Option<bool>) -> bool {
    flag.unwrap_or(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChartMetric {
    Weight,
    Length,
    HeadCircumference,
}

impl ChartMetric {
    pub fn slug(&self) -> &'static str {
        match self {
            ChartMetric::Weight => "weight",
            ChartMetric::Length => "length",
            ChartMetric::HeadCircumference => "head-circumference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPoint {
    pub age_months: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: ChartMetric,
    pub points: Vec<GrowthPoint>,
}

/// Growth data context supplied by the chart collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSeries {
    pub date_of_birth: NaiveDate,
    pub sex: String,
    pub cutoff_date: NaiveDate,
    pub metrics: Vec<MetricSeries>,
}

/// Rendered chart handed over by the chart collaborator: opaque raster
/// bytes plus pixel dimensions and the logical on-page size in points.
/// Requested fresh per export, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub metric: ChartMetric,
    pub data: Vec<u8>,
    /// Optional single-page vector form (EMF) preferred by the rich-text
    /// embedding path.
    pub vector: Option<Vec<u8>>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub logical_size: Size,
}

impl ChartImage {
    pub fn new(metric: ChartMetric, data: Vec<u8>, logical_size: Size) -> Option<Self> {
        let decoded = image::load_from_memory(&data).ok()?;
        let (pixel_width, pixel_height) = decoded.dimensions();
        Some(Self {
            metric,
            data,
            vector: None,
            pixel_width,
            pixel_height,
            logical_size,
        })
    }

    /// Accepts `data:image/...;base64,` payloads from renderers that hand
    /// back data URIs instead of raw bytes.
    pub fn from_data_uri(metric: ChartMetric, uri: &str, logical_size: Size) -> Option<Self> {
        let (_, data) = parse_data_uri(uri)?;
        Self::new(metric, data, logical_size)
    }

    pub fn with_vector(mut self, vector: Vec<u8>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn resource_id(&self) -> String {
        format!("chart.{}", self.metric.slug())
    }
}

fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data_part) = rest.split_once(',')?;
    let mime = header.split(';').next().unwrap_or("application/octet-stream");
    let data = if header.contains("base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data_part)
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime.to_string(), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_defaults_to_show() {
        let flags = SectionVisibility::default();
        assert!(shows(flags.feeding));
        assert!(shows(Some(true)));
        assert!(!shows(Some(false)));
    }

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([240, 240, 240]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .expect("encode png");
        out
    }

    #[test]
    fn data_uri_roundtrip() {
        let png = tiny_png(3, 2);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let chart =
            ChartImage::from_data_uri(ChartMetric::Weight, &uri, Size::new(100.0, 100.0))
                .expect("decode");
        assert_eq!(chart.pixel_width, 3);
        assert_eq!(chart.pixel_height, 2);
        assert_eq!(chart.resource_id(), "chart.weight");
    }
}
