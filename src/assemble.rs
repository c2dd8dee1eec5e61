use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

use crate::blocks::IntermediateDocument;
use crate::locale::{Locale, PLACEHOLDER, humanize};
use crate::normalize::normalize_lines;
use crate::tokens::render_problem_block;
use crate::types::Pt;
use crate::visit::{
    ChartImage, GrowthSeries, SectionVisibility, VisitKind, VisitReportData, shows,
};

const FEEDING_KEYS: &[&str] = &["mode", "frequency", "amount", "duration", "notes"];
const SUPPLEMENT_KEYS: &[&str] = &["vitamin_d", "iron", "fluoride", "other"];
const SLEEP_KEYS: &[&str] = &["total_hours", "night_wakings", "position", "environment"];
const STOOL_KEYS: &[&str] = &["frequency", "consistency", "color"];
const DEVELOPMENT_KEYS: &[&str] = &["gross_motor", "fine_motor", "language", "social"];
const MEASUREMENT_KEYS: &[&str] = &[
    "weight",
    "length",
    "head_circumference",
    "bmi",
    "percentiles",
];
const PERINATAL_KEYS: &[&str] = &[
    "gestational_age",
    "birth_weight",
    "birth_length",
    "delivery",
    "complications",
];

/// Walks visit data and visibility flags into the intermediate document.
/// Pure with respect to I/O: same inputs give a byte-identical document,
/// and assembly never fails; anything missing renders the placeholder.
pub struct Assembler<'a> {
    locale: &'a Locale,
}

impl<'a> Assembler<'a> {
    pub fn new(locale: &'a Locale) -> Self {
        Self { locale }
    }

    pub fn assemble_body(
        &self,
        data: &VisitReportData,
        visibility: &SectionVisibility,
        kind: VisitKind,
    ) -> IntermediateDocument {
        let mut doc = IntermediateDocument::new();
        self.header(&mut doc, data, kind);

        // Perinatal summary renders unconditionally.
        self.keyed_section(&mut doc, "perinatal", &data.perinatal, PERINATAL_KEYS);

        if shows(visibility.concerns) {
            self.text_section(&mut doc, "concerns", data.concerns.as_deref());
        }
        if shows(visibility.feeding) {
            self.keyed_section(&mut doc, "feeding", &data.feeding, FEEDING_KEYS);
        }
        if shows(visibility.supplementation) {
            self.keyed_section(
                &mut doc,
                "supplementation",
                &data.supplementation,
                SUPPLEMENT_KEYS,
            );
        }
        if shows(visibility.sleep) {
            self.keyed_section(&mut doc, "sleep", &data.sleep, SLEEP_KEYS);
        }
        // Stool is never gated.
        self.keyed_section(&mut doc, "stool", &data.stool, STOOL_KEYS);
        if shows(visibility.development) {
            self.keyed_section(&mut doc, "development", &data.development, DEVELOPMENT_KEYS);
        }
        if shows(visibility.milestones) {
            self.milestones_section(&mut doc, data);
        }
        if shows(visibility.measurements) {
            self.keyed_section(&mut doc, "measurements", &data.measurements, MEASUREMENT_KEYS);
        }
        if shows(visibility.physical_exam) {
            self.exam_section(&mut doc, data);
        }
        if shows(visibility.problems) {
            self.problems_section(&mut doc, data);
        }
        // Previous-visit findings render unconditionally.
        self.previous_section(&mut doc, data);
        if shows(visibility.conclusions) {
            self.text_section(&mut doc, "conclusions", data.conclusions.as_deref());
        }
        if shows(visibility.guidance) {
            self.text_section(&mut doc, "guidance", data.guidance.as_deref());
        }
        if shows(visibility.comments) {
            self.text_section(&mut doc, "comments", data.comments.as_deref());
        }
        if shows(visibility.next_visit) {
            self.next_visit_section(&mut doc, data);
        }
        doc
    }

    /// Charts-only document: heading, then per metric a summary line, a
    /// centered caption and the image block; one metric per page.
    pub fn assemble_charts(
        &self,
        series: &GrowthSeries,
        images: &[ChartImage],
    ) -> IntermediateDocument {
        let mut doc = IntermediateDocument::new();
        doc.heading(1, self.section_label("charts"));
        for (index, image) in images.iter().enumerate() {
            if index > 0 {
                doc.page_break();
            }
            let metric_label = self
                .locale
                .label_or(&format!("metric.{}", image.metric.slug().replace('-', "_")), "")
                .to_string();
            let metric_label = if metric_label.is_empty() {
                humanize(image.metric.slug())
            } else {
                metric_label
            };
            doc.paragraph(self.metric_summary(series, image, &metric_label));
            doc.caption(self.template("charts.caption", &[&metric_label]));
            doc.image(
                image.resource_id(),
                image.logical_size.width,
                image.logical_size.height,
            );
        }
        doc
    }

    fn metric_summary(
        &self,
        series: &GrowthSeries,
        image: &ChartImage,
        metric_label: &str,
    ) -> String {
        let points = series
            .metrics
            .iter()
            .find(|m| m.metric == image.metric)
            .map(|m| m.points.as_slice())
            .unwrap_or(&[]);
        let count = points.len().to_string();
        let (min_age, max_age) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            (lo.min(p.age_months), hi.max(p.age_months))
        });
        let (min_age, max_age) = if points.is_empty() {
            ("0".to_string(), "0".to_string())
        } else {
            (
                format!("{}", min_age.round() as i64),
                format!("{}", max_age.round() as i64),
            )
        };
        self.template(
            "charts.summary",
            &[metric_label, &count, &min_age, &max_age],
        )
    }

    fn header(&self, doc: &mut IntermediateDocument, data: &VisitReportData, kind: VisitKind) {
        let meta = &data.meta;
        doc.heading(1, self.locale.visit_title(kind == VisitKind::Well));

        let stamp = |value: &Option<chrono::DateTime<chrono::Utc>>| {
            value
                .map(|v| v.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        doc.paragraph(format!(
            "{} {} | {} {} | {} {}",
            self.header_label("created"),
            stamp(&meta.created_at),
            self.header_label("updated"),
            stamp(&meta.updated_at),
            self.header_label("generated"),
            stamp(&meta.generated_at),
        ));

        let mut identity = format!("{}{}", self.locale.patient_prefix(), meta.patient_name);
        if !meta.alias.trim().is_empty() {
            identity.push_str(&format!(" ({})", meta.alias));
        }
        if let Some(mrn) = meta.mrn.as_deref().filter(|m| !m.trim().is_empty()) {
            identity.push_str(&format!(" | {} {}", self.header_label("mrn"), mrn));
        }
        doc.paragraph(identity);

        let date_or_placeholder = |value: &Option<NaiveDate>| {
            value
                .map(|v| v.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        doc.paragraph(format!(
            "{} {} | {} {} | {} {}",
            self.header_label("dob"),
            date_or_placeholder(&meta.date_of_birth),
            self.header_label("sex"),
            meta.sex.as_deref().unwrap_or(PLACEHOLDER),
            self.header_label("age"),
            self.age_string(data),
        ));
        doc.paragraph(format!(
            "{} {} | {} {}",
            self.header_label("visit_date"),
            date_or_placeholder(&meta.visit_date),
            self.header_label("visit_type"),
            if meta.visit_type.trim().is_empty() {
                PLACEHOLDER
            } else {
                meta.visit_type.as_str()
            },
        ));
        doc.paragraph(format!(
            "{} {}",
            self.header_label("clinician"),
            meta.clinician.as_deref().unwrap_or(PLACEHOLDER),
        ));
    }

    /// Precomputed age wins unless empty or a placeholder, in which case
    /// it is recomputed from DOB against the visit date (falling back to
    /// the generation date to stay deterministic).
    fn age_string(&self, data: &VisitReportData) -> String {
        let meta = &data.meta;
        if let Some(age) = meta.age_display.as_deref() {
            if !is_placeholder(age) {
                return age.to_string();
            }
        }
        let Some(dob) = meta.date_of_birth else {
            return PLACEHOLDER.to_string();
        };
        let reference = meta
            .visit_date
            .or_else(|| meta.generated_at.map(|ts| ts.date_naive()));
        match reference {
            Some(reference) => age_display(dob, reference),
            None => PLACEHOLDER.to_string(),
        }
    }

    fn keyed_section(
        &self,
        doc: &mut IntermediateDocument,
        section: &str,
        map: &BTreeMap<String, String>,
        canonical: &[&str],
    ) {
        doc.heading(2, self.section_label(section));
        let mut emitted = false;
        for key in canonical {
            if let Some(value) = map.get(*key) {
                if !value.trim().is_empty() {
                    doc.bullet(format!("{}: {}", self.field_label(section, key), value.trim()));
                    emitted = true;
                }
            }
        }
        for (key, value) in map {
            if canonical.contains(&key.as_str()) || value.trim().is_empty() {
                continue;
            }
            doc.bullet(format!("{}: {}", self.field_label(section, key), value.trim()));
            emitted = true;
        }
        if !emitted {
            doc.paragraph(PLACEHOLDER);
        }
    }

    fn text_section(&self, doc: &mut IntermediateDocument, section: &str, text: Option<&str>) {
        doc.heading(2, self.section_label(section));
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => doc.paragraph(text),
            None => doc.paragraph(PLACEHOLDER),
        }
    }

    fn milestones_section(&self, doc: &mut IntermediateDocument, data: &VisitReportData) {
        doc.heading(2, self.section_label("milestones"));
        match &data.milestones {
            Some(summary) => {
                doc.bullet(self.template(
                    "milestones.achieved",
                    &[&summary.achieved.to_string(), &summary.expected.to_string()],
                ));
                if summary.delayed {
                    doc.bullet(self.locale.label_or("milestones.delayed", "Milestone delay flagged"));
                }
            }
            None => doc.paragraph(PLACEHOLDER),
        }
    }

    fn exam_section(&self, doc: &mut IntermediateDocument, data: &VisitReportData) {
        doc.heading(2, self.section_label("physical_exam"));
        let mut emitted = false;
        for group in &data.physical_exam {
            let findings: Vec<(&String, &String)> = group
                .findings
                .iter()
                .filter(|(_, value)| !value.trim().is_empty())
                .collect();
            if findings.is_empty() {
                continue;
            }
            doc.paragraph(group.label.clone());
            for (key, value) in findings {
                doc.bullet(format!("{}: {}", humanize(key), value.trim()));
            }
            emitted = true;
        }
        if !emitted {
            doc.paragraph(PLACEHOLDER);
        }
    }

    fn problems_section(&self, doc: &mut IntermediateDocument, data: &VisitReportData) {
        doc.heading(2, self.section_label("problems"));
        let rendered = render_problem_block(&data.problem_tokens, &data.problem_text, self.locale);
        let lines = normalize_lines(&rendered, self.locale.milestones_header());
        if lines.is_empty() {
            doc.paragraph(PLACEHOLDER);
        } else {
            for line in lines {
                doc.bullet(line);
            }
        }
    }

    fn previous_section(&self, doc: &mut IntermediateDocument, data: &VisitReportData) {
        doc.heading(2, self.section_label("previous"));
        if data.previous_findings.is_empty() {
            doc.paragraph(PLACEHOLDER);
            return;
        }
        for finding in &data.previous_findings {
            let date = finding
                .visit_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            doc.bullet(format!("{date}: {}", finding.summary.trim()));
        }
    }

    fn next_visit_section(&self, doc: &mut IntermediateDocument, data: &VisitReportData) {
        doc.heading(2, self.section_label("next_visit"));
        match data.meta.next_visit_date {
            Some(date) => doc.paragraph(date.format("%Y-%m-%d").to_string()),
            None => doc.paragraph(PLACEHOLDER),
        }
    }

    fn section_label(&self, section: &str) -> String {
        self.locale
            .label_or(&format!("section.{section}"), &humanize(section))
            .to_string()
    }

    fn field_label(&self, section: &str, key: &str) -> String {
        self.locale
            .label_or(&format!("field.{section}.{key}"), &humanize(key))
            .to_string()
    }

    fn header_label(&self, key: &str) -> String {
        self.locale
            .label_or(&format!("header.{key}"), &humanize(key))
            .to_string()
    }

    fn template(&self, key: &str, args: &[&str]) -> String {
        let mut out = self.locale.label_or(key, key).to_string();
        for (index, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{index}}}"), arg);
        }
        out
    }
}

fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || matches!(trimmed, "\u{2014}" | "-" | "--" | "?")
        || trimmed.eq_ignore_ascii_case("n/a")
}

/// Age banding: days only under one month, months plus days under six
/// months, months only through eleven months, then years with a month
/// remainder.
pub fn age_display(dob: NaiveDate, reference: NaiveDate) -> String {
    if reference <= dob {
        return "0d".to_string();
    }
    let mut months = (reference.year() - dob.year()) * 12 + reference.month() as i32
        - dob.month() as i32;
    if reference.day() < dob.day() {
        months -= 1;
    }
    let months = months.max(0) as u32;
    let anchor = dob
        .checked_add_months(Months::new(months))
        .unwrap_or(dob);
    let days = (reference - anchor).num_days().max(0);

    if months == 0 {
        format!("{days}d")
    } else if months < 6 {
        if days > 0 {
            format!("{months}m {days}d")
        } else {
            format!("{months}m")
        }
    } else if months < 12 {
        format!("{months}m")
    } else {
        let years = months / 12;
        let remainder = months % 12;
        if remainder > 0 {
            format!("{years}y {remainder}m")
        } else {
            format!("{years}y")
        }
    }
}
