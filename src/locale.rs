use std::collections::BTreeMap;

/// Glyph rendered for absent or empty optional content.
pub const PLACEHOLDER: &str = "\u{2014}";

/// Localized catalog plus the ordered namespaces used to resolve coded
/// token arguments. The built-in English table covers every key the
/// engine emits; callers can layer their own entries on top.
#[derive(Debug, Clone)]
pub struct Locale {
    catalog: BTreeMap<String, String>,
    namespaces: Vec<String>,
    /// Optional wrapper applied to rendered milestone items, e.g. "* ".
    pub item_prefix: Option<String>,
}

impl Locale {
    pub fn builtin_en() -> Self {
        let mut catalog = BTreeMap::new();
        for (key, value) in BUILTIN_EN {
            catalog.insert((*key).to_string(), (*value).to_string());
        }
        Self {
            catalog,
            namespaces: vec![
                "sick".to_string(),
                "well".to_string(),
                "milestone".to_string(),
                "milestone.status".to_string(),
                "result".to_string(),
                "result.mchat".to_string(),
            ],
            item_prefix: None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.catalog.insert(key.into(), value.into());
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.catalog.get(key).map(String::as_str)
    }

    pub fn label_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.label(key).unwrap_or(fallback)
    }

    pub fn milestones_header(&self) -> &str {
        self.label_or("milestones.header", "Milestones")
    }

    /// True when an argument looks like a coded key rather than literal
    /// text: dotted, at least two segments, lowercase ASCII word
    /// characters only.
    pub fn is_coded_key(arg: &str) -> bool {
        if !arg.contains('.') {
            return false;
        }
        arg.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
    }

    /// Ordered namespace lookup for a coded argument. Unresolved args are
    /// handed back verbatim; translation never fails.
    pub fn resolve_coded<'a>(&'a self, arg: &'a str) -> &'a str {
        self.lookup_coded(arg).unwrap_or(arg)
    }

    fn lookup_coded(&self, arg: &str) -> Option<&str> {
        if let Some(value) = self.label(arg) {
            return Some(value);
        }
        for namespace in &self.namespaces {
            if let Some(value) = self.label(&format!("{namespace}.{arg}")) {
                return Some(value);
            }
        }
        None
    }

    /// Coded-result fallback resolution (e.g. M-CHAT risk labels): exact
    /// match, then underscore/dot variants, then risk-suffix add/drop
    /// variants, else the raw code.
    pub fn resolve_result_code(&self, code: &str) -> String {
        let mut candidates = vec![code.to_string()];
        if code.contains('_') {
            candidates.push(code.replace('_', "."));
            candidates.push(code.replacen('_', ".", 1));
        }
        if code.contains('.') {
            candidates.push(code.replace('.', "_"));
        }
        if let Some(stripped) = code.strip_suffix("_risk") {
            candidates.push(stripped.to_string());
        } else {
            candidates.push(format!("{code}_risk"));
        }
        for candidate in &candidates {
            if let Some(resolved) = self.lookup_coded(candidate) {
                return resolved.to_string();
            }
        }
        code.to_string()
    }

    /// Section heading labels the package builder promotes to Heading1.
    pub fn heading_labels(&self) -> Vec<&str> {
        HEADING_KEYS
            .iter()
            .filter_map(|key| self.label(key))
            .collect()
    }

    pub fn visit_title(&self, well: bool) -> &str {
        if well {
            self.label_or("title.well", "Well-child visit")
        } else {
            self.label_or("title.sick", "Sick visit")
        }
    }

    pub fn patient_prefix(&self) -> &str {
        self.label_or("title.patient_prefix", "Patient: ")
    }

    pub fn title_separator(&self) -> &str {
        self.label_or("title.separator", " \u{2013} ")
    }

    pub fn fallback_title(&self) -> &str {
        self.label_or("title.fallback", "Visit report")
    }
}

/// Last dotted segment, underscores to spaces, first letter upper-cased.
pub fn humanize(key: &str) -> String {
    let base = key.rsplit('.').next().unwrap_or(key).replace('_', " ");
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => base,
    }
}

const HEADING_KEYS: &[&str] = &[
    "section.concerns",
    "section.feeding",
    "section.supplementation",
    "section.sleep",
    "section.stool",
    "section.development",
    "section.milestones",
    "section.measurements",
    "section.physical_exam",
    "section.problems",
    "section.conclusions",
    "section.guidance",
    "section.comments",
    "section.next_visit",
    "section.perinatal",
    "section.previous",
    "section.charts",
];

const BUILTIN_EN: &[(&str, &str)] = &[
    ("title.well", "Well-child visit"),
    ("title.sick", "Sick visit"),
    ("title.patient_prefix", "Patient: "),
    ("title.separator", " \u{2013} "),
    ("title.fallback", "Visit report"),
    ("section.concerns", "Parents' concerns"),
    ("section.feeding", "Feeding"),
    ("section.supplementation", "Supplementation"),
    ("section.sleep", "Sleep"),
    ("section.stool", "Stool"),
    ("section.development", "Development"),
    ("section.milestones", "Milestones"),
    ("section.measurements", "Measurements"),
    ("section.physical_exam", "Physical examination"),
    ("section.problems", "Problem listing"),
    ("section.conclusions", "Conclusions"),
    ("section.guidance", "Anticipatory guidance"),
    ("section.comments", "Clinician comments"),
    ("section.next_visit", "Next visit"),
    ("section.perinatal", "Perinatal summary"),
    ("section.previous", "Previous visit findings"),
    ("section.charts", "Growth charts"),
    ("milestones.header", "Milestones"),
    ("header.created", "Created"),
    ("header.updated", "Updated"),
    ("header.generated", "Generated"),
    ("header.dob", "DOB"),
    ("header.sex", "Sex"),
    ("header.age", "Age"),
    ("header.visit_date", "Visit date"),
    ("header.visit_type", "Visit type"),
    ("header.clinician", "Clinician"),
    ("header.mrn", "MRN"),
    ("milestones.achieved", "Achieved {0} of {1} expected milestones"),
    ("milestones.delayed", "Milestone delay flagged"),
    ("charts.summary", "{0}: {1} points, {2}\u{2013}{3} months"),
    ("charts.caption", "{0} for age"),
    ("metric.weight", "Weight"),
    ("metric.length", "Length/height"),
    ("metric.head_circumference", "Head circumference"),
    // Problem-token templates.
    ("problem.fact.v1", "{0}"),
    ("problem.measure.v1", "{0}: {1}"),
    ("problem.note.v1", "{0} ({1})"),
    ("milestone.delay.v1", "Delayed: {0}"),
    // Milestone item codes and status labels.
    ("milestone.social_smile", "Social smile"),
    ("milestone.head_control", "Head control"),
    ("milestone.rolls_over", "Rolls over"),
    ("milestone.sits_unsupported", "Sits unsupported"),
    ("milestone.babbles", "Babbles"),
    ("milestone.first_words", "First words"),
    ("milestone.walks_alone", "Walks alone"),
    ("milestone.status.achieved", "achieved"),
    ("milestone.status.emerging", "emerging"),
    ("milestone.status.not_yet", "not yet"),
    ("milestone.status.lost", "lost"),
    // Coded results.
    ("result.mchat.low_risk", "Low risk"),
    ("result.mchat.medium_risk", "Medium risk"),
    ("result.mchat.high_risk", "High risk"),
    // A few sick-visit codes; unresolved codes pass through verbatim.
    ("sick.hpi.complaint.fever", "Fever"),
    ("sick.hpi.complaint.cough", "Cough"),
    ("sick.hpi.feeding.reduced", "Reduced feeding"),
    ("sick.pe.lungs.clear", "Lungs clear"),
    ("sick.pe.ent.red_throat", "Red throat"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coded_key_heuristic() {
        assert!(Locale::is_coded_key("sick.hpi.complaint.fever"));
        assert!(Locale::is_coded_key("mchat.medium_risk"));
        assert!(!Locale::is_coded_key("plain text"));
        assert!(!Locale::is_coded_key("Fever"));
        assert!(!Locale::is_coded_key("trailing."));
    }

    #[test]
    fn namespace_lookup_resolves_short_codes() {
        let locale = Locale::builtin_en();
        assert_eq!(
            locale.resolve_coded("hpi.complaint.fever"),
            "Fever",
            "short code resolves through the sick namespace"
        );
        assert_eq!(locale.resolve_coded("unknown.code"), "unknown.code");
    }

    #[test]
    fn result_fallback_variants_match() {
        let locale = Locale::builtin_en();
        let canonical = locale.resolve_result_code("mchat.medium_risk");
        assert_eq!(canonical, "Medium risk");
        assert_eq!(locale.resolve_result_code("medium"), canonical);
        assert_eq!(locale.resolve_result_code("medium_risk"), canonical);
        assert_eq!(locale.resolve_result_code("mchat_medium_risk"), canonical);
        assert_eq!(locale.resolve_result_code("nonsense"), "nonsense");
    }

    #[test]
    fn humanize_uses_last_segment() {
        assert_eq!(humanize("field.feeding.mode"), "Mode");
        assert_eq!(humanize("head_circumference"), "Head circumference");
    }
}
