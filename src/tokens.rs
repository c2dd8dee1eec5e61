use crate::locale::Locale;
use crate::normalize::{BULLET, strip_marker};
use crate::visit::ProblemToken;

const MILESTONE_ITEM_KEY: &str = "milestone.item.v1";
const MILESTONE_HEADER_KEY: &str = "milestones.header";

/// Renders an ordered token list into one bullet block. Every rendered
/// line carries exactly one leading bullet marker; a single deduplicated
/// milestones header precedes the first milestone-category token. When
/// nothing renders, the supplied plain text is returned verbatim.
/// Rendering never fails: unresolved keys degrade to the raw code.
pub fn render_problem_block(tokens: &[ProblemToken], fallback: &str, locale: &Locale) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut header_done = false;

    for token in tokens {
        if token.key == MILESTONE_HEADER_KEY {
            if !header_done {
                lines.push(locale.milestones_header().to_string());
                header_done = true;
            }
            continue;
        }
        if !header_done && token.key.starts_with("milestone.") {
            lines.push(locale.milestones_header().to_string());
            header_done = true;
        }
        let line = render_token(token, locale);
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        return fallback.to_string();
    }

    lines
        .iter()
        .map(|line| format!("{BULLET}{}", strip_marker(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_token(token: &ProblemToken, locale: &Locale) -> String {
    if token.key == MILESTONE_ITEM_KEY {
        return render_milestone_item(token, locale);
    }

    let resolved: Vec<String> = token
        .args
        .iter()
        .map(|arg| resolve_arg(arg, locale))
        .collect();

    match locale.label(&token.key) {
        Some(template) => apply_template(template, &resolved),
        None if resolved.is_empty() => token.key.clone(),
        None => format!("{}: {}", token.key, resolved.join(", ")),
    }
}

/// args = [code, statusCode, optionalNote]
fn render_milestone_item(token: &ProblemToken, locale: &Locale) -> String {
    let label = token
        .args
        .first()
        .map(|code| locale.resolve_coded(code).to_string())
        .unwrap_or_default();
    let status = token
        .args
        .get(1)
        .map(|code| locale.resolve_result_code(code))
        .unwrap_or_default();
    let mut line = if status.is_empty() {
        label
    } else {
        format!("{label} \u{2013} {status}")
    };
    if let Some(note) = token.args.get(2).filter(|note| !note.trim().is_empty()) {
        line.push_str(&format!(" ({})", note.trim()));
    }
    match &locale.item_prefix {
        Some(prefix) => format!("{prefix}{line}"),
        None => line,
    }
}

fn resolve_arg(arg: &str, locale: &Locale) -> String {
    if Locale::is_coded_key(arg) {
        locale.resolve_coded(arg).to_string()
    } else {
        arg.to_string()
    }
}

fn apply_template(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    for (index, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{index}}}"), arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(key: &str, args: &[&str]) -> ProblemToken {
        ProblemToken::new(key, args.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn coded_args_translate_and_literals_pass_through() {
        let locale = Locale::builtin_en();
        let block = render_problem_block(
            &[token("problem.measure.v1", &["sick.hpi.complaint.fever", "39.2 C"])],
            "",
            &locale,
        );
        assert_eq!(block, "\u{2022} Fever: 39.2 C");
    }

    #[test]
    fn milestone_item_renders_label_status_and_note() {
        let locale = Locale::builtin_en();
        let block = render_problem_block(
            &[token(
                "milestone.item.v1",
                &["milestone.social_smile", "achieved", "at 6 weeks"],
            )],
            "",
            &locale,
        );
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "\u{2022} Milestones",
                "\u{2022} Social smile \u{2013} achieved (at 6 weeks)"
            ]
        );
    }

    #[test]
    fn explicit_header_token_collapses_to_one() {
        let locale = Locale::builtin_en();
        let block = render_problem_block(
            &[
                token("milestones.header", &[]),
                token("milestone.item.v1", &["milestone.head_control", "not_yet"]),
                token("milestones.header", &[]),
            ],
            "",
            &locale,
        );
        assert_eq!(block.matches("\u{2022} Milestones").count(), 1);
        assert!(block.contains("Head control \u{2013} not yet"));
    }

    #[test]
    fn item_prefix_wraps_milestone_lines() {
        let mut locale = Locale::builtin_en();
        locale.item_prefix = Some("> ".to_string());
        let block = render_problem_block(
            &[token("milestone.item.v1", &["milestone.babbles", "emerging"])],
            "",
            &locale,
        );
        assert!(block.contains("\u{2022} > Babbles \u{2013} emerging"));
    }

    #[test]
    fn empty_render_falls_back_to_plain_text() {
        let locale = Locale::builtin_en();
        let block = render_problem_block(&[], "legacy free text", &locale);
        assert_eq!(block, "legacy free text");
    }

    #[test]
    fn unresolved_key_degrades_to_raw_code() {
        let locale = Locale::builtin_en();
        let block = render_problem_block(&[token("unknown.key.v9", &["arg"])], "", &locale);
        assert_eq!(block, "\u{2022} unknown.key.v9: arg");
    }
}
