use std::collections::HashSet;

/// Explicit separator token legacy blocks may carry instead of newlines.
pub const SEPARATOR: &str = " || ";

/// Uniform bullet marker re-added to every normalized line.
pub const BULLET: &str = "\u{2022} ";

/// Strips a pre-existing bullet marker and the whitespace after it. A
/// leading dash is not a marker here; dash runs carry meaning for the
/// milestone-header rule and are handled separately.
pub(crate) fn strip_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    for marker in ['\u{2022}', '*', '\u{00b7}'] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Bullet content beginning with a run of hyphen/en-dash/em-dash.
pub(crate) fn is_dash_content(content: &str) -> bool {
    content
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '-' | '\u{2013}' | '\u{2014}'))
}

pub(crate) fn strip_dash_run(content: &str) -> &str {
    content
        .trim_start_matches(['-', '\u{2013}', '\u{2014}'])
        .trim_start()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical dedup key: trim, strip marker, collapse whitespace,
/// casefold, and collapse a trailing "(N word)" parenthetical to "(N)"
/// when the word already occurs earlier in the same line. Makes "(18)"
/// and "(18 teeth)" collide.
pub(crate) fn canonical_key(line: &str) -> String {
    let mut key = collapse_whitespace(strip_marker(line.trim())).to_lowercase();
    if key.ends_with(')') {
        if let Some(open) = key.rfind('(') {
            let inside = &key[open + 1..key.len() - 1];
            let words: Vec<&str> = inside.split_whitespace().collect();
            if words.len() >= 2 && words[0].bytes().all(|b| b.is_ascii_digit()) {
                let before = &key[..open];
                // Whole-word match only; "(3 s)" must not collapse just
                // because some earlier word happens to contain an "s".
                let occurs_before = |word: &str| {
                    before
                        .split_whitespace()
                        .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == word)
                };
                if words[1..].iter().any(|word| occurs_before(word)) {
                    key = format!("{}({})", before, words[0]);
                }
            }
        }
    }
    key
}

fn split_raw(input: &str) -> Vec<&str> {
    if input.contains(SEPARATOR) {
        input.split(SEPARATOR).collect()
    } else {
        input.lines().collect()
    }
}

/// Normalizes one logical bullet block into bare line contents: markers
/// stripped, the localized milestones header inserted once per contiguous
/// dash run, dash runs removed, duplicates collapsed (first wins).
/// Idempotent: feeding the output back in reproduces it exactly.
pub fn normalize_lines(input: &str, header: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut in_dash_run = false;

    let mut push_unique = |line: &str, out: &mut Vec<String>, seen: &mut HashSet<String>| {
        let line = collapse_whitespace(line);
        if line.is_empty() {
            return;
        }
        if seen.insert(canonical_key(&line)) {
            out.push(line);
        }
    };

    for raw in split_raw(input) {
        let content = strip_marker(raw.trim());
        if content.is_empty() {
            continue;
        }
        if is_dash_content(content) {
            if !in_dash_run {
                push_unique(header, &mut out, &mut seen);
                in_dash_run = true;
            }
            push_unique(strip_dash_run(content), &mut out, &mut seen);
        } else {
            in_dash_run = false;
            push_unique(content, &mut out, &mut seen);
        }
    }
    out
}

/// Same normalization with the uniform marker re-added to every line.
pub fn normalize_block(input: &str, header: &str) -> String {
    normalize_lines(input, header)
        .iter()
        .map(|line| format!("{BULLET}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Milestones";

    #[test]
    fn dash_lines_get_one_header_and_lose_dashes() {
        let input = "\u{2022} - social smile\n\u{2022} \u{2013} head control\n\u{2022} - rolls over";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(
            lines,
            vec!["Milestones", "social smile", "head control", "rolls over"]
        );
        let block = normalize_block(input, HEADER);
        assert_eq!(block.matches("\u{2022} Milestones").count(), 1);
        assert!(!block.contains("- "));
    }

    #[test]
    fn idempotent_on_mixed_input() {
        let input = "Feeding well\n\u{2022} - social smile\nTeeth: 4\n- head control";
        let once = normalize_block(input, HEADER);
        let twice = normalize_block(&once, HEADER);
        assert_eq!(once, twice);
    }

    #[test]
    fn explicit_header_collapses_with_inserted_one() {
        let input = "\u{2022} Milestones\n\u{2022} - social smile";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Milestones", "social smile"]);
    }

    #[test]
    fn numeric_parenthetical_duplicates_collapse() {
        let input = "\u{2022} Teeth: 18 (18)\n\u{2022} Teeth: 18 (18 teeth)";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Teeth: 18 (18)"]);

        // First occurrence wins in either order.
        let input = "\u{2022} Teeth: 18 (18 teeth)\n\u{2022} Teeth: 18 (18)";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Teeth: 18 (18 teeth)"]);
    }

    #[test]
    fn parenthetical_collapse_requires_a_whole_word_match() {
        // "s" is a substring of "laps" but not a word of its own, so
        // these two lines stay distinct.
        let input = "\u{2022} Runs 3 laps (3 s)\n\u{2022} Runs 3 laps (3)";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Runs 3 laps (3 s)", "Runs 3 laps (3)"]);

        // Punctuation on the earlier word does not defeat the match.
        assert_eq!(
            canonical_key("Teeth: 18 (18 teeth)"),
            canonical_key("Teeth: 18 (18)")
        );
    }

    #[test]
    fn separator_token_splits_when_present() {
        let input = "Feeding well || Sleeping through || Feeding   well";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Feeding well", "Sleeping through"]);
    }

    #[test]
    fn two_dash_runs_get_two_headers_but_dedup_keeps_one() {
        let input = "- smiles\nplain note\n- waves";
        let lines = normalize_lines(input, HEADER);
        assert_eq!(lines, vec!["Milestones", "smiles", "plain note", "waves"]);
    }
}
