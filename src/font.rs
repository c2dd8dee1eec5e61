use crate::types::Pt;

/// The two base-14 faces the report uses; no font programs are embedded,
/// so measurement comes from built-in AFM width tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontId {
    Regular,
    Bold,
}

impl FontId {
    pub fn base_name(&self) -> &'static str {
        match self {
            FontId::Regular => "Helvetica",
            FontId::Bold => "Helvetica-Bold",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            FontId::Regular => "F1",
            FontId::Bold => "F2",
        }
    }
}

// Helvetica AFM widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

// Helvetica-Bold AFM widths for ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
    722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
    611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    500, 389, 280, 389, 584,
];

fn char_milliem(ch: char, font: FontId) -> u32 {
    let table = match font {
        FontId::Regular => &HELVETICA_WIDTHS,
        FontId::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let code = ch as u32;
    if (32..=126).contains(&code) {
        return table[(code - 32) as usize] as u32;
    }
    match ch {
        '\u{2022}' => 350,         // bullet
        '\u{2013}' => 556,         // en dash
        '\u{2014}' => 1000,        // em dash
        '\u{00a0}' => 278,         // nbsp
        _ => 556,
    }
}

pub fn text_width(text: &str, font: FontId, size: Pt) -> Pt {
    let milliem: u64 = text.chars().map(|ch| char_milliem(ch, font) as u64).sum();
    // width = sum(em/1000) * size
    Pt::from_milli((milliem as i64 * size.to_milli()) / 1000)
}

/// Greedy word wrap against a fixed width; over-long words fall back to a
/// character split so layout always makes progress.
pub fn wrap_lines(text: &str, font: FontId, size: Pt, max_width: Pt) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font, size) <= max_width || current.is_empty() {
            if text_width(word, font, size) > max_width && current.is_empty() {
                for piece in split_long_word(word, font, size, max_width) {
                    lines.push(piece);
                }
                current = lines.pop().unwrap_or_default();
            } else {
                current = candidate;
            }
        } else {
            lines.push(std::mem::take(&mut current));
            if text_width(word, font, size) > max_width {
                for piece in split_long_word(word, font, size, max_width) {
                    lines.push(piece);
                }
                current = lines.pop().unwrap_or_default();
            } else {
                current = word.to_string();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_long_word(word: &str, font: FontId, size: Pt, max_width: Pt) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if text_width(&candidate, font, size) > max_width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_size() {
        let narrow = text_width("iii", FontId::Regular, Pt::from_f32(10.0));
        let wide = text_width("WWW", FontId::Regular, Pt::from_f32(10.0));
        assert!(wide > narrow);
        let doubled = text_width("WWW", FontId::Regular, Pt::from_f32(20.0));
        assert_eq!(doubled.to_milli(), wide.to_milli() * 2);
    }

    #[test]
    fn wrap_respects_width_and_always_progresses() {
        let size = Pt::from_f32(11.0);
        let lines = wrap_lines(
            "feeding well and sleeping through the night most days",
            FontId::Regular,
            size,
            Pt::from_f32(120.0),
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FontId::Regular, size) <= Pt::from_f32(120.0));
        }

        let narrow = wrap_lines("incomprehensibilities", FontId::Regular, size, Pt::from_f32(30.0));
        assert!(narrow.len() > 1);
    }
}
