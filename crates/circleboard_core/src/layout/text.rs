//! Label measurement and wrapping for SVG text.
//!
//! Widths are estimated from character counts, not real glyph metrics. The
//! estimate is stable across platforms, which keeps layouts deterministic.

/// Average glyph width as a fraction of the font size.
pub const CHAR_WIDTH_RATIO: f64 = 0.55;

/// Appended to labels that had to be shortened.
pub const ELLIPSIS: char = '\u{2026}';

/// Estimated rendered width of `text` at `font_size`.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * CHAR_WIDTH_RATIO
}

/// Greedily packs words into at most `max_lines` lines of `max_width`.
///
/// Words wider than the budget are broken by characters. When the text needs
/// more lines than allowed, the last kept line ends in [`ELLIPSIS`].
/// No returned line is wider than `max_width`, except when the budget is
/// narrower than one character: every line carries at least one character.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64, max_lines: usize) -> Vec<String> {
    if max_lines == 0 {
        return Vec::new();
    }

    let fits = |value: &str| estimate_text_width(value, font_size) <= max_width;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
            continue;
        }

        for ch in word.chars() {
            current.push(ch);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = ellipsize(last, max_width, font_size);
        }
    }
    lines
}

/// Returns `text` unchanged when it fits, otherwise a shortened copy ending
/// in [`ELLIPSIS`].
pub fn truncate_to_width(text: &str, max_width: f64, font_size: f64) -> String {
    if estimate_text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    ellipsize(text, max_width, font_size)
}

fn ellipsize(line: &str, max_width: f64, font_size: f64) -> String {
    let mut kept: Vec<char> = line.chars().collect();
    loop {
        let mut candidate: String = kept.iter().collect::<String>().trim_end().to_string();
        candidate.push(ELLIPSIS);
        if kept.is_empty() || estimate_text_width(&candidate, font_size) <= max_width {
            return candidate;
        }
        kept.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::{estimate_text_width, truncate_to_width, wrap_text, ELLIPSIS};

    #[test]
    fn width_scales_with_chars_and_font_size() {
        assert_eq!(estimate_text_width("", 12.0), 0.0);
        let narrow = estimate_text_width("abcd", 10.0);
        assert!((narrow - 22.0).abs() < 1e-9);
        assert!(estimate_text_width("abcd", 20.0) > narrow);
        // Counts chars, not bytes.
        assert_eq!(
            estimate_text_width("Grün", 10.0),
            estimate_text_width("Grun", 10.0)
        );
    }

    #[test]
    fn short_label_stays_on_one_line() {
        let lines = wrap_text("Vorstand", 200.0, 12.0, 3);
        assert_eq!(lines, vec!["Vorstand".to_string()]);
    }

    #[test]
    fn words_pack_greedily() {
        let max_width = estimate_text_width("Kita Garten", 10.0);
        let lines = wrap_text("Kita Garten Team Nord", max_width, 10.0, 5);
        assert_eq!(lines, vec!["Kita Garten", "Team Nord"]);
    }

    #[test]
    fn long_compound_label_wraps_and_ellipsizes() {
        let max_width = estimate_text_width("12345678", 12.0);
        let lines = wrap_text("Elterndienst-Koordination und Planung", max_width, 12.0, 3);

        assert!(lines.len() > 1);
        assert_eq!(lines.len(), 3);
        let last = lines.last().expect("at least one line");
        assert!(last.ends_with(ELLIPSIS));
        for line in &lines {
            assert!(
                estimate_text_width(line, 12.0) <= max_width,
                "line `{line}` exceeds budget"
            );
        }
    }

    #[test]
    fn zero_max_lines_or_blank_text_yields_nothing() {
        assert!(wrap_text("Finanzen", 100.0, 12.0, 0).is_empty());
        assert!(wrap_text("   ", 100.0, 12.0, 2).is_empty());
    }

    #[test]
    fn truncate_keeps_fitting_text_and_shortens_long_text() {
        assert_eq!(truncate_to_width("Kasse", 100.0, 10.0), "Kasse");

        let max_width = estimate_text_width("Schatzm", 10.0);
        let truncated = truncate_to_width("Schatzmeisterin", max_width, 10.0);
        assert!(truncated.ends_with(ELLIPSIS));
        assert!(estimate_text_width(&truncated, 10.0) <= max_width);
        assert_eq!(truncated, "Schatz\u{2026}");
    }

    #[test]
    fn truncate_with_tiny_budget_returns_bare_ellipsis() {
        assert_eq!(truncate_to_width("Protokoll", 1.0, 10.0), ELLIPSIS.to_string());
    }
}
