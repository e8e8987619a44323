//! Glyph line aggregation.
//!
//! Glyphs whose `top` rounds to the same 0.1 unit form one visual line,
//! regardless of horizontal position. There is no column awareness: two
//! columns sharing a baseline merge into one line.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{round_to, Glyph, VisualLine};

/// Key for a `top` coordinate rounded to 0.1 unit.
fn top_key(top: f32) -> i64 {
    (top * 10.0).round() as i64
}

#[derive(Default)]
struct LineAccumulator {
    text: String,
    size_sum: f32,
    glyphs: usize,
    font_names: BTreeSet<String>,
}

/// Group one page's glyphs into visual lines ordered by ascending `top`.
///
/// Glyph order within a line is content stream order. Lines whose text is
/// blank after trimming are dropped.
pub fn aggregate_lines(page: u32, glyphs: &[Glyph]) -> Vec<VisualLine> {
    let mut lines: BTreeMap<i64, LineAccumulator> = BTreeMap::new();

    for glyph in glyphs {
        let acc = lines.entry(top_key(glyph.top)).or_default();
        acc.text.push(glyph.text);
        acc.size_sum += glyph.size;
        acc.glyphs += 1;
        if !acc.font_names.contains(&glyph.font_name) {
            acc.font_names.insert(glyph.font_name.clone());
        }
    }

    lines
        .into_iter()
        .filter_map(|(key, acc)| {
            let text = acc.text.trim();
            if text.is_empty() {
                return None;
            }
            let avg_size = acc.size_sum / acc.glyphs.max(1) as f32;
            Some(VisualLine {
                page,
                top: key as f32 / 10.0,
                text: text.to_string(),
                avg_size: round_to(avg_size, 1),
                font_names: acc.font_names,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{runs_to_glyphs, TextRun};

    fn glyphs(text: &str, top: f32, size: f32, font: &str) -> Vec<Glyph> {
        text.chars().map(|c| Glyph::new(c, top, size, font)).collect()
    }

    #[test]
    fn test_groups_by_rounded_top() {
        let mut all = glyphs("Hel", 100.02, 12.0, "Helvetica");
        all.extend(glyphs("lo", 99.98, 12.0, "Helvetica-Bold"));
        all.extend(glyphs("World", 120.0, 10.0, "Times"));

        let lines = aggregate_lines(1, &all);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[0].top, 100.0);
        assert_eq!(lines[0].font_names.len(), 2);
        assert_eq!(lines[1].text, "World");
        assert_eq!(lines[1].page, 1);
    }

    #[test]
    fn test_lines_sorted_top_to_bottom() {
        let mut all = glyphs("bottom", 300.0, 10.0, "F");
        all.extend(glyphs("top", 50.0, 10.0, "F"));
        all.extend(glyphs("middle", 150.0, 10.0, "F"));

        let texts: Vec<String> = aggregate_lines(1, &all).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn test_average_size_is_rounded_mean() {
        let mut all = glyphs("ab", 10.0, 10.0, "F");
        all.extend(glyphs("c", 10.0, 11.0, "F"));

        let lines = aggregate_lines(1, &all);
        // (10 + 10 + 11) / 3 = 10.333...
        assert_eq!(lines[0].avg_size, 10.3);
    }

    #[test]
    fn test_whitespace_lines_dropped_and_text_trimmed() {
        let mut all = glyphs("   ", 10.0, 10.0, "F");
        all.extend(glyphs("  padded ", 30.0, 10.0, "F"));

        let lines = aggregate_lines(2, &all);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "padded");
    }

    #[test]
    fn test_no_column_awareness() {
        let run = |text: &str, x: f32| TextRun {
            text: text.to_string(),
            x,
            top: 200.0,
            width: 20.0,
            size: 10.0,
            font_name: "F".to_string(),
        };
        let all = runs_to_glyphs(&[run("Left", 72.0), run("Right", 400.0)]);

        let lines = aggregate_lines(1, &all);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "LeftRight");
    }
}
