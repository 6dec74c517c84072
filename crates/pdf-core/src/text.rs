//! Text rendering utilities

use crate::document::Color;
use crate::font::encode_win_ansi;
use crate::{Align, StandardFont};

/// A piece of text set in a single face
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: StandardFont,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font: StandardFont) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }

    /// Run in the regular face
    pub fn regular(text: impl Into<String>) -> Self {
        Self::new(text, StandardFont::Helvetica)
    }

    /// Run in the bold face
    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, StandardFont::HelveticaBold)
    }

    /// Width in points at the given size
    pub fn width(&self, font_size: f32) -> f64 {
        self.font.text_width(&self.text, font_size)
    }
}

/// Context for rendering one line of text
pub struct TextRenderContext {
    /// Font size in points
    pub font_size: f32,
    /// Line width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Escape bytes for a PDF literal string
///
/// Non-ASCII bytes are written as octal escapes so the content stream stays 7-bit.
fn literal_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out.push(')');
    out
}

/// Generate PDF operators for one line of text
///
/// Each run carries its own font resource name; runs follow each other on the
/// same baseline, the viewer advances the pen by the real glyph widths.
///
/// # Arguments
/// * `runs` - (font resource name, text) pairs
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    runs: &[(String, &str)],
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let mut ops = String::new();

    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };

    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));
    ops.push_str(&format!("{} {y} Td\n", x + x_offset));

    for (resource, text) in runs {
        ops.push_str(&format!("/{} {} Tf\n", resource, ctx.font_size));
        ops.push_str(&literal_string(&encode_win_ansi(text)));
        ops.push_str(" Tj\n");
    }

    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Break runs into lines no wider than `max_width` points
///
/// Splits on whitespace; a word keeps the face of the run it came from and a
/// word wider than the line is placed on a line of its own. Adjacent words in
/// the same face are merged back into a single run.
pub fn wrap_runs(runs: &[TextRun], max_width: f64, font_size: f32) -> Vec<Vec<TextRun>> {
    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();
    let mut current_width = 0.0;

    for run in runs {
        for word in run.text.split_whitespace() {
            let word_width = run.font.text_width(word, font_size);
            let space_width = run.font.text_width(" ", font_size);

            if !current.is_empty() && current_width + space_width + word_width > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if current.is_empty() {
                current.push(TextRun::new(word, run.font));
                current_width = word_width;
                continue;
            }

            current_width += space_width + word_width;
            let last = current.len() - 1;
            current[last].text.push(' ');
            if current[last].font == run.font {
                current[last].text.push_str(word);
            } else {
                current.push(TextRun::new(word, run.font));
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(width: f64) -> TextRenderContext {
        TextRenderContext {
            font_size: 12.0,
            text_width: width,
            color: Color::black(),
        }
    }

    fn line_text(line: &[TextRun]) -> String {
        line.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(literal_string(b"a(b)c\\"), "(a\\(b\\)c\\\\)");
        assert_eq!(literal_string(&[b'n', 0xF1]), "(n\\361)");
    }

    #[test]
    fn test_generate_text_operators_left() {
        let runs = vec![("LF1".to_string(), "Hola")];
        let ops = generate_text_operators(&runs, 100.0, 700.0, Align::Left, &ctx(100.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("BT"));
        assert!(ops_str.contains("/LF1 12 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("(Hola) Tj"));
        assert!(ops_str.contains("ET"));
    }

    #[test]
    fn test_generate_text_operators_center() {
        let runs = vec![("LF2".to_string(), "Test")];
        let ops = generate_text_operators(&runs, 200.0, 600.0, Align::Center, &ctx(100.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("150 600 Td"));
    }

    #[test]
    fn test_generate_text_operators_right() {
        let runs = vec![("LF1".to_string(), "Right")];
        let ops = generate_text_operators(&runs, 300.0, 500.0, Align::Right, &ctx(80.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("220 500 Td"));
    }

    #[test]
    fn test_generate_text_operators_mixed_faces() {
        let runs = vec![
            ("LF1".to_string(), "con matrícula "),
            ("LF2".to_string(), "AB-1234"),
        ];
        let ops = generate_text_operators(&runs, 50.0, 500.0, Align::Left, &ctx(0.0));
        let ops_str = String::from_utf8(ops).unwrap();

        let regular = ops_str.find("/LF1 12 Tf").unwrap();
        let bold = ops_str.find("/LF2 12 Tf").unwrap();
        assert!(regular < bold);
        assert!(ops_str.contains("(con matr\\355cula ) Tj"));
        assert!(ops_str.contains("(AB-1234) Tj"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let context = TextRenderContext {
            font_size: 12.0,
            text_width: 10.0,
            color: Color::rgb(1.0, 0.0, 0.0),
        };
        let runs = vec![("LF1".to_string(), "A")];
        let ops = generate_text_operators(&runs, 100.0, 700.0, Align::Left, &context);
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("1 0 0 rg"));
    }

    #[test]
    fn test_wrap_runs_single_line() {
        let runs = vec![TextRun::regular("Corto")];
        let lines = wrap_runs(&runs, 500.0, 12.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Corto");
    }

    #[test]
    fn test_wrap_runs_breaks_on_width() {
        let runs = vec![TextRun::regular("uno dos tres cuatro cinco seis siete")];
        let lines = wrap_runs(&runs, 60.0, 12.0);
        assert!(lines.len() > 1);
        for line in &lines {
            let width: f64 = line.iter().map(|r| r.width(12.0)).sum();
            // a single long word may overflow, but never two
            assert!(width <= 60.0 || !line_text(line).contains(' '));
        }
        let joined: Vec<String> = lines.iter().map(|l| line_text(l)).collect();
        assert_eq!(joined.join(" "), "uno dos tres cuatro cinco seis siete");
    }

    #[test]
    fn test_wrap_runs_keeps_faces() {
        let runs = vec![
            TextRun::regular("declaro que"),
            TextRun::bold("Ana García"),
            TextRun::regular("con DNI"),
        ];
        let lines = wrap_runs(&runs, 1000.0, 12.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            vec![
                TextRun::regular("declaro que "),
                TextRun::bold("Ana García "),
                TextRun::regular("con DNI"),
            ]
        );
    }

    #[test]
    fn test_wrap_runs_long_word_own_line() {
        let runs = vec![TextRun::regular("a Supercalifragilisticoespialidoso b")];
        let lines = wrap_runs(&runs, 40.0, 12.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "Supercalifragilisticoespialidoso");
    }

    #[test]
    fn test_wrap_runs_empty() {
        assert!(wrap_runs(&[], 100.0, 12.0).is_empty());
        assert!(wrap_runs(&[TextRun::regular("   ")], 100.0, 12.0).is_empty());
    }
}
