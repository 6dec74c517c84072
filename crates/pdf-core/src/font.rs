//! Standard (base-14) fonts and PDF string encodings

use lopdf::{Dictionary, Object};

/// The Helvetica faces every PDF viewer ships with.
///
/// Text set in these faces is encoded with WinAnsiEncoding, which covers the
/// Latin-1 range (á, é, í, ó, ú, ñ, ü, º, ª, °) needed for Spanish documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// PostScript name used as `/BaseFont`
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Font dictionary for embedding as an indirect object
    pub fn to_pdf_dictionary(self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }

    /// Advance width of a character in 1/1000 em (Adobe AFM metrics)
    pub fn char_width(self, c: char) -> u16 {
        let base = latin_base(c);
        let bold = self == StandardFont::HelveticaBold;
        if base.is_ascii() && (' '..='~').contains(&base) {
            let idx = base as usize - 32;
            return if bold {
                HELVETICA_BOLD_WIDTHS[idx]
            } else {
                HELVETICA_WIDTHS[idx]
            };
        }
        match c {
            '°' => 400,
            'º' => 365,
            'ª' => 370,
            '–' => 556,
            '—' => 1000,
            _ => 556,
        }
    }

    /// Width of a string in points at the given size
    pub fn text_width(self, text: &str, font_size: f32) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 / 1000.0 * font_size as f64
    }
}

/// Map accented Latin-1 letters to their unaccented base for metric lookup
fn latin_base(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

/// Helvetica widths for ' ' ..= '~'
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold widths for ' ' ..= '~'
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// WinAnsi code points 0x80..=0x9F that differ from Latin-1
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x98, '˜'),
    (0x99, '™'),
    (0x9A, 'š'),
    (0x9B, '›'),
    (0x9C, 'œ'),
    (0x9E, 'ž'),
    (0x9F, 'Ÿ'),
];

/// Encode text as WinAnsiEncoding bytes
///
/// Characters outside the encoding are replaced with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect()
}

/// Characters of `text` that WinAnsiEncoding cannot represent, in order of
/// first appearance
pub fn unsupported_win_ansi(text: &str) -> Vec<char> {
    let mut missing = Vec::new();
    for c in text.chars() {
        if win_ansi_byte(c).is_none() && !missing.contains(&c) {
            missing.push(c);
        }
    }
    missing
}

fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if (0x20..0x7F).contains(&code) || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    WIN_ANSI_HIGH
        .iter()
        .find(|(_, ch)| *ch == c)
        .map(|(byte, _)| *byte)
}

/// Decode WinAnsiEncoding bytes to a Rust string
pub fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => WIN_ANSI_HIGH
                .iter()
                .find(|(byte, _)| *byte == b)
                .map(|(_, c)| *c)
                .unwrap_or('\u{FFFD}'),
            _ => b as char,
        })
        .collect()
}

/// Decode a PDF text string (UTF-16BE with BOM, or PDFDocEncoding)
///
/// PDFDocEncoding is decoded through the WinAnsi table; both agree on the
/// printable Latin-1 range that form values use in practice.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    decode_win_ansi(bytes)
}

/// Encode a PDF text string: plain bytes for ASCII, UTF-16BE with BOM otherwise
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
