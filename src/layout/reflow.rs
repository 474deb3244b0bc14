/*!
 * Line wrapping for translated text.
 *
 * Widths are measured in terminal-style columns: East Asian wide characters
 * take two columns, combining marks none, everything else one.
 */

use crate::language_utils::Script;

/// Glyphs per em used to turn a pixel width into a column budget
const COLUMNS_PER_EM: u32 = 2;

/// Code point ranges rendered at double width
const WIDE_RANGES: &[(u32, u32)] = &[
    (0x1100, 0x115F),   // Hangul Jamo initials
    (0x2E80, 0x303E),   // CJK radicals, symbols and punctuation
    (0x3041, 0x33FF),   // Kana, CJK compatibility
    (0x3400, 0x4DBF),   // CJK extension A
    (0x4E00, 0x9FFF),   // CJK unified ideographs
    (0xA000, 0xA4CF),   // Yi
    (0xAC00, 0xD7A3),   // Hangul syllables
    (0xF900, 0xFAFF),   // CJK compatibility ideographs
    (0xFE30, 0xFE4F),   // CJK compatibility forms
    (0xFF00, 0xFF60),   // Fullwidth forms
    (0xFFE0, 0xFFE6),   // Fullwidth signs
    (0x20000, 0x2FFFD), // Supplementary ideographic plane
    (0x30000, 0x3FFFD), // Tertiary ideographic plane
];

/// Column width of a single character
pub fn char_width(c: char) -> usize {
    let cp = c as u32;
    if (0x0300..=0x036F).contains(&cp) {
        return 0;
    }
    if WIDE_RANGES.iter().any(|(lo, hi)| (*lo..=*hi).contains(&cp)) {
        2
    } else {
        1
    }
}

/// Column width of a string
pub fn text_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

struct Token {
    text: String,
    width: usize,
    space_before: bool,
}

/// Wraps text to a column budget
pub struct Reflow;

impl Reflow {
    /// Number of columns that fit in `box_width` pixels at `font_size` pixels
    pub fn column_budget(box_width: u32, font_size: u32) -> usize {
        let per_column = (font_size / COLUMNS_PER_EM).max(1);
        ((box_width / per_column) as usize).max(1)
    }

    /// Wrap `text` so that no line exceeds `width` columns and join the lines
    /// with `\n`. Latin text breaks at whitespace; fullwidth text may also
    /// break before or after any wide character. Words longer than the budget
    /// are broken hard.
    pub fn wrap(text: &str, width: usize, script: Script) -> String {
        let width = width.max(1);
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        let mut line_width = 0;

        for token in tokenize(text, script) {
            let separator = usize::from(line_width > 0 && token.space_before);
            if line_width + separator + token.width <= width {
                if separator == 1 {
                    line.push(' ');
                }
                line.push_str(&token.text);
                line_width += separator + token.width;
                continue;
            }

            if line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if token.width <= width {
                line = token.text;
                line_width = token.width;
                continue;
            }

            for c in token.text.chars() {
                let w = char_width(c);
                if line_width > 0 && line_width + w > width {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(c);
                line_width += w;
            }
        }

        if !line.is_empty() {
            lines.push(line);
        }

        lines.join("\n")
    }
}

fn tokenize(text: &str, script: Script) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut pending_space = false;

    let flush = |word: &mut String, tokens: &mut Vec<Token>, space: &mut bool| {
        if !word.is_empty() {
            tokens.push(Token {
                width: text_width(word),
                text: std::mem::take(word),
                space_before: *space,
            });
            *space = false;
        }
    };

    for c in text.chars() {
        if c.is_whitespace() {
            flush(&mut word, &mut tokens, &mut pending_space);
            pending_space = !tokens.is_empty();
            continue;
        }

        if script == Script::Fullwidth && char_width(c) == 2 {
            flush(&mut word, &mut tokens, &mut pending_space);
            tokens.push(Token {
                text: c.to_string(),
                width: 2,
                space_before: pending_space,
            });
            pending_space = false;
            continue;
        }

        word.push(c);
    }
    flush(&mut word, &mut tokens, &mut pending_space);

    tokens
}
