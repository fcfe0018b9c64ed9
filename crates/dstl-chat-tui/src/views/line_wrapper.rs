use ratatui::style::Style;
use textwrap::core::{Fragment, display_width};
use textwrap::wrap_algorithms::wrap_first_fit;
use unicode_width::UnicodeWidthChar;

/// A run of text sharing one style. Intermediate representation between
/// markdown layout and ratatui spans.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSpan {
    pub text: String,
    pub style: Style,
}

impl LineSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

pub fn line_width(spans: &[LineSpan]) -> usize {
    spans.iter().map(|span| display_width(&span.text)).sum()
}

/// Word-wrap styled text to `width` columns. Words longer than a line are
/// broken at character boundaries.
pub fn wrap_words(spans: &[LineSpan], width: usize) -> Vec<Vec<LineSpan>> {
    let width = width.max(1);
    let words: Vec<StyledWord> = split_words(spans)
        .into_iter()
        .flat_map(|word| word.break_to(width))
        .collect();

    let mut lines: Vec<Vec<LineSpan>> = wrap_first_fit(&words, &[width as f64])
        .into_iter()
        .map(|line| {
            let mut out = Vec::new();
            for (i, word) in line.iter().enumerate() {
                push_all(&mut out, &word.text);
                if i + 1 < line.len() {
                    push_all(&mut out, &word.whitespace);
                }
            }
            out
        })
        .collect();

    if lines.is_empty() {
        lines.push(Vec::new());
    }
    lines
}

/// Hard-wrap at character boundaries, keeping all whitespace.
pub fn wrap_chars(spans: &[LineSpan], width: usize) -> Vec<Vec<LineSpan>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut used = 0;
    let mut buf = [0u8; 4];

    for span in spans {
        for c in span.text.replace('\t', "    ").chars() {
            let char_width = c.width().unwrap_or(0);
            if used > 0 && used + char_width > width {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            push_merged(&mut current, c.encode_utf8(&mut buf), span.style);
            used += char_width;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// A word plus the whitespace that follows it. A word may span several
/// styles (`**bold**,` is one word).
#[derive(Debug, Default)]
struct StyledWord {
    text: Vec<LineSpan>,
    whitespace: Vec<LineSpan>,
    width: usize,
    whitespace_width: usize,
}

impl Fragment for StyledWord {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn whitespace_width(&self) -> f64 {
        self.whitespace_width as f64
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

impl StyledWord {
    /// Split a word wider than `width` into line-sized pieces. The last piece
    /// keeps the trailing whitespace.
    fn break_to(self, width: usize) -> Vec<StyledWord> {
        if self.width <= width {
            return vec![self];
        }

        let mut pieces = Vec::new();
        let mut piece = StyledWord::default();
        let mut buf = [0u8; 4];
        for span in &self.text {
            for c in span.text.chars() {
                let char_width = c.width().unwrap_or(0);
                if piece.width > 0 && piece.width + char_width > width {
                    pieces.push(std::mem::take(&mut piece));
                }
                push_merged(&mut piece.text, c.encode_utf8(&mut buf), span.style);
                piece.width += char_width;
            }
        }
        piece.whitespace = self.whitespace;
        piece.whitespace_width = self.whitespace_width;
        pieces.push(piece);
        pieces
    }
}

/// Group text into words with their trailing whitespace. Leading
/// whitespace is dropped.
fn split_words(spans: &[LineSpan]) -> Vec<StyledWord> {
    let mut words: Vec<StyledWord> = Vec::new();

    for span in spans {
        let mut rest = span.text.as_str();
        while let Some(first) = rest.chars().next() {
            let space = first.is_whitespace();
            let end = rest
                .char_indices()
                .find(|(_, c)| c.is_whitespace() != space)
                .map_or(rest.len(), |(i, _)| i);
            let piece = &rest[..end];
            rest = &rest[end..];

            if space {
                if let Some(word) = words.last_mut() {
                    push_merged(&mut word.whitespace, piece, span.style);
                    word.whitespace_width += display_width(piece);
                }
                continue;
            }
            match words.last_mut() {
                Some(word) if word.whitespace.is_empty() => {
                    push_merged(&mut word.text, piece, span.style);
                    word.width += display_width(piece);
                }
                _ => {
                    let mut word = StyledWord::default();
                    push_merged(&mut word.text, piece, span.style);
                    word.width = display_width(piece);
                    words.push(word);
                }
            }
        }
    }

    words
}

fn push_all(line: &mut Vec<LineSpan>, spans: &[LineSpan]) {
    for span in spans {
        push_merged(line, &span.text, span.style);
    }
}

fn push_merged(line: &mut Vec<LineSpan>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    match line.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => line.push(LineSpan::new(text, style)),
    }
}

#[cfg(test)]
mod tests {
    use ratatui::style::Modifier;

    use super::*;

    fn plain(text: &str) -> LineSpan {
        LineSpan::new(text, Style::default())
    }

    fn texts(lines: &[Vec<LineSpan>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let lines = wrap_words(&[plain("the quick brown fox jumps")], 10);
        assert_eq!(texts(&lines), vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_breaks_long_words() {
        let lines = wrap_words(&[plain("abcdefghij klm")], 4);
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij", "klm"]);
    }

    #[test]
    fn test_word_spanning_styles_stays_together() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let spans = [plain("aaaa "), LineSpan::new("bold", bold), plain(", rest")];
        let lines = wrap_words(&spans, 8);
        assert_eq!(texts(&lines), vec!["aaaa", "bold,", "rest"]);
        assert_eq!(lines[1][0], LineSpan::new("bold", bold));
    }

    #[test]
    fn test_inner_whitespace_keeps_its_style() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let spans = [plain("one "), LineSpan::new("two", bold), plain("  ")];
        let lines = wrap_words(&spans, 20);
        assert_eq!(lines, vec![vec![plain("one "), LineSpan::new("two", bold)]]);
    }

    #[test]
    fn test_wide_characters_count_double() {
        let lines = wrap_words(&[plain("日本語 テキスト")], 6);
        assert_eq!(texts(&lines), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn test_char_wrap_keeps_indentation() {
        let lines = wrap_chars(&[plain("    let x = 1;")], 8);
        assert_eq!(texts(&lines), vec!["    let ", "x = 1;"]);
    }

    #[test]
    fn test_empty_input_yields_one_line() {
        assert_eq!(wrap_words(&[], 10), vec![Vec::<LineSpan>::new()]);
        assert_eq!(line_width(&[plain("ab"), plain("日")]), 4);
    }
}
