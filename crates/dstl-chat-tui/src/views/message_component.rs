use dstl_chat_core::Role;
use dstl_chat_core::markdown::{self, Block, Inline, ListItem, RolePalette, Rgb};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use super::line_wrapper::{LineSpan, line_width, wrap_chars, wrap_words};

/// Bubbles take at most this share of the message pane.
const BUBBLE_PERCENT: usize = 70;

pub fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Lay out one message as a bubble `width` columns wide at most.
/// User bubbles are right-aligned, assistant bubbles left-aligned.
pub fn message_lines(content: &str, role: Role, width: u16, pending: bool) -> Vec<Line<'static>> {
    let width = width as usize;
    let rendered = markdown::render_message(content, role);
    let styles = BubbleStyles::new(&rendered.palette, pending);

    let max_bubble = (width * BUBBLE_PERCENT / 100).clamp(3.min(width), width);
    let inner = max_bubble.saturating_sub(2).max(1);

    let mut wrapped: Vec<Vec<LineSpan>> = Vec::new();
    for row in block_rows(&rendered.blocks, &styles, styles.base, true) {
        wrapped.extend(row.layout(inner));
    }
    if wrapped.is_empty() {
        wrapped.push(Vec::new());
    }

    let content_width = wrapped.iter().map(|l| line_width(l)).max().unwrap_or(0).max(1);
    let bubble_width = content_width + 2;
    let indent = match role {
        Role::User => width.saturating_sub(bubble_width),
        Role::Assistant => 0,
    };

    wrapped
        .into_iter()
        .map(|spans| {
            let fill = content_width.saturating_sub(line_width(&spans));
            let mut line = Vec::with_capacity(spans.len() + 4);
            if indent > 0 {
                line.push(Span::raw(" ".repeat(indent)));
            }
            line.push(Span::styled(" ", styles.base));
            line.extend(spans.into_iter().map(|s| Span::styled(s.text, s.style)));
            line.push(Span::styled(" ".repeat(fill + 1), styles.base));
            Line::from(line)
        })
        .collect()
}

/// Status caption shown under a pending bubble.
pub fn pending_caption(label: &str, role: Role, width: u16) -> Line<'static> {
    let indent = match role {
        Role::User => (width as usize).saturating_sub(label.width() + 1),
        Role::Assistant => 1,
    };
    Line::from(vec![
        Span::raw(" ".repeat(indent)),
        Span::styled(
            label.to_string(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ])
}

struct BubbleStyles {
    base: Style,
    code: Style,
    link: Style,
    quote_bar: Style,
}

impl BubbleStyles {
    fn new(palette: &RolePalette, pending: bool) -> Self {
        let mut base = Style::default()
            .fg(color(palette.bubble_fg))
            .bg(color(palette.bubble_bg));
        if pending {
            base = base.add_modifier(Modifier::DIM);
        }
        Self {
            base,
            code: base.fg(color(palette.code_fg)).bg(color(palette.code_bg)),
            link: base.fg(color(palette.link)).add_modifier(Modifier::UNDERLINED),
            quote_bar: base.fg(color(palette.quote_border)),
        }
    }
}

enum RowBody {
    Words(Vec<LineSpan>),
    Preformatted(Vec<LineSpan>),
    Rule(Style),
}

/// One logical line of a bubble before wrapping. `first_prefix` goes on the
/// first wrapped line and `prefix` on the rest (list markers, quote bars).
struct Row {
    first_prefix: Vec<LineSpan>,
    prefix: Vec<LineSpan>,
    body: RowBody,
}

impl Row {
    fn new(body: RowBody) -> Self {
        Self {
            first_prefix: Vec::new(),
            prefix: Vec::new(),
            body,
        }
    }

    fn blank() -> Self {
        Self::new(RowBody::Words(Vec::new()))
    }

    fn prepend(&mut self, first: LineSpan, rest: LineSpan) {
        self.first_prefix.insert(0, first);
        self.prefix.insert(0, rest);
    }

    fn layout(self, width: usize) -> Vec<Vec<LineSpan>> {
        let prefix_width = line_width(&self.first_prefix).max(line_width(&self.prefix));
        let available = width.saturating_sub(prefix_width).max(1);

        let lines = match self.body {
            RowBody::Words(spans) => wrap_words(&spans, available),
            RowBody::Preformatted(spans) => wrap_chars(&spans, available),
            RowBody::Rule(style) => vec![vec![LineSpan::new("─".repeat(available), style)]],
        };

        lines
            .into_iter()
            .enumerate()
            .map(|(i, spans)| {
                let mut line = if i == 0 {
                    self.first_prefix.clone()
                } else {
                    self.prefix.clone()
                };
                line.extend(spans);
                line
            })
            .collect()
    }
}

fn block_rows(blocks: &[Block], styles: &BubbleStyles, base: Style, gap: bool) -> Vec<Row> {
    let mut rows = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if gap && i > 0 {
            rows.push(Row::blank());
        }
        rows.extend(single_block_rows(block, styles, base));
    }
    rows
}

fn single_block_rows(block: &Block, styles: &BubbleStyles, base: Style) -> Vec<Row> {
    match block {
        Block::Paragraph(content) => inline_rows(content, styles, base),
        Block::Heading { level, content } => {
            let style = match *level {
                1 => base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                _ => base.add_modifier(Modifier::BOLD),
            };
            inline_rows(content, styles, style)
        }
        Block::List { start, items } => list_rows(*start, items, styles, base),
        Block::CodeBlock { language, code } => code_rows(language.as_deref(), code, styles),
        Block::Quote(blocks) => {
            let mut rows = block_rows(blocks, styles, base.add_modifier(Modifier::ITALIC), true);
            for row in &mut rows {
                row.prepend(
                    LineSpan::new("▌ ", styles.quote_bar),
                    LineSpan::new("▌ ", styles.quote_bar),
                );
            }
            rows
        }
        Block::Table { header, rows } => table_rows(header, rows, base),
        Block::Rule => vec![Row::new(RowBody::Rule(base.add_modifier(Modifier::DIM)))],
    }
}

fn list_rows(start: Option<u64>, items: &[ListItem], styles: &BubbleStyles, base: Style) -> Vec<Row> {
    let mut rows = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let mut marker = match start {
            Some(first) => format!("{}. ", first + i as u64),
            None => "• ".to_string(),
        };
        match item.checked {
            Some(true) => marker.push_str("[x] "),
            Some(false) => marker.push_str("[ ] "),
            None => {}
        }
        let indent = " ".repeat(marker.width());

        let mut item_rows = block_rows(&item.blocks, styles, base, false);
        if item_rows.is_empty() {
            item_rows.push(Row::blank());
        }
        for (j, row) in item_rows.iter_mut().enumerate() {
            let first = if j == 0 { &marker } else { &indent };
            row.prepend(LineSpan::new(first.as_str(), base), LineSpan::new(indent.as_str(), base));
        }
        rows.extend(item_rows);
    }
    rows
}

fn code_rows(language: Option<&str>, code: &str, styles: &BubbleStyles) -> Vec<Row> {
    let mut rows = Vec::new();
    if let Some(language) = language {
        rows.push(Row::new(RowBody::Preformatted(vec![LineSpan::new(
            language,
            styles.base.add_modifier(Modifier::DIM | Modifier::ITALIC),
        )])));
    }

    let lines: Vec<String> = code.lines().map(|l| l.replace('\t', "    ")).collect();
    let block_width = lines.iter().map(|l| l.width()).max().unwrap_or(0);
    for line in lines {
        let padded = format!(" {line}{} ", " ".repeat(block_width - line.width()));
        rows.push(Row::new(RowBody::Preformatted(vec![LineSpan::new(
            padded,
            styles.code,
        )])));
    }
    rows
}

fn table_rows(header: &[Vec<Inline>], body: &[Vec<Vec<Inline>>], base: Style) -> Vec<Row> {
    let cells = |row: &[Vec<Inline>]| -> Vec<String> {
        row.iter().map(|cell| Inline::plain_text(cell)).collect()
    };
    let header = cells(header);
    let body: Vec<Vec<String>> = body.iter().map(|row| cells(row.as_slice())).collect();

    let columns = body.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in std::iter::once(&header).chain(&body) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let format_row = |row: &[String]| -> String {
        (0..columns)
            .map(|i| {
                let cell = row.get(i).map_or("", String::as_str);
                format!("{cell}{}", " ".repeat(widths[i] - cell.width()))
            })
            .collect::<Vec<_>>()
            .join(" │ ")
    };

    let mut rows = Vec::new();
    if !header.is_empty() {
        rows.push(Row::new(RowBody::Preformatted(vec![LineSpan::new(
            format_row(header.as_slice()),
            base.add_modifier(Modifier::BOLD),
        )])));
        let rule = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        rows.push(Row::new(RowBody::Preformatted(vec![LineSpan::new(
            rule,
            base.add_modifier(Modifier::DIM),
        )])));
    }
    for row in &body {
        rows.push(Row::new(RowBody::Preformatted(vec![LineSpan::new(
            format_row(row.as_slice()),
            base,
        )])));
    }
    rows
}

/// Inline content split into rows at hard breaks.
fn inline_rows(content: &[Inline], styles: &BubbleStyles, base: Style) -> Vec<Row> {
    let mut lines = vec![Vec::new()];
    push_inlines(content, styles, base, &mut lines);
    lines
        .into_iter()
        .map(|spans| Row::new(RowBody::Words(spans)))
        .collect()
}

fn push_inlines(
    content: &[Inline],
    styles: &BubbleStyles,
    style: Style,
    lines: &mut Vec<Vec<LineSpan>>,
) {
    for inline in content {
        match inline {
            Inline::Text(text) => push_text(lines, text, style),
            Inline::Strong(children) => {
                push_inlines(children, styles, style.add_modifier(Modifier::BOLD), lines)
            }
            Inline::Emphasis(children) => {
                push_inlines(children, styles, style.add_modifier(Modifier::ITALIC), lines)
            }
            Inline::Strikethrough(children) => push_inlines(
                children,
                styles,
                style.add_modifier(Modifier::CROSSED_OUT),
                lines,
            ),
            Inline::Code(code) => push_text(lines, code, styles.code),
            Inline::Link { url, children } => {
                let link_style = styles.link.add_modifier(style.add_modifier);
                push_inlines(children, styles, link_style, lines);
                if Inline::plain_text(children) != *url {
                    push_text(lines, &format!(" <{url}>"), style.add_modifier(Modifier::DIM));
                }
            }
            Inline::SoftBreak => push_text(lines, " ", style),
            Inline::HardBreak => lines.push(Vec::new()),
        }
    }
}

fn push_text(lines: &mut Vec<Vec<LineSpan>>, text: &str, style: Style) {
    if let Some(line) = lines.last_mut() {
        line.push(LineSpan::new(text.replace('\n', " "), style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_user_bubble_is_right_aligned() {
        let lines = message_lines("hi", Role::User, 40, false);
        assert_eq!(lines.len(), 1);
        let text = text_of(&lines[0]);
        assert_eq!(text.width(), 40);
        assert_eq!(text, format!("{} hi ", " ".repeat(36)));
    }

    #[test]
    fn test_assistant_bubble_is_left_aligned() {
        let lines = message_lines("hello", Role::Assistant, 40, false);
        assert_eq!(text_of(&lines[0]), " hello ");
        assert_eq!(
            lines[0].spans[0].style.bg,
            Some(color(RolePalette::for_role(Role::Assistant).bubble_bg))
        );
    }

    #[test]
    fn test_bubble_width_is_capped() {
        let content = "word ".repeat(40);
        for line in message_lines(&content, Role::Assistant, 50, false) {
            assert!(text_of(&line).width() <= 35);
        }
        for line in message_lines(&content, Role::User, 50, false) {
            let text = text_of(&line);
            assert_eq!(text.width(), 50);
            assert!(text.starts_with(&" ".repeat(15)));
        }
    }

    #[test]
    fn test_bold_and_inline_code_styles() {
        let lines = message_lines("**bold** and `code`", Role::User, 60, false);
        let spans = &lines[0].spans;

        let bold = spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));

        let code = spans.iter().find(|s| s.content == "code").unwrap();
        assert_eq!(code.style.bg, Some(color(Rgb::BLUE_400)));
        assert_eq!(code.style.fg, Some(color(Rgb::WHITE)));

        let lines = message_lines("**bold** and `code`", Role::Assistant, 60, false);
        let code = lines[0].spans.iter().find(|s| s.content == "code").unwrap();
        assert_eq!(code.style.bg, Some(color(Rgb::GRAY_100)));
    }

    #[test]
    fn test_lists_quotes_and_code_blocks() {
        let content = "1. first\n2. second\n\n> note\n\n```sh\nls\n```";
        let lines: Vec<String> = message_lines(content, Role::Assistant, 80, false)
            .iter()
            .map(|l| text_of(l).trim_end().to_string())
            .collect();
        assert_eq!(
            lines,
            vec![" 1. first", " 2. second", "", " ▌ note", "", " sh", "  ls"]
        );
    }

    #[test]
    fn test_quote_bar_uses_role_colour() {
        let lines = message_lines("> quoted", Role::User, 40, false);
        let bar = lines[0].spans.iter().find(|s| s.content == "▌ ").unwrap();
        assert_eq!(bar.style.fg, Some(color(Rgb::BLUE_300)));
    }

    #[test]
    fn test_pending_bubble_is_dimmed() {
        let lines = message_lines("hi", Role::User, 20, true);
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::DIM));
        assert_eq!(text_of(&pending_caption("sending…", Role::User, 20)).width(), 19);
    }
}
