use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use super::{Block, Inline, ListItem, autolink};

/// Parse markdown (with tables, strikethrough and task lists) into blocks.
pub fn parse(content: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(content, options) {
        builder.event(event);
    }
    builder.finish()
}

enum SpanKind {
    Strong,
    Emphasis,
    Strikethrough,
    Link(String),
}

/// One open element. Every `Start` event pushes exactly one frame and every
/// `End` event pops one, so unsupported elements are tracked as `Skip`.
enum Frame {
    Quote(Vec<Block>),
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    /// Tight list items carry their text directly; it is collected in `loose`
    /// until a block or the end of the item turns it into a paragraph.
    Item {
        checked: Option<bool>,
        blocks: Vec<Block>,
        loose: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    Span(SpanKind, Vec<Inline>),
    Code {
        language: Option<String>,
        code: String,
    },
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Row {
        head: bool,
        cells: Vec<Vec<Inline>>,
    },
    Cell(Vec<Inline>),
    Skip,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Block>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => match self.stack.last_mut() {
                Some(Frame::Code { code, .. }) => code.push_str(&text),
                _ => self.push_inline(Inline::Text(text.into_string())),
            },
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => self.push_block(Block::Rule),
            Event::TaskListMarker(done) => {
                let item = self.stack.iter_mut().rev().find_map(|frame| match frame {
                    Frame::Item { checked, .. } => Some(checked),
                    _ => None,
                });
                if let Some(slot) = item {
                    *slot = Some(done);
                }
            }
            // Raw HTML, footnote references and math are not rendered.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading(heading_level(level), Vec::new()),
            Tag::BlockQuote(_) => Frame::Quote(Vec::new()),
            Tag::CodeBlock(kind) => Frame::Code {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::List(start) => Frame::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                checked: None,
                blocks: Vec::new(),
                loose: Vec::new(),
            },
            Tag::Table(_) => Frame::Table {
                header: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead => Frame::Row {
                head: true,
                cells: Vec::new(),
            },
            Tag::TableRow => Frame::Row {
                head: false,
                cells: Vec::new(),
            },
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Span(SpanKind::Emphasis, Vec::new()),
            Tag::Strong => Frame::Span(SpanKind::Strong, Vec::new()),
            Tag::Strikethrough => Frame::Span(SpanKind::Strikethrough, Vec::new()),
            // Images cannot be shown inline; keep the alt text as a link.
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                Frame::Span(SpanKind::Link(dest_url.into_string()), Vec::new())
            }
            _ => Frame::Skip,
        };
        self.stack.push(frame);
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Paragraph(content) => {
                if !content.is_empty() {
                    self.push_block(Block::Paragraph(with_autolinks(content)));
                }
            }
            Frame::Heading(level, content) => self.push_block(Block::Heading {
                level,
                content: with_autolinks(content),
            }),
            Frame::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Frame::Code { language, mut code } => {
                if code.ends_with('\n') {
                    code.pop();
                }
                self.push_block(Block::CodeBlock { language, code });
            }
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Item {
                checked,
                mut blocks,
                loose,
            } => {
                if !loose.is_empty() {
                    blocks.push(Block::Paragraph(with_autolinks(loose)));
                }
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem { checked, blocks });
                }
            }
            Frame::Table { header, rows } => self.push_block(Block::Table { header, rows }),
            Frame::Row { head, cells } => {
                if let Some(Frame::Table { header, rows }) = self.stack.last_mut() {
                    if head {
                        *header = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            Frame::Cell(content) => {
                if let Some(Frame::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(with_autolinks(content));
                }
            }
            Frame::Span(kind, children) => {
                // Text inside an explicit link is never linked again.
                let children = if matches!(kind, SpanKind::Link(_)) || self.inside_link() {
                    children
                } else {
                    with_autolinks(children)
                };
                let inline = match kind {
                    SpanKind::Strong => Inline::Strong(children),
                    SpanKind::Emphasis => Inline::Emphasis(children),
                    SpanKind::Strikethrough => Inline::Strikethrough(children),
                    SpanKind::Link(url) => Inline::Link { url, children },
                };
                self.push_inline(inline);
            }
            Frame::Skip => {}
        }
    }

    fn inside_link(&self) -> bool {
        self.stack
            .iter()
            .any(|frame| matches!(frame, Frame::Span(SpanKind::Link(_), _)))
    }

    fn push_inline(&mut self, inline: Inline) {
        let target = match self.stack.last_mut() {
            Some(Frame::Paragraph(content))
            | Some(Frame::Heading(_, content))
            | Some(Frame::Span(_, content))
            | Some(Frame::Cell(content))
            | Some(Frame::Item { loose: content, .. }) => content,
            Some(Frame::Skip) | Some(Frame::Code { .. }) => return,
            // Stray inline content at block level becomes its own paragraph.
            _ => {
                self.push_block(Block::Paragraph(with_autolinks(vec![inline])));
                return;
            }
        };

        if let Inline::Text(next) = &inline {
            if let Some(Inline::Text(last)) = target.last_mut() {
                last.push_str(next);
                return;
            }
        }
        target.push(inline);
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            None => self.root.push(block),
            Some(Frame::Quote(blocks)) => blocks.push(block),
            Some(Frame::Item { blocks, loose, .. }) => {
                if !loose.is_empty() {
                    blocks.push(Block::Paragraph(with_autolinks(std::mem::take(loose))));
                }
                blocks.push(block);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        while !self.stack.is_empty() {
            self.end();
        }
        self.root
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        _ => 3,
    }
}

fn with_autolinks(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.extend(autolink::split(&text)),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn paragraph(s: &str) -> Block {
        Block::Paragraph(vec![text(s)])
    }

    #[test]
    fn test_headings_clamp_to_three_levels() {
        let blocks = parse("# One\n\n### Three\n\n###### Six");
        let levels: Vec<u8> = blocks
            .iter()
            .map(|b| match b {
                Block::Heading { level, .. } => *level,
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(levels, vec![1, 3, 3]);
    }

    #[test]
    fn test_tight_and_ordered_lists() {
        let blocks = parse("3. first\n4. second");
        assert_eq!(
            blocks,
            vec![Block::List {
                start: Some(3),
                items: vec![
                    ListItem {
                        checked: None,
                        blocks: vec![paragraph("first")],
                    },
                    ListItem {
                        checked: None,
                        blocks: vec![paragraph("second")],
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_nested_list_keeps_item_text_first() {
        let blocks = parse("- outer\n  - inner");
        let Block::List { start: None, items } = &blocks[0] else {
            panic!("expected unordered list");
        };
        assert_eq!(items[0].blocks[0], paragraph("outer"));
        assert!(matches!(items[0].blocks[1], Block::List { start: None, .. }));
    }

    #[test]
    fn test_task_list_markers() {
        let blocks = parse("- [x] done\n- [ ] todo");
        let Block::List { items, .. } = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].checked, Some(true));
        assert_eq!(items[1].checked, Some(false));
        assert_eq!(items[1].blocks, vec![paragraph("todo")]);
    }

    #[test]
    fn test_fenced_code_language_vs_indented() {
        let blocks = parse("```rust ignore\nfn main() {}\n```\n\n    plain code\n");
        assert_eq!(
            blocks,
            vec![
                Block::CodeBlock {
                    language: Some("rust".into()),
                    code: "fn main() {}".into(),
                },
                Block::CodeBlock {
                    language: None,
                    code: "plain code".into(),
                },
            ]
        );
    }

    #[test]
    fn test_quote_contains_blocks() {
        let blocks = parse("> quoted *text*");
        assert_eq!(
            blocks,
            vec![Block::Quote(vec![Block::Paragraph(vec![
                text("quoted "),
                Inline::Emphasis(vec![text("text")]),
            ])])]
        );
    }

    #[test]
    fn test_table_and_strikethrough() {
        let blocks = parse("| a | b |\n|---|---|\n| ~~x~~ | y |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                header: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![
                    vec![Inline::Strikethrough(vec![text("x")])],
                    vec![text("y")],
                ]],
            }]
        );
    }

    #[test]
    fn test_explicit_link_is_not_split_again() {
        let blocks = parse("[https://a.io](https://b.io) and https://c.io");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Link {
                    url: "https://b.io".into(),
                    children: vec![text("https://a.io")],
                },
                text(" and "),
                Inline::Link {
                    url: "https://c.io".into(),
                    children: vec![text("https://c.io")],
                },
            ])]
        );
    }

    #[test]
    fn test_styled_url_inside_link_stays_text() {
        let blocks = parse("[**https://x.io**](https://y.io)");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Link {
                url: "https://y.io".into(),
                children: vec![Inline::Strong(vec![text("https://x.io")])],
            }])]
        );
    }

    #[test]
    fn test_breaks_and_rule() {
        let blocks = parse("line one\nline two  \nline three\n\n---");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![
                    text("line one"),
                    Inline::SoftBreak,
                    text("line two"),
                    Inline::HardBreak,
                    text("line three"),
                ]),
                Block::Rule,
            ]
        );
    }

    #[test]
    fn test_raw_html_is_dropped() {
        let blocks = parse("<div>hidden</div>\n\nshown <b>x</b>");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![text("shown x")])]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("   \n").is_empty());
    }
}
