//! Message body rendering.
//!
//! Message content is parsed into a small structural tree ([`Block`] and
//! [`Inline`] nodes) that front ends lay out however suits them. Styling that
//! depends on who wrote the message lives in [`RolePalette`].

mod autolink;
mod palette;
mod parser;

pub use palette::{LinkPolicy, RolePalette, Rgb};
pub use parser::parse;

use crate::models::Role;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    /// Level is 1..=3; deeper headings are clamped to 3.
    Heading { level: u8, content: Vec<Inline> },
    /// Ordered when `start` is set.
    List { start: Option<u64>, items: Vec<ListItem> },
    /// `language` is set for fenced blocks with an info string.
    CodeBlock { language: Option<String>, code: String },
    Quote(Vec<Block>),
    Table { header: Vec<Vec<Inline>>, rows: Vec<Vec<Vec<Inline>>> },
    Rule,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    /// Task list state, `None` for plain items.
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link { url: String, children: Vec<Inline> },
    SoftBreak,
    HardBreak,
}

/// A parsed message body together with the styling for its author.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedMessage {
    pub role: Role,
    pub palette: RolePalette,
    pub link_policy: LinkPolicy,
    pub blocks: Vec<Block>,
}

pub fn render_message(content: &str, role: Role) -> RenderedMessage {
    RenderedMessage {
        role,
        palette: RolePalette::for_role(role),
        link_policy: LinkPolicy::default(),
        blocks: parse(content),
    }
}

impl Inline {
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            push_inline_text(inline, &mut out);
        }
        out
    }
}

fn push_inline_text(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text(text) | Inline::Code(text) => out.push_str(text),
        Inline::Strong(children)
        | Inline::Emphasis(children)
        | Inline::Strikethrough(children)
        | Inline::Link { children, .. } => {
            for child in children {
                push_inline_text(child, out);
            }
        }
        Inline::SoftBreak => out.push(' '),
        Inline::HardBreak => out.push('\n'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_code_use_role_palette() {
        let user = render_message("**bold** and `code`", Role::User);
        assert_eq!(
            user.blocks,
            vec![Block::Paragraph(vec![
                Inline::Strong(vec![Inline::Text("bold".into())]),
                Inline::Text(" and ".into()),
                Inline::Code("code".into()),
            ])]
        );
        assert_eq!(user.palette.code_bg, Rgb::BLUE_400);
        assert_eq!(user.palette.code_fg, Rgb::WHITE);

        let assistant = render_message("**bold** and `code`", Role::Assistant);
        assert_eq!(assistant.blocks, user.blocks);
        assert_eq!(assistant.palette.code_bg, Rgb::GRAY_100);
        assert_eq!(assistant.palette.code_fg, Rgb::GRAY_800);
    }

    #[test]
    fn test_inline_plain_text_drops_markup() {
        let rendered = render_message("**bold** [link](https://a.io) `x`\nnext", Role::Assistant);
        let Block::Paragraph(content) = &rendered.blocks[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(Inline::plain_text(content), "bold link x next");
    }

    #[test]
    fn test_links_open_in_new_context() {
        let rendered = render_message("[docs](https://example.com)", Role::User);
        assert!(rendered.link_policy.new_context);
        assert!(rendered.link_policy.no_referrer);
        assert!(rendered.link_policy.no_opener);
        assert_eq!(rendered.palette.link, Rgb::BLUE_100);
    }
}
