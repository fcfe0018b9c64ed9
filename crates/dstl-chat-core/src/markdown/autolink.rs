//! Bare URL detection in text runs (`https://…`, `http://…`, `www.…`).

use linkify::{LinkFinder, LinkKind};

use super::Inline;

/// Split a text run into plain text and link nodes.
pub(crate) fn split(text: &str) -> Vec<Inline> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]).url_must_have_scheme(false);

    let mut out: Vec<Inline> = Vec::new();
    for span in finder.spans(text) {
        let literal = span.as_str();
        match span.kind() {
            Some(LinkKind::Url) if is_autolink_literal(literal) => {
                let url = if has_prefix(literal, "www.") {
                    format!("http://{literal}")
                } else {
                    literal.to_string()
                };
                out.push(Inline::Link {
                    url,
                    children: vec![Inline::Text(literal.to_string())],
                });
            }
            _ => match out.last_mut() {
                Some(Inline::Text(last)) => last.push_str(literal),
                _ => out.push(Inline::Text(literal.to_string())),
            },
        }
    }
    out
}

/// Only scheme links and `www.` hosts count; bare domains stay text.
fn is_autolink_literal(literal: &str) -> bool {
    ["https://", "http://", "www."]
        .iter()
        .any(|prefix| has_prefix(literal, prefix) && literal.len() > prefix.len())
}

fn has_prefix(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(literal: &str, url: &str) -> Inline {
        Inline::Link {
            url: url.to_string(),
            children: vec![Inline::Text(literal.to_string())],
        }
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(split("no links here"), vec![Inline::Text("no links here".into())]);
    }

    #[test]
    fn test_https_link_in_sentence() {
        assert_eq!(
            split("see https://example.com/a?b=1. thanks"),
            vec![
                Inline::Text("see ".into()),
                link("https://example.com/a?b=1", "https://example.com/a?b=1"),
                Inline::Text(". thanks".into()),
            ]
        );
    }

    #[test]
    fn test_www_gets_scheme() {
        assert_eq!(
            split("www.rust-lang.org"),
            vec![link("www.rust-lang.org", "http://www.rust-lang.org")]
        );
    }

    #[test]
    fn test_unbalanced_paren_is_trimmed() {
        assert_eq!(
            split("(http://example.com/x_(y))"),
            vec![
                Inline::Text("(".into()),
                link("http://example.com/x_(y)", "http://example.com/x_(y)"),
                Inline::Text(")".into()),
            ]
        );
    }

    #[test]
    fn test_requires_word_boundary_and_host() {
        assert_eq!(split("xhttp://a.b"), vec![Inline::Text("xhttp://a.b".into())]);
        assert_eq!(split("http://"), vec![Inline::Text("http://".into())]);
    }

    #[test]
    fn test_bare_domain_is_not_a_link() {
        assert_eq!(
            split("mail example.com today"),
            vec![Inline::Text("mail example.com today".into())]
        );
    }

    #[test]
    fn test_multibyte_text_around_link() {
        assert_eq!(
            split("ünïcode https://ex.am/ple ✓"),
            vec![
                Inline::Text("ünïcode ".into()),
                link("https://ex.am/ple", "https://ex.am/ple"),
                Inline::Text(" ✓".into()),
            ]
        );
    }
}
