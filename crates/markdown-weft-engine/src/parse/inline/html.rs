//! Inline HTML spans, comments, and `<scheme:...>` / `<user@host>`
//! autolinks.
//!
//! The tag scanner validates against a fixed, deliberately permissive
//! grammar: tags, closing tags, comments, processing instructions and
//! declarations, single-pass and character-class driven. It is not an HTML
//! parser.

use crate::ast::{LinkData, NodeId, NodeKind};

use super::super::Parser;
use super::super::blocks::html::inline_html_comment_len;
use super::super::scanners::{is_alnum, is_space};
use super::links::unescape_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutolinkKind {
    None,
    Normal,
    Email,
}

/// `'<'`: an HTML span, a comment, or an angle autolink.
pub(crate) fn left_angle(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let data = &data[offset..];
    let (kind, mut end) = tag_length(data);
    let comment = inline_html_comment_len(data);
    if comment > 0 {
        end = comment;
    }
    if end > 2 {
        if kind != AutolinkKind::None && comment == 0 {
            let mut u_link = Vec::new();
            unescape_text(&mut u_link, &data[1..end - 1]);
            if !u_link.is_empty() {
                let destination = if kind == AutolinkKind::Email && !u_link.starts_with(b"mailto:")
                {
                    let mut d = b"mailto:".to_vec();
                    d.extend_from_slice(&u_link);
                    d
                } else {
                    u_link.clone()
                };
                let node = p.tree.new_node(NodeKind::Link(LinkData {
                    destination,
                    ..Default::default()
                }));
                let text = p.tree.new_text(strip_mailto(&u_link));
                p.tree.append_child(node, text);
                return (end, Some(node));
            }
        } else {
            let node = p.tree.new_node(NodeKind::HtmlSpan);
            p.tree[node].literal = data[..end].to_vec();
            return (end, Some(node));
        }
    }
    (end, None)
}

fn strip_mailto(link: &[u8]) -> &[u8] {
    if let Some(rest) = link.strip_prefix(b"mailto://") {
        rest
    } else if let Some(rest) = link.strip_prefix(b"mailto:") {
        rest
    } else {
        link
    }
}

/// Returns the autolink kind and length of the tag at the head of `data`,
/// or length 0 if it is not valid.
fn tag_length(data: &[u8]) -> (AutolinkKind, usize) {
    // a valid tag can't be shorter than 3 bytes
    if data.len() < 3 {
        return (AutolinkKind::None, 0);
    }
    if data[0] != b'<' {
        return (AutolinkKind::None, 0);
    }
    let mut i = if data[1] == b'/' { 2 } else { 1 };

    if !is_alnum(data[i]) {
        return (AutolinkKind::None, 0);
    }

    // scheme test: letters, digits, '.', '+' or '-' up to a colon
    let mut autolink = AutolinkKind::None;
    while i < data.len() && (is_alnum(data[i]) || matches!(data[i], b'.' | b'+' | b'-')) {
        i += 1;
    }

    if i > 1 && i < data.len() && data[i] == b'@' {
        let j = is_mailto_auto_link(&data[i..]);
        if j != 0 {
            return (AutolinkKind::Email, i + j);
        }
    }

    if i > 2 && i < data.len() && data[i] == b':' {
        autolink = AutolinkKind::Normal;
        i += 1;
    }

    if i >= data.len() {
        autolink = AutolinkKind::None;
    } else if autolink != AutolinkKind::None {
        // the rest of an autolink allows no whitespace or quotes
        let j = i;
        while i < data.len() {
            if data[i] == b'\\' {
                i += 2;
            } else if data[i] == b'>' || data[i] == b'\'' || data[i] == b'"' || is_space(data[i]) {
                break;
            } else {
                i += 1;
            }
        }
        if i >= data.len() {
            return (autolink, 0);
        }
        if i > j && data[i] == b'>' {
            return (autolink, i + 1);
        }
        // a forbidden byte was found
        autolink = AutolinkKind::None;
    }

    // fall back to a generic tag: anything up to the closing angle
    match data[i..].iter().position(|&c| c == b'>') {
        Some(rest) => (autolink, i + rest + 1),
        None => (autolink, 0),
    }
}

/// Matches the address part of an email autolink up to `>`. The address
/// is assumed to be `[-@._a-zA-Z0-9]+` with exactly one `@`.
fn is_mailto_auto_link(data: &[u8]) -> usize {
    let mut nb = 0;
    for (i, &c) in data.iter().enumerate() {
        if is_alnum(c) {
            continue;
        }
        match c {
            b'@' => nb += 1,
            b'-' | b'.' | b'_' => {}
            b'>' => {
                return if nb == 1 { i + 1 } else { 0 };
            }
            _ => return 0,
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::super::super::{Parser, ParserOptions};
    use crate::ast::{NodeId, NodeKind, Tree};

    fn inline_parse(input: &[u8]) -> (Tree, NodeId) {
        let mut p = Parser::new(ParserOptions::default());
        let para = p.tree.new_node(NodeKind::Paragraph);
        let root = p.tree.root();
        p.tree.append_child(root, para);
        p.inline(para, input);
        (p.tree, para)
    }

    fn kinds(tree: &Tree, parent: NodeId) -> Vec<&'static str> {
        tree.children(parent)
            .iter()
            .map(|&c| tree[c].kind.name())
            .collect()
    }

    #[test]
    fn angle_autolink_url() {
        let (tree, para) = inline_parse(b"see <http://example.com> now");
        assert_eq!(kinds(&tree, para), vec!["Text", "Link", "Text"]);
        let link = tree.children(para)[1];
        match &tree[link].kind {
            NodeKind::Link(d) => assert_eq!(d.destination, b"http://example.com"),
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn angle_autolink_email() {
        let (tree, para) = inline_parse(b"<user@example.com>");
        let link = tree.children(para)[0];
        match &tree[link].kind {
            NodeKind::Link(d) => assert_eq!(d.destination, b"mailto:user@example.com"),
            other => panic!("expected link, got {other:?}"),
        }
        // the rendered text drops the mailto prefix
        let text = tree.children(link)[0];
        assert_eq!(tree[text].literal, b"user@example.com");
    }

    #[test]
    fn html_span_tag() {
        let (tree, para) = inline_parse(b"a <em class=\"x\">b</em> c");
        let k = kinds(&tree, para);
        assert_eq!(k, vec!["Text", "HtmlSpan", "Text", "HtmlSpan", "Text"]);
        let open = tree.children(para)[1];
        assert_eq!(tree[open].literal, b"<em class=\"x\">");
    }

    #[test]
    fn html_comment_span() {
        let (tree, para) = inline_parse(b"a <!-- note --> b");
        assert_eq!(kinds(&tree, para), vec!["Text", "HtmlSpan", "Text"]);
        let span = tree.children(para)[1];
        assert_eq!(tree[span].literal, b"<!-- note -->");
    }

    #[test]
    fn bare_less_than_is_text() {
        let (tree, para) = inline_parse(b"1 < 2");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn unclosed_tag_is_text() {
        let (tree, para) = inline_parse(b"a <em b");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn autolink_with_space_is_not_a_link() {
        let (tree, para) = inline_parse(b"<http://a b>");
        // the grammar rejects it as an autolink but keeps it as a tag span
        assert!(!kinds(&tree, para).contains(&"Link"));
    }

    #[test]
    fn closing_tag_span() {
        let (tree, para) = inline_parse(b"</div>");
        assert_eq!(kinds(&tree, para), vec!["HtmlSpan"]);
    }
}
