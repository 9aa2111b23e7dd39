//! Emphasis, strong, strikethrough and sub/superscript.
//!
//! Matching is delimiter counting, not regex: scan forward for the next
//! same-class delimiter run, skipping code spans and link labels so their
//! contents cannot close emphasis opened outside them. Triple runs try the
//! combined strong+emph form first and fall back to the nested forms.

use crate::ast::{NodeId, NodeKind};

use super::super::scanners::is_space;
use super::super::{Extensions, Parser};

/// `'*'` / `'_'` (and `'~'` via [`tilde`]): dispatch on the delimiter run
/// length at the current offset.
pub(crate) fn emphasis(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let data = &data[offset..];
    let c = data[0];

    if data.len() > 2 && data[1] != c {
        // single delimiter: whitespace cannot follow the opener, and
        // strikethrough has no single-tilde form
        if c == b'~' || is_space(data[1]) {
            return (0, None);
        }
        let (ret, node) = helper_emphasis(p, &data[1..], c);
        if ret == 0 {
            return (0, None);
        }
        return (ret + 1, node);
    }

    if data.len() > 3 && data[1] == c && data[2] != c {
        if is_space(data[2]) {
            return (0, None);
        }
        let (ret, node) = helper_double_emphasis(p, &data[2..], c);
        if ret == 0 {
            return (0, None);
        }
        return (ret + 2, node);
    }

    if data.len() > 4 && data[1] == c && data[2] == c && data[3] != c {
        if c == b'~' || is_space(data[3]) {
            return (0, None);
        }
        let (ret, node) = helper_triple_emphasis(p, data, 3, c);
        if ret == 0 {
            return (0, None);
        }
        return (ret + 3, node);
    }

    (0, None)
}

/// `'~'`: strikethrough for a double run, subscript for a single one.
pub(crate) fn tilde(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    if p.extensions.contains(Extensions::STRIKETHROUGH) {
        let (consumed, node) = emphasis(p, data, offset);
        if consumed > 0 {
            return (consumed, node);
        }
    }
    if p.extensions.contains(Extensions::SUPER_SUBSCRIPT) {
        return script_span(p, data, offset, NodeKind::Subscript);
    }
    (0, None)
}

/// `'^'`: superscript (only registered when footnotes don't claim `^`).
pub(crate) fn caret(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    script_span(p, data, offset, NodeKind::Superscript)
}

/// `~x~` / `^x^`: a single-delimiter span with no spaces inside.
fn script_span(
    p: &mut Parser,
    data: &[u8],
    offset: usize,
    kind: NodeKind,
) -> (usize, Option<NodeId>) {
    let data = &data[offset..];
    let c = data[0];
    if data.len() < 3 || data[1] == c {
        return (0, None);
    }
    let mut i = 1;
    while i < data.len() && data[i] != c {
        if is_space(data[i]) || data[i] == b'\n' {
            return (0, None);
        }
        i += 1;
    }
    if i >= data.len() {
        return (0, None);
    }
    let node = p.tree.new_node(kind);
    p.tree[node].literal = data[1..i].to_vec();
    (i + 1, Some(node))
}

/// Finds the next closing-candidate `c`, skipping code spans and link
/// constructs so their interiors stay opaque. Returns 0 when none is
/// found.
fn helper_find_emph_char(data: &[u8], c: u8) -> usize {
    let mut i = 0;

    while i < data.len() {
        while i < data.len() && data[i] != c && data[i] != b'`' && data[i] != b'[' {
            i += 1;
        }
        if i >= data.len() {
            return 0;
        }
        // do not count escaped chars
        if i != 0 && data[i - 1] == b'\\' {
            i += 1;
            continue;
        }
        if data[i] == c {
            return i;
        }

        if data[i] == b'`' {
            // skip a code span, remembering a candidate inside it in case
            // the span never closes
            let mut tmp = 0;
            i += 1;
            while i < data.len() && data[i] != b'`' {
                if tmp == 0 && data[i] == c {
                    tmp = i;
                }
                i += 1;
            }
            if i >= data.len() {
                return tmp;
            }
            i += 1;
        } else if data[i] == b'[' {
            // skip a link label and, if present, its target
            let mut tmp = 0;
            i += 1;
            while i < data.len() && data[i] != b']' {
                if tmp == 0 && data[i] == c {
                    tmp = i;
                }
                i += 1;
            }
            i += 1;
            while i < data.len() && (data[i] == b' ' || data[i] == b'\n') {
                i += 1;
            }
            if i >= data.len() {
                return tmp;
            }
            if data[i] != b'[' && data[i] != b'(' {
                // not a link after all
                if tmp > 0 {
                    return tmp;
                }
                continue;
            }
            let cc = data[i];
            i += 1;
            while i < data.len() && data[i] != cc {
                if tmp == 0 && data[i] == c {
                    return i;
                }
                i += 1;
            }
            if i >= data.len() {
                return tmp;
            }
            i += 1;
        }
    }
    0
}

fn helper_emphasis(p: &mut Parser, data: &[u8], c: u8) -> (usize, Option<NodeId>) {
    let mut i = 0;

    // skip one symbol if coming from the triple-run fallback
    if data.len() > 1 && data[0] == c && data[1] == c {
        i = 1;
    }

    while i < data.len() {
        let length = helper_find_emph_char(&data[i..], c);
        if length == 0 {
            return (0, None);
        }
        i += length;
        if i >= data.len() {
            return (0, None);
        }

        if i + 1 < data.len() && data[i + 1] == c {
            i += 1;
            continue;
        }

        if data[i] == c && !is_space(data[i - 1]) {
            if p.extensions.contains(Extensions::NO_INTRA_EMPHASIS)
                && !(i + 1 == data.len()
                    || is_space(data[i + 1])
                    || super::super::scanners::is_punctuation(data[i + 1]))
            {
                continue;
            }

            let emph = p.tree.new_node(NodeKind::Emph);
            p.inline(emph, &data[..i]);
            return (i + 1, Some(emph));
        }
    }

    (0, None)
}

fn helper_double_emphasis(p: &mut Parser, data: &[u8], c: u8) -> (usize, Option<NodeId>) {
    let mut i = 0;

    while i < data.len() {
        let length = helper_find_emph_char(&data[i..], c);
        if length == 0 {
            return (0, None);
        }
        i += length;

        if i + 1 < data.len() && data[i] == c && data[i + 1] == c && i > 0 && !is_space(data[i - 1])
        {
            let kind = if c == b'~' {
                NodeKind::Del
            } else {
                NodeKind::Strong
            };
            let node = p.tree.new_node(kind);
            p.inline(node, &data[..i]);
            return (i + 2, Some(node));
        }
        i += 1;
    }
    (0, None)
}

fn helper_triple_emphasis(
    p: &mut Parser,
    orig_data: &[u8],
    offset: usize,
    c: u8,
) -> (usize, Option<NodeId>) {
    let mut i = 0;
    let data = &orig_data[offset..];

    while i < data.len() {
        let length = helper_find_emph_char(&data[i..], c);
        if length == 0 {
            return (0, None);
        }
        i += length;

        // skip whitespace-preceded delimiters
        if data[i] != c || is_space(data[i - 1]) {
            continue;
        }

        if i + 2 < data.len() && data[i + 1] == c && data[i + 2] == c {
            // triple run closes triple run: strong around emphasis
            let strong = p.tree.new_node(NodeKind::Strong);
            let em = p.tree.new_node(NodeKind::Emph);
            p.tree.append_child(strong, em);
            p.inline(em, &data[..i]);
            return (i + 3, Some(strong));
        }
        if i + 1 < data.len() && data[i + 1] == c {
            // double run found: retry as single emphasis wrapping strong
            let (length, node) = helper_emphasis(p, &orig_data[offset - 2..], c);
            if length == 0 {
                return (0, None);
            }
            return (length - 2, node);
        }
        // single run found: retry as strong wrapping emphasis
        let (length, node) = helper_double_emphasis(p, &orig_data[offset - 1..], c);
        if length == 0 {
            return (0, None);
        }
        return (length - 1, node);
    }
    (0, None)
}

#[cfg(test)]
mod tests {
    use super::super::super::{Extensions, Parser, ParserOptions};
    use crate::ast::{NodeId, NodeKind, Tree};

    fn inline_with(input: &[u8], extensions: Extensions) -> (Tree, NodeId) {
        let mut p = Parser::new(ParserOptions {
            extensions,
            ..Default::default()
        });
        let para = p.tree.new_node(NodeKind::Paragraph);
        let root = p.tree.root();
        p.tree.append_child(root, para);
        p.inline(para, input);
        (p.tree, para)
    }

    fn inline_parse(input: &[u8]) -> (Tree, NodeId) {
        inline_with(input, Extensions::common())
    }

    fn kinds(tree: &Tree, parent: NodeId) -> Vec<&'static str> {
        tree.children(parent)
            .iter()
            .map(|&c| tree[c].kind.name())
            .collect()
    }

    #[test]
    fn single_star_is_emphasis() {
        let (tree, para) = inline_parse(b"*a*");
        assert_eq!(kinds(&tree, para), vec!["Emph"]);
        let em = tree.children(para)[0];
        assert_eq!(kinds(&tree, em), vec!["Text"]);
        assert_eq!(tree[tree.children(em)[0]].literal, b"a");
    }

    #[test]
    fn double_star_is_strong() {
        let (tree, para) = inline_parse(b"**a**");
        assert_eq!(kinds(&tree, para), vec!["Strong"]);
        let strong = tree.children(para)[0];
        assert_eq!(tree[tree.children(strong)[0]].literal, b"a");
    }

    #[test]
    fn triple_star_is_strong_around_emphasis() {
        let (tree, para) = inline_parse(b"***a***");
        assert_eq!(kinds(&tree, para), vec!["Strong"]);
        let strong = tree.children(para)[0];
        assert_eq!(kinds(&tree, strong), vec!["Emph"]);
        let em = tree.children(strong)[0];
        assert_eq!(tree[tree.children(em)[0]].literal, b"a");
    }

    #[test]
    fn intraword_underscore_suppressed() {
        let (tree, para) = inline_parse(b"a_b_c");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
        let all: Vec<u8> = tree
            .children(para)
            .iter()
            .flat_map(|&c| tree[c].literal.clone())
            .collect();
        assert_eq!(all, b"a_b_c");
    }

    #[test]
    fn intraword_allowed_without_flag() {
        let (tree, para) = inline_with(b"a_b_c", Extensions::empty());
        assert_eq!(kinds(&tree, para), vec!["Text", "Emph", "Text"]);
    }

    #[test]
    fn opener_followed_by_space_does_not_match() {
        let (tree, para) = inline_parse(b"* not emphasis*");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn unclosed_emphasis_is_text() {
        let (tree, para) = inline_parse(b"*abc");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn strikethrough_double_tilde() {
        let (tree, para) = inline_parse(b"~~gone~~");
        assert_eq!(kinds(&tree, para), vec!["Del"]);
        let del = tree.children(para)[0];
        assert_eq!(tree[tree.children(del)[0]].literal, b"gone");
    }

    #[test]
    fn single_tilde_is_not_strikethrough() {
        let (tree, para) = inline_parse(b"~x~");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn emphasis_skips_code_span_interior() {
        let (tree, para) = inline_parse(b"*a `*` b*");
        assert_eq!(kinds(&tree, para), vec!["Emph"]);
    }

    #[test]
    fn nested_emphasis_inside_strong() {
        let (tree, para) = inline_parse(b"**a *b* c**");
        assert_eq!(kinds(&tree, para), vec!["Strong"]);
        let strong = tree.children(para)[0];
        assert_eq!(kinds(&tree, strong), vec!["Text", "Emph", "Text"]);
    }

    #[test]
    fn subscript_single_tilde() {
        let (tree, para) = inline_with(
            b"H~2~O",
            Extensions::common() | Extensions::SUPER_SUBSCRIPT,
        );
        assert_eq!(kinds(&tree, para), vec!["Text", "Subscript", "Text"]);
        let sub = tree.children(para)[1];
        assert_eq!(tree[sub].literal, b"2");
    }

    #[test]
    fn superscript_caret() {
        let (tree, para) = inline_with(
            b"2^10^",
            Extensions::common() | Extensions::SUPER_SUBSCRIPT,
        );
        assert_eq!(kinds(&tree, para), vec!["Text", "Superscript"]);
        let sup = tree.children(para)[1];
        assert_eq!(tree[sup].literal, b"10");
    }

    #[test]
    fn script_span_rejects_spaces() {
        let (tree, para) = inline_with(
            b"a~b c~d",
            Extensions::common() | Extensions::SUPER_SUBSCRIPT,
        );
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }
}
