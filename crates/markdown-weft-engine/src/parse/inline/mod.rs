//! # Inline-Element Engine
//!
//! Scans a byte span known to be inline content (paragraph body, heading
//! text, table cell) and attaches inline child nodes to the owning block.
//!
//! Dispatch is a per-byte handler table built from the enabled extensions
//! when the parser is constructed; there is no global registration. The
//! scanner copies inert bytes into accumulated text nodes and calls the
//! handler for any byte that has one. A handler consuming zero bytes means
//! "not actually a match here" and the scanner advances one byte.

pub mod emphasis;
pub mod html;
pub mod links;

use crate::ast::{NodeId, NodeKind};

use super::scanners::skip_char;
use super::{Extensions, InlineHandler, Parser};

/// Installs the handler table for the parser's extension set.
pub(crate) fn register_handlers(p: &mut Parser) {
    p.inline_callbacks[b' ' as usize] = Some(maybe_line_break as InlineHandler);
    p.inline_callbacks[b'*' as usize] = Some(emphasis::emphasis);
    p.inline_callbacks[b'_' as usize] = Some(emphasis::emphasis);
    if p.extensions
        .intersects(Extensions::STRIKETHROUGH | Extensions::SUPER_SUBSCRIPT)
    {
        p.inline_callbacks[b'~' as usize] = Some(emphasis::tilde);
    }
    p.inline_callbacks[b'`' as usize] = Some(code_span);
    p.inline_callbacks[b'\n' as usize] = Some(line_break);
    p.inline_callbacks[b'[' as usize] = Some(links::link);
    p.inline_callbacks[b'<' as usize] = Some(html::left_angle);
    p.inline_callbacks[b'\\' as usize] = Some(escape);
    p.inline_callbacks[b'&' as usize] = Some(entity);
    p.inline_callbacks[b'!' as usize] = Some(links::maybe_image);
    if p.extensions.contains(Extensions::FOOTNOTES) {
        p.inline_callbacks[b'^' as usize] = Some(links::maybe_inline_footnote);
    } else if p.extensions.contains(Extensions::SUPER_SUBSCRIPT) {
        p.inline_callbacks[b'^' as usize] = Some(emphasis::caret);
    }
    if p.extensions.contains(Extensions::AUTOLINK) {
        p.inline_callbacks[b'h' as usize] = Some(links::maybe_auto_link);
        p.inline_callbacks[b'm' as usize] = Some(links::maybe_auto_link);
        p.inline_callbacks[b'f' as usize] = Some(links::maybe_auto_link);
    }
}

impl Parser {
    /// Parses `data` as inline content, appending children to
    /// `curr_block`. Handlers may recurse back here; depth shares the
    /// block engine's bound.
    pub(crate) fn inline(&mut self, curr_block: NodeId, data: &[u8]) {
        if self.nesting >= self.max_nesting || data.is_empty() {
            return;
        }
        self.nesting += 1;

        let mut beg = 0;
        let mut end = 0;
        while end < data.len() {
            let handler = self.inline_callbacks[data[end] as usize];
            let Some(handler) = handler else {
                end += 1;
                continue;
            };
            let (consumed, node) = handler(self, data, end);
            if consumed == 0 {
                // no action from the handler
                end += 1;
                continue;
            }
            // flush inert bytes collected so far
            if end > beg {
                let text = self.tree.new_text(&data[beg..end]);
                self.tree.append_child(curr_block, text);
            }
            if let Some(node) = node {
                self.tree.append_child(curr_block, node);
            }
            beg = end + consumed;
            end = beg;
        }

        if beg < data.len() {
            let mut tail = data.len();
            if data[tail - 1] == b'\n' {
                tail -= 1;
            }
            if tail > beg {
                let text = self.tree.new_text(&data[beg..tail]);
                self.tree.append_child(curr_block, text);
            }
        }
        self.nesting -= 1;
    }
}

/// `' '`: a newline preceded by two or more spaces becomes a hard break;
/// fewer spaces are consumed invisibly so they never trail in the output.
fn maybe_line_break(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let orig = offset;
    let offset = skip_char(data, offset, b' ');

    if offset < data.len() && data[offset] == b'\n' {
        if offset - orig >= 2 {
            let node = p.tree.new_node(NodeKind::Hardbreak);
            return (offset - orig + 1, Some(node));
        }
        return (offset - orig, None);
    }
    (0, None)
}

/// `'\n'`: a hard break when every newline is one, otherwise nothing (the
/// newline stays in the text run as a soft break).
fn line_break(p: &mut Parser, _data: &[u8], _offset: usize) -> (usize, Option<NodeId>) {
    if p.extensions.contains(Extensions::HARD_LINE_BREAK) {
        let node = p.tree.new_node(NodeKind::Hardbreak);
        return (1, Some(node));
    }
    (0, None)
}

/// `'\\'`: escapes of punctuation, and backslash-before-newline breaks.
const ESCAPE_CHARS: &[u8] = b"\\`*_{}[]()#+-.!:|&<>~";

fn escape(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let data = &data[offset..];
    if data.len() > 1 {
        if p.extensions.contains(Extensions::BACKSLASH_LINE_BREAK) && data[1] == b'\n' {
            let node = p.tree.new_node(NodeKind::Hardbreak);
            return (2, Some(node));
        }
        if !ESCAPE_CHARS.contains(&data[1]) {
            return (0, None);
        }
        let node = p.tree.new_text(&data[1..2]);
        return (2, Some(node));
    }
    (2, None)
}

/// `'&'`: pass a well-formed entity through as text, leave a lone
/// ampersand for the renderer to escape.
fn entity(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let data = &data[offset..];

    let mut end = 1;
    if end < data.len() && data[end] == b'#' {
        end += 1;
    }
    while end < data.len() && data[end].is_ascii_alphanumeric() {
        end += 1;
    }

    if end < data.len() && data[end] == b';' {
        end += 1;
    } else {
        return (0, None);
    }

    let mut ent: &[u8] = &data[..end];
    // leave "&amp;" as a bare ampersand or the renderer escapes it twice
    if ent == b"&amp;" {
        ent = b"&";
    }
    let node = p.tree.new_text(ent);
    (end, Some(node))
}

/// `` '`' ``: a code span delimited by equal-length backtick runs; inner
/// content is literal with one level of outer spaces trimmed.
fn code_span(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    let data = &data[offset..];

    // count the opening backticks
    let nb = skip_char(data, 0, b'`');

    // find a closing run of the same length
    let mut i = 0;
    let mut end = nb;
    while end < data.len() && i < nb {
        if data[end] == b'`' {
            i += 1;
        } else {
            i = 0;
        }
        end += 1;
    }

    if i < nb && end >= data.len() {
        return (0, None);
    }

    // trim one layer of surrounding spaces
    let mut f_begin = nb;
    while f_begin < end && data[f_begin] == b' ' {
        f_begin += 1;
    }
    let mut f_end = end - nb;
    while f_end > f_begin && data[f_end - 1] == b' ' {
        f_end -= 1;
    }

    if f_begin != f_end {
        let node = p.tree.new_node(NodeKind::Code);
        p.tree[node].literal = data[f_begin..f_end].to_vec();
        return (end, Some(node));
    }
    (end, None)
}

#[cfg(test)]
mod tests {
    use super::super::{Parser, ParserOptions};
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
    fn plain_text_single_node() {
        let (tree, para) = inline_parse(b"hello world");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
        let t = tree.children(para)[0];
        assert_eq!(tree[t].literal, b"hello world");
    }

    #[test]
    fn code_span_literal_content() {
        let (tree, para) = inline_parse(b"a `code` b");
        assert_eq!(kinds(&tree, para), vec!["Text", "Code", "Text"]);
        let code = tree.children(para)[1];
        assert_eq!(tree[code].literal, b"code");
    }

    #[test]
    fn double_backtick_code_span_may_contain_single() {
        let (tree, para) = inline_parse(b"``a ` b``");
        assert_eq!(kinds(&tree, para), vec!["Code"]);
        let code = tree.children(para)[0];
        assert_eq!(tree[code].literal, b"a ` b");
    }

    #[test]
    fn unclosed_code_span_is_text() {
        let (tree, para) = inline_parse(b"`unclosed");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn code_span_trims_one_space_layer() {
        let (tree, para) = inline_parse(b"` x `");
        let code = tree.children(para)[0];
        assert_eq!(tree[code].literal, b"x");
    }

    #[test]
    fn escaped_punctuation_becomes_text() {
        let (tree, para) = inline_parse(b"\\*not emphasis\\*");
        // escape produces standalone text nodes around the inert run
        let all: Vec<u8> = tree
            .children(para)
            .iter()
            .flat_map(|&c| tree[c].literal.clone())
            .collect();
        assert_eq!(all, b"*not emphasis*");
        assert_eq!(kinds(&tree, para), vec!["Text", "Text", "Text"]);
    }

    #[test]
    fn escape_of_letter_is_literal_backslash() {
        let (tree, para) = inline_parse(b"a \\z b");
        let all: Vec<u8> = tree
            .children(para)
            .iter()
            .flat_map(|&c| tree[c].literal.clone())
            .collect();
        assert_eq!(all, b"a \\z b");
    }

    #[test]
    fn entity_passes_through() {
        let (tree, para) = inline_parse(b"x &copy; y");
        assert_eq!(kinds(&tree, para), vec!["Text", "Text", "Text"]);
        let ent = tree.children(para)[1];
        assert_eq!(tree[ent].literal, b"&copy;");
    }

    #[test]
    fn amp_entity_unescaped_for_renderer() {
        let (tree, para) = inline_parse(b"a &amp; b");
        let ent = tree.children(para)[1];
        assert_eq!(tree[ent].literal, b"&");
    }

    #[test]
    fn lone_ampersand_stays_in_text() {
        let (tree, para) = inline_parse(b"fish & chips");
        assert_eq!(kinds(&tree, para), vec!["Text"]);
    }

    #[test]
    fn numeric_entity() {
        let (tree, para) = inline_parse(b"&#169;");
        let ent = tree.children(para)[0];
        assert_eq!(tree[ent].literal, b"&#169;");
    }

    #[test]
    fn hard_break_extension() {
        let opts = ParserOptions {
            extensions: super::Extensions::common() | super::Extensions::HARD_LINE_BREAK,
            ..Default::default()
        };
        let mut p = Parser::new(opts);
        let para = p.tree.new_node(NodeKind::Paragraph);
        let root = p.tree.root();
        p.tree.append_child(root, para);
        p.inline(para, b"a\nb");
        assert_eq!(kinds(&p.tree, para), vec!["Text", "Hardbreak", "Text"]);
    }

    #[test]
    fn backslash_line_break() {
        let (tree, para) = inline_parse(b"a\\\nb");
        assert_eq!(kinds(&tree, para), vec!["Text", "Hardbreak", "Text"]);
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let opts = ParserOptions {
            max_nesting: 4,
            ..Default::default()
        };
        let mut p = Parser::new(opts);
        let para = p.tree.new_node(NodeKind::Paragraph);
        let root = p.tree.root();
        p.tree.append_child(root, para);
        let deep = b"*a *b *c *d *e*****".repeat(4);
        p.inline(para, &deep);
        // must terminate; depth bound prevents unbounded recursion
        assert!(p.nesting == 0);
    }
}
