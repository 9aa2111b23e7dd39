//! HTML block recognition.
//!
//! Several sub-kinds, each with its own termination rule: comments end at
//! `-->`, CDATA sections at `]]>`, `<hr>` at its closing angle bracket,
//! and generic block tags at a matching close tag. All of them must then
//! be followed by a blank line, unless lax blocks are enabled.

use crate::ast::NodeKind;

use super::super::scanners::is_alnum;
use super::super::{Extensions, Parser};
use super::is_empty;

/// Tags that open an HTML block (as opposed to an inline span).
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "canvas",
    "dd",
    "del",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "iframe",
    "ins",
    "li",
    "main",
    "math",
    "nav",
    "noscript",
    "ol",
    "output",
    "p",
    "pre",
    "progress",
    "script",
    "section",
    "style",
    "table",
    "ul",
    "video",
];

impl Parser {
    /// Tries to consume an HTML block at the head of `data`; returns the
    /// bytes consumed or 0. With `do_render` false this is only the
    /// lookahead used for paragraph interruption.
    pub(crate) fn html(&mut self, data: &[u8], do_render: bool) -> usize {
        if data.is_empty() || data[0] != b'<' {
            return 0;
        }

        let (curtag, tagfound) = html_find_tag(&data[1..]);

        if !tagfound {
            // comment
            let size = self.html_comment(data, do_render);
            if size > 0 {
                return size;
            }
            // CDATA section
            let size = self.html_cdata(data, do_render);
            if size > 0 {
                return size;
            }
            // <hr>, the one self-closing block tag recognized
            let size = self.html_hr(data, do_render);
            if size > 0 {
                return size;
            }
            return 0;
        }

        // scan for a matching close tag; "ins" and "del" may also appear
        // inline, so an unclosed one falls through to inline handling
        let mut found = false;
        let mut i = 1;
        if curtag != "ins" && curtag != "del" {
            while i < data.len() {
                i += 1;
                while i < data.len() && !(data[i - 1] == b'<' && data[i] == b'/') {
                    i += 1;
                }
                if i + 2 + curtag.len() >= data.len() {
                    break;
                }
                let j = self.html_find_end(&curtag, &data[i - 1..]);
                if j > 0 {
                    i += j - 1;
                    found = true;
                    break;
                }
            }
        }

        if !found {
            return 0;
        }

        if do_render {
            let mut end = i;
            while end > 0 && data[end - 1] == b'\n' {
                end -= 1;
            }
            let block = self.add_block(NodeKind::HtmlBlock, b"");
            self.tree[block].literal = data[..end].to_vec();
            self.finalize_block(block);
        }
        i
    }

    /// Lax-form comment block: `<!--` through `-->`.
    pub(crate) fn html_comment(&mut self, data: &[u8], do_render: bool) -> usize {
        let i = inline_html_comment_len(data);
        self.render_html_block(data, i, do_render)
    }

    /// `<![CDATA[` through `]]>`.
    pub(crate) fn html_cdata(&mut self, data: &[u8], do_render: bool) -> usize {
        if !data.starts_with(b"<![CDATA[") {
            return 0;
        }
        let mut i = 9;
        while i < data.len() && !(data[i - 2] == b']' && data[i - 1] == b']' && data[i] == b'>') {
            i += 1;
        }
        if i >= data.len() {
            return 0;
        }
        self.render_html_block(data, i + 1, do_render)
    }

    fn html_hr(&mut self, data: &[u8], do_render: bool) -> usize {
        if data.len() < 4 {
            return 0;
        }
        if data[0] != b'<' || !data[1].eq_ignore_ascii_case(&b'h') || !data[2].eq_ignore_ascii_case(&b'r') {
            return 0;
        }
        if data[3] != b' ' && data[3] != b'/' && data[3] != b'>' {
            return 0;
        }
        let mut i = 3;
        while i < data.len() && data[i] != b'>' && data[i] != b'\n' {
            i += 1;
        }
        if i < data.len() && data[i] == b'>' {
            return self.render_html_block(data, i + 1, do_render);
        }
        0
    }

    /// An HTML block must be followed by a blank line to count; emits the
    /// block when it is.
    fn render_html_block(&mut self, data: &[u8], start: usize, do_render: bool) -> usize {
        if start == 0 {
            return 0;
        }
        let i = is_empty(&data[start.min(data.len())..]);
        if i == 0 {
            return 0;
        }
        let size = start + i;
        if do_render {
            let mut end = size;
            while end > 0 && data[end - 1] == b'\n' {
                end -= 1;
            }
            let block = self.add_block(NodeKind::HtmlBlock, b"");
            self.tree[block].literal = data[..end].to_vec();
            self.finalize_block(block);
        }
        size
    }

    /// Matches `</tag>` at the head of `data`, requiring the rest of the
    /// line (and, strictly, the following line) to be blank.
    fn html_find_end(&self, tag: &str, data: &[u8]) -> usize {
        let mut close = Vec::with_capacity(tag.len() + 3);
        close.extend_from_slice(b"</");
        close.extend_from_slice(tag.as_bytes());
        close.push(b'>');
        if !data.starts_with(&close) {
            return 0;
        }
        let mut i = close.len();

        // rest of the line must be blank
        let skip = is_empty(&data[i..]);
        if skip == 0 {
            return 0;
        }
        i += skip;

        if i >= data.len() {
            return i;
        }
        if self.extensions.contains(Extensions::LAX_HTML_BLOCKS) {
            return i;
        }
        let skip = is_empty(&data[i..]);
        if skip == 0 {
            // the following line must be blank too
            return 0;
        }
        i + skip
    }
}

/// Reads a tag name and reports whether it opens an HTML block.
fn html_find_tag(data: &[u8]) -> (String, bool) {
    let mut i = 0;
    while i < data.len() && is_alnum(data[i]) {
        i += 1;
    }
    let key = String::from_utf8_lossy(&data[..i]).to_lowercase();
    if BLOCK_TAGS.contains(&key.as_str()) {
        return (key, true);
    }
    (String::new(), false)
}

/// Length of an HTML comment starting at `data`, spanning lines, or 0.
pub(crate) fn inline_html_comment_len(data: &[u8]) -> usize {
    if data.len() < 5 {
        return 0;
    }
    if &data[..4] != b"<!--" {
        return 0;
    }
    let mut i = 5;
    while i < data.len() && !(data[i - 2] == b'-' && data[i - 1] == b'-' && data[i] == b'>') {
        i += 1;
    }
    if i >= data.len() {
        return 0;
    }
    i + 1
}
