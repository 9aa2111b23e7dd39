//! # Block-Structure Engine
//!
//! Segments the raw document into nested block containers. Works line by
//! line over whole regions: container recognizers (quote, list item) strip
//! their prefixes into a working buffer and recurse into [`Parser::block`],
//! so the container stack is the recursion plus the parser's tip chain.
//!
//! Leaf content (paragraph text, heading text, table cells) is *not*
//! scanned for inline elements here; it is stored raw on the node and
//! handled by the inline engine in a second phase.
//!
//! Recognizers are tried in a fixed priority order; anything that matches
//! nothing falls through to a paragraph. There is no error path: malformed
//! input always classifies as something plainer.

pub mod code;
pub mod html;
pub mod lists;
pub mod quote;
pub mod table;

use crate::ast::{HeadingData, ListFlags, NodeKind};

use super::attribute;
use super::refs::is_reference;
use super::scanners::{is_backslash_escaped, skip_char, skip_until_char};
use super::{Extensions, Parser, sanitized_anchor_name};

/// If the line at the head of `data` is blank, returns the bytes to skip
/// past it (including the newline); otherwise 0.
pub(crate) fn is_empty(data: &[u8]) -> usize {
    if data.is_empty() {
        return 0;
    }
    let mut i = 0;
    while i < data.len() && data[i] != b'\n' {
        if data[i] != b' ' && data[i] != b'\t' {
            return 0;
        }
        i += 1;
    }
    if i < data.len() {
        i += 1;
    }
    i
}

/// Returns the width of one leading indentation unit (a tab, or
/// `indent_size` spaces), or 0 if the line is not indented.
pub(crate) fn is_indented(data: &[u8], indent_size: usize) -> usize {
    if data.is_empty() {
        return 0;
    }
    if data[0] == b'\t' {
        return 1;
    }
    if data.len() < indent_size {
        return 0;
    }
    if data[..indent_size].iter().any(|&c| c != b' ') {
        return 0;
    }
    indent_size
}

impl Parser {
    /// Parses out one block-level construct at a time from `data`. Called
    /// recursively for container interiors; depth is bounded by
    /// `max_nesting`, beyond which the remainder is treated as flat text.
    pub(crate) fn block(&mut self, data: &[u8]) {
        if self.nesting >= self.max_nesting {
            return;
        }
        self.nesting += 1;

        let mut data = data;
        while !data.is_empty() {
            // attribute line decorating the next block
            if self.extensions.contains(Extensions::ATTRIBUTES)
                && attribute::is_block_attribute(data)
            {
                let (consumed, attr) = attribute::block_attribute(data);
                self.pending_attr = Some(attr);
                data = &data[consumed..];
                continue;
            }

            // prefixed heading: "# Heading"
            if self.is_prefix_heading(data) {
                data = &data[self.prefix_heading(data)..];
                continue;
            }

            // block of preformatted HTML
            if data[0] == b'<' {
                let i = self.html(data, true);
                if i > 0 {
                    data = &data[i..];
                    continue;
                }
            }

            // title block of consecutive "% ..." lines
            if self.extensions.contains(Extensions::TITLEBLOCK) && data[0] == b'%' {
                let i = self.title_block(data);
                if i > 0 {
                    data = &data[i..];
                    continue;
                }
            }

            // blank lines separate blocks but produce nothing
            let i = is_empty(data);
            if i > 0 {
                data = &data[i..];
                continue;
            }

            // indented code block
            if self.code_prefix(data) > 0 {
                data = &data[self.code(data)..];
                continue;
            }

            // fenced code block
            if self.extensions.contains(Extensions::FENCED_CODE) {
                let i = self.fenced_code_block(data, true);
                if i > 0 {
                    data = &data[i..];
                    continue;
                }
            }

            // horizontal rule
            if self.is_hrule(data) {
                self.add_block(NodeKind::HorizontalRule, b"");
                self.finalize_block(self.tip);
                data = &data[skip_until_char(data, 0, b'\n')..];
                continue;
            }

            // block quote
            if self.quote_prefix(data) > 0 {
                data = &data[self.quote(data)..];
                continue;
            }

            // table: header row + delimiter row
            if self.extensions.contains(Extensions::TABLES) {
                let i = self.table(data);
                if i > 0 {
                    data = &data[i..];
                    continue;
                }
            }

            // unordered list
            if self.uli_prefix(data) > 0 {
                data = &data[self.list(data, ListFlags::empty(), 0)..];
                continue;
            }

            // ordered list, optionally honoring the start number
            if self.oli_prefix(data) > 0 {
                let start = if self.extensions.contains(Extensions::ORDERED_LIST_START) {
                    parse_list_start(data)
                } else {
                    0
                };
                data = &data[self.list(data, ListFlags::ORDERED, start)..];
                continue;
            }

            // definition list
            if self.extensions.contains(Extensions::DEFINITION_LISTS) && self.dli_prefix(data) > 0
            {
                data = &data[self.list(data, ListFlags::DEFINITION, 0)..];
                continue;
            }

            // anything else is a paragraph (which also hosts setext
            // headings, reference definitions and interruption checks)
            data = &data[self.paragraph(data)..];
        }

        self.nesting -= 1;
    }

    pub(crate) fn is_prefix_heading(&self, data: &[u8]) -> bool {
        if data.is_empty() || data[0] != b'#' {
            return false;
        }
        let level = skip_char(data, 0, b'#');
        if level > 6 {
            return false;
        }
        // the marker run must be followed by a space
        level < data.len() && data[level] == b' '
    }

    pub(crate) fn prefix_heading(&mut self, data: &[u8]) -> usize {
        let level = skip_char(data, 0, b'#');
        let i = skip_char(data, level, b' ');
        let mut end = skip_until_char(data, i, b'\n');
        let mut skip = end;
        let mut id = None;

        if self.extensions.contains(Extensions::HEADING_IDS) {
            // look for a trailing "{#id}"
            let mut j = i;
            while j + 1 < end && !(data[j] == b'{' && data[j + 1] == b'#') {
                j += 1;
            }
            let mut k = j + 1;
            while k < end && data[k] != b'}' {
                k += 1;
            }
            if j < end && k < end && j + 2 <= k {
                id = Some(String::from_utf8_lossy(&data[j + 2..k]).into_owned());
                skip = k + 1;
                end = j;
                while end > 0 && data[end - 1] == b' ' {
                    end -= 1;
                }
            }
        }

        // strip closing hashes unless escaped
        while end > 0 && data[end - 1] == b'#' {
            if is_backslash_escaped(data, end - 1) {
                break;
            }
            end -= 1;
        }
        while end > 0 && data[end - 1] == b' ' {
            end -= 1;
        }

        if end > i {
            if id.is_none() && self.extensions.contains(Extensions::AUTO_HEADING_IDS) {
                id = Some(sanitized_anchor_name(&data[i..end]));
            }
            let block = self.add_block(
                NodeKind::Heading(HeadingData {
                    level: level as u8,
                    heading_id: id,
                    is_titleblock: false,
                }),
                &data[i..end],
            );
            self.finalize_block(block);
        }
        skip
    }

    /// Setext underline check: a run of `=` (level 1) or `-` (level 2)
    /// padded by spaces, alone on its line.
    pub(crate) fn is_underlined_heading(&self, data: &[u8]) -> u8 {
        if data.is_empty() {
            return 0;
        }
        let (c, level) = match data[0] {
            b'=' => (b'=', 1),
            b'-' => (b'-', 2),
            _ => return 0,
        };
        let i = skip_char(data, 1, c);
        let i = skip_char(data, i, b' ');
        if i < data.len() && data[i] == b'\n' { level } else { 0 }
    }

    pub(crate) fn is_hrule(&self, data: &[u8]) -> bool {
        let mut i = 0;
        while i < 3 && i < data.len() && data[i] == b' ' {
            i += 1;
        }
        if i >= data.len() || !matches!(data[i], b'*' | b'-' | b'_') {
            return false;
        }
        let c = data[i];

        // the whole line must be the rule char or spaces
        let mut n = 0;
        while i < data.len() && data[i] != b'\n' {
            if data[i] == c {
                n += 1;
            } else if data[i] != b' ' {
                return false;
            }
            i += 1;
        }
        n >= 3
    }

    /// Consecutive `%`-prefixed lines become a level-1 title heading.
    pub(crate) fn title_block(&mut self, data: &[u8]) -> usize {
        if data.is_empty() || data[0] != b'%' {
            return 0;
        }
        let mut consumed = 0;
        let mut body = Vec::new();
        for line in data.split_inclusive(|&c| c == b'\n') {
            if !line.starts_with(b"%") {
                break;
            }
            consumed += line.len();
            let stripped = line.strip_prefix(b"% ").unwrap_or(&line[1..]);
            body.extend_from_slice(stripped);
        }
        while body.ends_with(b"\n") {
            body.pop();
        }
        let block = self.add_block(
            NodeKind::Heading(HeadingData {
                level: 1,
                heading_id: None,
                is_titleblock: true,
            }),
            &body,
        );
        self.finalize_block(block);
        consumed
    }

    /// Consumes a paragraph, watching every line for constructs that end
    /// it: blank lines, setext underlines, reference definitions, and the
    /// block starts that may interrupt a paragraph.
    pub(crate) fn paragraph(&mut self, data: &[u8]) -> usize {
        let mut prev = 0;
        let mut line = 0;
        let mut i = 0;
        let tab_size = self.tab_size;

        while i < data.len() {
            prev = line;
            let current = &data[i..];
            line = i;

            // a reference or footnote definition ends the paragraph and is
            // consumed invisibly
            if let Some((ref_end, parsed)) =
                is_reference(current, tab_size, self.extensions.contains(Extensions::FOOTNOTES))
            {
                self.render_paragraph(&data[..i]);
                self.insert_ref(parsed);
                return i + ref_end;
            }

            // blank line marks the end of the paragraph
            let n = is_empty(current);
            if n > 0 {
                // unless it introduces a definition-list body
                if self.extensions.contains(Extensions::DEFINITION_LISTS)
                    && i + 1 < data.len()
                    && data[i + 1] == b':'
                {
                    let list_len = self.list(&data[prev..], ListFlags::DEFINITION, 0);
                    return prev + list_len;
                }
                self.render_paragraph(&data[..i]);
                return i + n;
            }

            // setext underline under accumulated text makes it a heading
            if i > 0 {
                let level = self.is_underlined_heading(current);
                if level > 0 {
                    self.render_paragraph(&data[..prev]);

                    let mut eol = i - 1;
                    let mut start = prev;
                    while start < eol && data[start] == b' ' {
                        start += 1;
                    }
                    while eol > start && data[eol - 1] == b' ' {
                        eol -= 1;
                    }

                    let id = if self.extensions.contains(Extensions::AUTO_HEADING_IDS) {
                        Some(sanitized_anchor_name(&data[start..eol]))
                    } else {
                        None
                    };
                    let block = self.add_block(
                        NodeKind::Heading(HeadingData {
                            level,
                            heading_id: id,
                            is_titleblock: false,
                        }),
                        &data[start..eol],
                    );
                    self.finalize_block(block);

                    return skip_until_char(data, i, b'\n');
                }
            }

            // an HTML block start may end the paragraph early
            if self.extensions.contains(Extensions::LAX_HTML_BLOCKS)
                && current[0] == b'<'
                && self.html(current, false) > 0
            {
                self.render_paragraph(&data[..i]);
                return i;
            }

            // a prefixed heading or horizontal rule ends the paragraph
            if self.is_prefix_heading(current) || self.is_hrule(current) {
                self.render_paragraph(&data[..i]);
                return i;
            }

            // so does a fenced code block
            if self.extensions.contains(Extensions::FENCED_CODE)
                && self.fenced_code_block(current, false) > 0
            {
                self.render_paragraph(&data[..i]);
                return i;
            }

            // a definition marker means the previous line was a term
            if self.extensions.contains(Extensions::DEFINITION_LISTS)
                && self.dli_prefix(current) > 0
            {
                let ret = self.list(&data[prev..], ListFlags::DEFINITION, 0);
                return ret + prev;
            }

            // with the extension, block starts interrupt without a blank
            if self.extensions.contains(Extensions::NO_EMPTY_LINE_BEFORE_BLOCK)
                && (self.uli_prefix(current) > 0
                    || self.oli_prefix(current) > 0
                    || self.quote_prefix(current) > 0
                    || self.code_prefix(current) > 0)
            {
                self.render_paragraph(&data[..i]);
                return i;
            }

            // otherwise scan to the end of the line
            i = skip_until_char(data, i, b'\n');
            i += 1;
        }

        let end = i.min(data.len());
        self.render_paragraph(&data[..end]);
        end
    }

    fn render_paragraph(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let mut beg = 0;
        while beg < data.len() && data[beg] == b' ' {
            beg += 1;
        }
        let mut end = data.len();
        if end > beg && data[end - 1] == b'\n' {
            end -= 1;
        }
        while end > beg && data[end - 1] == b' ' {
            end -= 1;
        }
        if end <= beg {
            return;
        }
        let block = self.add_block(NodeKind::Paragraph, &data[beg..end]);
        self.finalize_block(block);
    }
}

/// Reads the leading number of an ordered-list marker.
fn parse_list_start(data: &[u8]) -> usize {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    let begin = i;
    while i < data.len() && data[i].is_ascii_digit() {
        i += 1;
    }
    let s = std::str::from_utf8(&data[begin..i]).unwrap_or("");
    let start = s.parse::<usize>().unwrap_or(0);
    if start == 1 { 0 } else { start }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parser() -> Parser {
        Parser::new(super::super::ParserOptions::default())
    }

    #[rstest]
    #[case(b"\n", 1)]
    #[case(b"   \n", 4)]
    #[case(b"\t\nx", 2)]
    #[case(b"a\n", 0)]
    #[case(b"", 0)]
    fn blank_line_detection(#[case] data: &[u8], #[case] expected: usize) {
        assert_eq!(is_empty(data), expected);
    }

    #[rstest]
    #[case(b"    code", 4)]
    #[case(b"\tcode", 1)]
    #[case(b"   three", 0)]
    #[case(b"", 0)]
    fn indent_detection(#[case] data: &[u8], #[case] expected: usize) {
        assert_eq!(is_indented(data, 4), expected);
    }

    #[rstest]
    #[case(b"# ok\n", true)]
    #[case(b"###### deep\n", true)]
    #[case(b"####### too deep\n", false)]
    #[case(b"#nospace\n", false)]
    #[case(b"plain\n", false)]
    fn atx_heading_detection(#[case] data: &[u8], #[case] expected: bool) {
        assert_eq!(parser().is_prefix_heading(data), expected);
    }

    #[rstest]
    #[case(b"***\n", true)]
    #[case(b"- - -\n", true)]
    #[case(b"___\n", true)]
    #[case(b"  **\n", false)]
    #[case(b"--a\n", false)]
    fn hrule_detection(#[case] data: &[u8], #[case] expected: bool) {
        assert_eq!(parser().is_hrule(data), expected);
    }

    #[rstest]
    #[case(b"===\n", 1)]
    #[case(b"---\n", 2)]
    #[case(b"- -\n", 0)]
    #[case(b"==x\n", 0)]
    fn setext_underline_detection(#[case] data: &[u8], #[case] expected: u8) {
        assert_eq!(parser().is_underlined_heading(data), expected);
    }

    #[test]
    fn ordered_list_start_number() {
        assert_eq!(parse_list_start(b"3. x\n"), 3);
        assert_eq!(parse_list_start(b"1. x\n"), 0);
        assert_eq!(parse_list_start(b"  42. x\n"), 42);
    }
}
