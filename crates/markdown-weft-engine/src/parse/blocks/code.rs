//! Indented and fenced code blocks.
//!
//! Fence metadata (character, length, indentation offset) is recorded on
//! the node so closing fences match exactly and nested content keeps its
//! relative indentation.

use crate::ast::{CodeBlockData, NodeKind};

use super::super::Parser;
use super::super::scanners::{is_space, is_vertical_space, skip_char, skip_until_char};
use super::is_empty;

/// An opening or closing fence line: its marker run and indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenceLine {
    pub char: u8,
    pub length: usize,
    pub offset: usize,
}

/// Recognizes a fence line at the head of `data`. Returns the bytes
/// consumed (through the newline), the marker, and, when `want_info`,
/// the info string. A closing fence must repeat `old_marker`.
pub(crate) fn is_fence_line(
    data: &[u8],
    want_info: bool,
    old_marker: Option<&FenceLine>,
) -> Option<(usize, FenceLine, Vec<u8>)> {
    let mut i = 0;
    while i < data.len() && i < 3 && data[i] == b' ' {
        i += 1;
    }
    let offset = i;

    if i >= data.len() || (data[i] != b'~' && data[i] != b'`') {
        return None;
    }
    let c = data[i];
    let mut size = 0;
    while i < data.len() && data[i] == c {
        size += 1;
        i += 1;
    }
    if size < 3 {
        return None;
    }
    let marker = FenceLine {
        char: c,
        length: size,
        offset,
    };
    if let Some(old) = old_marker {
        if old.char != marker.char || old.length != marker.length {
            return None;
        }
    }

    let mut info = Vec::new();
    if want_info {
        i = skip_char(data, i, b' ');
        if i >= data.len() {
            return Some((i, marker, info));
        }
        let mut info_start = i;
        let mut info_len = 0;
        if data[i] == b'{' {
            i += 1;
            info_start += 1;
            while i < data.len() && data[i] != b'}' && data[i] != b'\n' {
                info_len += 1;
                i += 1;
            }
            if i >= data.len() || data[i] != b'}' {
                return None;
            }
            while info_len > 0 && is_space(data[info_start]) {
                info_start += 1;
                info_len -= 1;
            }
            while info_len > 0 && is_space(data[info_start + info_len - 1]) {
                info_len -= 1;
            }
            i += 1;
            i = skip_char(data, i, b' ');
        } else {
            while i < data.len() && !is_vertical_space(data[i]) {
                info_len += 1;
                i += 1;
            }
        }
        let raw = &data[info_start..info_start + info_len];
        let trimmed_start = raw.iter().position(|&b| !is_space(b)).unwrap_or(raw.len());
        let trimmed_end = raw.iter().rposition(|&b| !is_space(b)).map_or(trimmed_start, |p| p + 1);
        info = raw[trimmed_start..trimmed_end].to_vec();
    }

    if i == data.len() {
        return Some((i, marker, info));
    }
    if i > data.len() || data[i] != b'\n' {
        return None;
    }
    Some((i + 1, marker, info))
}

impl Parser {
    /// Width of an indented-code prefix at the head of `data`, or 0.
    pub(crate) fn code_prefix(&self, data: &[u8]) -> usize {
        if !data.is_empty() && data[0] == b'\t' {
            return 1;
        }
        if data.len() >= 4 && data[..4] == *b"    " {
            return 4;
        }
        0
    }

    /// Consumes an indented code block: prefixed lines plus interior blank
    /// lines, with trailing blank lines trimmed back out.
    pub(crate) fn code(&mut self, data: &[u8]) -> usize {
        let mut work: Vec<u8> = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let mut beg = i;
            i = skip_until_char(data, i, b'\n');
            if i < data.len() && data[i] == b'\n' {
                i += 1;
            }

            let blankline = is_empty(&data[beg..i]) > 0;
            let pre = self.code_prefix(&data[beg..i]);
            if pre > 0 {
                beg += pre;
            } else if !blankline {
                // non-empty non-prefixed line ends the block
                i = beg;
                break;
            }

            if blankline {
                work.push(b'\n');
            } else {
                work.extend_from_slice(&data[beg..i]);
            }
        }

        while work.ends_with(b"\n") {
            work.pop();
        }
        work.push(b'\n');

        let block = self.add_block(
            NodeKind::CodeBlock(CodeBlockData {
                is_fenced: false,
                ..Default::default()
            }),
            b"",
        );
        self.tree[block].literal = work;
        self.finalize_block(block);
        i
    }

    /// Consumes a fenced code block, or returns 0 if `data` does not start
    /// one (including the unterminated-at-EOF case, which falls back to
    /// paragraph text). With `do_render` false this is only a lookahead.
    pub(crate) fn fenced_code_block(&mut self, data: &[u8], do_render: bool) -> usize {
        let (mut beg, marker, info) = match is_fence_line(data, true, None) {
            Some(r) => r,
            None => return 0,
        };
        if beg == 0 || beg >= data.len() {
            return 0;
        }

        let mut work: Vec<u8> = Vec::new();
        loop {
            // check for the closing fence
            if let Some((fence_end, _, _)) = is_fence_line(&data[beg..], false, Some(&marker)) {
                beg += fence_end;
                break;
            }

            // copy the current line
            let end = skip_until_char(data, beg, b'\n') + 1;
            if end > data.len() {
                // EOF without a closing marker
                return 0;
            }
            if do_render {
                work.extend_from_slice(&data[beg..end]);
            }
            beg = end;
            if beg >= data.len() {
                return 0;
            }
        }

        if do_render {
            let block = self.add_block(
                NodeKind::CodeBlock(CodeBlockData {
                    is_fenced: true,
                    info,
                    fence_char: marker.char,
                    fence_length: marker.length,
                    fence_offset: marker.offset,
                }),
                b"",
            );
            self.tree[block].literal = work;
            self.finalize_block(block);
        }
        beg
    }
}
