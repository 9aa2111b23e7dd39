//! Blockquote parsing: prefix stripping, lazy continuation, and the
//! recursion into the quoted interior.

use crate::ast::NodeKind;

use super::super::Parser;
use super::is_empty;

impl Parser {
    /// Length of a `>` prefix (with up to three leading spaces and one
    /// optional following space), or 0.
    pub(crate) fn quote_prefix(&self, data: &[u8]) -> usize {
        let mut i = 0;
        while i < 3 && i < data.len() && data[i] == b' ' {
            i += 1;
        }
        if i < data.len() && data[i] == b'>' {
            if i + 1 < data.len() && data[i + 1] == b' ' {
                return i + 2;
            }
            return i + 1;
        }
        0
    }

    /// Whether an unprefixed line at `beg` ends the quote rather than
    /// continuing it lazily. A lazy line is kept only when the line after
    /// it resumes the quote or is blank.
    fn terminate_blockquote(&self, data: &[u8], beg: usize, end: usize) -> bool {
        if is_empty(&data[beg..]) > 0 {
            return true;
        }
        if end >= data.len() {
            return true;
        }
        self.quote_prefix(&data[end..]) == 0 && is_empty(&data[end..]) == 0
    }

    /// Parses one blockquote region: collects prefix-stripped lines into a
    /// working buffer (swallowing fenced code blocks whole so their
    /// contents cannot close the quote), then recurses on the buffer.
    pub(crate) fn quote(&mut self, data: &[u8]) -> usize {
        let block = self.add_block(NodeKind::BlockQuote, b"");
        let mut raw = Vec::new();
        let mut beg = 0;
        let mut end = 0;

        while beg < data.len() {
            end = beg;
            while end < data.len() && data[end] != b'\n' {
                if self.extensions.contains(super::super::Extensions::FENCED_CODE) {
                    let i = self.fenced_code_block(&data[end..], false);
                    if i > 0 {
                        // incorporate the whole fenced block regardless of
                        // its contents; -1 compensates the end += 1 below
                        end += i - 1;
                        break;
                    }
                }
                end += 1;
            }
            if end < data.len() && data[end] == b'\n' {
                end += 1;
            }

            let pre = self.quote_prefix(&data[beg..]);
            if pre > 0 {
                beg += pre;
            } else if self.terminate_blockquote(data, beg, end) {
                log::trace!("blockquote closed at byte {beg}");
                break;
            }

            raw.extend_from_slice(&data[beg..end]);
            beg = end;
        }

        self.block(&raw);
        self.finalize_block(block);
        end
    }
}
