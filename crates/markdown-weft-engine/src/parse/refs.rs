//! Link-reference definitions: `[id]: url "title"` lines and, with the
//! footnotes extension, `[^id]: body` definitions.
//!
//! Definitions may appear anywhere in the document, including after their
//! first use, so the table is populated while block parsing runs and only
//! consulted when the inline engine resolves `[text][id]` forms. After the
//! parse completes the table is never mutated again.

use std::collections::HashMap;

use crate::ast::NodeId;

use super::blocks::{is_empty, is_indented};

/// A resolved reference as supplied by the override hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// What goes into the link's `href`.
    pub link: Vec<u8>,
    /// Optional tooltip title.
    pub title: Vec<u8>,
    /// Optional replacement for the bracketed text (shortcut form only).
    pub text: Vec<u8>,
}

/// Hook consulted before the built-in table; returning `None` falls through
/// to definitions found in the document.
pub type ReferenceOverrideFn = dyn Fn(&str) -> Option<Reference>;

/// One entry in the reference table.
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkRef {
    pub link: Vec<u8>,
    pub title: Vec<u8>,
    /// Serial number assigned at first use; 0 while unused.
    pub note_id: usize,
    /// Footnote body contained indented block content.
    pub has_block: bool,
    /// Footnote body node, created at first use.
    pub footnote: Option<NodeId>,
    /// Replacement text from an override, used as shortcut-form alt content.
    pub text: Vec<u8>,
}

/// Reference table keyed by case-folded id.
#[derive(Debug, Default)]
pub(crate) struct RefTable {
    entries: HashMap<String, LinkRef>,
}

impl RefTable {
    pub fn insert(&mut self, id: &[u8], entry: LinkRef) {
        self.entries.insert(fold_id(id), entry);
    }

    pub fn get(&self, id: &[u8]) -> Option<&LinkRef> {
        self.entries.get(&fold_id(id))
    }

    pub fn get_mut(&mut self, id: &[u8]) -> Option<&mut LinkRef> {
        self.entries.get_mut(&fold_id(id))
    }
}

/// Id matching is case-insensitive; fold through lossy UTF-8 so arbitrary
/// bytes still key deterministically.
fn fold_id(id: &[u8]) -> String {
    String::from_utf8_lossy(id).to_lowercase()
}

/// A definition recognized by [`is_reference`], ready for table insertion.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedRef {
    pub id: Vec<u8>,
    pub entry: LinkRef,
    /// True for a `[^id]:` footnote definition.
    pub is_footnote: bool,
}

/// Checks whether `data` begins with a reference definition; returns the
/// bytes consumed and the parsed definition. Consumed text produces no
/// visible node.
pub(crate) fn is_reference(
    data: &[u8],
    tab_size: usize,
    footnotes_enabled: bool,
) -> Option<(usize, ParsedRef)> {
    if data.len() < 4 {
        return None;
    }
    // up to 3 optional leading spaces
    let mut i = 0;
    while i < 3 && data[i] == b' ' {
        i += 1;
    }

    if data[i] != b'[' {
        return None;
    }
    i += 1;
    let mut is_footnote = false;
    if footnotes_enabled && i < data.len() && data[i] == b'^' {
        is_footnote = true;
        i += 1;
    }
    let id_offset = i;
    while i < data.len() && data[i] != b'\n' && data[i] != b'\r' && data[i] != b']' {
        i += 1;
    }
    if i >= data.len() || data[i] != b']' {
        return None;
    }
    let id_end = i;
    // footnotes cannot have an empty id
    if is_footnote && id_offset == id_end {
        return None;
    }

    // spacer: colon (space | tab)* newline? (space | tab)*
    i += 1;
    if i >= data.len() || data[i] != b':' {
        return None;
    }
    i += 1;
    while i < data.len() && (data[i] == b' ' || data[i] == b'\t') {
        i += 1;
    }
    if i < data.len() && (data[i] == b'\n' || data[i] == b'\r') {
        i += 1;
        if i < data.len() && data[i] == b'\n' && data[i - 1] == b'\r' {
            i += 1;
        }
    }
    while i < data.len() && (data[i] == b' ' || data[i] == b'\t') {
        i += 1;
    }
    if i >= data.len() {
        return None;
    }

    let id = data[id_offset..id_end].to_vec();

    if is_footnote {
        let (block_start, block_end, contents, has_block) = scan_footnote(data, i, tab_size);
        if block_start == block_end {
            return None;
        }
        let parsed = ParsedRef {
            entry: LinkRef {
                // the link field carries the id for footnotes
                link: id.clone(),
                // and the title carries the body text, to be parsed when
                // the footnote list is assembled
                title: contents,
                has_block,
                ..Default::default()
            },
            id,
            is_footnote: true,
        };
        return Some((block_end, parsed));
    }

    let (link_offset, link_end, title_offset, title_end, line_end) = scan_link_ref(data, i)?;
    let parsed = ParsedRef {
        entry: LinkRef {
            link: data[link_offset..link_end].to_vec(),
            title: data[title_offset..title_end].to_vec(),
            ..Default::default()
        },
        id,
        is_footnote: false,
    };
    Some((line_end, parsed))
}

/// Scans the destination and optional title of a link reference, returning
/// `(link_offset, link_end, title_offset, title_end, line_end)`.
fn scan_link_ref(data: &[u8], mut i: usize) -> Option<(usize, usize, usize, usize, usize)> {
    // link: whitespace-free sequence, optionally between angle brackets
    if data[i] == b'<' {
        i += 1;
    }
    let mut link_offset = i;
    while i < data.len() && !matches!(data[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    let mut link_end = i;
    if link_end > link_offset && data[link_offset] == b'<' && data[link_end - 1] == b'>' {
        link_offset += 1;
        link_end -= 1;
    }

    // optional spacer, then newline, quote, or paren
    while i < data.len() && (data[i] == b' ' || data[i] == b'\t') {
        i += 1;
    }
    if i < data.len() && !matches!(data[i], b'\n' | b'\r' | b'\'' | b'"' | b'(') {
        return None;
    }

    let mut line_end = 0;
    if i >= data.len() || data[i] == b'\r' || data[i] == b'\n' {
        line_end = i;
    }
    if i + 1 < data.len() && data[i] == b'\r' && data[i + 1] == b'\n' {
        line_end += 1;
    }

    if line_end > 0 {
        i = line_end + 1;
        while i < data.len() && (data[i] == b' ' || data[i] == b'\t') {
            i += 1;
        }
    }

    // optional title, enclosed in '"( and alone on its line
    let mut title_offset = 0;
    let mut title_end = 0;
    if i + 1 < data.len() && matches!(data[i], b'\'' | b'"' | b'(') {
        i += 1;
        title_offset = i;
        while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
            i += 1;
        }
        if i + 1 < data.len() && data[i] == b'\n' && data[i + 1] == b'\r' {
            title_end = i + 1;
        } else {
            title_end = i;
        }
        // step back past trailing whitespace to find the closing delimiter
        i = i.saturating_sub(1);
        while i > title_offset && (data[i] == b' ' || data[i] == b'\t') {
            i -= 1;
        }
        if i > title_offset && matches!(data[i], b'\'' | b'"' | b')') {
            line_end = title_end;
            title_end = i;
        } else {
            title_offset = 0;
            title_end = 0;
        }
    }

    if line_end == 0 {
        return None;
    }
    Some((link_offset, link_end, title_offset, title_end, line_end))
}

/// Gathers a footnote definition's body: the rest of the first line plus
/// any following indented block, shifted left by one indent unit.
/// Returns `(block_start, block_end, contents, has_block)`.
fn scan_footnote(data: &[u8], mut i: usize, indent_size: usize) -> (usize, usize, Vec<u8>, bool) {
    if i == 0 || data.is_empty() {
        return (0, 0, Vec::new(), false);
    }

    // skip leading whitespace on the first line
    while i < data.len() && data[i] == b' ' {
        i += 1;
    }
    let block_start = i;

    // first line goes into the working buffer as-is
    while i < data.len() && data[i - 1] != b'\n' {
        i += 1;
    }
    let mut raw = data[block_start..i].to_vec();
    let mut block_end = i;

    let mut has_block = false;
    let mut contains_blank_line = false;
    while block_end < data.len() {
        i += 1;
        while i < data.len() && data[i - 1] != b'\n' {
            i += 1;
        }

        if is_empty(&data[block_end..i]) > 0 {
            // a blank line is assumed to belong to this footnote
            contains_blank_line = true;
            block_end = i;
            continue;
        }

        let n = is_indented(&data[block_end..i], indent_size);
        if n == 0 {
            // end of the block; the current line stays outside it
            break;
        }

        if contains_blank_line {
            raw.push(b'\n');
            contains_blank_line = false;
        }

        // shift off the indent prefix
        raw.extend_from_slice(&data[block_end + n..i]);
        has_block = true;
        block_end = i;
    }

    if block_end > 0 && data[block_end - 1] != b'\n' {
        raw.push(b'\n');
    }

    (block_start, block_end, raw, has_block)
}
