//! List parsing: bullet, ordered and definition lists, item gathering with
//! nested-construct tracking, and the retroactive tightness pass.

use crate::ast::{ListData, ListFlags, NodeId, NodeKind};

use super::super::{Extensions, Parser};
use super::code::is_fence_line;
use super::is_empty;

impl Parser {
    /// Length of an unordered-list marker (`*`, `+` or `-` plus a space),
    /// or 0.
    pub(crate) fn uli_prefix(&self, data: &[u8]) -> usize {
        let mut i = 0;
        while i < data.len() && i < 3 && data[i] == b' ' {
            i += 1;
        }
        if i + 1 >= data.len() {
            return 0;
        }
        if !matches!(data[i], b'*' | b'+' | b'-') || !matches!(data[i + 1], b' ' | b'\t') {
            return 0;
        }
        i + 2
    }

    /// Length of an ordered-list marker (digits, a dot, a space), or 0.
    pub(crate) fn oli_prefix(&self, data: &[u8]) -> usize {
        let mut i = 0;
        while i < 3 && i < data.len() && data[i] == b' ' {
            i += 1;
        }
        let start = i;
        while i < data.len() && data[i].is_ascii_digit() {
            i += 1;
        }
        if start == i || i + 1 >= data.len() {
            return 0;
        }
        if data[i] != b'.' || !matches!(data[i + 1], b' ' | b'\t') {
            return 0;
        }
        i + 2
    }

    /// Length of a definition marker (`:` plus a space), or 0.
    pub(crate) fn dli_prefix(&self, data: &[u8]) -> usize {
        if data.len() < 2 {
            return 0;
        }
        if data[0] != b':' || !matches!(data[1], b' ' | b'\t') {
            return 0;
        }
        2
    }

    /// Parses a whole list block by repeatedly consuming items until one
    /// signals the end of the list.
    pub(crate) fn list(&mut self, data: &[u8], mut flags: ListFlags, start: usize) -> usize {
        let mut i = 0;
        flags |= ListFlags::ITEM_BEGINNING_OF_LIST;
        let block = self.add_block(
            NodeKind::List(ListData {
                flags,
                tight: true,
                start,
                ..Default::default()
            }),
            b"",
        );

        while i < data.len() {
            let skip = self.list_item(&data[i..], &mut flags);
            if flags.contains(ListFlags::ITEM_CONTAINS_BLOCK) {
                if let NodeKind::List(d) = &mut self.tree[block].kind {
                    d.tight = false;
                }
            }
            i += skip;
            if skip == 0 || flags.contains(ListFlags::ITEM_END_OF_LIST) {
                break;
            }
            flags.remove(ListFlags::ITEM_BEGINNING_OF_LIST);
        }

        self.finalize_list(block);
        self.tip = self.tree.parent(block).unwrap_or_else(|| self.tree.root());
        i
    }

    /// Whether the marker at `data` belongs to a different list type than
    /// the one currently being parsed.
    fn list_type_changed(&self, data: &[u8], flags: ListFlags) -> bool {
        if self.dli_prefix(data) > 0 && !flags.contains(ListFlags::DEFINITION) {
            true
        } else if self.oli_prefix(data) > 0 && !flags.contains(ListFlags::ORDERED) {
            true
        } else {
            self.uli_prefix(data) > 0
                && (flags.contains(ListFlags::ORDERED) || flags.contains(ListFlags::DEFINITION))
        }
    }

    /// Parses one list item, accumulating its prefix-stripped lines and
    /// recursing for block-level interiors. Updates `flags` with what the
    /// item discovered (blank separation, list end).
    pub(crate) fn list_item(&mut self, data: &[u8], flags: &mut ListFlags) -> usize {
        // indentation of the item's first line bounds what counts as
        // nested content later
        let mut item_indent = 0;
        if !data.is_empty() && data[0] == b'\t' {
            item_indent += 4;
        } else {
            while item_indent < 3 && item_indent < data.len() && data[item_indent] == b' ' {
                item_indent += 1;
            }
        }

        let mut bullet_char = b'*';
        let mut i = self.uli_prefix(data);
        if i == 0 {
            i = self.oli_prefix(data);
        } else {
            bullet_char = data[i - 2];
        }
        if i == 0 {
            i = self.dli_prefix(data);
            if i > 0 {
                flags.remove(ListFlags::TERM);
            }
        }
        if i == 0 {
            // a line without a marker inside a definition list is a term
            if flags.contains(ListFlags::DEFINITION) {
                flags.insert(ListFlags::TERM);
            } else {
                return 0;
            }
        }

        // skip leading whitespace on the first line
        while i < data.len() && data[i] == b' ' {
            i += 1;
        }

        // first line goes into the working buffer
        let mut line = i;
        while i > 0 && i < data.len() && data[i - 1] != b'\n' {
            i += 1;
        }
        let mut raw: Vec<u8> = data[line..i].to_vec();
        line = i;

        let mut contains_blank_line = false;
        let mut sublist = 0usize;
        let mut fence_marker: Option<super::code::FenceLine> = None;

        'gather: while line < data.len() {
            i += 1;
            while i < data.len() && data[i - 1] != b'\n' {
                i += 1;
            }

            // a blank line is assumed to belong to this item for now
            if is_empty(&data[line..i]) > 0 {
                contains_blank_line = true;
                line = i;
                continue;
            }

            // measure this line's indentation
            let mut indent = 0;
            let mut indent_index = 0;
            if data[line] == b'\t' {
                indent_index += 1;
                indent += 4;
            } else {
                while indent < 4 && line + indent < i && data[line + indent] == b' ' {
                    indent += 1;
                    indent_index += 1;
                }
            }

            let chunk = &data[line + indent_index..i];

            if self.extensions.contains(Extensions::FENCED_CODE) {
                // fenced code inside an item is opaque: track open/close
                // and copy its lines through untouched
                let sig = is_fence_line(chunk, false, fence_marker.as_ref());
                let mut opened_or_closed = false;
                if let Some((_, marker, _)) = sig {
                    if fence_marker.is_none() {
                        fence_marker = Some(marker);
                    } else {
                        fence_marker = None;
                    }
                    opened_or_closed = true;
                }
                if fence_marker.is_some() || opened_or_closed {
                    if contains_blank_line {
                        contains_blank_line = false;
                        raw.push(b'\n');
                    }
                    raw.extend_from_slice(&data[line + indent_index..i]);
                    line = i;
                    continue 'gather;
                }
            }

            // how does this line fit into the item?
            let is_nested_item = (self.uli_prefix(chunk) > 0 && !self.is_hrule(chunk))
                || self.oli_prefix(chunk) > 0
                || self.dli_prefix(chunk) > 0;

            if is_nested_item {
                // at or above the item's own indentation it is a sibling
                // item or a different list, not nested content
                if indent <= item_indent {
                    if self.list_type_changed(chunk, *flags) {
                        flags.insert(ListFlags::ITEM_END_OF_LIST);
                    } else if contains_blank_line {
                        flags.insert(ListFlags::ITEM_CONTAINS_BLOCK);
                    }
                    break 'gather;
                }
                if contains_blank_line {
                    flags.insert(ListFlags::ITEM_CONTAINS_BLOCK);
                }
                // remember where the first nested list began
                if sublist == 0 {
                    sublist = raw.len();
                }
            } else if self.is_prefix_heading(chunk) {
                // an unindented heading after a blank ends the list
                if contains_blank_line && indent < 4 {
                    flags.insert(ListFlags::ITEM_END_OF_LIST);
                    break 'gather;
                }
                flags.insert(ListFlags::ITEM_CONTAINS_BLOCK);
            } else if contains_blank_line && indent < 4 {
                // anything following a blank line must be indented to stay
                // part of the item
                if flags.contains(ListFlags::DEFINITION) && i < data.len() - 1 {
                    // peek whether the next item is still a definition
                    let mut next = i;
                    while next < data.len() && data[next] != b'\n' {
                        next += 1;
                    }
                    while next < data.len() - 1 && data[next] == b'\n' {
                        next += 1;
                    }
                    if i < data.len() - 1
                        && data[i] != b':'
                        && next < data.len() - 1
                        && data[next] != b':'
                    {
                        flags.insert(ListFlags::ITEM_END_OF_LIST);
                    }
                } else {
                    flags.insert(ListFlags::ITEM_END_OF_LIST);
                }
                break 'gather;
            } else if contains_blank_line {
                // blank-separated content at sufficient indent makes this
                // a block-level item
                raw.push(b'\n');
                flags.insert(ListFlags::ITEM_CONTAINS_BLOCK);
            }

            if contains_blank_line {
                contains_blank_line = false;
                raw.push(b'\n');
            }

            raw.extend_from_slice(&data[line + indent_index..i]);
            line = i;
        }

        let item = self.add_block(
            NodeKind::ListItem(ListData {
                flags: *flags,
                tight: false,
                bullet_char,
                delimiter: b'.',
                ..Default::default()
            }),
            b"",
        );

        // parse the gathered contents: block-level when the item contains
        // blocks, otherwise a single deferred paragraph
        if flags.contains(ListFlags::ITEM_CONTAINS_BLOCK) && !flags.contains(ListFlags::TERM) {
            if sublist > 0 && sublist < raw.len() {
                self.block(&raw[..sublist]);
                self.block(&raw[sublist..]);
            } else {
                self.block(&raw);
            }
        } else if sublist > 0 && sublist < raw.len() {
            let para = self.add_block(NodeKind::Paragraph, &raw[..sublist]);
            self.finalize_block(para);
            self.block(&raw[sublist..]);
        } else {
            let para = self.add_block(NodeKind::Paragraph, &raw);
            self.finalize_block(para);
        }

        self.finalize_item(item);
        line
    }

    fn finalize_item(&mut self, item: NodeId) {
        self.tip = self.tree.parent(item).unwrap_or_else(|| self.tree.root());
    }

    /// Retroactive tightness pass: a list is loose when any item is
    /// separated from its neighbor by a blank line.
    pub(crate) fn finalize_list(&mut self, list: NodeId) {
        let items: Vec<NodeId> = self.tree.children(list).to_vec();
        let mut loose = false;
        for (idx, &item) in items.iter().enumerate() {
            let has_next = idx + 1 < items.len();
            if self.ends_with_blank_line(item) && has_next {
                loose = true;
                break;
            }
            let sub_items: Vec<NodeId> = self.tree.children(item).to_vec();
            for (sub_idx, &sub) in sub_items.iter().enumerate() {
                let sub_has_next = sub_idx + 1 < sub_items.len();
                if self.ends_with_blank_line(sub) && (has_next || sub_has_next) {
                    loose = true;
                    break;
                }
            }
            if loose {
                break;
            }
        }
        if loose {
            if let NodeKind::List(d) = &mut self.tree[list].kind {
                d.tight = false;
            }
        }
    }

    /// Whether `block` ends with a blank line, descending into trailing
    /// lists and items. A trailing blank inside a nested sublist belongs
    /// to that sublist and does not loosen the list being finalized, so
    /// the descent bottoms out at false.
    fn ends_with_blank_line(&self, mut block: NodeId) -> bool {
        loop {
            match &self.tree[block].kind {
                NodeKind::List(_) | NodeKind::ListItem(_) => match self.tree.last_child(block) {
                    Some(last) => block = last,
                    None => return false,
                },
                _ => return false,
            }
        }
    }
}
