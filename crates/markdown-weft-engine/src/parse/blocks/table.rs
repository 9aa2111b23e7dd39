//! Table parsing: a candidate header line, a delimiter row that fixes the
//! column count and alignments, then body rows.
//!
//! Recognition needs two-line lookahead; nothing is emitted until the
//! delimiter row validates. Pipes inside backtick code spans or escaped
//! with a backslash do not separate cells.

use crate::ast::{CellAlign, CellData, NodeId, NodeKind};

use super::super::Parser;
use super::super::scanners::{is_backslash_escaped, skip_char, skip_char_n};

impl Parser {
    /// Consumes a whole table, or returns 0 if `data` does not start one.
    pub(crate) fn table(&mut self, data: &[u8]) -> usize {
        let (mut i, columns, table) = self.table_header(data);
        if i == 0 {
            return 0;
        }
        let table = match table {
            Some(t) => t,
            None => return 0,
        };

        self.add_block(NodeKind::TableBody, b"");

        while i < data.len() {
            let mut pipes = 0;
            let row_start = i;
            while i < data.len() && data[i] != b'\n' {
                if data[i] == b'|' {
                    pipes += 1;
                }
                i += 1;
            }
            if pipes == 0 {
                i = row_start;
                break;
            }
            // include the newline in the row data
            i = skip_char_n(data, i, b'\n', 1);
            self.table_row(&data[row_start..i], &columns, false);
        }

        self.tip = self.tree.parent(table).unwrap_or_else(|| self.tree.root());
        i
    }

    /// Validates the header + delimiter pair. On success emits the Table
    /// and TableHead (unless the first line is itself the delimiter, which
    /// makes a headerless table) and returns the bytes consumed, the
    /// column alignments, and the table node.
    fn table_header(&mut self, data: &[u8]) -> (usize, Vec<CellAlign>, Option<NodeId>) {
        let none = (0, Vec::new(), None);

        let mut i = 0;
        let mut col_count = 1;
        let mut header_is_underline = true;
        let mut header_is_with_empty_fields = true;
        while i < data.len() && data[i] != b'\n' {
            if data[i] == b'|' && !is_backslash_escaped(data, i) {
                col_count += 1;
            }
            if data[i] != b'-' && data[i] != b' ' && data[i] != b':' && data[i] != b'|' {
                header_is_underline = false;
            }
            if data[i] != b' ' && data[i] != b'|' {
                header_is_with_empty_fields = false;
            }
            i += 1;
        }

        // a table needs at least one pipe in the header line
        if col_count == 1 {
            return none;
        }

        // include the newline in the data sent to the row parser
        let j = skip_char_n(data, i, b'\n', 1);
        let mut header: Option<Vec<u8>> = Some(data[..j].to_vec());

        // column count ignores pipes at the beginning or end of the line
        if data[0] == b'|' {
            col_count -= 1;
        }
        {
            let mut tmp = &data[..j];
            while let Some((&last, rest)) = tmp.split_last() {
                if last == b'\n' || last == b' ' {
                    tmp = rest;
                } else {
                    break;
                }
            }
            let n = tmp.len();
            if n > 2 && tmp[n - 1] == b'|' && !is_backslash_escaped(tmp, n - 1) {
                col_count -= 1;
            }
        }

        // if the first line is itself an underline, this is a headerless
        // table and the same line is re-parsed as the delimiter row
        let mut i = if header_is_underline && !header_is_with_empty_fields {
            header = None;
            0
        } else {
            j
        };

        let mut columns = vec![CellAlign::empty(); col_count];

        if i >= data.len() {
            return none;
        }
        if data[i] == b'|' && !is_backslash_escaped(data, i) {
            i += 1;
        }
        i = skip_char(data, i, b' ');

        // each delimiter cell is of the form / *:?-+:? *|/ with at least
        // three dashes-or-colons; the trailing pipe is optional on the
        // last column
        let mut col = 0;
        while i < data.len() && data[i] != b'\n' {
            if col >= col_count {
                return none;
            }
            let mut dashes = 0;
            if data[i] == b':' {
                i += 1;
                columns[col] |= CellAlign::LEFT;
                dashes += 1;
            }
            while i < data.len() && data[i] == b'-' {
                i += 1;
                dashes += 1;
            }
            if i < data.len() && data[i] == b':' {
                i += 1;
                columns[col] |= CellAlign::RIGHT;
                dashes += 1;
            }
            while i < data.len() && data[i] == b' ' {
                i += 1;
            }
            if i == data.len() {
                return none;
            }

            if dashes < 3 {
                return none;
            }
            if data[i] == b'|' && !is_backslash_escaped(data, i) {
                col += 1;
                i += 1;
                while i < data.len() && data[i] == b' ' {
                    i += 1;
                }
                if col >= col_count && i < data.len() && data[i] != b'\n' {
                    // trailing junk after the last column
                    return none;
                }
            } else if (data[i] != b'|' || is_backslash_escaped(data, i)) && col + 1 < col_count {
                // a marker was required here
                return none;
            } else if data[i] == b'\n' {
                col += 1;
            } else {
                return none;
            }
        }
        if col != col_count {
            return none;
        }

        let table = self.add_block(NodeKind::Table, b"");
        if let Some(h) = header {
            self.add_block(NodeKind::TableHead, b"");
            self.table_row(&h, &columns, true);
        }
        let size = skip_char_n(data, i, b'\n', 1);
        (size, columns, Some(table))
    }

    /// Splits one row line into cells and emits them, padding short rows
    /// and silently dropping extra cells.
    pub(crate) fn table_row(&mut self, data: &[u8], columns: &[CellAlign], header: bool) {
        self.add_block(NodeKind::TableRow, b"");

        let mut i = skip_char(data, 0, b'|');
        let n = data.len();
        let mut col = 0;
        while col < columns.len() && i < n {
            i = skip_char(data, i, b' ');
            let cell_start = i;
            i = scan_cell_end(data, i);
            let mut cell_end = i;

            // skip the end-of-cell marker
            if i < n && data[i] == b'|' && !is_backslash_escaped(data, i) {
                i += 1;
            }

            while cell_end > cell_start && cell_end - 1 < n && data[cell_end - 1] == b' ' {
                cell_end -= 1;
            }

            let cell = self.add_block(
                NodeKind::TableCell(CellData {
                    is_header: header,
                    align: columns[col],
                }),
                &data[cell_start..cell_end],
            );
            self.finalize_block(cell);
            col += 1;
        }

        // pad out with empty cells to the full column count
        while col < columns.len() {
            let cell = self.add_block(
                NodeKind::TableCell(CellData {
                    is_header: header,
                    align: columns[col],
                }),
                b"",
            );
            self.finalize_block(cell);
            col += 1;
        }
        // rows with too many cells are silently truncated
    }
}

/// Advances to the next cell boundary: an unescaped `|` outside any closed
/// backtick code span, or end of line.
fn scan_cell_end(data: &[u8], mut i: usize) -> usize {
    let n = data.len();
    while i < n && data[i] != b'\n' {
        if data[i] == b'`' {
            let run = skip_char(data, i, b'`') - i;
            match find_closing_ticks(data, i + run, run) {
                Some(close) => {
                    i = close;
                    continue;
                }
                None => {
                    // no closer on this line: the ticks are literal
                    i += run;
                    continue;
                }
            }
        }
        if data[i] == b'|' && !is_backslash_escaped(data, i) {
            return i;
        }
        i += 1;
    }
    i
}

/// Finds a backtick run of exactly `run` ticks before the end of line,
/// returning the index just past it.
fn find_closing_ticks(data: &[u8], mut i: usize, run: usize) -> Option<usize> {
    let n = data.len();
    while i < n && data[i] != b'\n' {
        if data[i] == b'`' {
            let len = skip_char(data, i, b'`') - i;
            if len == run {
                return Some(i + len);
            }
            i += len;
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::super::ParserOptions;
    use crate::ast::Tree;

    fn parse(input: &[u8]) -> Tree {
        Parser::new(ParserOptions::default()).parse(input)
    }

    fn find_table(tree: &Tree) -> NodeId {
        tree.children(tree.root())
            .iter()
            .copied()
            .find(|&c| tree[c].kind == NodeKind::Table)
            .expect("table node")
    }

    fn cell_texts(tree: &Tree, row: NodeId) -> Vec<String> {
        tree.children(row)
            .iter()
            .map(|&cell| {
                tree.children(cell)
                    .iter()
                    .map(|&t| String::from_utf8_lossy(&tree[t].literal).into_owned())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn header_body_and_alignment() {
        let tree = parse(b"| a | b|\n| :--- | ---: |\n| c | d |\n");
        let table = find_table(&tree);
        let head = tree.children(table)[0];
        assert_eq!(tree[head].kind, NodeKind::TableHead);
        let body = tree.children(table)[1];
        assert_eq!(tree[body].kind, NodeKind::TableBody);

        let head_row = tree.children(head)[0];
        let cells = tree.children(head_row);
        assert_eq!(cells.len(), 2);
        match (&tree[cells[0]].kind, &tree[cells[1]].kind) {
            (NodeKind::TableCell(a), NodeKind::TableCell(b)) => {
                assert!(a.is_header);
                assert_eq!(a.align, CellAlign::LEFT);
                assert_eq!(b.align, CellAlign::RIGHT);
            }
            other => panic!("unexpected cells: {other:?}"),
        }
        assert_eq!(cell_texts(&tree, head_row), vec!["a", "b"]);

        let body_row = tree.children(body)[0];
        assert_eq!(cell_texts(&tree, body_row), vec!["c", "d"]);
        match &tree[tree.children(body_row)[0]].kind {
            NodeKind::TableCell(c) => assert!(!c.is_header),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn center_alignment_is_left_or_right() {
        let tree = parse(b"| a |\n| :---: |\n| b |\n");
        let table = find_table(&tree);
        let head_row = tree.children(tree.children(table)[0])[0];
        match &tree[tree.children(head_row)[0]].kind {
            NodeKind::TableCell(c) => {
                assert_eq!(c.align, CellAlign::CENTER);
                assert!(c.align.contains(CellAlign::LEFT | CellAlign::RIGHT));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn not_a_table_without_delimiter_row() {
        let tree = parse(b"| a | b |\nplain text\n");
        assert!(
            !tree
                .children(tree.root())
                .iter()
                .any(|&c| tree[c].kind == NodeKind::Table)
        );
    }

    #[test]
    fn too_few_dashes_is_not_a_delimiter() {
        let tree = parse(b"a | b\n- | -\n");
        assert!(
            !tree
                .children(tree.root())
                .iter()
                .any(|&c| tree[c].kind == NodeKind::Table)
        );
    }

    #[test]
    fn pipe_inside_code_span_does_not_split_cell() {
        let tree = parse(b"| a | b |\n| --- | --- |\n| `c|d` | e |\n");
        let table = find_table(&tree);
        let body = tree.children(table)[1];
        let row = tree.children(body)[0];
        let cells = tree.children(row);
        assert_eq!(cells.len(), 2);
        // the first cell still holds the whole code span
        let first = String::from_utf8_lossy(&tree[cells[0]].content).into_owned();
        let first_text: String = tree
            .children(cells[0])
            .iter()
            .map(|&t| String::from_utf8_lossy(&tree[t].literal).into_owned())
            .collect();
        assert!(first.is_empty() || first.contains('|'), "raw content consumed");
        assert_eq!(first_text, "c|d");
    }

    #[test]
    fn escaped_pipe_does_not_split_cell() {
        let tree = parse(b"| a | b |\n| --- | --- |\n| c\\|d | e |\n");
        let table = find_table(&tree);
        let body = tree.children(table)[1];
        let row = tree.children(body)[0];
        assert_eq!(tree.children(row).len(), 2);
    }

    #[test]
    fn short_row_padded_with_empty_cells() {
        let tree = parse(b"| a | b |\n| --- | --- |\n| only |\n");
        let table = find_table(&tree);
        let body = tree.children(table)[1];
        let row = tree.children(body)[0];
        assert_eq!(tree.children(row).len(), 2);
    }

    #[test]
    fn table_ends_at_pipeless_line() {
        let tree = parse(b"| a |  b |\n| --- | --- |\n| c | d |\nplain\n");
        let kinds: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&c| tree[c].kind.name())
            .collect();
        assert_eq!(kinds, vec!["Table", "Paragraph"]);
    }
}
