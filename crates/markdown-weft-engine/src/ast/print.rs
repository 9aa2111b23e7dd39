//! Indented debug dump of a subtree, one node per line. Used by snapshot
//! tests and ad-hoc diagnostics; not part of the rendering pipeline.

use super::{NodeId, NodeKind, Tree};

/// Renders the subtree under `root` as an indented listing of node kinds
/// and literal snippets.
pub fn dump(tree: &Tree, root: NodeId) -> String {
    let mut out = String::new();
    dump_rec(tree, root, 0, &mut out);
    out
}

fn dump_rec(tree: &Tree, id: NodeId, depth: usize, out: &mut String) {
    let node = &tree[id];
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(node.kind.name());
    let content = if !node.literal.is_empty() {
        &node.literal
    } else {
        &node.content
    };
    if !content.is_empty() {
        out.push_str(" '");
        out.push_str(&snippet(content));
        out.push('\'');
    }
    match &node.kind {
        NodeKind::Heading(h) => {
            out.push_str(&format!(" level={}", h.level));
            if let Some(id) = &h.heading_id {
                out.push_str(&format!(" id={id}"));
            }
        }
        NodeKind::List(l) | NodeKind::ListItem(l) => {
            if l.flags.contains(super::ListFlags::ORDERED) {
                out.push_str(" ordered");
            }
            if l.tight {
                out.push_str(" tight");
            }
        }
        NodeKind::Link(l) | NodeKind::Image(l) => {
            out.push_str(&format!(" dest='{}'", snippet(&l.destination)));
        }
        NodeKind::TableCell(c) => {
            out.push_str(&format!(" align={:?}", c.align));
        }
        _ => {}
    }
    out.push('\n');
    for &child in tree.children(id) {
        dump_rec(tree, child, depth + 1, out);
    }
}

fn snippet(bytes: &[u8]) -> String {
    let mut s = String::from_utf8_lossy(bytes).into_owned();
    s = s.replace('\n', "\\n");
    if s.len() > 40 {
        let mut cut = 40;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{HeadingData, NodeKind, Tree};

    #[test]
    fn dump_shows_nesting_and_literals() {
        let mut tree = Tree::new();
        let h = tree.new_node(NodeKind::Heading(HeadingData {
            level: 2,
            ..Default::default()
        }));
        let t = tree.new_text(b"title");
        tree.append_child(tree.root(), h);
        tree.append_child(h, t);

        let dumped = dump(&tree, tree.root());
        assert_eq!(dumped, "Document\n  Heading level=2\n    Text 'title'\n");
    }

    #[test]
    fn dump_survives_invalid_utf8() {
        let mut tree = Tree::new();
        let t = tree.new_text(&[0xff, 0xfe, b'x']);
        tree.append_child(tree.root(), t);
        let dumped = dump(&tree, tree.root());
        assert!(dumped.contains("Text"));
    }
}
