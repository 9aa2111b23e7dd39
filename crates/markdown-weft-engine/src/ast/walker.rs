//! Depth-first enter/exit traversal over a [`Tree`].
//!
//! Containers are visited twice, once entering (before children) and once
//! exiting (after all children); leaves are visited once, entering. Order is
//! deterministic pre-order by child-sequence order, matching the source
//! document.
//!
//! Termination is immediate: no further siblings or ancestor exits are
//! visited. One deliberate exception: when a visitor terminates on the
//! *entering* call of a container, that container's own exiting call is
//! still delivered, so a renderer can always close a tag it just opened.
//! A terminate returned from an exiting call delivers nothing further.
//! Downstream renderers depend on this exact contract.

use super::{NodeId, Tree};

/// Control value returned by a visitor to steer the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Default traversal of every node.
    GoToNext,
    /// Skip all children of the current node. Only meaningful on an
    /// entering call; the skipped container receives no exiting call.
    SkipChildren,
    /// Stop the whole traversal.
    Terminate,
}

/// Callback invoked while traversing the tree.
pub trait NodeVisitor {
    fn visit(&mut self, tree: &Tree, node: NodeId, entering: bool) -> WalkStatus;
}

impl<F> NodeVisitor for F
where
    F: FnMut(&Tree, NodeId, bool) -> WalkStatus,
{
    fn visit(&mut self, tree: &Tree, node: NodeId, entering: bool) -> WalkStatus {
        self(tree, node, entering)
    }
}

/// Walks the subtree rooted at `root`, driving `visitor` per the enter/exit
/// protocol above.
pub fn walk<V: NodeVisitor + ?Sized>(tree: &Tree, root: NodeId, visitor: &mut V) {
    let mut current = Some(root);
    let mut entering = true;

    while let Some(cur) = current {
        match visitor.visit(tree, cur, entering) {
            WalkStatus::GoToNext => {}
            WalkStatus::SkipChildren => entering = false,
            WalkStatus::Terminate => {
                // Symmetry exception: a container we just entered still
                // gets its exit call; its return value cannot restart the
                // walk.
                if entering && tree.is_container(cur) {
                    visitor.visit(tree, cur, false);
                }
                return;
            }
        }
        advance(tree, root, &mut current, &mut entering);
    }
}

fn advance(tree: &Tree, root: NodeId, current: &mut Option<NodeId>, entering: &mut bool) {
    let cur = match *current {
        Some(c) => c,
        None => return,
    };
    let is_container = tree.is_container(cur);

    if (!is_container || !*entering) && cur == root {
        *current = None;
        return;
    }
    if *entering && is_container {
        match tree.first_child(cur) {
            Some(first) => {
                *current = Some(first);
                *entering = true;
            }
            None => *entering = false,
        }
    } else {
        match tree.next_sibling(cur) {
            Some(sibling) => {
                *current = Some(sibling);
                *entering = true;
            }
            None => {
                *current = tree.parent(cur);
                *entering = false;
            }
        }
    }
}
