//! The renderer contract: how downstream output formats consume the tree.
//!
//! A renderer is driven by the walker protocol; whatever status it returns
//! feeds directly back into the walk's control flow, so a renderer can
//! skip subtrees (e.g. an image's alt text it already emitted) or abort.

use crate::ast::{NodeId, Tree, WalkStatus, walk};

/// Implemented by output formats. `render_node` is called per the
/// enter/exit walker protocol; `render_header` and `render_footer` run
/// once each around the main walk for preamble and postamble.
pub trait Renderer {
    fn render_node(&mut self, tree: &Tree, node: NodeId, entering: bool) -> WalkStatus;

    fn render_header(&mut self, _tree: &Tree, _root: NodeId) {}

    fn render_footer(&mut self, _tree: &Tree, _root: NodeId) {}
}

/// Drives `renderer` over the subtree rooted at `root`.
pub fn render<R: Renderer + ?Sized>(tree: &Tree, root: NodeId, renderer: &mut R) {
    renderer.render_header(tree, root);
    let mut visit =
        |t: &Tree, n: NodeId, entering: bool| -> WalkStatus { renderer.render_node(t, n, entering) };
    walk(tree, root, &mut visit);
    renderer.render_footer(tree, root);
}
