//! # Tree Model
//!
//! Arena-backed abstract syntax tree for parsed markdown.
//!
//! A [`Tree`] owns every node; a [`NodeId`] is a cheap copyable handle into
//! the arena. Containers own their children as an ordered `Vec<NodeId>`;
//! parent links are non-owning back-references. Because ownership only ever
//! flows downward, back-pointers such as a footnote link's reference to its
//! footnote body can never form a retain cycle.
//!
//! ## Key Invariants
//!
//! - Every non-root node has exactly one parent and appears exactly once in
//!   that parent's child sequence.
//! - [`Tree::append_child`] detaches the child from any prior parent first,
//!   so "build a node, accumulate children, attach later" is always safe.
//! - Detaching a node never clears the node's own child list; a partially
//!   built subtree survives re-parenting.

pub mod print;
pub mod walker;

pub use walker::{NodeVisitor, WalkStatus, walk};

use bitflags::bitflags;

bitflags! {
    /// Flags carried by [`List`](NodeKind::List) and
    /// [`ListItem`](NodeKind::ListItem) nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ListFlags: u32 {
        const ORDERED = 1 << 0;
        const DEFINITION = 1 << 1;
        const TERM = 1 << 2;
        const ITEM_CONTAINS_BLOCK = 1 << 3;
        const ITEM_BEGINNING_OF_LIST = 1 << 4;
        const ITEM_END_OF_LIST = 1 << 5;
    }
}

bitflags! {
    /// Column alignment of a table cell. Center is left and right or'ed
    /// together, matching the `:---:` delimiter form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellAlign: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const CENTER = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

/// Metadata shared by list and list-item nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListData {
    pub flags: ListFlags,
    /// Skip `<p>` wrapping around item bodies if true.
    pub tight: bool,
    /// `*`, `+` or `-` in bullet lists.
    pub bullet_char: u8,
    /// `.` or `)` after the number in ordered lists.
    pub delimiter: u8,
    /// Start number of an ordered list (used with `ORDERED_LIST_START`).
    pub start: usize,
    /// If set, this item is a footnote body and this is its back-link id.
    pub ref_link: Option<Vec<u8>>,
    /// The synthetic list holding all footnote bodies.
    pub is_footnotes_list: bool,
}

/// Metadata for heading nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadingData {
    /// Level 1-6.
    pub level: u8,
    /// Stable fragment id, from `{#id}` or auto-generated.
    pub heading_id: Option<String>,
    pub is_titleblock: bool,
}

/// Metadata for link and image nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkData {
    /// What goes into `href`/`src`.
    pub destination: Vec<u8>,
    /// Tooltip text for the `title` attribute.
    pub title: Vec<u8>,
    /// Serial number of a footnote, zero if not a footnote.
    pub note_id: usize,
    /// Direct (non-owning) handle to the footnote body node.
    pub footnote: Option<NodeId>,
}

/// Metadata for code-block nodes, enough to reconstruct fence handling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeBlockData {
    /// Fenced rather than indented.
    pub is_fenced: bool,
    /// The info string after the opening fence.
    pub info: Vec<u8>,
    pub fence_char: u8,
    pub fence_length: usize,
    pub fence_offset: usize,
}

/// Metadata for table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellData {
    /// Whether the cell sits under the header row.
    pub is_header: bool,
    pub align: CellAlign,
}

/// The closed set of node variants. Container kinds own children; leaf
/// kinds carry only literal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    BlockQuote,
    List(ListData),
    ListItem(ListData),
    Paragraph,
    Heading(HeadingData),
    HorizontalRule,
    Emph,
    Strong,
    Del,
    Link(LinkData),
    Image(LinkData),
    Text,
    HtmlBlock,
    CodeBlock(CodeBlockData),
    Softbreak,
    Hardbreak,
    Code,
    HtmlSpan,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell(CellData),
    Subscript,
    Superscript,
}

impl NodeKind {
    /// Whether this kind may own children. Exhaustive on purpose: adding a
    /// variant forces a decision here.
    pub fn is_container(&self) -> bool {
        match self {
            NodeKind::Document
            | NodeKind::BlockQuote
            | NodeKind::List(_)
            | NodeKind::ListItem(_)
            | NodeKind::Paragraph
            | NodeKind::Heading(_)
            | NodeKind::Emph
            | NodeKind::Strong
            | NodeKind::Del
            | NodeKind::Link(_)
            | NodeKind::Image(_)
            | NodeKind::Table
            | NodeKind::TableHead
            | NodeKind::TableBody
            | NodeKind::TableRow
            | NodeKind::TableCell(_) => true,
            NodeKind::HorizontalRule
            | NodeKind::Text
            | NodeKind::HtmlBlock
            | NodeKind::CodeBlock(_)
            | NodeKind::Softbreak
            | NodeKind::Hardbreak
            | NodeKind::Code
            | NodeKind::HtmlSpan
            | NodeKind::Subscript
            | NodeKind::Superscript => false,
        }
    }

    /// Short stable name, used by the debug dump and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "Document",
            NodeKind::BlockQuote => "BlockQuote",
            NodeKind::List(_) => "List",
            NodeKind::ListItem(_) => "ListItem",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Heading(_) => "Heading",
            NodeKind::HorizontalRule => "HorizontalRule",
            NodeKind::Emph => "Emph",
            NodeKind::Strong => "Strong",
            NodeKind::Del => "Del",
            NodeKind::Link(_) => "Link",
            NodeKind::Image(_) => "Image",
            NodeKind::Text => "Text",
            NodeKind::HtmlBlock => "HtmlBlock",
            NodeKind::CodeBlock(_) => "CodeBlock",
            NodeKind::Softbreak => "Softbreak",
            NodeKind::Hardbreak => "Hardbreak",
            NodeKind::Code => "Code",
            NodeKind::HtmlSpan => "HtmlSpan",
            NodeKind::Table => "Table",
            NodeKind::TableHead => "TableHead",
            NodeKind::TableBody => "TableBody",
            NodeKind::TableRow => "TableRow",
            NodeKind::TableCell(_) => "TableCell",
            NodeKind::Subscript => "Subscript",
            NodeKind::Superscript => "Superscript",
        }
    }
}

/// Handle to a node in a [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node's storage: kind, tree links and byte content.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Text contents of leaf nodes.
    pub literal: Vec<u8>,
    /// Raw markdown content of block nodes, held until inline parsing.
    pub content: Vec<u8>,
}

/// Violations of the tree's programming contract. These are defensive
/// invariant checks, not user-facing parse failures; malformed markdown
/// never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0:?} is a leaf kind and cannot own children")]
    InvalidNodeKind(NodeId),
}

/// The arena owning all nodes of one parsed document.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding a single `Document` root.
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
            literal: Vec::new(),
            content: Vec::new(),
        };
        Tree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached node of the given kind.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            literal: Vec::new(),
            content: Vec::new(),
        });
        id
    }

    /// Allocates a detached `Text` leaf holding `literal`.
    pub fn new_text(&mut self, literal: &[u8]) -> NodeId {
        let id = self.new_node(NodeKind::Text);
        self.nodes[id.index()].literal = literal.to_vec();
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].children.last().copied()
    }

    /// Sibling directly after `id` in its parent's child sequence.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Sibling directly before `id` in its parent's child sequence.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.nodes[id.index()].kind.is_container()
    }

    /// Re-parents `child` under `parent`, detaching it from any previous
    /// parent first.
    ///
    /// Returns [`TreeError::InvalidNodeKind`] if `parent` is a leaf kind.
    pub fn try_append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.is_container(parent) {
            return Err(TreeError::InvalidNodeKind(parent));
        }
        self.remove_from_tree(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Like [`Tree::try_append_child`] but panics on a leaf parent. Appending
    /// to a leaf is a programming-contract violation, never a parse outcome.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Err(e) = self.try_append_child(parent, child) {
            panic!("{e}");
        }
    }

    /// Detaches `id` from its parent, if any. The node's own child list is
    /// left untouched so a partially built subtree is never discarded.
    pub fn remove_from_tree(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.index()].parent.take() else {
            return;
        };
        let siblings = &mut self.nodes[parent.index()].children;
        if let Some(pos) = siblings.iter().position(|&c| c == id) {
            siblings.remove(pos);
        }
    }
}

impl std::ops::Index<NodeId> for Tree {
    type Output = NodeData;

    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }
}
