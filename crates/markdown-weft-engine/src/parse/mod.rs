//! # Parsing
//!
//! Two-phase parsing over a read-only byte buffer.
//!
//! 1. **Block structure** (`blocks`): a line-oriented state machine segments
//!    the input into nested block containers, deferring inline content as
//!    raw byte spans on the produced nodes.
//! 2. **Inline elements** (`inline`): each deferred span is re-scanned with
//!    a per-byte handler table, attaching inline children and resolving
//!    references against the table built during phase 1.
//!
//! A [`Parser`] is single-use and carries no state across documents: the
//! container tip, reference table, footnote list and nesting counter are all
//! constructed fresh per parse. Nesting depth is bounded so pathological
//! input degrades to flat text instead of overflowing the stack.

pub mod attribute;
pub mod blocks;
pub mod inline;
pub mod refs;
pub mod scanners;

use bitflags::bitflags;

use crate::ast::{ListData, ListFlags, NodeId, NodeKind, Tree};

use attribute::BlockAttr;
use refs::{ParsedRef, RefTable, ReferenceOverrideFn};

bitflags! {
    /// Independently togglable syntax extensions. Each flag gates exactly
    /// one recognizer or behavior variant; any subset may be enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Extensions: u32 {
        /// Ignore emphasis markers inside words.
        const NO_INTRA_EMPHASIS = 1 << 0;
        /// Pipe-delimited tables with an alignment row.
        const TABLES = 1 << 1;
        /// ``` and ~~~ fenced code blocks.
        const FENCED_CODE = 1 << 2;
        /// Detect bare URLs and `<scheme:...>` forms as links.
        const AUTOLINK = 1 << 3;
        /// `~~text~~` strikethrough.
        const STRIKETHROUGH = 1 << 4;
        /// Looser termination rules for HTML blocks.
        const LAX_HTML_BLOCKS = 1 << 5;
        /// Every newline is a hard line break.
        const HARD_LINE_BREAK = 1 << 6;
        /// `[^id]` footnotes with deferred definitions.
        const FOOTNOTES = 1 << 7;
        /// Lists and quotes may interrupt a paragraph without a blank line.
        const NO_EMPTY_LINE_BEFORE_BLOCK = 1 << 8;
        /// `# Heading {#id}` explicit heading ids.
        const HEADING_IDS = 1 << 9;
        /// Leading `%` lines form a title block.
        const TITLEBLOCK = 1 << 10;
        /// Derive ids for headings that have none.
        const AUTO_HEADING_IDS = 1 << 11;
        /// A backslash before a newline is a hard break.
        const BACKSLASH_LINE_BREAK = 1 << 12;
        /// `term` / `: definition` lists.
        const DEFINITION_LISTS = 1 << 13;
        /// `{#id .class key="val"}` block attribute lines.
        const ATTRIBUTES = 1 << 14;
        /// `^sup^` and `~sub~`.
        const SUPER_SUBSCRIPT = 1 << 15;
        /// Ordered lists honor their first number.
        const ORDERED_LIST_START = 1 << 16;
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Extensions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Extensions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Extensions::from_bits_truncate(bits))
    }
}

impl Extensions {
    /// The bundle most callers want.
    pub fn common() -> Self {
        Self::NO_INTRA_EMPHASIS
            | Self::TABLES
            | Self::FENCED_CODE
            | Self::AUTOLINK
            | Self::STRIKETHROUGH
            | Self::HEADING_IDS
            | Self::BACKSLASH_LINE_BREAK
            | Self::DEFINITION_LISTS
    }
}

/// Supplementary knobs beyond the extension flags.
pub struct ParserOptions {
    pub extensions: Extensions,
    /// Consulted before the built-in reference table; `None` falls through.
    pub reference_override: Option<Box<ReferenceOverrideFn>>,
    /// Shared recursion bound for block and inline nesting.
    pub max_nesting: usize,
    /// Width of an indentation unit for indented code and footnote bodies.
    pub tab_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            extensions: Extensions::common(),
            reference_override: None,
            max_nesting: 16,
            tab_size: 4,
        }
    }
}

impl std::fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserOptions")
            .field("extensions", &self.extensions)
            .field("max_nesting", &self.max_nesting)
            .field("tab_size", &self.tab_size)
            .field("reference_override", &self.reference_override.is_some())
            .finish()
    }
}

/// A footnote recorded at its first use, in use order.
#[derive(Debug, Clone)]
pub(crate) struct Note {
    pub link: Vec<u8>,
    /// Raw body text, parsed when the footnote list is assembled.
    pub title: Vec<u8>,
    pub has_block: bool,
    /// The `ListItem` node that will hold the body.
    pub node: NodeId,
}

/// Handler for one inline lead byte. Returns the bytes consumed from
/// `offset` and an optional produced node; zero consumed means "no match
/// here" and the scanner advances by one byte.
pub(crate) type InlineHandler = fn(&mut Parser, &[u8], usize) -> (usize, Option<NodeId>);

/// Single-document parser. Construct one per parse; see the module docs.
pub struct Parser {
    pub(crate) extensions: Extensions,
    pub(crate) tree: Tree,
    /// Innermost still-open container; new blocks climb from here.
    pub(crate) tip: NodeId,
    pub(crate) refs: RefTable,
    pub(crate) reference_override: Option<Box<ReferenceOverrideFn>>,
    pub(crate) notes: Vec<Note>,
    pub(crate) inline_callbacks: [Option<InlineHandler>; 256],
    pub(crate) inside_link: bool,
    pub(crate) nesting: usize,
    pub(crate) max_nesting: usize,
    pub(crate) tab_size: usize,
    /// Attribute line waiting for the block it decorates.
    pub(crate) pending_attr: Option<BlockAttr>,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        let tree = Tree::new();
        let root = tree.root();
        let mut p = Parser {
            extensions: options.extensions,
            tree,
            tip: root,
            refs: RefTable::default(),
            reference_override: options.reference_override,
            notes: Vec::new(),
            inline_callbacks: [None; 256],
            inside_link: false,
            nesting: 0,
            max_nesting: options.max_nesting,
            tab_size: options.tab_size,
            pending_attr: None,
        };
        inline::register_handlers(&mut p);
        p
    }

    /// Parses `input` into a finished tree. Total over arbitrary bytes:
    /// malformed constructs fall back to plainer interpretations and the
    /// returned tree is always complete and well-formed.
    pub fn parse(mut self, input: &[u8]) -> Tree {
        // the line-oriented scanners assume every line is terminated
        let mut buf = input.to_vec();
        if !buf.ends_with(b"\n") {
            buf.push(b'\n');
        }

        self.block(&buf);
        self.tip = self.tree.root();

        // second phase: inline-parse every deferred content span
        let targets = self.collect_inline_targets(self.tree.root());
        for id in targets {
            let content = std::mem::take(&mut self.tree[id].content);
            self.inline(id, &content);
        }

        self.assemble_footnotes();
        self.tree
    }

    /// Gathers nodes whose raw content still awaits inline parsing, in
    /// document order.
    fn collect_inline_targets(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if matches!(
                self.tree[id].kind,
                NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::TableCell(_)
            ) && !self.tree[id].content.is_empty()
            {
                out.push(id);
            }
            for &child in self.tree.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Injects the footnote list at the end of the document, items in
    /// first-use order, and parses their deferred bodies.
    fn assemble_footnotes(&mut self) {
        if !self.extensions.contains(Extensions::FOOTNOTES) || self.notes.is_empty() {
            return;
        }
        self.tip = self.tree.root();
        let list = self.add_block(
            NodeKind::List(ListData {
                flags: ListFlags::ORDERED,
                is_footnotes_list: true,
                ..Default::default()
            }),
            b"",
        );

        let mut flags = ListFlags::ITEM_BEGINNING_OF_LIST;
        // indexed loop: parsing a body below can append further notes
        let mut i = 0;
        while i < self.notes.len() {
            let note = self.notes[i].clone();
            log::trace!("footnote {} attached as note {}", String::from_utf8_lossy(&note.link), i + 1);
            self.add_existing_child(note.node);
            if let NodeKind::ListItem(data) = &mut self.tree[note.node].kind {
                data.flags = flags | ListFlags::ORDERED;
                data.ref_link = Some(note.link.clone());
            }
            if note.has_block {
                flags |= ListFlags::ITEM_CONTAINS_BLOCK;
                self.block(&note.title);
            } else {
                self.inline(note.node, &note.title);
            }
            flags.remove(ListFlags::ITEM_BEGINNING_OF_LIST | ListFlags::ITEM_CONTAINS_BLOCK);
            i += 1;
        }

        self.tip = self.tree.root();
        let targets = self.collect_inline_targets(list);
        for id in targets {
            let content = std::mem::take(&mut self.tree[id].content);
            self.inline(id, &content);
        }
        self.finalize_list(list);
    }

    /// Opens a new block at the innermost container able to hold it,
    /// closing unmatched containers on the way up.
    pub(crate) fn add_block(&mut self, kind: NodeKind, content: &[u8]) -> NodeId {
        let node = self.tree.new_node(kind);
        self.tree[node].content = content.to_vec();
        self.add_existing_child(node)
    }

    pub(crate) fn add_existing_child(&mut self, node: NodeId) -> NodeId {
        let root = self.tree.root();
        while self.tip != root && !can_contain(&self.tree[self.tip].kind, &self.tree[node].kind) {
            log::trace!("closing {} for incoming {}", self.tree[self.tip].kind.name(), self.tree[node].kind.name());
            self.finalize_block(self.tip);
        }
        self.apply_pending_attr(node);
        self.tree.append_child(self.tip, node);
        self.tip = node;
        node
    }

    /// Closes `block`, moving the tip to its parent.
    pub(crate) fn finalize_block(&mut self, block: NodeId) {
        self.tip = self.tree.parent(block).unwrap_or_else(|| self.tree.root());
    }

    /// A pending `{...}` attribute line decorates the next heading.
    fn apply_pending_attr(&mut self, node: NodeId) {
        let Some(attr) = self.pending_attr.take() else {
            return;
        };
        if let NodeKind::Heading(data) = &mut self.tree[node].kind {
            if let Some(id) = attr.id {
                data.heading_id = Some(id);
            }
        }
    }

    pub(crate) fn insert_ref(&mut self, parsed: ParsedRef) {
        log::trace!("reference [{}] recorded", String::from_utf8_lossy(&parsed.id));
        self.refs.insert(&parsed.id, parsed.entry);
    }

    /// Resolves a reference id: the override hook first, then the table.
    pub(crate) fn get_ref(&self, id: &[u8]) -> Option<refs::LinkRef> {
        if let Some(hook) = &self.reference_override {
            if let Some(r) = hook(&String::from_utf8_lossy(id)) {
                return Some(refs::LinkRef {
                    link: r.link,
                    title: r.title,
                    text: r.text,
                    ..Default::default()
                });
            }
        }
        self.refs.get(id).cloned()
    }
}

/// Which block kinds may sit directly inside which containers. Everything
/// not listed is a leaf or only holds inline children.
pub(crate) fn can_contain(parent: &NodeKind, child: &NodeKind) -> bool {
    match parent {
        NodeKind::List(_) => matches!(child, NodeKind::ListItem(_)),
        NodeKind::Document | NodeKind::BlockQuote | NodeKind::ListItem(_) => {
            !matches!(child, NodeKind::ListItem(_))
        }
        NodeKind::Table => matches!(child, NodeKind::TableHead | NodeKind::TableBody),
        NodeKind::TableHead | NodeKind::TableBody => matches!(child, NodeKind::TableRow),
        NodeKind::TableRow => matches!(child, NodeKind::TableCell(_)),
        _ => false,
    }
}

/// Lowercases letters and digits, collapsing every other run into a single
/// dash, for auto-generated heading anchors.
pub(crate) fn sanitized_anchor_name(text: &[u8]) -> String {
    let text = String::from_utf8_lossy(text);
    let mut anchor = String::new();
    let mut future_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if future_dash && !anchor.is_empty() {
                anchor.push('-');
            }
            future_dash = false;
            anchor.extend(c.to_lowercase());
        } else {
            future_dash = true;
        }
    }
    anchor
}

/// Dash-separated ASCII slug used for inline-footnote fragments.
pub(crate) fn slugify(input: &[u8]) -> Vec<u8> {
    if input.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(input.len());
    let mut sym = false;
    for &ch in input {
        if ch.is_ascii_alphanumeric() {
            sym = false;
            out.push(ch);
        } else if !sym {
            out.push(b'-');
            sym = true;
        }
    }
    let start = out.iter().position(|&c| c != b'-').unwrap_or(out.len());
    let end = out.iter().rposition(|&c| c != b'-').map_or(start, |p| p + 1);
    out[start..end].to_vec()
}
