//! Default HTML renderer for markdown-weft.
//!
//! Consumes the engine's tree strictly through the walker-driven renderer
//! contract; nothing here reaches into parser internals. Tag choices per
//! node kind are fixed; escaping policy lives in [`esc`].

pub mod esc;

use std::fmt::Write as _;

use markdown_weft_engine::{
    CellAlign, ListFlags, NodeId, NodeKind, Renderer, Tree, WalkStatus, render,
};

use esc::{esc_link, escape_html};

/// Output tweaks for the HTML renderer.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit a full standalone page around the document body.
    pub complete_page: bool,
    /// `<title>` for the standalone page.
    pub title: String,
    /// Stylesheet href for the standalone page.
    pub css: String,
}

/// Walker-driven HTML renderer. One instance renders one document.
pub struct HtmlRenderer {
    opts: RenderOptions,
    out: String,
}

impl HtmlRenderer {
    pub fn new(opts: RenderOptions) -> Self {
        HtmlRenderer {
            opts,
            out: String::new(),
        }
    }

    /// The rendered output so far.
    pub fn into_string(self) -> String {
        self.out
    }

    /// Whether `node` is the paragraph body of an item in a tight list,
    /// which renders without `<p>` wrapping.
    fn in_tight_list(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(item) = tree.parent(node) else {
            return false;
        };
        if !matches!(tree[item].kind, NodeKind::ListItem(_)) {
            return false;
        }
        match tree.parent(item).map(|l| &tree[l].kind) {
            Some(NodeKind::List(d)) => d.tight,
            _ => false,
        }
    }

    fn open_list(&mut self, data: &markdown_weft_engine::ListData) {
        if data.is_footnotes_list {
            self.out.push_str("<div class=\"footnotes\">\n\n<hr>\n\n<ol>\n");
        } else if data.flags.contains(ListFlags::DEFINITION) {
            self.out.push_str("<dl>\n");
        } else if data.flags.contains(ListFlags::ORDERED) {
            if data.start > 1 {
                let _ = write!(self.out, "<ol start=\"{}\">\n", data.start);
            } else {
                self.out.push_str("<ol>\n");
            }
        } else {
            self.out.push_str("<ul>\n");
        }
    }

    fn close_list(&mut self, data: &markdown_weft_engine::ListData) {
        if data.is_footnotes_list {
            self.out.push_str("</ol>\n</div>\n");
        } else if data.flags.contains(ListFlags::DEFINITION) {
            self.out.push_str("</dl>\n");
        } else if data.flags.contains(ListFlags::ORDERED) {
            self.out.push_str("</ol>\n");
        } else {
            self.out.push_str("</ul>\n");
        }
    }

    fn open_item(&mut self, data: &markdown_weft_engine::ListData) {
        if let Some(ref_link) = &data.ref_link {
            self.out.push_str("<li id=\"fn:");
            esc_link(&mut self.out, ref_link);
            self.out.push_str("\">");
        } else if data.flags.contains(ListFlags::TERM) {
            self.out.push_str("<dt>");
        } else if data.flags.contains(ListFlags::DEFINITION) {
            self.out.push_str("<dd>");
        } else {
            self.out.push_str("<li>");
        }
    }

    fn close_item(&mut self, data: &markdown_weft_engine::ListData) {
        if data.ref_link.is_some() {
            self.out.push_str("</li>\n");
        } else if data.flags.contains(ListFlags::TERM) {
            self.out.push_str("</dt>\n");
        } else if data.flags.contains(ListFlags::DEFINITION) {
            self.out.push_str("</dd>\n");
        } else {
            self.out.push_str("</li>\n");
        }
    }

    fn cell_tag(&self, data: &markdown_weft_engine::CellData) -> &'static str {
        if data.is_header { "th" } else { "td" }
    }

    fn cell_align(&self, data: &markdown_weft_engine::CellData) -> Option<&'static str> {
        if data.align == CellAlign::CENTER {
            Some("center")
        } else if data.align == CellAlign::LEFT {
            Some("left")
        } else if data.align == CellAlign::RIGHT {
            Some("right")
        } else {
            None
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render_node(&mut self, tree: &Tree, node: NodeId, entering: bool) -> WalkStatus {
        let n = &tree[node];
        match &n.kind {
            NodeKind::Document => {}
            NodeKind::Text => escape_html(&mut self.out, &n.literal),
            NodeKind::Softbreak => self.out.push('\n'),
            NodeKind::Hardbreak => self.out.push_str("<br>\n"),
            NodeKind::Emph => self.out.push_str(if entering { "<em>" } else { "</em>" }),
            NodeKind::Strong => self
                .out
                .push_str(if entering { "<strong>" } else { "</strong>" }),
            NodeKind::Del => self.out.push_str(if entering { "<del>" } else { "</del>" }),
            NodeKind::Paragraph => {
                if !self.in_tight_list(tree, node) {
                    self.out.push_str(if entering { "<p>" } else { "</p>\n" });
                }
            }
            NodeKind::Heading(data) => {
                if entering {
                    let _ = write!(self.out, "<h{}", data.level.clamp(1, 6));
                    if let Some(id) = &data.heading_id {
                        self.out.push_str(" id=\"");
                        self.out
                            .push_str(&html_escape::encode_double_quoted_attribute(id.as_str()));
                        self.out.push('"');
                    }
                    self.out.push('>');
                } else {
                    let _ = write!(self.out, "</h{}>\n", data.level.clamp(1, 6));
                }
            }
            NodeKind::HorizontalRule => self.out.push_str("<hr>\n"),
            NodeKind::BlockQuote => self.out.push_str(if entering {
                "<blockquote>\n"
            } else {
                "</blockquote>\n"
            }),
            NodeKind::Code => {
                self.out.push_str("<code>");
                escape_html(&mut self.out, &n.literal);
                self.out.push_str("</code>");
            }
            NodeKind::CodeBlock(data) => {
                self.out.push_str("<pre><code");
                if !data.info.is_empty() {
                    // first word of the info string names the language
                    let lang: &[u8] = data
                        .info
                        .split(|&c| c == b' ')
                        .next()
                        .unwrap_or(&data.info);
                    self.out.push_str(" class=\"language-");
                    esc_link(&mut self.out, lang);
                    self.out.push('"');
                }
                self.out.push('>');
                escape_html(&mut self.out, &n.literal);
                self.out.push_str("</code></pre>\n");
            }
            NodeKind::HtmlBlock => {
                self.out.push_str(&String::from_utf8_lossy(&n.literal));
                self.out.push('\n');
            }
            NodeKind::HtmlSpan => self.out.push_str(&String::from_utf8_lossy(&n.literal)),
            NodeKind::List(data) => {
                if entering {
                    self.open_list(data);
                } else {
                    self.close_list(data);
                }
            }
            NodeKind::ListItem(data) => {
                if entering {
                    self.open_item(data);
                } else {
                    self.close_item(data);
                }
            }
            NodeKind::Link(data) => {
                if data.note_id > 0 {
                    if entering {
                        self.out
                            .push_str("<sup class=\"footnote-ref\" id=\"fnref:");
                        esc_link(&mut self.out, &data.destination);
                        self.out.push_str("\"><a href=\"#fn:");
                        esc_link(&mut self.out, &data.destination);
                        let _ = write!(self.out, "\">{}</a></sup>", data.note_id);
                    }
                    return WalkStatus::SkipChildren;
                }
                if entering {
                    self.out.push_str("<a href=\"");
                    esc_link(&mut self.out, &data.destination);
                    self.out.push('"');
                    if !data.title.is_empty() {
                        self.out.push_str(" title=\"");
                        esc_link(&mut self.out, &data.title);
                        self.out.push('"');
                    }
                    self.out.push('>');
                } else {
                    self.out.push_str("</a>");
                }
            }
            NodeKind::Image(data) => {
                if entering {
                    self.out.push_str("<img src=\"");
                    esc_link(&mut self.out, &data.destination);
                    self.out.push_str("\" alt=\"");
                    if let Some(alt) = tree.first_child(node) {
                        esc_link(&mut self.out, &tree[alt].literal);
                    }
                    self.out.push('"');
                    if !data.title.is_empty() {
                        self.out.push_str(" title=\"");
                        esc_link(&mut self.out, &data.title);
                        self.out.push('"');
                    }
                    self.out.push_str(" />");
                }
                return WalkStatus::SkipChildren;
            }
            NodeKind::Table => self
                .out
                .push_str(if entering { "<table>\n" } else { "</table>\n" }),
            NodeKind::TableHead => self
                .out
                .push_str(if entering { "<thead>\n" } else { "</thead>\n" }),
            NodeKind::TableBody => self
                .out
                .push_str(if entering { "<tbody>\n" } else { "</tbody>\n" }),
            NodeKind::TableRow => self
                .out
                .push_str(if entering { "<tr>\n" } else { "</tr>\n" }),
            NodeKind::TableCell(data) => {
                let tag = self.cell_tag(data);
                if entering {
                    let _ = write!(self.out, "<{tag}");
                    if let Some(align) = self.cell_align(data) {
                        let _ = write!(self.out, " align=\"{align}\"");
                    }
                    self.out.push('>');
                } else {
                    let _ = write!(self.out, "</{tag}>\n");
                }
            }
            NodeKind::Subscript => {
                self.out.push_str("<sub>");
                escape_html(&mut self.out, &n.literal);
                self.out.push_str("</sub>");
            }
            NodeKind::Superscript => {
                self.out.push_str("<sup>");
                escape_html(&mut self.out, &n.literal);
                self.out.push_str("</sup>");
            }
        }
        WalkStatus::GoToNext
    }

    fn render_header(&mut self, _tree: &Tree, _root: NodeId) {
        if !self.opts.complete_page {
            return;
        }
        self.out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        self.out.push_str("  <title>");
        let title = html_escape::encode_text(&self.opts.title).into_owned();
        self.out.push_str(&title);
        self.out.push_str("</title>\n");
        if !self.opts.css.is_empty() {
            let mut href = String::new();
            esc_link(&mut href, self.opts.css.as_bytes());
            let _ = write!(self.out, "  <link rel=\"stylesheet\" href=\"{href}\">\n");
        }
        self.out.push_str("</head>\n<body>\n");
    }

    fn render_footer(&mut self, _tree: &Tree, _root: NodeId) {
        if self.opts.complete_page {
            self.out.push_str("</body>\n</html>\n");
        }
    }
}

/// Renders a parsed tree to an HTML string with the given options.
pub fn render_to_string(tree: &Tree, opts: RenderOptions) -> String {
    log::debug!("rendering tree of {} nodes", tree.len());
    let mut renderer = HtmlRenderer::new(opts);
    render(tree, tree.root(), &mut renderer);
    renderer.into_string()
}

/// One-call markdown-to-HTML conversion with the common extension set.
pub fn markdown_to_html(input: &[u8]) -> String {
    let tree = markdown_weft_engine::parse(input, markdown_weft_engine::Extensions::common());
    render_to_string(&tree, RenderOptions::default())
}
