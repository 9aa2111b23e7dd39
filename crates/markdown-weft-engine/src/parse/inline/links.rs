//! Links, images, footnote references and autolinks.
//!
//! A single handler covers `[text](url)`, `[text][id]`, `[shortcut]`,
//! `![alt](url)`, `^[inline footnote]` and `[^deferred]`: it scans for a
//! balanced bracket span, then disambiguates on what follows. Reference
//! forms consult the reference table; an unresolved reference consumes
//! nothing so the brackets fall back to literal text.

use crate::ast::{LinkData, ListData, NodeId, NodeKind};

use super::super::scanners::{is_alnum, is_space, skip_space, skip_until_char};
use super::super::{Extensions, Note, Parser, slugify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkType {
    Normal,
    Img,
    DeferredFootnote,
    InlineFootnote,
}

fn is_reference_style_link(data: &[u8], pos: usize, t: LinkType) -> bool {
    if t == LinkType::DeferredFootnote {
        return false;
    }
    pos + 1 < data.len() && data[pos] == b'[' && data[pos + 1] != b'^'
}

/// `'!'`: an image when followed by a bracket.
pub(crate) fn maybe_image(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    if offset + 1 < data.len() && data[offset + 1] == b'[' {
        return link(p, data, offset);
    }
    (0, None)
}

/// `'^'`: an inline footnote when followed by a bracket, otherwise a
/// superscript when that extension is on.
pub(crate) fn maybe_inline_footnote(
    p: &mut Parser,
    data: &[u8],
    offset: usize,
) -> (usize, Option<NodeId>) {
    if offset + 1 < data.len() && data[offset + 1] == b'[' {
        return link(p, data, offset);
    }
    if p.extensions.contains(Extensions::SUPER_SUBSCRIPT) {
        return super::emphasis::caret(p, data, offset);
    }
    (0, None)
}

/// `'['`: the unified link/image/footnote handler.
pub(crate) fn link(p: &mut Parser, data: &[u8], mut offset: usize) -> (usize, Option<NodeId>) {
    // no links inside links, and no footnote forms either; images are the
    // one bracket construct a label may still contain
    if p.inside_link && data[offset] != b'!' {
        return (0, None);
    }

    let footnotes = p.extensions.contains(Extensions::FOOTNOTES);
    let t = if footnotes && offset + 1 < data.len() && data[offset + 1] == b'^' {
        // "[^id]" is a deferred footnote
        LinkType::DeferredFootnote
    } else if data[offset] == b'!' {
        // "![alt]" is an image
        offset += 1;
        LinkType::Img
    } else if footnotes && data[offset] == b'^' {
        // "^[text]" is an inline footnote
        offset += 1;
        LinkType::InlineFootnote
    } else {
        LinkType::Normal
    };

    let data = &data[offset..];

    let mut i = 1;
    let mut text_has_nl = false;
    if t == LinkType::DeferredFootnote {
        i += 1;
    }

    // find the matching closing bracket, honoring escapes and nesting
    let mut level = 1;
    while level > 0 && i < data.len() {
        let b = data[i];
        if b == b'\n' {
            text_has_nl = true;
        } else if data[i - 1] == b'\\' {
            // escaped, skip
        } else if b == b'[' {
            level += 1;
        } else if b == b']' {
            level -= 1;
            if level <= 0 {
                break;
            }
        }
        i += 1;
    }
    if level > 0 || i >= data.len() {
        return (0, None);
    }

    let txt_e = i;
    i += 1;

    let mut link_bytes: Vec<u8> = Vec::new();
    let mut title: Vec<u8> = Vec::new();
    let mut alt_content: Vec<u8> = Vec::new();
    let mut note_id = 0usize;
    let mut footnote_node: Option<NodeId> = None;

    // skip any amount of whitespace or newline
    i = skip_space(data, i);

    if i < data.len() && data[i] == b'(' {
        // inline form: (url "title")
        i += 1;
        i = skip_space(data, i);
        let link_b = i;

        while i < data.len() {
            match data[i] {
                b'\\' => i += 2,
                b')' | b'\'' | b'"' => break,
                _ => i += 1,
            }
        }
        if i >= data.len() {
            return (0, None);
        }
        let mut link_e = i;

        // optional title
        let mut title_b = 0;
        let mut title_e = 0;
        if data[i] == b'\'' || data[i] == b'"' {
            i += 1;
            title_b = i;
            while i < data.len() {
                match data[i] {
                    b'\\' => i += 2,
                    b')' => break,
                    _ => i += 1,
                }
            }
            if i >= data.len() {
                return (0, None);
            }
            // walk back over whitespace to the closing quote
            title_e = i - 1;
            while title_e > title_b && is_space(data[title_e]) {
                title_e -= 1;
            }
            if data[title_e] != b'\'' && data[title_e] != b'"' {
                title_b = 0;
                title_e = 0;
                link_e = i;
            }
        }

        while link_e > link_b && is_space(data[link_e - 1]) {
            link_e -= 1;
        }
        // strip optional angle brackets
        let mut link_b = link_b;
        if link_b < link_e && data[link_b] == b'<' {
            link_b += 1;
        }
        if link_e > link_b && data[link_e - 1] == b'>' {
            link_e -= 1;
        }

        if link_e > link_b {
            link_bytes = data[link_b..link_e].to_vec();
        }
        if title_e > title_b {
            title = data[title_b..title_e].to_vec();
        }
        i += 1;
    } else if is_reference_style_link(data, i, t) {
        // reference form: [id]
        let mut alt_content_considered = false;
        i += 1;
        let link_b = i;
        i = skip_until_char(data, i, b']');
        if i >= data.len() {
            return (0, None);
        }
        let link_e = i;

        let id: Vec<u8> = if link_b == link_e {
            // collapsed form: the bracket text is the id
            if text_has_nl {
                collapse_newlines(&data[1..txt_e])
            } else {
                alt_content_considered = true;
                data[1..txt_e].to_vec()
            }
        } else {
            data[link_b..link_e].to_vec()
        };

        let Some(lr) = p.get_ref(&id) else {
            log::trace!("unresolved reference [{}]", String::from_utf8_lossy(&id));
            return (0, None);
        };
        link_bytes = lr.link;
        title = lr.title;
        if alt_content_considered {
            alt_content = lr.text;
        }
        i += 1;
    } else {
        // shortcut reference, or a footnote form
        let id: Vec<u8> = if text_has_nl {
            collapse_newlines(&data[1..txt_e])
        } else if t == LinkType::DeferredFootnote {
            data[2..txt_e].to_vec()
        } else {
            data[1..txt_e].to_vec()
        };

        match t {
            LinkType::InlineFootnote => {
                // the footnote body is the bracket text itself
                let node = p
                    .tree
                    .new_node(NodeKind::ListItem(ListData::default()));
                footnote_node = Some(node);
                note_id = p.notes.len() + 1;

                let fragment = if id.is_empty() {
                    let mut f = b"footnote-".to_vec();
                    f.extend_from_slice(note_id.to_string().as_bytes());
                    f
                } else {
                    let mut s = slugify(&id);
                    s.truncate(16);
                    s
                };

                p.notes.push(Note {
                    link: fragment.clone(),
                    title: id.clone(),
                    has_block: false,
                    node,
                });
                link_bytes = fragment;
                title = id;
            }
            LinkType::DeferredFootnote => {
                let Some(lr) = p.get_ref(&id) else {
                    return (0, None);
                };
                if lr.note_id == 0 {
                    // first use numbers the footnote
                    let node = p
                        .tree
                        .new_node(NodeKind::ListItem(ListData::default()));
                    footnote_node = Some(node);
                    note_id = p.notes.len() + 1;
                    log::trace!("footnote [{}] first used as note {note_id}", String::from_utf8_lossy(&id));
                    if let Some(entry) = p.refs.get_mut(&id) {
                        entry.note_id = note_id;
                        entry.footnote = footnote_node;
                    }
                    p.notes.push(Note {
                        link: lr.link.clone(),
                        title: lr.title.clone(),
                        has_block: lr.has_block,
                        node,
                    });
                } else {
                    note_id = lr.note_id;
                    footnote_node = lr.footnote;
                }
                link_bytes = lr.link;
                title = lr.title;
            }
            _ => {
                let Some(lr) = p.get_ref(&id) else {
                    log::trace!("unresolved shortcut [{}]", String::from_utf8_lossy(&id));
                    return (0, None);
                };
                link_bytes = lr.link;
                title = lr.title;
                if !lr.text.is_empty() {
                    alt_content = lr.text;
                }
            }
        }

        // rewind past the single closing bracket
        i = txt_e + 1;
    }

    let mut u_link = Vec::new();
    if t == LinkType::Normal || t == LinkType::Img {
        if !link_bytes.is_empty() {
            unescape_text(&mut u_link, &link_bytes);
        }
        // a link needs something to click on and somewhere to go
        if u_link.is_empty() || (t == LinkType::Normal && txt_e <= 1) {
            return (0, None);
        }
    }

    let node = match t {
        LinkType::Normal => {
            let node = p.tree.new_node(NodeKind::Link(LinkData {
                destination: u_link,
                title,
                ..Default::default()
            }));
            if !alt_content.is_empty() {
                let text = p.tree.new_text(&alt_content);
                p.tree.append_child(node, text);
            } else {
                // no links within links: suppress while parsing the label
                let was_inside = p.inside_link;
                p.inside_link = true;
                let label = data[1..txt_e].to_vec();
                p.inline(node, &label);
                p.inside_link = was_inside;
            }
            node
        }
        LinkType::Img => {
            let node = p.tree.new_node(NodeKind::Image(LinkData {
                destination: u_link,
                title,
                ..Default::default()
            }));
            // alt text is literal, never recursively parsed
            let alt = p.tree.new_text(&data[1..txt_e]);
            p.tree.append_child(node, alt);
            i += 1;
            node
        }
        LinkType::InlineFootnote | LinkType::DeferredFootnote => {
            let node = p.tree.new_node(NodeKind::Link(LinkData {
                destination: link_bytes,
                title,
                note_id,
                footnote: footnote_node,
            }));
            if t == LinkType::InlineFootnote {
                i += 1;
            }
            node
        }
    };

    (i, Some(node))
}

/// Joins a multi-line bracket text into a single-line id.
fn collapse_newlines(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for (j, &b) in text.iter().enumerate() {
        if b != b'\n' {
            out.push(b);
        } else if j > 0 && text[j - 1] != b' ' {
            out.push(b' ');
        }
    }
    out
}

/// Removes backslash escapes, keeping the escaped bytes.
pub(crate) fn unescape_text(out: &mut Vec<u8>, src: &[u8]) {
    let mut i = 0;
    while i < src.len() {
        let org = i;
        while i < src.len() && src[i] != b'\\' {
            i += 1;
        }
        if i > org {
            out.extend_from_slice(&src[org..i]);
        }
        if i + 1 >= src.len() {
            break;
        }
        out.push(src[i + 1]);
        i += 2;
    }
}

fn strip_mailto(link: &[u8]) -> &[u8] {
    if let Some(rest) = link.strip_prefix(b"mailto://") {
        rest
    } else if let Some(rest) = link.strip_prefix(b"mailto:") {
        rest
    } else {
        link
    }
}

const PROTOCOL_PREFIXES: &[&[u8]] = &[
    b"http://",
    b"https://",
    b"ftp://",
    b"file://",
    b"mailto:",
];

// len("ftp://"), the shortest prefix above
const SHORTEST_PREFIX: usize = 6;

fn has_prefix_case_insensitive(s: &[u8], prefix: &[u8]) -> bool {
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// `'h'`/`'m'`/`'f'`: cheap protocol-prefix test before the expensive
/// autolink scan.
pub(crate) fn maybe_auto_link(
    p: &mut Parser,
    data: &[u8],
    offset: usize,
) -> (usize, Option<NodeId>) {
    if p.inside_link || data.len() < offset + SHORTEST_PREFIX {
        return (0, None);
    }
    let head_end = (offset + 8).min(data.len());
    for prefix in PROTOCOL_PREFIXES {
        if has_prefix_case_insensitive(&data[offset..head_end], prefix) {
            return auto_link(p, data, offset);
        }
    }
    (0, None)
}

fn auto_link(p: &mut Parser, data: &[u8], offset: usize) -> (usize, Option<NodeId>) {
    // if this URL sits inside a raw HTML anchor, pass the anchor through
    let mut anchor_start = offset;
    let mut offset_from_anchor = 0;
    while anchor_start > 0 && data[anchor_start] != b'<' {
        anchor_start -= 1;
        offset_from_anchor += 1;
    }
    if let Some(anchor_len) = scan_raw_anchor(&data[anchor_start..]) {
        let node = p.tree.new_node(NodeKind::HtmlSpan);
        p.tree[node].literal = data[anchor_start + offset_from_anchor..anchor_start + anchor_len].to_vec();
        return (anchor_len - offset_from_anchor, Some(node));
    }

    // scan backward for a word boundary
    let mut rewind = 0;
    while offset > rewind && rewind <= 7 && data[offset - rewind - 1].is_ascii_alphabetic() {
        rewind += 1;
    }
    if rewind > 6 {
        // the longest supported protocol name is six letters
        return (0, None);
    }

    let data = &data[offset - rewind..];

    if !is_safe_link(data) {
        return (0, None);
    }

    let mut link_end = 0;
    while link_end < data.len() && !is_end_of_link(data[link_end]) {
        link_end += 1;
    }

    // trailing punctuation is dropped from the link
    if link_end > 1
        && (data[link_end - 1] == b'.' || data[link_end - 1] == b',')
        && data[link_end - 2] != b'\\'
    {
        link_end -= 1;
    }

    // but a semicolon stays when it terminates an entity
    if link_end > 1
        && data[link_end - 1] == b';'
        && data[link_end - 2] != b'\\'
        && !link_ends_with_entity(data, link_end)
    {
        link_end -= 1;
    }

    // a trailing closing bracket/paren/quote stays only when an earlier
    // unmatched opener inside the link text pairs with it
    let copen: u8 = match data.get(link_end.wrapping_sub(1)) {
        Some(b'"') => b'"',
        Some(b'\'') => b'\'',
        Some(b')') => b'(',
        Some(b']') => b'[',
        Some(b'}') => b'{',
        _ => 0,
    };
    if copen != 0 && link_end >= 2 {
        let closer = data[link_end - 1];
        let interior = &data[..link_end - 1];
        let balanced_inside = if copen == closer {
            // quotes pair with themselves: an odd count leaves one open
            interior.iter().filter(|&&c| c == copen).count() % 2 == 1
        } else {
            let opens = interior.iter().filter(|&&c| c == copen).count();
            let closes = interior.iter().filter(|&&c| c == closer).count();
            opens > closes
        };
        if !balanced_inside {
            link_end -= 1;
        }
    }

    let mut u_link = Vec::new();
    unescape_text(&mut u_link, &data[..link_end]);

    if !u_link.is_empty() {
        let node = p.tree.new_node(NodeKind::Link(LinkData {
            destination: u_link.clone(),
            ..Default::default()
        }));
        let text = p.tree.new_text(&u_link);
        p.tree.append_child(node, text);
        return (link_end, Some(node));
    }
    (link_end, None)
}

/// Recognizes an already-written `<a href="...">...</a>` around the
/// current position so bare-URL detection leaves it alone.
fn scan_raw_anchor(data: &[u8]) -> Option<usize> {
    if !has_prefix_case_insensitive(data, b"<a ") {
        return None;
    }
    let close = b"</a>";
    let mut i = 3;
    while i + close.len() <= data.len() {
        if data[i..].starts_with(close) {
            return Some(i + close.len());
        }
        if data[i] == b'\n' {
            return None;
        }
        i += 1;
    }
    None
}

fn is_end_of_link(c: u8) -> bool {
    is_space(c) || c == b'<'
}

const VALID_URIS: &[&[u8]] = &[b"http://", b"https://", b"ftp://", b"mailto://"];
const VALID_PATHS: &[&[u8]] = &[b"/", b"./", b"../"];

fn is_safe_link(link: &[u8]) -> bool {
    for path in VALID_PATHS {
        if link.len() >= path.len() && &link[..path.len()] == *path {
            if link.len() == path.len() {
                return true;
            }
            if is_alnum(link[path.len()]) {
                return true;
            }
        }
    }
    for prefix in VALID_URIS {
        if link.len() > prefix.len()
            && has_prefix_case_insensitive(link, prefix)
            && is_alnum(link[prefix.len()])
        {
            return true;
        }
    }
    false
}

/// Whether the link text ends exactly at the end of an HTML entity like
/// `&hellip;`.
fn link_ends_with_entity(data: &[u8], link_end: usize) -> bool {
    if link_end == 0 || data[link_end - 1] != b';' {
        return false;
    }
    // scan back over the entity name to an ampersand
    let mut i = link_end - 1;
    let mut letters = 0;
    while i > 0 {
        i -= 1;
        if data[i].is_ascii_lowercase() {
            letters += 1;
            continue;
        }
        if data[i] == b'&' {
            return (2..=5).contains(&letters);
        }
        return false;
    }
    false
}
