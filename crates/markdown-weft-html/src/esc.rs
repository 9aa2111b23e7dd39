//! HTML escaping, byte-table driven for text content and entity-aware for
//! link destinations.

/// Per-byte escape table for text content: `&`, `<`, `>` and `"`.
const HTML_ESCAPER: [Option<&str>; 256] = {
    let mut table: [Option<&str>; 256] = [None; 256];
    table[b'&' as usize] = Some("&amp;");
    table[b'<' as usize] = Some("&lt;");
    table[b'>' as usize] = Some("&gt;");
    table[b'"' as usize] = Some("&quot;");
    table
};

/// Appends `d` to `out` with HTML-special bytes escaped. Invalid UTF-8 is
/// carried through lossily.
pub fn escape_html(out: &mut String, d: &[u8]) {
    let mut start = 0;
    for (end, &b) in d.iter().enumerate() {
        if let Some(esc) = HTML_ESCAPER[b as usize] {
            out.push_str(&String::from_utf8_lossy(&d[start..end]));
            out.push_str(esc);
            start = end + 1;
        }
    }
    if start < d.len() {
        out.push_str(&String::from_utf8_lossy(&d[start..]));
    }
}

/// Appends a link destination or title, first collapsing any entities the
/// author already wrote so they are not escaped twice.
pub fn esc_link(out: &mut String, text: &[u8]) {
    let raw = String::from_utf8_lossy(text);
    let unescaped = html_escape::decode_html_entities(&raw);
    out.push_str(&html_escape::encode_double_quoted_attribute(&unescaped));
}
