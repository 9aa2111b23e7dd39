//! The `{#id .class key="val"}` attribute micro-syntax: a small,
//! self-contained lexer for attribute lines standing before a block.

/// Parsed contents of one attribute line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAttr {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
}

/// Whether the line at the head of `data` is an attribute line: an
/// optional three-space indent, `{`, and a closing `}` at end of line.
pub(crate) fn is_block_attribute(data: &[u8]) -> bool {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    if i >= data.len() || data[i] != b'{' {
        return false;
    }
    while i < data.len() && data[i] != b'\n' {
        i += 1;
    }
    i > 0 && data[i - 1] == b'}'
}

/// Consumes the attribute line, returning the bytes consumed and whatever
/// attributes lexed out of it. Chunks are space separated; `#` starts the
/// id, `.` a class, and `key="val"` pairs require quotes.
pub(crate) fn block_attribute(data: &[u8]) -> (usize, BlockAttr) {
    let mut attr = BlockAttr::default();
    let line_end = data
        .iter()
        .position(|&c| c == b'\n')
        .map(|p| p + 1)
        .unwrap_or(data.len());
    let line = &data[..line_end];

    let mut esc = false;
    let mut quote = false;
    let mut trail = 0;
    for (i, &c) in line.iter().enumerate() {
        match c {
            b' ' | b'\t' | b'}' | b'{' | b'\n' => {
                if esc {
                    esc = false;
                    continue;
                }
                if quote {
                    continue;
                }
                let chunk = &line[trail..i];
                trail = i + 1;
                if chunk.is_empty() {
                    continue;
                }
                match chunk[0] {
                    b'.' => attr
                        .classes
                        .push(String::from_utf8_lossy(&chunk[1..]).into_owned()),
                    b'#' => attr.id = Some(String::from_utf8_lossy(&chunk[1..]).into_owned()),
                    _ => {
                        if let Some((k, v)) = key_value(chunk) {
                            attr.attrs.push((k, v));
                        }
                    }
                }
            }
            b'"' => {
                if esc {
                    esc = false;
                    continue;
                }
                quote = !quote;
            }
            b'\\' => esc = !esc,
            _ => esc = false,
        }
    }

    (line_end, attr)
}

/// Splits a `key="value"` chunk; the quotes are mandatory.
fn key_value(chunk: &[u8]) -> Option<(String, String)> {
    let eq = chunk.iter().position(|&c| c == b'=')?;
    let (key, value) = (&chunk[..eq], &chunk[eq + 1..]);
    if key.is_empty() || value.len() < 3 {
        return None;
    }
    if value[0] != b'"' || value[value.len() - 1] != b'"' {
        return None;
    }
    Some((
        String::from_utf8_lossy(key).into_owned(),
        String::from_utf8_lossy(&value[1..value.len() - 1]).into_owned(),
    ))
}
