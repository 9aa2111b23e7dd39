//! The parser must return a complete tree for any byte sequence, without
//! panicking, including inputs distilled from crash reports: NUL bytes,
//! truncated UTF-8, unterminated constructs and adversarial nesting.

use markdown_weft_engine::{Extensions, NodeId, Tree, WalkStatus, parse, walk};

/// Parse under every interesting flag set and sanity-walk the result.
fn assert_total(input: &[u8]) {
    for ext in [
        Extensions::empty(),
        Extensions::common(),
        Extensions::all(),
    ] {
        let tree = parse(input, ext);
        assert_tree_well_formed(&tree);
    }
}

/// Every node reachable from the root agrees with its parent pointer, and
/// the walk visits containers symmetrically.
fn assert_tree_well_formed(tree: &Tree) {
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        for &child in tree.children(id) {
            assert_eq!(tree.parent(child), Some(id));
            stack.push(child);
        }
    }

    let mut depth = 0i64;
    walk(
        tree,
        tree.root(),
        &mut |t: &Tree, n: NodeId, entering: bool| {
            if t.is_container(n) {
                depth += if entering { 1 } else { -1 };
                assert!(depth >= 0);
            }
            WalkStatus::GoToNext
        },
    );
    assert_eq!(depth, 0);
}

#[test]
fn empty_and_whitespace_inputs() {
    assert_total(b"");
    assert_total(b"\n");
    assert_total(b"   \n\t\n  ");
    assert_total(b"\r\n\r\n");
}

#[test]
fn nul_bytes_survive() {
    assert_total(b"\x00");
    assert_total(b"a\x00b\n");
    assert_total(b"# \x00\n\n\x00\x00\x00\n");
    assert_total(b"| \x00 |\n| --- |\n| x |\n");
}

#[test]
fn invalid_utf8_survives() {
    assert_total(&[0xff, 0xfe, 0xfd]);
    assert_total(b"caf\xc3"); // truncated multi-byte sequence
    assert_total(b"*\xf0\x9f*\n");
    assert_total(&[0xc0, 0xaf, b'\n', 0x80, 0x80]);
}

#[test]
fn unterminated_constructs_degrade() {
    assert_total(b"```\nnever closed");
    assert_total(b"[unclosed bracket\n");
    assert_total(b"[text](unclosed\n");
    assert_total(b"<!-- unclosed comment\n");
    assert_total(b"<div>\nno close\n");
    assert_total(b"**unclosed strong\n");
    assert_total(b"`unclosed span\n");
}

#[test]
fn adversarial_nesting_terminates() {
    let brackets = b"[".repeat(2000);
    assert_total(&brackets);

    let mut quotes = Vec::new();
    for _ in 0..200 {
        quotes.extend_from_slice(b"> ");
    }
    quotes.extend_from_slice(b"deep\n");
    assert_total(&quotes);

    let mut lists = Vec::new();
    for depth in 0..100 {
        lists.extend_from_slice(&b" ".repeat(depth * 2));
        lists.extend_from_slice(b"* x\n");
    }
    assert_total(&lists);

    let stars = b"*a".repeat(500);
    assert_total(&stars);

    let emphasis_soup = b"***a*** **b* *c** ~~d~ e~~".repeat(40);
    assert_total(&emphasis_soup);
}

#[test]
fn all_prefixes_of_a_mixed_document() {
    let doc: &[u8] = b"# Title {#id}\n\npara with *em*, `code`, [l](/u) and http://x.example/a.\n\n> quote\n> more\n\n* item\n  * nested\n\n| a | b |\n| --- | ---: |\n| `x|y` | z |\n\n```rust\nfn f() {}\n```\n\n[ref][r]\n\n[r]: /dest \"t\"\n\nnote[^n]\n\n[^n]: body\n    more\n\ndone\n";
    for end in 0..=doc.len() {
        assert_total(&doc[..end]);
    }
}

#[test]
fn pathological_table_and_fence_mixes() {
    assert_total(b"| `a | b |\n| --- | --- |\n| c | d |\n");
    assert_total(b"> ```\n> x\n\n```\n");
    assert_total(b"* ```\n  x\n* y\n");
    assert_total(b"|\n|\n|\n");
    assert_total(b"{\n{}\n{#}\n");
}
