//! End-to-end parser properties over whole documents.

use markdown_weft_engine::{
    CellAlign, Extensions, NodeId, NodeKind, Parser, ParserOptions, Tree, WalkStatus, parse, walk,
};
use pretty_assertions::assert_eq;

fn root_kinds(tree: &Tree) -> Vec<&'static str> {
    tree.children(tree.root())
        .iter()
        .map(|&c| tree[c].kind.name())
        .collect()
}

#[test]
fn tight_list_shape() {
    let tree = parse(b"* a\n* b\n", Extensions::common());
    let list = tree.children(tree.root())[0];
    let data = match &tree[list].kind {
        NodeKind::List(d) => d.clone(),
        other => panic!("expected list, got {other:?}"),
    };
    assert!(data.tight);
    let items = tree.children(list);
    assert_eq!(items.len(), 2);
    for &item in items {
        let para = tree.children(item)[0];
        assert_eq!(tree[para].kind, NodeKind::Paragraph);
        let text = tree.children(para)[0];
        assert_eq!(tree[text].kind, NodeKind::Text);
    }
}

#[test]
fn loose_list_detection() {
    let tree = parse(b"* a\n\n* b\n", Extensions::common());
    let list = tree.children(tree.root())[0];
    match &tree[list].kind {
        NodeKind::List(d) => assert!(!d.tight),
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn emphasis_delimiter_matching() {
    let cases: &[(&[u8], &str)] = &[
        (b"*a*\n", "Emph"),
        (b"**a**\n", "Strong"),
        (b"***a***\n", "Strong"),
    ];
    for &(input, expected) in cases {
        let tree = parse(input, Extensions::common());
        let para = tree.children(tree.root())[0];
        let first = tree.children(para)[0];
        assert_eq!(tree[first].kind.name(), expected, "input {input:?}");
    }

    // triple form nests emphasis inside strong
    let tree = parse(b"***a***\n", Extensions::common());
    let para = tree.children(tree.root())[0];
    let strong = tree.children(para)[0];
    let em = tree.children(strong)[0];
    assert_eq!(tree[em].kind, NodeKind::Emph);

    // intraword underscores stay literal with suppression on
    let tree = parse(b"a_b_c\n", Extensions::common());
    let para = tree.children(tree.root())[0];
    assert!(
        tree.children(para)
            .iter()
            .all(|&c| tree[c].kind == NodeKind::Text)
    );
}

#[test]
fn forward_reference_resolution() {
    let tree = parse(
        b"[link][id]\n\n[id]: http://example.com \"T\"\n",
        Extensions::common(),
    );
    let para = tree.children(tree.root())[0];
    let link = tree
        .children(para)
        .iter()
        .copied()
        .find(|&c| matches!(tree[c].kind, NodeKind::Link(_)))
        .expect("link");
    match &tree[link].kind {
        NodeKind::Link(d) => {
            assert_eq!(d.destination, b"http://example.com");
            assert_eq!(d.title, b"T");
        }
        _ => unreachable!(),
    }
}

#[test]
fn table_round_trip() {
    let input = b"| a | b|\n| :--- | ---: |\n| c | d |\n";
    let tree = parse(input, Extensions::common());
    assert_eq!(root_kinds(&tree), vec!["Table"]);

    let table = tree.children(tree.root())[0];
    let head = tree.children(table)[0];
    let body = tree.children(table)[1];
    assert_eq!(tree[head].kind, NodeKind::TableHead);
    assert_eq!(tree[body].kind, NodeKind::TableBody);

    let head_row = tree.children(head)[0];
    let aligns: Vec<CellAlign> = tree
        .children(head_row)
        .iter()
        .map(|&c| match &tree[c].kind {
            NodeKind::TableCell(d) => d.align,
            other => panic!("expected cell, got {other:?}"),
        })
        .collect();
    assert_eq!(aligns, vec![CellAlign::LEFT, CellAlign::RIGHT]);

    let body_row = tree.children(body)[0];
    let texts: Vec<String> = tree
        .children(body_row)
        .iter()
        .map(|&cell| {
            tree.children(cell)
                .iter()
                .map(|&t| String::from_utf8_lossy(&tree[t].literal).into_owned())
                .collect()
        })
        .collect();
    assert_eq!(texts, vec!["c", "d"]);
}

#[test]
fn pipe_inside_code_span_in_table_cell() {
    let tree = parse(
        b"| a | b |\n| --- | --- |\n| `x|y` | z |\n",
        Extensions::common(),
    );
    let table = tree.children(tree.root())[0];
    let body = tree.children(table)[1];
    let row = tree.children(body)[0];
    assert_eq!(tree.children(row).len(), 2);
    let code = tree.children(tree.children(row)[0])[0];
    assert_eq!(tree[code].kind, NodeKind::Code);
    assert_eq!(tree[code].literal, b"x|y");
}

#[test]
fn walk_symmetry_over_parsed_document() {
    let input = b"# h\n\n> quote\n\n* a\n* b\n\n| x |\n| --- |\n| y |\n";
    let tree = parse(input, Extensions::common());

    let mut enters = std::collections::HashMap::new();
    let mut exits = std::collections::HashMap::new();
    walk(
        &tree,
        tree.root(),
        &mut |t: &Tree, n: NodeId, entering: bool| {
            if t.is_container(n) {
                if entering {
                    *enters.entry(n).or_insert(0) += 1;
                } else {
                    *exits.entry(n).or_insert(0) += 1;
                }
            }
            WalkStatus::GoToNext
        },
    );
    assert_eq!(enters, exits);
}

#[test]
fn heading_ids_and_auto_ids() {
    let opts = ParserOptions {
        extensions: Extensions::common() | Extensions::AUTO_HEADING_IDS,
        ..Default::default()
    };
    let tree = Parser::new(opts).parse(b"# Hello World\n\n## Custom {#mine}\n");
    let ids: Vec<Option<String>> = tree
        .children(tree.root())
        .iter()
        .map(|&c| match &tree[c].kind {
            NodeKind::Heading(d) => d.heading_id.clone(),
            other => panic!("expected heading, got {other:?}"),
        })
        .collect();
    assert_eq!(
        ids,
        vec![Some("hello-world".to_string()), Some("mine".to_string())]
    );
}

#[test]
fn setext_headings() {
    let tree = parse(b"Title\n=====\n\nSub\n---\n", Extensions::common());
    let levels: Vec<u8> = tree
        .children(tree.root())
        .iter()
        .map(|&c| match &tree[c].kind {
            NodeKind::Heading(d) => d.level,
            other => panic!("expected heading, got {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![1, 2]);
}

#[test]
fn block_attribute_feeds_next_heading() {
    let opts = ParserOptions {
        extensions: Extensions::common() | Extensions::ATTRIBUTES,
        ..Default::default()
    };
    let tree = Parser::new(opts).parse(b"{#intro .lead}\n# Hello\n");
    let heading = tree.children(tree.root())[0];
    match &tree[heading].kind {
        NodeKind::Heading(d) => assert_eq!(d.heading_id.as_deref(), Some("intro")),
        other => panic!("expected heading, got {other:?}"),
    }
}

#[test]
fn title_block_heading() {
    let opts = ParserOptions {
        extensions: Extensions::common() | Extensions::TITLEBLOCK,
        ..Default::default()
    };
    let tree = Parser::new(opts).parse(b"% The Title\n% Line Two\n\nbody\n");
    let heading = tree.children(tree.root())[0];
    match &tree[heading].kind {
        NodeKind::Heading(d) => {
            assert!(d.is_titleblock);
            assert_eq!(d.level, 1);
        }
        other => panic!("expected heading, got {other:?}"),
    }
}

#[test]
fn mixed_document_shape() {
    let input = b"# Top\n\npara one\n\n> quoted\n\n```\ncode\n```\n\n1. first\n2. second\n\n---\n\nlast\n";
    let tree = parse(input, Extensions::common());
    assert_eq!(
        root_kinds(&tree),
        vec![
            "Heading",
            "Paragraph",
            "BlockQuote",
            "CodeBlock",
            "List",
            "HorizontalRule",
            "Paragraph"
        ]
    );
}

#[test]
fn every_extension_subset_of_interest_parses() {
    // extension flags must be independently togglable; run a mixed corpus
    // through each single-flag parser
    let corpus: &[&[u8]] = &[
        b"# h\n\ntext with *em* and `code`\n",
        b"| a |\n| --- |\n| b |\n",
        b"```rust\nx\n```\n",
        b"~~gone~~ and H~2~O and 2^8^\n",
        b"term\n: def\n",
        b"note[^1]\n\n[^1]: body\n",
        b"{#id}\n# h\n",
        b"% title\n",
        b"3. three\n4. four\n",
        b"http://example.com\n",
    ];
    let all = [
        Extensions::NO_INTRA_EMPHASIS,
        Extensions::TABLES,
        Extensions::FENCED_CODE,
        Extensions::AUTOLINK,
        Extensions::STRIKETHROUGH,
        Extensions::LAX_HTML_BLOCKS,
        Extensions::HARD_LINE_BREAK,
        Extensions::FOOTNOTES,
        Extensions::NO_EMPTY_LINE_BEFORE_BLOCK,
        Extensions::HEADING_IDS,
        Extensions::TITLEBLOCK,
        Extensions::AUTO_HEADING_IDS,
        Extensions::BACKSLASH_LINE_BREAK,
        Extensions::DEFINITION_LISTS,
        Extensions::ATTRIBUTES,
        Extensions::SUPER_SUBSCRIPT,
        Extensions::ORDERED_LIST_START,
    ];
    for &input in corpus {
        for &ext in &all {
            let _ = parse(input, ext);
            let _ = parse(input, Extensions::common() | ext);
        }
        let _ = parse(input, Extensions::empty());
        let _ = parse(input, Extensions::all());
    }
}
