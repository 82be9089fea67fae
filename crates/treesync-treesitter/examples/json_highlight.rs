use treesync_core::{Highlighter, HighlighterConfig, StyleMap, TokenKind};
use treesync_treesitter::{InvalidationReceiver, SyntaxClient, SyntaxConfig, TreeTokenProvider};

const HIGHLIGHTS: &str = r#"
(pair key: (string) @property)
(string) @string
(number) @number
[(true) (false)] @boolean
(null) @null
["{" "}" "[" "]"] @punctuation.bracket
"#;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = SyntaxConfig::new(tree_sitter_json::LANGUAGE.into(), HIGHLIGHTS);
    let (client, mut invalidations) = SyntaxClient::spawn(config, "{}").expect("start client");

    let styles = StyleMap::new().with_styles([
        (TokenKind::Property, 1),
        (TokenKind::String, 2),
        (TokenKind::Number, 3),
        (TokenKind::Boolean, 4),
        (TokenKind::Null, 5),
        (TokenKind::PunctuationBracket, 6),
    ]);
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles),
        client.text().len(),
    );
    highlighter.update().await.expect("initial highlight");
    // Everything was just styled from scratch.
    while invalidations.try_recv().is_some() {}

    // The host reports `{}` becoming `{"a":1}`.
    let edit = client
        .apply_reported_change(1..1, 5, "{\"a\":1}")
        .expect("apply change");
    highlighter.did_change_content(edit.old_range(), edit.delta());

    let tree = client.current_tree().await.expect("parse");
    drain(&mut invalidations, &mut highlighter);
    let key = tree.node_for_range(1..4).expect("key node");

    // More edits land while we hold the node; it keeps reading its own generation.
    let edit = client
        .apply_edit(6..6, ", \"b\": [true, null]")
        .expect("apply edit");
    highlighter.did_change_content(edit.old_range(), edit.delta());
    let newer = client.current_tree().await.expect("parse");
    drain(&mut invalidations, &mut highlighter);

    let parent = key.parent().expect("parent");
    println!(
        "generation {} node {} `{}` parent {} (current generation {})",
        key.generation(),
        key.kind(),
        key.text(),
        parent.kind(),
        newer.generation(),
    );

    let restyled = highlighter.update().await.expect("restyle");
    println!("restyled {:?}", restyled.as_slice());

    let text = client.text();
    for interval in highlighter.attributes(0..text.len()) {
        println!(
            "{:>3}..{:<3} style {} `{}`",
            interval.start,
            interval.end,
            interval.style_id,
            &text[interval.start..interval.end]
        );
    }
}

fn drain(invalidations: &mut InvalidationReceiver, highlighter: &mut Highlighter<TreeTokenProvider>) {
    while let Some(inv) = invalidations.try_recv() {
        println!("generation {} invalidated {:?}", inv.generation, inv.ranges.as_slice());
        highlighter.invalidate(&inv.ranges);
    }
}
