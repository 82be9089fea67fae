use std::ops::Range;

use pretty_assertions::assert_eq;
use treesync_core::{
    Edit, Highlighter, HighlighterConfig, Interval, StyleId, StyleMap, TokenKind,
};
use treesync_treesitter::{
    InvalidationReceiver, SyntaxClient, SyntaxConfig, TreeTokenProvider, tokens,
};

const SAMPLE: &str = include_str!("fixtures/sample.json");

fn json_config() -> SyntaxConfig {
    SyntaxConfig::new(
        tree_sitter_json::LANGUAGE.into(),
        include_str!("fixtures/highlights.scm"),
    )
}

fn styles() -> StyleMap {
    StyleMap::new().with_styles([
        (TokenKind::Property, 1),
        (TokenKind::String, 2),
        (TokenKind::StringEscape, 3),
        (TokenKind::Number, 4),
        (TokenKind::Boolean, 5),
        (TokenKind::Null, 6),
        (TokenKind::PunctuationBracket, 7),
    ])
}

fn style_at(intervals: &[Interval], byte: usize) -> Option<StyleId> {
    intervals
        .iter()
        .rev()
        .find(|iv| iv.contains(byte))
        .map(|iv| iv.style_id)
}

/// Per-byte styles the highlighter would have after restyling everything from scratch.
async fn expected_styles(client: &SyntaxClient) -> Vec<Option<StyleId>> {
    let tree = client.current_tree().await.unwrap();
    let query = client.query();
    let styles = styles();
    let mut out = vec![None; tree.len()];
    for token in tokens(&tree, &query, None) {
        let style = styles.get(token.kind);
        for slot in &mut out[token.range] {
            *slot = style;
        }
    }
    out
}

fn actual_styles(highlighter: &Highlighter<TreeTokenProvider>, len: usize) -> Vec<Option<StyleId>> {
    let intervals = highlighter.attributes(0..len);
    (0..len).map(|byte| style_at(&intervals, byte)).collect()
}

async fn edit_and_restyle(
    client: &SyntaxClient,
    rx: &mut InvalidationReceiver,
    highlighter: &mut Highlighter<TreeTokenProvider>,
    edit: Edit,
) -> Range<usize> {
    highlighter.did_change_content(edit.old_range(), edit.delta());
    let tree = client.current_tree().await.unwrap();
    while let Some(inv) = rx.try_recv() {
        assert!(inv.generation <= tree.generation());
        highlighter.invalidate(&inv.ranges);
    }
    let restyled = highlighter.update().await.unwrap();
    restyled.iter().fold(usize::MAX..0, |acc, r| {
        acc.start.min(r.start)..acc.end.max(r.end)
    })
}

#[tokio::test]
async fn test_initial_highlight_matches_projection() {
    let (client, _rx) = SyntaxClient::spawn(json_config(), SAMPLE).unwrap();
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles()),
        SAMPLE.len(),
    );

    let restyled = highlighter.update().await.unwrap();
    assert_eq!(restyled.as_slice(), &[0..SAMPLE.len()]);
    assert!(highlighter.pending().is_empty());
    assert_eq!(
        actual_styles(&highlighter, SAMPLE.len()),
        expected_styles(&client).await
    );

    let name = SAMPLE.find("\"name\"").unwrap();
    assert_eq!(
        highlighter.attributes(name..name + 1),
        vec![Interval::new(name, name + 6, 1)]
    );
}

#[tokio::test]
async fn test_edits_restyle_only_invalidated_ranges() {
    let (client, mut rx) = SyntaxClient::spawn(json_config(), SAMPLE).unwrap();
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles()),
        SAMPLE.len(),
    );
    client.current_tree().await.unwrap();
    rx.recv().await.unwrap();
    highlighter.update().await.unwrap();

    // A number turns into a string deep inside the document.
    let at = SAMPLE.find("32").unwrap();
    let edit = client.apply_edit(at..at + 2, "\"deep\"").unwrap();
    let restyled = edit_and_restyle(&client, &mut rx, &mut highlighter, edit).await;
    let limits = SAMPLE.find("\"limits\"").unwrap();
    assert!(restyled.start > limits, "restyled {restyled:?}");
    assert_eq!(
        actual_styles(&highlighter, client.text().len()),
        expected_styles(&client).await
    );

    // A new pair at the top of the object.
    let edit = client.apply_edit(1..1, "\n  \"id\": false,").unwrap();
    edit_and_restyle(&client, &mut rx, &mut highlighter, edit).await;
    assert_eq!(
        actual_styles(&highlighter, client.text().len()),
        expected_styles(&client).await
    );

    // Remove an element from the tags array.
    let text = client.text();
    let at = text.find("\"parse\", ").unwrap();
    let edit = client.apply_edit(at..at + 9, "").unwrap();
    edit_and_restyle(&client, &mut rx, &mut highlighter, edit).await;
    assert_eq!(
        actual_styles(&highlighter, client.text().len()),
        expected_styles(&client).await
    );
    assert!(highlighter.pending().is_empty());
}

#[tokio::test]
async fn test_invalidation_received_after_later_edit_lands_in_current_coordinates() {
    let text = "[1, 2, 3]";
    let (client, mut rx) = SyntaxClient::spawn(json_config(), text).unwrap();
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles()),
        text.len(),
    );
    client.current_tree().await.unwrap();
    rx.recv().await.unwrap();
    highlighter.update().await.unwrap();

    // The quote turns the rest of the array into an unterminated string; its invalidation is
    // committed but stays queued.
    let edit = client.apply_edit(1..1, "\"").unwrap();
    highlighter.did_change_content(edit.old_range(), edit.delta());
    client.current_tree().await.unwrap();

    // A later edit shifts everything before the queued invalidation is read.
    let edit = client.apply_edit(0..0, "      ").unwrap();
    highlighter.did_change_content(edit.old_range(), edit.delta());
    let tree = client.current_tree().await.unwrap();
    assert_eq!(tree.version(), 2);

    let mut versions = Vec::new();
    while let Some(inv) = rx.try_recv() {
        versions.push(inv.version);
        highlighter.invalidate(&inv.ranges);
    }
    assert_eq!(versions, vec![2, 2]);
    highlighter.update().await.unwrap();

    assert_eq!(
        actual_styles(&highlighter, client.text().len()),
        expected_styles(&client).await
    );
    assert!(highlighter.pending().is_empty());
}

#[tokio::test]
async fn test_line_restyle_extends_to_whole_lines() {
    let (client, mut rx) = SyntaxClient::spawn(json_config(), SAMPLE).unwrap();
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles()).with_line_restyle(),
        SAMPLE.len(),
    );
    client.current_tree().await.unwrap();
    rx.recv().await.unwrap();
    highlighter.update().await.unwrap();

    let at = SAMPLE.find("true").unwrap();
    let edit = client.apply_edit(at..at + 4, "false").unwrap();
    let restyled = edit_and_restyle(&client, &mut rx, &mut highlighter, edit).await;

    let text = client.text();
    assert!(restyled.start == 0 || text.as_bytes()[restyled.start - 1] == b'\n');
    assert!(restyled.end == text.len() || text.as_bytes()[restyled.end - 1] == b'\n');
    assert_eq!(
        actual_styles(&highlighter, text.len()),
        expected_styles(&client).await
    );
}

#[tokio::test]
async fn test_replaced_document_is_restyled_from_scratch() {
    let (client, _rx) = SyntaxClient::spawn(json_config(), SAMPLE).unwrap();
    let mut highlighter = Highlighter::new(
        client.token_provider(),
        HighlighterConfig::new(styles()),
        SAMPLE.len(),
    );
    highlighter.update().await.unwrap();

    client.replace_content("[1, \"two\", null]").unwrap();
    highlighter.did_replace_content(client.text().len());
    highlighter.update().await.unwrap();

    assert_eq!(
        actual_styles(&highlighter, client.text().len()),
        expected_styles(&client).await
    );
    assert!(highlighter.attributes(40..80).is_empty());
}
