use std::cell::RefCell;
use std::convert::Infallible;
use std::ops::Range;

use pretty_assertions::assert_eq;
use treesync_core::{
    Highlighter, HighlighterConfig, Interval, RangeSet, RestyleUnit, StyleMap, Token, TokenBatch,
    TokenKind, TokenProvider,
};

/// Classifies digit runs as numbers and braces as brackets over a shared text.
#[derive(Default)]
struct ScanProvider {
    text: RefCell<String>,
    requests: RefCell<Vec<Range<usize>>>,
}

impl ScanProvider {
    fn new(text: &str) -> Self {
        Self {
            text: RefCell::new(text.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn line_bounds(text: &str, range: Range<usize>) -> Range<usize> {
        let start = text[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let end = text[range.end..]
            .find('\n')
            .map_or(text.len(), |i| range.end + i + 1);
        start..end
    }
}

impl TokenProvider for ScanProvider {
    type Error = Infallible;

    async fn tokens(&self, range: Range<usize>, unit: RestyleUnit) -> Result<TokenBatch, Infallible> {
        self.requests.borrow_mut().push(range.clone());
        let text = self.text.borrow();
        let end = range.end.min(text.len());
        let range = range.start.min(end)..end;
        let range = match unit {
            RestyleUnit::Exact => range,
            RestyleUnit::Line => Self::line_bounds(&text, range),
        };

        let mut tokens = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let start = i;
            let kind = match bytes[i] {
                b'{' | b'}' => {
                    i += 1;
                    TokenKind::PunctuationBracket
                }
                b'0'..=b'9' => {
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    TokenKind::Number
                }
                _ => {
                    i += 1;
                    continue;
                }
            };
            if start < range.end && i > range.start {
                tokens.push(Token::new(start.max(range.start)..i.min(range.end), kind));
            }
        }

        Ok(TokenBatch { range, tokens })
    }
}

fn styles() -> StyleMap {
    StyleMap::new().with_styles([
        (TokenKind::PunctuationBracket, 1),
        (TokenKind::Number, 2),
    ])
}

#[tokio::test]
async fn test_initial_update_styles_whole_document() {
    let provider = ScanProvider::new("{12}");
    let mut hl = Highlighter::new(provider, HighlighterConfig::new(styles()), 4);

    let restyled = hl.update().await.unwrap();
    assert_eq!(restyled.as_slice(), &[0..4]);
    assert!(hl.pending().is_empty());
    assert_eq!(
        hl.attributes(0..4),
        vec![
            Interval::new(0, 1, 1),
            Interval::new(1, 3, 2),
            Interval::new(3, 4, 1)
        ]
    );
}

#[tokio::test]
async fn test_update_only_touches_invalidated_ranges() {
    let text = "{1} {2} {3}";
    let provider = ScanProvider::new(text);
    let mut hl = Highlighter::new(provider, HighlighterConfig::new(styles()), text.len());
    hl.update().await.unwrap();
    hl.provider().requests.borrow_mut().clear();

    // Replace "2" with "45" and tell the highlighter before the invalidation arrives.
    *hl.provider().text.borrow_mut() = "{1} {45} {3}".to_string();
    hl.did_change_content(5..6, 1);
    assert_eq!(hl.pending().as_slice(), &[5..7]);
    // Styles after the edit moved with the text.
    assert_eq!(hl.attributes(9..12), vec![Interval::new(9, 10, 1), Interval::new(10, 11, 2), Interval::new(11, 12, 1)]);

    hl.invalidate(&RangeSet::single(4..8));
    let restyled = hl.update().await.unwrap();
    assert_eq!(restyled.as_slice(), &[4..8]);
    assert_eq!(*hl.provider().requests.borrow(), vec![4..8]);
    assert_eq!(
        hl.attributes(4..8),
        vec![
            Interval::new(4, 5, 1),
            Interval::new(5, 7, 2),
            Interval::new(7, 8, 1)
        ]
    );
    // Untouched ranges kept their styles.
    assert_eq!(hl.attributes(0..3).len(), 3);
}

#[tokio::test]
async fn test_line_unit_extends_restyle() {
    let text = "{1}\n{2}\n{3}\n";
    let provider = ScanProvider::new(text);
    let config = HighlighterConfig::new(styles()).with_line_restyle();
    let mut hl = Highlighter::new(provider, config, text.len());
    hl.update().await.unwrap();

    hl.invalidate(&RangeSet::single(5..6));
    let restyled = hl.update().await.unwrap();
    assert_eq!(restyled.as_slice(), &[4..8]);
}

#[tokio::test]
async fn test_empty_invalidation_is_noop() {
    let provider = ScanProvider::new("{}");
    let mut hl = Highlighter::new(provider, HighlighterConfig::new(styles()), 2);
    hl.update().await.unwrap();

    hl.invalidate(&RangeSet::new());
    assert!(hl.pending().is_empty());
    let restyled = hl.update().await.unwrap();
    assert!(restyled.is_empty());
}

#[tokio::test]
async fn test_replace_content_rebuilds_state() {
    let provider = ScanProvider::new("{1}");
    let mut hl = Highlighter::new(provider, HighlighterConfig::new(styles()), 3);
    hl.update().await.unwrap();

    *hl.provider().text.borrow_mut() = "77".to_string();
    hl.did_replace_content(2);
    assert!(hl.state().is_empty());
    hl.update().await.unwrap();
    assert_eq!(hl.attributes(0..2), vec![Interval::new(0, 2, 2)]);
}

#[tokio::test]
async fn test_pending_range_past_the_end_is_dropped() {
    // The highlighter believes the document is longer than it is.
    let provider = ScanProvider::new("{1}");
    let mut hl = Highlighter::new(provider, HighlighterConfig::new(styles()), 10);
    hl.update().await.unwrap();
    assert!(hl.pending().is_empty());

    hl.invalidate(&RangeSet::single(6..9));
    hl.provider().requests.borrow_mut().clear();
    let restyled = hl.update().await.unwrap();
    assert!(restyled.is_empty());
    assert!(hl.pending().is_empty());
    assert_eq!(*hl.provider().requests.borrow(), vec![6..9]);

    hl.provider().requests.borrow_mut().clear();
    hl.update().await.unwrap();
    assert!(hl.provider().requests.borrow().is_empty());
}
