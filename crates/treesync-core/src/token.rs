//! Token kinds and tokens.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::intervals::StyleId;

/// Closed set of highlight classes a query capture can map to.
///
/// Capture names are resolved once, when a query is loaded; an unknown name is an error there
/// rather than a silent fallback at styling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// `comment`
    Comment,
    /// `keyword`
    Keyword,
    /// `string`
    String,
    /// `string.escape`
    StringEscape,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `constant`
    Constant,
    /// `type`
    Type,
    /// `function`
    Function,
    /// `variable`
    Variable,
    /// `property`
    Property,
    /// `operator`
    Operator,
    /// `punctuation.bracket`
    PunctuationBracket,
    /// `punctuation.delimiter`
    PunctuationDelimiter,
    /// `error`
    Error,
}

impl TokenKind {
    /// Every kind, in declaration order.
    pub const ALL: [TokenKind; 16] = [
        Self::Comment,
        Self::Keyword,
        Self::String,
        Self::StringEscape,
        Self::Number,
        Self::Boolean,
        Self::Null,
        Self::Constant,
        Self::Type,
        Self::Function,
        Self::Variable,
        Self::Property,
        Self::Operator,
        Self::PunctuationBracket,
        Self::PunctuationDelimiter,
        Self::Error,
    ];

    /// Canonical capture name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Keyword => "keyword",
            Self::String => "string",
            Self::StringEscape => "string.escape",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Constant => "constant",
            Self::Type => "type",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Property => "property",
            Self::Operator => "operator",
            Self::PunctuationBracket => "punctuation.bracket",
            Self::PunctuationDelimiter => "punctuation.delimiter",
            Self::Error => "error",
        }
    }

    /// Resolve a capture name.
    ///
    /// Exact canonical names match directly. Otherwise the longest canonical name that is a
    /// dotted prefix of `name` wins, so `string.special.key` resolves to [`TokenKind::String`]
    /// and `constant.builtin` to [`TokenKind::Constant`].
    pub fn from_capture_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| {
                let canonical = kind.as_str();
                name == canonical
                    || name
                        .strip_prefix(canonical)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|kind| kind.as_str().len())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a capture name does not map to a [`TokenKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTokenKind(pub String);

impl fmt::Display for UnknownTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownTokenKind {}

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_capture_name(s).ok_or_else(|| UnknownTokenKind(s.to_string()))
    }
}

/// A classified byte range. Plain value; carries no reference to the tree it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Byte range in the content the tree was parsed from.
    pub range: Range<usize>,
    /// Classification.
    pub kind: TokenKind,
}

impl Token {
    /// Create a token.
    pub fn new(range: Range<usize>, kind: TokenKind) -> Self {
        Self { range, kind }
    }
}

/// Mapping from token kinds to presentation style ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    styles: BTreeMap<TokenKind, StyleId>,
}

impl StyleMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a set of kind → style id mappings.
    pub fn with_styles<const N: usize>(mut self, styles: [(TokenKind, StyleId); N]) -> Self {
        self.styles.extend(styles);
        self
    }

    /// Set the style for one kind.
    pub fn set(&mut self, kind: TokenKind, style_id: StyleId) {
        self.styles.insert(kind, style_id);
    }

    /// Style for `kind`, if the presentation layer styles it.
    pub fn get(&self, kind: TokenKind) -> Option<StyleId> {
        self.styles.get(&kind).copied()
    }
}
