//! Rule table types
//!
//! A rule table maps every output column to an ordered list of candidate
//! strategies. Markup changes on a site are handled by editing its table in
//! `profiles.rs` and bumping the table version.

/// One way of finding a column's value in a document
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Whitespace-normalised text of the first element matching a CSS selector
    Text { selector: &'static str },

    /// Attribute of the first element matching a CSS selector
    Attr {
        selector: &'static str,
        attr: &'static str,
    },

    /// Value in the heading-anchored feature block, keyed by the icon file
    /// stem of the feature (see [`FeatureBlock`])
    Feature { icon: &'static str },

    /// Value from the label/value list scan, for the column being resolved
    /// (see [`LabelTable`])
    Label,

    /// Scalar at a key path below the JSON payload root
    Json { path: &'static [&'static str] },

    /// Non-empty scalars at several key paths, joined
    JsonJoin {
        paths: &'static [&'static [&'static str]],
        separator: &'static str,
    },

    /// HTML string at a key path, flattened to text
    JsonHtml { path: &'static [&'static str] },
}

/// Ordered candidate strategies for one column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub column: &'static str,
    pub strategies: Vec<Strategy>,
}

impl FieldRule {
    pub fn new(column: &'static str, strategies: Vec<Strategy>) -> Self {
        Self { column, strategies }
    }
}

/// A block of icon + value features that follows a section heading
///
/// ```text
/// <h6>Dati principali</h6>
/// <div class="main-data_main-features-container__x1">
///   <div class="main-data_main-feature__y2"><img src=".../fuel.svg"><p>Diesel</p></div>
/// </div>
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBlock {
    /// Heading tag name
    pub heading_tag: &'static str,

    /// Heading text, compared trimmed and case-insensitively
    pub heading_text: &'static str,

    /// Class substring of the container following the heading
    pub container_class: &'static str,

    /// Class substring of each feature inside the container
    pub item_class: &'static str,
}

/// How a label is compared against a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    Prefix(&'static str),
    Contains(&'static str),
}

impl LabelMatch {
    /// `label` must already be lowercase
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Prefix(k) => label.starts_with(k),
            Self::Contains(k) => label.contains(k),
        }
    }
}

/// Keyword that routes a list label to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelKeyword {
    pub matcher: LabelMatch,
    pub column: &'static str,
}

/// Label/value list scan definition
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    /// Candidate list containers, highest priority first
    pub containers: &'static [&'static str],

    /// Keyword table; the first matching keyword wins for a label
    pub keywords: &'static [LabelKeyword],
}

impl LabelTable {
    /// Column a lowercase label routes to, if any keyword matches
    pub fn column_for(&self, label: &str) -> Option<&'static str> {
        self.keywords
            .iter()
            .find(|k| k.matcher.matches(label))
            .map(|k| k.column)
    }
}

/// Versioned extraction rules of one site
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub version: &'static str,
    pub fields: Vec<FieldRule>,
    pub feature_block: Option<FeatureBlock>,
    pub label_table: Option<LabelTable>,

    /// Key path from the `__NEXT_DATA__` payload to the listing object
    pub json_root: Option<&'static [&'static str]>,
}
