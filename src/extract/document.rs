//! Parsed detail page with lazily built lookup tables
//!
//! The feature block, the label/value list and the JSON payload are each
//! scanned at most once per document, on the first strategy that needs them.

use crate::extract::json::{next_data_payload, scalar_text, value_at};
use crate::extract::rules::{FeatureBlock, LabelTable, RuleTable, Strategy};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::HashMap;

/// A fetched detail page ready for rule evaluation
pub struct Document<'r> {
    html: Html,
    rules: &'r RuleTable,
    features: OnceCell<HashMap<String, String>>,
    labels: OnceCell<HashMap<&'static str, String>>,
    listing: OnceCell<Option<Value>>,
}

impl<'r> Document<'r> {
    /// Parses markup; malformed HTML still yields a (possibly empty) tree
    pub fn parse(body: &str, rules: &'r RuleTable) -> Self {
        Self {
            html: Html::parse_document(body),
            rules,
            features: OnceCell::new(),
            labels: OnceCell::new(),
            listing: OnceCell::new(),
        }
    }

    /// Evaluates one strategy for `column`
    pub fn resolve(&self, strategy: &Strategy, column: &str) -> Option<String> {
        let value = match strategy {
            Strategy::Text { selector } => self.first_match(selector).map(element_text),
            Strategy::Attr { selector, attr } => self
                .first_match(selector)
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string()),
            Strategy::Feature { icon } => self.features().get(*icon).cloned(),
            Strategy::Label => self.labels().get(column).cloned(),
            Strategy::Json { path } => self
                .listing()
                .and_then(|listing| value_at(listing, path))
                .and_then(scalar_text),
            Strategy::JsonJoin { paths, separator } => {
                let listing = self.listing()?;
                let parts: Vec<String> = paths
                    .iter()
                    .filter_map(|path| value_at(listing, path).and_then(scalar_text))
                    .collect();
                Some(parts.join(separator))
            }
            Strategy::JsonHtml { path } => self
                .listing()
                .and_then(|listing| value_at(listing, path))
                .and_then(|v| v.as_str())
                .map(html_to_text),
        };

        value.filter(|v| !v.is_empty())
    }

    fn first_match(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.html.select(&selector).next()
    }

    fn features(&self) -> &HashMap<String, String> {
        self.features.get_or_init(|| match &self.rules.feature_block {
            Some(block) => scan_feature_block(&self.html, block),
            None => HashMap::new(),
        })
    }

    fn labels(&self) -> &HashMap<&'static str, String> {
        self.labels.get_or_init(|| match &self.rules.label_table {
            Some(table) => scan_label_table(&self.html, table),
            None => HashMap::new(),
        })
    }

    fn listing(&self) -> Option<&Value> {
        self.listing
            .get_or_init(|| {
                let root = self.rules.json_root?;
                let payload = next_data_payload(&self.html)?;
                let listing = value_at(&payload, root).cloned();
                if listing.is_none() {
                    tracing::debug!("JSON payload has no {}", root.join("."));
                }
                listing
            })
            .as_ref()
    }
}

/// Collapses every whitespace run in an element's text to one space
fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flattens an HTML fragment to plain text
fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    normalize_whitespace(&html.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Maps icon file stem to feature value within the heading-anchored block
fn scan_feature_block(html: &Html, block: &FeatureBlock) -> HashMap<String, String> {
    let mut features = HashMap::new();

    let (Ok(heading_sel), Ok(item_sel), Ok(img_sel), Ok(p_sel)) = (
        Selector::parse(block.heading_tag),
        Selector::parse(&format!("div[class*=\"{}\"]", block.item_class)),
        Selector::parse("img"),
        Selector::parse("p"),
    ) else {
        return features;
    };

    let wanted = block.heading_text.to_lowercase();
    let Some(heading) = html
        .select(&heading_sel)
        .find(|h| element_text(*h).to_lowercase() == wanted)
    else {
        return features;
    };

    let Some(container) = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().name() == "div"
                && el
                    .value()
                    .attr("class")
                    .is_some_and(|c| c.contains(block.container_class))
        })
    else {
        tracing::trace!("Heading '{}' has no feature container", block.heading_text);
        return features;
    };

    for item in container.select(&item_sel) {
        let (Some(img), Some(p)) = (item.select(&img_sel).next(), item.select(&p_sel).next()) else {
            continue;
        };

        let src = img.value().attr("src").unwrap_or_default();
        let file_name = src.rsplit('/').next().unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default();
        if stem.is_empty() {
            continue;
        }

        features.insert(stem.to_string(), element_text(p));
    }

    features
}

/// Maps column to value by routing each list entry's label through the keyword table
fn scan_label_table(html: &Html, table: &LabelTable) -> HashMap<&'static str, String> {
    let mut labels = HashMap::new();

    let (Ok(li_sel), Ok(span_sel)) = (Selector::parse("li"), Selector::parse("span")) else {
        return labels;
    };

    let container = table.containers.iter().find_map(|candidate| {
        let selector = Selector::parse(candidate).ok()?;
        html.select(&selector).next()
    });

    let Some(container) = container else {
        return labels;
    };

    for li in container.select(&li_sel) {
        let Some(span) = li.select(&span_sel).next() else {
            continue;
        };

        let label = element_text(span)
            .trim_end_matches(':')
            .trim()
            .to_string();
        if label.is_empty() {
            continue;
        }

        let Some(column) = table.column_for(&label.to_lowercase()) else {
            continue;
        };

        let full = element_text(li);
        let value = match full.strip_prefix(label.as_str()) {
            Some(rest) => rest
                .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
                .to_string(),
            None => full.replace(&format!("{}:", label), "").trim().to_string(),
        };

        // A label with nothing after it leaves the column absent
        if !value.is_empty() {
            labels.insert(column, value);
        }
    }

    labels
}
