//! Field extraction for listing detail pages
//!
//! This module turns one fetched document into one [`ListingRecord`]:
//! - A [`Schema`] fixes the column set and order of each site's output
//! - A [`SiteProfile`] carries the site's versioned rule table, where every
//!   column maps to an ordered list of candidate strategies
//! - [`extract_record`] evaluates the rules independently, so a missing
//!   element only leaves its own column empty
//!
//! Link discovery for listing pages lives here too ([`LinkRule`]), since it
//! is the same selector matching applied in link mode.

mod document;
mod json;
mod links;
mod profiles;
mod rules;

pub use document::Document;
pub use json::{next_data_payload, value_at};
pub use links::LinkRule;
pub use profiles::{FetchFailurePolicy, SiteProfile};
pub use rules::{FeatureBlock, FieldRule, LabelKeyword, LabelMatch, LabelTable, RuleTable, Strategy};

use crate::url::normalize_listing_url;

/// Fixed column layout of one site's output
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    /// Schema name, also used as the SQLite table name
    pub name: &'static str,

    /// Output columns in file order
    pub columns: &'static [&'static str],

    /// Position of the ListingURL column
    pub key_index: usize,
}

impl Schema {
    /// Name of the key column
    pub fn key(&self) -> &'static str {
        self.columns[self.key_index]
    }

    /// Position of a column, if the schema has it
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

/// Italian listings, "Dati principali" block only
pub static SUBITO_SCHEMA: Schema = Schema {
    name: "subito",
    columns: &[
        "url",
        "brand_model",
        "price",
        "year",
        "mileage",
        "fuel_type",
        "transmission",
        "emission_standard",
        "body_type",
        "description",
    ],
    key_index: 0,
};

/// Italian listings including the label/value info list extras
pub static SUBITO_EXTENDED_SCHEMA: Schema = Schema {
    name: "subito_extended",
    columns: &[
        "url",
        "brand_model",
        "price",
        "year",
        "mileage",
        "fuel_type",
        "transmission",
        "emission_standard",
        "body_type",
        "description",
        "engine_power",
        "num_previous_owners",
        "condition",
        "color",
        "first_registration_date",
    ],
    key_index: 0,
};

/// German listings read from the embedded JSON payload
pub static AUTOSCOUT24_SCHEMA: Schema = Schema {
    name: "autoscout24",
    columns: &[
        "car_name",
        "price",
        "mileage_km",
        "fuel",
        "power_kw",
        "transmission",
        "first_registration",
        "seller_type",
        "description",
        "url",
    ],
    key_index: 9,
};

/// One extracted listing
///
/// Every schema column is present; a column nobody could extract holds
/// `None`. The key column always holds a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    schema: &'static Schema,
    values: Vec<Option<String>>,
}

impl ListingRecord {
    /// Creates a record with only the key column populated
    pub fn new(schema: &'static Schema, url: impl Into<String>) -> Self {
        let mut values = vec![None; schema.columns.len()];
        values[schema.key_index] = Some(url.into());
        Self { schema, values }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// The ListingURL this record is stored under
    pub fn key(&self) -> &str {
        self.values[self.schema.key_index].as_deref().unwrap_or_default()
    }

    /// Value of a column, `None` if absent or not in the schema
    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .index_of(column)
            .and_then(|i| self.values[i].as_deref())
    }

    /// Sets a column; blank values are stored as absent
    ///
    /// Returns false if the schema has no such column. The key column can be
    /// replaced but never cleared.
    pub fn set(&mut self, column: &str, value: Option<String>) -> bool {
        let Some(index) = self.schema.index_of(column) else {
            return false;
        };

        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if index == self.schema.key_index && value.is_none() {
            return true;
        }

        self.values[index] = value;
        true
    }

    /// Values in column order
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// True if any column besides the key was extracted
    pub fn has_content(&self) -> bool {
        self.values
            .iter()
            .enumerate()
            .any(|(i, v)| i != self.schema.key_index && v.is_some())
    }

    /// Row cells in column order, absent values as empty strings
    pub fn to_row(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.as_deref().unwrap_or("")).collect()
    }
}

/// Extracts one record from a fetched detail page
///
/// Each column's strategies are tried in order and the first non-empty value
/// wins. A column without a match stays absent; this never fails.
pub fn extract_record(profile: &SiteProfile, url: &str, body: &str) -> ListingRecord {
    let document = Document::parse(body, &profile.rules);
    let mut record = ListingRecord::new(profile.schema, url);

    for rule in &profile.rules.fields {
        let found = rule
            .strategies
            .iter()
            .find_map(|strategy| document.resolve(strategy, rule.column));

        match found {
            Some(value) if rule.column == profile.schema.key() => {
                match canonical_key(&value, url) {
                    Some(key) => {
                        record.set(rule.column, Some(key));
                    }
                    None => tracing::debug!("Ignoring unusable canonical '{}' on {}", value, url),
                }
            }
            Some(value) => {
                record.set(rule.column, Some(value));
            }
            None => {
                tracing::trace!("No value for '{}' on {}", rule.column, url);
            }
        }
    }

    record
}

/// Resolves a declared canonical link into a ListingURL
fn canonical_key(href: &str, page: &str) -> Option<String> {
    let page = ::url::Url::parse(page).ok()?;
    normalize_listing_url(href, &page).ok()
}
