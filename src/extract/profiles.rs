//! Built-in site profiles
//!
//! Each profile bundles a schema, the listing-page link rule, the page-index
//! query parameter and a versioned rule table. When a site changes its
//! markup, edit the table here and bump its version string.

use super::rules::{
    FeatureBlock, FieldRule, LabelKeyword, LabelMatch, LabelTable, RuleTable, Strategy,
};
use super::{LinkRule, Schema, AUTOSCOUT24_SCHEMA, SUBITO_EXTENDED_SCHEMA, SUBITO_SCHEMA};
use crate::config::ProfileKind;
use crate::ScrapeError;

/// What the pipeline does with a detail page it could not fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailurePolicy {
    /// Persist a record holding only the ListingURL
    UrlOnly,
    /// Persist nothing; the URL is retried by a later run
    Skip,
}

/// Everything site-specific the crawler needs
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub kind: ProfileKind,
    pub schema: &'static Schema,
    pub links: LinkRule,

    /// Query parameter carrying the listing page index
    pub page_param: &'static str,

    pub rules: RuleTable,
    pub on_fetch_error: FetchFailurePolicy,

    /// Keep records in which nothing but the key was extracted
    pub keep_empty_records: bool,
}

impl SiteProfile {
    /// Builds one of the built-in profiles
    pub fn builtin(kind: ProfileKind) -> Result<Self, ScrapeError> {
        let profile = match kind {
            ProfileKind::Subito => Self {
                kind,
                schema: &SUBITO_SCHEMA,
                links: subito_links()?,
                page_param: "o",
                rules: subito_rules(),
                on_fetch_error: FetchFailurePolicy::UrlOnly,
                keep_empty_records: true,
            },
            ProfileKind::SubitoExtended => Self {
                kind,
                schema: &SUBITO_EXTENDED_SCHEMA,
                links: subito_links()?,
                page_param: "o",
                rules: subito_extended_rules(),
                on_fetch_error: FetchFailurePolicy::UrlOnly,
                keep_empty_records: true,
            },
            ProfileKind::Autoscout24 => Self {
                kind,
                schema: &AUTOSCOUT24_SCHEMA,
                links: LinkRule::new(r#"article[data-testid="list-item"] a[href]"#, r"^/angebote/.+")?,
                page_param: "page",
                rules: autoscout24_rules(),
                on_fetch_error: FetchFailurePolicy::Skip,
                keep_empty_records: false,
            },
        };

        tracing::debug!(
            "Using site profile {} (rules {})",
            profile.kind.as_str(),
            profile.rules.version
        );

        Ok(profile)
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

fn subito_links() -> Result<LinkRule, regex::Error> {
    LinkRule::new("a[href]", r"^/(?:auto|annunci-[a-z-]+/vendita/auto)/.+\.htm$")
}

const SUBITO_FEATURES: FeatureBlock = FeatureBlock {
    heading_tag: "h6",
    heading_text: "Dati principali",
    container_class: "main-data_main-features-container__",
    item_class: "main-data_main-feature__",
};

/// Italian info-list labels, first match wins
const SUBITO_LABELS: &[LabelKeyword] = &[
    LabelKeyword { matcher: LabelMatch::Prefix("marca"), column: "brand_model" },
    LabelKeyword { matcher: LabelMatch::Contains("modello"), column: "brand_model" },
    LabelKeyword { matcher: LabelMatch::Prefix("anno"), column: "year" },
    LabelKeyword { matcher: LabelMatch::Contains("chil"), column: "mileage" },
    LabelKeyword { matcher: LabelMatch::Contains("carburante"), column: "fuel_type" },
    LabelKeyword { matcher: LabelMatch::Contains("potenza"), column: "engine_power" },
    LabelKeyword { matcher: LabelMatch::Contains("cambio"), column: "transmission" },
    LabelKeyword { matcher: LabelMatch::Contains("proprietari"), column: "num_previous_owners" },
    LabelKeyword { matcher: LabelMatch::Contains("condizion"), column: "condition" },
    LabelKeyword { matcher: LabelMatch::Contains("colore"), column: "color" },
    LabelKeyword { matcher: LabelMatch::Contains("emission"), column: "emission_standard" },
    LabelKeyword { matcher: LabelMatch::Contains("prima immatricolazione"), column: "first_registration_date" },
    LabelKeyword { matcher: LabelMatch::Contains("data prima"), column: "first_registration_date" },
    LabelKeyword { matcher: LabelMatch::Contains("carrozzeria"), column: "body_type" },
];

const SUBITO_INFO_LISTS: &[&str] = &[
    "div.adDescriptionSection__infoList ul",
    "div.AdInfoList ul",
    "div[class*=infoList] ul",
];

fn text(selector: &'static str) -> Strategy {
    Strategy::Text { selector }
}

fn feature(icon: &'static str) -> Strategy {
    Strategy::Feature { icon }
}

fn json(path: &'static [&'static str]) -> Strategy {
    Strategy::Json { path }
}

/// Base subito columns; `with_labels` appends the info-list fallback to each
fn subito_fields(with_labels: bool) -> Vec<FieldRule> {
    let mut fields = vec![
        FieldRule::new(
            "url",
            vec![Strategy::Attr { selector: r#"link[rel="canonical"]"#, attr: "href" }],
        ),
        FieldRule::new("brand_model", vec![text(r#"h1[class*="AdInfo_title__"]"#)]),
        FieldRule::new("price", vec![text(r#"p[class*="AdInfo_price__"]"#)]),
        FieldRule::new("year", vec![feature("register_date")]),
        FieldRule::new("mileage", vec![feature("mileage_scalar")]),
        FieldRule::new("fuel_type", vec![feature("fuel")]),
        FieldRule::new("transmission", vec![feature("gearbox")]),
        FieldRule::new("emission_standard", vec![feature("pollution")]),
        FieldRule::new("body_type", vec![feature("car_type")]),
        FieldRule::new("description", vec![text(r#"p[class*="AdDescription_description__"]"#)]),
    ];

    if with_labels {
        for field in fields.iter_mut() {
            if matches!(
                field.column,
                "brand_model" | "year" | "mileage" | "fuel_type" | "transmission"
                    | "emission_standard" | "body_type"
            ) {
                field.strategies.push(Strategy::Label);
            }
        }
    }

    fields
}

fn subito_rules() -> RuleTable {
    RuleTable {
        version: "subito/3",
        fields: subito_fields(false),
        feature_block: Some(SUBITO_FEATURES),
        label_table: None,
        json_root: None,
    }
}

fn subito_extended_rules() -> RuleTable {
    let mut fields = subito_fields(true);
    for column in [
        "engine_power",
        "num_previous_owners",
        "condition",
        "color",
        "first_registration_date",
    ] {
        fields.push(FieldRule::new(column, vec![Strategy::Label]));
    }

    RuleTable {
        version: "subito-extended/3",
        fields,
        feature_block: Some(SUBITO_FEATURES),
        label_table: Some(LabelTable {
            containers: SUBITO_INFO_LISTS,
            keywords: SUBITO_LABELS,
        }),
        json_root: None,
    }
}

fn autoscout24_rules() -> RuleTable {
    RuleTable {
        version: "autoscout24/2",
        fields: vec![
            FieldRule::new(
                "car_name",
                vec![Strategy::JsonJoin {
                    paths: &[
                        &["vehicle", "make"],
                        &["vehicle", "model"],
                        &["vehicle", "modelVersionInput"],
                    ],
                    separator: " ",
                }],
            ),
            FieldRule::new("price", vec![json(&["price", "priceFormatted"])]),
            FieldRule::new("mileage_km", vec![json(&["vehicle", "mileageInKmRaw"])]),
            FieldRule::new("fuel", vec![json(&["vehicle", "fuelCategory", "formatted"])]),
            FieldRule::new("power_kw", vec![json(&["vehicle", "powerInKw"])]),
            FieldRule::new(
                "transmission",
                vec![json(&["vehicle", "rawData", "engine", "transmissionType", "formatted"])],
            ),
            FieldRule::new("first_registration", vec![json(&["vehicle", "firstRegistrationDate"])]),
            FieldRule::new("seller_type", vec![json(&["seller", "type"])]),
            FieldRule::new("description", vec![Strategy::JsonHtml { path: &["description"] }]),
        ],
        feature_block: None,
        label_table: None,
        json_root: Some(&["props", "pageProps", "listingDetails"]),
    }
}
