//! URL handling module for car-harvest
//!
//! This module provides ListingURL normalization, listing-page URL
//! construction, and the placeholder substitution that turns the configured
//! base URL into one page-1 URL per crawl scope.

mod normalize;

pub use normalize::{normalize_listing_url, page_url};

use url::form_urlencoded::byte_serialize;

/// Substitutes a region slug into a `{region}` base-URL template
///
/// # Examples
///
/// ```
/// use car_harvest::url::region_url;
///
/// let url = region_url("https://www.subito.it/annunci-{region}/vendita/auto/", "lazio");
/// assert_eq!(url, "https://www.subito.it/annunci-lazio/vendita/auto/");
/// ```
pub fn region_url(template: &str, region: &str) -> String {
    template.replace("{region}", region)
}

/// Substitutes a postal-code zone into a `{lat}`/`{lon}`/`{zip}` template
///
/// The postal code is form-url-encoded; coordinates are written as plain
/// decimals.
pub fn zone_url(template: &str, zip: &str, lat: f64, lon: f64) -> String {
    let zip: String = byte_serialize(zip.as_bytes()).collect();
    template
        .replace("{lat}", &lat.to_string())
        .replace("{lon}", &lon.to_string())
        .replace("{zip}", &zip)
}
