use crate::UrlError;
use url::Url;

/// Normalizes a detail-page link into a ListingURL
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty, fragment-only and non-navigational hrefs
/// 2. Resolve relative links against the page the link was found on
/// 3. Reject anything that is not HTTP(S) after resolution
/// 4. Drop the query string (tracking parameters) and the fragment
///
/// Host case and path are kept as the site serves them, since the listing
/// sites treat paths case-sensitively.
///
/// # Examples
///
/// ```
/// use car_harvest::url::normalize_listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.subito.it/annunci-italia/vendita/auto/").unwrap();
/// let url = normalize_listing_url("/auto/fiat-panda-123.htm?utm_source=x#top", &base).unwrap();
/// assert_eq!(url, "https://www.subito.it/auto/fiat-panda-123.htm");
/// ```
pub fn normalize_listing_url(href: &str, base_url: &Url) -> Result<String, UrlError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Parse(format!("not a navigable link: '{}'", href)));
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return Err(UrlError::InvalidScheme(href.to_string()));
    }

    let mut url = base_url
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

/// Builds the URL of listing page `page` for a crawl scope
///
/// Page 1 is the bare base URL. Later pages set `param` to the page index,
/// replacing any value the base URL already carries and keeping every other
/// query parameter in place.
///
/// # Examples
///
/// ```
/// use car_harvest::url::page_url;
///
/// let base = "https://www.subito.it/annunci-lazio/vendita/auto/";
/// assert_eq!(page_url(base, "o", 1).unwrap(), base);
/// assert_eq!(
///     page_url(base, "o", 3).unwrap(),
///     "https://www.subito.it/annunci-lazio/vendita/auto/?o=3"
/// );
/// ```
pub fn page_url(base_url: &str, param: &str, page: u32) -> Result<String, UrlError> {
    if page <= 1 {
        return Ok(base_url.to_string());
    }

    let mut url = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(param, &page.to_string());
    }

    Ok(url.to_string())
}
