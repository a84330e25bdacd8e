use car_harvest::config::{parse_config, Config};
use std::path::Path;
use wiremock::{Match, Request};

/// Matches requests that do not carry the given query parameter
pub struct NoQueryParam(pub &'static str);

impl Match for NoQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(k, _)| k == self.0)
    }
}

/// Listing page with one anchor per detail path
pub fn subito_listing(paths: &[String]) -> String {
    let anchors: String = paths
        .iter()
        .map(|p| format!("<div class=\"item\"><a href=\"{}?from=list\">annuncio</a></div>\n", p))
        .collect();
    format!(
        "<html><body><nav><a href=\"/annunci-italia/vendita/auto/?o=2\">2</a></nav>{}</body></html>",
        anchors
    )
}

/// Detail page carrying the title, price and "Dati principali" block
pub fn subito_detail(title: &str, price: &str, mileage: &str) -> String {
    format!(
        r#"<html><body>
          <h1 class="AdInfo_title__abc">{}</h1>
          <p class="AdInfo_price__def">{}</p>
          <h6>Dati principali</h6>
          <div class="main-data_main-features-container__g1">
            <div class="main-data_main-feature__h2"><img src="/icons/mileage_scalar.svg"><p>{}</p></div>
            <div class="main-data_main-feature__h2"><img src="/icons/fuel.svg"><p>Diesel</p></div>
          </div>
        </body></html>"#,
        title, price, mileage
    )
}

pub fn detail_paths(range: std::ops::Range<u32>) -> Vec<String> {
    range.map(|i| format!("/auto/auto-usata-{}.htm", i)).collect()
}

/// Detail page carrying the listing in its `__NEXT_DATA__` payload
pub fn autoscout_detail(make: &str, model: &str, price: &str) -> String {
    format!(
        r#"<html><head><script id="__NEXT_DATA__" type="application/json">
        {{"props":{{"pageProps":{{"listingDetails":{{
          "price":{{"priceFormatted":"{price}"}},
          "vehicle":{{"make":"{make}","model":"{model}","mileageInKmRaw":120500,"powerInKw":110,
            "fuelCategory":{{"formatted":"Diesel"}},"firstRegistrationDate":"11/2017"}},
          "seller":{{"type":"Private"}},
          "description":"Nichtraucher<br>TÜV neu"
        }}}}}}}}
        </script></head><body></body></html>"#
    )
}

/// Listing page with one result article per detail path
pub fn autoscout_listing(paths: &[String]) -> String {
    let articles: String = paths
        .iter()
        .map(|p| format!("<article data-testid=\"list-item\"><a href=\"{}\">Angebot</a></article>\n", p))
        .collect();
    format!("<html><body><main>{}</main></body></html>", articles)
}

/// Configuration for a single-scope subito run against a mock server
pub fn subito_config(server_uri: &str, dir: &Path, max_links: usize, max_workers: usize) -> Config {
    parse_config(&format!(
        r#"
[site]
profile = "subito"
base-url = "{server_uri}/annunci-italia/vendita/auto/"

[crawler]
max-links = {max_links}
max-pages = 10
max-workers = {max_workers}
request-timeout-secs = 5
delay-min-ms = 0
delay-max-ms = 0
scroll-delay-ms = 0

[http]
user-agent = "Mozilla/5.0 (X11; Linux x86_64)"
accept-language = "it-IT,it;q=0.9"

[output]
path = "{out}"
checkpoint-path = "{checkpoint}"
"#,
        out = dir.join("subito_{scope}.csv").display(),
        checkpoint = dir.join("checkpoint.json").display(),
    ))
    .expect("test config must be valid")
}

/// Configuration for a single-scope autoscout24 run against a mock server
pub fn autoscout_config(server_uri: &str, dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[site]
profile = "autoscout24"
base-url = "{server_uri}/lst"

[crawler]
max-links = 100
max-pages = 10
max-workers = 2
request-timeout-secs = 5
delay-min-ms = 0
delay-max-ms = 0

[http]
user-agent = "Mozilla/5.0 (X11; Linux x86_64)"
accept-language = "de-DE,de;q=0.9"

[output]
path = "{out}"
checkpoint-path = "{checkpoint}"
"#,
        out = dir.join("autoscout24.csv").display(),
        checkpoint = dir.join("checkpoint.json").display(),
    ))
    .expect("test config must be valid")
}

/// Data rows of a CSV output (header excluded)
pub fn csv_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).expect("output must exist");
    reader.records().map(|r| r.expect("row must parse")).collect()
}
