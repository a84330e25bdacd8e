use serde::Deserialize;

/// Main configuration structure for car-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub geo: Option<GeoConfig>,
}

/// Which site profile to run and where its listing pages live
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Built-in site profile
    pub profile: ProfileKind,

    /// Page-1 listing URL; may contain `{region}` or `{lat}`/`{lon}`/`{zip}`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Region slugs substituted into `{region}`, one crawl scope each
    #[serde(default)]
    pub regions: Vec<String>,
}

/// Built-in site profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// subito.it, "Dati principali" feature block
    Subito,
    /// subito.it, feature block plus the label/value info list
    SubitoExtended,
    /// autoscout24.de, `__NEXT_DATA__` JSON payload
    Autoscout24,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subito => "subito",
            Self::SubitoExtended => "subito-extended",
            Self::Autoscout24 => "autoscout24",
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of detail URLs collected per crawl scope
    #[serde(rename = "max-links")]
    pub max_links: usize,

    /// Maximum number of listing pages visited per crawl scope
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Number of concurrent detail-page workers (1 = sequential)
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Lower bound of the politeness delay before each fetch (milliseconds)
    #[serde(rename = "delay-min-ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the politeness delay before each fetch (milliseconds)
    #[serde(rename = "delay-max-ms")]
    pub delay_max_ms: u64,

    /// Delay between scroll steps of a scroll-based listing session (milliseconds)
    #[serde(rename = "scroll-delay-ms", default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
}

fn default_scroll_delay_ms() -> u64 {
    400
}

/// Request metadata sent with every fetch
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default)]
    pub accept_language: Option<String>,

    #[serde(default)]
    pub referer: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output file path; `{scope}` gives each crawl scope its own file
    pub path: String,

    #[serde(default)]
    pub format: OutputFormat,

    /// Path of the JSON checkpoint recording completed scopes
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

/// Postal-code seeding for zone-based crawls
#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    /// CSV with `code`, `lat` and `lon` columns
    #[serde(rename = "seed-path")]
    pub seed_path: String,

    /// Minimum great-circle distance between two selected zones
    #[serde(rename = "min-distance-km")]
    pub min_distance_km: f64,

    /// Decimals kept when deduplicating identical coordinates
    #[serde(rename = "round-decimals", default = "default_round_decimals")]
    pub round_decimals: u32,

    /// Stop after selecting this many zones
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_round_decimals() -> u32 {
    5
}
