use crate::config::types::{
    Config, CrawlerConfig, GeoConfig, HttpConfig, OutputConfig, SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site, config.geo.is_some())?;
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    if let Some(geo) = &config.geo {
        validate_geo_config(geo)?;
    }
    Ok(())
}

/// Validates the site section and its placeholders
fn validate_site_config(config: &SiteConfig, has_geo: bool) -> Result<(), ConfigError> {
    let has_region = config.base_url.contains("{region}");
    let has_coordinates = ["{lat}", "{lon}", "{zip}"]
        .iter()
        .any(|p| config.base_url.contains(p));

    if has_region && config.regions.is_empty() {
        return Err(ConfigError::Validation(
            "base-url uses {region} but no regions are configured".to_string(),
        ));
    }

    if !has_region && !config.regions.is_empty() {
        return Err(ConfigError::Validation(
            "regions are configured but base-url has no {region} placeholder".to_string(),
        ));
    }

    if has_coordinates != has_geo {
        return Err(ConfigError::Validation(
            "base-url {lat}/{lon}/{zip} placeholders require a [geo] section and vice versa"
                .to_string(),
        ));
    }

    if has_region && has_coordinates {
        return Err(ConfigError::Validation(
            "base-url cannot mix {region} with coordinate placeholders".to_string(),
        ));
    }

    for region in &config.regions {
        if region.is_empty()
            || !region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "region '{}' must be a lowercase slug",
                region
            )));
        }
    }

    // Placeholders are not valid URL syntax everywhere, so probe with a filled-in copy
    let probe = config
        .base_url
        .replace("{region}", "probe")
        .replace("{lat}", "0")
        .replace("{lon}", "0")
        .replace("{zip}", "00000");
    let url = Url::parse(&probe)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates crawler limits and delays
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links must be >= 1, got {}",
            config.max_links
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay-min-ms ({}) must not exceed delay-max-ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    Ok(())
}

/// Validates request metadata
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation("output path cannot be empty".to_string()));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path == config.path {
        return Err(ConfigError::Validation(
            "checkpoint-path must differ from the output path".to_string(),
        ));
    }

    Ok(())
}

/// Validates the geo seeding section
fn validate_geo_config(config: &GeoConfig) -> Result<(), ConfigError> {
    if config.seed_path.is_empty() {
        return Err(ConfigError::Validation("seed-path cannot be empty".to_string()));
    }

    if !config.min_distance_km.is_finite() || config.min_distance_km < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min-distance-km must be a non-negative number, got {}",
            config.min_distance_km
        )));
    }

    if config.round_decimals > 10 {
        return Err(ConfigError::Validation(format!(
            "round-decimals must be <= 10, got {}",
            config.round_decimals
        )));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation("limit must be >= 1 when set".to_string()));
    }

    Ok(())
}
