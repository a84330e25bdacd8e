//! Configuration module for car-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use car_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("subito.toml")).unwrap();
//! println!("Workers: {}", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, GeoConfig, HttpConfig, OutputConfig, OutputFormat, ProfileKind,
    SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
