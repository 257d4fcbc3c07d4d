//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. A user file only
//! needs the keys it wants to change: it is merged key-by-key on top of the
//! stock defaults, then deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Portfolio"
//! description = "Works, skills and history."
//! site_url = "https://example.com"   # no trailing slash
//! twitter_username = ""
//! image = "/icon.png"                # social card image, relative to site_url
//! assets_dir = "assets"              # copied verbatim into the output
//!
//! [source]
//! kind = "files"                     # "files" or "graphql"
//! content_dir = "content"            # JSON export, for kind = "files"
//! endpoint = ""                      # CMS GraphQL endpoint, for kind = "graphql"
//! query_concurrency = 4              # parallel collection reads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Metadata used in page heads and social cards.
    pub site: SiteMeta,
    /// Where content comes from.
    pub source: SourceConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        if !is_http_url(&self.site.site_url) {
            return Err(ConfigError::Validation(
                "site.site_url must start with http:// or https://".into(),
            ));
        }
        if self.site.site_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "site.site_url must not end with '/'".into(),
            ));
        }
        if self.source.kind == SourceKind::Graphql && !is_http_url(&self.source.endpoint) {
            return Err(ConfigError::Validation(
                "source.endpoint must be an http(s) URL when source.kind = \"graphql\"".into(),
            ));
        }
        if self.source.query_concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "source.query_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Site-wide metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site title. Page titles render as `"{page} | {title}"`.
    pub title: String,
    /// Default meta description.
    pub description: String,
    /// Absolute base URL for canonical and social-card links.
    pub site_url: String,
    /// Twitter handle for `twitter:creator`, e.g. `@someone`. Empty to omit.
    pub twitter_username: String,
    /// Social card image path, appended to `site_url`.
    pub image: String,
    /// Directory of static files copied into the output root.
    pub assets_dir: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: "Works, skills and history.".to_string(),
            site_url: "https://example.com".to_string(),
            twitter_username: String::new(),
            image: "/icon.png".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// One JSON file per collection in `content_dir`.
    Files,
    /// Headless CMS over GraphQL.
    Graphql,
}

/// Content source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory holding `works.json`, `categories.json`, ... for `kind = "files"`.
    pub content_dir: String,
    /// GraphQL endpoint for `kind = "graphql"`.
    pub endpoint: String,
    /// Maximum number of collections read in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub query_concurrency: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Files,
            content_dir: "content".to_string(),
            endpoint: String::new(),
            query_concurrency: None,
        }
    }
}

/// Resolve the effective fetch parallelism from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &SourceConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .query_concurrency
        .map(|n| n.min(cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is missing.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site metadata (page titles, meta description, social cards)
# ---------------------------------------------------------------------------
[site]
# Page titles render as "{page} | {title}"; the home page uses the bare title.
title = "Portfolio"

# Default meta description for pages that do not set their own.
description = "Works, skills and history."

# Absolute base URL of the deployed site, without a trailing slash.
site_url = "https://example.com"

# Twitter handle for twitter:creator, e.g. "@someone". Empty to omit.
twitter_username = ""

# Social card image, relative to site_url.
image = "/icon.png"

# Static files (favicon, fonts, images) copied verbatim into the output root.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Content source
# ---------------------------------------------------------------------------
[source]
# "files": read works.json, categories.json, tags.json, histories.json,
#          skills.json, certifications.json and profile.json from content_dir.
# "graphql": query a headless CMS GraphQL endpoint.
kind = "files"

# Directory of the JSON export (kind = "files").
content_dir = "content"

# GraphQL endpoint (kind = "graphql").
endpoint = ""

# Maximum collections fetched in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# query_concurrency = 4
"##
}
