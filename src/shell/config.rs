//! Shell configuration.
//!
//! `ShellConfig` controls the homepage, the search provider used by the URL bar,
//! and the timing of deferred thumbnail captures.
//!
//! `ShellConfig` provides sensible defaults via [`Default`] and a fluent
//! [`ShellConfig::builder()`] for customization with validation. It can also be
//! read from JSON, where missing fields fall back to their defaults.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use tabshell::config::ShellConfig;
//! let cfg = ShellConfig::default();
//! assert_eq!(cfg.homepage, "https://floorp.app");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use tabshell::config::ShellConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ShellConfig::builder()
//!     .homepage("https://example.org")
//!     .thumbnail_delay_ms(250)
//!     .build()?; // returns Result<ShellConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation and [`ShellConfig::from_json`] return [`ConfigError`] when
//! the homepage is not an absolute URL, the search URL is empty, or one of the
//! sizes is zero.

use crate::shell::errors::ConfigError;
use crate::shell::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_HOMEPAGE: &str = "https://floorp.app";
const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Page loaded into new tabs and into the replacement tab when the last one closes
    pub homepage: String,
    /// Prefix for search queries typed into the URL bar. The encoded query is appended.
    pub search_url: String,
    /// Delay between a page stop and the deferred thumbnail capture
    pub thumbnail_delay_ms: u64,
    /// Largest edge, in pixels, of a captured thumbnail
    pub thumbnail_max_dim: u32,
    /// Capacity of the shell command channel
    pub event_channel_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            homepage: DEFAULT_HOMEPAGE.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            thumbnail_delay_ms: 500,
            thumbnail_max_dim: 512,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ShellConfig {
    pub fn builder() -> ShellConfigBuilder {
        ShellConfigBuilder::default()
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: ShellConfig = serde_json::from_str(json)?;
        validate(&cfg)?;
        Ok(cfg)
    }

    pub fn thumbnail_delay(&self) -> Duration {
        Duration::from_millis(self.thumbnail_delay_ms)
    }
}

/// Builder for [`ShellConfig`].
#[derive(Debug, Clone, Default)]
pub struct ShellConfigBuilder {
    inner: ShellConfig,
}

impl ShellConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ShellConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn homepage<S: Into<String>>(self, url: S) -> Self { self.map(|c| c.homepage = url.into()) }
    pub fn search_url<S: Into<String>>(self, url: S) -> Self { self.map(|c| c.search_url = url.into()) }
    pub fn thumbnail_delay_ms(self, ms: u64) -> Self { self.map(|c| c.thumbnail_delay_ms = ms) }
    pub fn thumbnail_max_dim(self, px: u32) -> Self { self.map(|c| c.thumbnail_max_dim = px) }
    pub fn event_channel_capacity(self, n: usize) -> Self { self.map(|c| c.event_channel_capacity = n) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ShellConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ShellConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

fn validate(c: &ShellConfig) -> Result<(), ConfigError> {
    if let Err(e) = Url::parse(&c.homepage) {
        return Err(ConfigError::InvalidHomepage {
            url: c.homepage.clone(),
            reason: e.to_string(),
        });
    }
    if c.search_url.trim().is_empty() {
        return Err(ConfigError::EmptySearchUrl);
    }
    if c.thumbnail_max_dim == 0 {
        return Err(ConfigError::ZeroThumbnailSize);
    }
    if c.event_channel_capacity == 0 {
        return Err(ConfigError::ZeroChannelCapacity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ShellConfig::builder().build().unwrap();
        assert_eq!(cfg, ShellConfig::default());
        assert_eq!(cfg.thumbnail_delay(), Duration::from_millis(500));
    }

    #[test]
    fn builder_rejects_relative_homepage() {
        let err = ShellConfig::builder().homepage("floorp.app").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHomepage { .. }));
    }

    #[test]
    fn builder_rejects_zero_sizes() {
        let err = ShellConfig::builder().thumbnail_max_dim(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroThumbnailSize));

        let err = ShellConfig::builder().event_channel_capacity(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroChannelCapacity));

        let err = ShellConfig::builder().search_url("  ").build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptySearchUrl));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = ShellConfig::from_json(r#"{ "homepage": "https://example.org", "thumbnail_delay_ms": 100 }"#)
            .unwrap();
        assert_eq!(cfg.homepage, "https://example.org");
        assert_eq!(cfg.thumbnail_delay_ms, 100);
        assert_eq!(cfg.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(cfg.thumbnail_max_dim, 512);
    }

    #[test]
    fn json_is_validated() {
        assert!(matches!(
            ShellConfig::from_json(r#"{ "homepage": "nope" }"#),
            Err(ConfigError::InvalidHomepage { .. })
        ));
        assert!(matches!(ShellConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));
    }
}
