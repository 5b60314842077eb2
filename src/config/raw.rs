//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public config structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub site: RawSite,
    #[serde(default)]
    pub generator: RawGenerator,
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

// ── Site ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawSite {
    #[serde(default = "default_site_root")]
    pub root: String,
    /// Empty string means "use pages.json / request host".
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_similar_count")]
    pub similar_count: usize,
}

impl Default for RawSite {
    fn default() -> Self {
        Self {
            root: default_site_root(),
            base_url: String::new(),
            page_size: default_page_size(),
            similar_count: default_similar_count(),
        }
    }
}

// ── Generator ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawGenerator {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl Default for RawGenerator {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            aspect_ratio: default_aspect_ratio(),
            timeout_seconds: default_timeout_seconds(),
            max_count: default_max_count(),
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_site_root() -> String {
    "site".to_string()
}

pub(super) fn default_page_size() -> usize {
    48
}

pub(super) fn default_similar_count() -> usize {
    12
}

pub(super) fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

pub(super) fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

pub(super) fn default_aspect_ratio() -> String {
    "2:3".to_string()
}

pub(super) fn default_timeout_seconds() -> u64 {
    180
}

pub(super) fn default_max_count() -> usize {
    20
}
