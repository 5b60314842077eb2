//! Resolved configuration types.
//!
//! `raw` holds the serde shapes of the TOML file, `load` resolves them
//! (inheritance, env overrides, `~` expansion) into the structs below.

mod load;
mod raw;

use std::path::{Path, PathBuf};

pub use load::{EnvOverrides, expand_home, load, load_from};

/// HTTP server configuration (`[server]`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the site listens on.
    pub bind: String,
}

/// Site data and rendering configuration (`[site]`).
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory holding `pages.json`, `categories/`, `app/` and `public/`.
    pub root: PathBuf,
    /// Canonical base URL. Overrides `site.baseUrl` from `pages.json`.
    pub base_url: Option<String>,
    /// Thumbnails per listing page.
    pub page_size: usize,
    /// Random sibling pages shown under a page view.
    pub similar_count: usize,
}

/// Image generation configuration (`[generator]`).
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base of the remote API, without the `/models/...` suffix.
    pub api_base_url: String,
    /// Default model when a request names none.
    pub model: String,
    /// Default aspect ratio when a request names none.
    pub aspect_ratio: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Upper bound on items per generation request.
    pub max_count: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub generator: GeneratorConfig,
    /// API key from `GEMINI_API_KEY`. Never sourced from TOML.
    pub api_key: Option<String>,
}

impl Config {
    /// Built-in defaults serving the site at `root`, with no API key.
    pub fn for_site(root: &Path) -> Self {
        Self {
            log_level: raw::default_log_level(),
            server: ServerConfig {
                bind: raw::default_bind(),
            },
            site: SiteConfig {
                root: root.to_path_buf(),
                base_url: None,
                page_size: raw::default_page_size(),
                similar_count: raw::default_similar_count(),
            },
            generator: GeneratorConfig {
                api_base_url: raw::default_api_base_url(),
                model: raw::default_model(),
                aspect_ratio: raw::default_aspect_ratio(),
                timeout_seconds: raw::default_timeout_seconds(),
                max_count: raw::default_max_count(),
            },
            api_key: None,
        }
    }
}
