//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `COLORBOOK_SITE_ROOT`, `COLORBOOK_LOG_LEVEL` and
//! `COLORBOOK_BIND` env overrides. The API key only ever comes from
//! `GEMINI_API_KEY`.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

use super::raw::RawConfig;
use super::{Config, GeneratorConfig, ServerConfig, SiteConfig};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values taken from the environment that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub site_root: Option<String>,
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            site_root: env::var("COLORBOOK_SITE_ROOT").ok(),
            log_level: env::var("COLORBOOK_LOG_LEVEL").ok(),
            bind: env::var("COLORBOOK_BIND").ok(),
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; any other overlay value replaces the base.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged value. `visited` holds canonical paths already seen.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. Without an explicit path and without the default file,
/// the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        let raw = RawConfig::default();
        Ok(resolve(raw, &overrides))
    }
}

/// Load from an explicit path. Tests pass overrides directly instead of
/// mutating env vars.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    if parsed.site.page_size == 0 {
        return Err(AppError::Config(format!(
            "config error in {}: site.page_size must be at least 1",
            path.display()
        )));
    }

    logger::parse_level(parsed.server.log_level.trim()).map_err(|e| {
        AppError::Config(format!("config error in {}: server.log_level: {e}", path.display()))
    })?;

    Ok(resolve(parsed, overrides))
}

fn resolve(parsed: RawConfig, overrides: &EnvOverrides) -> Config {
    let root_str = overrides.site_root.as_deref().unwrap_or(&parsed.site.root);
    let base_url = Some(parsed.site.base_url.trim().trim_end_matches('/').to_string())
        .filter(|b| !b.is_empty());

    Config {
        log_level: overrides
            .log_level
            .clone()
            .unwrap_or(parsed.server.log_level),
        server: ServerConfig {
            bind: overrides.bind.clone().unwrap_or(parsed.server.bind),
        },
        site: SiteConfig {
            root: expand_home(root_str),
            base_url,
            page_size: parsed.site.page_size.max(1),
            similar_count: parsed.site.similar_count,
        },
        generator: GeneratorConfig {
            api_base_url: parsed.generator.api_base_url,
            model: parsed.generator.model,
            aspect_ratio: parsed.generator.aspect_ratio,
            timeout_seconds: parsed.generator.timeout_seconds,
            max_count: parsed.generator.max_count.max(1),
        },
        api_key: overrides.api_key.clone(),
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[server]
bind = "0.0.0.0:9000"
log_level = "debug"

[site]
root = "/srv/coloring"
base_url = "https://coloring.example.com/"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.site.root, PathBuf::from("/srv/coloring"));
        assert_eq!(cfg.site.base_url.as_deref(), Some("https://coloring.example.com"));
        assert_eq!(cfg.site.page_size, 48);
        assert_eq!(cfg.generator.model, "gemini-2.5-flash-image");
        assert_eq!(cfg.generator.max_count, 20);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.site.root, PathBuf::from("site"));
        assert!(cfg.site.base_url.is_none());
        assert_eq!(cfg.generator.timeout_seconds, 180);
    }

    #[test]
    fn overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            site_root: Some("/tmp/other-site".into()),
            log_level: Some("trace".into()),
            bind: Some("127.0.0.1:1".into()),
            api_key: Some("secret".into()),
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.site.root, PathBuf::from("/tmp/other-site"));
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.server.bind, "127.0.0.1:1");
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let f = write_toml("[site]\npage_size = 0\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let f = write_toml("[server]\nlog_level = \"chatty\"\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("server.log_level"));

        // A bad file value fails even when the env would override it.
        let overrides = EnvOverrides {
            log_level: Some("debug".into()),
            ..EnvOverrides::default()
        };
        assert!(load_from(f.path(), &overrides).is_err());
    }

    #[test]
    fn base_chain_merges_tables() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "[site]\nroot = \"/base\"\npage_size = 10\n[generator]\nmodel = \"base-model\"\n",
        )
        .unwrap();
        let child = dir.path().join("child.toml");
        fs::write(&child, "[meta]\nbase = \"base.toml\"\n[site]\npage_size = 24\n").unwrap();

        let cfg = load_from(&child, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.site.root, PathBuf::from("/base"));
        assert_eq!(cfg.site.page_size, 24);
        assert_eq!(cfg.generator.model, "base-model");
    }

    #[test]
    fn circular_base_is_detected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.toml"), "[meta]\nbase = \"b.toml\"\n").unwrap();
        fs::write(dir.path().join("b.toml"), "[meta]\nbase = \"a.toml\"\n").unwrap();
        let err = load_from(&dir.path().join("a.toml"), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }
}
