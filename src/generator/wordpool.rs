//! Word pools and description pools read from the site root.

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::catalog::Catalog;

use super::compose::{Parts, SentenceKind, collapse_whitespace};

/// Non-empty, non-comment lines of a text file, trimmed.
/// A missing or unreadable file yields no lines.
pub fn load_lines(path: &Path) -> Vec<String> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "pool file unreadable");
            return Vec::new();
        }
    };
    String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// All style lines joined into one whitespace-normalised string.
pub fn load_style(path: &Path) -> String {
    collapse_whitespace(&load_lines(path).join(" "))
}

/// Sentence pools used by `build_description`, one per [`SentenceKind`].
#[derive(Debug, Clone, Default)]
pub struct DescriptionPools {
    pub intro: Vec<String>,
    pub usage: Vec<String>,
    pub ease: Vec<String>,
    pub benefit: Vec<String>,
}

impl DescriptionPools {
    /// Reads `{intro,usage,ease,benefit}_pool.txt` from `app_dir`.
    pub fn load(app_dir: &Path) -> Self {
        Self {
            intro: load_lines(&app_dir.join("intro_pool.txt")),
            usage: load_lines(&app_dir.join("usage_pool.txt")),
            ease: load_lines(&app_dir.join("ease_pool.txt")),
            benefit: load_lines(&app_dir.join("benefit_pool.txt")),
        }
    }

    pub fn pool(&self, kind: SentenceKind) -> &[String] {
        match kind {
            SentenceKind::Intro => &self.intro,
            SentenceKind::Usage => &self.usage,
            SentenceKind::Ease => &self.ease,
            SentenceKind::Benefit => &self.benefit,
        }
    }
}

/// Everything one category needs to synthesize pages.
#[derive(Debug, Clone, Default)]
pub struct GenerationInputs {
    pub characters: Vec<String>,
    pub actions: Vec<String>,
    pub environments: Vec<String>,
    pub style: String,
    pub pools: DescriptionPools,
}

impl GenerationInputs {
    pub fn load(catalog: &Catalog, category: &str) -> Self {
        let dir = catalog.category_dir(category);
        Self {
            characters: load_lines(&dir.join("characters.txt")),
            actions: load_lines(&dir.join("actions.txt")),
            environments: load_lines(&dir.join("environments.txt")),
            style: load_style(&catalog.style_path()),
            pools: DescriptionPools::load(&catalog.app_dir()),
        }
    }

    /// Names of the inputs that are empty or absent, in a fixed order.
    pub fn missing(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 8] = [
            ("characters", self.characters.is_empty()),
            ("actions", self.actions.is_empty()),
            ("environments", self.environments.is_empty()),
            ("pool_intro", self.pools.intro.is_empty()),
            ("pool_usage", self.pools.usage.is_empty()),
            ("pool_ease", self.pools.ease.is_empty()),
            ("pool_benefit", self.pools.benefit.is_empty()),
            ("style", self.style.is_empty()),
        ];
        checks
            .into_iter()
            .filter_map(|(name, empty)| empty.then_some(name))
            .collect()
    }

    /// Uniform pick from each word pool. `None` when any pool is empty.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Parts> {
        Some(Parts::new(
            self.characters.choose(&mut *rng)?.as_str(),
            self.actions.choose(&mut *rng)?.as_str(),
            self.environments.choose(&mut *rng)?.as_str(),
        ))
    }
}

/// Sub-directories of `categories/`, sorted by name.
pub fn list_categories(catalog: &Catalog) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(catalog.categories_dir())? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
