//! Read side of the site data: `pages.json` and `categories/<cat>.json`.
//!
//! Everything here is re-read from disk on each call so pages written by the
//! generator show up on the next request.

pub mod pagination;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::slug::sanitize_filename;

pub use pagination::Pagination;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ── Data types ────────────────────────────────────────────────────────────────

/// `site` object of `pages.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            name: "Coloring Pages".to_string(),
            title: String::new(),
            description: String::new(),
            base_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryMeta {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl CategoryMeta {
    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { &self.id } else { &self.name }
    }
}

/// Parsed `pages.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteIndex {
    pub site: SiteMeta,
    pub categories: Vec<CategoryMeta>,
}

impl SiteIndex {
    /// Categories with a non-empty id, ordered by name (case-insensitive) then id.
    pub fn sorted_categories(&self) -> Vec<CategoryMeta> {
        let mut cats: Vec<CategoryMeta> = self
            .categories
            .iter()
            .filter(|c| !c.id.is_empty())
            .cloned()
            .collect();
        cats.sort_by(|a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        cats
    }

    pub fn find_category(&self, id: &str) -> Option<&CategoryMeta> {
        if id.is_empty() {
            return None;
        }
        self.categories.iter().find(|c| c.id == id)
    }
}

/// One coloring page as stored in a category file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Page {
    /// Build from a JSON entry. Numeric ids are stringified; entries without
    /// a usable id yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if id.is_empty() {
            return None;
        }
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            title: text("title"),
            description: text("description"),
            id,
        })
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Filesystem layout of one site root.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("pages.json")
    }

    pub fn categories_dir(&self) -> PathBuf {
        self.root.join("categories")
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.categories_dir().join(category)
    }

    pub fn category_json_path(&self, category: &str) -> PathBuf {
        self.categories_dir().join(format!("{category}.json"))
    }

    pub fn image_path(&self, category: &str, id: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.png", sanitize_filename(id)))
    }

    pub fn style_path(&self) -> PathBuf {
        self.categories_dir().join("style.txt")
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root.join("app")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    /// Read and parse `pages.json`.
    pub fn load_index(&self) -> Result<SiteIndex, CatalogError> {
        let path = self.index_path();
        let raw = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(SiteIndex::default());
        }
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse { path, source })
    }

    /// Pages of one category in file order. Missing or malformed files read
    /// as empty.
    pub fn load_pages(&self, category: &str) -> Vec<Page> {
        let path = self.category_json_path(category);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "category file unreadable");
                return Vec::new();
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "category file is not valid JSON");
                return Vec::new();
            }
        };
        value
            .get("pages")
            .and_then(Value::as_array)
            .map(|pages| pages.iter().filter_map(Page::from_value).collect())
            .unwrap_or_default()
    }
}

// ── Links ─────────────────────────────────────────────────────────────────────

/// `/page.php?id=..&c=..`
pub fn page_href(category: &str, id: &str) -> String {
    format!(
        "/page.php?id={}&c={}",
        urlencoding::encode(id),
        urlencoding::encode(category)
    )
}

/// Listing link. Page 1 carries no `p` parameter.
pub fn category_href(category: Option<&str>, page: usize) -> String {
    match (category, page > 1) {
        (Some(c), true) => format!("/?c={}&p={page}", urlencoding::encode(c)),
        (Some(c), false) => format!("/?c={}", urlencoding::encode(c)),
        (None, true) => format!("/?p={page}"),
        (None, false) => "/".to_string(),
    }
}

/// Public URL of a page's image.
pub fn image_src(category: &str, id: &str) -> String {
    format!(
        "/categories/{}/{}.png",
        urlencoding::encode(category),
        sanitize_filename(id)
    )
}

/// Alt text derived from a page id: dashes become spaces.
pub fn image_alt(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Round-robin merge: first item of each list, then the second of each, etc.
pub fn interleave<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    let total = lists.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        for it in iters.iter_mut() {
            if let Some(item) = it.next() {
                out.push(item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site_with(index: &str) -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("categories")).unwrap();
        fs::write(dir.path().join("pages.json"), index).unwrap();
        let catalog = Catalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn index_fields_default() {
        let (_dir, catalog) = site_with(r#"{"categories":[{"id":"cats"}]}"#);
        let index = catalog.load_index().unwrap();
        assert_eq!(index.site.name, "Coloring Pages");
        assert_eq!(index.categories.len(), 1);
        assert_eq!(index.categories[0].display_name(), "cats");
    }

    #[test]
    fn index_read_and_parse_errors() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::new(dir.path());
        assert!(matches!(catalog.load_index(), Err(CatalogError::Read { .. })));

        fs::write(dir.path().join("pages.json"), "{ nope").unwrap();
        assert!(matches!(catalog.load_index(), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn categories_sorted_and_filtered() {
        let (_dir, catalog) = site_with(
            r#"{"categories":[
                {"id":"z","name":"zebras"},
                {"id":"","name":"Nameless"},
                {"id":"a","name":"Animals"},
                {"id":"b","name":"animals"}
            ]}"#,
        );
        let index = catalog.load_index().unwrap();
        let ids: Vec<_> = index.sorted_categories().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a", "b", "z"]);
        assert!(index.find_category("").is_none());
        assert_eq!(index.find_category("z").unwrap().name, "zebras");
    }

    #[test]
    fn load_pages_is_lenient() {
        let (dir, catalog) = site_with("{}");
        assert!(catalog.load_pages("missing").is_empty());

        fs::write(dir.path().join("categories/bad.json"), "not json").unwrap();
        assert!(catalog.load_pages("bad").is_empty());

        fs::write(
            dir.path().join("categories/cats.json"),
            r#"{"pages":[
                {"id":"one","title":"One","description":"First."},
                {"id":"","title":"skip"},
                {"title":"no id"},
                {"id":42,"title":"Numeric"}
            ]}"#,
        )
        .unwrap();
        let pages = catalog.load_pages("cats");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "one");
        assert_eq!(pages[1].id, "42");
        assert_eq!(pages[1].description, "");
    }

    #[test]
    fn hrefs_are_encoded() {
        assert_eq!(page_href("cats", "a b&c"), "/page.php?id=a%20b%26c&c=cats");
        assert_eq!(category_href(Some("cats"), 1), "/?c=cats");
        assert_eq!(category_href(Some("cats"), 3), "/?c=cats&p=3");
        assert_eq!(category_href(None, 1), "/");
        assert_eq!(category_href(None, 2), "/?p=2");
        assert_eq!(image_src("cats", "happy cat"), "/categories/cats/happy_cat.png");
        assert_eq!(image_alt("happy-cat-coloring-page"), "happy cat coloring page");
    }

    #[test]
    fn interleave_round_robin() {
        let merged = interleave(vec![vec![1, 4, 6], vec![2], vec![3, 5]]);
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
        assert!(interleave::<u8>(vec![]).is_empty());
    }
}
