//! Locked read-merge-write of a category JSON file.
//!
//! Writers serialize on an exclusive lock over the sidecar `<file>.lock`. The
//! new contents go to a hidden temp file next to the target, which is then
//! renamed over it, so a failed write never leaves a truncated category file.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Page;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("category file does not exist: {0}")]
    Missing(PathBuf),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed category file {path}: {message}")]
    BadJson { path: PathBuf, message: String },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "missing_category_json",
            Self::Open { .. } => "open_failed",
            Self::Lock { .. } => "lock_failed",
            Self::Read { .. } => "read_failed",
            Self::BadJson { .. } => "bad_category_json",
            Self::Write { .. } => "write_io_failed",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Missing(path)
            | Self::Open { path, .. }
            | Self::Lock { path, .. }
            | Self::Read { path, .. }
            | Self::BadJson { path, .. }
            | Self::Write { path, .. } => path,
        }
    }

    /// `{error, path, message}` object embedded in API error bodies.
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.code(),
            "path": self.path().display().to_string(),
            "message": self.to_string(),
        })
    }
}

fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Prepend `pages` whose ids are not yet in the file, keeping batch order.
///
/// The file must already exist. An exclusive advisory lock is held from the
/// read until the rewrite completes; it is released when the handle drops.
/// Empty ids and ids already present (in the file or earlier in the batch)
/// are skipped. Returns the number of pages added; when that is zero the file
/// is not rewritten.
pub fn prepend_unique_pages(path: &Path, pages: &[Page]) -> Result<usize, StoreError> {
    if !path.is_file() {
        return Err(StoreError::Missing(path.to_path_buf()));
    }

    let lock_path = sidecar(path, "", ".lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|source| StoreError::Open { path: lock_path.clone(), source })?;
    lock.lock()
        .map_err(|source| StoreError::Lock { path: lock_path.clone(), source })?;

    let raw = fs::read_to_string(path)
        .map_err(|source| StoreError::Read { path: path.to_path_buf(), source })?;

    let mut data: Map<String, Value> = if raw.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(StoreError::BadJson {
                    path: path.to_path_buf(),
                    message: "top-level value is not an object".into(),
                });
            }
            Err(e) => {
                return Err(StoreError::BadJson {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    };

    let existing = match data.remove("pages") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!(path = %path.display(), kind = ?other, "`pages` is not an array; replacing it");
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut seen: HashSet<String> = existing.iter().filter_map(entry_id).collect();
    let mut merged: Vec<Value> = Vec::with_capacity(pages.len() + existing.len());
    for page in pages {
        if page.id.is_empty() || !seen.insert(page.id.clone()) {
            continue;
        }
        merged.push(json!({
            "id": page.id,
            "title": page.title,
            "description": page.description,
        }));
    }
    let added = merged.len();
    if added == 0 {
        debug!(path = %path.display(), "no new pages to add");
        return Ok(0);
    }
    merged.extend(existing);

    // `pages` goes back to the front so the file keeps its usual shape.
    let mut out = Map::with_capacity(data.len() + 1);
    out.insert("pages".to_string(), Value::Array(merged));
    out.extend(data);

    let mut body = serde_json::to_vec_pretty(&Value::Object(out)).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    body.push(b'\n');

    replace_contents(path, &body)?;

    debug!(path = %path.display(), added, "category file updated");
    Ok(added)
}

/// `<dir>/<prefix><file name><suffix>`.
fn sidecar(path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!("{prefix}{name}{suffix}"))
}

/// Write `body` to a temp sibling, fsync it and rename it over `path`.
fn replace_contents(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let tmp = sidecar(path, ".", ".tmp");
    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(body)?;
        f.sync_all()
    });
    if let Err(source) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Write { path: path.to_path_buf(), source });
    }
    Ok(())
}
