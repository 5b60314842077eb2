//! Page generation pipeline.
//!
//! ```text
//! validate category → load inputs → per item:
//!     pick parts → id / title / description / prompt
//!     [img]  reuse existing file or call the image API → 1-bit conversion
//! → prepend new pages to categories/<cat>.json under a lock
//! ```
//!
//! Per-item failures are collected in the report and never abort the batch.
//! Only request-level problems surface as [`GenerateError`].

pub mod compose;
pub mod imagegen;
pub mod onebit;
pub mod store;
pub mod wordpool;

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Page};
use crate::config::GeneratorConfig;
use crate::slug::clean_slug;

use compose::{build_description, build_id, build_prompt, build_title};
use imagegen::{ImageClient, ImageError};
use onebit::{OneBitError, Outcome};
use store::StoreError;
use wordpool::GenerationInputs;

// ── Request / report types ────────────────────────────────────────────────────

/// One generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Raw category name; validated against `categories/<name>/`.
    pub category: String,
    /// Items to synthesize, clamped to `1..=max_count`.
    pub count: usize,
    /// Also produce images.
    pub img: bool,
    /// Skip the 1-bit conversion and the JSON write.
    pub dry: bool,
    pub aspect_ratio: String,
    pub model: String,
    /// Reuse an image already on disk instead of calling the API.
    pub skip_img_existing: bool,
    /// Convert images to 1-bit PNG.
    pub onebit: bool,
    /// Leave reused images alone when they are already 1-bit.
    pub skip_onebit_existing: bool,
    pub api_key: Option<String>,
}

impl GenerateRequest {
    /// Defaults for `category`: one item, text only, config model and ratio.
    pub fn new(category: impl Into<String>, config: &GeneratorConfig) -> Self {
        Self {
            category: category.into(),
            count: 1,
            img: false,
            dry: false,
            aspect_ratio: config.aspect_ratio.clone(),
            model: config.model.clone(),
            skip_img_existing: true,
            onebit: true,
            skip_onebit_existing: true,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteResult {
    pub ok: bool,
    pub added: usize,
}

/// A failure tied to one generated item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub id: String,
    /// `image` or `onebit`.
    pub stage: &'static str,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ItemError {
    fn image(id: &str, e: &ImageError) -> Self {
        Self {
            id: id.to_string(),
            stage: "image",
            error: e.code(),
            status: e.status(),
            detail: e.detail(),
        }
    }

    fn onebit(id: &str, e: &OneBitError) -> Self {
        Self {
            id: id.to_string(),
            stage: "onebit",
            error: e.code(),
            status: None,
            detail: Some(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub ok: bool,
    pub category: String,
    pub count_requested: usize,
    pub count_generated: usize,
    pub dry: bool,
    pub write_result: Option<WriteResult>,
    pub items: Vec<Page>,
    pub errors: Vec<ItemError>,
    pub onebit_enabled: bool,
    pub onebit_available: bool,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("missing category parameter")]
    MissingCategoryParam,

    #[error("malformed query string: {0}")]
    BadQuery(String),

    #[error("no category directory for '{0}'")]
    MissingCategoryDir(String),

    #[error("missing generation inputs: {}", .0.join(", "))]
    MissingInputs(Vec<&'static str>),

    #[error("writing category file failed: {0}")]
    WriteFailed(#[source] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GenerateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCategoryParam => "missing_c_param",
            Self::BadQuery(_) => "bad_query",
            Self::MissingCategoryDir(_) => "missing_category_dir",
            Self::MissingInputs(_) => "missing_inputs",
            Self::WriteFailed(_) => "write_failed",
            Self::Internal(_) => "internal",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingCategoryParam | Self::BadQuery(_) => 400,
            Self::MissingCategoryDir(_) => 404,
            Self::MissingInputs(_) | Self::WriteFailed(_) | Self::Internal(_) => 500,
        }
    }

    /// `{ok: false, error: <code>, ...}` body.
    pub fn to_json(&self) -> Value {
        let mut body = json!({ "ok": false, "error": self.code() });
        match self {
            Self::MissingCategoryDir(category) => body["category"] = json!(category),
            Self::MissingInputs(missing) => body["missing"] = json!(missing),
            Self::WriteFailed(e) => body["detail"] = e.to_json(),
            Self::Internal(msg) | Self::BadQuery(msg) => body["message"] = json!(msg),
            Self::MissingCategoryParam => {}
        }
        body
    }
}

// ── Generator ─────────────────────────────────────────────────────────────────

/// Shared by the HTTP handler and the CLI. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Generator {
    catalog: Catalog,
    client: ImageClient,
    max_count: usize,
}

impl Generator {
    pub fn new(catalog: Catalog, config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let client = ImageClient::new(&config.api_base_url, config.timeout_seconds)
            .map_err(|e| GenerateError::Internal(e.to_string()))?;
        Ok(Self {
            catalog,
            client,
            max_count: config.max_count.max(1),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Validate the raw category name and return the usable one.
    fn resolve_category(&self, raw: &str) -> Result<String, GenerateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GenerateError::MissingCategoryParam);
        }
        let cleaned = clean_slug(trimmed);
        if cleaned != trimmed || !self.catalog.category_dir(&cleaned).is_dir() {
            return Err(GenerateError::MissingCategoryDir(trimmed.to_string()));
        }
        Ok(cleaned)
    }

    pub async fn run(&self, req: GenerateRequest) -> Result<GenerateReport, GenerateError> {
        let mut rng = StdRng::from_entropy();
        self.run_with_rng(req, &mut rng).await
    }

    pub async fn run_with_rng<R: Rng + Send>(
        &self,
        req: GenerateRequest,
        rng: &mut R,
    ) -> Result<GenerateReport, GenerateError> {
        let category = self.resolve_category(&req.category)?;
        let count = req.count.clamp(1, self.max_count);

        let inputs = {
            let catalog = self.catalog.clone();
            let category = category.clone();
            tokio::task::spawn_blocking(move || GenerationInputs::load(&catalog, &category))
                .await
                .map_err(|e| GenerateError::Internal(format!("input loader panicked: {e}")))?
        };
        let missing = inputs.missing();
        if !missing.is_empty() {
            warn!(%category, ?missing, "generation inputs missing");
            return Err(GenerateError::MissingInputs(missing));
        }

        info!(%category, count, img = req.img, dry = req.dry, model = %req.model, "generation started");

        let api_key = req.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let mut items = Vec::with_capacity(count);
        let mut errors = Vec::new();

        for _ in 0..count {
            let Some(parts) = inputs.pick(rng) else { break };
            let id = build_id(&parts);
            let page = Page {
                title: build_title(&parts),
                description: build_description(&parts, &inputs.pools, rng),
                id: id.clone(),
            };
            let prompt = build_prompt(&parts, &inputs.style);
            items.push(page);

            if !req.img {
                continue;
            }

            let out_path = self.catalog.image_path(&category, &id);
            if req.skip_img_existing && out_path.is_file() {
                debug!(%id, path = %out_path.display(), "image exists, reusing");
                if req.onebit && !req.dry {
                    if let Err(e) = self.to_onebit(out_path, !req.skip_onebit_existing).await {
                        warn!(%id, error = %e, "1-bit conversion failed");
                        errors.push(ItemError::onebit(&id, &e));
                    }
                }
                continue;
            }

            let Some(key) = api_key else {
                errors.push(ItemError::image(&id, &ImageError::MissingApiKey));
                continue;
            };

            match self
                .client
                .generate_to_file(key, &prompt, &req.model, &req.aspect_ratio, &out_path)
                .await
            {
                Ok(bytes) => debug!(%id, bytes, path = %out_path.display(), "image written"),
                Err(e) => {
                    warn!(%id, error = %e, "image generation failed");
                    errors.push(ItemError::image(&id, &e));
                    continue;
                }
            }

            if req.onebit && !req.dry {
                if let Err(e) = self.to_onebit(out_path, false).await {
                    warn!(%id, error = %e, "1-bit conversion failed");
                    errors.push(ItemError::onebit(&id, &e));
                }
            }
        }

        let write_result = if req.dry {
            None
        } else {
            let path = self.catalog.category_json_path(&category);
            let pages = items.clone();
            let added = tokio::task::spawn_blocking(move || store::prepend_unique_pages(&path, &pages))
                .await
                .map_err(|e| GenerateError::Internal(format!("category writer panicked: {e}")))?
                .map_err(|e| {
                    warn!(%category, error = %e, "category write failed");
                    GenerateError::WriteFailed(e)
                })?;
            Some(WriteResult { ok: true, added })
        };

        info!(
            %category,
            generated = items.len(),
            errors = errors.len(),
            added = write_result.as_ref().map(|w| w.added),
            "generation finished"
        );

        Ok(GenerateReport {
            ok: true,
            category,
            count_requested: count,
            count_generated: items.len(),
            dry: req.dry,
            write_result,
            items,
            errors,
            onebit_enabled: req.onebit,
            onebit_available: onebit::AVAILABLE,
        })
    }

    /// Convert off the async executor. A build without conversion support
    /// skips silently; the report's `onebit_available` flag says so.
    async fn to_onebit(&self, path: PathBuf, force: bool) -> Result<(), OneBitError> {
        if !onebit::AVAILABLE {
            return Ok(());
        }
        let outcome = tokio::task::spawn_blocking(move || onebit::convert_png_to_1bit(&path, force))
            .await
            .map_err(|e| OneBitError::Encode {
                path: PathBuf::new(),
                message: format!("conversion task panicked: {e}"),
            })??;
        if outcome == Outcome::AlreadyBilevel {
            debug!("image already 1-bit");
        }
        Ok(())
    }
}
