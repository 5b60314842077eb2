//! Axum HTTP surface for the site.
//!
//! ## URL layout
//!
//! ```text
//! GET  /                               → listing (home or ?c=<cat>, ?p=<n>)
//! GET  /page.php?id=<id>&c=<cat>       → single page
//! GET  /generator.php?c=<cat>&...      → generator JSON API
//! GET  /categories/{cat}/{id}.png      → generated image
//! GET  /favicon.ico                    → 204
//! GET  /*path                          → <root>/public, else 404 page
//! ```

mod api;
mod site;
mod views;

use std::sync::Arc;

use axum::{Router, handler::HandlerWithoutStateExt, http::StatusCode, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{Config, GeneratorConfig, SiteConfig};
use crate::error::AppError;
use crate::generator::Generator;

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub(crate) catalog: Catalog,
    pub(crate) site: Arc<SiteConfig>,
    pub(crate) generator_config: Arc<GeneratorConfig>,
    pub(crate) generator: Arc<Generator>,
    /// Fallback when a generator request carries no `key`.
    pub(crate) api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let catalog = Catalog::new(&config.site.root);
        let generator = Generator::new(catalog.clone(), &config.generator)
            .map_err(|e| AppError::Server(format!("generator setup failed: {e}")))?;
        Ok(Self {
            catalog,
            site: Arc::new(config.site.clone()),
            generator_config: Arc::new(config.generator.clone()),
            generator: Arc::new(generator),
            api_key: config.api_key.as_deref().map(Arc::from),
        })
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    let public = ServeDir::new(state.catalog.public_dir())
        .append_index_html_on_directories(false)
        .not_found_service(site::not_found.into_service());

    Router::new()
        .route("/",                              get(site::index))
        .route("/page.php",                      get(site::page))
        .route("/generator.php",                 get(api::generate))
        .route("/categories/{category}/{file}",  get(site::image))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .fallback_service(public)
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `config.server.bind` and serve until `shutdown` is cancelled.
pub async fn run(config: &Config, shutdown: CancellationToken) -> Result<(), AppError> {
    let state = AppState::new(config)?;
    let router = build_router(state);
    let bind_addr = config.server.bind.as_str();

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, root = %config.site.root.display(), "site listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("site shut down");
    Ok(())
}
