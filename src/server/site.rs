//! HTML routes: listing, page view, images and the 404 fallback.
//!
//! Catalog reads are blocking file I/O, so each handler builds its
//! [`Rendered`] result inside `spawn_blocking`.

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, error};

use crate::catalog::{
    Catalog, CategoryMeta, Page, Pagination, SiteIndex, category_href, interleave, page_href,
};
use crate::config::SiteConfig;
use crate::slug::{clean_slug, sanitize_filename};

use super::AppState;
use super::views::{self, Chrome, GridItem, ListingView, PageView};

/// Outcome of a page build, turned into a response by axum.
#[derive(Debug)]
pub(super) enum Rendered {
    Html(String),
    Redirect(String),
    NotFound,
    Error,
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        match self {
            Self::Html(body) => Html(body).into_response(),
            Self::Redirect(location) => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            Self::NotFound => not_found_response(),
            Self::Error => {
                (StatusCode::INTERNAL_SERVER_ERROR, Html(views::render_error())).into_response()
            }
        }
    }
}

fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, Html(views::render_not_found())).into_response()
}

// ── Query types ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListingQuery {
    c: Option<String>,
    p: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    id: Option<String>,
    c: Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET / and GET /?c=<cat>&p=<n>
pub(super) async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Response {
    let host = request_host(&headers);
    let result = tokio::task::spawn_blocking(move || {
        render_index(&state.catalog, &state.site, &query, host.as_deref())
    })
    .await;
    result.unwrap_or_else(|e| {
        error!(error = %e, "listing task failed");
        Rendered::Error
    })
    .into_response()
}

/// GET /page.php?id=<id>&c=<cat>
pub(super) async fn page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let host = request_host(&headers);
    let result = tokio::task::spawn_blocking(move || {
        render_page_view(
            &state.catalog,
            &state.site,
            &query,
            host.as_deref(),
            &mut rand::thread_rng(),
        )
    })
    .await;
    result.unwrap_or_else(|e| {
        error!(error = %e, "page task failed");
        Rendered::Error
    })
    .into_response()
}

/// GET /categories/{category}/{file}. Only `<sanitized id>.png` files.
pub(super) async fn image(
    State(state): State<AppState>,
    Path((category, file)): Path<(String, String)>,
) -> Response {
    let Some(stem) = file.strip_suffix(".png") else {
        return not_found_response();
    };
    if category.is_empty() || clean_slug(&category) != category || sanitize_filename(stem) != stem {
        return not_found_response();
    }

    let path = state.catalog.category_dir(&category).join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "image not served");
            not_found_response()
        }
    }
}

/// Anything unmatched, including misses under `public/`.
pub(super) async fn not_found() -> Response {
    not_found_response()
}

// ── Page builders ─────────────────────────────────────────────────────────────

fn request_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Configured base URL, else `site.baseUrl`, else `http://<Host>`.
fn base_url(site: &SiteConfig, index: &SiteIndex, host: Option<&str>) -> String {
    let chosen = site
        .base_url
        .clone()
        .filter(|b| !b.trim().is_empty())
        .or_else(|| Some(index.site.base_url.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("http://{}", host.unwrap_or("localhost")));
    chosen.trim_end_matches('/').to_string()
}

fn load_index(catalog: &Catalog) -> Option<SiteIndex> {
    catalog
        .load_index()
        .map_err(|e| error!(error = %e, "site index unavailable"))
        .ok()
}

fn parse_page_number(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<usize>().ok()).unwrap_or(1)
}

pub(super) fn render_index(
    catalog: &Catalog,
    site: &SiteConfig,
    query: &ListingQuery,
    host: Option<&str>,
) -> Rendered {
    let Some(index) = load_index(catalog) else {
        return Rendered::Error;
    };
    let categories = index.sorted_categories();

    let selected: Option<&CategoryMeta> = match query.c.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match index.find_category(&clean_slug(raw)) {
            Some(cat) => Some(cat),
            None => return Rendered::Redirect("/".to_string()),
        },
        _ => None,
    };

    let items: Vec<GridItem> = match selected {
        Some(cat) => catalog
            .load_pages(&cat.id)
            .into_iter()
            .map(|page| GridItem { category: cat.id.clone(), page })
            .collect(),
        None => interleave(
            categories
                .iter()
                .map(|cat| {
                    catalog
                        .load_pages(&cat.id)
                        .into_iter()
                        .map(|page| GridItem { category: cat.id.clone(), page })
                        .collect()
                })
                .collect(),
        ),
    };

    let pagination = Pagination::new(
        items.len(),
        site.page_size,
        parse_page_number(query.p.as_deref()),
    );
    if pagination.is_out_of_range() {
        return Rendered::NotFound;
    }

    let cat_id = selected.map(|c| c.id.as_str());
    let (mut title, description) = match selected {
        Some(cat) => (
            format!("{} Coloring Pages", cat.display_name()),
            if cat.description.trim().is_empty() {
                index.site.description.clone()
            } else {
                cat.description.clone()
            },
        ),
        None => (
            if index.site.title.trim().is_empty() {
                index.site.name.clone()
            } else {
                index.site.title.clone()
            },
            index.site.description.clone(),
        ),
    };
    let heading = title.clone();
    if pagination.current() > 1 {
        title = format!("{title} - Page {}", pagination.current());
    }

    let view = ListingView {
        chrome: Chrome { site: &index.site, categories: &categories },
        title,
        description,
        canonical: format!(
            "{}{}",
            base_url(site, &index, host),
            category_href(cat_id, pagination.current())
        ),
        heading,
        items: &items[pagination.range()],
        prev_href: pagination.prev().map(|n| category_href(cat_id, n)),
        next_href: pagination.next().map(|n| category_href(cat_id, n)),
    };
    Rendered::Html(views::render_listing(&view))
}

pub(super) fn render_page_view<R: Rng + ?Sized>(
    catalog: &Catalog,
    site: &SiteConfig,
    query: &PageQuery,
    host: Option<&str>,
    rng: &mut R,
) -> Rendered {
    let (Some(raw_id), Some(raw_cat)) = (query.id.as_deref(), query.c.as_deref()) else {
        return Rendered::Redirect("/".to_string());
    };
    let id = clean_slug(raw_id);
    let cat_id = clean_slug(raw_cat);
    if id.is_empty() || cat_id.is_empty() {
        return Rendered::Redirect("/".to_string());
    }

    let Some(index) = load_index(catalog) else {
        return Rendered::Error;
    };
    let Some(category) = index.find_category(&cat_id) else {
        return Rendered::Redirect("/".to_string());
    };

    let pages = catalog.load_pages(&cat_id);
    let Some(position) = pages.iter().position(|p| p.id == id) else {
        return Rendered::NotFound;
    };
    let page = &pages[position];

    let mut seen = HashSet::from([page.id.as_str()]);
    let pool: Vec<&Page> = pages
        .iter()
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();
    let similar: Vec<&Page> = pool
        .choose_multiple(rng, site.similar_count)
        .copied()
        .collect();

    let categories = index.sorted_categories();
    let view = PageView {
        chrome: Chrome { site: &index.site, categories: &categories },
        category,
        page,
        canonical: format!("{}{}", base_url(site, &index, host), page_href(&cat_id, &id)),
        prev: position.checked_sub(1).map(|i| &pages[i]),
        next: pages.get(position + 1),
        similar,
    };
    Rendered::Html(views::render_page(&view))
}
