//! Server-side HTML rendering with `maud`.
//!
//! Fragments return [`Markup`]; the public renderers hand back the finished
//! document as a `String`.

use chrono::Datelike;
use maud::{DOCTYPE, Markup, html};

use crate::catalog::{CategoryMeta, Page, SiteMeta, category_href, image_alt, image_src, page_href};

/// Site-wide pieces shared by every page.
pub struct Chrome<'a> {
    pub site: &'a SiteMeta,
    pub categories: &'a [CategoryMeta],
}

/// One thumbnail in a listing grid.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub category: String,
    pub page: Page,
}

pub struct ListingView<'a> {
    pub chrome: Chrome<'a>,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub heading: String,
    pub items: &'a [GridItem],
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

pub struct PageView<'a> {
    pub chrome: Chrome<'a>,
    pub category: &'a CategoryMeta,
    pub page: &'a Page,
    pub canonical: String,
    pub prev: Option<&'a Page>,
    pub next: Option<&'a Page>,
    pub similar: Vec<&'a Page>,
}

// ── Shared fragments ──────────────────────────────────────────────────────────

fn head(title: &str, description: &str, canonical: &str, image: Option<&str>) -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            title { (title) }
            meta name="description" content=(description);
            link rel="canonical" href=(canonical);
            @if let Some(src) = image {
                link rel="image_src" href=(src);
            }
            link rel="stylesheet" href="/style.css";
        }
    }
}

/// Full document around `main`.
fn document(head: Markup, main: Markup, site: &SiteMeta) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            (head)
            body {
                header { a id="logo" href="/" title="Home" {} }
                (main)
                (footer(site))
            }
        }
    }
    .into_string()
}

fn category_menu(heading: &str, categories: &[CategoryMeta]) -> Markup {
    html! {
        nav class="categories" {
            h2 { (heading) }
            ul {
                @for c in categories {
                    li {
                        a class="tag" href=(category_href(Some(&c.id), 1)) title=(c.display_name()) {
                            (c.display_name())
                        }
                    }
                }
            }
        }
    }
}

fn footer(site: &SiteMeta) -> Markup {
    html! {
        footer {
            "© " (chrono::Local::now().year()) " " (site.name)
            " "
            a href="/privacy-policy.php" { "Privacy Policy" }
        }
    }
}

fn pagination(prev: Option<&str>, next: Option<&str>) -> Markup {
    html! {
        @if prev.is_some() || next.is_some() {
            nav class="pagination" {
                @if let Some(href) = prev {
                    a class="tag" href=(href) { "Prev Page" }
                }
                @if let Some(href) = next {
                    a class="tag" href=(href) { "Next Page" }
                }
            }
        }
    }
}

fn thumbnail(category: &str, page: &Page) -> Markup {
    html! {
        a class="thumbnail" href=(page_href(category, &page.id)) title=(page.title) {
            img src=(image_src(category, &page.id)) alt=(image_alt(&page.id)) loading="lazy";
            span { (page.title) }
        }
    }
}

// ── Pages ─────────────────────────────────────────────────────────────────────

/// Index route: home or one category.
pub fn render_listing(view: &ListingView<'_>) -> String {
    let main = html! {
        main {
            section class="title" {
                h1 { (view.heading) }
                p class="description" { (view.description) }
            }
            section class="pages" {
                @if view.items.is_empty() {
                    p class="empty" { "No coloring pages yet." }
                }
                @for item in view.items {
                    (thumbnail(&item.category, &item.page))
                }
            }
            (pagination(view.prev_href.as_deref(), view.next_href.as_deref()))
            (category_menu("Discover More Free Printable Coloring Pages", view.chrome.categories))
        }
    };
    document(
        head(&view.title, &view.description, &view.canonical, None),
        main,
        view.chrome.site,
    )
}

/// Single page route.
pub fn render_page(view: &PageView<'_>) -> String {
    let cat_id = view.category.id.as_str();
    let cat_name = view.category.display_name();
    let src = image_src(cat_id, &view.page.id);
    let prev = view.prev.map(|p| page_href(cat_id, &p.id));
    let next = view.next.map(|p| page_href(cat_id, &p.id));

    let main = html! {
        main {
            article {
                div class="tower_r" {
                    h1 { (view.page.title) }
                    p { (view.page.description) }
                    button class="tag print" onclick="window.print();" { "Print" }
                    a class="tag download" href=(src) download { "Download" }
                    a class="tag more" href=(category_href(Some(cat_id), 1)) {
                        "More " (cat_name) " Coloring Pages"
                    }
                }
                img class="page" src=(src) alt=(image_alt(&view.page.id));
            }
            (pagination(prev.as_deref(), next.as_deref()))
            @if !view.similar.is_empty() {
                section class="similar" {
                    h2 { "Similar " (cat_name) " Coloring Pages" }
                    div class="grid" {
                        @for page in &view.similar {
                            (thumbnail(cat_id, page))
                        }
                    }
                }
            }
            (category_menu("Browse More Coloring Pages", view.chrome.categories))
        }
    };
    document(
        head(&view.page.title, &view.page.description, &view.canonical, Some(&src)),
        main,
        view.chrome.site,
    )
}

/// 404 body. Needs no site data so it can back the static file fallback.
pub fn render_not_found() -> String {
    let main = html! {
        main {
            h1 { "Page Not Found" }
            p { "The page you requested does not exist." }
            p { a class="tag" href="/" { "Back to all coloring pages" } }
        }
    };
    document(
        head("Page Not Found", "The page you requested does not exist.", "/", None),
        main,
        &SiteMeta::default(),
    )
}

/// 500 body.
pub fn render_error() -> String {
    let main = html! {
        main {
            h1 { "Something went wrong" }
            p { "Please try again later." }
        }
    };
    document(head("Something Went Wrong", "", "/", None), main, &SiteMeta::default())
}
