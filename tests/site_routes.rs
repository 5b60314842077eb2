// HTML routes exercised through the full axum router.

mod common;

use axum::http::{StatusCode, header};
use common::{body_text, get, test_site};

#[tokio::test]
async fn home_lists_all_categories() {
    let site = test_site();
    let response = get(site.router(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<title>Test Coloring Pages</title>"));
    assert!(html.contains("<link rel=\"canonical\" href=\"https://coloring.test/\">"));
    // Cats sorts before Dogs, so the grid alternates cat, dog, cat, dog.
    let order: Vec<usize> = ["cat-0", "dog-0", "cat-1", "dog-1"]
        .iter()
        .map(|id| html.find(&format!("id={id}&amp;")).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
    assert!(!html.contains("id=cat-2&amp;"));
    assert!(html.contains("href=\"/?p=2\">Next Page"));
}

#[tokio::test]
async fn category_listing_paginates() {
    let site = test_site();
    let html = body_text(get(site.router(), "/?c=cats&p=2").await).await;
    assert!(html.contains("<title>Cats Coloring Pages - Page 2</title>"));
    assert!(html.contains("All about cats."));
    assert!(html.contains("id=cat-4&amp;"));
    assert!(!html.contains("id=cat-3&amp;"));
    assert!(html.contains("href=\"/?c=cats\">Prev Page"));

    let beyond = get(site.router(), "/?c=cats&p=3").await;
    assert_eq!(beyond.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_category_redirects_home() {
    let site = test_site();
    let response = get(site.router(), "/?c=birds").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn every_stored_page_renders() {
    let site = test_site();
    for (category, prefix, n) in [("cats", "cat", 5), ("dogs", "dog", 2)] {
        for i in 0..n {
            let uri = format!("/page.php?id={prefix}-{i}&c={category}");
            let response = get(site.router(), &uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let html = body_text(response).await;
            assert!(html.contains(&format!("<h1>{prefix} page {i}</h1>")));
            assert!(html.contains(&format!("Description of {prefix} {i}.")));
            assert!(html.contains(&format!(
                "<link rel=\"canonical\" href=\"https://coloring.test/page.php?id={prefix}-{i}&amp;c={category}\">"
            )));
        }
    }
}

#[tokio::test]
async fn page_view_neighbours_and_similar() {
    let site = test_site();
    let html = body_text(get(site.router(), "/page.php?id=cat-0&c=cats").await).await;
    assert!(!html.contains("Prev Page"));
    assert!(html.contains("href=\"/page.php?id=cat-1&amp;c=cats\">Next Page"));
    assert!(html.contains("More Cats Coloring Pages"));

    let similar = html.split("Similar Cats Coloring Pages").nth(1).unwrap();
    assert_eq!(similar.matches("class=\"thumbnail\"").count(), 2);
    assert!(!similar.contains("id=cat-0&amp;"));
}

#[tokio::test]
async fn page_view_misses() {
    let site = test_site();
    for uri in [
        "/page.php",
        "/page.php?id=cat-1",
        "/page.php?c=cats",
        "/page.php?id=%21%21&c=cats",
        "/page.php?id=cat-1&c=birds",
    ] {
        let response = get(site.router(), uri).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{uri}");
    }

    let response = get(site.router(), "/page.php?id=cat-99&c=cats").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));

    // Dog pages are not reachable through the cats category.
    let response = get(site.router(), "/page.php?id=dog-0&c=cats").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_assets_and_images() {
    let site = test_site();
    let css = get(site.router(), "/style.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert!(body_text(css).await.contains("color: black"));

    std::fs::write(site.root().join("categories/cats/cat-0.png"), b"\x89PNG fake").unwrap();
    let image = get(site.router(), "/categories/cats/cat-0.png").await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[header::CONTENT_TYPE], "image/png");

    for uri in [
        "/categories/cats/cat-1.png",
        "/categories/cats.json",
        "/categories/cats/characters.txt",
        "/categories/cats/..%2Fcats.json",
        "/nope.html",
    ] {
        let response = get(site.router(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let favicon = get(site.router(), "/favicon.ico").await;
    assert_eq!(favicon.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn new_pages_show_up_without_restart() {
    let site = test_site();
    let router = site.router();
    std::fs::write(
        site.root().join("categories/dogs.json"),
        r#"{"pages":[{"id":"fresh-dog","title":"Fresh","description":"New."}]}"#,
    )
    .unwrap();
    let response = get(router, "/page.php?id=fresh-dog&c=dogs").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn generated_page_with_accented_words_is_reachable() {
    let site = test_site();
    std::fs::write(site.root().join("categories/cats/characters.txt"), "a crème cat\n").unwrap();

    let report = common::json_body(get(site.router(), "/generator.php?c=cats").await).await;
    assert_eq!(report["write_result"]["added"], 1, "{report}");
    let id = report["items"][0]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("crème-cat-"), "{id}");

    let encoded = urlencoding::encode(&id).into_owned();
    let uri = format!("/page.php?id={encoded}&c=cats");
    let response = get(site.router(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Crème Cat Chasing A Mouse"));

    // The listing links to the same page.
    let listing = body_text(get(site.router(), "/?c=cats").await).await;
    assert!(listing.contains(&format!("id={encoded}&amp;c=cats")));
}
