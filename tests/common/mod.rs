// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use colorbook::config::Config;
use colorbook::server::{AppState, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

pub struct TestSite {
    pub dir: TempDir,
    pub config: Config,
}

impl TestSite {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn router(&self) -> Router {
        router_for(&self.config)
    }

    pub fn category_json(&self, category: &str) -> Value {
        let raw = fs::read_to_string(self.root().join(format!("categories/{category}.json"))).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

pub fn router_for(config: &Config) -> Router {
    build_router(AppState::new(config).unwrap())
}

fn pages(prefix: &str, n: usize) -> Value {
    let list: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("{prefix}-{i}"),
                "title": format!("{prefix} page {i}"),
                "description": format!("Description of {prefix} {i}."),
            })
        })
        .collect();
    json!({ "pages": list })
}

/// Two categories (`cats` with 5 pages, `dogs` with 2), full word pools for
/// `cats`, and a stylesheet under `public/`.
pub fn test_site() -> TestSite {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("categories/cats")).unwrap();
    fs::create_dir_all(root.join("categories/dogs")).unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::create_dir_all(root.join("public")).unwrap();

    fs::write(
        root.join("pages.json"),
        json!({
            "site": {
                "name": "Test Coloring",
                "title": "Test Coloring Pages",
                "description": "Pages for tests.",
                "baseUrl": "https://coloring.test/"
            },
            "categories": [
                { "id": "dogs", "name": "Dogs" },
                { "id": "cats", "name": "Cats", "description": "All about cats." }
            ]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(root.join("categories/cats.json"), pages("cat", 5).to_string()).unwrap();
    fs::write(root.join("categories/dogs.json"), pages("dog", 2).to_string()).unwrap();

    fs::write(root.join("categories/cats/characters.txt"), "a tabby cat\n").unwrap();
    fs::write(root.join("categories/cats/actions.txt"), "chasing a mouse\n").unwrap();
    fs::write(root.join("categories/cats/environments.txt"), "in a barn\n").unwrap();
    fs::write(root.join("categories/style.txt"), "bold outlines, no shading.\n").unwrap();
    for pool in ["intro", "usage", "ease", "benefit"] {
        fs::write(
            root.join(format!("app/{pool}_pool.txt")),
            format!("The {pool} line about {{scene}}\n"),
        )
        .unwrap();
    }
    fs::write(root.join("public/style.css"), "body { color: black; }\n").unwrap();

    let mut config = Config::for_site(root);
    config.site.page_size = 4;
    config.site.similar_count = 2;
    TestSite { dir, config }
}

pub async fn get(router: Router, uri: &str) -> Response<Body> {
    router
        .oneshot(Request::builder().uri(uri).header("host", "localhost:8080").body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}
